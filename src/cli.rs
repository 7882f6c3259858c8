use crate::config::EngineKind;
use clap::{ArgAction, Args, Parser, Subcommand};
use std::path::PathBuf;

/// Translate EPUB books without touching their markup, or dump their text
#[derive(Parser, Debug)]
#[command(name = "epub-translate", version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// More log output (-v for debug)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Only log warnings and errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Write the paragraph text of an EPUB to a text file
    Extract(ExtractArgs),
    /// Translate an EPUB into a new EPUB with the same structure
    Translate(TranslateArgs),
}

#[derive(Args, Debug)]
pub struct ExtractArgs {
    /// Path to the input EPUB file
    pub input: PathBuf,

    /// Path of the text file to write
    pub output: PathBuf,

    /// Write Markdown instead of plain paragraph text
    #[arg(long, default_value_t = false)]
    pub markdown: bool,
}

#[derive(Args, Debug)]
pub struct TranslateArgs {
    /// Path to the input EPUB file
    #[arg(long)]
    pub input: PathBuf,

    /// Path of the translated EPUB to write
    #[arg(long)]
    pub output: PathBuf,

    /// JSON file with translation settings
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Translation engine
    #[arg(long, value_enum)]
    pub engine: Option<EngineKind>,

    /// Engine base URL
    #[arg(long)]
    pub endpoint: Option<String>,

    /// Model name (Ollama)
    #[arg(long)]
    pub model: Option<String>,

    /// Source language code
    #[arg(long = "from")]
    pub source_language: Option<String>,

    /// Target language code
    #[arg(long = "to")]
    pub target_language: Option<String>,

    /// Maximum characters sent to the engine per request
    #[arg(long)]
    pub max_chars: Option<usize>,

    /// Seconds before an engine request is abandoned
    #[arg(long)]
    pub timeout_secs: Option<u64>,

    /// Retries for a failed engine request
    #[arg(long)]
    pub max_retries: Option<u32>,
}
