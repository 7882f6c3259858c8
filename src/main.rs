mod cli;
mod config;
mod container;
mod converter;
mod engine;
mod epub_reader;
mod error;
mod extract;
mod markdown;
mod markup;
mod pipeline;
mod segmenter;
mod translator;
mod walker;

#[cfg(test)]
mod test_support;

use anyhow::Result;
use clap::Parser;
use cli::{Cli, Command};
use log::LevelFilter;

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(&cli);

    match cli.command {
        Command::Extract(ref args) => converter::extract(args),
        Command::Translate(ref args) => converter::translate(args),
    }
}

fn init_logging(cli: &Cli) {
    let level = if cli.quiet {
        LevelFilter::Warn
    } else if cli.verbose > 0 {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };

    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .format_timestamp(None)
        .init();
}
