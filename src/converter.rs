use crate::cli::{ExtractArgs, TranslateArgs};
use crate::config::TranslateConfig;
use crate::container;
use crate::engine;
use crate::epub_reader::EpubData;
use crate::extract;
use crate::markdown;
use crate::pipeline;
use crate::translator::ChunkedTranslator;
use anyhow::{Context, Result};
use log::info;
use std::fs;
use std::path::Path;

pub fn translate(args: &TranslateArgs) -> Result<()> {
    let config = TranslateConfig::resolve(args)?;
    let book = container::read_book(&args.input)?;

    info!(
        "Translating '{}' ({} documents) {} -> {} with {} at {}",
        book.title.as_deref().unwrap_or("untitled"),
        book.documents.len(),
        config.source_language,
        config.target_language,
        config.engine,
        config.endpoint()
    );

    let engine = engine::from_config(&config).context("Failed to set up translation engine")?;
    let translator = ChunkedTranslator::new(engine.as_ref(), config.max_chars);

    let book = pipeline::translate_book(book, &translator)?;
    ensure_parent_dir(&args.output)?;
    container::write_book(&args.output, &book)?;

    eprintln!(
        "Translated {} documents to {}",
        book.documents.len(),
        args.output.display()
    );

    Ok(())
}

pub fn extract(args: &ExtractArgs) -> Result<()> {
    let epub = EpubData::open(&args.input)?;
    info!(
        "Extracting '{}' (language: {})",
        epub.title().unwrap_or_else(|| "untitled".to_string()),
        epub.language().unwrap_or_else(|| "unknown".to_string())
    );

    let (content, count) = if args.markdown {
        let html = epub.html_documents()?;
        let content = html
            .iter()
            .map(|document| markdown::html_to_markdown(document))
            .filter(|md| !md.is_empty())
            .collect::<Vec<_>>()
            .join("\n---\n\n");
        (content, html.len())
    } else {
        let documents = epub.documents()?;
        (extract::book_text(&documents), documents.len())
    };

    ensure_parent_dir(&args.output)?;
    fs::write(&args.output, &content)
        .with_context(|| format!("Failed to write output file: {}", args.output.display()))?;

    eprintln!("Extracted {} documents to {}", count, args.output.display());

    Ok(())
}

fn ensure_parent_dir(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
        }
    }
    Ok(())
}
