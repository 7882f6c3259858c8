//! Spine-order access to an EPUB through rbook, for text extraction.

use crate::error::Error;
use crate::markup::{self, Document};
use anyhow::{Context, Result};
use log::debug;
use rbook::prelude::*;
use rbook::Epub;
use std::path::Path;

pub struct EpubData {
    epub: Epub,
}

impl EpubData {
    pub fn open(path: &Path) -> Result<Self> {
        let epub = Epub::options()
            .strict(false)
            .open(path)
            .with_context(|| format!("Failed to open EPUB: {}", path.display()))?;
        Ok(Self { epub })
    }

    /// Raw XHTML of each non-empty spine document, in reading order.
    pub fn html_documents(&self) -> Result<Vec<String>> {
        Ok(self
            .spine_contents()?
            .into_iter()
            .map(|(_, html)| html)
            .collect())
    }

    /// Parsed tree of each non-empty spine document, in reading order.
    pub fn documents(&self) -> Result<Vec<Document>> {
        let mut documents = Vec::new();
        for (position, html) in self.spine_contents()? {
            let tree = markup::parse(html.as_bytes()).map_err(|source| Error::MarkupParse {
                document: format!("spine item {position}"),
                source,
            })?;
            documents.push(tree);
        }
        Ok(documents)
    }

    /// 1-based spine position and content of every document with any content.
    fn spine_contents(&self) -> Result<Vec<(usize, String)>> {
        let mut contents = Vec::new();
        let mut reader = self.epub.reader();
        let mut position = 0;

        while let Some(result) = reader.read_next() {
            position += 1;
            let data = result.with_context(|| format!("Failed to read spine item {position}"))?;
            let html = data.content().to_string();

            if html.trim().is_empty() {
                debug!("Skipping empty spine item {position}");
                continue;
            }

            contents.push((position, html));
        }

        Ok(contents)
    }

    pub fn title(&self) -> Option<String> {
        self.epub
            .metadata()
            .title()
            .map(|t| t.value().to_string())
    }

    pub fn language(&self) -> Option<String> {
        let mut langs = self.epub.metadata().languages();
        langs.next().map(|l| l.value().to_string())
    }
}
