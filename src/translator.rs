use crate::engine::Translate;
use crate::error::{Error, Result};
use crate::segmenter;
use log::debug;

/// Translates text of any length through an engine with a bounded input size.
pub struct ChunkedTranslator<'a> {
    engine: &'a dyn Translate,
    max_chars: usize,
}

impl<'a> ChunkedTranslator<'a> {
    pub fn new(engine: &'a dyn Translate, max_chars: usize) -> Self {
        Self { engine, max_chars }
    }

    /// Segment `text`, translate each chunk in order and join the results with
    /// a single space. The first failing chunk aborts the whole call.
    pub fn translate_long(&self, text: &str) -> Result<String> {
        let chunks = segmenter::segment(text, self.max_chars);
        let chunk_count = chunks.len();
        let mut translated = Vec::with_capacity(chunk_count);

        for (chunk_index, chunk) in chunks.iter().enumerate() {
            debug!(
                "Translating chunk {}/{} ({} chars)",
                chunk_index + 1,
                chunk_count,
                chunk.chars().count()
            );
            let output = self
                .engine
                .translate(chunk)
                .map_err(|source| Error::Translation {
                    document: None,
                    chunk_index,
                    chunk_count,
                    source,
                })?;
            translated.push(output);
        }

        Ok(translated.join(" "))
    }
}
