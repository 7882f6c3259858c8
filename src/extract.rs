//! Plain-text extraction: the paragraph text of a document, without markup.

use crate::markup::{Document, Element};

/// Text of every `<p>` in document order, whitespace collapsed, empty
/// paragraphs dropped.
pub fn paragraphs(document: &Document) -> Vec<String> {
    let Some(root) = document.root() else {
        return Vec::new();
    };

    std::iter::once(root)
        .chain(root.descendants())
        .filter(|element| element.local_name() == "p")
        .map(paragraph_text)
        .filter(|text| !text.is_empty())
        .collect()
}

fn paragraph_text(element: &Element) -> String {
    element
        .text_content()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Paragraphs of one document separated by blank lines.
pub fn document_text(document: &Document) -> String {
    paragraphs(document).join("\n\n")
}

/// Text of several documents; documents without paragraphs are skipped.
pub fn book_text<'a>(documents: impl IntoIterator<Item = &'a Document>) -> String {
    documents
        .into_iter()
        .map(document_text)
        .filter(|text| !text.is_empty())
        .collect::<Vec<_>>()
        .join("\n\n")
}
