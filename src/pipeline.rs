use crate::container::Book;
use crate::error::Result;
use crate::translator::ChunkedTranslator;
use crate::walker;
use log::info;
use std::mem;

/// Translate every content document of `book`, strictly in order. The first
/// failing document aborts the run.
pub fn translate_book(mut book: Book, translator: &ChunkedTranslator<'_>) -> Result<Book> {
    let total = book.documents.len();

    for (i, document) in book.documents.iter_mut().enumerate() {
        info!("Translating document {}/{}: {}", i + 1, total, document.path);
        let tree = mem::take(&mut document.tree);
        document.tree = walker::translate_document(tree, translator)
            .map_err(|e| e.in_document(&document.path))?;
    }

    Ok(book)
}
