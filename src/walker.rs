use crate::error::Result;
use crate::markup::{Document, Node};
use crate::translator::ChunkedTranslator;
use log::debug;

/// Replace the content of every non-blank text node in `document` with its
/// translation. Elements, attributes, verbatim markup and whitespace-only
/// text are left exactly as they were.
///
/// Leading and trailing whitespace of a text node stays in place around the
/// translation, so inline runs keep their spacing.
pub fn translate_document(
    mut document: Document,
    translator: &ChunkedTranslator<'_>,
) -> Result<Document> {
    let targets = translatable_text_paths(&document);
    debug!("Found {} text nodes to translate", targets.len());

    for path in targets {
        if let Some(Node::Text(text)) = document.node_at_mut(&path) {
            let translated = translate_text(text, translator)?;
            *text = translated;
        }
    }

    Ok(document)
}

/// The whole node content goes to the translator; only the edge whitespace
/// runs are put back around the result.
fn translate_text(text: &str, translator: &ChunkedTranslator<'_>) -> Result<String> {
    let translated = translator.translate_long(text)?;

    let after_leading = text.trim_start();
    let leading = &text[..text.len() - after_leading.len()];
    let trailing = &after_leading[after_leading.trim_end().len()..];
    Ok(format!("{leading}{translated}{trailing}"))
}

/// Elements whose text is code rather than prose.
const RAW_TEXT_ELEMENTS: [&str; 2] = ["style", "script"];

/// Child-index paths of all non-blank text nodes, in document order.
/// Inline stylesheets and scripts are skipped.
pub fn translatable_text_paths(document: &Document) -> Vec<Vec<usize>> {
    let mut paths = Vec::new();
    let mut path = Vec::new();
    collect_text_paths(&document.nodes, &mut path, &mut paths);
    paths
}

fn collect_text_paths(nodes: &[Node], path: &mut Vec<usize>, paths: &mut Vec<Vec<usize>>) {
    for (index, node) in nodes.iter().enumerate() {
        path.push(index);
        match node {
            Node::Text(text) if !text.trim().is_empty() => paths.push(path.clone()),
            Node::Element(element) if !RAW_TEXT_ELEMENTS.contains(&element.local_name()) => {
                collect_text_paths(&element.children, path, paths)
            }
            _ => {}
        }
        path.pop();
    }
}
