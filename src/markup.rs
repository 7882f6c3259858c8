//! XHTML document trees.
//!
//! Content documents are parsed with quick-xml into a small owned tree that
//! keeps everything needed to write the document back out: attribute order
//! and raw attribute values, self-closing tags, and any markup that is not an
//! element or character data (comments, CDATA, processing instructions, the
//! XML declaration and doctype) as verbatim strings.

use crate::error::MarkupError;
use quick_xml::escape::resolve_html5_entity;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use std::borrow::Cow;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Document {
    /// Top-level nodes: prolog, exactly one root element, trailing misc
    pub nodes: Vec<Node>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    Element(Element),
    /// Decoded character data
    Text(String),
    /// Markup re-emitted exactly as read and never translated
    Verbatim(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    /// Qualified name as written, e.g. `p` or `epub:switch`
    pub name: String,
    /// Attributes in source order; values are kept escaped, as written
    pub attributes: Vec<(String, String)>,
    pub children: Vec<Node>,
    pub self_closing: bool,
}

impl Document {
    pub fn root(&self) -> Option<&Element> {
        self.nodes.iter().find_map(|node| match node {
            Node::Element(element) => Some(element),
            _ => None,
        })
    }

    /// Follow a path of child indexes from the top-level node list.
    pub fn node_at_mut(&mut self, path: &[usize]) -> Option<&mut Node> {
        let (first, rest) = path.split_first()?;
        let mut node = self.nodes.get_mut(*first)?;
        for &index in rest {
            node = match node {
                Node::Element(element) => element.children.get_mut(index)?,
                _ => return None,
            };
        }
        Some(node)
    }
}

impl Element {
    pub fn local_name(&self) -> &str {
        self.name.rsplit(':').next().unwrap_or(&self.name)
    }

    /// Descendant elements in document order (pre-order), not including self
    pub fn descendants(&self) -> Vec<&Element> {
        let mut found = Vec::new();
        collect_descendants(self, &mut found);
        found
    }

    /// Concatenated character data of all descendant text nodes
    pub fn text_content(&self) -> String {
        let mut text = String::new();
        push_text_content(&self.children, &mut text);
        text
    }
}

fn collect_descendants<'a>(element: &'a Element, found: &mut Vec<&'a Element>) {
    for child in &element.children {
        if let Node::Element(child) = child {
            found.push(child);
            collect_descendants(child, found);
        }
    }
}

fn push_text_content(nodes: &[Node], text: &mut String) {
    for node in nodes {
        match node {
            Node::Text(t) => text.push_str(t),
            Node::Element(element) => push_text_content(&element.children, text),
            Node::Verbatim(_) => {}
        }
    }
}

/// Parse a UTF-8 XHTML document into a tree.
pub fn parse(bytes: &[u8]) -> Result<Document, MarkupError> {
    let content = std::str::from_utf8(strip_bom(bytes)).map_err(|_| MarkupError::Encoding)?;
    let mut reader = Reader::from_str(content);

    let mut document = Document::default();
    let mut open: Vec<Element> = Vec::new();

    loop {
        let event = match reader.read_event() {
            Ok(event) => event,
            Err(e) => {
                return Err(MarkupError::Syntax {
                    position: reader.error_position() as u64,
                    message: e.to_string(),
                })
            }
        };

        let node = match event {
            Event::Eof => break,
            Event::Start(e) => {
                let element = start_element(&e, false, &reader)?;
                open.push(element);
                continue;
            }
            Event::End(e) => {
                let Some(element) = open.pop() else {
                    return Err(MarkupError::UnmatchedEnd(lossy(e.name().as_ref())));
                };
                Node::Element(element)
            }
            Event::Empty(e) => Node::Element(start_element(&e, true, &reader)?),
            Event::Text(e) => {
                push_text(children_of(&mut open, &mut document), &lossy(&e));
                continue;
            }
            Event::GeneralRef(e) => {
                let name = lossy(&e);
                let resolved = resolve_entity(&name).ok_or(MarkupError::UnknownEntity(name))?;
                push_text(children_of(&mut open, &mut document), &resolved);
                continue;
            }
            Event::CData(e) => Node::Verbatim(format!("<![CDATA[{}]]>", lossy(&e))),
            Event::Comment(e) => Node::Verbatim(format!("<!--{}-->", lossy(&e))),
            Event::Decl(e) => Node::Verbatim(format!("<?{}?>", lossy(&e))),
            Event::PI(e) => Node::Verbatim(format!("<?{}?>", lossy(&e))),
            Event::DocType(e) => {
                Node::Verbatim(format!("<!DOCTYPE {}>", lossy(&e).trim_start()))
            }
        };

        children_of(&mut open, &mut document).push(node);
    }

    if let Some(element) = open.pop() {
        return Err(MarkupError::Unclosed(element.name));
    }
    if document.root().is_none() {
        return Err(MarkupError::NoRoot);
    }

    Ok(document)
}

fn start_element(
    e: &BytesStart<'_>,
    self_closing: bool,
    reader: &Reader<&[u8]>,
) -> Result<Element, MarkupError> {
    let mut attributes = Vec::new();
    for attr in e.attributes() {
        let attr = attr.map_err(|err| MarkupError::Syntax {
            position: reader.buffer_position() as u64,
            message: err.to_string(),
        })?;
        attributes.push((lossy(attr.key.as_ref()), lossy(&attr.value)));
    }

    Ok(Element {
        name: lossy(e.name().as_ref()),
        attributes,
        children: Vec::new(),
        self_closing,
    })
}

fn children_of<'a>(open: &'a mut [Element], document: &'a mut Document) -> &'a mut Vec<Node> {
    match open.last_mut() {
        Some(parent) => &mut parent.children,
        None => &mut document.nodes,
    }
}

/// Adjacent character data and references become a single text node.
fn push_text(nodes: &mut Vec<Node>, text: &str) {
    if let Some(Node::Text(last)) = nodes.last_mut() {
        last.push_str(text);
    } else {
        nodes.push(Node::Text(text.to_string()));
    }
}

/// Character references and any named reference HTML5 defines, which covers
/// the XHTML 1.1 DTD sets used by EPUB 2 content.
fn resolve_entity(name: &str) -> Option<Cow<'static, str>> {
    if let Some(number) = name.strip_prefix('#') {
        let code = match number.strip_prefix(['x', 'X']) {
            Some(hex) => u32::from_str_radix(hex, 16).ok()?,
            None => number.parse().ok()?,
        };
        return char::from_u32(code).map(|c| Cow::Owned(c.to_string()));
    }
    resolve_html5_entity(name).map(Cow::Borrowed)
}

/// Serialize a tree back to XHTML.
pub fn serialize(document: &Document) -> String {
    let mut out = String::new();
    for node in &document.nodes {
        write_node(&mut out, node);
    }
    out
}

fn write_node(out: &mut String, node: &Node) {
    match node {
        Node::Element(element) => write_element(out, element),
        Node::Text(text) => escape_text(out, text),
        Node::Verbatim(raw) => out.push_str(raw),
    }
}

fn write_element(out: &mut String, element: &Element) {
    out.push('<');
    out.push_str(&element.name);
    for (key, value) in &element.attributes {
        out.push(' ');
        out.push_str(key);
        out.push_str("=\"");
        // Values were read raw; only a quote from a single-quoted source needs escaping
        out.push_str(&value.replace('"', "&quot;"));
        out.push('"');
    }

    if element.self_closing && element.children.is_empty() {
        out.push_str("/>");
        return;
    }

    out.push('>');
    for child in &element.children {
        write_node(out, child);
    }
    out.push_str("</");
    out.push_str(&element.name);
    out.push('>');
}

fn escape_text(out: &mut String, text: &str) {
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(c),
        }
    }
}

fn lossy(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes).into_owned()
}

/// Strip UTF-8 BOM (byte order mark) if present
fn strip_bom(data: &[u8]) -> &[u8] {
    data.strip_prefix(&[0xEF, 0xBB, 0xBF]).unwrap_or(data)
}
