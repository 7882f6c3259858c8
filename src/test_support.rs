//! Test doubles shared by the unit tests.

use crate::engine::Translate;
use crate::error::EngineError;
use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::io::{Cursor, Write};
use zip::write::SimpleFileOptions;
use zip::ZipWriter;

/// Engine that answers from a fixed table (uppercasing anything else) and
/// records every request it receives.
pub struct ScriptedEngine {
    table: HashMap<String, String>,
    calls: RefCell<Vec<String>>,
    fail_on: Cell<Option<usize>>,
}

impl ScriptedEngine {
    pub fn new(table: &[(&str, &str)]) -> Self {
        Self {
            table: table
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            calls: RefCell::new(Vec::new()),
            fail_on: Cell::new(None),
        }
    }

    /// Fail the `n`th call (1-based)
    pub fn failing_on(self, n: usize) -> Self {
        self.fail_on.set(Some(n));
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.borrow().clone()
    }
}

impl Translate for ScriptedEngine {
    fn translate(&self, text: &str) -> Result<String, EngineError> {
        self.calls.borrow_mut().push(text.to_string());
        if self.fail_on.get() == Some(self.calls.borrow().len()) {
            return Err(EngineError::RequestFailed("engine went away".to_string()));
        }
        Ok(self
            .table
            .get(text)
            .cloned()
            .unwrap_or_else(|| text.to_uppercase()))
    }
}

pub const CONTAINER_XML: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<container version="1.0" xmlns="urn:oasis:names:tc:opendocument:xmlns:container">
  <rootfiles>
    <rootfile full-path="OEBPS/content.opf" media-type="application/oebps-package+xml"/>
  </rootfiles>
</container>"#;

pub const OPF: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<package xmlns="http://www.idpf.org/2007/opf" version="3.0" unique-identifier="id">
  <metadata xmlns:dc="http://purl.org/dc/elements/1.1/">
    <dc:title>Le Livre</dc:title>
    <dc:identifier id="id">urn:uuid:test</dc:identifier>
    <dc:language>fr</dc:language>
  </metadata>
  <manifest>
    <item id="nav" href="nav.xhtml" media-type="application/xhtml+xml" properties="nav"/>
    <item id="css" href="style.css" media-type="text/css"/>
    <item id="c1" href="Text/chapitre%201.xhtml" media-type="application/xhtml+xml"/>
    <item id="c2" href="Text/chapitre2.xhtml" media-type="application/xhtml+xml"/>
    <item id="img" href="Images/cover.png" media-type="image/png"/>
  </manifest>
  <spine>
    <itemref idref="c1"/>
    <itemref idref="c2"/>
  </spine>
</package>"#;

pub const NAV: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<html xmlns="http://www.w3.org/1999/xhtml" xmlns:epub="http://www.idpf.org/2007/ops"><head><title>Table</title></head><body><nav epub:type="toc"><ol><li><a href="Text/chapitre%201.xhtml">Un</a></li></ol></nav></body></html>"#;

pub const CHAPTER_ONE: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<html xmlns="http://www.w3.org/1999/xhtml"><head><title>I</title></head><body><p>Bonjour</p><p>   </p><p>Le monde.</p></body></html>"#;

pub const CHAPTER_TWO: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<html xmlns="http://www.w3.org/1999/xhtml"><head><title>II</title></head><body><p class="x">Une phrase. Deux phrases. Trois phrases.</p></body></html>"#;

pub const COVER_PNG: &[u8] = &[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, 0, 1, 2, 3];

pub const STYLE_CSS: &str = "p { text-indent: 1em; }\n";

/// A small but complete EPUB: two chapters, a nav document, a stylesheet and an image.
pub fn sample_epub() -> Vec<u8> {
    build_epub(&[
        ("OEBPS/content.opf", OPF.as_bytes()),
        ("OEBPS/nav.xhtml", NAV.as_bytes()),
        ("OEBPS/style.css", STYLE_CSS.as_bytes()),
        ("OEBPS/Text/chapitre 1.xhtml", CHAPTER_ONE.as_bytes()),
        ("OEBPS/Text/chapitre2.xhtml", CHAPTER_TWO.as_bytes()),
        ("OEBPS/Images/cover.png", COVER_PNG),
    ])
}

/// Package `files` after the mimetype and container entries.
pub fn build_epub(files: &[(&str, &[u8])]) -> Vec<u8> {
    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    let stored = SimpleFileOptions::default().compression_method(zip::CompressionMethod::Stored);
    let deflated = SimpleFileOptions::default().compression_method(zip::CompressionMethod::Deflated);

    zip.start_file("mimetype", stored).unwrap();
    zip.write_all(b"application/epub+zip").unwrap();
    zip.start_file("META-INF/container.xml", deflated).unwrap();
    zip.write_all(CONTAINER_XML.as_bytes()).unwrap();
    for (name, data) in files {
        zip.start_file(*name, deflated).unwrap();
        zip.write_all(data).unwrap();
    }

    zip.finish().unwrap().into_inner()
}
