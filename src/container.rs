//! EPUB container access for the translation path.
//!
//! A [`Book`] keeps every archive entry as raw bytes, in archive order, and
//! parses only the XHTML content documents listed in the package manifest.
//! Writing the book back re-serializes those documents and copies every other
//! entry unchanged.

use crate::error::{Error, Result};
use crate::markup::{self, Document};
use log::debug;
use quick_xml::events::Event;
use quick_xml::Reader;
use std::collections::HashMap;
use std::fs;
use std::io::{Read, Seek, Write};
use std::path::{Path, PathBuf};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

const XHTML_MEDIA_TYPE: &str = "application/xhtml+xml";

pub struct Book {
    /// `dc:title` from the package document, when present
    pub title: Option<String>,
    /// Content documents in manifest order
    pub documents: Vec<ContentDocument>,
    entries: Vec<ArchiveEntry>,
}

pub struct ContentDocument {
    /// Full path of the document inside the archive
    pub path: String,
    pub tree: Document,
    entry: usize,
}

struct ArchiveEntry {
    name: String,
    data: Vec<u8>,
    compression: CompressionMethod,
    is_dir: bool,
}

/// Read an EPUB from disk, parsing every XHTML document in its manifest.
pub fn read_book(path: &Path) -> Result<Book> {
    let file = fs::File::open(path).map_err(|e| container_error(path, e))?;
    read_book_from_reader(file, path)
}

fn read_book_from_reader<R: Read + Seek>(reader: R, path: &Path) -> Result<Book> {
    let mut archive = ZipArchive::new(reader).map_err(|e| container_error(path, e))?;

    let mut entries = Vec::with_capacity(archive.len());
    let mut index_by_name = HashMap::new();
    for i in 0..archive.len() {
        let mut file = archive.by_index(i).map_err(|e| container_error(path, e))?;
        let mut data = Vec::new();
        file.read_to_end(&mut data)
            .map_err(|e| container_error(path, e))?;
        index_by_name.insert(file.name().to_string(), i);
        entries.push(ArchiveEntry {
            name: file.name().to_string(),
            data,
            compression: file.compression(),
            is_dir: file.is_dir(),
        });
    }

    let container_xml = entry_data(&entries, &index_by_name, "META-INF/container.xml", path)?;
    let opf_path =
        find_opf_path(container_xml).map_err(|reason| container_error(path, reason))?;
    let opf_dir = Path::new(&opf_path)
        .parent()
        .map(|p| p.to_string_lossy().to_string())
        .unwrap_or_default();
    let package = parse_package(entry_data(&entries, &index_by_name, &opf_path, path)?)
        .map_err(|reason| container_error(path, reason))?;

    let mut documents = Vec::new();
    for href in &package.documents {
        let full_path = resolve_href(&opf_dir, href);
        let entry = index_by_name.get(&full_path).copied().ok_or_else(|| {
            container_error(path, format!("manifest item {} is not in the archive", href))
        })?;
        let tree = markup::parse(&entries[entry].data).map_err(|source| Error::MarkupParse {
            document: full_path.clone(),
            source,
        })?;
        documents.push(ContentDocument {
            path: full_path,
            tree,
            entry,
        });
    }

    debug!(
        "Read {} archive entries, {} content documents",
        entries.len(),
        documents.len()
    );

    Ok(Book {
        title: package.title,
        documents,
        entries,
    })
}

/// Write `book` as an EPUB at `path`.
///
/// The archive is assembled in a temporary file next to `path` and only moved
/// into place once complete, so a failed write never leaves a partial book.
pub fn write_book(path: &Path, book: &Book) -> Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    let write_error = |source: std::io::Error| Error::ContainerWrite {
        path: path.to_path_buf(),
        source,
    };

    let mut temp = temp_builder().tempfile_in(&dir).map_err(write_error)?;
    write_book_to_writer(book, temp.as_file_mut()).map_err(write_error)?;
    temp.persist(path).map_err(|e| write_error(e.error))?;
    Ok(())
}

/// Temp files default to owner-only access; the finished book is created like
/// any other output file, subject to the umask.
fn temp_builder() -> tempfile::Builder<'static, 'static> {
    let mut builder = tempfile::Builder::new();
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        builder.permissions(fs::Permissions::from_mode(0o666));
    }
    builder
}

fn write_book_to_writer<W: Write + Seek>(book: &Book, writer: W) -> std::io::Result<()> {
    let documents: HashMap<usize, &ContentDocument> =
        book.documents.iter().map(|d| (d.entry, d)).collect();
    let mut zip = ZipWriter::new(writer);

    // mimetype must come first and be stored uncompressed
    let mut order: Vec<usize> = (0..book.entries.len()).collect();
    order.sort_by_key(|&i| book.entries[i].name != "mimetype");

    for i in order {
        let entry = &book.entries[i];
        let method = if entry.name == "mimetype" || entry.compression == CompressionMethod::Stored {
            CompressionMethod::Stored
        } else {
            CompressionMethod::Deflated
        };
        let options = SimpleFileOptions::default().compression_method(method);

        if entry.is_dir {
            zip.add_directory(entry.name.as_str(), options)?;
            continue;
        }

        zip.start_file(entry.name.as_str(), options)?;
        match documents.get(&i) {
            Some(document) => zip.write_all(markup::serialize(&document.tree).as_bytes())?,
            None => zip.write_all(&entry.data)?,
        }
    }

    zip.finish()?;
    Ok(())
}

fn entry_data<'a>(
    entries: &'a [ArchiveEntry],
    index_by_name: &HashMap<String, usize>,
    name: &str,
    path: &Path,
) -> Result<&'a [u8]> {
    index_by_name
        .get(name)
        .map(|&i| entries[i].data.as_slice())
        .ok_or_else(|| container_error(path, format!("missing archive entry {}", name)))
}

fn container_error(path: &Path, reason: impl ToString) -> Error {
    Error::ContainerParse {
        path: path.to_path_buf(),
        reason: reason.to_string(),
    }
}

/// Parse META-INF/container.xml to find the OPF path.
fn find_opf_path(bytes: &[u8]) -> std::result::Result<String, String> {
    let mut reader = Reader::from_reader(bytes);
    reader.config_mut().trim_text(true);
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Empty(e)) | Ok(Event::Start(e)) if local_name(e.name().as_ref()) == b"rootfile" => {
                for attr in e.attributes().flatten() {
                    if attr.key.as_ref() == b"full-path" {
                        return String::from_utf8(attr.value.to_vec()).map_err(|e| e.to_string());
                    }
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(format!("invalid container.xml: {}", e)),
            _ => {}
        }
        buf.clear();
    }

    Err("no rootfile found in container.xml".to_string())
}

struct Package {
    title: Option<String>,
    /// Hrefs of XHTML manifest items, in manifest order
    documents: Vec<String>,
}

fn parse_package(bytes: &[u8]) -> std::result::Result<Package, String> {
    let mut reader = Reader::from_reader(bytes);
    reader.config_mut().trim_text(true);
    let mut buf = Vec::new();

    let mut title: Option<String> = None;
    let mut in_title = false;
    let mut documents = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) if local_name(e.name().as_ref()) == b"title" => {
                in_title = title.is_none();
            }
            Ok(Event::Empty(e)) | Ok(Event::Start(e)) if local_name(e.name().as_ref()) == b"item" => {
                let mut href = None;
                let mut media_type = None;
                for attr in e.attributes().flatten() {
                    match attr.key.as_ref() {
                        b"href" => href = Some(String::from_utf8_lossy(&attr.value).to_string()),
                        b"media-type" => {
                            media_type = Some(String::from_utf8_lossy(&attr.value).to_string())
                        }
                        _ => {}
                    }
                }
                if let (Some(href), Some(XHTML_MEDIA_TYPE)) = (href, media_type.as_deref()) {
                    documents.push(href);
                }
            }
            Ok(Event::Text(e)) if in_title => {
                title
                    .get_or_insert_with(String::new)
                    .push_str(&String::from_utf8_lossy(&e));
            }
            Ok(Event::End(e)) if local_name(e.name().as_ref()) == b"title" => in_title = false,
            Ok(Event::Eof) => break,
            Err(e) => return Err(format!("invalid package document: {}", e)),
            _ => {}
        }
        buf.clear();
    }

    Ok(Package { title, documents })
}

/// Archive path of a manifest href relative to the package directory
fn resolve_href(base: &str, href: &str) -> String {
    let decoded = percent_encoding::percent_decode_str(href).decode_utf8_lossy();

    let mut parts: Vec<&str> = if base.is_empty() {
        Vec::new()
    } else {
        base.split('/').collect()
    };
    for segment in decoded.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                parts.pop();
            }
            _ => parts.push(segment),
        }
    }
    parts.join("/")
}

/// Extract local name from potentially namespaced XML name
fn local_name(name: &[u8]) -> &[u8] {
    name.iter()
        .rposition(|&b| b == b':')
        .map(|i| &name[i + 1..])
        .unwrap_or(name)
}
