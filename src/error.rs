use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Failures reported by a translation engine for a single request
#[derive(Error, Debug)]
pub enum EngineError {
    /// The request could not be sent or timed out
    #[error("request failed: {0}")]
    RequestFailed(String),

    /// The engine answered with a non-success status
    #[error("engine responded with {status_code}: {message}")]
    Api { status_code: u16, message: String },

    /// The engine's answer could not be decoded
    #[error("failed to parse engine response: {0}")]
    Parse(String),
}

impl EngineError {
    /// Whether another attempt at the same request may succeed
    pub fn is_transient(&self) -> bool {
        match self {
            Self::RequestFailed(_) => true,
            Self::Api { status_code, .. } => *status_code == 429 || *status_code >= 500,
            Self::Parse(_) => false,
        }
    }
}

#[derive(Error, Debug)]
pub enum Error {
    #[error("cannot read EPUB {}: {reason}", .path.display())]
    ContainerParse { path: PathBuf, reason: String },

    #[error("cannot parse markup of {document}: {source}")]
    MarkupParse {
        document: String,
        #[source]
        source: MarkupError,
    },

    #[error("{}translation failed at chunk {} of {chunk_count}: {source}", document_prefix(.document), .chunk_index + 1)]
    Translation {
        document: Option<String>,
        chunk_index: usize,
        chunk_count: usize,
        #[source]
        source: EngineError,
    },

    #[error("cannot write EPUB {}: {source}", .path.display())]
    ContainerWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl Error {
    /// Attach the document path to a translation failure raised below the walker
    pub fn in_document(self, path: &str) -> Self {
        match self {
            Self::Translation {
                document: None,
                chunk_index,
                chunk_count,
                source,
            } => Self::Translation {
                document: Some(path.to_string()),
                chunk_index,
                chunk_count,
                source,
            },
            other => other,
        }
    }
}

fn document_prefix(document: &Option<String>) -> String {
    document
        .as_deref()
        .map(|d| format!("{}: ", d))
        .unwrap_or_default()
}

/// Why a markup document could not be turned into a tree
#[derive(Error, Debug)]
pub enum MarkupError {
    #[error("document is not valid UTF-8")]
    Encoding,

    #[error("malformed XML at byte {position}: {message}")]
    Syntax { position: u64, message: String },

    #[error("unknown entity &{0};")]
    UnknownEntity(String),

    #[error("closing tag </{0}> has no matching start tag")]
    UnmatchedEnd(String),

    #[error("element <{0}> is never closed")]
    Unclosed(String),

    #[error("document has no root element")]
    NoRoot,
}
