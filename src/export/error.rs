//! Error types for the export driver.

use std::path::PathBuf;

use thiserror::Error;

use crate::api::ApiError;
use crate::cache::CacheError;
use crate::document::RecordError;
use crate::naming::TemplateError;
use crate::sidecar::SidecarError;

/// A fatal error while processing a single document.
#[derive(Debug, Error)]
pub enum DocumentError {
    /// Enrichment failed (missing attribute, unknown folder/type id).
    #[error(transparent)]
    Record(#[from] RecordError),

    /// The name template could not be filled.
    #[error(transparent)]
    Template(#[from] TemplateError),

    /// Cache read or write failed.
    #[error(transparent)]
    Cache(#[from] CacheError),

    /// Transport or write failure while fetching the document binary.
    #[error(transparent)]
    Api(#[from] ApiError),

    /// The JSON sidecar could not be written.
    #[error(transparent)]
    Sidecar(#[from] SidecarError),

    /// Target directory could not be created.
    #[error("cannot create directory {path}: {source}")]
    Io {
        /// Directory path.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// The server refused the document binary and the run is strict.
    #[error("server refused document file (HTTP {status})")]
    FetchRejected {
        /// The HTTP status code.
        status: u16,
    },
}

impl DocumentError {
    /// Creates an IO error.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Errors that abort an export run.
#[derive(Debug, Error)]
pub enum ExportError {
    /// Connectivity, authentication, metadata or search failure.
    #[error(transparent)]
    Api(#[from] ApiError),

    /// A search result element could not be parsed at all.
    #[error("malformed document record in id window starting at {window_start}: {source}")]
    MalformedRecord {
        /// First id of the window the record came from.
        window_start: u64,
        /// What was wrong with it.
        #[source]
        source: RecordError,
    },

    /// Processing of one document failed; the run stops there.
    #[error("export aborted at document #{doc_id}: {source}")]
    Document {
        /// Document being processed.
        doc_id: u64,
        /// What went wrong.
        #[source]
        source: DocumentError,
    },

    /// The cache directory could not be opened.
    #[error(transparent)]
    Cache(#[from] CacheError),

    /// The export root could not be created.
    #[error("cannot create export directory {path}: {source}")]
    Io {
        /// Export root.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },
}
