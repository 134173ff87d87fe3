//! Pagination driver and per-document pipeline.
//!
//! The document set is walked in ascending id windows of
//! [`SEARCH_WINDOW_SIZE`]. There is no server-side count or cursor: the first
//! window that comes back empty ends the scan.

use std::path::{Path, PathBuf};

use tracing::{Instrument, debug, error, info, info_span};

use super::error::{DocumentError, ExportError};
use super::stats::ExportStats;
use crate::api::{ApiError, EcoDmsClient};
use crate::cache::CacheGateway;
use crate::constants::SEARCH_WINDOW_SIZE;
use crate::document::DocumentRecord;
use crate::metadata::{DocTypeTable, FolderTable};
use crate::naming::{ExportTarget, NameTemplate};
use crate::sidecar::write_sidecar;

/// What to do when the server answers a document download with non-200.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FetchFailurePolicy {
    /// Log it, leave the PDF unwritten and go on with the next document.
    #[default]
    Continue,
    /// Abort the run like any other per-document failure.
    Abort,
}

/// Per-run export settings.
#[derive(Debug, Clone)]
pub struct ExportOptions {
    /// Absolute export root.
    pub export_root: PathBuf,
    /// Template for paths below the export root.
    pub template: NameTemplate,
    /// Write a JSON sidecar next to each PDF.
    pub export_json: bool,
    /// Handling of refused document downloads.
    pub fetch_failure_policy: FetchFailurePolicy,
}

/// Where an exported PDF came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileSource {
    /// Copied from the cache directory.
    Cache,
    /// Downloaded from the API.
    Remote,
}

/// Non-fatal result of processing one document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentOutcome {
    /// The PDF was written.
    Exported {
        /// Where it came from.
        source: FileSource,
    },
    /// The PDF already existed; nothing was fetched.
    AlreadyPresent,
    /// The server refused the binary; the PDF was not written.
    FetchFailed {
        /// The HTTP status code.
        status: u16,
    },
}

/// Summary of one processed document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentReport {
    /// Document id.
    pub doc_id: u64,
    /// What happened to the PDF.
    pub outcome: DocumentOutcome,
    /// Whether a JSON sidecar was written.
    pub sidecar_written: bool,
}

/// Scan state of the pagination driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanState {
    /// Next request covers `[window_start, window_start + SEARCH_WINDOW_SIZE)`.
    Scanning {
        /// First id of the next window.
        window_start: u64,
    },
    /// An empty window was seen.
    Done,
}

impl ScanState {
    /// Initial state: the window starting at id 0.
    #[must_use]
    pub fn start() -> Self {
        Self::Scanning { window_start: 0 }
    }

    /// Transition after a window returned `page_len` documents.
    #[must_use]
    pub fn advance(self, page_len: usize) -> Self {
        match self {
            Self::Scanning { window_start } if page_len > 0 => Self::Scanning {
                window_start: window_start + SEARCH_WINDOW_SIZE,
            },
            _ => Self::Done,
        }
    }
}

/// Walks the archive and exports every document.
///
/// Holds the metadata tables for the whole run; records are processed one
/// window at a time and dropped afterwards.
#[derive(Debug)]
pub struct Exporter<'a> {
    client: &'a EcoDmsClient,
    folders: FolderTable,
    doc_types: DocTypeTable,
    cache: Option<CacheGateway>,
    options: ExportOptions,
}

impl<'a> Exporter<'a> {
    /// Creates an exporter over an already connected client.
    #[must_use]
    pub fn new(
        client: &'a EcoDmsClient,
        folders: FolderTable,
        doc_types: DocTypeTable,
        cache: Option<CacheGateway>,
        options: ExportOptions,
    ) -> Self {
        Self {
            client,
            folders,
            doc_types,
            cache,
            options,
        }
    }

    /// Scans all id windows until an empty one and processes each document.
    ///
    /// # Errors
    ///
    /// Returns [`ExportError::Api`] when a search request fails,
    /// [`ExportError::MalformedRecord`] for a record without a usable `docId`,
    /// and [`ExportError::Document`] for the first document whose processing
    /// fails. Documents whose binary the server refuses are counted and
    /// skipped under [`FetchFailurePolicy::Continue`].
    pub async fn run(&self) -> Result<ExportStats, ExportError> {
        let mut stats = ExportStats::new();
        let mut state = ScanState::start();

        while let ScanState::Scanning { window_start } = state {
            let window_end = window_start + SEARCH_WINDOW_SIZE;
            info!(from = window_start, to = window_end, "Processing documents");
            let page = self.client.search_id_window(window_start, window_end).await?;
            stats.record_window(page.len());
            state = state.advance(page.len());

            for raw in page {
                let record = DocumentRecord::from_value(raw).map_err(|source| {
                    error!(window_start, error = %source, "Malformed document record");
                    ExportError::MalformedRecord {
                        window_start,
                        source,
                    }
                })?;
                let doc_id = record.doc_id();
                let span = info_span!("document", doc_id);
                match self.process_document(&record).instrument(span).await {
                    Ok(report) => stats.record(&report),
                    Err(source) => {
                        error!(doc_id, error = %source, "Caught error while processing document");
                        return Err(ExportError::Document { doc_id, source });
                    }
                }
            }
        }

        info!(
            windows = stats.windows(),
            documents = stats.documents(),
            downloaded = stats.downloaded(),
            from_cache = stats.from_cache(),
            already_present = stats.already_present(),
            fetch_failed = stats.fetch_failed(),
            sidecars = stats.sidecars(),
            "Export complete"
        );
        Ok(stats)
    }

    /// Runs the pipeline for one document: enrich, resolve paths, skip if the
    /// PDF exists, otherwise restore from cache or download, then write the
    /// optional sidecar.
    ///
    /// # Errors
    ///
    /// Returns [`DocumentError`] for anything that must abort the run.
    pub async fn process_document(
        &self,
        record: &DocumentRecord,
    ) -> Result<DocumentReport, DocumentError> {
        let doc_id = record.doc_id();
        let attributes = record.enrich(&self.folders, &self.doc_types)?;
        let target =
            ExportTarget::resolve(&self.options.export_root, &self.options.template, &attributes)?;
        let pdf_path = target.pdf_path();
        debug!(path = %pdf_path.display(), "Processing document");

        let outcome = if pdf_path.exists() {
            debug!("File already exists");
            DocumentOutcome::AlreadyPresent
        } else {
            target.ensure_directory().map_err(|e| {
                DocumentError::io(target.directory().unwrap_or(target.base()), e)
            })?;
            self.fetch_binary(doc_id, &pdf_path).await?
        };

        let sidecar_written = if self.options.export_json {
            write_sidecar(&target.json_path(), record.raw())?
        } else {
            false
        };

        Ok(DocumentReport {
            doc_id,
            outcome,
            sidecar_written,
        })
    }

    async fn fetch_binary(
        &self,
        doc_id: u64,
        pdf_path: &Path,
    ) -> Result<DocumentOutcome, DocumentError> {
        if let Some(cache) = &self.cache
            && cache.restore(doc_id, pdf_path)?.is_some()
        {
            return Ok(DocumentOutcome::Exported {
                source: FileSource::Cache,
            });
        }

        match self.client.download_document(doc_id, pdf_path).await {
            Ok(_) => {
                if let Some(cache) = &self.cache {
                    cache.store(doc_id, pdf_path)?;
                }
                Ok(DocumentOutcome::Exported {
                    source: FileSource::Remote,
                })
            }
            Err(ApiError::DocumentFetch { status, .. }) => {
                error!(doc_id, status, "Failed to retrieve document file");
                match self.options.fetch_failure_policy {
                    FetchFailurePolicy::Continue => Ok(DocumentOutcome::FetchFailed { status }),
                    FetchFailurePolicy::Abort => Err(DocumentError::FetchRejected { status }),
                }
            }
            Err(other) => Err(other.into()),
        }
    }
}
