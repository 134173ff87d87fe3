//! Counters reported at the end of an export run.

use super::driver::{DocumentOutcome, DocumentReport, FileSource};

/// Statistics from one export run.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ExportStats {
    windows: usize,
    documents: usize,
    downloaded: usize,
    from_cache: usize,
    already_present: usize,
    fetch_failed: usize,
    sidecars: usize,
}

impl ExportStats {
    /// Creates a new stats tracker with zero counts.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of `searchDocuments` calls, including the final empty one.
    #[must_use]
    pub fn windows(&self) -> usize {
        self.windows
    }

    /// Number of documents seen.
    #[must_use]
    pub fn documents(&self) -> usize {
        self.documents
    }

    /// PDFs fetched from the API.
    #[must_use]
    pub fn downloaded(&self) -> usize {
        self.downloaded
    }

    /// PDFs copied from the cache.
    #[must_use]
    pub fn from_cache(&self) -> usize {
        self.from_cache
    }

    /// PDFs that already existed in the export tree.
    #[must_use]
    pub fn already_present(&self) -> usize {
        self.already_present
    }

    /// Documents whose binary the server refused.
    #[must_use]
    pub fn fetch_failed(&self) -> usize {
        self.fetch_failed
    }

    /// JSON sidecars written.
    #[must_use]
    pub fn sidecars(&self) -> usize {
        self.sidecars
    }

    pub(crate) fn record_window(&mut self, page_len: usize) {
        self.windows += 1;
        self.documents += page_len;
    }

    pub(crate) fn record(&mut self, report: &DocumentReport) {
        match report.outcome {
            DocumentOutcome::Exported {
                source: FileSource::Remote,
            } => self.downloaded += 1,
            DocumentOutcome::Exported {
                source: FileSource::Cache,
            } => self.from_cache += 1,
            DocumentOutcome::AlreadyPresent => self.already_present += 1,
            DocumentOutcome::FetchFailed { .. } => self.fetch_failed += 1,
        }
        if report.sidecar_written {
            self.sidecars += 1;
        }
    }
}
