//! ecoDMS export library.
//!
//! Exports every document of an ecoDMS archive into a local directory tree.
//! Folder hierarchy and file names come from each document's classification
//! attributes through a name template; an optional cache directory avoids
//! downloading the same binary twice.
//!
//! # Architecture
//!
//! - [`slug`] - Filesystem-safe slugs for attribute values
//! - [`metadata`] - Folder and document type lookup tables
//! - [`document`] - Search records and attribute enrichment
//! - [`naming`] - Name templates and export target paths
//! - [`cache`] - Cache directory lookups and writes
//! - [`api`] - ecoDMS REST client
//! - [`sidecar`] - JSON metadata files next to exported PDFs
//! - [`export`] - Pagination driver and run orchestration
//! - [`app_config`] - Optional config file with CLI defaults

// Clippy lints - strict for library code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod api;
pub mod app_config;
pub mod cache;
pub mod constants;
pub mod document;
pub mod export;
pub mod metadata;
pub mod naming;
pub mod sidecar;
pub mod slug;
mod user_agent;

// Re-export commonly used types
pub use api::{ApiError, Credentials, EcoDmsClient, SearchFilter, Timeouts};
pub use cache::{CacheError, CacheGateway};
pub use constants::{NOT_ASSIGNED, SEARCH_WINDOW_SIZE};
pub use document::{DocumentRecord, EnrichedAttributes, RecordError};
pub use export::{
    DocumentError, DocumentOutcome, DocumentReport, ExportError, ExportOptions, ExportSettings,
    ExportStats, Exporter, FetchFailurePolicy, FileSource, run_export,
};
pub use metadata::{DocTypeTable, FolderTable, NameTable};
pub use naming::{ExportTarget, NameTemplate, TemplateError};
pub use slug::slugify;
