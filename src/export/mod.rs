//! Export run orchestration.
//!
//! [`run_export`] performs the whole session: connectivity probe, login,
//! metadata tables, the paginated export itself, and a best-effort logout.
//! Everything runs sequentially on the caller's task.

mod driver;
mod error;
mod stats;

use std::path::PathBuf;

use tracing::{debug, info, warn};

pub use driver::{
    DocumentOutcome, DocumentReport, ExportOptions, Exporter, FetchFailurePolicy, FileSource,
    ScanState,
};
pub use error::{DocumentError, ExportError};
pub use stats::ExportStats;

use crate::api::{Credentials, EcoDmsClient, Timeouts};
use crate::cache::CacheGateway;
use crate::metadata::NameTable;

/// Everything needed for one export run.
#[derive(Debug, Clone)]
pub struct ExportSettings {
    /// API base URL, e.g. `http://ecodms:8180/api`.
    pub base_url: String,
    /// Archive to connect to.
    pub archive_id: u32,
    /// Login.
    pub credentials: Credentials,
    /// HTTP timeouts.
    pub timeouts: Timeouts,
    /// Optional cache directory.
    pub cache_dir: Option<PathBuf>,
    /// Export behaviour.
    pub options: ExportOptions,
}

/// Runs a complete export.
///
/// Local directories are prepared first, then the session is opened. Once
/// `/connect` has succeeded, `/disconnect` is attempted whatever the outcome;
/// a failed disconnect is only logged.
///
/// # Errors
///
/// Returns [`ExportError`] on the first fatal failure: unreachable API,
/// rejected login, failed metadata/search request, or a per-document error.
pub async fn run_export(settings: &ExportSettings) -> Result<ExportStats, ExportError> {
    let export_root = &settings.options.export_root;
    std::fs::create_dir_all(export_root).map_err(|source| ExportError::Io {
        path: export_root.clone(),
        source,
    })?;
    let cache = settings
        .cache_dir
        .as_ref()
        .map(CacheGateway::open)
        .transpose()?;

    let client = EcoDmsClient::new(&settings.base_url, settings.timeouts)?;
    client.test().await?;
    client
        .connect(settings.archive_id, &settings.credentials)
        .await?;
    info!(archive_id = settings.archive_id, "Connected to ecoDMS");

    let result = export_session(&client, cache, &settings.options).await;

    match client.disconnect().await {
        Ok(()) => debug!("Disconnected"),
        Err(error) => warn!(error = %error, "Disconnect failed"),
    }
    result
}

async fn export_session(
    client: &EcoDmsClient,
    cache: Option<CacheGateway>,
    options: &ExportOptions,
) -> Result<ExportStats, ExportError> {
    let folders = NameTable::from_folders(client.folders().await?);
    debug!(count = folders.len(), "Loaded folders");
    let doc_types = NameTable::from_doc_types(client.doc_types().await?);
    debug!(count = doc_types.len(), "Loaded document types");

    Exporter::new(client, folders, doc_types, cache, options.clone())
        .run()
        .await
}
