//! CLI argument definitions using clap derive macros.

use std::path::PathBuf;

use clap::Parser;

/// Export documents from an ecoDMS archive into a directory tree.
///
/// Documents are written to EXPORT_DIR using their classification metadata
/// for the folder hierarchy and file names. Optionally all metadata can be
/// dumped as JSON next to the documents.
#[derive(Parser, Debug)]
#[command(name = "ecodms-export")]
#[command(author, version, about)]
pub struct Args {
    /// Enable debug logging
    #[arg(long, overrides_with = "no_debug")]
    pub debug: bool,

    /// Disable debug logging
    #[arg(long, overrides_with = "debug")]
    pub no_debug: bool,

    /// Dump the document classification metadata as JSON next to each PDF
    #[arg(long, overrides_with = "no_export_json")]
    pub export_json: bool,

    /// Do not write JSON metadata files
    #[arg(long, overrides_with = "export_json")]
    pub no_export_json: bool,

    /// Suppress non-error output
    #[arg(short, long)]
    pub quiet: bool,

    /// Hostname of the ecoDMS system [default: ecodms]
    #[arg(long, env = "ECODMS_HOST")]
    pub host: Option<String>,

    /// Port of the ecoDMS API [default: 8180]
    #[arg(long, value_parser = clap::value_parser!(u16).range(1..))]
    pub port: Option<u16>,

    /// Username to access the ecoDMS system
    #[arg(long, env = "ECODMS_USER")]
    pub user: Option<String>,

    /// Password to access the ecoDMS system
    #[arg(long, env = "ECODMS_PASSWORD", hide_env_values = true)]
    pub password: String,

    /// Archive id to export. A default ecoDMS instance has only one archive [default: 1]
    #[arg(long)]
    pub archive_id: Option<u32>,

    /// Cache directory used to avoid repeated downloads from ecoDMS
    #[arg(long)]
    pub cache_dir: Option<PathBuf>,

    /// Template for exported file names [default: {year}/{folder}/{docart}/{cdate}_{docid}_{bemerkung}]
    #[arg(long)]
    pub name_template: Option<String>,

    /// Abort the run when the server refuses a document file instead of skipping it
    #[arg(long)]
    pub strict: bool,

    /// HTTP connect timeout in seconds (1-3600) [default: 30]
    #[arg(long, value_parser = clap::value_parser!(u64).range(1..=3600))]
    pub connect_timeout: Option<u64>,

    /// Seconds without response data before a request fails (1-3600) [default: 300]
    #[arg(long, value_parser = clap::value_parser!(u64).range(1..=3600))]
    pub read_timeout: Option<u64>,

    /// Directory the documents are exported into (created if absent)
    pub export_dir: PathBuf,
}

impl Args {
    /// `Some(true)` for `--debug`, `Some(false)` for `--no-debug`, else `None`.
    #[must_use]
    pub fn debug_flag(&self) -> Option<bool> {
        toggle(self.debug, self.no_debug)
    }

    /// `Some(true)` for `--export-json`, `Some(false)` for `--no-export-json`, else `None`.
    #[must_use]
    pub fn export_json_flag(&self) -> Option<bool> {
        toggle(self.export_json, self.no_export_json)
    }
}

fn toggle(on: bool, off: bool) -> Option<bool> {
    if on {
        Some(true)
    } else if off {
        Some(false)
    } else {
        None
    }
}
