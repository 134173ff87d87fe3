//! JSON sidecar files next to exported PDFs.
//!
//! The sidecar is the document record exactly as `searchDocuments` returned
//! it, pretty-printed with four-space indentation.

use std::fs;
use std::io::{BufWriter, ErrorKind, Write};
use std::path::Path;

use serde::Serialize;
use serde_json::ser::{PrettyFormatter, Serializer};
use thiserror::Error;
use tracing::{debug, instrument};

/// Errors produced by sidecar generation.
#[derive(Debug, Error)]
pub enum SidecarError {
    /// I/O error writing the sidecar file to disk.
    #[error("I/O error writing sidecar: {0}")]
    Io(#[from] std::io::Error),
    /// JSON serialization error.
    #[error("JSON serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Writes `record` to `path` unless the file already exists.
///
/// Returns `true` when a file was written and `false` when an existing
/// sidecar was left untouched.
///
/// # Errors
///
/// Returns [`SidecarError`] on I/O or serialization failure. A partially
/// written file is removed.
#[instrument(skip(record), fields(path = %path.display()))]
pub fn write_sidecar<T: Serialize + ?Sized>(path: &Path, record: &T) -> Result<bool, SidecarError> {
    let file = match fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(path)
    {
        Ok(file) => file,
        Err(err) if err.kind() == ErrorKind::AlreadyExists => {
            debug!("Sidecar already exists, skipping");
            return Ok(false);
        }
        Err(err) => return Err(err.into()),
    };

    let write_result = write_pretty(BufWriter::new(file), record);
    if let Err(err) = write_result {
        let _ = fs::remove_file(path);
        return Err(err);
    }

    debug!("Sidecar created");
    Ok(true)
}

fn write_pretty<W: Write, T: Serialize + ?Sized>(
    mut writer: W,
    record: &T,
) -> Result<(), SidecarError> {
    let formatter = PrettyFormatter::with_indent(b"    ");
    let mut serializer = Serializer::with_formatter(&mut writer, formatter);
    record.serialize(&mut serializer)?;
    writer.flush()?;
    Ok(())
}
