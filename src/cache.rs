//! Local cache of previously downloaded document binaries.
//!
//! Cache entries are flat files named `<docId>_<anything>`. The exporter
//! itself writes `<docId>_.pdf`, the same pattern the ecoDMS manual export
//! produces, so a cache directory can be pre-populated from such an export.
//! Cache names are independent of the name template.

use std::fs::{self, File, FileTimes};
use std::io::{self, ErrorKind, Read, Write};
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, instrument};

use crate::naming::{PARTIAL_SUFFIX, partial_path};

const COPY_BUFFER_SIZE: usize = 64 * 1024;

/// Errors raised by cache lookups and writes.
#[derive(Debug, Error)]
pub enum CacheError {
    /// File system error on a cache path.
    #[error("cache IO error on {path}: {source}")]
    Io {
        /// Path being read or written.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: io::Error,
    },
}

impl CacheError {
    /// Creates an IO error.
    pub fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Cache directory keyed by document id.
#[derive(Debug, Clone)]
pub struct CacheGateway {
    dir: PathBuf,
}

impl CacheGateway {
    /// Opens a cache directory, creating it if absent.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::Io`] if the directory cannot be created.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self, CacheError> {
        let dir = dir.into();
        fs::create_dir_all(&dir).map_err(|e| CacheError::io(&dir, e))?;
        Ok(Self { dir })
    }

    /// The cache directory.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// File name the exporter uses when storing `doc_id`.
    #[must_use]
    pub fn entry_name(doc_id: u64) -> String {
        format!("{doc_id}_.pdf")
    }

    /// Finds a cached binary for `doc_id`.
    ///
    /// Any regular file whose name starts with `<doc_id>_` matches, except
    /// unfinished `.part` copies. When several match, the lexicographically
    /// smallest name wins.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::Io`] if the directory cannot be listed.
    pub fn lookup(&self, doc_id: u64) -> Result<Option<PathBuf>, CacheError> {
        let prefix = format!("{doc_id}_");
        let entries = match fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(CacheError::io(&self.dir, e)),
        };

        let mut best: Option<String> = None;
        for entry in entries {
            let entry = entry.map_err(|e| CacheError::io(&self.dir, e))?;
            let Ok(name) = entry.file_name().into_string() else {
                continue;
            };
            if !name.starts_with(&prefix)
                || name.ends_with(PARTIAL_SUFFIX)
                || !entry.path().is_file()
            {
                continue;
            }
            if best.as_ref().is_none_or(|current| name < *current) {
                best = Some(name);
            }
        }
        Ok(best.map(|name| self.dir.join(name)))
    }

    /// Copies the cached binary for `doc_id` to `target`, if one exists.
    ///
    /// Returns the cache file that was used.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::Io`] if listing or copying fails.
    #[instrument(skip(self, target), fields(target = %target.display()))]
    pub fn restore(&self, doc_id: u64, target: &Path) -> Result<Option<PathBuf>, CacheError> {
        let Some(source) = self.lookup(doc_id)? else {
            debug!("Did not find a matching file in cache");
            return Ok(None);
        };
        debug!(source = %source.display(), "Copying from cache");
        copy_preserving_times(&source, target)?;
        Ok(Some(source))
    }

    /// Stores a freshly downloaded binary as `<doc_id>_.pdf`.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::Io`] if the copy fails.
    #[instrument(skip(self, source), fields(source = %source.display()))]
    pub fn store(&self, doc_id: u64, source: &Path) -> Result<PathBuf, CacheError> {
        let entry = self.dir.join(Self::entry_name(doc_id));
        copy_preserving_times(source, &entry)?;
        debug!(entry = %entry.display(), "Stored in cache");
        Ok(entry)
    }
}

/// Copies `source` to `target` through `<target>.part`, carrying over
/// modification/access times and permissions. `target` only appears once
/// the copy is complete; the partial file is removed on failure.
fn copy_preserving_times(source: &Path, target: &Path) -> Result<(), CacheError> {
    let part_path = partial_path(target);
    let result = copy_into(source, &part_path)
        .and_then(|()| fs::rename(&part_path, target).map_err(|e| CacheError::io(target, e)));
    if result.is_err() {
        debug!(path = %part_path.display(), "cleaning up partial file after error");
        let _ = fs::remove_file(&part_path);
    }
    result
}

fn copy_into(source: &Path, part_path: &Path) -> Result<(), CacheError> {
    let metadata = fs::metadata(source).map_err(|e| CacheError::io(source, e))?;
    let mut reader = File::open(source).map_err(|e| CacheError::io(source, e))?;
    let mut writer = File::create(part_path).map_err(|e| CacheError::io(part_path, e))?;

    let mut buffer = vec![0_u8; COPY_BUFFER_SIZE];
    loop {
        let read = match reader.read(&mut buffer) {
            Ok(0) => break,
            Ok(read) => read,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(CacheError::io(source, e)),
        };
        writer
            .write_all(&buffer[..read])
            .map_err(|e| CacheError::io(part_path, e))?;
    }

    let mut times = FileTimes::new();
    if let Ok(modified) = metadata.modified() {
        times = times.set_modified(modified);
    }
    if let Ok(accessed) = metadata.accessed() {
        times = times.set_accessed(accessed);
    }
    writer
        .set_times(times)
        .map_err(|e| CacheError::io(part_path, e))?;
    drop(writer);

    fs::set_permissions(part_path, metadata.permissions())
        .map_err(|e| CacheError::io(part_path, e))
}
