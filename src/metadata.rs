//! Folder and document-type lookup tables.
//!
//! ecoDMS classifies documents by numeric folder and type ids. The two list
//! endpoints (`/folders`, `/types`) are read once per run and turned into
//! read-only [`NameTable`]s used to translate those ids into display names.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::constants::NOT_ASSIGNED;

/// Identifier as it appears on the wire: ecoDMS sends some ids as JSON
/// strings and others as numbers.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum RawId {
    /// Numeric id, e.g. `7`.
    Number(u64),
    /// Textual id, e.g. `"7"`.
    Text(String),
}

impl RawId {
    /// Returns the canonical string key used by [`NameTable`].
    #[must_use]
    pub fn to_key(&self) -> String {
        match self {
            Self::Number(n) => n.to_string(),
            Self::Text(s) => s.trim().to_string(),
        }
    }
}

impl fmt::Display for RawId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_key())
    }
}

/// One element of the `/folders` response.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct FolderEntry {
    /// Folder object id.
    #[serde(rename = "oId")]
    pub o_id: RawId,
    /// Folder display name.
    pub foldername: String,
}

/// One element of the `/types` response.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DocTypeEntry {
    /// Document type id.
    pub id: RawId,
    /// Document type display name.
    pub name: String,
}

/// Mapping from a classification id to its display name.
///
/// Always contains the key `"0"` mapped to [`NOT_ASSIGNED`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NameTable {
    names: BTreeMap<String, String>,
}

/// Folder id → folder name.
pub type FolderTable = NameTable;

/// Document type id → type name.
pub type DocTypeTable = NameTable;

impl NameTable {
    fn from_pairs(pairs: impl IntoIterator<Item = (String, String)>) -> Self {
        let mut names: BTreeMap<String, String> = pairs.into_iter().collect();
        // ecoDMS never lists id 0; it marks unclassified documents.
        names.insert("0".to_string(), NOT_ASSIGNED.to_string());
        Self { names }
    }

    /// Builds the folder table from the `/folders` response.
    #[must_use]
    pub fn from_folders(entries: Vec<FolderEntry>) -> FolderTable {
        Self::from_pairs(
            entries
                .into_iter()
                .map(|entry| (entry.o_id.to_key(), entry.foldername)),
        )
    }

    /// Builds the document type table from the `/types` response.
    #[must_use]
    pub fn from_doc_types(entries: Vec<DocTypeEntry>) -> DocTypeTable {
        Self::from_pairs(
            entries
                .into_iter()
                .map(|entry| (entry.id.to_key(), entry.name)),
        )
    }

    /// Looks up the display name for `id`.
    #[must_use]
    pub fn name_for(&self, id: &str) -> Option<&str> {
        self.names.get(id.trim()).map(String::as_str)
    }

    /// Number of entries, including the `"0"` sentinel.
    #[must_use]
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// Always `false`: the sentinel entry is present in every table.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Iterates over `(id, name)` pairs in id order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.names.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}
