//! Document records returned by `searchDocuments` and their enrichment into
//! template-ready attributes.

use std::collections::BTreeMap;

use serde_json::{Map, Value};
use thiserror::Error;
use tracing::trace;

use crate::metadata::{DocTypeTable, FolderTable};
use crate::slug::slugify;

/// Attribute holding the folder id.
pub const FOLDER_ATTRIBUTE: &str = "folder";
/// Attribute holding the document type id.
pub const DOC_TYPE_ATTRIBUTE: &str = "docart";
/// Attribute holding the creation date (`YYYY-MM-DD...`).
pub const CREATION_DATE_ATTRIBUTE: &str = "cdate";
/// Attribute holding the document id.
pub const DOC_ID_ATTRIBUTE: &str = "docid";

/// Errors raised while reading or enriching a document record.
#[derive(Debug, Error)]
pub enum RecordError {
    /// The record has no `docId` field.
    #[error("document record has no docId")]
    MissingDocId,

    /// The `docId` field is not a non-negative integer.
    #[error("document record has invalid docId {value}")]
    InvalidDocId {
        /// The offending value, rendered as JSON.
        value: String,
    },

    /// The record is not a JSON object.
    #[error("document record is not a JSON object")]
    NotAnObject,

    /// `classifyAttributes` is present but not a JSON object.
    #[error("classifyAttributes of document #{doc_id} is not a JSON object")]
    InvalidAttributes {
        /// Document id.
        doc_id: u64,
    },

    /// A classification attribute required for enrichment is missing.
    #[error("document has no `{name}` classification attribute")]
    MissingAttribute {
        /// Attribute name.
        name: &'static str,
    },

    /// The folder id is not in the folder table.
    #[error("unknown folder id {id}")]
    UnknownFolder {
        /// Folder id from the record.
        id: String,
    },

    /// The document type id is not in the type table.
    #[error("unknown document type id {id}")]
    UnknownDocType {
        /// Type id from the record.
        id: String,
    },
}

/// A document as returned by the search endpoint.
///
/// The raw JSON is kept alongside the parsed fields so the sidecar can dump
/// the record exactly as the server sent it.
#[derive(Debug, Clone)]
pub struct DocumentRecord {
    doc_id: u64,
    attributes: Map<String, Value>,
    raw: Value,
}

impl DocumentRecord {
    /// Parses a search result element.
    ///
    /// `docId` may be a JSON number or a numeric string. A missing
    /// `classifyAttributes` object is treated as empty.
    ///
    /// # Errors
    ///
    /// Returns [`RecordError`] if the element is not an object, if `docId` is
    /// missing or not a non-negative integer, or if `classifyAttributes` is not
    /// an object.
    pub fn from_value(raw: Value) -> Result<Self, RecordError> {
        let object = raw.as_object().ok_or(RecordError::NotAnObject)?;
        let doc_id = parse_doc_id(object.get("docId").ok_or(RecordError::MissingDocId)?)?;
        let attributes = match object.get("classifyAttributes") {
            None | Some(Value::Null) => Map::new(),
            Some(Value::Object(map)) => map.clone(),
            Some(_) => return Err(RecordError::InvalidAttributes { doc_id }),
        };
        Ok(Self {
            doc_id,
            attributes,
            raw,
        })
    }

    /// The ecoDMS document id.
    #[must_use]
    pub fn doc_id(&self) -> u64 {
        self.doc_id
    }

    /// Raw classification attributes.
    #[must_use]
    pub fn attributes(&self) -> &Map<String, Value> {
        &self.attributes
    }

    /// The record exactly as received.
    #[must_use]
    pub fn raw(&self) -> &Value {
        &self.raw
    }

    /// Translates folder/type ids, derives `year`/`month`/`day` from `cdate`
    /// and slugifies every value.
    ///
    /// # Errors
    ///
    /// Returns [`RecordError`] if `folder`, `docart` or `cdate` is missing, or
    /// if the folder or type id has no entry in its table.
    pub fn enrich(
        &self,
        folders: &FolderTable,
        doc_types: &DocTypeTable,
    ) -> Result<EnrichedAttributes, RecordError> {
        let mut values: BTreeMap<String, String> = self
            .attributes
            .iter()
            .map(|(key, value)| (key.clone(), render_value(value)))
            .collect();

        let folder = translate(&values, FOLDER_ATTRIBUTE, |id| {
            folders
                .name_for(id)
                .ok_or_else(|| RecordError::UnknownFolder { id: id.to_string() })
        })?;
        let doc_type = translate(&values, DOC_TYPE_ATTRIBUTE, |id| {
            doc_types
                .name_for(id)
                .ok_or_else(|| RecordError::UnknownDocType { id: id.to_string() })
        })?;
        let cdate = values
            .get(CREATION_DATE_ATTRIBUTE)
            .ok_or(RecordError::MissingAttribute {
                name: CREATION_DATE_ATTRIBUTE,
            })?;
        let year = char_slice(cdate, 0, 4);
        let month = char_slice(cdate, 5, 7);
        let day = char_slice(cdate, 8, 10);

        values.insert(FOLDER_ATTRIBUTE.to_string(), folder);
        values.insert(DOC_TYPE_ATTRIBUTE.to_string(), doc_type);
        values.insert("year".to_string(), year);
        values.insert("month".to_string(), month);
        values.insert("day".to_string(), day);
        values
            .entry(DOC_ID_ATTRIBUTE.to_string())
            .or_insert_with(|| self.doc_id.to_string());

        for value in values.values_mut() {
            *value = slugify(value, false);
        }
        trace!(doc_id = self.doc_id, attributes = ?values, "enriched attributes");
        Ok(EnrichedAttributes { values })
    }
}

fn translate<'t>(
    values: &BTreeMap<String, String>,
    name: &'static str,
    lookup: impl FnOnce(&str) -> Result<&'t str, RecordError>,
) -> Result<String, RecordError> {
    let id = values
        .get(name)
        .ok_or(RecordError::MissingAttribute { name })?;
    lookup(id).map(str::to_string)
}

fn parse_doc_id(value: &Value) -> Result<u64, RecordError> {
    let parsed = match value {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.trim().parse::<u64>().ok(),
        _ => None,
    };
    parsed.ok_or_else(|| RecordError::InvalidDocId {
        value: value.to_string(),
    })
}

/// Renders an attribute value as plain text: strings verbatim, `null` as
/// empty, everything else as compact JSON.
fn render_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// Character-based `[start, end)` slice that shortens instead of failing.
fn char_slice(value: &str, start: usize, end: usize) -> String {
    value.chars().skip(start).take(end - start).collect()
}

/// Classification attributes after id translation, date derivation and
/// slugification. Every value is a single safe path component.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnrichedAttributes {
    values: BTreeMap<String, String>,
}

impl EnrichedAttributes {
    /// Looks up an attribute by exact name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.values.get(name).map(String::as_str)
    }

    /// Number of attributes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether there are no attributes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Iterates over `(name, value)` pairs in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl<K, V> FromIterator<(K, V)> for EnrichedAttributes
where
    K: Into<String>,
    V: AsRef<str>,
{
    /// Builds attributes directly, slugifying every value.
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let values = iter
            .into_iter()
            .map(|(k, v)| (k.into(), slugify(v.as_ref(), false)))
            .collect();
        Self { values }
    }
}
