//! HTTP client for the ecoDMS REST API.
//!
//! The API is session-based: `/connect/<archive>` with basic auth sets a
//! session cookie that every later call must carry, so the underlying
//! `reqwest` client keeps a cookie store for its whole lifetime.

use std::fmt;
use std::path::Path;
use std::time::Duration;

use futures_util::StreamExt;
use reqwest::{Client, Response, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tokio::fs::File;
use tokio::io::{AsyncWriteExt, BufWriter};
use tracing::{debug, instrument};
use url::Url;

use super::error::ApiError;
use crate::constants::{CONNECT_TIMEOUT_SECS, READ_TIMEOUT_SECS};
use crate::metadata::{DocTypeEntry, FolderEntry};
use crate::naming::partial_path;
use crate::user_agent;

/// Login for `/connect`.
#[derive(Clone)]
pub struct Credentials {
    /// ecoDMS user name.
    pub user: String,
    /// ecoDMS password.
    pub password: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("user", &self.user)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

/// HTTP timeouts for API calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timeouts {
    /// Connect timeout in seconds.
    pub connect_secs: u64,
    /// Idle-read timeout in seconds: the longest wait for the next bytes of a
    /// response. A slow but steady download never hits it.
    pub read_secs: u64,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            connect_secs: CONNECT_TIMEOUT_SECS,
            read_secs: READ_TIMEOUT_SECS,
        }
    }
}

/// One clause of a `searchDocuments` filter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchFilter {
    /// Attribute to filter on, e.g. `docid`.
    pub classify_attribut: String,
    /// Comparison operator, e.g. `>=`.
    pub search_operator: String,
    /// Value to compare against, always sent as a string.
    pub search_value: String,
}

impl SearchFilter {
    /// Filter clauses selecting `start <= docid < end`.
    #[must_use]
    pub fn id_window(start: u64, end: u64) -> [Self; 2] {
        [
            Self {
                classify_attribut: "docid".to_string(),
                search_operator: ">=".to_string(),
                search_value: start.to_string(),
            },
            Self {
                classify_attribut: "docid".to_string(),
                search_operator: "<".to_string(),
                search_value: end.to_string(),
            },
        ]
    }
}

/// Client for one ecoDMS API endpoint.
///
/// Create it once per run; it holds the session cookie.
#[derive(Debug, Clone)]
pub struct EcoDmsClient {
    client: Client,
    base: String,
}

impl EcoDmsClient {
    /// Builds the API base URL `http://<host>:<port>/api`.
    #[must_use]
    pub fn endpoint_url(host: &str, port: u16) -> String {
        format!("http://{host}:{port}/api")
    }

    /// Creates a client for `base_url` (e.g. `http://ecodms:8180/api`).
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::InvalidEndpoint`] if `base_url` is not an http(s)
    /// URL, or [`ApiError::ClientBuild`] if the HTTP client cannot be built.
    pub fn new(base_url: &str, timeouts: Timeouts) -> Result<Self, ApiError> {
        let parsed = Url::parse(base_url).map_err(|_| ApiError::InvalidEndpoint {
            url: base_url.to_string(),
        })?;
        if !matches!(parsed.scheme(), "http" | "https") || parsed.host_str().is_none() {
            return Err(ApiError::InvalidEndpoint {
                url: base_url.to_string(),
            });
        }

        let client = Client::builder()
            .connect_timeout(Duration::from_secs(timeouts.connect_secs))
            .read_timeout(Duration::from_secs(timeouts.read_secs))
            .cookie_store(true)
            .gzip(true)
            .user_agent(user_agent::default_api_user_agent())
            .build()
            .map_err(|source| ApiError::ClientBuild { source })?;

        Ok(Self {
            client,
            base: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// The API base URL.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{path}", self.base)
    }

    /// Probes `GET /test`.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Connectivity`] if the request fails or the status
    /// is not 200.
    #[instrument(skip(self), fields(base = %self.base))]
    pub async fn test(&self) -> Result<(), ApiError> {
        let url = self.url("test");
        debug!(url = %url, "GET");
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| ApiError::unreachable(&url, e))?;
        if response.status() != StatusCode::OK {
            return Err(ApiError::probe_status(url, response.status().as_u16()));
        }
        Ok(())
    }

    /// Opens a session on `archive_id` via `GET /connect/<archive_id>`.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Authentication`] on a non-200 status, or a
    /// transport error if the request fails.
    #[instrument(skip(self, credentials), fields(user = %credentials.user))]
    pub async fn connect(&self, archive_id: u32, credentials: &Credentials) -> Result<(), ApiError> {
        let url = self.url(&format!("connect/{archive_id}"));
        debug!(url = %url, "GET");
        let response = self
            .client
            .get(&url)
            .basic_auth(&credentials.user, Some(&credentials.password))
            .send()
            .await
            .map_err(|e| ApiError::transport(&url, e))?;
        if response.status() != StatusCode::OK {
            return Err(ApiError::Authentication {
                archive_id,
                status: response.status().as_u16(),
            });
        }
        Ok(())
    }

    /// Lists folders via `GET /folders`.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::MetadataFetch`] on a non-200 status,
    /// [`ApiError::Decode`] on an unexpected body, or a transport error.
    #[instrument(skip(self))]
    pub async fn folders(&self) -> Result<Vec<FolderEntry>, ApiError> {
        self.get_json("folders").await
    }

    /// Lists document types via `GET /types`.
    ///
    /// # Errors
    ///
    /// Same as [`folders`](Self::folders).
    #[instrument(skip(self))]
    pub async fn doc_types(&self) -> Result<Vec<DocTypeEntry>, ApiError> {
        self.get_json("types").await
    }

    /// Runs `POST /searchDocuments` and returns the raw records.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::MetadataFetch`] on a non-200 status,
    /// [`ApiError::Decode`] if the body is not a JSON array, or a transport
    /// error.
    #[instrument(skip(self, filters), fields(clauses = filters.len()))]
    pub async fn search_documents(&self, filters: &[SearchFilter]) -> Result<Vec<Value>, ApiError> {
        let url = self.url("searchDocuments");
        debug!(url = %url, filter = ?filters, "POST");
        let response = self
            .client
            .post(&url)
            .json(filters)
            .send()
            .await
            .map_err(|e| ApiError::transport(&url, e))?;
        decode_json(ensure_metadata_ok(response, "searchDocuments")?, &url).await
    }

    /// Searches for documents with `start <= docid < end`.
    ///
    /// # Errors
    ///
    /// Same as [`search_documents`](Self::search_documents).
    pub async fn search_id_window(&self, start: u64, end: u64) -> Result<Vec<Value>, ApiError> {
        self.search_documents(&SearchFilter::id_window(start, end))
            .await
    }

    /// Streams `GET /document/<doc_id>` into `target`.
    ///
    /// The body is written to `<target>.part` and renamed on completion, so
    /// `target` only ever appears with complete content. Returns the number of
    /// bytes written.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::DocumentFetch`] on a non-200 status (nothing is
    /// written), a transport error, or [`ApiError::Io`] if writing fails.
    #[instrument(skip(self, target), fields(target = %target.display()))]
    pub async fn download_document(&self, doc_id: u64, target: &Path) -> Result<u64, ApiError> {
        let url = self.url(&format!("document/{doc_id}"));
        debug!(url = %url, "GET");
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| ApiError::transport(&url, e))?;
        if response.status() != StatusCode::OK {
            return Err(ApiError::DocumentFetch {
                doc_id,
                status: response.status().as_u16(),
            });
        }

        let part_path = partial_path(target);
        let result = stream_to_file(response, &url, &part_path).await;
        let bytes_written = match result {
            Ok(bytes) => bytes,
            Err(error) => {
                debug!(path = %part_path.display(), "cleaning up partial file after error");
                let _ = tokio::fs::remove_file(&part_path).await;
                return Err(error);
            }
        };
        tokio::fs::rename(&part_path, target)
            .await
            .map_err(|e| ApiError::io(target, e))?;
        debug!(bytes = bytes_written, "document saved");
        Ok(bytes_written)
    }

    /// Ends the session via `GET /disconnect`.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::MetadataFetch`] on a non-200 status or a transport
    /// error. Callers treat this as best-effort.
    #[instrument(skip(self))]
    pub async fn disconnect(&self) -> Result<(), ApiError> {
        let url = self.url("disconnect");
        debug!(url = %url, "GET");
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| ApiError::transport(&url, e))?;
        ensure_metadata_ok(response, "disconnect").map(|_| ())
    }

    async fn get_json<T: DeserializeOwned>(&self, endpoint: &'static str) -> Result<T, ApiError> {
        let url = self.url(endpoint);
        debug!(url = %url, "GET");
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| ApiError::transport(&url, e))?;
        decode_json(ensure_metadata_ok(response, endpoint)?, &url).await
    }
}

fn ensure_metadata_ok(response: Response, endpoint: &'static str) -> Result<Response, ApiError> {
    if response.status() == StatusCode::OK {
        Ok(response)
    } else {
        Err(ApiError::MetadataFetch {
            endpoint,
            status: response.status().as_u16(),
        })
    }
}

async fn decode_json<T: DeserializeOwned>(response: Response, url: &str) -> Result<T, ApiError> {
    response
        .json::<T>()
        .await
        .map_err(|e| ApiError::decode(url, e))
}

async fn stream_to_file(response: Response, url: &str, path: &Path) -> Result<u64, ApiError> {
    let file = File::create(path)
        .await
        .map_err(|e| ApiError::io(path, e))?;
    let mut writer = BufWriter::new(file);
    let mut stream = response.bytes_stream();
    let mut bytes_written: u64 = 0;

    while let Some(chunk_result) = stream.next().await {
        let chunk = chunk_result.map_err(|e| ApiError::transport(url, e))?;
        writer
            .write_all(&chunk)
            .await
            .map_err(|e| ApiError::io(path, e))?;
        bytes_written += chunk.len() as u64;
    }

    writer.flush().await.map_err(|e| ApiError::io(path, e))?;
    Ok(bytes_written)
}
