//! Error types for the ecoDMS API client.
//!
//! Each variant carries the URL, archive or document it concerns so a single
//! log line is enough to tell which call failed.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while talking to the ecoDMS API.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The API did not answer the `/test` probe with 200.
    #[error("cannot reach ecoDMS API at {url}: {reason}")]
    Connectivity {
        /// The probed URL.
        url: String,
        /// Short description of what went wrong.
        reason: String,
        /// Transport error, when the request never got a response.
        #[source]
        source: Option<reqwest::Error>,
    },

    /// `/connect/<archive>` was refused.
    #[error("failed to authenticate against archive {archive_id} (HTTP {status})")]
    Authentication {
        /// Archive id used for the login.
        archive_id: u32,
        /// The HTTP status code.
        status: u16,
    },

    /// A folders/types/search request returned a non-200 status.
    #[error("failed to retrieve {endpoint} (HTTP {status})")]
    MetadataFetch {
        /// Endpoint name, e.g. `folders`.
        endpoint: &'static str,
        /// The HTTP status code.
        status: u16,
    },

    /// `/document/<id>` returned a non-200 status.
    #[error("failed to retrieve document file for doc #{doc_id} (HTTP {status})")]
    DocumentFetch {
        /// Document id.
        doc_id: u64,
        /// The HTTP status code.
        status: u16,
    },

    /// Network-level error after connectivity was established.
    #[error("network error calling {url}: {source}")]
    Network {
        /// The URL being requested.
        url: String,
        /// The underlying network error.
        #[source]
        source: reqwest::Error,
    },

    /// Request timed out before completion.
    #[error("timeout calling {url}")]
    Timeout {
        /// The URL that timed out.
        url: String,
    },

    /// The response body was not the expected JSON.
    #[error("invalid JSON response from {url}: {source}")]
    Decode {
        /// The URL whose body failed to decode.
        url: String,
        /// The underlying decode error.
        #[source]
        source: reqwest::Error,
    },

    /// The configured host/port do not form a valid URL.
    #[error("invalid API endpoint: {url}")]
    InvalidEndpoint {
        /// The rejected URL.
        url: String,
    },

    /// The HTTP client could not be constructed.
    #[error("failed to build HTTP client: {source}")]
    ClientBuild {
        /// The underlying builder error.
        #[source]
        source: reqwest::Error,
    },

    /// File system error while writing a downloaded document.
    #[error("IO error writing to {path}: {source}")]
    Io {
        /// The file path where the error occurred.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },
}

impl ApiError {
    /// Creates a connectivity error for a probe that got no response.
    pub fn unreachable(url: impl Into<String>, source: reqwest::Error) -> Self {
        Self::Connectivity {
            url: url.into(),
            reason: "request failed".to_string(),
            source: Some(source),
        }
    }

    /// Creates a connectivity error for a probe answered with a bad status.
    pub fn probe_status(url: impl Into<String>, status: u16) -> Self {
        Self::Connectivity {
            url: url.into(),
            reason: format!("test endpoint returned HTTP {status}"),
            source: None,
        }
    }

    /// Creates a network or timeout error from a reqwest error.
    pub fn transport(url: impl Into<String>, source: reqwest::Error) -> Self {
        if source.is_timeout() {
            Self::Timeout { url: url.into() }
        } else {
            Self::Network {
                url: url.into(),
                source,
            }
        }
    }

    /// Creates a JSON decode error.
    pub fn decode(url: impl Into<String>, source: reqwest::Error) -> Self {
        Self::Decode {
            url: url.into(),
            source,
        }
    }

    /// Creates an IO error.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
