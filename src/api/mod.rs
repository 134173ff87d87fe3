//! Client for the ecoDMS REST API.
//!
//! Endpoints used, relative to `http://<host>:<port>/api`:
//!
//! | Call                    | Purpose                              |
//! |-------------------------|--------------------------------------|
//! | `GET /test`             | connectivity probe                   |
//! | `GET /connect/<id>`     | open a session (basic auth)          |
//! | `GET /folders`          | folder id → name list                |
//! | `GET /types`            | document type id → name list         |
//! | `POST /searchDocuments` | search with attribute filter clauses |
//! | `GET /document/<docId>` | document binary                      |
//! | `GET /disconnect`       | close the session                    |

mod client;
mod error;

pub use client::{Credentials, EcoDmsClient, SearchFilter, Timeouts};
pub use error::ApiError;
