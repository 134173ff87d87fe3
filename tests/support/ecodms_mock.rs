//! Mounts for a fake ecoDMS REST API on a wiremock server.

use serde_json::{Value, json};
use wiremock::matchers::{basic_auth, body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const USER: &str = "ecodms";
pub const PASSWORD: &str = "secret";
pub const SESSION_COOKIE: &str = "JSESSIONID=test-session";

#[must_use]
pub fn api_base(server: &MockServer) -> String {
    format!("{}/api", server.uri())
}

/// Mounts `/test`, `/connect/1` (basic auth) and `/disconnect`.
pub async fn mount_session(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/api/test"))
        .respond_with(ResponseTemplate::new(200).set_body_string("ok"))
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/connect/1"))
        .and(basic_auth(USER, PASSWORD))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("Set-Cookie", format!("{SESSION_COOKIE}; Path=/").as_str())
                .set_body_json(json!(true)),
        )
        .expect(1)
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/disconnect"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(server)
        .await;
}

/// Folder table: 1 = Invoices, 2 = Contracts.
pub async fn mount_folders(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/api/folders"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"oId": "1", "foldername": "Invoices", "buzzwords": "", "active": true},
            {"oId": "2", "foldername": "Contracts", "buzzwords": "", "active": true}
        ])))
        .mount(server)
        .await;
}

/// Document type table: 3 = Receipt, 4 = Letter.
pub async fn mount_doc_types(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/api/types"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"id": 3, "name": "Receipt"},
            {"id": 4, "name": "Letter"}
        ])))
        .mount(server)
        .await;
}

pub async fn mount_metadata(server: &MockServer) {
    mount_folders(server).await;
    mount_doc_types(server).await;
}

#[must_use]
pub fn window_filter(start: u64) -> Value {
    json!([
        {"classifyAttribut": "docid", "searchOperator": ">=", "searchValue": start.to_string()},
        {"classifyAttribut": "docid", "searchOperator": "<", "searchValue": (start + 50).to_string()}
    ])
}

/// Answers the search for the id window starting at `start` with `records`.
pub async fn mount_window(server: &MockServer, start: u64, records: Value) {
    Mock::given(method("POST"))
        .and(path("/api/searchDocuments"))
        .and(body_json(window_filter(start)))
        .respond_with(ResponseTemplate::new(200).set_body_json(records))
        .expect(1)
        .mount(server)
        .await;
}

/// Answers `GET /document/<doc_id>` with `body`, expecting `times` calls.
pub async fn mount_document(server: &MockServer, doc_id: u64, body: &[u8], times: u64) {
    Mock::given(method("GET"))
        .and(path(format!("/api/document/{doc_id}")))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("Content-Type", "application/pdf")
                .set_body_bytes(body.to_vec()),
        )
        .expect(times)
        .mount(server)
        .await;
}

/// Search record as returned by `/searchDocuments`.
#[must_use]
pub fn record(doc_id: u64, folder: &str, docart: &str, cdate: &str, bemerkung: &str) -> Value {
    json!({
        "docId": doc_id,
        "clDocId": doc_id * 10,
        "archiveName": "Archive",
        "classifyAttributes": {
            "folder": folder,
            "docart": docart,
            "cdate": cdate,
            "bemerkung": bemerkung,
            "docid": doc_id.to_string(),
            "status": "1"
        },
        "editRoles": ["ecoSIMSAdmin"]
    })
}
