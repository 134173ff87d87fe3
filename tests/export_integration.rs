//! Integration tests for complete export runs against a mocked ecoDMS API.

mod support;

use std::path::{Path, PathBuf};

use ecodms_export::{
    ApiError, Credentials, DocumentError, ExportError, ExportOptions, ExportSettings,
    FetchFailurePolicy, NameTemplate, RecordError, TemplateError, Timeouts, run_export,
};
use serde_json::{Value, json};
use support::ecodms_mock::{
    PASSWORD, USER, api_base, mount_doc_types, mount_document, mount_folders, mount_metadata,
    mount_session, mount_window, record, window_filter,
};
use support::socket_guard::{
    closed_local_port, skip_without_localhost, start_mock_server_or_skip,
};
use tempfile::TempDir;
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, ResponseTemplate};

const HYPHEN_TEMPLATE: &str = "{year}/{folder}/{docart}/{cdate}-{docid}";

fn settings(base_url: String, export_root: &Path, template: &str) -> ExportSettings {
    ExportSettings {
        base_url,
        archive_id: 1,
        credentials: Credentials {
            user: USER.to_string(),
            password: PASSWORD.to_string(),
        },
        timeouts: Timeouts {
            connect_secs: 5,
            read_secs: 10,
        },
        cache_dir: None,
        options: ExportOptions {
            export_root: export_root.to_path_buf(),
            template: NameTemplate::parse(template).unwrap(),
            export_json: false,
            fetch_failure_policy: FetchFailurePolicy::Continue,
        },
    }
}

fn pdf(root: &Path, relative: &str) -> PathBuf {
    root.join(format!("{relative}.pdf"))
}

#[tokio::test]
async fn test_export_writes_pdf_at_templated_path() {
    let Some(server) = start_mock_server_or_skip().await else {
        return;
    };
    mount_session(&server).await;
    mount_metadata(&server).await;
    mount_window(
        &server,
        0,
        json!([record(42, "1", "3", "2023-05-01", "Power bill")]),
    )
    .await;
    mount_window(&server, 50, json!([])).await;
    mount_document(&server, 42, b"%PDF-1.4 doc 42", 1).await;

    let temp = TempDir::new().unwrap();
    let stats = run_export(&settings(api_base(&server), temp.path(), HYPHEN_TEMPLATE))
        .await
        .unwrap();

    let expected = pdf(temp.path(), "2023/invoices/receipt/2023-05-01-42");
    assert_eq!(std::fs::read(&expected).unwrap(), b"%PDF-1.4 doc 42");
    assert!(!temp.path().join("2023/invoices/receipt/2023-05-01-42.pdf.part").exists());
    assert_eq!(stats.windows(), 2);
    assert_eq!(stats.documents(), 1);
    assert_eq!(stats.downloaded(), 1);
}

#[tokio::test]
async fn test_default_template_keeps_literal_separators() {
    let Some(server) = start_mock_server_or_skip().await else {
        return;
    };
    mount_session(&server).await;
    mount_metadata(&server).await;
    mount_window(
        &server,
        0,
        json!([record(42, "1", "3", "2023-05-01", "Stromrechnung Mai")]),
    )
    .await;
    mount_window(&server, 50, json!([])).await;
    mount_document(&server, 42, b"pdf", 1).await;

    let temp = TempDir::new().unwrap();
    run_export(&settings(
        api_base(&server),
        temp.path(),
        ecodms_export::constants::DEFAULT_NAME_TEMPLATE,
    ))
    .await
    .unwrap();

    assert!(pdf(
        temp.path(),
        "2023/invoices/receipt/2023-05-01_42_stromrechnung-mai"
    )
    .is_file());
}

#[tokio::test]
async fn test_export_walks_windows_until_first_empty_one() {
    let Some(server) = start_mock_server_or_skip().await else {
        return;
    };
    mount_session(&server).await;
    mount_metadata(&server).await;
    mount_window(
        &server,
        0,
        json!([
            record(3, "1", "3", "2021-01-10", "a"),
            record(42, "2", "4", "2022-02-20", "b")
        ]),
    )
    .await;
    mount_window(&server, 50, json!([record(60, "1", "4", "2023-03-30", "c")])).await;
    mount_window(&server, 100, json!([record(120, "0", "0", "2024-04-01", "d")])).await;
    mount_window(&server, 150, json!([])).await;
    for doc_id in [3, 42, 60, 120] {
        mount_document(&server, doc_id, format!("pdf {doc_id}").as_bytes(), 1).await;
    }

    let temp = TempDir::new().unwrap();
    let stats = run_export(&settings(api_base(&server), temp.path(), HYPHEN_TEMPLATE))
        .await
        .unwrap();

    assert_eq!(stats.windows(), 4);
    assert_eq!(stats.documents(), 4);
    assert_eq!(stats.downloaded(), 4);
    let root = temp.path();
    assert!(pdf(root, "2021/invoices/receipt/2021-01-10-3").is_file());
    assert!(pdf(root, "2022/contracts/letter/2022-02-20-42").is_file());
    assert!(pdf(root, "2023/invoices/letter/2023-03-30-60").is_file());
    assert!(pdf(root, "2024/not_assigned/not_assigned/2024-04-01-120").is_file());
}

#[tokio::test]
async fn test_second_run_fetches_nothing() {
    let Some(server) = start_mock_server_or_skip().await else {
        return;
    };
    Mock::given(method("GET"))
        .and(path("/api/connect/1"))
        .respond_with(ResponseTemplate::new(200))
        .expect(2)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/test"))
        .respond_with(ResponseTemplate::new(200))
        .expect(2)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/disconnect"))
        .respond_with(ResponseTemplate::new(200))
        .expect(2)
        .mount(&server)
        .await;
    mount_metadata(&server).await;
    let records = json!([
        record(3, "1", "3", "2021-01-10", "a"),
        record(42, "2", "4", "2022-02-20", "b")
    ]);
    Mock::given(method("POST"))
        .and(path("/api/searchDocuments"))
        .and(body_json(window_filter(0)))
        .respond_with(ResponseTemplate::new(200).set_body_json(records))
        .expect(2)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/searchDocuments"))
        .and(body_json(window_filter(50)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(2)
        .mount(&server)
        .await;
    mount_document(&server, 3, b"three", 1).await;
    mount_document(&server, 42, b"forty-two", 1).await;

    let temp = TempDir::new().unwrap();
    let mut run_settings = settings(api_base(&server), temp.path(), HYPHEN_TEMPLATE);
    run_settings.options.export_json = true;

    let first = run_export(&run_settings).await.unwrap();
    assert_eq!(first.downloaded(), 2);
    assert_eq!(first.sidecars(), 2);

    let second = run_export(&run_settings).await.unwrap();
    assert_eq!(second.downloaded(), 0);
    assert_eq!(second.already_present(), 2);
    assert_eq!(second.sidecars(), 0);
    assert_eq!(
        std::fs::read(pdf(temp.path(), "2022/contracts/letter/2022-02-20-42")).unwrap(),
        b"forty-two"
    );
}

#[tokio::test]
async fn test_cache_hit_skips_download() {
    let Some(server) = start_mock_server_or_skip().await else {
        return;
    };
    mount_session(&server).await;
    mount_metadata(&server).await;
    mount_window(&server, 0, json!([record(42, "1", "3", "2023-05-01", "x")])).await;
    mount_window(&server, 50, json!([])).await;
    mount_document(&server, 42, b"remote", 0).await;

    let temp = TempDir::new().unwrap();
    let cache_dir = temp.path().join("cache");
    std::fs::create_dir_all(&cache_dir).unwrap();
    std::fs::write(cache_dir.join("42_old-name.pdf"), b"cached").unwrap();
    // Prefix must be followed by '_'; 420 must not match 42.
    std::fs::write(cache_dir.join("420_.pdf"), b"wrong").unwrap();

    let export_root = temp.path().join("out");
    let mut run_settings = settings(api_base(&server), &export_root, HYPHEN_TEMPLATE);
    run_settings.cache_dir = Some(cache_dir);

    let stats = run_export(&run_settings).await.unwrap();

    assert_eq!(stats.from_cache(), 1);
    assert_eq!(stats.downloaded(), 0);
    assert_eq!(
        std::fs::read(pdf(&export_root, "2023/invoices/receipt/2023-05-01-42")).unwrap(),
        b"cached"
    );
}

#[tokio::test]
async fn test_download_populates_cache() {
    let Some(server) = start_mock_server_or_skip().await else {
        return;
    };
    mount_session(&server).await;
    mount_metadata(&server).await;
    mount_window(&server, 0, json!([record(7, "2", "4", "2020-12-31", "x")])).await;
    mount_window(&server, 50, json!([])).await;
    mount_document(&server, 7, b"seven", 1).await;

    let temp = TempDir::new().unwrap();
    let cache_dir = temp.path().join("cache");
    let mut run_settings = settings(api_base(&server), &temp.path().join("out"), HYPHEN_TEMPLATE);
    run_settings.cache_dir = Some(cache_dir.clone());

    let stats = run_export(&run_settings).await.unwrap();

    assert_eq!(stats.downloaded(), 1);
    assert_eq!(std::fs::read(cache_dir.join("7_.pdf")).unwrap(), b"seven");
}

#[tokio::test]
async fn test_cache_write_failure_aborts_after_download() {
    let Some(server) = start_mock_server_or_skip().await else {
        return;
    };
    mount_session(&server).await;
    mount_metadata(&server).await;
    mount_window(&server, 0, json!([record(7, "2", "4", "2020-12-31", "x")])).await;
    mount_document(&server, 7, b"seven", 1).await;

    let temp = TempDir::new().unwrap();
    let cache_dir = temp.path().join("cache");
    // A directory squatting on the canonical entry name makes the store fail.
    std::fs::create_dir_all(cache_dir.join("7_.pdf")).unwrap();
    let export_root = temp.path().join("out");
    let mut run_settings = settings(api_base(&server), &export_root, HYPHEN_TEMPLATE);
    run_settings.cache_dir = Some(cache_dir.clone());

    let result = run_export(&run_settings).await;

    assert!(
        matches!(
            result,
            Err(ExportError::Document {
                doc_id: 7,
                source: DocumentError::Cache(_)
            })
        ),
        "expected cache error, got {result:?}"
    );
    assert_eq!(
        std::fs::read(pdf(&export_root, "2020/contracts/letter/2020-12-31-7")).unwrap(),
        b"seven"
    );
    assert!(!cache_dir.join("7_.pdf.part").exists());
}

#[tokio::test]
async fn test_sidecar_holds_raw_record() {
    let Some(server) = start_mock_server_or_skip().await else {
        return;
    };
    mount_session(&server).await;
    mount_metadata(&server).await;
    let raw = record(42, "1", "3", "2023-05-01", "Power bill");
    mount_window(&server, 0, json!([raw.clone()])).await;
    mount_window(&server, 50, json!([])).await;
    mount_document(&server, 42, b"pdf", 1).await;

    let temp = TempDir::new().unwrap();
    let mut run_settings = settings(api_base(&server), temp.path(), HYPHEN_TEMPLATE);
    run_settings.options.export_json = true;

    let stats = run_export(&run_settings).await.unwrap();

    assert_eq!(stats.sidecars(), 1);
    let sidecar = temp.path().join("2023/invoices/receipt/2023-05-01-42.json");
    let text = std::fs::read_to_string(&sidecar).unwrap();
    assert!(text.starts_with("{\n    \"docId\": 42,"), "{text}");
    let parsed: Value = serde_json::from_str(&text).unwrap();
    assert_eq!(parsed, raw);
}

#[tokio::test]
async fn test_sidecar_written_for_existing_pdf() {
    let Some(server) = start_mock_server_or_skip().await else {
        return;
    };
    mount_session(&server).await;
    mount_metadata(&server).await;
    mount_window(&server, 0, json!([record(42, "1", "3", "2023-05-01", "x")])).await;
    mount_window(&server, 50, json!([])).await;
    mount_document(&server, 42, b"remote", 0).await;

    let temp = TempDir::new().unwrap();
    let existing = pdf(temp.path(), "2023/invoices/receipt/2023-05-01-42");
    std::fs::create_dir_all(existing.parent().unwrap()).unwrap();
    std::fs::write(&existing, b"local").unwrap();

    let mut run_settings = settings(api_base(&server), temp.path(), HYPHEN_TEMPLATE);
    run_settings.options.export_json = true;
    let stats = run_export(&run_settings).await.unwrap();

    assert_eq!(stats.already_present(), 1);
    assert_eq!(stats.sidecars(), 1);
    assert_eq!(std::fs::read(&existing).unwrap(), b"local");
    assert!(existing.with_extension("json").is_file());
}

#[tokio::test]
async fn test_missing_template_attribute_aborts_run() {
    let Some(server) = start_mock_server_or_skip().await else {
        return;
    };
    mount_session(&server).await;
    mount_metadata(&server).await;
    mount_window(
        &server,
        0,
        json!([
            record(42, "1", "3", "2023-05-01", "x"),
            record(43, "1", "3", "2023-05-02", "y")
        ]),
    )
    .await;
    mount_document(&server, 42, b"pdf", 0).await;
    mount_document(&server, 43, b"pdf", 0).await;

    let temp = TempDir::new().unwrap();
    let result = run_export(&settings(api_base(&server), temp.path(), "{year}/{foo}")).await;

    match result {
        Err(ExportError::Document {
            doc_id,
            source: DocumentError::Template(TemplateError::MissingAttribute { name }),
        }) => {
            assert_eq!(doc_id, 42);
            assert_eq!(name, "foo");
        }
        other => panic!("expected missing attribute error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_unknown_folder_aborts_run() {
    let Some(server) = start_mock_server_or_skip().await else {
        return;
    };
    mount_session(&server).await;
    mount_metadata(&server).await;
    mount_window(&server, 0, json!([record(5, "99", "3", "2023-05-01", "x")])).await;

    let temp = TempDir::new().unwrap();
    let result = run_export(&settings(api_base(&server), temp.path(), HYPHEN_TEMPLATE)).await;

    match result {
        Err(ExportError::Document {
            doc_id: 5,
            source: DocumentError::Record(RecordError::UnknownFolder { id }),
        }) => assert_eq!(id, "99"),
        other => panic!("expected unknown folder error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_record_without_doc_id_is_malformed() {
    let Some(server) = start_mock_server_or_skip().await else {
        return;
    };
    mount_session(&server).await;
    mount_metadata(&server).await;
    mount_window(
        &server,
        0,
        json!([{"classifyAttributes": {"folder": "1", "docart": "3", "cdate": "2023-05-01"}}]),
    )
    .await;

    let temp = TempDir::new().unwrap();
    let result = run_export(&settings(api_base(&server), temp.path(), HYPHEN_TEMPLATE)).await;

    assert!(matches!(
        result,
        Err(ExportError::MalformedRecord {
            window_start: 0,
            source: RecordError::MissingDocId
        })
    ));
}

async fn mount_refused_document_scenario(server: &wiremock::MockServer, later_fetches: u64) {
    mount_session(server).await;
    mount_metadata(server).await;
    mount_window(
        server,
        0,
        json!([
            record(3, "1", "3", "2023-01-01", "a"),
            record(42, "1", "3", "2023-05-01", "b"),
            record(43, "1", "3", "2023-05-02", "c")
        ]),
    )
    .await;
    mount_document(server, 3, b"three", 1).await;
    Mock::given(method("GET"))
        .and(path("/api/document/42"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(server)
        .await;
    mount_document(server, 43, b"forty-three", later_fetches).await;
}

#[tokio::test]
async fn test_refused_document_is_skipped_by_default() {
    let Some(server) = start_mock_server_or_skip().await else {
        return;
    };
    mount_refused_document_scenario(&server, 1).await;
    mount_window(&server, 50, json!([])).await;

    let temp = TempDir::new().unwrap();
    let stats = run_export(&settings(api_base(&server), temp.path(), HYPHEN_TEMPLATE))
        .await
        .unwrap();

    assert_eq!(stats.downloaded(), 2);
    assert_eq!(stats.fetch_failed(), 1);
    let dir = temp.path().join("2023/invoices/receipt");
    assert!(!dir.join("2023-05-01-42.pdf").exists());
    assert!(!dir.join("2023-05-01-42.pdf.part").exists());
    assert!(dir.join("2023-05-02-43.pdf").is_file());
}

#[tokio::test]
async fn test_refused_document_aborts_strict_run() {
    let Some(server) = start_mock_server_or_skip().await else {
        return;
    };
    mount_refused_document_scenario(&server, 0).await;

    let temp = TempDir::new().unwrap();
    let mut run_settings = settings(api_base(&server), temp.path(), HYPHEN_TEMPLATE);
    run_settings.options.fetch_failure_policy = FetchFailurePolicy::Abort;
    let result = run_export(&run_settings).await;

    assert!(matches!(
        result,
        Err(ExportError::Document {
            doc_id: 42,
            source: DocumentError::FetchRejected { status: 404 }
        })
    ));
}

#[tokio::test]
async fn test_unreachable_api_is_connectivity_error() {
    if skip_without_localhost() {
        return;
    }
    let temp = TempDir::new().unwrap();
    let base_url = format!("http://127.0.0.1:{}/api", closed_local_port());
    let result = run_export(&settings(base_url, temp.path(), HYPHEN_TEMPLATE)).await;

    assert!(matches!(
        result,
        Err(ExportError::Api(ApiError::Connectivity { .. }))
    ));
}

#[tokio::test]
async fn test_failed_probe_is_connectivity_error() {
    let Some(server) = start_mock_server_or_skip().await else {
        return;
    };
    Mock::given(method("GET"))
        .and(path("/api/test"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/connect/1"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let temp = TempDir::new().unwrap();
    let result = run_export(&settings(api_base(&server), temp.path(), HYPHEN_TEMPLATE)).await;

    assert!(matches!(
        result,
        Err(ExportError::Api(ApiError::Connectivity { .. }))
    ));
}

#[tokio::test]
async fn test_rejected_login_is_authentication_error() {
    let Some(server) = start_mock_server_or_skip().await else {
        return;
    };
    Mock::given(method("GET"))
        .and(path("/api/test"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/connect/1"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/disconnect"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let temp = TempDir::new().unwrap();
    let result = run_export(&settings(api_base(&server), temp.path(), HYPHEN_TEMPLATE)).await;

    assert!(matches!(
        result,
        Err(ExportError::Api(ApiError::Authentication {
            archive_id: 1,
            status: 401
        }))
    ));
}

#[tokio::test]
async fn test_failed_metadata_fetch_still_disconnects() {
    let Some(server) = start_mock_server_or_skip().await else {
        return;
    };
    mount_session(&server).await;
    Mock::given(method("GET"))
        .and(path("/api/folders"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;
    mount_doc_types(&server).await;

    let temp = TempDir::new().unwrap();
    let result = run_export(&settings(api_base(&server), temp.path(), HYPHEN_TEMPLATE)).await;

    assert!(matches!(
        result,
        Err(ExportError::Api(ApiError::MetadataFetch {
            endpoint: "folders",
            status: 500
        }))
    ));
}

#[tokio::test]
async fn test_failed_search_aborts_run() {
    let Some(server) = start_mock_server_or_skip().await else {
        return;
    };
    mount_session(&server).await;
    mount_folders(&server).await;
    mount_doc_types(&server).await;
    Mock::given(method("POST"))
        .and(path("/api/searchDocuments"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let temp = TempDir::new().unwrap();
    let result = run_export(&settings(api_base(&server), temp.path(), HYPHEN_TEMPLATE)).await;

    assert!(matches!(
        result,
        Err(ExportError::Api(ApiError::MetadataFetch {
            endpoint: "searchDocuments",
            status: 500
        }))
    ));
}
