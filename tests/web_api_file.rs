//! Web API file tests.
//!
//! Integration tests for upload, share, and lifecycle endpoints.

mod common;

use axum::http::StatusCode;
use axum_test::multipart::{MultipartForm, Part};
use serde_json::{json, Value};

use common::{create_test_app, create_test_app_with};

fn upload_form(filename: &str, content: &[u8], user_id: &str) -> MultipartForm {
    MultipartForm::new()
        .add_part(
            "file",
            Part::bytes(content.to_vec())
                .file_name(filename)
                .mime_type("text/plain"),
        )
        .add_text("userId", user_id)
}

fn folder_member_form(
    folder_id: &str,
    path: &str,
    content: &[u8],
    user_id: &str,
) -> MultipartForm {
    MultipartForm::new()
        .add_part(
            "file",
            Part::bytes(content.to_vec())
                .file_name(path.rsplit('/').next().unwrap().to_string())
                .mime_type("text/plain"),
        )
        .add_text("userId", user_id)
        .add_text("folderUploadId", folder_id)
        .add_text("folderPath", path)
}

// ============================================================================
// Upload Tests
// ============================================================================

#[tokio::test]
async fn test_upload_and_download_roundtrip() {
    let app = create_test_app();

    let response = app
        .server
        .post("/api/upload")
        .multipart(upload_form("hello.txt", b"Hello, world!", "alice"))
        .await;
    response.assert_status(StatusCode::CREATED);

    let body: Value = response.json();
    let id = body["id"].as_str().unwrap();
    assert_eq!(body["name"], "hello.txt");
    assert_eq!(body["sizeBytes"], 13);
    assert_eq!(
        body["url"],
        format!("http://localhost:3000/f/{id}")
    );

    let download = app
        .server
        .get(&format!("/api/files/{id}/download"))
        .await;
    download.assert_status_ok();
    assert_eq!(download.as_bytes().as_ref(), b"Hello, world!");
    assert_eq!(
        download.header("content-type").to_str().unwrap(),
        "text/plain"
    );
    assert!(download
        .header("content-disposition")
        .to_str()
        .unwrap()
        .contains("hello.txt"));
}

#[tokio::test]
async fn test_upload_without_file_field() {
    let app = create_test_app();

    let response = app
        .server
        .post("/api/upload")
        .multipart(MultipartForm::new().add_text("userId", "alice"))
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_upload_too_large() {
    let app = create_test_app_with(5, 16);

    let response = app
        .server
        .post("/api/upload")
        .multipart(upload_form("big.bin", &[0u8; 17], "alice"))
        .await;

    response.assert_status(StatusCode::PAYLOAD_TOO_LARGE);
    let body: Value = response.json();
    assert_eq!(body["error"]["code"], "PAYLOAD_TOO_LARGE");
}

#[tokio::test]
async fn test_upload_invalid_expiry() {
    let app = create_test_app();

    let form = upload_form("doc.txt", b"x", "alice").add_text("expiryDate", "tomorrow-ish");
    let response = app.server.post("/api/upload").multipart(form).await;

    response.assert_status(StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_quota_exhaustion_returns_429() {
    let app = create_test_app_with(2, 1024);

    for i in 0..2 {
        let response = app
            .server
            .post("/api/upload")
            .multipart(upload_form(&format!("f{i}.txt"), b"x", "alice"))
            .await;
        response.assert_status(StatusCode::CREATED);
    }

    let response = app
        .server
        .post("/api/upload")
        .multipart(upload_form("f2.txt", b"x", "alice"))
        .await;
    response.assert_status(StatusCode::TOO_MANY_REQUESTS);
    let body: Value = response.json();
    assert_eq!(body["error"]["code"], "TOO_MANY_REQUESTS");

    // Another identity is unaffected.
    let response = app
        .server
        .post("/api/upload")
        .multipart(upload_form("g.txt", b"x", "bob"))
        .await;
    response.assert_status(StatusCode::CREATED);
}

// ============================================================================
// Metadata and Expiry Tests
// ============================================================================

#[tokio::test]
async fn test_metadata_unknown_id() {
    let app = create_test_app();

    let response = app.server.get("/api/files/nope123/metadata").await;
    response.assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_expired_file_reports_not_found() {
    let app = create_test_app();

    let form = upload_form("fleeting.txt", b"gone soon", "alice")
        .add_text("expiryDate", "2020-01-01T00:00:00Z");
    let response = app.server.post("/api/upload").multipart(form).await;
    response.assert_status(StatusCode::CREATED);
    let body: Value = response.json();
    let id = body["id"].as_str().unwrap();

    // First read evicts, second read stays NotFound.
    let response = app.server.get(&format!("/api/files/{id}/metadata")).await;
    response.assert_status(StatusCode::NOT_FOUND);
    let response = app.server.get(&format!("/api/files/{id}/metadata")).await;
    response.assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_metadata_hides_secrets() {
    let app = create_test_app();

    let form = upload_form("secret.txt", b"classified", "alice").add_text("password", "letmein");
    let response = app.server.post("/api/upload").multipart(form).await;
    let id = response.json::<Value>()["id"].as_str().unwrap().to_string();

    let response = app.server.get(&format!("/api/files/{id}/metadata")).await;
    response.assert_status_ok();

    let body: Value = response.json();
    assert_eq!(body["hasPassword"], true);
    assert!(body.get("passwordHash").is_none());
    assert!(body.get("owner").is_none());
}

#[tokio::test]
async fn test_update_expiry() {
    let app = create_test_app();

    let response = app
        .server
        .post("/api/upload")
        .multipart(upload_form("doc.txt", b"x", "alice"))
        .await;
    let id = response.json::<Value>()["id"].as_str().unwrap().to_string();

    let response = app
        .server
        .put(&format!("/api/files/{id}/expiry"))
        .json(&json!({ "expiryDate": "2027-01-01T00:00:00Z", "userId": "alice" }))
        .await;
    response.assert_status_ok();

    let meta: Value = app
        .server
        .get(&format!("/api/files/{id}/metadata"))
        .await
        .json();
    assert!(meta["expiresAt"].is_string());

    // Null clears the expiry.
    let response = app
        .server
        .put(&format!("/api/files/{id}/expiry"))
        .json(&json!({ "expiryDate": null, "userId": "alice" }))
        .await;
    response.assert_status_ok();

    let meta: Value = app
        .server
        .get(&format!("/api/files/{id}/metadata"))
        .await
        .json();
    assert!(meta.get("expiresAt").is_none());
}

// ============================================================================
// Password Gate Tests
// ============================================================================

#[tokio::test]
async fn test_password_gated_download() {
    let app = create_test_app();

    let form = upload_form("secret.txt", b"classified", "alice").add_text("password", "letmein");
    let response = app.server.post("/api/upload").multipart(form).await;
    let id = response.json::<Value>()["id"].as_str().unwrap().to_string();

    // No password.
    let response = app.server.get(&format!("/api/files/{id}/download")).await;
    response.assert_status(StatusCode::FORBIDDEN);
    let body: Value = response.json();
    assert_eq!(body["error"]["code"], "FORBIDDEN");

    // Wrong password.
    let response = app
        .server
        .get(&format!("/api/files/{id}/download?password=guess"))
        .await;
    response.assert_status(StatusCode::FORBIDDEN);

    // Correct password.
    let response = app
        .server
        .get(&format!("/api/files/{id}/download?password=letmein"))
        .await;
    response.assert_status_ok();
    assert_eq!(response.as_bytes().as_ref(), b"classified");
}

#[tokio::test]
async fn test_verify_password_endpoint() {
    let app = create_test_app();

    let form = upload_form("secret.txt", b"x", "alice").add_text("password", "hunter2");
    let response = app.server.post("/api/upload").multipart(form).await;
    let id = response.json::<Value>()["id"].as_str().unwrap().to_string();

    let response = app
        .server
        .post(&format!("/api/files/{id}/verify-password"))
        .json(&json!({ "password": "hunter2" }))
        .await;
    response.assert_status_ok();
    assert_eq!(response.json::<Value>()["isValid"], true);

    let response = app
        .server
        .post(&format!("/api/files/{id}/verify-password"))
        .json(&json!({ "password": "wrong" }))
        .await;
    response.assert_status_ok();
    assert_eq!(response.json::<Value>()["isValid"], false);
}

#[tokio::test]
async fn test_verify_password_without_gate() {
    let app = create_test_app();

    let response = app
        .server
        .post("/api/upload")
        .multipart(upload_form("open.txt", b"x", "alice"))
        .await;
    let id = response.json::<Value>()["id"].as_str().unwrap().to_string();

    let response = app
        .server
        .post(&format!("/api/files/{id}/verify-password"))
        .json(&json!({ "password": "anything" }))
        .await;
    response.assert_status_ok();
    assert_eq!(response.json::<Value>()["isValid"], false);
}

// ============================================================================
// Visibility Tests
// ============================================================================

#[tokio::test]
async fn test_private_file_owner_only_download() {
    let app = create_test_app();

    let form = upload_form("mine.txt", b"private data", "alice").add_text("visibility", "private");
    let response = app.server.post("/api/upload").multipart(form).await;
    let id = response.json::<Value>()["id"].as_str().unwrap().to_string();

    // Anonymous and non-owner reads are told the file does not exist.
    let response = app.server.get(&format!("/api/files/{id}/download")).await;
    response.assert_status(StatusCode::NOT_FOUND);
    let response = app
        .server
        .get(&format!("/api/files/{id}/download?userId=mallory"))
        .await;
    response.assert_status(StatusCode::NOT_FOUND);

    // Owner reads fine.
    let response = app
        .server
        .get(&format!("/api/files/{id}/download?userId=alice"))
        .await;
    response.assert_status_ok();

    // Metadata stays open for the share page.
    let response = app.server.get(&format!("/api/files/{id}/metadata")).await;
    response.assert_status_ok();
    assert_eq!(response.json::<Value>()["visibility"], "private");
}

#[tokio::test]
async fn test_update_visibility() {
    let app = create_test_app();

    let response = app
        .server
        .post("/api/upload")
        .multipart(upload_form("doc.txt", b"x", "alice"))
        .await;
    let id = response.json::<Value>()["id"].as_str().unwrap().to_string();

    // A non-owner cannot flip visibility.
    let response = app
        .server
        .put(&format!("/api/files/{id}/visibility"))
        .json(&json!({ "visibility": "private", "userId": "mallory" }))
        .await;
    response.assert_status(StatusCode::FORBIDDEN);

    let response = app
        .server
        .put(&format!("/api/files/{id}/visibility"))
        .json(&json!({ "visibility": "private", "userId": "alice" }))
        .await;
    response.assert_status_ok();

    let response = app.server.get(&format!("/api/files/{id}/download")).await;
    response.assert_status(StatusCode::NOT_FOUND);

    // Unknown value is rejected.
    let response = app
        .server
        .put(&format!("/api/files/{id}/visibility"))
        .json(&json!({ "visibility": "friends", "userId": "alice" }))
        .await;
    response.assert_status(StatusCode::UNPROCESSABLE_ENTITY);
}

// ============================================================================
// Delete and Report Tests
// ============================================================================

#[tokio::test]
async fn test_delete_requires_owner() {
    let app = create_test_app();

    let response = app
        .server
        .post("/api/upload")
        .multipart(upload_form("doc.txt", b"x", "alice"))
        .await;
    let id = response.json::<Value>()["id"].as_str().unwrap().to_string();

    let response = app
        .server
        .delete(&format!("/api/files/{id}?userId=mallory"))
        .await;
    response.assert_status(StatusCode::FORBIDDEN);

    let response = app
        .server
        .delete(&format!("/api/files/{id}?userId=alice"))
        .await;
    response.assert_status_ok();

    // Gone from metadata, download, and a second delete.
    let response = app.server.get(&format!("/api/files/{id}/metadata")).await;
    response.assert_status(StatusCode::NOT_FOUND);
    assert!(app.service.metadata(&id).is_err());
    let response = app
        .server
        .delete(&format!("/api/files/{id}?userId=alice"))
        .await;
    response.assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_report_file() {
    let app = create_test_app();

    let response = app
        .server
        .post("/api/upload")
        .multipart(upload_form("sus.txt", b"x", "alice"))
        .await;
    let id = response.json::<Value>()["id"].as_str().unwrap().to_string();

    let response = app
        .server
        .post(&format!("/api/files/{id}/report"))
        .json(&json!({ "reason": "spam" }))
        .await;
    response.assert_status_ok();

    // Blank reason is rejected.
    let response = app
        .server
        .post(&format!("/api/files/{id}/report"))
        .json(&json!({ "reason": "  " }))
        .await;
    response.assert_status(StatusCode::UNPROCESSABLE_ENTITY);

    // Unknown id.
    let response = app
        .server
        .post("/api/files/ghost/report")
        .json(&json!({ "reason": "spam" }))
        .await;
    response.assert_status(StatusCode::NOT_FOUND);
}

// ============================================================================
// History Tests
// ============================================================================

#[tokio::test]
async fn test_upload_history() {
    let app = create_test_app();

    // Unknown user gets an empty list, not an error.
    let response = app.server.get("/api/users/nobody/uploads").await;
    response.assert_status_ok();
    assert_eq!(response.json::<Value>().as_array().unwrap().len(), 0);

    for name in ["a.txt", "b.txt"] {
        app.server
            .post("/api/upload")
            .multipart(upload_form(name, b"x", "alice"))
            .await
            .assert_status(StatusCode::CREATED);
    }

    let response = app.server.get("/api/users/alice/uploads").await;
    response.assert_status_ok();
    let body: Value = response.json();
    let entries = body.as_array().unwrap();
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0]["fileName"], "b.txt");
    assert_eq!(entries[1]["fileName"], "a.txt");
}

// ============================================================================
// Folder Upload Tests
// ============================================================================

#[tokio::test]
async fn test_folder_upload_flow() {
    let app = create_test_app_with(2, 1024);
    let folder_id = "clientMintedId01";

    for (path, bytes) in [
        ("photos/a.jpg", b"aaa".as_slice()),
        ("photos/b.jpg", b"bbbb".as_slice()),
        ("photos/sub/c.jpg", b"cc".as_slice()),
    ] {
        let response = app
            .server
            .post("/api/upload")
            .multipart(folder_member_form(folder_id, path, bytes, "alice"))
            .await;
        response.assert_status(StatusCode::CREATED);
        let body: Value = response.json();
        assert_eq!(body["id"], folder_id);
    }

    let response = app
        .server
        .get(&format!("/api/files/{folder_id}/metadata"))
        .await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["isFolder"], true);
    assert_eq!(body["name"], "photos");
    assert_eq!(body["memberCount"], 3);
    assert_eq!(body["sizeBytes"], 9);

    // Completion charges one quota unit.
    app.server
        .post("/api/upload/folder/progress")
        .json(&json!({ "folderUploadId": folder_id, "current": 3, "total": 3 }))
        .await
        .assert_status_ok();

    // One more single upload fits; the next exceeds the limit of 2.
    app.server
        .post("/api/upload")
        .multipart(upload_form("one.txt", b"x", "alice"))
        .await
        .assert_status(StatusCode::CREATED);
    let response = app
        .server
        .post("/api/upload")
        .multipart(upload_form("two.txt", b"x", "alice"))
        .await;
    response.assert_status(StatusCode::TOO_MANY_REQUESTS);
}

#[tokio::test]
async fn test_folder_download_is_zip() {
    let app = create_test_app();
    let folder_id = "clientMintedId02";

    app.server
        .post("/api/upload")
        .multipart(folder_member_form(
            folder_id,
            "docs/readme.md",
            b"# hello",
            "alice",
        ))
        .await
        .assert_status(StatusCode::CREATED);

    let response = app
        .server
        .get(&format!("/api/files/{folder_id}/download"))
        .await;
    response.assert_status_ok();
    assert_eq!(
        response.header("content-type").to_str().unwrap(),
        "application/zip"
    );
    assert!(response
        .header("content-disposition")
        .to_str()
        .unwrap()
        .contains("docs.zip"));
    assert_eq!(&response.as_bytes()[..4], b"PK\x03\x04");
}

// ============================================================================
// Health Check
// ============================================================================

#[tokio::test]
async fn test_health_endpoint() {
    let app = create_test_app();

    let response = app.server.get("/health").await;
    response.assert_status_ok();
    assert_eq!(response.text(), "OK");
}
