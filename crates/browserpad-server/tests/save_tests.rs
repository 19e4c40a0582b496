//! Tests for the save endpoint.

mod common;

use common::{assert_fails, assert_ok, decode, TestServer};
use reqwest::{Method, StatusCode};
use serde_json::json;

#[tokio::test]
async fn test_save_new_file() {
    let server = TestServer::without_trash().await;
    std::fs::create_dir(server.root().join("scripts")).unwrap();

    let body = assert_ok(
        server
            .save("https://pad.example.com/FILES/scripts/deploy.sh", "#!/bin/sh\necho hi\n")
            .await,
    );
    assert_eq!(body["message"], "File saved successfully");
    assert_eq!(body["filename"], "deploy.sh");
    assert_eq!(body["path"], "/scripts/deploy.sh");
    assert_eq!(body["size"], 18);
    assert!(body["timestamp"].is_string());
    assert!(body.get("backup").is_none());
}

#[tokio::test]
async fn test_save_existing_file_takes_backup() {
    let server = TestServer::without_trash().await;
    std::fs::write(server.root().join("config.yml"), "old: true\n").unwrap();

    let body = assert_ok(server.save("/FILES/config.yml", "new: true\n").await);
    let backup = body["backup"].as_str().unwrap();
    assert!(backup.starts_with("/config.yml.backup."), "{backup}");

    assert_eq!(
        std::fs::read_to_string(server.root().join(&backup[1..])).unwrap(),
        "old: true\n"
    );
    assert_eq!(
        std::fs::read_to_string(server.root().join("config.yml")).unwrap(),
        "new: true\n"
    );
}

#[tokio::test]
async fn test_save_backup_failure_keeps_original() {
    let server = TestServer::without_trash().await;
    std::fs::write(server.root().join("a.txt"), "old").unwrap();
    let now = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap()
        .as_secs();
    for epoch in now..now + 64 {
        std::fs::create_dir(server.root().join(format!("a.txt.backup.{epoch}"))).unwrap();
    }

    assert_fails(
        server.save("/FILES/a.txt", "new").await,
        StatusCode::INTERNAL_SERVER_ERROR,
        "Could not create backup before writing",
    );
    assert_eq!(std::fs::read_to_string(server.root().join("a.txt")).unwrap(), "old");
}

#[tokio::test]
async fn test_save_php_alias() {
    let server = TestServer::without_trash().await;
    let body = assert_ok(
        server
            .post_json("/api/save.php", &json!({ "file": "/FILES/a.md", "content": "# A" }))
            .await,
    );
    assert_eq!(body["filename"], "a.md");
}

#[tokio::test]
async fn test_save_rejections() {
    let server = TestServer::without_trash().await;

    let (status, body) = server.save("/FILES/tool.exe", "MZ").await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert!(
        body["message"]
            .as_str()
            .unwrap()
            .starts_with("File extension not allowed. Allowed: .sh, .py, .js"),
        "{body}"
    );

    assert_fails(
        server.save("/FILES/../outside.txt", "x").await,
        StatusCode::FORBIDDEN,
        "Path traversal detected. Access denied.",
    );
    assert_fails(
        server.save("/somewhere/else.txt", "x").await,
        StatusCode::BAD_REQUEST,
        "Invalid file path format",
    );
    assert_fails(
        server.save("/FILES/a.txt", "").await,
        StatusCode::BAD_REQUEST,
        "Missing required fields: file and content",
    );

    std::fs::create_dir(server.root().join("dir.txt")).unwrap();
    assert_fails(
        server.save("/FILES/dir.txt", "x").await,
        StatusCode::BAD_REQUEST,
        "Target is a directory, not a file",
    );
}

#[tokio::test]
async fn test_save_requires_post() {
    let server = TestServer::without_trash().await;
    assert_fails(
        decode(server.request(Method::GET, "/api/save", None).await).await,
        StatusCode::METHOD_NOT_ALLOWED,
        "Method not allowed. Use POST.",
    );
}
