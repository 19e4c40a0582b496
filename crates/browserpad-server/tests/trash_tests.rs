//! Trash workflow tests: soft delete, list, restore, purge, empty.

mod common;

use common::{assert_fails, assert_ok, file_names, TestServer};
use reqwest::StatusCode;
use serde_json::json;

#[tokio::test]
async fn test_soft_delete_and_restore() {
    let server = TestServer::with_trash().await;
    assert_ok(
        server
            .post_action("create", &json!({ "filename": "note.txt", "content": "remember" }))
            .await,
    );

    let body = assert_ok(server.post_action("delete", &json!({ "file": "/note.txt" })).await);
    assert_eq!(body["message"], "Moved to trash");
    assert_eq!(body["name"], "note.txt");
    assert_eq!(body["recoverable"], true);
    let trash_path = body["trash_path"].as_str().unwrap().to_string();
    assert!(trash_path.starts_with("/.trash/"), "{trash_path}");
    assert!(trash_path.ends_with("_note.txt"), "{trash_path}");

    let listing = assert_ok(server.get_action("list", &[]).await);
    assert!(file_names(&listing).is_empty());

    let trash = assert_ok(server.get_action("trash_list", &[]).await);
    assert_eq!(trash["message"], "Trash contents");
    let entry = &trash["files"][0];
    assert_eq!(entry["name"], "note.txt");
    assert_eq!(entry["path"], trash_path.as_str());
    assert_eq!(entry["type"], "file");
    assert_eq!(entry["deleted_date"].as_str().unwrap().len(), "YYYY-MM-DD HH:MM:SS".len());
    let trash_name = entry["trash_name"].as_str().unwrap().to_string();

    let body = assert_ok(server.post_action("restore", &json!({ "file": trash_name })).await);
    assert_eq!(body["message"], "File restored");
    assert_eq!(body["name"], "note.txt");
    assert_eq!(body["path"], "/note.txt");

    let body = assert_ok(server.get_action("read", &[("file", "/note.txt")]).await);
    assert_eq!(body["content"], "remember");
}

#[tokio::test]
async fn test_restore_collision_appends_suffix() {
    let server = TestServer::with_trash().await;
    for content in ["first", "second"] {
        assert_ok(
            server
                .post_action("create", &json!({ "filename": "note.txt", "content": content }))
                .await,
        );
        assert_ok(server.post_action("delete", &json!({ "file": "/note.txt" })).await);
    }
    assert_ok(
        server
            .post_action("create", &json!({ "filename": "note.txt", "content": "live" }))
            .await,
    );

    let trash = assert_ok(server.get_action("trash_list", &[]).await);
    let names: Vec<String> = trash["files"]
        .as_array()
        .unwrap()
        .iter()
        .map(|f| f["trash_name"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(names.len(), 2);

    let mut restored = Vec::new();
    for name in &names {
        let body = assert_ok(server.post_action("restore", &json!({ "file": name })).await);
        restored.push(body["name"].as_str().unwrap().to_string());
    }
    restored.sort();
    assert_eq!(restored, ["note_restored_1.txt", "note_restored_2.txt"]);
    assert_eq!(
        std::fs::read_to_string(server.root().join("note.txt")).unwrap(),
        "live"
    );
}

#[tokio::test]
async fn test_restore_errors() {
    let server = TestServer::with_trash().await;
    assert_fails(
        server.post_action("restore", &json!({ "file": "123_missing.txt" })).await,
        StatusCode::NOT_FOUND,
        "File not found in trash",
    );
    assert_fails(
        server.post_action("restore", &json!({ "file": "" })).await,
        StatusCode::BAD_REQUEST,
        "Missing file parameter",
    );
    assert_fails(
        server.post_action("restore", &json!({ "file": "../etc/passwd" })).await,
        StatusCode::BAD_REQUEST,
        "Invalid trash entry name",
    );
}

#[tokio::test]
async fn test_purge_single_entry() {
    let server = TestServer::with_trash().await;
    std::fs::write(server.root().join(".trash/100_a.txt"), "a").unwrap();
    std::fs::write(server.root().join(".trash/200_b.txt"), "b").unwrap();

    let body = assert_ok(server.post_action("purge", &json!({ "file": "100_a.txt" })).await);
    assert_eq!(body["name"], "100_a.txt");

    let trash = assert_ok(server.get_action("trash_list", &[]).await);
    assert_eq!(file_names(&trash), ["b.txt"]);
}

#[tokio::test]
async fn test_empty_trash_twice() {
    let server = TestServer::with_trash().await;
    for name in ["a.txt", "b.txt"] {
        assert_ok(server.post_action("create", &json!({ "filename": name, "content": name })).await);
        assert_ok(server.post_action("delete", &json!({ "file": format!("/{name}") })).await);
    }

    // No body at all: empty_trash takes no parameters.
    let (status, body) = common::decode(
        server
            .request(reqwest::Method::POST, "/api/files?action=empty_trash", None)
            .await,
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["message"], "Trash emptied");
    assert_eq!(body["removed"], 2);
    assert!(server.root().join(".trash").is_dir());

    let body = assert_ok(server.post_action("empty_trash", &json!({})).await);
    assert_eq!(body["removed"], 0);

    let trash = assert_ok(server.get_action("trash_list", &[]).await);
    assert_eq!(trash["message"], "Trash is empty");
}

#[tokio::test]
async fn test_without_trash_delete_is_permanent() {
    let server = TestServer::without_trash().await;
    assert_ok(server.post_action("create", &json!({ "filename": "x.txt", "content": "x" })).await);

    let body = assert_ok(server.post_action("delete", &json!({ "file": "/x.txt" })).await);
    assert_eq!(body["message"], "File permanently deleted");
    assert!(!server.root().join("x.txt").exists());

    let body = assert_ok(server.post_action("empty_trash", &json!({})).await);
    assert_eq!(body["message"], "Trash already empty");
    let body = assert_ok(server.get_action("trash_list", &[]).await);
    assert_eq!(body["message"], "Trash is empty");
}

#[tokio::test]
async fn test_trash_directory_is_protected() {
    let server = TestServer::with_trash().await;
    assert_fails(
        server.post_action("delete", &json!({ "file": "/.trash", "permanent": true })).await,
        StatusCode::FORBIDDEN,
        "Operation not permitted on a reserved path",
    );
    assert_fails(
        server.post_action("delete", &json!({ "file": "/" })).await,
        StatusCode::FORBIDDEN,
        "Operation not permitted on a reserved path",
    );
    assert!(server.root().join(".trash").is_dir());
}
