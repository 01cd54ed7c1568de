//! Integration tests for the Spellbook HTTP API.

mod support;

use axum::http::StatusCode;
use serde_json::{json, Value};
use spellbook_server::StoreBackend;
use support::{setup_test_server, test_config_for_dir, test_server_for_config};
use tempfile::TempDir;

const BACKENDS: [StoreBackend; 2] = [StoreBackend::JsonFile, StoreBackend::Table];

fn frost_bolt() -> Value {
    json!({
        "name": "Frost Bolt",
        "element": "Frost",
        "rarity": "Common",
        "manaCost": 5,
        "cooldownSec": 2,
        "description": "A shard of ice.",
        "ingredients": ["ice crystal", " ", "blue ink "]
    })
}

#[tokio::test]
async fn test_spell_lifecycle() {
    for backend in BACKENDS {
        let (server, _temp) = setup_test_server(backend);

        let create_response = server.post("/spells").json(&frost_bolt()).await;
        assert_eq!(create_response.status_code(), StatusCode::CREATED);
        let created: Value = create_response.json();
        let id = created["id"].as_str().expect("id").to_string();
        assert_eq!(created["name"], "Frost Bolt");
        assert_eq!(created["element"], "Frost");
        assert_eq!(created["manaCost"], 5);
        assert_eq!(created["ingredients"], json!(["ice crystal", "blue ink"]));
        assert_eq!(created["createdAt"], created["updatedAt"]);

        let get_response = server.get(&format!("/spells/{}", id)).await;
        assert_eq!(get_response.status_code(), StatusCode::OK);
        assert_eq!(get_response.json::<Value>(), created);

        let update_response = server
            .put(&format!("/spells/{}", id))
            .json(&json!({ "manaCost": 8 }))
            .await;
        assert_eq!(update_response.status_code(), StatusCode::OK);
        let updated: Value = update_response.json();
        assert_eq!(updated["manaCost"], 8);
        assert_eq!(updated["name"], "Frost Bolt");
        assert_eq!(updated["createdAt"], created["createdAt"]);
        assert_ne!(updated["updatedAt"], created["updatedAt"]);

        let delete_response = server.delete(&format!("/spells/{}", id)).await;
        assert_eq!(delete_response.status_code(), StatusCode::OK);
        let deleted: Value = delete_response.json();
        assert_eq!(deleted["id"], id.as_str());
        assert_eq!(deleted["manaCost"], 8);

        let get_deleted = server.get(&format!("/spells/{}", id)).await;
        assert_eq!(get_deleted.status_code(), StatusCode::NOT_FOUND);
        assert_eq!(get_deleted.json::<Value>(), json!({ "error": "Not found" }));
    }
}

#[tokio::test]
async fn test_create_defaults_and_numeric_strings() {
    let (server, _temp) = setup_test_server(StoreBackend::JsonFile);

    let response = server
        .post("/spells")
        .json(&json!({ "name": "  Spark ", "manaCost": "3" }))
        .await;
    assert_eq!(response.status_code(), StatusCode::CREATED);
    let spell: Value = response.json();
    assert_eq!(spell["name"], "Spark");
    assert_eq!(spell["element"], "Arcane");
    assert_eq!(spell["rarity"], "Common");
    assert_eq!(spell["manaCost"], 3);
    assert_eq!(spell["cooldownSec"], 0);
    assert_eq!(spell["description"], "");
    assert_eq!(spell["ingredients"], json!([]));
}

#[tokio::test]
async fn test_validation_reports_every_field() {
    for backend in BACKENDS {
        let (server, _temp) = setup_test_server(backend);

        let response = server
            .post("/spells")
            .json(&json!({
                "name": "   ",
                "element": "Shadow",
                "manaCost": -1
            }))
            .await;
        assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
        let body: Value = response.json();
        let message = body["error"].as_str().expect("error message");
        assert!(message.contains("name must not be empty"), "{}", message);
        assert!(message.contains("element must be one of"), "{}", message);
        assert!(
            message.contains("manaCost must be a non-negative integer"),
            "{}",
            message
        );

        let list: Value = server.get("/spells").await.json();
        assert_eq!(list["total"], 0);
    }
}

#[tokio::test]
async fn test_invalid_update_writes_nothing() {
    let (server, _temp) = setup_test_server(StoreBackend::Table);
    let created: Value = server.post("/spells").json(&frost_bolt()).await.json();
    let id = created["id"].as_str().expect("id");

    let response = server
        .put(&format!("/spells/{}", id))
        .json(&json!({ "name": "", "rarity": "Legendary" }))
        .await;
    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);

    let current: Value = server.get(&format!("/spells/{}", id)).await.json();
    assert_eq!(current, created);
}

#[tokio::test]
async fn test_missing_ids_return_not_found() {
    for backend in BACKENDS {
        let (server, _temp) = setup_test_server(backend);

        assert_eq!(
            server.get("/spells/nope").await.status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            server
                .put("/spells/nope")
                .json(&json!({ "name": "x" }))
                .await
                .status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            server.delete("/spells/nope").await.status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            server.post("/trash/nope/restore").await.status_code(),
            StatusCode::NOT_FOUND
        );
    }
}

#[tokio::test]
async fn test_non_object_body_is_rejected() {
    let (server, _temp) = setup_test_server(StoreBackend::JsonFile);
    let response = server.post("/spells").json(&json!(["Frost Bolt"])).await;
    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
    let body: Value = response.json();
    assert_eq!(body["error"], "request body must be a JSON object");
}

#[tokio::test]
async fn test_pagination_total_and_offsets() {
    for backend in BACKENDS {
        let (server, _temp) = setup_test_server(backend);
        let mut names = Vec::new();
        for i in 0..5 {
            let name = format!("Spell {}", i);
            let response = server.post("/spells").json(&json!({ "name": name })).await;
            assert_eq!(response.status_code(), StatusCode::CREATED);
            names.push(name);
        }
        names.reverse();

        let first: Value = server.get("/spells?limit=2&offset=0").await.json();
        let second: Value = server.get("/spells?limit=2&offset=2").await.json();
        let third: Value = server.get("/spells?limit=2&offset=4").await.json();
        for page in [&first, &second, &third] {
            assert_eq!(page["total"], 5);
            assert_eq!(page["limit"], 2);
        }
        let stitched: Vec<String> = [&first, &second, &third]
            .iter()
            .flat_map(|page| page["items"].as_array().expect("items").clone())
            .map(|item| item["name"].as_str().expect("name").to_string())
            .collect();
        assert_eq!(stitched, names);

        let past_end: Value = server.get("/spells?offset=999999").await.json();
        assert_eq!(past_end["items"], json!([]));
        assert_eq!(past_end["total"], 5);
        assert_eq!(past_end["offset"], 999999);
    }
}

#[tokio::test]
async fn test_pagination_params_are_clamped_or_rejected() {
    let (server, _temp) = setup_test_server(StoreBackend::JsonFile);

    let defaults: Value = server.get("/spells").await.json();
    assert_eq!(defaults["limit"], 20);
    assert_eq!(defaults["offset"], 0);

    let clamped: Value = server.get("/spells?limit=5000&offset=-3").await.json();
    assert_eq!(clamped["limit"], 100);
    assert_eq!(clamped["offset"], 0);

    let floor: Value = server.get("/spells?limit=0").await.json();
    assert_eq!(floor["limit"], 1);

    let bad_limit = server.get("/spells?limit=lots").await;
    assert_eq!(bad_limit.status_code(), StatusCode::BAD_REQUEST);
    assert_eq!(
        bad_limit.json::<Value>(),
        json!({ "error": "limit must be a number" })
    );

    let bad_offset = server.get("/spells?offset=x").await;
    assert_eq!(bad_offset.status_code(), StatusCode::BAD_REQUEST);
    assert_eq!(
        bad_offset.json::<Value>(),
        json!({ "error": "offset must be a number" })
    );
}

#[tokio::test]
async fn test_trash_and_restore_round_trip() {
    for backend in BACKENDS {
        let (server, _temp) = setup_test_server(backend);
        let created: Value = server.post("/spells").json(&frost_bolt()).await.json();
        let id = created["id"].as_str().expect("id").to_string();

        let empty: Value = server.get("/trash").await.json();
        assert_eq!(empty, json!([]));

        server.delete(&format!("/spells/{}", id)).await;

        let trash: Value = server.get("/trash").await.json();
        let entries = trash.as_array().expect("trash array");
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0]["id"], id.as_str());
        assert_eq!(entries[0]["name"], "Frost Bolt");
        assert!(entries[0]["deletedAt"].is_string());

        let list: Value = server.get("/spells").await.json();
        assert_eq!(list["total"], 0);

        let restore_response = server.post(&format!("/trash/{}/restore", id)).await;
        assert_eq!(restore_response.status_code(), StatusCode::OK);
        let restored: Value = restore_response.json();
        assert_eq!(restored, created);

        let trash_after: Value = server.get("/trash").await.json();
        assert_eq!(trash_after, json!([]));
        let fetched: Value = server.get(&format!("/spells/{}", id)).await.json();
        assert_eq!(fetched, created);

        let again = server.post(&format!("/trash/{}/restore", id)).await;
        assert_eq!(again.status_code(), StatusCode::NOT_FOUND);
    }
}

#[tokio::test]
async fn test_health_and_security_headers() {
    let (server, _temp) = setup_test_server(StoreBackend::JsonFile);
    let response = server.get("/health").await;
    assert_eq!(response.status_code(), StatusCode::OK);
    assert_eq!(response.json::<Value>(), json!({ "ok": true }));
    response.assert_header("x-content-type-options", "nosniff");
    response.assert_header("x-frame-options", "DENY");
}

#[tokio::test]
async fn test_records_survive_reopen() {
    for backend in BACKENDS {
        let temp_dir = TempDir::new().expect("temp dir");
        let id = {
            let server = test_server_for_config(test_config_for_dir(backend, temp_dir.path()));
            let created: Value = server.post("/spells").json(&frost_bolt()).await.json();
            created["id"].as_str().expect("id").to_string()
        };

        let server = test_server_for_config(test_config_for_dir(backend, temp_dir.path()));
        let response = server.get(&format!("/spells/{}", id)).await;
        assert_eq!(response.status_code(), StatusCode::OK);
    }
}

#[tokio::test]
async fn test_loopback_cors_allows_matching_origin_only() {
    let temp_dir = TempDir::new().expect("temp dir");
    let mut config = test_config_for_dir(StoreBackend::JsonFile, temp_dir.path());
    config.port = 4055;
    let server = test_server_for_config(config);

    let allowed = "http://localhost:4055";
    let allowed_response = server.get("/spells").add_header("origin", allowed).await;
    assert_eq!(allowed_response.status_code(), StatusCode::OK);
    allowed_response.assert_header("access-control-allow-origin", allowed);

    let other_response = server
        .get("/spells")
        .add_header("origin", "http://example.com:3000")
        .await;
    assert_eq!(other_response.status_code(), StatusCode::OK);
    assert!(!other_response.contains_header("access-control-allow-origin"));
}

#[tokio::test]
async fn test_configured_cors_origins_replace_loopback_defaults() {
    let temp_dir = TempDir::new().expect("temp dir");
    let mut config = test_config_for_dir(StoreBackend::Table, temp_dir.path());
    config.port = 4056;
    config.cors_origins = vec!["https://spells.example".to_string()];
    let server = test_server_for_config(config);

    let configured = server
        .get("/health")
        .add_header("origin", "https://spells.example")
        .await;
    configured.assert_header("access-control-allow-origin", "https://spells.example");

    let loopback = server
        .get("/health")
        .add_header("origin", "http://localhost:4056")
        .await;
    assert!(!loopback.contains_header("access-control-allow-origin"));
}
