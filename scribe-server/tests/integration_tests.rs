mod test_helper;

use reqwest::Client;
use serde_json::{Value, json};
use test_helper::{flush, spawn_test_server};

#[tokio::test]
async fn test_health_check() {
    let server = spawn_test_server().await;
    let client = Client::new();

    let res = client
        .get(format!("{}/health", server.base_url))
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), 200);

    let body: Value = res.json().await.unwrap();
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["service"], "scribe");
    assert_eq!(body["pending"], 0);
}

#[tokio::test]
async fn test_entity_create_get_delete() {
    let server = spawn_test_server().await;
    let client = Client::new();

    // CREATE
    let res = client
        .post(format!("{}/entity", server.base_url))
        .json(&json!({ "content": "hello" }))
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), 201);
    assert_eq!(res.headers()["location"], "1");
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["id"], "1");

    // GET (served from the pending set)
    let res = client
        .get(format!("{}/entity/1", server.base_url))
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), 200);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["content"], "hello");
    assert_eq!(body["createUser"], "createUser");
    assert!(body["createDate"].is_null());

    // DELETE
    let res = client
        .delete(format!("{}/entity/1", server.base_url))
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), 200);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["deleted"], true);

    // GET after delete
    let res = client
        .get(format!("{}/entity/1", server.base_url))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 404);
}

#[tokio::test]
async fn test_create_user_from_header() {
    let server = spawn_test_server().await;
    let client = Client::new();

    client
        .post(format!("{}/entity", server.base_url))
        .header("x-user-id", "alice")
        .json(&json!({ "content": "from alice" }))
        .send()
        .await
        .unwrap();

    let body: Value = client
        .get(format!("{}/entity/1", server.base_url))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["createUser"], "alice");
}

#[tokio::test]
async fn test_list_before_and_after_flush() {
    let server = spawn_test_server().await;
    let client = Client::new();

    for content in ["a", "b"] {
        client
            .post(format!("{}/entity", server.base_url))
            .json(&json!({ "content": content }))
            .send()
            .await
            .unwrap();
    }
    assert_eq!(server.cache.pending_count(), 2);

    let list: Vec<Value> = client
        .get(format!("{}/entity", server.base_url))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(list.len(), 2);

    flush(&server.cache).await;
    assert_eq!(server.cache.pending_count(), 0);

    let list: Vec<Value> = client
        .get(format!("{}/entity", server.base_url))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(list.len(), 2);
    assert!(list.iter().all(|e| e["createDate"].is_string()));
}

#[tokio::test]
async fn test_metrics_endpoint_exposes_pending_gauge() {
    let server = spawn_test_server().await;
    let client = Client::new();

    client
        .post(format!("{}/entity", server.base_url))
        .json(&json!({ "content": "counted" }))
        .send()
        .await
        .unwrap();

    let res = client
        .get(format!("{}/metrics", server.base_url))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 200);

    let text = res.text().await.unwrap();
    assert!(text.contains("entity_cache_size 1"));
    assert!(text.contains("scribe_http_requests_total"));
    assert_eq!(server.metrics.gauge_value("entity_cache_size"), Some(1));
}
