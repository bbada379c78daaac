use serde_json::Value;
use wiremock::MockServer;

use std::collections::HashMap;
use std::sync::Arc;

use tally::components::counter_store::InMemoryCounterStore;

use crate::utils::dynamodb_mocking::{dynamodb_store, mocking_get_item};
use crate::utils::{
    FailingCounterStore, MalformedCounterStore, StalledCounterStore, TestApp, TestAppOptions,
};

async fn status_of(response: reqwest::Response) -> String {
    let body = response
        .json::<HashMap<String, String>>()
        .await
        .expect("Failed to read response body");
    body.get("status").unwrap().clone()
}

#[tokio::test]
async fn health_check_returns_ok_when_store_answers() {
    let app = TestApp::spawn_with_counter(3).await;

    let response = app.get_healthcheck().await;

    assert_eq!(response.status().as_u16(), 200);
    assert_eq!(status_of(response).await, "ok");
}

#[tokio::test]
async fn health_check_returns_ok_even_if_counter_record_is_missing() {
    let store = Arc::new(InMemoryCounterStore::new());
    let app = TestApp::spawn_with_store(store, TestAppOptions::default()).await;

    let response = app.get_healthcheck().await;

    assert_eq!(response.status().as_u16(), 200);
    assert_eq!(status_of(response).await, "ok");
}

#[tokio::test]
async fn health_check_reports_error_in_body_with_200_when_store_fails() {
    let app =
        TestApp::spawn_with_store(Arc::new(FailingCounterStore), TestAppOptions::default()).await;

    let response = app.get_healthcheck().await;

    assert_eq!(response.status().as_u16(), 200);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body, serde_json::json!({ "status": "error" }));
}

#[tokio::test]
async fn strict_health_check_returns_503_when_store_fails() {
    let options = TestAppOptions {
        strict_health_status: true,
        ..Default::default()
    };
    let app = TestApp::spawn_with_store(Arc::new(FailingCounterStore), options).await;

    let response = app.get_healthcheck().await;

    assert_eq!(response.status().as_u16(), 503);
    assert_eq!(status_of(response).await, "error");
}

#[tokio::test]
async fn health_check_gives_up_on_a_stalled_store() {
    let options = TestAppOptions {
        timeout_ms: Some(100),
        ..Default::default()
    };
    let app = TestApp::spawn_with_store(Arc::new(StalledCounterStore), options).await;

    let response = app.get_healthcheck().await;

    assert_eq!(response.status().as_u16(), 200);
    assert_eq!(status_of(response).await, "error");
}

#[tokio::test]
async fn healthcheck_should_return_200_even_if_url_with_extra_trailing_slash() {
    let app = TestApp::spawn_server().await;
    let api_addr = format!("{}/healthcheck/", app.address);

    let response = app
        .client
        .get(api_addr)
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status().as_u16(), 200);
    assert_eq!(status_of(response).await, "ok");
}

#[tokio::test]
async fn health_check_never_moves_the_counter() {
    let app = TestApp::spawn_with_counter(10).await;

    for _ in 0..5 {
        let response = app.get_healthcheck().await;
        assert_eq!(response.status().as_u16(), 200);
    }
    assert_eq!(app.stored_counter().await, Some(10));

    let body: Value = app.get_root().await.json().await.unwrap();
    assert_eq!(body["counter"], 11);
}

#[tokio::test]
async fn health_check_is_ok_when_store_holds_a_non_numeric_count() {
    let options = TestAppOptions {
        strict_health_status: true,
        ..Default::default()
    };
    let app = TestApp::spawn_with_store(Arc::new(MalformedCounterStore), options).await;

    let response = app.get_healthcheck().await;

    assert_eq!(response.status().as_u16(), 200);
    assert_eq!(status_of(response).await, "ok");
}

#[tokio::test]
async fn health_check_is_ok_when_dynamodb_answers_with_a_string_count() {
    let server = MockServer::start().await;
    let item = serde_json::json!({
        "Item": {
            "CounterId": { "S": "Counter1" },
            "Count": { "S": "oops" }
        }
    });
    mocking_get_item(&server, item, 1).await;

    let app =
        TestApp::spawn_with_store(Arc::new(dynamodb_store(&server)), TestAppOptions::default())
            .await;

    let response = app.get_healthcheck().await;

    assert_eq!(response.status().as_u16(), 200);
    assert_eq!(status_of(response).await, "ok");
}
