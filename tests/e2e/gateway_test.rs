//! E2E tests for the Gateway HTTP API against a mocked completion provider

use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use httpmock::prelude::*;
use serde_json::{json, Value};
use supportdesk_gateway::db::InMemoryConversationRepository;
use supportdesk_gateway::{build_routes, ChatService};
use supportdesk_runtime::{CompletionClient, CompletionConfig, RetryConfig};
use tokio::net::TcpListener;

async fn spawn_gateway_server(
    provider: &MockServer,
) -> (std::net::SocketAddr, tokio::task::JoinHandle<()>) {
    let config = CompletionConfig::new("sk-or-gateway", "openai/gpt-4o-mini")
        .with_base_url(provider.url("/api/v1"))
        .with_attempt_timeout(Duration::from_secs(5))
        .with_retry(RetryConfig {
            initial_delay_ms: 10,
            ..RetryConfig::default()
        });
    let client = CompletionClient::from_config(config).expect("build completion client");
    let service = ChatService::new(
        Arc::new(InMemoryConversationRepository::new()),
        Arc::new(client),
    );

    let app: Router = build_routes(Arc::new(service));
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind test listener");
    let addr = listener.local_addr().expect("local addr");

    let handle = tokio::spawn(async move {
        axum::serve(listener, app).await.expect("serve gateway app");
    });

    (addr, handle)
}

#[tokio::test]
async fn gateway_health_check() {
    let provider = MockServer::start_async().await;
    let (addr, server_handle) = spawn_gateway_server(&provider).await;

    let response = reqwest::get(format!("http://{}/health", addr))
        .await
        .expect("health check request");

    assert!(response.status().is_success());
    server_handle.abort();
}

#[tokio::test]
async fn chat_round_trip_persists_history() {
    let provider = MockServer::start_async().await;
    let first = provider
        .mock_async(|when, then| {
            when.method(POST)
                .path("/api/v1/chat/completions")
                .body_includes("What laptops do you sell?");
            then.status(200).json_body(json!({
                "choices": [{ "message": { "role": "assistant", "content": "We stock ultrabooks and gaming laptops." } }]
            }));
        })
        .await;
    let (addr, server_handle) = spawn_gateway_server(&provider).await;
    let http = reqwest::Client::new();

    let body: Value = http
        .post(format!("http://{}/chat/message", addr))
        .json(&json!({ "message": "What laptops do you sell?" }))
        .send()
        .await
        .expect("chat request")
        .json()
        .await
        .expect("chat response body");

    assert_eq!(body["reply"], "We stock ultrabooks and gaming laptops.");
    let session_id = body["sessionId"].as_str().expect("session id").to_string();
    first.assert_async().await;

    let follow_up = provider
        .mock_async(|when, then| {
            when.method(POST)
                .path("/api/v1/chat/completions")
                .body_includes("We stock ultrabooks and gaming laptops.")
                .body_includes("Any under $1000?");
            then.status(200).json_body(json!({
                "choices": [{ "message": { "role": "assistant", "content": "Yes, several." } }]
            }));
        })
        .await;

    let body: Value = http
        .post(format!("http://{}/chat/message", addr))
        .json(&json!({ "message": "Any under $1000?", "sessionId": session_id }))
        .send()
        .await
        .expect("follow-up request")
        .json()
        .await
        .expect("follow-up response body");
    assert_eq!(body["sessionId"], session_id.as_str());
    follow_up.assert_async().await;

    let history: Value = http
        .get(format!("http://{}/chat/history/{}", addr, session_id))
        .send()
        .await
        .expect("history request")
        .json()
        .await
        .expect("history body");

    assert_eq!(history["history"].as_array().map(Vec::len), Some(4));
    assert_eq!(history["history"][3]["content"], "Yes, several.");
    server_handle.abort();
}

#[tokio::test]
async fn provider_rejection_surfaces_as_server_error() {
    let provider = MockServer::start_async().await;
    provider
        .mock_async(|when, then| {
            when.method(POST).path("/api/v1/chat/completions");
            then.status(401)
                .json_body(json!({ "error": { "message": "No auth credentials found" } }));
        })
        .await;
    let (addr, server_handle) = spawn_gateway_server(&provider).await;

    let response = reqwest::Client::new()
        .post(format!("http://{}/chat/message", addr))
        .json(&json!({ "message": "hello", "sessionId": "e2e-401" }))
        .send()
        .await
        .expect("chat request");

    assert_eq!(response.status(), reqwest::StatusCode::INTERNAL_SERVER_ERROR);
    let body: Value = response.json().await.expect("error body");
    assert_eq!(body["error"], "AI Error: No auth credentials found");
    server_handle.abort();
}
