use std::time::Duration;

use httpmock::prelude::*;
use supportdesk_context::Turn;
use supportdesk_runtime::{
    CompletionClient, CompletionConfig, CompletionError, ReplyGenerator, RetryConfig, ServerFault,
};

fn client_for(server: &MockServer) -> CompletionClient {
    let config = CompletionConfig::new("sk-or-e2e", "openai/gpt-4o-mini")
        .with_base_url(server.url("/api/v1"))
        .with_attempt_timeout(Duration::from_secs(5))
        .with_retry(RetryConfig {
            initial_delay_ms: 10,
            ..RetryConfig::default()
        });
    CompletionClient::from_config(config).expect("build completion client")
}

#[tokio::test]
async fn completion_client_end_to_end_with_mock_api() {
    let server = MockServer::start_async().await;

    let completion_mock = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/api/v1/chat/completions")
                .header("authorization", "Bearer sk-or-e2e")
                .body_includes("\"role\":\"system\"")
                .body_includes("Do you ship to Canada?");
            then.status(200)
                .header("content-type", "application/json")
                .json_body(serde_json::json!({
                    "id": "gen-mock-1",
                    "object": "chat.completion",
                    "created": 1_700_000_000,
                    "model": "openai/gpt-4o-mini",
                    "choices": [
                        {
                            "index": 0,
                            "message": {
                                "role": "assistant",
                                "content": "Yes, we ship to Canada in 7-14 days."
                            },
                            "finish_reason": "stop"
                        }
                    ]
                }));
        })
        .await;

    let history = vec![
        Turn::user("Hi"),
        Turn::assistant("Hello! How can I help you today?"),
    ];

    let reply = client_for(&server)
        .generate_reply(&history, "Do you ship to Canada?")
        .await
        .expect("reply should be generated");

    completion_mock.assert_async().await;
    assert_eq!(reply, "Yes, we ship to Canada in 7-14 days.");
}

#[tokio::test]
async fn windowed_history_is_sent_to_provider() {
    let server = MockServer::start_async().await;

    let history: Vec<Turn> = (0..12).map(|i| Turn::user(format!("turn-{i:02}"))).collect();

    let windowed_mock = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/api/v1/chat/completions")
                .body_includes("turn-02")
                .body_includes("turn-11")
                .body_excludes("turn-00")
                .body_excludes("turn-01");
            then.status(200).json_body(serde_json::json!({
                "choices": [{ "message": { "role": "assistant", "content": "windowed" } }]
            }));
        })
        .await;

    let reply = client_for(&server)
        .generate_reply(&history, "latest")
        .await
        .expect("reply should be generated");

    assert_eq!(reply, "windowed");
    windowed_mock.assert_async().await;
}

#[tokio::test]
async fn unauthorized_is_not_retried() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(POST).path("/api/v1/chat/completions");
            then.status(401);
        })
        .await;

    let err = client_for(&server)
        .generate_reply(&[], "hello")
        .await
        .unwrap_err();

    assert_eq!(err, CompletionError::Authentication);
    mock.assert_hits_async(1).await;
}

#[tokio::test]
async fn server_errors_are_retried_until_exhausted() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(POST).path("/api/v1/chat/completions");
            then.status(503).body("Service Unavailable");
        })
        .await;

    let err = client_for(&server)
        .generate_reply(&[], "hello")
        .await
        .unwrap_err();

    assert_eq!(err, CompletionError::Server(ServerFault::Status(503)));
    mock.assert_hits_async(3).await;
}

#[tokio::test]
async fn missing_credential_never_reaches_provider() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(POST);
            then.status(200);
        })
        .await;

    let config = CompletionConfig {
        model: Some("openai/gpt-4o-mini".to_string()),
        ..CompletionConfig::default()
    }
    .with_base_url(server.url("/api/v1"));
    let client = CompletionClient::from_config(config).expect("build completion client");

    let err = client.generate_reply(&[], "hello").await.unwrap_err();

    assert!(err.is_configuration());
    mock.assert_hits_async(0).await;
}
