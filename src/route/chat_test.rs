use std::sync::Arc;

use poem::{http::StatusCode, test::TestClient};
use serde_json::json;

use crate::{
    core::test_utils::{lazy_app_state, stub_providers, test_config, StubChat},
    init_openapi_route,
};

#[tokio::test]
async fn test_chat_ai_replies() -> anyhow::Result<()> {
    // Given
    let config = test_config();
    let (providers, chat, ..) = stub_providers();
    let app = init_openapi_route(lazy_app_state(&config, providers), &config);
    let cli = TestClient::new(app);

    // When
    let resp = cli
        .post("/chat-ai/")
        .body_json(&json!({"message": "  what should I focus on?  "}))
        .send()
        .await;

    // Expect
    resp.assert_status_is_ok();
    resp.assert_json(json!({"reply": "Stay curious."})).await;
    assert_eq!(chat.calls().len(), 1);
    assert_eq!(chat.calls()[0].1, "what should I focus on?");
    Ok(())
}

#[tokio::test]
async fn test_chat_ai_rejects_blank_message() -> anyhow::Result<()> {
    // Given
    let config = test_config();
    let (providers, chat, ..) = stub_providers();
    let app = init_openapi_route(lazy_app_state(&config, providers), &config);
    let cli = TestClient::new(app);

    for payload in [json!({}), json!({"message": ""}), json!({"message": "   "})] {
        // When
        let resp = cli.post("/chat-ai/").body_json(&payload).send().await;

        // Expect
        resp.assert_status(StatusCode::BAD_REQUEST);
        resp.assert_json(json!({"error": "No message provided"})).await;
    }
    assert!(chat.calls().is_empty());
    Ok(())
}

#[tokio::test]
async fn test_chat_ai_invalid_json() -> anyhow::Result<()> {
    // Given
    let config = test_config();
    let (providers, ..) = stub_providers();
    let app = init_openapi_route(lazy_app_state(&config, providers), &config);
    let cli = TestClient::new(app);

    // When
    let resp = cli
        .post("/chat-ai/")
        .content_type("application/json")
        .body("{not json")
        .send()
        .await;

    // Expect
    resp.assert_status(StatusCode::BAD_REQUEST);
    resp.assert_json(json!({"error": "Invalid JSON body"})).await;
    Ok(())
}

#[tokio::test]
async fn test_chat_ai_provider_failure_is_500() -> anyhow::Result<()> {
    // Given
    let config = test_config();
    let (mut providers, ..) = stub_providers();
    providers.chat = Arc::new(StubChat::failing("connection refused"));
    let app = init_openapi_route(lazy_app_state(&config, providers), &config);
    let cli = TestClient::new(app);

    // When
    let resp = cli
        .post("/chat-ai/")
        .body_json(&json!({"message": "hi"}))
        .send()
        .await;

    // Expect
    resp.assert_status(StatusCode::INTERNAL_SERVER_ERROR);
    resp.assert_json(json!({"error": "connection refused"})).await;
    Ok(())
}

#[tokio::test]
async fn test_chat_ai_trailing_slash_under_prefix() -> anyhow::Result<()> {
    // Given
    let mut config = test_config();
    config.prefix = Some("/api".to_string());
    let (providers, chat, ..) = stub_providers();
    let app = init_openapi_route(lazy_app_state(&config, providers), &config);
    let cli = TestClient::new(app);

    for path in ["/api/chat-ai/", "/api/chat-ai"] {
        // When
        let resp = cli
            .post(path)
            .body_json(&json!({"message": "hello"}))
            .send()
            .await;

        // Expect
        resp.assert_status_is_ok();
    }
    assert_eq!(chat.calls().len(), 2);
    Ok(())
}
