// tests/chat_api.rs
// In-process HTTP tests for the /chat surface and its siblings

mod support;

use axum::http::StatusCode;
use serde_json::json;

use concierge::registry::ProviderRegistry;
use support::*;

#[tokio::test]
async fn chat_succeeds_with_a_configured_provider() {
    let mut registry = ProviderRegistry::new();
    registry.register(chat_completion_provider(
        "openai",
        MockTransport::replying("Here to help."),
    ));
    let (app, state) = app_with_registry(registry);

    let (status, body) = post_chat(
        &app,
        json!({
            "messages": [{"role": "user", "content": "tell me about the platform features please"}]
        }),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["response"], "Here to help.");
    assert_eq!(body["provider"], "openai (gpt-4o-mini)");
    assert_eq!(body["usage"]["total_tokens"], 15);

    let snap = state.stats.snapshot();
    assert_eq!(snap.request_count, 1);
    assert_eq!(snap.error_count, 0);
    assert_eq!(snap.tokens_in, 10);
    assert_eq!(snap.tokens_out, 5);
}

#[tokio::test]
async fn chat_survives_knowledge_and_records_being_empty_or_down() {
    // MockKnowledge returns zero passages and the record store is unreachable:
    // the bundle degrades to the pulse sentinel and the request still succeeds.
    let mut registry = ProviderRegistry::new();
    registry.register(chat_completion_provider(
        "openai",
        MockTransport::replying("degraded but fine"),
    ));
    let (app, _state) = app_with_registry(registry);

    let (status, body) = post_chat(
        &app,
        json!({
            "messages": [{"role": "user", "content": "summarize the recent platform activity for me"}]
        }),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["response"], "degraded but fine");
}

#[tokio::test]
async fn dispatch_failure_returns_500_with_detail() {
    let mut registry = ProviderRegistry::new();
    registry.register(chat_completion_provider("openai", MockTransport::failing()));
    let (app, state) = app_with_registry(registry);

    let (status, body) = post_chat(
        &app,
        json!({
            "messages": [{"role": "user", "content": "tell me about the platform features please"}]
        }),
    )
    .await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(
        body["detail"].as_str().unwrap().contains("502"),
        "detail was: {}",
        body["detail"]
    );

    let snap = state.stats.snapshot();
    assert_eq!(snap.request_count, 1);
    assert_eq!(snap.error_count, 1);
}

#[tokio::test]
async fn empty_messages_are_rejected() {
    let (app, state) = app_with_registry(ProviderRegistry::new());

    let (status, _body) = post_chat(&app, json!({ "messages": [] })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // Validation failures never reach the orchestrator, so no request is counted.
    assert_eq!(state.stats.snapshot().request_count, 0);
}

#[tokio::test]
async fn status_intercept_short_circuits_the_pipeline() {
    // No providers registered, yet the intercept still answers with 200
    // and does not take the offline path.
    let (app, state) = app_with_registry(ProviderRegistry::new());

    let (status, body) = post_chat(
        &app,
        json!({ "messages": [{"role": "user", "content": "what is the system status?"}] }),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert!(body["response"].as_str().unwrap().contains("operational"));
    assert_eq!(body["usage"]["total_tokens"], 0);
    assert_eq!(body["provider"], "openai");

    let snap = state.stats.snapshot();
    assert_eq!(snap.request_count, 1);
    assert_eq!(snap.error_count, 0);
}

#[tokio::test]
async fn help_intercept_returns_capability_list() {
    let (app, _state) = app_with_registry(ProviderRegistry::new());

    let (status, body) = post_chat(
        &app,
        json!({ "messages": [{"role": "user", "content": "help"}] }),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert!(body["response"].as_str().unwrap().contains("Concierge AI"));
    assert_eq!(body["usage"]["total_tokens"], 0);
}

#[tokio::test]
async fn root_reports_liveness() {
    let (app, _state) = app_with_registry(ProviderRegistry::new());

    let (status, body) = get(&app, "/").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "online");
    assert_eq!(body["service"], "Concierge AI");
    assert_eq!(body["provider"], "openai");
    assert!(body["uptime"].as_str().unwrap().contains('h'));
    // Exactly the four contract fields, nothing extra.
    assert_eq!(body.as_object().unwrap().len(), 4);
}

#[tokio::test]
async fn stats_reflect_traffic() {
    let mut registry = ProviderRegistry::new();
    registry.register(chat_completion_provider(
        "openai",
        MockTransport::replying("ok then"),
    ));
    let (app, _state) = app_with_registry(registry);

    for _ in 0..4 {
        post_chat(
            &app,
            json!({ "messages": [{"role": "user", "content": "tell me about the platform features please"}] }),
        )
        .await;
    }

    let (status, body) = get(&app, "/stats").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["load"], "4 reqs");
    assert_eq!(body["error_rate"], "0.00%");
    assert_eq!(body["tokens_input"], "40");
    assert_eq!(body["tokens_output"], "20");
    assert_eq!(body["tokens_total"], "60");
    assert_eq!(body["latency"], "24ms");
}

#[tokio::test]
async fn refresh_knowledge_returns_immediately() {
    let (app, _state) = app_with_registry(ProviderRegistry::new());

    let response = {
        use axum::body::Body;
        use axum::http::Request;
        use tower::ServiceExt;
        app.clone()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/refresh-knowledge")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap()
    };

    assert_eq!(response.status(), StatusCode::OK);
    let bytes = {
        use http_body_util::BodyExt;
        response.into_body().collect().await.unwrap().to_bytes()
    };
    let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["status"], "Knowledge refresh started");
}

#[tokio::test]
async fn concurrent_requests_lose_no_counter_updates() {
    let mut registry = ProviderRegistry::new();
    registry.register(chat_completion_provider(
        "openai",
        MockTransport::replying("fast reply"),
    ));
    let (app, state) = app_with_registry(registry);

    let mut handles = Vec::new();
    for _ in 0..50 {
        let app = app.clone();
        handles.push(tokio::spawn(async move {
            post_chat(
                &app,
                json!({ "messages": [{"role": "user", "content": "tell me about the platform features please"}] }),
            )
            .await
        }));
    }
    for handle in handles {
        let (status, _) = handle.await.unwrap();
        assert_eq!(status, StatusCode::OK);
    }

    assert_eq!(state.stats.snapshot().request_count, 50);
}
