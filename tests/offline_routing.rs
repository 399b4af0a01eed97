// tests/offline_routing.rs
// End-to-end scenarios for offline mode and provider selection

mod support;

use axum::http::StatusCode;
use serde_json::json;

use concierge::registry::ProviderRegistry;
use support::*;

#[tokio::test]
async fn hello_with_no_providers_answers_offline_with_200() {
    let (app, state) = app_with_registry(ProviderRegistry::new());

    let (status, body) = post_chat(
        &app,
        json!({ "messages": [{"role": "user", "content": "hello"}] }),
    )
    .await;

    assert_eq!(status, StatusCode::OK, "offline mode is never a 500");
    assert_eq!(body["provider"], "offline");
    assert!(body["response"].as_str().unwrap().contains("offline mode"));
    assert_eq!(body["usage"]["total_tokens"], 0);

    let snap = state.stats.snapshot();
    assert_eq!(snap.request_count, 1);
    assert_eq!(snap.error_count, 1, "availability gap counts as one error");
}

#[tokio::test]
async fn technical_query_selects_the_smart_provider() {
    // Both a fast and a smart provider registered; the technical token must
    // win regardless of message length.
    let mut registry = ProviderRegistry::new();
    registry.register(chat_completion_provider(
        "groq",
        MockTransport::replying("fast answer"),
    ));
    registry.register(chat_completion_provider(
        "openai",
        MockTransport::replying("thorough answer"),
    ));
    let (app, _state) = app_with_registry(registry);

    let (status, body) = post_chat(
        &app,
        json!({ "messages": [{"role": "user", "content": "fix this bug: NullPointerException"}] }),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["provider"], "openai (gpt-4o)");
    assert_eq!(body["response"], "thorough answer");
}

#[tokio::test]
async fn trivial_query_selects_the_fast_provider() {
    let mut registry = ProviderRegistry::new();
    registry.register(chat_completion_provider(
        "openai",
        MockTransport::replying("thorough answer"),
    ));
    registry.register(chat_completion_provider(
        "groq",
        MockTransport::replying("fast answer"),
    ));
    let (app, _state) = app_with_registry(registry);

    let (status, body) = post_chat(
        &app,
        json!({ "messages": [{"role": "user", "content": "hi"}] }),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["provider"], "groq (llama-3.1-8b-instant)");
    assert_eq!(body["response"], "fast answer");
}

#[tokio::test]
async fn trivial_query_falls_back_when_no_fast_provider_exists() {
    // "hi" wants a low-latency provider, but only the smart one is registered:
    // the first available provider answers instead of an offline fallback.
    let mut registry = ProviderRegistry::new();
    registry.register(chat_completion_provider(
        "openai",
        MockTransport::replying("smart provider answering anyway"),
    ));
    let (app, state) = app_with_registry(registry);

    let (status, body) = post_chat(
        &app,
        json!({ "messages": [{"role": "user", "content": "hi"}] }),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert!(body["provider"].as_str().unwrap().starts_with("openai"));
    assert_eq!(state.stats.snapshot().error_count, 0);
}

#[tokio::test]
async fn model_override_replaces_the_routed_model_only() {
    let mut registry = ProviderRegistry::new();
    registry.register(chat_completion_provider(
        "openai",
        MockTransport::replying("override respected"),
    ));
    let (app, _state) = app_with_registry(registry);

    let (status, body) = post_chat(
        &app,
        json!({
            "messages": [{"role": "user", "content": "tell me about the platform features please"}],
            "model": "gpt-4-turbo"
        }),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["provider"], "openai (gpt-4-turbo)");
}
