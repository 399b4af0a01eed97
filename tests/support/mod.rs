// tests/support/mod.rs
// Shared fixtures: mock transports/stores and an in-process app

use anyhow::Result;
use async_trait::async_trait;
use axum::Router;
use axum::body::Body;
use axum::http::{Request, Response, StatusCode, header};
use http_body_util::BodyExt;
use serde_json::Value;
use std::path::Path;
use std::sync::Arc;
use tower::ServiceExt;

use concierge::config::ConciergeConfig;
use concierge::knowledge::KnowledgeSearch;
use concierge::provider::dispatch::DispatchError;
use concierge::provider::{
    Capability, ChatTransport, Message, ProviderHandle, RawCompletion, Usage,
};
use concierge::records::RecordStore;
use concierge::registry::ProviderRegistry;
use concierge::state::AppState;

pub struct MockKnowledge {
    pub passages: Vec<String>,
}

#[async_trait]
impl KnowledgeSearch for MockKnowledge {
    async fn search(&self, _query: &str, _k: usize) -> Result<Vec<String>> {
        Ok(self.passages.clone())
    }

    async fn ingest_dir(&self, _path: &Path) -> Result<usize> {
        Ok(0)
    }
}

/// Record store that is down: every read fails and must degrade upstream.
pub struct UnreachableRecords;

#[async_trait]
impl RecordStore for UnreachableRecords {
    async fn query(
        &self,
        _collection: &str,
        _filter: Option<&str>,
        _limit: usize,
    ) -> Result<Vec<Value>> {
        anyhow::bail!("record store unreachable")
    }

    async fn knowledge_docs(&self) -> Result<Vec<Value>> {
        anyhow::bail!("record store unreachable")
    }

    async fn download_file(
        &self,
        _collection_id: &str,
        _record_id: &str,
        _filename: &str,
        _dest: &Path,
    ) -> Result<()> {
        anyhow::bail!("record store unreachable")
    }
}

/// Canned transport; `fail` simulates a transport-level provider outage.
pub struct MockTransport {
    pub reply: String,
    pub usage: Option<Usage>,
    pub fail: bool,
}

impl MockTransport {
    pub fn replying(reply: &str) -> Arc<Self> {
        Arc::new(Self {
            reply: reply.to_string(),
            usage: Some(Usage {
                prompt_tokens: 10,
                completion_tokens: 5,
            }),
            fail: false,
        })
    }

    pub fn failing() -> Arc<Self> {
        Arc::new(Self {
            reply: String::new(),
            usage: None,
            fail: true,
        })
    }
}

#[async_trait]
impl ChatTransport for MockTransport {
    async fn complete(
        &self,
        _model: &str,
        _messages: Vec<Message>,
    ) -> Result<RawCompletion, DispatchError> {
        if self.fail {
            return Err(DispatchError::Status {
                status: 502,
                detail: "bad gateway".into(),
            });
        }
        Ok(RawCompletion {
            text: self.reply.clone(),
            usage: self.usage,
        })
    }
}

pub fn test_config() -> ConciergeConfig {
    ConciergeConfig {
        default_provider: "openai".into(),
        default_model: Some("gpt-4o-mini".into()),
        openai_api_key: None,
        openrouter_api_key: None,
        groq_api_key: None,
        gemini_api_key: None,
        ollama_base_url: None,
        open_webui_base_url: None,
        knowledge_base_url: "http://localhost:8001".into(),
        docs_dir: "./docs".into(),
        retrieval_k: 3,
        pocketbase_url: "http://127.0.0.1:8090".into(),
        pocketbase_admin_email: None,
        pocketbase_admin_password: None,
        record_store_timeout: 5,
        short_query_words: 4,
        host: "127.0.0.1".into(),
        port: 0,
        provider_timeout: 5,
        log_level: "info".into(),
    }
}

pub fn chat_completion_provider(id: &str, transport: Arc<MockTransport>) -> ProviderHandle {
    ProviderHandle::new(id, Capability::ChatCompletion, transport)
}

/// Build the router plus a handle on the state for counter assertions.
pub fn app_with_registry(registry: ProviderRegistry) -> (Router, Arc<AppState>) {
    let state = AppState::assemble(
        &test_config(),
        Arc::new(MockKnowledge { passages: vec![] }),
        Arc::new(UnreachableRecords),
        Arc::new(registry),
    );
    (concierge::api::http::http_router(state.clone()), state)
}

pub async fn post_chat(app: &Router, payload: Value) -> (StatusCode, Value) {
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/chat")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(payload.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();
    split_response(response).await
}

pub async fn get(app: &Router, uri: &str) -> (StatusCode, Value) {
    let response = app
        .clone()
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    split_response(response).await
}

async fn split_response(response: Response<Body>) -> (StatusCode, Value) {
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, body)
}
