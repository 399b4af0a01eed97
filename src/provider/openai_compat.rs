//! Chat Completions transport for OpenAI-compatible backends
//!
//! One client covers OpenAI, OpenRouter, Groq, Ollama, and Open WebUI - they
//! all speak the same `/chat/completions` contract, differing only in base URL
//! and whether a bearer token is required.

use async_trait::async_trait;
use reqwest::Client as HttpClient;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::dispatch::DispatchError;
use super::{ChatTransport, Message, RawCompletion, Usage};

pub struct OpenAiCompatTransport {
    client: HttpClient,
    base_url: String,
    api_key: Option<String>,
    timeout: Duration,
}

impl OpenAiCompatTransport {
    pub fn new(base_url: impl Into<String>, api_key: Option<String>, timeout: Duration) -> Self {
        Self {
            client: HttpClient::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key,
            timeout,
        }
    }
}

#[derive(Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: Vec<WireMessage>,
}

#[derive(Serialize)]
struct WireMessage {
    role: &'static str,
    content: String,
}

#[derive(Deserialize)]
struct CompletionResponse {
    choices: Vec<Choice>,
    usage: Option<WireUsage>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

#[derive(Deserialize)]
struct WireUsage {
    prompt_tokens: Option<u64>,
    completion_tokens: Option<u64>,
}

#[async_trait]
impl ChatTransport for OpenAiCompatTransport {
    async fn complete(
        &self,
        model: &str,
        messages: Vec<Message>,
    ) -> Result<RawCompletion, DispatchError> {
        let url = format!("{}/chat/completions", self.base_url);
        let body = CompletionRequest {
            model,
            messages: messages
                .into_iter()
                .map(|m| WireMessage {
                    role: m.role.as_str(),
                    content: m.content,
                })
                .collect(),
        };

        let mut request = self.client.post(&url).json(&body).timeout(self.timeout);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request.send().await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let detail = response.text().await.unwrap_or_default();
            return Err(DispatchError::Status { status, detail });
        }

        let completion: CompletionResponse = response
            .json()
            .await
            .map_err(|e| DispatchError::MalformedPayload(e.to_string()))?;

        let text = completion
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or(DispatchError::EmptyCompletion)?;

        let usage = completion.usage.map(|u| Usage {
            prompt_tokens: u.prompt_tokens.unwrap_or(0),
            completion_tokens: u.completion_tokens.unwrap_or(0),
        });

        Ok(RawCompletion { text, usage })
    }
}
