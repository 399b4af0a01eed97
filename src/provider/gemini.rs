//! Gemini generateContent transport
//!
//! Gemini has no native system-role turn, so the adapter hands this transport a
//! single pre-concatenated user message. Usage metadata is reported by newer
//! API versions only; when absent the adapter falls back to estimation.

use async_trait::async_trait;
use reqwest::Client as HttpClient;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::dispatch::DispatchError;
use super::{ChatTransport, Message, MessageRole, RawCompletion, Usage};

const GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta/models";

pub struct GeminiTransport {
    client: HttpClient,
    api_key: String,
    timeout: Duration,
}

impl GeminiTransport {
    pub fn new(api_key: String, timeout: Duration) -> Self {
        Self {
            client: HttpClient::new(),
            api_key,
            timeout,
        }
    }
}

#[derive(Serialize)]
struct GeminiRequest {
    contents: Vec<GeminiContent>,
}

#[derive(Serialize)]
struct GeminiContent {
    role: &'static str,
    parts: Vec<GeminiPart>,
}

#[derive(Serialize)]
struct GeminiPart {
    text: String,
}

#[derive(Deserialize)]
struct GeminiResponse {
    candidates: Option<Vec<GeminiCandidate>>,
    #[serde(rename = "usageMetadata")]
    usage_metadata: Option<GeminiUsage>,
    error: Option<GeminiError>,
}

#[derive(Deserialize)]
struct GeminiCandidate {
    content: GeminiCandidateContent,
}

#[derive(Deserialize)]
struct GeminiCandidateContent {
    parts: Option<Vec<GeminiCandidatePart>>,
}

#[derive(Deserialize)]
struct GeminiCandidatePart {
    text: Option<String>,
}

#[derive(Deserialize)]
struct GeminiUsage {
    #[serde(rename = "promptTokenCount")]
    prompt_token_count: Option<u64>,
    #[serde(rename = "candidatesTokenCount")]
    candidates_token_count: Option<u64>,
}

#[derive(Deserialize)]
struct GeminiError {
    message: String,
}

#[async_trait]
impl ChatTransport for GeminiTransport {
    async fn complete(
        &self,
        model: &str,
        messages: Vec<Message>,
    ) -> Result<RawCompletion, DispatchError> {
        let contents = messages
            .into_iter()
            .map(|m| GeminiContent {
                role: match m.role {
                    MessageRole::Assistant => "model",
                    _ => "user",
                },
                parts: vec![GeminiPart { text: m.content }],
            })
            .collect();

        let url = format!(
            "{}/{}:generateContent?key={}",
            GEMINI_API_BASE, model, self.api_key
        );

        let response = self
            .client
            .post(&url)
            .json(&GeminiRequest { contents })
            .timeout(self.timeout)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let detail = response.text().await.unwrap_or_default();
            return Err(DispatchError::Status { status, detail });
        }

        let api_response: GeminiResponse = response
            .json()
            .await
            .map_err(|e| DispatchError::MalformedPayload(e.to_string()))?;

        if let Some(error) = api_response.error {
            return Err(DispatchError::MalformedPayload(error.message));
        }

        let text = api_response
            .candidates
            .and_then(|c| c.into_iter().next())
            .and_then(|c| c.content.parts)
            .map(|parts| {
                parts
                    .into_iter()
                    .filter_map(|p| p.text)
                    .collect::<Vec<_>>()
                    .join("")
            })
            .filter(|t| !t.is_empty())
            .ok_or(DispatchError::EmptyCompletion)?;

        let usage = api_response.usage_metadata.map(|u| Usage {
            prompt_tokens: u.prompt_token_count.unwrap_or(0),
            completion_tokens: u.candidates_token_count.unwrap_or(0),
        });

        Ok(RawCompletion { text, usage })
    }
}
