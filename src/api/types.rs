// src/api/types.rs
// Wire types for the /chat surface

use serde::{Deserialize, Serialize};

use crate::provider::Message;

/// Inbound chat request. The last message is the one being answered.
#[derive(Debug, Clone, Deserialize)]
pub struct ChatRequest {
    pub messages: Vec<Message>,
    /// Caller-supplied free-text context tag (e.g. a persona name).
    #[serde(default)]
    pub context: Option<String>,
    /// Overrides the routed model, never the provider.
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default, rename = "userId")]
    pub user_id: Option<String>,
}

/// Uniform response contract, whichever backend answered.
#[derive(Debug, Clone, Serialize)]
pub struct ChatResponse {
    pub response: String,
    pub usage: UsagePayload,
    pub provider: String,
}

/// Token usage as reported to the caller. Paths that consume no provider
/// tokens report `{"total_tokens": 0}`.
#[derive(Debug, Clone, Serialize)]
pub struct UsagePayload {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prompt_tokens: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completion_tokens: Option<u64>,
    pub total_tokens: u64,
}

impl UsagePayload {
    pub fn zero() -> Self {
        Self {
            prompt_tokens: None,
            completion_tokens: None,
            total_tokens: 0,
        }
    }

    pub fn from_tokens(tokens_in: u64, tokens_out: u64) -> Self {
        Self {
            prompt_tokens: Some(tokens_in),
            completion_tokens: Some(tokens_out),
            total_tokens: tokens_in + tokens_out,
        }
    }
}
