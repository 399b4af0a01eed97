//! Provider abstraction for heterogeneous inference backends
//!
//! Every backend - OpenAI-compatible chat-completion APIs, local model servers,
//! Gemini's generateContent API - is reached through one `ChatTransport`
//! operation. Protocol differences are a closed set of `Capability` variants
//! carried on the registered handle, never runtime type inspection.

mod gemini;
mod openai_compat;

pub mod dispatch;

pub use gemini::GeminiTransport;
pub use openai_compat::OpenAiCompatTransport;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use dispatch::DispatchError;

/// Wire protocol a provider speaks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capability {
    /// Chat-completions style: system role turn + full message history.
    ChatCompletion,
    /// Single-turn generative exchange, no native system role.
    GenerativeChat,
}

/// Message roles accepted on the `/chat` surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    System,
    User,
    Assistant,
}

impl MessageRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageRole::System => "system",
            MessageRole::User => "user",
            MessageRole::Assistant => "assistant",
        }
    }
}

/// One conversation turn. Immutable once constructed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub role: MessageRole,
    pub content: String,
}

impl Message {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::User,
            content: content.into(),
        }
    }
}

/// Token usage as reported by a provider, when it reports any.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct Usage {
    pub prompt_tokens: u64,
    pub completion_tokens: u64,
}

/// Raw result of one completion call, before usage normalization.
#[derive(Debug, Clone)]
pub struct RawCompletion {
    pub text: String,
    pub usage: Option<Usage>,
}

/// Single operation every backend exposes, regardless of vendor protocol.
#[async_trait]
pub trait ChatTransport: Send + Sync {
    async fn complete(
        &self,
        model: &str,
        messages: Vec<Message>,
    ) -> Result<RawCompletion, DispatchError>;
}

/// A configured provider: identifier, wire capability, and its transport.
///
/// Owned exclusively by the registry; routing only ever reads identifiers.
#[derive(Clone)]
pub struct ProviderHandle {
    pub id: String,
    pub capability: Capability,
    pub transport: Arc<dyn ChatTransport>,
}

impl ProviderHandle {
    pub fn new(
        id: impl Into<String>,
        capability: Capability,
        transport: Arc<dyn ChatTransport>,
    ) -> Self {
        Self {
            id: id.into(),
            capability,
            transport,
        }
    }
}

impl std::fmt::Debug for ProviderHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderHandle")
            .field("id", &self.id)
            .field("capability", &self.capability)
            .finish()
    }
}
