//! Dispatch adapter
//!
//! Normalizes the call to whichever provider routing chose, and normalizes the
//! heterogeneous response shapes back to one `Completion` contract. The two
//! wire variants are selected by the handle's `Capability` tag:
//!
//! - `ChatCompletion`: system prompt as the first message, then the full
//!   caller history in order; token usage read from the provider when present.
//! - `GenerativeChat`: system prompt and the final user message concatenated
//!   into one single-turn text block; tokens estimated as `chars / 4` when the
//!   provider reports no usage. That is an approximation, not exact
//!   tokenization.

use thiserror::Error;
use tracing::debug;

use super::{Capability, Message, MessageRole, ProviderHandle};

/// Transport or protocol failure talking to a provider. Never a partial result.
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("provider transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("provider returned status {status}: {detail}")]
    Status { status: u16, detail: String },

    #[error("malformed provider payload: {0}")]
    MalformedPayload(String),

    #[error("provider returned an empty completion")]
    EmptyCompletion,
}

/// Uniform result of one dispatched completion.
#[derive(Debug, Clone)]
pub struct Completion {
    pub text: String,
    pub tokens_in: u64,
    pub tokens_out: u64,
}

/// Rough token estimate for providers without native usage reporting.
/// One token per four characters - an estimate, not exact tokenization.
fn estimate_tokens(text: &str) -> u64 {
    (text.chars().count() / 4) as u64
}

/// Build the wire message list for a chat-completion provider:
/// system prompt first, then the caller history in order.
fn chat_completion_messages(system_prompt: &str, history: &[Message]) -> Vec<Message> {
    let mut messages = Vec::with_capacity(history.len() + 1);
    messages.push(Message::system(system_prompt));
    messages.extend(history.iter().cloned());
    messages
}

/// Build the single-turn exchange for a generative-chat provider:
/// system prompt and final user message concatenated into one block.
fn generative_messages(system_prompt: &str, history: &[Message]) -> Vec<Message> {
    let last_user = history
        .iter()
        .rev()
        .find(|m| m.role == MessageRole::User)
        .map(|m| m.content.as_str())
        .unwrap_or_default();

    vec![Message::user(format!(
        "{}\n\nUser: {}",
        system_prompt, last_user
    ))]
}

/// Issue one completion call against the chosen provider and normalize the
/// result. A transport-level failure yields `DispatchError`; there is no retry.
pub async fn dispatch(
    handle: &ProviderHandle,
    model: &str,
    system_prompt: &str,
    history: &[Message],
) -> Result<Completion, DispatchError> {
    let messages = match handle.capability {
        Capability::ChatCompletion => chat_completion_messages(system_prompt, history),
        Capability::GenerativeChat => generative_messages(system_prompt, history),
    };

    let prompt_chars: usize = messages.iter().map(|m| m.content.chars().count()).sum();
    debug!(
        provider = %handle.id,
        model,
        messages = messages.len(),
        prompt_chars,
        "Dispatching completion"
    );

    let raw = handle.transport.complete(model, messages).await?;

    let (tokens_in, tokens_out) = match raw.usage {
        Some(usage) => (usage.prompt_tokens, usage.completion_tokens),
        None => match handle.capability {
            // Chat-completion providers that stay silent on usage report zero.
            Capability::ChatCompletion => (0, 0),
            // Generative providers fall back to the character estimate.
            Capability::GenerativeChat => (
                (prompt_chars / 4) as u64,
                estimate_tokens(&raw.text),
            ),
        },
    };

    Ok(Completion {
        text: raw.text,
        tokens_in,
        tokens_out,
    })
}
