// src/registry/mod.rs
// Provider registry: which backends were configured at startup

use std::sync::Arc;
use tracing::info;

use crate::config::ConciergeConfig;
use crate::provider::{Capability, GeminiTransport, OpenAiCompatTransport, ProviderHandle};

const OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
const OPENROUTER_BASE_URL: &str = "https://openrouter.ai/api/v1";
const GROQ_BASE_URL: &str = "https://api.groq.com/openai/v1";

/// Configured provider handles in registration order.
///
/// Built once at startup and read-only afterwards - availability reflects
/// configuration, never a live reachability probe. Reachability failures
/// surface at call time through the dispatch adapter.
pub struct ProviderRegistry {
    handles: Vec<ProviderHandle>,
}

impl ProviderRegistry {
    pub fn new() -> Self {
        Self {
            handles: Vec::new(),
        }
    }

    /// Build the registry from configuration. A provider with no credential is
    /// simply never registered - that is a configuration gap, not an error.
    ///
    /// Registration order is fixed and significant: when a routed choice is
    /// unavailable the orchestrator falls back to the first registered entry.
    pub fn from_config(config: &ConciergeConfig) -> Self {
        let timeout = config.provider_timeout_secs();
        let mut registry = Self::new();

        if let Some(key) = &config.openai_api_key {
            registry.register(ProviderHandle::new(
                "openai",
                Capability::ChatCompletion,
                Arc::new(OpenAiCompatTransport::new(
                    OPENAI_BASE_URL,
                    Some(key.clone()),
                    timeout,
                )),
            ));
        }

        if let Some(key) = &config.openrouter_api_key {
            registry.register(ProviderHandle::new(
                "openrouter",
                Capability::ChatCompletion,
                Arc::new(OpenAiCompatTransport::new(
                    OPENROUTER_BASE_URL,
                    Some(key.clone()),
                    timeout,
                )),
            ));
        }

        if let Some(key) = &config.groq_api_key {
            registry.register(ProviderHandle::new(
                "groq",
                Capability::ChatCompletion,
                Arc::new(OpenAiCompatTransport::new(
                    GROQ_BASE_URL,
                    Some(key.clone()),
                    timeout,
                )),
            ));
        }

        if let Some(key) = &config.gemini_api_key {
            registry.register(ProviderHandle::new(
                "gemini",
                Capability::GenerativeChat,
                Arc::new(GeminiTransport::new(key.clone(), timeout)),
            ));
        }

        // Local servers carry no credential; an explicitly set base URL plays
        // the same role, and its absence means the provider is not registered.
        if let Some(base_url) = &config.ollama_base_url {
            registry.register(ProviderHandle::new(
                "ollama",
                Capability::ChatCompletion,
                Arc::new(OpenAiCompatTransport::new(base_url.clone(), None, timeout)),
            ));
        }

        if let Some(base_url) = &config.open_webui_base_url {
            registry.register(ProviderHandle::new(
                "open_webui",
                Capability::ChatCompletion,
                Arc::new(OpenAiCompatTransport::new(base_url.clone(), None, timeout)),
            ));
        }

        info!(
            providers = ?registry.available(),
            "Provider registry initialized"
        );
        registry
    }

    pub fn register(&mut self, handle: ProviderHandle) {
        self.handles.push(handle);
    }

    /// Registered provider ids, in registration order.
    pub fn available(&self) -> Vec<&str> {
        self.handles.iter().map(|h| h.id.as_str()).collect()
    }

    pub fn get(&self, id: &str) -> Option<&ProviderHandle> {
        self.handles.iter().find(|h| h.id == id)
    }

    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }
}

impl Default for ProviderRegistry {
    fn default() -> Self {
        Self::new()
    }
}
