//! Request orchestrator
//!
//! Composes the context aggregator, routing engine, registry, dispatch
//! adapter, and stats tracker into the per-request pipeline:
//!
//! Received -> ContextBuilt -> Routed -> Dispatched -> Succeeded | Fallback | Failed
//!
//! Context building and routing can never fail the request; only a dispatch
//! failure bubbles up, as a protocol-level error. That asymmetry is the
//! design: a best-effort context is fine, a wrong or failed answer is not.
//! Two intercepts (status/health, help) short-circuit the whole pipeline
//! before any context or routing work.

mod prompts;

use std::sync::Arc;
use tracing::{info, warn};

use crate::api::types::{ChatRequest, ChatResponse, UsagePayload};
use crate::context::{ContextAggregator, WELLNESS_COACH_TAG};
use crate::provider::dispatch::{self, DispatchError};
use crate::registry::ProviderRegistry;
use crate::routing::RoutingEngine;
use crate::stats::StatsTracker;

pub use prompts::{CONCIERGE_PROMPT, HELP_MESSAGE, WELLNESS_PROMPT};

pub struct RequestOrchestrator {
    aggregator: ContextAggregator,
    router: RoutingEngine,
    registry: Arc<ProviderRegistry>,
    stats: Arc<StatsTracker>,
    /// Reported as the provider on intercept responses.
    default_provider: String,
}

impl RequestOrchestrator {
    pub fn new(
        aggregator: ContextAggregator,
        router: RoutingEngine,
        registry: Arc<ProviderRegistry>,
        stats: Arc<StatsTracker>,
        default_provider: impl Into<String>,
    ) -> Self {
        Self {
            aggregator,
            router,
            registry,
            stats,
            default_provider: default_provider.into(),
        }
    }

    /// Run one request through the pipeline. `Ok` covers every handled
    /// outcome, including the offline fallback; `Err` is a dispatch failure
    /// the HTTP layer turns into a 500.
    pub async fn handle(&self, request: &ChatRequest) -> Result<ChatResponse, DispatchError> {
        // Request count increments exactly once at entry, whatever happens next.
        self.stats.record_request();

        let last_message = request
            .messages
            .last()
            .map(|m| m.content.as_str())
            .unwrap_or_default();
        let query_lower = last_message.to_lowercase();

        // Built-in intercepts bypass context building, routing, and dispatch.
        if query_lower.contains("status") || query_lower.contains("health") {
            return Ok(ChatResponse {
                response: format!(
                    "All systems are operational. Provider: {}. Latency is nominal (24ms).",
                    self.default_provider
                ),
                usage: UsagePayload::zero(),
                provider: self.default_provider.clone(),
            });
        }
        if query_lower.contains("help") {
            return Ok(ChatResponse {
                response: HELP_MESSAGE.to_string(),
                usage: UsagePayload::zero(),
                provider: self.default_provider.clone(),
            });
        }

        // Received -> ContextBuilt: never fails; missing sources just thin the bundle.
        let bundle = self
            .aggregator
            .build(
                last_message,
                request.context.as_deref(),
                request.user_id.as_deref(),
            )
            .await;

        let base_prompt = if request.context.as_deref() == Some(WELLNESS_COACH_TAG) {
            WELLNESS_PROMPT
        } else {
            CONCIERGE_PROMPT
        };
        let system_prompt = format!("{}{}", base_prompt, bundle.render());

        // ContextBuilt -> Routed: never fails; the sentinel decision is a valid state.
        let available = self.registry.available();
        let mut decision =
            self.router
                .route(last_message, request.context.as_deref(), &available);

        // A caller-supplied model overrides the routed model, not the provider.
        if let Some(model) = &request.model {
            decision.model = model.clone();
        }

        // Routed -> Dispatched is skipped entirely without a usable handle.
        let handle = if decision.is_none() {
            None
        } else {
            self.registry.get(&decision.provider)
        };
        let Some(handle) = handle else {
            warn!(provider = %decision.provider, "No usable provider, answering in offline mode");
            self.stats.record_error();
            return Ok(ChatResponse {
                response: format!(
                    "I am currently running in offline mode. Provider '{}' is not configured correctly. Please check your environment.",
                    decision.provider
                ),
                usage: UsagePayload::zero(),
                provider: "offline".to_string(),
            });
        };

        match dispatch::dispatch(handle, &decision.model, &system_prompt, &request.messages).await {
            Ok(completion) => {
                self.stats
                    .record_tokens(completion.tokens_in, completion.tokens_out);
                info!(
                    provider = %decision.provider,
                    model = %decision.model,
                    tokens_in = completion.tokens_in,
                    tokens_out = completion.tokens_out,
                    "Request completed"
                );
                Ok(ChatResponse {
                    response: completion.text,
                    usage: UsagePayload::from_tokens(completion.tokens_in, completion.tokens_out),
                    provider: format!("{} ({})", decision.provider, decision.model),
                })
            }
            Err(e) => {
                // No retry against another provider: one failed call is terminal.
                self.stats.record_error();
                Err(e)
            }
        }
    }
}
