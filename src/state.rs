// src/state.rs
// Shared application state assembled once at startup

use std::sync::Arc;

use crate::config::ConciergeConfig;
use crate::context::ContextAggregator;
use crate::knowledge::KnowledgeSearch;
use crate::orchestrator::RequestOrchestrator;
use crate::records::RecordStore;
use crate::registry::ProviderRegistry;
use crate::routing::RoutingEngine;
use crate::stats::StatsTracker;

/// Model used when the environment supplies neither AI_MODEL nor a routed pairing.
const DEFAULT_MODEL: &str = "gpt-4o-mini";

pub struct AppState {
    pub orchestrator: RequestOrchestrator,
    pub stats: Arc<StatsTracker>,
    pub knowledge: Arc<dyn KnowledgeSearch>,
    pub records: Arc<dyn RecordStore>,
    pub default_provider: String,
    pub docs_dir: String,
}

impl AppState {
    /// Wire the per-request pipeline from its collaborators. The registry and
    /// stats are shared with the orchestrator; knowledge and record-store
    /// handles are also kept for the background refresh task.
    pub fn assemble(
        config: &ConciergeConfig,
        knowledge: Arc<dyn KnowledgeSearch>,
        records: Arc<dyn RecordStore>,
        registry: Arc<ProviderRegistry>,
    ) -> Arc<Self> {
        let stats = Arc::new(StatsTracker::new());

        let aggregator =
            ContextAggregator::new(knowledge.clone(), records.clone(), config.retrieval_k);

        let router = RoutingEngine::new(
            config.default_provider.clone(),
            config
                .default_model
                .clone()
                .unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            config.short_query_words,
        );

        let orchestrator = RequestOrchestrator::new(
            aggregator,
            router,
            registry,
            stats.clone(),
            config.default_provider.clone(),
        );

        Arc::new(Self {
            orchestrator,
            stats,
            knowledge,
            records,
            default_provider: config.default_provider.clone(),
            docs_dir: config.docs_dir.clone(),
        })
    }
}
