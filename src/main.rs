// src/main.rs

use std::path::Path;
use std::sync::Arc;
use tracing::{Level, error, info, warn};
use tracing_subscriber::FmtSubscriber;

use concierge::config::CONFIG;
use concierge::knowledge::{KnowledgeBase, KnowledgeSearch};
use concierge::records::{PocketBaseClient, RecordStore};
use concierge::registry::ProviderRegistry;
use concierge::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    let subscriber = FmtSubscriber::builder()
        .with_max_level(CONFIG.log_level.parse().unwrap_or(Level::INFO))
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    info!("Starting Concierge AI Service");
    info!("Default provider: {}", CONFIG.default_provider);

    // Knowledge base is a core contract: refuse to start without it.
    let knowledge: Arc<dyn KnowledgeSearch> = Arc::new(
        KnowledgeBase::connect(&CONFIG.knowledge_base_url)
            .await
            .map_err(|e| {
                error!("CRITICAL: knowledge base initialization failed: {}", e);
                e
            })?,
    );

    // Record-store auth is best-effort setup; reads degrade to empty on failure.
    let pocketbase = PocketBaseClient::from_config(&CONFIG);
    pocketbase.authenticate().await;
    let records: Arc<dyn RecordStore> = Arc::new(pocketbase);

    let registry = Arc::new(ProviderRegistry::from_config(&CONFIG));
    if registry.is_empty() {
        warn!("No AI providers configured - chat will answer in offline mode");
    }

    let app_state = AppState::assemble(&CONFIG, knowledge.clone(), records.clone(), registry);

    // Startup ingestion of the local docs directory, in the background.
    let docs_dir = CONFIG.docs_dir.clone();
    if Path::new(&docs_dir).exists() {
        let kb = knowledge.clone();
        tokio::spawn(async move {
            info!(docs_dir = %docs_dir, "Background ingestion started");
            match kb.ingest_dir(Path::new(&docs_dir)).await {
                Ok(count) => info!(chunks = count, "Startup ingestion complete"),
                Err(e) => error!("Error during startup ingestion: {}", e),
            }
        });
    }

    let app = concierge::api::http::http_router(app_state);

    let bind_address = CONFIG.bind_address();
    let listener = tokio::net::TcpListener::bind(&bind_address).await?;
    info!("Concierge AI listening on http://{}", bind_address);

    axum::serve(listener, app).await?;

    Ok(())
}
