//! Knowledge base client and ingestion
//!
//! Semantic retrieval is a core contract: the process refuses to start when
//! the sidecar is unreachable. Search failures at request time are absorbed by
//! the context aggregator instead.

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client as HttpClient;
use serde::Deserialize;
use std::path::Path;
use std::sync::Arc;
use tracing::{error, info, warn};

use crate::records::RecordStore;

/// Semantic search over the document corpus.
#[async_trait]
pub trait KnowledgeSearch: Send + Sync {
    /// Relevant passages for a query, most relevant first.
    async fn search(&self, query: &str, k: usize) -> Result<Vec<String>>;

    /// Ingest every document under a directory; returns the chunk count.
    async fn ingest_dir(&self, path: &Path) -> Result<usize>;
}

/// HTTP client for the retrieval sidecar. Embedding model, chunking, and
/// persistence live on the sidecar's side of the contract.
pub struct KnowledgeBase {
    client: HttpClient,
    base_url: String,
}

#[derive(Deserialize)]
struct SearchResponse {
    results: Vec<String>,
}

#[derive(Deserialize)]
struct IngestResponse {
    chunks: usize,
}

impl KnowledgeBase {
    /// Connect and verify the sidecar is up. Startup must fail if it is not -
    /// retrieval-augmented answers are a core contract, not an enhancement.
    pub async fn connect(base_url: &str) -> Result<Self> {
        let client = HttpClient::new();
        let base_url = base_url.trim_end_matches('/').to_string();

        client
            .get(format!("{}/health", base_url))
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .with_context(|| format!("knowledge base not reachable at {}", base_url))?;

        info!(base_url = %base_url, "Knowledge base connected");
        Ok(Self { client, base_url })
    }
}

#[async_trait]
impl KnowledgeSearch for KnowledgeBase {
    async fn search(&self, query: &str, k: usize) -> Result<Vec<String>> {
        let response = self
            .client
            .post(format!("{}/search", self.base_url))
            .json(&serde_json::json!({ "query": query, "k": k }))
            .send()
            .await
            .context("knowledge base search failed")?
            .error_for_status()
            .context("knowledge base search returned an error status")?
            .json::<SearchResponse>()
            .await
            .context("failed to parse knowledge base search response")?;

        Ok(response.results)
    }

    async fn ingest_dir(&self, path: &Path) -> Result<usize> {
        let response = self
            .client
            .post(format!("{}/ingest", self.base_url))
            .json(&serde_json::json!({ "path": path.to_string_lossy() }))
            .send()
            .await
            .context("knowledge base ingest failed")?
            .error_for_status()
            .context("knowledge base ingest returned an error status")?
            .json::<IngestResponse>()
            .await
            .context("failed to parse knowledge base ingest response")?;

        Ok(response.chunks)
    }
}

/// Full knowledge refresh: re-ingest the local docs directory, then pull every
/// knowledge document out of the record store and ingest the downloads.
///
/// Fire-and-forget - the triggering endpoint's contract is "accepted", not
/// "completed". All failures are logged, none propagate.
pub async fn refresh_knowledge(
    kb: Arc<dyn KnowledgeSearch>,
    records: Arc<dyn RecordStore>,
    docs_dir: String,
) {
    info!("Starting knowledge refresh");

    let docs_path = Path::new(&docs_dir);
    if docs_path.exists() {
        match kb.ingest_dir(docs_path).await {
            Ok(count) => info!(chunks = count, "Local docs ingested"),
            Err(e) => error!("Error ingesting local docs: {}", e),
        }
    }

    let docs = match records.knowledge_docs().await {
        Ok(docs) => docs,
        Err(e) => {
            warn!("Could not fetch knowledge docs from record store: {}", e);
            return;
        }
    };

    let temp_dir =
        std::env::temp_dir().join(format!("concierge-docs-{}", uuid::Uuid::new_v4()));
    if let Err(e) = tokio::fs::create_dir_all(&temp_dir).await {
        error!("Could not create temp dir for knowledge refresh: {}", e);
        return;
    }

    let mut downloaded = 0usize;
    for record in &docs {
        let (Some(filename), Some(collection_id), Some(record_id)) = (
            record.get("file").and_then(|v| v.as_str()),
            record.get("collectionId").and_then(|v| v.as_str()),
            record.get("id").and_then(|v| v.as_str()),
        ) else {
            continue;
        };

        // Record data is remote input; a separator-bearing name must not
        // escape the temp dir.
        if !is_safe_filename(filename) {
            warn!(filename, "Skipping knowledge doc with unsafe file name");
            continue;
        }

        let dest = temp_dir.join(filename);
        match records
            .download_file(collection_id, record_id, filename, &dest)
            .await
        {
            Ok(()) => downloaded += 1,
            Err(e) => warn!(filename, "Failed to download knowledge doc: {}", e),
        }
    }

    if downloaded > 0 {
        info!(downloaded, "Downloaded documents from record store");
        if let Err(e) = kb.ingest_dir(&temp_dir).await {
            error!("Error ingesting downloaded docs: {}", e);
        }
    }

    if let Err(e) = tokio::fs::remove_dir_all(&temp_dir).await {
        warn!("Could not clean up temp docs dir: {}", e);
    }

    info!("Knowledge refresh complete");
}

/// A downloadable name is a single path component: no separators, no parent
/// traversal, not empty.
fn is_safe_filename(name: &str) -> bool {
    !name.is_empty() && !name.contains(['/', '\\']) && name != "." && name != ".."
}
