//! Record-store client (PocketBase-style HTTP API)
//!
//! Live, structured platform data: users, products, classes, tickets, alerts,
//! wellness logs, knowledge documents. Everything here is best-effort - the
//! record store going away degrades reads to empty results, never to a
//! request-time error. Authentication is a rarely-invoked setup operation, off
//! the request hot path.

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client as HttpClient;
use serde_json::Value;
use std::path::Path;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::{info, warn};

use crate::config::ConciergeConfig;

/// Structured-data reads the context aggregator depends on.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Query a collection, newest first. Failures degrade to an error the
    /// caller absorbs; implementations must not panic.
    async fn query(&self, collection: &str, filter: Option<&str>, limit: usize)
        -> Result<Vec<Value>>;

    /// Records of the knowledge_docs collection, newest first.
    async fn knowledge_docs(&self) -> Result<Vec<Value>>;

    /// Download a record's attached file to a local destination.
    async fn download_file(
        &self,
        collection_id: &str,
        record_id: &str,
        filename: &str,
        dest: &Path,
    ) -> Result<()>;
}

pub struct PocketBaseClient {
    client: HttpClient,
    base_url: String,
    admin_email: Option<String>,
    admin_password: Option<String>,
    token: RwLock<Option<String>>,
}

impl PocketBaseClient {
    pub fn from_config(config: &ConciergeConfig) -> Self {
        Self {
            client: HttpClient::builder()
                .timeout(Duration::from_secs(config.record_store_timeout))
                .build()
                .unwrap_or_default(),
            base_url: config.pocketbase_url.trim_end_matches('/').to_string(),
            admin_email: config.pocketbase_admin_email.clone(),
            admin_password: config.pocketbase_admin_password.clone(),
            token: RwLock::new(None),
        }
    }

    /// Authenticate as admin to get a bearer token. Idempotent, invoked at
    /// startup only. On any failure the client stays unauthenticated and all
    /// downstream reads degrade to "no data".
    pub async fn authenticate(&self) {
        let (Some(email), Some(password)) = (&self.admin_email, &self.admin_password) else {
            warn!("PocketBase admin credentials not set, data access will be limited");
            return;
        };

        info!(base_url = %self.base_url, "Authenticating with PocketBase");

        // Legacy admin endpoint first; v0.23+ moved admins to _superusers.
        let endpoints = [
            "/api/admins/auth-with-password",
            "/api/collections/_superusers/auth-with-password",
        ];

        for (i, endpoint) in endpoints.iter().enumerate() {
            let response = self
                .client
                .post(format!("{}{}", self.base_url, endpoint))
                .json(&serde_json::json!({
                    "identity": email,
                    "password": password,
                }))
                .send()
                .await;

            match response {
                Ok(resp) if resp.status().is_success() => {
                    match resp.json::<Value>().await {
                        Ok(body) => {
                            if let Some(token) = body.get("token").and_then(|t| t.as_str()) {
                                *self.token.write().await = Some(token.to_string());
                                info!("Successfully authenticated with PocketBase");
                                return;
                            }
                            warn!("PocketBase auth response had no token");
                        }
                        Err(e) => warn!("Failed to parse PocketBase auth response: {}", e),
                    }
                    return;
                }
                Ok(resp) if resp.status().as_u16() == 404 && i == 0 => {
                    // Try the superuser endpoint next
                    continue;
                }
                Ok(resp) => {
                    warn!(status = %resp.status(), "Failed to authenticate with PocketBase");
                    return;
                }
                Err(e) => {
                    warn!("Connection error during PocketBase auth: {}", e);
                    return;
                }
            }
        }
    }

    async fn get(&self, path: &str, params: &[(&str, String)]) -> Result<Value> {
        let mut request = self
            .client
            .get(format!("{}{}", self.base_url, path))
            .query(params);
        if let Some(token) = self.token.read().await.as_deref() {
            request = request.bearer_auth(token);
        }

        let response = request.send().await.context("record store unreachable")?;
        if !response.status().is_success() {
            anyhow::bail!("record store returned status {}", response.status());
        }
        response
            .json::<Value>()
            .await
            .context("failed to parse record store response")
    }
}

#[async_trait]
impl RecordStore for PocketBaseClient {
    async fn query(
        &self,
        collection: &str,
        filter: Option<&str>,
        limit: usize,
    ) -> Result<Vec<Value>> {
        let mut params = vec![
            ("perPage", limit.to_string()),
            ("sort", "-created".to_string()),
        ];
        if let Some(filter) = filter {
            params.push(("filter", filter.to_string()));
        }

        let body = self
            .get(&format!("/api/collections/{}/records", collection), &params)
            .await?;

        Ok(body
            .get("items")
            .and_then(|i| i.as_array())
            .cloned()
            .unwrap_or_default())
    }

    async fn knowledge_docs(&self) -> Result<Vec<Value>> {
        let body = self
            .get(
                "/api/collections/knowledge_docs/records",
                &[("sort", "-created".to_string())],
            )
            .await?;

        Ok(body
            .get("items")
            .and_then(|i| i.as_array())
            .cloned()
            .unwrap_or_default())
    }

    async fn download_file(
        &self,
        collection_id: &str,
        record_id: &str,
        filename: &str,
        dest: &Path,
    ) -> Result<()> {
        let url = format!(
            "{}/api/files/{}/{}/{}",
            self.base_url, collection_id, record_id, filename
        );
        let mut request = self.client.get(&url);
        if let Some(token) = self.token.read().await.as_deref() {
            request = request.bearer_auth(token);
        }

        let response = request.send().await.context("file download failed")?;
        if !response.status().is_success() {
            anyhow::bail!("file download returned status {}", response.status());
        }

        let bytes = response.bytes().await?;
        tokio::fs::write(dest, &bytes)
            .await
            .with_context(|| format!("failed to write {}", dest.display()))?;
        Ok(())
    }
}

/// Field that best names a record of each pulse collection.
fn record_label(record: &Value, field: &str, fallback: &str) -> String {
    record
        .get(field)
        .and_then(|v| v.as_str())
        .unwrap_or(fallback)
        .to_string()
}

/// Aggregate recent activity across the key collections into a human-readable
/// multi-line summary - the "pulse" of the system. Total failure of every
/// collection yields the sentinel string, never an error.
pub async fn recent_activity(store: &dyn RecordStore) -> String {
    let (users, products, classes, tickets, alerts) = tokio::join!(
        store.query("users", None, 3),
        store.query("products", None, 3),
        store.query("classes", None, 3),
        store.query("tickets", Some("status='Open'"), 3),
        store.query("system_alerts", Some("severity='critical'"), 3),
    );

    let mut summary: Vec<String> = Vec::new();

    if let Ok(users) = users {
        if !users.is_empty() {
            let names: Vec<String> = users
                .iter()
                .map(|u| record_label(u, "name", "Unknown"))
                .collect();
            summary.push(format!("Recent Users: {}", names.join(", ")));
        }
    }

    if let Ok(products) = products {
        if !products.is_empty() {
            let items: Vec<String> = products
                .iter()
                .map(|p| record_label(p, "name", "Item"))
                .collect();
            summary.push(format!("New Products: {}", items.join(", ")));
        }
    }

    if let Ok(classes) = classes {
        if !classes.is_empty() {
            let names: Vec<String> = classes
                .iter()
                .map(|c| record_label(c, "name", "Class"))
                .collect();
            summary.push(format!("Active Classes: {}", names.join(", ")));
        }
    }

    if let Ok(tickets) = tickets {
        if !tickets.is_empty() {
            let subjects: Vec<String> = tickets
                .iter()
                .map(|t| record_label(t, "subject", "Issue"))
                .collect();
            summary.push(format!("Open Tickets: {}", subjects.join(", ")));
        }
    }

    if let Ok(alerts) = alerts {
        if !alerts.is_empty() {
            let messages: Vec<String> = alerts
                .iter()
                .map(|a| record_label(a, "message", "Alert"))
                .collect();
            summary.push(format!("CRITICAL ALERTS: {}", messages.join(", ")));
        }
    }

    if summary.is_empty() {
        "No recent activity found.".to_string()
    } else {
        summary.join("\n")
    }
}
