//! Context aggregator
//!
//! Pulls retrieval passages, the live-activity pulse, persona records, and
//! intent-triggered lookups into one ordered text bundle injected ahead of the
//! user's message. Every source is independently fault-tolerant: a failing
//! source is logged and its section omitted; the request itself never fails
//! here.

use std::sync::Arc;
use tracing::{debug, warn};

use crate::knowledge::KnowledgeSearch;
use crate::records::{self, RecordStore};

const PULSE_LABEL: &str = "[SYSTEM PULSE - RECENT ACTIVITY]";
const USER_CONTEXT_LABEL: &str = "[USER CONTEXT]";
const KNOWLEDGE_LABEL: &str = "[KNOWLEDGE BASE]";
const DATABASE_LABEL: &str = "[DATABASE RESULTS]";

/// Persona tag that unlocks per-user wellness history.
pub const WELLNESS_COACH_TAG: &str = "Wellness Coach";

const WELLNESS_LOG_COUNT: usize = 7;

/// Ordered, labeled context sections. Section order is fixed and significant:
/// later sections sit closer to the user's message and are weighted more
/// heavily by the receiving model. Missing sections are omitted entirely.
#[derive(Debug, Clone, Default)]
pub struct ContextBundle {
    pub pulse: String,
    pub user_context: Option<String>,
    pub retrieval: Option<String>,
    pub database: Option<String>,
}

impl ContextBundle {
    /// Render the bundle for appending to the system prompt:
    /// pulse, then caller context, then retrieval, then database results.
    pub fn render(&self) -> String {
        let mut out = format!("\n\n{}\n{}", PULSE_LABEL, self.pulse);

        if let Some(context) = &self.user_context {
            out.push_str(&format!("\n\n{}\n{}", USER_CONTEXT_LABEL, context));
        }
        if let Some(retrieval) = &self.retrieval {
            out.push_str(&format!("\n\n{}\n{}", KNOWLEDGE_LABEL, retrieval));
        }
        if let Some(database) = &self.database {
            out.push_str(&format!("\n\n{}\n{}", DATABASE_LABEL, database));
        }
        out
    }
}

pub struct ContextAggregator {
    knowledge: Arc<dyn KnowledgeSearch>,
    records: Arc<dyn RecordStore>,
    retrieval_k: usize,
}

impl ContextAggregator {
    pub fn new(
        knowledge: Arc<dyn KnowledgeSearch>,
        records: Arc<dyn RecordStore>,
        retrieval_k: usize,
    ) -> Self {
        Self {
            knowledge,
            records,
            retrieval_k,
        }
    }

    /// Build the bundle for one request. The sub-fetches are independent reads
    /// and run concurrently; assembly waits for all of them, so no downstream
    /// consumer ever sees a partially built bundle.
    pub async fn build(
        &self,
        user_message: &str,
        context_tag: Option<&str>,
        user_id: Option<&str>,
    ) -> ContextBundle {
        let (retrieval, pulse, wellness, lookup) = tokio::join!(
            self.fetch_retrieval(user_message),
            records::recent_activity(self.records.as_ref()),
            self.fetch_wellness_logs(context_tag, user_id),
            self.intent_lookup(user_message),
        );

        let mut database_sections: Vec<String> = Vec::new();
        if let Some(wellness) = wellness {
            database_sections.push(wellness);
        }
        if let Some(lookup) = lookup {
            database_sections.push(lookup);
        }

        ContextBundle {
            pulse,
            user_context: context_tag.map(|t| t.to_string()),
            retrieval,
            database: if database_sections.is_empty() {
                None
            } else {
                Some(database_sections.join("\n\n"))
            },
        }
    }

    /// Semantic passages for the latest user message. Failure omits the
    /// section silently - a best-effort context is fine.
    async fn fetch_retrieval(&self, user_message: &str) -> Option<String> {
        match self.knowledge.search(user_message, self.retrieval_k).await {
            Ok(passages) if !passages.is_empty() => {
                debug!(passages = passages.len(), "Retrieved knowledge passages");
                Some(passages.join("\n---\n"))
            }
            Ok(_) => None,
            Err(e) => {
                warn!("Vector search failed: {}", e);
                None
            }
        }
    }

    /// Wellness-coach persona: the user's recent structured logs, one line per
    /// entry. Absence of records is not an error.
    async fn fetch_wellness_logs(
        &self,
        context_tag: Option<&str>,
        user_id: Option<&str>,
    ) -> Option<String> {
        if context_tag != Some(WELLNESS_COACH_TAG) {
            return None;
        }
        let user_id = user_id?;

        let filter = format!("user='{}'", user_id);
        match self
            .records
            .query("wellness_logs", Some(&filter), WELLNESS_LOG_COUNT)
            .await
        {
            Ok(logs) if !logs.is_empty() => {
                let lines: Vec<String> = logs
                    .iter()
                    .map(|log| {
                        format!(
                            "- Date: {}, Steps: {}, Calories: {}, Sleep: {}m, Mood: {}",
                            log.get("date").and_then(|v| v.as_str()).unwrap_or("?"),
                            log.get("steps").and_then(|v| v.as_u64()).unwrap_or(0),
                            log.get("calories").and_then(|v| v.as_u64()).unwrap_or(0),
                            log.get("sleep_minutes").and_then(|v| v.as_u64()).unwrap_or(0),
                            log.get("mood").and_then(|v| v.as_str()).unwrap_or("unknown"),
                        )
                    })
                    .collect();
                Some(format!(
                    "User Wellness Logs (Last {} Days):\n{}",
                    WELLNESS_LOG_COUNT,
                    lines.join("\n")
                ))
            }
            Ok(_) => None,
            Err(e) => {
                warn!("Error fetching wellness logs: {}", e);
                None
            }
        }
    }

    /// Coarse intent triggers, first match wins: a user search beats a product
    /// listing when a query somehow matches both.
    async fn intent_lookup(&self, user_message: &str) -> Option<String> {
        let query = user_message.to_lowercase();

        if query.contains("search user") || query.contains("find user") {
            let term = query.split("user").nth(1).map(str::trim).unwrap_or("");
            if term.is_empty() {
                return None;
            }
            let filter = format!("name~'{}' || email~'{}'", term, term);
            return match self.records.query("users", Some(&filter), 5).await {
                Ok(users) if !users.is_empty() => Some(format!(
                    "User Search Results:\n{}",
                    format_records(&users)
                )),
                Ok(_) => None,
                Err(e) => {
                    warn!("User search lookup failed: {}", e);
                    None
                }
            };
        }

        if query.contains("list products") {
            return match self.records.query("products", None, 10).await {
                Ok(products) if !products.is_empty() => Some(format!(
                    "Product Listing:\n{}",
                    format_records(&products)
                )),
                Ok(_) => None,
                Err(e) => {
                    warn!("Product listing lookup failed: {}", e);
                    None
                }
            };
        }

        None
    }
}

fn format_records(records: &[serde_json::Value]) -> String {
    records
        .iter()
        .map(|r| format!("- {}", r))
        .collect::<Vec<_>>()
        .join("\n")
}
