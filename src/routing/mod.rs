//! Routing engine
//!
//! Classifies an incoming query and picks a (provider, model) pair from the
//! providers that are actually registered. The policy is an explicit ordered
//! rule table rather than scattered conditionals, so it stays independently
//! unit-testable. Routing is pure: deterministic for identical inputs, never
//! errors, and a decision is produced fresh per request - availability is live
//! state, so decisions are never cached.

use tracing::info;

/// Queries matching any of these justify a higher-latency, higher-capability
/// model. Case-insensitive substring match.
const TECHNICAL_TOKENS: &[&str] = &[
    "code",
    "debug",
    "algorithm",
    "error",
    "exception",
    "sql",
    "api",
    "function",
    "bug",
    "stack trace",
];

/// Conversational filler that marks a query as trivial.
const FILLER_TOKENS: &[&str] = &["hello", "hi", "hey", "thanks", "thank you", "ok", "status"];

/// High-capability pairings, in preference order. First available wins.
const SMART_PREFERENCE: &[(&str, &str)] = &[
    ("openai", "gpt-4o"),
    ("openrouter", "anthropic/claude-3.5-sonnet"),
    ("gemini", "gemini-1.5-pro"),
];

/// Low-latency pairings for trivial queries, in preference order.
const FAST_PREFERENCE: &[(&str, &str)] = &[
    ("groq", "llama-3.1-8b-instant"),
    ("ollama", "llama3"),
];

/// The (provider, model) pair chosen for one request, plus the rationale.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteDecision {
    pub provider: String,
    pub model: String,
    pub reason: String,
}

impl RouteDecision {
    /// Sentinel for an empty registry. A valid routed state, not an error.
    pub fn none() -> Self {
        Self {
            provider: "none".into(),
            model: "none".into(),
            reason: "No AI providers configured".into(),
        }
    }

    pub fn is_none(&self) -> bool {
        self.provider == "none"
    }
}

/// Routing policy: thresholds and the default pairing to fall back on.
#[derive(Debug, Clone)]
pub struct RoutingEngine {
    default_provider: String,
    default_model: String,
    short_query_words: usize,
}

impl RoutingEngine {
    pub fn new(
        default_provider: impl Into<String>,
        default_model: impl Into<String>,
        short_query_words: usize,
    ) -> Self {
        Self {
            default_provider: default_provider.into(),
            default_model: default_model.into(),
            short_query_words,
        }
    }

    /// Pick a (provider, model) pair for this query.
    ///
    /// Rule order is fixed: technical beats short/trivial, and only one rule
    /// fires per request. Whatever was selected is then checked against
    /// `available`; an unavailable choice falls back to the first registered
    /// provider with the original choice recorded in the reason.
    pub fn route(&self, query: &str, _context_tag: Option<&str>, available: &[&str]) -> RouteDecision {
        if available.is_empty() {
            return RouteDecision::none();
        }

        let query_lower = query.to_lowercase();

        let mut decision = RouteDecision {
            provider: self.default_provider.clone(),
            model: self.default_model.clone(),
            reason: "Default provider".into(),
        };

        if let Some(token) = Self::matched_token(&query_lower, TECHNICAL_TOKENS) {
            // First available entry wins; when none is available the top
            // preference stands as the nominal choice so the fallback below
            // can record what was wanted.
            let (provider, model) =
                Self::first_available(SMART_PREFERENCE, available).unwrap_or(SMART_PREFERENCE[0]);
            decision = RouteDecision {
                provider: provider.into(),
                model: model.into(),
                reason: format!("Technical query (matched '{}')", token),
            };
        } else if self.is_trivial(&query_lower) {
            let (provider, model) =
                Self::first_available(FAST_PREFERENCE, available).unwrap_or(FAST_PREFERENCE[0]);
            decision = RouteDecision {
                provider: provider.into(),
                model: model.into(),
                reason: "Trivial query, low-latency provider".into(),
            };
        }

        if !available.contains(&decision.provider.as_str()) {
            let fallback = available[0];
            decision = RouteDecision {
                reason: format!(
                    "Provider '{}' unavailable, falling back to '{}'",
                    decision.provider, fallback
                ),
                model: self.model_for(fallback),
                provider: fallback.into(),
            };
        }

        info!(
            provider = %decision.provider,
            model = %decision.model,
            reason = %decision.reason,
            "Routing decision"
        );
        decision
    }

    fn matched_token<'a>(query_lower: &str, tokens: &[&'a str]) -> Option<&'a str> {
        tokens.iter().find(|t| query_lower.contains(*t)).copied()
    }

    fn first_available<'a>(
        preference: &[(&'a str, &'a str)],
        available: &[&str],
    ) -> Option<(&'a str, &'a str)> {
        preference
            .iter()
            .find(|(provider, _)| available.contains(provider))
            .copied()
    }

    /// Model to pair with a provider reached through the availability
    /// fallback. Known providers get their preferred model, anything else the
    /// configured default.
    fn model_for(&self, provider: &str) -> String {
        SMART_PREFERENCE
            .iter()
            .chain(FAST_PREFERENCE.iter())
            .find(|(p, _)| *p == provider)
            .map(|(_, m)| (*m).to_string())
            .unwrap_or_else(|| self.default_model.clone())
    }

    /// Whole-word matching here: substring checks would fire on "history"
    /// containing "hi". Multi-word fillers match as phrases.
    fn is_trivial(&self, query_lower: &str) -> bool {
        if query_lower.split_whitespace().count() < self.short_query_words {
            return true;
        }
        let words: Vec<&str> = query_lower
            .split(|c: char| !c.is_alphanumeric())
            .filter(|w| !w.is_empty())
            .collect();
        FILLER_TOKENS.iter().any(|token| {
            if token.contains(' ') {
                query_lower.contains(token)
            } else {
                words.contains(token)
            }
        })
    }
}
