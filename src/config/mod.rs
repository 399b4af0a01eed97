// src/config/mod.rs
// All values load from the environment (.env supported), no hardcoded state elsewhere

use once_cell::sync::Lazy;
use std::str::FromStr;

#[derive(Debug, Clone)]
pub struct ConciergeConfig {
    // ── Provider Defaults
    pub default_provider: String,
    pub default_model: Option<String>,

    // ── Provider Credentials (absent = provider never registered)
    pub openai_api_key: Option<String>,
    pub openrouter_api_key: Option<String>,
    pub groq_api_key: Option<String>,
    pub gemini_api_key: Option<String>,

    // ── Local Model Servers (unset = not registered, like a missing credential)
    pub ollama_base_url: Option<String>,
    pub open_webui_base_url: Option<String>,

    // ── Knowledge Base (retrieval sidecar)
    pub knowledge_base_url: String,
    pub docs_dir: String,
    pub retrieval_k: usize,

    // ── Record Store (PocketBase)
    pub pocketbase_url: String,
    pub pocketbase_admin_email: Option<String>,
    pub pocketbase_admin_password: Option<String>,
    pub record_store_timeout: u64,

    // ── Routing
    pub short_query_words: usize,

    // ── Server
    pub host: String,
    pub port: u16,

    // ── Timeouts (in seconds)
    pub provider_timeout: u64,

    // ── Logging
    pub log_level: String,
}

fn env_var_or<T>(key: &str, default: T) -> T
where
    T: FromStr,
{
    match std::env::var(key) {
        Ok(val) => {
            // Trim whitespace and strip inline comments before parsing
            let clean_val = val.split('#').next().unwrap_or("").trim();
            match clean_val.parse::<T>() {
                Ok(parsed) => parsed,
                Err(_) => {
                    eprintln!("Config: {} = '{}' (parse failed, using default)", key, val);
                    default
                }
            }
        }
        Err(_) => default,
    }
}

/// Optional variables: unset or blank means "not configured", never an error.
fn env_var_opt(key: &str) -> Option<String> {
    match std::env::var(key) {
        Ok(val) => {
            let clean_val = val.split('#').next().unwrap_or("").trim();
            if clean_val.is_empty() {
                None
            } else {
                Some(clean_val.to_string())
            }
        }
        Err(_) => None,
    }
}

impl ConciergeConfig {
    pub fn from_env() -> Self {
        if dotenvy::dotenv().is_err() {
            eprintln!("Warning: .env file not found. Using environment variables and defaults.");
        }

        Self {
            default_provider: env_var_or("AI_PROVIDER", "openai".to_string()).to_lowercase(),
            default_model: env_var_opt("AI_MODEL"),
            openai_api_key: env_var_opt("OPENAI_API_KEY"),
            openrouter_api_key: env_var_opt("OPENROUTER_API_KEY"),
            groq_api_key: env_var_opt("GROQ_API_KEY"),
            gemini_api_key: env_var_opt("GEMINI_API_KEY"),
            ollama_base_url: env_var_opt("OLLAMA_BASE_URL"),
            open_webui_base_url: env_var_opt("OPEN_WEBUI_BASE_URL"),
            knowledge_base_url: env_var_or("KNOWLEDGE_BASE_URL", "http://localhost:8001".to_string()),
            docs_dir: env_var_or("CONCIERGE_DOCS_DIR", "./docs".to_string()),
            retrieval_k: env_var_or("CONCIERGE_RETRIEVAL_K", 3),
            pocketbase_url: env_var_or("POCKETBASE_URL", "http://127.0.0.1:8090".to_string()),
            pocketbase_admin_email: env_var_opt("POCKETBASE_ADMIN_EMAIL"),
            pocketbase_admin_password: env_var_opt("POCKETBASE_ADMIN_PASSWORD"),
            record_store_timeout: env_var_or("POCKETBASE_TIMEOUT", 5),
            short_query_words: env_var_or("CONCIERGE_SHORT_QUERY_WORDS", 4),
            host: env_var_or("CONCIERGE_HOST", "0.0.0.0".to_string()),
            port: env_var_or("CONCIERGE_PORT", 8000),
            provider_timeout: env_var_or("CONCIERGE_PROVIDER_TIMEOUT", 60),
            log_level: env_var_or("CONCIERGE_LOG_LEVEL", "info".to_string()),
        }
    }

    /// Get server bind address
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Provider timeout for outbound completion calls
    pub fn provider_timeout_secs(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.provider_timeout)
    }
}

// Global config instance - loaded once at startup
pub static CONFIG: Lazy<ConciergeConfig> = Lazy::new(ConciergeConfig::from_env);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults() {
        let config = ConciergeConfig::from_env();

        assert_eq!(config.pocketbase_url, "http://127.0.0.1:8090");
        assert!(config.retrieval_k > 0);
        assert!(config.short_query_words > 0);
    }

    #[test]
    fn test_bind_address() {
        let config = ConciergeConfig::from_env();
        assert!(config.bind_address().contains(':'));
    }

    #[test]
    fn test_env_var_opt_blank_is_none() {
        unsafe { std::env::set_var("CONCIERGE_TEST_BLANK", "   ") };
        assert_eq!(env_var_opt("CONCIERGE_TEST_BLANK"), None);
        unsafe { std::env::set_var("CONCIERGE_TEST_BLANK", "value # comment") };
        assert_eq!(env_var_opt("CONCIERGE_TEST_BLANK"), Some("value".to_string()));
        unsafe { std::env::remove_var("CONCIERGE_TEST_BLANK") };
    }
}
