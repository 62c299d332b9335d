//! Process configuration, loaded once at startup from the environment.

mod consolidation_config;
mod recall_config;

pub use consolidation_config::ConsolidationConfig;
pub use recall_config::RecallConfig;

use crate::constants::{DEFAULT_EMBEDDING_DIMENSIONS, VALID_EMBEDDING_DIMENSIONS};
use crate::errors::{EngramError, EngramResult};

/// Which generative backend serves LLM tasks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LlmProvider {
    Anthropic,
    OpenAi,
}

impl LlmProvider {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Anthropic => "anthropic",
            Self::OpenAi => "openai",
        }
    }
}

/// All recognised configuration keys. Values are environment-supplied;
/// anything unset falls back to the documented default. Parsed exactly once
/// by the composition root.
#[derive(Debug, Clone)]
pub struct EngramConfig {
    /// SQLite database path. `None` selects an in-memory database.
    pub database_path: Option<std::path::PathBuf>,
    pub db_pool_min_size: usize,
    pub db_pool_max_size: usize,

    pub embedding_dimensions: usize,
    pub embedding_model: String,
    pub openai_api_key: Option<String>,

    pub llm_provider: LlmProvider,
    pub anthropic_api_key: Option<String>,
    pub anthropic_model: String,
    pub openai_llm_model: String,

    pub cache_ttl_memories_secs: u64,
    pub cache_ttl_preferences_secs: u64,

    pub rate_limit_enabled: bool,
    pub rate_limit_requests_per_minute: u32,

    pub consolidation: ConsolidationConfig,
    pub recall: RecallConfig,
}

impl Default for EngramConfig {
    fn default() -> Self {
        Self {
            database_path: None,
            db_pool_min_size: 5,
            db_pool_max_size: 20,
            embedding_dimensions: DEFAULT_EMBEDDING_DIMENSIONS,
            embedding_model: "text-embedding-3-large".to_string(),
            openai_api_key: None,
            llm_provider: LlmProvider::Anthropic,
            anthropic_api_key: None,
            anthropic_model: "claude-3-5-sonnet-20241022".to_string(),
            openai_llm_model: "gpt-4-turbo-preview".to_string(),
            cache_ttl_memories_secs: 3_600,
            cache_ttl_preferences_secs: 86_400,
            rate_limit_enabled: true,
            rate_limit_requests_per_minute: 100,
            consolidation: ConsolidationConfig::default(),
            recall: RecallConfig::default(),
        }
    }
}

impl EngramConfig {
    /// Load from the environment, validating the closed key set.
    pub fn from_env() -> EngramResult<Self> {
        let mut config = Self::default();

        if let Some(path) = read_var("DATABASE_PATH") {
            config.database_path = Some(path.into());
        }
        if let Some(v) = read_var("DB_POOL_MIN_SIZE") {
            config.db_pool_min_size = parse_number("DB_POOL_MIN_SIZE", &v)?;
        }
        if let Some(v) = read_var("DB_POOL_MAX_SIZE") {
            config.db_pool_max_size = parse_number("DB_POOL_MAX_SIZE", &v)?;
        }
        if let Some(v) = read_var("EMBEDDING_DIMENSIONS") {
            config.embedding_dimensions = parse_number("EMBEDDING_DIMENSIONS", &v)?;
        }
        if let Some(v) = read_var("EMBEDDING_MODEL") {
            config.embedding_model = v;
        }
        config.openai_api_key = read_var("OPENAI_API_KEY");
        if let Some(v) = read_var("LLM_PROVIDER") {
            config.llm_provider = match v.as_str() {
                "anthropic" => LlmProvider::Anthropic,
                "openai" => LlmProvider::OpenAi,
                other => {
                    return Err(EngramError::Config {
                        message: format!("LLM_PROVIDER must be 'anthropic' or 'openai', got '{other}'"),
                    })
                }
            };
        }
        config.anthropic_api_key = read_var("ANTHROPIC_API_KEY");
        if let Some(v) = read_var("ANTHROPIC_MODEL") {
            config.anthropic_model = v;
        }
        if let Some(v) = read_var("OPENAI_LLM_MODEL") {
            config.openai_llm_model = v;
        }
        if let Some(v) = read_var("CACHE_TTL_MEMORIES") {
            config.cache_ttl_memories_secs = parse_number("CACHE_TTL_MEMORIES", &v)?;
        }
        if let Some(v) = read_var("CACHE_TTL_PREFERENCES") {
            config.cache_ttl_preferences_secs = parse_number("CACHE_TTL_PREFERENCES", &v)?;
        }
        if let Some(v) = read_var("RATE_LIMIT_ENABLED") {
            config.rate_limit_enabled = v == "true" || v == "1";
        }
        if let Some(v) = read_var("RATE_LIMIT_REQUESTS_PER_MINUTE") {
            config.rate_limit_requests_per_minute =
                parse_number("RATE_LIMIT_REQUESTS_PER_MINUTE", &v)?;
        }
        if let Some(v) = read_var("CONSOLIDATION_DUPLICATE_THRESHOLD") {
            config.consolidation.duplicate_threshold =
                parse_float("CONSOLIDATION_DUPLICATE_THRESHOLD", &v)?;
        }
        if let Some(v) = read_var("CONSOLIDATION_CONFLICT_THRESHOLD_LOW") {
            config.consolidation.conflict_threshold_low =
                parse_float("CONSOLIDATION_CONFLICT_THRESHOLD_LOW", &v)?;
        }
        if let Some(v) = read_var("CONSOLIDATION_CONFLICT_THRESHOLD_HIGH") {
            config.consolidation.conflict_threshold_high =
                parse_float("CONSOLIDATION_CONFLICT_THRESHOLD_HIGH", &v)?;
        }
        if let Some(v) = read_var("RECALL_DEADLINE_MS") {
            config.recall.deadline_ms = parse_number("RECALL_DEADLINE_MS", &v)?;
        }

        config.validate()?;
        Ok(config)
    }

    /// Validate the invariants that must hold regardless of how the config
    /// was constructed.
    pub fn validate(&self) -> EngramResult<()> {
        if !VALID_EMBEDDING_DIMENSIONS.contains(&self.embedding_dimensions) {
            return Err(EngramError::Config {
                message: format!(
                    "EMBEDDING_DIMENSIONS must be one of {VALID_EMBEDDING_DIMENSIONS:?}, got {}",
                    self.embedding_dimensions
                ),
            });
        }
        if self.db_pool_min_size == 0 || self.db_pool_min_size > self.db_pool_max_size {
            return Err(EngramError::Config {
                message: format!(
                    "invalid pool sizing: min {} max {}",
                    self.db_pool_min_size, self.db_pool_max_size
                ),
            });
        }
        self.consolidation.validate()?;
        Ok(())
    }
}

fn read_var(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn parse_number<T: std::str::FromStr>(key: &str, value: &str) -> EngramResult<T> {
    value.parse().map_err(|_| EngramError::Config {
        message: format!("{key} must be a number, got '{value}'"),
    })
}

fn parse_float(key: &str, value: &str) -> EngramResult<f64> {
    value.parse().map_err(|_| EngramError::Config {
        message: format!("{key} must be a float, got '{value}'"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        EngramConfig::default().validate().unwrap();
    }

    #[test]
    fn rejects_unknown_dimension() {
        let config = EngramConfig {
            embedding_dimensions: 1000,
            ..EngramConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn rejects_inverted_pool_sizes() {
        let config = EngramConfig {
            db_pool_min_size: 30,
            db_pool_max_size: 20,
            ..EngramConfig::default()
        };
        assert!(config.validate().is_err());
    }
}
