use serde::Deserialize;
use std::env;
use std::time::Duration;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub service: ServiceConfig,
    pub recommendation: RecommendationConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServiceConfig {
    pub service_name: String,
    pub env: String,
}

/// Tunables for the recommendation pipeline
///
/// Loaded from `RECOMMENDATION_*` environment variables, e.g.
/// `RECOMMENDATION_MAX_SIMILAR_USERS=20`.
#[derive(Debug, Clone, Deserialize)]
pub struct RecommendationConfig {
    /// How many recent view events feed the preference profile
    #[serde(default = "default_view_history_limit")]
    pub view_history_limit: usize,
    /// Peers kept after Pearson similarity ranking
    #[serde(default = "default_max_similar_users")]
    pub max_similar_users: usize,
    /// Peers at or below this similarity are ignored
    #[serde(default = "default_min_user_similarity")]
    pub min_user_similarity: f64,
    #[serde(default = "default_max_limit")]
    pub max_limit: usize,
    #[serde(default = "default_limit")]
    pub default_limit: usize,
    /// Upper bound for every single-shot store read
    #[serde(default = "default_fetch_timeout_ms")]
    pub fetch_timeout_ms: u64,
    /// Popular pool size relative to the requested limit on the cold-start path
    #[serde(default = "default_fallback_pool_multiplier")]
    pub fallback_pool_multiplier: usize,
}

impl Default for RecommendationConfig {
    fn default() -> Self {
        Self {
            view_history_limit: default_view_history_limit(),
            max_similar_users: default_max_similar_users(),
            min_user_similarity: default_min_user_similarity(),
            max_limit: default_max_limit(),
            default_limit: default_limit(),
            fetch_timeout_ms: default_fetch_timeout_ms(),
            fallback_pool_multiplier: default_fallback_pool_multiplier(),
        }
    }
}

impl RecommendationConfig {
    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_millis(self.fetch_timeout_ms)
    }

    /// Resolve a caller-supplied limit against the configured bounds
    pub fn effective_limit(&self, requested: usize) -> usize {
        requested.min(self.max_limit)
    }
}

impl Config {
    pub fn from_env() -> Result<Self, envy::Error> {
        dotenvy::dotenv().ok();

        Ok(Config {
            service: ServiceConfig {
                service_name: env::var("SERVICE_NAME")
                    .unwrap_or_else(|_| "recipe-recommendation-service".to_string()),
                env: env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()),
            },
            recommendation: envy::prefixed("RECOMMENDATION_").from_env::<RecommendationConfig>()?,
        })
    }
}

fn default_view_history_limit() -> usize {
    50
}

fn default_max_similar_users() -> usize {
    20
}

fn default_min_user_similarity() -> f64 {
    0.1
}

fn default_max_limit() -> usize {
    100
}

fn default_limit() -> usize {
    10
}

fn default_fetch_timeout_ms() -> u64 {
    5000
}

fn default_fallback_pool_multiplier() -> usize {
    3
}
