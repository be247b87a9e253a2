use std::path::PathBuf;

use crate::zone::ReferenceZone;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Environment {
    Development,
    Test,
    Production,
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Development => write!(f, "development"),
            Environment::Test => write!(f, "test"),
            Environment::Production => write!(f, "production"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub env: Environment,
    pub log_level: String,
    pub sources_path: PathBuf,
    pub position_log_path: PathBuf,
    /// Per-call timeout applied to every upstream attempt.
    pub request_timeout_secs: u64,
    pub user_agent: String,
    pub radius_cap_km: f64,
    pub default_max_results: usize,
    pub max_results_ceiling: usize,
    /// How many of the nearest POIs are enriched per request by default.
    pub enrich_limit: usize,
    pub enrich_max_concurrent: usize,
    pub match_threshold: u32,
    pub region_cache_capacity: u64,
    /// Decimal places kept when rounding coordinates into region cache keys.
    pub region_cache_precision: u32,
    pub catalog_cache_capacity: u64,
    /// `0` disables expiry; entries then live for the whole process.
    pub cache_ttl_secs: u64,
    pub reference_zone: ReferenceZone,
}
