// src/infra/config.rs — Configuration loading (TOML)

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::infra::errors::TripKoiError;
use crate::infra::paths;

/// Environment variables checked for the Gemini key, in order.
pub const API_KEY_ENV_VARS: &[&str] = &["GEMINI_API_KEY", "GOOGLE_API_KEY"];

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub models: ModelsConfig,

    #[serde(default)]
    pub provider: ProviderConfig,

    #[serde(default)]
    pub generation: GenerationConfig,

    #[serde(default)]
    pub route: RouteConfig,

    #[serde(default)]
    pub budget: BudgetConfig,

    #[serde(default)]
    pub api: ApiConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelsConfig {
    /// "provider/model" tried first on every attempt.
    pub primary: String,
    /// "provider/model" tried when the primary call fails. Omitting it in a
    /// `[models]` table disables the fallback.
    #[serde(default)]
    pub fallback: Option<String>,
    #[serde(default)]
    pub temperature: Option<f32>,
    #[serde(default)]
    pub max_output_tokens: Option<u32>,
}

impl Default for ModelsConfig {
    fn default() -> Self {
        Self {
            primary: "google/gemini-2.0-flash-001".into(),
            fallback: Some("google/gemini-2.5-flash".into()),
            temperature: None,
            max_output_tokens: None,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderConfig {
    pub api_key: Option<String>,
    /// Overrides the Gemini REST endpoint (proxies, tests).
    pub base_url: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationConfig {
    pub max_attempts: u32,
    pub retry_backoff_ms: u64,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            retry_backoff_ms: 1_000,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RouteConfig {
    pub max_stops: usize,
    pub max_travel_km: f64,
}

impl Default for RouteConfig {
    fn default() -> Self {
        Self {
            max_stops: 11,
            max_travel_km: 25.0,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CostStrategy {
    /// Redistribute costs so each day lands on the daily budget.
    #[default]
    Normalize,
    /// Trust the KRW figure quoted in each stop's cost reason.
    Quoted,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BudgetConfig {
    #[serde(default)]
    pub strategy: CostStrategy,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    pub host: String,
    pub port: u16,
    #[serde(default = "default_cors_origins")]
    pub cors_origins: Vec<String>,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".into(),
            port: 8787,
            cors_origins: default_cors_origins(),
        }
    }
}

fn default_cors_origins() -> Vec<String> {
    vec![
        "http://localhost:3000".into(),
        "http://localhost:5173".into(),
        "http://127.0.0.1:3000".into(),
        "http://127.0.0.1:5173".into(),
    ]
}

impl Config {
    /// Load config from file, falling back to defaults.
    pub fn load() -> anyhow::Result<Self> {
        let path = paths::config_file_path();
        if path.exists() {
            Self::load_from(&path)
        } else {
            Ok(Self::default())
        }
    }

    pub fn load_from(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values that would make the pipeline misbehave silently.
    pub fn validate(&self) -> Result<(), TripKoiError> {
        if self.generation.max_attempts == 0 {
            return Err(TripKoiError::Config(
                "generation.max_attempts must be at least 1".into(),
            ));
        }
        if self.route.max_stops == 0 {
            return Err(TripKoiError::Config(
                "route.max_stops must be at least 1".into(),
            ));
        }
        if !self.route.max_travel_km.is_finite() || self.route.max_travel_km < 0.0 {
            return Err(TripKoiError::Config(
                "route.max_travel_km must be a non-negative number".into(),
            ));
        }
        Ok(())
    }

    /// Gemini API key from the environment, then from the config file.
    pub fn api_key(&self) -> Result<String, TripKoiError> {
        Self::api_key_with(self, |name| std::env::var(name).ok())
    }

    fn api_key_with(
        &self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<String, TripKoiError> {
        API_KEY_ENV_VARS
            .iter()
            .filter_map(|name| lookup(name))
            .chain(self.provider.api_key.clone())
            .find(|key| !key.trim().is_empty())
            .ok_or(TripKoiError::NoProvider)
    }
}
