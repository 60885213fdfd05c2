use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde_json::Error as SerdeError;

use crate::domain::pricing::{PricingTables, TablesError};
use crate::infra::gemini::GeminiSettings;

pub const API_KEY_VAR: &str = "GEMINI_API_KEY";
pub const ENDPOINT_VAR: &str = "GEMINI_ENDPOINT";
pub const MODEL_VAR: &str = "GEMINI_MODEL";
pub const TIMEOUT_VAR: &str = "GEMINI_TIMEOUT_SECS";
pub const TABLES_VAR: &str = "BARTER_PRICING_TABLES";

pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";
const DEFAULT_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Clone, Debug, Default, PartialEq)]
pub struct AppConfig {
    /// `None` runs the heuristic engine only.
    pub gemini: Option<GeminiSettings>,
    pub tables_path: Option<PathBuf>,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from any key lookup; blank values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let timeout = match get(TIMEOUT_VAR) {
            Some(raw) => raw
                .trim()
                .parse::<u64>()
                .ok()
                .filter(|secs| *secs > 0)
                .map(Duration::from_secs)
                .ok_or(ConfigError::InvalidTimeout { value: raw })?,
            None => DEFAULT_TIMEOUT,
        };

        let gemini = get(API_KEY_VAR).map(|api_key| {
            let endpoint = get(ENDPOINT_VAR).unwrap_or_else(|| {
                let model = get(MODEL_VAR).unwrap_or_else(|| DEFAULT_MODEL.to_string());
                format!("{DEFAULT_API_BASE}/models/{model}:generateContent")
            });
            GeminiSettings {
                api_key,
                endpoint,
                timeout,
            }
        });

        Ok(Self {
            gemini,
            tables_path: get(TABLES_VAR).map(PathBuf::from),
        })
    }

    /// Tables from the configured file, or the built-in set.
    pub fn load_tables(&self) -> Result<PricingTables, ConfigError> {
        match &self.tables_path {
            Some(path) => load_pricing_tables(path),
            None => Ok(PricingTables::default()),
        }
    }
}

pub fn load_pricing_tables(path: &Path) -> Result<PricingTables, ConfigError> {
    let data = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let tables: PricingTables = serde_json::from_str(&data).map_err(|source| ConfigError::Json {
        path: path.to_path_buf(),
        source,
    })?;
    tables.validate()?;
    Ok(tables)
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read {}: {source}", .path.display())]
    Io { path: PathBuf, source: io::Error },
    #[error("invalid JSON in {}: {source}", .path.display())]
    Json { path: PathBuf, source: SerdeError },
    #[error("invalid pricing tables: {0}")]
    InvalidTables(#[from] TablesError),
    #[error("GEMINI_TIMEOUT_SECS must be a positive number of seconds (got '{value}')")]
    InvalidTimeout { value: String },
}
