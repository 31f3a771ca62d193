use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::Result;
use crate::paths::Paths;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiConfig {
    /// Bio lookup endpoint, without query string.
    #[serde(default = "default_lookup_endpoint")]
    pub lookup_endpoint: String,
    /// Host whose outgoing requests carry the tokens we want.
    #[serde(default = "default_api_host")]
    pub api_host: String,
    /// Session cookie that doubles as the CSRF token.
    #[serde(default = "default_session_cookie")]
    pub session_cookie: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_lookup_endpoint() -> String {
    "https://api.twitter.com/1.1/users/lookup.json".to_string()
}

fn default_api_host() -> String {
    "api.twitter.com".to_string()
}

fn default_session_cookie() -> String {
    "ct0".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            lookup_endpoint: default_lookup_endpoint(),
            api_host: default_api_host(),
            session_cookie: default_session_cookie(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PipelineConfig {
    /// Max retries for one fetch chain; the chain issues at most
    /// `max_retries + 1` attempts before giving up.
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    /// Token-bucket burst capacity for outbound lookup calls.
    #[serde(default = "default_rate_capacity")]
    pub rate_capacity: u32,
    /// Sustained outbound lookup rate (requests/second).
    #[serde(default = "default_rate_per_second")]
    pub rate_per_second: f64,
}

fn default_max_retries() -> u32 {
    5
}

fn default_rate_capacity() -> u32 {
    5
}

fn default_rate_per_second() -> f64 {
    1.0
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            rate_capacity: default_rate_capacity(),
            rate_per_second: default_rate_per_second(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheConfig {
    /// Ceiling on stored handles; the sweeper evicts oldest-first
    /// back down to this count.
    #[serde(default = "default_max_entries")]
    pub max_entries: usize,
    #[serde(default = "default_sweep_interval_secs")]
    pub sweep_interval_secs: u64,
}

fn default_max_entries() -> usize {
    5000
}

fn default_sweep_interval_secs() -> u64 {
    5 * 60
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            max_entries: default_max_entries(),
            sweep_interval_secs: default_sweep_interval_secs(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub pipeline: PipelineConfig,
    #[serde(default)]
    pub cache: CacheConfig,
    /// Recognized pronoun sets. Matching is exact and order-sensitive
    /// per set ("they/them" does not match "them/they").
    #[serde(default = "default_pronouns")]
    pub pronouns: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api: ApiConfig::default(),
            pipeline: PipelineConfig::default(),
            cache: CacheConfig::default(),
            pronouns: default_pronouns(),
        }
    }
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = serde_json::from_str(&content)?;
        Ok(config)
    }

    pub fn load_or_default(paths: &Paths) -> Result<Self> {
        let config_path = paths.config_file();
        if config_path.exists() {
            Self::load(&config_path)
        } else {
            Ok(Self::default())
        }
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, content)?;
        Ok(())
    }
}

/// The preset pronoun sets. Two- to four-form permutations of
/// he/she/they/it/any, plus common neopronoun pairs. Kept as a flat
/// allow-list so matching stays a plain membership check.
fn default_pronouns() -> Vec<String> {
    [
        "they/them",
        "he/him",
        "he/they",
        "she/her",
        "it/its",
        "she/they",
        "they/she",
        "he/they/any",
        "she/they/any",
        "any/he/she",
        "any/she/they",
        "she/he",
        "they/he",
        "it/he",
        "any/he",
        "he/she",
        "it/she",
        "any/she",
        "it/they",
        "any/they",
        "he/it",
        "she/it",
        "they/it",
        "any/it",
        "he/any",
        "she/any",
        "they/any",
        "it/any",
        "she/he/they",
        "she/he/it",
        "she/he/any",
        "they/he/she",
        "they/he/it",
        "they/he/any",
        "it/he/she",
        "it/he/they",
        "it/he/any",
        "any/he/they",
        "any/he/it",
        "he/she/they",
        "he/she/it",
        "he/she/any",
        "they/she/he",
        "they/she/it",
        "they/she/any",
        "it/she/he",
        "it/she/they",
        "it/she/any",
        "any/she/he",
        "any/she/it",
        "he/they/she",
        "he/they/it",
        "she/they/he",
        "she/they/it",
        "it/they/he",
        "it/they/she",
        "it/they/any",
        "any/they/he",
        "any/they/she",
        "any/they/it",
        "he/it/she",
        "he/it/they",
        "he/it/any",
        "she/it/he",
        "she/it/they",
        "she/it/any",
        "they/it/he",
        "they/it/she",
        "they/it/any",
        "any/it/he",
        "any/it/she",
        "any/it/they",
        "he/any/she",
        "he/any/they",
        "he/any/it",
        "she/any/he",
        "she/any/they",
        "she/any/it",
        "they/any/he",
        "they/any/she",
        "they/any/it",
        "it/any/he",
        "it/any/she",
        "it/any/they",
        "she/he/they/it",
        "she/he/they/any",
        "she/he/it/they",
        "she/he/it/any",
        "she/he/any/they",
        "she/he/any/it",
        "they/he/she/it",
        "they/he/she/any",
        "they/he/it/she",
        "they/he/it/any",
        "they/he/any/she",
        "they/he/any/it",
        "it/he/she/they",
        "it/he/she/any",
        "it/he/they/she",
        "it/he/they/any",
        "it/he/any/she",
        "it/he/any/they",
        "any/he/she/they",
        "any/he/she/it",
        "any/he/they/she",
        "any/he/they/it",
        "any/he/it/she",
        "any/he/it/they",
        "he/she/they/it",
        "he/she/they/any",
        "he/she/it/they",
        "he/she/it/any",
        "he/she/any/they",
        "he/she/any/it",
        "they/she/he/it",
        "they/she/he/any",
        "they/she/it/he",
        "they/she/it/any",
        "they/she/any/he",
        "they/she/any/it",
        "it/she/he/they",
        "it/she/he/any",
        "it/she/they/he",
        "it/she/they/any",
        "it/she/any/he",
        "it/she/any/they",
        "any/she/he/they",
        "any/she/he/it",
        "any/she/they/he",
        "any/she/they/it",
        "any/she/it/he",
        "any/she/it/they",
        "he/they/she/it",
        "he/they/she/any",
        "he/they/it/she",
        "he/they/it/any",
        "he/they/any/she",
        "he/they/any/it",
        "she/they/he/it",
        "she/they/he/any",
        "she/they/it/he",
        "she/they/it/any",
        "she/they/any/he",
        "she/they/any/it",
        "it/they/he/she",
        "it/they/he/any",
        "it/they/she/he",
        "it/they/she/any",
        "it/they/any/he",
        "it/they/any/she",
        "any/they/he/she",
        "any/they/he/it",
        "any/they/she/he",
        "any/they/she/it",
        "any/they/it/he",
        "any/they/it/she",
        "he/it/she/they",
        "he/it/she/any",
        "he/it/they/she",
        "he/it/they/any",
        "he/it/any/she",
        "he/it/any/they",
        "she/it/he/they",
        "she/it/he/any",
        "she/it/they/he",
        "she/it/they/any",
        "she/it/any/he",
        "she/it/any/they",
        "they/it/he/she",
        "they/it/he/any",
        "they/it/she/he",
        "they/it/she/any",
        "they/it/any/he",
        "they/it/any/she",
        "any/it/he/she",
        "any/it/he/they",
        "any/it/she/he",
        "any/it/she/they",
        "any/it/they/he",
        "any/it/they/she",
        "he/any/she/they",
        "he/any/she/it",
        "he/any/they/she",
        "he/any/they/it",
        "he/any/it/she",
        "he/any/it/they",
        "she/any/he/they",
        "she/any/he/it",
        "she/any/they/he",
        "she/any/they/it",
        "she/any/it/he",
        "she/any/it/they",
        "they/any/he/she",
        "they/any/he/it",
        "they/any/she/he",
        "they/any/she/it",
        "they/any/it/he",
        "they/any/it/she",
        "it/any/he/she",
        "it/any/he/they",
        "it/any/she/he",
        "it/any/she/they",
        "it/any/they/he",
        "it/any/they/she",
        "he/vae",
        "xe/xem",
        "zie/zim",
        "ve/ver",
        "sie/sir",
        "ne/nem",
        "ey/em",
        "fae/faer",
        "ze/hir",
        "ze/zir",
        "zhe/zher",
        "xe/xyr",
        "tey/tem",
        "xey/xem",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let cfg = Config::default();
        assert_eq!(cfg.pipeline.max_retries, 5);
        assert_eq!(cfg.cache.max_entries, 5000);
        assert_eq!(cfg.cache.sweep_interval_secs, 300);
        assert_eq!(cfg.api.session_cookie, "ct0");
    }

    #[test]
    fn test_partial_config_fills_defaults() {
        let raw = r#"{
  "pipeline": { "maxRetries": 2 },
  "cache": { "maxEntries": 100 }
}"#;
        let cfg: Config = serde_json::from_str(raw).unwrap();
        assert_eq!(cfg.pipeline.max_retries, 2);
        assert_eq!(cfg.cache.max_entries, 100);
        assert_eq!(cfg.cache.sweep_interval_secs, 300);
        assert!(cfg.api.lookup_endpoint.contains("users/lookup.json"));
        assert!(!cfg.pronouns.is_empty());
    }

    #[test]
    fn test_preset_contains_common_sets() {
        let cfg = Config::default();
        for set in ["they/them", "she/her", "it/its", "he/they/any", "xe/xem"] {
            assert!(cfg.pronouns.iter().any(|p| p == set), "missing {set}");
        }
    }
}
