//! Configuration module

use std::env;

use urlguard_core::constants::{DEFAULT_MAX_BATCH_SIZE, DEFAULT_MODEL_PATH, DEFAULT_TRUSTED_DOMAINS};

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Server port
    pub port: u16,

    /// Tree-ensemble model artifact
    pub model_path: String,

    /// Apex domains that bypass the model in batch analysis
    pub trusted_domains: Vec<String>,

    /// Upper bound on records per batch request
    pub max_batch_size: usize,

    /// Environment (development, production)
    pub environment: String,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from any key lookup; unset or unparsable values use defaults
    pub fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Self {
        let trusted_domains: Vec<String> = get("TRUSTED_DOMAINS")
            .map(|list| {
                list.split(',')
                    .map(str::trim)
                    .filter(|d| !d.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .filter(|list: &Vec<String>| !list.is_empty())
            .unwrap_or_else(|| DEFAULT_TRUSTED_DOMAINS.iter().map(|d| d.to_string()).collect());

        Self {
            port: get("PORT")
                .and_then(|p| p.parse().ok())
                .unwrap_or(8000),

            model_path: get("MODEL_PATH")
                .unwrap_or_else(|| DEFAULT_MODEL_PATH.to_string()),

            trusted_domains,

            max_batch_size: get("MAX_BATCH_SIZE")
                .and_then(|n| n.parse().ok())
                .filter(|n| *n > 0)
                .unwrap_or(DEFAULT_MAX_BATCH_SIZE),

            environment: get("ENVIRONMENT")
                .unwrap_or_else(|| "development".to_string()),
        }
    }

    /// Check if running in production
    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(vars: &[(&str, &str)]) -> Config {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = config(&[]);
        assert_eq!(config.port, 8000);
        assert_eq!(config.model_path, DEFAULT_MODEL_PATH);
        assert_eq!(config.trusted_domains.len(), DEFAULT_TRUSTED_DOMAINS.len());
        assert_eq!(config.max_batch_size, DEFAULT_MAX_BATCH_SIZE);
        assert!(!config.is_production());
    }

    #[test]
    fn test_overrides() {
        let config = config(&[
            ("PORT", "9100"),
            ("TRUSTED_DOMAINS", " example.org, ,corp.example "),
            ("MAX_BATCH_SIZE", "16"),
            ("ENVIRONMENT", "production"),
        ]);
        assert_eq!(config.port, 9100);
        assert_eq!(config.trusted_domains, vec!["example.org", "corp.example"]);
        assert_eq!(config.max_batch_size, 16);
        assert!(config.is_production());
    }

    #[test]
    fn test_invalid_values_fall_back() {
        let config = config(&[("PORT", "http"), ("MAX_BATCH_SIZE", "0"), ("TRUSTED_DOMAINS", " , ")]);
        assert_eq!(config.port, 8000);
        assert_eq!(config.max_batch_size, DEFAULT_MAX_BATCH_SIZE);
        assert_eq!(config.trusted_domains.len(), DEFAULT_TRUSTED_DOMAINS.len());
    }
}
