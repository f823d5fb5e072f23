use std::path::PathBuf;

use anyhow::{anyhow, bail, Context, Result};

use crate::corpus::chunking::ChunkingConfig;
use crate::normalizer::NoPayloadPolicy;

/// Application configuration loaded from environment variables.
/// Startup fails if a required variable is missing or a value does not parse.
#[derive(Debug, Clone)]
pub struct Config {
    pub anthropic_api_key: String,
    pub port: u16,
    pub rust_log: String,
    /// Root holding the corpus folders and `formatos/`.
    pub data_dir: PathBuf,
    /// Served under `/assets`.
    pub assets_dir: PathBuf,
    /// Reference passages per prompt.
    pub retrieval_k: usize,
    pub chunking: ChunkingConfig,
    pub no_payload_policy: NoPayloadPolicy,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing
        Self::from_vars(|key| std::env::var(key).ok())
    }

    /// Builds the config from any variable source.
    pub fn from_vars(var: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let chunking = ChunkingConfig {
            chunk_size: parse_or(&var, "CHUNK_SIZE", 1200)?,
            chunk_overlap: parse_or(&var, "CHUNK_OVERLAP", 200)?,
        };
        if chunking.chunk_size == 0 || chunking.chunk_overlap >= chunking.chunk_size {
            bail!("CHUNK_OVERLAP must be smaller than a non-zero CHUNK_SIZE");
        }

        let no_payload_policy = match var("NO_PAYLOAD_POLICY") {
            Some(raw) => raw
                .parse::<NoPayloadPolicy>()
                .map_err(|e| anyhow!(e))
                .context("NO_PAYLOAD_POLICY is invalid")?,
            None => NoPayloadPolicy::default(),
        };

        Ok(Config {
            anthropic_api_key: var("ANTHROPIC_API_KEY").with_context(|| {
                "Required environment variable 'ANTHROPIC_API_KEY' is not set".to_string()
            })?,
            port: parse_or(&var, "PORT", 8080).context("PORT must be a valid port number")?,
            rust_log: var("RUST_LOG").unwrap_or_else(|| "info".to_string()),
            data_dir: var("DATA_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("data")),
            assets_dir: var("ASSETS_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("assets")),
            retrieval_k: parse_or(&var, "RETRIEVAL_K", 12)?,
            chunking,
            no_payload_policy,
        })
    }
}

fn parse_or<T>(var: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match var(key) {
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|e| anyhow!("{key}='{raw}' is invalid: {e}")),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> Result<Config> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_vars(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults_with_only_api_key() {
        let config = config_from(&[("ANTHROPIC_API_KEY", "sk-test")]).unwrap();
        assert_eq!(config.port, 8080);
        assert_eq!(config.rust_log, "info");
        assert_eq!(config.data_dir, PathBuf::from("data"));
        assert_eq!(config.assets_dir, PathBuf::from("assets"));
        assert_eq!(config.retrieval_k, 12);
        assert_eq!(config.chunking, ChunkingConfig::default());
        assert_eq!(config.no_payload_policy, NoPayloadPolicy::Fallback);
    }

    #[test]
    fn test_missing_api_key_fails() {
        let err = config_from(&[]).unwrap_err();
        assert!(err.to_string().contains("ANTHROPIC_API_KEY"));
    }

    #[test]
    fn test_overrides_are_parsed() {
        let config = config_from(&[
            ("ANTHROPIC_API_KEY", "sk-test"),
            ("PORT", "9000"),
            ("DATA_DIR", "/srv/mga"),
            ("RETRIEVAL_K", "4"),
            ("NO_PAYLOAD_POLICY", "strict"),
        ])
        .unwrap();
        assert_eq!(config.port, 9000);
        assert_eq!(config.data_dir, PathBuf::from("/srv/mga"));
        assert_eq!(config.retrieval_k, 4);
        assert_eq!(config.no_payload_policy, NoPayloadPolicy::Strict);
    }

    #[test]
    fn test_invalid_port_fails() {
        assert!(config_from(&[("ANTHROPIC_API_KEY", "k"), ("PORT", "http")]).is_err());
    }

    #[test]
    fn test_invalid_policy_fails() {
        assert!(config_from(&[("ANTHROPIC_API_KEY", "k"), ("NO_PAYLOAD_POLICY", "maybe")]).is_err());
    }

    #[test]
    fn test_overlap_must_be_smaller_than_chunk_size() {
        assert!(config_from(&[
            ("ANTHROPIC_API_KEY", "k"),
            ("CHUNK_SIZE", "100"),
            ("CHUNK_OVERLAP", "100"),
        ])
        .is_err());
    }
}
