use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Identifier of the runtime configuration mapping that externalized
    /// literals read from.
    #[serde(default = "default_mapping_ident")]
    pub mapping_ident: String,

    #[serde(default)]
    pub enrichment: EnrichmentSettings,

    #[serde(default)]
    pub split: SplitSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnrichmentSettings {
    #[serde(default)]
    pub enabled: bool,

    #[serde(default = "default_model")]
    pub model: String,

    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub api_key: Option<String>, // falls back to OPENAI_API_KEY

    #[serde(default = "default_threshold_k")]
    pub threshold_k: usize,

    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SplitSettings {
    #[serde(default = "default_split_enabled")]
    pub enabled: bool,
}

fn default_mapping_ident() -> String {
    "params".to_string()
}
fn default_model() -> String {
    "gpt-4o".to_string()
}
fn default_threshold_k() -> usize {
    3
}
fn default_timeout_seconds() -> u64 {
    20
}
fn default_split_enabled() -> bool {
    true
}

impl Default for EnrichmentSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            model: default_model(),
            api_key: None,
            threshold_k: default_threshold_k(),
            timeout_seconds: default_timeout_seconds(),
        }
    }
}

impl Default for SplitSettings {
    fn default() -> Self {
        Self {
            enabled: default_split_enabled(),
        }
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            mapping_ident: default_mapping_ident(),
            enrichment: EnrichmentSettings::default(),
            split: SplitSettings::default(),
        }
    }
}

impl EngineConfig {
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = serde_yaml::from_str(&content)?;
        Ok(config)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&content)?;
        Ok(config)
    }

    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(ident) = std::env::var("PARAMLIFT_MAPPING_IDENT") {
            config.mapping_ident = ident;
        }
        if let Ok(enabled) = std::env::var("PARAMLIFT_ENRICH") {
            config.enrichment.enabled = enabled == "1" || enabled.eq_ignore_ascii_case("true");
        }
        if let Ok(model) = std::env::var("PARAMLIFT_ENRICHMENT_MODEL") {
            config.enrichment.model = model;
        }
        if let Ok(k) = std::env::var("PARAMLIFT_THRESHOLD_K") {
            if let Ok(k) = k.parse() {
                config.enrichment.threshold_k = k;
            }
        }
        if let Ok(timeout) = std::env::var("PARAMLIFT_TIMEOUT_SECONDS") {
            if let Ok(timeout) = timeout.parse() {
                config.enrichment.timeout_seconds = timeout;
            }
        }
        if let Ok(split) = std::env::var("PARAMLIFT_SPLIT") {
            config.split.enabled = split != "0" && !split.eq_ignore_ascii_case("false");
        }

        config
    }
}

pub const EXAMPLE_CONFIG: &str = r#"
# paramlift engine configuration

mapping_ident: params

enrichment:
  enabled: false
  model: gpt-4o
  # api_key: sk-...  # optional, defaults to OPENAI_API_KEY
  threshold_k: 3
  timeout_seconds: 20

split:
  enabled: true
"#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = EngineConfig::default();
        assert_eq!(config.mapping_ident, "params");
        assert!(!config.enrichment.enabled);
        assert_eq!(config.enrichment.threshold_k, 3);
        assert!(config.split.enabled);
    }

    #[test]
    fn test_example_config_parses_to_defaults() {
        let parsed: EngineConfig = serde_yaml::from_str(EXAMPLE_CONFIG).unwrap();
        assert_eq!(parsed.mapping_ident, "params");
        assert_eq!(parsed.enrichment.timeout_seconds, 20);
    }

    #[test]
    fn test_partial_yaml_fills_defaults() {
        let parsed: EngineConfig =
            serde_yaml::from_str("enrichment:\n  enabled: true\n").unwrap();
        assert!(parsed.enrichment.enabled);
        assert_eq!(parsed.enrichment.model, "gpt-4o");
        assert_eq!(parsed.mapping_ident, "params");
    }
}
