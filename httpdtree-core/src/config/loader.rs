//! Configuration loader

use crate::config::ParserConfig;
use crate::error::{Error, Result};
use std::path::Path;

/// Configuration loader for various formats
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration from a file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<ParserConfig> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("Failed to read config file: {}", e)))?;

        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");

        match ext {
            "json" => Self::from_json(&content),
            "toml" | "" => Self::from_toml(&content),
            _ => Err(Error::Config(format!("Unknown config format: {}", ext))),
        }
    }

    /// Parse JSON configuration
    pub fn from_json(content: &str) -> Result<ParserConfig> {
        serde_json::from_str(content)
            .map_err(|e| Error::Config(format!("Invalid JSON: {}", e)))
    }

    /// Parse TOML configuration
    pub fn from_toml(content: &str) -> Result<ParserConfig> {
        toml::from_str(content)
            .map_err(|e| Error::Config(format!("Invalid TOML: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_json_loading() {
        let json = r#"{"modules": ["ssl"]}"#;
        let config = ConfigLoader::from_json(json).unwrap();
        assert_eq!(config.modules, vec!["ssl".to_string()]);
        assert_eq!(config.vhost_block, "VirtualHost");
    }

    #[test]
    fn test_toml_loading() {
        let toml = r#"
            modules = ["mod_ssl.c", "macro"]
            defines = ["SSL"]
        "#;
        let config = ConfigLoader::from_toml(toml).unwrap();
        assert!(config.has_module("ssl"));
        assert!(config.has_define("SSL"));
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("httpdtree.json");
        std::fs::write(&path, r#"{"defines": ["DEV"]}"#).unwrap();
        let config = ConfigLoader::load(&path).unwrap();
        assert!(config.has_define("DEV"));

        let bad = dir.path().join("httpdtree.yaml");
        std::fs::write(&bad, "defines: []").unwrap();
        assert!(matches!(ConfigLoader::load(&bad), Err(Error::Config(_))));
    }

    #[test]
    fn test_missing_file_is_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing.toml");
        let err = ConfigLoader::load(&missing).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
        assert!(err.to_string().contains("Failed to read config file"));
    }

    #[test]
    fn test_invalid_toml() {
        assert!(matches!(
            ConfigLoader::from_toml("modules = ["),
            Err(Error::Config(_))
        ));
    }
}
