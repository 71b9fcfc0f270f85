//! Configuration type definitions
//!
//! These types describe the environment a configuration is evaluated in.

use crate::vhost::VHOST_BLOCK;
use serde::{Deserialize, Serialize};

/// Settings used when loading and interpreting a configuration tree
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ParserConfig {
    /// Loaded modules, used for `<IfModule>` (e.g. `ssl`, `mod_ssl.c`)
    #[serde(default)]
    pub modules: Vec<String>,

    /// Defined parameters, used for `<IfDefine>`
    #[serde(default)]
    pub defines: Vec<String>,

    /// Block name that introduces a virtual host
    #[serde(default = "default_vhost_block")]
    pub vhost_block: String,
}

fn default_vhost_block() -> String {
    VHOST_BLOCK.to_string()
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            modules: Vec::new(),
            defines: Vec::new(),
            vhost_block: default_vhost_block(),
        }
    }
}

impl ParserConfig {
    /// Whether `module` is loaded. `ssl`, `mod_ssl` and `mod_ssl.c` all
    /// name the same module.
    pub fn has_module(&self, module: &str) -> bool {
        let wanted = normalize_module(module);
        self.modules.iter().any(|m| normalize_module(m) == wanted)
    }

    /// Whether `name` is defined
    pub fn has_define(&self, name: &str) -> bool {
        self.defines.iter().any(|d| d == name)
    }
}

fn normalize_module(name: &str) -> String {
    let name = name.trim();
    let name = name.strip_suffix(".c").unwrap_or(name);
    let name = name.strip_suffix("_module").unwrap_or(name);
    let name = name.strip_prefix("mod_").unwrap_or(name);
    name.to_ascii_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_module_spellings() {
        let config = ParserConfig {
            modules: vec!["mod_ssl.c".to_string(), "rewrite_module".to_string()],
            ..ParserConfig::default()
        };
        assert!(config.has_module("ssl"));
        assert!(config.has_module("mod_ssl.c"));
        assert!(config.has_module("mod_rewrite.c"));
        assert!(!config.has_module("macro"));
    }

    #[test]
    fn test_defines_are_case_sensitive() {
        let config = ParserConfig {
            defines: vec!["SSL".to_string()],
            ..ParserConfig::default()
        };
        assert!(config.has_define("SSL"));
        assert!(!config.has_define("ssl"));
    }
}
