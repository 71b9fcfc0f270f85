//! Evaluation of conditional blocks
//!
//! `<IfModule>` and `<IfDefine>` are decided against the loaded module and
//! define lists of a [`ParserConfig`]. Other conditional sections cannot be
//! decided statically and are treated as active.

use httpdtree_core::ParserConfig;

/// Evaluate a block header. Returns `true` for non-conditional blocks.
pub fn evaluate(name: &str, args: &[String], config: &ParserConfig) -> bool {
    let Some(arg) = args.first() else {
        return true;
    };
    let (negated, subject) = match arg.strip_prefix('!') {
        Some(rest) => (true, rest),
        None => (false, arg.as_str()),
    };

    let holds = if name.eq_ignore_ascii_case("IfModule") {
        config.has_module(subject)
    } else if name.eq_ignore_ascii_case("IfDefine") {
        config.has_define(subject)
    } else {
        return true;
    };

    holds != negated
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    fn config() -> ParserConfig {
        ParserConfig {
            modules: vec!["ssl".to_string()],
            defines: vec!["SSL".to_string()],
            ..ParserConfig::default()
        }
    }

    #[test]
    fn test_if_module() {
        let config = config();
        assert!(evaluate("IfModule", &args(&["mod_ssl.c"]), &config));
        assert!(!evaluate("ifmodule", &args(&["!mod_ssl.c"]), &config));
        assert!(!evaluate("IfModule", &args(&["mod_macro.c"]), &config));
        assert!(evaluate("IfModule", &args(&["!macro_module"]), &config));
    }

    #[test]
    fn test_if_define() {
        let config = config();
        assert!(evaluate("IfDefine", &args(&["SSL"]), &config));
        assert!(!evaluate("IfDefine", &args(&["!SSL"]), &config));
        assert!(!evaluate("IfDefine", &args(&["DEV"]), &config));
    }

    #[test]
    fn test_other_blocks_are_active() {
        let config = config();
        assert!(evaluate("VirtualHost", &args(&["*:80"]), &config));
        assert!(evaluate("IfVersion", &args(&[">=", "2.4"]), &config));
        assert!(evaluate("IfModule", &[], &config));
    }
}
