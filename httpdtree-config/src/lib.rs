//! httpdtree Configuration Loader
//!
//! This crate parses Apache configuration files into an
//! [`httpdtree_core::Tree`] and writes edited trees back to disk.
//!
//! # Example
//!
//! ```rust
//! use httpdtree_config::load_str;
//! use httpdtree_core::{ParserConfig, vhost::find_vhosts};
//!
//! let source = r#"
//! <VirtualHost *:443>
//!     ServerName example.com
//!     ServerAlias www.example.com
//! </VirtualHost>
//! "#;
//!
//! let tree = load_str(source, &ParserConfig::default()).unwrap();
//! let vhosts = find_vhosts(&tree, tree.root()).unwrap();
//! assert_eq!(vhosts[0].name.as_deref(), Some("example.com"));
//! assert!(vhosts[0].ssl);
//! ```

pub mod adapter;
pub mod compiler;
pub mod parser;
pub mod render;

pub use adapter::FileStore;
pub use compiler::{compile_into, CompileError};
pub use parser::{parse, tokenize, LexError, Location, ParseError, Statement, StatementKind, Token};
pub use render::{render_children, render_file};

use httpdtree_core::{ParserConfig, Tree};
use std::path::{Path, PathBuf};

/// Full load error
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("IO error reading {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Parse error in {}: {error}", .path.display())]
    Parse {
        path: PathBuf,
        /// File content, kept for diagnostics
        text: String,
        #[source]
        error: ParseError,
    },

    #[error("Parse error: {0}")]
    Source(#[from] ParseError),

    #[error("Compile error: {0}")]
    Compile(#[from] CompileError),
}

/// Parse source text into a fresh tree whose nodes are not backed by a file
pub fn load_str(source: &str, config: &ParserConfig) -> Result<Tree, LoadError> {
    let statements = parse(source)?;
    let mut tree = Tree::new();
    let root = tree.root();
    compile_into(&mut tree, root, &statements, None, config)?;
    mark_loaded(&mut tree)?;
    Ok(tree)
}

/// Load a single configuration file
pub fn load_file(path: impl AsRef<Path>, config: &ParserConfig) -> Result<Tree, LoadError> {
    load_files([path], config)
}

/// Load several files into one tree, in the given order
pub fn load_files<I, P>(paths: I, config: &ParserConfig) -> Result<Tree, LoadError>
where
    I: IntoIterator<Item = P>,
    P: AsRef<Path>,
{
    let mut tree = Tree::new();
    for path in paths {
        append_file(&mut tree, path.as_ref(), config)?;
    }
    mark_loaded(&mut tree)?;
    Ok(tree)
}

/// Parse `path` and append its content under the root of `tree`.
///
/// The new nodes are left dirty; [`load_files`] marks the whole tree clean.
pub fn append_file(tree: &mut Tree, path: &Path, config: &ParserConfig) -> Result<(), LoadError> {
    let source = std::fs::read_to_string(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let statements = match parse(&source) {
        Ok(statements) => statements,
        Err(error) => {
            return Err(LoadError::Parse {
                path: path.to_path_buf(),
                text: source,
                error,
            });
        }
    };
    tracing::debug!(
        path = %path.display(),
        statements = parser::ast::count(&statements),
        "parsed configuration file"
    );
    let root = tree.root();
    compile_into(tree, root, &statements, Some(path), config)?;
    Ok(())
}

fn mark_loaded(tree: &mut Tree) -> Result<(), LoadError> {
    let root = tree.root();
    tree.mark_clean(root).map_err(CompileError::from)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpdtree_core::vhost::find_vhosts;

    const DEFAULT: &str = r#"
<VirtualHost *:80>
    ServerName example.com
    ServerAlias www.example.com
    DocumentRoot /var/www/html
</VirtualHost>
"#;

    const SSL: &str = r#"
<IfModule mod_ssl.c>
    <VirtualHost _default_:443>
        ServerName example.com
        SSLEngine on
    </VirtualHost>
</IfModule>
"#;

    const MACRO: &str = r#"
<Macro VHost $name>
    <VirtualHost *:80>
        ServerName $name
    </VirtualHost>
</Macro>
<VirtualHost *:8080>
    Use VHost example.org
    Macro Placeholder $host
    ServerName $host
</VirtualHost>
"#;

    #[test]
    fn test_load_str_is_clean() {
        let tree = load_str(DEFAULT, &ParserConfig::default()).unwrap();
        let root = tree.root();
        assert!(!tree.is_dirty(root).unwrap());
        assert!(tree.unsaved_files(root).unwrap().is_empty());
        let vhosts = find_vhosts(&tree, root).unwrap();
        assert_eq!(vhosts.len(), 1);
        assert_eq!(vhosts[0].name.as_deref(), Some("example.com"));
        assert!(!vhosts[0].ssl);
    }

    #[test]
    fn test_conditions_follow_modules() {
        let without = load_str(SSL, &ParserConfig::default()).unwrap();
        assert!(find_vhosts(&without, without.root()).unwrap().is_empty());

        let config = ParserConfig {
            modules: vec!["ssl_module".to_string()],
            ..ParserConfig::default()
        };
        let with = load_str(SSL, &config).unwrap();
        let vhosts = find_vhosts(&with, with.root()).unwrap();
        assert_eq!(vhosts.len(), 1);
        assert!(vhosts[0].ssl);
    }

    #[test]
    fn test_macro_vhost() {
        let tree = load_str(MACRO, &ParserConfig::default()).unwrap();
        let vhosts = find_vhosts(&tree, tree.root()).unwrap();
        // The vhost inside the <Macro> definition is found as well
        assert_eq!(vhosts.len(), 2);
        assert!(vhosts.iter().all(|v| v.modmacro));
        assert!(vhosts.iter().all(|v| v.name.is_none() && v.aliases.is_empty()));
    }

    #[test]
    fn test_load_files_tags_origin() {
        let dir = tempfile::tempdir().unwrap();
        let first = dir.path().join("000-default.conf");
        let second = dir.path().join("default-ssl.conf");
        std::fs::write(&first, DEFAULT).unwrap();
        std::fs::write(&second, SSL).unwrap();

        let config = ParserConfig {
            modules: vec!["ssl".to_string()],
            ..ParserConfig::default()
        };
        let tree = load_files([&first, &second], &config).unwrap();
        let vhosts = find_vhosts(&tree, tree.root()).unwrap();
        assert_eq!(vhosts.len(), 2);
        assert_eq!(vhosts[0].filep.as_deref(), Some(first.as_path()));
        assert_eq!(vhosts[1].filep.as_deref(), Some(second.as_path()));
        assert_eq!(tree.file_roots(&second).len(), 1);
    }

    #[test]
    fn test_load_errors() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing.conf");
        assert!(matches!(
            load_file(&missing, &ParserConfig::default()),
            Err(LoadError::Io { .. })
        ));

        let broken = dir.path().join("broken.conf");
        std::fs::write(&broken, "<VirtualHost *:80>\n").unwrap();
        match load_file(&broken, &ParserConfig::default()) {
            Err(LoadError::Parse { error, text, .. }) => {
                assert!(matches!(error, ParseError::Unclosed { .. }));
                assert_eq!(text, "<VirtualHost *:80>\n");
            }
            other => panic!("expected a parse error, got {:?}", other),
        }
    }

    #[test]
    fn test_edit_roundtrip_through_files() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("site.conf");
        std::fs::write(&path, DEFAULT).unwrap();

        let mut tree = load_file(&path, &ParserConfig::default()).unwrap();
        let root = tree.root();
        let name = tree.find_directives(root, "ServerName", true).unwrap()[0];
        tree.set_parameters(name, ["example.net"]).unwrap();
        let alias = tree.find_directives(root, "ServerAlias", true).unwrap()[0];
        let vhost = tree.ancestor(alias).unwrap().unwrap();
        tree.delete_child(vhost, alias).unwrap();
        tree.save(root, "rename", &mut FileStore::new()).unwrap();

        let reloaded = load_file(&path, &ParserConfig::default()).unwrap();
        let vhosts = find_vhosts(&reloaded, reloaded.root()).unwrap();
        assert_eq!(vhosts[0].name.as_deref(), Some("example.net"));
        assert!(vhosts[0].aliases.is_empty());
    }
}
