//! httpdtree Core Library
//!
//! This crate provides a mutable tree over Apache-style configuration files
//! (comments, directives and blocks), the queries and edits performed on it,
//! and the derivation of virtual host summaries from `<VirtualHost>` blocks.
//!
//! # Example
//!
//! ```rust
//! use httpdtree_core::{Tree, vhost::derive_vhost};
//!
//! let mut tree = Tree::with_root("VirtualHost", ["*:443"]);
//! let root = tree.root();
//! tree.add_child_directive(root, "ServerName", ["example.com"], None)?;
//!
//! let vhost = derive_vhost(&tree, root)?;
//! assert_eq!(vhost.name.as_deref(), Some("example.com"));
//! assert!(vhost.ssl);
//! # Ok::<(), httpdtree_core::Error>(())
//! ```

pub mod config;
pub mod error;
pub mod node;
pub mod vhost;

pub use config::{ConfigLoader, ParserConfig};
pub use error::{Error, PersistError, Result};
pub use node::{Block, Comment, Directive, Node, NodeId, NodeKind, Persistence, Tree, Verbatim};
pub use vhost::{Addr, Port, VirtualHost};

/// httpdtree version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
