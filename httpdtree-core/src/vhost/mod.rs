//! Virtual host derivation
//!
//! Turns a `<VirtualHost>` block into a [`VirtualHost`] summary: addresses,
//! server name and aliases, TLS status and whether mod_macro is in play.

mod addr;

pub use addr::{Addr, AddrError, Port};

use crate::error::Result;
use crate::node::{NodeId, Tree};
use serde::Serialize;
use std::collections::BTreeSet;
use std::fmt;
use std::path::PathBuf;

/// Block name that introduces a virtual host
pub const VHOST_BLOCK: &str = "VirtualHost";

/// Summary of one virtual host
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VirtualHost {
    /// `ServerName`, unless the host is built from a macro
    pub name: Option<String>,
    pub aliases: BTreeSet<String>,
    pub addrs: BTreeSet<Addr>,
    pub ssl: bool,
    /// Set when a `Macro` directive makes names unresolvable
    pub modmacro: bool,
    /// File the block was loaded from
    pub filep: Option<PathBuf>,
    #[serde(skip)]
    pub node: NodeId,
}

impl VirtualHost {
    /// Server name followed by every alias
    pub fn names(&self) -> BTreeSet<&str> {
        self.name
            .iter()
            .chain(self.aliases.iter())
            .map(String::as_str)
            .collect()
    }

    /// Whether any of `addrs` would be served by this host as well
    pub fn conflicts<'a>(&self, addrs: impl IntoIterator<Item = &'a Addr>) -> bool {
        addrs
            .into_iter()
            .any(|other| self.addrs.iter().any(|own| own.overlaps(other)))
    }

    /// Both hosts answer for the same names on overlapping addresses
    pub fn same_server(&self, other: &VirtualHost) -> bool {
        self.name == other.name && self.aliases == other.aliases && self.conflicts(&other.addrs)
    }
}

impl fmt::Display for VirtualHost {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let addrs: Vec<String> = self.addrs.iter().map(ToString::to_string).collect();
        let aliases: Vec<&str> = self.aliases.iter().map(String::as_str).collect();
        writeln!(
            f,
            "File: {}",
            self.filep
                .as_ref()
                .map_or_else(|| "-".to_string(), |p| p.display().to_string())
        )?;
        writeln!(f, "Addresses: {}", addrs.join(", "))?;
        writeln!(f, "Name: {}", self.name.as_deref().unwrap_or("-"))?;
        writeln!(f, "Aliases: {}", aliases.join(", "))?;
        writeln!(f, "TLS Enabled: {}", if self.ssl { "Yes" } else { "No" })?;
        write!(f, "Macro: {}", if self.modmacro { "Yes" } else { "No" })
    }
}

/// First parameter of a directive, if any
fn first_parameter(tree: &Tree, id: NodeId) -> Result<Option<&str>> {
    Ok(tree
        .get(id)?
        .parameters()
        .and_then(|p| p.first())
        .map(String::as_str))
}

/// Whether `id` sits in the body of a `<Macro>` definition
fn inside_macro(tree: &Tree, id: NodeId) -> Result<bool> {
    let mut current = tree.ancestor(id)?;
    while let Some(ancestor) = current {
        if tree.block(ancestor)?.name.eq_ignore_ascii_case("Macro") {
            return Ok(true);
        }
        current = tree.ancestor(ancestor)?;
    }
    Ok(false)
}

/// Derive the summary for the `<VirtualHost>` block `id`.
///
/// Malformed address parameters are logged and skipped.
pub fn derive_vhost(tree: &Tree, id: NodeId) -> Result<VirtualHost> {
    let block = tree.block(id)?;

    let mut addrs = BTreeSet::new();
    for spec in &block.parameters {
        match Addr::parse(spec) {
            Ok(addr) => {
                addrs.insert(addr);
            }
            Err(e) => tracing::warn!(node = %id, "skipping virtual host address: {}", e),
        }
    }

    let modmacro =
        inside_macro(tree, id)? || !tree.find_directives(id, "Macro", true)?.is_empty();

    // Macro arguments are placeholders, so any name read here would be made up
    let (name, aliases) = if modmacro {
        (None, BTreeSet::new())
    } else {
        let name = match tree.find_directives(id, "ServerName", true)?.first() {
            Some(&first) => first_parameter(tree, first)?.map(str::to_string),
            None => None,
        };
        let mut aliases = BTreeSet::new();
        for alias in tree.find_directives(id, "ServerAlias", true)? {
            if let Some(params) = tree.get(alias)?.parameters() {
                aliases.extend(params.iter().cloned());
            }
        }
        (name, aliases)
    };

    let mut ssl = addrs.iter().any(|a| a.port == Port::Number(443));
    if !ssl {
        for engine in tree.find_directives(id, "SSLEngine", true)? {
            if first_parameter(tree, engine)?.is_some_and(|p| p.eq_ignore_ascii_case("on")) {
                ssl = true;
                break;
            }
        }
    }

    Ok(VirtualHost {
        name,
        aliases,
        addrs,
        ssl,
        modmacro,
        filep: tree.get(id)?.file().map(PathBuf::from),
        node: id,
    })
}

/// Derive every enabled virtual host found under block `id`
pub fn find_vhosts(tree: &Tree, id: NodeId) -> Result<Vec<VirtualHost>> {
    find_vhosts_named(tree, id, VHOST_BLOCK)
}

/// Like [`find_vhosts`] for a non-standard virtual host block name
pub fn find_vhosts_named(tree: &Tree, id: NodeId, block: &str) -> Result<Vec<VirtualHost>> {
    let vhosts = tree
        .find_blocks(id, block, true)?
        .into_iter()
        .map(|vh| derive_vhost(tree, vh))
        .collect::<Result<Vec<_>>>()?;
    tracing::debug!(count = vhosts.len(), "derived virtual hosts");
    Ok(vhosts)
}
