//! Configuration tree
//!
//! Every node of a parsed configuration lives in a [`Tree`] arena and is
//! addressed by a [`NodeId`]. Blocks own their children through the id list
//! they hold; the ancestor link stored on each node is a plain id and never
//! keeps anything alive.
//!
//! - [`query`]: depth-first `find_*` searches
//! - [`mutation`]: child insertion/removal and parameter replacement
//! - [`persist`]: dirty tracking and the storage adapter boundary

pub mod mutation;
pub mod persist;
pub mod query;

pub use persist::Persistence;
pub use query::Descendants;

use crate::error::{Error, Result};
use serde::Serialize;
use std::collections::BTreeSet;
use std::fmt;
use std::path::{Path, PathBuf};

/// Handle to a node stored in a [`Tree`].
///
/// Ids of deleted nodes go stale: the slot generation is bumped on removal,
/// so an old id never resolves to whatever reuses the slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct NodeId {
    index: u32,
    generation: u32,
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}v{}", self.index, self.generation)
    }
}

/// A comment line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Comment {
    pub text: String,
}

/// A single configuration statement, e.g. `ServerName example.com`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Directive {
    pub name: String,
    pub parameters: Vec<String>,
}

/// A container such as `<VirtualHost *:80>`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Block {
    pub name: String,
    pub parameters: Vec<String>,
    children: Vec<NodeId>,
}

impl Block {
    /// Child ids in document order
    pub fn children(&self) -> &[NodeId] {
        &self.children
    }
}

/// Source text a node was loaded from.
///
/// Storage adapters write clean nodes back from this text so that untouched
/// lines keep their layout. Edits to a node's own content drop `text`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Verbatim {
    /// Blank lines and indentation before the node
    pub leading: String,
    /// The node's own line(s) with line terminator; the opening line of a block
    pub text: Option<String>,
    /// Everything after a block's last child up to and including its closing line
    pub close: Option<String>,
    /// Text following the last node of a file
    pub trailing: String,
}

impl Verbatim {
    /// Indentation of the node's first line
    pub fn indent(&self) -> &str {
        self.leading.rsplit('\n').next().unwrap_or_default()
    }
}

/// The three node kinds
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKind {
    Comment(Comment),
    Directive(Directive),
    Block(Block),
}

/// A node together with its ancestry and bookkeeping state
#[derive(Debug, Clone)]
pub struct Node {
    ancestor: Option<NodeId>,
    dirty: bool,
    /// Verdict of the storage adapter for conditional wrappers; `true` otherwise
    condition: bool,
    file: Option<PathBuf>,
    /// Files of children removed since the last save
    detached: BTreeSet<PathBuf>,
    verbatim: Option<Verbatim>,
    kind: NodeKind,
}

impl Node {
    fn new(kind: NodeKind, ancestor: Option<NodeId>, file: Option<PathBuf>) -> Self {
        Self {
            ancestor,
            dirty: false,
            condition: true,
            file,
            detached: BTreeSet::new(),
            verbatim: None,
            kind,
        }
    }

    pub fn kind(&self) -> &NodeKind {
        &self.kind
    }

    /// Enclosing block, `None` for the root
    pub fn ancestor(&self) -> Option<NodeId> {
        self.ancestor
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Whether this node's own condition holds. Only meaningful for
    /// conditional blocks; it decides whether their children are enabled.
    pub fn condition(&self) -> bool {
        self.condition
    }

    /// Storage location this node was parsed from (or inherited on insertion)
    pub fn file(&self) -> Option<&Path> {
        self.file.as_deref()
    }

    /// Original source text, for nodes loaded by a storage adapter
    pub fn verbatim(&self) -> Option<&Verbatim> {
        self.verbatim.as_ref()
    }

    /// Name of a directive or block. Comments have none.
    pub fn name(&self) -> Option<&str> {
        match &self.kind {
            NodeKind::Comment(_) => None,
            NodeKind::Directive(d) => Some(&d.name),
            NodeKind::Block(b) => Some(&b.name),
        }
    }

    /// Parameters of a directive or block. Comments have none.
    pub fn parameters(&self) -> Option<&[String]> {
        match &self.kind {
            NodeKind::Comment(_) => None,
            NodeKind::Directive(d) => Some(&d.parameters),
            NodeKind::Block(b) => Some(&b.parameters),
        }
    }

    pub fn as_comment(&self) -> Option<&Comment> {
        match &self.kind {
            NodeKind::Comment(c) => Some(c),
            _ => None,
        }
    }

    pub fn as_directive(&self) -> Option<&Directive> {
        match &self.kind {
            NodeKind::Directive(d) => Some(d),
            _ => None,
        }
    }

    pub fn as_block(&self) -> Option<&Block> {
        match &self.kind {
            NodeKind::Block(b) => Some(b),
            _ => None,
        }
    }

    /// Case-insensitive name match; comments never match
    pub fn is_named(&self, name: &str) -> bool {
        self.name().is_some_and(|n| n.eq_ignore_ascii_case(name))
    }
}

#[derive(Debug, Clone)]
struct Slot {
    generation: u32,
    node: Option<Node>,
}

/// Arena holding a whole configuration tree
#[derive(Debug, Clone)]
pub struct Tree {
    slots: Vec<Slot>,
    free: Vec<u32>,
    root: NodeId,
}

impl Tree {
    /// Create a tree whose root is an anonymous container block
    pub fn new() -> Self {
        Self::with_root("", Vec::<String>::new())
    }

    /// Create a tree rooted at a named block, e.g. a lone `<VirtualHost>`
    pub fn with_root<I, S>(name: impl Into<String>, parameters: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let root = Node::new(
            NodeKind::Block(Block {
                name: name.into(),
                parameters: parameters.into_iter().map(Into::into).collect(),
                children: Vec::new(),
            }),
            None,
            None,
        );
        Self {
            slots: vec![Slot {
                generation: 0,
                node: Some(root),
            }],
            free: Vec::new(),
            root: NodeId {
                index: 0,
                generation: 0,
            },
        }
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Number of live nodes, root included
    pub fn len(&self) -> usize {
        self.slots.iter().filter(|s| s.node.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.slot(id).is_some()
    }

    pub fn get(&self, id: NodeId) -> Result<&Node> {
        self.slot(id).ok_or(Error::NotFound(id))
    }

    pub(crate) fn get_mut(&mut self, id: NodeId) -> Result<&mut Node> {
        self.slots
            .get_mut(id.index as usize)
            .filter(|s| s.generation == id.generation)
            .and_then(|s| s.node.as_mut())
            .ok_or(Error::NotFound(id))
    }

    fn slot(&self, id: NodeId) -> Option<&Node> {
        self.slots
            .get(id.index as usize)
            .filter(|s| s.generation == id.generation)
            .and_then(|s| s.node.as_ref())
    }

    /// Borrow a node as a block
    pub fn block(&self, id: NodeId) -> Result<&Block> {
        self.get(id)?.as_block().ok_or(Error::NotABlock(id))
    }

    /// Child ids of a block in document order
    pub fn children(&self, id: NodeId) -> Result<&[NodeId]> {
        Ok(self.block(id)?.children())
    }

    pub fn ancestor(&self, id: NodeId) -> Result<Option<NodeId>> {
        Ok(self.get(id)?.ancestor)
    }

    pub fn is_dirty(&self, id: NodeId) -> Result<bool> {
        Ok(self.get(id)?.dirty)
    }

    /// A node is enabled when every enclosing block's condition holds
    pub fn is_enabled(&self, id: NodeId) -> Result<bool> {
        let mut current = self.get(id)?.ancestor;
        while let Some(ancestor) = current {
            let node = self.get(ancestor)?;
            if !node.condition {
                return Ok(false);
            }
            current = node.ancestor;
        }
        Ok(true)
    }

    /// Record the storage adapter's evaluation of a conditional block.
    ///
    /// This reflects the state of the store and does not dirty the node.
    pub fn set_condition(&mut self, id: NodeId, condition: bool) -> Result<()> {
        self.get_mut(id)?.condition = condition;
        Ok(())
    }

    /// Attach a node to a storage location. Children added later inherit it.
    pub fn set_file(&mut self, id: NodeId, file: impl Into<PathBuf>) -> Result<()> {
        self.get_mut(id)?.file = Some(file.into());
        Ok(())
    }

    /// Remember the source text of a loaded node. Does not dirty the node.
    pub fn set_verbatim(&mut self, id: NodeId, verbatim: Verbatim) -> Result<()> {
        self.get_mut(id)?.verbatim = Some(verbatim);
        Ok(())
    }

    fn alloc(&mut self, node: Node) -> NodeId {
        if let Some(index) = self.free.pop() {
            let slot = &mut self.slots[index as usize];
            slot.node = Some(node);
            NodeId {
                index,
                generation: slot.generation,
            }
        } else {
            let index = self.slots.len() as u32;
            self.slots.push(Slot {
                generation: 0,
                node: Some(node),
            });
            NodeId {
                index,
                generation: 0,
            }
        }
    }

    fn release(&mut self, id: NodeId) {
        if let Some(slot) = self.slots.get_mut(id.index as usize) {
            if slot.generation == id.generation && slot.node.take().is_some() {
                slot.generation = slot.generation.wrapping_add(1);
                self.free.push(id.index);
            }
        }
    }
}

impl Default for Tree {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_tree_has_clean_root() {
        let tree = Tree::new();
        let root = tree.root();
        assert_eq!(tree.len(), 1);
        assert!(!tree.is_dirty(root).unwrap());
        assert!(tree.is_enabled(root).unwrap());
        assert_eq!(tree.ancestor(root).unwrap(), None);
        assert!(tree.children(root).unwrap().is_empty());
    }

    #[test]
    fn test_node_narrowing() {
        let mut tree = Tree::with_root("VirtualHost", ["*:80"]);
        let root = tree.root();
        let comment = tree.add_child_comment(root, "hello", None).unwrap();
        let directive = tree
            .add_child_directive(root, "ServerName", ["example.com"], None)
            .unwrap();

        let node = tree.get(comment).unwrap();
        assert_eq!(node.as_comment().unwrap().text, "hello");
        assert!(node.as_directive().is_none());
        assert!(node.name().is_none());
        assert!(node.parameters().is_none());

        let node = tree.get(directive).unwrap();
        assert!(node.is_named("servername"));
        assert_eq!(node.parameters().unwrap(), ["example.com"]);
        assert_eq!(node.ancestor(), Some(root));

        assert!(matches!(tree.block(directive), Err(Error::NotABlock(_))));
        assert_eq!(tree.get(root).unwrap().parameters().unwrap(), ["*:80"]);
    }

    #[test]
    fn test_enabled_follows_conditions() {
        let mut tree = Tree::new();
        let root = tree.root();
        let outer = tree
            .add_child_block(root, "IfModule", ["mod_ssl.c"], None)
            .unwrap();
        let inner = tree.add_child_block(outer, "VirtualHost", ["*:443"], None).unwrap();
        let leaf = tree
            .add_child_directive(inner, "SSLEngine", ["on"], None)
            .unwrap();

        tree.set_condition(outer, false).unwrap();
        // The conditional block itself is visible; only its contents are not.
        assert!(tree.is_enabled(outer).unwrap());
        assert!(!tree.is_enabled(inner).unwrap());
        assert!(!tree.is_enabled(leaf).unwrap());

        tree.set_condition(outer, true).unwrap();
        assert!(tree.is_enabled(leaf).unwrap());
    }

    #[test]
    fn test_stale_id_is_not_found() {
        let mut tree = Tree::new();
        let root = tree.root();
        let child = tree.add_child_directive(root, "Listen", ["80"], None).unwrap();
        tree.delete_child(root, child).unwrap();
        assert!(!tree.contains(child));
        assert!(matches!(tree.get(child), Err(Error::NotFound(id)) if id == child));

        // The freed slot is recycled under a new generation.
        let reused = tree.add_child_directive(root, "Listen", ["443"], None).unwrap();
        assert_ne!(reused, child);
        assert!(!tree.contains(child));
        assert!(tree.contains(reused));
    }
}
