//! Depth-first searches over a block's descendants

use super::{Node, NodeId, NodeKind, Tree};
use crate::error::{Error, Result};

/// Pre-order iterator over the descendants of a block (the block itself
/// excluded). Yields each node together with its enabled state.
pub struct Descendants<'a> {
    tree: &'a Tree,
    stack: Vec<(NodeId, bool)>,
    exclude: bool,
}

impl<'a> Descendants<'a> {
    fn push_children(&mut self, node: &Node, enabled: bool) {
        if let NodeKind::Block(block) = &node.kind {
            let child_enabled = enabled && node.condition;
            if self.exclude && !child_enabled {
                return;
            }
            // Reversed so the first child is popped first
            self.stack
                .extend(block.children.iter().rev().map(|&c| (c, child_enabled)));
        }
    }
}

impl<'a> Iterator for Descendants<'a> {
    type Item = (NodeId, &'a Node, bool);

    fn next(&mut self) -> Option<Self::Item> {
        while let Some((id, enabled)) = self.stack.pop() {
            let tree = self.tree;
            let Some(node) = tree.slot(id) else {
                continue;
            };
            self.push_children(node, enabled);
            return Some((id, node, enabled));
        }
        None
    }
}

impl Tree {
    /// Walk every descendant of block `id` in document order.
    ///
    /// With `exclude` set, disabled nodes are skipped along with everything
    /// beneath them.
    pub fn descendants(&self, id: NodeId, exclude: bool) -> Result<Descendants<'_>> {
        let node = self.get(id)?;
        if node.as_block().is_none() {
            return Err(Error::NotABlock(id));
        }
        let mut walk = Descendants {
            tree: self,
            stack: Vec::new(),
            exclude,
        };
        let enabled = self.is_enabled(id)?;
        walk.push_children(node, enabled);
        Ok(walk)
    }

    /// All descendant blocks named `name` (case-insensitive)
    pub fn find_blocks(&self, id: NodeId, name: &str, exclude: bool) -> Result<Vec<NodeId>> {
        Ok(self
            .descendants(id, exclude)?
            .filter(|(_, node, _)| node.as_block().is_some() && node.is_named(name))
            .map(|(id, _, _)| id)
            .collect())
    }

    /// All descendant directives named `name` (case-insensitive), duplicates kept
    pub fn find_directives(&self, id: NodeId, name: &str, exclude: bool) -> Result<Vec<NodeId>> {
        Ok(self
            .descendants(id, exclude)?
            .filter(|(_, node, _)| node.as_directive().is_some() && node.is_named(name))
            .map(|(id, _, _)| id)
            .collect())
    }

    /// Descendant comments containing `text`, or equal to it when `exact`.
    ///
    /// Comments are searched regardless of conditional context.
    pub fn find_comments(&self, id: NodeId, text: &str, exact: bool) -> Result<Vec<NodeId>> {
        Ok(self
            .descendants(id, false)?
            .filter(|(_, node, _)| match node.as_comment() {
                Some(c) if exact => c.text == text,
                Some(c) => c.text.contains(text),
                None => false,
            })
            .map(|(id, _, _)| id)
            .collect())
    }
}
