//! Structural edits on the tree
//!
//! Each edit marks exactly the nodes it touches as dirty: the block gaining
//! or losing a child, the new child itself, or the node whose parameters
//! were replaced.

use super::{Block, Comment, Directive, Node, NodeId, NodeKind, Tree};
use crate::error::{Error, Result};

impl Tree {
    /// Insert a new block under `parent`.
    ///
    /// `position` is clamped to the number of children; `None` appends.
    pub fn add_child_block<I, S>(
        &mut self,
        parent: NodeId,
        name: impl Into<String>,
        parameters: I,
        position: Option<usize>,
    ) -> Result<NodeId>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let kind = NodeKind::Block(Block {
            name: name.into(),
            parameters: parameters.into_iter().map(Into::into).collect(),
            children: Vec::new(),
        });
        self.insert_child(parent, kind, position)
    }

    /// Insert a new directive under `parent`.
    pub fn add_child_directive<I, S>(
        &mut self,
        parent: NodeId,
        name: impl Into<String>,
        parameters: I,
        position: Option<usize>,
    ) -> Result<NodeId>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let kind = NodeKind::Directive(Directive {
            name: name.into(),
            parameters: parameters.into_iter().map(Into::into).collect(),
        });
        self.insert_child(parent, kind, position)
    }

    /// Insert a new comment under `parent`.
    pub fn add_child_comment(
        &mut self,
        parent: NodeId,
        text: impl Into<String>,
        position: Option<usize>,
    ) -> Result<NodeId> {
        let kind = NodeKind::Comment(Comment { text: text.into() });
        self.insert_child(parent, kind, position)
    }

    fn insert_child(
        &mut self,
        parent: NodeId,
        kind: NodeKind,
        position: Option<usize>,
    ) -> Result<NodeId> {
        let file = self.get(parent)?.file.clone();
        self.block(parent)?;

        let mut node = Node::new(kind, Some(parent), file);
        node.dirty = true;
        let id = self.alloc(node);

        let parent_node = self.get_mut(parent)?;
        parent_node.dirty = true;
        if let NodeKind::Block(block) = &mut parent_node.kind {
            let at = position.map_or(block.children.len(), |p| p.min(block.children.len()));
            block.children.insert(at, id);
            tracing::debug!(parent = %parent, child = %id, at, "inserted child");
        }
        Ok(id)
    }

    /// Remove `child` from `parent` and free its whole subtree.
    ///
    /// The removed ids go stale immediately.
    pub fn delete_child(&mut self, parent: NodeId, child: NodeId) -> Result<()> {
        let position = self
            .children(parent)?
            .iter()
            .position(|&c| c == child)
            .ok_or(Error::NotAChild { parent, child })?;

        let removed = self.get(child)?;
        let file = removed.file.clone();
        let mut doomed = vec![child];
        if removed.as_block().is_some() {
            doomed.extend(self.descendants(child, false)?.map(|(id, _, _)| id));
        }

        let parent_node = self.get_mut(parent)?;
        parent_node.dirty = true;
        if let Some(file) = file {
            parent_node.detached.insert(file);
        }
        if let NodeKind::Block(block) = &mut parent_node.kind {
            block.children.remove(position);
        }

        for id in doomed {
            self.release(id);
        }
        tracing::debug!(parent = %parent, child = %child, "deleted child");
        Ok(())
    }

    /// Replace the parameter list of a directive or block wholesale.
    pub fn set_parameters<I, S>(&mut self, id: NodeId, parameters: I) -> Result<()>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let node = self.get_mut(id)?;
        let slot = match &mut node.kind {
            NodeKind::Directive(d) => &mut d.parameters,
            NodeKind::Block(b) => &mut b.parameters,
            NodeKind::Comment(_) => return Err(Error::NoParameters(id)),
        };
        *slot = parameters.into_iter().map(Into::into).collect();
        if let Some(verbatim) = &mut node.verbatim {
            verbatim.text = None;
        }
        node.dirty = true;
        Ok(())
    }
}
