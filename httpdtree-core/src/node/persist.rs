//! Storage adapter boundary
//!
//! The tree never touches the filesystem itself. [`Tree::save`] works out
//! which files hold pending edits and hands each one to a [`Persistence`]
//! implementation, clearing dirty flags only once every write succeeded.

use super::{Node, NodeId, Tree};
use crate::error::{PersistError, Result};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

/// Writes the current state of one file back to storage
pub trait Persistence {
    /// Persist every node of `tree` belonging to `path`.
    ///
    /// `message` is a human-readable annotation of the change.
    fn persist(&mut self, tree: &Tree, path: &Path, message: &str) -> std::result::Result<(), PersistError>;
}

impl Tree {
    /// Flush every dirty node under `id` (inclusive) through `adapter`.
    ///
    /// Nothing is marked clean unless every affected file was written, so a
    /// failed save can simply be retried.
    pub fn save<P: Persistence + ?Sized>(
        &mut self,
        id: NodeId,
        message: &str,
        adapter: &mut P,
    ) -> Result<()> {
        let files = self.pending_files(id)?;
        if files.is_empty() {
            tracing::debug!(node = %id, "nothing to save");
            return Ok(());
        }

        for path in &files {
            adapter.persist(self, path, message)?;
            tracing::debug!(path = %path.display(), "persisted");
        }

        self.mark_clean(id)?;
        Ok(())
    }

    /// Files with unsaved changes reachable from `id`, sorted
    pub fn unsaved_files(&self, id: NodeId) -> Result<Vec<PathBuf>> {
        Ok(self.pending_files(id)?.into_iter().collect())
    }

    /// Top-level nodes that make up the content of `path`, in document order
    pub fn file_roots(&self, path: &Path) -> Vec<NodeId> {
        let Ok(children) = self.children(self.root) else {
            return Vec::new();
        };
        children
            .iter()
            .copied()
            .filter(|&c| self.slot(c).and_then(Node::file) == Some(path))
            .collect()
    }

    /// Clear dirty state for `id` and everything under it.
    ///
    /// Storage adapters call this after loading a freshly parsed tree.
    pub fn mark_clean(&mut self, id: NodeId) -> Result<()> {
        let ids = self.subtree(id)?;
        for id in ids {
            let node = self.get_mut(id)?;
            node.dirty = false;
            node.detached.clear();
        }
        Ok(())
    }

    fn subtree(&self, id: NodeId) -> Result<Vec<NodeId>> {
        let mut ids = vec![id];
        if self.get(id)?.as_block().is_some() {
            ids.extend(self.descendants(id, false)?.map(|(id, _, _)| id));
        }
        Ok(ids)
    }

    fn pending_files(&self, id: NodeId) -> Result<BTreeSet<PathBuf>> {
        let mut files = BTreeSet::new();
        for id in self.subtree(id)? {
            let node = self.get(id)?;
            if !node.dirty {
                continue;
            }
            files.extend(node.detached.iter().cloned());
            match &node.file {
                Some(file) => {
                    files.insert(file.clone());
                }
                // The anonymous root only stands for the files it lost;
                // added children carry their own.
                None if node.ancestor.is_none() => {}
                None => return Err(PersistError::Unbacked(id).into()),
            }
        }
        Ok(files)
    }
}

/// In-memory adapter used by unit tests
#[cfg(test)]
#[derive(Debug, Default)]
pub(crate) struct MemoryStore {
    pub writes: Vec<(PathBuf, String)>,
    pub fail: bool,
}

#[cfg(test)]
impl Persistence for MemoryStore {
    fn persist(&mut self, _tree: &Tree, path: &Path, message: &str) -> std::result::Result<(), PersistError> {
        if self.fail {
            return Err(PersistError::Rejected {
                path: path.to_path_buf(),
                message: "store is read-only".to_string(),
            });
        }
        self.writes.push((path.to_path_buf(), message.to_string()));
        Ok(())
    }
}
