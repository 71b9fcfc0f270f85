//! File-backed storage adapter

use crate::parser::{parse, Statement, StatementKind};
use crate::render::render_file;
use httpdtree_core::{NodeId, NodeKind, PersistError, Persistence, Tree};
use std::io::Write;
use std::path::{Path, PathBuf};

/// Writes changed configuration files back to disk.
///
/// Each file is rendered from the tree and parsed again. The file is only
/// replaced, atomically, when the parsed result matches the tree node for
/// node.
#[derive(Debug, Default)]
pub struct FileStore {
    history: Vec<(PathBuf, String)>,
}

impl FileStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Files written so far with the message of the save that wrote them
    pub fn history(&self) -> &[(PathBuf, String)] {
        &self.history
    }

    fn write_atomic(path: &Path, content: &str) -> std::io::Result<()> {
        let dir = path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
        tmp.write_all(content.as_bytes())?;
        tmp.as_file().sync_all()?;
        tmp.persist(path).map_err(|e| e.error)?;
        Ok(())
    }
}

impl Persistence for FileStore {
    fn persist(&mut self, tree: &Tree, path: &Path, message: &str) -> Result<(), PersistError> {
        let content = render_file(tree, path).map_err(|e| PersistError::Rejected {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;

        let statements = parse(&content).map_err(|e| PersistError::Syntax {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        let roots = tree.file_roots(path);
        let diverged = first_mismatch(tree, tree.root(), &roots, &statements).map_err(|e| {
            PersistError::Rejected {
                path: path.to_path_buf(),
                message: e.to_string(),
            }
        })?;
        if let Some(id) = diverged {
            return Err(PersistError::Syntax {
                path: path.to_path_buf(),
                message: format!("node {} would not read back as written", id),
            });
        }

        Self::write_atomic(path, &content).map_err(|source| PersistError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        tracing::info!(path = %path.display(), "{}", message);
        self.history.push((path.to_path_buf(), message.to_string()));
        Ok(())
    }
}

/// First node under `parent` whose re-parsed form differs from the tree.
///
/// A different statement count is reported against `parent`.
fn first_mismatch(
    tree: &Tree,
    parent: NodeId,
    ids: &[NodeId],
    statements: &[Statement],
) -> httpdtree_core::Result<Option<NodeId>> {
    if ids.len() != statements.len() {
        return Ok(Some(parent));
    }
    for (&id, statement) in ids.iter().zip(statements) {
        let same = match (tree.get(id)?.kind(), &statement.kind) {
            (NodeKind::Comment(comment), StatementKind::Comment(text)) => {
                comment.text.trim() == text.as_str()
            }
            (NodeKind::Directive(directive), StatementKind::Directive { name, args }) => {
                directive.name == *name && directive.parameters == *args
            }
            (NodeKind::Block(block), StatementKind::Block { name, args, body }) => {
                if block.name != *name || block.parameters != *args {
                    false
                } else if let Some(inner) = first_mismatch(tree, id, block.children(), body)? {
                    return Ok(Some(inner));
                } else {
                    true
                }
            }
            _ => false,
        };
        if !same {
            return Ok(Some(id));
        }
    }
    Ok(None)
}
