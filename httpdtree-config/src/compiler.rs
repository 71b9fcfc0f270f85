//! Attaches parsed statements to a configuration tree
//!
//! Converts the syntax tree into [`httpdtree_core::Tree`] nodes, tags the
//! top-level nodes with their file and records the evaluation of
//! conditional blocks.

use crate::parser::{Statement, StatementKind, conditions};
use httpdtree_core::{NodeId, ParserConfig, Tree};
use std::path::Path;

/// Compile error
#[derive(Debug, thiserror::Error)]
pub enum CompileError {
    #[error("Tree error: {0}")]
    Tree(#[from] httpdtree_core::Error),
}

/// Append `statements` under `parent`.
///
/// Nodes added directly under the tree root are attached to `file`; deeper
/// nodes inherit it from their block. The new nodes stay dirty; callers
/// loading existing content mark them clean afterwards.
pub fn compile_into(
    tree: &mut Tree,
    parent: NodeId,
    statements: &[Statement],
    file: Option<&Path>,
    config: &ParserConfig,
) -> Result<(), CompileError> {
    for statement in statements {
        let id = match &statement.kind {
            StatementKind::Comment(text) => tree.add_child_comment(parent, text.as_str(), None)?,
            StatementKind::Directive { name, args } => {
                tree.add_child_directive(parent, name.as_str(), args, None)?
            }
            StatementKind::Block { name, args, .. } => {
                tree.add_child_block(parent, name.as_str(), args, None)?
            }
        };

        if statement.verbatim.text.is_some() {
            tree.set_verbatim(id, statement.verbatim.clone())?;
        }

        if let Some(file) = file {
            if parent == tree.root() {
                tree.set_file(id, file)?;
            }
        }

        if let StatementKind::Block { name, args, body } = &statement.kind {
            let active = conditions::evaluate(name, args, config);
            if !active {
                tracing::debug!(block = %name, line = statement.span.line, "conditional block inactive");
            }
            tree.set_condition(id, active)?;
            compile_into(tree, id, body, file, config)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse;

    #[test]
    fn test_compile_structure() {
        let source = "
<IfModule mod_ssl.c>
    <VirtualHost *:443>
        ServerName secure.example
    </VirtualHost>
</IfModule>
# trailing
";
        let statements = parse(source).unwrap();
        let mut tree = Tree::new();
        let root = tree.root();
        compile_into(
            &mut tree,
            root,
            &statements,
            Some(Path::new("/etc/apache2/ssl.conf")),
            &ParserConfig::default(),
        )
        .unwrap();

        let children = tree.children(root).unwrap().to_vec();
        assert_eq!(children.len(), 2);
        let cond = children[0];
        assert!(!tree.get(cond).unwrap().condition());

        // mod_ssl is not loaded, so the vhost is disabled
        assert!(tree.find_blocks(root, "VirtualHost", true).unwrap().is_empty());
        let vhosts = tree.find_blocks(root, "VirtualHost", false).unwrap();
        assert_eq!(vhosts.len(), 1);
        assert_eq!(
            tree.get(vhosts[0]).unwrap().file(),
            Some(Path::new("/etc/apache2/ssl.conf"))
        );
        assert_eq!(tree.find_comments(root, "trailing", true).unwrap(), vec![children[1]]);
    }
}
