//! Renders tree nodes back to Apache syntax
//!
//! Nodes that still carry their source text are written back unchanged.
//! New or edited nodes are rendered and indented like their siblings.

use httpdtree_core::{NodeId, NodeKind, Result, Tree};
use std::path::Path;

const INDENT: &str = "    ";

/// Render every top-level node belonging to `path`
pub fn render_file(tree: &Tree, path: &Path) -> Result<String> {
    let mut out = String::new();
    for id in tree.file_roots(path) {
        render_node(tree, id, 0, &mut out)?;
    }
    Ok(out)
}

/// Render the children of block `id`, e.g. a whole in-memory tree from its root
pub fn render_children(tree: &Tree, id: NodeId) -> Result<String> {
    let mut out = String::new();
    for &child in tree.children(id)? {
        render_node(tree, child, 0, &mut out)?;
    }
    Ok(out)
}

/// Render one node and everything below it.
///
/// `depth` sets the indentation of rendered lines when no sibling shows how
/// the surrounding text is indented.
pub fn render_node(tree: &Tree, id: NodeId, depth: usize, out: &mut String) -> Result<()> {
    emit(tree, id, &INDENT.repeat(depth), out)
}

fn emit(tree: &Tree, id: NodeId, fallback: &str, out: &mut String) -> Result<()> {
    let node = tree.get(id)?;
    let verbatim = node.verbatim();
    let indent = match verbatim {
        Some(v) => v.indent().to_string(),
        None => sibling_indent(tree, id)?.unwrap_or_else(|| fallback.to_string()),
    };

    end_line(out);
    out.push_str(verbatim.map_or(indent.as_str(), |v| v.leading.as_str()));
    match verbatim.and_then(|v| v.text.as_deref()) {
        Some(text) => out.push_str(text),
        None => {
            out.push_str(&head(node.kind()));
            out.push('\n');
        }
    }

    if let NodeKind::Block(block) = node.kind() {
        let inner = format!("{}{}", indent, INDENT);
        for &child in block.children() {
            emit(tree, child, &inner, out)?;
        }
        end_line(out);
        match verbatim.and_then(|v| v.close.as_deref()) {
            Some(close) => out.push_str(close),
            None => {
                out.push_str(&indent);
                out.push_str("</");
                out.push_str(&block.name);
                out.push_str(">\n");
            }
        }
    }

    if let Some(v) = verbatim {
        out.push_str(&v.trailing);
    }
    Ok(())
}

/// Indentation used by the first sibling that kept its source text
fn sibling_indent(tree: &Tree, id: NodeId) -> Result<Option<String>> {
    let Some(parent) = tree.ancestor(id)? else {
        return Ok(None);
    };
    for &sibling in tree.children(parent)? {
        if let Some(v) = tree.get(sibling)?.verbatim() {
            return Ok(Some(v.indent().to_string()));
        }
    }
    Ok(None)
}

/// Source may end without a final newline
fn end_line(out: &mut String) {
    if !out.is_empty() && !out.ends_with('\n') {
        out.push('\n');
    }
}

/// The single line of a comment or directive, or the opening line of a block
fn head(kind: &NodeKind) -> String {
    match kind {
        NodeKind::Comment(comment) if comment.text.is_empty() => "#".to_string(),
        NodeKind::Comment(comment) => format!("# {}", comment.text),
        NodeKind::Directive(directive) => line(&directive.name, &directive.parameters),
        NodeKind::Block(block) => format!("<{}>", line(&block.name, &block.parameters)),
    }
}

fn line(name: &str, parameters: &[String]) -> String {
    let mut text = name.to_string();
    for param in parameters {
        text.push(' ');
        text.push_str(&quote(param));
    }
    text
}

/// Quote an argument when it would not survive as a bare word
pub fn quote(arg: &str) -> String {
    let bare = !arg.is_empty()
        && !arg.starts_with('#')
        && !arg.starts_with('\'')
        && !arg.ends_with('\\')
        && !arg.contains(|c: char| c.is_whitespace() || c == '"' || c == '>');
    if bare {
        return arg.to_string();
    }
    let mut quoted = String::with_capacity(arg.len() + 2);
    quoted.push('"');
    for c in arg.chars() {
        if c == '"' || c == '\\' {
            quoted.push('\\');
        }
        quoted.push(c);
    }
    quoted.push('"');
    quoted
}
