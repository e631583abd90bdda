//! Tree-to-text backends.
//!
//! Both backends implement [`Visitor`] and share one fold: a node renders
//! as its `text`, then each child's rendering followed by that child's
//! `tail`. A visitor may take over a whole subtree by returning
//! [`Visit::Emit`]; the skipped node's tail is still rendered by its parent.

pub mod html;
pub mod latex;

use mdt::Node;

/// What to do with a node on entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Visit {
    /// Render the content, then hand it to [`Visitor::leave`].
    Descend,
    /// Use this text for the node and skip its content.
    Emit(String),
}

pub trait Visitor {
    fn enter(&mut self, node: &Node) -> Visit;

    /// Render a run of inline text (a node's text or a child's tail).
    fn text(&mut self, text: &str) -> String;

    /// Wrap the rendered content of `node`.
    fn leave(&mut self, node: &Node, content: String) -> String;
}

/// Render `node` and its subtree.
pub fn render<V: Visitor + ?Sized>(visitor: &mut V, node: &Node) -> String {
    match visitor.enter(node) {
        Visit::Emit(out) => out,
        Visit::Descend => {
            let content = render_content(visitor, node);
            visitor.leave(node, content)
        }
    }
}

/// Render the content of `node` (text, children and their tails) without
/// the node's own wrapping.
pub fn render_content<V: Visitor + ?Sized>(visitor: &mut V, node: &Node) -> String {
    let mut out = visitor.text(&node.text);
    for child in &node.children {
        out.push_str(&render(visitor, child));
        out.push_str(&visitor.text(&child.tail));
    }
    out
}
