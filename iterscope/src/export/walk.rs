//! Shared recursive walk and text helpers for reporters.
//!
//! Trees are walked in store order: iterations in registry order, roots in
//! store order, children in insertion order, pre-order. Root spans are at
//! depth 1.

use crate::iteration::{EventNode, EventTree, IterationRegistry};

/// Per-node callbacks driven by [`walk_registry`].
pub trait NodeVisitor {
    /// Called before an iteration's roots are visited.
    fn enter_iteration(&mut self, _tree: &EventTree, _out: &mut String) {}

    /// Called for every span, parents before children.
    fn enter_node(&mut self, tree: &EventTree, node: &EventNode, depth: usize, out: &mut String);

    /// Called after a span's children have been visited.
    fn leave_node(
        &mut self,
        _tree: &EventTree,
        _node: &EventNode,
        _depth: usize,
        _out: &mut String,
    ) {
    }

    fn leave_iteration(&mut self, _tree: &EventTree, _out: &mut String) {}
}

pub fn walk_registry<V: NodeVisitor>(
    registry: &IterationRegistry,
    visitor: &mut V,
    out: &mut String,
) {
    for tree in registry.trees() {
        walk_tree(tree, visitor, out);
    }
}

pub fn walk_tree<V: NodeVisitor>(tree: &EventTree, visitor: &mut V, out: &mut String) {
    visitor.enter_iteration(tree, out);
    for root in tree.roots() {
        walk_node(tree, root, 1, visitor, out);
    }
    visitor.leave_iteration(tree, out);
}

fn walk_node<V: NodeVisitor>(
    tree: &EventTree,
    node: &EventNode,
    depth: usize,
    visitor: &mut V,
    out: &mut String,
) {
    visitor.enter_node(tree, node, depth, out);
    for child in tree.children_of(node.index()) {
        walk_node(tree, child, depth + 1, visitor, out);
    }
    visitor.leave_node(tree, node, depth, out);
}

/// Marker written by every reporter for an empty registry.
pub const NO_DATA: &str = "ERROR: No data to export!";

#[must_use]
pub fn indentation(depth: usize) -> String {
    "\t".repeat(depth)
}

/// `12.500 ms`
#[must_use]
pub fn format_time(ms: f64) -> String {
    format!("{ms:.3} ms")
}

/// `42.00%`
#[must_use]
pub fn format_percentage(percentage: f64) -> String {
    format!("{percentage:.2}%")
}

/// Share of `total` in percent; 0 for a non-positive total.
#[must_use]
pub fn percentage_of(duration: f64, total: f64) -> f64 {
    if total > 0.0 {
        duration / total * 100.0
    } else {
        0.0
    }
}

#[must_use]
pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            _ => escaped.push(c),
        }
    }
    escaped
}
