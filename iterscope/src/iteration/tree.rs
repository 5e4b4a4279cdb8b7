//! Per-iteration event tree.
//!
//! Nodes live in an append-only store; a node's index is its position in the
//! store. Parent links are the source of truth, child lists are a cache that
//! [`EventTree::rebuild_hierarchy`] can recompute at any time.
//!
//! Lookups by identifier go through a best-effort index first and fall back to
//! a reverse linear scan. The index is not persisted, so a tree loaded from disk
//! (or one whose index was dropped with [`EventTree::forget_lookup`]) answers
//! every lookup through the scan.

use iterscope_common::{EventFlags, IterationKind};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::node::EventNode;
use crate::domain::{IterationIndex, NodeIndex, TreeError};

/// How an operation names the span it targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpanTarget<'a> {
    /// Most recent span with this identifier.
    Identifier(&'a str),
    /// Most recent span whose identifier is the kind's textual name.
    Kind(IterationKind),
    /// A specific node.
    Node(NodeIndex),
}

impl<'a> From<&'a str> for SpanTarget<'a> {
    fn from(identifier: &'a str) -> Self {
        SpanTarget::Identifier(identifier)
    }
}

impl From<IterationKind> for SpanTarget<'_> {
    fn from(kind: IterationKind) -> Self {
        SpanTarget::Kind(kind)
    }
}

impl From<NodeIndex> for SpanTarget<'_> {
    fn from(index: NodeIndex) -> Self {
        SpanTarget::Node(index)
    }
}

impl std::fmt::Display for SpanTarget<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SpanTarget::Identifier(identifier) => write!(f, "identifier '{identifier}'"),
            SpanTarget::Kind(kind) => write!(f, "kind {kind}"),
            SpanTarget::Node(index) => write!(f, "{index}"),
        }
    }
}

/// Event tree for one iteration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventTree {
    iteration: IterationIndex,
    kind: IterationKind,
    nodes: Vec<EventNode>,
    #[serde(skip)]
    lookup: HashMap<String, NodeIndex>,
}

impl EventTree {
    #[must_use]
    pub fn new(iteration: IterationIndex, kind: IterationKind) -> Self {
        Self { iteration, kind, nodes: Vec::new(), lookup: HashMap::new() }
    }

    #[must_use]
    pub fn iteration(&self) -> IterationIndex {
        self.iteration
    }

    #[must_use]
    pub fn kind(&self) -> IterationKind {
        self.kind
    }

    /// Kind of the most recently appended node, `None` for an empty tree.
    #[must_use]
    pub fn last_kind(&self) -> IterationKind {
        self.nodes.last().map_or(IterationKind::None, EventNode::kind)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    #[must_use]
    pub fn nodes(&self) -> &[EventNode] {
        &self.nodes
    }

    /// # Panics
    ///
    /// Panics if `index` is outside the node store.
    #[must_use]
    pub fn node(&self, index: NodeIndex) -> &EventNode {
        &self.nodes[index.0]
    }

    /// # Panics
    ///
    /// Panics if `index` is outside the node store.
    pub fn node_mut(&mut self, index: NodeIndex) -> &mut EventNode {
        &mut self.nodes[index.0]
    }

    #[must_use]
    pub fn get(&self, index: NodeIndex) -> Option<&EventNode> {
        self.nodes.get(index.0)
    }

    /// Root-level nodes in store order.
    pub fn roots(&self) -> impl Iterator<Item = &EventNode> + '_ {
        self.nodes.iter().filter(|node| node.is_root())
    }

    /// Children of `index` in sibling order.
    pub fn children_of(&self, index: NodeIndex) -> impl Iterator<Item = &EventNode> + '_ {
        self.node(index).children().iter().map(move |&child| self.node(child))
    }

    /// Sum of the positive durations of the root-level nodes.
    ///
    /// Percentages in every report are relative to this value.
    #[must_use]
    pub fn total_root_duration(&self) -> f64 {
        self.roots().map(EventNode::duration).filter(|duration| *duration > 0.0).sum()
    }

    /// Append a new open span and make it the lookup target for its identifier.
    ///
    /// When `identifier` is omitted it is derived from the kind's name.
    pub fn start_span(
        &mut self,
        kind: IterationKind,
        identifier: Option<&str>,
        metadata: Option<String>,
    ) -> NodeIndex {
        let index = NodeIndex(self.nodes.len());
        let identifier = identifier.map_or_else(|| kind.as_str().to_string(), str::to_string);

        self.lookup.insert(identifier.clone(), index);
        self.nodes.push(EventNode::open(index, kind, identifier, metadata));
        index
    }

    /// Close the most recent span matching `target` at `now`.
    ///
    /// Does nothing when no span matches or the span is not open.
    pub fn finish_span<'a>(&mut self, target: impl Into<SpanTarget<'a>>, now: f64) {
        if let Some(index) = self.find_last(target) {
            self.nodes[index.0].finish(now);
        }
    }

    /// Resolve a target to a node: lookup index first, reverse scan second.
    #[must_use]
    pub fn find_last<'a>(&self, target: impl Into<SpanTarget<'a>>) -> Option<NodeIndex> {
        match target.into() {
            SpanTarget::Node(index) => (index.0 < self.nodes.len()).then_some(index),
            SpanTarget::Identifier(identifier) => self.find_last_by_identifier(identifier),
            SpanTarget::Kind(kind) => self.find_last_by_identifier(kind.as_str()),
        }
    }

    fn find_last_by_identifier(&self, identifier: &str) -> Option<NodeIndex> {
        if let Some(&index) = self.lookup.get(identifier) {
            return Some(index);
        }

        self.nodes.iter().rev().find(|node| node.identifier() == identifier).map(EventNode::index)
    }

    /// Drop the identifier index; lookups fall back to the linear scan.
    pub fn forget_lookup(&mut self) {
        self.lookup.clear();
    }

    /// Nest `child` under the span resolved from `parent`.
    ///
    /// # Errors
    ///
    /// Returns [`TreeError`] when either side cannot be resolved.
    ///
    /// # Panics
    ///
    /// Panics if the resolved parent was created after the child.
    pub fn set_parent<'a>(
        &mut self,
        child: NodeIndex,
        parent: impl Into<SpanTarget<'a>>,
    ) -> Result<(), TreeError> {
        let target = parent.into();
        if child.0 >= self.nodes.len() {
            return Err(TreeError::NodeOutOfRange { index: child.0, len: self.nodes.len() });
        }
        let parent = self.find_last(target).ok_or_else(|| TreeError::MissingNode(target.to_string()))?;
        self.link(child, parent);
        Ok(())
    }

    fn link(&mut self, child: NodeIndex, parent: NodeIndex) {
        assert!(parent < child, "parent {parent} must precede child {child}");

        if let Some(previous) = self.nodes[child.0].parent() {
            self.nodes[previous.0].children.retain(|&index| index != child);
        }
        self.nodes[child.0].set_parent(parent);
        self.nodes[parent.0].children.push(child);
    }

    /// Append a fully-formed span and link it under `parent`.
    ///
    /// # Panics
    ///
    /// Panics if `parent` is outside the node store.
    pub fn import_subtree(
        &mut self,
        parent: NodeIndex,
        identifier: impl Into<String>,
        metadata: Option<String>,
        start_time: f64,
        finish_time: f64,
        flags: EventFlags,
    ) -> NodeIndex {
        assert!(parent.0 < self.nodes.len(), "parent {parent} outside node store");

        let index = NodeIndex(self.nodes.len());
        self.nodes.push(EventNode::imported(
            index,
            identifier.into(),
            metadata,
            start_time,
            finish_time,
            flags,
        ));
        self.link(index, parent);
        index
    }

    /// Recompute every child list from parent links, in store order.
    ///
    /// # Panics
    ///
    /// Panics if a node references a parent outside the store.
    pub fn rebuild_hierarchy(&mut self) {
        for node in &mut self.nodes {
            node.children.clear();
        }

        for position in 0..self.nodes.len() {
            if let Some(parent) = self.nodes[position].parent() {
                assert!(
                    parent.0 < self.nodes.len(),
                    "node {position} references parent {parent} outside the store"
                );
                self.nodes[parent.0].children.push(NodeIndex(position));
            }
        }
    }

    /// Set a span's window to the min start / max finish of its children.
    ///
    /// Leaves childless spans untouched.
    pub fn set_window_from_children(&mut self, index: NodeIndex) {
        let children = self.node(index).children();
        let Some((&first, rest)) = children.split_first() else {
            return;
        };

        let mut start = self.node(first).start_time();
        let mut finish = self.node(first).finish_time();
        for &child in rest {
            start = start.min(self.node(child).start_time());
            finish = finish.max(self.node(child).finish_time());
        }
        self.nodes[index.0].set_window(start, finish);
    }

    /// Structural pass marking chains of single-child spans with
    /// [`EventFlags::FLATTEN`].
    ///
    /// A span is flagged when `flatten` is set (it is the only child of its
    /// parent) and it has exactly one child itself. Children are visited with
    /// `flatten` equal to "my parent has exactly one child".
    pub fn post_process(&mut self, index: NodeIndex, flatten: bool) {
        let children = self.node(index).children().to_vec();
        if children.is_empty() {
            return;
        }

        if flatten && children.len() == 1 {
            self.nodes[index.0].add_flags(EventFlags::FLATTEN);
        }

        let single = children.len() == 1;
        for child in children {
            self.post_process(child, single);
        }
    }

    /// Pre-order traversal from every root, in sibling order.
    #[must_use]
    pub fn preorder(&self) -> Vec<NodeIndex> {
        let mut order = Vec::with_capacity(self.nodes.len());
        let mut stack: Vec<NodeIndex> = self.roots().map(EventNode::index).collect();
        stack.reverse();

        while let Some(index) = stack.pop() {
            order.push(index);
            stack.extend(self.node(index).children().iter().rev());
        }
        order
    }
}
