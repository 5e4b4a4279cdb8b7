//! A single timed span in an iteration's event tree.

use iterscope_common::{EventFlags, IterationKind};
use serde::{Deserialize, Serialize};

use crate::domain::NodeIndex;

/// Sentinel for timestamps that have not been set yet.
pub const UNSET_TIME: f64 = -1.0;

/// One timed span.
///
/// `children` is a cache derived from `parent` links and is never persisted;
/// [`super::EventTree::rebuild_hierarchy`] restores it after loading.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventNode {
    index: NodeIndex,
    parent: Option<NodeIndex>,
    identifier: String,
    kind: IterationKind,
    start_time: f64,
    finish_time: f64,
    flags: EventFlags,
    #[serde(default)]
    metadata: Option<String>,
    #[serde(skip)]
    pub(crate) children: Vec<NodeIndex>,
}

impl EventNode {
    /// A span opened from a lifecycle notification; timestamps are pending.
    pub(crate) fn open(
        index: NodeIndex,
        kind: IterationKind,
        identifier: String,
        metadata: Option<String>,
    ) -> Self {
        Self {
            index,
            parent: None,
            identifier,
            kind,
            start_time: UNSET_TIME,
            finish_time: UNSET_TIME,
            flags: EventFlags::NONE,
            metadata,
            children: Vec::new(),
        }
    }

    /// A fully-formed span imported from sampled data.
    pub(crate) fn imported(
        index: NodeIndex,
        identifier: String,
        metadata: Option<String>,
        start_time: f64,
        finish_time: f64,
        flags: EventFlags,
    ) -> Self {
        Self {
            index,
            parent: None,
            identifier,
            kind: IterationKind::None,
            start_time,
            finish_time,
            flags,
            metadata,
            children: Vec::new(),
        }
    }

    #[must_use]
    pub fn index(&self) -> NodeIndex {
        self.index
    }

    #[must_use]
    pub fn parent(&self) -> Option<NodeIndex> {
        self.parent
    }

    pub(crate) fn set_parent(&mut self, parent: NodeIndex) {
        self.parent = Some(parent);
    }

    #[must_use]
    pub fn is_root(&self) -> bool {
        self.parent.is_none()
    }

    #[must_use]
    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    #[must_use]
    pub fn kind(&self) -> IterationKind {
        self.kind
    }

    #[must_use]
    pub fn start_time(&self) -> f64 {
        self.start_time
    }

    #[must_use]
    pub fn finish_time(&self) -> f64 {
        self.finish_time
    }

    #[must_use]
    pub fn flags(&self) -> EventFlags {
        self.flags
    }

    pub(crate) fn add_flags(&mut self, flags: EventFlags) {
        self.flags |= flags;
    }

    /// Free-form details, empty when the span carries none.
    #[must_use]
    pub fn details(&self) -> &str {
        self.metadata.as_deref().unwrap_or("")
    }

    #[must_use]
    pub fn children(&self) -> &[NodeIndex] {
        &self.children
    }

    #[must_use]
    pub fn has_children(&self) -> bool {
        !self.children.is_empty()
    }

    /// `finish - start`. Non-positive while the span is still open.
    #[must_use]
    pub fn duration(&self) -> f64 {
        self.finish_time - self.start_time
    }

    /// True once a start time has been recorded and the span is not closed.
    #[must_use]
    pub fn is_open(&self) -> bool {
        self.start_time > 0.0 && self.finish_time < self.start_time
    }

    /// `"{kind}: {identifier}"`, or just the identifier when the kind is
    /// absent or spelled the same.
    #[must_use]
    pub fn display_name(&self) -> String {
        if self.kind.is_none() || self.kind.as_str() == self.identifier {
            return self.identifier.clone();
        }
        format!("{}: {}", self.kind, self.identifier)
    }

    /// Record the start of a lifecycle span. The finish stays unset.
    pub fn set_start_time(&mut self, now: f64) {
        self.start_time = now;
        self.finish_time = UNSET_TIME;
    }

    /// Close the span at `now`. No-op unless the span is open.
    pub fn finish(&mut self, now: f64) {
        if self.is_open() {
            self.finish_time = now.max(self.start_time);
        }
    }

    pub(crate) fn set_window(&mut self, start_time: f64, finish_time: f64) {
        self.start_time = start_time;
        self.finish_time = finish_time;
    }
}
