//! Ordered list of iteration trees.
//!
//! The registry owns tree lifecycle and a single update sink that consumers
//! (a tree view, a report preview) install to learn about mutation batches.

use iterscope_common::IterationKind;
use log::debug;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

use super::tree::EventTree;
use crate::domain::{IterationIndex, SessionError};

/// Callback fired after each mutation batch.
pub type UpdateSink = Box<dyn FnMut(&IterationRegistry) + Send>;

#[derive(Default, Serialize, Deserialize)]
pub struct IterationRegistry {
    trees: Vec<EventTree>,
    kinds: Vec<IterationKind>,
    #[serde(skip)]
    updated: Option<UpdateSink>,
}

impl fmt::Debug for IterationRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IterationRegistry")
            .field("trees", &self.trees)
            .field("kinds", &self.kinds)
            .field("has_update_sink", &self.updated.is_some())
            .finish()
    }
}

impl IterationRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Install the update sink, replacing any previous one.
    pub fn set_update_sink(&mut self, sink: UpdateSink) {
        self.updated = Some(sink);
    }

    /// Remove the update sink.
    pub fn clear_update_sink(&mut self) -> Option<UpdateSink> {
        self.updated.take()
    }

    /// Fire the update sink once.
    pub fn notify_updated(&mut self) {
        if let Some(mut sink) = self.updated.take() {
            sink(self);
            // The sink cannot replace itself since it only sees `&Self`.
            self.updated = Some(sink);
        }
    }

    /// Append an empty tree tagged with `kind`; it becomes the last tree.
    pub fn new_iteration(&mut self, kind: IterationKind) {
        let index = IterationIndex(self.trees.len());
        debug!("New iteration {index} ({kind})");
        self.trees.push(EventTree::new(index, kind));
        self.kinds.push(kind);
    }

    #[must_use]
    pub fn trees(&self) -> &[EventTree] {
        &self.trees
    }

    #[must_use]
    pub fn kinds(&self) -> &[IterationKind] {
        &self.kinds
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.trees.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.trees.is_empty()
    }

    #[must_use]
    pub fn tree(&self, index: IterationIndex) -> Option<&EventTree> {
        self.trees.get(index.0)
    }

    pub fn tree_mut(&mut self, index: IterationIndex) -> Option<&mut EventTree> {
        self.trees.get_mut(index.0)
    }

    #[must_use]
    pub fn last_tree(&self) -> Option<&EventTree> {
        self.trees.last()
    }

    pub fn last_tree_mut(&mut self) -> Option<&mut EventTree> {
        self.trees.last_mut()
    }

    /// Drop every tree and tag, then notify.
    pub fn clear(&mut self) {
        self.trees.clear();
        self.kinds.clear();
        self.notify_updated();
    }

    /// Rebuild every tree's child lists, then notify.
    pub fn reload(&mut self) {
        for tree in &mut self.trees {
            tree.rebuild_hierarchy();
        }
        self.notify_updated();
    }

    /// Serialize the trees and tags. Child lists and lookup indices are not
    /// part of the document.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Restore a registry and rebuild every hierarchy.
    ///
    /// # Errors
    ///
    /// Returns an error if the document is not a serialized registry.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        let mut registry: IterationRegistry = serde_json::from_str(json)?;
        registry.reload();
        Ok(registry)
    }

    /// # Errors
    ///
    /// Returns an error if serialization or the write fails.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), SessionError> {
        std::fs::write(path, self.to_json()?)?;
        Ok(())
    }

    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, SessionError> {
        let content = std::fs::read_to_string(path)?;
        Ok(Self::from_json(&content)?)
    }
}
