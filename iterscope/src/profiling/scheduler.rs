//! # Marker Search Scheduling
//!
//! A phase starts now, but the sampled data describing it only shows up some
//! snapshots later, or never. The scheduler keeps one [`Registration`] per
//! placeholder span and polls every incoming snapshot for the phase's key
//! markers.
//!
//! ## Per-Snapshot Pass
//!
//! 1. Every registration loses one unit of budget, match or not
//! 2. The main-thread snapshot is searched once, depth-first and
//!    depth-bounded, testing all pending registrations' markers per sample
//! 3. Resolved registrations are imported and removed; the placeholder's
//!    window is recomputed from the imported children
//! 4. Unresolved registrations with no budget left are dropped
//!
//! The registry's update notification fires at most once per pass.

use log::{debug, warn};

use super::importer::SampleImporter;
use super::markers::MarkerTables;
use super::source::{FrameSnapshot, ProfilingSource};
use crate::domain::{FrameIndex, IterationIndex, NodeIndex, SampleId};
use crate::iteration::IterationRegistry;
use iterscope_common::{
    EventFlags, IterationKind, DEFAULT_MIN_IMPORT_DURATION, DEFAULT_SEARCH_DEPTH,
};

/// Pending search for one placeholder span.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Registration {
    kind: IterationKind,
    tree: IterationIndex,
    node: NodeIndex,
    remaining: u32,
}

impl Registration {
    #[must_use]
    pub fn kind(&self) -> IterationKind {
        self.kind
    }

    #[must_use]
    pub fn tree(&self) -> IterationIndex {
        self.tree
    }

    #[must_use]
    pub fn node(&self) -> NodeIndex {
        self.node
    }

    /// Snapshots left before the registration is dropped.
    #[must_use]
    pub fn remaining(&self) -> u32 {
        self.remaining
    }
}

/// What one snapshot pass did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SnapshotOutcome {
    /// Registrations resolved and imported.
    pub imported: usize,
    /// Registrations dropped with their budget exhausted.
    pub expired: usize,
    /// The snapshot was missing or invalid.
    pub skipped: bool,
}

#[derive(Debug)]
pub struct MarkerSearchScheduler {
    registrations: Vec<Registration>,
    markers: MarkerTables,
    search_depth: usize,
    min_import_duration: f64,
}

impl Default for MarkerSearchScheduler {
    fn default() -> Self {
        Self::new(MarkerTables::editor_defaults())
    }
}

impl MarkerSearchScheduler {
    #[must_use]
    pub fn new(markers: MarkerTables) -> Self {
        Self {
            registrations: Vec::new(),
            markers,
            search_depth: DEFAULT_SEARCH_DEPTH,
            min_import_duration: DEFAULT_MIN_IMPORT_DURATION,
        }
    }

    #[must_use]
    pub fn markers(&self) -> &MarkerTables {
        &self.markers
    }

    #[must_use]
    pub fn search_depth(&self) -> usize {
        self.search_depth
    }

    pub fn set_search_depth(&mut self, depth: usize) {
        self.search_depth = depth;
    }

    pub fn set_min_import_duration(&mut self, duration: f64) {
        self.min_import_duration = duration;
    }

    #[must_use]
    pub fn pending(&self) -> &[Registration] {
        &self.registrations
    }

    /// Start searching for `kind`'s markers on behalf of `node`.
    ///
    /// Re-arming the same node replaces its registration.
    pub fn arm(&mut self, kind: IterationKind, tree: IterationIndex, node: NodeIndex, budget: u32) {
        self.registrations.retain(|r| !(r.tree == tree && r.node == node));
        self.registrations.push(Registration { kind, tree, node, remaining: budget });
        debug!("Armed {kind} search for {tree} {node} ({budget} frames)");
    }

    /// Drop every pending registration.
    pub fn clear(&mut self) {
        if !self.registrations.is_empty() {
            debug!("Dropping {} pending marker search(es)", self.registrations.len());
        }
        self.registrations.clear();
    }

    /// Run one search pass against the snapshot announced for `frame`.
    pub fn on_snapshot<S: ProfilingSource>(
        &mut self,
        registry: &mut IterationRegistry,
        source: &S,
        frame: FrameIndex,
    ) -> SnapshotOutcome {
        let mut outcome = SnapshotOutcome::default();
        if self.registrations.is_empty() {
            return outcome;
        }

        for registration in &mut self.registrations {
            registration.remaining = registration.remaining.saturating_sub(1);
        }

        let snapshot = match source.frame(frame) {
            Some(snapshot) if snapshot.is_valid() => snapshot,
            _ => {
                warn!("No valid main thread data for {frame}, skipping marker search");
                outcome.skipped = true;
                outcome.expired = self.drop_expired();
                return outcome;
            }
        };

        let wanted: Vec<&[String]> =
            self.registrations.iter().map(|r| self.markers.key_markers(r.kind)).collect();
        let mut found = vec![None; wanted.len()];
        search(&snapshot, snapshot.root(), self.search_depth, &wanted, &mut found);

        let registrations = std::mem::take(&mut self.registrations);
        for (registration, hit) in registrations.into_iter().zip(found) {
            match hit {
                Some(sample) => {
                    if self.import(registry, source, &snapshot, registration, sample) {
                        outcome.imported += 1;
                    }
                }
                None if registration.remaining == 0 => {
                    debug!(
                        "{} search for {} {} exhausted its budget",
                        registration.kind, registration.tree, registration.node
                    );
                    outcome.expired += 1;
                }
                None => self.registrations.push(registration),
            }
        }

        if outcome.imported > 0 {
            registry.notify_updated();
        }
        outcome
    }

    fn drop_expired(&mut self) -> usize {
        let before = self.registrations.len();
        self.registrations.retain(|r| r.remaining > 0);
        before - self.registrations.len()
    }

    fn import<S: ProfilingSource>(
        &self,
        registry: &mut IterationRegistry,
        source: &S,
        snapshot: &S::Snapshot,
        registration: Registration,
        sample: SampleId,
    ) -> bool {
        let Registration { tree, node, .. } = registration;
        let Some(event_tree) = registry.tree_mut(tree).filter(|t| t.get(node).is_some()) else {
            warn!("{tree} {node} no longer exists, discarding marker match");
            return false;
        };

        let importer = SampleImporter::new(source, &self.markers, self.min_import_duration);
        importer.import(event_tree, node, snapshot, sample, EventFlags::NONE);
        event_tree.set_window_from_children(node);
        event_tree.post_process(node, false);

        debug!(
            "Imported '{}' from {} into {tree} {node}",
            snapshot.name(sample),
            snapshot.frame_index()
        );
        true
    }
}

/// Depth-bounded DFS recording the first match per registration.
///
/// Returns `true` once every registration is resolved.
fn search<T: FrameSnapshot>(
    snapshot: &T,
    parent: SampleId,
    depth: usize,
    wanted: &[&[String]],
    found: &mut [Option<SampleId>],
) -> bool {
    if depth == 0 {
        return false;
    }

    for &child in snapshot.children(parent) {
        let name = snapshot.name(child);
        for (slot, markers) in found.iter_mut().zip(wanted) {
            if slot.is_none() && markers.iter().any(|marker| marker == name) {
                *slot = Some(child);
            }
        }

        if found.iter().all(Option::is_some) {
            return true;
        }
        if search(snapshot, child, depth - 1, wanted, found) {
            return true;
        }
    }
    false
}
