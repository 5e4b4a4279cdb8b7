//! Lifecycle notifications to registry mutations.
//!
//! | Event                          | Effect                                                     |
//! |--------------------------------|------------------------------------------------------------|
//! | `ScriptCompilationStarted`     | new iteration, armed `AssetImport` placeholder, timed `ScriptCompilation` span |
//! | `ScriptCompilationFinished`    | close `ScriptCompilation`                                  |
//! | `AssemblyCompilationStarted`   | timed span named after the module, nested under `ScriptCompilation` |
//! | `AssemblyCompilationFinished`  | close the module span                                      |
//! | `AssemblyReloadStarted`        | armed `AssemblyReload` placeholder, unless entering play mode |
//! | `EnteringPlayMode`             | new iteration, armed `EnterPlayMode` placeholder           |
//! | `ExitingPlayMode`              | new iteration, armed `ExitPlayMode` placeholder            |
//!
//! Everything else is accepted and ignored.

use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::scheduler::MarkerSearchScheduler;
use crate::iteration::IterationRegistry;
use iterscope_common::{IterationKind, DEFAULT_FRAME_BUDGET};

/// Phase-boundary notification from the host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum LifecycleEvent {
    ScriptCompilationStarted,
    ScriptCompilationFinished,
    /// Payload is the module name.
    AssemblyCompilationStarted(String),
    AssemblyCompilationFinished(String),
    AssemblyReloadStarted,
    AssemblyReloadFinished,
    EnteringPlayMode,
    EnteredPlayMode,
    ExitingPlayMode,
    ExitedPlayMode,
}

impl fmt::Display for LifecycleEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LifecycleEvent::ScriptCompilationStarted => f.write_str("ScriptCompilationStarted"),
            LifecycleEvent::ScriptCompilationFinished => f.write_str("ScriptCompilationFinished"),
            LifecycleEvent::AssemblyCompilationStarted(name) => {
                write!(f, "AssemblyCompilationStarted({name})")
            }
            LifecycleEvent::AssemblyCompilationFinished(name) => {
                write!(f, "AssemblyCompilationFinished({name})")
            }
            LifecycleEvent::AssemblyReloadStarted => f.write_str("AssemblyReloadStarted"),
            LifecycleEvent::AssemblyReloadFinished => f.write_str("AssemblyReloadFinished"),
            LifecycleEvent::EnteringPlayMode => f.write_str("EnteringPlayMode"),
            LifecycleEvent::EnteredPlayMode => f.write_str("EnteredPlayMode"),
            LifecycleEvent::ExitingPlayMode => f.write_str("ExitingPlayMode"),
            LifecycleEvent::ExitedPlayMode => f.write_str("ExitedPlayMode"),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct LifecycleCollector {
    frame_budget: u32,
}

impl Default for LifecycleCollector {
    fn default() -> Self {
        Self::new(DEFAULT_FRAME_BUDGET)
    }
}

impl LifecycleCollector {
    /// `frame_budget` is how many snapshots each placeholder waits for data.
    #[must_use]
    pub fn new(frame_budget: u32) -> Self {
        Self { frame_budget }
    }

    #[must_use]
    pub fn frame_budget(&self) -> u32 {
        self.frame_budget
    }

    /// Apply `event` at time `now`. Returns `true` if the registry changed.
    pub fn handle(
        &self,
        event: &LifecycleEvent,
        now: f64,
        registry: &mut IterationRegistry,
        scheduler: &mut MarkerSearchScheduler,
    ) -> bool {
        match event {
            LifecycleEvent::ScriptCompilationStarted => {
                registry.new_iteration(IterationKind::ScriptCompilation);
                self.add_placeholder(registry, scheduler, IterationKind::AssetImport);
                let Some(tree) = registry.last_tree_mut() else {
                    return true;
                };
                let span = tree.start_span(IterationKind::ScriptCompilation, None, None);
                tree.node_mut(span).set_start_time(now);
                true
            }
            LifecycleEvent::ScriptCompilationFinished => {
                let Some(tree) = registry.last_tree_mut() else {
                    return false;
                };
                tree.finish_span(IterationKind::ScriptCompilation, now);
                true
            }
            LifecycleEvent::AssemblyCompilationStarted(name) => {
                let Some(tree) = registry.last_tree_mut() else {
                    debug!("{event} before any iteration, ignoring");
                    return false;
                };
                let span = tree.start_span(IterationKind::AssemblyCompilation, Some(name), None);
                if let Err(e) = tree.set_parent(span, IterationKind::ScriptCompilation) {
                    warn!("Could not nest assembly '{name}': {e}");
                }
                tree.node_mut(span).set_start_time(now);
                true
            }
            LifecycleEvent::AssemblyCompilationFinished(name) => {
                let Some(tree) = registry.last_tree_mut() else {
                    return false;
                };
                tree.finish_span(name.as_str(), now);
                true
            }
            LifecycleEvent::AssemblyReloadStarted => {
                let Some(tree) = registry.last_tree() else {
                    return false;
                };
                // Play mode entry reloads in the same frame; its data already
                // contains the reload.
                if tree.find_last(IterationKind::EnterPlayMode).is_some() {
                    return false;
                }
                self.add_placeholder(registry, scheduler, IterationKind::AssemblyReload);
                true
            }
            LifecycleEvent::EnteringPlayMode => {
                registry.new_iteration(IterationKind::EnterPlayMode);
                self.add_placeholder(registry, scheduler, IterationKind::EnterPlayMode);
                true
            }
            LifecycleEvent::ExitingPlayMode => {
                registry.new_iteration(IterationKind::ExitPlayMode);
                self.add_placeholder(registry, scheduler, IterationKind::ExitPlayMode);
                true
            }
            LifecycleEvent::AssemblyReloadFinished
            | LifecycleEvent::EnteredPlayMode
            | LifecycleEvent::ExitedPlayMode => false,
        }
    }

    /// Start an untimed span in the last iteration and arm a search for it.
    fn add_placeholder(
        &self,
        registry: &mut IterationRegistry,
        scheduler: &mut MarkerSearchScheduler,
        kind: IterationKind,
    ) {
        let Some(tree) = registry.last_tree_mut() else {
            return;
        };
        let node = tree.start_span(kind, None, None);
        scheduler.arm(kind, tree.iteration(), node, self.frame_budget);
    }
}
