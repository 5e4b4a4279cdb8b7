//! Sample hierarchy import.
//!
//! Converts a matched sample and its descendants into [`EventTree`] spans.
//! Samples shorter than the import cutoff are dropped together with their
//! whole subtree. Flags only accumulate on the way down.

use log::{debug, warn};

use super::markers::MarkerTables;
use super::source::{Column, FrameSnapshot, ProfilingSource};
use crate::domain::{NodeIndex, SampleId};
use crate::iteration::EventTree;
use iterscope_common::EventFlags;

pub struct SampleImporter<'a, S: ProfilingSource> {
    source: &'a S,
    markers: &'a MarkerTables,
    min_duration: f64,
}

impl<'a, S: ProfilingSource> SampleImporter<'a, S> {
    #[must_use]
    pub fn new(source: &'a S, markers: &'a MarkerTables, min_duration: f64) -> Self {
        Self { source, markers, min_duration }
    }

    /// Import `sample` under `parent`, returning the created span.
    ///
    /// Returns `None` when the sample falls below the import cutoff.
    pub fn import(
        &self,
        tree: &mut EventTree,
        parent: NodeIndex,
        snapshot: &S::Snapshot,
        sample: SampleId,
        inherited: EventFlags,
    ) -> Option<NodeIndex> {
        let duration = snapshot.column(sample, Column::TotalTime);
        if duration < self.min_duration {
            return None;
        }

        let name = snapshot.name(sample);
        let start = snapshot.column(sample, Column::StartTime);
        let flags = inherited | self.markers.flags_for(name);
        let metadata = compose_metadata(snapshot, sample);

        let node =
            tree.import_subtree(parent, name, Some(metadata.clone()), start, start + duration, flags);

        for thread in self.markers.threads_for(name) {
            self.merge_thread(tree, node, snapshot, thread, &metadata, flags);
        }

        for &child in snapshot.children(sample) {
            self.import(tree, node, snapshot, child, flags);
        }

        Some(node)
    }

    /// Import every top-level sample of another thread under a `Thread: X`
    /// span hung off `node`.
    ///
    /// The thread span takes the window of the event it is merged into.
    /// Imported samples narrow it to their own extent.
    fn merge_thread(
        &self,
        tree: &mut EventTree,
        node: NodeIndex,
        snapshot: &S::Snapshot,
        thread: &str,
        metadata: &str,
        flags: EventFlags,
    ) {
        let frame = snapshot.frame_index();
        let Some(thread_snapshot) =
            self.source.thread_frame(frame, thread).filter(|snapshot| snapshot.is_valid())
        else {
            warn!("Thread '{thread}' has no data for {frame}, skipping merge");
            return;
        };

        let (parent_start, parent_finish) = {
            let event = tree.node(node);
            (event.start_time(), event.finish_time())
        };
        let thread_node = tree.import_subtree(
            node,
            format!("Thread: {thread}"),
            Some(metadata.to_string()),
            parent_start,
            parent_finish,
            flags,
        );

        for &child in thread_snapshot.children(thread_snapshot.root()) {
            self.import(tree, thread_node, &thread_snapshot, child, flags);
        }
        tree.set_window_from_children(thread_node);
        debug!("Merged thread '{thread}' of {frame} into {node}");
    }
}

/// `GC Alloc: X; Calls: Y; Metadata: a; b`
///
/// Commas inside metadata strings are rewritten to `;` so the details stay a
/// single CSV field.
#[must_use]
pub fn compose_metadata<T: FrameSnapshot>(snapshot: &T, sample: SampleId) -> String {
    let mut parts = vec![
        format!("GC Alloc: {}", snapshot.column(sample, Column::GcAlloc)),
        format!("Calls: {}", snapshot.column(sample, Column::Calls)),
    ];

    let metadata = snapshot.metadata(sample);
    if !metadata.is_empty() {
        parts.push(format!("Metadata: {}", metadata.join("; ")));
    }

    parts.join("; ").replace(',', ";").trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{FrameIndex, IterationIndex};
    use crate::profiling::recorded::{RecordedFrame, RecordedSample, RecordedSource};
    use crate::profiling::source::MAIN_THREAD;
    use iterscope_common::IterationKind;
    use std::collections::BTreeMap;

    fn sample(name: &str, start: f64, total: f64, parent: Option<usize>) -> RecordedSample {
        RecordedSample {
            name: name.to_string(),
            start_time: start,
            total_time: total,
            gc_alloc: 0.0,
            calls: 1.0,
            metadata: Vec::new(),
            parent,
        }
    }

    fn source_with(threads: Vec<(&str, Vec<RecordedSample>)>) -> RecordedSource {
        let mut map = BTreeMap::new();
        for (name, samples) in threads {
            map.insert(name.to_string(), samples);
        }
        let mut source = RecordedSource::new();
        source.insert(RecordedFrame { index: FrameIndex(1), valid: true, threads: map }).unwrap();
        source
    }

    fn placeholder_tree() -> (EventTree, NodeIndex) {
        let mut tree = EventTree::new(IterationIndex(0), IterationKind::AssemblyReload);
        let node = tree.start_span(IterationKind::AssemblyReload, None, None);
        (tree, node)
    }

    fn import_top(
        source: &RecordedSource,
        markers: &MarkerTables,
        tree: &mut EventTree,
        parent: NodeIndex,
    ) {
        let importer = SampleImporter::new(source, markers, 0.01);
        let snapshot = source.frame(FrameIndex(1)).unwrap();
        let top = snapshot.children(snapshot.root())[0];
        importer.import(tree, parent, &snapshot, top, EventFlags::NONE);
    }

    #[test]
    fn test_cutoff_skips_whole_subtree() {
        let source = source_with(vec![(
            MAIN_THREAD,
            vec![
                sample("ReloadAssemblies", 0.0, 50.0, None),
                sample("Tiny", 1.0, 0.005, Some(0)),
                sample("Big", 1.0, 0.004, Some(1)),
                sample("Kept", 2.0, 3.0, Some(0)),
            ],
        )]);
        let (mut tree, root) = placeholder_tree();
        import_top(&source, &MarkerTables::empty(), &mut tree, root);

        let names: Vec<&str> = tree.nodes().iter().map(|node| node.identifier()).collect();
        assert_eq!(names, vec!["AssemblyReload", "ReloadAssemblies", "Kept"]);
    }

    #[test]
    fn test_cutoff_is_parent_gated() {
        // A child longer than the cutoff is still dropped when its parent is.
        let source = source_with(vec![(
            MAIN_THREAD,
            vec![
                sample("Root", 0.0, 5.0, None),
                sample("Short", 0.0, 0.001, Some(0)),
                sample("Long", 0.0, 2.0, Some(1)),
            ],
        )]);
        let (mut tree, root) = placeholder_tree();
        import_top(&source, &MarkerTables::empty(), &mut tree, root);
        assert_eq!(tree.len(), 2);
    }

    #[test]
    fn test_user_code_flags_propagate_down() {
        let source = source_with(vec![(
            MAIN_THREAD,
            vec![
                sample("ReloadAssemblies", 0.0, 50.0, None),
                sample("AwakeScriptedObjects", 0.0, 20.0, Some(0)),
                sample("MyBehaviour.Awake", 0.0, 10.0, Some(1)),
            ],
        )]);
        let (mut tree, root) = placeholder_tree();
        import_top(&source, &MarkerTables::editor_defaults(), &mut tree, root);

        assert!(!tree.node(NodeIndex(1)).flags().contains(EventFlags::USER_CODE));
        assert!(tree.node(NodeIndex(2)).flags().contains(EventFlags::USER_CODE));
        assert!(tree.node(NodeIndex(3)).flags().contains(EventFlags::USER_CODE));
    }

    #[test]
    fn test_thread_fan_out_merges_secondary_thread() {
        let source = source_with(vec![
            (
                MAIN_THREAD,
                vec![
                    sample("ReloadAssemblies", 0.0, 50.0, None),
                    sample("UnloadDomain", 10.0, 20.0, Some(0)),
                ],
            ),
            (
                "Finalizer",
                vec![sample("Finalize", 12.0, 4.0, None), sample("Finalize", 18.0, 5.0, None)],
            ),
        ]);
        let (mut tree, root) = placeholder_tree();
        import_top(&source, &MarkerTables::editor_defaults(), &mut tree, root);

        let thread = tree
            .nodes()
            .iter()
            .find(|node| node.identifier() == "Thread: Finalizer")
            .expect("finalizer thread merged");
        assert_eq!(tree.node(thread.parent().unwrap()).identifier(), "UnloadDomain");
        assert!((thread.start_time() - 12.0).abs() < f64::EPSILON);
        assert!((thread.finish_time() - 23.0).abs() < f64::EPSILON);
        assert_eq!(thread.children().len(), 2);
        assert!(thread.flags().contains(EventFlags::USER_CODE));

        // "Domain unloader" has no data in this frame.
        assert!(tree.nodes().iter().all(|node| node.identifier() != "Thread: Domain unloader"));
    }

    #[test]
    fn test_thread_without_imported_samples_keeps_event_window() {
        let source = source_with(vec![
            (
                MAIN_THREAD,
                vec![
                    sample("ReloadAssemblies", 0.0, 50.0, None),
                    sample("UnloadDomain", 10.0, 20.0, Some(0)),
                ],
            ),
            ("Finalizer", vec![sample("Finalize", 12.0, 0.001, None)]),
        ]);
        let (mut tree, root) = placeholder_tree();
        import_top(&source, &MarkerTables::editor_defaults(), &mut tree, root);

        let thread = tree
            .nodes()
            .iter()
            .find(|node| node.identifier() == "Thread: Finalizer")
            .expect("finalizer thread merged");
        assert!(thread.children().is_empty());
        let event = tree.node(thread.parent().unwrap());
        assert!((thread.start_time() - event.start_time()).abs() < f64::EPSILON);
        assert!((thread.finish_time() - event.finish_time()).abs() < f64::EPSILON);
        assert!((thread.start_time() - 10.0).abs() < f64::EPSILON);
        assert!((thread.finish_time() - 30.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_compose_metadata() {
        let mut with_meta = sample("Load", 0.0, 1.0, None);
        with_meta.gc_alloc = 1024.0;
        with_meta.calls = 3.0;
        with_meta.metadata = vec!["a,b".to_string(), "c".to_string()];
        let source =
            source_with(vec![(MAIN_THREAD, vec![with_meta, sample("Plain", 0.0, 1.0, None)])]);
        let snapshot = source.frame(FrameIndex(1)).unwrap();
        let top = snapshot.children(snapshot.root()).to_vec();

        assert_eq!(
            compose_metadata(&snapshot, top[0]),
            "GC Alloc: 1024; Calls: 3; Metadata: a;b; c"
        );
        assert_eq!(compose_metadata(&snapshot, top[1]), "GC Alloc: 0; Calls: 1");
    }
}
