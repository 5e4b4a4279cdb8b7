//! # Profiler Context
//!
//! One explicit object owning everything a host talks to: settings, the
//! iteration registry, the marker search scheduler, the lifecycle collector,
//! the report formats and a clock.
//!
//! ```text
//!   host lifecycle ──▶ handle_lifecycle ──▶ LifecycleCollector ──▶ registry
//!                                                 │ arm
//!                                                 ▼
//!   host frames ─────▶ on_frame ─────────▶ MarkerSearchScheduler ──▶ registry
//!
//!   report / export ─▶ ReporterRegistry ──▶ Reporter::render(registry)
//! ```
//!
//! Construct one per profiled host; tests create as many as they like.

use log::{debug, info, warn};
use std::path::Path;
use std::time::Instant;

use crate::analysis::{build_rows, ViewRow};
use crate::config::{ReportHeader, Settings};
use crate::domain::{ConfigError, ExportError, FrameIndex, SessionError};
use crate::export::{export_report, ReportContext, ReporterRegistry};
use crate::iteration::{IterationRegistry, UpdateSink};
use crate::profiling::{
    FrameSnapshot, LifecycleCollector, LifecycleEvent, MarkerSearchScheduler, MarkerTables,
    ProfilingSource, SampleImporter, SnapshotOutcome,
};
use iterscope_common::{EventFlags, IterationKind};

/// Timestamp source for lifecycle events, in milliseconds.
pub trait Clock: Send {
    fn now_ms(&self) -> f64;
}

/// Milliseconds since construction.
#[derive(Debug, Clone, Copy)]
pub struct MonotonicClock {
    origin: Instant,
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self { origin: Instant::now() }
    }
}

impl Clock for MonotonicClock {
    fn now_ms(&self) -> f64 {
        self.origin.elapsed().as_secs_f64() * 1000.0
    }
}

pub struct ProfilerContext {
    settings: Settings,
    registry: IterationRegistry,
    scheduler: MarkerSearchScheduler,
    collector: LifecycleCollector,
    reporters: ReporterRegistry,
    clock: Box<dyn Clock>,
}

impl std::fmt::Debug for ProfilerContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProfilerContext")
            .field("settings", &self.settings)
            .field("registry", &self.registry)
            .field("scheduler", &self.scheduler)
            .finish_non_exhaustive()
    }
}

impl ProfilerContext {
    /// Context with the editor marker tables and every built-in format.
    ///
    /// # Errors
    ///
    /// Returns an error if `settings` fail validation.
    pub fn new(settings: Settings) -> Result<Self, ConfigError> {
        Self::with_markers(settings, MarkerTables::editor_defaults())
    }

    /// # Errors
    ///
    /// Returns an error if `settings` fail validation.
    pub fn with_markers(settings: Settings, markers: MarkerTables) -> Result<Self, ConfigError> {
        settings.validate()?;

        let mut scheduler = MarkerSearchScheduler::new(markers);
        scheduler.set_search_depth(settings.active_search_depth());
        scheduler.set_min_import_duration(settings.min_import_duration);

        Ok(Self {
            collector: LifecycleCollector::new(settings.frame_budget),
            registry: IterationRegistry::new(),
            reporters: ReporterRegistry::builtin(),
            clock: Box::new(MonotonicClock::default()),
            scheduler,
            settings,
        })
    }

    #[must_use]
    pub fn with_clock(mut self, clock: Box<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    #[must_use]
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    #[must_use]
    pub fn registry(&self) -> &IterationRegistry {
        &self.registry
    }

    #[must_use]
    pub fn scheduler(&self) -> &MarkerSearchScheduler {
        &self.scheduler
    }

    #[must_use]
    pub fn reporters(&self) -> &ReporterRegistry {
        &self.reporters
    }

    pub fn reporters_mut(&mut self) -> &mut ReporterRegistry {
        &mut self.reporters
    }

    pub fn set_update_sink(&mut self, sink: UpdateSink) {
        self.registry.set_update_sink(sink);
    }

    pub fn clear_update_sink(&mut self) -> Option<UpdateSink> {
        self.registry.clear_update_sink()
    }

    // ========================================================================
    // Capture
    // ========================================================================

    /// Apply a lifecycle notification stamped with the context clock.
    pub fn handle_lifecycle(&mut self, event: &LifecycleEvent) -> bool {
        let now = self.clock.now_ms();
        self.handle_lifecycle_at(event, now)
    }

    /// Apply a lifecycle notification at `now` (ms). Returns `true` if the
    /// registry changed, in which case the update sink has fired.
    pub fn handle_lifecycle_at(&mut self, event: &LifecycleEvent, now: f64) -> bool {
        if !self.settings.capture_enabled {
            debug!("Capture disabled, ignoring {event}");
            return false;
        }

        let changed = self.collector.handle(event, now, &mut self.registry, &mut self.scheduler);
        if changed {
            self.registry.notify_updated();
        }
        changed
    }

    /// Run one marker search pass for a newly recorded frame.
    pub fn on_frame<S: ProfilingSource>(&mut self, source: &S, frame: FrameIndex) -> SnapshotOutcome {
        self.scheduler.on_snapshot(&mut self.registry, source, frame)
    }

    /// Drop every iteration and every pending search.
    pub fn clear(&mut self) {
        self.scheduler.clear();
        self.registry.clear();
    }

    // ========================================================================
    // Toggles
    // ========================================================================

    pub fn set_capture_enabled(&mut self, enabled: bool) {
        self.settings.capture_enabled = enabled;
    }

    pub fn set_deep_profile(&mut self, deep: bool) {
        self.settings.deep_profile = deep;
        self.scheduler.set_search_depth(self.settings.active_search_depth());
    }

    pub fn set_user_code_only(&mut self, enabled: bool) {
        self.settings.user_code_only = enabled;
        self.registry.notify_updated();
    }

    pub fn set_flatten(&mut self, enabled: bool) {
        self.settings.flatten = enabled;
        self.registry.notify_updated();
    }

    /// Tree-view rows under the current user-code / flatten toggles.
    #[must_use]
    pub fn view_rows(&self) -> Vec<ViewRow> {
        build_rows(&self.registry, self.settings.view_filter())
    }

    // ========================================================================
    // Persistence
    // ========================================================================

    /// # Errors
    ///
    /// Returns an error if serialization or the write fails.
    pub fn save_session(&self, path: impl AsRef<Path>) -> Result<(), SessionError> {
        self.registry.save(path)
    }

    /// Replace the registry with a saved one, keeping the update sink.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed; the current
    /// registry is left untouched.
    pub fn load_session(&mut self, path: impl AsRef<Path>) -> Result<(), SessionError> {
        let loaded = IterationRegistry::load(path)?;
        self.scheduler.clear();

        let sink = self.registry.clear_update_sink();
        self.registry = loaded;
        if let Some(sink) = sink {
            self.registry.set_update_sink(sink);
        }
        self.registry.notify_updated();
        Ok(())
    }

    // ========================================================================
    // Reports
    // ========================================================================

    #[must_use]
    pub fn header(&self) -> ReportHeader {
        ReportHeader::from_settings(&self.settings)
    }

    /// Render the registry with the format registered as `format`.
    ///
    /// # Errors
    ///
    /// Returns [`ExportError::UnknownFormat`] for an unregistered format.
    pub fn report(&self, format: &str) -> Result<String, ExportError> {
        self.report_registry(format, &self.registry)
    }

    /// Render `registry` (for instance a captured frame) with this context's
    /// formats and header.
    ///
    /// # Errors
    ///
    /// Returns [`ExportError::UnknownFormat`] for an unregistered format.
    pub fn report_registry(
        &self,
        format: &str,
        registry: &IterationRegistry,
    ) -> Result<String, ExportError> {
        let reporter = self.reporters.create(format, &self.settings)?;
        let header = self.header();
        Ok(reporter.render(&ReportContext { registry, header: &header }))
    }

    /// Render and write the registry to `path`.
    ///
    /// Returns `Ok(false)` without writing when `path` is empty.
    ///
    /// # Errors
    ///
    /// Returns an error for an unregistered format or a failed write.
    pub fn export(&self, format: &str, path: &Path) -> Result<bool, ExportError> {
        self.export_registry(format, &self.registry, path)
    }

    /// [`export`](Self::export) for a registry this context does not own.
    ///
    /// # Errors
    ///
    /// Returns an error for an unregistered format or a failed write.
    pub fn export_registry(
        &self,
        format: &str,
        registry: &IterationRegistry,
        path: &Path,
    ) -> Result<bool, ExportError> {
        let reporter = self.reporters.create(format, &self.settings)?;
        let header = self.header();
        export_report(reporter.as_ref(), &ReportContext { registry, header: &header }, path)
    }

    /// Import every top-level sample of `frame` into a standalone registry.
    ///
    /// The registry holds one iteration with a single `Data (Frame N)` span.
    /// Returns `None` if the frame has no valid data.
    pub fn capture_frame<S: ProfilingSource>(
        &self,
        source: &S,
        frame: FrameIndex,
    ) -> Option<IterationRegistry> {
        let Some(snapshot) = source.frame(frame).filter(|s| s.is_valid()) else {
            warn!("No valid data for {frame}, nothing to capture");
            return None;
        };

        let mut registry = IterationRegistry::new();
        registry.new_iteration(IterationKind::None);
        let tree = registry.last_tree_mut()?;

        let label = format!("Data (Frame {})", frame.0);
        let root = tree.start_span(IterationKind::None, Some(&label), None);
        let importer = SampleImporter::new(
            source,
            self.scheduler.markers(),
            self.settings.min_import_duration,
        );
        for &sample in snapshot.children(snapshot.root()) {
            importer.import(tree, root, &snapshot, sample, EventFlags::NONE);
        }
        tree.set_window_from_children(root);
        tree.post_process(root, false);

        info!("Captured {frame} ({} spans)", tree.len());
        Some(registry)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profiling::recorded::{RecordedFrame, RecordedSample, RecordedSource};
    use crate::profiling::MAIN_THREAD;
    use std::collections::BTreeMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    struct FixedClock(f64);

    impl Clock for FixedClock {
        fn now_ms(&self) -> f64 {
            self.0
        }
    }

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

    fn source_with(index: u64, samples: Vec<RecordedSample>) -> RecordedSource {
        let mut threads = BTreeMap::new();
        threads.insert(MAIN_THREAD.to_string(), samples);
        let mut source = RecordedSource::new();
        source.insert(RecordedFrame { index: FrameIndex(index), valid: true, threads }).unwrap();
        source
    }

    fn context() -> ProfilerContext {
        ProfilerContext::new(Settings::default()).unwrap()
    }

    #[test]
    fn test_rejects_invalid_settings() {
        let settings = Settings { prune_percentage: 150.0, ..Settings::default() };
        assert!(matches!(
            ProfilerContext::new(settings),
            Err(ConfigError::OutOfRange { field: "prune_percentage", .. })
        ));
    }

    #[test]
    fn test_lifecycle_uses_clock_and_notifies() {
        let updates = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&updates);

        let mut ctx = context().with_clock(Box::new(FixedClock(42.0)));
        ctx.set_update_sink(Box::new(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        }));

        assert!(ctx.handle_lifecycle(&LifecycleEvent::ScriptCompilationStarted));
        assert_eq!(updates.load(Ordering::SeqCst), 1);

        let tree = ctx.registry().last_tree().unwrap();
        let span = tree.find_last(IterationKind::ScriptCompilation).unwrap();
        assert!((tree.node(span).start_time() - 42.0).abs() < f64::EPSILON);

        // Nothing changes, nothing fires.
        assert!(!ctx.handle_lifecycle(&LifecycleEvent::EnteredPlayMode));
        assert_eq!(updates.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_capture_disabled_ignores_lifecycle() {
        let mut ctx = context();
        ctx.set_capture_enabled(false);

        assert!(!ctx.handle_lifecycle_at(&LifecycleEvent::EnteringPlayMode, 1.0));
        assert!(ctx.registry().is_empty());
        assert!(ctx.scheduler().pending().is_empty());
    }

    #[test]
    fn test_clear_drops_pending_searches() {
        let mut ctx = context();
        ctx.handle_lifecycle_at(&LifecycleEvent::EnteringPlayMode, 1.0);
        assert_eq!(ctx.scheduler().pending().len(), 1);

        ctx.clear();
        assert!(ctx.registry().is_empty());
        assert!(ctx.scheduler().pending().is_empty());

        // A later matching frame has nothing to import into.
        let source = source_with(1, vec![sample("EnterPlayMode", 0.0, 5.0, None)]);
        let outcome = ctx.on_frame(&source, FrameIndex(1));
        assert_eq!(outcome.imported, 0);
    }

    #[test]
    fn test_deep_profile_switches_search_depth() {
        let mut ctx = context();
        assert_eq!(ctx.scheduler().search_depth(), 8);
        ctx.set_deep_profile(true);
        assert_eq!(ctx.scheduler().search_depth(), 12);
    }

    #[test]
    fn test_unknown_format() {
        let ctx = context();
        assert!(matches!(ctx.report("xml"), Err(ExportError::UnknownFormat(_))));
    }

    #[test]
    fn test_capture_frame() {
        let ctx = context();
        let source = source_with(
            7,
            vec![
                sample("PlayerLoop", 10.0, 20.0, None),
                sample("Update", 12.0, 5.0, Some(0)),
                sample("Render", 40.0, 10.0, None),
            ],
        );

        let captured = ctx.capture_frame(&source, FrameIndex(7)).unwrap();
        let tree = captured.last_tree().unwrap();
        let root = tree.roots().next().unwrap();
        assert_eq!(root.identifier(), "Data (Frame 7)");
        assert_eq!(tree.children_of(root.index()).count(), 2);
        assert!((root.duration() - 40.0).abs() < 1e-9);

        let csv = ctx.report_registry("csv", &captured).unwrap();
        assert!(csv.contains("1 (None), Leaf, Render"));

        assert!(ctx.capture_frame(&source, FrameIndex(8)).is_none());
    }

    #[test]
    fn test_session_round_trip_keeps_sink() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");

        let mut ctx = context();
        ctx.handle_lifecycle_at(&LifecycleEvent::ScriptCompilationStarted, 1.0);
        ctx.handle_lifecycle_at(&LifecycleEvent::ScriptCompilationFinished, 6.0);
        ctx.save_session(&path).unwrap();

        let updates = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&updates);
        let mut other = context();
        other.set_update_sink(Box::new(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        }));
        other.load_session(&path).unwrap();

        assert_eq!(updates.load(Ordering::SeqCst), 1);
        assert_eq!(other.registry().len(), 1);
        assert!(other
            .report("csv")
            .unwrap()
            .contains("1 (ScriptCompilation), Leaf, ScriptCompilation, , 5.000"));
    }
}
