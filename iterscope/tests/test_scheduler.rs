use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use iterscope::config::Settings;
use iterscope::context::ProfilerContext;
use iterscope::domain::FrameIndex;
use iterscope::profiling::recorded::{RecordedFrame, RecordedSample};
use iterscope::profiling::{LifecycleEvent, RecordedSource, MAIN_THREAD};
use iterscope_common::{EventFlags, IterationKind};

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

fn insert(source: &mut RecordedSource, index: u64, threads: Vec<(&str, Vec<RecordedSample>)>) {
    let threads: BTreeMap<String, Vec<RecordedSample>> =
        threads.into_iter().map(|(name, samples)| (name.to_string(), samples)).collect();
    source.insert(RecordedFrame { index: FrameIndex(index), valid: true, threads }).unwrap();
}

fn counted(settings: Settings) -> (ProfilerContext, Arc<AtomicUsize>) {
    let updates = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&updates);
    let mut ctx = ProfilerContext::new(settings).unwrap();
    ctx.set_update_sink(Box::new(move |_| {
        counter.fetch_add(1, Ordering::SeqCst);
    }));
    (ctx, updates)
}

#[test]
fn test_compile_and_reload_resolve_in_one_pass() {
    let mut source = RecordedSource::new();
    insert(&mut source, 1, vec![(MAIN_THREAD, vec![sample("Idle", 0.0, 2.0, None)])]);
    insert(
        &mut source,
        2,
        vec![(
            MAIN_THREAD,
            vec![
                sample("EditorLoop", 10.0, 90.0, None),
                sample("CompilationPipeline.CompileScripts", 10.0, 30.0, Some(0)),
                sample("ReloadAssemblies", 50.0, 40.0, Some(0)),
                sample("AwakeScriptedObjects", 60.0, 5.0, Some(2)),
                sample("Tiny", 70.0, 0.001, Some(2)),
            ],
        )],
    );

    let (mut ctx, updates) = counted(Settings::default());
    ctx.handle_lifecycle_at(&LifecycleEvent::ScriptCompilationStarted, 10.0);
    ctx.handle_lifecycle_at(&LifecycleEvent::ScriptCompilationFinished, 40.0);
    ctx.handle_lifecycle_at(&LifecycleEvent::AssemblyReloadStarted, 50.0);
    assert_eq!(ctx.scheduler().pending().len(), 2);
    let before = updates.load(Ordering::SeqCst);

    let miss = ctx.on_frame(&source, FrameIndex(1));
    assert_eq!(miss.imported, 0);
    assert!(ctx.scheduler().pending().iter().all(|r| r.remaining() == 599));

    let hit = ctx.on_frame(&source, FrameIndex(2));
    assert_eq!(hit.imported, 2);
    assert!(ctx.scheduler().pending().is_empty());
    // One notification for the whole batch.
    assert_eq!(updates.load(Ordering::SeqCst), before + 1);

    let tree = ctx.registry().last_tree().unwrap();
    let placeholder = tree.find_last(IterationKind::AssemblyReload).unwrap();
    let node = tree.node(placeholder);
    assert!((node.start_time() - 50.0).abs() < 1e-9);
    assert!((node.duration() - 40.0).abs() < 1e-9);

    let awake = tree.nodes().iter().find(|n| n.identifier() == "AwakeScriptedObjects").unwrap();
    assert!(awake.flags().contains(EventFlags::USER_CODE));
    assert!(tree.nodes().iter().all(|n| n.identifier() != "Tiny"));
}

#[test]
fn test_budget_exhaustion_drops_silently() {
    let mut source = RecordedSource::new();
    for frame in 1..=3 {
        insert(&mut source, frame, vec![(MAIN_THREAD, vec![sample("Idle", 0.0, 1.0, None)])]);
    }

    let settings = Settings { frame_budget: 2, ..Settings::default() };
    let (mut ctx, updates) = counted(settings);
    ctx.handle_lifecycle_at(&LifecycleEvent::EnteringPlayMode, 1.0);
    let before = updates.load(Ordering::SeqCst);

    assert_eq!(ctx.on_frame(&source, FrameIndex(1)).expired, 0);
    assert_eq!(ctx.on_frame(&source, FrameIndex(2)).expired, 1);
    assert!(ctx.scheduler().pending().is_empty());
    assert_eq!(ctx.on_frame(&source, FrameIndex(3)), Default::default());

    assert_eq!(updates.load(Ordering::SeqCst), before);
    let tree = ctx.registry().last_tree().unwrap();
    assert_eq!(tree.len(), 1);
}

#[test]
fn test_missing_frames_consume_budget() {
    let source = RecordedSource::new();
    let (mut ctx, _) = counted(Settings::default());
    ctx.handle_lifecycle_at(&LifecycleEvent::ExitingPlayMode, 1.0);

    let outcome = ctx.on_frame(&source, FrameIndex(9));
    assert!(outcome.skipped);
    assert_eq!(ctx.scheduler().pending()[0].remaining(), 599);
}

#[test]
fn test_thread_fan_out_during_reload() {
    let mut source = RecordedSource::new();
    insert(
        &mut source,
        1,
        vec![
            (
                MAIN_THREAD,
                vec![
                    sample("ReloadAssemblies", 0.0, 50.0, None),
                    sample("UnloadDomain", 5.0, 20.0, Some(0)),
                ],
            ),
            ("Domain unloader", vec![sample("Cleanup", 6.0, 8.0, None)]),
            ("Finalizer", vec![sample("Finalize", 9.0, 4.0, None)]),
        ],
    );

    let (mut ctx, _) = counted(Settings::default());
    ctx.handle_lifecycle_at(&LifecycleEvent::ScriptCompilationStarted, 0.0);
    ctx.handle_lifecycle_at(&LifecycleEvent::AssemblyReloadStarted, 0.0);
    assert_eq!(ctx.on_frame(&source, FrameIndex(1)).imported, 1);

    let rows = ctx.view_rows();
    let names: Vec<&str> = rows.iter().map(|row| row.name.as_str()).collect();
    let unload = names.iter().position(|n| *n == "UnloadDomain").unwrap();
    assert_eq!(names[unload + 1], "Thread: Domain unloader");
    assert_eq!(names[unload + 2], "Cleanup");
    assert_eq!(names[unload + 3], "Thread: Finalizer");
    assert_eq!(names[unload + 4], "Finalize");
    assert_eq!(rows[unload + 2].depth, rows[unload].depth + 2);
}
