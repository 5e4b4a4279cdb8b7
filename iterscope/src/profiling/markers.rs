//! Marker name tables.
//!
//! Three tables drive correlation and import:
//!
//! - **Key markers** - per iteration kind, the sample names that identify the
//!   phase in a snapshot (what the scheduler searches for)
//! - **Flag markers** - sample names whose spans get extra [`EventFlags`]
//!   (user-code callbacks)
//! - **Thread fan-out** - sample names whose work continues on other threads,
//!   merged in as `Thread: X` child spans

use iterscope_common::{EventFlags, IterationKind};
use std::collections::HashMap;

const SCRIPT_COMPILATION_MARKERS: &[&str] = &["CompilationPipeline.CompileScripts"];
const ASSEMBLY_RELOAD_MARKERS: &[&str] = &["ReloadAssemblies"];
const ENTER_PLAY_MODE_MARKERS: &[&str] = &["EnterPlayMode"];
const EXIT_PLAY_MODE_MARKERS: &[&str] = &["ExitPlayMode"];

/// Callbacks that run user code during a reload.
const USER_CODE_MARKERS: &[&str] = &[
    "AssemblyReloadEvents.OnBeforeAssemblyReload()",
    "AssemblyReloadEvents.OnAfterAssemblyReload()",
    "DisabledScriptedObjects",
    "BackupScriptedObjects",
    "RestoreManagedReferences",
    "ProcessInitializeOnLoadAttributes",
    "ProcessInitializeOnLoadMethodAttributes",
    "AwakeScriptedObjects",
    "UnloadDomain",
];

const UNLOAD_DOMAIN_THREADS: &[&str] = &["Domain unloader", "Finalizer"];

#[derive(Debug, Clone, Default)]
pub struct MarkerTables {
    key_markers: HashMap<IterationKind, Vec<String>>,
    flag_markers: HashMap<String, EventFlags>,
    thread_markers: HashMap<String, Vec<String>>,
}

impl MarkerTables {
    /// Tables with no entries: nothing is ever matched, flagged or fanned out.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Tables for the editor's own profiler markers.
    ///
    /// Asset import placeholders are resolved by the script compilation
    /// marker: the compile pass is what the import step waits on.
    #[must_use]
    pub fn editor_defaults() -> Self {
        let mut tables = Self::empty();
        tables
            .with_key_markers(IterationKind::AssetImport, SCRIPT_COMPILATION_MARKERS)
            .with_key_markers(IterationKind::AssemblyReload, ASSEMBLY_RELOAD_MARKERS)
            .with_key_markers(IterationKind::EnterPlayMode, ENTER_PLAY_MODE_MARKERS)
            .with_key_markers(IterationKind::ExitPlayMode, EXIT_PLAY_MODE_MARKERS)
            .with_thread_markers("UnloadDomain", UNLOAD_DOMAIN_THREADS);
        for marker in USER_CODE_MARKERS {
            tables.with_flag_marker(*marker, EventFlags::USER_CODE);
        }
        tables
    }

    pub fn with_key_markers(&mut self, kind: IterationKind, markers: &[&str]) -> &mut Self {
        self.key_markers
            .entry(kind)
            .or_default()
            .extend(markers.iter().map(|marker| (*marker).to_string()));
        self
    }

    /// OR `flags` into every span imported from a sample named `marker`.
    pub fn with_flag_marker(&mut self, marker: impl Into<String>, flags: EventFlags) -> &mut Self {
        *self.flag_markers.entry(marker.into()).or_default() |= flags;
        self
    }

    pub fn with_thread_markers(&mut self, marker: impl Into<String>, threads: &[&str]) -> &mut Self {
        self.thread_markers
            .entry(marker.into())
            .or_default()
            .extend(threads.iter().map(|thread| (*thread).to_string()));
        self
    }

    /// Marker names that identify `kind` in a snapshot.
    #[must_use]
    pub fn key_markers(&self, kind: IterationKind) -> &[String] {
        self.key_markers.get(&kind).map_or(&[], Vec::as_slice)
    }

    #[must_use]
    pub fn flags_for(&self, sample_name: &str) -> EventFlags {
        self.flag_markers.get(sample_name).copied().unwrap_or_default()
    }

    #[must_use]
    pub fn threads_for(&self, sample_name: &str) -> &[String] {
        self.thread_markers.get(sample_name).map_or(&[], Vec::as_slice)
    }
}
