//! Correlation of lifecycle phases with sampled profiling data.
//!
//! - [`source`] - the snapshot boundary the host implements
//! - [`recorded`] - JSON-backed recorded sessions implementing that boundary
//! - [`markers`] - key / flag / thread fan-out marker tables
//! - [`scheduler`] - budgeted per-snapshot marker search
//! - [`importer`] - sample hierarchy to event tree conversion
//! - [`collector`] - lifecycle notification handling

pub mod collector;
pub mod importer;
pub mod markers;
pub mod recorded;
pub mod scheduler;
pub mod source;

pub use collector::{LifecycleCollector, LifecycleEvent};
pub use importer::{compose_metadata, SampleImporter};
pub use markers::MarkerTables;
pub use recorded::{RecordedSession, RecordedSource, ReplayStep};
pub use scheduler::{MarkerSearchScheduler, Registration, SnapshotOutcome};
pub use source::{Column, FrameSnapshot, ProfilingSource, MAIN_THREAD};
