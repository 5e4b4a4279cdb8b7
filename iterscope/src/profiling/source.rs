//! Profiling data source boundary.
//!
//! The engine never produces sampled data itself. A host hands it a
//! [`ProfilingSource`] that returns per-thread [`FrameSnapshot`]s for a frame
//! index announced through a "new frame recorded" notification.

use crate::domain::{FrameIndex, SampleId};

/// Name of the thread searched for markers.
pub const MAIN_THREAD: &str = "Main Thread";

/// Numeric per-sample columns exposed by a snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Column {
    /// Inclusive duration in ms.
    TotalTime,
    /// Start timestamp in ms, same clock as lifecycle spans.
    StartTime,
    /// Bytes allocated by the managed heap.
    GcAlloc,
    /// Number of merged calls.
    Calls,
}

/// One thread's sample hierarchy for one frame.
///
/// The root item is synthetic: its children are the top-level samples.
pub trait FrameSnapshot {
    fn is_valid(&self) -> bool;
    fn frame_index(&self) -> FrameIndex;
    fn root(&self) -> SampleId;
    fn name(&self, sample: SampleId) -> &str;
    fn column(&self, sample: SampleId, column: Column) -> f64;
    fn metadata(&self, sample: SampleId) -> &[String];
    fn children(&self, sample: SampleId) -> &[SampleId];
}

/// Supplier of snapshots.
pub trait ProfilingSource {
    type Snapshot: FrameSnapshot;

    /// Main-thread snapshot for `frame`, `None` when the frame is unavailable.
    fn frame(&self, frame: FrameIndex) -> Option<Self::Snapshot>;

    /// Snapshot of the named thread (case-insensitive) for `frame`.
    fn thread_frame(&self, frame: FrameIndex, thread: &str) -> Option<Self::Snapshot>;
}
