//! Recorded sessions: an in-memory [`ProfilingSource`] plus a lifecycle
//! timeline, loaded from JSON.
//!
//! Samples are stored flat, one list per thread, each with the index of its
//! parent in the same list. The hierarchy is rebuilt on load; a parent must
//! precede its children.
//!
//! ```json
//! {
//!   "product_name": "Sandbox",
//!   "timeline": [
//!     { "type": "lifecycle", "time": 100.0, "event": "EnteringPlayMode" },
//!     { "type": "frame", "index": 1, "threads": {
//!         "Main Thread": [
//!           { "name": "EnterPlayMode", "start_time": 100.0, "total_time": 40.0 },
//!           { "name": "ReloadAssemblies", "start_time": 101.0, "total_time": 30.0, "parent": 0 }
//!         ] } }
//!   ]
//! }
//! ```

use log::debug;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use std::sync::Arc;

use super::collector::LifecycleEvent;
use super::source::{Column, FrameSnapshot, ProfilingSource, MAIN_THREAD};
use crate::domain::{FrameIndex, SampleId, SessionError};

/// One recorded sample.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordedSample {
    pub name: String,
    pub start_time: f64,
    pub total_time: f64,
    #[serde(default)]
    pub gc_alloc: f64,
    #[serde(default = "default_calls")]
    pub calls: f64,
    #[serde(default)]
    pub metadata: Vec<String>,
    /// Index of the parent sample in the same thread list.
    #[serde(default)]
    pub parent: Option<usize>,
}

fn default_calls() -> f64 {
    1.0
}

fn default_valid() -> bool {
    true
}

/// One recorded frame: per-thread flat sample lists.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordedFrame {
    pub index: FrameIndex,
    #[serde(default = "default_valid")]
    pub valid: bool,
    #[serde(default)]
    pub threads: BTreeMap<String, Vec<RecordedSample>>,
}

/// Timeline entry of a recorded session.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TimelineEntry {
    Lifecycle { time: f64, event: LifecycleEvent },
    Frame(RecordedFrame),
}

/// Replay step once frames have been moved into the source.
#[derive(Debug, Clone, PartialEq)]
pub enum ReplayStep {
    Lifecycle { time: f64, event: LifecycleEvent },
    FrameRecorded(FrameIndex),
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RecordedSession {
    #[serde(default)]
    pub product_name: Option<String>,
    #[serde(default)]
    pub timeline: Vec<TimelineEntry>,
}

impl RecordedSession {
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, SessionError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    /// # Errors
    ///
    /// Returns an error if the document is not a recorded session.
    pub fn from_json(json: &str) -> Result<Self, SessionError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Split into a source holding every frame and the ordered replay steps.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::InvalidSample`] for a sample whose parent does
    /// not precede it.
    pub fn into_replay(self) -> Result<(RecordedSource, Vec<ReplayStep>), SessionError> {
        let mut source = RecordedSource::new();
        let mut steps = Vec::with_capacity(self.timeline.len());

        for entry in self.timeline {
            match entry {
                TimelineEntry::Lifecycle { time, event } => {
                    steps.push(ReplayStep::Lifecycle { time, event });
                }
                TimelineEntry::Frame(frame) => {
                    steps.push(ReplayStep::FrameRecorded(frame.index));
                    source.insert(frame)?;
                }
            }
        }

        Ok((source, steps))
    }
}

/// Sample hierarchy of one thread. Item 0 is the synthetic root.
#[derive(Debug)]
pub struct ThreadSamples {
    samples: Vec<RecordedSample>,
    children: Vec<Vec<SampleId>>,
}

impl ThreadSamples {
    fn build(frame: FrameIndex, samples: Vec<RecordedSample>) -> Result<Self, SessionError> {
        let mut children = vec![Vec::new(); samples.len() + 1];

        for (index, sample) in samples.iter().enumerate() {
            let parent_item = match sample.parent {
                Some(parent) if parent < index => parent + 1,
                Some(parent) => return Err(SessionError::InvalidSample { frame, index, parent }),
                None => 0,
            };
            children[parent_item].push(item_id(index + 1));
        }

        Ok(Self { samples, children })
    }

    fn sample(&self, sample: SampleId) -> Option<&RecordedSample> {
        (sample.0 as usize).checked_sub(1).and_then(|index| self.samples.get(index))
    }
}

#[allow(clippy::cast_possible_truncation)]
fn item_id(item: usize) -> SampleId {
    SampleId(item as u32)
}

/// Snapshot view over a recorded thread.
#[derive(Debug, Clone)]
pub struct RecordedSnapshot {
    frame: FrameIndex,
    valid: bool,
    samples: Arc<ThreadSamples>,
}

impl FrameSnapshot for RecordedSnapshot {
    fn is_valid(&self) -> bool {
        self.valid
    }

    fn frame_index(&self) -> FrameIndex {
        self.frame
    }

    fn root(&self) -> SampleId {
        SampleId(0)
    }

    fn name(&self, sample: SampleId) -> &str {
        self.samples.sample(sample).map_or("", |s| s.name.as_str())
    }

    fn column(&self, sample: SampleId, column: Column) -> f64 {
        self.samples.sample(sample).map_or(0.0, |s| match column {
            Column::TotalTime => s.total_time,
            Column::StartTime => s.start_time,
            Column::GcAlloc => s.gc_alloc,
            Column::Calls => s.calls,
        })
    }

    fn metadata(&self, sample: SampleId) -> &[String] {
        self.samples.sample(sample).map_or(&[], |s| s.metadata.as_slice())
    }

    fn children(&self, sample: SampleId) -> &[SampleId] {
        self.samples.children.get(sample.0 as usize).map_or(&[], Vec::as_slice)
    }
}

#[derive(Debug)]
struct FrameData {
    valid: bool,
    threads: Vec<(String, Arc<ThreadSamples>)>,
}

/// In-memory profiling source backed by recorded frames.
#[derive(Debug, Default)]
pub struct RecordedSource {
    frames: HashMap<FrameIndex, FrameData>,
}

impl RecordedSource {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add (or replace) a frame.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::InvalidSample`] for a sample whose parent does
    /// not precede it.
    pub fn insert(&mut self, frame: RecordedFrame) -> Result<(), SessionError> {
        let mut threads = Vec::with_capacity(frame.threads.len());
        for (name, samples) in frame.threads {
            threads.push((name, Arc::new(ThreadSamples::build(frame.index, samples)?)));
        }
        debug!("Recorded {} with {} thread(s)", frame.index, threads.len());
        self.frames.insert(frame.index, FrameData { valid: frame.valid, threads });
        Ok(())
    }

    #[must_use]
    pub fn frame_count(&self) -> usize {
        self.frames.len()
    }
}

impl ProfilingSource for RecordedSource {
    type Snapshot = RecordedSnapshot;

    fn frame(&self, frame: FrameIndex) -> Option<RecordedSnapshot> {
        self.thread_frame(frame, MAIN_THREAD)
    }

    fn thread_frame(&self, frame: FrameIndex, thread: &str) -> Option<RecordedSnapshot> {
        let data = self.frames.get(&frame)?;
        let (_, samples) = data.threads.iter().find(|(name, _)| name.eq_ignore_ascii_case(thread))?;
        Some(RecordedSnapshot { frame, valid: data.valid, samples: Arc::clone(samples) })
    }
}
