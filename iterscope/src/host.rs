//! Channel-driven host integration.
//!
//! Hosts may notify from any thread; every notification is funneled through
//! one `crossbeam-channel` receiver into the thread that owns the
//! [`ProfilerContext`], so tree mutation and search passes never overlap.

use crossbeam_channel::Receiver;
use log::{debug, info};

use crate::context::ProfilerContext;
use crate::domain::FrameIndex;
use crate::profiling::{LifecycleEvent, ProfilingSource};

/// One notification from the host.
#[derive(Debug, Clone, PartialEq)]
pub enum HostEvent {
    /// `timestamp` (ms) overrides the context clock when present.
    Lifecycle { event: LifecycleEvent, timestamp: Option<f64> },
    /// A new sampled frame is available from the profiling source.
    FrameRecorded(FrameIndex),
    Clear,
    Shutdown,
}

/// Counters reported when the loop exits.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoopStats {
    pub lifecycle_events: usize,
    pub frames: usize,
    pub imports: usize,
}

/// Apply events until [`HostEvent::Shutdown`] arrives or every sender is
/// dropped.
pub fn run_event_loop<S: ProfilingSource>(
    ctx: &mut ProfilerContext,
    source: &S,
    events: &Receiver<HostEvent>,
) -> LoopStats {
    let mut stats = LoopStats::default();

    while let Ok(event) = events.recv() {
        match event {
            HostEvent::Lifecycle { event, timestamp } => {
                stats.lifecycle_events += 1;
                match timestamp {
                    Some(now) => ctx.handle_lifecycle_at(&event, now),
                    None => ctx.handle_lifecycle(&event),
                };
            }
            HostEvent::FrameRecorded(frame) => {
                stats.frames += 1;
                stats.imports += ctx.on_frame(source, frame).imported;
            }
            HostEvent::Clear => ctx.clear(),
            HostEvent::Shutdown => {
                debug!("Shutdown requested");
                break;
            }
        }
    }

    info!(
        "Event loop finished: {} lifecycle event(s), {} frame(s), {} import(s)",
        stats.lifecycle_events, stats.frames, stats.imports
    );
    stats
}
