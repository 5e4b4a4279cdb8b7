use log::warn;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};

use super::walk::{percentage_of, walk_registry, NodeVisitor, NO_DATA};
use super::{ReportContext, Reporter};
use crate::iteration::{EventNode, EventTree};

const README: &str =
    "Data serialized for use with Chrome Tracing. Load this file into chrome://tracing/";

/// Chrome Trace Event format
/// Format reference: https://docs.google.com/document/d/1CvAClvFfyA5R-PhYUmn5OOQtYMH4h6I0nSsKchNAySU/preview
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChromeTraceEvent {
    /// Span identifier, or `process_name` for metadata events
    pub name: String,
    /// Iteration kind, for filtering/coloring
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cat: Option<String>,
    /// Phase: "X" = complete, "M" = metadata
    pub ph: String,
    /// Start in microseconds, relative to the root span
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ts: Option<f64>,
    /// Duration in microseconds
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dur: Option<f64>,
    /// One process per iteration
    pub pid: usize,
    pub tid: u32,
    pub args: Map<String, JsonValue>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OtherData {
    #[serde(rename = "Readme")]
    pub readme: String,
    #[serde(rename = "Data")]
    pub data: String,
    #[serde(rename = "Error", skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Chrome Trace Format container
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChromeTrace {
    #[serde(rename = "otherData")]
    pub other_data: OtherData,
    #[serde(rename = "traceEvents")]
    pub trace_events: Vec<ChromeTraceEvent>,
}

/// Trace JSON for chrome://tracing, Perfetto or Speedscope.
///
/// Each iteration becomes a process named by a metadata event. Spans below
/// the roots become complete ("X") events timed relative to their root.
#[derive(Debug, Default, Clone, Copy)]
pub struct ChromeTraceReporter;

#[derive(Default)]
struct EventCollector {
    events: Vec<ChromeTraceEvent>,
    total: f64,
    root_start: f64,
}

impl NodeVisitor for EventCollector {
    fn enter_iteration(&mut self, tree: &EventTree, _out: &mut String) {
        self.total = tree.total_root_duration();

        let mut args = Map::new();
        args.insert(
            "name".to_string(),
            JsonValue::from(format!(
                "Iteration {} ({}) ({:.3}ms)",
                tree.iteration().display_number(),
                tree.kind(),
                self.total
            )),
        );
        self.events.push(ChromeTraceEvent {
            name: "process_name".to_string(),
            cat: None,
            ph: "M".to_string(),
            ts: None,
            dur: None,
            pid: tree.iteration().display_number(),
            tid: 1,
            args,
        });
    }

    fn enter_node(&mut self, tree: &EventTree, node: &EventNode, depth: usize, _out: &mut String) {
        if depth == 1 {
            self.root_start = node.start_time();
            return;
        }

        let duration = node.duration();
        if duration <= f64::from(f32::EPSILON) {
            return;
        }

        let start = node.start_time() - self.root_start;
        let mut args = Map::new();
        args.insert("Duration (ms)".to_string(), JsonValue::from(duration));
        args.insert("Start Time (ms)".to_string(), JsonValue::from(start));
        args.insert(
            "Percentage of total".to_string(),
            JsonValue::from(percentage_of(duration, self.total)),
        );

        self.events.push(ChromeTraceEvent {
            name: node.identifier().to_string(),
            cat: Some(tree.kind().to_string()),
            ph: "X".to_string(),
            ts: Some(start * 1000.0),
            dur: Some(duration * 1000.0),
            pid: tree.iteration().display_number(),
            tid: 1,
            args,
        });
    }
}

impl ChromeTraceReporter {
    /// Build the trace document without serializing it.
    #[must_use]
    pub fn trace(&self, ctx: &ReportContext<'_>) -> ChromeTrace {
        let mut collector = EventCollector::default();
        walk_registry(ctx.registry, &mut collector, &mut String::new());

        ChromeTrace {
            other_data: OtherData {
                readme: README.to_string(),
                data: ctx.header.single_line(),
                error: ctx.registry.is_empty().then(|| NO_DATA.to_string()),
            },
            trace_events: collector.events,
        }
    }
}

impl Reporter for ChromeTraceReporter {
    fn name(&self) -> &str {
        "JSON for Chrometrace"
    }

    fn extension(&self) -> &str {
        "json"
    }

    fn body(&self, ctx: &ReportContext<'_>) -> String {
        match serde_json::to_string_pretty(&self.trace(ctx)) {
            Ok(json) => json + "\n",
            Err(e) => {
                warn!("Failed to serialize trace JSON: {e}");
                String::new()
            }
        }
    }
}
