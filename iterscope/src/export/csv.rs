//! CSV report.
//!
//! ```text
//! <header block>
//!
//! Iteration ID,NodeType,Name,Details,Duration (ms)
//! 1 (ScriptCompilation), Parent, Root, GC Alloc: 0; Calls: 1, 45.000
//! ```
//!
//! Details never contain commas: imported metadata has them rewritten to `;`.

use super::walk::{walk_registry, NodeVisitor, NO_DATA};
use super::{ReportContext, Reporter};
use crate::iteration::{EventNode, EventTree};

pub const CSV_COLUMNS: &str = "Iteration ID,NodeType,Name,Details,Duration (ms)";

#[derive(Debug, Default, Clone, Copy)]
pub struct CsvReporter;

struct Rows;

impl NodeVisitor for Rows {
    fn enter_node(&mut self, tree: &EventTree, node: &EventNode, _depth: usize, out: &mut String) {
        let node_type = if node.has_children() { "Parent" } else { "Leaf" };
        out.push_str(&format!(
            "{} ({}), {node_type}, {}, {}, {:.3}\n",
            tree.iteration().display_number(),
            tree.kind(),
            node.identifier(),
            node.details(),
            node.duration()
        ));
    }
}

impl Reporter for CsvReporter {
    fn name(&self) -> &str {
        "CSV"
    }

    fn extension(&self) -> &str {
        "csv"
    }

    fn prefix(&self, ctx: &ReportContext<'_>) -> String {
        format!("{}\n", ctx.header)
    }

    fn body(&self, ctx: &ReportContext<'_>) -> String {
        if ctx.registry.is_empty() {
            return format!("{NO_DATA}\n");
        }

        let mut out = format!("{CSV_COLUMNS}\n");
        walk_registry(ctx.registry, &mut Rows, &mut out);
        out
    }
}
