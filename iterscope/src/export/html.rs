//! Collapsible HTML tree report.
//!
//! One collapsed `TreeViewItem` per iteration, one nested item per span. The
//! markup helpers here are shared with the performance report.

use super::walk::{
    escape_html, format_percentage, format_time, indentation, percentage_of, walk_tree,
    NodeVisitor, NO_DATA,
};
use super::{ReportContext, Reporter};
use crate::iteration::{EventNode, EventTree};

const HTML_PREFIX: &str = include_str!("html_prefix.html");

pub(crate) fn document_prefix(ctx: &ReportContext<'_>) -> String {
    let mut out = String::from(HTML_PREFIX);
    out.push_str(&format!(
        "<div class=\"Details Wordwrap\">{}</div>\n",
        escape_html(&ctx.header.to_string())
    ));
    out.push_str("<br>\n\n<body>\n");
    out.push_str("<div class=\"ToggleButton\" onclick=\"treeViewToggleAll(true);\">Expand all</div>\n");
    out.push_str(
        "<div class=\"ToggleButton\" onclick=\"treeViewToggleAll(false);\">Collapse all</div>\n",
    );
    out
}

pub(crate) fn document_postfix() -> String {
    "</body>\n</html>\n".to_string()
}

pub(crate) fn no_data() -> String {
    format!("<div>{NO_DATA}</div>\n")
}

pub(crate) fn time_display(depth: usize, ms: f64) -> String {
    format!("{}<div class=\"TimeDisplay\">{}</div>\n", indentation(depth), format_time(ms))
}

pub(crate) fn percentage_display(depth: usize, percentage: f64) -> String {
    format!(
        "{}<div class=\"PercentageDisplay\">{}</div>\n",
        indentation(depth),
        format_percentage(percentage)
    )
}

pub(crate) fn simple_label(depth: usize, text: &str, style: Option<&str>) -> String {
    match style {
        Some(style) if !style.is_empty() => {
            format!("{}<div style=\"{style}\">{text}</div>\n", indentation(depth))
        }
        _ => format!("{}<div>{text}</div>\n", indentation(depth)),
    }
}

pub(crate) fn name_display(depth: usize, text: &str) -> String {
    format!(
        "{}<div class=\"NameDisplay\" onclick=\"treeViewToggle(event);\">{text}</div>\n",
        indentation(depth)
    )
}

/// `[name] (details)` or `[name]`, escaped.
pub(crate) fn bracketed(open: char, close: char, node: &EventNode) -> String {
    let name = escape_html(node.identifier());
    if node.details().is_empty() {
        format!("{open}{name}{close}")
    } else {
        format!("{open}{name}{close} ({})", escape_html(node.details()))
    }
}

/// Opening lines of an iteration's item, left open for its spans.
pub(crate) fn iteration_open(tree: &EventTree, total: f64) -> String {
    let mut out = String::from("<div class=\"TreeViewItem TreeViewItemCollapsed\">\n");
    out.push_str(&time_display(1, total));
    out.push_str(&percentage_display(1, 100.0));
    out.push_str(&name_display(
        1,
        &format!("Iteration {} ({})", tree.iteration().display_number(), tree.kind()),
    ));
    out
}

#[derive(Debug, Default, Clone, Copy)]
pub struct HtmlReporter;

struct Items {
    total: f64,
}

impl NodeVisitor for Items {
    fn enter_iteration(&mut self, tree: &EventTree, out: &mut String) {
        self.total = tree.total_root_duration();
        out.push_str(&iteration_open(tree, self.total));
    }

    fn enter_node(&mut self, _tree: &EventTree, node: &EventNode, depth: usize, out: &mut String) {
        let percentage = percentage_of(node.duration(), self.total);
        let class = if node.has_children() { "TreeViewItemCollapsed" } else { "TreeViewItemLeaf" };

        out.push_str(&format!("{}<div class=\"TreeViewItem {class}\">\n", indentation(depth)));
        out.push_str(&time_display(depth + 1, node.duration()));
        out.push_str(&percentage_display(depth + 1, percentage));
        if node.has_children() {
            let name = escape_html(node.identifier());
            let label = if node.details().is_empty() {
                name
            } else {
                format!("{name} ({})", escape_html(node.details()))
            };
            out.push_str(&name_display(depth + 1, &label));
        } else {
            out.push_str(&simple_label(depth + 1, &bracketed('[', ']', node), None));
        }
    }

    fn leave_node(&mut self, _tree: &EventTree, _node: &EventNode, depth: usize, out: &mut String) {
        out.push_str(&format!("{}</div>\n", indentation(depth)));
    }

    fn leave_iteration(&mut self, _tree: &EventTree, out: &mut String) {
        out.push_str("</div>\n");
    }
}

impl Reporter for HtmlReporter {
    fn name(&self) -> &str {
        "HTML"
    }

    fn extension(&self) -> &str {
        "html"
    }

    fn prefix(&self, ctx: &ReportContext<'_>) -> String {
        document_prefix(ctx)
    }

    fn body(&self, ctx: &ReportContext<'_>) -> String {
        if ctx.registry.is_empty() {
            return no_data();
        }

        let mut out = String::new();
        let mut items = Items { total: 0.0 };
        for tree in ctx.registry.trees() {
            walk_tree(tree, &mut items, &mut out);
        }
        out
    }

    fn postfix(&self, _ctx: &ReportContext<'_>) -> String {
        document_postfix()
    }
}
