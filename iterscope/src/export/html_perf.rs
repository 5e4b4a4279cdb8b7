//! # HTML Performance Report
//!
//! A pruned view of each iteration plus per-category time summaries.
//!
//! ## Per-Span Rules
//!
//! Shares are percentages of the iteration's total root duration.
//!
//! 1. **Pass-through** - a non-root span with children whose share exceeds
//!    `divergence`% of its parent's share (and the prune threshold) gets no
//!    box of its own; its children are rendered in its place
//! 2. **Box** - a span at or above the prune threshold gets a branch or leaf
//!    box. Branches add their own time not covered by children to the
//!    `[MISSING MARKER TIME]` category
//! 3. **Terminal** - the first span below the threshold under a visible
//!    parent gets a caption only: `[name]` for leaves, `{name}` for a
//!    collapsed subtree
//! 4. **Hidden** - anything deeper is not emitted, but still walked so that
//!    category matches are counted
//!
//! Category matching is done by [`Aggregation`]; this module only renders.

use super::html::{
    bracketed, document_postfix, document_prefix, iteration_open, name_display, no_data,
    percentage_display, simple_label, time_display,
};
use super::walk::{
    escape_html, format_percentage, format_time, indentation, percentage_of,
};
use super::{ReportContext, Reporter};
use crate::analysis::{Aggregation, CategoryTable, PathMask};
use crate::config::Settings;
use crate::iteration::{EventNode, EventTree};
use iterscope_common::{DEFAULT_DIVERGENCE_PERCENTAGE, DEFAULT_PRUNE_PERCENTAGE};

/// Summaries are rendered at this depth.
const SUMMARY_DEPTH: usize = 1;

#[derive(Debug, Clone)]
pub struct HtmlPerfReporter {
    prune_percentage: f64,
    divergence_percentage: f64,
    categories: CategoryTable,
}

impl Default for HtmlPerfReporter {
    fn default() -> Self {
        Self::new(DEFAULT_PRUNE_PERCENTAGE, DEFAULT_DIVERGENCE_PERCENTAGE)
    }
}

impl HtmlPerfReporter {
    #[must_use]
    pub fn new(prune_percentage: f64, divergence_percentage: f64) -> Self {
        Self { prune_percentage, divergence_percentage, categories: CategoryTable::default() }
    }

    #[must_use]
    pub fn from_settings(settings: &Settings) -> Self {
        Self::new(settings.prune_percentage, settings.divergence_percentage)
    }

    #[must_use]
    pub fn with_categories(mut self, categories: CategoryTable) -> Self {
        self.categories = categories;
        self
    }

    fn render_iteration(&self, tree: &EventTree, out: &mut String) {
        let total = tree.total_root_duration();
        let mut aggregation = Aggregation::new(&self.categories, total);
        let mask = aggregation.root_mask();

        out.push_str(&iteration_open(tree, total));
        for root in tree.roots() {
            self.render_node(tree, root, 1, 100.0, &mask, &mut aggregation, out);
            out.push_str(&format!("{}</div>\n", indentation(1)));
        }
        out.push_str(&render_summaries(&aggregation));
        out.push_str("</div>\n");
    }

    #[allow(clippy::too_many_arguments)]
    fn render_node(
        &self,
        tree: &EventTree,
        node: &EventNode,
        depth: usize,
        parent_percentage: f64,
        mask: &PathMask,
        aggregation: &mut Aggregation<'_>,
        out: &mut String,
    ) {
        let duration = node.duration();
        let percentage = percentage_of(duration, aggregation.total());

        let mut mask = mask.clone();
        aggregation.record(node, percentage, &mut mask);

        let pass_through = parent_percentage * self.divergence_percentage / 100.0 < percentage
            && node.has_children()
            && depth > 1
            && percentage > self.prune_percentage;
        if pass_through {
            self.render_children(tree, node, depth, percentage, &mask, aggregation, out);
            return;
        }

        let mut written = false;
        if percentage >= self.prune_percentage {
            if node.has_children() {
                open_item(out, depth, "TreeViewItemCollapsed", duration, percentage);
                out.push_str(&name_display(depth + 1, &escape_html(node.identifier())));

                let children_duration: f64 =
                    tree.children_of(node.index()).map(EventNode::duration).sum();
                aggregation.add_unaccounted(duration, children_duration);
            } else {
                open_item(out, depth, "TreeViewItemLeaf", duration, percentage);
                out.push_str(&simple_label(depth + 1, &bracketed('[', ']', node), None));
            }
            written = true;
        } else if parent_percentage >= self.prune_percentage {
            let caption = if node.has_children() {
                bracketed('{', '}', node)
            } else {
                bracketed('[', ']', node)
            };
            open_item(out, depth, "TreeViewItemLeaf", duration, percentage);
            out.push_str(&simple_label(depth + 1, &caption, None));
            written = true;
        }

        self.render_children(tree, node, depth, percentage, &mask, aggregation, out);

        if written && depth != 1 {
            out.push_str(&format!("{}</div>\n", indentation(depth)));
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn render_children(
        &self,
        tree: &EventTree,
        node: &EventNode,
        depth: usize,
        percentage: f64,
        mask: &PathMask,
        aggregation: &mut Aggregation<'_>,
        out: &mut String,
    ) {
        for child in tree.children_of(node.index()) {
            self.render_node(tree, child, depth + 1, percentage, mask, aggregation, out);
        }
    }
}

fn open_item(out: &mut String, depth: usize, class: &str, duration: f64, percentage: f64) {
    out.push_str(&format!("{}<div class=\"TreeViewItem {class}\">\n", indentation(depth)));
    out.push_str(&time_display(depth + 1, duration));
    out.push_str(&percentage_display(depth + 1, percentage));
}

fn render_summaries(aggregation: &Aggregation<'_>) -> String {
    let indent = indentation(SUMMARY_DEPTH);
    let mut out = String::new();

    for (category, stats) in aggregation.results() {
        let time = format_time(stats.time);
        let percentage = format_percentage(stats.percentage(aggregation.total()));
        let label = escape_html(category.label());
        let style = category.style();

        if let Some(example) = &stats.example {
            out.push_str(&format!("{indent}<div class=\"TreeViewItem TreeViewItemCollapsed\">\n"));
            out.push_str(&format!("{indent}<div class=\"TimeDisplay\">{time}</div>\n"));
            out.push_str(&format!("{indent}<div class=\"PercentageDisplay\">{percentage}</div>\n"));
            out.push_str(&format!(
                "{indent}<div style=\"{style}\" onclick=\"treeViewToggle(event);\" \
                 class=\"NameDisplay\">{label} (Found Instances: {})</div>\n",
                stats.calls
            ));
            out.push_str(&format!("{indent}<div class=\"TreeViewItem TreeViewItemLeaf\">\n"));
            out.push_str(&time_display(SUMMARY_DEPTH + 1, example.duration));
            out.push_str(&percentage_display(SUMMARY_DEPTH + 1, example.percentage));
            let text = if example.details.is_empty() {
                escape_html(&example.identifier)
            } else {
                format!("{} ({})", escape_html(&example.identifier), escape_html(&example.details))
            };
            out.push_str(&simple_label(SUMMARY_DEPTH + 1, &text, Some(style)));
            out.push_str(&format!("{indent}</div>\n"));
        } else {
            out.push_str(&format!("{indent}<div class=\"TreeViewItem TreeViewItemLeaf\">\n"));
            out.push_str(&format!("{indent}<div class=\"TimeDisplay\">{time}</div>\n"));
            out.push_str(&format!("{indent}<div class=\"PercentageDisplay\">{percentage}</div>\n"));
            out.push_str(&format!("{indent}<div style=\"{style}\">{label} ({})</div>\n", stats.calls));
        }
        out.push_str(&format!("{indent}</div>\n"));
    }

    out
}

impl Reporter for HtmlPerfReporter {
    fn name(&self) -> &str {
        "HTML Performance Report"
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
        for tree in ctx.registry.trees() {
            self.render_iteration(tree, &mut out);
        }
        out
    }

    fn postfix(&self, _ctx: &ReportContext<'_>) -> String {
        document_postfix()
    }
}
