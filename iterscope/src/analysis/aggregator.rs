//! Regex category aggregation.
//!
//! A [`CategoryTable`] is an ordered list of `{label, pattern, style}` rows.
//! An [`Aggregation`] runs that table over one iteration's walk:
//!
//! - every visited span is tested once against each category
//! - a category that already matched an ancestor on the current path is not
//!   tested again below it (no double counting of nested time)
//! - the first match in the iteration is kept as the category's example;
//!   later matches only add time and a call
//!
//! Rendering the result is up to the caller.

// Percentages are computed from f64 durations and usize counters
#![allow(clippy::cast_precision_loss)]

use regex::Regex;

use crate::iteration::EventNode;

/// Label of the category that collects time not covered by child spans.
pub const MISSING_MARKER_TIME: &str = "[MISSING MARKER TIME]";

/// Name looked up to find the unaccounted-time category.
const MISSING_MARKER_KEY: &str = "MISSING MARKER TIME";

const DEFAULT_CATEGORIES: &[(&str, &str, &str)] = &[
    ("Garbage Collector", r"GC\.C", "color:#F00"),
    ("Mono.JIT", "Mono.JIT", "color:#FA1"),
    (MISSING_MARKER_TIME, MISSING_MARKER_KEY, "color:#B54"),
    ("EIP Time", "EditorIterationProfiler", "color:#3A7"),
    ("Object Stuff", r"Object\.", "color:#1C7"),
    ("OnEnable & Awake Stuff", r"\.Awake|\.OnEnable", "color:#17C"),
    ("UnityEditor Stuff", r"UnityEditor\.", "color:#52F"),
    ("UnityEngine Stuff", r"UnityEngine\.", "color:#81B"),
    ("GUI Stuff", "GUI", "color:#C0F"),
];

#[derive(Debug, Clone)]
pub struct Category {
    label: String,
    pattern: Regex,
    style: String,
}

impl Category {
    /// # Errors
    ///
    /// Returns an error if `pattern` is not a valid regular expression.
    pub fn new(
        label: impl Into<String>,
        pattern: &str,
        style: impl Into<String>,
    ) -> Result<Self, regex::Error> {
        Ok(Self { label: label.into(), pattern: Regex::new(pattern)?, style: style.into() })
    }

    #[must_use]
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Inline CSS applied to the category's summary.
    #[must_use]
    pub fn style(&self) -> &str {
        &self.style
    }

    #[must_use]
    pub fn is_match(&self, name: &str) -> bool {
        self.pattern.is_match(name)
    }
}

#[derive(Debug, Clone)]
pub struct CategoryTable {
    categories: Vec<Category>,
}

impl Default for CategoryTable {
    fn default() -> Self {
        let categories = DEFAULT_CATEGORIES
            .iter()
            .map(|(label, pattern, style)| {
                Category::new(*label, pattern, *style).expect("built-in category pattern is valid")
            })
            .collect();
        Self { categories }
    }
}

impl CategoryTable {
    #[must_use]
    pub fn new(categories: Vec<Category>) -> Self {
        Self { categories }
    }

    #[must_use]
    pub fn categories(&self) -> &[Category] {
        &self.categories
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.categories.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }

    /// First category whose pattern matches `name`.
    #[must_use]
    pub fn find(&self, name: &str) -> Option<usize> {
        self.categories.iter().position(|category| category.is_match(name))
    }
}

/// The span a category first matched in an iteration.
#[derive(Debug, Clone, PartialEq)]
pub struct CategoryExample {
    pub identifier: String,
    pub details: String,
    pub duration: f64,
    pub percentage: f64,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CategoryStats {
    pub time: f64,
    pub calls: usize,
    pub example: Option<CategoryExample>,
}

impl CategoryStats {
    /// Share of `total`, 0 when either side is zero.
    #[must_use]
    pub fn percentage(&self, total: f64) -> f64 {
        if total.abs() < f64::EPSILON || self.time.abs() < f64::EPSILON {
            0.0
        } else {
            self.time / total * 100.0
        }
    }

    fn add(&mut self, time: f64) {
        self.calls += 1;
        self.time += time;
    }
}

/// Categories already matched on the path from the root to the current span.
///
/// Cloned when descending so siblings don't see each other's matches.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathMask(Vec<bool>);

impl PathMask {
    #[must_use]
    pub fn contains(&self, category: usize) -> bool {
        self.0.get(category).copied().unwrap_or(false)
    }
}

/// Per-iteration aggregation state.
#[derive(Debug)]
pub struct Aggregation<'t> {
    table: &'t CategoryTable,
    stats: Vec<CategoryStats>,
    total: f64,
}

impl<'t> Aggregation<'t> {
    #[must_use]
    pub fn new(table: &'t CategoryTable, total: f64) -> Self {
        Self { table, stats: vec![CategoryStats::default(); table.len()], total }
    }

    #[must_use]
    pub fn root_mask(&self) -> PathMask {
        PathMask(vec![false; self.table.len()])
    }

    /// Test `node` against every category not yet matched on this path.
    pub fn record(&mut self, node: &EventNode, percentage: f64, mask: &mut PathMask) {
        for (index, category) in self.table.categories().iter().enumerate() {
            if mask.0[index] || !category.is_match(node.identifier()) {
                continue;
            }

            let stats = &mut self.stats[index];
            if stats.example.is_none() {
                stats.example = Some(CategoryExample {
                    identifier: node.identifier().to_string(),
                    details: node.details().to_string(),
                    duration: node.duration(),
                    percentage,
                });
            }
            stats.add(node.duration());
            mask.0[index] = true;
        }
    }

    /// Add `time` to the first category matching `name`, if any.
    pub fn add_time(&mut self, name: &str, time: f64) {
        if let Some(index) = self.table.find(name) {
            self.stats[index].add(time);
        }
    }

    /// Add a span's own time not covered by its children.
    pub fn add_unaccounted(&mut self, node_duration: f64, children_duration: f64) {
        if node_duration > children_duration {
            self.add_time(MISSING_MARKER_KEY, node_duration - children_duration);
        }
    }

    #[must_use]
    pub fn total(&self) -> f64 {
        self.total
    }

    pub fn results(&self) -> impl Iterator<Item = (&Category, &CategoryStats)> + '_ {
        self.table.categories().iter().zip(&self.stats)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{IterationIndex, NodeIndex};
    use crate::iteration::EventTree;
    use iterscope_common::{EventFlags, IterationKind};

    fn tree() -> EventTree {
        let mut tree = EventTree::new(IterationIndex(0), IterationKind::AssemblyReload);
        let root = tree.start_span(IterationKind::AssemblyReload, None, None);
        tree.node_mut(root).set_start_time(1.0);
        tree.node_mut(root).finish(101.0);
        let gc = tree.import_subtree(root, "GC.Collect", None, 1.0, 21.0, EventFlags::NONE);
        tree.import_subtree(gc, "GC.CollectNested", None, 1.0, 11.0, EventFlags::NONE);
        tree.import_subtree(root, "GC.Collect", None, 30.0, 35.0, EventFlags::NONE);
        tree
    }

    #[test]
    fn test_default_table_order() {
        let table = CategoryTable::default();
        let labels: Vec<&str> = table.categories().iter().map(Category::label).collect();
        assert_eq!(labels[0], "Garbage Collector");
        assert_eq!(labels[2], MISSING_MARKER_TIME);
        assert_eq!(labels.len(), 9);
        assert_eq!(table.find("MyWindow.OnGUI"), Some(8));
        assert_eq!(table.find("UnityEngine.Object.Instantiate"), Some(4));
    }

    #[test]
    fn test_nested_match_on_same_path_is_ignored() {
        let tree = tree();
        let table = CategoryTable::default();
        let mut aggregation = Aggregation::new(&table, 100.0);

        let root_mask = aggregation.root_mask();
        let mut first = root_mask.clone();
        aggregation.record(tree.node(NodeIndex(1)), 20.0, &mut first);
        let mut nested = first.clone();
        aggregation.record(tree.node(NodeIndex(2)), 10.0, &mut nested);
        let mut sibling = root_mask.clone();
        aggregation.record(tree.node(NodeIndex(3)), 5.0, &mut sibling);

        let (category, gc) = aggregation.results().next().unwrap();
        assert_eq!(category.label(), "Garbage Collector");
        assert_eq!(gc.calls, 2);
        assert!((gc.time - 25.0).abs() < f64::EPSILON);
        assert!((gc.percentage(aggregation.total()) - 25.0).abs() < 1e-9);

        let example = gc.example.as_ref().unwrap();
        assert_eq!(example.identifier, "GC.Collect");
        assert!((example.duration - 20.0).abs() < f64::EPSILON);
        assert!(first.contains(0));
        assert!(!root_mask.contains(0));
    }

    #[test]
    fn test_unaccounted_time_goes_to_missing_marker_category() {
        let table = CategoryTable::default();
        let mut aggregation = Aggregation::new(&table, 100.0);
        aggregation.add_unaccounted(100.0, 25.0);
        aggregation.add_unaccounted(10.0, 12.0);

        let (category, stats) = aggregation.results().nth(2).unwrap();
        assert_eq!(category.label(), MISSING_MARKER_TIME);
        assert_eq!(stats.calls, 1);
        assert!((stats.time - 75.0).abs() < f64::EPSILON);
        assert!(stats.example.is_none());
    }

    #[test]
    fn test_percentage_of_zero_total() {
        let stats = CategoryStats { time: 5.0, calls: 1, example: None };
        assert!(stats.percentage(0.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_invalid_pattern_is_rejected() {
        assert!(Category::new("Broken", "(", "").is_err());
    }
}
