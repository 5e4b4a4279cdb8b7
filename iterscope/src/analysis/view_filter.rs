//! Flattened tree-view rows.
//!
//! Turns the registry into indented rows the way an interactive tree view
//! would show them, honoring the user-code-only and flatten toggles. Hidden
//! spans don't consume a depth level: their visible descendants move up.

use iterscope_common::EventFlags;

use crate::iteration::{EventNode, EventTree, IterationRegistry};

/// Row visibility toggles.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ViewFilter {
    pub user_code_only: bool,
    pub flatten: bool,
}

impl ViewFilter {
    #[must_use]
    pub fn flags(self) -> EventFlags {
        let mut flags = EventFlags::NONE;
        if self.user_code_only {
            flags |= EventFlags::USER_CODE;
        }
        if self.flatten {
            flags |= EventFlags::FLATTEN;
        }
        flags
    }

    /// Whether `node` gets a row.
    ///
    /// Lifecycle spans are always shown. With both toggles on, only user code
    /// outside flattened chains is shown.
    #[must_use]
    pub fn shows(self, node: &EventNode) -> bool {
        if !node.kind().is_none() {
            return true;
        }

        let filter = self.flags();
        if filter.is_empty() {
            return true;
        }

        let masked = node.flags().intersection(filter);
        if filter.contains(EventFlags::USER_CODE | EventFlags::FLATTEN) {
            return masked.contains(EventFlags::USER_CODE) && !masked.contains(EventFlags::FLATTEN);
        }

        if masked.contains(EventFlags::USER_CODE) {
            return true;
        }
        filter.contains(EventFlags::FLATTEN) && !masked.contains(EventFlags::FLATTEN)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ViewRow {
    /// 0 for iteration rows, 1 for root spans.
    pub depth: usize,
    pub name: String,
    pub details: String,
    pub duration: f64,
}

/// Build the rows for every iteration in the registry.
#[must_use]
pub fn build_rows(registry: &IterationRegistry, filter: ViewFilter) -> Vec<ViewRow> {
    let mut rows = Vec::new();

    for (tree, kind) in registry.trees().iter().zip(registry.kinds()) {
        let header = rows.len();
        rows.push(ViewRow {
            depth: 0,
            name: format!("Iteration Event {} ({kind})", tree.iteration().display_number()),
            details: String::new(),
            duration: 0.0,
        });

        let mut duration = 0.0;
        for root in tree.roots() {
            duration += root.duration();
            push_rows(tree, root, 1, filter, &mut rows);
        }
        rows[header].duration = duration;
    }

    rows
}

fn push_rows(
    tree: &EventTree,
    node: &EventNode,
    depth: usize,
    filter: ViewFilter,
    rows: &mut Vec<ViewRow>,
) {
    let mut child_depth = depth;
    if filter.shows(node) {
        rows.push(ViewRow {
            depth,
            name: node.display_name(),
            details: node.details().to_string(),
            duration: node.duration(),
        });
        child_depth += 1;
    }

    for child in tree.children_of(node.index()) {
        push_rows(tree, child, child_depth, filter, rows);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::NodeIndex;
    use iterscope_common::IterationKind;

    fn registry() -> IterationRegistry {
        let mut registry = IterationRegistry::new();
        registry.new_iteration(IterationKind::AssemblyReload);
        let tree = registry.last_tree_mut().unwrap();
        let root = tree.start_span(IterationKind::AssemblyReload, None, None);
        let reload = tree.import_subtree(root, "ReloadAssemblies", None, 0.0, 40.0, EventFlags::NONE);
        let awake =
            tree.import_subtree(reload, "AwakeScriptedObjects", None, 0.0, 20.0, EventFlags::USER_CODE);
        tree.import_subtree(awake, "Player.Awake", None, 0.0, 10.0, EventFlags::USER_CODE);
        tree.set_window_from_children(root);
        tree.post_process(root, false);
        registry
    }

    #[test]
    fn test_no_filter_shows_everything() {
        let rows = build_rows(&registry(), ViewFilter::default());
        let names: Vec<&str> = rows.iter().map(|row| row.name.as_str()).collect();
        assert_eq!(
            names,
            vec![
                "Iteration Event 1 (AssemblyReload)",
                "AssemblyReload",
                "ReloadAssemblies",
                "AwakeScriptedObjects",
                "Player.Awake",
            ]
        );
        let depths: Vec<usize> = rows.iter().map(|row| row.depth).collect();
        assert_eq!(depths, vec![0, 1, 2, 3, 4]);
        assert!((rows[0].duration - 40.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_user_code_only_lifts_rows() {
        let filter = ViewFilter { user_code_only: true, flatten: false };
        let rows = build_rows(&registry(), filter);
        let names: Vec<(&str, usize)> = rows.iter().map(|row| (row.name.as_str(), row.depth)).collect();
        assert_eq!(
            names,
            vec![
                ("Iteration Event 1 (AssemblyReload)", 0),
                ("AssemblyReload", 1),
                ("AwakeScriptedObjects", 2),
                ("Player.Awake", 3),
            ]
        );
    }

    #[test]
    fn test_flatten_hides_single_child_chains() {
        let registry = registry();
        let tree = registry.last_tree().unwrap();
        // ReloadAssemblies is the only child and has exactly one child.
        assert!(tree.node(NodeIndex(1)).flags().contains(EventFlags::FLATTEN));

        let filter = ViewFilter { user_code_only: false, flatten: true };
        let rows = build_rows(&registry, filter);
        assert!(rows.iter().all(|row| row.name != "ReloadAssemblies"));
        assert!(rows.iter().any(|row| row.name == "AssemblyReload"));
    }

    #[test]
    fn test_both_toggles_require_unflattened_user_code() {
        let registry = registry();
        let tree = registry.last_tree().unwrap();
        let filter = ViewFilter { user_code_only: true, flatten: true };

        for node in tree.nodes() {
            let expected = !node.kind().is_none()
                || (node.flags().contains(EventFlags::USER_CODE)
                    && !node.flags().contains(EventFlags::FLATTEN));
            assert_eq!(filter.shows(node), expected, "{}", node.identifier());
        }
    }
}
