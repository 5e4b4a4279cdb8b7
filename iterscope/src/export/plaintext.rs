//! Tab-indented plain text report, also used for log output.

use super::walk::{indentation, walk_registry, NodeVisitor, NO_DATA};
use super::{ReportContext, Reporter};
use crate::iteration::{EventNode, EventTree};

#[derive(Debug, Default, Clone, Copy)]
pub struct PlaintextReporter;

struct Lines;

impl NodeVisitor for Lines {
    fn enter_iteration(&mut self, tree: &EventTree, out: &mut String) {
        out.push_str(&format!(
            "Iteration {} ({}) [{:.3} ms]\n",
            tree.iteration().display_number(),
            tree.kind(),
            tree.total_root_duration()
        ));
    }

    fn enter_node(&mut self, _tree: &EventTree, node: &EventNode, depth: usize, out: &mut String) {
        out.push_str(&format!(
            "{}{} ({:.3} ms; {})\n",
            indentation(depth),
            node.display_name(),
            node.duration(),
            node.details()
        ));
    }
}

impl Reporter for PlaintextReporter {
    fn name(&self) -> &str {
        "Plaintext"
    }

    fn extension(&self) -> &str {
        "txt"
    }

    fn prefix(&self, ctx: &ReportContext<'_>) -> String {
        format!("{}\n", ctx.header)
    }

    fn body(&self, ctx: &ReportContext<'_>) -> String {
        if ctx.registry.is_empty() {
            return format!("{NO_DATA}\n");
        }

        let mut out = String::new();
        walk_registry(ctx.registry, &mut Lines, &mut out);
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ReportHeader, Settings};
    use crate::iteration::IterationRegistry;
    use iterscope_common::{EventFlags, IterationKind};

    #[test]
    fn test_indented_lines() {
        let mut registry = IterationRegistry::new();
        registry.new_iteration(IterationKind::ScriptCompilation);
        let tree = registry.last_tree_mut().unwrap();
        let compile = tree.start_span(IterationKind::ScriptCompilation, None, None);
        tree.node_mut(compile).set_start_time(10.0);
        tree.node_mut(compile).finish(30.0);
        let assembly = tree.start_span(IterationKind::AssemblyCompilation, Some("Game.dll"), None);
        tree.set_parent(assembly, IterationKind::ScriptCompilation).unwrap();
        tree.node_mut(assembly).set_start_time(12.0);
        tree.node_mut(assembly).finish(20.0);
        tree.import_subtree(assembly, "Emit", Some("Calls: 1".into()), 12.0, 13.5, EventFlags::NONE);

        let header = ReportHeader::from_settings(&Settings::default());
        let body = PlaintextReporter.body(&ReportContext { registry: &registry, header: &header });

        assert_eq!(
            body,
            "Iteration 1 (ScriptCompilation) [20.000 ms]\n\
             \tScriptCompilation (20.000 ms; )\n\
             \t\tAssemblyCompilation: Game.dll (8.000 ms; )\n\
             \t\t\tEmit (1.500 ms; Calls: 1)\n"
        );
    }
}
