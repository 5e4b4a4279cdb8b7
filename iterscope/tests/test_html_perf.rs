use iterscope::config::{ReportHeader, Settings};
use iterscope::export::{HtmlPerfReporter, ReportContext, Reporter};
use iterscope::iteration::IterationRegistry;
use iterscope_common::{EventFlags, IterationKind};

/// Root of 100 ms with a chain `Chain 1 > Chain 2 > Chain 3 > Chain 4` each
/// holding 99 ms, and a 0.5 ms sibling subtree.
fn chain_registry() -> IterationRegistry {
    let mut registry = IterationRegistry::new();
    registry.new_iteration(IterationKind::AssemblyReload);
    let tree = registry.last_tree_mut().unwrap();

    let root = tree.start_span(IterationKind::AssemblyReload, Some("Root"), None);
    tree.node_mut(root).set_start_time(1.0);
    tree.node_mut(root).finish(101.0);

    let mut parent = root;
    for link in 1..=4 {
        let name = format!("Chain {link}");
        parent = tree.import_subtree(parent, name, None, 1.0, 100.0, EventFlags::NONE);
    }
    let small = tree.import_subtree(root, "Sibling", None, 100.0, 100.5, EventFlags::NONE);
    tree.import_subtree(small, "Sibling Child", None, 100.0, 100.3, EventFlags::NONE);
    registry
}

fn render(registry: &IterationRegistry) -> String {
    let settings = Settings::default();
    let header = ReportHeader::from_settings(&settings);
    HtmlPerfReporter::from_settings(&settings).render(&ReportContext { registry, header: &header })
}

#[test]
fn test_dominant_chain_collapses_into_ancestor() {
    let html = render(&chain_registry());

    // Root keeps its own box, the chain passes through to its last link.
    assert!(html.contains(">Root</div>"));
    for link in 1..=3 {
        assert!(!html.contains(&format!("Chain {link}")), "Chain {link} got a box");
    }
    assert!(html.contains("<div>[Chain 4]</div>"));
}

#[test]
fn test_small_sibling_is_terminal_only() {
    let html = render(&chain_registry());

    assert!(html.contains("<div>{Sibling}</div>"));
    assert!(html.contains("<div class=\"PercentageDisplay\">0.50%</div>"));
    assert!(!html.contains("Sibling Child"));
}

#[test]
fn test_summaries_follow_iteration() {
    let html = render(&chain_registry());

    let tree_end = html.find("[Chain 4]").unwrap();
    let summary = html.find("[MISSING MARKER TIME]").unwrap();
    assert!(summary > tree_end);
    // Root: 100 - (99 + 0.5). Every chain link is fully covered.
    assert!(html.contains(
        "\t<div class=\"TimeDisplay\">0.500 ms</div>\n\
         \t<div class=\"PercentageDisplay\">0.50%</div>\n\
         \t<div style=\"color:#B54\">[MISSING MARKER TIME] (1)</div>"
    ));
    assert!(html.contains("GUI Stuff (0)"));
    assert!(html.trim_end().ends_with("</html>"));
}

#[test]
fn test_divergence_threshold_is_configurable() {
    let registry = chain_registry();
    let settings = Settings { divergence_percentage: 100.0, ..Settings::default() };
    let header = ReportHeader::from_settings(&settings);
    let html = HtmlPerfReporter::from_settings(&settings)
        .render(&ReportContext { registry: &registry, header: &header });

    // No link exceeds its parent's full share, so every link gets a box.
    assert!(html.contains(">Chain 1</div>"));
    assert!(html.contains(">Chain 3</div>"));
}
