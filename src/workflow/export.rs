use super::{Node, Workflow};
use itertools::Itertools;
use std::fmt::Write;

/// Renders a workflow as a Graphviz `digraph`. Map nodes are drawn as
/// stacked boxes; transformed edges carry the transform in their label.
pub fn to_dot(workflow: &Workflow) -> String {
    let mut output = String::new();
    writeln!(&mut output, "digraph \"{}\" {{", workflow.name()).unwrap();
    writeln!(&mut output, "  rankdir=TB;").unwrap();

    for node in workflow.nodes() {
        let shape = if node.operation.is_identity() {
            "ellipse"
        } else if node.is_map() {
            "box3d"
        } else {
            "box"
        };
        writeln!(
            &mut output,
            "  \"{}\" [shape={}, label=\"{}\\n({})\"];",
            node.name,
            shape,
            node.name,
            node.operation.tool()
        )
        .unwrap();
    }

    // Consecutive connections between the same pair share one arrow.
    let grouped = workflow
        .edges()
        .iter()
        .chunk_by(|e| (e.source.as_str(), e.target.as_str()));
    for ((source, target), edges) in &grouped {
        let label = edges
            .map(|e| match e.transform {
                Some(t) => format!("{}:{} -> {}", e.source_port, t, e.target_port),
                None => format!("{} -> {}", e.source_port, e.target_port),
            })
            .join("\\n");
        writeln!(
            &mut output,
            "  \"{}\" -> \"{}\" [label=\"{}\"];",
            source, target, label
        )
        .unwrap();
    }

    writeln!(&mut output, "}}").unwrap();
    output
}

/// A plain-text listing of the workflow in execution order.
pub fn describe(workflow: &Workflow) -> String {
    let mut output = String::new();
    writeln!(
        &mut output,
        "======== WORKFLOW: {} ({} nodes, {} edges) ========",
        workflow.name(),
        workflow.nodes().len(),
        workflow.edges().len()
    )
    .unwrap();

    for (i, node) in workflow.topological_order().enumerate() {
        writeln!(&mut output, "\n{:02}: {}", i, header(node)).unwrap();
        for edge in workflow.incoming(&node.name) {
            let via = edge
                .transform
                .map(|t| format!(" via {}", t))
                .unwrap_or_default();
            writeln!(
                &mut output,
                "      {:<24} <- {}.{}{}",
                edge.target_port, edge.source, edge.source_port, via
            )
            .unwrap();
        }
    }
    output
}

fn header(node: &Node) -> String {
    if node.is_map() {
        format!(
            "{} [{}] (map over {})",
            node.name,
            node.operation.tool(),
            node.iterfields.iter().join(", ")
        )
    } else {
        format!("{} [{}]", node.name, node.operation.tool())
    }
}
