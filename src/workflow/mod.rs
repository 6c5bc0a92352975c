//! Typed processing graphs.
//!
//! A [`Workflow`] is a directed acyclic graph of [`Node`]s, each wrapping an
//! [`Operation`] with declared input and output ports, joined by [`Edge`]s
//! from an output port to an input port. Graphs are assembled with a
//! [`WorkflowBuilder`], which rejects unknown nodes and ports, doubly-fed
//! inputs and cycles before a graph ever reaches an execution engine.

use ahash::AHashMap;
use serde::Serialize;

mod builder;
mod export;
mod node;
mod operation;

pub use builder::WorkflowBuilder;
pub use export::{describe, to_dot};
pub use node::{Edge, Node, PortTransform};
pub use operation::{
    ApplyTransforms, BiasFieldCorrection, Interpolation, MergeTransforms, Operation, Registration,
    ShiftMap,
};

/// Conventional name of the node exposing a workflow's inputs.
pub const INPUT_NODE: &str = "inputnode";
/// Conventional name of the node exposing a workflow's outputs.
pub const OUTPUT_NODE: &str = "outputnode";

/// A validated, acyclic processing graph.
#[derive(Debug, Clone, Serialize)]
pub struct Workflow {
    name: String,
    nodes: Vec<Node>,
    edges: Vec<Edge>,
    #[serde(skip)]
    index: AHashMap<String, usize>,
    #[serde(skip)]
    order: Vec<usize>,
}

impl Workflow {
    pub fn builder(name: impl Into<String>) -> WorkflowBuilder {
        WorkflowBuilder::new(name)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Nodes in insertion order.
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn node(&self, name: &str) -> Option<&Node> {
        self.index.get(name).map(|&i| &self.nodes[i])
    }

    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    /// Edges feeding `node`, in declaration order.
    pub fn incoming<'a>(&'a self, node: &'a str) -> impl Iterator<Item = &'a Edge> + 'a {
        self.edges.iter().filter(move |e| e.target == node)
    }

    /// Edges leaving `node`, in declaration order.
    pub fn outgoing<'a>(&'a self, node: &'a str) -> impl Iterator<Item = &'a Edge> + 'a {
        self.edges.iter().filter(move |e| e.source == node)
    }

    /// Nodes such that every edge points from an earlier to a later node.
    pub fn topological_order(&self) -> impl Iterator<Item = &Node> + '_ {
        self.order.iter().map(|&i| &self.nodes[i])
    }

    /// Fields of the [`INPUT_NODE`] boundary, if the workflow has one.
    pub fn inputs(&self) -> Vec<&str> {
        self.boundary_fields(INPUT_NODE)
    }

    /// Fields of the [`OUTPUT_NODE`] boundary, if the workflow has one.
    pub fn outputs(&self) -> Vec<&str> {
        self.boundary_fields(OUTPUT_NODE)
    }

    fn boundary_fields(&self, name: &str) -> Vec<&str> {
        match self.node(name).map(|n| &n.operation) {
            Some(Operation::Identity { fields }) => fields.iter().map(String::as_str).collect(),
            _ => Vec::new(),
        }
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    pub fn to_dot(&self) -> String {
        to_dot(self)
    }
}
