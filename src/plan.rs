//! Dry-run expansion of a workflow into the jobs an execution engine would run.
//!
//! Values are symbolic: an output is named after the node and port that
//! produces it, so a plan shows how data is routed without touching any file.

use crate::error::PlanError;
use crate::workflow::{INPUT_NODE, Node, OUTPUT_NODE, Workflow};
use ahash::AHashMap;
use itertools::Itertools;
use serde::Serialize;
use std::fmt;
use tracing::debug;

/// A symbolic value on a port.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Datum {
    Item(String),
    List(Vec<Datum>),
}

impl Datum {
    pub fn item(name: impl Into<String>) -> Self {
        Datum::Item(name.into())
    }

    pub fn list<S: Into<String>>(names: impl IntoIterator<Item = S>) -> Self {
        Datum::List(names.into_iter().map(Datum::item).collect())
    }

    /// Number of elements a map node would iterate over. A single item counts as one.
    pub fn len(&self) -> usize {
        match self {
            Datum::Item(_) => 1,
            Datum::List(items) => items.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn element(&self, index: usize) -> Datum {
        match self {
            Datum::Item(_) => self.clone(),
            Datum::List(items) => items[index].clone(),
        }
    }
}

impl fmt::Display for Datum {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Datum::Item(name) => write!(f, "{}", name),
            Datum::List(items) => write!(f, "[{}]", items.iter().join(", ")),
        }
    }
}

/// One invocation of an external tool.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Job {
    pub node: String,
    pub tool: &'static str,
    /// Position within a map node's expansion; `None` for plain nodes.
    pub index: Option<usize>,
    pub inputs: Vec<(String, Datum)>,
    pub outputs: Vec<(String, Datum)>,
}

impl Job {
    pub fn input(&self, port: &str) -> Option<&Datum> {
        lookup(&self.inputs, port)
    }

    pub fn output(&self, port: &str) -> Option<&Datum> {
        lookup(&self.outputs, port)
    }
}

fn lookup<'a>(ports: &'a [(String, Datum)], port: &str) -> Option<&'a Datum> {
    ports.iter().find(|(p, _)| p == port).map(|(_, d)| d)
}

/// The ordered job list for a workflow with its interface inputs bound.
#[derive(Debug, Clone, Serialize)]
pub struct ExecutionPlan {
    workflow: String,
    jobs: Vec<Job>,
    outputs: Vec<(String, Datum)>,
}

impl ExecutionPlan {
    /// Expands `workflow` with `bindings` supplying the fields of its input node.
    pub fn new(workflow: &Workflow, bindings: &[(&str, Datum)]) -> Result<Self, PlanError> {
        let mut produced: AHashMap<(String, String), Datum> = AHashMap::new();
        let mut jobs = Vec::new();
        let mut outputs = Vec::new();

        for node in workflow.topological_order() {
            let inputs = gather_inputs(workflow, node, &produced)?;

            if node.operation.is_identity() {
                for port in node.operation.output_ports() {
                    let value = lookup(&inputs, port).cloned().or_else(|| {
                        (node.name == INPUT_NODE)
                            .then(|| bindings.iter().find(|(f, _)| *f == port))
                            .flatten()
                            .map(|(_, d)| d.clone())
                    });
                    if let Some(value) = value {
                        if node.name == OUTPUT_NODE {
                            outputs.push((port.to_string(), value.clone()));
                        }
                        produced.insert((node.name.clone(), port.to_string()), value);
                    }
                }
                continue;
            }

            for port in node.operation.required_inputs() {
                if lookup(&inputs, port).is_none() {
                    return Err(PlanError::UnconnectedInput {
                        node: node.name.clone(),
                        port: port.to_string(),
                    });
                }
            }

            let node_jobs = expand(node, &inputs)?;
            for port in node.operation.output_ports() {
                let value = if node.is_map() {
                    Datum::List(
                        node_jobs
                            .iter()
                            .filter_map(|job| job.output(port).cloned())
                            .collect(),
                    )
                } else {
                    Datum::item(format!("{}.{}", node.name, port))
                };
                produced.insert((node.name.clone(), port.to_string()), value);
            }
            debug!(node = %node.name, jobs = node_jobs.len(), "expanded");
            jobs.extend(node_jobs);
        }

        Ok(Self {
            workflow: workflow.name().to_string(),
            jobs,
            outputs,
        })
    }

    pub fn workflow(&self) -> &str {
        &self.workflow
    }

    /// Jobs in an order that respects every dependency.
    pub fn jobs(&self) -> &[Job] {
        &self.jobs
    }

    pub fn jobs_for<'a>(&'a self, node: &'a str) -> impl Iterator<Item = &'a Job> + 'a {
        self.jobs.iter().filter(move |j| j.node == node)
    }

    /// Values that reach the output node.
    pub fn outputs(&self) -> &[(String, Datum)] {
        &self.outputs
    }

    pub fn output(&self, field: &str) -> Option<&Datum> {
        lookup(&self.outputs, field)
    }
}

fn gather_inputs(
    workflow: &Workflow,
    node: &Node,
    produced: &AHashMap<(String, String), Datum>,
) -> Result<Vec<(String, Datum)>, PlanError> {
    workflow
        .incoming(&node.name)
        .map(|edge| {
            let key = (edge.source.clone(), edge.source_port.clone());
            let datum = produced.get(&key).cloned().ok_or_else(|| {
                if edge.source == INPUT_NODE {
                    PlanError::UnboundInput(edge.source_port.clone())
                } else {
                    PlanError::UnconnectedInput {
                        node: node.name.clone(),
                        port: edge.target_port.clone(),
                    }
                }
            })?;
            let datum = match edge.transform {
                Some(t) => Datum::item(format!("{}({})", t, datum)),
                None => datum,
            };
            Ok((edge.target_port.clone(), datum))
        })
        .collect()
}

fn expand(node: &Node, inputs: &[(String, Datum)]) -> Result<Vec<Job>, PlanError> {
    let outputs_for = |index: Option<usize>| -> Vec<(String, Datum)> {
        node.operation
            .output_ports()
            .into_iter()
            .map(|port| {
                let name = match index {
                    Some(i) => format!("{}[{}].{}", node.name, i, port),
                    None => format!("{}.{}", node.name, port),
                };
                (port.to_string(), Datum::item(name))
            })
            .collect()
    };

    if !node.is_map() {
        return Ok(vec![Job {
            node: node.name.clone(),
            tool: node.operation.tool(),
            index: None,
            inputs: inputs.to_vec(),
            outputs: outputs_for(None),
        }]);
    }

    let mut lengths = Vec::with_capacity(node.iterfields.len());
    for field in &node.iterfields {
        let datum = lookup(inputs, field).ok_or_else(|| PlanError::UnconnectedInput {
            node: node.name.clone(),
            port: field.clone(),
        })?;
        lengths.push(datum.len());
    }
    if !lengths.iter().all_equal() {
        return Err(PlanError::IterfieldLengthMismatch {
            node: node.name.clone(),
            lengths,
        });
    }

    let count = lengths.first().copied().unwrap_or(0);
    let jobs = (0..count)
        .map(|i| Job {
            node: node.name.clone(),
            tool: node.operation.tool(),
            index: Some(i),
            inputs: inputs
                .iter()
                .map(|(port, datum)| {
                    if node.iterfields.contains(port) {
                        (port.clone(), datum.element(i))
                    } else {
                        (port.clone(), datum.clone())
                    }
                })
                .collect(),
            outputs: outputs_for(Some(i)),
        })
        .collect();
    Ok(jobs)
}
