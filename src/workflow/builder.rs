use super::Workflow;
use super::node::{Edge, Node, PortTransform};
use crate::error::{GraphError, PortDirection};
use ahash::{AHashMap, AHashSet};
use std::collections::VecDeque;
use tracing::debug;

/// Declares nodes and connections, validating each step as it is added.
///
/// Nodes must be added before they are connected. Port names are checked
/// against the operation's declared ports at `connect` time; acyclicity is
/// checked once at `build`.
pub struct WorkflowBuilder {
    name: String,
    nodes: Vec<Node>,
    index: AHashMap<String, usize>,
    edges: Vec<Edge>,
}

impl WorkflowBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            nodes: Vec::new(),
            index: AHashMap::new(),
            edges: Vec::new(),
        }
    }

    pub fn add_node(mut self, node: Node) -> Result<Self, GraphError> {
        if self.index.contains_key(&node.name) {
            return Err(GraphError::DuplicateNode(node.name));
        }
        if let Some(field) = node
            .iterfields
            .iter()
            .find(|f| !node.operation.has_input(f))
        {
            return Err(GraphError::InvalidIterfield {
                node: node.name.clone(),
                field: field.clone(),
            });
        }
        self.index.insert(node.name.clone(), self.nodes.len());
        self.nodes.push(node);
        Ok(self)
    }

    pub fn add_nodes(self, nodes: impl IntoIterator<Item = Node>) -> Result<Self, GraphError> {
        nodes.into_iter().try_fold(self, |builder, node| builder.add_node(node))
    }

    pub fn connect(
        self,
        source: &str,
        source_port: &str,
        target: &str,
        target_port: &str,
    ) -> Result<Self, GraphError> {
        self.push_edge(source, source_port, None, target, target_port)
    }

    /// Connects two ports, converting the value on the way.
    pub fn connect_with(
        self,
        source: &str,
        source_port: &str,
        transform: PortTransform,
        target: &str,
        target_port: &str,
    ) -> Result<Self, GraphError> {
        self.push_edge(source, source_port, Some(transform), target, target_port)
    }

    /// Connects several `(source_port, target_port)` pairs between two nodes.
    pub fn connect_many(
        self,
        source: &str,
        target: &str,
        ports: &[(&str, &str)],
    ) -> Result<Self, GraphError> {
        ports.iter().try_fold(self, |builder, (out_port, in_port)| {
            builder.connect(source, out_port, target, in_port)
        })
    }

    fn find_node(&self, name: &str, requested_by: &str) -> Result<&Node, GraphError> {
        self.index
            .get(name)
            .map(|&i| &self.nodes[i])
            .ok_or_else(|| GraphError::NodeNotFound {
                missing_node: name.to_string(),
                requested_by: requested_by.to_string(),
            })
    }

    fn push_edge(
        mut self,
        source: &str,
        source_port: &str,
        transform: Option<PortTransform>,
        target: &str,
        target_port: &str,
    ) -> Result<Self, GraphError> {
        let source_node = self.find_node(source, target)?;
        if !source_node.operation.has_output(source_port) {
            return Err(GraphError::UnknownPort {
                node: source.to_string(),
                tool: source_node.operation.tool().to_string(),
                direction: PortDirection::Output,
                port: source_port.to_string(),
            });
        }

        let target_node = self.find_node(target, source)?;
        if !target_node.operation.has_input(target_port) {
            return Err(GraphError::UnknownPort {
                node: target.to_string(),
                tool: target_node.operation.tool().to_string(),
                direction: PortDirection::Input,
                port: target_port.to_string(),
            });
        }

        if let Some(existing) = self
            .edges
            .iter()
            .find(|e| e.target == target && e.target_port == target_port)
        {
            return Err(GraphError::InputAlreadyConnected {
                node: target.to_string(),
                port: target_port.to_string(),
                existing_source: format!("{}.{}", existing.source, existing.source_port),
                new_source: format!("{}.{}", source, source_port),
            });
        }

        let edge = Edge {
            source: source.to_string(),
            source_port: source_port.to_string(),
            target: target.to_string(),
            target_port: target_port.to_string(),
            transform,
        };
        debug!(workflow = %self.name, edge = %edge, "connected");
        self.edges.push(edge);
        Ok(self)
    }

    /// Finalizes the graph. Fails if the connections form a cycle.
    pub fn build(self) -> Result<Workflow, GraphError> {
        let order = self.topological_order()?;
        Ok(Workflow {
            name: self.name,
            nodes: self.nodes,
            edges: self.edges,
            index: self.index,
            order,
        })
    }

    /// Kahn's algorithm, seeded in insertion order so the result is stable.
    fn topological_order(&self) -> Result<Vec<usize>, GraphError> {
        let mut in_degree = vec![0usize; self.nodes.len()];
        let mut successors: Vec<Vec<usize>> = vec![Vec::new(); self.nodes.len()];
        for edge in &self.edges {
            let from = self.index[&edge.source];
            let to = self.index[&edge.target];
            successors[from].push(to);
            in_degree[to] += 1;
        }

        let mut ready: VecDeque<usize> = (0..self.nodes.len())
            .filter(|&i| in_degree[i] == 0)
            .collect();
        let mut order = Vec::with_capacity(self.nodes.len());
        while let Some(current) = ready.pop_front() {
            order.push(current);
            for &next in &successors[current] {
                in_degree[next] -= 1;
                if in_degree[next] == 0 {
                    ready.push_back(next);
                }
            }
        }

        if order.len() == self.nodes.len() {
            return Ok(order);
        }

        // Every unsorted node still has an unsorted predecessor. Walking
        // predecessors from any of them must revisit a node on a cycle.
        let unsorted: AHashSet<usize> = (0..self.nodes.len())
            .filter(|&i| in_degree[i] > 0)
            .collect();
        let mut visited = AHashSet::new();
        let mut current = (0..self.nodes.len())
            .find(|i| unsorted.contains(i))
            .unwrap_or_default();
        while visited.insert(current) {
            let name = &self.nodes[current].name;
            current = self
                .edges
                .iter()
                .filter(|e| &e.target == name)
                .map(|e| self.index[&e.source])
                .find(|i| unsorted.contains(i))
                .unwrap_or(current);
        }
        Err(GraphError::CycleDetected {
            workflow: self.name.clone(),
            node: self.nodes[current].name.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflow::Operation;

    fn passthrough(name: &str) -> Node {
        Node::new(name, Operation::identity(["value"]))
    }

    #[test]
    fn cycle_is_reported_on_a_member_node() {
        let result = WorkflowBuilder::new("loop")
            .add_nodes([passthrough("head"), passthrough("a"), passthrough("b")])
            .and_then(|b| b.connect("head", "value", "a", "value"))
            .and_then(|b| b.connect("a", "value", "b", "value"))
            .and_then(|b| b.connect("b", "value", "a", "value"));
        // `a.value` is already fed by `head`, so the back edge is rejected first.
        assert!(matches!(
            result,
            Err(GraphError::InputAlreadyConnected { .. })
        ));

        let two_port = |name: &str| Node::new(name, Operation::identity(["x", "y"]));
        let err = WorkflowBuilder::new("loop")
            .add_nodes([passthrough("head"), two_port("a"), two_port("b")])
            .and_then(|b| b.connect("head", "value", "a", "x"))
            .and_then(|b| b.connect("a", "x", "b", "x"))
            .and_then(|b| b.connect("b", "x", "a", "y"))
            .and_then(|b| b.build())
            .unwrap_err();
        match err {
            GraphError::CycleDetected { workflow, node } => {
                assert_eq!(workflow, "loop");
                assert!(node == "a" || node == "b");
            }
            other => panic!("Expected CycleDetected, got {other:?}"),
        }
    }

    #[test]
    fn self_loop_is_a_cycle() {
        let err = WorkflowBuilder::new("self")
            .add_node(Node::new("n", Operation::identity(["x", "y"])))
            .and_then(|b| b.connect("n", "x", "n", "y"))
            .and_then(|b| b.build())
            .unwrap_err();
        assert_eq!(
            err,
            GraphError::CycleDetected {
                workflow: "self".to_string(),
                node: "n".to_string(),
            }
        );
    }
}
