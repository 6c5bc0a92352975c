use super::operation::Operation;
use crate::error::MetadataError;
use crate::metadata::{self, Metadata};
use serde::Serialize;
use serde_json::Value;
use std::fmt;

/// A named processing step in a workflow.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Node {
    pub name: String,
    pub operation: Operation,
    /// Inputs the node is mapped over. Empty for a plain node.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub iterfields: Vec<String>,
}

impl Node {
    pub fn new(name: impl Into<String>, operation: Operation) -> Self {
        Self {
            name: name.into(),
            operation,
            iterfields: Vec::new(),
        }
    }

    /// A node that runs once per element of each of `iterfields`.
    pub fn map<S: Into<String>>(
        name: impl Into<String>,
        operation: Operation,
        iterfields: impl IntoIterator<Item = S>,
    ) -> Self {
        Self {
            name: name.into(),
            operation,
            iterfields: iterfields.into_iter().map(Into::into).collect(),
        }
    }

    pub fn is_map(&self) -> bool {
        !self.iterfields.is_empty()
    }
}

/// A conversion applied to a value while it travels along an edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum PortTransform {
    /// Metadata dictionary to `EffectiveEchoSpacing` in seconds.
    EchoSpacing,
    /// Metadata dictionary to the normalized phase-encoding axis.
    PhaseEncodingAxis,
}

impl PortTransform {
    pub fn name(&self) -> &'static str {
        match self {
            PortTransform::EchoSpacing => "get_echo_spacing",
            PortTransform::PhaseEncodingAxis => "get_pe_direction",
        }
    }

    /// Applies the conversion to a metadata value.
    pub fn apply(&self, value: &Value) -> Result<Value, MetadataError> {
        let meta: &Metadata = value
            .as_object()
            .ok_or_else(|| MetadataError::UnexpectedValue(value.clone()))?;
        match self {
            PortTransform::EchoSpacing => {
                let spacing = metadata::get_echo_spacing(meta)?;
                Ok(serde_json::Number::from_f64(spacing)
                    .map(Value::Number)
                    .unwrap_or(Value::Null))
            }
            PortTransform::PhaseEncodingAxis => {
                metadata::get_pe_direction(meta).map(Value::String)
            }
        }
    }
}

impl fmt::Display for PortTransform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// A directed connection from one node's output port to another's input port.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Edge {
    pub source: String,
    pub source_port: String,
    pub target: String,
    pub target_port: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transform: Option<PortTransform>,
}

impl fmt::Display for Edge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.transform {
            Some(t) => write!(
                f,
                "{}.{} -({})-> {}.{}",
                self.source, self.source_port, t, self.target, self.target_port
            ),
            None => write!(
                f,
                "{}.{} -> {}.{}",
                self.source, self.source_port, self.target, self.target_port
            ),
        }
    }
}
