use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while declaring a workflow graph.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GraphError {
    #[error("Node '{0}' is declared more than once in workflow")]
    DuplicateNode(String),

    #[error("Node '{missing_node}' not found, which is required by a connection from node '{requested_by}'")]
    NodeNotFound {
        missing_node: String,
        requested_by: String,
    },

    #[error("Node '{node}' ({tool}) has no {direction} port named '{port}'")]
    UnknownPort {
        node: String,
        tool: String,
        direction: PortDirection,
        port: String,
    },

    #[error(
        "Input '{port}' of node '{node}' is already connected from '{existing_source}', cannot connect it again from '{new_source}'"
    )]
    InputAlreadyConnected {
        node: String,
        port: String,
        existing_source: String,
        new_source: String,
    },

    #[error("Map node '{node}' iterates over '{field}', which is not one of its inputs")]
    InvalidIterfield { node: String, field: String },

    #[error("Workflow '{workflow}' contains a cycle through node '{node}'")]
    CycleDetected { workflow: String, node: String },
}

/// Which side of a node a port lives on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PortDirection {
    Input,
    Output,
}

impl std::fmt::Display for PortDirection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PortDirection::Input => write!(f, "input"),
            PortDirection::Output => write!(f, "output"),
        }
    }
}

/// Errors raised while expanding a workflow into concrete jobs.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PlanError {
    #[error("Interface field '{0}' of the input node has no bound value")]
    UnboundInput(String),

    #[error("Input '{port}' of node '{node}' is not connected")]
    UnconnectedInput { node: String, port: String },

    #[error("Map node '{node}' iterfields have different lengths: {lengths:?}")]
    IterfieldLengthMismatch { node: String, lengths: Vec<usize> },
}

/// Errors raised while reading sidecar metadata.
#[derive(Error, Debug)]
pub enum MetadataError {
    #[error("Could not read sidecar '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Sidecar '{path}' is not valid JSON: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Sidecar '{0}' does not contain a JSON object")]
    NotAnObject(PathBuf),

    #[error("Expected a metadata object, found {0}")]
    UnexpectedValue(serde_json::Value),

    #[error("Metadata key '{0}' not found")]
    MissingKey(&'static str),

    #[error("Metadata key '{key}' is not numeric: {found}")]
    NotNumeric {
        key: &'static str,
        found: serde_json::Value,
    },

    #[error("Metadata key '{key}' is not a string: {found}")]
    NotString {
        key: &'static str,
        found: serde_json::Value,
    },
}

/// Errors raised by NIfTI header patching and voxel scaling.
#[derive(Error, Debug)]
pub enum NiftiIoError {
    #[error("I/O error on '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("'{path}' is not a NIfTI-1 image: {reason}")]
    UnsupportedFormat { path: PathBuf, reason: String },

    #[error(transparent)]
    Nifti(#[from] nifti::NiftiError),

    #[error("Repetition time written to '{path}' reads back as {found}, expected {expected}")]
    RepetitionTimeMismatch {
        path: PathBuf,
        expected: f32,
        found: f32,
    },

    #[error("Cannot derive an output name from '{0}'")]
    InvalidFilename(PathBuf),
}

/// Errors raised by the directory reorganizer.
#[derive(Error, Debug)]
pub enum ReorganizeError {
    #[error("Could not create directory '{path}': {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Could not copy '{from}' to '{to}': {source}")]
    Copy {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Could not walk functional directory: {0}")]
    Walk(#[from] walkdir::Error),

    #[error("Functional image '{0}' has no sidecar with the same name")]
    MissingSidecar(PathBuf),

    #[error("Sidecar '{path}': {source}")]
    Metadata {
        path: PathBuf,
        #[source]
        source: MetadataError,
    },

    #[error(transparent)]
    Nifti(#[from] NiftiIoError),
}

/// Errors raised while loading configuration files.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Could not read config '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config '{path}': {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}
