//! Prelude module for convenient imports
//!
//! This module re-exports the most commonly used types and functions from the
//! fmriflow crate.
//!
//! # Example
//!
//! ```rust,no_run
//! use fmriflow::prelude::*;
//!
//! # fn run_example() -> Result<()> {
//! let workflow = sdc_unwarp_default()?;
//! println!("{}", describe(&workflow));
//! # Ok(())
//! # }
//! ```

// Graph declaration
pub use crate::workflow::{
    Edge, INPUT_NODE, Interpolation, Node, OUTPUT_NODE, Operation, PortTransform, Workflow,
    WorkflowBuilder, describe, to_dot,
};

// Planning
pub use crate::plan::{Datum, ExecutionPlan, Job};

// Distortion correction
pub use crate::sdc::{sdc_unwarp, sdc_unwarp_default};

// Reorganizer
pub use crate::bids::{FunctionalRun, ReorganizeReport, SubjectSession, create_bids};

// Configuration
pub use crate::config::{ReorganizeConfig, SdcSettings};

// Metadata helpers
pub use crate::metadata::{Metadata, get_echo_spacing, get_pe_direction, normalize_axis, read_sidecar};

// Error types
pub use crate::error::{
    ConfigError, GraphError, MetadataError, NiftiIoError, PlanError, ReorganizeError,
};

// Result type alias for convenience
pub type Result<T> = std::result::Result<T, Box<dyn std::error::Error>>;
