//! # fmriflow - Distortion-Correction Graphs and BIDS Reorganization
//!
//! **fmriflow** declares the processing graphs that glue external neuroimaging
//! tools together (bias-field correction, registration, masking and
//! fieldmap-based unwarping), and ships a small reorganizer that copies one
//! scanning session into a BIDS-style directory tree.
//!
//! The numeric work is never done here. A [`workflow::Workflow`] only states
//! which tool runs with which parameters and how named outputs feed named
//! inputs; an execution engine is expected to run it. What this crate does
//! guarantee is that a graph is well formed before it leaves the builder:
//! every edge references declared ports, no input is fed twice, and the graph
//! is acyclic.
//!
//! ## Core Workflow
//!
//! 1.  **Configure**: Build an [`config::SdcSettings`] (thread count, debug mode, parameter files).
//! 2.  **Declare**: Call [`sdc::sdc_unwarp`] to get the validated distortion-correction graph.
//! 3.  **Inspect**: Export it with [`workflow::Workflow::to_json`] or [`workflow::to_dot`], or
//!     expand it into concrete jobs with [`plan::ExecutionPlan`].
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use fmriflow::prelude::*;
//!
//! fn main() -> Result<()> {
//!     let settings = SdcSettings {
//!         ants_nthreads: 8,
//!         ..SdcSettings::default()
//!     };
//!     let workflow = sdc_unwarp("SDC_unwarp", &settings)?;
//!
//!     // Four split volumes, each with its own head-motion transform.
//!     let plan = ExecutionPlan::new(
//!         &workflow,
//!         &[
//!             ("in_split", Datum::list(["vol0000.nii.gz", "vol0001.nii.gz", "vol0002.nii.gz", "vol0003.nii.gz"])),
//!             ("in_reference", Datum::item("ref.nii.gz")),
//!             ("in_mask", Datum::item("mask.nii.gz")),
//!             ("xforms", Datum::list(["hmc0.tfm", "hmc1.tfm", "hmc2.tfm", "hmc3.tfm"])),
//!             ("name_source", Datum::item("sub-01_task-rest_bold.nii.gz")),
//!             ("fmap_ref", Datum::item("fmap_magnitude.nii.gz")),
//!             ("fmap_mask", Datum::item("fmap_mask.nii.gz")),
//!             ("fmap", Datum::item("fmap_hz.nii.gz")),
//!         ],
//!     )?;
//!
//!     for job in plan.jobs() {
//!         println!("{} ({})", job.node, job.tool);
//!     }
//!     println!("{}", to_dot(&workflow));
//!     Ok(())
//! }
//! ```
//!
//! The reorganizer is a single call:
//!
//! ```rust,no_run
//! use fmriflow::prelude::*;
//!
//! # fn run() -> Result<()> {
//! let subject = SubjectSession::new("/data/project", "P001", "1", "1");
//! let report = create_bids(&subject, &ReorganizeConfig::default())?;
//! println!("copied {} functional runs", report.runs.len());
//! # Ok(())
//! # }
//! ```

pub mod bids;
pub mod config;
pub mod error;
pub mod metadata;
pub mod nifti_io;
pub mod plan;
pub mod prelude;
pub mod sdc;
pub mod workflow;
