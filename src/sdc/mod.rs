//! Susceptibility-distortion correction.
//!
//! Abbreviations used in node names: `fmap` is the fieldmap, a VSM
//! (voxel-shift map) holds displacements in voxels, and a DFM (displacement
//! field map) holds displacements in millimetres in the resampling tool's
//! warp convention.

mod unwarp;

pub use unwarp::{DEFAULT_NAME, INPUT_FIELDS, OUTPUT_FIELDS, sdc_unwarp, sdc_unwarp_default};
