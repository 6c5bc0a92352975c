use serde::Serialize;
use std::fmt;
use std::path::PathBuf;

/// Interpolation kernels understood by the resampling tool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Interpolation {
    Linear,
    NearestNeighbor,
    BSpline,
    LanczosWindowedSinc,
}

impl fmt::Display for Interpolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Interpolation::Linear => "Linear",
            Interpolation::NearestNeighbor => "NearestNeighbor",
            Interpolation::BSpline => "BSpline",
            Interpolation::LanczosWindowedSinc => "LanczosWindowedSinc",
        };
        write!(f, "{}", name)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BiasFieldCorrection {
    pub dimension: u8,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Registration {
    /// Parameter file describing stages, metrics and convergence.
    pub settings_file: PathBuf,
    pub output_warped_image: bool,
    pub output_inverse_warped_image: bool,
    pub num_threads: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ShiftMap {
    pub save_unmasked_shift: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ApplyTransforms {
    pub dimension: u8,
    pub interpolation: Interpolation,
    pub float: bool,
    pub generate_report: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MergeTransforms {
    pub in_file_invert: bool,
    pub invert_transform_flags: Vec<bool>,
}

/// A processing step, tagged by the external capability it invokes.
///
/// Every variant declares a fixed set of named input and output ports; edges
/// may only reference those names.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "params")]
pub enum Operation {
    /// Pass-through node used for the workflow's interface boundary. Every
    /// field is both an input and an output.
    Identity { fields: Vec<String> },
    ReadSidecarJson,
    SelectReference,
    N4BiasFieldCorrection(BiasFieldCorrection),
    /// Warps a fieldmap's magnitude image so it looks like a distorted EPI.
    WarpReference,
    ApplyMask,
    AffineInitializer,
    Registration(Registration),
    Hz2Rads,
    Fugue(ShiftMap),
    ApplyTransforms(ApplyTransforms),
    /// Voxel-shift map to displacement field conversion.
    Vsm2Warp,
    Mean,
    MaskEpi,
    MergeTransforms(MergeTransforms),
}

impl Operation {
    pub fn identity<S: Into<String>>(fields: impl IntoIterator<Item = S>) -> Self {
        Operation::Identity {
            fields: fields.into_iter().map(Into::into).collect(),
        }
    }

    /// Name of the external program (or interface) this step stands for.
    pub fn tool(&self) -> &'static str {
        match self {
            Operation::Identity { .. } => "IdentityInterface",
            Operation::ReadSidecarJson => "ReadSidecarJSON",
            Operation::SelectReference => "SelectReference",
            Operation::N4BiasFieldCorrection(_) => "N4BiasFieldCorrection",
            Operation::WarpReference => "WarpReference",
            Operation::ApplyMask => "ApplyMask",
            Operation::AffineInitializer => "antsAffineInitializer",
            Operation::Registration(_) => "antsRegistration",
            Operation::Hz2Rads => "hz2rads",
            Operation::Fugue(_) => "fugue",
            Operation::ApplyTransforms(_) => "antsApplyTransforms",
            Operation::Vsm2Warp => "FUGUEvsm2ANTSwarp",
            Operation::Mean => "Mean",
            Operation::MaskEpi => "MaskEPI",
            Operation::MergeTransforms(_) => "MergeANTsTransforms",
        }
    }

    pub fn is_identity(&self) -> bool {
        matches!(self, Operation::Identity { .. })
    }

    pub fn input_ports(&self) -> Vec<&str> {
        let fixed: &[&str] = match self {
            Operation::Identity { fields } => return fields.iter().map(String::as_str).collect(),
            Operation::ReadSidecarJson => &["in_file"],
            Operation::SelectReference => &["in_files", "reference"],
            Operation::N4BiasFieldCorrection(_) => &["input_image", "mask_image", "weight_image"],
            Operation::WarpReference => &["fmap_ref", "in_file", "in_mask", "echospacing", "pe_dir"],
            Operation::ApplyMask => &["in_file", "in_mask"],
            Operation::AffineInitializer => &["fixed_image", "moving_image"],
            Operation::Registration(_) => &[
                "fixed_image",
                "moving_image",
                "initial_moving_transform",
                "fixed_image_mask",
                "moving_image_mask",
            ],
            Operation::Hz2Rads => &["in_file"],
            Operation::Fugue(_) => &[
                "fmap_in_file",
                "dwell_time",
                "unwarp_direction",
                "in_file",
                "mask_file",
            ],
            Operation::ApplyTransforms(_) => &[
                "input_image",
                "reference_image",
                "transforms",
                "invert_transform_flags",
            ],
            Operation::Vsm2Warp => &["in_file", "pe_dir"],
            Operation::Mean => &["in_files"],
            Operation::MaskEpi => &["in_files"],
            Operation::MergeTransforms(_) => &["in_file", "transforms", "invert_transform_flags"],
        };
        fixed.to_vec()
    }

    /// Inputs that must be connected for the step to run.
    pub fn required_inputs(&self) -> Vec<&str> {
        let required: &[&str] = match self {
            Operation::Identity { .. } => &[],
            Operation::ReadSidecarJson | Operation::Hz2Rads => &["in_file"],
            Operation::SelectReference => &["in_files"],
            Operation::N4BiasFieldCorrection(_) => &["input_image"],
            Operation::WarpReference => &["fmap_ref", "in_file", "in_mask", "echospacing", "pe_dir"],
            Operation::ApplyMask => &["in_file", "in_mask"],
            Operation::AffineInitializer | Operation::Registration(_) => {
                &["fixed_image", "moving_image"]
            }
            Operation::Fugue(_) => &["fmap_in_file", "dwell_time", "unwarp_direction"],
            Operation::ApplyTransforms(_) => &["input_image", "reference_image", "transforms"],
            Operation::Vsm2Warp => &["in_file", "pe_dir"],
            Operation::Mean | Operation::MaskEpi => &["in_files"],
            Operation::MergeTransforms(_) => &["in_file", "transforms"],
        };
        required.to_vec()
    }

    pub fn output_ports(&self) -> Vec<&str> {
        let fixed: &[&str] = match self {
            Operation::Identity { fields } => return fields.iter().map(String::as_str).collect(),
            Operation::Registration(params) => {
                let mut ports = vec![
                    "forward_transforms",
                    "reverse_transforms",
                    "composite_transform",
                    "inverse_composite_transform",
                ];
                if params.output_warped_image {
                    ports.push("warped_image");
                }
                if params.output_inverse_warped_image {
                    ports.push("inverse_warped_image");
                }
                return ports;
            }
            Operation::ReadSidecarJson => &["out_dict"],
            Operation::SelectReference => &["reference"],
            Operation::N4BiasFieldCorrection(_) => &["output_image", "bias_image"],
            Operation::WarpReference => &["out_warped", "out_mask"],
            Operation::ApplyMask => &["out_file"],
            Operation::AffineInitializer => &["out_file"],
            Operation::Hz2Rads => &["out_file"],
            Operation::Fugue(_) => &[
                "shift_out_file",
                "unwarped_file",
                "warped_file",
                "fmap_out_file",
            ],
            Operation::ApplyTransforms(_) => &["output_image"],
            Operation::Vsm2Warp => &["out_file"],
            Operation::Mean => &["out_file"],
            Operation::MaskEpi => &["out_mask"],
            Operation::MergeTransforms(_) => &["transforms"],
        };
        fixed.to_vec()
    }

    pub fn has_input(&self, port: &str) -> bool {
        self.input_ports().contains(&port)
    }

    pub fn has_output(&self, port: &str) -> bool {
        self.output_ports().contains(&port)
    }
}
