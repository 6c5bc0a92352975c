use crate::config::SdcSettings;
use crate::error::GraphError;
use crate::workflow::{
    ApplyTransforms, BiasFieldCorrection, INPUT_NODE, Interpolation, MergeTransforms, Node,
    OUTPUT_NODE, Operation, PortTransform, Registration, ShiftMap, Workflow, WorkflowBuilder,
};
use tracing::info;

pub const DEFAULT_NAME: &str = "SDC_unwarp";

/// Fields of the input boundary node.
pub const INPUT_FIELDS: [&str; 8] = [
    "in_split",
    "in_reference",
    "in_mask",
    "xforms",
    "name_source",
    "fmap_ref",
    "fmap_mask",
    "fmap",
];

/// Fields of the output boundary node.
pub const OUTPUT_FIELDS: [&str; 4] = ["out_files", "out_reference", "out_warps", "out_mask"];

fn n4() -> Operation {
    Operation::N4BiasFieldCorrection(BiasFieldCorrection { dimension: 3 })
}

fn resample(interpolation: Interpolation) -> Operation {
    Operation::ApplyTransforms(ApplyTransforms {
        dimension: 3,
        interpolation,
        float: true,
        generate_report: false,
    })
}

/// Builds the graph that turns a fieldmap (in Hz) into a displacement field
/// and applies it to every volume of a split EPI run.
///
/// The fieldmap magnitude is warped to look like a distorted EPI and
/// registered to the EPI reference; the voxel-shift map derived from the
/// fieldmap is then carried into EPI space with the inverse of that
/// registration, converted to a displacement field, applied per volume and
/// merged with the head-motion transforms supplied on `xforms`.
///
/// The graph is only declared here. Nothing is executed and no metadata is
/// read until an engine runs it.
pub fn sdc_unwarp(name: &str, settings: &SdcSettings) -> Result<Workflow, GraphError> {
    let registration = Registration {
        settings_file: settings.registration_settings_file(),
        output_warped_image: true,
        output_inverse_warped_image: true,
        num_threads: settings.ants_nthreads,
    };

    let nodes = [
        Node::new(INPUT_NODE, Operation::identity(INPUT_FIELDS)),
        Node::new(OUTPUT_NODE, Operation::identity(OUTPUT_FIELDS)),
        Node::new("metadata", Operation::ReadSidecarJson),
        // Target image for registration
        Node::new("ref_select", Operation::SelectReference),
        Node::new("ref_inu", n4()),
        // Fieldmap reference, faked into a distorted-looking EPI
        Node::new("mag_warped", Operation::WarpReference),
        Node::new("mag_mask", Operation::ApplyMask),
        Node::new("mag_inu", n4()),
        Node::new("ants_init", Operation::AffineInitializer),
        Node::new("fmapref2ref", Operation::Registration(registration)),
        // Fieldmap to rad/s, then to a voxel-shift map
        Node::new("fmap_hz2rads", Operation::Hz2Rads),
        Node::new(
            "fmap_shiftmap",
            Operation::Fugue(ShiftMap {
                save_unmasked_shift: true,
            }),
        ),
        Node::new("fmap2ref", resample(Interpolation::BSpline)),
        Node::new("fmap2dfm", Operation::Vsm2Warp),
        Node::map(
            "unwarp_all",
            resample(Interpolation::LanczosWindowedSinc),
            ["input_image"],
        ),
        Node::new("mean", Operation::Mean),
        Node::new("mask", Operation::MaskEpi),
        Node::new("ref_avg_inu", n4()),
        Node::map(
            "concat_hmc_sdc_xforms",
            Operation::MergeTransforms(MergeTransforms {
                in_file_invert: false,
                invert_transform_flags: vec![false],
            }),
            ["in_file"],
        ),
    ];

    let builder = Workflow::builder(name).add_nodes(nodes)?;
    let builder = connect_inputs(builder)?;
    let builder = connect_metadata(builder)?;
    let builder = connect_registration(builder)?;
    let builder = connect_unwarping(builder)?;
    let workflow = builder.build()?;

    info!(
        workflow = %workflow.name(),
        nodes = workflow.nodes().len(),
        edges = workflow.edges().len(),
        settings_file = %settings.registration_settings_file().display(),
        "declared distortion-correction workflow"
    );
    Ok(workflow)
}

/// [`sdc_unwarp`] with default settings and the conventional name.
pub fn sdc_unwarp_default() -> Result<Workflow, GraphError> {
    sdc_unwarp(DEFAULT_NAME, &SdcSettings::default())
}

fn connect_inputs(builder: WorkflowBuilder) -> Result<WorkflowBuilder, GraphError> {
    builder
        .connect(INPUT_NODE, "name_source", "metadata", "in_file")?
        .connect(INPUT_NODE, "fmap", "fmap_hz2rads", "in_file")?
        .connect_many(
            INPUT_NODE,
            "ref_select",
            &[("in_reference", "reference"), ("in_split", "in_files")],
        )?
        .connect_many(
            INPUT_NODE,
            "mag_warped",
            &[("fmap_ref", "fmap_ref"), ("fmap_mask", "in_mask")],
        )?
        .connect(INPUT_NODE, "xforms", "concat_hmc_sdc_xforms", "in_file")
}

/// Echo spacing and phase-encoding axis are read once and fanned out.
fn connect_metadata(builder: WorkflowBuilder) -> Result<WorkflowBuilder, GraphError> {
    use PortTransform::{EchoSpacing, PhaseEncodingAxis};
    builder
        .connect_with("metadata", "out_dict", EchoSpacing, "mag_warped", "echospacing")?
        .connect_with("metadata", "out_dict", PhaseEncodingAxis, "mag_warped", "pe_dir")?
        .connect_with("metadata", "out_dict", EchoSpacing, "fmap_shiftmap", "dwell_time")?
        .connect_with(
            "metadata",
            "out_dict",
            PhaseEncodingAxis,
            "fmap_shiftmap",
            "unwarp_direction",
        )?
        .connect_with("metadata", "out_dict", PhaseEncodingAxis, "fmap2dfm", "pe_dir")
}

fn connect_registration(builder: WorkflowBuilder) -> Result<WorkflowBuilder, GraphError> {
    builder
        .connect("fmap_hz2rads", "out_file", "fmap_shiftmap", "fmap_in_file")?
        .connect("fmap_hz2rads", "out_file", "mag_warped", "in_file")?
        .connect("ref_select", "reference", "ref_inu", "input_image")?
        .connect_many(
            "mag_warped",
            "mag_mask",
            &[("out_warped", "in_file"), ("out_mask", "in_mask")],
        )?
        .connect("mag_mask", "out_file", "mag_inu", "input_image")?
        .connect("ref_inu", "output_image", "ants_init", "moving_image")?
        .connect("mag_inu", "output_image", "ants_init", "fixed_image")?
        .connect("ants_init", "out_file", "fmapref2ref", "initial_moving_transform")?
        .connect("ref_inu", "output_image", "fmapref2ref", "moving_image")?
        .connect("mag_inu", "output_image", "fmapref2ref", "fixed_image")
}

fn connect_unwarping(builder: WorkflowBuilder) -> Result<WorkflowBuilder, GraphError> {
    builder
        // Shift map into EPI space, then into a displacement field
        .connect("fmap_shiftmap", "shift_out_file", "fmap2ref", "input_image")?
        .connect("ref_select", "reference", "fmap2ref", "reference_image")?
        .connect(
            "fmapref2ref",
            "inverse_composite_transform",
            "fmap2ref",
            "transforms",
        )?
        .connect("fmap2ref", "output_image", "fmap2dfm", "in_file")?
        // One resampling per split volume
        .connect("fmap2dfm", "out_file", "unwarp_all", "transforms")?
        .connect("ref_select", "reference", "unwarp_all", "reference_image")?
        .connect(INPUT_NODE, "in_split", "unwarp_all", "input_image")?
        .connect("unwarp_all", "output_image", "mean", "in_files")?
        .connect("fmap2dfm", "out_file", "concat_hmc_sdc_xforms", "transforms")?
        .connect("mean", "out_file", "mask", "in_files")?
        .connect("mask", "out_mask", OUTPUT_NODE, "out_mask")?
        .connect("mean", "out_file", "ref_avg_inu", "input_image")?
        .connect("ref_avg_inu", "output_image", OUTPUT_NODE, "out_reference")?
        .connect("unwarp_all", "output_image", OUTPUT_NODE, "out_files")?
        .connect("concat_hmc_sdc_xforms", "transforms", OUTPUT_NODE, "out_warps")
}
