//! Common test utilities for building NIfTI fixtures, session trees and
//! workflow bindings.
use flate2::Compression;
use flate2::write::GzEncoder;
use fmriflow::prelude::*;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

pub const PIXDIM_TIME_OFFSET: usize = 92;
pub const VOX_OFFSET: usize = 352;

fn put(bytes: &mut [u8], offset: usize, raw_le: &[u8], big_endian: bool) {
    let target = &mut bytes[offset..offset + raw_le.len()];
    target.copy_from_slice(raw_le);
    if big_endian {
        target.reverse();
    }
}

fn nifti1_header(
    dims: &[u16],
    datatype: i16,
    bitpix: i16,
    repetition_time: f32,
    big_endian: bool,
) -> Vec<u8> {
    let mut bytes = vec![0u8; VOX_OFFSET];
    put(&mut bytes, 0, &348i32.to_le_bytes(), big_endian);

    let mut dim = [1i16; 8];
    dim[0] = dims.len() as i16;
    for (i, d) in dims.iter().enumerate() {
        dim[i + 1] = *d as i16;
    }
    for (i, d) in dim.iter().enumerate() {
        put(&mut bytes, 40 + i * 2, &d.to_le_bytes(), big_endian);
    }

    put(&mut bytes, 70, &datatype.to_le_bytes(), big_endian);
    put(&mut bytes, 72, &bitpix.to_le_bytes(), big_endian);

    let pixdim = [1.0f32, 2.0, 2.0, 2.5, repetition_time, 0.0, 0.0, 0.0];
    for (i, p) in pixdim.iter().enumerate() {
        put(&mut bytes, 76 + i * 4, &p.to_le_bytes(), big_endian);
    }

    put(&mut bytes, 108, &(VOX_OFFSET as f32).to_le_bytes(), big_endian);
    put(&mut bytes, 112, &1.0f32.to_le_bytes(), big_endian);
    bytes[123] = 10; // mm + s
    bytes[344..348].copy_from_slice(b"n+1\0");
    bytes
}

/// Encodes a float32 NIfTI-1 single-file image.
///
/// `dims` holds up to four spatial/temporal sizes; `pixdim[4]` is set to
/// `repetition_time`.
#[allow(dead_code)]
pub fn nifti1_bytes(dims: &[u16], data: &[f32], repetition_time: f32, big_endian: bool) -> Vec<u8> {
    let mut bytes = nifti1_header(dims, 16, 32, repetition_time, big_endian); // FLOAT32
    for v in data {
        let start = bytes.len();
        bytes.extend_from_slice(&v.to_le_bytes());
        if big_endian {
            bytes[start..].reverse();
        }
    }
    bytes
}

/// Little-endian float64 variant of [`nifti1_bytes`].
#[allow(dead_code)]
pub fn nifti1_f64_bytes(dims: &[u16], data: &[f64]) -> Vec<u8> {
    let mut bytes = nifti1_header(dims, 64, 64, 0.0, false); // FLOAT64
    for v in data {
        bytes.extend_from_slice(&v.to_le_bytes());
    }
    bytes
}

#[allow(dead_code)]
pub fn gzip(bytes: &[u8]) -> Vec<u8> {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(bytes).unwrap();
    encoder.finish().unwrap()
}

#[allow(dead_code)]
pub fn gunzip(bytes: &[u8]) -> Vec<u8> {
    use std::io::Read;
    let mut out = Vec::new();
    flate2::read::GzDecoder::new(bytes)
        .read_to_end(&mut out)
        .unwrap();
    out
}

/// Writes a small gzipped 4D image with a placeholder repetition time.
#[allow(dead_code)]
pub fn write_bold(path: &Path) {
    let data: Vec<f32> = (0..16).map(|v| v as f32).collect();
    fs::write(path, gzip(&nifti1_bytes(&[2, 2, 2, 2], &data, 1.0, false))).unwrap();
}

#[allow(dead_code)]
pub fn write_sidecar(path: &Path, repetition_time: f64) {
    let json = serde_json::json!({
        "RepetitionTime": repetition_time,
        "EffectiveEchoSpacing": 0.00058,
        "PhaseEncodingDirection": "j-",
        "TaskName": path.file_stem().and_then(|s| s.to_str()).unwrap_or_default(),
    });
    fs::write(path, serde_json::to_string_pretty(&json).unwrap()).unwrap();
}

/// A scratch project with one session and a destination root inside `root`.
#[allow(dead_code)]
pub struct SessionFixture {
    pub subject: SubjectSession,
    pub config: ReorganizeConfig,
    pub fmri_dir: PathBuf,
}

/// Creates `<root>/project/.../session1` with an anatomical image and an empty
/// `fmri/` directory. Destination is `<root>/BIDSproject`.
#[allow(dead_code)]
pub fn create_session(root: &Path) -> SessionFixture {
    let subject = SubjectSession::new(root.join("project"), "P001", "1", "2");
    let source = subject.source_dir();
    fs::create_dir_all(source.join("anatomical")).unwrap();
    let fmri_dir = source.join("fmri");
    fs::create_dir_all(&fmri_dir).unwrap();

    let t1: Vec<f32> = vec![100.0; 8];
    fs::write(
        source.join("anatomical/T1w-0_defaced.nii.gz"),
        gzip(&nifti1_bytes(&[2, 2, 2], &t1, 0.0, false)),
    )
    .unwrap();

    let config = ReorganizeConfig {
        dest_root: root.join("BIDSproject"),
        ..ReorganizeConfig::default()
    };
    SessionFixture {
        subject,
        config,
        fmri_dir,
    }
}

/// Adds `<task>.json` and `<task>.nii.gz` to a functional directory.
#[allow(dead_code)]
pub fn add_task(fmri_dir: &Path, task: &str, repetition_time: f64) {
    write_sidecar(&fmri_dir.join(format!("{}.json", task)), repetition_time);
    write_bold(&fmri_dir.join(format!("{}.nii.gz", task)));
}

#[allow(dead_code)]
pub fn sorted_file_names(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = fs::read_dir(dir)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}

/// Interface bindings for the distortion-correction workflow with `volumes`
/// split volumes and one head-motion transform per volume.
#[allow(dead_code)]
pub fn sdc_bindings(volumes: usize) -> Vec<(&'static str, Datum)> {
    vec![
        (
            "in_split",
            Datum::list((0..volumes).map(|i| format!("vol{:04}.nii.gz", i))),
        ),
        ("in_reference", Datum::item("ref.nii.gz")),
        ("in_mask", Datum::item("mask.nii.gz")),
        (
            "xforms",
            Datum::list((0..volumes).map(|i| format!("hmc{:04}.tfm", i))),
        ),
        ("name_source", Datum::item("sub-01_task-rest_bold.nii.gz")),
        ("fmap_ref", Datum::item("fmap_magnitude.nii.gz")),
        ("fmap_mask", Datum::item("fmap_mask.nii.gz")),
        ("fmap", Datum::item("fmap_hz.nii.gz")),
    ]
}
