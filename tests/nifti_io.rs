//! Tests for NIfTI header patching and voxel scaling.
mod common;
use common::*;
use fmriflow::error::NiftiIoError;
use fmriflow::nifti_io::{
    hz_to_rads, read_repetition_time, scale_image, set_repetition_time,
    set_repetition_time_checked,
};
use nifti::{IntoNdArray, NiftiObject, ReaderOptions};
use std::f32::consts::PI;
use std::fs;

#[test]
fn test_patch_gzipped_image_changes_only_time_field() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("bold.nii.gz");
    let data: Vec<f32> = (0..8).map(|v| v as f32 * 1.5).collect();
    let original = nifti1_bytes(&[2, 2, 1, 2], &data, 1.0, false);
    fs::write(&path, gzip(&original)).unwrap();

    set_repetition_time(&path, 0.72).unwrap();

    let patched = gunzip(&fs::read(&path).unwrap());
    assert_eq!(patched.len(), original.len());
    assert_eq!(
        &patched[PIXDIM_TIME_OFFSET..PIXDIM_TIME_OFFSET + 4],
        &0.72f32.to_le_bytes()
    );
    assert_eq!(&patched[..PIXDIM_TIME_OFFSET], &original[..PIXDIM_TIME_OFFSET]);
    assert_eq!(
        &patched[PIXDIM_TIME_OFFSET + 4..],
        &original[PIXDIM_TIME_OFFSET + 4..]
    );
    assert_eq!(read_repetition_time(&path).unwrap(), 0.72f32);
}

#[test]
fn test_patch_uncompressed_big_endian_image() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("bold.nii");
    fs::write(&path, nifti1_bytes(&[2, 2, 2], &[0.0; 8], 3.0, true)).unwrap();

    set_repetition_time_checked(&path, 2.5).unwrap();

    let bytes = fs::read(&path).unwrap();
    assert_eq!(
        &bytes[PIXDIM_TIME_OFFSET..PIXDIM_TIME_OFFSET + 4],
        &2.5f32.to_be_bytes()
    );
    assert_eq!(read_repetition_time(&path).unwrap(), 2.5);
}

#[test]
fn test_patch_rejects_non_nifti_files() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("notes.nii");
    fs::write(&path, vec![7u8; 400]).unwrap();

    let err = set_repetition_time(&path, 2.0).unwrap_err();
    assert!(matches!(err, NiftiIoError::UnsupportedFormat { .. }));
    // The file is left as it was.
    assert_eq!(fs::read(&path).unwrap(), vec![7u8; 400]);
}

#[test]
fn test_patch_missing_file_is_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = set_repetition_time(dir.path().join("absent.nii.gz"), 2.0).unwrap_err();
    assert!(matches!(err, NiftiIoError::Io { .. }));
}

#[test]
fn test_hz_to_rads_scales_every_voxel() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("fmap.nii.gz");
    let output = dir.path().join("fmap_rads.nii.gz");
    let hz = [0.0f32, 1.0, -2.5, 10.0];
    fs::write(&input, gzip(&nifti1_bytes(&[2, 2, 1], &hz, 0.0, false))).unwrap();

    let written = hz_to_rads(&input, Some(&output)).unwrap();
    assert_eq!(written, output);

    let object = ReaderOptions::new().read_file(&output).unwrap();
    let rads = object.into_volume().into_ndarray::<f32>().unwrap();
    let mut values: Vec<f32> = rads.iter().copied().collect();
    values.sort_by(|a, b| a.partial_cmp(b).unwrap());
    let mut expected: Vec<f32> = hz.iter().map(|v| v * 2.0 * PI).collect();
    expected.sort_by(|a, b| a.partial_cmp(b).unwrap());
    for (got, want) in values.iter().zip(&expected) {
        assert!((got - want).abs() < 1e-4, "{} != {}", got, want);
    }
}

#[test]
fn test_scale_image_with_custom_factor() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("in.nii");
    let output = dir.path().join("out.nii");
    fs::write(&input, nifti1_bytes(&[2, 1, 1], &[3.0, -4.0], 0.0, false)).unwrap();

    scale_image(&input, 0.5, Some(&output)).unwrap();

    let scaled = ReaderOptions::new()
        .read_file(&output)
        .unwrap()
        .into_volume()
        .into_ndarray::<f32>()
        .unwrap();
    let mut values: Vec<f32> = scaled.iter().copied().collect();
    values.sort_by(|a, b| a.partial_cmp(b).unwrap());
    assert_eq!(values, vec![-2.0, 1.5]);
}

#[test]
fn test_hz_to_rads_scales_float64_input_at_full_precision() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("fmap64.nii");
    let output = dir.path().join("fmap64_rads.nii");
    let hz = [123.456_789_012_345_f64, -0.000_123_456_789];
    fs::write(&input, nifti1_f64_bytes(&[2, 1, 1], &hz)).unwrap();

    hz_to_rads(&input, Some(&output)).unwrap();

    let rads = ReaderOptions::new()
        .read_file(&output)
        .unwrap()
        .into_volume()
        .into_ndarray::<f32>()
        .unwrap();
    let mut values: Vec<f32> = rads.iter().copied().collect();
    values.sort_by(|a, b| a.partial_cmp(b).unwrap());
    let mut expected: Vec<f32> = hz
        .iter()
        .map(|v| (v * 2.0 * std::f64::consts::PI) as f32)
        .collect();
    expected.sort_by(|a, b| a.partial_cmp(b).unwrap());
    assert_eq!(values, expected);
}
