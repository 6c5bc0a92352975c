//! NIfTI header patching and voxel scaling.
//!
//! Header edits are done on the raw bytes so the image data and every other
//! header field survive untouched; reading back goes through the `nifti` crate.

use crate::error::NiftiIoError;
use flate2::Compression;
use flate2::read::MultiGzDecoder;
use flate2::write::GzEncoder;
use nifti::writer::WriterOptions;
use nifti::{IntoNdArray, NiftiHeader, NiftiObject, ReaderOptions};
use std::f64::consts::PI;
use std::fs;
use std::io::{Cursor, Read, Write};
use std::path::{Path, PathBuf};
use tracing::debug;

const NIFTI1_HEADER_SIZE: i32 = 348;
/// `pixdim[4]`, the temporal resolution: pixdim starts at byte 76, one f32 per slot.
const PIXDIM_TIME_OFFSET: usize = 76 + 4 * 4;
const MAGIC_OFFSET: usize = 344;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ByteOrder {
    Little,
    Big,
}

fn is_gzip(bytes: &[u8]) -> bool {
    bytes.len() >= 2 && bytes[0] == 0x1f && bytes[1] == 0x8b
}

fn io_error(path: &Path) -> impl FnOnce(std::io::Error) -> NiftiIoError + '_ {
    move |source| NiftiIoError::Io {
        path: path.to_path_buf(),
        source,
    }
}

/// Reads a file and transparently inflates it if it is gzip compressed.
/// Returns the raw header+data bytes and whether the file was compressed.
fn read_image_bytes(path: &Path) -> Result<(Vec<u8>, bool), NiftiIoError> {
    let raw = fs::read(path).map_err(io_error(path))?;
    if !is_gzip(&raw) {
        return Ok((raw, false));
    }
    let mut inflated = Vec::new();
    MultiGzDecoder::new(raw.as_slice())
        .read_to_end(&mut inflated)
        .map_err(io_error(path))?;
    Ok((inflated, true))
}

fn write_image_bytes(path: &Path, bytes: &[u8], compress: bool) -> Result<(), NiftiIoError> {
    if compress {
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(bytes).map_err(io_error(path))?;
        let compressed = encoder.finish().map_err(io_error(path))?;
        fs::write(path, compressed).map_err(io_error(path))
    } else {
        fs::write(path, bytes).map_err(io_error(path))
    }
}

fn nifti1_byte_order(bytes: &[u8], path: &Path) -> Result<ByteOrder, NiftiIoError> {
    let unsupported = |reason: String| NiftiIoError::UnsupportedFormat {
        path: path.to_path_buf(),
        reason,
    };
    if bytes.len() < NIFTI1_HEADER_SIZE as usize {
        return Err(unsupported(format!(
            "file too small ({} bytes, need at least {})",
            bytes.len(),
            NIFTI1_HEADER_SIZE
        )));
    }

    let sizeof_hdr = [bytes[0], bytes[1], bytes[2], bytes[3]];
    let order = if i32::from_le_bytes(sizeof_hdr) == NIFTI1_HEADER_SIZE {
        ByteOrder::Little
    } else if i32::from_be_bytes(sizeof_hdr) == NIFTI1_HEADER_SIZE {
        ByteOrder::Big
    } else {
        return Err(unsupported(format!(
            "sizeof_hdr={}",
            i32::from_le_bytes(sizeof_hdr)
        )));
    };

    let magic = &bytes[MAGIC_OFFSET..MAGIC_OFFSET + 3];
    if magic != b"n+1" && magic != b"ni1" {
        return Err(unsupported(format!(
            "magic='{}'",
            String::from_utf8_lossy(magic)
        )));
    }
    Ok(order)
}

/// Overwrites the temporal resolution (`pixdim[4]`) of a NIfTI-1 image in place.
pub fn set_repetition_time(path: impl AsRef<Path>, repetition_time: f64) -> Result<(), NiftiIoError> {
    let path = path.as_ref();
    let (mut bytes, compressed) = read_image_bytes(path)?;
    let value = repetition_time as f32;
    let encoded = match nifti1_byte_order(&bytes, path)? {
        ByteOrder::Little => value.to_le_bytes(),
        ByteOrder::Big => value.to_be_bytes(),
    };
    bytes[PIXDIM_TIME_OFFSET..PIXDIM_TIME_OFFSET + 4].copy_from_slice(&encoded);
    write_image_bytes(path, &bytes, compressed)?;
    debug!(path = %path.display(), repetition_time, "patched pixdim[4]");
    Ok(())
}

/// Reads `pixdim[4]` back through the `nifti` header parser.
pub fn read_repetition_time(path: impl AsRef<Path>) -> Result<f32, NiftiIoError> {
    let (bytes, _) = read_image_bytes(path.as_ref())?;
    let header = NiftiHeader::from_reader(Cursor::new(bytes))?;
    Ok(header.pixdim[4])
}

/// Patches the repetition time, then re-reads the file and fails unless the
/// stored value matches at the header's single precision.
pub fn set_repetition_time_checked(
    path: impl AsRef<Path>,
    repetition_time: f64,
) -> Result<(), NiftiIoError> {
    let path = path.as_ref();
    set_repetition_time(path, repetition_time)?;
    let expected = repetition_time as f32;
    let found = read_repetition_time(path)?;
    if found != expected {
        return Err(NiftiIoError::RepetitionTimeMismatch {
            path: path.to_path_buf(),
            expected,
            found,
        });
    }
    Ok(())
}

/// Splits `name` into stem and extension, keeping compressed double
/// extensions such as `.nii.gz` together.
fn split_extension(name: &str) -> (&str, &str) {
    let last_dot = |s: &str| s.rfind('.').filter(|&i| i > 0).unwrap_or(s.len());
    let mut cut = last_dot(name);
    if &name[cut..] == ".gz" {
        cut = last_dot(&name[..cut]);
    }
    (&name[..cut], &name[cut..])
}

/// Builds `<dir>/<stem>_<suffix><ext>` from `in_file`. `dir` defaults to the
/// current working directory.
pub fn derive_filename(
    in_file: impl AsRef<Path>,
    suffix: &str,
    dir: Option<&Path>,
) -> Result<PathBuf, NiftiIoError> {
    let in_file = in_file.as_ref();
    let name = in_file
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| NiftiIoError::InvalidFilename(in_file.to_path_buf()))?;
    let (stem, ext) = split_extension(name);
    let dir = match dir {
        Some(d) => d.to_path_buf(),
        None => std::env::current_dir().map_err(io_error(Path::new(".")))?,
    };
    Ok(dir.join(format!("{}_{}{}", stem, suffix, ext)))
}

/// Multiplies every voxel by `factor` and writes the result as a float32 image
/// with the input's geometry. Returns the path written.
pub fn scale_image(
    in_file: impl AsRef<Path>,
    factor: f64,
    out_file: Option<&Path>,
) -> Result<PathBuf, NiftiIoError> {
    scale_with_suffix(in_file.as_ref(), factor, out_file, "scaled")
}

/// Converts a fieldmap from Hz to rad/s.
pub fn hz_to_rads(in_file: impl AsRef<Path>, out_file: Option<&Path>) -> Result<PathBuf, NiftiIoError> {
    scale_with_suffix(in_file.as_ref(), 2.0 * PI, out_file, "rads")
}

fn scale_with_suffix(
    in_file: &Path,
    factor: f64,
    out_file: Option<&Path>,
    suffix: &str,
) -> Result<PathBuf, NiftiIoError> {
    let out_file = match out_file {
        Some(path) => path.to_path_buf(),
        None => derive_filename(in_file, suffix, None)?,
    };

    let object = ReaderOptions::new().read_file(in_file)?;
    let mut header = object.header().clone();
    // Scaled at double precision, narrowed to float32 only for writing.
    let data = object.into_volume().into_ndarray::<f64>()?;
    let scaled = data.mapv(|v| (v * factor) as f32);

    // Voxels are already in real-world units after `into_ndarray`.
    header.scl_slope = 1.0;
    header.scl_inter = 0.0;
    WriterOptions::new(&out_file)
        .reference_header(&header)
        .write_nifti(&scaled)?;

    debug!(
        input = %in_file.display(),
        output = %out_file.display(),
        factor,
        "scaled image"
    );
    Ok(out_file)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_extension_keeps_double_extensions() {
        assert_eq!(split_extension("fmap.nii.gz"), ("fmap", ".nii.gz"));
        assert_eq!(split_extension("fmap.nii"), ("fmap", ".nii"));
        assert_eq!(split_extension("fmap"), ("fmap", ""));
        assert_eq!(split_extension(".hidden"), (".hidden", ""));
    }

    #[test]
    fn derive_filename_inserts_suffix() {
        let out = derive_filename("/data/sub-01_fmap.nii.gz", "rads", Some(Path::new("/tmp/work")))
            .unwrap();
        assert_eq!(out, PathBuf::from("/tmp/work/sub-01_fmap_rads.nii.gz"));
    }

    #[test]
    fn short_files_are_rejected() {
        let err = nifti1_byte_order(&[0u8; 16], Path::new("x.nii")).unwrap_err();
        assert!(err.to_string().contains("too small"));
    }
}
