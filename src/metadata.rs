//! Sidecar JSON reading and the acquisition-metadata helpers.

use crate::error::MetadataError;
use serde_json::{Map, Value};
use std::fs;
use std::path::Path;

/// Key-value metadata read from a sidecar.
pub type Metadata = Map<String, Value>;

pub const REPETITION_TIME: &str = "RepetitionTime";
pub const EFFECTIVE_ECHO_SPACING: &str = "EffectiveEchoSpacing";
pub const PHASE_ENCODING_DIRECTION: &str = "PhaseEncodingDirection";

/// Reads a sidecar file, which must hold a single JSON object.
pub fn read_sidecar(path: impl AsRef<Path>) -> Result<Metadata, MetadataError> {
    let path = path.as_ref();
    let content = fs::read_to_string(path).map_err(|source| MetadataError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let value: Value = serde_json::from_str(&content).map_err(|source| MetadataError::Json {
        path: path.to_path_buf(),
        source,
    })?;
    match value {
        Value::Object(map) => Ok(map),
        _ => Err(MetadataError::NotAnObject(path.to_path_buf())),
    }
}

/// Looks up a required numeric field. Numeric strings are accepted.
pub fn get_number(meta: &Metadata, key: &'static str) -> Result<f64, MetadataError> {
    let value = meta.get(key).ok_or(MetadataError::MissingKey(key))?;
    let number = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    number.ok_or_else(|| MetadataError::NotNumeric {
        key,
        found: value.clone(),
    })
}

pub fn get_repetition_time(meta: &Metadata) -> Result<f64, MetadataError> {
    get_number(meta, REPETITION_TIME)
}

pub fn get_echo_spacing(meta: &Metadata) -> Result<f64, MetadataError> {
    get_number(meta, EFFECTIVE_ECHO_SPACING)
}

/// Phase-encoding direction, normalized with [`normalize_axis`].
pub fn get_pe_direction(meta: &Metadata) -> Result<String, MetadataError> {
    let value = meta
        .get(PHASE_ENCODING_DIRECTION)
        .ok_or(MetadataError::MissingKey(PHASE_ENCODING_DIRECTION))?;
    value
        .as_str()
        .map(normalize_axis)
        .ok_or_else(|| MetadataError::NotString {
            key: PHASE_ENCODING_DIRECTION,
            found: value.clone(),
        })
}

/// Maps BIDS voxel axes onto the `x`/`y` vocabulary: `j` becomes `y`, `i`
/// becomes `x`, and everything else (including `k` and polarity signs) is kept.
pub fn normalize_axis(direction: &str) -> String {
    direction
        .chars()
        .map(|c| match c {
            'j' => 'y',
            'i' => 'x',
            other => other,
        })
        .collect()
}
