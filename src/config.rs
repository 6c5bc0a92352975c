//! Explicit configuration objects passed into graph construction and the
//! directory reorganizer.

use crate::error::ConfigError;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Registration parameters shipped with the crate.
pub const REGISTRATION_SETTINGS: &str = "fmap-any_registration.json";
/// Reduced registration parameters, used when `debug` is set.
pub const REGISTRATION_SETTINGS_TESTING: &str = "fmap-any_registration_testing.json";

fn bundled_data_dir() -> PathBuf {
    PathBuf::from(concat!(env!("CARGO_MANIFEST_DIR"), "/data"))
}

/// Settings for the distortion-correction workflow.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SdcSettings {
    /// Thread count handed to the registration and resampling tools.
    pub ants_nthreads: u32,
    /// Selects the fast registration parameter set.
    pub debug: bool,
    /// Directory holding the registration parameter files.
    pub data_dir: PathBuf,
}

impl Default for SdcSettings {
    fn default() -> Self {
        Self {
            ants_nthreads: 6,
            debug: false,
            data_dir: bundled_data_dir(),
        }
    }
}

impl SdcSettings {
    /// Path of the registration parameter file for the current mode.
    pub fn registration_settings_file(&self) -> PathBuf {
        if self.debug {
            self.data_dir.join(REGISTRATION_SETTINGS_TESTING)
        } else {
            self.data_dir.join(REGISTRATION_SETTINGS)
        }
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        load_json(path.as_ref())
    }
}

/// Destination layout for the directory reorganizer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReorganizeConfig {
    pub dest_root: PathBuf,
    /// Subject label without the `sub-` prefix.
    pub subject_label: String,
    /// Skip a functional directory unless it holds `rest_sidecar_name`.
    pub require_rest_sidecar: bool,
    pub rest_sidecar_name: String,
}

impl Default for ReorganizeConfig {
    fn default() -> Self {
        Self {
            dest_root: PathBuf::from("/BIDSproject"),
            subject_label: "01".to_string(),
            require_rest_sidecar: true,
            rest_sidecar_name: "task-rest_bold.json".to_string(),
        }
    }
}

impl ReorganizeConfig {
    pub fn subject_prefix(&self) -> String {
        format!("sub-{}", self.subject_label)
    }

    /// `<dest_root>/sub-<label>`
    pub fn subject_dir(&self) -> PathBuf {
        self.dest_root.join(self.subject_prefix())
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        load_json(path.as_ref())
    }
}

fn load_json<T: DeserializeOwned>(path: &Path) -> Result<T, ConfigError> {
    let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&content).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn debug_selects_testing_parameters() {
        let mut settings = SdcSettings::default();
        assert!(
            settings
                .registration_settings_file()
                .ends_with(REGISTRATION_SETTINGS)
        );
        settings.debug = true;
        assert!(
            settings
                .registration_settings_file()
                .ends_with(REGISTRATION_SETTINGS_TESTING)
        );
    }

    #[test]
    fn partial_config_takes_defaults() {
        let config: ReorganizeConfig =
            serde_json::from_str(r#"{ "subject_label": "07" }"#).unwrap();
        assert_eq!(config.dest_root, PathBuf::from("/BIDSproject"));
        assert_eq!(config.subject_dir(), PathBuf::from("/BIDSproject/sub-07"));
        assert!(config.require_rest_sidecar);
    }

    #[test]
    fn bundled_parameter_files_exist() {
        let settings = SdcSettings::default();
        assert!(settings.registration_settings_file().is_file());
        let debug = SdcSettings {
            debug: true,
            ..SdcSettings::default()
        };
        assert!(debug.registration_settings_file().is_file());
    }
}
