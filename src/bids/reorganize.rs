use super::{FunctionalRun, ReorganizeReport, SubjectSession};
use crate::config::ReorganizeConfig;
use crate::error::ReorganizeError;
use crate::metadata;
use crate::nifti_io;
use ahash::AHashMap;
use itertools::Itertools;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use walkdir::WalkDir;

const ANAT_DIR: &str = "anat";
const FUNC_DIR: &str = "func";
const DWI_DIR: &str = "dwi";

const ANAT_SOURCE: &str = "anatomical/T1w-0_defaced.nii.gz";
const FUNC_SOURCE_DIR: &str = "fmri";

const IMAGE_EXT: &str = ".nii.gz";
const SIDECAR_EXT: &str = ".json";

/// Populates `<dest_root>/sub-<label>` from one session's raw data.
///
/// The destination layout is only created when the subject directory does not
/// exist yet; an existing tree is reused as is and files in it are
/// overwritten. Nothing is rolled back if a step fails midway.
pub fn create_bids(
    subject: &SubjectSession,
    config: &ReorganizeConfig,
) -> Result<ReorganizeReport, ReorganizeError> {
    let from_dir = subject.source_dir();
    let to_dir = config.subject_dir();
    info!(
        from = %from_dir.display(),
        to = %to_dir.display(),
        "reorganizing session"
    );

    let layout_created = create_layout(&to_dir)?;

    let anat = to_dir
        .join(ANAT_DIR)
        .join(format!("{}_T1w{}", config.subject_prefix(), IMAGE_EXT));
    copy_file(&from_dir.join(ANAT_SOURCE), &anat)?;

    // TODO: copy dwi_raw.nii.gz with its bval/bvec files once they are exported.
    warn!("diffusion data is not copied");

    let mut report = ReorganizeReport {
        layout_created,
        anat,
        runs: Vec::new(),
        skipped_dirs: Vec::new(),
    };
    copy_functional(
        &from_dir.join(FUNC_SOURCE_DIR),
        &to_dir.join(FUNC_DIR),
        config,
        &mut report,
    )?;

    info!(
        runs = report.runs.len(),
        skipped = report.skipped_dirs.len(),
        "reorganization finished"
    );
    Ok(report)
}

fn create_layout(to_dir: &Path) -> Result<bool, ReorganizeError> {
    if to_dir.exists() {
        debug!(dir = %to_dir.display(), "destination exists, reusing layout");
        return Ok(false);
    }
    for sub in [ANAT_DIR, FUNC_DIR, DWI_DIR] {
        let path = to_dir.join(sub);
        fs::create_dir_all(&path).map_err(|source| ReorganizeError::CreateDir { path, source })?;
    }
    Ok(true)
}

fn copy_file(from: &Path, to: &Path) -> Result<(), ReorganizeError> {
    fs::copy(from, to).map_err(|source| ReorganizeError::Copy {
        from: from.to_path_buf(),
        to: to.to_path_buf(),
        source,
    })?;
    debug!(from = %from.display(), to = %to.display(), "copied");
    Ok(())
}

fn file_name(path: &Path) -> &str {
    path.file_name().and_then(|n| n.to_str()).unwrap_or_default()
}

/// Task name of a functional file: everything before the first dot.
fn task_name(path: &Path) -> &str {
    file_name(path).split('.').next().unwrap_or_default()
}

fn copy_functional(
    source_dir: &Path,
    dest_dir: &Path,
    config: &ReorganizeConfig,
    report: &mut ReorganizeReport,
) -> Result<(), ReorganizeError> {
    if !source_dir.is_dir() {
        warn!(dir = %source_dir.display(), "no functional directory");
        return Ok(());
    }

    let mut files = Vec::new();
    for entry in WalkDir::new(source_dir).sort_by_file_name() {
        let entry = entry?;
        if entry.file_type().is_file() {
            files.push(entry.into_path());
        }
    }

    let by_dir = files
        .into_iter()
        .into_group_map_by(|p| p.parent().map(Path::to_path_buf).unwrap_or_default());
    for (dir, files) in by_dir.into_iter().sorted_by(|a, b| a.0.cmp(&b.0)) {
        let gated_open = !config.require_rest_sidecar
            || files.iter().any(|f| file_name(f) == config.rest_sidecar_name);
        if !gated_open {
            warn!(
                dir = %dir.display(),
                sidecar = %config.rest_sidecar_name,
                "resting-state sidecar missing, skipping all functional files"
            );
            report.skipped_dirs.push(dir);
            continue;
        }
        copy_functional_dir(&files, dest_dir, config, report)?;
    }
    Ok(())
}

fn copy_functional_dir(
    files: &[PathBuf],
    dest_dir: &Path,
    config: &ReorganizeConfig,
    report: &mut ReorganizeReport,
) -> Result<(), ReorganizeError> {
    let prefix = config.subject_prefix();

    // Sidecars are read up front so every image finds its repetition time
    // regardless of listing order.
    let mut runs: AHashMap<&str, usize> = AHashMap::new();
    let first_run = report.runs.len();
    for sidecar in files.iter().filter(|f| file_name(f).ends_with(SIDECAR_EXT)) {
        let meta = metadata::read_sidecar(sidecar).map_err(|source| ReorganizeError::Metadata {
            path: sidecar.clone(),
            source,
        })?;
        let repetition_time =
            metadata::get_repetition_time(&meta).map_err(|source| ReorganizeError::Metadata {
                path: sidecar.clone(),
                source,
            })?;
        let task = task_name(sidecar);
        runs.insert(task, report.runs.len());
        report.runs.push(FunctionalRun {
            task: task.to_string(),
            repetition_time,
            sidecar: dest_dir.join(format!("{}_{}{}", prefix, task, SIDECAR_EXT)),
            image: None,
        });
    }

    // A lone sidecar describes every image in its directory, whatever the
    // image is called. With several sidecars, images pair up by task name.
    let lone_run = (runs.len() == 1).then_some(first_run);
    for file in files {
        let name = file_name(file);
        if name.ends_with(IMAGE_EXT) {
            let index = lone_run
                .or_else(|| runs.get(task_name(file)).copied())
                .ok_or_else(|| ReorganizeError::MissingSidecar(file.clone()))?;
            let run = &mut report.runs[index];
            let dest = dest_dir.join(format!("{}_{}{}", prefix, run.task, IMAGE_EXT));
            copy_file(file, &dest)?;
            nifti_io::set_repetition_time_checked(&dest, run.repetition_time)?;
            run.image = Some(dest);
        } else if name.ends_with(SIDECAR_EXT) {
            let dest = dest_dir.join(format!("{}_{}{}", prefix, task_name(file), SIDECAR_EXT));
            copy_file(file, &dest)?;
        }
    }

    debug!(runs = report.runs.len() - first_run, "functional directory copied");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn task_name_stops_at_first_dot() {
        assert_eq!(task_name(Path::new("/x/task-rest_bold.nii.gz")), "task-rest_bold");
        assert_eq!(task_name(Path::new("task-nback_bold.json")), "task-nback_bold");
    }
}
