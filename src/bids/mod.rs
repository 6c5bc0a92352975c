//! Copies one subject/visit/session of raw acquisitions into a BIDS-style tree.

use serde::Serialize;
use std::path::PathBuf;

mod reorganize;

pub use reorganize::create_bids;

/// Identifies one acquisition session inside a project directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubjectSession {
    pub project_dir: PathBuf,
    pub participant_id: String,
    pub visit: String,
    pub session: String,
}

impl SubjectSession {
    pub fn new(
        project_dir: impl Into<PathBuf>,
        participant_id: impl Into<String>,
        visit: impl Into<String>,
        session: impl Into<String>,
    ) -> Self {
        Self {
            project_dir: project_dir.into(),
            participant_id: participant_id.into(),
            visit: visit.into(),
            session: session.into(),
        }
    }

    /// `<project>/data/imaging/participants/<id>/visit<v>/session<s>`
    pub fn source_dir(&self) -> PathBuf {
        self.project_dir
            .join("data")
            .join("imaging")
            .join("participants")
            .join(&self.participant_id)
            .join(format!("visit{}", self.visit))
            .join(format!("session{}", self.session))
    }
}

/// A functional acquisition described by a sidecar.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FunctionalRun {
    /// Sidecar base name, e.g. `task-rest_bold`.
    pub task: String,
    /// `RepetitionTime` in seconds, as written into the copied image header.
    pub repetition_time: f64,
    pub sidecar: PathBuf,
    /// The copied image, if the directory held one for this task.
    pub image: Option<PathBuf>,
}

/// What a reorganizer run did.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReorganizeReport {
    /// `false` when the subject directory already existed and was reused.
    pub layout_created: bool,
    pub anat: PathBuf,
    pub runs: Vec<FunctionalRun>,
    /// Functional directories skipped for lacking the resting-state sidecar.
    pub skipped_dirs: Vec<PathBuf>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn source_dir_follows_project_layout() {
        let subject = SubjectSession::new("/proj", "P042", "2", "1");
        assert_eq!(
            subject.source_dir(),
            PathBuf::from("/proj/data/imaging/participants/P042/visit2/session1")
        );
    }
}
