use std::fmt;
use std::path::PathBuf;

use modchain_types::ArtifactId;

/// The file list threaded through a transform chain.
///
/// Starts as the original artifact's single file; every successful step
/// replaces the list with its ordered outputs. Never mutated in place.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransformationSubject {
    artifact: ArtifactId,
    files: Vec<PathBuf>,
    applied: Vec<String>,
}

impl TransformationSubject {
    pub fn initial(artifact: ArtifactId, file: PathBuf) -> Self {
        Self {
            artifact,
            files: vec![file],
            applied: Vec::new(),
        }
    }

    /// The subject after `step` produced `files`.
    pub fn with_files(&self, step: &str, files: Vec<PathBuf>) -> Self {
        let mut applied = self.applied.clone();
        applied.push(step.to_string());
        Self {
            artifact: self.artifact.clone(),
            files,
            applied,
        }
    }

    /// The artifact the chain started from.
    pub fn artifact(&self) -> &ArtifactId {
        &self.artifact
    }

    pub fn files(&self) -> &[PathBuf] {
        &self.files
    }

    /// Display names of the steps applied so far, in order.
    pub fn applied(&self) -> &[String] {
        &self.applied
    }
}

impl fmt::Display for TransformationSubject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.applied.is_empty() {
            write!(f, "{}", self.artifact)
        } else {
            write!(f, "{} via {}", self.artifact, self.applied.join(" -> "))
        }
    }
}
