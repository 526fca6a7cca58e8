//! Error and warning types shared by every pipeline stage
//!
//! Fatal problems are [`ScaffoldError`]s and bubble up to the pipeline, which
//! is the only place that deletes a half-built destination. Non-fatal
//! problems are [`Warning`]s and are collected into the run report.

use crate::answers::ValidationError;
use crate::templates::FetchError;
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Result alias used throughout the library
pub type ScaffoldResult<T> = Result<T, ScaffoldError>;

/// Fatal pipeline errors
#[derive(Debug, Error)]
pub enum ScaffoldError {
    /// The raw answers do not conform to the answer schema
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// The destination already exists and overwriting was not requested
    #[error("Destination already exists: {} (use --force to overwrite)", path.display())]
    DestinationExists { path: PathBuf },

    /// The template could not be materialized
    #[error("Failed to fetch template: {0}")]
    Fetch(#[from] FetchError),

    /// A selected option has no transformation yet
    #[error("{field} = \"{value}\" is not yet supported")]
    UnsupportedOption { field: String, value: String },

    /// A dependency has no pinned version in the version table
    #[error("No version known for dependency '{name}'")]
    MissingVersion { name: String },

    /// A version table entry is not a valid semver range
    #[error("Invalid version constraint '{constraint}' for '{name}': {source}")]
    InvalidVersion {
        name: String,
        constraint: String,
        #[source]
        source: semver::Error,
    },

    /// Two transformations want to create the same file with different content
    #[error("Transformations '{first}' and '{second}' both create {}", path.display())]
    NewFileConflict {
        path: PathBuf,
        first: String,
        second: String,
    },

    /// The package manifest is missing or malformed
    #[error("Invalid manifest {}: {reason}", path.display())]
    Manifest { path: PathBuf, reason: String },

    /// Reading or writing a file in the destination failed
    #[error("Failed to {action} {}: {source}", path.display())]
    Io {
        action: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The run failed and removing the destination failed as well
    #[error("{cause} (cleanup of {} also failed: {cleanup})", path.display())]
    RollbackFailed {
        cause: Box<ScaffoldError>,
        path: PathBuf,
        cleanup: std::io::Error,
    },
}

impl ScaffoldError {
    pub(crate) fn io(
        action: &'static str,
        path: impl Into<PathBuf>,
        source: std::io::Error,
    ) -> Self {
        Self::Io {
            action,
            path: path.into(),
            source,
        }
    }

    /// The error that started the failure, looking through a failed rollback
    pub fn root_cause(&self) -> &ScaffoldError {
        match self {
            Self::RollbackFailed { cause, .. } => cause.root_cause(),
            other => other,
        }
    }
}

/// Non-fatal problems surfaced at the end of a successful run
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Warning {
    /// A text edit's anchor was not present; the file was left as it was
    AnchorNotFound {
        transformation: String,
        path: PathBuf,
        anchor: String,
    },
    /// A text edit targeted a file the template does not contain
    TargetMissing {
        transformation: String,
        path: PathBuf,
    },
    /// The fetcher skipped an archive entry
    SkippedEntry { entry: String, reason: String },
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Warning::AnchorNotFound {
                transformation,
                path,
                anchor,
            } => write!(
                f,
                "{}: anchor {:?} not found in {}, left unchanged",
                transformation,
                anchor,
                path.display()
            ),
            Warning::TargetMissing {
                transformation,
                path,
            } => write!(
                f,
                "{}: {} is not part of the template, skipped",
                transformation,
                path.display()
            ),
            Warning::SkippedEntry { entry, reason } => {
                write!(f, "Skipped template entry '{}': {}", entry, reason)
            }
        }
    }
}
