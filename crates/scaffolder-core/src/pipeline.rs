//! The scaffolding run: validate, fetch, patch, merge, flush, or roll back
//!
//! ```text
//! Idle -> Validating -> Fetching -> Patching -> Merging -> Flushing -> Done
//!                          \___________\___________\__________\
//!                                                    -> Failing -> RolledBack
//! ```
//!
//! Validation problems end the run before anything is written. Any failure
//! once fetching has started removes the destination directory; this is the
//! only place in the library that cleans up.

use crate::answers::{RawAnswers, ValidatedAnswers, ValidationError, ValidationReason};
use crate::blueprint::Blueprint;
use crate::error::{ScaffoldError, ScaffoldResult, Warning};
use crate::manifest::{AddedDependencies, PackageManifest, VersionResolver};
use crate::patches::PatchPlan;
use crate::templates::{FetchOptions, SnapshotFetcher, TemplateRef, TemplateSnapshot};
use std::fmt;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, info, instrument, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Idle,
    Validating,
    Fetching,
    Patching,
    Merging,
    Flushing,
    Done,
    Failing,
    RolledBack,
}

impl Stage {
    /// Short progress message for spinners
    pub fn describe(&self) -> &'static str {
        match self {
            Stage::Idle => "Waiting",
            Stage::Validating => "Validating answers",
            Stage::Fetching => "Fetching template",
            Stage::Patching => "Applying your choices",
            Stage::Merging => "Updating package.json",
            Stage::Flushing => "Writing files",
            Stage::Done => "Done",
            Stage::Failing => "Cleaning up",
            Stage::RolledBack => "Rolled back",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.describe())
    }
}

/// One run's inputs
#[derive(Debug, Clone)]
pub struct ScaffoldRequest {
    pub answers: RawAnswers,
    pub template: TemplateRef,
    pub destination: PathBuf,
    /// Replace an existing destination instead of refusing
    pub overwrite: bool,
}

/// What a successful run produced
#[derive(Debug, Clone)]
pub struct ScaffoldReport {
    pub destination: PathBuf,
    pub answers: ValidatedAnswers,
    /// Files materialized from the template
    pub fetched: Vec<PathBuf>,
    /// Files rewritten or created after the fetch, sorted
    pub written: Vec<PathBuf>,
    pub warnings: Vec<Warning>,
}

/// Runs a [`Blueprint`] against a fetcher and a version resolver
pub struct Pipeline<'a, F, R> {
    blueprint: &'a Blueprint,
    fetcher: &'a F,
    versions: &'a R,
    stage: Stage,
    observer: Option<Box<dyn FnMut(Stage) + 'a>>,
}

/// Everything decided before the first filesystem write
struct Prepared {
    answers: ValidatedAnswers,
    project_name: String,
    plan: PatchPlan,
    added: AddedDependencies,
}

impl<'a, F, R> Pipeline<'a, F, R>
where
    F: SnapshotFetcher,
    R: VersionResolver,
{
    pub fn new(blueprint: &'a Blueprint, fetcher: &'a F, versions: &'a R) -> Self {
        Self {
            blueprint,
            fetcher,
            versions,
            stage: Stage::Idle,
            observer: None,
        }
    }

    /// Called on every stage transition (e.g. to drive a spinner)
    pub fn with_observer(mut self, observer: impl FnMut(Stage) + 'a) -> Self {
        self.observer = Some(Box::new(observer));
        self
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    fn enter(&mut self, stage: Stage) {
        debug!(from = ?self.stage, to = ?stage, "Stage transition");
        self.stage = stage;
        if let Some(observer) = self.observer.as_mut() {
            observer(stage);
        }
    }

    #[instrument(
        skip_all,
        fields(template = %request.template, destination = %request.destination.display())
    )]
    pub async fn run(&mut self, request: ScaffoldRequest) -> ScaffoldResult<ScaffoldReport> {
        self.enter(Stage::Validating);
        let prepared = self.prepare(&request).await?;

        match self.materialize(&request, &prepared).await {
            Ok((fetched, written, warnings)) => {
                self.enter(Stage::Done);
                info!(files = written.len(), warnings = warnings.len(), "Project created");
                Ok(ScaffoldReport {
                    destination: request.destination,
                    answers: prepared.answers,
                    fetched,
                    written,
                    warnings,
                })
            }
            Err(cause) => {
                self.enter(Stage::Failing);
                let err = rollback(&request.destination, cause).await;
                self.enter(Stage::RolledBack);
                Err(err)
            }
        }
    }

    /// Validation and planning; nothing here touches the destination
    async fn prepare(&self, request: &ScaffoldRequest) -> ScaffoldResult<Prepared> {
        let answers = self.blueprint.schema.validate(&request.answers)?;
        let project_name = answers
            .text(self.blueprint.name_field)
            .map(str::to_string)
            .ok_or_else(|| ValidationError {
                field: self.blueprint.name_field.to_string(),
                reason: ValidationReason::Missing,
            })?;

        if !request.overwrite && path_exists(&request.destination).await? {
            return Err(ScaffoldError::DestinationExists {
                path: request.destination.clone(),
            });
        }

        // Unsupported selections fail here, before any file is written
        let plan = self.blueprint.patches.plan(&answers)?;
        let added = (self.blueprint.dependencies)(&answers);
        debug!(
            actions = plan.steps().len(),
            dependencies = added.dependencies.len(),
            dev_dependencies = added.dev_dependencies.len(),
            "Run planned"
        );

        Ok(Prepared {
            answers,
            project_name,
            plan,
            added,
        })
    }

    async fn materialize(
        &mut self,
        request: &ScaffoldRequest,
        prepared: &Prepared,
    ) -> ScaffoldResult<(Vec<PathBuf>, Vec<PathBuf>, Vec<Warning>)> {
        self.enter(Stage::Fetching);
        let outcome = self
            .fetcher
            .fetch(
                &request.template,
                &request.destination,
                FetchOptions {
                    overwrite: request.overwrite,
                },
            )
            .await?;
        let mut warnings = outcome.warnings;

        self.enter(Stage::Patching);
        let mut snapshot = TemplateSnapshot::new(&request.destination);
        warnings.extend(prepared.plan.apply(&mut snapshot).await?);

        self.enter(Stage::Merging);
        let manifest_path = Path::new(self.blueprint.manifest_path);
        let manifest = match snapshot.load(manifest_path).await? {
            Some(content) => PackageManifest::parse(manifest_path, content)?,
            None => {
                return Err(ScaffoldError::Manifest {
                    path: manifest_path.to_path_buf(),
                    reason: "not found in template".to_string(),
                })
            }
        };
        let merged = manifest.merge(&prepared.added, &prepared.project_name, self.versions)?;
        snapshot.write(manifest_path, merged.to_json_string()?);

        self.enter(Stage::Flushing);
        let written = snapshot.flush().await?;

        Ok((outcome.files, written, warnings))
    }
}

async fn path_exists(path: &Path) -> ScaffoldResult<bool> {
    fs::try_exists(path)
        .await
        .map_err(|e| ScaffoldError::io("inspect", path, e))
}

/// Remove the destination, keeping `cause` as the reported error
async fn rollback(destination: &Path, cause: ScaffoldError) -> ScaffoldError {
    warn!(error = %cause, path = %destination.display(), "Run failed, removing destination");
    let removal = fs::remove_dir_all(destination).await;
    settle_rollback(destination, cause, removal)
}

/// Folds the cleanup result into the error the run reports
fn settle_rollback(
    destination: &Path,
    cause: ScaffoldError,
    removal: std::io::Result<()>,
) -> ScaffoldError {
    match removal {
        Ok(()) => {
            info!("Rollback successful");
            cause
        }
        Err(e) if e.kind() == ErrorKind::NotFound => cause,
        Err(cleanup) => {
            warn!(error = %cleanup, "Rollback failed");
            ScaffoldError::RollbackFailed {
                cause: Box::new(cause),
                path: destination.to_path_buf(),
                cleanup,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::answers::{AnswerSchema, FieldSpec};
    use crate::manifest::VersionTable;
    use crate::patches::{Action, PatchSet};
    use crate::templates::{FetchError, FetchOutcome};
    use std::cell::RefCell;
    use std::collections::BTreeMap;

    /// Writes a fixed file set, like a template download would
    struct FakeFetcher {
        files: BTreeMap<&'static str, &'static str>,
    }

    impl SnapshotFetcher for FakeFetcher {
        async fn fetch(
            &self,
            _template: &TemplateRef,
            destination: &Path,
            _options: FetchOptions,
        ) -> Result<FetchOutcome, FetchError> {
            let mut files = Vec::new();
            for (path, content) in &self.files {
                let target = destination.join(path);
                if let Some(parent) = target.parent() {
                    std::fs::create_dir_all(parent).unwrap();
                }
                std::fs::write(&target, content).unwrap();
                files.push(PathBuf::from(path));
            }
            Ok(FetchOutcome {
                files,
                warnings: Vec::new(),
            })
        }
    }

    fn blueprint() -> Blueprint {
        Blueprint::new(
            AnswerSchema::new(vec![
                FieldSpec::text("project_name", "Name:", |s| !s.is_empty()),
                FieldSpec::choice("extra", "Extra:", &["yes", "no", "broken"]),
            ]),
            PatchSet::new()
                .transformation("readme", |_| Some(Action::create("README.md", "# hi\n")))
                .unsupported("extra", "broken"),
            |answers| {
                let mut added = crate::manifest::AddedDependencies::new();
                if answers.selected("extra", "yes") {
                    added.dependency("left-pad");
                }
                added
            },
        )
    }

    fn fetcher() -> FakeFetcher {
        FakeFetcher {
            files: BTreeMap::from([("package.json", r#"{"name": "tpl"}"#)]),
        }
    }

    fn request(destination: PathBuf, extra: &str) -> ScaffoldRequest {
        ScaffoldRequest {
            answers: [("project_name", "demo"), ("extra", extra)].into_iter().collect(),
            template: "github:owner/repo".parse().unwrap(),
            destination,
            overwrite: false,
        }
    }

    #[tokio::test]
    async fn test_successful_run_walks_every_stage() {
        let dir = tempfile::tempdir().unwrap();
        let destination = dir.path().join("demo");
        let blueprint = blueprint();
        let fetcher = fetcher();
        let versions = VersionTable::new();
        let stages = RefCell::new(Vec::new());

        let report = Pipeline::new(&blueprint, &fetcher, &versions)
            .with_observer(|s| stages.borrow_mut().push(s))
            .run(request(destination.clone(), "no"))
            .await
            .unwrap();

        assert_eq!(
            stages.into_inner(),
            vec![
                Stage::Validating,
                Stage::Fetching,
                Stage::Patching,
                Stage::Merging,
                Stage::Flushing,
                Stage::Done,
            ]
        );
        assert_eq!(
            report.written,
            vec![PathBuf::from("README.md"), PathBuf::from("package.json")]
        );
        let manifest = std::fs::read_to_string(destination.join("package.json")).unwrap();
        assert!(manifest.contains("\"name\": \"demo\""));
    }

    #[tokio::test]
    async fn test_validation_failure_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let destination = dir.path().join("demo");
        let blueprint = blueprint();
        let fetcher = fetcher();
        let versions = VersionTable::new();

        let err = Pipeline::new(&blueprint, &fetcher, &versions)
            .run(request(destination.clone(), "maybe"))
            .await
            .unwrap_err();
        assert!(matches!(err, ScaffoldError::Validation(_)));
        assert!(!destination.exists());
    }

    #[tokio::test]
    async fn test_unsupported_option_fails_before_fetch() {
        let dir = tempfile::tempdir().unwrap();
        let destination = dir.path().join("demo");
        let blueprint = blueprint();
        let fetcher = fetcher();
        let versions = VersionTable::new();
        let stages = RefCell::new(Vec::new());

        let err = Pipeline::new(&blueprint, &fetcher, &versions)
            .with_observer(|s| stages.borrow_mut().push(s))
            .run(request(destination.clone(), "broken"))
            .await
            .unwrap_err();
        assert!(matches!(err, ScaffoldError::UnsupportedOption { .. }));
        assert!(!stages.borrow().contains(&Stage::Fetching));
        assert!(!destination.exists());
    }

    #[tokio::test]
    async fn test_missing_version_rolls_back() {
        let dir = tempfile::tempdir().unwrap();
        let destination = dir.path().join("demo");
        let blueprint = blueprint();
        let fetcher = fetcher();
        let versions = VersionTable::new();

        let mut pipeline = Pipeline::new(&blueprint, &fetcher, &versions);
        let err = pipeline
            .run(request(destination.clone(), "yes"))
            .await
            .unwrap_err();
        assert!(matches!(err, ScaffoldError::MissingVersion { ref name } if name == "left-pad"));
        assert_eq!(pipeline.stage(), Stage::RolledBack);
        assert!(!destination.exists());
    }

    #[tokio::test]
    async fn test_existing_destination_is_left_alone() {
        let dir = tempfile::tempdir().unwrap();
        let destination = dir.path().join("demo");
        std::fs::create_dir_all(&destination).unwrap();
        std::fs::write(destination.join("mine.txt"), "keep").unwrap();
        let blueprint = blueprint();
        let fetcher = fetcher();
        let versions = VersionTable::new();

        let err = Pipeline::new(&blueprint, &fetcher, &versions)
            .run(request(destination.clone(), "no"))
            .await
            .unwrap_err();
        assert!(matches!(err, ScaffoldError::DestinationExists { .. }));
        assert!(destination.join("mine.txt").exists());
    }

    #[tokio::test]
    async fn test_missing_manifest_rolls_back() {
        let dir = tempfile::tempdir().unwrap();
        let destination = dir.path().join("demo");
        let blueprint = blueprint();
        let fetcher = FakeFetcher {
            files: BTreeMap::from([("index.ts", "export {};\n")]),
        };
        let versions = VersionTable::new();

        let err = Pipeline::new(&blueprint, &fetcher, &versions)
            .run(request(destination.clone(), "no"))
            .await
            .unwrap_err();
        assert!(matches!(err, ScaffoldError::Manifest { .. }));
        assert!(!destination.exists());
    }

    #[tokio::test]
    async fn test_rollback_tolerates_missing_destination() {
        let dir = tempfile::tempdir().unwrap();
        let err = rollback(
            &dir.path().join("never-created"),
            ScaffoldError::MissingVersion {
                name: "x".to_string(),
            },
        )
        .await;
        assert!(matches!(err, ScaffoldError::MissingVersion { .. }));
    }

    #[test]
    fn test_failed_cleanup_keeps_original_cause() {
        let removal = Err(std::io::Error::new(
            ErrorKind::PermissionDenied,
            "permission denied",
        ));
        let err = settle_rollback(
            Path::new("/srv/demo"),
            ScaffoldError::MissingVersion {
                name: "kysely".to_string(),
            },
            removal,
        );

        let ScaffoldError::RollbackFailed {
            cause,
            path,
            cleanup,
        } = &err
        else {
            panic!("expected rollback failure, got {err}");
        };
        assert!(matches!(**cause, ScaffoldError::MissingVersion { .. }));
        assert_eq!(path, Path::new("/srv/demo"));
        assert_eq!(cleanup.kind(), ErrorKind::PermissionDenied);
        assert!(matches!(err.root_cause(), ScaffoldError::MissingVersion { .. }));
        assert!(err.to_string().contains("cleanup of /srv/demo also failed"));
    }

    #[test]
    fn test_successful_cleanup_reports_cause() {
        let err = settle_rollback(
            Path::new("/srv/demo"),
            ScaffoldError::MissingVersion {
                name: "kysely".to_string(),
            },
            Ok(()),
        );
        assert!(matches!(err, ScaffoldError::MissingVersion { .. }));
    }
}
