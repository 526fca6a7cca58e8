//! Scaffolder Core - answer-driven project scaffolding
//!
//! A project is created by validating a set of answers against a schema,
//! fetching a template snapshot, applying the transformations the answers
//! select, merging the packages they need into the manifest and flushing
//! the result. Any failure after the fetch starts removes the destination.
//!
//! # Architecture
//!
//! - **Layer 1: Core Operations** - answer validation, template fetching,
//!   anchored patches, manifest merging
//! - **Layer 2: Orchestration** - [`Pipeline`] runs a [`Blueprint`] for a
//!   [`ProductConfig`]
//! - **Layer 3: CLI/TUI Interface** - optional cliclack prompts (feature-gated)
//!
//! # Feature Flags
//!
//! - `tui` (default): Enables the cliclack-based TUI prompts module
//!
//! # Example Usage (without TUI)
//!
//! ```ignore
//! use scaffolder_core::{stack, Pipeline, RawAnswers, ScaffoldRequest, TemplateFetcher};
//!
//! let blueprint = stack::blueprint();
//! let versions = stack::default_versions()?;
//! let fetcher = TemplateFetcher::from_config(&MyConfig)?;
//! let report = Pipeline::new(&blueprint, &fetcher, &versions)
//!     .run(ScaffoldRequest {
//!         answers: RawAnswers::from_json_str(r#"{"project_name": "demo", ...}"#)?,
//!         template: stack::DEFAULT_TEMPLATE.parse()?,
//!         destination: "demo".into(),
//!         overwrite: false,
//!     })
//!     .await?;
//! ```

pub mod answers;
pub mod blueprint;
pub mod error;
pub mod manifest;
pub mod patches;
pub mod pipeline;
pub mod product;
pub mod stack;
pub mod templates;

#[cfg(feature = "tui")]
pub mod tui;

// Re-export main types for convenience
pub use answers::{AnswerSchema, Answers, FieldSpec, RawAnswers, ValidatedAnswers};
pub use blueprint::Blueprint;
pub use error::{ScaffoldError, ScaffoldResult, Warning};
pub use manifest::{AddedDependencies, PackageManifest, VersionResolver, VersionTable};
pub use patches::{Action, AnchoredEdit, PatchSet};
pub use pipeline::{Pipeline, ScaffoldReport, ScaffoldRequest, Stage};
pub use product::ProductConfig;
pub use templates::{SnapshotFetcher, TemplateFetcher, TemplateRef};

#[cfg(feature = "tui")]
pub use tui::run;
