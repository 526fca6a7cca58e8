//! Product configuration trait for CLI binaries
//!
//! Each binary built on this library implements [`ProductConfig`] to name
//! itself, point at its template and hand over the blueprint and versions
//! its answers drive.

use crate::answers::ValidatedAnswers;
use crate::blueprint::Blueprint;
use crate::error::ScaffoldResult;
use crate::manifest::VersionTable;
use std::path::Path;

pub trait ProductConfig: Clone + Send + Sync + 'static {
    /// Internal product name (used for the CLI command and user agent)
    fn name(&self) -> &'static str;

    /// Human-readable display name
    fn display_name(&self) -> &'static str;

    /// Template reference used when nothing overrides it
    fn default_template(&self) -> &'static str;

    /// Environment variable overriding the template reference
    fn template_env(&self) -> &'static str;

    /// Environment variable overriding the archive host
    fn archive_url_env(&self) -> &'static str;

    /// Template directory name below a `--template-dir` root
    fn local_template_name(&self) -> &'static str;

    /// Schema, transformations and dependency planner
    fn blueprint(&self) -> Blueprint;

    /// Built-in version pins
    fn versions(&self) -> ScaffoldResult<VersionTable>;

    /// Instructions printed after the project is created
    fn next_steps(&self, dir: &Path, answers: &ValidatedAnswers) -> Vec<String>;

    /// CLI description shown in help text
    fn cli_description(&self) -> &'static str;

    /// User agent string for HTTP requests
    fn user_agent(&self) -> &'static str {
        self.name()
    }
}
