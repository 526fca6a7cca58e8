//! Everything a product declares about how answers shape a template

use crate::answers::{AnswerSchema, ValidatedAnswers};
use crate::manifest::{AddedDependencies, MANIFEST_FILE};
use crate::patches::PatchSet;

/// Computes the packages to add to the manifest for an answer set
pub type DependencyPlanner = fn(&ValidatedAnswers) -> AddedDependencies;

#[derive(Debug, Clone)]
pub struct Blueprint {
    pub schema: AnswerSchema,
    pub patches: PatchSet,
    pub dependencies: DependencyPlanner,
    /// Field whose answer becomes the manifest's `name`
    pub name_field: &'static str,
    /// Manifest path relative to the template root
    pub manifest_path: &'static str,
}

impl Blueprint {
    pub fn new(schema: AnswerSchema, patches: PatchSet, dependencies: DependencyPlanner) -> Self {
        Self {
            schema,
            patches,
            dependencies,
            name_field: "project_name",
            manifest_path: MANIFEST_FILE,
        }
    }

    pub fn with_name_field(mut self, field: &'static str) -> Self {
        self.name_field = field;
        self
    }

    pub fn with_manifest_path(mut self, path: &'static str) -> Self {
        self.manifest_path = path;
        self
    }
}
