//! Answer-driven source transformations
//!
//! A [`PatchSet`] is an ordered list of named transformations. Each one looks
//! at the validated answers and either edits a known file through anchored
//! text edits or creates a new file. Planning is pure and happens before
//! anything touches the disk; applying runs against a [`TemplateSnapshot`].

pub mod anchor;
pub mod naming;

pub use anchor::{AnchoredEdit, EditOutcome, Placement};
pub use naming::identifier_for;

use crate::answers::ValidatedAnswers;
use crate::error::{ScaffoldError, ScaffoldResult, Warning};
use crate::templates::TemplateSnapshot;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// What a transformation does for a given answer set
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// Rewrite an existing file; edits run in order on the evolving content
    Edit {
        path: PathBuf,
        edits: Vec<AnchoredEdit>,
    },
    /// Write a brand-new file, replacing any template file at that path
    Create { path: PathBuf, content: String },
}

impl Action {
    pub fn edit(path: impl Into<PathBuf>, edits: Vec<AnchoredEdit>) -> Self {
        Action::Edit {
            path: path.into(),
            edits,
        }
    }

    pub fn create(path: impl Into<PathBuf>, content: impl Into<String>) -> Self {
        Action::Create {
            path: path.into(),
            content: content.into(),
        }
    }

    pub fn path(&self) -> &Path {
        match self {
            Action::Edit { path, .. } | Action::Create { path, .. } => path,
        }
    }
}

/// Builds an action from the answers, or `None` when it does not apply
pub type Planner = fn(&ValidatedAnswers) -> Option<Action>;

#[derive(Debug, Clone)]
pub struct Transformation {
    pub name: &'static str,
    planner: Planner,
}

impl Transformation {
    pub fn new(name: &'static str, planner: Planner) -> Self {
        Self { name, planner }
    }

    pub fn plan(&self, answers: &ValidatedAnswers) -> Option<Action> {
        (self.planner)(answers)
    }
}

/// Ordered transformations plus the selections that have none yet
#[derive(Debug, Clone, Default)]
pub struct PatchSet {
    transformations: Vec<Transformation>,
    unsupported: Vec<(&'static str, &'static str)>,
}

impl PatchSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn transformation(mut self, name: &'static str, planner: Planner) -> Self {
        self.transformations.push(Transformation::new(name, planner));
        self
    }

    /// Mark `field = value` as selectable but not implemented
    pub fn unsupported(mut self, field: &'static str, value: &'static str) -> Self {
        self.unsupported.push((field, value));
        self
    }

    pub fn transformations(&self) -> &[Transformation] {
        &self.transformations
    }

    /// Decide every action for `answers` without touching the disk
    ///
    /// Fails on unsupported selections, and when two transformations create
    /// the same path with different content.
    pub fn plan(&self, answers: &ValidatedAnswers) -> ScaffoldResult<PatchPlan> {
        if let Some((field, value)) = self
            .unsupported
            .iter()
            .find(|(field, value)| answers.selected(field, value))
        {
            return Err(ScaffoldError::UnsupportedOption {
                field: field.to_string(),
                value: value.to_string(),
            });
        }

        let mut steps: Vec<PlannedAction> = Vec::new();
        let mut created: BTreeMap<PathBuf, usize> = BTreeMap::new();

        for transformation in &self.transformations {
            let Some(action) = transformation.plan(answers) else {
                continue;
            };

            if let Action::Create { path, content } = &action {
                if let Some(&index) = created.get(path) {
                    let earlier = &steps[index];
                    if matches!(&earlier.action, Action::Create { content: c, .. } if c == content)
                    {
                        debug!(
                            path = %path.display(),
                            "Identical file staged twice, keeping first"
                        );
                        continue;
                    }
                    return Err(ScaffoldError::NewFileConflict {
                        path: path.clone(),
                        first: earlier.transformation.to_string(),
                        second: transformation.name.to_string(),
                    });
                }
                created.insert(path.clone(), steps.len());
            }

            steps.push(PlannedAction {
                transformation: transformation.name,
                action,
            });
        }

        Ok(PatchPlan { steps })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedAction {
    pub transformation: &'static str,
    pub action: Action,
}

/// The actions chosen for one run, in declaration order
#[derive(Debug, Clone, Default)]
pub struct PatchPlan {
    steps: Vec<PlannedAction>,
}

impl PatchPlan {
    pub fn steps(&self) -> &[PlannedAction] {
        &self.steps
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Texts of every planned edit on `path` sharing `edit`'s anchor and placement
    fn texts_at(&self, path: &Path, edit: &AnchoredEdit) -> Vec<&str> {
        self.steps
            .iter()
            .filter_map(|step| match &step.action {
                Action::Edit { path: p, edits } if p == path => Some(edits),
                _ => None,
            })
            .flatten()
            .filter(|e| e.anchor == edit.anchor && e.placement == edit.placement)
            .map(|e| e.text.as_str())
            .collect()
    }

    /// Apply every action to the snapshot
    ///
    /// Actions on the same file run in declaration order. A missing anchor or
    /// target file leaves that file as it was and is reported as a warning.
    pub async fn apply(&self, snapshot: &mut TemplateSnapshot) -> ScaffoldResult<Vec<Warning>> {
        let mut warnings = Vec::new();

        for step in &self.steps {
            match &step.action {
                Action::Create { path, content } => {
                    debug!(
                        transformation = step.transformation,
                        path = %path.display(),
                        "Staging new file"
                    );
                    snapshot.write(path.clone(), content.clone());
                }
                Action::Edit { path, edits } => {
                    let Some(original) = snapshot.load(path).await? else {
                        warn!(
                            transformation = step.transformation,
                            path = %path.display(),
                            "Edit target missing"
                        );
                        warnings.push(Warning::TargetMissing {
                            transformation: step.transformation.to_string(),
                            path: path.clone(),
                        });
                        continue;
                    };

                    let mut content = original.to_string();
                    let mut changed = false;
                    for edit in edits {
                        let neighbours = self.texts_at(path, edit);
                        match edit.apply_alongside(&content, &neighbours) {
                            EditOutcome::Applied(next) => {
                                content = next;
                                changed = true;
                            }
                            EditOutcome::AlreadyApplied => {
                                debug!(
                                    transformation = step.transformation,
                                    anchor = %edit.anchor,
                                    "Edit already applied"
                                );
                            }
                            EditOutcome::AnchorNotFound => {
                                warn!(
                                    transformation = step.transformation,
                                    anchor = %edit.anchor,
                                    path = %path.display(),
                                    "Anchor not found"
                                );
                                warnings.push(Warning::AnchorNotFound {
                                    transformation: step.transformation.to_string(),
                                    path: path.clone(),
                                    anchor: edit.anchor.clone(),
                                });
                            }
                        }
                    }

                    if changed {
                        snapshot.write(path.clone(), content);
                    }
                }
            }
        }

        Ok(warnings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::answers::{AnswerSchema, FieldSpec, RawAnswers};

    fn answers(styling: &str) -> ValidatedAnswers {
        AnswerSchema::new(vec![FieldSpec::choice(
            "styling",
            "Styling:",
            &["UnoCSS", "Tailwind"],
        )])
        .validate(&[("styling", styling)].into_iter().collect::<RawAnswers>())
        .unwrap()
    }

    fn patch_set() -> PatchSet {
        PatchSet::new()
            .transformation("plugin", |_| {
                Some(Action::edit(
                    "vite.config.ts",
                    vec![AnchoredEdit::insert_after("plugins: [", "Unocss(), ")],
                ))
            })
            .transformation("import", |_| {
                Some(Action::edit(
                    "vite.config.ts",
                    vec![AnchoredEdit::insert_before(
                        "export default",
                        "import Unocss from \"unocss/vite\";\n",
                    )],
                ))
            })
            .transformation("missing-anchor", |_| {
                Some(Action::edit(
                    "vite.config.ts",
                    vec![AnchoredEdit::insert_after("server: {", "port: 3000, ")],
                ))
            })
            .transformation("uno-only", |a| {
                a.selected("styling", "UnoCSS")
                    .then(|| Action::create("uno.config.ts", "export default {};\n"))
            })
            .unsupported("styling", "Tailwind")
    }

    #[test]
    fn test_plan_rejects_unsupported_selection() {
        let err = patch_set().plan(&answers("Tailwind")).unwrap_err();
        assert!(matches!(
            err,
            ScaffoldError::UnsupportedOption { ref field, ref value } if field == "styling" && value == "Tailwind"
        ));
    }

    #[test]
    fn test_plan_keeps_declaration_order_and_skips_inapplicable() {
        let plan = patch_set().plan(&answers("UnoCSS")).unwrap();
        let names: Vec<_> = plan.steps().iter().map(|s| s.transformation).collect();
        assert_eq!(names, ["plugin", "import", "missing-anchor", "uno-only"]);
    }

    #[test]
    fn test_conflicting_new_files() {
        let set = PatchSet::new()
            .transformation("a", |_| Some(Action::create(".env.example", "A=1\n")))
            .transformation("b", |_| Some(Action::create(".env.example", "B=1\n")));
        let err = set.plan(&answers("UnoCSS")).unwrap_err();
        assert!(matches!(
            err,
            ScaffoldError::NewFileConflict { ref first, ref second, .. } if first == "a" && second == "b"
        ));
    }

    #[test]
    fn test_identical_new_files_are_not_a_conflict() {
        let set = PatchSet::new()
            .transformation("a", |_| Some(Action::create("x.ts", "same")))
            .transformation("b", |_| Some(Action::create("x.ts", "same")));
        let plan = set.plan(&answers("UnoCSS")).unwrap();
        assert_eq!(plan.steps().len(), 1);
    }

    #[tokio::test]
    async fn test_apply_edits_in_order_and_collects_warnings() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("vite.config.ts"),
            "export default defineConfig({\n  plugins: [rakkas()],\n});\n",
        )
        .unwrap();

        let plan = patch_set().plan(&answers("UnoCSS")).unwrap();
        let mut snapshot = TemplateSnapshot::new(dir.path());
        let warnings = plan.apply(&mut snapshot).await.unwrap();

        assert_eq!(
            snapshot.get(Path::new("vite.config.ts")),
            Some("import Unocss from \"unocss/vite\";\nexport default defineConfig({\n  plugins: [Unocss(), rakkas()],\n});\n")
        );
        assert_eq!(snapshot.get(Path::new("uno.config.ts")), Some("export default {};\n"));
        assert!(matches!(
            warnings.as_slice(),
            [Warning::AnchorNotFound { transformation, .. }] if transformation == "missing-anchor"
        ));

        // Applying again changes nothing
        let again = plan.apply(&mut snapshot).await.unwrap();
        assert_eq!(again.len(), 1);
        assert!(snapshot
            .get(Path::new("vite.config.ts"))
            .is_some_and(|c| c.matches("Unocss()").count() == 1));
    }

    #[tokio::test]
    async fn test_shared_anchor_across_transformations_applies_once() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("vite.config.ts"),
            "export default defineConfig({\n  plugins: [rakkas()],\n});\n",
        )
        .unwrap();

        let plan = PatchSet::new()
            .transformation("first", |_| {
                Some(Action::edit(
                    "vite.config.ts",
                    vec![AnchoredEdit::insert_after("plugins: [", "A(), ")],
                ))
            })
            .transformation("second", |_| {
                Some(Action::edit(
                    "vite.config.ts",
                    vec![
                        AnchoredEdit::insert_after("plugins: [", "B(), "),
                        AnchoredEdit::replace("rakkas()", "rakkas(), extra()"),
                    ],
                ))
            })
            .plan(&answers("UnoCSS"))
            .unwrap();

        let mut snapshot = TemplateSnapshot::new(dir.path());
        plan.apply(&mut snapshot).await.unwrap();
        plan.apply(&mut snapshot).await.unwrap();

        assert_eq!(
            snapshot.get(Path::new("vite.config.ts")),
            Some("export default defineConfig({\n  plugins: [B(), A(), rakkas(), extra()],\n});\n")
        );
    }

    #[tokio::test]
    async fn test_missing_target_is_a_warning() {
        let dir = tempfile::tempdir().unwrap();
        let plan = PatchSet::new()
            .transformation("edit", |_| {
                Some(Action::edit("nope.ts", vec![AnchoredEdit::insert_after("a", "b")]))
            })
            .plan(&answers("UnoCSS"))
            .unwrap();

        let mut snapshot = TemplateSnapshot::new(dir.path());
        let warnings = plan.apply(&mut snapshot).await.unwrap();
        assert!(matches!(warnings.as_slice(), [Warning::TargetMissing { .. }]));
        assert!(snapshot.pending().is_empty());
    }
}
