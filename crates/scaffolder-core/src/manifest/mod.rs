//! Package manifest (package.json) merging
//!
//! The manifest is kept as a JSON document so fields the merge does not know
//! about survive untouched and in their original position. Only the name and
//! the two dependency tables are rewritten.

pub mod versions;

pub use versions::{VersionResolver, VersionTable};

use crate::error::{ScaffoldError, ScaffoldResult};
use serde_json::{Map, Value};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Default manifest location inside a template
pub const MANIFEST_FILE: &str = "package.json";

const DEPENDENCIES: &str = "dependencies";
const DEV_DEPENDENCIES: &str = "devDependencies";

/// Package names the answers call for
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AddedDependencies {
    pub dependencies: BTreeSet<String>,
    pub dev_dependencies: BTreeSet<String>,
}

impl AddedDependencies {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn dependency(&mut self, name: impl Into<String>) -> &mut Self {
        self.dependencies.insert(name.into());
        self
    }

    pub fn dev_dependency(&mut self, name: impl Into<String>) -> &mut Self {
        self.dev_dependencies.insert(name.into());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.dependencies.is_empty() && self.dev_dependencies.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PackageManifest {
    path: PathBuf,
    document: Map<String, Value>,
}

impl PackageManifest {
    pub fn parse(path: impl Into<PathBuf>, content: &str) -> ScaffoldResult<Self> {
        let path = path.into();
        match serde_json::from_str::<Value>(content) {
            Ok(Value::Object(document)) => Ok(Self { path, document }),
            Ok(_) => Err(ScaffoldError::Manifest {
                path,
                reason: "top level is not an object".to_string(),
            }),
            Err(e) => Err(ScaffoldError::Manifest {
                path,
                reason: e.to_string(),
            }),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn name(&self) -> Option<&str> {
        self.document.get("name").and_then(Value::as_str)
    }

    pub fn dependency(&self, name: &str) -> Option<&str> {
        self.section_entry(DEPENDENCIES, name)
    }

    pub fn dev_dependency(&self, name: &str) -> Option<&str> {
        self.section_entry(DEV_DEPENDENCIES, name)
    }

    pub fn dependency_names(&self) -> Vec<&str> {
        self.section_names(DEPENDENCIES)
    }

    pub fn dev_dependency_names(&self) -> Vec<&str> {
        self.section_names(DEV_DEPENDENCIES)
    }

    fn section_entry(&self, section: &str, name: &str) -> Option<&str> {
        self.document
            .get(section)
            .and_then(Value::as_object)
            .and_then(|deps| deps.get(name))
            .and_then(Value::as_str)
    }

    fn section_names(&self, section: &str) -> Vec<&str> {
        self.document
            .get(section)
            .and_then(Value::as_object)
            .map(|deps| deps.keys().map(String::as_str).collect())
            .unwrap_or_default()
    }

    fn take_section(&mut self, section: &str) -> ScaffoldResult<Map<String, Value>> {
        match self.document.get_mut(section) {
            None => Ok(Map::new()),
            Some(Value::Object(deps)) => Ok(std::mem::take(deps)),
            Some(_) => Err(ScaffoldError::Manifest {
                path: self.path.clone(),
                reason: format!("'{section}' is not an object"),
            }),
        }
    }

    fn put_section(&mut self, section: &str, deps: Map<String, Value>) {
        if deps.is_empty() && !self.document.contains_key(section) {
            return;
        }
        let mut entries: Vec<_> = deps.into_iter().collect();
        entries.sort_by(|a, b| a.0.cmp(&b.0));
        self.document
            .insert(section.to_string(), Value::Object(entries.into_iter().collect()));
    }

    /// Merge the added dependencies and rename the project
    ///
    /// Every added name must resolve to a version first; nothing changes if
    /// one does not. Added versions replace template versions. A package ends
    /// up in exactly one table, runtime dependencies winning ties, and both
    /// tables are sorted by name.
    pub fn merge(
        mut self,
        added: &AddedDependencies,
        project_name: &str,
        resolver: &impl VersionResolver,
    ) -> ScaffoldResult<Self> {
        let resolve = |name: &String| {
            resolver
                .resolve(name)
                .map(|version| (name.clone(), version.to_string()))
                .ok_or_else(|| ScaffoldError::MissingVersion { name: name.clone() })
        };
        let runtime: Vec<(String, String)> =
            added.dependencies.iter().map(resolve).collect::<ScaffoldResult<_>>()?;
        let dev: Vec<(String, String)> = added
            .dev_dependencies
            .iter()
            .filter(|name| !added.dependencies.contains(*name))
            .map(resolve)
            .collect::<ScaffoldResult<_>>()?;

        let mut deps = self.take_section(DEPENDENCIES)?;
        let mut dev_deps = self.take_section(DEV_DEPENDENCIES)?;

        for (name, version) in runtime {
            dev_deps.remove(&name);
            deps.insert(name, Value::String(version));
        }
        for (name, version) in dev {
            deps.remove(&name);
            dev_deps.insert(name, Value::String(version));
        }
        dev_deps.retain(|name, _| !deps.contains_key(name));

        debug!(
            dependencies = deps.len(),
            dev_dependencies = dev_deps.len(),
            "Merged manifest dependencies"
        );
        self.put_section(DEPENDENCIES, deps);
        self.put_section(DEV_DEPENDENCIES, dev_deps);
        self.document
            .insert("name".to_string(), Value::String(project_name.to_string()));

        Ok(self)
    }

    /// Two-space indented JSON with a trailing newline, as npm writes it
    pub fn to_json_string(&self) -> ScaffoldResult<String> {
        let mut out = serde_json::to_string_pretty(&self.document).map_err(|e| {
            ScaffoldError::Manifest {
                path: self.path.clone(),
                reason: e.to_string(),
            }
        })?;
        out.push('\n');
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEMPLATE: &str = r#"{
  "name": "alore",
  "version": "0.0.0",
  "private": true,
  "scripts": { "dev": "rakkas" },
  "dependencies": { "react": "^18.2.0", "kysely": "^0.20.0" },
  "devDependencies": { "vite": "^4.2.1", "rakkasjs": "^0.6.20", "pg": "^8.0.0" }
}"#;

    fn versions() -> VersionTable {
        VersionTable::from_entries([
            ("kysely", "^0.24.2"),
            ("pg", "^8.10.0"),
            ("unocss", "^0.51.4"),
            ("@unocss/preset-icons", "^0.51.4"),
        ])
        .unwrap()
    }

    fn added() -> AddedDependencies {
        let mut added = AddedDependencies::new();
        added
            .dependency("kysely")
            .dependency("pg")
            .dev_dependency("unocss")
            .dev_dependency("@unocss/preset-icons");
        added
    }

    #[test]
    fn test_merge_renames_and_pins() {
        let merged = PackageManifest::parse(MANIFEST_FILE, TEMPLATE)
            .unwrap()
            .merge(&added(), "demo", &versions())
            .unwrap();

        assert_eq!(merged.name(), Some("demo"));
        assert_eq!(merged.dependency("kysely"), Some("^0.24.2"));
        assert_eq!(merged.dependency("react"), Some("^18.2.0"));
        assert_eq!(merged.dev_dependency("@unocss/preset-icons"), Some("^0.51.4"));
    }

    #[test]
    fn test_merge_partitions_and_sorts() {
        let merged = PackageManifest::parse(MANIFEST_FILE, TEMPLATE)
            .unwrap()
            .merge(&added(), "demo", &versions())
            .unwrap();

        // pg moved from dev to runtime
        assert_eq!(merged.dependency("pg"), Some("^8.10.0"));
        assert_eq!(merged.dev_dependency("pg"), None);

        let deps = merged.dependency_names();
        let dev = merged.dev_dependency_names();
        assert_eq!(deps, ["kysely", "pg", "react"]);
        assert_eq!(dev, ["@unocss/preset-icons", "rakkasjs", "unocss", "vite"]);
        assert!(deps.iter().all(|d| !dev.contains(d)));
    }

    #[test]
    fn test_merge_is_deterministic() {
        let once = PackageManifest::parse(MANIFEST_FILE, TEMPLATE)
            .unwrap()
            .merge(&added(), "demo", &versions())
            .unwrap()
            .to_json_string()
            .unwrap();
        let twice = PackageManifest::parse(MANIFEST_FILE, &once)
            .unwrap()
            .merge(&added(), "demo", &versions())
            .unwrap()
            .to_json_string()
            .unwrap();
        assert_eq!(once, twice);
    }

    #[test]
    fn test_unrelated_fields_keep_their_position() {
        let out = PackageManifest::parse(MANIFEST_FILE, TEMPLATE)
            .unwrap()
            .merge(&added(), "demo", &versions())
            .unwrap()
            .to_json_string()
            .unwrap();
        let name = out.find("\"name\"").unwrap();
        let version = out.find("\"version\"").unwrap();
        let scripts = out.find("\"scripts\"").unwrap();
        let deps = out.find("\"dependencies\"").unwrap();
        assert!(name < version && version < scripts && scripts < deps);
        assert!(out.ends_with("}\n"));
    }

    #[test]
    fn test_missing_version_fails_without_changes() {
        let mut extra = added();
        extra.dependency("left-pad");
        let err = PackageManifest::parse(MANIFEST_FILE, TEMPLATE)
            .unwrap()
            .merge(&extra, "demo", &versions())
            .unwrap_err();
        assert!(matches!(err, ScaffoldError::MissingVersion { ref name } if name == "left-pad"));
    }

    #[test]
    fn test_name_in_both_added_sets_goes_to_dependencies() {
        let mut both = AddedDependencies::new();
        both.dependency("kysely").dev_dependency("kysely");
        let merged = PackageManifest::parse(MANIFEST_FILE, "{}")
            .unwrap()
            .merge(&both, "demo", &versions())
            .unwrap();
        assert_eq!(merged.dependency("kysely"), Some("^0.24.2"));
        assert_eq!(merged.dev_dependency("kysely"), None);
        assert!(merged.dev_dependency_names().is_empty());
    }

    #[test]
    fn test_rejects_malformed_manifests() {
        assert!(matches!(
            PackageManifest::parse(MANIFEST_FILE, "[]"),
            Err(ScaffoldError::Manifest { .. })
        ));
        assert!(matches!(
            PackageManifest::parse(MANIFEST_FILE, "{ nope"),
            Err(ScaffoldError::Manifest { .. })
        ));
        let err = PackageManifest::parse(MANIFEST_FILE, r#"{"dependencies": []}"#)
            .unwrap()
            .merge(&added(), "demo", &versions())
            .unwrap_err();
        assert!(matches!(err, ScaffoldError::Manifest { .. }));
    }
}
