//! Pinned dependency versions, injected into the manifest merge

use crate::error::{ScaffoldError, ScaffoldResult};
use anyhow::{Context, Result};
use semver::VersionReq;
use std::collections::BTreeMap;
use std::path::Path;

/// Resolves a package name to the version constraint written to the manifest
pub trait VersionResolver {
    fn resolve(&self, name: &str) -> Option<&str>;
}

/// Package name to semver range, e.g. `kysely: "^0.24.2"`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VersionTable {
    entries: BTreeMap<String, String>,
}

impl VersionTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a table, rejecting constraints that are not npm semver ranges
    pub fn from_entries<I, K, V>(entries: I) -> ScaffoldResult<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mut table = Self::new();
        for (name, constraint) in entries {
            table.insert(name, constraint)?;
        }
        Ok(table)
    }

    pub fn insert(
        &mut self,
        name: impl Into<String>,
        constraint: impl Into<String>,
    ) -> ScaffoldResult<()> {
        let name = name.into();
        let constraint = constraint.into();
        if let Err(source) = check_npm_range(&constraint) {
            return Err(ScaffoldError::InvalidVersion {
                name,
                constraint,
                source,
            });
        }
        self.entries.insert(name, constraint);
        Ok(())
    }

    /// Parse a flat YAML mapping of overrides
    pub fn from_yaml_str(content: &str) -> Result<Self> {
        let entries: BTreeMap<String, String> =
            serde_yaml::from_str(content).context("Failed to parse version table")?;
        Ok(Self::from_entries(entries)?)
    }

    pub fn load_yaml(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        Self::from_yaml_str(&content)
            .with_context(|| format!("Invalid versions file {}", path.display()))
    }

    pub fn to_yaml_string(&self) -> Result<String> {
        serde_yaml::to_string(&self.entries).context("Failed to serialize version table")
    }

    /// Overlay `other` on top of this table; its entries win
    pub fn merged_with(mut self, other: VersionTable) -> Self {
        self.entries.extend(other.entries);
        self
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

/// Checks an npm range such as `^1 || >=2.1.0 <3` or `1.2.3 - 2.0.0`
///
/// `||` separates alternatives; inside one, comparators are separated by
/// whitespace instead of the commas [`VersionReq`] expects.
fn check_npm_range(constraint: &str) -> Result<(), semver::Error> {
    for alternative in constraint.split("||") {
        VersionReq::parse(&comparator_list(alternative))?;
    }
    Ok(())
}

fn comparator_list(alternative: &str) -> String {
    let tokens: Vec<&str> = alternative.split_whitespace().collect();
    if let [low, "-", high] = tokens.as_slice() {
        return format!(">={low}, <={high}");
    }

    let mut comparators: Vec<String> = Vec::new();
    let mut pending_op: Option<&str> = None;
    for token in tokens {
        if token.chars().all(|c| matches!(c, '<' | '>' | '=' | '^' | '~')) {
            pending_op = Some(token);
            continue;
        }
        match pending_op.take() {
            Some(op) => comparators.push(format!("{op}{token}")),
            None => comparators.push(token.to_string()),
        }
    }
    if let Some(op) = pending_op {
        comparators.push(op.to_string());
    }
    comparators.join(", ")
}

impl VersionResolver for VersionTable {
    fn resolve(&self, name: &str) -> Option<&str> {
        self.entries.get(name).map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accepts_npm_style_ranges() {
        let table = VersionTable::from_entries([
            ("kysely", "^0.24.2"),
            ("pg", "~8.10.0"),
            ("zod", "3.21.4"),
        ])
        .unwrap();
        assert_eq!(table.resolve("kysely"), Some("^0.24.2"));
        assert_eq!(table.resolve("missing"), None);
    }

    #[test]
    fn test_accepts_space_separated_and_alternative_ranges() {
        let table = VersionTable::from_entries([
            ("pg", ">=1.2.0 <2"),
            ("zod", "^1 || ^2"),
            ("react", ">= 18.2.0"),
            ("kysely", "0.24.0 - 0.24.2"),
            ("vite", "*"),
        ])
        .unwrap();
        assert_eq!(table.resolve("pg"), Some(">=1.2.0 <2"));
        assert_eq!(table.resolve("zod"), Some("^1 || ^2"));
    }

    #[test]
    fn test_rejects_empty_alternative() {
        assert!(VersionTable::from_entries([("zod", "^1 ||")]).is_err());
        assert!(VersionTable::from_entries([("zod", ">=1.2.0 <")]).is_err());
    }

    #[test]
    fn test_rejects_invalid_constraint() {
        let err = VersionTable::from_entries([("kysely", "latest")]).unwrap_err();
        assert!(matches!(err, ScaffoldError::InvalidVersion { ref name, .. } if name == "kysely"));
    }

    #[test]
    fn test_yaml_overrides_win() {
        let base = VersionTable::from_entries([("kysely", "^0.24.2"), ("pg", "^8.10.0")]).unwrap();
        let overrides = VersionTable::from_yaml_str("kysely: \"^0.25.0\"\n").unwrap();
        let merged = base.merged_with(overrides);
        assert_eq!(merged.resolve("kysely"), Some("^0.25.0"));
        assert_eq!(merged.resolve("pg"), Some("^8.10.0"));
    }

    #[test]
    fn test_yaml_rejects_non_mapping() {
        assert!(VersionTable::from_yaml_str("- kysely\n").is_err());
        assert!(VersionTable::from_yaml_str("kysely: \"not a range\"\n").is_err());
    }

    #[test]
    fn test_yaml_output_is_sorted() {
        let table =
            VersionTable::from_entries([("zod", "^3.21.4"), ("kysely", "^0.24.2")]).unwrap();
        let yaml = table.to_yaml_string().unwrap();
        assert!(yaml.find("kysely").unwrap() < yaml.find("zod").unwrap());
    }
}
