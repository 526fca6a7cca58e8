//! Template references: `github:owner/repo/sub/path#ref` or `local:<dir>`

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use thiserror::Error;

/// Branch or tag used when a reference does not name one
pub const DEFAULT_REF: &str = "main";

/// Where a template lives
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TemplateHost {
    GitHub,
    Local,
}

impl TemplateHost {
    pub fn as_str(&self) -> &'static str {
        match self {
            TemplateHost::GitHub => "github",
            TemplateHost::Local => "local",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Invalid template reference '{input}': {reason}")]
pub struct TemplateRefError {
    pub input: String,
    pub reason: &'static str,
}

/// Identifies a template: host, repository and a sub-path inside it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateRef {
    pub host: TemplateHost,
    /// `owner/repo` for GitHub, a directory for local templates
    pub repository: String,
    /// Slash-separated path inside the repository; empty for the root
    pub subpath: String,
    /// Branch, tag or commit (GitHub only)
    pub reference: String,
}

impl TemplateRef {
    pub fn github(
        repository: impl Into<String>,
        subpath: impl Into<String>,
        reference: impl Into<String>,
    ) -> Self {
        Self {
            host: TemplateHost::GitHub,
            repository: repository.into(),
            subpath: subpath.into(),
            reference: reference.into(),
        }
    }

    /// A template directory `subpath` below the local root `dir`
    pub fn local(dir: impl AsRef<Path>, subpath: impl Into<String>) -> Self {
        Self {
            host: TemplateHost::Local,
            repository: dir.as_ref().to_string_lossy().into_owned(),
            subpath: subpath.into(),
            reference: String::new(),
        }
    }

    /// The `owner` and `repo` halves of a GitHub repository
    pub fn owner_and_repo(&self) -> Option<(&str, &str)> {
        self.repository.split_once('/')
    }

    /// Absolute-or-relative directory of a local template
    pub fn local_dir(&self) -> PathBuf {
        let root = PathBuf::from(&self.repository);
        if self.subpath.is_empty() {
            root
        } else {
            root.join(&self.subpath)
        }
    }

    fn check_subpath(input: &str, subpath: &str) -> Result<(), TemplateRefError> {
        if subpath
            .split('/')
            .any(|segment| segment.is_empty() || segment == "." || segment == "..")
            && !subpath.is_empty()
        {
            return Err(TemplateRefError {
                input: input.to_string(),
                reason: "sub-path segments must be non-empty and may not be '.' or '..'",
            });
        }
        Ok(())
    }
}

impl FromStr for TemplateRef {
    type Err = TemplateRefError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let err = |reason| TemplateRefError {
            input: input.to_string(),
            reason,
        };

        let (host, rest) = match input.split_once(':') {
            Some(("github", rest)) => (TemplateHost::GitHub, rest),
            Some(("local", rest)) => (TemplateHost::Local, rest),
            Some(_) => return Err(err("unknown host, expected 'github:' or 'local:'")),
            None => (TemplateHost::GitHub, input),
        };

        if host == TemplateHost::Local {
            if rest.is_empty() {
                return Err(err("missing local directory"));
            }
            return Ok(Self::local(rest, ""));
        }

        let (path, reference) = match rest.split_once('#') {
            Some((_, "")) => return Err(err("empty ref after '#'")),
            Some((path, reference)) => (path, reference),
            None => (rest, DEFAULT_REF),
        };

        let mut segments = path.trim_matches('/').splitn(3, '/');
        let owner = segments.next().unwrap_or_default();
        let repo = segments.next().unwrap_or_default();
        if owner.is_empty() || repo.is_empty() {
            return Err(err("expected owner/repo"));
        }
        let subpath = segments.next().unwrap_or_default();
        Self::check_subpath(input, subpath)?;

        Ok(Self::github(format!("{owner}/{repo}"), subpath, reference))
    }
}

impl fmt::Display for TemplateRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.host {
            TemplateHost::GitHub => {
                write!(f, "github:{}", self.repository)?;
                if !self.subpath.is_empty() {
                    write!(f, "/{}", self.subpath)?;
                }
                write!(f, "#{}", self.reference)
            }
            TemplateHost::Local => write!(f, "local:{}", self.local_dir().display()),
        }
    }
}
