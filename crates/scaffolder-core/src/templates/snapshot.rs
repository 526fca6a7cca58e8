//! In-memory view of the files the pipeline rewrites inside a fetched template

use crate::error::{ScaffoldError, ScaffoldResult};
use std::collections::BTreeMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::task::JoinSet;
use tracing::debug;

#[derive(Debug)]
struct Entry {
    content: Option<String>,
    dirty: bool,
}

/// Files of a materialized template that patches and the manifest merge touch
///
/// Files are read lazily from the destination on first use and only written
/// back by [`flush`](Self::flush).
#[derive(Debug)]
pub struct TemplateSnapshot {
    root: PathBuf,
    entries: BTreeMap<PathBuf, Entry>,
}

impl TemplateSnapshot {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            entries: BTreeMap::new(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Current content of `relative`, reading it from disk the first time
    ///
    /// Returns `None` when the template has no such file.
    pub async fn load(&mut self, relative: &Path) -> ScaffoldResult<Option<&str>> {
        if !self.entries.contains_key(relative) {
            let path = self.root.join(relative);
            let content = match fs::read_to_string(&path).await {
                Ok(text) => Some(text),
                Err(e) if e.kind() == ErrorKind::NotFound => None,
                Err(e) => return Err(ScaffoldError::io("read", path, e)),
            };
            self.entries.insert(
                relative.to_path_buf(),
                Entry {
                    content,
                    dirty: false,
                },
            );
        }
        Ok(self
            .entries
            .get(relative)
            .and_then(|e| e.content.as_deref()))
    }

    /// Content already loaded or staged, without touching the disk
    pub fn get(&self, relative: &Path) -> Option<&str> {
        self.entries
            .get(relative)
            .and_then(|e| e.content.as_deref())
    }

    /// Stage new content for `relative`, replacing whatever was there
    pub fn write(&mut self, relative: impl Into<PathBuf>, content: String) {
        self.entries.insert(
            relative.into(),
            Entry {
                content: Some(content),
                dirty: true,
            },
        );
    }

    /// Relative paths with staged, unflushed content
    pub fn pending(&self) -> Vec<&Path> {
        self.entries
            .iter()
            .filter(|(_, e)| e.dirty)
            .map(|(p, _)| p.as_path())
            .collect()
    }

    /// Write every staged file concurrently and wait for all of them
    ///
    /// Returns the relative paths written, sorted. The first failure is
    /// reported after every write has finished.
    pub async fn flush(&mut self) -> ScaffoldResult<Vec<PathBuf>> {
        let mut tasks = JoinSet::new();

        for (relative, entry) in self.entries.iter_mut().filter(|(_, e)| e.dirty) {
            let Some(content) = entry.content.clone() else {
                continue;
            };
            entry.dirty = false;
            let relative = relative.clone();
            let path = self.root.join(&relative);

            tasks.spawn(async move {
                if let Some(parent) = path.parent() {
                    fs::create_dir_all(parent)
                        .await
                        .map_err(|e| ScaffoldError::io("create directory", parent, e))?;
                }
                fs::write(&path, content)
                    .await
                    .map_err(|e| ScaffoldError::io("write", &path, e))?;
                debug!(path = %path.display(), "Wrote file");
                Ok::<_, ScaffoldError>(relative)
            });
        }

        let mut written = Vec::new();
        let mut first_error = None;
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(Ok(relative)) => written.push(relative),
                Ok(Err(e)) => {
                    first_error.get_or_insert(e);
                }
                Err(e) => {
                    first_error.get_or_insert(ScaffoldError::io(
                        "write",
                        self.root.clone(),
                        std::io::Error::other(e),
                    ));
                }
            }
        }

        if let Some(e) = first_error {
            return Err(e);
        }
        written.sort();
        Ok(written)
    }
}
