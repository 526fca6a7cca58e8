//! Template fetching from GitHub archives or a local directory
//!
//! Both sources go through a zip archive for consistency:
//! - Remote: downloads the repository zip from the archive host
//! - Local: packs the template folder into an in-memory zip first
//!
//! The same extraction code then writes the sub-path to the destination,
//! so development and production behave identically.

use super::reference::{TemplateHost, TemplateRef};
use crate::error::Warning;
use crate::product::ProductConfig;
use std::collections::BTreeMap;
use std::future::Future;
use std::io::{Cursor, Read, Write};
use std::path::{Component, Path, PathBuf};
use thiserror::Error;
use tokio::fs;
use tracing::{debug, info, instrument};
use url::Url;
use walkdir::WalkDir;
use zip::write::SimpleFileOptions;
use zip::{ZipArchive, ZipWriter};

/// Archive host used when no override is configured
pub const DEFAULT_ARCHIVE_URL: &str = "https://codeload.github.com";

/// Top-level folder name used inside locally built archives
const LOCAL_ARCHIVE_ROOT: &str = "template";

/// Directories never packed from a local template
const IGNORED_DIRS: &[&str] = &[".git", "node_modules"];

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("HTTP {status} while downloading {url}")]
    Http {
        url: Url,
        status: reqwest::StatusCode,
    },

    #[error("Request to {url} failed: {source}")]
    Transport {
        url: Url,
        #[source]
        source: reqwest::Error,
    },

    #[error("Invalid archive URL: {0}")]
    Url(String),

    #[error("Corrupt template archive: {0}")]
    Archive(#[from] zip::result::ZipError),

    #[error("Failed to read local template: {0}")]
    Walk(#[from] walkdir::Error),

    #[error("I/O error at {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Template sub-path '{subpath}' not found in {template}")]
    SubPathNotFound { template: String, subpath: String },

    #[error("Destination {} is not empty", path.display())]
    DestinationNotEmpty { path: PathBuf },
}

impl FetchError {
    fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FetchOptions {
    /// Replace (not merge) an existing destination
    pub overwrite: bool,
}

/// What a successful fetch produced
#[derive(Debug, Clone, Default)]
pub struct FetchOutcome {
    /// Relative paths written below the destination
    pub files: Vec<PathBuf>,
    pub warnings: Vec<Warning>,
}

/// Materializes a template tree at a destination directory
///
/// On failure the destination may be left half-written; cleaning it up is
/// the caller's job.
pub trait SnapshotFetcher {
    fn fetch(
        &self,
        template: &TemplateRef,
        destination: &Path,
        options: FetchOptions,
    ) -> impl Future<Output = Result<FetchOutcome, FetchError>> + Send;
}

/// Files extracted from an archive, keyed by destination-relative path
#[derive(Debug, Default)]
pub struct ExtractedTree {
    pub files: BTreeMap<PathBuf, Vec<u8>>,
    pub warnings: Vec<Warning>,
}

/// Production fetcher backed by `reqwest` and `zip`
pub struct TemplateFetcher {
    client: reqwest::Client,
    archive_base: Url,
}

impl TemplateFetcher {
    /// Create a new fetcher with a custom user agent
    pub fn new(archive_base: Url, user_agent: &str) -> Self {
        Self {
            client: reqwest::Client::builder()
                .user_agent(user_agent)
                .build()
                .unwrap_or_else(|_| reqwest::Client::new()),
            archive_base,
        }
    }

    /// Create a fetcher from a product config, honoring its archive URL override
    pub fn from_config<C: ProductConfig>(config: &C) -> Result<Self, FetchError> {
        let url_str = std::env::var(config.archive_url_env())
            .unwrap_or_else(|_| DEFAULT_ARCHIVE_URL.to_string());
        let url = Url::parse(&url_str).map_err(|e| FetchError::Url(format!("{url_str}: {e}")))?;
        Ok(Self::new(url, config.user_agent()))
    }

    /// `<base>/<owner>/<repo>/zip/<ref>`, preserving query parameters
    fn archive_url(&self, template: &TemplateRef) -> Result<Url, FetchError> {
        let (owner, repo) = template
            .owner_and_repo()
            .ok_or_else(|| FetchError::Url(format!("not an owner/repo: {}", template.repository)))?;
        let mut url = self.archive_base.clone();
        url.path_segments_mut()
            .map_err(|_| FetchError::Url(format!("cannot be a base: {}", self.archive_base)))?
            .pop_if_empty()
            .extend([owner, repo, "zip", template.reference.as_str()]);
        Ok(url)
    }

    async fn download(&self, url: Url) -> Result<Vec<u8>, FetchError> {
        info!(%url, "Downloading template archive");
        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|source| FetchError::Transport {
                url: url.clone(),
                source,
            })?;

        if !response.status().is_success() {
            return Err(FetchError::Http {
                url,
                status: response.status(),
            });
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|source| FetchError::Transport { url, source })?;
        debug!(bytes = bytes.len(), "Archive downloaded");
        Ok(bytes.to_vec())
    }
}

impl SnapshotFetcher for TemplateFetcher {
    #[instrument(skip_all, fields(template = %template, destination = %destination.display()))]
    async fn fetch(
        &self,
        template: &TemplateRef,
        destination: &Path,
        options: FetchOptions,
    ) -> Result<FetchOutcome, FetchError> {
        let (archive, subpath) = match template.host {
            TemplateHost::GitHub => {
                let url = self.archive_url(template)?;
                (self.download(url).await?, template.subpath.clone())
            }
            TemplateHost::Local => {
                let dir = template.local_dir();
                info!(dir = %dir.display(), "Packing local template");
                let archive = tokio::task::spawn_blocking(move || build_local_zip(&dir))
                    .await
                    .map_err(|e| FetchError::io(template.local_dir(), std::io::Error::other(e)))??;
                (archive, String::new())
            }
        };

        let tree = extract_archive(&archive, &subpath)?;
        if tree.files.is_empty() {
            return Err(FetchError::SubPathNotFound {
                template: template.to_string(),
                subpath,
            });
        }

        prepare_destination(destination, options).await?;
        let files = write_tree(destination, tree.files).await?;
        info!(files = files.len(), "Template materialized");

        Ok(FetchOutcome {
            files,
            warnings: tree.warnings,
        })
    }
}

/// Create the destination, clearing it first when overwriting
pub async fn prepare_destination(
    destination: &Path,
    options: FetchOptions,
) -> Result<(), FetchError> {
    match fs::read_dir(destination).await {
        Ok(mut entries) => {
            let occupied = entries
                .next_entry()
                .await
                .map_err(|e| FetchError::io(destination, e))?
                .is_some();
            if occupied {
                if !options.overwrite {
                    return Err(FetchError::DestinationNotEmpty {
                        path: destination.to_path_buf(),
                    });
                }
                debug!(path = %destination.display(), "Removing existing destination");
                fs::remove_dir_all(destination)
                    .await
                    .map_err(|e| FetchError::io(destination, e))?;
            }
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => return Err(FetchError::io(destination, e)),
    }

    fs::create_dir_all(destination)
        .await
        .map_err(|e| FetchError::io(destination, e))
}

async fn write_tree(
    destination: &Path,
    files: BTreeMap<PathBuf, Vec<u8>>,
) -> Result<Vec<PathBuf>, FetchError> {
    let mut written = Vec::with_capacity(files.len());
    for (relative, content) in files {
        let target = destination.join(&relative);
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| FetchError::io(parent, e))?;
        }
        fs::write(&target, &content)
            .await
            .map_err(|e| FetchError::io(&target, e))?;
        written.push(relative);
    }
    Ok(written)
}

/// Pack a local template directory into an in-memory zip
///
/// Entries are stored below a single top-level folder, the same shape as a
/// GitHub repository archive.
pub fn build_local_zip(template_dir: &Path) -> Result<Vec<u8>, FetchError> {
    if !template_dir.is_dir() {
        return Err(FetchError::SubPathNotFound {
            template: template_dir.display().to_string(),
            subpath: String::new(),
        });
    }

    let mut zip_buffer = Vec::new();
    {
        let mut zip = ZipWriter::new(Cursor::new(&mut zip_buffer));
        let options =
            SimpleFileOptions::default().compression_method(zip::CompressionMethod::Deflated);

        let walker = WalkDir::new(template_dir)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|e| {
                e.depth() == 0
                    || !(e.file_type().is_dir()
                        && IGNORED_DIRS.contains(&e.file_name().to_string_lossy().as_ref()))
            });

        for entry in walker {
            let entry = entry?;
            if !entry.file_type().is_file() {
                continue;
            }
            let relative = entry
                .path()
                .strip_prefix(template_dir)
                .unwrap_or(entry.path());
            let name: Vec<String> = relative
                .components()
                .map(|c| c.as_os_str().to_string_lossy().into_owned())
                .collect();

            let content =
                std::fs::read(entry.path()).map_err(|e| FetchError::io(entry.path(), e))?;
            zip.start_file(format!("{}/{}", LOCAL_ARCHIVE_ROOT, name.join("/")), options)?;
            zip.write_all(&content)
                .map_err(|e| FetchError::io(entry.path(), e))?;
        }

        zip.finish()?;
    }

    Ok(zip_buffer)
}

/// Extract the files below `subpath` from a repository-shaped archive
///
/// The archive's top-level folder is stripped first. Entries that are not
/// safe relative paths are skipped with a warning.
pub fn extract_archive(zip_bytes: &[u8], subpath: &str) -> Result<ExtractedTree, FetchError> {
    let mut archive = ZipArchive::new(Cursor::new(zip_bytes))?;
    let prefix: PathBuf = subpath.split('/').filter(|s| !s.is_empty()).collect();
    let mut tree = ExtractedTree::default();

    for i in 0..archive.len() {
        let mut file = archive.by_index(i)?;
        if file.is_dir() {
            continue;
        }

        let raw_name = file.name().to_string();
        let Some(enclosed) = file.enclosed_name().map(|p| p.to_path_buf()) else {
            tree.warnings.push(Warning::SkippedEntry {
                entry: raw_name,
                reason: "path escapes the template root".to_string(),
            });
            continue;
        };

        // Strip the archive's top-level folder (e.g. `repo-main/`)
        let mut components = enclosed.components();
        components.next();
        let in_repo = components.as_path();

        let Ok(relative) = in_repo.strip_prefix(&prefix) else {
            continue;
        };
        if relative.as_os_str().is_empty()
            || relative
                .components()
                .any(|c| !matches!(c, Component::Normal(_)))
        {
            tree.warnings.push(Warning::SkippedEntry {
                entry: raw_name,
                reason: "not a regular relative path".to_string(),
            });
            continue;
        }

        let mut contents = Vec::new();
        file.read_to_end(&mut contents)
            .map_err(|e| FetchError::io(relative, e))?;
        tree.files.insert(relative.to_path_buf(), contents);
    }

    Ok(tree)
}
