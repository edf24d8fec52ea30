//! Filesystem content source.

use std::path::{Component, Path, PathBuf};

use super::{ContentSource, FetchFuture};
use crate::core::GrowError;

/// Reads pod-absolute paths from files below `root`.
///
/// `/content/blog/hello.yaml` maps to `<root>/content/blog/hello.yaml`.
/// Paths that climb above the root with `..` are rejected before any
/// filesystem access happens.
#[derive(Debug, Clone)]
pub struct FsSource {
    root: PathBuf,
}

impl FsSource {
    /// Create a source rooted at `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
        }
    }

    /// The pod root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Map a pod-absolute path onto a file below the root.
    pub fn file_path(&self, path: &str) -> Result<PathBuf, GrowError> {
        let relative = Path::new(path.trim_start_matches('/'));

        let mut depth: i32 = 0;
        for component in relative.components() {
            match component {
                Component::Normal(_) => depth += 1,
                Component::CurDir => {}
                Component::ParentDir => {
                    depth -= 1;
                    if depth < 0 {
                        return Err(GrowError::Fetch {
                            path: path.to_string(),
                            reason: "path escapes the pod root".to_string(),
                        });
                    }
                }
                Component::RootDir | Component::Prefix(_) => {
                    return Err(GrowError::Fetch {
                        path: path.to_string(),
                        reason: "invalid path component".to_string(),
                    });
                }
            }
        }

        if depth == 0 {
            return Err(GrowError::Fetch {
                path: path.to_string(),
                reason: "path does not name a file".to_string(),
            });
        }

        Ok(self.root.join(relative))
    }
}

impl ContentSource for FsSource {
    fn name(&self) -> &str {
        "fs"
    }

    fn fetch<'a>(&'a self, path: &'a str) -> FetchFuture<'a> {
        Box::pin(async move {
            let file = self.file_path(path)?;
            tracing::debug!(target: "source", "Reading {} from {}", path, file.display());
            tokio::fs::read_to_string(&file).await.map_err(|e| GrowError::Fetch {
                path: path.to_string(),
                reason: format!("{} ({})", e, file.display()),
            })
        })
    }
}
