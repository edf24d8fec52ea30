//! Pod configuration (`grow.toml`).
//!
//! Every setting has a default, so a pod without a `grow.toml` works as
//! long as it follows the default layout.
//!
//! ```toml
//! [pod]
//! routes = "/routes.yaml"           # routes manifest document
//! default_view = "/views/base.html" # view for documents without `$view`
//! document_suffix = ".yaml"         # appended to collection paths
//!
//! [source]
//! kind = "fs"                       # "fs" or "http"
//! root = "."                        # fs: pod root, relative to grow.toml, `~` expanded
//! base_url = "http://localhost:8080"
//!
//! [render]
//! autoescape = true
//! cycle_policy = "break"            # "break" or "error"
//! ```

use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::fs;

use crate::constants::{DEFAULT_BASE_URL, DEFAULT_DOCUMENT_SUFFIX, DEFAULT_ROUTES_PATH, DEFAULT_VIEW};
use crate::core::GrowError;
use crate::document::CyclePolicy;
use crate::source::{ContentSource, FsSource, HttpSource};

/// Complete pod configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PodConfig {
    pub pod: PodSection,
    pub source: SourceSection,
    pub render: RenderSection,

    /// Directory relative `source.root` paths are resolved against.
    #[serde(skip)]
    pub base_dir: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PodSection {
    pub routes: String,
    pub default_view: String,
    pub document_suffix: String,
}

impl Default for PodSection {
    fn default() -> Self {
        Self {
            routes: DEFAULT_ROUTES_PATH.to_string(),
            default_view: DEFAULT_VIEW.to_string(),
            document_suffix: DEFAULT_DOCUMENT_SUFFIX.to_string(),
        }
    }
}

/// Content source backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    #[default]
    Fs,
    Http,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SourceSection {
    pub kind: SourceKind,
    pub root: String,
    pub base_url: String,
}

impl Default for SourceSection {
    fn default() -> Self {
        Self {
            kind: SourceKind::Fs,
            root: ".".to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RenderSection {
    pub autoescape: bool,
    pub cycle_policy: CyclePolicy,
}

impl Default for RenderSection {
    fn default() -> Self {
        Self {
            autoescape: true,
            cycle_policy: CyclePolicy::default(),
        }
    }
}

impl PodConfig {
    /// Load configuration from `path`; a missing file yields the defaults
    /// with `path`'s directory as the base directory.
    pub async fn load(path: &Path) -> Result<Self, GrowError> {
        let base_dir = path.parent().map(Path::to_path_buf);

        let content = match fs::read_to_string(path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!("No config at {}, using defaults", path.display());
                return Ok(Self {
                    base_dir,
                    ..Self::default()
                });
            }
            Err(e) => {
                return Err(GrowError::Config {
                    reason: format!("Failed to read {}: {e}", path.display()),
                });
            }
        };

        let mut config = Self::from_toml_str(&content).map_err(|e| match e {
            GrowError::Config {
                reason,
            } => GrowError::Config {
                reason: format!("{}: {reason}", path.display()),
            },
            other => other,
        })?;
        config.base_dir = base_dir;
        tracing::debug!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Parse configuration text.
    pub fn from_toml_str(content: &str) -> Result<Self, GrowError> {
        let config: Self = toml::from_str(content).map_err(|e| GrowError::Config {
            reason: e.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), GrowError> {
        for (key, value) in [("pod.routes", &self.pod.routes), ("pod.default_view", &self.pod.default_view)] {
            if !value.starts_with('/') {
                return Err(GrowError::Config {
                    reason: format!("`{key}` must be a pod path starting with '/', got \"{value}\""),
                });
            }
        }
        Ok(())
    }

    /// Pod root directory for the filesystem source.
    pub fn pod_root(&self) -> PathBuf {
        let expanded = PathBuf::from(shellexpand::tilde(&self.source.root).as_ref());
        match &self.base_dir {
            Some(base) if expanded.is_relative() => base.join(expanded),
            _ => expanded,
        }
    }

    /// Content source selected by `source.kind`.
    pub fn build_source(&self) -> Arc<dyn ContentSource> {
        match self.source.kind {
            SourceKind::Fs => Arc::new(FsSource::new(self.pod_root())),
            SourceKind::Http => Arc::new(HttpSource::new(self.source.base_url.clone())),
        }
    }
}
