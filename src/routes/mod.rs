//! Request routing.
//!
//! The routes manifest is itself a document. Its `routes` field is an ordered
//! sequence of entries:
//!
//! ```yaml
//! routes:
//!   - pattern: /
//!     doc: !g.doc /content/pages/home.yaml
//!   - pattern: /blog/:base
//!     collection: /content/blog/
//! ```
//!
//! A `doc` entry maps its pattern to one document. A `collection` entry maps
//! a request to `collection + base + document_suffix`, where `base` is the
//! value captured by the pattern's `:base` parameter.
//!
//! [`RouteTable::resolve`] resolves the manifest and builds the pattern trie;
//! [`RouteTable::match_path`] then maps request paths to canonical, not yet
//! resolved documents.

pub mod trie;

use std::sync::Arc;

use tokio::sync::OnceCell;

use crate::constants::{BASE_PARAM, DEFAULT_DOCUMENT_SUFFIX, ROUTES_FIELD};
use crate::core::GrowError;
use crate::document::reference::{DOC_TAG, validate_reference_path};
use crate::document::{Document, ResolutionContext, Value};
use trie::{Params, Trie};

/// What a route maps to.
#[derive(Debug, Clone)]
pub enum RouteTarget {
    /// A single document
    Doc(Arc<Document>),
    /// A path prefix that documents are synthesized under
    Collection(String),
}

/// One parsed manifest entry.
#[derive(Debug, Clone)]
pub struct RouteEntry {
    pub pattern: String,
    pub target: RouteTarget,
}

impl RouteEntry {
    fn from_value(index: usize, value: &Value, ctx: &ResolutionContext) -> Result<Self, GrowError> {
        let Some(mapping) = value.as_mapping() else {
            return Err(GrowError::InvalidRoute {
                pattern: format!("#{index}"),
                reason: format!("route entry must be a mapping, found {}", value.kind()),
            });
        };

        let pattern = match mapping.get("pattern") {
            Some(Value::String(pattern)) => pattern.clone(),
            _ => {
                return Err(GrowError::InvalidRoute {
                    pattern: format!("#{index}"),
                    reason: "route entry needs a string `pattern`".to_string(),
                });
            }
        };
        let invalid = |reason: String| GrowError::InvalidRoute {
            pattern: pattern.clone(),
            reason,
        };

        let target = match (mapping.get("doc"), mapping.get("collection")) {
            (Some(doc), None) => RouteTarget::Doc(doc_target(doc, ctx).map_err(invalid)?),
            (None, Some(Value::String(collection))) => {
                if !trie::parameter_names(&pattern)?.iter().any(|name| name == BASE_PARAM) {
                    return Err(invalid(format!("collection routes need a `:{BASE_PARAM}` parameter")));
                }
                RouteTarget::Collection(collection.clone())
            }
            (None, Some(other)) => {
                return Err(invalid(format!("`collection` must be a string, found {}", other.kind())));
            }
            (None, None) => return Err(invalid("route entry needs `doc` or `collection`".to_string())),
            (Some(_), Some(_)) => {
                return Err(invalid("route entry cannot have both `doc` and `collection`".to_string()));
            }
        };

        Ok(Self {
            pattern,
            target,
        })
    }
}

fn doc_target(value: &Value, ctx: &ResolutionContext) -> Result<Arc<Document>, String> {
    match value {
        Value::Doc(doc) => Ok(Arc::clone(doc)),
        Value::String(path) => validate_reference_path(DOC_TAG, path)
            .map(|path| ctx.document(path))
            .map_err(|e| e.to_string()),
        other => Err(format!("`doc` must be a document reference, found {}", other.kind())),
    }
}

struct RouteIndex {
    entries: Vec<RouteEntry>,
    trie: Trie<usize>,
}

/// Routes manifest plus the pattern trie built from it.
pub struct RouteTable {
    ctx: ResolutionContext,
    manifest: Arc<Document>,
    document_suffix: String,
    index: OnceCell<RouteIndex>,
}

impl RouteTable {
    /// Table backed by the manifest at `manifest_path`. Nothing is loaded yet.
    pub fn new(ctx: ResolutionContext, manifest_path: &str) -> Self {
        let manifest = ctx.document(manifest_path);
        Self {
            ctx,
            manifest,
            document_suffix: DEFAULT_DOCUMENT_SUFFIX.to_string(),
            index: OnceCell::new(),
        }
    }

    /// Suffix appended to synthesized collection document paths.
    pub fn with_document_suffix(mut self, suffix: impl Into<String>) -> Self {
        self.document_suffix = suffix.into();
        self
    }

    pub fn manifest(&self) -> &Arc<Document> {
        &self.manifest
    }

    pub fn document_suffix(&self) -> &str {
        &self.document_suffix
    }

    pub fn is_resolved(&self) -> bool {
        self.index.initialized()
    }

    /// Resolve the manifest and register every entry. Idempotent.
    pub async fn resolve(&self) -> Result<(), GrowError> {
        self.index.get_or_try_init(|| self.build_index()).await?;
        Ok(())
    }

    async fn build_index(&self) -> Result<RouteIndex, GrowError> {
        self.manifest.resolve(&self.ctx).await?;
        let fields = self.manifest.fields().ok_or_else(|| GrowError::RoutesNotResolved {
            path: self.manifest.path().to_string(),
        })?;

        let items = match fields.get(ROUTES_FIELD) {
            None | Some(Value::Null) => {
                tracing::warn!("Routes manifest {} has no `{ROUTES_FIELD}` field", self.manifest.path());
                &[][..]
            }
            Some(Value::Sequence(items)) => items.as_slice(),
            Some(other) => {
                return Err(GrowError::Parse {
                    path: self.manifest.path().to_string(),
                    reason: format!("`{ROUTES_FIELD}` must be a sequence, found {}", other.kind()),
                });
            }
        };

        let mut entries: Vec<RouteEntry> = Vec::with_capacity(items.len());
        let mut trie = Trie::new();
        for (index, item) in items.iter().enumerate() {
            let entry = RouteEntry::from_value(index, item, &self.ctx)?;
            if trie.define(&entry.pattern, entries.len())? {
                tracing::trace!("Registered route {}", entry.pattern);
                entries.push(entry);
            } else {
                tracing::warn!("Duplicate route pattern {} ignored, the first entry wins", entry.pattern);
            }
        }

        tracing::debug!("Loaded {} routes from {}", entries.len(), self.manifest.path());
        Ok(RouteIndex {
            entries,
            trie,
        })
    }

    fn index(&self, request_path: &str) -> Result<&RouteIndex, GrowError> {
        self.index.get().ok_or_else(|| GrowError::RoutesNotResolved {
            path: request_path.to_string(),
        })
    }

    /// Document serving `request_path`. Never resolves the document.
    pub fn match_path(&self, request_path: &str) -> Result<Arc<Document>, GrowError> {
        let index = self.index(request_path)?;
        let found = index.trie.at(request_path).ok_or_else(|| GrowError::NoRouteMatch {
            path: request_path.to_string(),
        })?;
        let entry = &index.entries[*found.value];
        self.target_document(entry, &found.params, request_path)
    }

    fn target_document(
        &self,
        entry: &RouteEntry,
        params: &Params,
        request_path: &str,
    ) -> Result<Arc<Document>, GrowError> {
        match &entry.target {
            RouteTarget::Doc(doc) => Ok(Arc::clone(doc)),
            RouteTarget::Collection(collection) => {
                // `:base` presence is checked when the entry is parsed
                let base = params.get(BASE_PARAM).ok_or_else(|| GrowError::NoRouteMatch {
                    path: request_path.to_string(),
                })?;
                let path = format!("{collection}{base}{}", self.document_suffix);
                Ok(self.ctx.document(&path))
            }
        }
    }

    /// Request path that serves `doc`, if any route maps to it.
    ///
    /// Direct entries only reverse when their pattern has no parameters.
    /// Collection entries reverse documents named `collection + base + suffix`
    /// when `:base` is the pattern's only parameter.
    pub fn reverse(&self, doc: &Document) -> Option<String> {
        let index = self.index.get()?;
        index.entries.iter().find_map(|entry| match &entry.target {
            RouteTarget::Doc(target) if target.path() == doc.path() => trie::expand(&entry.pattern, &[]),
            RouteTarget::Doc(_) => None,
            RouteTarget::Collection(collection) => {
                let base = doc.path().strip_prefix(collection.as_str())?.strip_suffix(&self.document_suffix)?;
                trie::expand(&entry.pattern, &[(BASE_PARAM, base)])
            }
        })
    }

    /// Registered entries in manifest order. Empty until resolved.
    pub fn entries(&self) -> &[RouteEntry] {
        self.index.get().map(|index| index.entries.as_slice()).unwrap_or_default()
    }
}

impl std::fmt::Debug for RouteTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RouteTable")
            .field("manifest", &self.manifest.path())
            .field("document_suffix", &self.document_suffix)
            .field("routes", &self.entries().len())
            .finish()
    }
}
