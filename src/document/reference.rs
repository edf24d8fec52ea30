//! Reference types recognized by the YAML loader.
//!
//! A reference is a tagged YAML scalar naming another document or a static
//! asset by path:
//!
//! ```yaml
//! author: !g.doc /content/authors/ada.yaml
//! image: !g.static /static/img/logo.png
//! ```
//!
//! Each tag is handled by a [`ReferenceType`]. The [`ReferenceSchema`] holds
//! the registered types and converts raw YAML into the [`Value`] tree.
//! Constructing a document reference only looks the document up in the
//! registry; resolution happens later, during the deep-resolve pass.

use std::fmt;
use std::sync::Arc;

use super::ResolutionContext;
use super::value::{Mapping, Value};
use crate::core::GrowError;

/// Tag of document references.
pub const DOC_TAG: &str = "g.doc";

/// Tag of static-asset references.
pub const STATIC_TAG: &str = "g.static";

/// A scalar reference kind, keyed by its YAML tag.
pub trait ReferenceType: Send + Sync {
    /// Tag handled by this type, without the leading `!`.
    fn tag(&self) -> &str;

    /// Build the value for a tagged scalar.
    fn construct(&self, value: &str, ctx: &ResolutionContext) -> Result<Value, GrowError>;
}

/// `!g.doc` → canonical [`Document`](super::Document), not resolved.
#[derive(Debug, Clone, Copy, Default)]
pub struct DocReference;

impl ReferenceType for DocReference {
    fn tag(&self) -> &str {
        DOC_TAG
    }

    fn construct(&self, value: &str, ctx: &ResolutionContext) -> Result<Value, GrowError> {
        let path = validate_reference_path(DOC_TAG, value)?;
        Ok(Value::Doc(ctx.document(path)))
    }
}

/// `!g.static` → fresh [`StaticAsset`](super::StaticAsset).
#[derive(Debug, Clone, Copy, Default)]
pub struct StaticReference;

impl ReferenceType for StaticReference {
    fn tag(&self) -> &str {
        STATIC_TAG
    }

    fn construct(&self, value: &str, ctx: &ResolutionContext) -> Result<Value, GrowError> {
        let path = validate_reference_path(STATIC_TAG, value)?;
        Ok(Value::Static(ctx.static_asset(path)))
    }
}

/// Check that a reference scalar names a pod-absolute path.
pub fn validate_reference_path<'a>(tag: &str, value: &'a str) -> Result<&'a str, GrowError> {
    let malformed = |reason: &str| GrowError::MalformedReference {
        tag: tag.to_string(),
        value: value.to_string(),
        reason: reason.to_string(),
    };

    let path = value.trim();
    if path.is_empty() {
        return Err(malformed("empty path"));
    }
    if !path.starts_with('/') {
        return Err(malformed("reference paths must be pod-absolute (start with '/')"));
    }
    if path.chars().any(char::is_control) {
        return Err(malformed("path contains control characters"));
    }
    Ok(path)
}

/// Registered reference types, handed to the YAML loader.
#[derive(Clone)]
pub struct ReferenceSchema {
    types: Vec<Arc<dyn ReferenceType>>,
}

impl Default for ReferenceSchema {
    fn default() -> Self {
        Self::empty().with_type(DocReference).with_type(StaticReference)
    }
}

impl ReferenceSchema {
    /// A schema with no reference types; every tag is rejected.
    pub fn empty() -> Self {
        Self {
            types: Vec::new(),
        }
    }

    /// Register a reference type, replacing any type with the same tag.
    pub fn with_type(mut self, reference_type: impl ReferenceType + 'static) -> Self {
        let tag = normalize_tag(reference_type.tag()).to_string();
        self.types.retain(|existing| normalize_tag(existing.tag()) != tag);
        self.types.push(Arc::new(reference_type));
        self
    }

    /// Find the type registered for `tag` (with or without the leading `!`).
    pub fn find(&self, tag: &str) -> Option<&dyn ReferenceType> {
        let tag = normalize_tag(tag);
        self.types.iter().find(|t| normalize_tag(t.tag()) == tag).map(|t| &**t)
    }

    /// Registered tags, in registration order.
    pub fn tags(&self) -> Vec<&str> {
        self.types.iter().map(|t| normalize_tag(t.tag())).collect()
    }

    /// Parse raw document text into its top-level mapping.
    ///
    /// An empty document yields an empty mapping. Any other non-mapping root
    /// is a [`GrowError::Parse`].
    pub fn parse_document(
        &self,
        path: &str,
        raw: &str,
        ctx: &ResolutionContext,
    ) -> Result<Mapping, GrowError> {
        let yaml: serde_yaml::Value = serde_yaml::from_str(raw).map_err(|e| GrowError::Parse {
            path: path.to_string(),
            reason: e.to_string(),
        })?;

        match self.convert(path, yaml, ctx)? {
            Value::Null => Ok(Mapping::new()),
            Value::Mapping(mapping) => Ok(mapping),
            other => Err(GrowError::Parse {
                path: path.to_string(),
                reason: format!("document root must be a mapping, found {}", other.kind()),
            }),
        }
    }

    fn convert(
        &self,
        path: &str,
        yaml: serde_yaml::Value,
        ctx: &ResolutionContext,
    ) -> Result<Value, GrowError> {
        Ok(match yaml {
            serde_yaml::Value::Null => Value::Null,
            serde_yaml::Value::Bool(b) => Value::Bool(b),
            serde_yaml::Value::Number(n) => Value::Number(n),
            serde_yaml::Value::String(s) => Value::String(s),
            serde_yaml::Value::Sequence(items) => Value::Sequence(
                items.into_iter().map(|item| self.convert(path, item, ctx)).collect::<Result<_, _>>()?,
            ),
            serde_yaml::Value::Mapping(entries) => {
                let mut mapping = Mapping::new();
                for (key, value) in entries {
                    let key = mapping_key(path, key)?;
                    mapping.insert(key, self.convert(path, value, ctx)?);
                }
                Value::Mapping(mapping)
            }
            serde_yaml::Value::Tagged(tagged) => {
                let tag = tagged.tag.to_string();
                let tag = normalize_tag(&tag);
                let reference_type = self.find(tag).ok_or_else(|| GrowError::Parse {
                    path: path.to_string(),
                    reason: format!("unknown tag !{tag} (registered: {})", self.describe_tags()),
                })?;
                match tagged.value {
                    serde_yaml::Value::String(value) => reference_type.construct(&value, ctx)?,
                    other => {
                        return Err(GrowError::MalformedReference {
                            tag: tag.to_string(),
                            value: scalar_preview(&other),
                            reason: "references must be string scalars".to_string(),
                        });
                    }
                }
            }
        })
    }

    fn describe_tags(&self) -> String {
        let tags = self.tags();
        if tags.is_empty() {
            "none".to_string()
        } else {
            tags.iter().map(|t| format!("!{t}")).collect::<Vec<_>>().join(", ")
        }
    }
}

impl fmt::Debug for ReferenceSchema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReferenceSchema").field("tags", &self.tags()).finish()
    }
}

fn normalize_tag(tag: &str) -> &str {
    tag.trim_start_matches('!')
}

fn mapping_key(path: &str, key: serde_yaml::Value) -> Result<String, GrowError> {
    match key {
        serde_yaml::Value::String(s) => Ok(s),
        serde_yaml::Value::Number(n) => Ok(n.to_string()),
        serde_yaml::Value::Bool(b) => Ok(b.to_string()),
        serde_yaml::Value::Null => Ok("null".to_string()),
        other => Err(GrowError::Parse {
            path: path.to_string(),
            reason: format!("mapping keys must be scalars, found {}", scalar_preview(&other)),
        }),
    }
}

fn scalar_preview(value: &serde_yaml::Value) -> String {
    serde_yaml::to_string(value)
        .map(|s| s.trim().to_string())
        .unwrap_or_else(|_| "<unprintable>".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::MemorySource;

    fn ctx() -> ResolutionContext {
        ResolutionContext::new(Arc::new(MemorySource::new()))
    }

    #[test]
    fn test_parse_plain_document() {
        let ctx = ctx();
        let mapping = ctx
            .schema()
            .parse_document("/a.yaml", "title: Hello\ntags: [a, b]\ncount: 3\n", &ctx)
            .unwrap();
        assert_eq!(mapping.get("title").and_then(Value::as_str), Some("Hello"));
        assert_eq!(mapping.get("tags").and_then(Value::as_sequence).map(<[Value]>::len), Some(2));
        assert!(matches!(mapping.get("count"), Some(Value::Number(_))));
    }

    #[test]
    fn test_doc_reference_constructs_canonical_unresolved_document() {
        let ctx = ctx();
        let mapping = ctx
            .schema()
            .parse_document("/a.yaml", "author: !g.doc /content/authors/ada.yaml\n", &ctx)
            .unwrap();
        let doc = mapping.get("author").and_then(Value::as_document).unwrap();
        assert_eq!(doc.path(), "/content/authors/ada.yaml");
        assert!(!doc.is_resolved());
        assert!(Arc::ptr_eq(doc, &ctx.document("/content/authors/ada.yaml")));
    }

    #[test]
    fn test_static_reference_constructs_asset() {
        let ctx = ctx();
        let mapping = ctx
            .schema()
            .parse_document("/a.yaml", "logo: !g.static /static/img/logo.png\n", &ctx)
            .unwrap();
        let asset = mapping.get("logo").and_then(Value::as_static).unwrap();
        assert_eq!(asset.url().to_string(), "/static/img/logo.png");
    }

    #[test]
    fn test_unknown_tag_is_parse_error() {
        let ctx = ctx();
        let err = ctx.schema().parse_document("/a.yaml", "x: !g.unknown /a\n", &ctx).unwrap_err();
        match err {
            GrowError::Parse { reason, .. } => assert!(reason.contains("!g.unknown"), "{reason}"),
            other => panic!("expected parse error, got {other:?}"),
        }
    }

    #[test]
    fn test_non_scalar_reference_is_malformed() {
        let ctx = ctx();
        let err = ctx.schema().parse_document("/a.yaml", "x: !g.doc [a, b]\n", &ctx).unwrap_err();
        assert!(matches!(err, GrowError::MalformedReference { .. }));

        let err = ctx.schema().parse_document("/a.yaml", "x: !g.doc relative.yaml\n", &ctx).unwrap_err();
        assert!(matches!(err, GrowError::MalformedReference { ref tag, .. } if tag == DOC_TAG));
    }

    #[test]
    fn test_malformed_yaml_is_parse_error() {
        let ctx = ctx();
        let err = ctx.schema().parse_document("/a.yaml", "title: [unclosed\n", &ctx).unwrap_err();
        assert!(matches!(err, GrowError::Parse { .. }));
    }

    #[test]
    fn test_root_must_be_mapping() {
        let ctx = ctx();
        assert!(ctx.schema().parse_document("/a.yaml", "", &ctx).unwrap().is_empty());
        let err = ctx.schema().parse_document("/a.yaml", "- a\n- b\n", &ctx).unwrap_err();
        assert!(matches!(err, GrowError::Parse { .. }));
    }

    struct UpperReference;

    impl ReferenceType for UpperReference {
        fn tag(&self) -> &str {
            "!upper"
        }

        fn construct(&self, value: &str, _ctx: &ResolutionContext) -> Result<Value, GrowError> {
            Ok(Value::String(value.to_uppercase()))
        }
    }

    #[test]
    fn test_custom_reference_type() {
        let schema = ReferenceSchema::default().with_type(UpperReference);
        assert_eq!(schema.tags(), vec![DOC_TAG, STATIC_TAG, "upper"]);

        let ctx = ResolutionContext::builder(Arc::new(MemorySource::new())).schema(schema).build();
        let mapping = ctx.schema().parse_document("/a.yaml", "x: !upper shout\n", &ctx).unwrap();
        assert_eq!(mapping.get("x").and_then(Value::as_str), Some("SHOUT"));
    }

    #[test]
    fn test_empty_schema_rejects_builtin_tags() {
        let ctx = ResolutionContext::builder(Arc::new(MemorySource::new()))
            .schema(ReferenceSchema::empty())
            .build();
        let err = ctx.schema().parse_document("/a.yaml", "x: !g.doc /b.yaml\n", &ctx).unwrap_err();
        assert!(matches!(err, GrowError::Parse { .. }));
    }
}
