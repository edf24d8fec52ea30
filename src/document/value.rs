//! Tagged value tree produced by parsing a document.
//!
//! Parsing turns YAML into a [`Value`] tree whose reference variants
//! ([`Value::Doc`], [`Value::Static`]) are produced directly by the
//! registered reference types, so the deep-resolve pass can pattern-match on
//! them instead of probing nodes for a resolve operation.

use std::fmt;
use std::sync::Arc;

use serde_yaml::value::{Tag, TaggedValue};

use super::{Document, StaticAsset};
use super::reference::{DOC_TAG, STATIC_TAG};

/// A parsed field value.
#[derive(Clone)]
pub enum Value {
    Null,
    Bool(bool),
    Number(serde_yaml::Number),
    String(String),
    Sequence(Vec<Value>),
    Mapping(Mapping),
    /// `!g.doc` reference to the canonical document for a path
    Doc(Arc<Document>),
    /// `!g.static` reference to an asset
    Static(StaticAsset),
}

impl Value {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_sequence(&self) -> Option<&[Value]> {
        match self {
            Value::Sequence(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_mapping(&self) -> Option<&Mapping> {
        match self {
            Value::Mapping(mapping) => Some(mapping),
            _ => None,
        }
    }

    pub fn as_document(&self) -> Option<&Arc<Document>> {
        match self {
            Value::Doc(doc) => Some(doc),
            _ => None,
        }
    }

    pub fn as_static(&self) -> Option<&StaticAsset> {
        match self {
            Value::Static(asset) => Some(asset),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Human-readable variant name for error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "boolean",
            Value::Number(_) => "number",
            Value::String(_) => "string",
            Value::Sequence(_) => "sequence",
            Value::Mapping(_) => "mapping",
            Value::Doc(_) => "document reference",
            Value::Static(_) => "static reference",
        }
    }

    /// Convert back to plain YAML, writing references as tagged scalars.
    pub fn to_yaml(&self) -> serde_yaml::Value {
        match self {
            Value::Null => serde_yaml::Value::Null,
            Value::Bool(b) => serde_yaml::Value::Bool(*b),
            Value::Number(n) => serde_yaml::Value::Number(n.clone()),
            Value::String(s) => serde_yaml::Value::String(s.clone()),
            Value::Sequence(items) => {
                serde_yaml::Value::Sequence(items.iter().map(Value::to_yaml).collect())
            }
            Value::Mapping(mapping) => mapping.to_yaml(),
            Value::Doc(doc) => tagged(DOC_TAG, doc.path()),
            Value::Static(asset) => tagged(STATIC_TAG, asset.path()),
        }
    }
}

fn tagged(tag: &str, path: &str) -> serde_yaml::Value {
    serde_yaml::Value::Tagged(Box::new(TaggedValue {
        tag: Tag::new(tag),
        value: serde_yaml::Value::String(path.to_string()),
    }))
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Number(a), Value::Number(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Sequence(a), Value::Sequence(b)) => a == b,
            (Value::Mapping(a), Value::Mapping(b)) => a == b,
            // Documents are canonical per path
            (Value::Doc(a), Value::Doc(b)) => a.path() == b.path(),
            (Value::Static(a), Value::Static(b)) => a == b,
            _ => false,
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("Null"),
            Value::Bool(b) => write!(f, "Bool({b})"),
            Value::Number(n) => write!(f, "Number({n})"),
            Value::String(s) => write!(f, "String({s:?})"),
            Value::Sequence(items) => f.debug_list().entries(items).finish(),
            Value::Mapping(mapping) => mapping.fmt(f),
            // Never descend into referenced documents: references may be cyclic
            Value::Doc(doc) => write!(f, "Doc({doc})"),
            Value::Static(asset) => write!(f, "Static({})", asset.path()),
        }
    }
}

/// Insertion-ordered string-keyed mapping.
#[derive(Clone, Default, PartialEq)]
pub struct Mapping {
    entries: Vec<(String, Value)>,
}

impl Mapping {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert `value` under `key`; an existing key keeps its position.
    pub fn insert(&mut self, key: impl Into<String>, value: Value) {
        let key = key.into();
        if let Some(slot) = self.entries.iter_mut().find(|(k, _)| *k == key) {
            slot.1 = value;
        } else {
            self.entries.push((key, value));
        }
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn to_yaml(&self) -> serde_yaml::Value {
        let mut mapping = serde_yaml::Mapping::new();
        for (key, value) in &self.entries {
            mapping.insert(serde_yaml::Value::String(key.clone()), value.to_yaml());
        }
        serde_yaml::Value::Mapping(mapping)
    }
}

impl FromIterator<(String, Value)> for Mapping {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        let mut mapping = Mapping::new();
        for (key, value) in iter {
            mapping.insert(key, value);
        }
        mapping
    }
}

impl fmt::Debug for Mapping {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.entries.iter().map(|(k, v)| (k, v))).finish()
    }
}
