//! Parsed document fields and reserved keys.
//!
//! Field names starting with [`SIGIL`] are reserved for framework metadata.
//! Recognized reserved keys are extracted into typed accessors (currently
//! only `$view`); every parsed entry, reserved or not, stays in the ordered
//! mapping. Lookups by name also match the sigil-stripped alias, so `$view`
//! can be read as either `$view` or `view`.

use super::value::{Mapping, Value};
use crate::core::GrowError;

/// Marker character of reserved field names.
pub const SIGIL: char = '$';

/// Reserved field selecting the view template.
pub const VIEW_FIELD: &str = "$view";

/// Strip a leading [`SIGIL`] from a field name.
pub fn strip_sigil(name: &str) -> &str {
    name.strip_prefix(SIGIL).unwrap_or(name)
}

/// Top-level fields of a resolved document.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Fields {
    view: Option<String>,
    entries: Mapping,
}

impl Fields {
    /// Build fields from a parsed top-level mapping.
    ///
    /// Fails with [`GrowError::Parse`] when a reserved key has the wrong type.
    pub fn from_mapping(path: &str, entries: Mapping) -> Result<Self, GrowError> {
        let view = match entries.get(VIEW_FIELD) {
            None | Some(Value::Null) => None,
            Some(Value::String(view)) => Some(view.clone()),
            Some(other) => {
                return Err(GrowError::Parse {
                    path: path.to_string(),
                    reason: format!("reserved field `{VIEW_FIELD}` must be a string, found {}", other.kind()),
                });
            }
        };

        Ok(Self {
            view,
            entries,
        })
    }

    /// The `$view` field, if set.
    pub fn view(&self) -> Option<&str> {
        self.view.as_deref()
    }

    /// Look up a field by exact name, falling back to its sigil-stripped alias.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.entries
            .get(name)
            .or_else(|| self.entries.iter().find(|(key, _)| strip_sigil(key) == name).map(|(_, v)| v))
    }

    /// All parsed entries in source order.
    pub fn mapping(&self) -> &Mapping {
        &self.entries
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
