//! Filters and functions available to views.
//!
//! - `localize` filter: returns its input unchanged
//! - `json` filter: serializes its input, `pretty=true` for indented output
//! - `_(text=...)` / `gettext(text=...)`: translation pass-through
//! - `get_doc(path=...)`: the canonical document for a path, with its fields
//!   when it has been resolved
//! - `get_static(path=...)`: a static asset for a path
//!
//! Tera calls filters and functions synchronously, so `get_doc` never loads
//! anything: it only constructs the reference. Documents reachable from the
//! rendered document are already resolved.

use std::collections::HashMap;

use tera::{Tera, Value};

use super::context::{document_to_json, static_json};
use crate::document::{ResolutionContext, StaticAsset};
use crate::document::reference::{DOC_TAG, STATIC_TAG, validate_reference_path};

/// Register every filter and function on `tera`.
pub fn register(tera: &mut Tera, ctx: &ResolutionContext) {
    tera.register_filter("localize", localize_filter);
    tera.register_filter("json", json_filter);
    tera.register_function("_", gettext);
    tera.register_function("gettext", gettext);
    tera.register_function("get_doc", create_get_doc(ctx.clone()));
    tera.register_function("get_static", get_static);
}

pub fn localize_filter(value: &Value, _args: &HashMap<String, Value>) -> tera::Result<Value> {
    Ok(value.clone())
}

pub fn json_filter(value: &Value, args: &HashMap<String, Value>) -> tera::Result<Value> {
    let pretty = args.get("pretty").and_then(Value::as_bool).unwrap_or(false);
    let rendered = if pretty {
        serde_json::to_string_pretty(value)
    } else {
        serde_json::to_string(value)
    }
    .map_err(|e| tera::Error::msg(format!("json filter error: {e}")))?;
    Ok(Value::String(rendered))
}

pub fn gettext(args: &HashMap<String, Value>) -> tera::Result<Value> {
    match args.get("text") {
        Some(Value::String(text)) => Ok(Value::String(text.clone())),
        Some(other) => Err(tera::Error::msg(format!("gettext: `text` must be a string, got {other}"))),
        None => Err(tera::Error::msg("gettext: missing `text` argument")),
    }
}

fn path_arg<'a>(name: &str, tag: &str, args: &'a HashMap<String, Value>) -> tera::Result<&'a str> {
    let path = args
        .get("path")
        .and_then(Value::as_str)
        .ok_or_else(|| tera::Error::msg(format!("{name}: missing string `path` argument")))?;
    validate_reference_path(tag, path).map_err(|e| tera::Error::msg(format!("{name}: {e}")))
}

/// `get_doc(path=...)`, bound to a resolution context.
pub fn create_get_doc(ctx: ResolutionContext) -> impl tera::Function + 'static {
    move |args: &HashMap<String, Value>| -> tera::Result<Value> {
        let path = path_arg("get_doc", DOC_TAG, args)?;
        let doc = ctx.document(path);
        if !doc.is_resolved() {
            tracing::debug!("get_doc({path}) returned an unresolved document");
        }
        Ok(document_to_json(&doc))
    }
}

pub fn get_static(args: &HashMap<String, Value>) -> tera::Result<Value> {
    let path = path_arg("get_static", STATIC_TAG, args)?;
    Ok(static_json(&StaticAsset::new(path)))
}
