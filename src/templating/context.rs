//! Template bindings built from resolved documents.
//!
//! A document becomes a JSON object:
//!
//! ```json
//! {
//!   "path": "/content/blog/hello.yaml",
//!   "url": "/content/blog/hello.yaml",
//!   "resolved": true,
//!   "fields": { "$view": "/views/post.html", "title": "Hello" },
//!   "view": "/views/post.html",
//!   "title": "Hello"
//! }
//! ```
//!
//! Every field is also available at the top level under its sigil-stripped
//! name, unless that name is one of the fixed keys above. The top-level
//! entry carries the full value; the `fields` entry shows referenced
//! documents as `{path, url, resolved}` stubs so no subtree is serialized
//! twice. A field whose name cannot be aliased keeps its full value in
//! `fields`.
//!
//! Each document is expanded in full once per serialization. A document
//! reached again while it is being expanded becomes a stub, so cyclic
//! references serialize to finite output. A document reached again after
//! its expansion shows its own fields with its references as stubs, which
//! keeps the output linear in the size of the documents.

use std::collections::HashSet;

use serde_json::{Map, Value as Json, json};
use tera::Context as TeraContext;

use crate::document::{Document, StaticAsset, Value, strip_sigil};

const FIXED_KEYS: [&str; 4] = ["path", "url", "resolved", "fields"];

/// Binding name of the rendered document.
pub const DOC_BINDING: &str = "doc";

/// Tera context for rendering `doc`.
pub fn build_context(doc: &Document) -> TeraContext {
    let mut context = TeraContext::new();
    context.insert(DOC_BINDING, &document_to_json(doc));
    context
}

/// Serialize `doc` and everything it references.
pub fn document_to_json(doc: &Document) -> Json {
    document_json(doc, &mut Expansion::default())
}

/// Documents seen so far by one serialization.
#[derive(Default)]
struct Expansion {
    /// Documents on the current path from the root
    expanding: HashSet<String>,
    /// Documents already expanded in full
    expanded: HashSet<String>,
}

/// How a document reference inside a value is serialized.
#[derive(Clone, Copy)]
enum Depth {
    Deep,
    Stubs,
}

fn stub(doc: &Document) -> Map<String, Json> {
    let mut object = Map::new();
    object.insert("path".to_string(), json!(doc.path()));
    object.insert("url".to_string(), json!(doc.url().to_string()));
    object.insert("resolved".to_string(), json!(doc.is_resolved()));
    object
}

fn document_json(doc: &Document, expansion: &mut Expansion) -> Json {
    let mut object = stub(doc);
    let Some(fields) = doc.fields() else {
        return Json::Object(object);
    };
    if expansion.expanding.contains(doc.path()) {
        return Json::Object(object);
    }
    let depth = if expansion.expanded.insert(doc.path().to_string()) {
        Depth::Deep
    } else {
        Depth::Stubs
    };

    expansion.expanding.insert(doc.path().to_string());
    let mut raw = Map::new();
    for (name, value) in fields.iter() {
        let alias = strip_sigil(name);
        // an exact key wins over another key's alias
        let aliased =
            !FIXED_KEYS.contains(&alias) && (alias == name || !fields.mapping().contains_key(alias));
        if aliased {
            object.insert(alias.to_string(), value_json(value, depth, expansion));
            raw.insert(name.to_string(), value_json(value, Depth::Stubs, expansion));
        } else {
            raw.insert(name.to_string(), value_json(value, depth, expansion));
        }
    }
    object.insert("fields".to_string(), Json::Object(raw));
    expansion.expanding.remove(doc.path());

    Json::Object(object)
}

/// JSON form of a static asset.
pub fn static_json(asset: &StaticAsset) -> Json {
    json!({
        "path": asset.path(),
        "url": asset.url().to_string(),
    })
}

fn value_json(value: &Value, depth: Depth, expansion: &mut Expansion) -> Json {
    match value {
        Value::Null => Json::Null,
        Value::Bool(b) => Json::Bool(*b),
        Value::Number(n) => number_json(n),
        Value::String(s) => Json::String(s.clone()),
        Value::Sequence(items) => {
            Json::Array(items.iter().map(|item| value_json(item, depth, expansion)).collect())
        }
        Value::Mapping(mapping) => Json::Object(
            mapping
                .iter()
                .map(|(key, value)| (key.to_string(), value_json(value, depth, expansion)))
                .collect(),
        ),
        Value::Doc(doc) => match depth {
            Depth::Deep => document_json(doc, expansion),
            Depth::Stubs => Json::Object(stub(doc)),
        },
        Value::Static(asset) => static_json(asset),
    }
}

fn number_json(n: &serde_yaml::Number) -> Json {
    if let Some(i) = n.as_i64() {
        Json::from(i)
    } else if let Some(u) = n.as_u64() {
        Json::from(u)
    } else {
        // NaN and infinities have no JSON form and become null
        n.as_f64().and_then(serde_json::Number::from_f64).map(Json::Number).unwrap_or(Json::Null)
    }
}

/// Dotted paths of the values in `context`, for "did you mean" hints.
///
/// Only the first few levels are listed, and `fields` subtrees are skipped
/// since their entries are also listed under their aliases.
pub fn available_variables(context: &TeraContext) -> Vec<String> {
    fn collect(prefix: &str, value: &Json, depth: usize, out: &mut Vec<String>) {
        out.push(prefix.to_string());
        if depth == 0 {
            return;
        }
        if let Json::Object(map) = value {
            for (key, child) in map {
                if key == "fields" {
                    continue;
                }
                collect(&format!("{prefix}.{key}"), child, depth - 1, out);
            }
        }
    }

    let mut vars = Vec::new();
    if let Json::Object(map) = context.clone().into_json() {
        for (key, value) in &map {
            collect(key, value, 2, &mut vars);
        }
    }
    vars
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::document::ResolutionContext;
    use crate::test_utils::MemorySource;

    #[tokio::test]
    async fn test_fields_exposed_under_both_names() {
        let source = Arc::new(MemorySource::new().with_file(
            "/a.yaml",
            "$view: /views/a.html\n$title: A\ncount: 3\nratio: 0.5\nlogo: !g.static /static/logo.png\n",
        ));
        let ctx = ResolutionContext::new(source);
        let doc = ctx.resolve("/a.yaml").await.unwrap();

        let json = document_to_json(&doc);
        assert_eq!(json["path"], "/a.yaml");
        assert_eq!(json["resolved"], true);
        assert_eq!(json["view"], "/views/a.html");
        assert_eq!(json["fields"]["$view"], "/views/a.html");
        assert_eq!(json["title"], "A");
        assert_eq!(json["count"], 3);
        assert_eq!(json["ratio"], 0.5);
        assert_eq!(json["logo"]["url"], "/static/logo.png");
    }

    #[tokio::test]
    async fn test_cycles_become_stubs() {
        let source = Arc::new(
            MemorySource::new()
                .with_file("/a.yaml", "name: a\nnext: !g.doc /b.yaml\n")
                .with_file("/b.yaml", "name: b\nnext: !g.doc /a.yaml\n"),
        );
        let ctx = ResolutionContext::new(source);
        let a = ctx.resolve("/a.yaml").await.unwrap();

        let json = document_to_json(&a);
        assert_eq!(json["next"]["name"], "b");
        assert_eq!(json["next"]["next"]["path"], "/a.yaml");
        assert!(json["next"]["next"].get("name").is_none());
    }

    #[tokio::test]
    async fn test_repeated_reference_shows_fields_each_time() {
        let source = Arc::new(
            MemorySource::new()
                .with_file("/a.yaml", "first: !g.doc /b.yaml\nsecond: !g.doc /b.yaml\n")
                .with_file("/b.yaml", "name: b\n"),
        );
        let ctx = ResolutionContext::new(source);
        let a = ctx.resolve("/a.yaml").await.unwrap();

        let json = document_to_json(&a);
        assert_eq!(json["first"]["name"], "b");
        assert_eq!(json["second"]["name"], "b");
        assert_eq!(json["fields"]["first"], json!({"path": "/b.yaml", "url": "/b.yaml", "resolved": true}));
    }

    #[tokio::test]
    async fn test_shared_references_serialize_linearly() {
        const LEVELS: usize = 16;
        let mut source = MemorySource::new();
        for level in 0..LEVELS {
            let next = level + 1;
            source = source.with_file(
                &format!("/d{level}.yaml"),
                &format!("$title: D{level}\nl: !g.doc /d{next}.yaml\nr: !g.doc /d{next}.yaml\n"),
            );
        }
        source = source.with_file(&format!("/d{LEVELS}.yaml"), "$title: leaf\n");
        let ctx = ResolutionContext::new(Arc::new(source));
        let root = ctx.resolve("/d0.yaml").await.unwrap();

        let json = document_to_json(&root);
        let size = serde_json::to_string(&json).unwrap().len();
        assert!(size < 20_000, "serialized {size} bytes");

        assert_eq!(json["title"], "D0");
        assert_eq!(json["l"]["l"]["title"], "D2");
        // the second reference to d1 still shows its fields
        assert_eq!(json["r"]["title"], "D1");
        assert_eq!(json["r"]["l"]["path"], "/d2.yaml");
        assert!(json["r"]["l"].get("title").is_none());
    }

    #[tokio::test]
    async fn test_unaliased_field_keeps_full_value() {
        let source = Arc::new(
            MemorySource::new()
                .with_file("/a.yaml", "$url: !g.doc /b.yaml\n")
                .with_file("/b.yaml", "name: b\n"),
        );
        let ctx = ResolutionContext::new(source);
        let a = ctx.resolve("/a.yaml").await.unwrap();

        let json = document_to_json(&a);
        assert_eq!(json["url"], "/a.yaml");
        assert_eq!(json["fields"]["$url"]["name"], "b");
    }

    #[test]
    fn test_unresolved_document_is_stub() {
        let ctx = ResolutionContext::new(Arc::new(MemorySource::new()));
        let json = document_to_json(&ctx.document("/x.yaml"));
        assert_eq!(json, json!({"path": "/x.yaml", "url": "/x.yaml", "resolved": false}));
    }

    #[test]
    fn test_available_variables_lists_nested_keys() {
        let mut context = TeraContext::new();
        context.insert("doc", &json!({"path": "/a.yaml", "fields": {"x": 1}, "title": "A"}));
        let vars = available_variables(&context);
        assert!(vars.contains(&"doc.title".to_string()));
        assert!(!vars.iter().any(|v| v.contains("fields")));
    }
}
