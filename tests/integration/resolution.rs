//! Document resolution through the public API.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use grow_cli::core::GrowError;
use grow_cli::document::{CyclePolicy, ResolutionContext, ResolutionState, Value};
use grow_cli::test_utils::{MemorySource, init_test_logging};

fn context(files: &[(&str, &str)]) -> (ResolutionContext, Arc<MemorySource>) {
    let mut source = MemorySource::new();
    for (path, content) in files {
        source = source.with_file(path, content);
    }
    let source = Arc::new(source);
    (ResolutionContext::new(source.clone()), source)
}

#[tokio::test]
async fn test_lookup_is_canonical_and_fetches_once() -> Result<()> {
    init_test_logging(None);
    let (ctx, source) = context(&[
        ("/a.yaml", "first: !g.doc /shared.yaml\nsecond: !g.doc /shared.yaml\n"),
        ("/shared.yaml", "title: Shared\n"),
    ]);

    let first = ctx.document("/shared.yaml");
    let second = ctx.document("/shared.yaml");
    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(source.total_fetches(), 0, "lookup must not load");

    let root = ctx.resolve("/a.yaml").await?;
    ctx.resolve("/a.yaml").await?;
    assert_eq!(source.fetch_count("/a.yaml"), 1);
    assert_eq!(source.fetch_count("/shared.yaml"), 1);

    let fields = root.fields().expect("resolved document has fields");
    let (Some(Value::Doc(a)), Some(Value::Doc(b))) = (fields.get("first"), fields.get("second")) else {
        panic!("expected two document references");
    };
    assert!(Arc::ptr_eq(a, b));
    assert!(Arc::ptr_eq(a, &first));
    Ok(())
}

#[tokio::test]
async fn test_reserved_fields_round_trip() -> Result<()> {
    let (ctx, _) = context(&[("/post.yaml", "$view: /views/post.html\n$title: Hello\nbody: Text\n")]);
    let doc = ctx.resolve("/post.yaml").await?;
    let fields = doc.fields().expect("fields");

    assert_eq!(fields.view(), Some("/views/post.html"));
    assert_eq!(fields.get("$title").and_then(Value::as_str), Some("Hello"));
    assert_eq!(fields.get("title").and_then(Value::as_str), Some("Hello"));
    assert_eq!(fields.get("view").and_then(Value::as_str), Some("/views/post.html"));
    assert_eq!(fields.get("body").and_then(Value::as_str), Some("Text"));
    assert_eq!(doc.view("/views/base.html"), "views/post.html");
    Ok(())
}

#[tokio::test]
async fn test_deep_resolution_materializes_nested_documents() -> Result<()> {
    let (ctx, source) = context(&[
        ("/page.yaml", "sections:\n  - hero: !g.doc /hero.yaml\n  - plain: text\n"),
        ("/hero.yaml", "author: !g.doc /author.yaml\nimage: !g.static /static/hero.png\n"),
        ("/author.yaml", "name: Ada\n"),
    ]);

    let page = ctx.resolve("/page.yaml").await?;
    assert_eq!(page.state(), ResolutionState::Resolved);
    for path in ["/hero.yaml", "/author.yaml"] {
        assert!(ctx.document(path).is_resolved(), "{path} should be resolved");
    }

    let hero = ctx.document("/hero.yaml").fields().expect("hero fields");
    let Some(Value::Static(image)) = hero.get("image") else {
        panic!("expected a static reference");
    };
    assert_eq!(image.url().as_str(), "/static/hero.png");
    assert_eq!(image.url().to_string(), "/static/hero.png");
    assert_eq!(source.fetch_count("/static/hero.png"), 0);
    Ok(())
}

#[tokio::test]
async fn test_static_reference_is_never_fetched() -> Result<()> {
    let (ctx, source) = context(&[("/home.yaml", "logo: !g.static /static/img/logo.png
")]);

    let home = ctx.resolve("/home.yaml").await?;
    let fields = home.fields().expect("home fields");
    let Some(Value::Static(logo)) = fields.get("logo") else {
        panic!("expected a static reference");
    };
    assert_eq!(logo.url().to_string(), "/static/img/logo.png");
    assert_eq!(source.fetch_count("/static/img/logo.png"), 0);
    assert_eq!(source.fetch_count("/home.yaml"), 1);
    Ok(())
}

#[tokio::test]
async fn test_cycle_members_share_the_root_outcome() {
    let (ctx, _) = context(&[
        ("/page.yaml", "related: !g.doc /related.yaml\nbroken: !g.doc /missing.yaml\n"),
        ("/related.yaml", "back: !g.doc /page.yaml\n"),
    ]);

    assert!(ctx.resolve("/page.yaml").await.is_err());
    assert_eq!(ctx.document("/related.yaml").state(), ResolutionState::Failed);
    assert!(ctx.resolve("/related.yaml").await.is_err());

    let (ctx, _) = context(&[
        ("/page.yaml", "related: !g.doc /related.yaml\n"),
        ("/related.yaml", "back: !g.doc /page.yaml\n"),
    ]);
    ctx.resolve("/page.yaml").await.unwrap();
    assert_eq!(ctx.document("/related.yaml").state(), ResolutionState::Resolved);
}

#[tokio::test]
async fn test_nested_failure_fails_the_root() {
    let (ctx, _) = context(&[("/page.yaml", "missing: !g.doc /missing.yaml\n")]);
    let err = ctx.resolve("/page.yaml").await.unwrap_err();
    assert!(matches!(err, GrowError::Fetch { ref path, .. } if path == "/missing.yaml"));
    assert_eq!(ctx.document("/page.yaml").state(), ResolutionState::Failed);
    assert!(ctx.document("/page.yaml").fields().is_none());
}

#[tokio::test]
async fn test_unknown_tag_and_malformed_reference() {
    let (ctx, _) = context(&[("/tag.yaml", "x: !g.unknown /a.yaml\n"), ("/bad.yaml", "x: !g.doc [1, 2]\n")]);
    assert!(matches!(ctx.resolve("/tag.yaml").await, Err(GrowError::Parse { .. })));
    assert!(matches!(ctx.resolve("/bad.yaml").await, Err(GrowError::MalformedReference { .. })));
}

#[tokio::test]
async fn test_concurrent_lookups_share_one_load() -> Result<()> {
    let source = Arc::new(
        MemorySource::new()
            .with_file("/slow.yaml", "child: !g.doc /child.yaml\n")
            .with_file("/child.yaml", "name: child\n")
            .with_delay(Duration::from_millis(20)),
    );
    let ctx = ResolutionContext::new(source.clone());

    let tasks: Vec<_> = (0..8)
        .map(|_| {
            let ctx = ctx.clone();
            tokio::spawn(async move { ctx.resolve("/slow.yaml").await })
        })
        .collect();

    let mut docs = Vec::new();
    for task in tasks {
        docs.push(task.await??);
    }
    assert!(docs.iter().all(|doc| Arc::ptr_eq(doc, &docs[0])));
    assert!(docs.iter().all(|doc| doc.is_resolved()));
    assert_eq!(source.fetch_count("/slow.yaml"), 1);
    assert_eq!(source.fetch_count("/child.yaml"), 1);
    Ok(())
}

#[tokio::test]
async fn test_cycle_policies() -> Result<()> {
    let files = [("/a.yaml", "next: !g.doc /b.yaml\n"), ("/b.yaml", "next: !g.doc /a.yaml\n")];

    let (ctx, _) = context(&files);
    assert_eq!(ctx.cycle_policy(), CyclePolicy::Break);
    let a = ctx.resolve("/a.yaml").await?;
    assert!(a.is_resolved());
    assert!(ctx.document("/b.yaml").is_resolved());

    let mut source = MemorySource::new();
    for (path, content) in files {
        source = source.with_file(path, content);
    }
    let ctx = ResolutionContext::builder(Arc::new(source)).cycle_policy(CyclePolicy::Error).build();
    match ctx.resolve("/a.yaml").await {
        Err(GrowError::CyclicReference { chain }) => {
            assert_eq!(chain, vec!["/a.yaml", "/b.yaml", "/a.yaml"]);
        }
        other => panic!("expected a cyclic reference error, got {other:?}"),
    }
    Ok(())
}
