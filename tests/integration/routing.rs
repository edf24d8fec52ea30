//! Routes manifest loading and request matching.

use std::sync::Arc;

use anyhow::Result;
use grow_cli::core::GrowError;
use grow_cli::document::ResolutionContext;
use grow_cli::routes::{RouteTable, RouteTarget};
use grow_cli::test_utils::MemorySource;
use grow_cli::test_utils::fixtures::BLOG_ROUTES;

fn table(routes: &str) -> (RouteTable, ResolutionContext) {
    let source = Arc::new(MemorySource::new().with_file("/routes.yaml", routes));
    let ctx = ResolutionContext::new(source);
    (RouteTable::new(ctx.clone(), "/routes.yaml"), ctx)
}

#[tokio::test]
async fn test_collection_and_direct_routes() -> Result<()> {
    let (routes, ctx) = table(BLOG_ROUTES);
    routes.resolve().await?;

    let post = routes.match_path("/blog/hello")?;
    assert_eq!(post.path(), "/content/blog/hello.yaml");
    assert!(Arc::ptr_eq(&post, &ctx.document("/content/blog/hello.yaml")));
    assert!(!post.is_resolved(), "matching never resolves the target");

    let home = routes.match_path("/")?;
    assert_eq!(home.path(), "/content/pages/home.yaml");

    assert_eq!(routes.reverse(&post).as_deref(), Some("/blog/hello"));
    assert_eq!(routes.reverse(&home).as_deref(), Some("/"));
    Ok(())
}

#[tokio::test]
async fn test_unmatched_path() -> Result<()> {
    let (routes, _) = table(BLOG_ROUTES);
    routes.resolve().await?;

    for path in ["/nonexistent", "/blog", "/blog/a/b"] {
        match routes.match_path(path) {
            Err(GrowError::NoRouteMatch { path: missed }) => assert_eq!(missed, path),
            other => panic!("expected no match for {path}, got {other:?}"),
        }
    }
    Ok(())
}

#[tokio::test]
async fn test_matching_requires_resolved_manifest() {
    let (routes, _) = table(BLOG_ROUTES);
    assert!(!routes.is_resolved());
    assert!(matches!(routes.match_path("/"), Err(GrowError::RoutesNotResolved { .. })));
    assert!(routes.entries().is_empty());
}

#[tokio::test]
async fn test_static_routes_beat_parameters() -> Result<()> {
    let (routes, _) = table(
        "\
routes:
  - pattern: /blog/:base
    collection: /content/blog/
  - pattern: /blog/archive
    doc: !g.doc /content/pages/archive.yaml
  - pattern: /files/*rest
    doc: /content/pages/files.yaml
",
    );
    routes.resolve().await?;

    assert_eq!(routes.match_path("/blog/archive")?.path(), "/content/pages/archive.yaml");
    assert_eq!(routes.match_path("/blog/other")?.path(), "/content/blog/other.yaml");
    assert_eq!(routes.match_path("/files/a/b/c")?.path(), "/content/pages/files.yaml");
    assert!(matches!(routes.entries()[2].target, RouteTarget::Doc(_)));
    Ok(())
}

#[tokio::test]
async fn test_invalid_manifest_entries() {
    let cases = [
        "routes:\n  - pattern: /blog/:slug\n    collection: /content/blog/\n",
        "routes:\n  - pattern: /x\n",
        "routes:\n  - doc: !g.doc /a.yaml\n",
        "routes:\n  - pattern: no-slash\n    doc: !g.doc /a.yaml\n",
    ];
    for manifest in cases {
        let (routes, _) = table(manifest);
        let err = routes.resolve().await.unwrap_err();
        assert!(matches!(err, GrowError::InvalidRoute { .. }), "{manifest}: {err:?}");
    }
}
