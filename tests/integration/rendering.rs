//! The render pipeline over a pod on disk.

use anyhow::Result;
use grow_cli::config::PodConfig;
use grow_cli::core::GrowError;
use grow_cli::pod::Pod;
use grow_cli::test_utils::{PodFixture, init_test_logging};

async fn load(fixture: &PodFixture) -> Result<Pod> {
    let config = PodConfig::load(&fixture.path("grow.toml")).await?;
    Ok(Pod::new(config))
}

#[tokio::test]
async fn test_render_blog_post_from_disk() -> Result<()> {
    init_test_logging(None);
    let fixture = PodFixture::blog()?;
    let pod = load(&fixture).await?;

    let page = pod.render("/blog/hello").await?;
    assert_eq!(page.request_path, "/blog/hello");
    assert_eq!(page.view, "views/post.html");
    assert!(page.html.starts_with("<html>"));
    assert!(page.html.contains("<title>Hello</title>"));
    assert!(page.html.contains("<p>First post.</p>"));
    assert!(page.html.contains("By Ada"));
    assert!(pod.context().document("/content/authors/ada.yaml").is_resolved());
    Ok(())
}

#[tokio::test]
async fn test_render_home_with_static_asset() -> Result<()> {
    let fixture = PodFixture::blog()?;
    fixture.write("grow.toml", "[render]\nautoescape = false\n")?;
    let pod = load(&fixture).await?;

    let page = pod.render("/").await?;
    assert!(page.html.contains(r#"<img src="/static/img/logo.png">"#));
    assert!(page.html.contains(r#"<a href="/blog/hello">Hello</a>"#));
    Ok(())
}

#[tokio::test]
async fn test_configured_root_and_suffix() -> Result<()> {
    let fixture = PodFixture::new()?;
    fixture.write("grow.toml", "[pod]\ndocument_suffix = \".yml\"\n\n[source]\nroot = \"site\"\n")?;
    fixture.write(
        "site/routes.yaml",
        "routes:\n  - pattern: /notes/:base\n    collection: /notes/\n",
    )?;
    fixture.write("site/notes/first.yml", "title: First note\n")?;
    fixture.write("site/views/base.html", "<h1>{{ doc.title }}</h1>")?;

    let pod = load(&fixture).await?;
    let page = pod.render("/notes/first").await?;
    assert_eq!(page.html, "<h1>First note</h1>");
    Ok(())
}

#[tokio::test]
async fn test_render_failures_abort_the_page() -> Result<()> {
    let fixture = PodFixture::blog()?;
    fixture.write("content/blog/broken.yaml", "$view: /views/post.html\nauthor: !g.doc /content/authors/nobody.yaml\n")?;
    fixture.write("content/blog/no-view.yaml", "$view: /views/missing.html\n")?;
    let pod = load(&fixture).await?;

    let err = pod.render("/blog/broken").await.unwrap_err();
    assert!(matches!(err, GrowError::Fetch { ref path, .. } if path == "/content/authors/nobody.yaml"));

    let err = pod.render("/blog/no-view").await.unwrap_err();
    assert!(matches!(err, GrowError::Render { ref view, .. } if view.contains("missing.html")), "{err:?}");

    let err = pod.render("/nowhere").await.unwrap_err();
    assert!(matches!(err, GrowError::NoRouteMatch { .. }));
    Ok(())
}
