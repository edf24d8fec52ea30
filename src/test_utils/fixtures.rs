//! On-disk pod fixtures.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tempfile::TempDir;

/// Routes manifest of the sample blog pod.
pub const BLOG_ROUTES: &str = "\
routes:
  - pattern: /
    doc: !g.doc /content/pages/home.yaml
  - pattern: /blog/:base
    collection: /content/blog/
";

/// Home page of the sample blog pod.
pub const BLOG_HOME: &str = "\
$view: /views/home.html
title: Welcome
featured: !g.doc /content/blog/hello.yaml
logo: !g.static /static/img/logo.png
";

/// Blog post of the sample blog pod.
pub const BLOG_POST: &str = "\
$view: /views/post.html
$title: Hello
body: First post.
author: !g.doc /content/authors/ada.yaml
";

/// Author referenced by the sample post.
pub const BLOG_AUTHOR: &str = "\
name: Ada
";

/// Base layout of the sample blog pod.
pub const BASE_VIEW: &str = "\
<html><head><title>{% block title %}{% endblock %}</title></head>
<body>{% block body %}{% endblock %}</body></html>
";

/// Home view of the sample blog pod.
pub const HOME_VIEW: &str = r#"{% extends "views/base.html" %}
{% block title %}{{ doc.title }}{% endblock %}
{% block body %}<img src="{{ doc.logo.url }}">
<a href="/blog/hello">{{ doc.featured.title }}</a>{% endblock %}
"#;

/// Post view of the sample blog pod.
pub const POST_VIEW: &str = r#"{% extends "views/base.html" %}
{% block title %}{{ doc.title | localize }}{% endblock %}
{% block body %}<p>{{ doc.body }}</p><p>{{ _(text="By") }} {{ doc.author.name }}</p>{% endblock %}
"#;

/// A pod in a temporary directory, removed on drop.
pub struct PodFixture {
    dir: TempDir,
}

impl PodFixture {
    /// Empty pod.
    pub fn new() -> Result<Self> {
        Ok(Self {
            dir: TempDir::new().context("Failed to create temporary pod directory")?,
        })
    }

    /// Pod with routes, a home page, one post, its author and their views.
    pub fn blog() -> Result<Self> {
        let pod = Self::new()?;
        pod.write("routes.yaml", BLOG_ROUTES)?;
        pod.write("content/pages/home.yaml", BLOG_HOME)?;
        pod.write("content/blog/hello.yaml", BLOG_POST)?;
        pod.write("content/authors/ada.yaml", BLOG_AUTHOR)?;
        pod.write("views/base.html", BASE_VIEW)?;
        pod.write("views/home.html", HOME_VIEW)?;
        pod.write("views/post.html", POST_VIEW)?;
        Ok(pod)
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    /// Absolute path of a file inside the pod.
    pub fn path(&self, relative: &str) -> PathBuf {
        self.dir.path().join(relative.trim_start_matches('/'))
    }

    /// Write `content` to `relative`, creating parent directories.
    pub fn write(&self, relative: &str, content: &str) -> Result<PathBuf> {
        let path = self.path(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
        }
        fs::write(&path, content).with_context(|| format!("Failed to write {}", path.display()))?;
        Ok(path)
    }
}
