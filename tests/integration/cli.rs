//! The `grow` binary.

use anyhow::Result;
use assert_cmd::Command;
use grow_cli::test_utils::PodFixture;
use predicates::prelude::*;

fn grow(fixture: &PodFixture) -> Command {
    let mut cmd = Command::cargo_bin("grow").unwrap();
    cmd.arg("--config").arg(fixture.path("grow.toml")).env_remove("RUST_LOG").env_remove("GROW_CONFIG");
    cmd
}

#[test]
fn test_render_to_stdout() -> Result<()> {
    let fixture = PodFixture::blog()?;
    grow(&fixture)
        .args(["render", "/blog/hello"])
        .assert()
        .success()
        .stdout(predicate::str::contains("<title>Hello</title>"))
        .stdout(predicate::str::contains("By Ada"));
    Ok(())
}

#[test]
fn test_render_to_file() -> Result<()> {
    let fixture = PodFixture::blog()?;
    let output = fixture.path("public/index.html");
    grow(&fixture)
        .args(["render", "/", "--output"])
        .arg(&output)
        .assert()
        .success()
        .stdout(predicate::str::is_empty());

    let html = std::fs::read_to_string(&output)?;
    assert!(html.contains("<title>Welcome</title>"));
    Ok(())
}

#[test]
fn test_render_unknown_path_fails() -> Result<()> {
    let fixture = PodFixture::blog()?;
    grow(&fixture)
        .args(["--quiet", "render", "/nonexistent"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("No pattern in the routes manifest matches"))
        .stderr(predicate::str::contains("/nonexistent"));
    Ok(())
}

#[test]
fn test_routes_lists_patterns() -> Result<()> {
    let fixture = PodFixture::blog()?;
    grow(&fixture)
        .arg("routes")
        .assert()
        .success()
        .stdout(predicate::str::contains("/blog/:base"))
        .stdout(predicate::str::contains("/content/blog/:base.yaml"))
        .stdout(predicate::str::contains("/content/pages/home.yaml"));
    Ok(())
}

#[test]
fn test_check_reports_reachable_documents() -> Result<()> {
    let fixture = PodFixture::blog()?;
    grow(&fixture)
        .args(["check", "/"])
        .assert()
        .success()
        .stdout(predicate::str::contains("/content/pages/home.yaml"))
        .stdout(predicate::str::contains("/content/blog/hello.yaml"))
        .stdout(predicate::str::contains("/content/authors/ada.yaml"))
        .stdout(predicate::str::contains("resolved"));
    Ok(())
}

#[test]
fn test_check_reports_failure() -> Result<()> {
    let fixture = PodFixture::blog()?;
    fixture.write("content/blog/broken.yaml", "x: !g.doc /content/missing.yaml\n")?;
    grow(&fixture)
        .args(["--quiet", "check", "/blog/broken"])
        .assert()
        .failure()
        .stdout(predicate::str::contains("failed"))
        .stderr(predicate::str::contains("/content/missing.yaml"));
    Ok(())
}

#[test]
fn test_invalid_config_fails() -> Result<()> {
    let fixture = PodFixture::blog()?;
    fixture.write("grow.toml", "[pod]\nunknown = true\n")?;
    grow(&fixture).arg("routes").assert().failure().stderr(predicate::str::contains("grow.toml"));
    Ok(())
}
