//! The gitver binary

use crate::helpers::*;
use anyhow::Result;

fn stdout(output: &std::process::Output) -> String {
  String::from_utf8_lossy(&output.stdout).to_string()
}

#[test]
fn test_prints_version_without_newline() -> Result<()> {
  let repo = TestRepo::new()?;
  repo.change("README.md", "Initial commit")?;
  repo.tag("1.0")?;
  repo.change("README.md", "Second")?;

  let output = run_gitver(&repo.path, &[])?;
  assert!(output.status.success());
  assert_eq!(stdout(&output), "1.0.1");

  Ok(())
}

#[test]
fn test_project_dir_flag() -> Result<()> {
  let repo = TestRepo::new()?;
  repo.write(".gitversion.toml", "[sub]\n")?;
  repo.write("sub/lib.txt", "sub\n")?;
  repo.change("root.txt", "Initial commit")?;
  repo.tag("sub-2.0")?;
  repo.change("sub/lib.txt", "Sub change")?;

  let elsewhere = tempfile::TempDir::new()?;
  let project = repo.path.join("sub");
  let output = run_gitver(elsewhere.path(), &["--project-dir", project.to_str().unwrap_or_default()])?;
  assert!(output.status.success());
  assert_eq!(stdout(&output), "2.0.1");

  Ok(())
}

#[test]
fn test_json_flag() -> Result<()> {
  let repo = TestRepo::new()?;
  repo.change("README.md", "Initial commit")?;
  repo.tag("1.0")?;

  let output = run_gitver(&repo.path, &["--json"])?;
  assert!(output.status.success());
  let json: serde_json::Value = serde_json::from_str(stdout(&output).trim())?;
  assert_eq!(json["info"]["tag"], "1.0");
  assert_eq!(json["info"]["offset"], "0");

  Ok(())
}

#[test]
fn test_changelog_flag() -> Result<()> {
  let repo = TestRepo::new()?;
  repo.change("README.md", "Initial commit")?;
  repo.tag("1.0")?;

  let output = run_gitver(&repo.path, &["--changelog", "--plain-text"])?;
  assert!(output.status.success());
  assert_eq!(stdout(&output), "main Changelog\n1.0\n===\n - 1.0.0 Initial commit\n\n\n");

  Ok(())
}

#[test]
fn test_missing_tag_exit_codes() -> Result<()> {
  let repo = TestRepo::new()?;
  repo.change("README.md", "Initial commit")?;

  let strict = run_gitver(&repo.path, &[])?;
  assert_eq!(strict.status.code(), Some(3));
  assert!(stdout(&strict).is_empty());

  let lenient = run_gitver(&repo.path, &["--disable-strict"])?;
  assert!(lenient.status.success());
  assert_eq!(stdout(&lenient), "0.0.0");

  Ok(())
}

#[test]
fn test_json_conflicts_with_changelog() -> Result<()> {
  let repo = TestRepo::new()?;
  repo.change("README.md", "Initial commit")?;

  let output = run_gitver(&repo.path, &["--json", "--changelog"])?;
  assert!(!output.status.success());

  Ok(())
}
