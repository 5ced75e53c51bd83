//! Version resolution against real repositories

use crate::helpers::*;
use anyhow::Result;
use gitver::core::error::{GitError, VersionError};
use gitver::{GitVerError, GitVersionBuilder, Info};

#[test]
fn test_offset_counts_commits_since_tag() -> Result<()> {
  let repo = TestRepo::new()?;
  repo.change("README.md", "Initial commit")?;
  repo.tag("1.0")?;
  repo.change("README.md", "Second")?;
  let head = repo.change("README.md", "Third")?;

  let version = repo.version("")?;
  let info = version.info()?;
  assert_eq!(info.tag, "1.0");
  assert_eq!(info.offset, "2");
  assert_eq!(info.branch, "main");
  assert_eq!(info.commit, head);
  assert_eq!(info.abbreviated_id, head[..8]);
  assert_eq!(info.hash, format!("g{}", &head[..7]));
  assert_eq!(version.tag_offset()?, "1.0.2");

  Ok(())
}

#[test]
fn test_tag_on_head_has_zero_offset() -> Result<()> {
  let repo = TestRepo::new()?;
  repo.change("README.md", "Initial commit")?;
  repo.change("README.md", "Release")?;
  repo.annotated_tag("2.0")?;

  let version = repo.version("")?;
  assert_eq!(version.tag_offset()?, "2.0.0");

  Ok(())
}

#[test]
fn test_nearest_tag_wins() -> Result<()> {
  let repo = TestRepo::new()?;
  repo.change("README.md", "Initial commit")?;
  repo.tag("1.0")?;
  repo.change("README.md", "Second")?;
  repo.tag("1.1")?;
  repo.change("README.md", "Third")?;

  assert_eq!(repo.version("")?.tag_offset()?, "1.1.1");

  Ok(())
}

#[test]
fn test_no_matching_tag_strict_and_lenient() -> Result<()> {
  let repo = TestRepo::new()?;
  repo.change("README.md", "Initial commit")?;
  repo.tag("release-candidate")?;

  let strict = repo.version("")?;
  let err = strict.info().unwrap_err();
  assert!(matches!(err, GitVerError::Version(VersionError::NoMatchingTag { .. })));

  let lenient = GitVersionBuilder::new().project(&repo.path).strict(false).build()?;
  assert_eq!(lenient.info()?, Info::empty());
  assert_eq!(lenient.tag_offset()?, "0.0.0");

  Ok(())
}

#[test]
fn test_empty_repository() -> Result<()> {
  let repo = TestRepo::new()?;

  let strict = repo.version("")?;
  assert!(strict.info().is_err());

  let lenient = GitVersionBuilder::new().project(&repo.path).strict(false).build()?;
  assert_eq!(lenient.info()?, Info::empty());

  Ok(())
}

#[test]
fn test_exclusion_filter_skips_tags() -> Result<()> {
  let repo = TestRepo::new()?;
  repo.write(".gitversion.toml", "[root]\nfilters = [\"!*-beta*\"]\n")?;
  repo.change("README.md", "Initial commit")?;
  repo.tag("1.0")?;
  repo.change("README.md", "Second")?;
  repo.tag("1.1-beta")?;
  repo.change("README.md", "Third")?;

  let version = repo.version("")?;
  assert_eq!(version.filters()?, ["!*-beta*".to_string()]);
  assert_eq!(version.tag_offset()?, "1.0.2");

  Ok(())
}

#[test]
fn test_inclusion_filters_narrow_matches() -> Result<()> {
  let repo = TestRepo::new()?;
  repo.change("README.md", "Initial commit")?;
  repo.tag("1.0")?;
  repo.change("README.md", "Second")?;
  repo.tag("2.0")?;
  repo.change("README.md", "Third")?;

  let mut version = repo.version("")?;
  assert_eq!(version.tag_offset()?, "2.0.1");

  version.set_filters(&["1.*".to_string()])?;
  assert_eq!(version.tag_offset()?, "1.0.2");

  Ok(())
}

#[test]
fn test_set_tag_prefix_recomputes() -> Result<()> {
  let repo = TestRepo::new()?;
  repo.change("README.md", "Initial commit")?;
  repo.tag("core-3.1")?;
  repo.change("README.md", "Second")?;
  repo.tag("4.0")?;
  repo.change("README.md", "Third")?;

  let mut version = repo.version("")?;
  assert_eq!(version.tag_offset()?, "4.0.1");

  version.set_tag_prefix("core")?;
  assert_eq!(version.tag_prefix()?, "core-");
  assert_eq!(version.tag_offset()?, "3.1.2");

  Ok(())
}

#[test]
fn test_branch_suffix() -> Result<()> {
  let repo = TestRepo::new()?;
  repo.change("README.md", "Initial commit")?;
  repo.tag("1.0")?;
  assert_eq!(repo.version("")?.tag_offset_branch(None)?, "1.0.0");

  repo.checkout_new_branch("feature/cool")?;
  repo.change("README.md", "Feature work")?;

  let version = repo.version("")?;
  assert_eq!(version.info()?.branch, "feature/cool");
  assert_eq!(version.tag_offset_branch(None)?, "1.0.1-feature-cool");
  assert_eq!(version.tag_offset_branch(Some(&["feature/cool"]))?, "1.0.1-feature-cool");
  assert_eq!(version.tag_offset_branch(Some(&["feature-cool"]))?, "1.0.1");
  assert_eq!(version.tag_offset_branch(Some(&[]))?, "1.0.1");

  Ok(())
}

#[test]
fn test_mc_branch_is_allowed() -> Result<()> {
  let repo = TestRepo::new()?;
  repo.change("README.md", "Initial commit")?;
  repo.tag("1.0")?;
  repo.checkout_new_branch("1.20.x")?;
  repo.change("README.md", "Backport")?;

  let version = repo.version("")?;
  assert_eq!(version.mc_tag_offset_branch("1.20.1", None)?, "1.20.1-1.0.1");
  assert_eq!(version.mc_tag_offset_branch("1.21", None)?, "1.21-1.0.1-1.20.x");

  Ok(())
}

#[test]
fn test_detached_head_has_no_branch() -> Result<()> {
  let repo = TestRepo::new()?;
  repo.change("README.md", "Initial commit")?;
  repo.tag("1.0")?;
  repo.change("README.md", "Second")?;
  git(&repo.path, &["checkout", "--detach"])?;

  let version = repo.version("")?;
  assert_eq!(version.info()?.branch, "");
  assert_eq!(version.tag_offset_branch(None)?, "1.0.1");

  Ok(())
}

#[test]
fn test_closed_session_fails() -> Result<()> {
  let repo = TestRepo::new()?;
  repo.change("README.md", "Initial commit")?;
  repo.tag("1.0")?;

  let version = repo.version("")?;
  assert_eq!(version.tag_offset()?, "1.0.0");

  version.close();
  assert!(matches!(version.info(), Err(GitVerError::Git(GitError::ClosedSession))));
  assert!(version.generate_changelog(None, None, true).is_err());

  Ok(())
}

#[test]
fn test_json_output() -> Result<()> {
  let repo = TestRepo::new()?;
  repo.change("README.md", "Initial commit")?;
  repo.tag("1.0")?;
  repo.change("README.md", "Second")?;

  let json: serde_json::Value = serde_json::from_str(&repo.version("")?.to_json()?)?;
  assert_eq!(json["info"]["tag"], "1.0");
  assert_eq!(json["info"]["offset"], "1");
  assert_eq!(json["tagPrefix"], "");
  assert_eq!(json["url"], serde_json::Value::Null);
  assert!(json["rootPath"].as_str().is_some_and(|p| !p.is_empty()));
  assert_eq!(json["subprojectPaths"], serde_json::json!([]));

  Ok(())
}
