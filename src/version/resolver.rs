//! `Info` computation and path-scoped commit offsets

use super::describe::{TagMatcher, bare_tag, describe, split_describe};
use super::info::Info;
use crate::core::error::{GitVerError, GitVerResult, VersionError};
use crate::core::vcs::{GitRepo, PathFilter, TagRef};
use std::collections::HashSet;
use tracing::{debug, warn};

/// Inputs of one version computation
#[derive(Debug, Clone, Copy)]
pub struct VersionQuery<'a> {
  pub tag_prefix: &'a str,
  pub filters: &'a [String],
  /// Include/exclude scoping for the offset; empty means the describe distance is used
  pub scope: &'a PathFilter,
  pub strict: bool,
}

/// Resolve the `Info` for HEAD
pub fn resolve_info(repo: &GitRepo, query: &VersionQuery<'_>) -> GitVerResult<Info> {
  let matcher = TagMatcher::new(query.tag_prefix, query.filters)?;
  let found = describe(repo, &matcher)?.ok_or_else(|| {
    GitVerError::Version(VersionError::NoMatchingTag {
      tag_prefix: query.tag_prefix.to_string(),
      filters: query.filters.to_vec(),
    })
  })?;

  let described = found.describe_string();
  let [tag, distance, hash] = split_describe(&described)
    .ok_or_else(|| GitVerError::message(format!("Malformed describe output '{}'", described)))?;

  let offset = commit_offset(repo, &found.tag, distance, query)?;
  let branch = repo.current_branch()?.unwrap_or_default();
  let commit = repo.head()?.sha;

  let info = Info {
    tag: bare_tag(tag, query.tag_prefix),
    offset,
    hash: hash.to_string(),
    branch,
    abbreviated_id: commit.chars().take(8).collect(),
    commit,
  };
  debug!(tag = %info.tag, offset = %info.offset, branch = %info.branch, "resolved version info");
  Ok(info)
}

/// Commits since `tag` that touch the scope, or the describe distance when unscoped
///
/// Commits carrying one of the project's prefixed tags count even outside the
/// scope. Zero is a valid count. When counting fails, strict queries get
/// `CommitCount`; the rest fall back to the describe distance.
pub fn commit_offset(repo: &GitRepo, tag: &str, describe_offset: &str, query: &VersionQuery<'_>) -> GitVerResult<String> {
  if query.scope.is_empty() {
    return Ok(describe_offset.to_string());
  }

  let counted = repo.tags().and_then(|tags| {
    let keep = prefixed_tag_commits(&tags, query.tag_prefix);
    repo.count_commits_since(&format!("refs/tags/{}", tag), "HEAD", query.scope, &keep)
  });
  match counted {
    Ok(count) => Ok(count.to_string()),
    Err(e) if query.strict => Err(GitVerError::Version(VersionError::CommitCount {
      tag: tag.to_string(),
      include_paths: query.scope.include().to_vec(),
      exclude_paths: query.scope.exclude().to_vec(),
      reason: e.to_string(),
    })),
    Err(e) => {
      warn!(tag, error = %e, "path-scoped commit count failed, using describe offset");
      Ok(describe_offset.to_string())
    }
  }
}

/// Commits tagged with a name starting with a non-empty `tag_prefix`
fn prefixed_tag_commits(tags: &[TagRef], tag_prefix: &str) -> HashSet<String> {
  if tag_prefix.is_empty() {
    return HashSet::new();
  }
  tags
    .iter()
    .filter(|tag| tag.name.starts_with(tag_prefix))
    .map(|tag| tag.commit.clone())
    .collect()
}
