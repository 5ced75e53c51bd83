//! Changelog generation from git history
//!
//! Walks `start..=end` newest first, groups commits into primary-version
//! windows and renders them as plain text or light markup.

mod render;
mod versions;

pub use render::{ChangelogView, link_pull_requests, process_commit_body};
pub use versions::{UNTAGGED_VERSION, VersionMaps};

use crate::core::error::{GitVerResult, ResultExt};
use crate::core::vcs::{CommitInfo, GitRepo, PathFilter};
use crate::version::{TagMatcher, commit_to_tag_preferring, tag_to_commit};
use tracing::debug;

/// Parameters of one changelog run
#[derive(Debug, Clone, Copy)]
pub struct ChangelogRequest<'a> {
  /// Tag name or revision; defaults to the youngest remote merge base, then the first commit
  pub start: Option<&'a str>,
  /// Revision; defaults to HEAD
  pub end: Option<&'a str>,
  pub url: Option<&'a str>,
  pub tag_prefix: &'a str,
  /// Tag filters; a matching tag names the window when a commit has several
  pub filters: &'a [String],
  pub scope: &'a PathFilter,
  pub plain_text: bool,
}

/// Generate the changelog text
pub fn generate(repo: &GitRepo, request: &ChangelogRequest<'_>) -> GitVerResult<String> {
  let start = resolve_start(repo, request.start)?;
  let end = match request.end {
    Some(end) => repo.resolve(end)?,
    None => repo.head()?,
  };
  debug!(start = %start.sha, end = %end.sha, "generating changelog");

  let all_tags = repo.tags().context("reading tags for the changelog")?;
  let matcher = TagMatcher::new(request.tag_prefix, request.filters)?;
  let tags = commit_to_tag_preferring(&all_tags, Some(request.tag_prefix), |name| matcher.matches(name));

  // Tagged commits survive path scoping so window boundaries stay intact
  let commits = repo
    .commit_range(Some(&start.sha), &end.sha, request.scope.clone())?
    .always_keep(tags.keys().cloned())
    .collect::<GitVerResult<Vec<CommitInfo>>>()
    .with_context(|| format!("walking commits {}..{}", start.sha, end.sha))?;

  let versions = VersionMaps::build(&commits, &tags);
  let branch = repo.current_branch()?.unwrap_or_else(|| end.sha.clone());

  let view = ChangelogView {
    branch: &branch,
    start: &start.sha,
    end: &end.sha,
    url: request.url,
    plain_text: request.plain_text,
    commits: &commits,
    tags: &tags,
    versions: &versions,
  };
  Ok(view.render())
}

/// Explicit start (tag name first, then revision), else the youngest merge base
/// with a remote branch, else the first commit
pub fn resolve_start(repo: &GitRepo, start: Option<&str>) -> GitVerResult<CommitInfo> {
  if let Some(start) = start {
    let tags = tag_to_commit(&repo.tags()?, None);
    return match tags.get(start) {
      Some(commit) => repo.resolve(commit),
      None => repo.resolve(start),
    };
  }

  match youngest_merge_base(repo)? {
    Some(base) => Ok(base),
    None => repo.first_commit(),
  }
}

/// Among remote branches whose tip is not HEAD, the merge base with the latest commit time
fn youngest_merge_base(repo: &GitRepo) -> GitVerResult<Option<CommitInfo>> {
  let head = repo.head()?;

  let mut youngest: Option<CommitInfo> = None;
  for branch in repo.remote_branches()? {
    if branch.commit == head.sha {
      continue;
    }
    let Some(base) = repo.merge_base(&head.sha, &branch.commit)? else {
      continue;
    };
    if base.sha == head.sha {
      continue;
    }

    debug!(remote = %branch.name, base = %base.sha, "merge base candidate");
    if youngest.as_ref().is_none_or(|y| base.timestamp > y.timestamp) {
      youngest = Some(base);
    }
  }
  Ok(youngest)
}
