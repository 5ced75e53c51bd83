//! Path-scoped commit traversal

use super::CommitInfo;
use crate::core::error::GitVerResult;
use crate::utils::path_to_git_format;
use git2::{Commit, Oid, Repository, Revwalk, Sort, Tree};
use std::collections::HashSet;

/// Root-relative include/exclude path scoping
///
/// A commit touches the filter when one of its changed files lies under an
/// include path (or anywhere, when there are none) and under no exclude path.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PathFilter {
  include: Vec<String>,
  exclude: Vec<String>,
}

impl PathFilter {
  pub fn new<I, E>(include: I, exclude: E) -> Self
  where
    I: IntoIterator,
    I::Item: AsRef<str>,
    E: IntoIterator,
    E::Item: AsRef<str>,
  {
    Self {
      include: normalize(include),
      exclude: normalize(exclude),
    }
  }

  /// No scoping at all; every commit passes without diffing
  pub fn is_empty(&self) -> bool {
    self.include.is_empty() && self.exclude.is_empty()
  }

  pub fn include(&self) -> &[String] {
    &self.include
  }

  pub fn exclude(&self) -> &[String] {
    &self.exclude
  }

  /// Whether a single root-relative file path is in scope
  pub fn matches_path(&self, path: &str) -> bool {
    let included = self.include.is_empty() || self.include.iter().any(|p| is_under(path, p));
    included && !self.exclude.iter().any(|p| is_under(path, p))
  }

  /// Merge commits touch the filter only if they differ from every parent
  pub(crate) fn touches(&self, repo: &Repository, commit: &Commit<'_>) -> GitVerResult<bool> {
    if self.is_empty() {
      return Ok(true);
    }

    let tree = commit.tree()?;
    if commit.parent_count() == 0 {
      return self.diff_touches(repo, None, &tree);
    }

    for parent in commit.parents() {
      let parent_tree = parent.tree()?;
      if !self.diff_touches(repo, Some(&parent_tree), &tree)? {
        return Ok(false);
      }
    }
    Ok(true)
  }

  fn diff_touches(&self, repo: &Repository, old: Option<&Tree<'_>>, new: &Tree<'_>) -> GitVerResult<bool> {
    let diff = repo.diff_tree_to_tree(old, Some(new), None)?;
    Ok(diff.deltas().any(|delta| {
      [delta.old_file().path(), delta.new_file().path()]
        .into_iter()
        .flatten()
        .any(|path| self.matches_path(&path_to_git_format(path)))
    }))
  }
}

fn normalize<I>(paths: I) -> Vec<String>
where
  I: IntoIterator,
  I::Item: AsRef<str>,
{
  paths
    .into_iter()
    .map(|p| p.as_ref().replace('\\', "/").trim_matches('/').to_string())
    .filter(|p| !p.is_empty())
    .collect()
}

fn is_under(path: &str, prefix: &str) -> bool {
  path == prefix || path.strip_prefix(prefix).is_some_and(|rest| rest.starts_with('/'))
}

/// Commits reachable from `to` but not from any parent of `from`, newest first
///
/// One traversal; not restartable.
pub struct CommitRange<'repo> {
  repo: &'repo Repository,
  walk: Revwalk<'repo>,
  filter: PathFilter,
  keep: HashSet<String>,
}

impl<'repo> CommitRange<'repo> {
  pub(crate) fn new(repo: &'repo Repository, from: Option<Oid>, to: Oid, filter: PathFilter) -> GitVerResult<Self> {
    let mut walk = repo.revwalk()?;
    walk.set_sorting(Sort::TOPOLOGICAL | Sort::TIME)?;
    walk.push(to)?;

    // The root commit has no parents, so nothing is hidden and it stays in the range
    if let Some(from) = from {
      let start = repo.find_commit(from)?;
      for parent in start.parent_ids() {
        walk.hide(parent)?;
      }
    }

    Ok(Self {
      repo,
      walk,
      filter,
      keep: HashSet::new(),
    })
  }

  /// Commits yielded regardless of the path filter
  pub fn always_keep<I: IntoIterator<Item = String>>(mut self, shas: I) -> Self {
    self.keep.extend(shas);
    self
  }

  fn next_commit(&mut self) -> GitVerResult<Option<CommitInfo>> {
    for oid in self.walk.by_ref() {
      let oid = oid?;
      let commit = self.repo.find_commit(oid)?;
      if self.keep.contains(&oid.to_string()) || self.filter.touches(self.repo, &commit)? {
        return Ok(Some(CommitInfo::from_commit(&commit)));
      }
    }
    Ok(None)
  }
}

impl Iterator for CommitRange<'_> {
  type Item = GitVerResult<CommitInfo>;

  fn next(&mut self) -> Option<Self::Item> {
    self.next_commit().transpose()
  }
}
