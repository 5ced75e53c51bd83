//! Repository handle and low-level queries

use super::{CommitInfo, CommitRange, PathFilter, RemoteBranch, TagRef};
use crate::core::error::{GitError, GitVerError, GitVerResult};
use crate::utils::normalize_remote_url;
use git2::{BranchType, ErrorCode, Oid, ReferenceType, Repository, Sort};
use std::collections::HashSet;
use std::path::Path;
use tracing::debug;

/// Git backend over an open `git2::Repository`
pub struct GitRepo {
  repo: Repository,
}

impl GitRepo {
  /// Open the repository whose git directory is `git_dir`
  pub fn open(git_dir: &Path) -> GitVerResult<Self> {
    let repo = Repository::open(git_dir).map_err(|e| {
      GitVerError::Git(GitError::RepositoryOpen {
        path: git_dir.to_path_buf(),
        reason: e.message().to_string(),
      })
    })?;
    debug!(git_dir = %git_dir.display(), "opened repository");

    Ok(Self { repo })
  }

  pub(crate) fn head_oid(&self) -> GitVerResult<Oid> {
    self
      .repo
      .head()
      .and_then(|head| head.peel_to_commit())
      .map(|commit| commit.id())
      .map_err(|e| unresolvable("HEAD", e))
  }

  /// The HEAD commit
  pub fn head(&self) -> GitVerResult<CommitInfo> {
    let oid = self.head_oid()?;
    self.commit(oid)
  }

  pub(crate) fn commit(&self, oid: Oid) -> GitVerResult<CommitInfo> {
    let commit = self.repo.find_commit(oid)?;
    Ok(CommitInfo::from_commit(&commit))
  }

  pub(crate) fn resolve_oid(&self, spec: &str) -> GitVerResult<Oid> {
    self
      .repo
      .revparse_single(spec)
      .and_then(|object| object.peel_to_commit())
      .map(|commit| commit.id())
      .map_err(|e| unresolvable(spec, e))
  }

  /// Resolve a revision (hash, ref name, `HEAD~2`, ...) to a commit
  pub fn resolve(&self, spec: &str) -> GitVerResult<CommitInfo> {
    let oid = self.resolve_oid(spec)?;
    self.commit(oid)
  }

  /// Short branch name HEAD points at, `None` when detached
  pub fn current_branch(&self) -> GitVerResult<Option<String>> {
    let head = self.repo.find_reference("HEAD")?;
    Ok(head.symbolic_target().map(shorten_ref_name))
  }

  /// All tags peeled to their target commits
  pub fn tags(&self) -> GitVerResult<Vec<TagRef>> {
    let mut tags = Vec::new();
    for reference in self.repo.references_glob("refs/tags/*")? {
      let reference = reference?;
      let Some(name) = reference.name().and_then(|n| n.strip_prefix("refs/tags/")) else {
        continue;
      };

      match reference.peel_to_commit() {
        Ok(commit) => tags.push(TagRef {
          name: name.to_string(),
          commit: commit.id().to_string(),
        }),
        Err(e) => debug!(tag = name, error = %e, "skipping tag that does not point at a commit"),
      }
    }
    Ok(tags)
  }

  /// Remote-tracking branches, excluding symbolic ones like `origin/HEAD`
  pub fn remote_branches(&self) -> GitVerResult<Vec<RemoteBranch>> {
    let mut branches = Vec::new();
    for branch in self.repo.branches(Some(BranchType::Remote))? {
      let (branch, _) = branch?;
      let reference = branch.get();
      if reference.kind() == Some(ReferenceType::Symbolic) {
        continue;
      }
      let Some(name) = branch.name()? else {
        continue;
      };

      let commit = reference.peel_to_commit()?;
      branches.push(RemoteBranch {
        name: name.to_string(),
        commit: commit.id().to_string(),
      });
    }
    Ok(branches)
  }

  /// Lazy walk of `(parents of from, to]`, newest first
  pub fn commit_range(&self, from: Option<&str>, to: &str, filter: PathFilter) -> GitVerResult<CommitRange<'_>> {
    let from = from.map(|spec| self.resolve_oid(spec)).transpose()?;
    let to = self.resolve_oid(to)?;
    CommitRange::new(&self.repo, from, to, filter)
  }

  /// Commits in `(from, to]` touching the filter or listed in `keep`, `from` itself excluded
  pub fn count_commits_since(
    &self,
    from: &str,
    to: &str,
    filter: &PathFilter,
    keep: &HashSet<String>,
  ) -> GitVerResult<usize> {
    let from = self.resolve_oid(from)?;
    let to = self.resolve_oid(to)?;

    let mut walk = self.repo.revwalk()?;
    walk.push(to)?;
    walk.hide(from)?;

    let mut count = 0;
    for oid in walk {
      let commit = self.repo.find_commit(oid?)?;
      if keep.contains(&commit.id().to_string()) || filter.touches(&self.repo, &commit)? {
        count += 1;
      }
    }
    Ok(count)
  }

  /// Youngest common ancestor, `None` if the histories are unrelated
  pub fn merge_base(&self, a: &str, b: &str) -> GitVerResult<Option<CommitInfo>> {
    let a = self.resolve_oid(a)?;
    let b = self.resolve_oid(b)?;
    match self.repo.merge_base(a, b) {
      Ok(oid) => self.commit(oid).map(Some),
      Err(e) if e.code() == ErrorCode::NotFound => Ok(None),
      Err(e) => Err(e.into()),
    }
  }

  /// The oldest commit reachable from HEAD
  pub fn first_commit(&self) -> GitVerResult<CommitInfo> {
    let mut walk = self.repo.revwalk()?;
    walk.set_sorting(Sort::TOPOLOGICAL | Sort::TIME)?;
    walk.push(self.head_oid()?)?;

    let mut last = None;
    for oid in walk {
      last = Some(oid?);
    }
    match last {
      Some(oid) => self.commit(oid),
      None => Err(GitVerError::Git(GitError::UnresolvableRef {
        reference: "HEAD".to_string(),
        reason: "no commits reachable".to_string(),
      })),
    }
  }

  /// Commits reachable from `head` but not from `base`
  pub(crate) fn distance(&self, base: Oid, head: Oid) -> GitVerResult<usize> {
    let (ahead, _) = self.repo.graph_ahead_behind(head, base)?;
    Ok(ahead)
  }

  /// Whether `ancestor` is `commit` or one of its ancestors
  pub(crate) fn is_reachable(&self, ancestor: Oid, commit: Oid) -> GitVerResult<bool> {
    Ok(ancestor == commit || self.repo.graph_descendant_of(commit, ancestor)?)
  }

  /// Browsable URL of `origin`, or of the first remote when there is no `origin`
  pub fn remote_project_url(&self) -> GitVerResult<Option<String>> {
    let remotes = self.repo.remotes()?;
    let names: Vec<&str> = remotes.iter().flatten().collect();
    let name = match names.iter().find(|n| **n == "origin").or(names.first()) {
      Some(name) => *name,
      None => return Ok(None),
    };

    let remote = self.repo.find_remote(name)?;
    Ok(remote.url().map(normalize_remote_url))
  }
}

/// Strip `refs/heads/`, `refs/tags/` or `refs/remotes/` from a ref name
fn shorten_ref_name(name: &str) -> String {
  ["refs/heads/", "refs/tags/", "refs/remotes/"]
    .iter()
    .find_map(|prefix| name.strip_prefix(prefix))
    .unwrap_or(name)
    .to_string()
}

fn unresolvable(reference: &str, err: git2::Error) -> GitVerError {
  GitVerError::Git(GitError::UnresolvableRef {
    reference: reference.to_string(),
    reason: err.message().to_string(),
  })
}

/// Lifecycle of a session's repository: opened lazily, closed for good
#[derive(Default)]
pub enum RepoHandle {
  #[default]
  Unopened,
  Open(GitRepo),
  Closed,
}

impl RepoHandle {
  /// Open on first use; fails once the handle has been closed
  pub fn open(&mut self, git_dir: &Path) -> GitVerResult<&GitRepo> {
    if matches!(self, RepoHandle::Unopened) {
      *self = RepoHandle::Open(GitRepo::open(git_dir)?);
    }

    match &*self {
      RepoHandle::Open(repo) => Ok(repo),
      _ => Err(GitVerError::Git(GitError::ClosedSession)),
    }
  }

  /// Release the repository; idempotent
  pub fn close(&mut self) {
    if matches!(self, RepoHandle::Open(_)) {
      debug!("closing repository");
    }
    *self = RepoHandle::Closed;
  }

  pub fn is_closed(&self) -> bool {
    matches!(self, RepoHandle::Closed)
  }
}
