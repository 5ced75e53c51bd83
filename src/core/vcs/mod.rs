//! Git access layer over `git2`
//!
//! A pure query layer: open/close lifecycle, HEAD, tags, remote branches,
//! path-scoped commit ranges and merge bases. Every backend failure is mapped to
//! a `GitError`; nothing here decides whether a failure is fatal.

mod repo;
mod walk;

pub use repo::{GitRepo, RepoHandle};
pub use walk::{CommitRange, PathFilter};

/// Information about a commit
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitInfo {
  pub sha: String,
  /// Full message, trailers included
  pub message: String,
  /// Commit time in seconds since the epoch
  pub timestamp: i64,
}

impl CommitInfo {
  pub(crate) fn from_commit(commit: &git2::Commit<'_>) -> Self {
    Self {
      sha: commit.id().to_string(),
      message: String::from_utf8_lossy(commit.message_bytes()).into_owned(),
      timestamp: commit.time().seconds(),
    }
  }
}

/// A tag peeled to the commit it points at
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagRef {
  /// Short name, without `refs/tags/`
  pub name: String,
  /// Full hash of the target commit
  pub commit: String,
}

/// A remote-tracking branch and its tip
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteBranch {
  pub name: String,
  pub commit: String,
}
