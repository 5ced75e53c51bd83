//! The `Info` value and the version strings derived from it

use serde::{Deserialize, Serialize};

/// Branches that never get a branch suffix
pub const DEFAULT_ALLOWED_BRANCHES: [&str; 3] = ["master", "main", "HEAD"];

/// Resolved repository state for one configuration snapshot
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Info {
  /// Bare tag: prefix and a single leading `v`/`-` removed
  pub tag: String,
  /// Non-negative commit count since the tag
  pub offset: String,
  /// Hash component of the describe string (`g` + abbreviation)
  pub hash: String,
  /// Short branch name, empty when HEAD is detached
  pub branch: String,
  /// Full HEAD commit id
  pub commit: String,
  pub abbreviated_id: String,
}

impl Info {
  /// Placeholder used when nothing could be resolved
  pub fn empty() -> Self {
    Self {
      tag: "0.0".to_string(),
      offset: "0".to_string(),
      hash: "00000000".to_string(),
      branch: "master".to_string(),
      commit: "0".repeat(40),
      abbreviated_id: "00000000".to_string(),
    }
  }

  /// The branch, optionally made safe for versions and file names
  pub fn branch(&self, version_friendly: bool) -> String {
    if version_friendly {
      version_friendly_branch(&self.branch)
    } else {
      self.branch.clone()
    }
  }

  /// `<tag>.<offset>`
  pub fn tag_offset(&self) -> String {
    format!("{}.{}", self.tag, self.offset)
  }

  /// `tag_offset()` plus `-<branch>` unless the branch is empty or allowed
  ///
  /// An empty allow-list never appends the branch.
  pub fn tag_offset_branch<S: AsRef<str>>(&self, allowed_branches: &[S]) -> String {
    let version = self.tag_offset();
    if allowed_branches.is_empty() {
      return version;
    }

    let branch = self.branch(true);
    if branch.is_empty() || allowed_branches.iter().any(|b| b.as_ref() == branch) {
      version
    } else {
      format!("{}-{}", version, branch)
    }
  }

  /// `<mc_version>-<tag_offset_branch>`
  ///
  /// Without an explicit list the allowed branches are the defaults plus the
  /// usual maintenance branch names for `mc_version`.
  pub fn mc_tag_offset_branch<S: AsRef<str>>(&self, mc_version: &str, allowed_branches: Option<&[S]>) -> String {
    if let Some(allowed) = allowed_branches {
      return format!("{}-{}", mc_version, self.tag_offset_branch(allowed));
    }
    if mc_version.is_empty() {
      return self.tag_offset_branch(&DEFAULT_ALLOWED_BRANCHES);
    }

    let allowed = mc_allowed_branches(mc_version);
    format!("{}-{}", mc_version, self.tag_offset_branch(&allowed))
  }
}

fn mc_allowed_branches(mc_version: &str) -> Vec<String> {
  let mut allowed: Vec<String> = DEFAULT_ALLOWED_BRANCHES.iter().map(|b| b.to_string()).collect();
  allowed.push(mc_version.to_string());
  allowed.push(format!("{}.0", mc_version));
  allowed.push(format!("{}.x", mc_version));
  if let Some((major, _)) = mc_version.rsplit_once('.') {
    allowed.push(format!("{}.x", major));
  }
  allowed
}

/// `pulls/<n>` becomes `pr<n>`; path separators become `-`
pub fn version_friendly_branch(branch: &str) -> String {
  if branch.trim().is_empty() {
    return branch.to_string();
  }

  let branch = match branch.strip_prefix("pulls/") {
    Some(_) => format!("pr{}", branch.rsplit('/').next().unwrap_or_default()),
    None => branch.to_string(),
  };
  branch.replace(['/', '\\'], "-")
}
