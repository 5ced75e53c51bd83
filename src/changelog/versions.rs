//! Primary-version windows, per-commit labels and column widths
//!
//! A label counts commits since the nearest tag at or before the commit, so
//! it equals the version reported with that commit checked out. History
//! before the first tag is labeled `<oldest tag>-pre-<n>`.
//!
//! A window collects a tagged commit and every newer commit up to the next
//! tag. History before the oldest tag forms the `<oldest tag>-pre` window.

use crate::core::vcs::CommitInfo;
use std::collections::{BTreeMap, BTreeSet, HashMap};

/// Release name used when nothing in range is tagged
pub const UNTAGGED_VERSION: &str = "0.0";

/// Window and label assigned to every walked commit
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VersionMaps {
  /// Commit hash → primary version (section)
  pub primary: HashMap<String, String>,
  /// Commit hash → release label
  pub labels: HashMap<String, String>,
}

impl VersionMaps {
  /// `commits` newest first; `tags` maps commit hash to tag name
  pub fn build(commits: &[CommitInfo], tags: &HashMap<String, String>) -> Self {
    let first_released = commits
      .iter()
      .rev()
      .find_map(|commit| tags.get(&commit.sha))
      .map_or(UNTAGGED_VERSION, String::as_str);

    Self {
      labels: labels(commits, tags, first_released),
      primary: primaries(commits, tags, first_released),
    }
  }

  /// Widest label per primary version
  ///
  /// Labels are matched to primary versions by prefix, longest primary first,
  /// so `1.0-pre-2` lands in `1.0-pre` rather than `1.0`.
  pub fn widths(&self) -> BTreeMap<String, usize> {
    let primaries: BTreeSet<&str> = self.primary.values().map(String::as_str).collect();
    let mut ordered: Vec<&str> = primaries.into_iter().collect();
    ordered.sort_by(|a, b| b.len().cmp(&a.len()).then(b.cmp(a)));

    let mut widths = BTreeMap::new();
    for label in self.labels.values() {
      if let Some(primary) = ordered.iter().find(|p| label.starts_with(**p)) {
        let width = widths.entry(primary.to_string()).or_insert(0);
        *width = (*width).max(label.trim().len());
      }
    }
    widths
  }
}

/// Oldest to newest: a tag resets the offset, every other commit bumps it
fn labels(commits: &[CommitInfo], tags: &HashMap<String, String>, first_released: &str) -> HashMap<String, String> {
  let mut labels = HashMap::with_capacity(commits.len());
  let mut current: Option<&str> = None;
  let mut offset = 0usize;

  for commit in commits.iter().rev() {
    match tags.get(&commit.sha) {
      Some(tag) => {
        current = Some(tag.as_str());
        offset = 0;
      }
      None => offset += 1,
    }
    let label = match current {
      Some(tag) => format!("{}.{}", tag, offset),
      None => format!("{}-pre-{}", first_released, offset),
    };
    labels.insert(commit.sha.clone(), label);
  }
  labels
}

/// Newest to oldest: each tag claims itself and the newer commits pending above it
fn primaries(commits: &[CommitInfo], tags: &HashMap<String, String>, first_released: &str) -> HashMap<String, String> {
  let mut primary = HashMap::with_capacity(commits.len());
  let mut pending: Vec<&str> = Vec::new();

  for commit in commits {
    pending.push(commit.sha.as_str());
    if let Some(tag) = tags.get(&commit.sha) {
      for sha in pending.drain(..) {
        primary.insert(sha.to_string(), tag.clone());
      }
    }
  }

  let leftover = format!("{}-pre", first_released);
  for sha in pending {
    primary.insert(sha.to_string(), leftover.clone());
  }
  primary
}
