//! Commit↔tag maps
//!
//! Built fresh for every operation since tags can move between calls. The
//! optional prefix is matched against the peeled commit hash, not the tag name.

use crate::core::vcs::TagRef;
use std::collections::HashMap;

fn retained<'a>(tags: &'a [TagRef], prefix: Option<&'a str>) -> impl Iterator<Item = &'a TagRef> {
  let mut sorted: Vec<&TagRef> = tags
    .iter()
    .filter(move |tag| prefix.is_none_or(|p| p.is_empty() || tag.commit.starts_with(p)))
    .collect();
  sorted.sort_by(|a, b| a.name.cmp(&b.name));
  sorted.into_iter()
}

/// Commit hash → tag name; when a commit carries several tags the greatest name wins
pub fn commit_to_tag(tags: &[TagRef], prefix: Option<&str>) -> HashMap<String, String> {
  commit_to_tag_preferring(tags, prefix, |_| false)
}

/// Like [`commit_to_tag`], but a tag accepted by `preferred` beats any other
/// tag on the same commit, e.g. a project's own release over a sibling's
pub fn commit_to_tag_preferring(
  tags: &[TagRef],
  prefix: Option<&str>,
  preferred: impl Fn(&str) -> bool,
) -> HashMap<String, String> {
  let mut ranked: Vec<(bool, &TagRef)> = retained(tags, prefix).map(|tag| (preferred(&tag.name), tag)).collect();
  // stable: names stay ascending inside each rank, later entries overwrite
  ranked.sort_by_key(|(rank, _)| *rank);
  ranked
    .into_iter()
    .map(|(_, tag)| (tag.commit.clone(), tag.name.clone()))
    .collect()
}

/// Tag name → commit hash
pub fn tag_to_commit(tags: &[TagRef], prefix: Option<&str>) -> HashMap<String, String> {
  retained(tags, prefix)
    .map(|tag| (tag.name.clone(), tag.commit.clone()))
    .collect()
}
