//! Subproject path resolution
//!
//! A project never scopes out itself or one of its ancestors, so only
//! subprojects strictly below the current project are kept.

use crate::utils::relative_path;
use std::path::{Path, PathBuf};

/// Absolute directories of the declared subprojects lying below `project`
pub fn resolve_subprojects<S: AsRef<str>>(root: &Path, project: &Path, declared: &[S]) -> Vec<PathBuf> {
  let mut subprojects: Vec<PathBuf> = declared
    .iter()
    .map(|path| root.join(path.as_ref()))
    .filter(|dir| {
      let relative = relative_path(project, dir);
      !relative.is_empty() && !relative.starts_with("..")
    })
    .collect();

  subprojects.sort();
  subprojects.dedup();
  subprojects
}

/// Paths of `subprojects` relative to `base`, sorted and deduplicated
pub fn subproject_paths(base: &Path, subprojects: &[PathBuf]) -> Vec<String> {
  let mut paths: Vec<String> = subprojects
    .iter()
    .map(|dir| relative_path(base, dir))
    .filter(|path| !path.is_empty())
    .collect();

  paths.sort();
  paths.dedup();
  paths
}
