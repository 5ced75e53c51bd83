use crate::core::error::{ConstructionError, GitVerError, GitVerResult};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Config file names searched in the repository root, in order
const CONFIG_FILE_NAMES: [&str; 2] = [".gitversion.toml", ".gitversion"];

/// Table name reserved for the root project
const ROOT_TABLE: &str = "root";

/// Per-project versioning configuration
///
/// `path` is relative to the repository root with `/` separators; the root
/// project has the empty path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProjectConfig {
  pub path: String,
  pub tag_prefix: String,
  pub filters: Vec<String>,
  pub include: Vec<String>,
  pub exclude: Vec<String>,
}

impl ProjectConfig {
  /// The root project with no prefix, filters or extra paths
  pub fn root() -> Self {
    Self {
      path: String::new(),
      tag_prefix: String::new(),
      filters: Vec::new(),
      include: Vec::new(),
      exclude: Vec::new(),
    }
  }
}

/// Raw table as written in the config file
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ProjectTable {
  path: Option<String>,
  tag: Option<String>,
  filters: Vec<String>,
  include: Vec<String>,
  exclude: Vec<String>,
}

/// A top-level entry; only tables describe projects
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Entry {
  Project(ProjectTable),
  Other(serde::de::IgnoredAny),
}

/// Repository-wide gitver configuration
///
/// Searched in order: .gitversion.toml, .gitversion
///
/// ```toml
/// [root]
/// tag = ""
/// filters = ["!*-beta*"]
///
/// [sub-a]
/// path = "libs/a"
/// tag = "a"
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GitVersionConfig {
  projects: BTreeMap<String, ProjectConfig>,
}

impl Default for GitVersionConfig {
  fn default() -> Self {
    Self::empty()
  }
}

impl GitVersionConfig {
  /// Config containing only the root project
  pub fn empty() -> Self {
    let mut projects = BTreeMap::new();
    projects.insert(String::new(), ProjectConfig::root());
    Self { projects }
  }

  /// Find config file in search order: .gitversion.toml, .gitversion
  pub fn find_config_path(root: &Path) -> Option<PathBuf> {
    CONFIG_FILE_NAMES.iter().map(|name| root.join(name)).find(|p| p.is_file())
  }

  /// Load the config from the repository root, or the empty config if there is none
  pub fn load(root: &Path) -> GitVerResult<Self> {
    match Self::find_config_path(root) {
      Some(path) => Self::load_file(&path),
      None => Ok(Self::empty()),
    }
  }

  /// Load the config from an explicit file; a missing file yields the empty config
  pub fn load_file(path: &Path) -> GitVerResult<Self> {
    if !path.exists() {
      return Ok(Self::empty());
    }

    let content = fs::read_to_string(path).map_err(|e| invalid(path, e.to_string()))?;
    Self::parse(&content).map_err(|e| invalid(path, e.to_string()))
  }

  /// Parse config text
  pub fn parse(content: &str) -> GitVerResult<Self> {
    let entries: BTreeMap<String, Entry> = toml_edit::de::from_str(content)?;

    if entries.contains_key("") {
      return Err(GitVerError::with_help(
        "Config file cannot have a table with an empty string ([\"\"])",
        "Use [root] for the root project",
      ));
    }

    let mut config = Self::empty();
    for (key, entry) in entries {
      let Entry::Project(mut table) = entry else {
        continue;
      };

      let (path, tag_prefix) = if key == ROOT_TABLE {
        (String::new(), table.tag.take().unwrap_or_default())
      } else {
        let path = table.path.take().unwrap_or(key);
        let tag_prefix = table.tag.take().unwrap_or_else(|| path.replace('/', "-"));
        (path, tag_prefix)
      };

      let project = Self::project_from_table(path, tag_prefix, table);
      config.projects.insert(project.path.clone(), project);
    }

    Ok(config)
  }

  fn project_from_table(path: String, tag_prefix: String, table: ProjectTable) -> ProjectConfig {
    let blank = |s: &String| !s.trim().is_empty();
    ProjectConfig {
      path,
      tag_prefix,
      filters: table.filters.into_iter().filter(blank).collect(),
      include: table.include.into_iter().filter(blank).collect(),
      exclude: table.exclude.into_iter().filter(blank).collect(),
    }
  }

  /// Every configured non-root path must exist under the root
  pub fn validate(&self, root: &Path) -> GitVerResult<()> {
    for path in self.projects.keys() {
      if !path.is_empty() && !root.join(path).exists() {
        return Err(GitVerError::Construction(ConstructionError::MissingProjectPath {
          path: path.clone(),
        }));
      }
    }
    Ok(())
  }

  /// Look up a project by its root-relative path
  pub fn project(&self, path: &str) -> Option<&ProjectConfig> {
    self.projects.get(path)
  }

  /// Paths of every configured project other than the root
  pub fn subproject_paths(&self) -> Vec<String> {
    self.projects.keys().filter(|p| !p.is_empty()).cloned().collect()
  }
}

fn invalid(path: &Path, reason: String) -> GitVerError {
  GitVerError::Construction(ConstructionError::InvalidConfig {
    path: path.to_path_buf(),
    reason,
  })
}

/// Blank prefixes become empty, anything else ends with `-`
pub fn normalize_tag_prefix(tag_prefix: &str) -> String {
  if tag_prefix.trim().is_empty() {
    String::new()
  } else if tag_prefix.ends_with('-') {
    tag_prefix.to_string()
  } else {
    format!("{}-", tag_prefix)
  }
}

/// Drop empty filters and bare `!`
pub fn normalize_filters<S: AsRef<str>>(filters: &[S]) -> Vec<String> {
  filters
    .iter()
    .map(AsRef::as_ref)
    .filter(|f| f.len() > usize::from(f.starts_with('!')))
    .map(str::to_string)
    .collect()
}
