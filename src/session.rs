//! Versioning sessions over a repository root and project directory
//!
//! `GitVersionBuilder::build` resolves directories and configuration and
//! returns a `GitVersion`. Repository access is lazy: the handle opens on the
//! first query and `Info` is memoized until the tag prefix, filters or
//! subprojects change. A session is single-threaded; use one per thread.
//!
//! Strict mode is applied here and only here. Strict sessions surface every
//! failure; non-strict ones degrade to placeholder values (`Info::empty()`,
//! an empty changelog) and log a warning.

use crate::changelog::{self, ChangelogRequest};
use crate::core::config::{GitVersionConfig, normalize_filters, normalize_tag_prefix};
use crate::core::error::{ConstructionError, GitError, GitVerError, GitVerResult, ResultExt, VersionError};
use crate::core::vcs::{GitRepo, PathFilter, RepoHandle};
use crate::utils::relative_path;
use crate::version::{DEFAULT_ALLOWED_BRANCHES, Info, VersionQuery, resolve_info, resolve_subprojects, subproject_paths};
use serde::{Deserialize, Serialize};
use std::cell::{OnceCell, RefCell};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Flat record of a session's resolved state, for hand-off to other processes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Output {
  pub info: Info,
  pub url: Option<String>,
  pub git_dir_path: Option<String>,
  pub root_path: Option<String>,
  pub project_path: Option<String>,
  pub include_paths: Vec<String>,
  pub exclude_paths: Vec<String>,
  pub tag_prefix: Option<String>,
  pub filters: Vec<String>,
  pub subproject_paths: Vec<String>,
}

/// Version and changelog queries for one project of a repository
pub trait GitVersion {
  /// Resolved tag, offset and HEAD details, memoized
  fn info(&self) -> GitVerResult<Info>;

  /// Browsable project URL derived from the remotes
  fn url(&self) -> GitVerResult<Option<String>>;

  fn tag_prefix(&self) -> GitVerResult<&str>;

  /// Replace the tag prefix; invalidates `Info`
  fn set_tag_prefix(&mut self, tag_prefix: &str) -> GitVerResult<()>;

  fn filters(&self) -> GitVerResult<&[String]>;

  /// Replace the tag filters; invalidates `Info`
  fn set_filters(&mut self, filters: &[String]) -> GitVerResult<()>;

  fn git_dir(&self) -> GitVerResult<&Path>;

  fn root(&self) -> GitVerResult<&Path>;

  fn project(&self) -> GitVerResult<&Path>;

  /// Project directory relative to the root, `""` for the root project
  fn project_path(&self) -> GitVerResult<&str>;

  /// Absolute directories of the subprojects below this project
  fn subprojects(&self) -> GitVerResult<&[PathBuf]>;

  /// Replace the subprojects with root-relative paths; invalidates `Info`
  fn set_subprojects(&mut self, subprojects: &[String]) -> GitVerResult<()>;

  /// Root-relative paths that scope the offset and changelog
  fn include_paths(&self) -> GitVerResult<Vec<String>>;

  /// Root-relative paths excluded from the offset and changelog
  fn exclude_paths(&self) -> GitVerResult<Vec<String>>;

  /// Changelog from `start` (tag or revision) to `end` (revision, default HEAD)
  fn generate_changelog_range(
    &self,
    start: Option<&str>,
    end: Option<&str>,
    url: Option<&str>,
    plain_text: bool,
  ) -> GitVerResult<String>;

  /// Release the repository handle; idempotent
  fn close(&self);

  /// Changelog from `start` to HEAD
  fn generate_changelog(&self, start: Option<&str>, url: Option<&str>, plain_text: bool) -> GitVerResult<String> {
    self.generate_changelog_range(start, None, url, plain_text)
  }

  /// Subproject paths relative to the root or to this project
  fn subproject_paths(&self, from_root: bool) -> GitVerResult<Vec<String>> {
    let base = if from_root { self.root()? } else { self.project()? };
    Ok(subproject_paths(base, self.subprojects()?))
  }

  /// `file` relative to the root or to this project, in git format
  fn relative_path(&self, from_root: bool, file: &Path) -> GitVerResult<String> {
    let base = if from_root { self.root()? } else { self.project()? };
    Ok(relative_path(base, file))
  }

  /// `<tag>.<offset>`
  fn tag_offset(&self) -> GitVerResult<String> {
    Ok(self.info()?.tag_offset())
  }

  /// `<tag>.<offset>[-<branch>]`; `None` uses master, main and HEAD as allowed branches
  fn tag_offset_branch(&self, allowed_branches: Option<&[&str]>) -> GitVerResult<String> {
    let info = self.info()?;
    Ok(info.tag_offset_branch(allowed_branches.unwrap_or(&DEFAULT_ALLOWED_BRANCHES)))
  }

  /// `<mc_version>-<tag>.<offset>[-<branch>]`
  fn mc_tag_offset_branch(&self, mc_version: &str, allowed_branches: Option<&[&str]>) -> GitVerResult<String> {
    Ok(self.info()?.mc_tag_offset_branch(mc_version, allowed_branches))
  }

  /// Snapshot of the session's state; unavailable fields are left empty
  fn output(&self) -> GitVerResult<Output> {
    let display = |path: &Path| crate::utils::path_to_git_format(path);
    Ok(Output {
      info: self.info()?,
      url: self.url()?,
      git_dir_path: self.git_dir().ok().map(display),
      root_path: self.root().ok().map(display),
      project_path: self.project().ok().map(display),
      include_paths: self.include_paths().unwrap_or_default(),
      exclude_paths: self.exclude_paths().unwrap_or_default(),
      tag_prefix: self.tag_prefix().ok().map(str::to_string),
      filters: self.filters().map(<[String]>::to_vec).unwrap_or_default(),
      subproject_paths: self.subproject_paths(false).unwrap_or_default(),
    })
  }

  /// `output()` as one line of JSON
  fn to_json(&self) -> GitVerResult<String> {
    serde_json::to_string(&self.output()?).context("serializing version output")
  }
}

/// Builder for `GitVersion` sessions
///
/// At least one of `root` and `project` is required. A missing root is found by
/// walking up from the project to the nearest directory containing `.git`.
#[derive(Debug, Clone)]
pub struct GitVersionBuilder {
  git_dir: Option<PathBuf>,
  root: Option<PathBuf>,
  project: Option<PathBuf>,
  config: Option<GitVersionConfig>,
  config_file: Option<PathBuf>,
  strict: bool,
}

impl Default for GitVersionBuilder {
  fn default() -> Self {
    Self::new()
  }
}

impl GitVersionBuilder {
  pub fn new() -> Self {
    Self {
      git_dir: None,
      root: None,
      project: None,
      config: None,
      config_file: None,
      strict: true,
    }
  }

  pub fn git_dir(mut self, git_dir: impl Into<PathBuf>) -> Self {
    self.git_dir = Some(git_dir.into());
    self
  }

  pub fn root(mut self, root: impl Into<PathBuf>) -> Self {
    self.root = Some(root.into());
    self
  }

  pub fn project(mut self, project: impl Into<PathBuf>) -> Self {
    self.project = Some(project.into());
    self
  }

  /// Use an already parsed config instead of discovering one
  pub fn config(mut self, config: GitVersionConfig) -> Self {
    self.config = Some(config);
    self
  }

  /// Load the config from this file instead of discovering one
  pub fn config_file(mut self, config_file: impl Into<PathBuf>) -> Self {
    self.config_file = Some(config_file.into());
    self
  }

  /// Strict sessions fail loudly; the default is strict
  pub fn strict(mut self, strict: bool) -> Self {
    self.strict = strict;
    self
  }

  pub fn build(self) -> GitVerResult<Box<dyn GitVersion>> {
    let (root, project) = match (self.root, self.project) {
      (None, None) => return Err(GitVerError::Construction(ConstructionError::NoDirectory)),
      (Some(root), project) => {
        let root = absolute(&root);
        let project = project.map(|p| absolute(&p)).unwrap_or_else(|| root.clone());
        (root, project)
      }
      (None, Some(project)) => {
        let project = absolute(&project);
        (find_git_root(&project), project)
      }
    };
    let git_dir = self.git_dir.map(|d| absolute(&d)).unwrap_or_else(|| root.join(".git"));
    let strict = self.strict;

    let built = load_config(self.config, self.config_file.as_deref(), &root)
      .and_then(|config| Session::new(git_dir, root, project.clone(), &config, strict));

    match built {
      Ok(session) => Ok(Box::new(session)),
      Err(e) if strict => Err(e),
      Err(e) => {
        warn!(error = %e, "falling back to an empty git version");
        Ok(Box::new(EmptyVersion { project }))
      }
    }
  }
}

fn load_config(config: Option<GitVersionConfig>, file: Option<&Path>, root: &Path) -> GitVerResult<GitVersionConfig> {
  match (config, file) {
    (Some(config), _) => Ok(config),
    (None, Some(file)) => GitVersionConfig::load_file(file),
    (None, None) => GitVersionConfig::load(root),
  }
}

/// Canonical path when it exists, otherwise made absolute lexically
fn absolute(path: &Path) -> PathBuf {
  fs::canonicalize(path)
    .or_else(|_| std::path::absolute(path))
    .unwrap_or_else(|_| path.to_path_buf())
}

/// Nearest ancestor (or self) containing `.git`, else `from` itself
fn find_git_root(from: &Path) -> PathBuf {
  from
    .ancestors()
    .find(|dir| dir.join(".git").exists())
    .unwrap_or(from)
    .to_path_buf()
}

/// Session over an existing repository
struct Session {
  strict: bool,
  git_dir: PathBuf,
  root: PathBuf,
  project: PathBuf,
  local_path: String,
  tag_prefix: String,
  filters: Vec<String>,
  include: Vec<String>,
  exclude: Vec<String>,
  subprojects: Vec<PathBuf>,
  repo: RefCell<RepoHandle>,
  info: OnceCell<Info>,
  url: OnceCell<Option<String>>,
}

impl Session {
  fn new(
    git_dir: PathBuf,
    root: PathBuf,
    project: PathBuf,
    config: &GitVersionConfig,
    strict: bool,
  ) -> GitVerResult<Self> {
    if !git_dir.exists() {
      return Err(GitVerError::Construction(ConstructionError::NotARepository { git_dir }));
    }
    if !project.starts_with(&root) {
      return Err(GitVerError::Construction(ConstructionError::ProjectOutsideRoot { root, project }));
    }

    config.validate(&root)?;
    let project = nearest_configured(&root, project, config);
    let local_path = relative_path(&root, &project);
    let project_config = config.project(&local_path).ok_or_else(|| {
      GitVerError::Construction(ConstructionError::ProjectNotConfigured {
        path: local_path.clone(),
      })
    })?;

    let subprojects = resolve_subprojects(&root, &project, &config.subproject_paths());
    debug!(
      root = %root.display(),
      project = %local_path,
      tag_prefix = %project_config.tag_prefix,
      subprojects = subprojects.len(),
      "built git version session"
    );

    Ok(Self {
      strict,
      tag_prefix: normalize_tag_prefix(&project_config.tag_prefix),
      filters: normalize_filters(&project_config.filters),
      include: project_config.include.clone(),
      exclude: project_config.exclude.clone(),
      subprojects,
      git_dir,
      root,
      project,
      local_path,
      repo: RefCell::new(RepoHandle::default()),
      info: OnceCell::new(),
      url: OnceCell::new(),
    })
  }

  fn with_repo<T>(&self, f: impl FnOnce(&GitRepo) -> GitVerResult<T>) -> GitVerResult<T> {
    let mut handle = self.repo.borrow_mut();
    let repo = handle.open(&self.git_dir)?;
    f(repo)
  }

  fn ensure_open(&self) -> GitVerResult<()> {
    if self.repo.borrow().is_closed() {
      return Err(GitVerError::Git(GitError::ClosedSession));
    }
    Ok(())
  }

  fn scope(&self) -> PathFilter {
    PathFilter::new(self.include_list(), self.exclude_list())
  }

  fn include_list(&self) -> Vec<String> {
    let local = (!self.local_path.is_empty()).then(|| self.local_path.clone());
    local.into_iter().chain(self.include.iter().cloned()).collect()
  }

  fn exclude_list(&self) -> Vec<String> {
    let mut paths = subproject_paths(&self.root, &self.subprojects);
    paths.extend(self.exclude.iter().cloned());
    paths
  }

  fn invalidate(&mut self) {
    self.info.take();
  }
}

/// A nested directory belongs to its nearest configured ancestor project
fn nearest_configured(root: &Path, project: PathBuf, config: &GitVersionConfig) -> PathBuf {
  if config.project(&relative_path(root, &project)).is_some() {
    return project;
  }

  project
    .ancestors()
    .skip(1)
    .take_while(|dir| dir.starts_with(root))
    .find(|dir| config.project(&relative_path(root, dir)).is_some())
    .map(Path::to_path_buf)
    .unwrap_or(project)
}

impl GitVersion for Session {
  fn info(&self) -> GitVerResult<Info> {
    self.ensure_open()?;
    if let Some(info) = self.info.get() {
      return Ok(info.clone());
    }

    let scope = self.scope();
    let query = VersionQuery {
      tag_prefix: &self.tag_prefix,
      filters: &self.filters,
      scope: &scope,
      strict: self.strict,
    };

    let info = match self.with_repo(|repo| resolve_info(repo, &query)) {
      Ok(info) => info,
      Err(e) if self.strict => return Err(e),
      Err(e) => {
        warn!(error = %e, "failed to calculate version info, using empty info");
        Info::empty()
      }
    };
    Ok(self.info.get_or_init(|| info).clone())
  }

  fn url(&self) -> GitVerResult<Option<String>> {
    self.ensure_open()?;
    if let Some(url) = self.url.get() {
      return Ok(url.clone());
    }

    let url = self.with_repo(|repo| repo.remote_project_url()).unwrap_or_else(|e| {
      debug!(error = %e, "no project url");
      None
    });
    Ok(self.url.get_or_init(|| url).clone())
  }

  fn tag_prefix(&self) -> GitVerResult<&str> {
    Ok(&self.tag_prefix)
  }

  fn set_tag_prefix(&mut self, tag_prefix: &str) -> GitVerResult<()> {
    self.tag_prefix = normalize_tag_prefix(tag_prefix);
    self.invalidate();
    Ok(())
  }

  fn filters(&self) -> GitVerResult<&[String]> {
    Ok(&self.filters)
  }

  fn set_filters(&mut self, filters: &[String]) -> GitVerResult<()> {
    self.filters = normalize_filters(filters);
    self.invalidate();
    Ok(())
  }

  fn git_dir(&self) -> GitVerResult<&Path> {
    Ok(&self.git_dir)
  }

  fn root(&self) -> GitVerResult<&Path> {
    Ok(&self.root)
  }

  fn project(&self) -> GitVerResult<&Path> {
    Ok(&self.project)
  }

  fn project_path(&self) -> GitVerResult<&str> {
    Ok(&self.local_path)
  }

  fn subprojects(&self) -> GitVerResult<&[PathBuf]> {
    Ok(&self.subprojects)
  }

  fn set_subprojects(&mut self, subprojects: &[String]) -> GitVerResult<()> {
    self.subprojects = resolve_subprojects(&self.root, &self.project, subprojects);
    self.invalidate();
    Ok(())
  }

  fn include_paths(&self) -> GitVerResult<Vec<String>> {
    Ok(self.include_list())
  }

  fn exclude_paths(&self) -> GitVerResult<Vec<String>> {
    Ok(self.exclude_list())
  }

  fn generate_changelog_range(
    &self,
    start: Option<&str>,
    end: Option<&str>,
    url: Option<&str>,
    plain_text: bool,
  ) -> GitVerResult<String> {
    self.ensure_open()?;
    let url = match url {
      Some(url) => Some(url.to_string()),
      None => self.url()?,
    };

    let scope = self.scope();
    let request = ChangelogRequest {
      start: start.filter(|s| !s.is_empty()),
      end,
      url: url.as_deref(),
      tag_prefix: &self.tag_prefix,
      filters: &self.filters,
      scope: &scope,
      plain_text,
    };

    match self.with_repo(|repo| changelog::generate(repo, &request)) {
      Ok(text) => Ok(text),
      Err(e) if self.strict => Err(GitVerError::Version(VersionError::ChangelogGeneration {
        reason: e.to_string(),
      })),
      Err(e) => {
        warn!(error = %e, "failed to generate the changelog");
        Ok(String::new())
      }
    }
  }

  fn close(&self) {
    self.repo.borrow_mut().close();
  }
}

/// Stand-in returned by non-strict builds that could not construct a session
struct EmptyVersion {
  project: PathBuf,
}

fn unavailable(what: &str) -> GitVerError {
  GitVerError::message(format!("Cannot get {} from an empty repository", what))
}

impl GitVersion for EmptyVersion {
  fn info(&self) -> GitVerResult<Info> {
    Ok(Info::empty())
  }

  fn url(&self) -> GitVerResult<Option<String>> {
    Ok(None)
  }

  fn tag_prefix(&self) -> GitVerResult<&str> {
    Err(unavailable("tag prefix"))
  }

  fn set_tag_prefix(&mut self, _tag_prefix: &str) -> GitVerResult<()> {
    Ok(())
  }

  fn filters(&self) -> GitVerResult<&[String]> {
    Err(unavailable("filters"))
  }

  fn set_filters(&mut self, _filters: &[String]) -> GitVerResult<()> {
    Ok(())
  }

  fn git_dir(&self) -> GitVerResult<&Path> {
    Err(unavailable("git directory"))
  }

  fn root(&self) -> GitVerResult<&Path> {
    Err(unavailable("root directory"))
  }

  fn project(&self) -> GitVerResult<&Path> {
    Ok(&self.project)
  }

  fn project_path(&self) -> GitVerResult<&str> {
    Err(unavailable("project path"))
  }

  fn subprojects(&self) -> GitVerResult<&[PathBuf]> {
    Err(unavailable("subprojects"))
  }

  fn set_subprojects(&mut self, _subprojects: &[String]) -> GitVerResult<()> {
    Ok(())
  }

  fn include_paths(&self) -> GitVerResult<Vec<String>> {
    Err(unavailable("include paths"))
  }

  fn exclude_paths(&self) -> GitVerResult<Vec<String>> {
    Err(unavailable("exclude paths"))
  }

  fn generate_changelog_range(
    &self,
    _start: Option<&str>,
    _end: Option<&str>,
    _url: Option<&str>,
    _plain_text: bool,
  ) -> GitVerResult<String> {
    Err(GitVerError::Version(VersionError::ChangelogGeneration {
      reason: "no repository".to_string(),
    }))
  }

  fn close(&self) {}
}
