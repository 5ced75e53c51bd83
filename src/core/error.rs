//! Error types for gitver with contextual messages and exit codes
//!
//! Every failure the engine can produce is categorized here. Lower layers always
//! return `Err`; whether an error reaches the caller or is replaced by a
//! placeholder value is decided once, at the session boundary, by strict mode.

use std::fmt;
use std::io;
use std::path::PathBuf;

/// Exit codes for the gitver binary
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitCode {
  /// User error (directory layout, config, invalid args)
  User = 1,
  /// System error (git, I/O)
  System = 2,
  /// Version resolution failure (no tag, counting, changelog)
  Version = 3,
}

impl ExitCode {
  /// Convert to i32 for process exit
  pub fn as_i32(self) -> i32 {
    self as i32
  }
}

/// Main error type for gitver
#[derive(Debug)]
pub enum GitVerError {
  /// Invalid directory relationships, missing repository, unconfigured project
  Construction(ConstructionError),

  /// Git access layer errors
  Git(GitError),

  /// Version, offset and changelog computation errors
  Version(VersionError),

  /// I/O errors
  Io(io::Error),

  /// Generic error with message and optional context
  Message {
    message: String,
    context: Option<String>,
    help: Option<String>,
  },
}

impl GitVerError {
  /// Create a simple error message
  pub fn message(msg: impl Into<String>) -> Self {
    GitVerError::Message {
      message: msg.into(),
      context: None,
      help: None,
    }
  }

  /// Create an error with help text
  pub fn with_help(msg: impl Into<String>, help: impl Into<String>) -> Self {
    GitVerError::Message {
      message: msg.into(),
      context: None,
      help: Some(help.into()),
    }
  }

  /// Add context to an existing error
  pub fn context(self, ctx: impl Into<String>) -> Self {
    let ctx_str = ctx.into();
    match self {
      GitVerError::Message { message, context, help } => GitVerError::Message {
        message,
        context: Some(context.map(|c| format!("{}\n{}", ctx_str, c)).unwrap_or(ctx_str)),
        help,
      },
      GitVerError::Git(GitError::Backend { operation, message }) => GitVerError::Git(GitError::Backend {
        operation: format!("{}: {}", ctx_str, operation),
        message,
      }),
      _ => self,
    }
  }

  /// Get the appropriate exit code for this error
  pub fn exit_code(&self) -> ExitCode {
    match self {
      GitVerError::Construction(_) => ExitCode::User,
      GitVerError::Git(_) => ExitCode::System,
      GitVerError::Version(_) => ExitCode::Version,
      GitVerError::Io(_) => ExitCode::System,
      GitVerError::Message { .. } => ExitCode::User,
    }
  }

  /// Get contextual help message for this error
  pub fn help_message(&self) -> Option<String> {
    match self {
      GitVerError::Construction(e) => e.help_message(),
      GitVerError::Git(e) => e.help_message(),
      GitVerError::Version(e) => e.help_message(),
      GitVerError::Message { help, .. } => help.clone(),
      GitVerError::Io(_) => None,
    }
  }
}

impl fmt::Display for GitVerError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      GitVerError::Construction(e) => write!(f, "{}", e),
      GitVerError::Git(e) => write!(f, "{}", e),
      GitVerError::Version(e) => write!(f, "{}", e),
      GitVerError::Io(e) => write!(f, "I/O error: {}", e),
      GitVerError::Message { message, context, .. } => {
        write!(f, "{}", message)?;
        if let Some(ctx) = context {
          write!(f, "\n{}", ctx)?;
        }
        Ok(())
      }
    }
  }
}

impl std::error::Error for GitVerError {
  fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
    match self {
      GitVerError::Io(e) => Some(e),
      _ => None,
    }
  }
}

impl From<io::Error> for GitVerError {
  fn from(err: io::Error) -> Self {
    GitVerError::Io(err)
  }
}

impl From<git2::Error> for GitVerError {
  fn from(err: git2::Error) -> Self {
    GitVerError::Git(GitError::Backend {
      operation: format!("{:?}/{:?}", err.class(), err.code()),
      message: err.message().to_string(),
    })
  }
}

impl From<toml_edit::de::Error> for GitVerError {
  fn from(err: toml_edit::de::Error) -> Self {
    GitVerError::message(format!("TOML deserialization error: {}", err))
  }
}

impl From<serde_json::Error> for GitVerError {
  fn from(err: serde_json::Error) -> Self {
    GitVerError::message(format!("JSON error: {}", err))
  }
}

impl From<glob::PatternError> for GitVerError {
  fn from(err: glob::PatternError) -> Self {
    GitVerError::message(format!("Glob pattern error: {}", err))
  }
}

/// Errors raised while building a session
#[derive(Debug)]
pub enum ConstructionError {
  /// Neither a root nor a project directory was supplied
  NoDirectory,

  /// The git directory does not exist
  NotARepository { git_dir: PathBuf },

  /// The project is not the root or one of its descendants
  ProjectOutsideRoot { root: PathBuf, project: PathBuf },

  /// The project's path has no entry in the config
  ProjectNotConfigured { path: String },

  /// A configured project path does not exist under the root
  MissingProjectPath { path: String },

  /// The config file could not be read or parsed
  InvalidConfig { path: PathBuf, reason: String },
}

impl ConstructionError {
  fn help_message(&self) -> Option<String> {
    match self {
      ConstructionError::NoDirectory => Some("Pass --project-dir or --root-dir.".to_string()),
      ConstructionError::NotARepository { .. } => {
        Some("Run inside a git checkout or pass --git-dir explicitly.".to_string())
      }
      ConstructionError::ProjectNotConfigured { path } => Some(format!(
        "Add a table with `path = \"{}\"` to .gitversion.toml.",
        path
      )),
      ConstructionError::MissingProjectPath { .. } => {
        Some("Remove the entry or set its `path` to an existing directory.".to_string())
      }
      _ => None,
    }
  }
}

impl fmt::Display for ConstructionError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      ConstructionError::NoDirectory => write!(f, "Either the root or project directory must be set"),
      ConstructionError::NotARepository { git_dir } => {
        write!(f, "Root directory is not a git repository: {}", git_dir.display())
      }
      ConstructionError::ProjectOutsideRoot { root, project } => write!(
        f,
        "Project directory {} must be (a subdirectory of) the root directory {}",
        project.display(),
        root.display()
      ),
      ConstructionError::ProjectNotConfigured { path } => {
        write!(f, "Subproject '{}' is not configured in the git version config", path)
      }
      ConstructionError::MissingProjectPath { path } => {
        write!(f, "Subproject path '{}' does not exist", path)
      }
      ConstructionError::InvalidConfig { path, reason } => {
        write!(f, "Invalid config {}: {}", path.display(), reason)
      }
    }
  }
}

/// Git access layer errors
#[derive(Debug)]
pub enum GitError {
  /// The repository could not be opened
  RepositoryOpen { path: PathBuf, reason: String },

  /// The session was closed before the operation
  ClosedSession,

  /// A reference (HEAD, a tag, a revision) could not be resolved
  UnresolvableRef { reference: String, reason: String },

  /// Any other error reported by the git backend
  Backend { operation: String, message: String },
}

impl GitError {
  fn help_message(&self) -> Option<String> {
    match self {
      GitError::UnresolvableRef { reference, .. } if reference == "HEAD" => {
        Some("The repository has no commits yet. Create one first.".to_string())
      }
      GitError::ClosedSession => Some("Build a new session; closed sessions cannot be reopened.".to_string()),
      _ => None,
    }
  }
}

impl fmt::Display for GitError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      GitError::RepositoryOpen { path, reason } => {
        write!(f, "Failed to open git repository at {}: {}", path.display(), reason)
      }
      GitError::ClosedSession => write!(f, "GitVersion is closed"),
      GitError::UnresolvableRef { reference, reason } => {
        write!(f, "Cannot resolve '{}': {}", reference, reason)
      }
      GitError::Backend { operation, message } => write!(f, "Git error ({}): {}", operation, message),
    }
  }
}

/// Version, offset and changelog computation errors
#[derive(Debug)]
pub enum VersionError {
  /// No tag matched the prefix and filters
  NoMatchingTag { tag_prefix: String, filters: Vec<String> },

  /// A filter glob could not be compiled
  InvalidFilter { filter: String, reason: String },

  /// Path-scoped commit counting failed
  CommitCount {
    tag: String,
    include_paths: Vec<String>,
    exclude_paths: Vec<String>,
    reason: String,
  },

  /// Changelog traversal or rendering failed
  ChangelogGeneration { reason: String },
}

impl VersionError {
  fn help_message(&self) -> Option<String> {
    match self {
      VersionError::NoMatchingTag { .. } => {
        Some("Create a tag such as `1.0` (with the project's tag prefix), or check the filters.".to_string())
      }
      VersionError::InvalidFilter { .. } => Some("Filters are glob patterns; prefix with `!` to exclude.".to_string()),
      _ => None,
    }
  }
}

impl fmt::Display for VersionError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      VersionError::NoMatchingTag { tag_prefix, filters } => write!(
        f,
        "Tag not found! A valid tag must include a digit! Tag prefix: {}, Filters: {}",
        if tag_prefix.is_empty() { "NONE!" } else { tag_prefix },
        filters.join(", ")
      ),
      VersionError::InvalidFilter { filter, reason } => write!(f, "Invalid tag filter '{}': {}", filter, reason),
      VersionError::CommitCount {
        tag,
        include_paths,
        exclude_paths,
        reason,
      } => write!(
        f,
        "Failed to count commits with the following parameters: Tag {}, Include Paths [{}], Exclude Paths [{}]: {}",
        tag,
        include_paths.join(", "),
        exclude_paths.join(", "),
        reason
      ),
      VersionError::ChangelogGeneration { reason } => write!(f, "Failed to generate the changelog: {}", reason),
    }
  }
}

/// Result type alias for gitver
pub type GitVerResult<T> = Result<T, GitVerError>;

/// Helper trait to add context to Results
pub trait ResultExt<T> {
  /// Add context to an error result
  fn context(self, ctx: impl Into<String>) -> GitVerResult<T>;

  /// Add context using a closure (lazy evaluation)
  fn with_context<F>(self, f: F) -> GitVerResult<T>
  where
    F: FnOnce() -> String;
}

impl<T, E> ResultExt<T> for Result<T, E>
where
  E: Into<GitVerError>,
{
  fn context(self, ctx: impl Into<String>) -> GitVerResult<T> {
    self.map_err(|e| e.into().context(ctx))
  }

  fn with_context<F>(self, f: F) -> GitVerResult<T>
  where
    F: FnOnce() -> String,
  {
    self.map_err(|e| e.into().context(f()))
  }
}

/// Pretty-print an error to stderr with help text
pub fn print_error(error: &GitVerError) {
  eprintln!("\nerror: {}\n", error);

  if let Some(help) = error.help_message() {
    eprintln!("help: {}\n", help);
  }
}
