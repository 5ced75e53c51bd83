//! Versions and changelogs derived from git history
//!
//! A `GitVersion` session answers "what version is this project at?" for a
//! project directory inside a repository, possibly one of several projects
//! sharing that repository. The version is the nearest matching tag plus the
//! number of commits since it that touch the project, and the changelog groups
//! commit messages by the release they shipped in.
//!
//! ```no_run
//! use gitver::{GitVersion, GitVersionBuilder};
//!
//! let version = GitVersionBuilder::new().project("libs/a").build()?;
//! println!("{}", version.tag_offset()?);
//! # Ok::<(), gitver::GitVerError>(())
//! ```

pub mod changelog;
pub mod core;
pub mod session;
pub mod utils;
pub mod version;

pub use core::config::{GitVersionConfig, ProjectConfig};
pub use core::error::{ExitCode, GitVerError, GitVerResult};
pub use session::{GitVersion, GitVersionBuilder, Output};
pub use version::Info;
