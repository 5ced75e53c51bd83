//! Building blocks shared by every gitver operation
//!
//! - **config**: `.gitversion.toml` parsing, validation and per-project lookup
//! - **error**: error types with contextual help messages and exit codes
//! - **vcs**: git access over libgit2 (commits, tags, ranges, path filtering)

pub mod config;
pub mod error;
pub mod vcs;
