//! CLI command bodies
//!
//! - **version**: print the version string or the JSON hand-off record
//! - **changelog**: print the changelog
//!
//! All commands take the built `GitVersion` session and write to stdout only.

pub mod changelog;
pub mod version;

pub use changelog::run_changelog;
pub use version::run_version;
