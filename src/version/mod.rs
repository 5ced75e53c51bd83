//! Version resolution
//!
//! - **tags**: commit↔tag maps
//! - **describe**: describe-style tag matching, describe-string splitting, bare tags
//! - **info**: the `Info` record and the version strings derived from it
//! - **resolver**: `Info` computation with path-scoped offsets
//! - **subprojects**: subproject directories and their relative paths

mod describe;
mod info;
mod resolver;
mod subprojects;
mod tags;

pub use describe::{Describe, TagMatcher, bare_tag, describe, split_describe};
pub use info::{DEFAULT_ALLOWED_BRANCHES, Info, version_friendly_branch};
pub use resolver::{VersionQuery, commit_offset, resolve_info};
pub use subprojects::{resolve_subprojects, subproject_paths};
pub use tags::{commit_to_tag, commit_to_tag_preferring, tag_to_commit};
