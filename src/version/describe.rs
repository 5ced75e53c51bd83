//! Describe-style tag matching
//!
//! Emulates `git describe --tags --long` with a glob match set: the nearest
//! reachable tag whose name starts with the prefix followed by a digit, narrowed
//! by the user's filters.

use crate::core::error::{GitVerError, GitVerResult, ResultExt, VersionError};
use crate::core::vcs::GitRepo;
use git2::Oid;
use glob::Pattern;
use tracing::debug;

/// Hex digits kept in the describe string's `g<hash>` component
const DESCRIBE_ABBREV: usize = 7;

/// Compiled tag prefix plus inclusion/exclusion filters
#[derive(Debug, Clone)]
pub struct TagMatcher {
  base: Pattern,
  include: Vec<Pattern>,
  exclude: Vec<Pattern>,
}

impl TagMatcher {
  /// Filters starting with `!` exclude; the rest must all match
  pub fn new<S: AsRef<str>>(tag_prefix: &str, filters: &[S]) -> GitVerResult<Self> {
    let base = Pattern::new(&format!("{}[0-9]*", Pattern::escape(tag_prefix)))?;

    let mut include = Vec::new();
    let mut exclude = Vec::new();
    for filter in filters {
      let filter = filter.as_ref();
      match filter.strip_prefix('!') {
        Some(glob) => exclude.push(compile_filter(filter, glob)?),
        None => include.push(compile_filter(filter, filter)?),
      }
    }

    Ok(Self { base, include, exclude })
  }

  pub fn matches(&self, tag: &str) -> bool {
    self.base.matches(tag)
      && self.include.iter().all(|p| p.matches(tag))
      && !self.exclude.iter().any(|p| p.matches(tag))
  }
}

fn compile_filter(filter: &str, glob: &str) -> GitVerResult<Pattern> {
  // Tag names are flat strings, so `**` means the same as `*`
  let mut glob = glob.to_string();
  while glob.contains("**") {
    glob = glob.replace("**", "*");
  }

  Pattern::new(&glob).map_err(|e| {
    GitVerError::Version(VersionError::InvalidFilter {
      filter: filter.to_string(),
      reason: e.msg.to_string(),
    })
  })
}

/// Result of a describe match
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Describe {
  /// Full tag name, prefix included
  pub tag: String,
  /// Commits reachable from HEAD but not from the tag
  pub distance: usize,
  /// Abbreviated HEAD hash
  pub abbrev: String,
}

impl Describe {
  /// `<tag>-<distance>-g<abbrev>`
  pub fn describe_string(&self) -> String {
    format!("{}-{}-g{}", self.tag, self.distance, self.abbrev)
  }
}

/// Find the matching tag nearest to HEAD
///
/// Nearest means the smallest distance; ties go to the newer tagged commit and
/// then to the greater tag name.
pub fn describe(repo: &GitRepo, matcher: &TagMatcher) -> GitVerResult<Option<Describe>> {
  let head = repo.head_oid()?;

  let mut best: Option<(usize, i64, String)> = None;
  for tag in repo.tags().context("listing tags to describe HEAD")? {
    if !matcher.matches(&tag.name) {
      continue;
    }

    let oid = Oid::from_str(&tag.commit)?;
    if !repo.is_reachable(oid, head)? {
      continue;
    }

    let distance = repo.distance(oid, head)?;
    let time = repo.commit(oid)?.timestamp;
    let better = match &best {
      None => true,
      Some((d, t, name)) => distance.cmp(d).then(t.cmp(&time)).then(name.cmp(&tag.name)).is_lt(),
    };
    if better {
      best = Some((distance, time, tag.name));
    }
  }

  let head = head.to_string();
  let found = best.map(|(distance, _, tag)| Describe {
    tag,
    distance,
    abbrev: head[..DESCRIBE_ABBREV].to_string(),
  });
  debug!(describe = ?found.as_ref().map(Describe::describe_string), "describe match");
  Ok(found)
}

/// Split a describe string into `[tag, distance, hash]` at its last two hyphens
pub fn split_describe(describe: &str) -> Option<[&str; 3]> {
  let mut parts = describe.rsplitn(3, '-');
  let hash = parts.next()?;
  let distance = parts.next()?;
  let tag = parts.next()?;
  Some([tag, distance, hash])
}

/// Strip the tag prefix, then one leading `v` or `-` when a digit follows
pub fn bare_tag(tag: &str, tag_prefix: &str) -> String {
  let tag = tag.strip_prefix(tag_prefix).unwrap_or(tag);
  let mut chars = tag.chars();
  match (chars.next(), chars.next()) {
    (Some('v' | '-'), Some(next)) if next.is_ascii_digit() => tag[1..].to_string(),
    _ => tag.to_string(),
  }
}
