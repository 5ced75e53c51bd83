//! Changelog text rendering

use super::versions::VersionMaps;
use crate::core::vcs::CommitInfo;
use regex::Regex;
use std::collections::HashMap;
use std::fmt::Write;
use std::sync::LazyLock;

static PULL_REQUEST: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\(#([0-9]+)\)").expect("valid regex"));

/// Everything needed to render one changelog
pub struct ChangelogView<'a> {
  /// Header name: the short branch, or the end hash when detached
  pub branch: &'a str,
  pub start: &'a str,
  pub end: &'a str,
  /// Browsable project URL; links are omitted without one
  pub url: Option<&'a str>,
  pub plain_text: bool,
  /// Walked commits, newest first
  pub commits: &'a [CommitInfo],
  /// Commit hash → tag name
  pub tags: &'a HashMap<String, String>,
  pub versions: &'a VersionMaps,
}

impl ChangelogView<'_> {
  pub fn render(&self) -> String {
    let widths = self.versions.widths();
    let mut out = self.header();

    let mut section: Option<&str> = None;
    for commit in self.commits {
      let primary = self.versions.primary.get(&commit.sha).map(String::as_str);
      if self.plain_text
        && primary != section
        && let Some(version) = primary
      {
        let _ = writeln!(out, "{}\n{}", version, "=".repeat(version.chars().count()));
      }
      section = primary;

      let width = primary.and_then(|p| widths.get(p)).copied().unwrap_or(0);
      out.push_str(&self.entry(commit, width));
      out.push('\n');
      // a tagged entry closes its release
      if self.plain_text && self.tags.contains_key(&commit.sha) {
        out.push('\n');
      }
    }
    out
  }

  fn header(&self) -> String {
    if self.plain_text {
      return format!("{} Changelog\n", self.branch);
    }
    match self.url {
      Some(url) => format!(
        "### [{} Changelog]({}/compare/{}...{})\n",
        self.branch, url, self.start, self.end
      ),
      None => format!("### {} Changelog\n", self.branch),
    }
  }

  fn entry(&self, commit: &CommitInfo, width: usize) -> String {
    let mut header = String::from(" - ");
    if let Some(label) = self.versions.labels.get(&commit.sha) {
      let padded = format!("{:<width$}", label, width = width);
      match (self.tags.get(&commit.sha), self.url) {
        (Some(tag), Some(url)) if !self.plain_text => {
          let _ = write!(header, "[{}]({}/tree/{})", padded, url, tag);
        }
        _ => header.push_str(&padded),
      }
    }

    let indent = format!("\n{}", " ".repeat(header.chars().count() + 1));
    let mut subject = process_commit_body(&commit.message);
    if !self.plain_text
      && let Some(url) = self.url
    {
      subject = link_pull_requests(&subject, url);
    }

    format!("{} {}", header, subject.replace('\n', &indent))
  }
}

/// Drop `Signed-off-by:` trailers and blank lines
pub fn process_commit_body(message: &str) -> String {
  message
    .trim()
    .lines()
    .filter(|line| !line.starts_with("Signed-off-by: ") && !line.trim().is_empty())
    .collect::<Vec<_>>()
    .join("\n")
    .trim()
    .to_string()
}

/// `(#12)` → `([#12](<url>/pull/12))`
pub fn link_pull_requests(subject: &str, url: &str) -> String {
  PULL_REQUEST
    .replace_all(subject, |caps: &regex::Captures<'_>| {
      format!("([#{n}]({url}/pull/{n}))", n = &caps[1], url = url)
    })
    .into_owned()
}
