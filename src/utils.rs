//! Utility functions for cross-platform path handling and remote URLs

use std::path::Path;

/// Convert a path to Git format (always forward slashes)
///
/// Git expects paths with forward slashes, even on Windows.
pub fn path_to_git_format(path: &Path) -> String {
  #[cfg(target_os = "windows")]
  {
    path.to_string_lossy().replace('\\', "/")
  }
  #[cfg(not(target_os = "windows"))]
  {
    path.to_string_lossy().to_string()
  }
}

/// Path of `path` relative to `base` in Git format
///
/// Equal paths give `""`. Paths outside `base` start with `..`.
pub fn relative_path(base: &Path, path: &Path) -> String {
  if base == path {
    return String::new();
  }

  match pathdiff::diff_paths(path, base) {
    Some(relative) => path_to_git_format(&relative),
    None => path_to_git_format(path),
  }
}

/// Normalize a remote URL into a browsable `https://` project URL
///
/// - strips a trailing `/` and `.git`
/// - removes credentials from http(s) URLs
/// - rewrites `ssh://[user@]host[:port]/path` and `user@host:path` to `https://host/path`
///
/// Anything else (local paths, `file://`) is returned with only the suffix cleanup.
pub fn normalize_remote_url(url: &str) -> String {
  let url = url.trim().trim_end_matches('/');
  let url = url.strip_suffix(".git").unwrap_or(url).trim_end_matches('/');

  if let Some(rest) = url.strip_prefix("ssh://") {
    let (authority, path) = rest.split_once('/').unwrap_or((rest, ""));
    let host = strip_port(strip_user(authority));
    return join_https(host, path);
  }

  for scheme in ["https://", "http://"] {
    if let Some(rest) = url.strip_prefix(scheme) {
      let (authority, path) = rest.split_once('/').unwrap_or((rest, ""));
      let host = strip_user(authority);
      return if path.is_empty() {
        format!("{}{}", scheme, host)
      } else {
        format!("{}{}/{}", scheme, host, path)
      };
    }
  }

  // scp-like syntax: [user@]host:path
  if !url.contains("://")
    && let Some((authority, path)) = url.split_once(':')
    && !authority.contains('/')
    && !authority.is_empty()
    && !is_drive_letter(authority)
  {
    return join_https(strip_user(authority), path);
  }

  url.to_string()
}

fn strip_user(authority: &str) -> &str {
  authority.rsplit_once('@').map_or(authority, |(_, host)| host)
}

fn strip_port(host: &str) -> &str {
  match host.rsplit_once(':') {
    Some((name, port)) if port.chars().all(|c| c.is_ascii_digit()) => name,
    _ => host,
  }
}

fn is_drive_letter(authority: &str) -> bool {
  authority.len() == 1 && authority.bytes().all(|b| b.is_ascii_alphabetic())
}

fn join_https(host: &str, path: &str) -> String {
  let path = path.trim_start_matches('/');
  if path.is_empty() {
    format!("https://{}", host)
  } else {
    format!("https://{}/{}", host, path)
  }
}
