//! Changelog generation against real repositories

use crate::helpers::*;
use anyhow::Result;
use gitver::GitVersionBuilder;

/// c1 c2 c3(1.0) c4 c5(1.1) c6 c7
fn released_repo() -> Result<(TestRepo, Vec<String>)> {
  let repo = TestRepo::new()?;
  let mut shas = Vec::new();
  for n in 1..=7 {
    shas.push(repo.change("CHANGES.txt", &format!("c{}", n))?);
    match n {
      3 => repo.tag("1.0")?,
      5 => repo.tag("1.1")?,
      _ => {}
    }
  }
  Ok((repo, shas))
}

#[test]
fn test_plain_text_release_sections() -> Result<()> {
  let (repo, _) = released_repo()?;

  let changelog = repo.version("")?.generate_changelog(None, None, true)?;
  let expected = "main Changelog\n\
                  1.1\n\
                  ===\n \
                  - 1.1.2 c7\n \
                  - 1.1.1 c6\n \
                  - 1.1.0 c5\n\
                  \n\
                  1.0\n\
                  ===\n \
                  - 1.0.1 c4\n \
                  - 1.0.0 c3\n\
                  \n\
                  1.0-pre\n\
                  =======\n \
                  - 1.0-pre-2 c2\n \
                  - 1.0-pre-1 c1\n";
  assert_eq!(changelog, expected);

  Ok(())
}

#[test]
fn test_labels_match_checked_out_versions() -> Result<()> {
  let (repo, shas) = released_repo()?;

  let changelog = repo.version("")?.generate_changelog(None, None, true)?;
  let labels: Vec<(String, String)> = changelog
    .lines()
    .filter_map(|line| line.strip_prefix(" - "))
    .filter_map(|entry| {
      let mut parts = entry.split_whitespace();
      Some((parts.next()?.to_string(), parts.next()?.to_string()))
    })
    .collect();

  // c1 and c2 predate every tag and have no version of their own
  for (n, sha) in shas.iter().enumerate().skip(2) {
    git(&repo.path, &["checkout", "--detach", sha])?;
    let subject = format!("c{}", n + 1);
    let label = labels
      .iter()
      .find(|(_, s)| *s == subject)
      .map(|(label, _)| label.as_str());
    assert_eq!(label, Some(repo.version("")?.tag_offset()?.as_str()), "{}", subject);
  }

  git(&repo.path, &["checkout", "--detach", &shas[2]])?;
  assert_eq!(repo.version("")?.tag_offset()?, "1.0.0");
  git(&repo.path, &["checkout", "--detach", &shas[3]])?;
  assert_eq!(repo.version("")?.tag_offset()?, "1.0.1");
  assert!(changelog.contains(" - 1.0.0 c3\n"));
  assert!(changelog.contains(" - 1.0.1 c4\n"));

  Ok(())
}

#[test]
fn test_changelog_is_deterministic() -> Result<()> {
  let (repo, _) = released_repo()?;

  let version = repo.version("")?;
  let first = version.generate_changelog(None, None, false)?;
  let second = version.generate_changelog(None, None, false)?;
  assert_eq!(first, second);
  assert_eq!(first, repo.version("")?.generate_changelog(None, None, false)?);

  Ok(())
}

#[test]
fn test_start_from_tag() -> Result<()> {
  let (repo, _) = released_repo()?;

  let changelog = repo.version("")?.generate_changelog(Some("1.0"), None, true)?;
  assert!(changelog.contains(" - 1.0.0 c3\n"));
  assert!(changelog.contains(" - 1.1.0 c5\n"));
  assert!(changelog.contains(" - 1.1.2 c7\n"));
  assert!(!changelog.contains("c2"));
  assert!(!changelog.contains("c1"));

  Ok(())
}

#[test]
fn test_start_from_revision() -> Result<()> {
  let (repo, shas) = released_repo()?;

  let changelog = repo.version("")?.generate_changelog(Some(&shas[5]), None, true)?;
  let entries: Vec<&str> = changelog.lines().filter(|l| l.starts_with(" - ")).collect();
  assert_eq!(entries, [" - 0.0-pre-2 c7", " - 0.0-pre-1 c6"]);

  Ok(())
}

#[test]
fn test_untagged_history() -> Result<()> {
  let repo = TestRepo::new()?;
  repo.change("README.md", "First")?;
  repo.change("README.md", "Second")?;

  let changelog = repo.version("")?.generate_changelog(None, None, true)?;
  assert_eq!(
    changelog,
    "main Changelog\n0.0-pre\n=======\n - 0.0-pre-2 Second\n - 0.0-pre-1 First\n"
  );

  Ok(())
}

#[test]
fn test_markup_links_from_remote() -> Result<()> {
  let (repo, shas) = released_repo()?;
  repo.add_remote("origin", "git@github.com:Org/Repo.git")?;
  repo.change("CHANGES.txt", "Fix crash (#12)")?;
  let head = repo.head()?;

  let version = repo.version("")?;
  assert_eq!(version.url()?.as_deref(), Some("https://github.com/Org/Repo"));

  let changelog = version.generate_changelog(None, None, false)?;
  let lines: Vec<&str> = changelog.lines().collect();
  assert_eq!(
    lines[0],
    format!("### [main Changelog](https://github.com/Org/Repo/compare/{}...{})", shas[0], head)
  );
  assert_eq!(
    lines[1],
    " - 1.1.3 Fix crash ([#12](https://github.com/Org/Repo/pull/12))"
  );
  assert!(lines.contains(&" - [1.1.0](https://github.com/Org/Repo/tree/1.1) c5"));
  assert!(lines.contains(&" - [1.0.0](https://github.com/Org/Repo/tree/1.0) c3"));
  assert!(lines.contains(&" - 1.0-pre-2 c2"));
  assert!(!changelog.contains("\n1.0\n"));

  Ok(())
}

#[test]
fn test_explicit_url_overrides_remote() -> Result<()> {
  let (repo, _) = released_repo()?;
  repo.add_remote("origin", "git@github.com:Org/Repo.git")?;

  let changelog = repo
    .version("")?
    .generate_changelog(None, Some("https://example.com/mirror"), false)?;
  assert!(changelog.contains("(https://example.com/mirror/tree/1.1)"));
  assert!(!changelog.contains("github.com"));

  Ok(())
}

#[test]
fn test_detached_head_uses_hash_as_name() -> Result<()> {
  let (repo, shas) = released_repo()?;
  git(&repo.path, &["checkout", "--detach"])?;

  let changelog = repo.version("")?.generate_changelog(None, None, true)?;
  assert!(changelog.starts_with(&format!("{} Changelog\n", shas[6])));

  Ok(())
}

#[test]
fn test_branch_starts_at_remote_merge_base() -> Result<()> {
  let (repo, shas) = released_repo()?;
  git(&repo.path, &["update-ref", "refs/remotes/origin/main", &shas[4]])?;
  repo.checkout_new_branch("feature")?;
  repo.change("CHANGES.txt", "Feature work")?;

  let changelog = repo.version("")?.generate_changelog(None, None, true)?;
  assert!(changelog.starts_with("feature Changelog\n"));
  assert!(changelog.contains(" - 1.1.0 c5\n"));
  assert!(changelog.contains(" - 1.1.1 Feature work\n"));
  assert!(!changelog.contains("c4"));

  Ok(())
}

#[test]
fn test_path_scoped_changelog_keeps_tags() -> Result<()> {
  let repo = TestRepo::new()?;
  repo.write(".gitversion.toml", "[sub]\n")?;
  repo.write("sub/lib.txt", "sub\n")?;
  repo.change("root.txt", "Initial commit")?;
  repo.change("root.txt", "Root change")?;
  repo.change("sub/lib.txt", "Sub release")?;
  repo.tag("1.0")?;
  repo.change("sub/lib.txt", "Sub only")?;
  repo.change("root.txt", "Root after release")?;

  // The root project excludes sub/, but the tagged commit still opens its window
  let changelog = repo.version("")?.generate_changelog(None, None, true)?;
  assert!(changelog.contains(" - 1.0.1 Root after release\n"));
  assert!(changelog.contains(" - 1.0.0 Sub release\n\n"));
  assert!(changelog.contains(" - 1.0-pre-2 Root change\n"));
  assert!(changelog.contains(" - 1.0-pre-1 Initial commit\n"));
  assert!(!changelog.contains("Sub only"));

  Ok(())
}

#[test]
fn test_lenient_changelog_without_repository() -> Result<()> {
  let dir = tempfile::TempDir::new()?;

  let version = GitVersionBuilder::new().root(dir.path()).strict(false).build()?;
  assert!(version.generate_changelog(None, None, true).is_err());

  Ok(())
}
