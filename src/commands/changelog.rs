use std::io::{self, Write};

use gitver::{GitVerResult, GitVersion};

/// Print the changelog from `start` (or the detected branch point) to HEAD
pub fn run_changelog(version: &dyn GitVersion, start: Option<&str>, url: Option<&str>, plain_text: bool) -> GitVerResult<()> {
  let changelog = version.generate_changelog(start, url, plain_text)?;
  let mut stdout = io::stdout().lock();
  writeln!(stdout, "{}", changelog)?;
  stdout.flush()?;
  Ok(())
}
