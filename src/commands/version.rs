use std::io::{self, Write};

use gitver::{GitVerResult, GitVersion};

/// Print `<tag>.<offset>`, or the flat output record as JSON
///
/// The plain version is printed without a trailing newline so it can be
/// captured directly by build scripts.
pub fn run_version(version: &dyn GitVersion, json: bool) -> GitVerResult<()> {
  let mut stdout = io::stdout().lock();
  if json {
    writeln!(stdout, "{}", version.to_json()?)?;
  } else {
    write!(stdout, "{}", version.tag_offset()?)?;
  }
  stdout.flush()?;
  Ok(())
}
