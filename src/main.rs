mod commands;

use std::path::PathBuf;

use clap::Parser;
use gitver::core::error::print_error;
use gitver::{GitVerError, GitVersionBuilder};
use tracing_subscriber::EnvFilter;

/// Derive versions and changelogs from git history
#[derive(Parser)]
#[command(name = "gitver")]
#[command(version, about, long_about = None)]
#[command(styles = get_styles())]
struct Cli {
  /// Project directory (default: the current directory)
  #[arg(long, value_name = "DIR")]
  project_dir: Option<PathBuf>,

  /// Repository root, ideally containing .git (default: found from the project directory)
  #[arg(long, value_name = "DIR")]
  root_dir: Option<PathBuf>,

  /// Git directory (default: <root>/.git)
  #[arg(long, value_name = "DIR")]
  git_dir: Option<PathBuf>,

  /// Config file (default: .gitversion.toml or .gitversion in the root)
  #[arg(long, value_name = "FILE")]
  config_file: Option<PathBuf>,

  /// Keep going on errors, printing placeholder versions and empty changelogs
  #[arg(long)]
  disable_strict: bool,

  /// Log filter for stderr diagnostics (e.g. debug, gitver=trace)
  #[arg(long, env = "GITVER_LOG", default_value = "warn")]
  log_level: String,

  /// Print the version info as JSON
  #[arg(long, conflicts_with = "changelog")]
  json: bool,

  /// Generate a changelog instead of a version
  #[arg(long)]
  changelog: bool,

  /// Tag or revision the changelog starts from
  #[arg(long, value_name = "REF", requires = "changelog")]
  start: Option<String>,

  /// Project URL used for changelog links (default: derived from the remote)
  #[arg(long, requires = "changelog")]
  url: Option<String>,

  /// Plain text changelog instead of Markdown
  #[arg(long, requires = "changelog")]
  plain_text: bool,
}

fn get_styles() -> clap::builder::Styles {
  clap::builder::Styles::styled()
    .usage(
      anstyle::Style::new()
        .bold()
        .underline()
        .fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Yellow))),
    )
    .header(
      anstyle::Style::new()
        .bold()
        .underline()
        .fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Yellow))),
    )
    .literal(anstyle::Style::new().fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Green))))
    .invalid(
      anstyle::Style::new()
        .bold()
        .fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Red))),
    )
    .error(
      anstyle::Style::new()
        .bold()
        .fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Red))),
    )
    .valid(
      anstyle::Style::new()
        .bold()
        .underline()
        .fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Green))),
    )
    .placeholder(anstyle::Style::new().fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::White))))
}

/// Diagnostics go to stderr so stdout stays machine-readable
fn init_logging(level: &str) {
  let filter = EnvFilter::try_new(level).unwrap_or_else(|_| EnvFilter::new("warn"));
  tracing_subscriber::fmt()
    .with_env_filter(filter)
    .with_target(false)
    .with_writer(std::io::stderr)
    .init();
}

fn main() {
  let cli = Cli::parse();
  init_logging(&cli.log_level);

  let mut builder = GitVersionBuilder::new().strict(!cli.disable_strict);
  if let Some(git_dir) = cli.git_dir {
    builder = builder.git_dir(git_dir);
  }
  if let Some(root) = cli.root_dir.as_ref() {
    builder = builder.root(root);
  }
  match cli.project_dir {
    Some(project) => builder = builder.project(project),
    None if cli.root_dir.is_none() => builder = builder.project("."),
    None => {}
  }
  if let Some(config_file) = cli.config_file {
    builder = builder.config_file(config_file);
  }

  let version = match builder.build() {
    Ok(version) => version,
    Err(e) => handle_error(e),
  };

  let result = if cli.changelog {
    commands::run_changelog(version.as_ref(), cli.start.as_deref(), cli.url.as_deref(), cli.plain_text)
  } else {
    commands::run_version(version.as_ref(), cli.json)
  };
  version.close();

  if let Err(err) = result {
    handle_error(err);
  }
}

fn handle_error(err: GitVerError) -> ! {
  print_error(&err);
  std::process::exit(err.exit_code().as_i32());
}
