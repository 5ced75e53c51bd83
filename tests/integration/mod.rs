mod test_changelog;
mod test_cli;
mod test_version;
