use std::path::PathBuf;

use clap::Parser;

use crate::Commands;

/// Main CLI application arguments and command structure
#[derive(Parser)]
#[clap(
    name = "pim",
    version,
    about = "Personal information manager: notes, todos, events, logs and goals kept in typed groups"
)]
pub struct Cli {
    /// Path to the configuration file
    #[clap(short = 'c', long, value_parser)]
    pub config: Option<PathBuf>,

    /// Path to the groups directory, overriding the configuration
    #[clap(long, value_parser)]
    pub data_dir: Option<PathBuf>,

    /// Path to the archive directory, overriding the configuration
    #[clap(long, value_parser)]
    pub archive_dir: Option<PathBuf>,

    /// Verbose output mode
    #[clap(short, long)]
    pub verbose: bool,

    /// Subcommands for the pim application
    #[clap(subcommand)]
    pub command: Commands,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ArchiveCommand, GroupCommand, GroupType};

    #[test]
    fn parses_nested_commands() {
        let cli = Cli::parse_from([
            "pim", "--data-dir", "/tmp/pim", "group", "show", "-g", "todo", "Chores", "--json",
        ]);
        assert_eq!(cli.data_dir, Some(PathBuf::from("/tmp/pim")));
        match cli.command {
            Commands::Group(GroupCommand::Show { group, json, .. }) => {
                assert_eq!(group.group_type, GroupType::Todo);
                assert_eq!(group.name, "Chores");
                assert!(json);
            }
            _ => panic!("expected group show"),
        }
    }

    #[test]
    fn parses_archive_restore() {
        let cli = Cli::parse_from([
            "pim", "archive", "restore", "archive_20240101_120000.zip", "--force",
        ]);
        assert!(matches!(
            cli.command,
            Commands::Archive(ArchiveCommand::Restore { force: true, overwrite: false, .. })
        ));
    }

    #[test]
    fn both_parenthesizations_conflict() {
        let parsed = Cli::try_parse_from([
            "pim", "search", "a", "--term2", "b", "--term3", "c", "--group-first", "--group-last",
        ]);
        assert!(parsed.is_err());
    }
}
