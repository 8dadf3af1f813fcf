//! CLI argument definitions using clap.
//!
//! ## Commands
//!
//! - `check`: Report catalog errors, undefined and unused keys, missing translations
//! - `rename`: Rename a key across code and catalogs
//! - `init`: Initialize a locsync configuration file

use std::path::PathBuf;

use clap::{Args, CommandFactory, Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(author, version, about, long_about = None)]
pub struct Arguments {
    #[command(subcommand)]
    pub command: Option<Command>,
}

impl Arguments {
    /// Check if a command was provided, otherwise print help and return None.
    pub fn with_command_or_help(self) -> Option<Self> {
        if self.command.is_none() {
            Self::command().print_help().ok();
            None
        } else {
            Some(self)
        }
    }

    /// Get the verbose flag from the command's common args.
    pub fn verbose(&self) -> bool {
        match &self.command {
            Some(Command::Check(cmd)) => cmd.common.verbose,
            Some(Command::Rename(cmd)) => cmd.common.verbose,
            Some(Command::Init) | None => false,
        }
    }
}

/// Common arguments shared by all commands.
#[derive(Debug, Clone, Default, Args)]
pub struct CommonArgs {
    /// Project root directory (defaults to the current directory)
    #[arg(long, env = "LOCSYNC_SOURCE_ROOT")]
    pub source_root: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long)]
    pub verbose: bool,
}

#[derive(Debug, Args)]
pub struct CheckCommand {
    #[command(flatten)]
    pub common: CommonArgs,
}

#[derive(Debug, Args)]
pub struct RenameCommand {
    /// Key to rename
    pub old: String,

    /// New key name
    pub new: String,

    #[command(flatten)]
    pub common: CommonArgs,

    /// Actually write the edits (default is dry-run)
    #[arg(long)]
    pub apply: bool,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Check catalogs against code (undefined keys, unused keys, missing translations)
    Check(CheckCommand),
    /// Rename a localization key in code and catalogs
    Rename(RenameCommand),
    /// Initialize a new .locsyncrc.json configuration file
    Init,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_rename() {
        let args = Arguments::try_parse_from(["locsync", "rename", "old", "new", "--apply", "-v"])
            .unwrap();
        assert!(args.verbose());
        match args.command {
            Some(Command::Rename(cmd)) => {
                assert_eq!(cmd.old, "old");
                assert_eq!(cmd.new, "new");
                assert!(cmd.apply);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_parse_check_with_root() {
        let args =
            Arguments::try_parse_from(["locsync", "check", "--source-root", "proj"]).unwrap();
        match args.command {
            Some(Command::Check(cmd)) => {
                assert_eq!(cmd.common.source_root, Some(PathBuf::from("proj")));
                assert!(!cmd.common.verbose);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_verify_cli() {
        Arguments::command().debug_assert();
    }
}
