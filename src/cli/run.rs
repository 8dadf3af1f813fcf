//! Dispatch a parsed command to its handler.

use anyhow::{Result, bail};

use super::{
    args::{Arguments, Command},
    commands::{check::check, init::init, rename::rename},
    exit_status::ExitStatus,
};

pub fn run(Arguments { command }: Arguments) -> Result<ExitStatus> {
    match command {
        Some(Command::Check(cmd)) => check(cmd),
        Some(Command::Rename(cmd)) => rename(cmd),
        Some(Command::Init) => init(),
        None => bail!("No command provided. Use --help to see available commands."),
    }
}
