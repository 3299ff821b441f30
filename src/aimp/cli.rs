//! Pass-through to the AIMP executable's command-line switches.

use std::path::Path;
use std::process::{Command, Stdio};

use super::error::AimpError;

/// Command-line switches accepted by `AIMP.exe`, each taking one path or URL.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CliCommand {
  /// Add to a playlist and start playing.
  AddPlay,
  /// Add files and/or folders to bookmarks.
  Bookmark,
  /// Add folder(s) to the playlist.
  Dir,
  /// Add file(s) to the playlist.
  File,
  /// Add to the active playlist.
  Insert,
  /// Add to the active playlist and the playback queue.
  Queue,
}

impl CliCommand {
  pub fn name(self) -> &'static str {
    match self {
      CliCommand::AddPlay => "ADD_PLAY",
      CliCommand::Bookmark => "BOOKMARK",
      CliCommand::Dir => "DIR",
      CliCommand::File => "FILE",
      CliCommand::Insert => "INSERT",
      CliCommand::Queue => "QUEUE",
    }
  }

  pub fn flag(self) -> String {
    format!("/{}", self.name())
  }

  /// Parse a kebab-case or switch name (`add-play`, `ADD_PLAY`, `/add_play`).
  pub fn parse(name: &str) -> Option<Self> {
    let normalized = name.trim_start_matches('/').replace('-', "_").to_uppercase();
    [
      CliCommand::AddPlay,
      CliCommand::Bookmark,
      CliCommand::Dir,
      CliCommand::File,
      CliCommand::Insert,
      CliCommand::Queue,
    ]
    .into_iter()
    .find(|cmd| cmd.name() == normalized)
  }
}

/// Run `executable /<COMMAND> <argument>` and wait for it to exit.
pub fn run_cli(executable: &Path, command: CliCommand, argument: &str) -> Result<(), AimpError> {
  log::info!("Running {:?} {} {}", executable, command.flag(), argument);

  let status = Command::new(executable)
    .arg(command.flag())
    .arg(argument)
    .stdin(Stdio::null())
    .status()?;

  if !status.success() {
    log::error!("{} exited with {}", command.flag(), status);
    return Err(AimpError::ExternalProcessFailed {
      command: command.name().to_string(),
      status,
    });
  }

  Ok(())
}
