//! AIMP remote control error types.

use std::process::ExitStatus;

use thiserror::Error;

/// Errors that can occur when talking to AIMP.
#[derive(Debug, Error)]
pub enum AimpError {
  #[error("AIMP is not running")]
  NotRunning,

  #[error("AIMP executable path could not be resolved")]
  ExecutableNotFound,

  #[error("Track metadata is unavailable")]
  MetadataUnavailable,

  #[error("Track metadata is corrupt: {0}")]
  MetadataCorrupt(String),

  #[error("Unexpected payload tag: {0:#010x}")]
  UnexpectedPayload(usize),

  #[error("AIMP command /{command} failed with {status}")]
  ExternalProcessFailed { command: String, status: ExitStatus },

  #[error("Failed to spawn AIMP: {0}")]
  Spawn(#[from] std::io::Error),

  #[error("AIMP refused to deliver album art")]
  AlbumArtRejected,

  #[error("Timed out waiting for album art")]
  AlbumArtTimeout,

  #[error("Album art listener failed: {0}")]
  ListenerFailed(String),
}
