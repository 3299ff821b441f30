//! AIMP remote control module - drives a running AIMP through its remote access API.
//!
//! Architecture:
//! - `protocol.rs` - Message, property and command codes; reply decoding
//! - `transport.rs` - OS messaging seam (`win32.rs` is the native implementation)
//! - `locator.rs` - AIMP window and executable discovery
//! - `metadata.rs` - Shared memory track info decoding
//! - `album_art.rs` - Album art listener handshake
//! - `cli.rs` - `AIMP.exe` command-line pass-through
//! - `client.rs` - High-level client with property and command methods

mod album_art;
mod cli;
mod client;
mod error;
mod locator;
mod metadata;
mod protocol;
mod transport;

#[cfg(test)]
mod testing;
#[cfg(windows)]
mod win32;

pub use album_art::{fetch_album_art, AlbumArt};
pub use cli::{run_cli, CliCommand};
pub use client::AimpClient;
pub use error::AimpError;
pub use locator::{locate, locate_executable, resolve_executable};
pub use metadata::{decode_track_metadata, TrackMetadata, HEADER_LEN};
pub use protocol::{
  Command, Endpoint, MessageKind, Payload, PlaybackState, PropertyId, PropertyRequest, Version,
  ALBUM_ART_MAGIC, REMOTE_CLASS, REMOTE_MAP_FILE_SIZE,
};
pub use transport::Transport;
#[cfg(windows)]
pub use win32::Win32Transport;
