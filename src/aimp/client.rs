//! High-level AIMP client with property and command methods.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::RwLock;

use super::album_art::{fetch_album_art, AlbumArt};
use super::cli::{run_cli, CliCommand};
use super::error::AimpError;
use super::locator::{locate, locate_executable, resolve_executable};
use super::metadata::{decode_track_metadata, TrackMetadata};
use super::protocol::{Command, Endpoint, MessageKind, PlaybackState, PropertyId, PropertyRequest, Version};
use super::transport::Transport;
use crate::config::ClientConfig;

/// High-level AIMP client.
///
/// Every call is a single blocking round trip to the player window located at
/// construction. After AIMP restarts, call [`reconnect`](Self::reconnect).
pub struct AimpClient {
  transport: Arc<dyn Transport>,
  config: ClientConfig,
  endpoint: RwLock<Endpoint>,
}

impl AimpClient {
  /// Locate AIMP through `transport`.
  pub fn connect(transport: Arc<dyn Transport>, config: ClientConfig) -> Result<Self, AimpError> {
    let endpoint = locate(transport.as_ref(), &config.window_class)?;
    log::info!("AIMP client connected");
    Ok(Self {
      transport,
      config,
      endpoint: RwLock::new(endpoint),
    })
  }

  /// Locate AIMP through the native window messaging transport.
  #[cfg(windows)]
  pub fn connect_native(config: ClientConfig) -> Result<Self, AimpError> {
    Self::connect(Arc::new(super::win32::Win32Transport::new()), config)
  }

  /// Re-run the locator, e.g. after AIMP was restarted.
  pub fn reconnect(&self) -> Result<(), AimpError> {
    let endpoint = locate(self.transport.as_ref(), &self.config.window_class)?;
    *self.endpoint.write() = endpoint;
    log::info!("AIMP client reconnected");
    Ok(())
  }

  pub fn endpoint(&self) -> Endpoint {
    *self.endpoint.read()
  }

  pub fn config(&self) -> &ClientConfig {
    &self.config
  }

  fn send(&self, kind: MessageKind, wparam: usize, lparam: isize) -> isize {
    let endpoint = self.endpoint();
    let reply = self
      .transport
      .send_message(endpoint, kind.code(), wparam, lparam);
    log::debug!(
      "{:?} wparam={:#x} lparam={:#x} -> {}",
      kind,
      wparam,
      lparam,
      reply
    );
    reply
  }

  /// Read a raw property value.
  pub fn get_property(&self, id: PropertyId) -> isize {
    let (wparam, lparam) = PropertyRequest::Read(id).encode();
    self.send(MessageKind::Property, wparam, lparam)
  }

  /// Write a raw property value. Delivery is not confirmed by a read-back.
  pub fn set_property(&self, id: PropertyId, value: isize) {
    let (wparam, lparam) = PropertyRequest::Write(id, value).encode();
    self.send(MessageKind::Property, wparam, lparam);
  }

  /// Send a command. The meaning of the reply depends on the command.
  pub fn send_command(&self, command: Command, parameter: Option<isize>) -> isize {
    self.send(MessageKind::Command, command.code(), parameter.unwrap_or(0))
  }

  fn get_flag(&self, id: PropertyId) -> bool {
    self.get_property(id) != 0
  }

  fn set_flag(&self, id: PropertyId, value: bool) {
    self.set_property(id, isize::from(value));
  }

  fn get_u32(&self, id: PropertyId) -> u32 {
    let raw = self.get_property(id);
    match u32::try_from(raw) {
      Ok(value) => value,
      Err(_) => {
        log::debug!("{:?} reply {} is out of range, reading as 0", id, raw);
        0
      }
    }
  }

  /// Path of the AIMP executable, from config or from the running process.
  pub fn executable(&self) -> Result<PathBuf, AimpError> {
    match self.config.executable_path.as_deref() {
      Some(configured) => resolve_executable(configured),
      None => locate_executable(self.transport.as_ref(), self.endpoint()),
    }
  }

  // ---------------------------------------------------------------------------
  // Track info
  // ---------------------------------------------------------------------------

  /// Read the metadata of the current track from shared memory.
  pub fn read_track_metadata(&self) -> Result<TrackMetadata, AimpError> {
    let capacity = self.config.map_file_size;
    let raw = self
      .transport
      .read_shared_memory(&self.config.window_class, capacity)
      .ok_or(AimpError::MetadataUnavailable)?;
    decode_track_metadata(&raw, capacity)
  }

  /// Fetch the cover of the current track, waiting at most the configured timeout.
  pub async fn fetch_album_art(&self) -> Result<AlbumArt, AimpError> {
    self.fetch_album_art_within(self.config.album_art_timeout()).await
  }

  pub async fn fetch_album_art_within(&self, timeout: Duration) -> Result<AlbumArt, AimpError> {
    fetch_album_art(self.transport.clone(), self.endpoint(), timeout).await
  }

  // ---------------------------------------------------------------------------
  // Properties
  // ---------------------------------------------------------------------------

  /// AIMP version, or None if the player does not report one.
  pub fn version(&self) -> Option<Version> {
    Version::from_raw(self.get_property(PropertyId::Version))
  }

  /// Elapsed time in the current track, in milliseconds.
  pub fn position(&self) -> u32 {
    self.get_u32(PropertyId::PlayerPosition)
  }

  pub fn set_position(&self, position_ms: u32) {
    self.set_property(PropertyId::PlayerPosition, position_ms as isize);
  }

  /// Duration of the current track, in milliseconds.
  pub fn duration(&self) -> u32 {
    self.get_u32(PropertyId::PlayerDuration)
  }

  pub fn playback_state(&self) -> PlaybackState {
    PlaybackState::from_raw(self.get_property(PropertyId::PlayerState))
  }

  /// Volume in percent.
  pub fn volume(&self) -> u32 {
    self.get_u32(PropertyId::Volume)
  }

  pub fn set_volume(&self, volume: u32) {
    self.set_property(PropertyId::Volume, volume as isize);
  }

  pub fn is_muted(&self) -> bool {
    self.get_flag(PropertyId::Mute)
  }

  pub fn set_muted(&self, muted: bool) {
    self.set_flag(PropertyId::Mute, muted);
  }

  pub fn is_track_repeated(&self) -> bool {
    self.get_flag(PropertyId::TrackRepeat)
  }

  pub fn set_track_repeated(&self, repeat: bool) {
    self.set_flag(PropertyId::TrackRepeat, repeat);
  }

  pub fn is_shuffled(&self) -> bool {
    self.get_flag(PropertyId::TrackShuffle)
  }

  pub fn set_shuffled(&self, shuffled: bool) {
    self.set_flag(PropertyId::TrackShuffle, shuffled);
  }

  /// Radio capture state.
  pub fn is_recording(&self) -> bool {
    self.get_flag(PropertyId::RadioCapture)
  }

  pub fn set_recording(&self, recording: bool) {
    self.set_flag(PropertyId::RadioCapture, recording);
  }

  pub fn is_visualization_fullscreen(&self) -> bool {
    self.get_flag(PropertyId::VisualFullscreen)
  }

  pub fn set_visualization_fullscreen(&self, fullscreen: bool) {
    self.set_flag(PropertyId::VisualFullscreen, fullscreen);
  }

  // ---------------------------------------------------------------------------
  // Commands
  // ---------------------------------------------------------------------------

  /// Start playback, resume if paused, or restart the track if playing.
  pub fn play(&self) {
    self.send_command(Command::Play, None);
  }

  pub fn play_pause(&self) {
    self.send_command(Command::PlayPause, None);
  }

  /// Pause if playing, resume if paused.
  pub fn pause(&self) {
    self.send_command(Command::Pause, None);
  }

  pub fn stop(&self) {
    self.send_command(Command::Stop, None);
  }

  pub fn next(&self) {
    self.send_command(Command::Next, None);
  }

  pub fn prev(&self) {
    self.send_command(Command::Prev, None);
  }

  pub fn next_visualization(&self) {
    self.send_command(Command::VisualNext, None);
  }

  pub fn prev_visualization(&self) {
    self.send_command(Command::VisualPrev, None);
  }

  pub fn start_visualization(&self) {
    self.send_command(Command::VisualStart, None);
  }

  pub fn stop_visualization(&self) {
    self.send_command(Command::VisualStop, None);
  }

  /// Shut AIMP down. The client needs a [`reconnect`](Self::reconnect) afterwards.
  pub fn quit(&self) {
    self.send_command(Command::Quit, None);
  }

  pub fn add_files_dialog(&self) {
    self.send_command(Command::AddFiles, None);
  }

  pub fn add_folders_dialog(&self) {
    self.send_command(Command::AddFolders, None);
  }

  pub fn add_playlists_dialog(&self) {
    self.send_command(Command::AddPlaylists, None);
  }

  pub fn add_url_dialog(&self) {
    self.send_command(Command::AddUrl, None);
  }

  pub fn open_files_dialog(&self) {
    self.send_command(Command::OpenFiles, None);
  }

  pub fn open_folders_dialog(&self) {
    self.send_command(Command::OpenFolders, None);
  }

  pub fn open_playlists_dialog(&self) {
    self.send_command(Command::OpenPlaylists, None);
  }

  // ---------------------------------------------------------------------------
  // Command-line pass-through
  // ---------------------------------------------------------------------------

  pub fn run_cli(&self, command: CliCommand, argument: &str) -> Result<(), AimpError> {
    run_cli(&self.executable()?, command, argument)
  }

  /// Add a playlist, folder or file to a playlist and start playing.
  pub fn add_to_playlist_and_play(&self, path: &str) -> Result<(), AimpError> {
    self.run_cli(CliCommand::AddPlay, path)
  }

  pub fn add_to_bookmarks(&self, path: &str) -> Result<(), AimpError> {
    self.run_cli(CliCommand::Bookmark, path)
  }

  pub fn add_dirs_to_playlist(&self, dir: &str) -> Result<(), AimpError> {
    self.run_cli(CliCommand::Dir, dir)
  }

  pub fn add_files_to_playlist(&self, file: &str) -> Result<(), AimpError> {
    self.run_cli(CliCommand::File, file)
  }

  pub fn add_to_active_playlist(&self, path: &str) -> Result<(), AimpError> {
    self.run_cli(CliCommand::Insert, path)
  }

  /// Add to the active playlist and put it in the custom playback queue.
  pub fn queue_in_active_playlist(&self, path: &str) -> Result<(), AimpError> {
    self.run_cli(CliCommand::Queue, path)
  }
}
