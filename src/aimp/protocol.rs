//! AIMP remote access protocol types.
//!
//! Everything the player understands arrives as a window message carrying two
//! integer parameters. Properties and commands are small closed enumerations
//! with fixed codes; the read/write direction of a property request is a bit
//! OR-ed into the property code and only exists on the wire.

use std::fmt;
use std::num::NonZeroIsize;

/// Window class (and shared memory name) published by AIMP.
pub const REMOTE_CLASS: &str = "AIMP2_RemoteInfo";

/// Size of the shared memory segment holding the current track info.
pub const REMOTE_MAP_FILE_SIZE: usize = 2048;

/// `dwData` tag of a `WM_COPYDATA` block carrying album art.
pub const ALBUM_ART_MAGIC: usize = 0x4149_5043;

const WM_USER: u32 = 0x0400;

const PROPVALUE_GET: usize = 0;
const PROPVALUE_SET: usize = 1;

const CMD_BASE: usize = 10;

/// Handle to AIMP's message-receiving window. Never zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Endpoint(NonZeroIsize);

impl Endpoint {
  /// Wrap a raw window handle. Zero means "no window".
  pub fn new(raw: isize) -> Option<Self> {
    NonZeroIsize::new(raw).map(Self)
  }

  pub fn raw(self) -> isize {
    self.0.get()
  }
}

/// Message types AIMP listens for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageKind {
  Command,
  /// Reserved for notification registration; unused by this client.
  Notify,
  Property,
}

impl MessageKind {
  pub fn code(self) -> u32 {
    match self {
      MessageKind::Command => WM_USER + 0x75,
      MessageKind::Notify => WM_USER + 0x76,
      MessageKind::Property => WM_USER + 0x77,
    }
  }

  pub fn from_code(code: u32) -> Option<Self> {
    [MessageKind::Command, MessageKind::Notify, MessageKind::Property]
      .into_iter()
      .find(|kind| kind.code() == code)
  }
}

/// Addressable player properties.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PropertyId {
  Version,
  PlayerPosition,
  PlayerDuration,
  PlayerState,
  Volume,
  Mute,
  TrackRepeat,
  TrackShuffle,
  RadioCapture,
  VisualFullscreen,
}

impl PropertyId {
  pub const ALL: [PropertyId; 10] = [
    PropertyId::Version,
    PropertyId::PlayerPosition,
    PropertyId::PlayerDuration,
    PropertyId::PlayerState,
    PropertyId::Volume,
    PropertyId::Mute,
    PropertyId::TrackRepeat,
    PropertyId::TrackShuffle,
    PropertyId::RadioCapture,
    PropertyId::VisualFullscreen,
  ];

  pub fn code(self) -> usize {
    match self {
      PropertyId::Version => 0x10,
      PropertyId::PlayerPosition => 0x20,
      PropertyId::PlayerDuration => 0x30,
      PropertyId::PlayerState => 0x40,
      PropertyId::Volume => 0x50,
      PropertyId::Mute => 0x60,
      PropertyId::TrackRepeat => 0x70,
      PropertyId::TrackShuffle => 0x80,
      PropertyId::RadioCapture => 0x90,
      PropertyId::VisualFullscreen => 0xA0,
    }
  }
}

/// A property read or write, before it is flattened into message parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PropertyRequest {
  Read(PropertyId),
  Write(PropertyId, isize),
}

impl PropertyRequest {
  /// Encode into `(wparam, lparam)` for a `Property` message.
  pub fn encode(self) -> (usize, isize) {
    match self {
      PropertyRequest::Read(id) => (id.code() | PROPVALUE_GET, 0),
      PropertyRequest::Write(id, value) => (id.code() | PROPVALUE_SET, value),
    }
  }

  /// Inverse of [`encode`](Self::encode), as seen from the player side.
  pub fn decode(wparam: usize, lparam: isize) -> Option<Self> {
    let id = PropertyId::ALL
      .into_iter()
      .find(|id| id.code() == wparam & !PROPVALUE_SET)?;
    if wparam & PROPVALUE_SET != 0 {
      Some(PropertyRequest::Write(id, lparam))
    } else {
      Some(PropertyRequest::Read(id))
    }
  }
}

/// Fire-and-forget player actions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Command {
  Play,
  PlayPause,
  Pause,
  Stop,
  Next,
  Prev,
  VisualNext,
  VisualPrev,
  Quit,
  AddFiles,
  AddFolders,
  AddPlaylists,
  AddUrl,
  OpenFiles,
  OpenFolders,
  OpenPlaylists,
  /// Asks AIMP to `WM_COPYDATA` the cover to the window passed as parameter.
  GetAlbumArt,
  VisualStart,
  VisualStop,
}

impl Command {
  pub const ALL: [Command; 19] = [
    Command::Play,
    Command::PlayPause,
    Command::Pause,
    Command::Stop,
    Command::Next,
    Command::Prev,
    Command::VisualNext,
    Command::VisualPrev,
    Command::Quit,
    Command::AddFiles,
    Command::AddFolders,
    Command::AddPlaylists,
    Command::AddUrl,
    Command::OpenFiles,
    Command::OpenFolders,
    Command::OpenPlaylists,
    Command::GetAlbumArt,
    Command::VisualStart,
    Command::VisualStop,
  ];

  pub fn code(self) -> usize {
    CMD_BASE
      + match self {
        Command::Play => 3,
        Command::PlayPause => 4,
        Command::Pause => 5,
        Command::Stop => 6,
        Command::Next => 7,
        Command::Prev => 8,
        Command::VisualNext => 9,
        Command::VisualPrev => 10,
        Command::Quit => 11,
        Command::AddFiles => 12,
        Command::AddFolders => 13,
        Command::AddPlaylists => 14,
        Command::AddUrl => 15,
        Command::OpenFiles => 16,
        Command::OpenFolders => 17,
        Command::OpenPlaylists => 18,
        Command::GetAlbumArt => 19,
        Command::VisualStart => 20,
        Command::VisualStop => 21,
      }
  }
}

/// Playback state as reported by the `PlayerState` property.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackState {
  Stopped,
  Paused,
  Playing,
  /// A value this client does not know about.
  Unknown(isize),
}

impl PlaybackState {
  pub fn from_raw(raw: isize) -> Self {
    match raw {
      0 => PlaybackState::Stopped,
      1 => PlaybackState::Paused,
      2 => PlaybackState::Playing,
      other => PlaybackState::Unknown(other),
    }
  }
}

impl fmt::Display for PlaybackState {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      PlaybackState::Stopped => f.write_str("stopped"),
      PlaybackState::Paused => f.write_str("paused"),
      PlaybackState::Playing => f.write_str("playing"),
      PlaybackState::Unknown(raw) => write!(f, "unknown ({})", raw),
    }
  }
}

/// Player version, split from the 32-bit `Version` reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Version {
  /// Major version times 100 (`412` is 4.12).
  pub major: u16,
  pub build: u16,
}

impl Version {
  /// Split a raw reply, high word first. Zero means the version is unavailable.
  pub fn from_raw(raw: isize) -> Option<Self> {
    if raw == 0 {
      return None;
    }
    let raw = raw as u32;
    Some(Self {
      major: (raw >> 16) as u16,
      build: (raw & 0xFFFF) as u16,
    })
  }

  /// Major version as displayed by AIMP, e.g. `"4.12"`.
  pub fn major_display(&self) -> String {
    format!("{:.2}", f64::from(self.major) / 100.0)
  }
}

impl fmt::Display for Version {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{} build {}", self.major_display(), self.build)
  }
}

/// Raw data block delivered to a listener window.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Payload {
  pub tag: usize,
  pub data: Vec<u8>,
}
