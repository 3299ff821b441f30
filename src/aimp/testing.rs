//! In-process stand-in for a running AIMP instance.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::mpsc::{self, RecvTimeoutError};
use std::time::Duration;

use async_channel::Sender;
use parking_lot::Mutex;
use tokio::sync::oneshot;
use tokio_util::sync::CancellationToken;

use super::error::AimpError;
use super::metadata::{encode_track_metadata, TrackMetadata};
use super::protocol::{
  Command, Endpoint, MessageKind, Payload, PropertyId, PropertyRequest, REMOTE_CLASS,
  REMOTE_MAP_FILE_SIZE,
};
use super::transport::Transport;

const SURFACE: isize = 0x7700;

/// Something the simulated player observed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
  Property(PropertyRequest),
  Command(Command),
  CommandParam(Command, isize),
  ListenerReady(Endpoint),
}

struct PlayerState {
  running: bool,
  generation: isize,
  executable: Option<PathBuf>,
  properties: HashMap<PropertyId, isize>,
  track: Option<Vec<u8>>,
  album_art: Option<Payload>,
  deliver_album_art: bool,
  listener_delay: Duration,
  listener_fails: bool,
  surface: Option<(Endpoint, mpsc::Sender<Payload>)>,
  listener_closed: bool,
  events: Vec<Event>,
}

impl PlayerState {
  fn endpoint(&self) -> Option<Endpoint> {
    if self.running {
      Endpoint::new(0x1000 + self.generation * 0x10)
    } else {
      None
    }
  }

  fn handle_property(&mut self, request: PropertyRequest) -> isize {
    match request {
      PropertyRequest::Read(id) => self.properties.get(&id).copied().unwrap_or(0),
      PropertyRequest::Write(id, value) => {
        let value = match id {
          PropertyId::Mute
          | PropertyId::TrackRepeat
          | PropertyId::TrackShuffle
          | PropertyId::RadioCapture
          | PropertyId::VisualFullscreen => isize::from(value != 0),
          _ => value,
        };
        self.properties.insert(id, value);
        0
      }
    }
  }

  fn handle_command(&mut self, command: Command, param: isize) -> isize {
    match command {
      Command::Play => {
        self.properties.insert(PropertyId::PlayerState, 2);
      }
      Command::Pause | Command::PlayPause => {
        let next = if self.properties.get(&PropertyId::PlayerState) == Some(&2) {
          1
        } else {
          2
        };
        self.properties.insert(PropertyId::PlayerState, next);
      }
      Command::Stop => {
        self.properties.insert(PropertyId::PlayerState, 0);
      }
      Command::Quit => {
        self.running = false;
      }
      Command::GetAlbumArt => return self.handle_album_art(param),
      _ => {}
    }
    1
  }

  fn handle_album_art(&mut self, target: isize) -> isize {
    let Some(payload) = self.album_art.clone() else {
      return 0;
    };
    let Some((surface, tx)) = &self.surface else {
      return 0;
    };
    if surface.raw() != target {
      return 0;
    }
    if self.deliver_album_art {
      let _ = tx.send(payload);
    }
    1
  }
}

/// Simulated player implementing [`Transport`].
pub struct SimulatedPlayer {
  state: Mutex<PlayerState>,
}

impl SimulatedPlayer {
  pub fn new() -> Self {
    let track = TrackMetadata {
      bit_rate: 320,
      channels: 2,
      duration: 254_000,
      file_size: 10_160_000,
      file_mark: 0,
      sample_rate: 44_100,
      track_number: 7,
      album: "OK Computer".into(),
      artist: "Radiohead".into(),
      year: "1997".into(),
      filename: r"D:\Music\Radiohead\07 - Fitter Happier.mp3".into(),
      genre: "Alternative".into(),
      title: "Fitter Happier".into(),
    };

    let mut properties = HashMap::new();
    properties.insert(PropertyId::Version, 0x019C_0756);
    properties.insert(PropertyId::PlayerDuration, 254_000);
    properties.insert(PropertyId::Volume, 80);

    Self {
      state: Mutex::new(PlayerState {
        running: true,
        generation: 1,
        executable: Some(PathBuf::from(r"C:\Program Files\AIMP\AIMP.exe")),
        properties,
        track: Some(encode_track_metadata(&track, REMOTE_MAP_FILE_SIZE)),
        album_art: None,
        deliver_album_art: true,
        listener_delay: Duration::ZERO,
        listener_fails: false,
        surface: None,
        listener_closed: false,
        events: Vec::new(),
      }),
    }
  }

  pub fn start_player(&self) {
    let mut state = self.state.lock();
    if !state.running {
      state.running = true;
      state.generation += 1;
    }
  }

  pub fn stop_player(&self) {
    self.state.lock().running = false;
  }

  pub fn hide_executable(&self) {
    self.state.lock().executable = None;
  }

  pub fn set_track(&self, raw: Option<Vec<u8>>) {
    self.state.lock().track = raw;
  }

  pub fn set_raw_property(&self, id: PropertyId, value: isize) {
    self.state.lock().properties.insert(id, value);
  }

  pub fn set_album_art(&self, payload: Option<Payload>) {
    self.state.lock().album_art = payload;
  }

  pub fn acknowledge_without_delivery(&self) {
    self.state.lock().deliver_album_art = false;
  }

  pub fn set_listener_delay(&self, delay: Duration) {
    self.state.lock().listener_delay = delay;
  }

  pub fn fail_listener(&self) {
    self.state.lock().listener_fails = true;
  }

  pub fn listener_closed(&self) -> bool {
    self.state.lock().listener_closed
  }

  pub fn events(&self) -> Vec<Event> {
    self.state.lock().events.clone()
  }
}

impl Transport for SimulatedPlayer {
  fn find_endpoint(&self, class_name: &str) -> Option<Endpoint> {
    if class_name != REMOTE_CLASS {
      return None;
    }
    self.state.lock().endpoint()
  }

  fn executable_path(&self, endpoint: Endpoint) -> Option<PathBuf> {
    let state = self.state.lock();
    if state.endpoint() != Some(endpoint) {
      return None;
    }
    state.executable.clone()
  }

  fn send_message(&self, endpoint: Endpoint, message: u32, wparam: usize, lparam: isize) -> isize {
    let mut state = self.state.lock();
    if state.endpoint() != Some(endpoint) {
      return 0;
    }

    match MessageKind::from_code(message) {
      Some(MessageKind::Property) => match PropertyRequest::decode(wparam, lparam) {
        Some(request) => {
          state.events.push(Event::Property(request));
          state.handle_property(request)
        }
        None => 0,
      },
      Some(MessageKind::Command) => {
        let Some(command) = Command::ALL.into_iter().find(|c| c.code() == wparam) else {
          return 0;
        };
        state.events.push(Event::Command(command));
        if lparam != 0 {
          state.events.push(Event::CommandParam(command, lparam));
        }
        state.handle_command(command, lparam)
      }
      _ => 0,
    }
  }

  fn read_shared_memory(&self, name: &str, capacity: usize) -> Option<Vec<u8>> {
    let state = self.state.lock();
    if !state.running || name != REMOTE_CLASS {
      return None;
    }
    state.track.as_ref().map(|raw| {
      let len = raw.len().min(capacity);
      raw[..len].to_vec()
    })
  }

  fn listen_for_payload(
    &self,
    ready: oneshot::Sender<Endpoint>,
    payload_tx: Sender<Payload>,
    cancel: CancellationToken,
  ) -> Result<(), AimpError> {
    let (delay, fails) = {
      let state = self.state.lock();
      (state.listener_delay, state.listener_fails)
    };
    if fails {
      return Err(AimpError::ListenerFailed("window class unavailable".into()));
    }

    std::thread::sleep(delay);

    let (tx, rx) = mpsc::channel();
    let surface = Endpoint::new(SURFACE).ok_or(AimpError::ListenerFailed("null surface".into()))?;
    {
      let mut state = self.state.lock();
      state.surface = Some((surface, tx));
      state.listener_closed = false;
      state.events.push(Event::ListenerReady(surface));
    }
    let _ = ready.send(surface);

    loop {
      match rx.recv_timeout(Duration::from_millis(10)) {
        Ok(payload) => {
          let _ = payload_tx.send_blocking(payload);
          break;
        }
        Err(RecvTimeoutError::Timeout) if cancel.is_cancelled() => break,
        Err(RecvTimeoutError::Timeout) => {}
        Err(RecvTimeoutError::Disconnected) => break,
      }
    }

    let mut state = self.state.lock();
    state.surface = None;
    state.listener_closed = true;
    Ok(())
  }
}
