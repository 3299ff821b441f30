//! Messaging seam between the client and the OS.
//!
//! The native implementation lives in `win32.rs`; tests drive the client
//! through a simulated player instead.

use std::path::PathBuf;

use async_channel::Sender;
use tokio::sync::oneshot;
use tokio_util::sync::CancellationToken;

use super::error::AimpError;
use super::protocol::{Endpoint, Payload};

/// OS primitives needed to talk to AIMP.
pub trait Transport: Send + Sync {
  /// Find the window registered under `class_name`.
  fn find_endpoint(&self, class_name: &str) -> Option<Endpoint>;

  /// Image path of the process owning `endpoint`.
  fn executable_path(&self, endpoint: Endpoint) -> Option<PathBuf>;

  /// Send `message` to `endpoint` and block until it has been handled.
  fn send_message(&self, endpoint: Endpoint, message: u32, wparam: usize, lparam: isize) -> isize;

  /// Copy up to `capacity` bytes out of the named shared memory segment.
  fn read_shared_memory(&self, name: &str, capacity: usize) -> Option<Vec<u8>>;

  /// Run a receiving surface for one unsolicited payload.
  ///
  /// Called on a dedicated blocking thread. The implementation must send the
  /// surface's endpoint through `ready` only once it can receive, forward the
  /// first payload to `payload_tx`, then tear the surface down and return.
  /// It must also return promptly once `cancel` fires.
  fn listen_for_payload(
    &self,
    ready: oneshot::Sender<Endpoint>,
    payload_tx: Sender<Payload>,
    cancel: CancellationToken,
  ) -> Result<(), AimpError>;
}
