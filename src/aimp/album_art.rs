//! Album art retrieval.
//!
//! AIMP does not return the cover in the command reply. It acknowledges the
//! request and later copies the image to a window supplied by the caller, so a
//! listener has to be up before the request goes out.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::oneshot;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use super::error::AimpError;
use super::protocol::{Command, Endpoint, MessageKind, Payload, ALBUM_ART_MAGIC};
use super::transport::Transport;

/// Cover image of the current track.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlbumArt {
  pub data: Vec<u8>,
}

impl AlbumArt {
  /// File extension matching the image signature, if recognised.
  pub fn extension(&self) -> Option<&'static str> {
    let data = self.data.as_slice();
    if data.starts_with(b"\x89PNG\r\n\x1a\n") {
      Some("png")
    } else if data.starts_with(&[0xFF, 0xD8, 0xFF]) {
      Some("jpg")
    } else if data.starts_with(b"GIF87a") || data.starts_with(b"GIF89a") {
      Some("gif")
    } else if data.starts_with(b"BM") {
      Some("bmp")
    } else {
      None
    }
  }
}

/// Request the cover of the current track from the AIMP window at `endpoint`.
///
/// The listener's readiness is awaited before the request is sent; `timeout`
/// covers both the listener start-up and the delivery of the image.
pub async fn fetch_album_art(
  transport: Arc<dyn Transport>,
  endpoint: Endpoint,
  timeout: Duration,
) -> Result<AlbumArt, AimpError> {
  let (ready_tx, ready_rx) = oneshot::channel();
  let (payload_tx, payload_rx) = async_channel::bounded(1);
  let cancel = CancellationToken::new();
  // Dropping this future must also stop the listener.
  let _cancel_on_drop = cancel.clone().drop_guard();

  let listener_transport = transport.clone();
  let listener_cancel = cancel.clone();
  let listener = tokio::task::spawn_blocking(move || {
    listener_transport.listen_for_payload(ready_tx, payload_tx, listener_cancel)
  });

  let deadline = Instant::now() + timeout;
  let result = async {
    let surface = match tokio::time::timeout_at(deadline, ready_rx).await {
      Ok(Ok(surface)) => surface,
      // Listener exited before signalling; its own error is reported below.
      Ok(Err(_)) => return Ok(None),
      Err(_) => {
        log::error!("Album art listener did not start within {:?}", timeout);
        return Err(AimpError::AlbumArtTimeout);
      }
    };
    log::debug!("Album art listener ready at {:#x}", surface.raw());

    let request_transport = transport.clone();
    let reply = tokio::task::spawn_blocking(move || {
      request_transport.send_message(
        endpoint,
        MessageKind::Command.code(),
        Command::GetAlbumArt.code(),
        surface.raw(),
      )
    })
    .await
    .map_err(|e| AimpError::ListenerFailed(e.to_string()))?;
    if reply == 0 {
      return Err(AimpError::AlbumArtRejected);
    }

    match tokio::time::timeout_at(deadline, payload_rx.recv()).await {
      Ok(Ok(payload)) => Ok(Some(payload)),
      Ok(Err(_)) => Ok(None),
      Err(_) => {
        log::error!("No album art received within {:?}", timeout);
        Err(AimpError::AlbumArtTimeout)
      }
    }
  }
  .await;

  cancel.cancel();
  let listener_result = listener
    .await
    .map_err(|e| AimpError::ListenerFailed(e.to_string()))
    .and_then(|r| r);

  match result? {
    Some(payload) => accept_payload(payload),
    None => {
      listener_result?;
      Err(AimpError::ListenerFailed("listener closed without a payload".into()))
    }
  }
}

fn accept_payload(payload: Payload) -> Result<AlbumArt, AimpError> {
  if payload.tag != ALBUM_ART_MAGIC {
    log::warn!("Discarding payload with tag {:#x}", payload.tag);
    return Err(AimpError::UnexpectedPayload(payload.tag));
  }
  log::info!("Received album art ({} bytes)", payload.data.len());
  Ok(AlbumArt { data: payload.data })
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::aimp::testing::{Event, SimulatedPlayer};

  fn png() -> Vec<u8> {
    let mut data = b"\x89PNG\r\n\x1a\n".to_vec();
    data.extend([0u8; 32]);
    data
  }

  fn setup() -> (Arc<SimulatedPlayer>, Endpoint) {
    let player = Arc::new(SimulatedPlayer::new());
    let endpoint = player.find_endpoint("AIMP2_RemoteInfo").unwrap();
    (player, endpoint)
  }

  #[tokio::test]
  async fn test_fetch_album_art() {
    let (player, endpoint) = setup();
    player.set_album_art(Some(Payload {
      tag: ALBUM_ART_MAGIC,
      data: png(),
    }));

    let art = fetch_album_art(player.clone(), endpoint, Duration::from_secs(2))
      .await
      .unwrap();
    assert_eq!(art.data, png());
    assert_eq!(art.extension(), Some("png"));
  }

  #[tokio::test]
  async fn test_request_waits_for_slow_listener() {
    let (player, endpoint) = setup();
    player.set_album_art(Some(Payload {
      tag: ALBUM_ART_MAGIC,
      data: png(),
    }));
    player.set_listener_delay(Duration::from_millis(300));

    let art = fetch_album_art(player.clone(), endpoint, Duration::from_secs(3))
      .await
      .unwrap();
    assert_eq!(art.data, png());

    let events = player.events();
    let ready = events
      .iter()
      .position(|e| matches!(e, Event::ListenerReady(_)))
      .unwrap();
    let request = events
      .iter()
      .position(|e| *e == Event::Command(Command::GetAlbumArt))
      .unwrap();
    assert!(ready < request, "request sent before listener was ready: {:?}", events);
  }

  #[tokio::test]
  async fn test_unexpected_tag() {
    let (player, endpoint) = setup();
    player.set_album_art(Some(Payload {
      tag: 0x1234,
      data: png(),
    }));

    let err = fetch_album_art(player.clone(), endpoint, Duration::from_secs(2))
      .await
      .unwrap_err();
    assert!(matches!(err, AimpError::UnexpectedPayload(0x1234)));
  }

  #[tokio::test]
  async fn test_no_cover_is_rejected() {
    let (player, endpoint) = setup();
    player.set_album_art(None);

    let err = fetch_album_art(player.clone(), endpoint, Duration::from_secs(2))
      .await
      .unwrap_err();
    assert!(matches!(err, AimpError::AlbumArtRejected));
    assert!(player.listener_closed());
  }

  #[tokio::test]
  async fn test_silent_player_times_out() {
    let (player, endpoint) = setup();
    player.set_album_art(Some(Payload {
      tag: ALBUM_ART_MAGIC,
      data: png(),
    }));
    player.acknowledge_without_delivery();

    let err = fetch_album_art(player.clone(), endpoint, Duration::from_millis(200))
      .await
      .unwrap_err();
    assert!(matches!(err, AimpError::AlbumArtTimeout));
    assert!(player.listener_closed());
  }

  #[tokio::test]
  async fn test_listener_failure_is_reported() {
    let (player, endpoint) = setup();
    player.fail_listener();

    let err = fetch_album_art(player.clone(), endpoint, Duration::from_secs(2))
      .await
      .unwrap_err();
    assert!(matches!(err, AimpError::ListenerFailed(_)));
  }

  #[tokio::test]
  async fn test_dropped_fetch_stops_listener() {
    let (player, endpoint) = setup();
    player.set_album_art(Some(Payload {
      tag: ALBUM_ART_MAGIC,
      data: png(),
    }));
    player.acknowledge_without_delivery();

    let fetch = fetch_album_art(player.clone(), endpoint, Duration::from_secs(30));
    assert!(tokio::time::timeout(Duration::from_millis(150), fetch)
      .await
      .is_err());

    let mut closed = false;
    for _ in 0..50 {
      if player.listener_closed() {
        closed = true;
        break;
      }
      tokio::time::sleep(Duration::from_millis(20)).await;
    }
    assert!(closed, "listener kept running after the fetch was dropped");
  }

  #[test]
  fn test_extension_sniffing() {
    let jpeg = AlbumArt {
      data: vec![0xFF, 0xD8, 0xFF, 0xE0],
    };
    assert_eq!(jpeg.extension(), Some("jpg"));
    let unknown = AlbumArt { data: vec![1, 2, 3] };
    assert_eq!(unknown.extension(), None);
  }
}
