//! AIMP window and executable discovery.

use std::path::PathBuf;

use super::error::AimpError;
use super::protocol::Endpoint;
use super::transport::Transport;

/// Find AIMP's remote control window.
///
/// Call again after AIMP restarts; an old endpoint is not detected as stale.
pub fn locate(transport: &dyn Transport, class_name: &str) -> Result<Endpoint, AimpError> {
  match transport.find_endpoint(class_name) {
    Some(endpoint) => {
      log::info!("Found AIMP window {:#x} ({})", endpoint.raw(), class_name);
      Ok(endpoint)
    }
    None => {
      log::debug!("No window registered as {}", class_name);
      Err(AimpError::NotRunning)
    }
  }
}

/// Find the executable of the process owning `endpoint`.
pub fn locate_executable(transport: &dyn Transport, endpoint: Endpoint) -> Result<PathBuf, AimpError> {
  let path = transport
    .executable_path(endpoint)
    .ok_or(AimpError::ExecutableNotFound)?;
  log::debug!("AIMP executable: {:?}", path);
  Ok(path)
}

/// Resolve a user-supplied executable: an existing path is taken as is, a bare
/// program name is looked up in PATH.
pub fn resolve_executable(configured: &str) -> Result<PathBuf, AimpError> {
  let path = PathBuf::from(configured);
  if path.is_file() {
    return Ok(path);
  }

  which::which(configured).map_err(|e| {
    log::warn!("Configured AIMP executable {:?} not found: {}", configured, e);
    AimpError::ExecutableNotFound
  })
}
