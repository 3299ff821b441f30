//! Remote control client for the AIMP media player.
//!
//! AIMP exposes a window that answers property reads/writes and commands sent
//! as window messages, plus a shared memory block describing the current
//! track. [`AimpClient`] wraps both behind a [`Transport`], so everything but
//! the native transport runs on any platform.

mod aimp;
mod config;

pub use aimp::*;
pub use config::{ClientConfig, ConfigError};
