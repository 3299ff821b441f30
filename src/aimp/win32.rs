//! Native transport: Win32 window messages and file mappings.

use std::cell::RefCell;
use std::ffi::OsString;
use std::os::windows::ffi::OsStringExt;
use std::path::PathBuf;

use async_channel::Sender;
use tokio::sync::oneshot;
use tokio_util::sync::CancellationToken;
use windows::core::{w, HSTRING, PCWSTR, PWSTR};
use windows::Win32::Foundation::{CloseHandle, HINSTANCE, HWND, LPARAM, LRESULT, WPARAM};
use windows::Win32::System::DataExchange::COPYDATASTRUCT;
use windows::Win32::System::LibraryLoader::GetModuleHandleW;
use windows::Win32::System::Memory::{
  MapViewOfFile, OpenFileMappingW, UnmapViewOfFile, VirtualQuery, FILE_MAP_READ,
  MEMORY_BASIC_INFORMATION,
};
use windows::Win32::System::Threading::{
  OpenProcess, QueryFullProcessImageNameW, PROCESS_NAME_WIN32, PROCESS_QUERY_LIMITED_INFORMATION,
};
use windows::Win32::UI::WindowsAndMessaging::{
  CreateWindowExW, DefWindowProcW, DestroyWindow, DispatchMessageW, FindWindowW,
  GetWindowThreadProcessId, MsgWaitForMultipleObjects, PeekMessageW, RegisterClassW, SendMessageW,
  TranslateMessage, UnregisterClassW, HMENU, HWND_MESSAGE, MSG, PM_REMOVE, QS_ALLINPUT,
  WINDOW_EX_STYLE, WINDOW_STYLE, WM_COPYDATA, WNDCLASSW,
};

use super::error::AimpError;
use super::protocol::{Endpoint, Payload};
use super::transport::Transport;

const LISTENER_CLASS: PCWSTR = w!("AimpRemoteAlbumArtListener");

/// Poll interval of the listener's message loop, in milliseconds.
const LISTENER_POLL_MS: u32 = 50;

struct ListenerSlot {
  payload_tx: Sender<Payload>,
  received: bool,
}

thread_local! {
  // Messages for the listener window are dispatched on the thread that created it.
  static LISTENER: RefCell<Option<ListenerSlot>> = const { RefCell::new(None) };
}

fn hwnd(endpoint: Endpoint) -> HWND {
  HWND(endpoint.raw() as _)
}

/// Talks to AIMP through the Win32 API.
#[derive(Debug, Default)]
pub struct Win32Transport;

impl Win32Transport {
  pub fn new() -> Self {
    Self
  }
}

impl Transport for Win32Transport {
  fn find_endpoint(&self, class_name: &str) -> Option<Endpoint> {
    let window = unsafe { FindWindowW(&HSTRING::from(class_name), PCWSTR::null()) }.ok()?;
    Endpoint::new(window.0 as isize)
  }

  fn executable_path(&self, endpoint: Endpoint) -> Option<PathBuf> {
    let mut pid = 0u32;
    unsafe { GetWindowThreadProcessId(hwnd(endpoint), Some(&mut pid)) };
    if pid == 0 {
      return None;
    }

    let process = match unsafe { OpenProcess(PROCESS_QUERY_LIMITED_INFORMATION, false, pid) } {
      Ok(process) => process,
      Err(e) => {
        log::warn!("Cannot open AIMP process {}: {}", pid, e);
        return None;
      }
    };

    let mut buf = vec![0u16; 32 * 1024];
    let mut len = buf.len() as u32;
    let result = unsafe {
      QueryFullProcessImageNameW(process, PROCESS_NAME_WIN32, PWSTR(buf.as_mut_ptr()), &mut len)
    };
    unsafe {
      let _ = CloseHandle(process);
    }
    result.ok()?;

    Some(PathBuf::from(OsString::from_wide(&buf[..len as usize])))
  }

  fn send_message(&self, endpoint: Endpoint, message: u32, wparam: usize, lparam: isize) -> isize {
    unsafe { SendMessageW(hwnd(endpoint), message, WPARAM(wparam), LPARAM(lparam)) }.0
  }

  fn read_shared_memory(&self, name: &str, capacity: usize) -> Option<Vec<u8>> {
    let mapping = match unsafe { OpenFileMappingW(FILE_MAP_READ.0, false, &HSTRING::from(name)) } {
      Ok(mapping) => mapping,
      Err(e) => {
        log::debug!("Cannot open file mapping {}: {}", name, e);
        return None;
      }
    };

    // Size 0 maps the whole section, whatever AIMP created it with.
    let view = unsafe { MapViewOfFile(mapping, FILE_MAP_READ, 0, 0, 0) };
    if view.Value.is_null() {
      unsafe {
        let _ = CloseHandle(mapping);
      }
      return None;
    }

    let mut region = MEMORY_BASIC_INFORMATION::default();
    let queried = unsafe {
      VirtualQuery(
        Some(view.Value as *const _),
        &mut region,
        std::mem::size_of::<MEMORY_BASIC_INFORMATION>(),
      )
    };
    let len = if queried == 0 {
      0
    } else {
      region.RegionSize.min(capacity)
    };
    log::debug!(
      "Mapped {} ({} bytes), reading {}",
      name,
      region.RegionSize,
      len
    );

    let data = unsafe { std::slice::from_raw_parts(view.Value as *const u8, len) }.to_vec();
    unsafe {
      let _ = UnmapViewOfFile(view);
      let _ = CloseHandle(mapping);
    }
    Some(data)
  }

  fn listen_for_payload(
    &self,
    ready: oneshot::Sender<Endpoint>,
    payload_tx: Sender<Payload>,
    cancel: CancellationToken,
  ) -> Result<(), AimpError> {
    let instance: HINSTANCE = unsafe { GetModuleHandleW(None) }
      .map_err(|e| AimpError::ListenerFailed(e.to_string()))?
      .into();

    let class = WNDCLASSW {
      lpfnWndProc: Some(listener_proc),
      hInstance: instance,
      lpszClassName: LISTENER_CLASS,
      ..Default::default()
    };
    if unsafe { RegisterClassW(&class) } == 0 {
      log::debug!("Listener window class already registered");
    }

    LISTENER.with(|slot| {
      *slot.borrow_mut() = Some(ListenerSlot {
        payload_tx,
        received: false,
      })
    });

    let window = unsafe {
      CreateWindowExW(
        WINDOW_EX_STYLE::default(),
        LISTENER_CLASS,
        PCWSTR::null(),
        WINDOW_STYLE::default(),
        0,
        0,
        0,
        0,
        HWND_MESSAGE,
        HMENU::default(),
        instance,
        None,
      )
    };
    let window = match window {
      Ok(window) => window,
      Err(e) => {
        LISTENER.with(|slot| slot.borrow_mut().take());
        unsafe {
          let _ = UnregisterClassW(LISTENER_CLASS, instance);
        }
        return Err(AimpError::ListenerFailed(e.to_string()));
      }
    };

    if let Some(surface) = Endpoint::new(window.0 as isize) {
      let _ = ready.send(surface);

      let mut msg = MSG::default();
      while !cancel.is_cancelled() && !payload_received() {
        unsafe {
          MsgWaitForMultipleObjects(None, false, LISTENER_POLL_MS, QS_ALLINPUT);
          while PeekMessageW(&mut msg, HWND::default(), 0, 0, PM_REMOVE).as_bool() {
            let _ = TranslateMessage(&msg);
            DispatchMessageW(&msg);
          }
        }
      }
    }

    LISTENER.with(|slot| slot.borrow_mut().take());
    unsafe {
      let _ = DestroyWindow(window);
      let _ = UnregisterClassW(LISTENER_CLASS, instance);
    }
    log::debug!("Album art listener closed");
    Ok(())
  }
}

fn payload_received() -> bool {
  LISTENER.with(|slot| slot.borrow().as_ref().map_or(true, |s| s.received))
}

unsafe extern "system" fn listener_proc(
  window: HWND,
  message: u32,
  wparam: WPARAM,
  lparam: LPARAM,
) -> LRESULT {
  if message != WM_COPYDATA || lparam.0 == 0 {
    return DefWindowProcW(window, message, wparam, lparam);
  }

  let copy = &*(lparam.0 as *const COPYDATASTRUCT);
  let data = if copy.lpData.is_null() || copy.cbData == 0 {
    Vec::new()
  } else {
    std::slice::from_raw_parts(copy.lpData as *const u8, copy.cbData as usize).to_vec()
  };
  let payload = Payload {
    tag: copy.dwData,
    data,
  };

  LISTENER.with(|slot| {
    if let Some(slot) = slot.borrow_mut().as_mut() {
      if !slot.received {
        slot.received = true;
        let _ = slot.payload_tx.try_send(payload);
      }
    }
  });
  LRESULT(1)
}
