//! Window directory: enumeration snapshots, direct title lookup, and
//! geometry queries.
//!
//! The directory is an injected collaborator rather than process-wide state,
//! so the binding and resolution logic can be driven by a fake directory in
//! tests. Every [`WindowDirectory::enumerate`] call produces a fresh snapshot;
//! the directory itself caches nothing across calls.

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// A window as seen by a directory snapshot.
///
/// Copied into the session on a successful bind. The title, ids and
/// visibility reflect the window at snapshot time and can go stale if the
/// window closes or is recreated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WindowIdentity {
    pub title: String,
    pub is_visible: bool,
    pub process_id: u32,
    pub thread_id: u32,
}

/// Cached window placement, refreshed only on explicit request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct WindowGeometry {
    pub top_left: (i32, i32),
    pub bottom_right: (i32, i32),
    pub width: i32,
    pub height: i32,
}

/// A live reference to a window, produced by direct lookup.
///
/// Carries the ids observed on the live window so the resolver can check them
/// against a stored [`WindowIdentity`]. `is_valid` is an indication, not a
/// guarantee: handle reuse means the window may change state immediately
/// after the check.
#[derive(Debug, Clone, Copy)]
pub struct WindowRef {
    pub raw: isize,
    pub process_id: u32,
    pub thread_id: u32,
    pub is_valid: bool,
}

/// Directory of top-level windows.
pub trait WindowDirectory {
    /// Take a fresh snapshot of all top-level windows with non-empty titles.
    fn enumerate(&mut self) -> Result<Vec<WindowIdentity>>;

    /// Look up a window by its exact title.
    fn find_by_title(&mut self, title: &str) -> Option<WindowRef>;

    /// Query the current placement of a window.
    fn geometry(&mut self, window: &WindowRef) -> Result<WindowGeometry>;
}

/// [`WindowDirectory`] backed by the Win32 window manager.
#[derive(Debug, Default)]
pub struct SystemWindowDirectory;

impl SystemWindowDirectory {
    pub fn new() -> Self {
        Self
    }
}

#[cfg(windows)]
mod platform {
    use super::{SystemWindowDirectory, WindowDirectory, WindowGeometry, WindowIdentity, WindowRef};
    use crate::error::Result;

    use winapi::shared::minwindef::{BOOL, DWORD, LPARAM, TRUE};
    use winapi::shared::windef::{HWND, RECT};
    use winapi::um::winuser::{
        EnumWindows, FindWindowW, GetWindowRect, GetWindowTextLengthW, GetWindowTextW,
        GetWindowThreadProcessId, IsWindow, IsWindowVisible,
    };

    fn to_wide(s: &str) -> Vec<u16> {
        s.encode_utf16().chain(std::iter::once(0)).collect()
    }

    unsafe extern "system" fn collect_window(hwnd: HWND, lparam: LPARAM) -> BOOL {
        const TITLE_SIZE: usize = 1024;

        // Windows without a title are not interesting targets; skip them.
        if GetWindowTextLengthW(hwnd) == 0 {
            return TRUE;
        }

        let mut buffer = [0u16; TITLE_SIZE];
        let copied = GetWindowTextW(hwnd, buffer.as_mut_ptr(), TITLE_SIZE as i32);
        if copied <= 0 {
            return TRUE;
        }

        let mut pid: DWORD = 0;
        let tid = GetWindowThreadProcessId(hwnd, &mut pid);

        let windows = &mut *(lparam as *mut Vec<WindowIdentity>);
        windows.push(WindowIdentity {
            title: String::from_utf16_lossy(&buffer[..copied as usize]),
            is_visible: IsWindowVisible(hwnd) != 0,
            process_id: pid,
            thread_id: tid,
        });

        TRUE
    }

    impl WindowDirectory for SystemWindowDirectory {
        fn enumerate(&mut self) -> Result<Vec<WindowIdentity>> {
            let mut windows: Vec<WindowIdentity> = Vec::new();
            unsafe {
                EnumWindows(
                    Some(collect_window),
                    &mut windows as *mut Vec<WindowIdentity> as LPARAM,
                );
            }
            Ok(windows)
        }

        fn find_by_title(&mut self, title: &str) -> Option<WindowRef> {
            let wide = to_wide(title);
            let hwnd = unsafe { FindWindowW(std::ptr::null(), wide.as_ptr()) };
            if hwnd.is_null() {
                return None;
            }

            let mut pid: DWORD = 0;
            let tid = unsafe { GetWindowThreadProcessId(hwnd, &mut pid) };
            Some(WindowRef {
                raw: hwnd as isize,
                process_id: pid,
                thread_id: tid,
                is_valid: unsafe { IsWindow(hwnd) } != 0,
            })
        }

        fn geometry(&mut self, window: &WindowRef) -> Result<WindowGeometry> {
            let mut rect = RECT {
                left: 0,
                top: 0,
                right: 0,
                bottom: 0,
            };
            let ok = unsafe { GetWindowRect(window.raw as HWND, &mut rect) };
            if ok == 0 {
                return Err(crate::error::WidError::geometry_unavailable(format!(
                    "hwnd {:#x}",
                    window.raw
                )));
            }
            Ok(WindowGeometry {
                top_left: (rect.left, rect.top),
                bottom_right: (rect.right, rect.bottom),
                width: rect.right - rect.left,
                height: rect.bottom - rect.top,
            })
        }
    }
}

#[cfg(not(windows))]
mod platform {
    use super::{SystemWindowDirectory, WindowDirectory, WindowGeometry, WindowIdentity, WindowRef};
    use crate::error::{Result, WidError};

    impl WindowDirectory for SystemWindowDirectory {
        fn enumerate(&mut self) -> Result<Vec<WindowIdentity>> {
            Err(WidError::unsupported_platform(
                "window enumeration requires Windows",
            ))
        }

        fn find_by_title(&mut self, _title: &str) -> Option<WindowRef> {
            None
        }

        fn geometry(&mut self, _window: &WindowRef) -> Result<WindowGeometry> {
            Err(WidError::unsupported_platform(
                "window geometry queries require Windows",
            ))
        }
    }
}
