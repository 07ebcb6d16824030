//! Input dispatch backend: focus coupling and raw injection.
//!
//! Dispatching a batch requires a successful [`InputBackend::attach_focus`]
//! immediately before and a [`InputBackend::detach_focus`] immediately after
//! the injection calls; the session's dispatch pipeline owns that ordering.
//! Injection errors are reported to the caller but the scheduler treats them
//! as best-effort and never aborts a batch sequence because of one.

use crate::directory::WindowIdentity;
use crate::error::Result;
use crate::events::{KeyEvent, MouseEvent};

/// Synthetic input injection against one target window.
pub trait InputBackend {
    /// Couple this thread's input state to the target's input thread.
    fn attach_focus(&mut self, target: &WindowIdentity) -> bool;

    /// Release the input-thread coupling.
    fn detach_focus(&mut self, target: &WindowIdentity) -> bool;

    /// Inject a group of keyboard events.
    fn inject_keys(&mut self, target: &WindowIdentity, events: &[KeyEvent]) -> Result<()>;

    /// Inject a group of mouse events.
    fn inject_mouse(&mut self, target: &WindowIdentity, events: &[MouseEvent]) -> Result<()>;
}

/// [`InputBackend`] backed by `AttachThreadInput` + `SendInput`.
#[derive(Debug, Default)]
pub struct SystemInputBackend;

impl SystemInputBackend {
    pub fn new() -> Self {
        Self
    }
}

#[cfg(windows)]
mod platform {
    use super::{InputBackend, SystemInputBackend};
    use crate::directory::WindowIdentity;
    use crate::error::{Result, WidError};
    use crate::events::{KeyEvent, KeyEventKind, MouseButton, MouseEvent, MouseEventKind};

    use tracing::{debug, trace};
    use winapi::um::processthreadsapi::GetCurrentThreadId;
    use winapi::um::winuser::{
        AttachThreadInput, FindWindowW, MapVirtualKeyW, SendInput, SetActiveWindow, INPUT,
        INPUT_KEYBOARD, INPUT_MOUSE, KEYBDINPUT, KEYEVENTF_EXTENDEDKEY, KEYEVENTF_KEYUP,
        KEYEVENTF_SCANCODE, MAPVK_VK_TO_VSC, MOUSEEVENTF_ABSOLUTE, MOUSEEVENTF_LEFTDOWN,
        MOUSEEVENTF_LEFTUP, MOUSEEVENTF_MIDDLEDOWN, MOUSEEVENTF_MIDDLEUP, MOUSEEVENTF_MOVE,
        MOUSEEVENTF_RIGHTDOWN, MOUSEEVENTF_RIGHTUP, MOUSEEVENTF_VIRTUALDESK, MOUSEEVENTF_WHEEL,
        MOUSEINPUT,
    };

    fn to_wide(s: &str) -> Vec<u16> {
        s.encode_utf16().chain(std::iter::once(0)).collect()
    }

    fn key_input(vk: u16, scan: u16, flags: u32) -> INPUT {
        let mut input: INPUT = unsafe { std::mem::zeroed() };
        input.type_ = INPUT_KEYBOARD;
        unsafe {
            *input.u.ki_mut() = KEYBDINPUT {
                wVk: vk,
                wScan: scan,
                dwFlags: flags,
                time: 0,
                dwExtraInfo: 0,
            };
        }
        input
    }

    fn mouse_input(dx: i32, dy: i32, data: u32, flags: u32) -> INPUT {
        let mut input: INPUT = unsafe { std::mem::zeroed() };
        input.type_ = INPUT_MOUSE;
        unsafe {
            *input.u.mi_mut() = MOUSEINPUT {
                dx,
                dy,
                mouseData: data,
                dwFlags: flags,
                time: 0,
                dwExtraInfo: 0,
            };
        }
        input
    }

    fn push_key_inputs(inputs: &mut Vec<INPUT>, event: &KeyEvent) {
        if event.kind() == KeyEventKind::None {
            return;
        }

        let scan = unsafe { MapVirtualKeyW(event.virtual_key() as u32, MAPVK_VK_TO_VSC) } as u16;
        let mut flags = 0u32;
        if event.use_scan_code() {
            flags |= KEYEVENTF_SCANCODE;
        }
        if event.extended() {
            flags |= KEYEVENTF_EXTENDEDKEY;
        }

        trace!(
            vk = event.virtual_key(),
            scan,
            kind = ?event.kind(),
            "building keyboard input"
        );

        if matches!(event.kind(), KeyEventKind::Typed | KeyEventKind::Pressed) {
            inputs.push(key_input(event.virtual_key(), scan, flags));
        }
        if matches!(event.kind(), KeyEventKind::Typed | KeyEventKind::Released) {
            inputs.push(key_input(event.virtual_key(), scan, flags | KEYEVENTF_KEYUP));
        }
    }

    fn button_flags(button: MouseButton, down: bool) -> u32 {
        match (button, down) {
            (MouseButton::Left, true) => MOUSEEVENTF_LEFTDOWN,
            (MouseButton::Left, false) => MOUSEEVENTF_LEFTUP,
            (MouseButton::Right, true) => MOUSEEVENTF_RIGHTDOWN,
            (MouseButton::Right, false) => MOUSEEVENTF_RIGHTUP,
            (MouseButton::Middle, true) => MOUSEEVENTF_MIDDLEDOWN,
            (MouseButton::Middle, false) => MOUSEEVENTF_MIDDLEUP,
            (MouseButton::None, _) => 0,
        }
    }

    fn push_mouse_inputs(inputs: &mut Vec<INPUT>, event: &MouseEvent) {
        match event.kind() {
            MouseEventKind::None => {}
            MouseEventKind::Click | MouseEventKind::ButtonDown | MouseEventKind::ButtonUp => {
                let down = matches!(
                    event.kind(),
                    MouseEventKind::Click | MouseEventKind::ButtonDown
                );
                let up = matches!(
                    event.kind(),
                    MouseEventKind::Click | MouseEventKind::ButtonUp
                );
                if down {
                    let flags = button_flags(event.button(), true);
                    if flags != 0 {
                        inputs.push(mouse_input(0, 0, 0, flags));
                    }
                }
                if up {
                    let flags = button_flags(event.button(), false);
                    if flags != 0 {
                        inputs.push(mouse_input(0, 0, 0, flags));
                    }
                }
            }
            MouseEventKind::Move => {
                inputs.push(mouse_input(event.dx(), event.dy(), 0, MOUSEEVENTF_MOVE));
            }
            MouseEventKind::MoveAbsolute => {
                inputs.push(mouse_input(
                    event.dx(),
                    event.dy(),
                    0,
                    MOUSEEVENTF_MOVE | MOUSEEVENTF_ABSOLUTE,
                ));
            }
            MouseEventKind::MoveAbsoluteDesktop => {
                inputs.push(mouse_input(
                    event.dx(),
                    event.dy(),
                    0,
                    MOUSEEVENTF_MOVE | MOUSEEVENTF_ABSOLUTE | MOUSEEVENTF_VIRTUALDESK,
                ));
            }
            MouseEventKind::Scroll => {
                inputs.push(mouse_input(
                    0,
                    0,
                    event.scroll_delta() as u32,
                    MOUSEEVENTF_WHEEL,
                ));
            }
        }
    }

    fn send(mut inputs: Vec<INPUT>) -> Result<()> {
        if inputs.is_empty() {
            return Ok(());
        }
        let total = inputs.len();
        let sent = unsafe {
            SendInput(
                total as u32,
                inputs.as_mut_ptr(),
                std::mem::size_of::<INPUT>() as i32,
            )
        } as usize;
        if sent != total {
            return Err(WidError::dispatch_failed(sent, total));
        }
        Ok(())
    }

    impl InputBackend for SystemInputBackend {
        fn attach_focus(&mut self, target: &WindowIdentity) -> bool {
            let attached = unsafe {
                AttachThreadInput(GetCurrentThreadId(), target.thread_id, 1) != 0
            };
            if !attached {
                return false;
            }

            // Activation is best effort; injection can still land without it.
            let wide = to_wide(&target.title);
            let hwnd = unsafe { FindWindowW(std::ptr::null(), wide.as_ptr()) };
            if !hwnd.is_null() {
                unsafe { SetActiveWindow(hwnd) };
            } else {
                debug!(title = %target.title, "target window not found for activation");
            }
            true
        }

        fn detach_focus(&mut self, target: &WindowIdentity) -> bool {
            unsafe { AttachThreadInput(GetCurrentThreadId(), target.thread_id, 0) != 0 }
        }

        fn inject_keys(&mut self, _target: &WindowIdentity, events: &[KeyEvent]) -> Result<()> {
            let mut inputs = Vec::with_capacity(events.len() * 2);
            for event in events {
                push_key_inputs(&mut inputs, event);
            }
            send(inputs)
        }

        fn inject_mouse(&mut self, _target: &WindowIdentity, events: &[MouseEvent]) -> Result<()> {
            let mut inputs = Vec::with_capacity(events.len() * 2);
            for event in events {
                push_mouse_inputs(&mut inputs, event);
            }
            send(inputs)
        }
    }
}

#[cfg(not(windows))]
mod platform {
    use super::{InputBackend, SystemInputBackend};
    use crate::directory::WindowIdentity;
    use crate::error::{Result, WidError};
    use crate::events::{KeyEvent, MouseEvent};

    impl InputBackend for SystemInputBackend {
        fn attach_focus(&mut self, _target: &WindowIdentity) -> bool {
            false
        }

        fn detach_focus(&mut self, _target: &WindowIdentity) -> bool {
            false
        }

        fn inject_keys(&mut self, _target: &WindowIdentity, _events: &[KeyEvent]) -> Result<()> {
            Err(WidError::unsupported_platform(
                "keyboard injection requires Windows",
            ))
        }

        fn inject_mouse(&mut self, _target: &WindowIdentity, _events: &[MouseEvent]) -> Result<()> {
            Err(WidError::unsupported_platform(
                "mouse injection requires Windows",
            ))
        }
    }
}
