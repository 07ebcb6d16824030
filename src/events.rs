//! Value types for synthetic input: key events, mouse events, and the timed
//! batches the scheduler queues and dispatches.
//!
//! All types here are plain immutable data. A [`TimedBatch`] pairs an ordered,
//! non-empty group of events with a single delay; the delay is interpreted by
//! the scheduler as the wait *before* the batch, measured from the dispatch
//! instant of the previous batch (see the scheduler module).

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Result, WidError};

/// What a [`KeyEvent`] does with its virtual key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum KeyEventKind {
    /// Placeholder event, skipped at injection time.
    None,
    /// Press and release in one event.
    Typed,
    /// Press only.
    Pressed,
    /// Release only.
    Released,
}

/// A single synthetic keyboard event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyEvent {
    virtual_key: u16,
    kind: KeyEventKind,
    use_scan_code: bool,
    extended: bool,
}

impl KeyEvent {
    /// A press-and-release event for the given virtual-key code.
    ///
    /// Scan-code injection is on by default; many applications (games in
    /// particular) ignore plain virtual-key input.
    pub fn typed(virtual_key: u16) -> Self {
        Self::new(virtual_key, KeyEventKind::Typed)
    }

    /// A press-only event.
    pub fn pressed(virtual_key: u16) -> Self {
        Self::new(virtual_key, KeyEventKind::Pressed)
    }

    /// A release-only event.
    pub fn released(virtual_key: u16) -> Self {
        Self::new(virtual_key, KeyEventKind::Released)
    }

    /// An event with an explicit kind.
    pub fn new(virtual_key: u16, kind: KeyEventKind) -> Self {
        Self {
            virtual_key,
            kind,
            use_scan_code: true,
            extended: false,
        }
    }

    /// Toggle scan-code injection for this event.
    pub fn with_scan_code(mut self, use_scan_code: bool) -> Self {
        self.use_scan_code = use_scan_code;
        self
    }

    /// Mark the key as an extended key (navigation cluster, right-side
    /// modifiers, numpad enter).
    pub fn with_extended(mut self, extended: bool) -> Self {
        self.extended = extended;
        self
    }

    pub fn virtual_key(&self) -> u16 {
        self.virtual_key
    }

    pub fn kind(&self) -> KeyEventKind {
        self.kind
    }

    pub fn use_scan_code(&self) -> bool {
        self.use_scan_code
    }

    pub fn extended(&self) -> bool {
        self.extended
    }
}

/// What a [`MouseEvent`] does.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MouseEventKind {
    /// Placeholder event, skipped at injection time.
    None,
    /// Relative cursor movement by (dx, dy).
    Move,
    /// Absolute movement on the primary display.
    MoveAbsolute,
    /// Absolute movement across the whole virtual desktop.
    MoveAbsoluteDesktop,
    /// Wheel scroll by `scroll_delta`.
    Scroll,
    /// Button press and release in one event.
    Click,
    /// Button press only.
    ButtonDown,
    /// Button release only.
    ButtonUp,
}

/// Mouse button referenced by button-kind events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MouseButton {
    None,
    Left,
    Right,
    Middle,
}

/// A single synthetic mouse event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MouseEvent {
    kind: MouseEventKind,
    button: MouseButton,
    dx: i32,
    dy: i32,
    scroll_delta: i32,
}

impl MouseEvent {
    fn with_kind(kind: MouseEventKind, button: MouseButton) -> Self {
        Self {
            kind,
            button,
            dx: 0,
            dy: 0,
            scroll_delta: 0,
        }
    }

    /// Press and release the given button.
    pub fn click(button: MouseButton) -> Self {
        Self::with_kind(MouseEventKind::Click, button)
    }

    /// Press the given button without releasing it.
    pub fn button_down(button: MouseButton) -> Self {
        Self::with_kind(MouseEventKind::ButtonDown, button)
    }

    /// Release the given button.
    pub fn button_up(button: MouseButton) -> Self {
        Self::with_kind(MouseEventKind::ButtonUp, button)
    }

    /// Move the cursor by a relative offset.
    pub fn move_by(dx: i32, dy: i32) -> Self {
        let mut evt = Self::with_kind(MouseEventKind::Move, MouseButton::None);
        evt.dx = dx;
        evt.dy = dy;
        evt
    }

    /// Move the cursor to normalized absolute coordinates on the primary
    /// display.
    pub fn move_to(x: i32, y: i32) -> Self {
        let mut evt = Self::with_kind(MouseEventKind::MoveAbsolute, MouseButton::None);
        evt.dx = x;
        evt.dy = y;
        evt
    }

    /// Move the cursor to normalized absolute coordinates spanning the whole
    /// virtual desktop.
    pub fn move_to_desktop(x: i32, y: i32) -> Self {
        let mut evt = Self::with_kind(MouseEventKind::MoveAbsoluteDesktop, MouseButton::None);
        evt.dx = x;
        evt.dy = y;
        evt
    }

    /// Scroll the wheel; positive is away from the user.
    pub fn scroll(delta: i32) -> Self {
        let mut evt = Self::with_kind(MouseEventKind::Scroll, MouseButton::None);
        evt.scroll_delta = delta;
        evt
    }

    pub fn kind(&self) -> MouseEventKind {
        self.kind
    }

    pub fn button(&self) -> MouseButton {
        self.button
    }

    pub fn dx(&self) -> i32 {
        self.dx
    }

    pub fn dy(&self) -> i32 {
        self.dy
    }

    pub fn scroll_delta(&self) -> i32 {
        self.scroll_delta
    }
}

/// An ordered, non-empty group of events preceded by one delay.
///
/// The non-empty invariant is enforced at construction; the scheduler can rely
/// on every queued batch dispatching at least one event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimedBatch<E> {
    events: Vec<E>,
    delay_before: Duration,
}

impl<E> TimedBatch<E> {
    /// Create a batch from an ordered event list.
    ///
    /// Fails with [`WidError::EmptyBatch`] if `events` is empty.
    pub fn new(events: Vec<E>, delay_before: Duration) -> Result<Self> {
        if events.is_empty() {
            return Err(WidError::EmptyBatch);
        }
        Ok(Self {
            events,
            delay_before,
        })
    }

    /// Create a single-event batch.
    pub fn single(event: E, delay_before: Duration) -> Self {
        Self {
            events: vec![event],
            delay_before,
        }
    }

    /// The events of this batch, in dispatch order.
    pub fn events(&self) -> &[E] {
        &self.events
    }

    /// The wait before this batch, measured from the previous dispatch
    /// instant.
    pub fn delay_before(&self) -> Duration {
        self.delay_before
    }
}
