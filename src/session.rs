//! The automation session: one bound target window, one mode flag, two
//! scheduler channels.
//!
//! The session is the object callers interact with. It owns the window
//! directory and input backend collaborators, the cached identity/geometry of
//! the bound window, and the key and mouse channels. All queue and mode
//! mutation goes through its methods.
//!
//! Policy notes, deliberate and load-bearing:
//!
//! - Calls that need a bound window (`execute_keys`, `execute_mouse`, `tick`,
//!   `update`) are silent no-ops on an unbound session, logged at debug
//!   level. Queues and geometry are left untouched.
//! - Queued batches survive `unbind`, rebinding, and blocking-mode switches;
//!   only a non-appending execute call clears a channel's queue.
//! - The session performs no internal locking. Driving one session from
//!   multiple threads must be serialized by the caller.

use tracing::{debug, info, warn};

use crate::backend::{InputBackend, SystemInputBackend};
use crate::directory::{SystemWindowDirectory, WindowDirectory, WindowGeometry, WindowIdentity};
use crate::error::WidError;
use crate::events::{KeyEvent, MouseEvent, TimedBatch};
use crate::resolver::{self, BindQuery};
use crate::scheduler::EventChannel;

/// Attempts to release focus coupling after a dispatch before giving up.
const DETACH_RETRY_LIMIT: u32 = 5;

/// An automation session wrapping exactly one target window.
pub struct AutomationSession<D, B> {
    directory: D,
    backend: B,
    bound: bool,
    blocking: bool,
    identity: Option<WindowIdentity>,
    geometry: WindowGeometry,
    keys: EventChannel<KeyEvent>,
    mouse: EventChannel<MouseEvent>,
}

impl<D, B> AutomationSession<D, B>
where
    D: WindowDirectory,
    B: InputBackend,
{
    /// Create an unbound session over the given collaborators. Both channel
    /// clocks start at zero.
    pub fn new(directory: D, backend: B) -> Self {
        Self {
            directory,
            backend,
            bound: false,
            blocking: false,
            identity: None,
            geometry: WindowGeometry::default(),
            keys: EventChannel::new(),
            mouse: EventChannel::new(),
        }
    }

    /// Bind to the first window matching the query and refresh its geometry.
    ///
    /// The snapshot is scanned in OS enumeration order, which is not stable
    /// across calls or across restarts of the target window; with several
    /// matching windows the winner is best-effort. On no match (or an
    /// enumeration failure) the session state is left unchanged and `false`
    /// is returned. Rebinding while bound discards the previous identity
    /// wholesale.
    pub fn bind(&mut self, query: impl Into<BindQuery>) -> bool {
        let query = query.into();
        match resolver::find_match(&mut self.directory, &query) {
            Ok(window) => {
                info!(
                    title = %window.title,
                    pid = window.process_id,
                    tid = window.thread_id,
                    "bound to window"
                );
                self.identity = Some(window);
                self.bound = true;
                self.update();
                true
            }
            Err(err) => {
                warn!("bind failed: {err}");
                false
            }
        }
    }

    /// Drop the binding. The last identity and geometry stay readable, and
    /// queued batches stay queued.
    pub fn unbind(&mut self) {
        if self.bound {
            info!("session unbound");
        }
        self.bound = false;
    }

    pub fn is_bound(&self) -> bool {
        self.bound
    }

    /// Switch between blocking and queued execution. The flag is shared by
    /// both channels.
    pub fn set_blocking(&mut self, blocking: bool) {
        self.blocking = blocking;
    }

    pub fn is_blocking(&self) -> bool {
        self.blocking
    }

    /// The identity captured at the last successful bind, if any. Stays
    /// readable after `unbind`, at which point it may be stale.
    pub fn identity(&self) -> Option<&WindowIdentity> {
        self.identity.as_ref()
    }

    /// The geometry captured at the last refresh; zeroed when the last
    /// refresh failed.
    pub fn geometry(&self) -> WindowGeometry {
        self.geometry
    }

    /// Refresh the cached geometry with a direct (no-fallback) resolution of
    /// the bound window. No-op if unbound; zeroes the cache on failure.
    pub fn update(&mut self) {
        if !self.bound {
            debug!("session not bound; skipping geometry refresh");
            return;
        }
        let Some(identity) = self.identity.as_mut() else {
            return;
        };

        let refreshed = match resolver::resolve(&mut self.directory, identity, false) {
            Ok(window) => match self.directory.geometry(&window) {
                Ok(geometry) => geometry,
                Err(err) => {
                    warn!("geometry refresh failed: {err}");
                    WindowGeometry::default()
                }
            },
            Err(err) => {
                warn!("geometry refresh failed: {err}");
                WindowGeometry::default()
            }
        };
        self.geometry = refreshed;
    }

    /// Execute or schedule key batches on the key channel.
    ///
    /// Blocking mode dispatches everything in input order before returning;
    /// non-blocking mode only queues (replacing the queue unless `append` is
    /// set) and relies on [`tick`](Self::tick). No-op when unbound.
    pub fn execute_keys(&mut self, batches: Vec<TimedBatch<KeyEvent>>, append: bool) {
        if !self.bound {
            debug!(count = batches.len(), "session not bound; ignoring key batches");
            return;
        }
        debug!(count = batches.len(), blocking = self.blocking, "executing key batches");

        let Self {
            directory,
            backend,
            identity,
            keys,
            blocking,
            ..
        } = self;
        let Some(identity) = identity.as_mut() else {
            return;
        };
        keys.execute(batches, append, *blocking, |events| {
            dispatch_keys(directory, backend, identity, events);
        });
    }

    /// Execute or schedule mouse batches on the mouse channel; semantics as
    /// [`execute_keys`](Self::execute_keys).
    pub fn execute_mouse(&mut self, batches: Vec<TimedBatch<MouseEvent>>, append: bool) {
        if !self.bound {
            debug!(count = batches.len(), "session not bound; ignoring mouse batches");
            return;
        }
        debug!(count = batches.len(), blocking = self.blocking, "executing mouse batches");

        let Self {
            directory,
            backend,
            identity,
            mouse,
            blocking,
            ..
        } = self;
        let Some(identity) = identity.as_mut() else {
            return;
        };
        mouse.execute(batches, append, *blocking, |events| {
            dispatch_mouse(directory, backend, identity, events);
        });
    }

    /// Drain every ready batch on both channels, independently.
    ///
    /// No-op when unbound or in blocking mode. Each channel dispatches queued
    /// batches front-to-back while their chained delays have elapsed, and
    /// stops at the first batch whose delay has not.
    pub fn tick(&mut self) {
        if !self.bound || self.blocking {
            return;
        }

        let Self {
            directory,
            backend,
            identity,
            keys,
            mouse,
            ..
        } = self;
        let Some(identity) = identity.as_mut() else {
            return;
        };
        keys.tick(|events| dispatch_keys(directory, backend, identity, events));
        mouse.tick(|events| dispatch_mouse(directory, backend, identity, events));
    }

    /// Whether either channel still has queued batches.
    pub fn has_events_in_queue(&self) -> bool {
        self.keys.has_events() || self.mouse.has_events()
    }

    /// Number of batches queued on the key channel.
    pub fn key_queue_len(&self) -> usize {
        self.keys.queue_len()
    }

    /// Number of batches queued on the mouse channel.
    pub fn mouse_queue_len(&self) -> usize {
        self.mouse.queue_len()
    }
}

/// A session wired to the live OS collaborators.
pub type SystemSession = AutomationSession<SystemWindowDirectory, SystemInputBackend>;

impl SystemSession {
    /// A session over the live Win32 window manager and input queue.
    ///
    /// Constructing one off Windows succeeds, but every bind fails with an
    /// unsupported-platform error.
    pub fn system() -> Self {
        Self::new(SystemWindowDirectory::new(), SystemInputBackend::new())
    }
}

/// Dispatch one key batch: resolve, couple focus, inject, release.
///
/// Every failure is logged and swallowed; a bad batch never aborts the rest
/// of a blocking run or a tick drain.
fn dispatch_keys<D, B>(
    directory: &mut D,
    backend: &mut B,
    identity: &mut WindowIdentity,
    events: &[KeyEvent],
) where
    D: WindowDirectory,
    B: InputBackend,
{
    with_focus(directory, backend, identity, |backend, identity| {
        backend.inject_keys(identity, events)
    });
}

/// Dispatch one mouse batch; semantics as [`dispatch_keys`].
fn dispatch_mouse<D, B>(
    directory: &mut D,
    backend: &mut B,
    identity: &mut WindowIdentity,
    events: &[MouseEvent],
) where
    D: WindowDirectory,
    B: InputBackend,
{
    with_focus(directory, backend, identity, |backend, identity| {
        backend.inject_mouse(identity, events)
    });
}

fn with_focus<D, B, F>(directory: &mut D, backend: &mut B, identity: &mut WindowIdentity, inject: F)
where
    D: WindowDirectory,
    B: InputBackend,
    F: FnOnce(&mut B, &WindowIdentity) -> crate::error::Result<()>,
{
    if let Err(err) = resolver::resolve(directory, identity, true) {
        warn!("skipping dispatch: {err}");
        return;
    }

    if !backend.attach_focus(identity) {
        let err = WidError::focus_coupling_failed(identity.title.as_str(), identity.thread_id);
        warn!("skipping dispatch: {err}");
        return;
    }

    if let Err(err) = inject(backend, identity) {
        warn!("injection failed: {err}");
    }

    for attempt in 1..=DETACH_RETRY_LIMIT {
        if backend.detach_focus(identity) {
            return;
        }
        warn!(attempt, "failed to release focus coupling");
    }
    warn!(
        limit = DETACH_RETRY_LIMIT,
        "giving up on focus release; input state may stay coupled"
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::directory::WindowRef;
    use crate::error::Result;
    use std::time::Duration;

    struct FakeDirectory {
        snapshot: Vec<WindowIdentity>,
        geometry: Result<WindowGeometry>,
    }

    impl FakeDirectory {
        fn with_windows(snapshot: Vec<WindowIdentity>) -> Self {
            Self {
                snapshot,
                geometry: Ok(WindowGeometry {
                    top_left: (100, 200),
                    bottom_right: (900, 800),
                    width: 800,
                    height: 600,
                }),
            }
        }
    }

    impl WindowDirectory for FakeDirectory {
        fn enumerate(&mut self) -> Result<Vec<WindowIdentity>> {
            Ok(self.snapshot.clone())
        }

        fn find_by_title(&mut self, title: &str) -> Option<WindowRef> {
            self.snapshot
                .iter()
                .find(|w| w.title == title)
                .map(|w| WindowRef {
                    raw: 1,
                    process_id: w.process_id,
                    thread_id: w.thread_id,
                    is_valid: true,
                })
        }

        fn geometry(&mut self, _window: &WindowRef) -> Result<WindowGeometry> {
            match &self.geometry {
                Ok(geometry) => Ok(*geometry),
                Err(_) => Err(WidError::geometry_unavailable("fake")),
            }
        }
    }

    #[derive(Default)]
    struct RecordingBackend {
        attach_ok: Option<bool>,
        key_batches: Vec<Vec<u16>>,
        mouse_batches: Vec<usize>,
        detach_calls: usize,
    }

    impl RecordingBackend {
        fn new() -> Self {
            Self {
                attach_ok: Some(true),
                ..Default::default()
            }
        }

        fn refusing_focus() -> Self {
            Self {
                attach_ok: Some(false),
                ..Default::default()
            }
        }
    }

    impl InputBackend for RecordingBackend {
        fn attach_focus(&mut self, _target: &WindowIdentity) -> bool {
            self.attach_ok.unwrap_or(true)
        }

        fn detach_focus(&mut self, _target: &WindowIdentity) -> bool {
            self.detach_calls += 1;
            true
        }

        fn inject_keys(&mut self, _target: &WindowIdentity, events: &[KeyEvent]) -> Result<()> {
            self.key_batches
                .push(events.iter().map(|e| e.virtual_key()).collect());
            Ok(())
        }

        fn inject_mouse(&mut self, _target: &WindowIdentity, events: &[MouseEvent]) -> Result<()> {
            self.mouse_batches.push(events.len());
            Ok(())
        }
    }

    fn notepad() -> WindowIdentity {
        WindowIdentity {
            title: "Untitled - Notepad".to_string(),
            is_visible: true,
            process_id: 1234,
            thread_id: 5678,
        }
    }

    fn session_with(
        snapshot: Vec<WindowIdentity>,
    ) -> AutomationSession<FakeDirectory, RecordingBackend> {
        AutomationSession::new(FakeDirectory::with_windows(snapshot), RecordingBackend::new())
    }

    fn key_batch(vk: u16, delay_ms: u64) -> TimedBatch<KeyEvent> {
        TimedBatch::single(KeyEvent::typed(vk), Duration::from_millis(delay_ms))
    }

    #[test]
    fn test_bind_by_title_substring() {
        let mut session = session_with(vec![notepad()]);
        assert!(session.bind("Notepad"));
        assert!(session.is_bound());
        assert_eq!(session.identity().unwrap().title, "Untitled - Notepad");
        // Geometry refreshed as part of the bind.
        assert_eq!(session.geometry().width, 800);
    }

    #[test]
    fn test_bind_failure_leaves_state_unchanged() {
        let mut session = session_with(vec![notepad()]);
        assert!(session.bind("Notepad"));
        assert!(!session.bind("No Such Window"));
        // Prior binding intact.
        assert!(session.is_bound());
        assert_eq!(session.identity().unwrap().title, "Untitled - Notepad");
    }

    #[test]
    fn test_unbind_keeps_identity_readable() {
        let mut session = session_with(vec![notepad()]);
        session.bind("Notepad");
        session.unbind();
        assert!(!session.is_bound());
        assert_eq!(session.identity().unwrap().title, "Untitled - Notepad");
        assert_eq!(session.geometry().width, 800);
    }

    #[test]
    fn test_execute_unbound_is_a_no_op() {
        let mut session = session_with(vec![notepad()]);
        session.execute_keys(vec![key_batch(1, 0)], false);
        assert_eq!(session.key_queue_len(), 0);
        assert!(session.backend.key_batches.is_empty());
    }

    #[test]
    fn test_blocking_execution_dispatches_in_order() {
        let mut session = session_with(vec![notepad()]);
        session.bind("Notepad");
        session.set_blocking(true);
        session.execute_keys(vec![key_batch(1, 0), key_batch(2, 0), key_batch(3, 0)], false);
        assert_eq!(
            session.backend.key_batches,
            vec![vec![1], vec![2], vec![3]]
        );
        assert!(!session.has_events_in_queue());
        // Focus released once per batch.
        assert_eq!(session.backend.detach_calls, 3);
    }

    #[test]
    fn test_non_blocking_queues_until_tick() {
        let mut session = session_with(vec![notepad()]);
        session.bind("Notepad");
        session.execute_keys(vec![key_batch(1, 0), key_batch(2, 0)], false);
        assert!(session.backend.key_batches.is_empty());
        assert_eq!(session.key_queue_len(), 2);

        session.tick();
        assert_eq!(session.backend.key_batches, vec![vec![1], vec![2]]);
        assert!(!session.has_events_in_queue());
    }

    #[test]
    fn test_tick_in_blocking_mode_is_a_no_op() {
        let mut session = session_with(vec![notepad()]);
        session.bind("Notepad");
        session.execute_keys(vec![key_batch(1, 0)], false);
        session.set_blocking(true);
        session.tick();
        assert_eq!(session.key_queue_len(), 1);
        assert!(session.backend.key_batches.is_empty());
    }

    #[test]
    fn test_queue_survives_unbind_and_rebind() {
        let mut session = session_with(vec![notepad()]);
        session.bind("Notepad");
        session.execute_keys(vec![key_batch(1, 0)], false);
        session.unbind();
        session.tick();
        assert_eq!(session.key_queue_len(), 1);

        session.bind("Notepad");
        session.tick();
        assert_eq!(session.key_queue_len(), 0);
        assert_eq!(session.backend.key_batches, vec![vec![1]]);
    }

    #[test]
    fn test_focus_refusal_skips_injection_but_not_later_batches() {
        let mut session = AutomationSession::new(
            FakeDirectory::with_windows(vec![notepad()]),
            RecordingBackend::refusing_focus(),
        );
        session.bind("Notepad");
        session.set_blocking(true);
        session.execute_keys(vec![key_batch(1, 0), key_batch(2, 0)], false);
        // Nothing injected, nothing panicked, the full sequence ran.
        assert!(session.backend.key_batches.is_empty());
    }

    #[test]
    fn test_channels_are_independent() {
        let mut session = session_with(vec![notepad()]);
        session.bind("Notepad");
        session.execute_keys(vec![key_batch(1, 0)], false);
        session.execute_mouse(
            vec![TimedBatch::single(
                MouseEvent::click(crate::events::MouseButton::Left),
                Duration::ZERO,
            )],
            false,
        );
        assert_eq!(session.key_queue_len(), 1);
        assert_eq!(session.mouse_queue_len(), 1);
        assert!(session.has_events_in_queue());

        session.tick();
        assert!(!session.has_events_in_queue());
        assert_eq!(session.backend.key_batches.len(), 1);
        assert_eq!(session.backend.mouse_batches.len(), 1);
    }

    #[test]
    fn test_update_zeroes_geometry_on_failure() {
        let mut directory = FakeDirectory::with_windows(vec![notepad()]);
        directory.geometry = Err(WidError::geometry_unavailable("fake"));
        let mut session = AutomationSession::new(directory, RecordingBackend::new());
        session.bind("Notepad");
        assert_eq!(session.geometry(), WindowGeometry::default());
    }

    #[test]
    fn test_update_unbound_is_a_no_op() {
        let mut session = session_with(vec![notepad()]);
        session.update();
        assert_eq!(session.geometry(), WindowGeometry::default());
    }
}
