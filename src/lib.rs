//! # Window Input Driver
//!
//! Bind to an on-screen window by a fuzzy title or process match and drive it
//! with timed synthetic keyboard and mouse input, either synchronously
//! (blocking) or through a polled queue (non-blocking).
//!
//! ## Features
//!
//! - Bind by window-title substring or exact process id
//! - Stale-binding recovery: a renamed or recreated window is re-resolved by
//!   title, then process id, then thread id before each dispatch
//! - Timed batches with chained relative delays, per channel (keys, mouse)
//! - Blocking execution or cooperative `tick()`-polled queues, one shared
//!   mode flag
//! - JSON script files describing key sequences
//!
//! ## Example
//!
//! ```no_run
//! use std::time::Duration;
//! use window_input_driver::{AutomationSession, KeyEvent, TimedBatch};
//!
//! let mut session = AutomationSession::system();
//! if session.bind("Notepad") {
//!     session.set_blocking(true);
//!     let batch = TimedBatch::single(KeyEvent::typed(0x48), Duration::from_millis(250));
//!     session.execute_keys(vec![batch], false);
//! }
//! ```
//!
//! ## Scripts
//!
//! Key sequences can be loaded from JSON:
//!
//! ```json
//! {
//!   "window_title": "Notepad",
//!   "blocking": true,
//!   "keys": [
//!     {"key": "h", "delay_before": "250ms"},
//!     {"key": "enter", "delay_before": "1s"}
//!   ]
//! }
//! ```

pub mod backend;
pub mod clock;
pub mod config;
pub mod directory;
pub mod error;
pub mod events;
pub mod keys;
pub mod process_finder;
pub mod resolver;
pub mod scheduler;
pub mod session;

pub use backend::{InputBackend, SystemInputBackend};
pub use config::Script;
pub use directory::{
    SystemWindowDirectory, WindowDirectory, WindowGeometry, WindowIdentity, WindowRef,
};
pub use error::{Result, WidError};
pub use events::{KeyEvent, KeyEventKind, MouseButton, MouseEvent, MouseEventKind, TimedBatch};
pub use process_finder::ProcessFinder;
pub use resolver::BindQuery;
pub use session::{AutomationSession, SystemSession};
