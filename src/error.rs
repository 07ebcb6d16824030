//! Custom error types for window-input-driver.
//!
//! This module provides structured error types using `thiserror` for better
//! error handling and more informative diagnostics. Nothing in here is fatal
//! to a session: bind failures surface as a boolean, and everything on the
//! dispatch path is logged and swallowed by the scheduler.

use std::io;
use thiserror::Error;

/// Main error type for window-input-driver operations.
#[derive(Error, Debug)]
pub enum WidError {
    /// No window in the directory snapshot matched the bind query.
    #[error("no window matched bind query '{query}'")]
    BindFailed { query: String },

    /// A previously bound window could not be re-resolved to a live
    /// reference, even with fallback matching.
    #[error(
        "unable to resolve window '{title}' (pid={process_id}, tid={thread_id}) to a live reference"
    )]
    ResolutionFailed {
        title: String,
        process_id: u32,
        thread_id: u32,
    },

    /// Attaching to or detaching from the target window's input thread failed.
    #[error("focus coupling with window '{title}' (tid={thread_id}) failed")]
    FocusCouplingFailed { title: String, thread_id: u32 },

    /// Injection delivered fewer inputs than requested.
    #[error("input dispatch incomplete: {sent} of {total} inputs delivered")]
    DispatchFailed { sent: usize, total: usize },

    /// The geometry query for a window failed.
    #[error("window geometry unavailable for '{title}'")]
    GeometryUnavailable { title: String },

    /// A timed batch was constructed with no events.
    #[error("a timed batch must contain at least one event")]
    EmptyBatch,

    /// The specified key name is invalid or unsupported.
    #[error("invalid key '{key}': {reason}")]
    InvalidKey { key: String, reason: String },

    /// Error parsing a duration string.
    #[error("invalid duration '{value}': {reason}")]
    InvalidDuration { value: String, reason: String },

    /// Script validation error.
    #[error("script error: {0}")]
    ScriptValidation(String),

    /// Error reading or parsing a script file.
    #[error("failed to load script from '{path}': {reason}")]
    ScriptLoad { path: String, reason: String },

    /// Error writing a script file.
    #[error("failed to save script to '{path}': {reason}")]
    ScriptSave { path: String, reason: String },

    /// Platform-specific operation is not supported.
    #[error("operation not supported on this platform: {0}")]
    UnsupportedPlatform(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type alias for window-input-driver operations.
pub type Result<T> = std::result::Result<T, WidError>;

impl WidError {
    /// Create a new BindFailed error.
    pub fn bind_failed(query: impl Into<String>) -> Self {
        Self::BindFailed {
            query: query.into(),
        }
    }

    /// Create a new ResolutionFailed error.
    pub fn resolution_failed(title: impl Into<String>, process_id: u32, thread_id: u32) -> Self {
        Self::ResolutionFailed {
            title: title.into(),
            process_id,
            thread_id,
        }
    }

    /// Create a new FocusCouplingFailed error.
    pub fn focus_coupling_failed(title: impl Into<String>, thread_id: u32) -> Self {
        Self::FocusCouplingFailed {
            title: title.into(),
            thread_id,
        }
    }

    /// Create a new DispatchFailed error.
    pub fn dispatch_failed(sent: usize, total: usize) -> Self {
        Self::DispatchFailed { sent, total }
    }

    /// Create a new GeometryUnavailable error.
    pub fn geometry_unavailable(title: impl Into<String>) -> Self {
        Self::GeometryUnavailable {
            title: title.into(),
        }
    }

    /// Create a new InvalidKey error.
    pub fn invalid_key(key: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidKey {
            key: key.into(),
            reason: reason.into(),
        }
    }

    /// Create a new InvalidDuration error.
    pub fn invalid_duration(value: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidDuration {
            value: value.into(),
            reason: reason.into(),
        }
    }

    /// Create a new ScriptValidation error.
    pub fn script_validation(message: impl Into<String>) -> Self {
        Self::ScriptValidation(message.into())
    }

    /// Create a new ScriptLoad error.
    pub fn script_load(path: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::ScriptLoad {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Create a new ScriptSave error.
    pub fn script_save(path: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::ScriptSave {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Create a new UnsupportedPlatform error.
    pub fn unsupported_platform(message: impl Into<String>) -> Self {
        Self::UnsupportedPlatform(message.into())
    }
}
