//! Script files: a JSON description of a timed key sequence.
//!
//! A script names the target window, the execution mode, and an ordered list
//! of keys with per-key delays. Delays accept `"250ms"`, `"1s"`, `"2m"`, or a
//! bare integer meaning milliseconds.
//!
//! ```json
//! {
//!   "window_title": "Notepad",
//!   "blocking": true,
//!   "keys": [
//!     {"key": "h", "delay_before": "250ms"},
//!     {"key": "i", "delay_before": "250ms"},
//!     {"key": "enter", "delay_before": "1s"}
//!   ]
//! }
//! ```

use std::fs;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Result, WidError};
use crate::events::{KeyEvent, TimedBatch};
use crate::keys;

/// One key press in a script, with the wait before it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScriptKey {
    /// Key name, as understood by [`keys::lookup`].
    pub key: String,

    /// Wait before this key, measured from the previous dispatch.
    #[serde(default, with = "duration_format")]
    pub delay_before: Duration,
}

/// A loadable automation script.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Script {
    /// Substring to search window titles for.
    pub window_title: String,

    /// Execute synchronously instead of through the queue.
    #[serde(default = "default_blocking")]
    pub blocking: bool,

    /// Ordered key sequence.
    #[serde(default)]
    pub keys: Vec<ScriptKey>,
}

fn default_blocking() -> bool {
    true
}

impl Script {
    /// Load and parse a script file.
    pub fn from_file(path: &str) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .map_err(|e| WidError::script_load(path, e.to_string()))?;
        let script: Script = serde_json::from_str(&contents)
            .map_err(|e| WidError::script_load(path, e.to_string()))?;
        script.validate()?;
        Ok(script)
    }

    /// Write the script as pretty-printed JSON.
    pub fn save_to_file(&self, path: &str) -> Result<()> {
        let contents = serde_json::to_string_pretty(self)
            .map_err(|e| WidError::script_save(path, e.to_string()))?;
        fs::write(path, contents).map_err(|e| WidError::script_save(path, e.to_string()))?;
        Ok(())
    }

    /// Check the script for problems that would only surface mid-run.
    pub fn validate(&self) -> Result<()> {
        if self.window_title.is_empty() {
            return Err(WidError::script_validation("window_title cannot be empty"));
        }
        if self.keys.is_empty() {
            return Err(WidError::script_validation(
                "script must contain at least one key",
            ));
        }
        for entry in &self.keys {
            keys::lookup(&entry.key)?;
        }
        Ok(())
    }

    /// Convert the key sequence into scheduler batches, one per key.
    pub fn to_batches(&self) -> Result<Vec<TimedBatch<KeyEvent>>> {
        self.keys
            .iter()
            .map(|entry| {
                let event = keys::lookup(&entry.key)?.typed();
                Ok(TimedBatch::single(event, entry.delay_before))
            })
            .collect()
    }
}

/// Parse a duration string: `"250ms"`, `"5s"`, `"2m"`, or a bare integer in
/// milliseconds. Case-insensitive; surrounding whitespace is ignored.
pub fn parse_duration(value: &str) -> Result<Duration> {
    let normalized = value.trim().to_lowercase();
    if normalized.is_empty() {
        return Err(WidError::invalid_duration(value, "empty duration"));
    }

    let (number, unit) = match normalized.find(|c: char| !c.is_ascii_digit()) {
        Some(split) => normalized.split_at(split),
        None => (normalized.as_str(), "ms"),
    };

    let amount: u64 = number
        .parse()
        .map_err(|_| WidError::invalid_duration(value, "expected a non-negative integer"))?;

    match unit {
        "ms" => Ok(Duration::from_millis(amount)),
        "s" => Ok(Duration::from_secs(amount)),
        "m" => Ok(Duration::from_secs(amount * 60)),
        _ => Err(WidError::invalid_duration(
            value,
            format!("unknown unit '{unit}'"),
        )),
    }
}

/// Format a duration back into the script grammar (always milliseconds).
pub fn format_duration(duration: Duration) -> String {
    format!("{}ms", duration.as_millis())
}

mod duration_format {
    use super::{format_duration, parse_duration};
    use serde::{de, Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&format_duration(*duration))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let value = String::deserialize(deserializer)?;
        parse_duration(&value).map_err(de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_duration_units() {
        assert_eq!(parse_duration("0ms").unwrap(), Duration::from_millis(0));
        assert_eq!(parse_duration("250ms").unwrap(), Duration::from_millis(250));
        assert_eq!(parse_duration("5s").unwrap(), Duration::from_secs(5));
        assert_eq!(parse_duration("2m").unwrap(), Duration::from_secs(120));
        assert_eq!(parse_duration("1000").unwrap(), Duration::from_millis(1000));
    }

    #[test]
    fn test_parse_duration_forgiving_input() {
        assert_eq!(parse_duration("5S").unwrap(), Duration::from_secs(5));
        assert_eq!(parse_duration(" 2m ").unwrap(), Duration::from_secs(120));
    }

    #[test]
    fn test_parse_duration_rejects_garbage() {
        assert!(parse_duration("").is_err());
        assert!(parse_duration("abc").is_err());
        assert!(parse_duration("1000x").is_err());
        assert!(parse_duration("-1000ms").is_err());
    }

    #[test]
    fn test_script_deserialization() {
        let json = r#"
        {
            "window_title": "Notepad",
            "blocking": false,
            "keys": [
                {"key": "h", "delay_before": "250ms"},
                {"key": "enter", "delay_before": "1s"}
            ]
        }
        "#;
        let script: Script = serde_json::from_str(json).unwrap();
        assert_eq!(script.window_title, "Notepad");
        assert!(!script.blocking);
        assert_eq!(script.keys.len(), 2);
        assert_eq!(script.keys[0].key, "h");
        assert_eq!(script.keys[0].delay_before, Duration::from_millis(250));
        assert_eq!(script.keys[1].delay_before, Duration::from_secs(1));
        assert!(script.validate().is_ok());
    }

    #[test]
    fn test_script_defaults() {
        let json = r#"{"window_title": "Notepad", "keys": [{"key": "a"}]}"#;
        let script: Script = serde_json::from_str(json).unwrap();
        assert!(script.blocking);
        assert_eq!(script.keys[0].delay_before, Duration::ZERO);
    }

    #[test]
    fn test_validation_errors() {
        let script = Script {
            window_title: String::new(),
            blocking: true,
            keys: vec![ScriptKey {
                key: "a".to_string(),
                delay_before: Duration::ZERO,
            }],
        };
        assert!(script.validate().is_err());

        let script = Script {
            window_title: "Notepad".to_string(),
            blocking: true,
            keys: Vec::new(),
        };
        assert!(script.validate().is_err());

        let script = Script {
            window_title: "Notepad".to_string(),
            blocking: true,
            keys: vec![ScriptKey {
                key: "notakey".to_string(),
                delay_before: Duration::ZERO,
            }],
        };
        assert!(script.validate().is_err());
    }

    #[test]
    fn test_to_batches() {
        let script = Script {
            window_title: "Notepad".to_string(),
            blocking: true,
            keys: vec![
                ScriptKey {
                    key: "h".to_string(),
                    delay_before: Duration::from_millis(250),
                },
                ScriptKey {
                    key: "left".to_string(),
                    delay_before: Duration::from_millis(100),
                },
            ],
        };
        let batches = script.to_batches().unwrap();
        assert_eq!(batches.len(), 2);
        assert_eq!(batches[0].events().len(), 1);
        assert_eq!(batches[0].delay_before(), Duration::from_millis(250));
        assert!(batches[1].events()[0].extended());
    }
}
