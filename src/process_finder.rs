//! Process discovery.
//!
//! Resolves a process-name substring to a live process id so a caller (the
//! CLI in particular) can bind a session by process instead of by window
//! title.

use sysinfo::{ProcessesToUpdate, System};

/// Finds running processes by name.
///
/// Uses the `sysinfo` crate to enumerate running processes and match them by
/// a case-insensitive name substring. The returned pid feeds the session's
/// process-id bind path.
///
/// # Example
///
/// ```
/// use window_input_driver::ProcessFinder;
///
/// let mut finder = ProcessFinder::new();
/// match finder.find_pid("notepad") {
///     Some(pid) => println!("found process {pid}"),
///     None => println!("process not running"),
/// }
/// ```
pub struct ProcessFinder {
    system: System,
}

impl Clone for ProcessFinder {
    fn clone(&self) -> Self {
        Self {
            system: System::new(),
        }
    }
}

impl Default for ProcessFinder {
    fn default() -> Self {
        Self::new()
    }
}

impl ProcessFinder {
    pub fn new() -> Self {
        Self {
            system: System::new(),
        }
    }

    /// Find the pid of the first running process whose name contains `name`
    /// (case-insensitive). Enumeration order is OS-defined, so with several
    /// matching processes the choice is arbitrary.
    pub fn find_pid(&mut self, name: &str) -> Option<u32> {
        self.system.refresh_processes(ProcessesToUpdate::All, true);

        let name_lower = name.to_lowercase();
        for (pid, process) in self.system.processes() {
            let candidate = process.name().to_string_lossy().to_lowercase();
            if candidate.contains(&name_lower) {
                return Some(pid.as_u32());
            }
        }
        None
    }
}
