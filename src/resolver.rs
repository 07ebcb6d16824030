//! Window binding and re-resolution.
//!
//! Two jobs live here: matching a fuzzy bind query against a fresh directory
//! snapshot, and turning a possibly-stale [`WindowIdentity`] back into a live
//! [`WindowRef`] before input is dispatched.
//!
//! Both scans are first-match-wins over whatever order the directory yields.
//! That order is OS enumeration order, which is not guaranteed stable across
//! calls or across restarts of the target window, so binding is a
//! best-effort, order-dependent policy.

use tracing::{debug, warn};

use crate::directory::{WindowDirectory, WindowIdentity, WindowRef};
use crate::error::{Result, WidError};

/// A bind query: a window-title substring or an exact process id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BindQuery {
    /// Case-sensitive substring of the window title.
    Title(String),
    /// Exact process id.
    Process(u32),
}

impl From<&str> for BindQuery {
    fn from(title: &str) -> Self {
        BindQuery::Title(title.to_string())
    }
}

impl From<String> for BindQuery {
    fn from(title: String) -> Self {
        BindQuery::Title(title)
    }
}

impl From<u32> for BindQuery {
    fn from(process_id: u32) -> Self {
        BindQuery::Process(process_id)
    }
}

impl std::fmt::Display for BindQuery {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BindQuery::Title(title) => write!(f, "title contains '{title}'"),
            BindQuery::Process(pid) => write!(f, "pid == {pid}"),
        }
    }
}

impl BindQuery {
    fn matches(&self, window: &WindowIdentity) -> bool {
        match self {
            BindQuery::Title(title) => window.title.contains(title.as_str()),
            BindQuery::Process(pid) => window.process_id == *pid,
        }
    }
}

/// Scan a fresh directory snapshot and return the first window matching the
/// query, in directory order.
pub fn find_match<D>(directory: &mut D, query: &BindQuery) -> Result<WindowIdentity>
where
    D: WindowDirectory + ?Sized,
{
    let snapshot = directory.enumerate()?;
    match snapshot.into_iter().find(|window| query.matches(window)) {
        Some(window) => {
            debug!(
                title = %window.title,
                pid = window.process_id,
                tid = window.thread_id,
                "bind query matched"
            );
            Ok(window)
        }
        None => Err(WidError::bind_failed(query.to_string())),
    }
}

/// Resolve a stored identity to a live window reference.
///
/// The direct path looks the window up by its exact stored title and accepts
/// the reference when it is valid and its process id or thread id matches the
/// stored identity.
///
/// When the direct path fails and `allow_fallback` is set, the directory is
/// re-snapshotted and exactly one of three matchers is tried, in this fixed
/// order: substring match on the stored title, exact process-id match, exact
/// thread-id match. The first matcher that finds a window replaces `identity`
/// wholesale and triggers exactly one retry of the direct lookup; a failed
/// retry fails the resolution without trying further matchers.
pub fn resolve<D>(
    directory: &mut D,
    identity: &mut WindowIdentity,
    allow_fallback: bool,
) -> Result<WindowRef>
where
    D: WindowDirectory + ?Sized,
{
    if let Some(window) = lookup_verified(directory, identity) {
        return Ok(window);
    }

    if !allow_fallback {
        return Err(WidError::resolution_failed(
            identity.title.clone(),
            identity.process_id,
            identity.thread_id,
        ));
    }

    warn!(
        title = %identity.title,
        pid = identity.process_id,
        tid = identity.thread_id,
        "direct lookup failed, trying fallback matchers"
    );

    let snapshot = directory.enumerate()?;
    let replacement = snapshot
        .iter()
        .find(|w| w.title.contains(identity.title.as_str()))
        .or_else(|| snapshot.iter().find(|w| w.process_id == identity.process_id))
        .or_else(|| snapshot.iter().find(|w| w.thread_id == identity.thread_id));

    if let Some(window) = replacement {
        debug!(title = %window.title, "fallback matched, retrying direct lookup");
        *identity = window.clone();
        if let Some(window) = lookup_verified(directory, identity) {
            return Ok(window);
        }
    }

    Err(WidError::resolution_failed(
        identity.title.clone(),
        identity.process_id,
        identity.thread_id,
    ))
}

/// Direct lookup by exact title, verified against the stored ids.
///
/// A reference passes when its process id or thread id matches the stored
/// identity and the reference is currently valid. Validity is an indication
/// only; the window can change state right after the check.
fn lookup_verified<D>(directory: &mut D, identity: &WindowIdentity) -> Option<WindowRef>
where
    D: WindowDirectory + ?Sized,
{
    let window = directory.find_by_title(&identity.title)?;
    let ids_match =
        window.process_id == identity.process_id || window.thread_id == identity.thread_id;
    if ids_match && window.is_valid {
        Some(window)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::directory::WindowGeometry;
    use crate::error::Result;

    /// In-memory directory: a fixed snapshot plus a title → ref lookup table.
    struct FakeDirectory {
        snapshot: Vec<WindowIdentity>,
        refs: Vec<(String, WindowRef)>,
        enumerate_calls: usize,
    }

    impl FakeDirectory {
        fn new(snapshot: Vec<WindowIdentity>) -> Self {
            // By default every snapshot entry is directly resolvable.
            let refs = snapshot
                .iter()
                .enumerate()
                .map(|(i, w)| {
                    (
                        w.title.clone(),
                        WindowRef {
                            raw: (i + 1) as isize,
                            process_id: w.process_id,
                            thread_id: w.thread_id,
                            is_valid: true,
                        },
                    )
                })
                .collect();
            Self {
                snapshot,
                refs,
                enumerate_calls: 0,
            }
        }

        fn without_ref(mut self, title: &str) -> Self {
            self.refs.retain(|(t, _)| t != title);
            self
        }

        fn with_ref(mut self, title: &str, window: WindowRef) -> Self {
            self.refs.retain(|(t, _)| t != title);
            self.refs.push((title.to_string(), window));
            self
        }
    }

    impl WindowDirectory for FakeDirectory {
        fn enumerate(&mut self) -> Result<Vec<WindowIdentity>> {
            self.enumerate_calls += 1;
            Ok(self.snapshot.clone())
        }

        fn find_by_title(&mut self, title: &str) -> Option<WindowRef> {
            self.refs
                .iter()
                .find(|(t, _)| t == title)
                .map(|(_, window)| *window)
        }

        fn geometry(&mut self, _window: &WindowRef) -> Result<WindowGeometry> {
            Ok(WindowGeometry::default())
        }
    }

    fn window(title: &str, pid: u32, tid: u32) -> WindowIdentity {
        WindowIdentity {
            title: title.to_string(),
            is_visible: true,
            process_id: pid,
            thread_id: tid,
        }
    }

    #[test]
    fn test_find_match_by_title_substring() {
        let mut directory = FakeDirectory::new(vec![
            window("Calculator", 10, 11),
            window("Untitled - Notepad", 20, 21),
        ]);
        let found = find_match(&mut directory, &BindQuery::from("Notepad")).unwrap();
        assert_eq!(found.title, "Untitled - Notepad");
        assert_eq!(found.process_id, 20);
    }

    #[test]
    fn test_find_match_takes_first_in_directory_order() {
        let mut directory = FakeDirectory::new(vec![
            window("Notepad - a.txt", 1, 2),
            window("Notepad - b.txt", 3, 4),
        ]);
        let found = find_match(&mut directory, &BindQuery::from("Notepad")).unwrap();
        assert_eq!(found.title, "Notepad - a.txt");
    }

    #[test]
    fn test_find_match_by_process_id() {
        let mut directory = FakeDirectory::new(vec![
            window("Calculator", 10, 11),
            window("Untitled - Notepad", 20, 21),
        ]);
        let found = find_match(&mut directory, &BindQuery::from(20u32)).unwrap();
        assert_eq!(found.title, "Untitled - Notepad");
    }

    #[test]
    fn test_find_match_no_candidates() {
        let mut directory = FakeDirectory::new(vec![window("Calculator", 10, 11)]);
        let result = find_match(&mut directory, &BindQuery::from("Notepad"));
        assert!(matches!(result, Err(WidError::BindFailed { .. })));
    }

    #[test]
    fn test_resolve_direct_hit() {
        let mut directory = FakeDirectory::new(vec![window("Untitled - Notepad", 20, 21)]);
        let mut identity = window("Untitled - Notepad", 20, 21);
        let resolved = resolve(&mut directory, &mut identity, true).unwrap();
        assert_eq!(resolved.process_id, 20);
        // No fallback snapshot needed on the direct path.
        assert_eq!(directory.enumerate_calls, 0);
    }

    #[test]
    fn test_resolve_accepts_thread_id_match_alone() {
        // Same title and tid but a new pid (e.g. window reused by a child
        // process) still verifies.
        let mut directory = FakeDirectory::new(vec![window("Untitled - Notepad", 99, 21)]);
        let mut identity = window("Untitled - Notepad", 20, 21);
        assert!(resolve(&mut directory, &mut identity, true).is_ok());
    }

    #[test]
    fn test_resolve_rejects_invalid_reference() {
        let stale = WindowRef {
            raw: 7,
            process_id: 20,
            thread_id: 21,
            is_valid: false,
        };
        let mut directory = FakeDirectory::new(vec![window("Untitled - Notepad", 20, 21)])
            .with_ref("Untitled - Notepad", stale);
        let mut identity = window("Untitled - Notepad", 20, 21);
        // Direct lookup rejects the invalid ref; the fallback replaces the
        // identity with the snapshot entry, whose retry hits the same ref.
        assert!(resolve(&mut directory, &mut identity, true).is_err());
    }

    #[test]
    fn test_resolve_fallback_by_title_substring() {
        // The window was renamed from "Notepad" to "readme.txt - Notepad":
        // direct lookup of the old exact title fails, fallback (a) matches.
        let mut directory =
            FakeDirectory::new(vec![window("readme.txt - Notepad", 20, 21)]);
        let mut identity = window("Notepad", 20, 21);
        let resolved = resolve(&mut directory, &mut identity, true).unwrap();
        assert_eq!(resolved.process_id, 20);
        assert_eq!(identity.title, "readme.txt - Notepad");
        assert_eq!(directory.enumerate_calls, 1);
    }

    #[test]
    fn test_resolve_fallback_by_process_id() {
        // Title changed completely; pid still matches.
        let mut directory = FakeDirectory::new(vec![window("readme.txt - Editor", 20, 99)]);
        let mut identity = window("Untitled - Notepad", 20, 21);
        let resolved = resolve(&mut directory, &mut identity, true).unwrap();
        assert_eq!(resolved.process_id, 20);
        assert_eq!(identity.title, "readme.txt - Editor");
    }

    #[test]
    fn test_resolve_fallback_by_thread_id() {
        let mut directory = FakeDirectory::new(vec![window("readme.txt - Editor", 99, 21)]);
        let mut identity = window("Untitled - Notepad", 20, 21);
        let resolved = resolve(&mut directory, &mut identity, true).unwrap();
        assert_eq!(resolved.thread_id, 21);
        assert_eq!(identity.title, "readme.txt - Editor");
    }

    #[test]
    fn test_resolve_fallback_order_prefers_title() {
        // One window matches by title substring, another by pid; the title
        // matcher runs first over the whole snapshot.
        let mut directory = FakeDirectory::new(vec![
            window("Other App", 20, 99),
            window("Untitled - Notepad v2", 77, 88),
        ]);
        let mut identity = window("Untitled - Notepad", 20, 21);
        let resolved = resolve(&mut directory, &mut identity, true).unwrap();
        assert_eq!(resolved.process_id, 77);
        assert_eq!(identity.title, "Untitled - Notepad v2");
    }

    #[test]
    fn test_resolve_no_fallback_when_disabled() {
        let mut directory = FakeDirectory::new(vec![window("readme.txt - Notepad", 20, 21)]);
        let mut identity = window("Notepad", 20, 21);
        let result = resolve(&mut directory, &mut identity, false);
        assert!(matches!(result, Err(WidError::ResolutionFailed { .. })));
        assert_eq!(directory.enumerate_calls, 0);
        // Identity untouched without fallback.
        assert_eq!(identity.title, "Notepad");
    }

    #[test]
    fn test_resolve_single_retry_not_repeated() {
        // Fallback finds a replacement, but the replacement's direct lookup
        // fails too; resolution must fail after exactly one retry rather
        // than looping.
        let mut directory = FakeDirectory::new(vec![window("readme.txt - Notepad", 20, 21)])
            .without_ref("readme.txt - Notepad");
        let mut identity = window("Notepad", 20, 21);
        let result = resolve(&mut directory, &mut identity, true);
        assert!(matches!(result, Err(WidError::ResolutionFailed { .. })));
        assert_eq!(directory.enumerate_calls, 1);
        // The failed retry still leaves the replaced identity in place.
        assert_eq!(identity.title, "readme.txt - Notepad");
    }

    #[test]
    fn test_resolve_fails_when_nothing_matches() {
        let mut directory = FakeDirectory::new(vec![window("Calculator", 1, 2)]);
        let mut identity = window("Untitled - Notepad", 20, 21);
        let result = resolve(&mut directory, &mut identity, true);
        assert!(matches!(result, Err(WidError::ResolutionFailed { .. })));
    }
}
