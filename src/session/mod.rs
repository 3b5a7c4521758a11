//! Scratch document sessions
//!
//! A session ties one component to the temporary merged document it is being
//! edited through, from creation until the document is closed or the
//! fallback timer finds it gone.

pub mod manager;
pub mod scratch;

use std::path::{Component, Path, PathBuf};
use std::time::Duration;

use notify::RecommendedWatcher;

use crate::resolver::ComponentTriple;
use crate::target::TargetRules;
use crate::watch::SessionWatches;

pub use manager::SessionManager;

/// Delay before the fallback check looks for an unclosed scratch document
pub const DEFAULT_FALLBACK_TIMEOUT: Duration = Duration::from_secs(50);

/// Lifecycle state of a session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Created,
    Open,
    Saving,
    Closing,
    Terminated,
}

impl SessionState {
    /// Whether teardown has not started yet
    pub fn is_live(self) -> bool {
        matches!(
            self,
            SessionState::Created | SessionState::Open | SessionState::Saving
        )
    }
}

/// What triggered a teardown
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TeardownReason {
    Closed,
    Fallback,
    ExternalRemoval,
    Aborted,
    Shutdown,
}

/// Settings for the session manager
#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub fallback_timeout: Duration,
    pub watch_external_removal: bool,
    pub rules: TargetRules,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            fallback_timeout: DEFAULT_FALLBACK_TIMEOUT,
            watch_external_removal: true,
            rules: TargetRules::default(),
        }
    }
}

/// One open-to-teardown cycle of a scratch document
pub struct Session {
    pub id: u64,
    pub triple: ComponentTriple,
    pub scratch: PathBuf,
    pub state: SessionState,
    pub watches: SessionWatches,
    removal_watcher: Option<RecommendedWatcher>,
}

impl Session {
    pub fn new(id: u64, triple: ComponentTriple, scratch: PathBuf) -> Self {
        Self {
            id,
            triple,
            scratch,
            state: SessionState::Created,
            watches: SessionWatches::register(),
            removal_watcher: None,
        }
    }

    /// Move to `Closing` and dispose every watcher.
    ///
    /// Returns false if teardown already started, in which case nothing changes.
    pub fn begin_teardown(&mut self) -> bool {
        if !self.state.is_live() {
            return false;
        }
        self.state = SessionState::Closing;
        self.watches.dispose_all();
        self.removal_watcher = None;
        true
    }

    pub fn finish_teardown(&mut self) {
        self.state = SessionState::Terminated;
    }
}

/// Absolute form of `path` with `.` and `..` segments collapsed lexically
pub fn clean_absolute(path: &Path) -> PathBuf {
    let absolute = std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf());
    let mut cleaned = PathBuf::new();
    for component in absolute.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                cleaned.pop();
            }
            other => cleaned.push(other),
        }
    }
    cleaned
}

/// Key under which a scratch path is tracked: absolute, cleaned and lowercased
pub fn normalize(path: &Path) -> PathBuf {
    PathBuf::from(clean_absolute(path).to_string_lossy().to_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session() -> Session {
        Session::new(
            1,
            ComponentTriple {
                script: PathBuf::from("/a/foo.component.ts"),
                markup: PathBuf::from("/a/foo.component.html"),
                style: PathBuf::from("/a/foo.component.css"),
            },
            PathBuf::from("/a/foo.component-1.ts"),
        )
    }

    #[test]
    fn test_teardown_runs_once() {
        let mut session = session();
        assert!(session.begin_teardown());
        assert_eq!(session.state, SessionState::Closing);
        assert!(session.watches.all_disposed());

        assert!(!session.begin_teardown());
        session.finish_teardown();
        assert!(!session.begin_teardown());
        assert_eq!(session.state, SessionState::Terminated);
    }

    #[test]
    fn test_normalize_is_case_insensitive() {
        assert_eq!(
            normalize(Path::new("/Work/App/Foo-1.ts")),
            normalize(Path::new("/work/app/foo-1.ts"))
        );
    }

    #[test]
    fn test_normalize_collapses_dot_segments() {
        assert_eq!(
            normalize(Path::new("/a/b/../b/./foo-1.ts")),
            normalize(Path::new("/a/b/foo-1.ts"))
        );
        assert_eq!(clean_absolute(Path::new("/../a/foo-1.ts")), PathBuf::from("/a/foo-1.ts"));
    }

    #[test]
    fn test_normalize_resolves_relative_paths() {
        let relative = normalize(Path::new("foo-1.ts"));
        assert!(relative.is_absolute());
    }
}
