//! Session manager
//!
//! Creates scratch documents, splits them on save and tears them down on
//! close. Teardown has one entry point, [`SessionManager::terminate`], fed by
//! the close event, the fallback timer and the external-removal watcher;
//! the first caller wins and later callers are no-ops.
//!
//! The session table lock is never held across an await on the host or the
//! filesystem. Every re-entry looks the session up again by scratch path and id.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::sync::Mutex;

use super::scratch::{self, ScratchClock};
use super::{clean_absolute, normalize, Session, SessionConfig, SessionState, TeardownReason};
use crate::codec::{self, Sections};
use crate::error::ViewerError;
use crate::host::{self, EditorHost};
use crate::resolver::ComponentTriple;
use crate::watch::WatchKind;

/// Confirmation shown after a save was split back into the component files
pub const SPLIT_CONFIRMATION: &str = "Component files updated ✔";

/// Grace period before an external removal is trusted; editors that save
/// through rename briefly remove the file
const REMOVAL_DEBOUNCE: Duration = Duration::from_millis(200);

pub struct SessionManager<H: EditorHost + 'static> {
    host: Arc<H>,
    config: SessionConfig,
    sessions: Mutex<HashMap<PathBuf, Session>>,
    next_id: AtomicU64,
    clock: ScratchClock,
}

impl<H: EditorHost + 'static> SessionManager<H> {
    pub fn new(host: Arc<H>, config: SessionConfig) -> Arc<Self> {
        Arc::new(Self {
            host,
            config,
            sessions: Mutex::new(HashMap::new()),
            next_id: AtomicU64::new(1),
            clock: ScratchClock::new(),
        })
    }

    pub fn host(&self) -> &Arc<H> {
        &self.host
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Open the combined view for `target`, or for the active document.
    ///
    /// Invalid targets and an unreadable script are shown to the user and
    /// returned as [`ViewerError`]; no session exists afterwards.
    pub async fn open_combined_view(self: &Arc<Self>, target: Option<PathBuf>) -> Result<PathBuf> {
        match self.create_session(target).await {
            Ok(scratch) => Ok(scratch),
            Err(err) => {
                if let Some(viewer_err) = err.downcast_ref::<ViewerError>() {
                    self.host.show_error(viewer_err.to_string()).await;
                }
                Err(err)
            }
        }
    }

    async fn create_session(self: &Arc<Self>, target: Option<PathBuf>) -> Result<PathBuf> {
        let script = match target {
            Some(path) => path,
            None => self.host.active_document().await.ok_or(ViewerError::NoTarget)?,
        };
        self.config.rules.validate(&script)?;

        let script = clean_absolute(&script);
        let triple = ComponentTriple::resolve(script);

        let script_text = tokio::fs::read_to_string(&triple.script)
            .await
            .map_err(|source| ViewerError::UnreadableScript {
                path: triple.script.clone(),
                source,
            })?;
        let markup_text = read_optional(&triple.markup).await;
        let style_text = read_optional(&triple.style).await;

        let document = codec::merge(&script_text, &markup_text, &style_text);
        let scratch_path = scratch::create(&triple.script, &document, &self.clock).await?;
        let key = normalize(&scratch_path);
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);

        log::info!(
            "Session {} created: {} (markup: {}, style: {})",
            id,
            scratch_path.display(),
            triple.markup.display(),
            triple.style.display()
        );

        {
            let mut sessions = self.sessions.lock().await;
            sessions.retain(|_, session| session.state != SessionState::Terminated);
            sessions.insert(key, Session::new(id, triple, scratch_path.clone()));
        }

        if let Err(err) = self.open_and_touch(&scratch_path).await {
            self.terminate(&scratch_path, TeardownReason::Aborted).await;
            return Err(err);
        }

        self.mark_open(&scratch_path, id).await;
        self.spawn_fallback(scratch_path.clone(), id);
        if self.config.watch_external_removal {
            self.spawn_removal_watch(&scratch_path, id).await;
        }

        Ok(scratch_path)
    }

    /// Show the scratch document, then insert and delete one character so
    /// the host treats it as an already-saved document
    async fn open_and_touch(&self, scratch_path: &Path) -> Result<()> {
        self.host
            .open_document(scratch_path)
            .await
            .with_context(|| {
                format!("Failed to open scratch document: {}", scratch_path.display())
            })?;

        let inserted = self.host.apply_edit(scratch_path, host::touch_insert()).await?;
        if inserted {
            self.host.apply_edit(scratch_path, host::touch_delete()).await?;
            log::debug!("Forced modification applied to {}", scratch_path.display());
        } else {
            log::debug!("Host declined the forced modification of {}", scratch_path.display());
        }
        Ok(())
    }

    async fn mark_open(&self, scratch_path: &Path, id: u64) {
        let mut sessions = self.sessions.lock().await;
        if let Some(session) = sessions.get_mut(&normalize(scratch_path)) {
            if session.id == id && session.state == SessionState::Created {
                session.state = SessionState::Open;
            }
        }
    }

    fn spawn_fallback(self: &Arc<Self>, scratch_path: PathBuf, id: u64) {
        let manager: Weak<Self> = Arc::downgrade(self);
        let delay = self.config.fallback_timeout;
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            if let Some(manager) = manager.upgrade() {
                manager.fallback_check(&scratch_path, id).await;
            }
        });
    }

    async fn spawn_removal_watch(self: &Arc<Self>, scratch_path: &Path, id: u64) {
        let (watcher, mut rx) = match scratch::watch_removal(scratch_path) {
            Ok(pair) => pair,
            Err(e) => {
                log::warn!("Could not watch {}: {}", scratch_path.display(), e);
                return;
            }
        };

        {
            let mut sessions = self.sessions.lock().await;
            match sessions.get_mut(&normalize(scratch_path)) {
                Some(session) if session.id == id && session.state.is_live() => {
                    session.removal_watcher = Some(watcher);
                }
                _ => return,
            }
        }

        let manager: Weak<Self> = Arc::downgrade(self);
        let scratch_path = scratch_path.to_path_buf();
        tokio::spawn(async move {
            while rx.recv().await.is_some() {
                tokio::time::sleep(REMOVAL_DEBOUNCE).await;
                if tokio::fs::try_exists(&scratch_path).await.unwrap_or(true) {
                    continue;
                }
                if let Some(manager) = manager.upgrade() {
                    log::info!("Scratch file {} removed externally", scratch_path.display());
                    manager
                        .terminate(&scratch_path, TeardownReason::ExternalRemoval)
                        .await;
                }
                break;
            }
        });
    }

    /// React to a saved document.
    ///
    /// Only the scratch document of a session with a live save watcher is
    /// split; every other document is ignored. `text` is the saved content
    /// when the host sends it, otherwise it is read back from disk.
    pub async fn handle_save(&self, path: &Path, text: Option<String>) -> Result<()> {
        let key = normalize(path);
        let (id, triple) = {
            let mut sessions = self.sessions.lock().await;
            let Some(session) = sessions.get_mut(&key) else {
                return Ok(());
            };
            if session.watches.is_live(WatchKind::PreSave) {
                log::trace!("Pre-save hook for session {}", session.id);
            }
            if !session.watches.is_live(WatchKind::Save) || !session.state.is_live() {
                return Ok(());
            }
            session.state = SessionState::Saving;
            (session.id, session.triple.clone())
        };

        let result = self.split_into(&triple, path, text).await;

        {
            let mut sessions = self.sessions.lock().await;
            if let Some(session) = sessions.get_mut(&key) {
                if session.id == id && session.state == SessionState::Saving {
                    session.state = SessionState::Open;
                }
            }
        }

        result?;
        log::info!("Session {} split into {}", id, triple.script.display());
        self.host.show_info(SPLIT_CONFIRMATION.to_string()).await;
        Ok(())
    }

    /// Extract all three sections, then write script, markup and style in
    /// that order. The first failed write stops the sequence.
    async fn split_into(
        &self,
        triple: &ComponentTriple,
        path: &Path,
        text: Option<String>,
    ) -> Result<()> {
        let text = match text {
            Some(text) => text,
            None => tokio::fs::read_to_string(path)
                .await
                .with_context(|| format!("Failed to read saved scratch file: {}", path.display()))?,
        };
        let sections = Sections::split(&text);

        for (target, content) in [
            (&triple.script, &sections.script),
            (&triple.markup, &sections.markup),
            (&triple.style, &sections.style),
        ] {
            tokio::fs::write(target, content)
                .await
                .with_context(|| format!("Failed to write {}", target.display()))?;
        }

        Ok(())
    }

    /// React to a closed document; returns true if this tore a session down
    pub async fn handle_close(&self, path: &Path) -> bool {
        {
            let sessions = self.sessions.lock().await;
            match sessions.get(&normalize(path)) {
                Some(session) if session.watches.is_live(WatchKind::Close) => {}
                _ => return false,
            }
        }
        log::debug!("Scratch document closed: {}", path.display());
        self.terminate(path, TeardownReason::Closed).await
    }

    /// Tear session `id` down if its document is no longer open
    pub async fn fallback_check(&self, path: &Path, id: u64) -> bool {
        {
            let sessions = self.sessions.lock().await;
            match sessions.get(&normalize(path)) {
                Some(session) if session.id == id && session.state.is_live() => {}
                _ => return false,
            }
        }

        if self.host.is_document_open(path).await {
            log::info!("(Fallback) {} is still open, keeping it", path.display());
            return false;
        }

        self.terminate(path, TeardownReason::Fallback).await
    }

    /// Delete the scratch file and dispose the session's watchers.
    ///
    /// Returns false when the session is unknown or its teardown already started.
    pub async fn terminate(&self, path: &Path, reason: TeardownReason) -> bool {
        let key = normalize(path);
        let (id, scratch_path) = {
            let mut sessions = self.sessions.lock().await;
            let Some(session) = sessions.get_mut(&key) else {
                return false;
            };
            if !session.begin_teardown() {
                log::debug!("Session {} already torn down ({:?} ignored)", session.id, reason);
                return false;
            }
            (session.id, session.scratch.clone())
        };

        scratch::remove(&scratch_path).await;

        let mut sessions = self.sessions.lock().await;
        if let Some(session) = sessions.get_mut(&key) {
            session.finish_teardown();
        }
        log::info!("Session {} terminated ({:?})", id, reason);
        true
    }

    /// Terminate every live session
    pub async fn shutdown(&self) -> usize {
        let live: Vec<PathBuf> = self.active_sessions().await;
        let mut count = 0;
        for path in live {
            if self.terminate(&path, TeardownReason::Shutdown).await {
                count += 1;
            }
        }
        count
    }

    pub async fn session_state(&self, path: &Path) -> Option<SessionState> {
        let sessions = self.sessions.lock().await;
        sessions.get(&normalize(path)).map(|session| session.state)
    }

    /// Whether the session's watcher of `kind` is still live
    pub async fn is_watching(&self, path: &Path, kind: WatchKind) -> bool {
        let sessions = self.sessions.lock().await;
        sessions
            .get(&normalize(path))
            .is_some_and(|session| session.watches.is_live(kind))
    }

    /// Scratch paths of all sessions whose teardown has not started
    pub async fn active_sessions(&self) -> Vec<PathBuf> {
        let sessions = self.sessions.lock().await;
        sessions
            .values()
            .filter(|session| session.state.is_live())
            .map(|session| session.scratch.clone())
            .collect()
    }

    pub async fn session_id(&self, path: &Path) -> Option<u64> {
        let sessions = self.sessions.lock().await;
        sessions.get(&normalize(path)).map(|session| session.id)
    }
}

/// Companion files that cannot be read are edited as empty sections
async fn read_optional(path: &Path) -> String {
    match tokio::fs::read_to_string(path).await {
        Ok(text) => text,
        Err(e) => {
            log::debug!("Treating {} as empty: {}", path.display(), e);
            String::new()
        }
    }
}
