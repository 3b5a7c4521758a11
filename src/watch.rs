//! Per-session watcher handles
//!
//! A session owns one handle per event it reacts to. Event dispatch only
//! consults live handles, and disposing a handle twice does nothing.

/// Event a watcher reacts to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatchKind {
    /// Splits the scratch document back into the component files
    Save,
    /// Runs before `Save` on the same event; currently performs no action
    PreSave,
    /// Tears the session down when the scratch document closes
    Close,
}

/// Disposable watcher registration
#[derive(Debug)]
pub struct Watch {
    kind: WatchKind,
    live: bool,
}

impl Watch {
    pub fn new(kind: WatchKind) -> Self {
        Self { kind, live: true }
    }

    pub fn kind(&self) -> WatchKind {
        self.kind
    }

    pub fn is_live(&self) -> bool {
        self.live
    }

    /// Returns true if this call disposed the handle
    pub fn dispose(&mut self) -> bool {
        std::mem::replace(&mut self.live, false)
    }
}

/// The three handles owned by a session
#[derive(Debug)]
pub struct SessionWatches {
    pub save: Watch,
    pub pre_save: Watch,
    pub close: Watch,
}

impl SessionWatches {
    pub fn register() -> Self {
        Self {
            save: Watch::new(WatchKind::Save),
            pre_save: Watch::new(WatchKind::PreSave),
            close: Watch::new(WatchKind::Close),
        }
    }

    pub fn get(&self, kind: WatchKind) -> &Watch {
        match kind {
            WatchKind::Save => &self.save,
            WatchKind::PreSave => &self.pre_save,
            WatchKind::Close => &self.close,
        }
    }

    pub fn is_live(&self, kind: WatchKind) -> bool {
        self.get(kind).is_live()
    }

    /// Dispose every handle; returns how many were still live
    pub fn dispose_all(&mut self) -> usize {
        [&mut self.save, &mut self.pre_save, &mut self.close]
            .into_iter()
            .map(Watch::dispose)
            .filter(|disposed| *disposed)
            .count()
    }

    pub fn all_disposed(&self) -> bool {
        !self.save.is_live() && !self.pre_save.is_live() && !self.close.is_live()
    }
}
