//! Scratch file naming, creation, removal and external-removal watching.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use anyhow::{Context, Result};
use notify::{Config, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::io::AsyncWriteExt;
use tokio::sync::mpsc;

/// `<dir>/<stem>-<millis>.<ext>` next to the script
pub fn scratch_path(script: &Path, millis: u64) -> PathBuf {
    let dir = script.parent().unwrap_or_else(|| Path::new(""));
    let stem = script
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let name = match script.extension() {
        Some(ext) => format!("{}-{}.{}", stem, millis, ext.to_string_lossy()),
        None => format!("{}-{}", stem, millis),
    };
    dir.join(name)
}

fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or_default()
}

/// Millisecond timestamps for scratch names, strictly increasing.
///
/// A timestamp is never handed out twice, so two scratch names from the same
/// clock differ even when compared case-insensitively.
#[derive(Debug, Default)]
pub struct ScratchClock {
    last: AtomicU64,
}

impl ScratchClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// The current time, or one past the last issued value if that is later
    pub fn next(&self) -> u64 {
        let now = now_millis();
        let (Ok(previous) | Err(previous)) = self
            .last
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |last| Some(now.max(last + 1)));
        now.max(previous + 1)
    }
}

/// Create a scratch file that did not exist before and write `contents` to it.
///
/// Each attempt takes a fresh timestamp from `clock` until an unused name is found.
pub async fn create(script: &Path, contents: &str, clock: &ScratchClock) -> Result<PathBuf> {
    loop {
        let path = scratch_path(script, clock.next());
        match tokio::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .await
        {
            Ok(mut file) => {
                file.write_all(contents.as_bytes())
                    .await
                    .with_context(|| format!("Failed to write scratch file: {}", path.display()))?;
                file.flush().await?;
                return Ok(path);
            }
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => continue,
            Err(e) => {
                return Err(e).with_context(|| {
                    format!("Failed to create scratch file: {}", path.display())
                });
            }
        }
    }
}

/// Delete a scratch file permanently.
///
/// A file that is already gone is fine; other failures are logged.
pub async fn remove(path: &Path) -> bool {
    match tokio::fs::remove_file(path).await {
        Ok(()) => {
            log::info!("Removed scratch file {}", path.display());
            true
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            log::debug!("Scratch file {} was already removed", path.display());
            false
        }
        Err(e) => {
            log::warn!("Could not remove scratch file {}: {}", path.display(), e);
            false
        }
    }
}

/// Watch the scratch file's directory and signal when the file is removed.
///
/// Events are matched on the file name only: some backends report the
/// directory in canonical form (`/private/var` for `/var` on macOS).
/// The receiver closes once the returned watcher is dropped.
pub fn watch_removal(path: &Path) -> Result<(RecommendedWatcher, mpsc::UnboundedReceiver<()>)> {
    let (tx, rx) = mpsc::unbounded_channel();
    let target = path
        .file_name()
        .with_context(|| format!("Scratch file has no file name: {}", path.display()))?
        .to_os_string();
    let dir = path
        .parent()
        .with_context(|| format!("Scratch file has no parent directory: {}", path.display()))?
        .to_path_buf();

    let mut watcher = RecommendedWatcher::new(
        move |res: Result<Event, notify::Error>| match res {
            Ok(event) => {
                if let EventKind::Remove(_) = event.kind {
                    if event.paths.iter().any(|p| p.file_name() == Some(target.as_os_str())) {
                        let _ = tx.send(());
                    }
                }
            }
            Err(e) => log::warn!("Scratch file watcher error: {}", e),
        },
        Config::default().with_poll_interval(Duration::from_secs(1)),
    )?;
    watcher.watch(&dir, RecursiveMode::NonRecursive)?;

    Ok((watcher, rx))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scratch_name_keeps_script_extension() {
        let path = scratch_path(Path::new("/app/foo.component.ts"), 1700000000000);
        assert_eq!(path, PathBuf::from("/app/foo.component-1700000000000.ts"));
    }

    #[test]
    fn test_clock_is_strictly_increasing() {
        let clock = ScratchClock::new();
        let mut previous = clock.next();
        for _ in 0..1000 {
            let next = clock.next();
            assert!(next > previous);
            previous = next;
        }
    }

    #[tokio::test]
    async fn test_create_never_reuses_a_name() {
        let dir = tempfile::tempdir().unwrap();
        let script = dir.path().join("foo.component.ts");
        let clock = ScratchClock::new();

        let first = create(&script, "a", &clock).await.unwrap();
        let second = create(&script, "b", &clock).await.unwrap();
        assert_ne!(first, second);
        assert_eq!(std::fs::read_to_string(&first).unwrap(), "a");
        assert_eq!(std::fs::read_to_string(&second).unwrap(), "b");

        // A removed name is not handed out again
        std::fs::remove_file(&first).unwrap();
        let third = create(&script, "c", &clock).await.unwrap();
        assert_ne!(third, first);
    }

    #[tokio::test]
    async fn test_names_differing_only_by_case_get_distinct_timestamps() {
        let dir = tempfile::tempdir().unwrap();
        let clock = ScratchClock::new();

        let upper = create(&dir.path().join("Foo.component.ts"), "a", &clock)
            .await
            .unwrap();
        let lower = create(&dir.path().join("foo.component.ts"), "b", &clock)
            .await
            .unwrap();
        assert_ne!(
            upper.to_string_lossy().to_lowercase(),
            lower.to_string_lossy().to_lowercase()
        );
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_removal_is_seen_through_a_symlinked_directory() {
        let dir = tempfile::tempdir().unwrap();
        let real = dir.path().join("real");
        std::fs::create_dir(&real).unwrap();
        let alias = dir.path().join("alias");
        std::os::unix::fs::symlink(&real, &alias).unwrap();
        std::fs::write(real.join("foo-1.ts"), "x").unwrap();

        let (_watcher, mut rx) = watch_removal(&alias.join("foo-1.ts")).unwrap();
        std::fs::remove_file(real.join("foo-1.ts")).unwrap();

        let signalled = tokio::time::timeout(Duration::from_secs(5), rx.recv())
            .await
            .expect("Removal should be reported");
        assert_eq!(signalled, Some(()));
    }

    #[tokio::test]
    async fn test_remove_tolerates_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("gone-1.ts");
        std::fs::write(&path, "x").unwrap();

        assert!(remove(&path).await);
        assert!(!path.exists());
        assert!(!remove(&path).await);
    }
}
