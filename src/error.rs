//! User-facing errors that abort a command before any session state exists.

use std::path::PathBuf;

use thiserror::Error;

/// Errors reported to the user as a blocking message
#[derive(Debug, Error)]
pub enum ViewerError {
    #[error("Select or open a .component.ts file")]
    NoTarget,

    #[error("Not a valid .ts file (.spec.ts files are ignored): {}", .0.display())]
    InvalidTarget(PathBuf),

    #[error("Could not read the script file: {}", file_name(.path))]
    UnreadableScript {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

fn file_name(path: &std::path::Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
