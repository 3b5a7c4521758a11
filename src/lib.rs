//! Angular Component Viewer
//!
//! Edit a component's script, markup and style as one merged scratch
//! document, split back into the three files on save.
//!
//! This library provides:
//! - The section codec merging and splitting the scratch document
//! - Companion file resolution by naming convention
//! - Scratch document session lifecycle
//! - An LSP server exposing the commands to editors

pub mod codec;
pub mod config;
pub mod error;
pub mod host;
pub mod language;
pub mod lsp;
pub mod resolver;
pub mod session;
pub mod target;
pub mod watch;

// Re-exports for clean public API
pub use codec::{extract, merge, SectionTag, Sections};
pub use config::Config;
pub use error::ViewerError;
pub use host::EditorHost;
pub use language::{cycle_language, LanguageId};
pub use resolver::{resolve_companions, ComponentTriple};
pub use session::{SessionManager, SessionState};
