//! Editor host surface
//!
//! Everything the session manager and the language helper need from the
//! editor. The LSP backend provides the real implementation; tests use an
//! in-memory one.

use std::path::{Path, PathBuf};

use anyhow::Result;
use tower_lsp::lsp_types::{Position, Range, TextEdit};

use crate::language::LanguageId;

#[tower_lsp::async_trait]
pub trait EditorHost: Send + Sync {
    async fn show_info(&self, message: String);

    async fn show_error(&self, message: String);

    /// Path of the document the user is currently working in
    async fn active_document(&self) -> Option<PathBuf>;

    /// Display a document, taking focus
    async fn open_document(&self, path: &Path) -> Result<()>;

    /// Apply a single edit to an open document; returns whether it was applied
    async fn apply_edit(&self, path: &Path, edit: TextEdit) -> Result<bool>;

    async fn is_document_open(&self, path: &Path) -> bool;

    async fn document_language(&self, path: &Path) -> Option<String>;

    async fn set_document_language(&self, path: &Path, language: LanguageId) -> Result<()>;
}

/// Edit inserting a single space at the start of the document
pub fn touch_insert() -> TextEdit {
    TextEdit {
        range: Range::new(Position::new(0, 0), Position::new(0, 0)),
        new_text: " ".to_string(),
    }
}

/// Edit removing the character inserted by [`touch_insert`]
pub fn touch_delete() -> TextEdit {
    TextEdit {
        range: Range::new(Position::new(0, 0), Position::new(0, 1)),
        new_text: String::new(),
    }
}
