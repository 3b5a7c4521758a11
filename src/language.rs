//! Language-cycle helper
//!
//! Rotates the active document's language label through
//! typescript -> html -> css -> typescript.

use std::fmt;

use anyhow::Result;

use crate::host::EditorHost;

/// A language label the helper knows how to rotate
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LanguageId {
    TypeScript,
    Html,
    Css,
}

impl LanguageId {
    pub const CYCLE: [LanguageId; 3] = [LanguageId::TypeScript, LanguageId::Html, LanguageId::Css];

    pub fn as_str(self) -> &'static str {
        match self {
            LanguageId::TypeScript => "typescript",
            LanguageId::Html => "html",
            LanguageId::Css => "css",
        }
    }

    pub fn parse(label: &str) -> Option<Self> {
        Self::CYCLE.into_iter().find(|id| id.as_str() == label)
    }

    pub fn next(self) -> Self {
        match self {
            LanguageId::TypeScript => LanguageId::Html,
            LanguageId::Html => LanguageId::Css,
            LanguageId::Css => LanguageId::TypeScript,
        }
    }
}

impl fmt::Display for LanguageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Reclassify the active document under the next label in the cycle.
///
/// Returns the new label, or `None` when there is no active document or its
/// label is not part of the cycle (an informational message is shown).
pub async fn cycle_language<H: EditorHost + ?Sized>(host: &H) -> Result<Option<LanguageId>> {
    let Some(path) = host.active_document().await else {
        host.show_info(messages::CYCLE_INVALID_STATE.to_string()).await;
        return Ok(None);
    };

    let current = host
        .document_language(&path)
        .await
        .and_then(|label| LanguageId::parse(&label));

    let Some(current) = current else {
        host.show_info(messages::CYCLE_INVALID_STATE.to_string()).await;
        return Ok(None);
    };

    let next = current.next();
    host.set_document_language(&path, next).await?;
    log::debug!("Language of {} changed {} -> {}", path.display(), current, next);
    host.show_info(messages::language_changed(next)).await;

    Ok(Some(next))
}

pub mod messages {
    use super::LanguageId;

    pub const CYCLE_INVALID_STATE: &str =
        "Place the cursor in a combined view document with a supported language.";

    pub fn language_changed(language: LanguageId) -> String {
        format!("Document language changed to: {}", language.as_str().to_uppercase())
    }
}
