//! [`EditorHost`] over an LSP client connection.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{anyhow, bail, Result};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tower_lsp::lsp_types::notification::Notification;
use tower_lsp::lsp_types::*;
use tower_lsp::Client;

use crate::host::EditorHost;
use crate::language::LanguageId;
use crate::lsp::document::Documents;

/// Asks the client to reclassify a document under another language
pub enum SetLanguage {}

impl Notification for SetLanguage {
    type Params = SetLanguageParams;
    const METHOD: &'static str = "angularComponentViewer/setLanguage";
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetLanguageParams {
    pub uri: Url,
    pub language_id: String,
}

pub struct LspHost {
    client: Client,
    documents: Arc<Mutex<Documents>>,
}

impl LspHost {
    pub fn new(client: Client, documents: Arc<Mutex<Documents>>) -> Self {
        Self { client, documents }
    }
}

fn file_url(path: &Path) -> Result<Url> {
    Url::from_file_path(path).map_err(|_| anyhow!("Not an absolute file path: {}", path.display()))
}

#[tower_lsp::async_trait]
impl EditorHost for LspHost {
    async fn show_info(&self, message: String) {
        self.client.show_message(MessageType::INFO, message).await;
    }

    async fn show_error(&self, message: String) {
        self.client.show_message(MessageType::ERROR, message).await;
    }

    async fn active_document(&self) -> Option<PathBuf> {
        let docs = self.documents.lock().await;
        docs.active().and_then(|uri| uri.to_file_path().ok())
    }

    async fn open_document(&self, path: &Path) -> Result<()> {
        let params = ShowDocumentParams {
            uri: file_url(path)?,
            external: Some(false),
            take_focus: Some(true),
            selection: None,
        };
        let shown = self
            .client
            .show_document(params)
            .await
            .map_err(|e| anyhow!("window/showDocument failed: {}", e))?;
        if !shown {
            bail!("Client refused to show {}", path.display());
        }
        Ok(())
    }

    async fn apply_edit(&self, path: &Path, edit: TextEdit) -> Result<bool> {
        let changes = HashMap::from([(file_url(path)?, vec![edit])]);
        let response = self
            .client
            .apply_edit(WorkspaceEdit {
                changes: Some(changes),
                ..Default::default()
            })
            .await
            .map_err(|e| anyhow!("workspace/applyEdit failed: {}", e))?;
        if let Some(reason) = &response.failure_reason {
            log::debug!("Edit of {} rejected: {}", path.display(), reason);
        }
        Ok(response.applied)
    }

    async fn is_document_open(&self, path: &Path) -> bool {
        let docs = self.documents.lock().await;
        docs.find_by_path(path).is_some()
    }

    async fn document_language(&self, path: &Path) -> Option<String> {
        let docs = self.documents.lock().await;
        docs.find_by_path(path)
            .map(|(_, state)| state.language_id.clone())
    }

    async fn set_document_language(&self, path: &Path, language: LanguageId) -> Result<()> {
        let uri = {
            let mut docs = self.documents.lock().await;
            let uri = match docs.find_by_path(path) {
                Some((uri, _)) => uri.clone(),
                None => file_url(path)?,
            };
            docs.set_language(&uri, language.as_str());
            uri
        };

        self.client
            .send_notification::<SetLanguage>(SetLanguageParams {
                uri,
                language_id: language.as_str().to_string(),
            })
            .await;
        Ok(())
    }
}
