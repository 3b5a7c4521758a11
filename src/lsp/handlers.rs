use std::path::PathBuf;

use serde_json::Value;
use tower_lsp::jsonrpc::{Error, Result as LspResult};
use tower_lsp::lsp_types::*;

use crate::error::ViewerError;
use crate::language;
use crate::lsp::backend::Backend;
use crate::lsp::document::DocumentState;

pub const OPEN_COMBINED_VIEW: &str = "angularComponentViewer.openCombinedView";
pub const CYCLE_LANGUAGE: &str = "angularComponentViewer.cycleLanguage";

/// Commands advertised in `executeCommandProvider`
pub const COMMANDS: [&str; 2] = [OPEN_COMBINED_VIEW, CYCLE_LANGUAGE];

/// Trait for handling `workspace/executeCommand`
#[tower_lsp::async_trait]
pub trait HandleExecuteCommand {
    async fn handle_execute_command(
        &self,
        params: ExecuteCommandParams,
    ) -> LspResult<Option<Value>>;
}

/// Trait for handling document lifecycle notifications
#[tower_lsp::async_trait]
pub trait HandleDocumentEvents {
    async fn handle_did_open(&self, params: DidOpenTextDocumentParams);
    async fn handle_did_change(&self, params: DidChangeTextDocumentParams);
    async fn handle_did_save(&self, params: DidSaveTextDocumentParams);
    async fn handle_did_close(&self, params: DidCloseTextDocumentParams);
}

/// Interpret the optional target argument: a plain path or a `file://` URI
pub fn target_argument(arguments: &[Value]) -> Option<PathBuf> {
    let raw = arguments.first()?.as_str()?;
    if raw.is_empty() {
        return None;
    }
    if raw.starts_with("file://") {
        return Url::parse(raw).ok()?.to_file_path().ok();
    }
    Some(PathBuf::from(raw))
}

#[tower_lsp::async_trait]
impl HandleExecuteCommand for Backend {
    async fn handle_execute_command(
        &self,
        params: ExecuteCommandParams,
    ) -> LspResult<Option<Value>> {
        match params.command.as_str() {
            OPEN_COMBINED_VIEW => {
                let target = target_argument(&params.arguments);
                match self.sessions.open_combined_view(target).await {
                    Ok(scratch) => Ok(Some(serde_json::json!({
                        "scratch": scratch.display().to_string(),
                    }))),
                    Err(err) => {
                        // User-facing aborts were already shown by the session manager
                        if err.downcast_ref::<ViewerError>().is_none() {
                            log::error!("Opening the combined view failed: {:#}", err);
                            self.client
                                .log_message(
                                    MessageType::ERROR,
                                    format!("Opening the combined view failed: {:#}", err),
                                )
                                .await;
                        }
                        Ok(None)
                    }
                }
            }
            CYCLE_LANGUAGE => match language::cycle_language(self.sessions.host().as_ref()).await {
                Ok(next) => Ok(next.map(|language| Value::String(language.as_str().to_string()))),
                Err(err) => {
                    log::error!("Changing the document language failed: {:#}", err);
                    Ok(None)
                }
            },
            other => Err(Error::invalid_params(format!("Unknown command: {}", other))),
        }
    }
}

#[tower_lsp::async_trait]
impl HandleDocumentEvents for Backend {
    async fn handle_did_open(&self, params: DidOpenTextDocumentParams) {
        let doc = params.text_document;
        let mut docs = self.documents.lock().await;
        docs.open(
            doc.uri,
            DocumentState {
                content: doc.text,
                language_id: doc.language_id,
                version: doc.version,
            },
        );
    }

    async fn handle_did_change(&self, params: DidChangeTextDocumentParams) {
        let uri = params.text_document.uri;
        if let Some(change) = params.content_changes.into_iter().last() {
            let mut docs = self.documents.lock().await;
            docs.change(&uri, change.text, params.text_document.version);
        }
    }

    async fn handle_did_save(&self, params: DidSaveTextDocumentParams) {
        let Ok(path) = params.text_document.uri.to_file_path() else {
            return;
        };

        if let Err(err) = self.sessions.handle_save(&path, params.text).await {
            log::error!("Splitting {} failed: {:#}", path.display(), err);
            self.client
                .log_message(
                    MessageType::ERROR,
                    format!("Splitting {} failed: {:#}", path.display(), err),
                )
                .await;
        }
    }

    async fn handle_did_close(&self, params: DidCloseTextDocumentParams) {
        let uri = params.text_document.uri;
        {
            let mut docs = self.documents.lock().await;
            docs.close(&uri);
        }

        if let Ok(path) = uri.to_file_path() {
            self.sessions.handle_close(&path).await;
        }
    }
}
