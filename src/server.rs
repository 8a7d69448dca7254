/// LSP server trait implementation.
///
/// This module contains the `impl LanguageServer for Backend` block,
/// which handles the LSP protocol messages the server supports
/// (initialize, initialized, didOpen, didChange, didClose, completion).
use tower_lsp::LanguageServer;
use tower_lsp::jsonrpc::Result;
use tower_lsp::lsp_types::*;

use crate::Backend;
use crate::context::ContextResolver;
use crate::util::{ends_with_word, position_to_offset};

#[tower_lsp::async_trait]
impl LanguageServer for Backend {
    async fn initialize(&self, params: InitializeParams) -> Result<InitializeResult> {
        let workspace_root = params
            .root_uri
            .as_ref()
            .and_then(|uri| uri.to_file_path().ok());
        if let Some(root) = workspace_root {
            *self.workspace_root.write() = Some(root);
        }

        Ok(InitializeResult {
            capabilities: ServerCapabilities {
                completion_provider: Some(CompletionOptions {
                    resolve_provider: Some(false),
                    trigger_characters: Some(vec![
                        "$".to_string(),
                        ">".to_string(),
                        ":".to_string(),
                    ]),
                    ..CompletionOptions::default()
                }),
                text_document_sync: Some(TextDocumentSyncCapability::Kind(
                    TextDocumentSyncKind::FULL,
                )),
                ..ServerCapabilities::default()
            },
            server_info: Some(ServerInfo {
                name: self.name.clone(),
                version: Some(self.version.clone()),
            }),
            offset_encoding: None,
        })
    }

    async fn initialized(&self, _: InitializedParams) {
        let workspace_root = self.workspace_root.read().clone();
        let Some(root) = workspace_root else {
            self.log(MessageType::INFO, format!("{} initialized", self.name))
                .await;
            return;
        };

        match self.index_workspace(root).await {
            Ok(count) => {
                self.log(
                    MessageType::INFO,
                    format!("{} initialized, indexed {} file(s)", self.name, count),
                )
                .await;
            }
            Err(e) => {
                self.log(MessageType::WARNING, format!("workspace scan failed: {}", e))
                    .await;
            }
        }
    }

    async fn shutdown(&self) -> Result<()> {
        Ok(())
    }

    async fn did_open(&self, params: DidOpenTextDocumentParams) {
        let doc = params.text_document;
        let uri = doc.uri.to_string();

        self.open_files.write().insert(uri.clone(), doc.text.clone());
        self.update_index(&uri, &doc.text);

        self.log(MessageType::INFO, format!("Opened file: {}", uri))
            .await;
    }

    async fn did_change(&self, params: DidChangeTextDocumentParams) {
        let uri = params.text_document.uri.to_string();

        if let Some(change) = params.content_changes.into_iter().next() {
            self.update_index(&uri, &change.text);
            self.open_files.write().insert(uri, change.text);
        }
    }

    async fn did_close(&self, params: DidCloseTextDocumentParams) {
        let uri = params.text_document.uri.to_string();

        self.open_files.write().remove(&uri);
        // Files outside the workspace scan disappear with their buffer.
        if !self.is_workspace_file(&params.text_document.uri) {
            self.index.write().remove(&uri);
        }

        self.log(MessageType::INFO, format!("Closed file: {}", uri))
            .await;
    }

    async fn completion(&self, params: CompletionParams) -> Result<Option<CompletionResponse>> {
        let uri = params.text_document_position.text_document.uri.to_string();
        let position = params.text_document_position.position;

        let content = self.open_files.read().get(&uri).cloned();
        let Some(content) = content else {
            return Ok(None);
        };

        let offset = position_to_offset(&content, position);
        let resolver = ContextResolver::new(self.lexer.clone());
        let context = match resolver.resolve(&content, offset) {
            Ok(context) => context,
            Err(e) => {
                self.log(MessageType::WARNING, format!("completion failed: {}", e))
                    .await;
                return Ok(None);
            }
        };

        let partial = ends_with_word(&content[..offset]);
        let items = self.index.read().complete(&context, &uri, partial);
        tracing::debug!(chain = ?context.chain, items = items.len(), "completion");

        if items.is_empty() {
            Ok(None)
        } else {
            Ok(Some(CompletionResponse::Array(items)))
        }
    }
}
