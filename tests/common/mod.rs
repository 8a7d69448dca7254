#![allow(dead_code)]

use std::fs;
use std::path::Path;

use php_codeintel::{Backend, Declaration, PhpLexer, extract};
use tower_lsp::LanguageServer;
use tower_lsp::lsp_types::*;

pub fn create_test_backend() -> Backend {
    Backend::new_test()
}

/// Extract declarations from PHP source with the built-in lexer.
pub fn extract_php(src: &str) -> Vec<Declaration> {
    extract(&PhpLexer.tokens(src))
}

/// Helper: create a temp directory holding the given files.
pub fn create_workspace(files: &[(&str, &str)]) -> tempfile::TempDir {
    let dir = tempfile::tempdir().expect("failed to create temp dir");
    for (rel_path, content) in files {
        write_file(dir.path(), rel_path, content);
    }
    dir
}

pub fn write_file(root: &Path, rel_path: &str, content: &str) {
    let full = root.join(rel_path);
    if let Some(parent) = full.parent() {
        fs::create_dir_all(parent).expect("failed to create dirs");
    }
    fs::write(&full, content).expect("failed to write file");
}

/// Helper: a backend that went through initialize / initialized with a
/// temp workspace containing `files`.
pub async fn create_workspace_backend(files: &[(&str, &str)]) -> (Backend, tempfile::TempDir) {
    let dir = create_workspace(files);
    let backend = create_test_backend();
    let params = InitializeParams {
        root_uri: Some(Url::from_file_path(dir.path()).expect("absolute temp path")),
        ..InitializeParams::default()
    };
    backend.initialize(params).await.unwrap();
    backend.initialized(InitializedParams {}).await;
    (backend, dir)
}

pub async fn open_file(backend: &Backend, uri: &Url, text: &str) {
    let params = DidOpenTextDocumentParams {
        text_document: TextDocumentItem {
            uri: uri.clone(),
            language_id: "php".to_string(),
            version: 1,
            text: text.to_string(),
        },
    };
    backend.did_open(params).await;
}

/// Run a completion request and return the items (empty for `None`).
pub async fn complete_at(
    backend: &Backend,
    uri: &Url,
    line: u32,
    character: u32,
) -> Vec<CompletionItem> {
    let params = CompletionParams {
        text_document_position: TextDocumentPositionParams {
            text_document: TextDocumentIdentifier { uri: uri.clone() },
            position: Position { line, character },
        },
        work_done_progress_params: WorkDoneProgressParams::default(),
        partial_result_params: PartialResultParams::default(),
        context: None,
    };
    match backend.completion(params).await.unwrap() {
        Some(CompletionResponse::Array(items)) => items,
        Some(CompletionResponse::List(list)) => list.items,
        None => Vec::new(),
    }
}

pub fn labels(items: &[CompletionItem]) -> Vec<&str> {
    items.iter().map(|i| i.label.as_str()).collect()
}
