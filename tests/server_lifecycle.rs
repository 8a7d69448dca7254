mod common;

use common::{create_test_backend, create_workspace_backend, open_file};
use tower_lsp::LanguageServer;
use tower_lsp::lsp_types::*;

#[tokio::test]
async fn test_initialize_server_info() {
    let backend = create_test_backend();
    let params = InitializeParams::default();
    let result = backend.initialize(params).await.unwrap();

    let server_info = result.server_info.expect("server_info should be present");
    assert_eq!(server_info.name, "php-codeintel");
    assert_eq!(
        server_info.version,
        Some(env!("CARGO_PKG_VERSION").to_string())
    );
}

#[tokio::test]
async fn test_initialize_capabilities() {
    let backend = create_test_backend();
    let params = InitializeParams::default();
    let result = backend.initialize(params).await.unwrap();

    let caps = result.capabilities;
    let completion = caps
        .completion_provider
        .expect("Completion provider should be enabled");
    assert_eq!(
        completion.trigger_characters,
        Some(vec!["$".to_string(), ">".to_string(), ":".to_string()])
    );
    assert_eq!(
        caps.text_document_sync,
        Some(TextDocumentSyncCapability::Kind(TextDocumentSyncKind::FULL))
    );
}

#[tokio::test]
async fn test_did_open_stores_file() {
    let backend = create_test_backend();

    let uri = Url::parse("file:///test.php").unwrap();
    open_file(&backend, &uri, "<?php\nclass Stored { function m() {} }\n").await;

    let decls = backend
        .declarations_for_uri(uri.as_ref())
        .expect("index should have an entry after did_open");
    assert_eq!(decls.len(), 1);
    assert_eq!(decls[0].class, "Stored");
    assert_eq!(backend.indexed_files(), 1);
}

#[tokio::test]
async fn test_completion_returns_none_when_nothing_matches() {
    let backend = create_test_backend();

    let uri = Url::parse("file:///test.php").unwrap();
    open_file(&backend, &uri, "<?php\n$x = 1;\n").await;

    let completion_params = CompletionParams {
        text_document_position: TextDocumentPositionParams {
            text_document: TextDocumentIdentifier { uri },
            position: Position {
                line: 1,
                character: 0,
            },
        },
        work_done_progress_params: WorkDoneProgressParams::default(),
        partial_result_params: PartialResultParams::default(),
        context: None,
    };

    let result = backend.completion(completion_params).await.unwrap();
    assert!(
        result.is_none(),
        "Completion should return None when nothing matches"
    );
}

#[tokio::test]
async fn test_shutdown() {
    let backend = create_test_backend();
    let result = backend.shutdown().await;
    assert!(result.is_ok());
}

#[tokio::test]
async fn test_did_change_updates_content() {
    let backend = create_test_backend();

    let uri = Url::parse("file:///test.php").unwrap();
    open_file(&backend, &uri, "<?php\nclass A { function first() {} }\n").await;

    let decls = backend.declarations_for_uri(uri.as_ref()).unwrap();
    assert_eq!(decls.len(), 1);

    let change_params = DidChangeTextDocumentParams {
        text_document: VersionedTextDocumentIdentifier {
            uri: uri.clone(),
            version: 2,
        },
        content_changes: vec![TextDocumentContentChangeEvent {
            range: None,
            range_length: None,
            text: "<?php\nclass A { function first() {} function second() {} }\n".to_string(),
        }],
    };
    backend.did_change(change_params).await;

    let decls = backend.declarations_for_uri(uri.as_ref()).unwrap();
    assert_eq!(decls.len(), 2, "After change, class should have 2 methods");
}

#[tokio::test]
async fn test_did_close_removes_file() {
    let backend = create_test_backend();

    let uri = Url::parse("file:///test.php").unwrap();
    open_file(&backend, &uri, "<?php\nclass Z { function z() {} }\n").await;
    assert!(backend.declarations_for_uri(uri.as_ref()).is_some());

    let close_params = DidCloseTextDocumentParams {
        text_document: TextDocumentIdentifier { uri: uri.clone() },
    };
    backend.did_close(close_params).await;

    assert!(
        backend.declarations_for_uri(uri.as_ref()).is_none(),
        "Index entry should be removed after did_close"
    );
    assert_eq!(backend.indexed_files(), 0);
}

#[tokio::test]
async fn test_did_close_keeps_workspace_files_indexed() {
    let (backend, dir) = create_workspace_backend(&[(
        "src/Kept.php",
        "<?php class Kept { public function k() {} }",
    )])
    .await;
    let uri = Url::from_file_path(dir.path().join("src/Kept.php")).unwrap();

    open_file(&backend, &uri, "<?php class Kept { public function k() {} }").await;
    backend
        .did_close(DidCloseTextDocumentParams {
            text_document: TextDocumentIdentifier { uri: uri.clone() },
        })
        .await;

    assert!(backend.declarations_for_uri(uri.as_ref()).is_some());
    assert_eq!(backend.indexed_files(), 1);
}
