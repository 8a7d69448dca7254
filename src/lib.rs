//! php-codeintel: code intelligence for PHP without a parser.
//!
//! The crate works on PHP's flat token stream instead of a syntax tree:
//!
//! - [`extractor`] turns the tokens of a file into [`Declaration`]s
//!   (methods, properties, constants, top-level functions),
//! - [`context`] scans backwards from a cursor to find the receiver
//!   expression being completed and resolves its base to a class.
//!
//! Around those two sit a [`lexer`] abstraction (built-in tokenizer or a
//! `php` process), a [`scanner`] for whole directories, the IDE [`helper`]
//! generator with its [`config`], a [`completion`] index and the language
//! server ([`Backend`], see `server.rs`).

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use parking_lot::RwLock;
use tower_lsp::Client;
use tower_lsp::lsp_types::Url;
use tracing::warn;

pub mod completion;
pub mod config;
pub mod context;
pub mod docblock;
pub mod error;
pub mod extractor;
pub mod helper;
pub mod lexer;
pub mod scanner;
mod server;
pub mod types;
pub mod util;

pub use completion::SymbolIndex;
pub use config::Config;
pub use context::ContextResolver;
pub use error::{Error, Result};
pub use extractor::{extract, extract_source};
pub use lexer::{Lexer, PhpLexer, ProcessLexer};
pub use types::{Context, Declaration, Token, TokenKind};

/// Extension of the files indexed by the language server.
const PHP_EXTENSION: &str = "php";

/// Language server state.
pub struct Backend {
    name: String,
    version: String,
    lexer: Arc<dyn Lexer>,
    /// Text of the buffers the client has open, keyed by URI.
    open_files: Arc<RwLock<HashMap<String, String>>>,
    index: Arc<RwLock<SymbolIndex>>,
    workspace_root: Arc<RwLock<Option<PathBuf>>>,
    client: Option<Client>,
}

impl Backend {
    pub fn new(client: Client) -> Self {
        Self::with_lexer(Some(client), Arc::new(PhpLexer::new()))
    }

    /// A backend that tokenizes with `lexer` instead of the built-in
    /// tokenizer.
    pub fn with_lexer(client: Option<Client>, lexer: Arc<dyn Lexer>) -> Self {
        Self {
            name: "php-codeintel".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            lexer,
            open_files: Arc::new(RwLock::new(HashMap::new())),
            index: Arc::new(RwLock::new(SymbolIndex::new())),
            workspace_root: Arc::new(RwLock::new(None)),
            client,
        }
    }

    /// A backend with no client connection, for tests.
    pub fn new_test() -> Self {
        Self::with_lexer(None, Arc::new(PhpLexer::new()))
    }

    /// Number of files currently in the symbol index.
    pub fn indexed_files(&self) -> usize {
        self.index.read().file_count()
    }

    /// Declarations indexed for `uri`, or `None` when the file is unknown.
    pub fn declarations_for_uri(&self, uri: &str) -> Option<Vec<Declaration>> {
        let index = self.index.read();
        index
            .contains(uri)
            .then(|| index.declarations(uri).to_vec())
    }

    /// Re-extract `text` and store it in the index under `uri`.
    pub(crate) fn update_index(&self, uri: &str, text: &str) {
        match extract_source(&self.lexer, text) {
            Ok(declarations) => self.index.write().update(uri, declarations),
            Err(e) => warn!(uri, error = %e, "could not index buffer"),
        }
    }

    pub(crate) fn is_workspace_file(&self, uri: &Url) -> bool {
        let root = self.workspace_root.read();
        match (root.as_ref(), uri.to_file_path()) {
            (Some(root), Ok(path)) => path.starts_with(root),
            _ => false,
        }
    }

    /// Scan `root` on the blocking pool and add every file to the index.
    /// Buffers the client already has open keep their live contents.
    pub(crate) async fn index_workspace(&self, root: PathBuf) -> Result<usize> {
        let lexer = Arc::clone(&self.lexer);
        let scanned = tokio::task::spawn_blocking(move || {
            scanner::scan_all_files(&lexer, &root, PHP_EXTENSION)
        })
        .await
        .map_err(|e| Error::Task(e.to_string()))??;

        let open = self.open_files.read();
        let mut index = self.index.write();
        let mut count = 0;
        for file in scanned {
            let Some(uri) = util::uri_for_path(&file.path) else {
                continue;
            };
            if !open.contains_key(&uri) {
                index.update(uri, file.declarations);
                count += 1;
            }
        }
        Ok(count)
    }
}
