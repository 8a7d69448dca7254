//! Crate-wide error type.
//!
//! The extractor and the resolver never fail on what they are fed.  Errors
//! only come from the outside world: files, configuration, the `php`
//! process behind [`ProcessLexer`](crate::lexer::ProcessLexer), and callers
//! handing the resolver a cursor that is not inside the buffer.

use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("{path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config {path}: {source}")]
    Config {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("could not determine the user config directory: {0}")]
    ConfigDir(String),

    #[error("failed to run {binary}: {source}")]
    LexerSpawn {
        binary: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{binary} exited with {status}: {stderr}")]
    LexerFailed {
        binary: PathBuf,
        status: std::process::ExitStatus,
        stderr: String,
    },

    #[error("unexpected tokenizer output: {0}")]
    LexerOutput(String),

    #[error("failed to decode tokenizer output: {0}")]
    Json(#[from] serde_json::Error),

    #[error("directory walk failed: {0}")]
    Walk(#[from] ignore::Error),

    #[error("background task failed: {0}")]
    Task(String),

    #[error("cursor offset {offset} is outside the {len}-byte source or not on a character boundary")]
    CursorOutOfBounds { offset: usize, len: usize },
}

impl Error {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Error::Io {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
