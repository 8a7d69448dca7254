//! Tokenization through a `php` binary.
//!
//! PHP's token constants are generated from its parser and differ between
//! versions, so numeric codes returned by `token_get_all()` are only
//! meaningful together with the `token_name()` table of the same binary.
//! [`TokenTable`] holds that table; it is loaded once when the
//! [`ProcessLexer`] is built and travels with it.

use std::collections::HashMap;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use serde_json::Value;
use tracing::debug;

use super::Lexer;
use crate::error::{Error, Result};
use crate::types::{Token, TokenKind};

/// Highest token code queried when loading the table.
const MAX_TOKEN_CODE: u32 = 1000;

const TOKEN_NAMES_SCRIPT: &str =
    "for ($i = 0; $i < 1000; $i++) { echo $i, ',', token_name($i), '|'; }";

const TOKENIZE_SCRIPT: &str =
    "echo json_encode(token_get_all(file_get_contents('php://stdin')));";

/// Mapping from a PHP binary's numeric token codes to [`TokenKind`]s.
#[derive(Debug, Clone, Default)]
pub struct TokenTable {
    kinds: HashMap<i64, TokenKind>,
}

impl TokenTable {
    /// Ask `binary` for the names of all token codes.
    pub fn load(binary: &Path) -> Result<Self> {
        let output = run_php(binary, TOKEN_NAMES_SCRIPT, None)?;
        let table = Self::parse(&output);
        debug!(
            binary = %binary.display(),
            tokens = table.kinds.len(),
            "loaded token table"
        );
        Ok(table)
    }

    /// Parse the `code,NAME|code,NAME|...` listing produced by the table
    /// script.  Codes PHP calls `UNKNOWN` are left out.
    pub fn parse(listing: &str) -> Self {
        let kinds = listing
            .split('|')
            .filter_map(|entry| entry.split_once(','))
            .filter(|(_, name)| *name != "UNKNOWN" && !name.is_empty())
            .filter_map(|(code, name)| {
                let code: i64 = code.trim().parse().ok()?;
                (0..i64::from(MAX_TOKEN_CODE))
                    .contains(&code)
                    .then(|| (code, TokenKind::from_php_name(name.trim())))
            })
            .collect();
        Self { kinds }
    }

    pub fn from_names<'a>(names: impl IntoIterator<Item = (i64, &'a str)>) -> Self {
        Self {
            kinds: names
                .into_iter()
                .map(|(code, name)| (code, TokenKind::from_php_name(name)))
                .collect(),
        }
    }

    pub fn kind(&self, code: i64) -> TokenKind {
        self.kinds
            .get(&code)
            .cloned()
            .unwrap_or_else(|| TokenKind::Other(format!("#{code}")))
    }

    pub fn len(&self) -> usize {
        self.kinds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.kinds.is_empty()
    }
}

/// Lexer that shells out to `php` for every call.
#[derive(Debug, Clone)]
pub struct ProcessLexer {
    binary: PathBuf,
    table: TokenTable,
}

impl ProcessLexer {
    /// Build a lexer for `binary`, loading its token table right away.
    pub fn new(binary: impl Into<PathBuf>) -> Result<Self> {
        let binary = binary.into();
        let table = TokenTable::load(&binary)?;
        Ok(Self { binary, table })
    }

    /// Build a lexer with an already known table.
    pub fn with_table(binary: impl Into<PathBuf>, table: TokenTable) -> Self {
        Self {
            binary: binary.into(),
            table,
        }
    }

    pub fn table(&self) -> &TokenTable {
        &self.table
    }
}

impl Lexer for ProcessLexer {
    fn tokenize(&self, source: &str) -> Result<Vec<Token>> {
        let json = run_php(&self.binary, TOKENIZE_SCRIPT, Some(source))?;
        decode_tokens(&json, &self.table)
    }
}

/// Decode the JSON form of `token_get_all()`: an array whose elements are
/// either `[code, text, line]` or a bare one-character string.
///
/// Bare strings carry no line, so they get the line where the previous
/// token ended.
pub fn decode_tokens(json: &str, table: &TokenTable) -> Result<Vec<Token>> {
    let raw: Vec<Value> = serde_json::from_str(json)?;
    let mut tokens = Vec::with_capacity(raw.len());
    let mut line: u32 = 1;

    for item in raw {
        let token = match item {
            Value::String(text) => Token {
                kind: None,
                text,
                line,
            },
            Value::Array(parts) => {
                let [code, text, at] = parts.as_slice() else {
                    return Err(Error::LexerOutput(format!(
                        "expected [code, text, line], got {} elements",
                        parts.len()
                    )));
                };
                let code = code
                    .as_i64()
                    .ok_or_else(|| Error::LexerOutput(format!("bad token code {code}")))?;
                let text = text
                    .as_str()
                    .ok_or_else(|| Error::LexerOutput(format!("bad token text {text}")))?;
                let at = at.as_u64().unwrap_or(u64::from(line)) as u32;
                Token {
                    kind: Some(table.kind(code)),
                    text: text.to_string(),
                    line: at,
                }
            }
            other => {
                return Err(Error::LexerOutput(format!("unexpected token {other}")));
            }
        };
        line = token.line + token.text.matches('\n').count() as u32;
        tokens.push(token);
    }

    Ok(tokens)
}

fn run_php(binary: &Path, script: &str, stdin: Option<&str>) -> Result<String> {
    let spawn_err = |source| Error::LexerSpawn {
        binary: binary.to_path_buf(),
        source,
    };

    let mut child = Command::new(binary)
        .arg("-r")
        .arg(script)
        .stdin(if stdin.is_some() {
            Stdio::piped()
        } else {
            Stdio::null()
        })
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(spawn_err)?;

    // php reads all of stdin before it writes anything, so writing first
    // cannot deadlock.
    if let Some(input) = stdin
        && let Some(mut pipe) = child.stdin.take()
    {
        pipe.write_all(input.as_bytes()).map_err(spawn_err)?;
    }

    let output = child.wait_with_output().map_err(spawn_err)?;
    if !output.status.success() {
        return Err(Error::LexerFailed {
            binary: binary.to_path_buf(),
            status: output.status,
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        });
    }
    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}
