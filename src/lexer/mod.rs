/// PHP tokenization.
///
/// The extractor and the resolver never look at raw characters; they work
/// on the `(kind, text, line)` tokens a [`Lexer`] hands them.  Two
/// implementations are provided:
///
/// - [`PhpLexer`]: a self-contained tokenizer that follows the shape of
///   PHP 8's `token_get_all()` output closely enough for declaration and
///   context work.  This is the default.
/// - [`ProcessLexer`]: asks a `php` binary for the real `token_get_all()`
///   result and translates the numeric token codes through a
///   [`TokenTable`] that is loaded once when the lexer is built.
///
/// Sub-modules:
/// - [`php`]: the built-in tokenizer
/// - [`process`]: the `php`-process backed tokenizer and its token table
mod php;
mod process;

pub use php::PhpLexer;
pub use process::{ProcessLexer, TokenTable, decode_tokens};

use std::sync::Arc;

use crate::error::Result;
use crate::types::Token;

/// Turns PHP source text into an ordered token sequence.
///
/// Implementations must keep whitespace as tokens of kind
/// [`TokenKind::Whitespace`](crate::types::TokenKind::Whitespace) so callers
/// can filter them, and must report 1-based line numbers.
pub trait Lexer: Send + Sync {
    fn tokenize(&self, source: &str) -> Result<Vec<Token>>;
}

impl<L: Lexer + ?Sized> Lexer for &L {
    fn tokenize(&self, source: &str) -> Result<Vec<Token>> {
        (**self).tokenize(source)
    }
}

impl<L: Lexer + ?Sized> Lexer for Box<L> {
    fn tokenize(&self, source: &str) -> Result<Vec<Token>> {
        (**self).tokenize(source)
    }
}

impl<L: Lexer + ?Sized> Lexer for Arc<L> {
    fn tokenize(&self, source: &str) -> Result<Vec<Token>> {
        (**self).tokenize(source)
    }
}
