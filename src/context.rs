//! Cursor context resolution.
//!
//! Given a buffer and a cursor, work out which receiver expression the
//! cursor is completing.  For
//!
//! ```php
//! $this->repository->fi|
//! ```
//!
//! the answer is the chain `["UserController", "repository", "fi"]`,
//! reached through `->`, with every member visible because the base is
//! `$this`.
//!
//! The scan runs backwards over the tokens of the text before the cursor.
//! Each token is classified once through [`ScanAction::of`] and the action
//! drives a small loop with a parenthesis counter; the first statement
//! boundary at the outermost level ends the scan.  Afterwards the base of
//! the chain is resolved: `$this` becomes the class declared in the file
//! and other variables are looked up in `@var` annotations.

use tracing::trace;

use crate::docblock;
use crate::error::{Error, Result};
use crate::extractor;
use crate::lexer::Lexer;
use crate::types::{AccessOperator, Context, ContextVisibility, SELF_REFERENCE, Token, TokenKind};

/// What one token does to the backward scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ScanAction {
    /// Whitespace, comments and anything without a meaning here.
    Skip,
    /// `->` or `?->`.
    Member,
    /// `::`
    Static,
    /// `(` seen from the right: one level further out.
    Open,
    /// `)` seen from the right: one level further in.
    Close,
    /// A statement or expression boundary.
    Stop,
    /// A variable or name that belongs to the chain.
    Push,
    /// The `static` keyword: a chain base right before `::`, a boundary
    /// anywhere else.
    LateStatic,
}

/// Single-character punctuation that ends the receiver expression.
const STOP_PUNCT: &[char] = &[
    ';', '=', ',', '.', '{', '}', '+', '-', '*', '/', '%', '<', '>', '|', '&', '^', '~', '!',
    '?', ':', '@',
];

impl ScanAction {
    fn of(token: &Token) -> ScanAction {
        let Some(kind) = &token.kind else {
            return match token.text.chars().next() {
                Some('(') => ScanAction::Open,
                Some(')') => ScanAction::Close,
                Some(c) if STOP_PUNCT.contains(&c) => ScanAction::Stop,
                _ => ScanAction::Skip,
            };
        };
        match kind {
            TokenKind::ObjectOperator | TokenKind::NullsafeObjectOperator => ScanAction::Member,
            TokenKind::DoubleColon => ScanAction::Static,
            TokenKind::ConcatEqual
            | TokenKind::PlusEqual
            | TokenKind::AssignOp
            | TokenKind::DoubleArrow
            | TokenKind::Operator
            | TokenKind::OpenTag
            | TokenKind::OpenTagWithEcho
            | TokenKind::New
            | TokenKind::Return
            | TokenKind::Echo
            | TokenKind::Print
            | TokenKind::Throw => ScanAction::Stop,
            TokenKind::Static => ScanAction::LateStatic,
            TokenKind::Variable => ScanAction::Push,
            k if k.is_identifier() => ScanAction::Push,
            _ => ScanAction::Skip,
        }
    }
}

/// Resolves the [`Context`] at a cursor position.
#[derive(Debug, Clone)]
pub struct ContextResolver<L> {
    lexer: L,
}

impl<L: Lexer> ContextResolver<L> {
    pub fn new(lexer: L) -> Self {
        Self { lexer }
    }

    /// Resolve the context for the cursor at byte offset `cursor` in
    /// `source`.
    ///
    /// The offset must lie on a character boundary within the buffer.
    /// An unresolvable variable base is left in the chain as written.
    pub fn resolve(&self, source: &str, cursor: usize) -> Result<Context> {
        let Some(prefix) = source.get(..cursor) else {
            return Err(Error::CursorOutOfBounds {
                offset: cursor,
                len: source.len(),
            });
        };

        let tokens = self.lexer.tokenize(prefix)?;
        let mut context = scan_backwards(&tokens);

        if let Some(base) = context.chain.first()
            && base.starts_with('$')
        {
            let resolved = if base == SELF_REFERENCE {
                extractor::extract_source(&self.lexer, source)?
                    .into_iter()
                    .next()
                    .map(|d| d.class)
            } else {
                docblock::variable_annotation(source, base)
            };
            trace!(base = %base, resolved = ?resolved, "context base");
            if let Some(class) = resolved {
                context.chain[0] = class;
            }
        }

        Ok(context)
    }
}

/// Walk `tokens` from the end and collect the receiver chain, operator
/// and visibility.  The chain is returned outer-to-inner with the `$`
/// base still unresolved.
pub fn scan_backwards(tokens: &[Token]) -> Context {
    let mut chain: Vec<String> = Vec::new();
    let mut operator = None;
    let mut visibility = None;
    let mut depth: i32 = 0;
    let mut static_access = false;
    let mut previous = ScanAction::Skip;

    for token in tokens.iter().rev() {
        let action = ScanAction::of(token);
        match action {
            ScanAction::Skip => {}
            ScanAction::Static => {
                operator.get_or_insert(AccessOperator::Static);
                visibility.get_or_insert(ContextVisibility::Public);
                static_access = true;
                if chain.is_empty() {
                    chain.push(String::new());
                }
            }
            ScanAction::Member => {
                operator.get_or_insert(AccessOperator::Member);
                if chain.is_empty() {
                    chain.push(String::new());
                }
            }
            ScanAction::Open => depth += 1,
            ScanAction::Close => depth -= 1,
            ScanAction::Stop if depth == 0 => break,
            ScanAction::Stop => {}
            ScanAction::Push if depth == 0 => {
                // `$this` is the base of the chain, so it decides over the
                // member names pushed before it; `::` keeps access public.
                if token.text == SELF_REFERENCE && !static_access {
                    visibility = Some(ContextVisibility::All);
                } else {
                    visibility.get_or_insert(ContextVisibility::Public);
                }
                chain.push(token.text.clone());
            }
            ScanAction::Push => {}
            ScanAction::LateStatic if depth == 0 && previous == ScanAction::Static => {
                visibility.get_or_insert(ContextVisibility::Public);
                chain.push(token.text.to_ascii_lowercase());
            }
            ScanAction::LateStatic if depth == 0 => break,
            ScanAction::LateStatic => {}
        }
        if action != ScanAction::Skip {
            previous = action;
        }
        if depth > 0 {
            break;
        }
    }

    chain.reverse();
    if chain.last().is_some_and(String::is_empty) {
        chain.pop();
    }

    Context {
        chain,
        visibility,
        operator,
    }
}
