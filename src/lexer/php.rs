//! Built-in PHP tokenizer on top of mago's lexer.
//!
//! mago's tokens are mapped onto the `token_get_all()` shapes the extractor
//! and the resolver inspect: open/close tags, whitespace, comments and doc
//! comments, variables, (qualified) names, keywords, numbers, string
//! literals and operators.  Single-character punctuation comes out with no
//! kind, keywords outside [`keyword_kind`] as `Other("T_...")`.
//!
//! Heredoc bodies and interpolated string parts map to `Heredoc`, so braces
//! inside them never reach the extractor as punctuation.

use std::panic::{AssertUnwindSafe, catch_unwind};

use mago_database::file::FileId;
use mago_syntax::lexer::Lexer as MagoLexer;
use mago_syntax::settings::LexerSettings;
use mago_syntax::token::TokenKind as MagoKind;
use mago_syntax_core::input::Input;
use tracing::{debug, error};

use super::Lexer;
use crate::error::Result;
use crate::types::{Token, TokenKind};

/// Self-contained PHP tokenizer.  Never fails.
#[derive(Debug, Clone, Copy, Default)]
pub struct PhpLexer;

impl PhpLexer {
    pub fn new() -> Self {
        PhpLexer
    }

    /// Tokenize without the `Result` wrapper.
    ///
    /// Token texts always concatenate back to `source`: whatever mago
    /// refuses to lex is appended as one trailing token.
    pub fn tokens(&self, source: &str) -> Vec<Token> {
        if source.is_empty() {
            return Vec::new();
        }
        match catch_unwind(AssertUnwindSafe(|| lex(source))) {
            Ok(tokens) => tokens,
            Err(_) => {
                error!("PHP lexer panicked; treating the buffer as inline HTML");
                vec![Token {
                    kind: Some(TokenKind::InlineHtml),
                    text: source.to_string(),
                    line: 1,
                }]
            }
        }
    }
}

impl Lexer for PhpLexer {
    fn tokenize(&self, source: &str) -> Result<Vec<Token>> {
        Ok(self.tokens(source))
    }
}

// ─── Token stream ───────────────────────────────────────────────────────────

/// Collects mapped tokens while tracking line numbers and the byte offset
/// reached so far.
#[derive(Default)]
struct Sink {
    tokens: Vec<Token>,
    line: u32,
    consumed: usize,
}

impl Sink {
    fn push(&mut self, kind: Option<TokenKind>, text: &str) {
        self.tokens.push(Token {
            kind,
            text: text.to_string(),
            line: self.line,
        });
        self.line += memchr::memchr_iter(b'\n', text.as_bytes()).count() as u32;
        self.consumed += text.len();
    }

    /// `$obj->list`, `function list()`: member names are never keywords.
    fn in_member_name_position(&self) -> bool {
        self.tokens
            .iter()
            .rev()
            .find(|t| !t.is_trivia())
            .is_some_and(|t| {
                t.is(&TokenKind::ObjectOperator)
                    || t.is(&TokenKind::NullsafeObjectOperator)
                    || t.is(&TokenKind::Function)
            })
    }
}

fn lex(source: &str) -> Vec<Token> {
    let input = Input::new(FileId::new("input.php"), source.as_bytes());
    let mut lexer = MagoLexer::new(input, LexerSettings::default());
    let mut sink = Sink {
        line: 1,
        ..Sink::default()
    };

    while let Some(next) = lexer.advance() {
        match next {
            Ok(token) => {
                let kind = classify(token.kind, token.value, sink.in_member_name_position());
                sink.push(kind, token.value);
            }
            Err(err) => {
                debug!(?err, offset = sink.consumed, "lexer stopped early");
                break;
            }
        }
    }

    if let Some(rest) = source.get(sink.consumed..)
        && !rest.is_empty()
    {
        sink.push(Some(TokenKind::Other("T_BAD_CHARACTER".to_string())), rest);
    }
    sink.tokens
}

// ─── Kind mapping ───────────────────────────────────────────────────────────

fn classify(kind: MagoKind, text: &str, member_name: bool) -> Option<TokenKind> {
    let mapped = match kind {
        MagoKind::Whitespace => TokenKind::Whitespace,
        MagoKind::SingleLineComment | MagoKind::HashComment | MagoKind::MultiLineComment => {
            TokenKind::Comment
        }
        MagoKind::DocBlockComment => TokenKind::DocComment,
        MagoKind::Variable => TokenKind::Variable,
        MagoKind::QualifiedIdentifier => TokenKind::NameQualified,
        MagoKind::FullyQualifiedIdentifier => TokenKind::NameFullyQualified,
        MagoKind::LiteralInteger => TokenKind::LNumber,
        MagoKind::LiteralFloat => TokenKind::DNumber,
        MagoKind::LiteralString => TokenKind::ConstantEncapsedString,
        MagoKind::StringPart | MagoKind::DocumentEnd => TokenKind::Heredoc,
        MagoKind::OpenTag | MagoKind::ShortOpenTag => TokenKind::OpenTag,
        MagoKind::EchoTag => TokenKind::OpenTagWithEcho,
        MagoKind::CloseTag => TokenKind::CloseTag,
        MagoKind::InlineText => TokenKind::InlineHtml,
        other => return classify_text(text, member_name, other),
    };
    Some(mapped)
}

/// Keywords, operators and punctuation are told apart by their text, which
/// keeps the mapping independent of mago's per-keyword variants.
fn classify_text(text: &str, member_name: bool, kind: MagoKind) -> Option<TokenKind> {
    let mut chars = text.chars();
    let first = chars.next()?;
    if first.is_ascii_punctuation() && chars.as_str().is_empty() {
        return None;
    }
    if text.starts_with("<<<") {
        return Some(TokenKind::Heredoc);
    }
    if let Some(op) = operator_kind(text) {
        return Some(op);
    }
    if is_word(text) {
        if member_name {
            return Some(TokenKind::String);
        }
        return Some(keyword_kind(&text.to_ascii_lowercase()).unwrap_or(TokenKind::String));
    }
    Some(TokenKind::Other(format!("{kind:?}")))
}

fn operator_kind(text: &str) -> Option<TokenKind> {
    let kind = match text {
        "->" => TokenKind::ObjectOperator,
        "?->" => TokenKind::NullsafeObjectOperator,
        "::" => TokenKind::DoubleColon,
        "=>" => TokenKind::DoubleArrow,
        ".=" => TokenKind::ConcatEqual,
        "+=" => TokenKind::PlusEqual,
        "-=" | "*=" | "/=" | "%=" | "**=" | "??=" | "&=" | "|=" | "^=" | "<<=" | ">>=" => {
            TokenKind::AssignOp
        }
        "..." => TokenKind::Ellipsis,
        "#[" => TokenKind::Attribute,
        _ if text.len() > 1 && text.bytes().all(|b| b.is_ascii_punctuation()) => {
            TokenKind::Operator
        }
        _ => return None,
    };
    Some(kind)
}

fn is_word(text: &str) -> bool {
    let mut chars = text.chars();
    chars
        .next()
        .is_some_and(|c| c == '_' || c.is_alphabetic())
        && chars.all(|c| c == '_' || c.is_alphanumeric())
}

/// Reserved words that get a kind of their own.  `lower` must already be
/// lowercased.
fn keyword_kind(lower: &str) -> Option<TokenKind> {
    let kind = match lower {
        "class" => TokenKind::Class,
        "interface" => TokenKind::Interface,
        "trait" => TokenKind::Trait,
        "extends" => TokenKind::Extends,
        "implements" => TokenKind::Implements,
        "function" => TokenKind::Function,
        "const" => TokenKind::Const,
        "public" => TokenKind::Public,
        "protected" => TokenKind::Protected,
        "private" => TokenKind::Private,
        "static" => TokenKind::Static,
        "abstract" => TokenKind::Abstract,
        "final" => TokenKind::Final,
        "var" => TokenKind::Var,
        "new" => TokenKind::New,
        "use" => TokenKind::Use,
        "return" => TokenKind::Return,
        "echo" => TokenKind::Echo,
        "print" => TokenKind::Print,
        "throw" => TokenKind::Throw,
        "namespace" => TokenKind::Namespace,
        "instanceof" | "and" | "or" | "xor" => TokenKind::Operator,
        "array" | "as" | "break" | "case" | "catch" | "clone" | "continue" | "declare"
        | "default" | "do" | "else" | "elseif" | "empty" | "enddeclare" | "endfor"
        | "endforeach" | "endif" | "endswitch" | "endwhile" | "eval" | "exit" | "die"
        | "finally" | "fn" | "for" | "foreach" | "global" | "goto" | "if" | "include"
        | "include_once" | "insteadof" | "isset" | "list" | "match" | "readonly"
        | "require" | "require_once" | "switch" | "try" | "unset" | "while" | "yield"
        | "callable" => TokenKind::Other(format!("T_{}", lower.to_ascii_uppercase())),
        _ => return None,
    };
    Some(kind)
}
