//! Declaration extraction.
//!
//! Turns the flat token stream of one PHP file into [`Declaration`]s for
//! every class member and top-level function or constant.  There is no
//! parse tree: a single left-to-right pass keeps an [`ExtractorState`]
//! (brace depth, the enclosing class, the member being read) and feeds it
//! one token at a time through [`ExtractorState::apply`].
//!
//! Only two places are visible: the top level (depth 0) and a class body
//! (depth 1 inside a class).  Anything deeper, such as the statements of a
//! method body, never produces a declaration.
//!
//! A member is *flushed* (turned into a [`Declaration`] and its fields
//! reset) at the `}` that brings the depth back to the class body or the
//! top level, and at a `;` directly inside a class body.  The class itself
//! is forgotten at the `}` that brings the depth back to 0.
//!
//! Malformed input never fails.  Unexpected tokens are ignored, and once
//! an unmatched `}` drives the depth negative no position is visible any
//! more, so nothing further is emitted.

use tracing::trace;

use crate::docblock;
use crate::error::Result;
use crate::lexer::Lexer;
use crate::types::{
    Argument, CONSTRUCTOR, Declaration, DeclarationKind, GLOBAL_CLASS, Token, TokenKind,
    Visibility,
};

/// Extract all declarations from a token sequence.
pub fn extract(tokens: &[Token]) -> Vec<Declaration> {
    let mut state = ExtractorState::default();
    let mut declarations = Vec::new();
    for index in 0..tokens.len() {
        let (next, emitted) = state.apply(tokens, index);
        state = next;
        declarations.extend(emitted);
    }
    declarations
}

/// Tokenize `source` with `lexer` and extract its declarations.
pub fn extract_source(lexer: &impl Lexer, source: &str) -> Result<Vec<Declaration>> {
    Ok(extract(&lexer.tokenize(source)?))
}

// ─── State ──────────────────────────────────────────────────────────────────

/// Fields of the member currently being read.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct MemberState {
    visibility: Option<Visibility>,
    is_static: bool,
    kind: Option<DeclarationKind>,
    name: Option<String>,
    args: Vec<Argument>,
    /// The parameter list has been opened at least once.
    args_opened: bool,
    in_args: bool,
    /// Parenthesis depth inside the parameter list (default values may
    /// contain calls such as `array()`).
    args_parens: u32,
    returns: Option<String>,
    doc: Option<String>,
    line: u32,
}

/// Running state of the extractor between two tokens.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractorState {
    depth: i32,
    in_class: bool,
    class_name: Option<String>,
    extends: Option<String>,
    implements: Option<String>,
    member: MemberState,
}

/// How much state a flush clears.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Reset {
    /// The member fields only; the enclosing class stays.
    Member,
    /// Everything except the brace depth.
    Class,
}

impl ExtractorState {
    /// Current brace depth.  Negative after unmatched `}`.
    pub fn depth(&self) -> i32 {
        self.depth
    }

    pub fn class_name(&self) -> Option<&str> {
        self.class_name.as_deref()
    }

    /// Top level outside any class, or directly inside a class body.
    fn at_member_level(&self) -> bool {
        if self.in_class {
            self.depth == 1
        } else {
            self.depth == 0
        }
    }

    fn in_class_body(&self) -> bool {
        self.in_class && self.depth == 1
    }

    /// Feed the token at `index`.  Returns the next state and the
    /// declaration completed by this token, if any.
    ///
    /// The whole token slice is passed so that keywords can look ahead for
    /// the name they introduce.
    pub fn apply(mut self, tokens: &[Token], index: usize) -> (Self, Option<Declaration>) {
        let token = &tokens[index];
        if token.is_trivia() {
            return (self, None);
        }

        let Some(kind) = &token.kind else {
            return self.apply_punct(token);
        };

        match kind {
            TokenKind::Public | TokenKind::Protected | TokenKind::Private => {
                if self.at_member_level() && self.member.kind.is_none() {
                    self.member.visibility = Some(match kind {
                        TokenKind::Protected => Visibility::Protected,
                        TokenKind::Private => Visibility::Private,
                        _ => Visibility::Public,
                    });
                }
            }
            TokenKind::Static => {
                if self.at_member_level() && self.member.kind.is_none() {
                    self.member.is_static = true;
                }
            }
            TokenKind::DocComment => {
                if self.at_member_level() && !self.member.in_args {
                    self.member.doc = Some(token.text.clone());
                }
            }
            TokenKind::Variable if self.member.in_args => {
                let type_hint = self
                    .member
                    .doc
                    .as_deref()
                    .and_then(|doc| docblock::param_type(doc, &token.text))
                    .unwrap_or_default();
                self.member.args.push(Argument {
                    name: token.text.clone(),
                    type_hint,
                });
            }
            TokenKind::Variable => {
                if self.in_class_body() && self.member.kind.is_none() && self.member.name.is_none()
                {
                    self.begin_member(DeclarationKind::Variable, token.text.clone(), token.line);
                    self.member.returns = self.member.doc.as_deref().and_then(docblock::var_type);
                }
            }
            TokenKind::Const => {
                if self.at_member_level()
                    && self.member.kind.is_none()
                    && !follows_use(tokens, index)
                    && let Some(name) = constant_name(tokens, index)
                {
                    self.begin_member(DeclarationKind::Constant, name.text.clone(), name.line);
                    self.member.is_static = true;
                    self.member.returns = self.member.doc.as_deref().and_then(docblock::var_type);
                }
            }
            TokenKind::Function => {
                if self.at_member_level()
                    && self.member.kind.is_none()
                    && !follows_use(tokens, index)
                    && let Some(name) = function_name(tokens, index)
                {
                    self.begin_member(DeclarationKind::Function, name.text.clone(), name.line);
                    if name.text == CONSTRUCTOR {
                        self.member.returns = self.class_name.clone();
                    }
                    if let Some(returns) = self.member.doc.as_deref().and_then(docblock::return_type)
                    {
                        self.member.returns = Some(returns);
                    }
                }
            }
            TokenKind::Class | TokenKind::Interface | TokenKind::Trait => {
                // `Foo::class` names a class, it does not declare one.
                if !previous_significant(tokens, index)
                    .is_some_and(|t| t.is(&TokenKind::DoubleColon))
                {
                    self.in_class = true;
                    self.class_name = next_identifier(tokens, index + 1).map(|t| t.text.clone());
                    if self.member.kind.is_none() {
                        self.member.doc = None;
                    }
                }
            }
            TokenKind::Extends => {
                self.extends = next_identifier(tokens, index + 1).map(|t| t.text.clone());
            }
            TokenKind::Implements => {
                self.implements = next_identifier(tokens, index + 1).map(|t| t.text.clone());
            }
            _ => {}
        }

        (self, None)
    }

    fn apply_punct(mut self, token: &Token) -> (Self, Option<Declaration>) {
        if token.is_punct('{') {
            self.depth += 1;
        } else if token.is_punct('}') {
            self.depth -= 1;
            if self.depth == 0 {
                return self.flush(Reset::Class);
            }
            if self.in_class_body() {
                return self.flush(Reset::Member);
            }
        } else if token.is_punct(';') {
            if self.in_class_body() {
                return self.flush(Reset::Member);
            }
            if self.depth == 0
                && !self.in_class
                && self.member.kind == Some(DeclarationKind::Constant)
            {
                return self.flush(Reset::Member);
            }
        } else if token.is_punct('(') {
            if self.member.in_args {
                self.member.args_parens += 1;
            } else if self.member.kind == Some(DeclarationKind::Function)
                && !self.member.args_opened
                && self.at_member_level()
            {
                self.member.args_opened = true;
                self.member.in_args = true;
                self.member.args_parens = 1;
            }
        } else if token.is_punct(')') && self.member.in_args {
            self.member.args_parens = self.member.args_parens.saturating_sub(1);
            if self.member.args_parens == 0 {
                self.member.in_args = false;
            }
        }
        (self, None)
    }

    fn begin_member(&mut self, kind: DeclarationKind, name: String, line: u32) {
        self.member.kind = Some(kind);
        self.member.name = Some(name);
        self.member.line = line;
        self.member.args.clear();
    }

    /// Turn the current member into a [`Declaration`] (if it has a name)
    /// and return the state with `reset` applied.
    fn flush(self, reset: Reset) -> (Self, Option<Declaration>) {
        let ExtractorState {
            depth,
            in_class,
            class_name,
            extends,
            implements,
            member,
        } = self;

        let declaration = match (member.kind, member.name) {
            (Some(kind), Some(name)) => Some(Declaration {
                class: class_name
                    .clone()
                    .unwrap_or_else(|| GLOBAL_CLASS.to_string()),
                extends: extends.clone(),
                implements: implements.clone(),
                visibility: member.visibility.unwrap_or_default(),
                is_static: member.is_static,
                kind,
                name,
                args: member.args,
                returns: member.returns.unwrap_or_default(),
                doc: member.doc.unwrap_or_default(),
                line: member.line,
            }),
            _ => None,
        };

        if let Some(d) = &declaration {
            trace!(class = %d.class, name = %d.name, kind = ?d.kind, "declaration");
        }

        let next = match reset {
            Reset::Member => ExtractorState {
                depth,
                in_class,
                class_name,
                extends,
                implements,
                member: MemberState::default(),
            },
            Reset::Class => ExtractorState {
                depth,
                ..ExtractorState::default()
            },
        };
        (next, declaration)
    }
}

// ─── Lookahead / lookbehind ─────────────────────────────────────────────────

fn is_skippable(token: &Token) -> bool {
    token.is_trivia() || token.is(&TokenKind::DocComment)
}

/// First identifier-kind token at or after `from`, however far away.
fn next_identifier(tokens: &[Token], from: usize) -> Option<&Token> {
    tokens.get(from..)?.iter().find(|t| t.is_identifier())
}

fn next_significant(tokens: &[Token], from: usize) -> Option<(usize, &Token)> {
    tokens
        .iter()
        .enumerate()
        .skip(from)
        .find(|(_, t)| !is_skippable(t))
}

fn previous_significant(tokens: &[Token], index: usize) -> Option<&Token> {
    tokens[..index].iter().rev().find(|t| !is_skippable(t))
}

/// `use function Foo\bar;` and `use const Foo\BAR;` import, they do not
/// declare.
fn follows_use(tokens: &[Token], index: usize) -> bool {
    previous_significant(tokens, index).is_some_and(|t| t.is(&TokenKind::Use))
}

/// Name after `function`, skipping a by-reference `&`.  `None` for
/// closures.
fn function_name(tokens: &[Token], index: usize) -> Option<&Token> {
    let (at, token) = next_significant(tokens, index + 1)?;
    let token = if token.is_punct('&') {
        next_significant(tokens, at + 1)?.1
    } else {
        token
    };
    token.is_identifier().then_some(token)
}

/// Name after `const`: the last identifier before `=`, so that a typed
/// constant (`const int LIMIT = 3`) yields `LIMIT`.
fn constant_name(tokens: &[Token], index: usize) -> Option<&Token> {
    let mut name = None;
    for token in &tokens[index + 1..] {
        if token.is_punct('=') || token.is_punct(';') || token.is_punct(',') {
            break;
        }
        if token.is_identifier() {
            name = Some(token);
        } else if !is_skippable(token) && !token.is_punct('?') {
            break;
        }
    }
    name
}
