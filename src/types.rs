//! Data types used throughout php-codeintel.
//!
//! This module contains the "model" structs and enums shared by the lexer,
//! the declaration extractor, the context resolver and the completion
//! consumer: [`Token`] / [`TokenKind`], [`Declaration`] and its parts, and
//! the [`Context`] snapshot returned for a cursor position.

use serde::{Deserialize, Serialize};

/// Class name recorded on declarations that live outside any class body
/// (top-level functions and constants).
pub const GLOBAL_CLASS: &str = "__global__";

/// The token PHP uses for "the current instance" inside a method body.
pub const SELF_REFERENCE: &str = "$this";

/// Name PHP reserves for constructors.
pub const CONSTRUCTOR: &str = "__construct";

// ─── Tokens ─────────────────────────────────────────────────────────────────

/// Symbolic lexical category of a [`Token`].
///
/// The variants mirror the `T_*` constants of PHP's own tokenizer for the
/// categories the extractor and resolver care about.  Anything else a
/// process-backed lexer reports is carried as [`TokenKind::Other`].
/// Single-character punctuation has no kind at all (`Token::kind` is
/// `None`), exactly like `token_get_all()`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TokenKind {
    OpenTag,
    OpenTagWithEcho,
    CloseTag,
    InlineHtml,
    Whitespace,
    Comment,
    DocComment,
    /// `$name`
    Variable,
    /// A bare identifier (`T_STRING`).
    String,
    /// `Foo\Bar`
    NameQualified,
    /// `\Foo\Bar`
    NameFullyQualified,
    /// `namespace\Foo`
    NameRelative,
    LNumber,
    DNumber,
    ConstantEncapsedString,
    Heredoc,
    Class,
    Interface,
    Trait,
    Extends,
    Implements,
    Function,
    Const,
    Public,
    Protected,
    Private,
    Static,
    Abstract,
    Final,
    Var,
    New,
    Use,
    Return,
    Echo,
    Print,
    Throw,
    Namespace,
    /// `->`
    ObjectOperator,
    /// `?->`
    NullsafeObjectOperator,
    /// `::`
    DoubleColon,
    /// `=>`
    DoubleArrow,
    /// `.=`
    ConcatEqual,
    /// `+=`
    PlusEqual,
    /// Every other compound assignment (`-=`, `*=`, `??=`, ...).
    AssignOp,
    /// `...`
    Ellipsis,
    /// `\` on its own.
    NsSeparator,
    /// `#[`
    Attribute,
    /// Remaining multi-character operators (`==`, `&&`, `<=>`, `++`, ...).
    Operator,
    /// A token category this crate does not interpret, by its PHP name.
    Other(String),
}

impl TokenKind {
    /// Map a PHP token name (as returned by `token_name()`) to a kind.
    pub fn from_php_name(name: &str) -> TokenKind {
        match name {
            "T_OPEN_TAG" => TokenKind::OpenTag,
            "T_OPEN_TAG_WITH_ECHO" => TokenKind::OpenTagWithEcho,
            "T_CLOSE_TAG" => TokenKind::CloseTag,
            "T_INLINE_HTML" => TokenKind::InlineHtml,
            "T_WHITESPACE" => TokenKind::Whitespace,
            "T_COMMENT" => TokenKind::Comment,
            "T_DOC_COMMENT" => TokenKind::DocComment,
            "T_VARIABLE" => TokenKind::Variable,
            "T_STRING" => TokenKind::String,
            "T_NAME_QUALIFIED" => TokenKind::NameQualified,
            "T_NAME_FULLY_QUALIFIED" => TokenKind::NameFullyQualified,
            "T_NAME_RELATIVE" => TokenKind::NameRelative,
            "T_LNUMBER" => TokenKind::LNumber,
            "T_DNUMBER" => TokenKind::DNumber,
            "T_CONSTANT_ENCAPSED_STRING" => TokenKind::ConstantEncapsedString,
            "T_START_HEREDOC" | "T_END_HEREDOC" | "T_ENCAPSED_AND_WHITESPACE" => {
                TokenKind::Heredoc
            }
            "T_CLASS" => TokenKind::Class,
            "T_INTERFACE" => TokenKind::Interface,
            "T_TRAIT" => TokenKind::Trait,
            "T_EXTENDS" => TokenKind::Extends,
            "T_IMPLEMENTS" => TokenKind::Implements,
            "T_FUNCTION" => TokenKind::Function,
            "T_CONST" => TokenKind::Const,
            "T_PUBLIC" => TokenKind::Public,
            "T_PROTECTED" => TokenKind::Protected,
            "T_PRIVATE" => TokenKind::Private,
            "T_STATIC" => TokenKind::Static,
            "T_ABSTRACT" => TokenKind::Abstract,
            "T_FINAL" => TokenKind::Final,
            "T_VAR" => TokenKind::Var,
            "T_NEW" => TokenKind::New,
            "T_USE" => TokenKind::Use,
            "T_RETURN" => TokenKind::Return,
            "T_ECHO" => TokenKind::Echo,
            "T_PRINT" => TokenKind::Print,
            "T_THROW" => TokenKind::Throw,
            "T_NAMESPACE" => TokenKind::Namespace,
            "T_OBJECT_OPERATOR" => TokenKind::ObjectOperator,
            "T_NULLSAFE_OBJECT_OPERATOR" => TokenKind::NullsafeObjectOperator,
            "T_DOUBLE_COLON" | "T_PAAMAYIM_NEKUDOTAYIM" => TokenKind::DoubleColon,
            "T_DOUBLE_ARROW" => TokenKind::DoubleArrow,
            "T_CONCAT_EQUAL" => TokenKind::ConcatEqual,
            "T_PLUS_EQUAL" => TokenKind::PlusEqual,
            "T_MINUS_EQUAL" | "T_MUL_EQUAL" | "T_DIV_EQUAL" | "T_MOD_EQUAL" | "T_POW_EQUAL"
            | "T_AND_EQUAL" | "T_OR_EQUAL" | "T_XOR_EQUAL" | "T_SL_EQUAL" | "T_SR_EQUAL"
            | "T_COALESCE_EQUAL" => TokenKind::AssignOp,
            "T_ELLIPSIS" => TokenKind::Ellipsis,
            "T_NS_SEPARATOR" => TokenKind::NsSeparator,
            "T_ATTRIBUTE" => TokenKind::Attribute,
            "T_IS_EQUAL" | "T_IS_NOT_EQUAL" | "T_IS_IDENTICAL" | "T_IS_NOT_IDENTICAL"
            | "T_IS_SMALLER_OR_EQUAL" | "T_IS_GREATER_OR_EQUAL" | "T_SPACESHIP"
            | "T_BOOLEAN_AND" | "T_BOOLEAN_OR" | "T_LOGICAL_AND" | "T_LOGICAL_OR"
            | "T_LOGICAL_XOR" | "T_INC" | "T_DEC" | "T_SL" | "T_SR" | "T_POW" | "T_COALESCE" => {
                TokenKind::Operator
            }
            other => TokenKind::Other(other.to_string()),
        }
    }

    /// Whether this kind names something: a bare or namespaced identifier.
    pub fn is_identifier(&self) -> bool {
        matches!(
            self,
            TokenKind::String
                | TokenKind::NameQualified
                | TokenKind::NameFullyQualified
                | TokenKind::NameRelative
        )
    }

    /// Whitespace and comments carry no structure.
    pub fn is_trivia(&self) -> bool {
        matches!(self, TokenKind::Whitespace | TokenKind::Comment)
    }
}

/// Smallest lexical unit handed to the extractor and the resolver.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    /// `None` for single-character punctuation.
    pub kind: Option<TokenKind>,
    /// The literal lexeme.
    pub text: String,
    /// 1-based source line.
    pub line: u32,
}

impl Token {
    pub fn new(kind: TokenKind, text: impl Into<String>, line: u32) -> Self {
        Self {
            kind: Some(kind),
            text: text.into(),
            line,
        }
    }

    /// A single-character punctuation token.
    pub fn punct(ch: char, line: u32) -> Self {
        Self {
            kind: None,
            text: ch.to_string(),
            line,
        }
    }

    pub fn is(&self, kind: &TokenKind) -> bool {
        self.kind.as_ref() == Some(kind)
    }

    /// True for a kind-less punctuation token whose text is `ch`.
    pub fn is_punct(&self, ch: char) -> bool {
        self.kind.is_none() && self.text.len() == ch.len_utf8() && self.text.starts_with(ch)
    }

    pub fn is_identifier(&self) -> bool {
        self.kind.as_ref().is_some_and(TokenKind::is_identifier)
    }

    pub fn is_trivia(&self) -> bool {
        self.kind.as_ref().is_some_and(TokenKind::is_trivia)
    }
}

// ─── Declarations ───────────────────────────────────────────────────────────

/// Visibility of a class member.
///
/// In PHP, members without an explicit visibility modifier default to `Public`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    #[default]
    Public,
    Protected,
    Private,
}

/// What sort of member a [`Declaration`] describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DeclarationKind {
    /// A property (`$name`).
    #[serde(rename = "var")]
    Variable,
    /// A method or top-level function.
    #[serde(rename = "func")]
    Function,
    /// A class or top-level constant.  Always static.
    #[serde(rename = "const")]
    Constant,
}

/// One parameter of a function member.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Argument {
    /// The parameter name including the `$` prefix (e.g. "$text").
    pub name: String,
    /// Type from the matching `@param` tag, or empty.
    pub type_hint: String,
}

impl Argument {
    /// The name without its `$`.
    pub fn bare_name(&self) -> &str {
        self.name.trim_start_matches('$')
    }
}

/// One structural member (method, property, constant) or top-level symbol.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Declaration {
    /// Enclosing class, or [`GLOBAL_CLASS`].
    pub class: String,
    pub extends: Option<String>,
    /// Only the first name of an `implements` list is recorded.
    pub implements: Option<String>,
    pub visibility: Visibility,
    #[serde(rename = "static")]
    pub is_static: bool,
    pub kind: DeclarationKind,
    /// The name as written: properties keep their `$`.
    pub name: String,
    pub args: Vec<Argument>,
    /// Inferred type, or empty.
    pub returns: String,
    /// Raw doc comment, or empty.
    pub doc: String,
    /// 1-based line of the token that named the member.
    pub line: u32,
}

impl Declaration {
    /// The member name without a leading `$`.
    pub fn bare_name(&self) -> &str {
        self.name.trim_start_matches('$')
    }

    /// Properties and constants.
    pub fn is_variable(&self) -> bool {
        matches!(
            self.kind,
            DeclarationKind::Variable | DeclarationKind::Constant
        )
    }

    pub fn is_global(&self) -> bool {
        self.class == GLOBAL_CLASS
    }
}

// ─── Cursor context ─────────────────────────────────────────────────────────

/// The access operator that precedes the cursor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AccessOperator {
    /// `->` or `?->` (instance access).
    #[serde(rename = "->")]
    Member,
    /// `::` (static access).
    #[serde(rename = "::")]
    Static,
}

/// Which members the context may see.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContextVisibility {
    /// Reached through `$this`: private and protected members too.
    All,
    /// Reached from outside: public members only.
    Public,
}

/// The receiver expression leading up to a cursor.
///
/// `chain` is outer-to-inner: `$this->repo->find` gives
/// `["MyClass", "repo", "find"]` once `$this` has been resolved.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Context {
    pub chain: Vec<String>,
    pub visibility: Option<ContextVisibility>,
    pub operator: Option<AccessOperator>,
}

impl Context {
    /// The left-most element, normally a class name after resolution.
    pub fn base(&self) -> Option<&str> {
        self.chain.first().map(String::as_str)
    }

    /// Whether the base could not be resolved to a type and is still a
    /// raw variable name.
    pub fn is_unresolved(&self) -> bool {
        self.base().is_some_and(|b| b.starts_with('$'))
    }
}
