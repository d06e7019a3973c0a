//! Lexical tokens.
//!
//! Tokens are produced by the external lexer/parser and handed to
//! [`crate::storage::SnapshotBuilder::add_token`] verbatim; this module owns
//! only their shape, not their production.

use crate::ids::StringId;
use crate::span::Span;

/// Closed, versioned set of lexical categories. The numeric discriminant is
/// part of the canonical byte stream fed to the CID hasher (see
/// [`crate::cid`]), so reordering variants is a breaking change to content
/// identity, not just to this enum.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
#[repr(u16)]
pub enum TokenKind {
    Identifier = 0,
    IntLiteral = 1,
    FloatLiteral = 2,
    StringLiteral = 3,
    BoolLiteral = 4,

    // Keywords
    KwFunc = 10,
    KwLet = 11,
    KwVar = 12,
    KwStruct = 13,
    KwEnum = 14,
    KwImport = 15,
    KwReturn = 16,
    KwIf = 17,
    KwElse = 18,
    KwPub = 19,
    KwMut = 20,

    // Punctuation
    LParen = 40,
    RParen = 41,
    LBrace = 42,
    RBrace = 43,
    LBracket = 44,
    RBracket = 45,
    Comma = 46,
    Colon = 47,
    Semicolon = 48,
    Arrow = 49,
    Dot = 50,
    Eq = 51,

    // Operators
    Plus = 60,
    Minus = 61,
    Star = 62,
    Slash = 63,
    Percent = 64,
    EqEq = 65,
    NotEq = 66,
    Lt = 67,
    Gt = 68,
    LtEq = 69,
    GtEq = 70,
    AndAnd = 71,
    OrOr = 72,

    // Trivia — present in the token stream but excluded from canonical
    // payloads wherever a kind is hashed for CID purposes.
    Whitespace = 100,
    LineComment = 101,
    BlockComment = 102,
    Eof = 103,
}

impl TokenKind {
    pub fn is_trivia(self) -> bool {
        matches!(
            self,
            TokenKind::Whitespace | TokenKind::LineComment | TokenKind::BlockComment
        )
    }

    pub fn carries_string_id(self) -> bool {
        matches!(
            self,
            TokenKind::Identifier
                | TokenKind::IntLiteral
                | TokenKind::FloatLiteral
                | TokenKind::StringLiteral
        )
    }
}

/// A single lexical token. `text` is `Some` only for identifier and literal
/// categories, per [`TokenKind::carries_string_id`].
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct Token {
    pub kind: TokenKind,
    pub text: Option<StringId>,
    pub span: Span,
}

impl Token {
    pub fn new(kind: TokenKind, text: Option<StringId>, span: Span) -> Self {
        Self { kind, text, span }
    }
}
