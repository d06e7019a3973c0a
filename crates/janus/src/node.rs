//! Syntax nodes.
//!
//! An [`AstNode`] never holds a pointer to its children: it holds a token
//! range (`first_token..=last_token`) and an edge-index range into the
//! snapshot's shared `edges` array. See [`crate::storage`] for the arrays
//! this indexes into, and [`crate::accessor`] for the only sanctioned way to
//! interpret a node's children semantically.

use crate::ids::{EdgeIndex, TokenId};

/// Closed, versioned set of syntactic categories. As with [`crate::token::TokenKind`],
/// the discriminant feeds the CID canonical stream — adding a variant is a
/// versioned, breaking change to content identity.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
#[repr(u16)]
pub enum NodeKind {
    SourceFile = 0,

    FuncDecl = 10,
    VarDecl = 11,
    LetStmt = 12,
    Param = 13,
    StructDecl = 14,
    StructField = 15,
    EnumDecl = 16,
    EnumVariant = 17,
    TypeAliasDecl = 18,
    ImportDecl = 19,

    Block = 30,
    ReturnStmt = 31,
    IfStmt = 32,
    ExprStmt = 33,

    Identifier = 50,
    CallExpr = 51,
    FieldExpr = 52,
    BinaryExpr = 53,
    UnaryExpr = 54,

    IntLiteral = 70,
    FloatLiteral = 71,
    BoolLiteral = 72,
    StringLiteral = 73,

    TypePrimitive = 90,
    TypePath = 91,
    TypeCompound = 92,
}

/// A syntax node. `child_lo..child_hi` indexes a contiguous slice of
/// `edges`; invariant: `child_lo <= child_hi`.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct AstNode {
    pub kind: NodeKind,
    pub first_token: TokenId,
    pub last_token: TokenId,
    pub child_lo: EdgeIndex,
    pub child_hi: EdgeIndex,
}

impl AstNode {
    pub fn new(
        kind: NodeKind,
        first_token: TokenId,
        last_token: TokenId,
        child_lo: EdgeIndex,
        child_hi: EdgeIndex,
    ) -> Self {
        debug_assert!(child_lo.index() <= child_hi.index());
        Self {
            kind,
            first_token,
            last_token,
            child_lo,
            child_hi,
        }
    }
}
