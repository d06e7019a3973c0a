//! Accessor layer (§4.4): the only place in the system that dereferences a
//! node's child positions. Every function here validates
//! [`NodeKind`] first and returns `None` on mismatch rather than panicking —
//! a malformed AST is a preceding parser bug, not a reason to crash the
//! accessor.
//!
//! Child-position schema fixed by this module (the spec leaves the exact
//! layout implementation-defined):
//! - `FuncDecl`: `[name, return_type, body, param_0, param_1, ...]`.
//! - `VarDecl` / `LetStmt`: `[name, type_annotation_or_none, initializer_or_none]`,
//!   fixed arity 3; an absent optional slot holds [`NodeId::NONE`].
//! - `BinaryExpr`: `[left, right]`; the operator is read off the token
//!   stream between them, not a child.
//! - `UnaryExpr`: `[operand]`; the operator is the node's own first token.
//! - `CallExpr`: `[callee, arg_0, arg_1, ...]`.
//! - `FieldExpr`: `[object]`; the field name is the node's last token.
//! - `StructDecl` / `EnumDecl`: `[name, member_0, member_1, ...]`.
//! - `TypeAliasDecl`: `[name, aliased_type]`.
//! - `ImportDecl`: no children; the module path is the node's own text.

use crate::ids::{NodeId, StringId};
use crate::node::NodeKind;
use crate::token::TokenKind;
use crate::unit::CompilationUnit;

fn optional(id: NodeId) -> Option<NodeId> {
    if id.is_none() { None } else { Some(id) }
}

pub fn func_name(unit: &CompilationUnit, node: NodeId) -> Option<NodeId> {
    if unit.get_node(node)?.kind != NodeKind::FuncDecl {
        return None;
    }
    unit.children(node).first().copied()
}

pub fn func_return_type(unit: &CompilationUnit, node: NodeId) -> Option<NodeId> {
    if unit.get_node(node)?.kind != NodeKind::FuncDecl {
        return None;
    }
    optional(*unit.children(node).get(1)?)
}

pub fn func_body(unit: &CompilationUnit, node: NodeId) -> Option<NodeId> {
    if unit.get_node(node)?.kind != NodeKind::FuncDecl {
        return None;
    }
    unit.children(node).get(2).copied()
}

pub fn func_params<'u>(unit: &'u CompilationUnit, node: NodeId) -> Option<&'u [NodeId]> {
    if unit.get_node(node)?.kind != NodeKind::FuncDecl {
        return None;
    }
    let children = unit.children(node);
    if children.len() < 3 {
        return None;
    }
    Some(&children[3..])
}

/// `Param` children: `[name, type_annotation_or_none]`, fixed arity 2.
pub fn param_name(unit: &CompilationUnit, node: NodeId) -> Option<NodeId> {
    if unit.get_node(node)?.kind != NodeKind::Param {
        return None;
    }
    unit.children(node).first().copied()
}

pub fn param_type(unit: &CompilationUnit, node: NodeId) -> Option<NodeId> {
    if unit.get_node(node)?.kind != NodeKind::Param {
        return None;
    }
    optional(*unit.children(node).get(1)?)
}

fn is_decl_like(kind: NodeKind) -> bool {
    matches!(kind, NodeKind::VarDecl | NodeKind::LetStmt)
}

pub fn var_name(unit: &CompilationUnit, node: NodeId) -> Option<NodeId> {
    if !is_decl_like(unit.get_node(node)?.kind) {
        return None;
    }
    unit.children(node).first().copied()
}

pub fn var_type_annotation(unit: &CompilationUnit, node: NodeId) -> Option<NodeId> {
    if !is_decl_like(unit.get_node(node)?.kind) {
        return None;
    }
    optional(*unit.children(node).get(1)?)
}

pub fn var_initializer(unit: &CompilationUnit, node: NodeId) -> Option<NodeId> {
    if !is_decl_like(unit.get_node(node)?.kind) {
        return None;
    }
    optional(*unit.children(node).get(2)?)
}

/// `var_is_mutable` is a property of the *declaration*, not the AST node
/// alone (the parser records it on the `Decl` it emits); this accessor
/// looks it up from the unit's decl table rather than the node.
pub fn var_is_mutable(unit: &CompilationUnit, node: NodeId) -> Option<bool> {
    if !is_decl_like(unit.get_node(node)?.kind) {
        return None;
    }
    unit.decls()
        .find(|(_, d)| d.node == node)
        .map(|(_, d)| d.is_mutable)
}

fn operator_kind_in_range(unit: &CompilationUnit, node: NodeId) -> Option<TokenKind> {
    const OPERATORS: &[TokenKind] = &[
        TokenKind::Plus,
        TokenKind::Minus,
        TokenKind::Star,
        TokenKind::Slash,
        TokenKind::Percent,
        TokenKind::EqEq,
        TokenKind::NotEq,
        TokenKind::Lt,
        TokenKind::Gt,
        TokenKind::LtEq,
        TokenKind::GtEq,
        TokenKind::AndAnd,
        TokenKind::OrOr,
    ];
    unit.tokens_of(node)
        .iter()
        .find(|t| OPERATORS.contains(&t.kind))
        .map(|t| t.kind)
}

pub fn binary_op_left(unit: &CompilationUnit, node: NodeId) -> Option<NodeId> {
    if unit.get_node(node)?.kind != NodeKind::BinaryExpr {
        return None;
    }
    unit.children(node).first().copied()
}

pub fn binary_op_right(unit: &CompilationUnit, node: NodeId) -> Option<NodeId> {
    if unit.get_node(node)?.kind != NodeKind::BinaryExpr {
        return None;
    }
    unit.children(node).get(1).copied()
}

pub fn binary_op_kind(unit: &CompilationUnit, node: NodeId) -> Option<TokenKind> {
    if unit.get_node(node)?.kind != NodeKind::BinaryExpr {
        return None;
    }
    operator_kind_in_range(unit, node)
}

pub fn call_callee(unit: &CompilationUnit, node: NodeId) -> Option<NodeId> {
    if unit.get_node(node)?.kind != NodeKind::CallExpr {
        return None;
    }
    unit.children(node).first().copied()
}

pub fn call_args<'u>(unit: &'u CompilationUnit, node: NodeId) -> Option<&'u [NodeId]> {
    if unit.get_node(node)?.kind != NodeKind::CallExpr {
        return None;
    }
    let children = unit.children(node);
    if children.is_empty() {
        return None;
    }
    Some(&children[1..])
}

pub fn field_expr_object(unit: &CompilationUnit, node: NodeId) -> Option<NodeId> {
    if unit.get_node(node)?.kind != NodeKind::FieldExpr {
        return None;
    }
    unit.children(node).first().copied()
}

pub fn field_expr_name(unit: &CompilationUnit, node: NodeId) -> Option<StringId> {
    let n = unit.get_node(node)?;
    if n.kind != NodeKind::FieldExpr {
        return None;
    }
    unit.token(n.last_token)?.text
}

pub fn struct_name(unit: &CompilationUnit, node: NodeId) -> Option<NodeId> {
    if unit.get_node(node)?.kind != NodeKind::StructDecl {
        return None;
    }
    unit.children(node).first().copied()
}

pub fn struct_fields<'u>(unit: &'u CompilationUnit, node: NodeId) -> Option<&'u [NodeId]> {
    if unit.get_node(node)?.kind != NodeKind::StructDecl {
        return None;
    }
    let children = unit.children(node);
    if children.is_empty() {
        return None;
    }
    Some(&children[1..])
}

pub fn enum_name(unit: &CompilationUnit, node: NodeId) -> Option<NodeId> {
    if unit.get_node(node)?.kind != NodeKind::EnumDecl {
        return None;
    }
    unit.children(node).first().copied()
}

pub fn enum_variants<'u>(unit: &'u CompilationUnit, node: NodeId) -> Option<&'u [NodeId]> {
    if unit.get_node(node)?.kind != NodeKind::EnumDecl {
        return None;
    }
    let children = unit.children(node);
    if children.is_empty() {
        return None;
    }
    Some(&children[1..])
}

pub fn type_alias_name(unit: &CompilationUnit, node: NodeId) -> Option<NodeId> {
    if unit.get_node(node)?.kind != NodeKind::TypeAliasDecl {
        return None;
    }
    unit.children(node).first().copied()
}

pub fn type_alias_aliased(unit: &CompilationUnit, node: NodeId) -> Option<NodeId> {
    if unit.get_node(node)?.kind != NodeKind::TypeAliasDecl {
        return None;
    }
    unit.children(node).get(1).copied()
}

pub fn import_module_path(unit: &CompilationUnit, node: NodeId) -> Option<StringId> {
    if unit.get_node(node)?.kind != NodeKind::ImportDecl {
        return None;
    }
    unit.text_of(node)
}
