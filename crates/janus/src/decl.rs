//! Declarations.
//!
//! A `Decl` binds a name to a node within a scope. Name resolution and
//! duplicate-rejection happen at construction time in
//! [`crate::storage::SnapshotBuilder::add_decl`]; this module only owns the
//! record shape.

use serde::Serialize;

use crate::ids::{DeclId, NodeId, ScopeId, StringId, TypeId};

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize)]
pub enum DeclKind {
    Variable,
    Function,
    Parameter,
    TypeAlias,
    Struct,
    Enum,
    EnumVariant,
    Module,
}

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum Visibility {
    Private,
    ModuleLocal,
    Public,
}

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct Decl {
    pub node: NodeId,
    pub name: StringId,
    pub scope: ScopeId,
    pub kind: DeclKind,
    pub declared_type: Option<TypeId>,
    pub visibility: Visibility,
    /// Only meaningful for `DeclKind::Variable`/`Parameter`; `false`
    /// otherwise. Backs the `var_is_mutable` accessor and feeds the CID
    /// canonical payload's modifier-flags word.
    pub is_mutable: bool,
}

impl Decl {
    pub fn new(
        node: NodeId,
        name: StringId,
        scope: ScopeId,
        kind: DeclKind,
        visibility: Visibility,
        declared_type: Option<TypeId>,
        is_mutable: bool,
    ) -> Self {
        Self {
            node,
            name,
            scope,
            kind,
            declared_type,
            visibility,
            is_mutable,
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct Ref {
    pub from: NodeId,
    pub name: StringId,
    pub to: DeclId,
}

impl Ref {
    pub fn new(from: NodeId, name: StringId, to: DeclId) -> Self {
        Self { from, name, to }
    }
}
