//! Lexical scopes.
//!
//! Scopes form a forest rooted at each unit's global scope; `parent` is a
//! plain optional id, never a pointer, so the forest is just as
//! arena-indexed as everything else in a snapshot.

use crate::ids::ScopeId;

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum ScopeKind {
    Global,
    Module,
    Function,
    Block,
    StructBody,
    EnumBody,
}

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct Scope {
    pub parent: Option<ScopeId>,
    pub kind: ScopeKind,
}

impl Scope {
    pub fn new(parent: Option<ScopeId>, kind: ScopeKind) -> Self {
        Self { parent, kind }
    }

    pub fn is_root(&self) -> bool {
        self.parent.is_none()
    }
}
