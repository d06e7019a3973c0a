//! Construction-phase API. `add_*` methods are the only mutation path;
//! `seal()` consumes the builder and hands back a read-only value. See
//! §4.2 and §6.

use std::collections::HashSet;

use janus_core::Interner;

use crate::decl::{Decl, DeclKind, Ref, Visibility};
use crate::diagnostic::{Diagnostic, DiagnosticCode, Severity};
use crate::error::BuildError;
use crate::ids::{DeclId, EdgeIndex, NodeId, RefId, ScopeId, StringId, TokenId, TypeId};
use crate::node::{AstNode, NodeKind};
use crate::scope::{Scope, ScopeKind};
use crate::span::Span;
use crate::token::{Token, TokenKind};
use crate::unit::CompilationUnit;

use super::snapshot::Snapshot;

/// Builds a single unit's columnar tables.
#[derive(Debug, Default)]
pub struct UnitBuilder {
    path: StringId,
    tokens: Vec<Token>,
    nodes: Vec<AstNode>,
    edges: Vec<NodeId>,
    scopes: Vec<Scope>,
    decls: Vec<Decl>,
    decl_names: HashSet<(ScopeId, StringId, DeclKind)>,
    refs: Vec<Ref>,
    diagnostics: Vec<Diagnostic>,
}

impl UnitBuilder {
    pub fn new(path: StringId) -> Self {
        Self {
            path,
            ..Default::default()
        }
    }

    pub fn add_token(&mut self, kind: TokenKind, text: Option<StringId>, span: Span) -> TokenId {
        let id = TokenId::new(self.tokens.len() as u32);
        self.tokens.push(Token::new(kind, text, span));
        id
    }

    pub fn add_node(
        &mut self,
        kind: NodeKind,
        first_token: TokenId,
        last_token: TokenId,
        children: &[NodeId],
    ) -> NodeId {
        let child_lo = EdgeIndex::new(self.edges.len() as u32);
        self.edges.extend_from_slice(children);
        let child_hi = EdgeIndex::new(self.edges.len() as u32);

        let id = NodeId::new(self.nodes.len() as u32);
        self.nodes
            .push(AstNode::new(kind, first_token, last_token, child_lo, child_hi));
        id
    }

    pub fn add_scope(&mut self, parent: Option<ScopeId>, kind: ScopeKind) -> ScopeId {
        let id = ScopeId::new(self.scopes.len() as u32);
        self.scopes.push(Scope::new(parent, kind));
        id
    }

    /// Rejects a second decl with the same `(scope, name, kind)` — the
    /// first is kept, a `MalformedAst`-adjacent diagnostic is not emitted
    /// here (that's the parser's call); the caller gets `BuildError` and
    /// decides whether to also call `add_diagnostic`.
    ///
    /// `DeclKind::Function` is exempt: a scope may hold several functions
    /// sharing a name (overloads), since disambiguating between them by
    /// argument types is exactly what `Dispatch` (§4.5 step 3) exists to
    /// do. Every other kind keeps the one-per-scope invariant.
    pub fn add_decl(
        &mut self,
        node: NodeId,
        name: StringId,
        scope: ScopeId,
        kind: DeclKind,
        visibility: Visibility,
        declared_type: Option<TypeId>,
        is_mutable: bool,
    ) -> Result<DeclId, BuildError> {
        if kind != DeclKind::Function {
            let key = (scope, name, kind);
            if !self.decl_names.insert(key) {
                return Err(BuildError::DuplicateDeclaration { name, scope, kind });
            }
        }

        let id = DeclId::new(self.decls.len() as u32);
        self.decls.push(Decl::new(
            node,
            name,
            scope,
            kind,
            visibility,
            declared_type,
            is_mutable,
        ));
        Ok(id)
    }

    pub fn add_ref(&mut self, from: NodeId, name: StringId, to: DeclId) -> RefId {
        let id = RefId::new(self.refs.len() as u32);
        self.refs.push(Ref::new(from, name, to));
        id
    }

    pub fn add_diagnostic(
        &mut self,
        severity: Severity,
        code: DiagnosticCode,
        message: StringId,
        span: Span,
    ) {
        self.diagnostics
            .push(Diagnostic::new(severity, code, message, span));
    }

    pub fn seal(self) -> CompilationUnit {
        CompilationUnit {
            path: self.path,
            tokens: self.tokens,
            nodes: self.nodes,
            edges: self.edges,
            scopes: self.scopes,
            decls: self.decls,
            refs: self.refs,
            diagnostics: self.diagnostics,
        }
    }
}

/// Builds a whole snapshot: one shared interner plus one or more units.
/// `new_snapshot(unit_path)` in §6 maps to [`SnapshotBuilder::new`]; the
/// returned builder is already positioned on its first unit.
pub struct SnapshotBuilder {
    interner: Interner,
    units: Vec<CompilationUnit>,
    current: UnitBuilder,
}

impl SnapshotBuilder {
    pub fn new(unit_path: &str) -> Self {
        let mut interner = Interner::new();
        let path = interner.intern(unit_path);
        Self {
            interner,
            units: Vec::new(),
            current: UnitBuilder::new(path),
        }
    }

    pub fn intern(&mut self, s: &str) -> StringId {
        self.interner.intern(s)
    }

    pub fn add_token(&mut self, kind: TokenKind, text: Option<StringId>, span: Span) -> TokenId {
        self.current.add_token(kind, text, span)
    }

    pub fn add_node(
        &mut self,
        kind: NodeKind,
        first_token: TokenId,
        last_token: TokenId,
        children: &[NodeId],
    ) -> NodeId {
        self.current.add_node(kind, first_token, last_token, children)
    }

    pub fn add_scope(&mut self, parent: Option<ScopeId>, kind: ScopeKind) -> ScopeId {
        self.current.add_scope(parent, kind)
    }

    pub fn add_decl(
        &mut self,
        node: NodeId,
        name: StringId,
        scope: ScopeId,
        kind: DeclKind,
        visibility: Visibility,
        declared_type: Option<TypeId>,
        is_mutable: bool,
    ) -> Result<DeclId, BuildError> {
        self.current
            .add_decl(node, name, scope, kind, visibility, declared_type, is_mutable)
    }

    pub fn add_ref(&mut self, from: NodeId, name: StringId, to: DeclId) -> RefId {
        self.current.add_ref(from, name, to)
    }

    pub fn add_diagnostic(
        &mut self,
        severity: Severity,
        code: DiagnosticCode,
        message: StringId,
        span: Span,
    ) {
        self.current.add_diagnostic(severity, code, message, span)
    }

    /// Seals the unit under construction and starts a new one, returning
    /// the id the sealed unit will have within the final snapshot.
    pub fn begin_unit(&mut self, path: &str) -> crate::ids::UnitId {
        let interned = self.interner.intern(path);
        let next = UnitBuilder::new(interned);
        let sealed = std::mem::replace(&mut self.current, next).seal();
        let id = crate::ids::UnitId::new(self.units.len() as u32);
        self.units.push(sealed);
        id
    }

    pub fn seal(mut self) -> Snapshot {
        self.units.push(self.current.seal());
        Snapshot::new(self.interner, self.units)
    }
}
