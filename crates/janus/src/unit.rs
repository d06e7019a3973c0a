//! A single compilation unit's columnar tables.
//!
//! All ids in this module are dense and start at zero *per unit* — a
//! `NodeId` only means something paired with the `CompilationUnit` it was
//! produced from. [`crate::storage::Snapshot`] is the thing that knows which
//! unit a caller means.

use crate::decl::{Decl, Ref};
use crate::diagnostic::Diagnostic;
use crate::ids::{DeclId, EdgeIndex, NodeId, RefId, ScopeId, StringId, TokenId};
use crate::node::AstNode;
use crate::scope::Scope;
use crate::span::Span;
use crate::token::Token;

/// One unit's sealed columnar tables: tokens, nodes, the shared `edges`
/// array, scopes, decls, refs and diagnostics.
#[derive(Debug, Clone)]
pub struct CompilationUnit {
    pub(crate) path: StringId,
    pub(crate) tokens: Vec<Token>,
    pub(crate) nodes: Vec<AstNode>,
    pub(crate) edges: Vec<NodeId>,
    pub(crate) scopes: Vec<Scope>,
    pub(crate) decls: Vec<Decl>,
    pub(crate) refs: Vec<Ref>,
    pub(crate) diagnostics: Vec<Diagnostic>,
}

impl CompilationUnit {
    pub fn path(&self) -> StringId {
        self.path
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn token_count(&self) -> usize {
        self.tokens.len()
    }

    pub fn get_node(&self, id: NodeId) -> Option<AstNode> {
        self.nodes.get(id.index()).copied()
    }

    pub fn token(&self, id: TokenId) -> Option<Token> {
        self.tokens.get(id.index()).copied()
    }

    pub fn scope(&self, id: ScopeId) -> Option<Scope> {
        self.scopes.get(id.index()).copied()
    }

    pub fn decl(&self, id: DeclId) -> Option<&Decl> {
        self.decls.get(id.index())
    }

    pub fn decl_ref(&self, id: RefId) -> Option<&Ref> {
        self.refs.get(id.index())
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub fn decls(&self) -> impl Iterator<Item = (DeclId, &Decl)> {
        self.decls
            .iter()
            .enumerate()
            .map(|(i, d)| (DeclId::new(i as u32), d))
    }

    /// A node's ordered children. Empty, not missing, when the node has no
    /// children or the id is out of range — callers that need to
    /// distinguish "no children" from "bad id" should check
    /// [`CompilationUnit::get_node`] first.
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        let Some(node) = self.get_node(id) else {
            return &[];
        };
        let lo = node.child_lo.index();
        let hi = node.child_hi.index();
        &self.edges[lo..hi]
    }

    pub fn tokens_of(&self, id: NodeId) -> &[Token] {
        let Some(node) = self.get_node(id) else {
            return &[];
        };
        &self.tokens[node.first_token.index()..=node.last_token.index()]
    }

    /// The span from a node's first token's start to its last token's end.
    pub fn span(&self, id: NodeId) -> Option<Span> {
        let node = self.get_node(id)?;
        let first = self.token(node.first_token)?;
        let last = self.token(node.last_token)?;
        Some(first.span.merge(&last.span))
    }

    /// Interned text of a node's first token, if it carries one.
    pub fn text_of(&self, id: NodeId) -> Option<StringId> {
        let node = self.get_node(id)?;
        self.token(node.first_token)?.text
    }
}
