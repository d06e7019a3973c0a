//! Janus: a columnar, immutable, content-addressed AST database with a
//! memoized, dependency-tracking query engine.
//!
//! A [`storage::Snapshot`] is built once via [`storage::SnapshotBuilder`]
//! and never mutated afterward; an edit produces a new snapshot. Every
//! node's [`cid::Cid`] is a content hash of its semantic payload and its
//! children's CIDs, so two structurally identical subtrees — even across
//! snapshots, even after reformatting — hash identically. A
//! [`query::QueryEngine`] memoizes query results against a snapshot and a
//! [`cid::Canonicalizer`], tracks which CIDs and queries each result
//! consulted, and on a new snapshot invalidates only the results whose
//! dependencies actually changed.
//!
//! ```
//! use janus::cid::{Canonicalizer, ToolchainOpts};
//! use janus::decl::{DeclKind, Visibility};
//! use janus::ids::UnitId;
//! use janus::node::NodeKind;
//! use janus::query::{QueryEngine, QueryData, QueryKey};
//! use janus::scope::ScopeKind;
//! use janus::span::Span;
//! use janus::storage::SnapshotBuilder;
//! use janus::token::TokenKind;
//!
//! let mut builder = SnapshotBuilder::new("answer.janus");
//! let sp = Span::new(0, 1, 1, 1);
//! let name = builder.intern("answer");
//! let ty = builder.intern("i32");
//!
//! let name_tok = builder.add_token(TokenKind::Identifier, Some(name), sp);
//! let ty_tok = builder.add_token(TokenKind::Identifier, Some(ty), sp);
//! let name_node = builder.add_node(NodeKind::Identifier, name_tok, name_tok, &[]);
//! let ty_node = builder.add_node(NodeKind::TypePrimitive, ty_tok, ty_tok, &[]);
//! let body = builder.add_node(NodeKind::Block, name_tok, name_tok, &[]);
//! let func = builder.add_node(NodeKind::FuncDecl, name_tok, name_tok, &[name_node, ty_node, body]);
//! let scope = builder.add_scope(None, ScopeKind::Global);
//! builder
//!     .add_decl(func, name, scope, DeclKind::Function, Visibility::Public, None, false)
//!     .expect("first declaration of `answer` in this scope");
//!
//! let snapshot = builder.seal();
//! let canon = Canonicalizer::new(&snapshot, ToolchainOpts::default());
//! let engine = QueryEngine::new();
//!
//! let result = engine.run(&snapshot, &canon, QueryKey::TypeOf { unit: UnitId::new(0), node: func });
//! assert!(matches!(result.data, Ok(QueryData::TypeOf(_))));
//! ```

#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

pub mod accessor;
pub mod cid;
pub mod decl;
pub mod depgraph;
pub mod diagnostic;
pub mod diagnostics;
pub mod differ;
pub mod error;
pub mod ids;
pub mod node;
pub mod perf;
pub mod query;
pub mod scope;
pub mod span;
pub mod storage;
pub mod token;
pub mod types;
pub mod unit;

pub use error::{BuildError, Error};
pub use ids::{DeclId, NodeId, ScopeId, StringId, TokenId, TypeId, UnitId};
pub use query::{CancellationToken, QueryData, QueryEngine, QueryError, QueryKey};
pub use storage::{Snapshot, SnapshotBuilder};
