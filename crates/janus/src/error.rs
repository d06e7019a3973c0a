//! Crate-level error taxonomy (§7). Each subsystem boundary gets its own
//! `thiserror` enum rather than one monolithic type; this module holds the
//! construction-time kind plus a wrapper for callers that want a single
//! error type across subsystems. Query-engine failures live in
//! [`crate::query::QueryError`].

use thiserror::Error;

use crate::decl::DeclKind;
use crate::ids::{ScopeId, StringId};
use crate::query::QueryError;

/// Failures that can occur while a [`crate::storage::UnitBuilder`] is still
/// under construction. Allocation failure is not modeled as a value here —
/// in safe Rust it surfaces as the allocator's own abort, matching how `Vec`
/// growth is treated throughout this crate.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BuildError {
    #[error("duplicate declaration of name {name:?} (kind {kind:?}) in scope {scope:?}")]
    DuplicateDeclaration {
        name: StringId,
        scope: ScopeId,
        kind: DeclKind,
    },
}

/// A single crate-level error type for callers that don't want to match on
/// per-subsystem enums.
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Build(#[from] BuildError),
    #[error(transparent)]
    Query(#[from] QueryError),
}
