#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

//! Shared primitives for Janus: string interning and dense-id newtypes.
//!
//! Every other Janus crate builds its own ids (`NodeId`, `TokenId`, ...) as
//! newtypes over a raw `u32`; this crate only owns the one primitive that is
//! genuinely shared across the whole system — the string interner, since a
//! single snapshot's tables and its CIDs must agree on what a `StringId`
//! means.

mod interner;
#[cfg(test)]
mod interner_tests;

pub use interner::{Interner, StringId};
