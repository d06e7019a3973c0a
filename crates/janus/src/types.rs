//! Minimal concrete type vocabulary used by the query engine.
//!
//! Full semantic resolution and type inference are out of scope (§1) —
//! their results may be stored as annotations keyed by CID, but their
//! algorithms live in an external collaborator. The one place this core
//! *does* need concrete types is Dispatch (§4.5 step 3), which pins an
//! exact implicit-conversion lattice; `PrimitiveType` exists only to make
//! that lattice checkable.

use std::collections::{HashSet, VecDeque};

use crate::ids::{DeclId, NodeId, TypeId};

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum PrimitiveType {
    I8,
    I16,
    I32,
    I64,
    F32,
    F64,
    Bool,
    Str,
    Unit,
}

impl PrimitiveType {
    pub fn from_name(name: &str) -> Option<Self> {
        Some(match name {
            "i8" => PrimitiveType::I8,
            "i16" => PrimitiveType::I16,
            "i32" => PrimitiveType::I32,
            "i64" => PrimitiveType::I64,
            "f32" => PrimitiveType::F32,
            "f64" => PrimitiveType::F64,
            "bool" => PrimitiveType::Bool,
            "str" => PrimitiveType::Str,
            "unit" | "()" => PrimitiveType::Unit,
            _ => return None,
        })
    }
}

/// Fixed implicit-conversion lattice (§4.5 step 3): signed widening
/// `i8 ⊆ i16 ⊆ i32 ⊆ i64`; `i32 ⊆ f32`; `i32/i64 ⊆ f64`; `f32 ⊆ f64`. No
/// other implicit conversions exist.
const CONVERSION_EDGES: &[(PrimitiveType, PrimitiveType)] = &[
    (PrimitiveType::I8, PrimitiveType::I16),
    (PrimitiveType::I16, PrimitiveType::I32),
    (PrimitiveType::I32, PrimitiveType::I64),
    (PrimitiveType::I32, PrimitiveType::F32),
    (PrimitiveType::I32, PrimitiveType::F64),
    (PrimitiveType::I64, PrimitiveType::F64),
    (PrimitiveType::F32, PrimitiveType::F64),
];

/// Shortest number of implicit-conversion hops from `from` to `to`, or
/// `None` if no chain of the fixed lattice edges connects them. `Some(0)`
/// means an exact match. Total and deterministic, as required.
pub fn conversion_distance(from: PrimitiveType, to: PrimitiveType) -> Option<u32> {
    if from == to {
        return Some(0);
    }

    let mut visited = HashSet::new();
    let mut queue = VecDeque::new();
    visited.insert(from);
    queue.push_back((from, 0u32));

    while let Some((cur, dist)) = queue.pop_front() {
        for &(a, b) in CONVERSION_EDGES {
            if a == cur && visited.insert(b) {
                if b == to {
                    return Some(dist + 1);
                }
                queue.push_back((b, dist + 1));
            }
        }
    }
    None
}

/// The `TypeOf` query's result: a resolved type handle plus optional
/// inferred-type metadata. Since inference itself is external, the
/// metadata here is limited to what the core can determine structurally —
/// whether the type came from an explicit annotation or was left for the
/// (external) inferencer to fill in.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct TypeHandle {
    pub node: TypeId,
    pub primitive: Option<PrimitiveType>,
}

impl TypeHandle {
    pub fn new(node: TypeId, primitive: Option<PrimitiveType>) -> Self {
        Self { node, primitive }
    }
}

/// Opaque handle for `IROf`'s result. IR generation itself is an external
/// collaborator; the core only needs something stable to hand back, and
/// the function body's own `NodeId` already is that (the external IR
/// generator is expected to key its own tables off of it).
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct IrHandle(pub NodeId);

/// Closed set of effect tags `EffectsOf` can report. Effect inference
/// itself is out of scope; this enum exists so the query has a concrete,
/// hashable result shape to memoize.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum EffectTag {
    Io,
    Alloc,
    Panics,
    Pure,
}

/// The `Dispatch` query's result.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct DispatchResult {
    pub decl: DeclId,
    pub specificity: i64,
}
