//! Dense integer ids indexing into a [`Snapshot`](crate::storage::Snapshot)'s
//! column arrays. Every id here is a `#[repr(transparent)]` newtype over
//! `u32` — never a pointer — so that nothing outside [`crate::storage`] can
//! smuggle a raw array index past the type system.

macro_rules! dense_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Debug)]
        #[repr(transparent)]
        pub struct $name(u32);

        impl $name {
            #[inline]
            pub fn new(index: u32) -> Self {
                Self(index)
            }

            #[inline]
            pub fn index(self) -> usize {
                self.0 as usize
            }

            #[inline]
            pub fn as_u32(self) -> u32 {
                self.0
            }
        }
    };
}

dense_id!(
    /// Index into a unit's token array.
    TokenId
);
dense_id!(
    /// Index into a unit's node array.
    NodeId
);

impl NodeId {
    /// Sentinel used in a handful of fixed-arity child layouts (see
    /// [`crate::accessor`]) to mark an optional child slot as absent. Never
    /// a valid index into any unit's node array in practice.
    pub const NONE: NodeId = NodeId(u32::MAX);

    #[inline]
    pub fn is_none(self) -> bool {
        self == NodeId::NONE
    }
}
dense_id!(
    /// Index into the shared `edges` array. A node's children are the
    /// contiguous slice `edges[child_lo.index()..child_hi.index()]`.
    EdgeIndex
);
dense_id!(
    /// Index into a unit's scope array.
    ScopeId
);
dense_id!(
    /// Index into a unit's decl array.
    DeclId
);
dense_id!(
    /// Index into a unit's ref array.
    RefId
);
dense_id!(
    /// Index of a [`CompilationUnit`](crate::unit::CompilationUnit) within a
    /// [`Snapshot`](crate::storage::Snapshot).
    UnitId
);

pub use janus_core::StringId;

/// A declared or resolved type is always rooted at a type syntax node
/// (`NodeKind::TypePrimitive` / `TypePath` / `TypeCompound`); `TypeId` is
/// just that node's id under a name that matches the data model's
/// vocabulary.
pub type TypeId = NodeId;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_round_trip_through_raw_index() {
        let id = NodeId::new(7);
        assert_eq!(id.index(), 7);
        assert_eq!(id.as_u32(), 7);
    }

    #[test]
    fn distinct_id_kinds_do_not_unify() {
        // This is a compile-time property: NodeId and TokenId are distinct
        // types, so `fn f(_: NodeId)` rejects a `TokenId` argument. We can
        // only assert the runtime half here (two ids with the same raw
        // index still compare unequal when wrapped in different types,
        // which the type system already prevents us from doing directly).
        let node = NodeId::new(3);
        let token = TokenId::new(3);
        assert_eq!(node.as_u32(), token.as_u32());
    }
}
