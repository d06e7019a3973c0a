//! The storage engine: the builder/snapshot split that gives a unit's
//! columnar tables their construction-then-seal immutability.

mod builder;
mod snapshot;

#[cfg(test)]
mod tests;

pub use builder::{SnapshotBuilder, UnitBuilder};
pub use snapshot::Snapshot;
