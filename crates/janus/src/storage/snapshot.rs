//! Sealed, read-only snapshots.

use janus_core::Interner;

use crate::ids::UnitId;
use crate::unit::CompilationUnit;

/// An immutable ASTDB instance. Owns its interner and all units
/// exclusively; clients borrow read-only views whose lifetime is tied to
/// `&self`. Once built, nothing about a `Snapshot` ever changes — a new
/// edit produces a new `Snapshot`, never a mutation of this one.
#[derive(Debug)]
pub struct Snapshot {
    interner: Interner,
    units: Vec<CompilationUnit>,
}

impl Snapshot {
    pub(crate) fn new(interner: Interner, units: Vec<CompilationUnit>) -> Self {
        Self { interner, units }
    }

    pub fn interner(&self) -> &Interner {
        &self.interner
    }

    pub fn unit(&self, id: UnitId) -> Option<&CompilationUnit> {
        self.units.get(id.index())
    }

    pub fn units(&self) -> impl Iterator<Item = (UnitId, &CompilationUnit)> {
        self.units
            .iter()
            .enumerate()
            .map(|(i, u)| (UnitId::new(i as u32), u))
    }

    pub fn unit_count(&self) -> usize {
        self.units.len()
    }
}
