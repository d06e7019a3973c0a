//! String interning for efficient string deduplication and comparison.
//!
//! Converts heap-allocated strings into cheap integer handles (`StringId`).
//! Comparing two ids is O(1) integer comparison. Insertion order is never
//! semantic — callers must not rely on it for anything but reproducing the
//! interner's own iteration order.

use std::collections::HashMap;

/// A lightweight handle to an interned string.
///
/// Equality is O(1) integer equality: `intern(x) == intern(y)` iff `x` and
/// `y` are byte-equal. Ordering follows insertion order and is exposed only
/// for use as a map/set key, not as a proxy for lexicographic order.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct StringId(u32);

impl StringId {
    /// Raw index for serialization/debugging.
    #[inline]
    pub fn as_u32(self) -> u32 {
        self.0
    }

    /// Construct a `StringId` from a raw index. Use only when reconstructing
    /// ids produced by this same interner (e.g. after deserialization).
    #[inline]
    pub fn from_raw(index: u32) -> Self {
        Self(index)
    }
}

impl PartialOrd for StringId {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for StringId {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.0.cmp(&other.0)
    }
}

/// String interner. Deduplicates strings and returns cheap `StringId` handles.
///
/// No string is ever freed while the interner is live; the only failure mode
/// is allocation failure, which in safe Rust surfaces as the allocator's own
/// abort rather than a recoverable value.
#[derive(Debug, Clone, Default)]
pub struct Interner {
    map: HashMap<String, StringId>,
    strings: Vec<String>,
}

impl Interner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Intern a string, returning its id. If the string was already
    /// interned, returns the existing id without copying.
    pub fn intern(&mut self, s: &str) -> StringId {
        if let Some(&id) = self.map.get(s) {
            return id;
        }

        let id = StringId(self.strings.len() as u32);
        self.strings.push(s.to_owned());
        self.map.insert(s.to_owned(), id);
        id
    }

    /// Intern an owned string, avoiding a clone when it is not already present.
    pub fn intern_owned(&mut self, s: String) -> StringId {
        if let Some(&id) = self.map.get(&s) {
            return id;
        }

        let id = StringId(self.strings.len() as u32);
        self.strings.push(s.clone());
        self.map.insert(s, id);
        id
    }

    /// Resolve an id back to its string.
    ///
    /// # Panics
    /// Panics if the id was not produced by this interner — this indicates a
    /// bug in the caller, not a recoverable runtime condition.
    #[inline]
    pub fn resolve(&self, id: StringId) -> &str {
        &self.strings[id.0 as usize]
    }

    /// Try to resolve an id, returning `None` if it is out of range.
    #[inline]
    pub fn try_resolve(&self, id: StringId) -> Option<&str> {
        self.strings.get(id.0 as usize).map(|s| s.as_str())
    }

    /// Number of interned strings.
    #[inline]
    pub fn len(&self) -> usize {
        self.strings.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.strings.is_empty()
    }

    /// Iterate over all interned strings with their ids, in insertion order.
    #[inline]
    pub fn iter(&self) -> impl Iterator<Item = (StringId, &str)> {
        self.strings
            .iter()
            .enumerate()
            .map(|(i, s)| (StringId(i as u32), s.as_str()))
    }
}
