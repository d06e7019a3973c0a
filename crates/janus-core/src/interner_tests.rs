use crate::{Interner, StringId};

#[test]
fn intern_deduplicates() {
    let mut interner = Interner::new();

    let a = interner.intern("foo");
    let b = interner.intern("foo");
    let c = interner.intern("bar");

    assert_eq!(a, b);
    assert_ne!(a, c);
    assert_eq!(interner.len(), 2);
}

#[test]
fn resolve_roundtrip() {
    let mut interner = Interner::new();

    let id = interner.intern("hello");
    assert_eq!(interner.resolve(id), "hello");
}

#[test]
fn intern_owned_avoids_clone_on_hit() {
    let mut interner = Interner::new();

    let a = interner.intern("test");
    let b = interner.intern_owned("test".to_string());

    assert_eq!(a, b);
    assert_eq!(interner.len(), 1);
}

#[test]
fn ids_are_copy() {
    let mut interner = Interner::new();
    let id = interner.intern("x");

    let copy = id;
    assert_eq!(id, copy);
}

#[test]
fn id_ordering_is_insertion_order() {
    let mut interner = Interner::new();

    let z = interner.intern("z");
    let a = interner.intern("a");

    // z was inserted first, so z < a by insertion order
    assert!(z < a);
}

#[test]
fn iter_yields_all_strings() {
    let mut interner = Interner::new();
    let a = interner.intern("alpha");
    let b = interner.intern("beta");

    let items: Vec<_> = interner.iter().collect();
    assert_eq!(items, vec![(a, "alpha"), (b, "beta")]);
}

#[test]
fn id_from_raw_roundtrip() {
    let id = StringId::from_raw(42);
    assert_eq!(id.as_u32(), 42);
}

#[test]
fn try_resolve_out_of_range_is_none() {
    let interner = Interner::new();
    assert_eq!(interner.try_resolve(StringId::from_raw(0)), None);
}
