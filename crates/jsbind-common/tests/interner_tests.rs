use super::*;

#[test]
fn test_intern_deduplicates() {
    let mut interner = Interner::new();
    let a = interner.intern("field");
    let b = interner.intern_owned("field".to_string());
    assert_eq!(a, b);
    assert_eq!(interner.resolve(a), "field");
}

#[test]
fn test_none_atom_is_empty_string() {
    let interner = Interner::new();
    assert!(Atom::NONE.is_none());
    assert_eq!(interner.resolve(Atom::NONE), "");
    assert!(!interner.is_empty());
}

#[test]
fn test_common_names_are_preinterned() {
    let interner = Interner::new();
    assert!(interner.get("prototype").is_some());
    assert!(interner.get("Object").is_some());
    assert!(interner.get("definitely-not-there").is_none());
}

#[test]
fn test_dotted_round_trip() {
    let mut interner = Interner::new();
    let compound = interner.intern_dotted("a.b.Foo");
    assert_eq!(compound.len(), 3);
    assert_eq!(interner.join(&compound, '.'), "a.b.Foo");
    assert!(interner.intern_dotted("").is_empty());
}

#[test]
fn test_out_of_range_atom_resolves_empty() {
    let interner = Interner::new();
    assert_eq!(interner.resolve(Atom(u32::MAX)), "");
    assert!(interner.try_resolve(Atom(u32::MAX)).is_none());
}
