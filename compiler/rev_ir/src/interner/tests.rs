use super::*;

#[test]
fn test_intern_and_lookup() {
    let interner = StringInterner::new();

    let mu = interner.intern("mu");
    let sigma = interner.intern("sigma");
    let mu2 = interner.intern("mu");

    assert_eq!(mu, mu2);
    assert_ne!(mu, sigma);
    assert_eq!(interner.lookup(mu), "mu");
    assert_eq!(interner.lookup(sigma), "sigma");
}

#[test]
fn test_empty_string() {
    let interner = StringInterner::new();
    assert_eq!(interner.intern(""), Name::EMPTY);
    assert_eq!(interner.lookup(Name::EMPTY), "");
}

#[test]
fn test_builtins_pre_interned() {
    let interner = StringInterner::new();
    let before = interner.len();

    let add = interner.intern("_add");
    let index = interner.intern("[]");

    assert_eq!(interner.len(), before);
    assert_eq!(interner.lookup(add), "_add");
    assert_eq!(interner.lookup(index), "[]");
}

#[test]
fn test_element_names_intern_like_identifiers() {
    let interner = StringInterner::new();
    let element = interner.intern("x[12]");
    assert_eq!(interner.get("x[12]"), Some(element));
    assert_eq!(interner.get("x[13]"), None);
}

#[test]
fn test_foreign_name_looks_up_empty() {
    let interner = StringInterner::new();
    assert_eq!(interner.lookup(Name::from_raw(u32::MAX)), "");
}

#[test]
fn test_shared_interner() {
    let interner = SharedInterner::new();
    let interner2 = interner.clone();

    let name1 = interner.intern("shared");
    let name2 = interner2.intern("shared");

    assert_eq!(name1, name2);
}
