use super::*;
use pretty_assertions::assert_eq;

#[test]
fn test_builtin_ids_match_names() {
    let types = TypeTable::new();
    assert_eq!(types.name(TypeId::OBJECT), "RevObject");
    assert_eq!(types.name(TypeId::REAL_POS), "RealPos");
    assert_eq!(types.name(TypeId::NATURAL_VECTOR), "Natural[]");
    assert_eq!(types.name(TypeId::OBJECT_VECTOR), "RevObject[]");
    assert_eq!(types.lookup("Probability"), Some(TypeId::PROBABILITY));
    assert_eq!(types.lookup("Real[]"), Some(TypeId::REAL_VECTOR));
    assert_eq!(types.lookup("Tree"), None);
    assert_eq!(types.len() as u32, TypeId::FIRST_PLUGIN);
}

#[test]
fn test_derivation_is_reflexive_and_transitive() {
    let types = TypeTable::new();
    assert!(types.is_derived_from(TypeId::REAL, TypeId::REAL));
    assert!(types.is_derived_from(TypeId::PROBABILITY, TypeId::REAL_POS));
    assert!(types.is_derived_from(TypeId::PROBABILITY, TypeId::REAL));
    assert!(types.is_derived_from(TypeId::NATURAL, TypeId::OBJECT));
    assert!(!types.is_derived_from(TypeId::REAL, TypeId::REAL_POS));
    assert!(!types.is_derived_from(TypeId::NATURAL, TypeId::REAL));
    assert!(types.is_derived_from(TypeId::NATURAL_VECTOR, TypeId::CONTAINER));
}

#[test]
fn test_vector_mapping() {
    assert_eq!(TypeId::REAL.vector_of(), TypeId::REAL_VECTOR);
    assert_eq!(TypeId::REAL_VECTOR.vector_of(), TypeId::OBJECT_VECTOR);
    assert_eq!(TypeId::DISTRIBUTION.vector_of(), TypeId::OBJECT_VECTOR);
    assert_eq!(TypeId::NATURAL_VECTOR.element_of(), Some(TypeId::NATURAL));
    assert_eq!(TypeId::REAL.element_of(), None);
    assert!(TypeId::STRING_VECTOR.is_vector());
}

#[test]
fn test_register_is_idempotent() {
    let mut types = TypeTable::new();
    let tree = types.register("Tree", TypeId::OBJECT).unwrap();
    assert_eq!(types.register("Tree", TypeId::CONTAINER).unwrap(), tree);
    assert_eq!(types.parent(tree), Some(TypeId::OBJECT));
    assert_eq!(tree.raw(), TypeId::FIRST_PLUGIN);
}

#[test]
fn test_common_ancestor() {
    let types = TypeTable::new();
    assert_eq!(
        types.common_ancestor(TypeId::PROBABILITY, TypeId::REAL_POS),
        TypeId::REAL_POS
    );
    assert_eq!(
        types.common_ancestor(TypeId::NATURAL, TypeId::INTEGER),
        TypeId::INTEGER
    );
    assert_eq!(
        types.common_ancestor(TypeId::NATURAL, TypeId::REAL),
        TypeId::OBJECT
    );
}

#[test]
fn test_find_conversion_through_ancestor() {
    let types = TypeTable::new();

    let natural_to_real = types.find_conversion(TypeId::NATURAL, TypeId::REAL, false);
    assert_eq!(natural_to_real.map(|c| c.to), Some(TypeId::REAL_POS));

    let integer_to_real = types.find_conversion(TypeId::INTEGER, TypeId::REAL, false);
    assert_eq!(integer_to_real.map(|c| c.to), Some(TypeId::REAL));

    assert!(types
        .find_conversion(TypeId::STRING, TypeId::REAL, true)
        .is_none());
}

#[test]
fn test_value_dependent_conversions_need_permission() {
    let types = TypeTable::new();
    assert!(types
        .find_conversion(TypeId::REAL, TypeId::REAL_POS, false)
        .is_none());

    let conversion = types.find_conversion(TypeId::REAL, TypeId::REAL_POS, true);
    let Some(conversion) = conversion else {
        panic!("Real -> RealPos should be registered");
    };
    assert_eq!(conversion.kind, ConversionKind::ValueDependent);
    assert_eq!(conversion.apply(&Value::Real(2.5)), Some(Value::RealPos(2.5)));
    assert_eq!(conversion.apply(&Value::Real(-2.5)), None);
}

#[test]
fn test_vector_conversion_is_element_wise() {
    let types = TypeTable::new();
    let Some(conversion) = types.find_conversion(TypeId::INTEGER_VECTOR, TypeId::REAL_VECTOR, false)
    else {
        panic!("Integer[] -> Real[] should be registered");
    };
    let ints = Value::vector(TypeId::INTEGER, vec![Value::Integer(-1), Value::Natural(2)]);
    assert_eq!(
        conversion.apply(&ints),
        Some(Value::vector(
            TypeId::REAL,
            vec![Value::Real(-1.0), Value::Real(2.0)]
        ))
    );
}

#[test]
fn test_common_element_type() {
    let types = TypeTable::new();
    assert_eq!(
        types.common_element_type([TypeId::NATURAL, TypeId::NATURAL]),
        TypeId::NATURAL
    );
    assert_eq!(
        types.common_element_type([TypeId::NATURAL, TypeId::INTEGER]),
        TypeId::INTEGER
    );
    assert_eq!(
        types.common_element_type([TypeId::NATURAL, TypeId::PROBABILITY]),
        TypeId::REAL_POS
    );
    assert_eq!(
        types.common_element_type([TypeId::INTEGER, TypeId::PROBABILITY]),
        TypeId::REAL
    );
    assert_eq!(
        types.common_element_type([TypeId::BOOL, TypeId::BOOL]),
        TypeId::BOOL
    );
    assert_eq!(
        types.common_element_type([TypeId::STRING, TypeId::REAL]),
        TypeId::OBJECT
    );
    assert_eq!(types.common_element_type([]), TypeId::OBJECT);
}
