use pretty_assertions::assert_eq;

use super::*;
use crate::arguments::{ArgumentRule, BoundArguments};
use crate::errors::EvalErrorKind;
use crate::function::{BuiltinFunction, CallContext};
use crate::Value;

fn constant(_: &BoundArguments, _: &mut CallContext<'_>) -> EvalResult<Value> {
    Ok(Value::Natural(1))
}

fn function(name: &'static str, rules: Vec<ArgumentRule>) -> FunctionRef {
    BuiltinFunction::new(name, rules, TypeId::NATURAL, constant).into_ref()
}

#[test]
fn functions_keep_overloads_in_order() {
    let mut builder = RegistryBuilder::new();
    builder
        .add_function(function("f", vec![ArgumentRule::new("x", TypeId::NATURAL)]))
        .unwrap();
    builder
        .add_function(function("f", vec![ArgumentRule::new("x", TypeId::REAL)]))
        .unwrap();
    let registry = builder.build();

    let f = registry.functions().get("f").unwrap();
    assert_eq!(f.overloads().len(), 2);
    assert_eq!(
        f.overloads()[0].rules().get(0).unwrap().type_id(),
        TypeId::NATURAL
    );
    assert_eq!(f.overloads()[1].rules().get(0).unwrap().type_id(), TypeId::REAL);
}

#[test]
fn duplicate_formals_are_rejected() {
    let mut builder = RegistryBuilder::new();
    builder
        .add_function(function("f", vec![ArgumentRule::new("x", TypeId::REAL)]))
        .unwrap();
    let err = builder
        .add_function(function("f", vec![ArgumentRule::new("x", TypeId::REAL)]))
        .unwrap_err();
    assert!(err.message.contains("already has an overload"));
}

#[test]
fn methods_require_self() {
    let mut builder = RegistryBuilder::new();
    let err = builder
        .add_method(
            TypeId::OBJECT,
            function("size", vec![ArgumentRule::new("x", TypeId::OBJECT)]),
        )
        .unwrap_err();
    assert!(matches!(err.kind, EvalErrorKind::Custom { .. }));
}

#[test]
fn methods_are_inherited() {
    let mut builder = RegistryBuilder::new();
    builder
        .add_method(
            TypeId::CONTAINER,
            function("size", vec![ArgumentRule::new("self", TypeId::CONTAINER)]),
        )
        .unwrap();
    let registry = builder.build();
    let types = registry.types();

    assert!(registry
        .methods()
        .lookup(TypeId::PROBABILITY_VECTOR, "size", types)
        .is_some());
    assert!(registry.methods().lookup(TypeId::REAL, "size", types).is_none());
    assert_eq!(
        registry.methods().names_for(TypeId::REAL_VECTOR, types),
        vec!["size"]
    );
}

#[test]
fn plugin_types_are_registered() {
    struct Dists;

    impl Plugin for Dists {
        fn name(&self) -> &'static str {
            "dists"
        }

        fn register(&self, builder: &mut RegistryBuilder) -> EvalResult<()> {
            builder.register_type("Dist_test", TypeId::DISTRIBUTION)?;
            Ok(())
        }
    }

    let mut builder = RegistryBuilder::new();
    builder.install(&Dists).unwrap();
    let registry = builder.build();
    let id = registry.types().lookup("Dist_test").unwrap();
    assert!(registry.types().is_derived_from(id, TypeId::DISTRIBUTION));
}

#[test]
fn function_names_are_sorted() {
    let mut builder = RegistryBuilder::new();
    builder.add_function(function("b", vec![])).unwrap();
    builder.add_function(function("a", vec![])).unwrap();
    let registry = builder.build();
    assert_eq!(registry.functions().names(), vec!["a", "b"]);
    assert!(registry.functions().contains("a"));
    assert!(!registry.functions().contains("c"));
}
