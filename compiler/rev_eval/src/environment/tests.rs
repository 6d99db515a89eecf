use pretty_assertions::assert_eq;
use rev_ir::SharedInterner;

use super::*;
use crate::registry::RegistryBuilder;

fn constant(name: &str, value: Value) -> SharedVariable {
    SharedVariable::new(name, value)
}

#[test]
fn scope_define_lookup() {
    let interner = SharedInterner::default();
    let x = interner.intern("x");

    let mut scope = Scope::new();
    scope.define(x, constant("x", Value::Natural(42)));
    assert_eq!(scope.lookup(x).unwrap().value().unwrap(), Value::Natural(42));
}

#[test]
fn inner_binding_shadows_outer() {
    let interner = SharedInterner::default();
    let x = interner.intern("x");

    let mut env = Environment::new();
    env.define_local(x, constant("x", Value::Natural(1)));
    env.push_scope();
    env.define_local(x, constant("x", Value::Natural(2)));
    assert_eq!(env.lookup_variable(x).unwrap().value().unwrap(), Value::Natural(2));

    env.pop_scope();
    assert_eq!(env.lookup_variable(x).unwrap().value().unwrap(), Value::Natural(1));
}

#[test]
fn pop_never_removes_global_scope() {
    let mut env = Environment::new();
    env.pop_scope();
    env.pop_scope();
    assert_eq!(env.depth(), 1);
}

#[test]
fn declare_returns_existing_variable() {
    let interner = SharedInterner::default();
    let a = interner.intern("a");

    let mut env = Environment::new();
    let first = env.declare_variable(a, "a");
    env.push_scope();
    let second = env.declare_variable(a, "a");
    assert!(first.ptr_eq(&second));
    assert!(first.content().is_null());
}

#[test]
fn declare_creates_in_innermost_scope() {
    let interner = SharedInterner::default();
    let a = interner.intern("a");

    let mut env = Environment::new();
    env.push_scope();
    env.declare_variable(a, "a");
    assert!(env.current_scope().borrow().contains_local(a));
    env.pop_scope();
    assert!(env.lookup_variable(a).is_none());
}

#[test]
fn remove_drops_innermost_binding() {
    let interner = SharedInterner::default();
    let x = interner.intern("x");

    let mut env = Environment::new();
    env.define_local(x, constant("x", Value::Natural(1)));
    env.push_scope();
    env.define_local(x, constant("x", Value::Natural(2)));

    let removed = env.remove_variable(x).unwrap();
    assert_eq!(removed.value().unwrap(), Value::Natural(2));
    assert_eq!(env.lookup_variable(x).unwrap().value().unwrap(), Value::Natural(1));
}

#[test]
fn visible_variables_prefer_innermost_and_skip_hidden() {
    let interner = SharedInterner::default();
    let a = interner.intern("a");
    let b = interner.intern("b");
    let h = interner.intern("h");

    let mut env = Environment::new();
    env.define_local(b, constant("b", Value::Natural(1)));
    env.define_local(a, constant("a", Value::Natural(1)));
    env.define_local(h, SharedVariable::hidden("h", Value::Null));
    env.push_scope();
    env.define_local(a, constant("a", Value::Natural(2)));

    let visible = env.visible_variables();
    let names: Vec<String> = visible.iter().map(|(_, var)| var.name()).collect();
    assert_eq!(names, vec!["a".to_string(), "b".to_string()]);
    assert_eq!(visible[0].1.value().unwrap(), Value::Natural(2));
}

#[test]
fn functions_resolve_through_registry() {
    let interner = SharedInterner::default();
    let f = interner.intern("f");
    let registry = RegistryBuilder::new().build();

    let env = Environment::new();
    assert!(env.lookup_function(f, "f", &registry).is_none());
}

#[test]
fn function_valued_variables_are_callable() {
    let interner = SharedInterner::default();
    let f = interner.intern("f");
    let registry = RegistryBuilder::new().build();

    let mut env = Environment::new();
    let function = FunctionValue::new("f", Vec::new());
    env.define_local(f, constant("f", Value::Function(function.clone())));
    let found = env.lookup_function(f, "f", &registry).unwrap();
    assert!(found.ptr_eq(&function));
}

#[test]
fn from_scope_sees_defining_bindings() {
    let interner = SharedInterner::default();
    let x = interner.intern("x");

    let mut outer = Environment::new();
    outer.define_local(x, constant("x", Value::Natural(7)));

    let mut frame = Environment::from_scope(outer.current_scope());
    frame.push_scope();
    assert_eq!(frame.lookup_variable(x).unwrap().value().unwrap(), Value::Natural(7));
}

#[test]
fn clear_drops_all_bindings() {
    let interner = SharedInterner::default();
    let x = interner.intern("x");

    let mut env = Environment::new();
    env.define_local(x, constant("x", Value::Natural(1)));
    env.push_scope();
    env.define_local(x, constant("x", Value::Natural(2)));
    env.clear();
    assert!(env.lookup_variable(x).is_none());
}

#[test]
fn local_scope_clones_share_state() {
    let scope = LocalScope::new(Scope::new());
    let other = scope.clone();
    assert!(scope.ptr_eq(&other));
}
