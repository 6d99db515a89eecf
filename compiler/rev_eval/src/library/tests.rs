use pretty_assertions::assert_eq;
use rev_ir::{ExprArena, SharedArena};

use super::arithmetic::MAX_RANGE_LEN;
use crate::arguments::Argument;
use crate::environment::Environment;
use crate::eval_mode::EvalMode;
use crate::interpreter::Interpreter;
use crate::runtime::Runtime;
use crate::types::TypeId;
use crate::{EvalErrorKind, EvalResult, SharedVariable, Value};

fn positional(values: Vec<Value>) -> Vec<Argument> {
    values
        .into_iter()
        .map(|value| Argument::positional(SharedVariable::anonymous(value)))
        .collect()
}

/// Call the registered function `name` in value mode.
fn call(name: &str, args: Vec<Value>) -> EvalResult<Value> {
    let runtime = Runtime::for_tests();
    let function = runtime.registry().functions().get(name).cloned().unwrap();
    let mut env = Environment::new();
    let mut interp = Interpreter::new(SharedArena::new(ExprArena::new()), &runtime, &mut env);
    interp
        .call_function(&function, positional(args), EvalMode::Value)?
        .value()
}

/// Call the method `name` on `receiver` in value mode.
fn method(receiver: Value, name: &str, args: Vec<Value>) -> EvalResult<Value> {
    let runtime = Runtime::for_tests();
    let function = runtime
        .registry()
        .methods()
        .lookup(receiver.type_id(), name, runtime.types())
        .cloned()
        .unwrap();
    let mut full = vec![Argument::labeled("self", SharedVariable::anonymous(receiver))];
    full.extend(positional(args));
    let mut env = Environment::new();
    let mut interp = Interpreter::new(SharedArena::new(ExprArena::new()), &runtime, &mut env);
    interp.call_function(&function, full, EvalMode::Value)?.value()
}

fn naturals(items: &[i64]) -> Value {
    Value::vector(TypeId::NATURAL, items.iter().copied().map(Value::Natural).collect())
}

#[test]
fn addition_picks_the_narrowest_overload() {
    assert_eq!(
        call("_add", vec![Value::Natural(2), Value::Natural(3)]).unwrap(),
        Value::Natural(5)
    );
    assert_eq!(
        call("_add", vec![Value::Natural(2), Value::Integer(-3)]).unwrap(),
        Value::Integer(-1)
    );
    assert_eq!(
        call("_add", vec![Value::Natural(2), Value::Real(0.5)]).unwrap(),
        Value::RealPos(2.5)
    );
    assert_eq!(
        call("_add", vec![Value::Natural(2), Value::Real(-0.5)]).unwrap(),
        Value::Real(1.5)
    );
    assert_eq!(
        call("_add", vec![Value::string("a"), Value::string("b")]).unwrap(),
        Value::string("ab")
    );
}

#[test]
fn integer_overflow_is_an_error() {
    let err = call("_add", vec![Value::Natural(i64::MAX), Value::Natural(1)]).unwrap_err();
    assert_eq!(
        err.kind,
        EvalErrorKind::IntegerOverflow {
            operation: "addition".into()
        }
    );
    let err = call("_uminus", vec![Value::Integer(i64::MIN)]).unwrap_err();
    assert!(matches!(err.kind, EvalErrorKind::IntegerOverflow { .. }));
}

#[test]
fn subtraction_and_division_widen() {
    assert_eq!(
        call("_sub", vec![Value::Natural(2), Value::Natural(5)]).unwrap(),
        Value::Integer(-3)
    );
    assert_eq!(
        call("_div", vec![Value::Natural(1), Value::Natural(2)]).unwrap(),
        Value::RealPos(0.5)
    );
    assert_eq!(call("_uminus", vec![Value::Natural(3)]).unwrap(), Value::Integer(-3));
}

#[test]
fn ranges_count_both_ways() {
    assert_eq!(
        call("_range", vec![Value::Natural(1), Value::Natural(3)]).unwrap(),
        naturals(&[1, 2, 3])
    );
    assert_eq!(
        call("_range", vec![Value::Natural(3), Value::Natural(1)]).unwrap(),
        naturals(&[3, 2, 1])
    );
    assert_eq!(
        call("_range", vec![Value::Integer(-1), Value::Natural(1)]).unwrap(),
        Value::vector(
            TypeId::INTEGER,
            vec![Value::Integer(-1), Value::Integer(0), Value::Integer(1)]
        )
    );
}

#[test]
fn oversized_range_is_an_error() {
    let err = call("_range", vec![Value::Natural(1), Value::Natural(4_000_000_000_000)]).unwrap_err();
    assert!(matches!(err.kind, EvalErrorKind::Custom { .. }));
    assert_eq!(
        err.message,
        format!("range 1:4000000000000 is longer than {MAX_RANGE_LEN} elements")
    );

    let err = call("_range", vec![Value::Integer(i64::MIN), Value::Natural(i64::MAX)]).unwrap_err();
    assert!(matches!(err.kind, EvalErrorKind::Custom { .. }));
}

#[test]
fn vectors_take_a_common_element_type() {
    assert_eq!(
        call("v", vec![Value::Natural(1), Value::Probability(0.5)]).unwrap(),
        Value::vector(TypeId::REAL_POS, vec![Value::RealPos(1.0), Value::RealPos(0.5)])
    );
    assert_eq!(
        call("v", vec![Value::Bool(true), Value::Natural(2)]).unwrap(),
        naturals(&[1, 2])
    );

    let mixed = call("v", vec![Value::Bool(true), Value::string("s")]).unwrap();
    assert_eq!(mixed.type_id(), TypeId::OBJECT_VECTOR);
    assert_eq!(
        mixed.as_vector().unwrap().as_slice(),
        &[Value::Bool(true), Value::string("s")]
    );
}

#[test]
fn sums_keep_the_element_type() {
    assert_eq!(call("sum", vec![naturals(&[1, 2, 3])]).unwrap(), Value::Natural(6));
    let reals = Value::vector(TypeId::REAL, vec![Value::Real(-1.0), Value::Real(0.5)]);
    assert_eq!(call("sum", vec![reals]).unwrap(), Value::Real(-0.5));
}

#[test]
fn math_functions() {
    assert_eq!(call("abs", vec![Value::Integer(-4)]).unwrap(), Value::Natural(4));
    assert_eq!(call("abs", vec![Value::Real(-1.5)]).unwrap(), Value::RealPos(1.5));
    assert_eq!(call("exp", vec![Value::Real(0.0)]).unwrap(), Value::RealPos(1.0));
    assert_eq!(call("ln", vec![Value::RealPos(1.0)]).unwrap(), Value::Real(0.0));
    assert_eq!(
        call("type", vec![Value::Probability(0.5)]).unwrap(),
        Value::string("Probability")
    );
}

#[test]
fn container_methods() {
    let items = naturals(&[4, 5, 6]);
    assert_eq!(method(items.clone(), "size", vec![]).unwrap(), Value::Natural(3));
    assert_eq!(
        method(items.clone(), "[]", vec![Value::Natural(2)]).unwrap(),
        Value::Natural(5)
    );

    let err = method(items, "[]", vec![Value::Natural(4)]).unwrap_err();
    assert_eq!(err.message, "index 4 for <value> is out of range (size 3)");
}

#[test]
fn object_methods() {
    assert_eq!(
        method(Value::RealPos(2.0), "type", vec![]).unwrap(),
        Value::string("RealPos")
    );

    let err = method(Value::Real(1.0), "isClamped", vec![]).unwrap_err();
    assert_eq!(
        err.message,
        "argument 'self' of isClamped must be a stochastic variable, found a constant one"
    );
}
