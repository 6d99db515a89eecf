use pretty_assertions::assert_eq;
use rev_ir::{AssignOp, BinaryOp, ParamMode};

use super::{exec, exec_err, session, value, Script};
use crate::print_handler::buffer_handler;
use crate::{EvalErrorKind, Session, Value};

#[test]
fn user_function_with_declared_return_type() {
    let mut session = session();
    exec(&mut session, |s| {
        let (x1, x2) = (s.var("x"), s.var("x"));
        let square = s.binary(BinaryOp::Mul, x1, x2);
        s.function("sq", Some("Real"), &[("Real", "x", ParamMode::Value, None)], vec![square]);
        let three = s.real(3.0);
        let call = s.call("sq", &[three]);
        s.assign("y", AssignOp::Constant, call);
    });
    assert_eq!(value(&session, "y"), Value::RealPos(9.0));
}

#[test]
fn defaults_fill_missing_arguments() {
    let mut session = session();
    exec(&mut session, |s| {
        let two = s.int(2);
        let n = s.var("n");
        let one = s.int(1);
        let body = s.binary(BinaryOp::Add, n, one);
        s.function(
            "next",
            None,
            &[("Natural", "n", ParamMode::Value, Some(two))],
            vec![body],
        );
        let defaulted = s.call("next", &[]);
        s.assign("a", AssignOp::Constant, defaulted);
        let ten = s.int(10);
        let labeled = s.call_labeled("next", &[("n", ten)]);
        s.assign("b", AssignOp::Constant, labeled);
    });
    assert_eq!(value(&session, "a"), Value::Natural(3));
    assert_eq!(value(&session, "b"), Value::Natural(11));
}

#[test]
fn parameters_do_not_leak_into_the_caller() {
    let mut session = session();
    exec(&mut session, |s| {
        let x = s.var("x");
        s.function("id", None, &[("Real", "x", ParamMode::Value, None)], vec![x]);
        let half = s.real(0.5);
        let call = s.call("id", &[half]);
        s.assign("y", AssignOp::Constant, call);
    });
    assert_eq!(value(&session, "y"), Value::Probability(0.5));
    assert!(session.variable("x").is_none());
}

#[test]
fn redefinition_with_same_formals_replaces_the_overload() {
    let mut session = session();
    exec(&mut session, |s| {
        let one = s.int(1);
        s.function("f", None, &[("Natural", "n", ParamMode::Value, None)], vec![one]);
        let two = s.int(2);
        s.function("f", None, &[("Natural", "n", ParamMode::Value, None)], vec![two]);
        let zero = s.int(0);
        let call = s.call("f", &[zero]);
        s.assign("r", AssignOp::Constant, call);
    });

    assert_eq!(value(&session, "r"), Value::Natural(2));
    let f = value(&session, "f");
    assert_eq!(f.as_function().unwrap().overloads().len(), 1);
}

#[test]
fn overloads_are_tried_in_definition_order() {
    let mut session = session();
    exec(&mut session, |s| {
        let label = s.string("real");
        s.function("kind", None, &[("Real", "x", ParamMode::Value, None)], vec![label]);
        let label = s.string("natural");
        s.function("kind", None, &[("Natural", "x", ParamMode::Value, None)], vec![label]);
        let three = s.int(3);
        let call = s.call("kind", &[three]);
        s.assign("k", AssignOp::Constant, call);
    });
    // Natural also matches the earlier Real overload through a conversion.
    assert_eq!(value(&session, "k"), Value::string("real"));
}

#[test]
fn runaway_recursion_hits_the_depth_limit() {
    let mut session = Session::builder()
        .print_handler(buffer_handler())
        .max_call_depth(Some(16))
        .build()
        .unwrap();
    let err = exec_err(&mut session, |s| {
        let n = s.var("n");
        let recurse = s.call("loop", &[n]);
        s.function("loop", None, &[("Natural", "n", ParamMode::Value, None)], vec![recurse]);
        let zero = s.int(0);
        let call = s.call("loop", &[zero]);
        s.push(call);
    });

    assert_eq!(err.kind, EvalErrorKind::RecursionLimitExceeded { limit: 16 });
    assert_eq!(err.backtrace.frames().len(), 16);
    assert!(err.backtrace.frames().iter().all(|frame| frame == "loop"));
}

#[test]
fn calling_a_value_is_an_error() {
    let mut session = session();
    let err = exec_err(&mut session, |s| {
        let one = s.int(1);
        s.assign("a", AssignOp::Constant, one);
        let call = s.call("a", &[]);
        s.push(call);
    });
    assert_eq!(err.kind, EvalErrorKind::NotCallable { name: "a".into() });
}

#[test]
fn unknown_parameter_type_is_reported() {
    let mut session = session();
    let err = exec_err(&mut session, |s| {
        let one = s.int(1);
        s.function("f", None, &[("Matrix", "m", ParamMode::Value, None)], vec![one]);
    });
    assert_eq!(err.message, "unknown type 'Matrix'");
}

#[test]
fn user_function_in_a_deterministic_assignment_recomputes() {
    let mut session = session();
    exec(&mut session, |s| {
        let x = s.var("x");
        let one = s.int(1);
        let body = s.binary(BinaryOp::Add, x, one);
        s.function("inc", None, &[("Natural", "x", ParamMode::ConstReference, None)], vec![body]);
        let two = s.int(2);
        s.assign("a", AssignOp::Constant, two);
        let a = s.var("a");
        let call = s.call("inc", &[a]);
        s.assign("b", AssignOp::Deterministic, call);
        let five = s.int(5);
        s.assign("a", AssignOp::Constant, five);
    });
    assert_eq!(value(&session, "b"), Value::Natural(6));
}

#[test]
fn by_value_parameter_keeps_the_call_linked() {
    let mut session = session();
    exec(&mut session, |s| {
        let x = s.var("x");
        let one = s.real(1.0);
        let body = s.binary(BinaryOp::Add, x, one);
        s.function("inc", None, &[("Real", "x", ParamMode::Value, None)], vec![body]);
        let five = s.real(5.0);
        s.assign("a", AssignOp::Constant, five);
        let a = s.var("a");
        let call = s.call("inc", &[a]);
        s.assign("b", AssignOp::Deterministic, call);
        let seven = s.real(7.0);
        s.assign("a", AssignOp::Constant, seven);
    });

    let a = session.variable("a").unwrap();
    assert!(session.variable("b").unwrap().depends_on(&a));
    assert_eq!(value(&session, "b"), Value::RealPos(8.0));
}

#[test]
fn print_joins_values_with_spaces() {
    let mut session = session();
    exec(&mut session, |s| {
        let text = s.string("mu is");
        let half = s.real(0.5);
        let call = s.call("print", &[text, half]);
        s.push(call);
    });
    assert_eq!(session.take_output(), "mu is 0.5\n");
}

#[test]
fn ls_lists_variables_by_name() {
    let mut session = session();
    exec(&mut session, |s| {
        let two = s.int(2);
        s.assign("b", AssignOp::Constant, two);
        let half = s.real(0.5);
        s.assign("a", AssignOp::Constant, half);
        let call = s.call("ls", &[]);
        s.push(call);
    });
    assert_eq!(
        session.take_output(),
        "a <Probability> = 0.5\nb <Natural> = 2\n"
    );
}

#[test]
fn clear_empties_the_workspace() {
    let mut session = session();
    exec(&mut session, |s| {
        let one = s.int(1);
        s.assign("a", AssignOp::Constant, one);
        let call = s.call("clear", &[]);
        s.push(call);
    });
    assert!(session.variable("a").is_none());
}

#[test]
fn missing_and_unexpected_arguments() {
    let mut session = session();
    let missing = exec_err(&mut session, |s| {
        let call = s.call("ln", &[]);
        s.push(call);
    });
    assert!(matches!(missing.kind, EvalErrorKind::MissingArgument { .. }));

    let unexpected = exec_err(&mut session, |s| {
        let (one, two) = (s.real(1.5), s.real(2.5));
        let call = s.call("ln", &[one, two]);
        s.push(call);
    });
    assert!(matches!(unexpected.kind, EvalErrorKind::UnexpectedArgument { .. }));

    let mut script = Script::new(&session);
    let word = script.string("word");
    let call = script.call("exp", &[word]);
    script.push(call);
    let errors = script.run(&mut session);
    assert!(matches!(errors[0].kind, EvalErrorKind::TypeMismatch { .. }));
}
