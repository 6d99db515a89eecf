use pretty_assertions::assert_eq;
use rev_ir::{AssignOp, BinaryOp};

use super::{exec, exec_err, is_type_mismatch, session, value};
use crate::graph::NodeVariant;
use crate::{EvalErrorKind, Session, Value};

/// `mu <- 0.5; x ~ dnorm(mu, 1.0)`
fn normal_model() -> Session {
    let mut session = session();
    exec(&mut session, |s| {
        let half = s.real(0.5);
        s.assign("mu", AssignOp::Constant, half);
        let mu = s.var("mu");
        let one = s.real(1.0);
        let dist = s.call("dnorm", &[mu, one]);
        s.assign("x", AssignOp::Stochastic, dist);
    });
    session
}

#[test]
fn stochastic_node_starts_at_the_distribution_centre() {
    let session = normal_model();
    let x = session.variable("x").unwrap();
    assert_eq!(x.variant(), NodeVariant::Stochastic);
    assert_eq!(x.value().unwrap(), Value::Real(0.5));

    let node = x.content().graph_node().cloned().unwrap();
    let parents = node.parents();
    assert_eq!(parents.len(), 1);
    assert!(parents[0].ptr_eq(&session.variable("mu").unwrap()));
}

#[test]
fn clamping_fixes_the_value_and_downstream_nodes_follow() {
    let mut session = normal_model();
    exec(&mut session, |s| {
        let x = s.var("x");
        let one = s.real(1.0);
        let shifted = s.binary(BinaryOp::Add, x, one);
        s.assign("y", AssignOp::Deterministic, shifted);
        let x = s.var("x");
        let two = s.real(2.0);
        let clamp = s.method(x, "clamp", &[two]);
        s.push(clamp);
        let x = s.var("x");
        let query = s.method(x, "isClamped", &[]);
        s.assign("c", AssignOp::Constant, query);
    });

    assert_eq!(value(&session, "x").as_f64(), Some(2.0));
    assert_eq!(value(&session, "y"), Value::Real(3.0));
    assert_eq!(value(&session, "c"), Value::Bool(true));

    exec(&mut session, |s| {
        let x = s.var("x");
        let unclamp = s.method(x, "unclamp", &[]);
        s.push(unclamp);
        let x = s.var("x");
        let four = s.real(4.0);
        let set = s.method(x, "setValue", &[four]);
        s.push(set);
        let x = s.var("x");
        let query = s.method(x, "isClamped", &[]);
        s.assign("c", AssignOp::Constant, query);
    });
    assert_eq!(value(&session, "c"), Value::Bool(false));
    assert_eq!(value(&session, "y"), Value::Real(5.0));
}

#[test]
fn clamp_requires_a_stochastic_receiver() {
    let mut session = session();
    let err = exec_err(&mut session, |s| {
        let half = s.real(0.5);
        s.assign("a", AssignOp::Constant, half);
        let a = s.var("a");
        let one = s.real(1.0);
        let clamp = s.method(a, "clamp", &[one]);
        s.push(clamp);
    });
    assert!(is_type_mismatch(&err), "{err}");
}

#[test]
fn deterministic_values_cannot_be_set() {
    let mut session = session();
    let err = exec_err(&mut session, |s| {
        let half = s.real(0.5);
        s.assign("a", AssignOp::Constant, half);
        let a = s.var("a");
        let one = s.real(1.0);
        let sum = s.binary(BinaryOp::Add, a, one);
        s.assign("b", AssignOp::Deterministic, sum);
        let b = s.var("b");
        let nine = s.real(9.0);
        let set = s.method(b, "setValue", &[nine]);
        s.push(set);
    });
    assert!(matches!(err.kind, EvalErrorKind::IllegalAssignmentTarget { .. }));
}

#[test]
fn tilde_needs_a_distribution() {
    let mut session = session();
    let err = exec_err(&mut session, |s| {
        let five = s.int(5);
        s.assign("x", AssignOp::Stochastic, five);
    });
    assert!(is_type_mismatch(&err), "{err}");
}

#[test]
fn distribution_parameters_are_checked() {
    let mut session = session();
    let err = exec_err(&mut session, |s| {
        let zero = s.real(0.0);
        let one = s.real(1.0);
        let negative = s.neg(one);
        let dist = s.call_labeled("dnorm", &[("mean", zero), ("sd", negative)]);
        s.assign("x", AssignOp::Stochastic, dist);
    });
    assert!(is_type_mismatch(&err), "{err}");
}

#[test]
fn stochastic_node_cannot_read_itself() {
    let mut session = normal_model();
    let err = exec_err(&mut session, |s| {
        let x = s.var("x");
        let one = s.real(1.0);
        let dist = s.call("dnorm", &[x, one]);
        s.assign("x", AssignOp::Stochastic, dist);
    });
    assert!(matches!(err.kind, EvalErrorKind::CyclicDependency { .. }));
}

#[test]
fn distribution_members_are_its_parameter_variables() {
    let mut session = session();
    exec(&mut session, |s| {
        let half = s.real(0.5);
        s.assign("mu", AssignOp::Constant, half);
        let mu = s.var("mu");
        let one = s.real(1.0);
        let dist = s.call_labeled("dnorm", &[("mean", mu), ("sd", one)]);
        s.assign("d", AssignOp::Constant, dist);
        let d = s.var("d");
        let mean = s.member(d, "mean");
        s.assign("m", AssignOp::Constant, mean);
        let d = s.var("d");
        let kind = s.call("type", &[d]);
        s.assign("t", AssignOp::Constant, kind);
    });

    assert_eq!(value(&session, "m"), Value::Probability(0.5));
    assert_eq!(value(&session, "t"), Value::string("Dist_norm"));
    assert_eq!(value(&session, "d").to_string(), "dnorm(mean = 0.5, sd = 1)");
}

#[test]
fn exponential_prior_with_default_rate() {
    let mut session = session();
    exec(&mut session, |s| {
        let dist = s.call("dexp", &[]);
        s.assign("rate", AssignOp::Stochastic, dist);
    });
    assert_eq!(value(&session, "rate"), Value::RealPos(1.0));
}

#[test]
fn scale_move_targets_a_stochastic_variable() {
    let mut session = session();
    exec(&mut session, |s| {
        let dist = s.call("dexp", &[]);
        s.assign("rate", AssignOp::Stochastic, dist);
        let rate = s.var("rate");
        let weight = s.int(3);
        let mv = s.call_labeled("mvScale", &[("", rate), ("weight", weight)]);
        s.assign("mv", AssignOp::Constant, mv);
    });

    let mv = value(&session, "mv");
    let object = mv.as_object().unwrap();
    assert_eq!(object.type_id(), session.runtime().types().lookup("Move_scale").unwrap());
    let rate = session.variable("rate").unwrap();
    assert!(object.member("x").unwrap().ptr_eq(&rate));
    assert_eq!(object.member("weight").unwrap().value().unwrap().as_f64(), Some(3.0));
    assert_eq!(object.member("lambda").unwrap().value().unwrap(), Value::RealPos(1.0));
}

#[test]
fn moves_reject_constant_targets() {
    let mut session = session();
    let err = exec_err(&mut session, |s| {
        let two = s.real(2.0);
        s.assign("a", AssignOp::Constant, two);
        let a = s.var("a");
        let mv = s.call("mvScale", &[a]);
        s.assign("mv", AssignOp::Constant, mv);
    });
    assert!(is_type_mismatch(&err), "{err}");
}

#[test]
fn screen_monitor_collects_its_variables() {
    let mut session = normal_model();
    exec(&mut session, |s| {
        let ten = s.int(10);
        let (mu, x) = (s.var("mu"), s.var("x"));
        let mn = s.call_labeled("mnScreen", &[("printgen", ten), ("", mu), ("", x)]);
        s.assign("mn", AssignOp::Constant, mn);
    });

    let mn = value(&session, "mn");
    assert_eq!(mn.to_string(), "mnScreen(printgen = 10, x = mu, x = x)");
    let printgen = mn.as_object().unwrap().member("printgen").unwrap();
    assert_eq!(printgen.value().unwrap(), Value::Natural(10));
}
