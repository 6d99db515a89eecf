//! Property-based tests for the evaluation core.
//!
//! Scripts are assembled with the arena builders and run through a
//! [`Session`]. Besides the type lattice laws, the properties check that
//! deterministic variables always agree with a fresh computation over their
//! current inputs, and that constant assignments keep no link to their
//! inputs, whatever the order of writes.

#![allow(clippy::unwrap_used, clippy::expect_used, reason = "Tests can panic")]

use proptest::prelude::*;
use rev_eval::print_handler::silent_handler;
use rev_eval::{Session, TypeId, TypeTable, Value};
use rev_ir::{AssignOp, BinaryOp, CallArg, ExprArena, ExprId, SharedArena};

fn session() -> Session {
    Session::builder()
        .print_handler(silent_handler())
        .build()
        .unwrap()
}

/// Run `build` as one script and fail the test on any error.
fn run(session: &mut Session, build: impl FnOnce(&mut ExprArena, &Session) -> Vec<ExprId>) {
    let mut arena = ExprArena::new();
    let statements = build(&mut arena, session);
    let errors = session.run(&SharedArena::new(arena), &statements);
    assert!(errors.is_empty(), "unexpected errors: {errors:?}");
}

/// `name <- value`
fn constant(arena: &mut ExprArena, session: &Session, name: &str, value: i64) -> ExprId {
    let target = arena.var(session.interner().intern(name));
    let value = arena.int(value);
    arena.assign(AssignOp::Constant, target, value)
}

// -- Strategies --

const BUILTIN_TYPES: [TypeId; 22] = [
    TypeId::OBJECT,
    TypeId::NULL,
    TypeId::BOOL,
    TypeId::INTEGER,
    TypeId::NATURAL,
    TypeId::REAL,
    TypeId::REAL_POS,
    TypeId::PROBABILITY,
    TypeId::STRING,
    TypeId::FUNCTION,
    TypeId::DISTRIBUTION,
    TypeId::MOVE,
    TypeId::MONITOR,
    TypeId::CONTAINER,
    TypeId::BOOL_VECTOR,
    TypeId::INTEGER_VECTOR,
    TypeId::NATURAL_VECTOR,
    TypeId::REAL_VECTOR,
    TypeId::REAL_POS_VECTOR,
    TypeId::PROBABILITY_VECTOR,
    TypeId::STRING_VECTOR,
    TypeId::OBJECT_VECTOR,
];

fn builtin_type() -> impl Strategy<Value = TypeId> {
    prop::sample::select(BUILTIN_TYPES.to_vec())
}

/// A literal as the evaluator would type it.
fn literal() -> impl Strategy<Value = Value> {
    prop_oneof![
        any::<bool>().prop_map(Value::Bool),
        any::<i64>().prop_map(Value::int),
        (-1.0e6_f64..1.0e6).prop_map(Value::real),
        "[a-z]{0,8}".prop_map(Value::string),
    ]
}

fn literal_type() -> impl Strategy<Value = TypeId> {
    prop_oneof![
        Just(TypeId::BOOL),
        Just(TypeId::NATURAL),
        Just(TypeId::INTEGER),
        Just(TypeId::PROBABILITY),
        Just(TypeId::REAL_POS),
        Just(TypeId::REAL),
        Just(TypeId::STRING),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn integer_literals_are_typed_by_sign(n in any::<i64>()) {
        let expected = if n >= 0 { TypeId::NATURAL } else { TypeId::INTEGER };
        prop_assert_eq!(Value::int(n).type_id(), expected);
    }

    #[test]
    fn real_literals_are_typed_by_range(x in -1.0e6_f64..1.0e6) {
        let expected = if (0.0..=1.0).contains(&x) {
            TypeId::PROBABILITY
        } else if x > 1.0 {
            TypeId::REAL_POS
        } else {
            TypeId::REAL
        };
        prop_assert_eq!(Value::real(x).type_id(), expected);
    }

    #[test]
    fn subtyping_is_reflexive_and_transitive(a in builtin_type(), b in builtin_type(), c in builtin_type()) {
        let table = TypeTable::new();
        prop_assert!(table.is_derived_from(a, a));
        prop_assert!(table.is_derived_from(a, TypeId::OBJECT));
        if table.is_derived_from(a, b) && table.is_derived_from(b, c) {
            prop_assert!(table.is_derived_from(a, c));
        }
    }

    #[test]
    fn converting_to_an_ancestor_is_identity(value in literal(), target in builtin_type()) {
        let table = TypeTable::new();
        if table.is_derived_from(value.type_id(), target) {
            prop_assert_eq!(value.convert_to(target, &table).unwrap(), value);
        }
    }

    #[test]
    fn common_element_type_holds_every_input(types in prop::collection::vec(literal_type(), 1..6)) {
        let table = TypeTable::new();
        let elem = table.common_element_type(types.iter().copied());
        if elem != TypeId::OBJECT {
            for ty in types {
                prop_assert!(
                    table.is_derived_from(ty, elem) || table.find_conversion(ty, elem, false).is_some(),
                    "{} does not fit {}",
                    table.name(ty),
                    table.name(elem)
                );
            }
        }
    }

    #[test]
    fn deterministic_variable_tracks_its_input(
        first in 0_i64..10_000,
        writes in prop::collection::vec(0_i64..10_000, 1..5),
        offset in 0_i64..100,
    ) {
        let mut session = session();
        run(&mut session, |arena, session| {
            let set = constant(arena, session, "a", first);
            let b = arena.var(session.interner().intern("b"));
            let a = arena.var(session.interner().intern("a"));
            let k = arena.int(offset);
            let sum = arena.binary(BinaryOp::Add, a, k);
            let track = arena.assign(AssignOp::Deterministic, b, sum);
            vec![set, track]
        });
        prop_assert_eq!(session.value_of("b").unwrap(), Value::Natural(first + offset));

        for value in writes {
            run(&mut session, |arena, session| vec![constant(arena, session, "a", value)]);
            prop_assert_eq!(session.value_of("b").unwrap(), Value::Natural(value + offset));
        }
    }

    #[test]
    fn chains_recompute_end_to_end(length in 1_usize..12, start in 0_i64..1_000, next in 0_i64..1_000) {
        let mut session = session();
        run(&mut session, |arena, session| {
            let mut statements = vec![constant(arena, session, "x0", start)];
            for i in 1..=length {
                let target = arena.var(session.interner().intern(&format!("x{i}")));
                let previous = arena.var(session.interner().intern(&format!("x{}", i - 1)));
                let one = arena.int(1);
                let step = arena.binary(BinaryOp::Add, previous, one);
                statements.push(arena.assign(AssignOp::Deterministic, target, step));
            }
            statements
        });
        let last = format!("x{length}");
        let steps = i64::try_from(length).unwrap();
        prop_assert_eq!(session.value_of(&last).unwrap(), Value::Natural(start + steps));

        run(&mut session, |arena, session| vec![constant(arena, session, "x0", next)]);
        prop_assert_eq!(session.value_of(&last).unwrap(), Value::Natural(next + steps));
    }

    #[test]
    fn constant_assignment_keeps_no_link(first in 0_i64..10_000, later in 0_i64..10_000) {
        let mut session = session();
        run(&mut session, |arena, session| {
            let set = constant(arena, session, "a", first);
            let b = arena.var(session.interner().intern("b"));
            let a = arena.var(session.interner().intern("a"));
            let one = arena.int(1);
            let sum = arena.binary(BinaryOp::Add, a, one);
            let copy = arena.assign(AssignOp::Constant, b, sum);
            vec![set, copy]
        });
        run(&mut session, |arena, session| vec![constant(arena, session, "a", later)]);

        let b = session.variable("b").unwrap();
        prop_assert!(b.is_constant());
        prop_assert!(session.variable("a").unwrap().children().is_empty());
        prop_assert_eq!(b.value().unwrap(), Value::Natural(first + 1));
    }

    #[test]
    fn range_sums_match_the_closed_form(n in 1_i64..200) {
        let mut session = session();
        run(&mut session, |arena, session| {
            let target = arena.var(session.interner().intern("s"));
            let one = arena.int(1);
            let upper = arena.int(n);
            let range = arena.binary(BinaryOp::Range, one, upper);
            let sum = arena.call(session.interner().intern("sum"), [CallArg::positional(range)]);
            vec![arena.assign(AssignOp::Constant, target, sum)]
        });
        prop_assert_eq!(session.value_of("s").unwrap(), Value::Natural(n * (n + 1) / 2));
    }
}
