//! Operator functions.
//!
//! `a + b` evaluates as `_add(a, b)`. Overloads are tried in registration
//! order, so each operator lists its narrowest result type first: two
//! `Natural`s add to a `Natural`, a `Natural` and a `Real` to a `Real`.

use crate::arguments::{ArgumentRule, BoundArguments};
use crate::errors::{integer_overflow, range_too_long};
use crate::function::{BuiltinFunction, CallContext, FunctionRef, NativeFn};
use crate::library::{integer_arg, real_arg, string_arg};
use crate::registry::RegistryBuilder;
use crate::types::TypeId;
use crate::{EvalResult, Value};

fn binary(name: &'static str, operands: TypeId, returns: TypeId, body: NativeFn) -> FunctionRef {
    BuiltinFunction::new(
        name,
        vec![ArgumentRule::new("x", operands), ArgumentRule::new("y", operands)],
        returns,
        body,
    )
    .into_ref()
}

fn unary(name: &'static str, operand: TypeId, returns: TypeId, body: NativeFn) -> FunctionRef {
    BuiltinFunction::new(name, vec![ArgumentRule::new("x", operand)], returns, body).into_ref()
}

fn integers(args: &BoundArguments, ctx: &CallContext<'_>) -> EvalResult<(i64, i64)> {
    Ok((
        integer_arg(args, 0, ctx.types())?,
        integer_arg(args, 1, ctx.types())?,
    ))
}

fn reals(args: &BoundArguments, ctx: &CallContext<'_>) -> EvalResult<(f64, f64)> {
    Ok((real_arg(args, 0, ctx.types())?, real_arg(args, 1, ctx.types())?))
}

#[inline]
fn checked(result: Option<i64>, operation: &str, wrap: fn(i64) -> Value) -> EvalResult<Value> {
    result.map(wrap).ok_or_else(|| integer_overflow(operation))
}

/// Most elements `from:to` may produce.
pub const MAX_RANGE_LEN: u64 = 1 << 24;

/// `from:to`, counting down when `to < from`.
fn range(from: i64, to: i64, elem: TypeId, wrap: fn(i64) -> Value) -> EvalResult<Value> {
    let len = (i128::from(to) - i128::from(from)).unsigned_abs() + 1;
    if len > u128::from(MAX_RANGE_LEN) {
        return Err(range_too_long(from, to, MAX_RANGE_LEN));
    }
    let items: Vec<Value> = if from <= to {
        (from..=to).map(wrap).collect()
    } else {
        (to..=from).rev().map(wrap).collect()
    };
    Ok(Value::vector(elem, items))
}

pub(super) fn register(registry: &mut RegistryBuilder) -> EvalResult<()> {
    use TypeId as T;

    let functions = [
        // Addition
        binary("_add", T::NATURAL, T::NATURAL, |args, ctx| {
            let (x, y) = integers(args, ctx)?;
            checked(x.checked_add(y), "addition", Value::Natural)
        }),
        binary("_add", T::INTEGER, T::INTEGER, |args, ctx| {
            let (x, y) = integers(args, ctx)?;
            checked(x.checked_add(y), "addition", Value::Integer)
        }),
        binary("_add", T::REAL_POS, T::REAL_POS, |args, ctx| {
            let (x, y) = reals(args, ctx)?;
            Ok(Value::RealPos(x + y))
        }),
        binary("_add", T::REAL, T::REAL, |args, ctx| {
            let (x, y) = reals(args, ctx)?;
            Ok(Value::Real(x + y))
        }),
        binary("_add", T::STRING, T::STRING, |args, ctx| {
            let mut joined = string_arg(args, 0, ctx.types())?;
            joined.push_str(&string_arg(args, 1, ctx.types())?);
            Ok(Value::string(joined))
        }),
        // Subtraction
        binary("_sub", T::INTEGER, T::INTEGER, |args, ctx| {
            let (x, y) = integers(args, ctx)?;
            checked(x.checked_sub(y), "subtraction", Value::Integer)
        }),
        binary("_sub", T::REAL, T::REAL, |args, ctx| {
            let (x, y) = reals(args, ctx)?;
            Ok(Value::Real(x - y))
        }),
        // Multiplication
        binary("_mul", T::NATURAL, T::NATURAL, |args, ctx| {
            let (x, y) = integers(args, ctx)?;
            checked(x.checked_mul(y), "multiplication", Value::Natural)
        }),
        binary("_mul", T::INTEGER, T::INTEGER, |args, ctx| {
            let (x, y) = integers(args, ctx)?;
            checked(x.checked_mul(y), "multiplication", Value::Integer)
        }),
        binary("_mul", T::REAL_POS, T::REAL_POS, |args, ctx| {
            let (x, y) = reals(args, ctx)?;
            Ok(Value::RealPos(x * y))
        }),
        binary("_mul", T::REAL, T::REAL, |args, ctx| {
            let (x, y) = reals(args, ctx)?;
            Ok(Value::Real(x * y))
        }),
        // Division always yields a real.
        binary("_div", T::REAL_POS, T::REAL_POS, |args, ctx| {
            let (x, y) = reals(args, ctx)?;
            Ok(Value::RealPos(x / y))
        }),
        binary("_div", T::REAL, T::REAL, |args, ctx| {
            let (x, y) = reals(args, ctx)?;
            Ok(Value::Real(x / y))
        }),
        // Exponentiation
        binary("_pow", T::REAL_POS, T::REAL_POS, |args, ctx| {
            let (x, y) = reals(args, ctx)?;
            Ok(Value::RealPos(x.powf(y)))
        }),
        binary("_pow", T::REAL, T::REAL, |args, ctx| {
            let (x, y) = reals(args, ctx)?;
            Ok(Value::Real(x.powf(y)))
        }),
        // Negation
        unary("_uminus", T::INTEGER, T::INTEGER, |args, ctx| {
            let x = integer_arg(args, 0, ctx.types())?;
            checked(x.checked_neg(), "negation", Value::Integer)
        }),
        unary("_uminus", T::REAL, T::REAL, |args, ctx| {
            Ok(Value::Real(-real_arg(args, 0, ctx.types())?))
        }),
        // Ranges
        binary("_range", T::NATURAL, T::NATURAL_VECTOR, |args, ctx| {
            let (from, to) = integers(args, ctx)?;
            range(from, to, T::NATURAL, Value::Natural)
        }),
        binary("_range", T::INTEGER, T::INTEGER_VECTOR, |args, ctx| {
            let (from, to) = integers(args, ctx)?;
            range(from, to, T::INTEGER, Value::Integer)
        }),
    ];

    for function in functions {
        registry.add_function(function)?;
    }
    Ok(())
}
