//! Vector and math functions.

use crate::arguments::{ArgumentRule, BoundArguments};
use crate::errors::integer_overflow;
use crate::function::{BuiltinFunction, CallContext};
use crate::library::{integer_arg, real_arg, vector_arg};
use crate::registry::RegistryBuilder;
use crate::types::{TypeId, TypeTable};
use crate::{EvalResult, SharedVariable, Value};

/// `v(...)`: a vector of the supplied values.
///
/// The element type is the narrowest built-in type every value derives
/// from or always converts to; mixed values fall back to `RevObject[]`.
/// Items are stored in the element type's own variant.
fn vector(args: &BoundArguments, ctx: &mut CallContext<'_>) -> EvalResult<Value> {
    let types = ctx.types();
    let values = args.variadic_values()?;
    let elem = types.common_element_type(values.iter().map(Value::type_id));
    let items = if elem == TypeId::OBJECT {
        values
    } else {
        values
            .iter()
            .map(|value| value.convert_to(elem, types).map(|item| item.widened_to(elem)))
            .collect::<EvalResult<Vec<_>>>()?
    };
    Ok(Value::vector(elem, items))
}

fn vector_type(args: &BoundArguments, types: &TypeTable) -> TypeId {
    types
        .common_element_type(args.variables().map(SharedVariable::type_id))
        .vector_of()
}

fn integer_sum(args: &BoundArguments, ctx: &CallContext<'_>) -> EvalResult<i64> {
    vector_arg(args, 0, ctx.types())?
        .iter()
        .try_fold(0_i64, |total, item| {
            total
                .checked_add(item.as_i64().unwrap_or_default())
                .ok_or_else(|| integer_overflow("sum"))
        })
}

fn real_sum(args: &BoundArguments, ctx: &CallContext<'_>) -> EvalResult<f64> {
    Ok(vector_arg(args, 0, ctx.types())?
        .iter()
        .filter_map(Value::as_f64)
        .sum())
}

pub(super) fn register(registry: &mut RegistryBuilder) -> EvalResult<()> {
    use TypeId as T;

    let x = |ty| vec![ArgumentRule::new("x", ty)];

    let functions = [
        BuiltinFunction::new("v", vec![ArgumentRule::new("x", T::OBJECT).variadic()], T::OBJECT_VECTOR, vector)
            .returns_with(vector_type),
        // Sums, narrowest element type first.
        BuiltinFunction::new("sum", x(T::NATURAL_VECTOR), T::NATURAL, |args, ctx| {
            integer_sum(args, ctx).map(Value::Natural)
        }),
        BuiltinFunction::new("sum", x(T::INTEGER_VECTOR), T::INTEGER, |args, ctx| {
            integer_sum(args, ctx).map(Value::Integer)
        }),
        BuiltinFunction::new("sum", x(T::REAL_POS_VECTOR), T::REAL_POS, |args, ctx| {
            real_sum(args, ctx).map(Value::RealPos)
        }),
        BuiltinFunction::new("sum", x(T::REAL_VECTOR), T::REAL, |args, ctx| {
            real_sum(args, ctx).map(Value::Real)
        }),
        // Math
        BuiltinFunction::new("exp", x(T::REAL), T::REAL_POS, |args, ctx| {
            Ok(Value::RealPos(real_arg(args, 0, ctx.types())?.exp()))
        }),
        BuiltinFunction::new("ln", x(T::REAL_POS), T::REAL, |args, ctx| {
            Ok(Value::Real(real_arg(args, 0, ctx.types())?.ln()))
        }),
        BuiltinFunction::new("abs", x(T::INTEGER), T::NATURAL, |args, ctx| {
            let value = integer_arg(args, 0, ctx.types())?;
            value
                .checked_abs()
                .map(Value::Natural)
                .ok_or_else(|| integer_overflow("abs"))
        }),
        BuiltinFunction::new("abs", x(T::REAL), T::REAL_POS, |args, ctx| {
            Ok(Value::RealPos(real_arg(args, 0, ctx.types())?.abs()))
        }),
        BuiltinFunction::new("type", x(T::OBJECT), T::STRING, |args, ctx| {
            Ok(Value::string(ctx.types().name(args.get(0).type_id())))
        }),
    ];

    for function in functions {
        registry.add_function(function.into_ref())?;
    }
    Ok(())
}
