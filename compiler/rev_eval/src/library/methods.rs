//! Methods available on every value, on containers, and on stochastic
//! variables.

use crate::arguments::{ArgumentRule, BoundArguments};
use crate::errors::{index_out_of_range, type_mismatch};
use crate::function::{BuiltinFunction, CallContext};
use crate::graph::GraphNode;
use crate::interpreter::one_based_position;
use crate::library::vector_arg;
use crate::registry::RegistryBuilder;
use crate::types::{TypeId, TypeTable};
use crate::{EvalResult, Value};

fn receiver() -> ArgumentRule {
    ArgumentRule::new("self", TypeId::OBJECT)
}

/// `x[i]` on a container value.
fn element(args: &BoundArguments, ctx: &mut CallContext<'_>) -> EvalResult<Value> {
    let target = args.get(0).display_name();
    let items = vector_arg(args, 0, ctx.types())?;
    let position = one_based_position(&target, &args.value(1)?, ctx.types())?;
    items
        .get(position)
        .cloned()
        .ok_or_else(|| index_out_of_range(&target, position + 1, items.len()))
}

fn element_type(args: &BoundArguments, _: &TypeTable) -> TypeId {
    args.get(0).type_id().element_of().unwrap_or(TypeId::OBJECT)
}

/// The stochastic node behind the receiver.
fn stochastic_node(args: &BoundArguments, ctx: &CallContext<'_>) -> EvalResult<GraphNode> {
    let receiver = args.get(0);
    match receiver.content() {
        Value::Node(node) => Ok(node),
        other => Err(type_mismatch("a stochastic variable", ctx.types().name(other.type_id()))),
    }
}

/// `x.setValue(v)`: write through aliases into the variable itself.
fn set_value(args: &BoundArguments, ctx: &mut CallContext<'_>) -> EvalResult<Value> {
    let value = args.value(1)?;
    args.get(0).set_value_in_place(value, ctx.types())?;
    Ok(Value::Null)
}

/// `x.clamp(v)`: fix a stochastic variable to observed data.
fn clamp(args: &BoundArguments, ctx: &mut CallContext<'_>) -> EvalResult<Value> {
    let node = stochastic_node(args, ctx)?;
    let name = args.get(0).display_name();
    let value = args.value(1)?.convert_to(node.type_id(), ctx.types())?;
    node.clamp(value, &name)?;
    Ok(Value::Null)
}

fn unclamp(args: &BoundArguments, ctx: &mut CallContext<'_>) -> EvalResult<Value> {
    let node = stochastic_node(args, ctx)?;
    if !node.is_clamped() {
        tracing::debug!(variable = %args.get(0).display_name(), "unclamp on an unclamped variable");
    }
    node.unclamp();
    Ok(Value::Null)
}

fn is_clamped(args: &BoundArguments, ctx: &mut CallContext<'_>) -> EvalResult<Value> {
    stochastic_node(args, ctx).map(|node| Value::Bool(node.is_clamped()))
}

pub(super) fn register(registry: &mut RegistryBuilder) -> EvalResult<()> {
    use TypeId as T;

    registry.add_method(
        T::CONTAINER,
        BuiltinFunction::new(
            "[]",
            vec![
                ArgumentRule::new("self", T::CONTAINER),
                ArgumentRule::new("index", T::INTEGER),
            ],
            T::OBJECT,
            element,
        )
        .returns_with(element_type)
        .into_ref(),
    )?;
    registry.add_method(
        T::CONTAINER,
        BuiltinFunction::new(
            "size",
            vec![ArgumentRule::new("self", T::CONTAINER)],
            T::NATURAL,
            |args, ctx| {
                let len = vector_arg(args, 0, ctx.types())?.len();
                Ok(Value::Natural(i64::try_from(len).unwrap_or(i64::MAX)))
            },
        )
        .into_ref(),
    )?;
    registry.add_method(
        T::OBJECT,
        BuiltinFunction::new("type", vec![receiver()], T::STRING, |args, ctx| {
            Ok(Value::string(ctx.types().name(args.get(0).type_id())))
        })
        .into_ref(),
    )?;
    registry.add_method(
        T::OBJECT,
        BuiltinFunction::new(
            "setValue",
            vec![receiver(), ArgumentRule::new("x", T::OBJECT)],
            T::NULL,
            set_value,
        )
        .procedure()
        .into_ref(),
    )?;

    let stochastic = || receiver().stochastic();
    let model_methods = [
        BuiltinFunction::new(
            "clamp",
            vec![stochastic(), ArgumentRule::new("x", T::OBJECT)],
            T::NULL,
            clamp,
        )
        .procedure(),
        BuiltinFunction::new("unclamp", vec![stochastic()], T::NULL, unclamp).procedure(),
        BuiltinFunction::new("isClamped", vec![stochastic()], T::BOOL, is_clamped),
    ];
    for method in model_methods {
        registry.add_method(T::OBJECT, method.into_ref())?;
    }
    Ok(())
}

