//! Workspace procedures: `print`, `ls`, `clear`.

use std::fmt::Write as _;

use crate::arguments::{ArgumentRule, BoundArguments};
use crate::function::{BuiltinFunction, CallContext};
use crate::registry::RegistryBuilder;
use crate::types::TypeId;
use crate::{EvalResult, Value};

/// `print(...)`: the values separated by spaces, then a newline.
fn print(args: &BoundArguments, ctx: &mut CallContext<'_>) -> EvalResult<Value> {
    let mut line = String::new();
    for (i, value) in args.variadic_values()?.iter().enumerate() {
        if i > 0 {
            line.push(' ');
        }
        let _ = write!(line, "{value}");
    }
    ctx.printer().println(&line);
    Ok(Value::Null)
}

/// `ls()`: one line per visible variable, `name <Type> = value`, sorted by name.
fn ls(_: &BoundArguments, ctx: &mut CallContext<'_>) -> EvalResult<Value> {
    let types = ctx.types();
    let printer = ctx.printer();
    let Some(env) = ctx.env() else {
        return Ok(Value::Null);
    };
    for (_, variable) in env.visible_variables() {
        let ty = types.name(variable.type_id());
        match variable.content() {
            Value::Function(_) => printer.println(&format!("{} <{ty}>", variable.name())),
            content => printer.println(&format!("{} <{ty}> = {content}", variable.name())),
        }
    }
    Ok(Value::Null)
}

/// `clear()`: remove every variable in the calling environment.
fn clear(_: &BoundArguments, ctx: &mut CallContext<'_>) -> EvalResult<Value> {
    if let Some(env) = ctx.env() {
        env.clear();
        tracing::debug!("workspace cleared");
    }
    Ok(Value::Null)
}

pub(super) fn register(registry: &mut RegistryBuilder) -> EvalResult<()> {
    let procedures = [
        BuiltinFunction::new(
            "print",
            vec![ArgumentRule::new("x", TypeId::OBJECT).variadic()],
            TypeId::NULL,
            print,
        ),
        BuiltinFunction::new("ls", Vec::new(), TypeId::NULL, ls),
        BuiltinFunction::new("clear", Vec::new(), TypeId::NULL, clear),
    ];
    for procedure in procedures {
        registry.add_function(procedure.procedure().into_ref())?;
    }
    Ok(())
}
