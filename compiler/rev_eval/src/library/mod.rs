//! The core plugin.
//!
//! Everything a Rev session can call out of the box is registered here
//! through the same [`Plugin`] interface an external plugin uses: operator
//! functions, vector and math functions, workspace procedures, methods
//! available on every value, and a small set of distributions, moves and
//! monitors.

mod arithmetic;
mod distributions;
mod functions;
mod methods;
mod moves;
mod procedures;

pub use distributions::DistributionObject;
pub use moves::{MonitorObject, MoveObject};

use crate::arguments::BoundArguments;
use crate::errors::type_mismatch;
use crate::registry::{Plugin, RegistryBuilder};
use crate::types::TypeTable;
use crate::{EvalResult, Value};

/// Built-in functions, methods and model objects.
#[derive(Copy, Clone, Debug, Default)]
pub struct CorePlugin;

impl Plugin for CorePlugin {
    fn name(&self) -> &'static str {
        "core"
    }

    fn register(&self, registry: &mut RegistryBuilder) -> EvalResult<()> {
        arithmetic::register(registry)?;
        functions::register(registry)?;
        procedures::register(registry)?;
        methods::register(registry)?;
        distributions::register(registry)?;
        moves::register(registry)?;
        Ok(())
    }
}

// Argument accessors. Matching has already converted every argument to its
// rule's type, so a failure here means a rule and its body disagree.

fn integer_arg(args: &BoundArguments, index: usize, types: &TypeTable) -> EvalResult<i64> {
    let value = args.value(index)?;
    value
        .as_i64()
        .ok_or_else(|| type_mismatch("Integer", types.name(value.type_id())))
}

fn real_arg(args: &BoundArguments, index: usize, types: &TypeTable) -> EvalResult<f64> {
    let value = args.value(index)?;
    value
        .as_f64()
        .ok_or_else(|| type_mismatch("Real", types.name(value.type_id())))
}

fn string_arg(args: &BoundArguments, index: usize, types: &TypeTable) -> EvalResult<String> {
    let value = args.value(index)?;
    value
        .as_str()
        .map(str::to_string)
        .ok_or_else(|| type_mismatch("String", types.name(value.type_id())))
}

fn vector_arg(args: &BoundArguments, index: usize, types: &TypeTable) -> EvalResult<Vec<Value>> {
    let value = args.value(index)?;
    value
        .as_vector()
        .map(|vector| vector.as_slice().to_vec())
        .ok_or_else(|| type_mismatch("a vector", types.name(value.type_id())))
}

#[cfg(test)]
#[allow(clippy::unwrap_used, reason = "tests use unwrap for brevity")]
mod tests;
