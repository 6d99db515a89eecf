//! Rev Eval - evaluation core of the Rev modelling language.
//!
//! Rev scripts build a probabilistic graphical model statement by statement.
//! This crate evaluates those statements: it owns the value model, the
//! variable environment and the model graph the assignment forms build.
//!
//! # Architecture
//!
//! - [`Session`]: registry, workspace and configuration; the entry point
//! - [`interpreter::Interpreter`]: tree walker over a [`rev_ir::ExprArena`]
//! - [`SharedVariable`]: named cells with identity; everything evaluates to one
//! - [`graph::GraphNode`]: constant, deterministic and stochastic nodes
//! - [`registry::Registry`]: types, functions and methods from plugins
//! - [`library::CorePlugin`]: arithmetic, vectors, distributions, moves
//!
//! Syntax comes from [`rev_ir`]; this crate never parses.

pub mod arguments;
pub mod environment;
pub mod errors;
pub mod eval_mode;
pub mod function;
pub mod graph;
pub mod interpreter;
pub mod library;
pub mod print_handler;
pub mod registry;
mod runtime;
mod session;
mod shared;
pub mod types;
pub mod value;
mod variable;

use std::sync::Once;

pub use environment::{Environment, LocalScope, Scope};
pub use errors::{EvalError, EvalErrorKind, EvalResult};
pub use eval_mode::EvalMode;
pub use function::{BuiltinFunction, CallContext, Function, FunctionKind, FunctionRef};
pub use library::CorePlugin;
pub use registry::{Plugin, Registry, RegistryBuilder};
pub use runtime::{Runtime, DEFAULT_MAX_CALL_DEPTH};
pub use session::{ErrorPolicy, Session, SessionBuilder};
pub use shared::SharedRegistry;
pub use types::{TypeId, TypeTable};
pub use value::{FunctionValue, Heap, ObjectValue, Value, VectorValue};
pub use variable::{SharedVariable, VariableFlags, VariableKind};

static TRACING_INIT: Once = Once::new();

/// Install a stderr tracing subscriber.
///
/// Safe to call more than once. Does nothing unless `REV_LOG` or `RUST_LOG`
/// is set, e.g. `REV_LOG=rev_eval=debug` to trace every assignment.
pub fn init_tracing() {
    TRACING_INIT.call_once(|| {
        use tracing_subscriber::{fmt, prelude::*, EnvFilter};

        let filter = if std::env::var("REV_LOG").is_ok() {
            EnvFilter::from_env("REV_LOG")
        } else if std::env::var("RUST_LOG").is_ok() {
            EnvFilter::from_default_env()
        } else {
            return;
        };
        tracing_subscriber::registry()
            .with(
                fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_target(true)
                    .with_level(true),
            )
            .with(filter)
            .init();
    });
}

#[cfg(test)]
#[allow(clippy::unwrap_used, reason = "tests use unwrap for brevity")]
mod tests;
