//! Session: registry, environment and configuration for evaluating a
//! sequence of Rev statements.
//!
//! ```text
//! let mut session = Session::builder()
//!     .print_handler(buffer_handler())
//!     .error_policy(ErrorPolicy::Abort)
//!     .build()?;
//! let errors = session.run(&arena, &statements);
//! ```

use rev_ir::{ExprId, SharedArena, SharedInterner};

use crate::environment::Environment;
use crate::errors::name_not_found;
use crate::interpreter::Interpreter;
use crate::library::CorePlugin;
use crate::print_handler::{stdout_handler, SharedPrintHandler};
use crate::registry::{Plugin, Registry};
use crate::runtime::{Runtime, DEFAULT_MAX_CALL_DEPTH};
use crate::shared::SharedRegistry;
use crate::{EvalError, EvalResult, SharedVariable, Value};

/// What [`Session::run`] does after a statement fails.
#[derive(Copy, Clone, Eq, PartialEq, Debug, Default)]
pub enum ErrorPolicy {
    /// Report the error and go on with the next statement.
    #[default]
    Continue,
    /// Stop at the first error.
    Abort,
}

/// Builder for [`Session`].
pub struct SessionBuilder {
    interner: Option<SharedInterner>,
    print_handler: Option<SharedPrintHandler>,
    max_call_depth: Option<usize>,
    policy: ErrorPolicy,
    plugins: Vec<Box<dyn Plugin>>,
}

impl SessionBuilder {
    pub fn new() -> Self {
        SessionBuilder {
            interner: None,
            print_handler: None,
            max_call_depth: Some(DEFAULT_MAX_CALL_DEPTH),
            policy: ErrorPolicy::default(),
            plugins: Vec::new(),
        }
    }

    /// Share an interner with the parser that built the statements.
    #[must_use]
    pub fn interner(mut self, interner: SharedInterner) -> Self {
        self.interner = Some(interner);
        self
    }

    /// Where `print` and `ls` write. Defaults to stdout.
    #[must_use]
    pub fn print_handler(mut self, handler: SharedPrintHandler) -> Self {
        self.print_handler = Some(handler);
        self
    }

    /// Bound on nested user-function calls; `None` disables the check.
    #[must_use]
    pub fn max_call_depth(mut self, limit: Option<usize>) -> Self {
        self.max_call_depth = limit;
        self
    }

    #[must_use]
    pub fn error_policy(mut self, policy: ErrorPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Install `plugin` after the core library.
    #[must_use]
    pub fn plugin(mut self, plugin: impl Plugin + 'static) -> Self {
        self.plugins.push(Box::new(plugin));
        self
    }

    /// Build the registry and an empty workspace.
    ///
    /// Fails if a plugin's registration fails, e.g. on a duplicate overload.
    pub fn build(self) -> EvalResult<Session> {
        let mut registry = Registry::builder();
        registry.install(&CorePlugin)?;
        for plugin in &self.plugins {
            registry.install(plugin.as_ref())?;
        }
        let runtime = Runtime::new(
            SharedRegistry::new(registry.build()),
            self.interner.unwrap_or_default(),
            self.print_handler.unwrap_or_else(stdout_handler),
        )
        .with_max_call_depth(self.max_call_depth);
        tracing::debug!(?runtime, "session created");
        Ok(Session {
            runtime,
            env: Environment::new(),
            policy: self.policy,
        })
    }
}

impl Default for SessionBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// An interpreter session: one workspace, one registry.
///
/// Dropping the session tears down the workspace.
pub struct Session {
    runtime: Runtime,
    env: Environment,
    policy: ErrorPolicy,
}

impl Session {
    pub fn builder() -> SessionBuilder {
        SessionBuilder::new()
    }

    /// A session with the default configuration.
    pub fn new() -> EvalResult<Self> {
        SessionBuilder::new().build()
    }

    pub fn runtime(&self) -> &Runtime {
        &self.runtime
    }

    pub fn interner(&self) -> &SharedInterner {
        self.runtime.interner()
    }

    pub fn env(&self) -> &Environment {
        &self.env
    }

    /// Evaluate one top-level statement of `arena`.
    pub fn eval_statement(&mut self, arena: &SharedArena, statement: ExprId) -> EvalResult<SharedVariable> {
        Interpreter::new(arena.clone(), &self.runtime, &mut self.env).eval_statement(statement)
    }

    /// Evaluate `statements` in order and return the errors raised.
    ///
    /// A failed statement leaves the bindings made by earlier statements
    /// in place. Under [`ErrorPolicy::Abort`] the first error ends the run.
    pub fn run(&mut self, arena: &SharedArena, statements: &[ExprId]) -> Vec<EvalError> {
        let mut errors = Vec::new();
        for &statement in statements {
            if let Err(err) = self.eval_statement(arena, statement) {
                tracing::debug!(error = %err, "statement failed");
                errors.push(err);
                if self.policy == ErrorPolicy::Abort {
                    break;
                }
            }
        }
        errors
    }

    /// The workspace variable named `name`.
    pub fn variable(&self, name: &str) -> Option<SharedVariable> {
        let name = self.interner().get(name)?;
        self.env.lookup_variable(name)
    }

    /// Current value of the workspace variable named `name`.
    pub fn value_of(&self, name: &str) -> EvalResult<Value> {
        self.variable(name)
            .ok_or_else(|| name_not_found(name))?
            .value()
    }

    /// Output captured by a buffer print handler since the last call.
    pub fn take_output(&self) -> String {
        self.runtime.print_handler().take_output()
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        self.env.clear();
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("runtime", &self.runtime)
            .field("env", &self.env)
            .field("policy", &self.policy)
            .finish()
    }
}
