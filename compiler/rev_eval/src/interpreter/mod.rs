//! Tree-walking evaluator for Rev statements.
//!
//! Every expression evaluates to a [`SharedVariable`], never a bare value:
//! literals and call results come back as anonymous variables, variable
//! references as the variable itself. Arguments, assignment targets and
//! dependency edges are all expressed in terms of variables.
//!
//! The same expression evaluates under one of two [`EvalMode`]s. Value mode
//! detaches results from the graph; reactive mode turns pure calls into
//! deterministic nodes over the variables they read.
//!
//! # Arena threading
//!
//! A user function keeps the arena it was defined in. Its body runs in a
//! fresh interpreter over that arena, on top of the scope it was defined in.
//!
//! # Modules
//!
//! - `index`: bracket indices, element variables, member access
//! - `call`: function, method and operator calls
//! - `assign`: the five assignment forms
//! - `user_function`: `function` definitions and their execution
//! - `scope_guard`: scope push/pop that survives early returns

mod assign;
mod call;
mod index;
mod scope_guard;
mod user_function;

pub use index::one_based_position;
pub use scope_guard::ScopedInterpreter;
pub use user_function::UserFunction;

use rev_ir::{ExprId, ExprKind, Name, SharedArena};
use rev_stack::ensure_sufficient_stack;

use crate::environment::Environment;
use crate::errors::{name_not_found, type_mismatch};
use crate::eval_mode::EvalMode;
use crate::runtime::Runtime;
use crate::types::TypeTable;
use crate::variable::VariableKind;
use crate::{EvalResult, SharedVariable, Value};

/// Evaluator for statements of one arena against one environment.
pub struct Interpreter<'a> {
    arena: SharedArena,
    runtime: &'a Runtime,
    env: &'a mut Environment,
    /// User-function frames below this interpreter.
    depth: usize,
}

impl<'a> Interpreter<'a> {
    pub fn new(arena: SharedArena, runtime: &'a Runtime, env: &'a mut Environment) -> Self {
        Interpreter {
            arena,
            runtime,
            env,
            depth: 0,
        }
    }

    #[must_use]
    pub fn with_depth(mut self, depth: usize) -> Self {
        self.depth = depth;
        self
    }

    pub fn env(&self) -> &Environment {
        self.env
    }

    pub fn env_mut(&mut self) -> &mut Environment {
        self.env
    }

    pub fn runtime(&self) -> &'a Runtime {
        self.runtime
    }

    pub fn depth(&self) -> usize {
        self.depth
    }

    #[inline]
    fn types(&self) -> &'a TypeTable {
        self.runtime.types()
    }

    #[inline]
    fn text(&self, name: Name) -> &'static str {
        self.runtime.interner().lookup(name)
    }

    /// Evaluate one top-level statement.
    ///
    /// On error, bindings made by earlier statements are untouched; side
    /// effects of this statement before the failing step are not undone.
    #[tracing::instrument(level = "debug", skip_all)]
    pub fn eval_statement(&mut self, statement: ExprId) -> EvalResult<SharedVariable> {
        self.eval(statement, EvalMode::Value)
    }

    /// Evaluate `id` under `mode`.
    pub fn eval(&mut self, id: ExprId, mode: EvalMode) -> EvalResult<SharedVariable> {
        ensure_sufficient_stack(|| self.eval_inner(id, mode))
    }

    fn eval_inner(&mut self, id: ExprId, mode: EvalMode) -> EvalResult<SharedVariable> {
        let arena = self.arena.clone();
        match arena.get(id) {
            ExprKind::Null => Ok(SharedVariable::anonymous(Value::Null)),
            ExprKind::Bool(b) => Ok(SharedVariable::anonymous(Value::Bool(*b))),
            ExprKind::Int(i) => Ok(SharedVariable::anonymous(Value::int(*i))),
            ExprKind::Real(x) => Ok(SharedVariable::anonymous(Value::real(*x))),
            ExprKind::Str(s) => Ok(SharedVariable::anonymous(Value::string(self.text(*s)))),
            ExprKind::Variable(reference) => {
                let name = self.text(reference.name);
                let variable = match reference.base {
                    Some(base) => {
                        let receiver = self.eval(base, mode)?;
                        self.member(&receiver, name)?
                    }
                    None => self.lookup_name(reference.name, mode)?,
                };
                self.apply_indices(variable, &reference.indices, mode)
            }
            ExprKind::Call(call) => self.eval_call(call, mode),
            ExprKind::Unary { op, operand } => {
                self.eval_operator(op.function_name(), &[*operand], mode)
            }
            ExprKind::Binary { op, left, right } => {
                self.eval_operator(op.function_name(), &[*left, *right], mode)
            }
            ExprKind::Assign { op, target, value } => self.eval_assign(*op, *target, *value),
            ExprKind::For {
                var,
                iterable,
                body,
            } => self.eval_for(*var, *iterable, body),
            ExprKind::FunctionDef(def) => self.define_function(def),
        }
    }

    /// Resolve a bare name: a variable first, then a registered function.
    ///
    /// Workspace variables read in reactive mode come back as detached
    /// constants so no edge to them is recorded.
    fn lookup_name(&self, name: Name, mode: EvalMode) -> EvalResult<SharedVariable> {
        if let Some(variable) = self.env.lookup_variable(name) {
            if mode.detaches_workspace_variables() && variable.kind() == VariableKind::Workspace {
                return Ok(SharedVariable::anonymous(variable.value()?));
            }
            return Ok(variable);
        }
        let text = self.text(name);
        match self.runtime.registry().functions().get(text) {
            Some(function) => Ok(SharedVariable::anonymous(Value::Function(function.clone()))),
            None => Err(name_not_found(text)),
        }
    }

    /// `for (var in iterable) { body }`; the loop variable is a workspace
    /// variable of the current scope.
    fn eval_for(&mut self, var: Name, iterable: ExprId, body: &[ExprId]) -> EvalResult<SharedVariable> {
        let items = self.eval(iterable, EvalMode::Value)?.value()?;
        let Some(vector) = items.as_vector() else {
            return Err(type_mismatch("a vector", self.types().name(items.type_id()))
                .with_message(format!(
                    "cannot loop over a value of type {}",
                    self.types().name(items.type_id())
                )));
        };
        let text = self.text(var);
        let variable = self.env.declare_variable(var, text);
        for item in vector.iter() {
            variable.replace_content(item.clone(), VariableKind::Workspace);
            for &statement in body {
                self.eval(statement, EvalMode::Value)?;
            }
        }
        Ok(SharedVariable::anonymous(Value::Null))
    }

    /// Short description of an expression for error messages.
    fn describe(&self, id: ExprId) -> String {
        match self.arena.get(id) {
            ExprKind::Variable(reference) => self.text(reference.name).to_string(),
            ExprKind::Call(call) => format!("{}(...)", self.text(call.name)),
            ExprKind::Null
            | ExprKind::Bool(_)
            | ExprKind::Int(_)
            | ExprKind::Real(_)
            | ExprKind::Str(_) => "a constant".to_string(),
            _ => "an expression".to_string(),
        }
    }
}
