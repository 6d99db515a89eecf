//! The callable contract shared by built-in, plugin and user functions.
//!
//! The evaluator never looks inside a function. It matches arguments
//! against [`Function::rules`], then either calls [`Function::execute`] or,
//! for a pure function in reactive mode, stores the function and its bound
//! arguments in a deterministic node that calls `execute` on demand.

use std::fmt;
use std::rc::Rc;

use crate::arguments::{ArgumentRule, ArgumentRules, BoundArguments};
use crate::environment::Environment;
use crate::print_handler::PrintHandlerImpl;
use crate::runtime::Runtime;
use crate::types::{TypeId, TypeTable};
use crate::{EvalResult, Value};

/// How a call interacts with the model graph.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, Default)]
pub enum FunctionKind {
    /// Result depends only on the arguments; becomes a deterministic node
    /// in reactive mode.
    #[default]
    Pure,
    /// Side-effecting; always runs immediately and may see the environment.
    Procedure,
    /// Builds a plugin object (distribution, move, monitor) that keeps its
    /// argument variables linked. Runs immediately.
    Constructor,
}

/// A callable overload.
pub trait Function: fmt::Debug {
    /// Name used in error messages.
    fn name(&self) -> &str;

    fn rules(&self) -> &ArgumentRules;

    /// Type of the value a call with `args` produces.
    fn return_type(&self, args: &BoundArguments, types: &TypeTable) -> TypeId;

    fn kind(&self) -> FunctionKind {
        FunctionKind::Pure
    }

    fn execute(&self, args: &BoundArguments, ctx: &mut CallContext<'_>) -> EvalResult<Value>;
}

/// Shared handle to a function overload.
pub type FunctionRef = Rc<dyn Function>;

/// What a running function can reach besides its arguments.
pub struct CallContext<'a> {
    runtime: &'a Runtime,
    env: Option<&'a mut Environment>,
    depth: usize,
}

impl<'a> CallContext<'a> {
    /// Context of a call made by the interpreter at user-call depth `depth`.
    pub fn new(runtime: &'a Runtime, env: &'a mut Environment, depth: usize) -> Self {
        CallContext {
            runtime,
            env: Some(env),
            depth,
        }
    }

    /// Context of a call made by a graph node recomputing its value.
    pub fn detached(runtime: &'a Runtime) -> Self {
        CallContext {
            runtime,
            env: None,
            depth: 0,
        }
    }

    pub fn runtime(&self) -> &'a Runtime {
        self.runtime
    }

    pub fn types(&self) -> &'a TypeTable {
        self.runtime.types()
    }

    pub fn printer(&self) -> &'a PrintHandlerImpl {
        self.runtime.print_handler()
    }

    /// The calling environment; `None` during node recomputation.
    pub fn env(&mut self) -> Option<&mut Environment> {
        self.env.as_deref_mut()
    }

    /// Number of user-function frames below this call.
    pub fn depth(&self) -> usize {
        self.depth
    }
}

/// Native body of a built-in function.
pub type NativeFn = fn(&BoundArguments, &mut CallContext<'_>) -> EvalResult<Value>;

/// Return type of a built-in.
#[derive(Copy, Clone)]
pub enum ReturnType {
    Fixed(TypeId),
    /// Depends on the bound arguments (e.g. `_add` on two `Natural`s).
    Computed(fn(&BoundArguments, &TypeTable) -> TypeId),
}

/// A function implemented in Rust.
pub struct BuiltinFunction {
    name: &'static str,
    rules: ArgumentRules,
    returns: ReturnType,
    kind: FunctionKind,
    body: NativeFn,
}

impl BuiltinFunction {
    pub fn new(name: &'static str, rules: Vec<ArgumentRule>, returns: TypeId, body: NativeFn) -> Self {
        BuiltinFunction {
            name,
            rules: ArgumentRules::new(rules),
            returns: ReturnType::Fixed(returns),
            kind: FunctionKind::Pure,
            body,
        }
    }

    #[must_use]
    pub fn returns_with(mut self, returns: fn(&BoundArguments, &TypeTable) -> TypeId) -> Self {
        self.returns = ReturnType::Computed(returns);
        self
    }

    #[must_use]
    pub fn procedure(mut self) -> Self {
        self.kind = FunctionKind::Procedure;
        self
    }

    #[must_use]
    pub fn constructor(mut self) -> Self {
        self.kind = FunctionKind::Constructor;
        self
    }

    pub fn into_ref(self) -> FunctionRef {
        Rc::new(self)
    }
}

impl Function for BuiltinFunction {
    fn name(&self) -> &str {
        self.name
    }

    fn rules(&self) -> &ArgumentRules {
        &self.rules
    }

    fn return_type(&self, args: &BoundArguments, types: &TypeTable) -> TypeId {
        match self.returns {
            ReturnType::Fixed(ty) => ty,
            ReturnType::Computed(compute) => compute(args, types),
        }
    }

    fn kind(&self) -> FunctionKind {
        self.kind
    }

    fn execute(&self, args: &BoundArguments, ctx: &mut CallContext<'_>) -> EvalResult<Value> {
        (self.body)(args, ctx)
    }
}

impl fmt::Debug for BuiltinFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BuiltinFunction")
            .field("name", &self.name)
            .field("kind", &self.kind)
            .field("rules", &self.rules.len())
            .finish()
    }
}
