//! Function, method and operator calls.

use rev_ir::{Call, ExprId, Name};

use crate::arguments::matching::{bind, resolve_overload};
use crate::arguments::{Argument, BoundArguments};
use crate::errors::{name_not_found, no_such_member, not_callable};
use crate::eval_mode::EvalMode;
use crate::function::{CallContext, FunctionRef};
use crate::graph::{GraphNode, Recipe};
use crate::interpreter::Interpreter;
use crate::value::FunctionValue;
use crate::{EvalResult, SharedVariable, Value};

impl Interpreter<'_> {
    /// `name(args)` or `base.name(args)`, followed by any indices.
    ///
    /// The receiver is evaluated first, then the arguments left to right.
    pub(super) fn eval_call(&mut self, call: &Call, mode: EvalMode) -> EvalResult<SharedVariable> {
        let name = self.text(call.name);
        let receiver = match call.base {
            Some(base) => Some(self.eval(base, mode)?),
            None => None,
        };

        let mut args = Vec::with_capacity(call.args.len());
        for arg in &call.args {
            let variable = self.eval(arg.value, mode)?;
            args.push(match arg.label {
                Some(label) => Argument::labeled(self.text(label), variable),
                None => Argument::positional(variable),
            });
        }

        let result = match receiver {
            Some(receiver) => self.call_method(receiver, name, args, mode)?,
            None => {
                let function = self.resolve_function(call.name)?;
                self.call_function(&function, args, mode)?
            }
        };
        self.apply_indices(result, &call.indices, mode)
    }

    /// Operators dispatch to their registered function (`a + b` is `_add(a, b)`).
    pub(super) fn eval_operator(
        &mut self,
        function_name: &'static str,
        operands: &[ExprId],
        mode: EvalMode,
    ) -> EvalResult<SharedVariable> {
        let mut args = Vec::with_capacity(operands.len());
        for &operand in operands {
            args.push(Argument::positional(self.eval(operand, mode)?));
        }
        let Some(function) = self.runtime.registry().functions().get(function_name).cloned() else {
            return Err(name_not_found(function_name));
        };
        self.call_function(&function, args, mode)
    }

    fn resolve_function(&self, name: Name) -> EvalResult<FunctionValue> {
        let text = self.text(name);
        if let Some(function) = self.env.lookup_function(name, text, self.runtime.registry()) {
            return Ok(function);
        }
        if self.env.lookup_variable(name).is_some() {
            return Err(not_callable(text));
        }
        Err(name_not_found(text))
    }

    /// Call `method` on `receiver`, which becomes the argument `self`.
    pub(super) fn call_method(
        &mut self,
        receiver: SharedVariable,
        method: &str,
        args: Vec<Argument>,
        mode: EvalMode,
    ) -> EvalResult<SharedVariable> {
        let receiver_type = receiver.type_id();
        let Some(function) = self
            .runtime
            .registry()
            .methods()
            .lookup(receiver_type, method, self.types())
            .cloned()
        else {
            return Err(no_such_member(method, self.types().name(receiver_type)));
        };
        let mut full = Vec::with_capacity(args.len() + 1);
        full.push(Argument::labeled("self", receiver));
        full.extend(args);
        self.call_function(&function, full, mode)
    }

    /// Resolve an overload, bind the arguments and invoke it.
    pub fn call_function(
        &mut self,
        function: &FunctionValue,
        args: Vec<Argument>,
        mode: EvalMode,
    ) -> EvalResult<SharedVariable> {
        let (overload, plan) =
            resolve_overload(function.name(), function.overloads(), &args, self.types(), mode)?;
        let overload = overload.clone();
        let bound = bind(&plan, overload.rules(), &args, self.runtime, mode)?;
        self.invoke(overload, bound, mode)
    }

    /// Run the function now, or wrap it in a deterministic node.
    fn invoke(
        &mut self,
        function: FunctionRef,
        args: BoundArguments,
        mode: EvalMode,
    ) -> EvalResult<SharedVariable> {
        if !mode.executes_immediately(function.kind()) {
            let return_type = function.return_type(&args, self.types());
            let node = GraphNode::deterministic(
                Recipe::Call { function, args },
                return_type,
                self.runtime.clone(),
            );
            return Ok(SharedVariable::anonymous(Value::Node(node)));
        }

        let mut ctx = CallContext::new(self.runtime, &mut *self.env, self.depth);
        let value = function.execute(&args, &mut ctx)?;
        let value = if mode.links_dependencies() {
            value
        } else {
            value.materialize()?
        };
        Ok(SharedVariable::anonymous(value))
    }
}
