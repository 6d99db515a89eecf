//! Functions defined in Rev source with `function`.

use std::fmt;
use std::rc::Rc;

use rev_ir::{FunctionDef, Name, ParamMode, SharedArena};

use crate::arguments::{ArgumentRule, ArgumentRules, BoundArgument, BoundArguments, PassingMode};
use crate::environment::{Environment, LocalScope, Scope};
use crate::errors::{recursion_limit_exceeded, unknown_type};
use crate::eval_mode::EvalMode;
use crate::function::{CallContext, Function, FunctionRef};
use crate::interpreter::Interpreter;
use crate::types::{TypeId, TypeTable};
use crate::value::FunctionValue;
use crate::variable::VariableKind;
use crate::{EvalResult, SharedVariable, Value};

/// A user-defined overload: declared parameters, a body, and the scope the
/// definition was evaluated in.
pub struct UserFunction {
    name: String,
    params: Vec<Name>,
    rules: ArgumentRules,
    return_type: Option<TypeId>,
    body: Vec<rev_ir::ExprId>,
    arena: SharedArena,
    closure: LocalScope<Scope>,
}

impl UserFunction {
    /// Parameter variable for one bound argument.
    ///
    /// By-value parameters get a private constant; the reference modes
    /// alias the caller's variable.
    fn bind_parameter(arg: &BoundArgument) -> EvalResult<SharedVariable> {
        let parameter = match arg.mode {
            PassingMode::ByValue => SharedVariable::new(arg.label, arg.variable.value()?),
            PassingMode::ByReference | PassingMode::ByConstantReference => {
                let parameter = SharedVariable::new(arg.label, Value::Null);
                parameter.make_reference(arg.variable.clone());
                parameter
            }
        };
        Ok(parameter)
    }
}

impl Function for UserFunction {
    fn name(&self) -> &str {
        &self.name
    }

    fn rules(&self) -> &ArgumentRules {
        &self.rules
    }

    fn return_type(&self, _args: &BoundArguments, _types: &TypeTable) -> TypeId {
        self.return_type.unwrap_or(TypeId::OBJECT)
    }

    #[tracing::instrument(level = "debug", skip_all, fields(function = %self.name))]
    fn execute(&self, args: &BoundArguments, ctx: &mut CallContext<'_>) -> EvalResult<Value> {
        let runtime = ctx.runtime();
        let depth = ctx.depth() + 1;
        if let Some(limit) = runtime.max_call_depth() {
            if depth > limit {
                return Err(recursion_limit_exceeded(limit));
            }
        }

        let bindings = self
            .params
            .iter()
            .zip(args.fixed())
            .map(|(&name, arg)| Ok((name, Self::bind_parameter(arg)?)))
            .collect::<EvalResult<Vec<_>>>()?;

        let mut env = Environment::from_scope(self.closure.clone());
        let mut interpreter = Interpreter::new(self.arena.clone(), runtime, &mut env).with_depth(depth);
        let result = interpreter.with_bindings(bindings, |frame| -> EvalResult<Value> {
            let mut last = Value::Null;
            for &statement in &self.body {
                last = frame.eval(statement, EvalMode::Value)?.value()?;
            }
            // A returned function keeps the frame alive as its closure.
            if !matches!(last, Value::Function(_)) {
                frame.env().current_scope().borrow_mut().clear();
            }
            Ok(last)
        });

        let value = result.map_err(|err| err.with_frame(&self.name))?;
        match self.return_type {
            Some(ty) => value
                .convert_to(ty, runtime.types())
                .map_err(|err| err.with_frame(&self.name)),
            None => Ok(value),
        }
    }
}

impl fmt::Debug for UserFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UserFunction")
            .field("name", &self.name)
            .field("rules", &self.rules)
            .field("return_type", &self.return_type)
            .finish_non_exhaustive()
    }
}

fn passing_mode(mode: ParamMode) -> PassingMode {
    match mode {
        ParamMode::Value => PassingMode::ByValue,
        ParamMode::Reference => PassingMode::ByReference,
        ParamMode::ConstReference => PassingMode::ByConstantReference,
    }
}

impl Interpreter<'_> {
    /// `function [T] name(params) { body }`
    ///
    /// Adds an overload to the function variable `name`, replacing an
    /// existing overload with the same parameter labels and types. Defaults
    /// are evaluated here, once.
    #[tracing::instrument(level = "debug", skip_all)]
    pub(super) fn define_function(&mut self, def: &FunctionDef) -> EvalResult<SharedVariable> {
        let name = self.text(def.name);
        let mut params = Vec::with_capacity(def.params.len());
        let mut rules = Vec::with_capacity(def.params.len());
        for param in &def.params {
            let ty = self.lookup_type(param.ty)?;
            let mut rule = ArgumentRule::new(self.text(param.label), ty).mode(passing_mode(param.mode));
            if let Some(default) = param.default {
                rule = rule.with_default(self.eval(default, EvalMode::Value)?.value()?);
            }
            params.push(param.label);
            rules.push(rule);
        }
        let return_type = def.return_type.map(|ty| self.lookup_type(ty)).transpose()?;

        let function: FunctionRef = Rc::new(UserFunction {
            name: name.to_string(),
            params,
            rules: ArgumentRules::new(rules),
            return_type,
            body: def.body.clone(),
            arena: self.arena.clone(),
            closure: self.env.current_scope(),
        });

        let variable = self.env.declare_variable(def.name, name);
        let mut overloads: Vec<FunctionRef> = match variable.content() {
            Value::Function(existing) => existing
                .overloads()
                .iter()
                .filter(|overload| !overload.rules().same_formals(function.rules()))
                .cloned()
                .collect(),
            _ => Vec::new(),
        };
        overloads.push(function);
        variable.replace_content(
            Value::Function(FunctionValue::new(name, overloads)),
            VariableKind::Workspace,
        );
        tracing::debug!(function = name, "function defined");
        Ok(variable)
    }

    fn lookup_type(&self, name: Name) -> EvalResult<TypeId> {
        let text = self.text(name);
        self.types().lookup(text).ok_or_else(|| unknown_type(text))
    }
}
