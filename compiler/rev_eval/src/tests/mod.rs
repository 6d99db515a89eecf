//! Scripts run end to end through a [`Session`].
//!
//! There is no parser in this workspace, so scripts are assembled with the
//! arena builders. [`Script`] keeps that readable: each helper mirrors one
//! piece of Rev syntax.

mod functions;
mod model;

use rev_ir::{
    AssignOp, BinaryOp, CallArg, ExprArena, ExprId, FunctionDef, Name, Param, ParamMode,
    SharedArena, SharedInterner, UnaryOp,
};

use crate::print_handler::buffer_handler;
use crate::{EvalError, EvalErrorKind, Session, Value};

/// A session that captures printed output.
pub(crate) fn session() -> Session {
    Session::builder()
        .print_handler(buffer_handler())
        .build()
        .unwrap()
}

/// A Rev script under construction.
pub(crate) struct Script {
    interner: SharedInterner,
    arena: ExprArena,
    statements: Vec<ExprId>,
}

impl Script {
    pub(crate) fn new(session: &Session) -> Self {
        Script {
            interner: session.interner().clone(),
            arena: ExprArena::new(),
            statements: Vec::new(),
        }
    }

    pub(crate) fn name(&self, text: &str) -> Name {
        self.interner.intern(text)
    }

    pub(crate) fn int(&mut self, value: i64) -> ExprId {
        self.arena.int(value)
    }

    pub(crate) fn real(&mut self, value: f64) -> ExprId {
        self.arena.real(value)
    }

    pub(crate) fn string(&mut self, text: &str) -> ExprId {
        let name = self.name(text);
        self.arena.string(name)
    }

    pub(crate) fn var(&mut self, text: &str) -> ExprId {
        let name = self.name(text);
        self.arena.var(name)
    }

    /// `text[i][j]...` with literal indices.
    pub(crate) fn at(&mut self, text: &str, indices: &[i64]) -> ExprId {
        let name = self.name(text);
        let indices: Vec<ExprId> = indices.iter().map(|&i| self.arena.int(i)).collect();
        self.arena.indexed(name, indices)
    }

    /// `base.member`
    pub(crate) fn member(&mut self, base: ExprId, member: &str) -> ExprId {
        let name = self.name(member);
        self.arena.member(base, name)
    }

    pub(crate) fn neg(&mut self, operand: ExprId) -> ExprId {
        self.arena.unary(UnaryOp::Neg, operand)
    }

    pub(crate) fn binary(&mut self, op: BinaryOp, left: ExprId, right: ExprId) -> ExprId {
        self.arena.binary(op, left, right)
    }

    /// `function(args)` with positional arguments.
    pub(crate) fn call(&mut self, function: &str, args: &[ExprId]) -> ExprId {
        let name = self.name(function);
        self.arena
            .call(name, args.iter().copied().map(CallArg::positional))
    }

    /// `function(label = arg, ...)`; an empty label is positional.
    pub(crate) fn call_labeled(&mut self, function: &str, args: &[(&str, ExprId)]) -> ExprId {
        let name = self.name(function);
        let args: Vec<CallArg> = args.iter().map(|&(label, value)| self.arg(label, value)).collect();
        self.arena.call(name, args)
    }

    /// `base.method(args)`
    pub(crate) fn method(&mut self, base: ExprId, method: &str, args: &[ExprId]) -> ExprId {
        let name = self.name(method);
        self.arena
            .method(base, name, args.iter().copied().map(CallArg::positional))
    }

    fn arg(&self, label: &str, value: ExprId) -> CallArg {
        if label.is_empty() {
            CallArg::positional(value)
        } else {
            CallArg::labeled(self.name(label), value)
        }
    }

    pub(crate) fn assign_expr(&mut self, target: ExprId, op: AssignOp, value: ExprId) -> ExprId {
        self.arena.assign(op, target, value)
    }

    /// Append the statement `target op value`.
    pub(crate) fn assign(&mut self, target: &str, op: AssignOp, value: ExprId) -> ExprId {
        let target = self.var(target);
        let statement = self.assign_expr(target, op, value);
        self.push(statement)
    }

    /// Append the statement `target[indices] op value`.
    pub(crate) fn assign_at(&mut self, target: &str, indices: &[i64], op: AssignOp, value: ExprId) -> ExprId {
        let target = self.at(target, indices);
        let statement = self.assign_expr(target, op, value);
        self.push(statement)
    }

    /// `for (var in iterable) { body }` as a statement.
    pub(crate) fn for_loop(&mut self, var: &str, iterable: ExprId, body: Vec<ExprId>) -> ExprId {
        let name = self.name(var);
        let statement = self.arena.for_loop(name, iterable, body);
        self.push(statement)
    }

    /// `function [returns] name(params) { body }` as a statement.
    ///
    /// Parameters are `(type, label, mode, default)`.
    pub(crate) fn function(
        &mut self,
        name: &str,
        returns: Option<&str>,
        params: &[(&str, &str, ParamMode, Option<ExprId>)],
        body: Vec<ExprId>,
    ) -> ExprId {
        let def = FunctionDef {
            name: self.name(name),
            return_type: returns.map(|ty| self.name(ty)),
            params: params
                .iter()
                .map(|&(ty, label, mode, default)| Param {
                    label: self.name(label),
                    ty: self.name(ty),
                    mode,
                    default,
                })
                .collect(),
            body,
        };
        let statement = self.arena.function_def(def);
        self.push(statement)
    }

    pub(crate) fn push(&mut self, statement: ExprId) -> ExprId {
        self.statements.push(statement);
        statement
    }

    /// The finished arena and the statements appended so far.
    pub(crate) fn into_parts(self) -> (SharedArena, Vec<ExprId>) {
        (SharedArena::new(self.arena), self.statements)
    }

    /// Run every statement; return the errors raised.
    pub(crate) fn run(self, session: &mut Session) -> Vec<EvalError> {
        let (arena, statements) = self.into_parts();
        session.run(&arena, &statements)
    }

    /// Run, failing the test on any error.
    pub(crate) fn run_ok(self, session: &mut Session) {
        let errors = self.run(session);
        assert!(errors.is_empty(), "unexpected errors: {errors:?}");
    }
}

/// Run a one-off script built by `build`.
pub(crate) fn exec(session: &mut Session, build: impl FnOnce(&mut Script)) -> Vec<EvalError> {
    let mut script = Script::new(session);
    build(&mut script);
    script.run(session)
}

/// The single error raised by a script built by `build`.
pub(crate) fn exec_err(session: &mut Session, build: impl FnOnce(&mut Script)) -> EvalError {
    let mut errors = exec(session, build);
    assert_eq!(errors.len(), 1, "expected exactly one error, got {errors:?}");
    errors.remove(0)
}

pub(crate) fn value(session: &Session, name: &str) -> Value {
    session.value_of(name).unwrap()
}

pub(crate) fn is_type_mismatch(err: &EvalError) -> bool {
    matches!(err.kind, EvalErrorKind::TypeMismatch { .. })
}
