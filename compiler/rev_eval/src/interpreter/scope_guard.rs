//! Scope guard for the interpreter's environment.
//!
//! [`ScopedInterpreter`] pushes a scope when created and pops it when
//! dropped, so a user-function frame is removed on every exit path: normal
//! return, `?` on an error, or unwinding.
//!
//! The guard holds `&mut Interpreter` and derefs to it, so code inside the
//! scope calls interpreter methods unchanged.
//!
//! ```text
//! interpreter.with_bindings(params, |scoped| {
//!     for &statement in body {
//!         scoped.eval(statement, EvalMode::Value)?;
//!     }
//!     Ok(())
//! })
//! ```

use std::ops::{Deref, DerefMut};

use rev_ir::Name;

use super::Interpreter;
use crate::SharedVariable;

/// Interpreter with one extra environment scope, popped on drop.
pub struct ScopedInterpreter<'guard, 'interp> {
    interpreter: &'guard mut Interpreter<'interp>,
}

impl Drop for ScopedInterpreter<'_, '_> {
    fn drop(&mut self) {
        self.interpreter.env.pop_scope();
    }
}

impl<'interp> Deref for ScopedInterpreter<'_, 'interp> {
    type Target = Interpreter<'interp>;

    fn deref(&self) -> &Self::Target {
        self.interpreter
    }
}

impl DerefMut for ScopedInterpreter<'_, '_> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.interpreter
    }
}

impl<'a> Interpreter<'a> {
    /// Push a scope and return a guard that pops it.
    pub fn scoped(&mut self) -> ScopedInterpreter<'_, 'a> {
        self.env.push_scope();
        ScopedInterpreter { interpreter: self }
    }

    /// Run `f` inside a fresh scope.
    pub fn with_env_scope<T, F>(&mut self, f: F) -> T
    where
        F: FnOnce(&mut ScopedInterpreter<'_, 'a>) -> T,
    {
        let mut scoped = self.scoped();
        f(&mut scoped)
    }

    /// Run `f` inside a fresh scope that binds each `(name, variable)` pair.
    pub fn with_bindings<T, F, I>(&mut self, bindings: I, f: F) -> T
    where
        F: FnOnce(&mut ScopedInterpreter<'_, 'a>) -> T,
        I: IntoIterator<Item = (Name, SharedVariable)>,
    {
        self.with_env_scope(|scoped| {
            for (name, variable) in bindings {
                scoped.env.define_local(name, variable);
            }
            f(scoped)
        })
    }
}
