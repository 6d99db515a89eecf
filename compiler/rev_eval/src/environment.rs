//! Scope chain mapping names to shared variables.
//!
//! A stack of scopes, innermost last. Each scope also links to its lexical
//! parent, so a user function's frame (pushed onto the scope it was
//! defined in) sees the defining scope's names without copying them.

use std::cell::RefCell;
use std::fmt;
use std::ops::Deref;
use std::rc::Rc;

use rev_ir::Name;
use rustc_hash::FxHashMap;

use crate::registry::Registry;
use crate::value::FunctionValue;
use crate::{SharedVariable, Value};

/// Single-threaded shared scope handle.
#[repr(transparent)]
pub struct LocalScope<T>(Rc<RefCell<T>>);

impl<T> LocalScope<T> {
    #[inline]
    pub fn new(value: T) -> Self {
        LocalScope(Rc::new(RefCell::new(value)))
    }

    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl<T> Clone for LocalScope<T> {
    #[inline]
    fn clone(&self) -> Self {
        LocalScope(Rc::clone(&self.0))
    }
}

impl<T: Default> Default for LocalScope<T> {
    fn default() -> Self {
        LocalScope::new(T::default())
    }
}

impl<T> Deref for LocalScope<T> {
    type Target = RefCell<T>;

    #[inline]
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl<T: fmt::Debug> fmt::Debug for LocalScope<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("LocalScope").field(&self.0).finish()
    }
}

/// Bindings of one scope.
#[derive(Default, Debug)]
pub struct Scope {
    bindings: FxHashMap<Name, SharedVariable>,
    parent: Option<LocalScope<Scope>>,
}

impl Scope {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_parent(parent: LocalScope<Scope>) -> Self {
        Scope {
            bindings: FxHashMap::default(),
            parent: Some(parent),
        }
    }

    /// Bind `name` in this scope, shadowing any outer binding.
    #[inline]
    pub fn define(&mut self, name: Name, variable: SharedVariable) {
        self.bindings.insert(name, variable);
    }

    /// Innermost binding of `name` along the parent chain.
    pub fn lookup(&self, name: Name) -> Option<SharedVariable> {
        if let Some(variable) = self.bindings.get(&name) {
            return Some(variable.clone());
        }
        self.parent.as_ref()?.borrow().lookup(name)
    }

    /// Remove the innermost binding of `name` along the parent chain.
    pub fn remove(&mut self, name: Name) -> Option<SharedVariable> {
        if let Some(variable) = self.bindings.remove(&name) {
            return Some(variable);
        }
        self.parent.as_ref()?.borrow_mut().remove(name)
    }

    pub fn contains_local(&self, name: Name) -> bool {
        self.bindings.contains_key(&name)
    }

    /// Drop every binding of this scope (not of its parents).
    pub fn clear(&mut self) {
        self.bindings.clear();
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    fn collect_visible(&self, seen: &mut FxHashMap<Name, SharedVariable>) {
        for (name, variable) in &self.bindings {
            seen.entry(*name).or_insert_with(|| variable.clone());
        }
        if let Some(parent) = &self.parent {
            parent.borrow().collect_visible(seen);
        }
    }
}

/// The evaluator's environment.
pub struct Environment {
    scopes: Vec<LocalScope<Scope>>,
    global: LocalScope<Scope>,
}

impl Environment {
    /// An environment with one empty global scope.
    pub fn new() -> Self {
        Self::from_scope(LocalScope::new(Scope::new()))
    }

    /// An environment whose outermost scope is `scope`.
    ///
    /// Used to run a user function on top of the scope it was defined in.
    pub fn from_scope(scope: LocalScope<Scope>) -> Self {
        Environment {
            scopes: vec![scope.clone()],
            global: scope,
        }
    }

    pub fn depth(&self) -> usize {
        self.scopes.len()
    }

    #[inline]
    pub fn push_scope(&mut self) {
        let parent = self.current_scope();
        self.scopes.push(LocalScope::new(Scope::with_parent(parent)));
    }

    /// Pop the innermost scope. The outermost scope is never popped.
    #[inline]
    pub fn pop_scope(&mut self) {
        if self.scopes.len() > 1 {
            self.scopes.pop();
        }
    }

    #[inline]
    pub fn current_scope(&self) -> LocalScope<Scope> {
        self.scopes.last().unwrap_or(&self.global).clone()
    }

    pub fn global_scope(&self) -> LocalScope<Scope> {
        self.global.clone()
    }

    /// Innermost variable named `name`. Absence is not an error here.
    #[inline]
    pub fn lookup_variable(&self, name: Name) -> Option<SharedVariable> {
        self.scopes
            .last()
            .unwrap_or(&self.global)
            .borrow()
            .lookup(name)
    }

    /// The variable named `name`, created empty in the innermost scope if
    /// no scope binds it. `display` names a new variable.
    pub fn declare_variable(&mut self, name: Name, display: &str) -> SharedVariable {
        if let Some(existing) = self.lookup_variable(name) {
            return existing;
        }
        let variable = SharedVariable::new(display, Value::Null);
        self.define_local(name, variable.clone());
        variable
    }

    /// Bind `variable` as `name` in the innermost scope, shadowing outer bindings.
    #[inline]
    pub fn define_local(&mut self, name: Name, variable: SharedVariable) {
        self.scopes
            .last()
            .unwrap_or(&self.global)
            .borrow_mut()
            .define(name, variable);
    }

    pub fn remove_variable(&mut self, name: Name) -> Option<SharedVariable> {
        self.scopes
            .last()
            .unwrap_or(&self.global)
            .borrow_mut()
            .remove(name)
    }

    /// Every visible variable, innermost binding first for shadowed names,
    /// sorted by variable name. Hidden helpers are skipped.
    pub fn visible_variables(&self) -> Vec<(Name, SharedVariable)> {
        let mut seen = FxHashMap::default();
        self.current_scope().borrow().collect_visible(&mut seen);
        let mut visible: Vec<(Name, SharedVariable)> = seen
            .into_iter()
            .filter(|(_, variable)| !variable.is_hidden())
            .collect();
        visible.sort_by_cached_key(|(_, variable)| variable.name());
        visible
    }

    /// Callable named `name`: a variable holding a function first, then
    /// the registry's global functions.
    pub fn lookup_function(&self, name: Name, display: &str, registry: &Registry) -> Option<FunctionValue> {
        if let Some(variable) = self.lookup_variable(name) {
            if let Value::Function(function) = variable.content() {
                return Some(function);
            }
        }
        registry.functions().get(display).cloned()
    }

    /// Drop every binding in every scope on the stack.
    ///
    /// User functions capture the scope they were defined in, and that scope
    /// binds the function, so teardown has to break the cycle explicitly.
    pub fn clear(&mut self) {
        for scope in &self.scopes {
            scope.borrow_mut().clear();
        }
        self.global.borrow_mut().clear();
    }
}

impl Default for Environment {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Environment")
            .field("depth", &self.scopes.len())
            .field("global", &self.global.borrow().len())
            .finish()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, reason = "tests use unwrap for brevity")]
mod tests;
