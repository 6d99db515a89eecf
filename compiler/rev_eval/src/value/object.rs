//! Open-ended plugin values.
//!
//! Distributions, moves and monitors live outside the evaluator. They reach
//! it as [`ObjectValue`]s: the evaluator only asks for their type, their
//! members and, for distributions, the parameters a stochastic node draws on.

use std::fmt;
use std::rc::Rc;

use crate::arguments::BoundArguments;
use crate::types::TypeId;
use crate::{EvalResult, SharedVariable, Value};

/// Contract every plugin value implements.
pub trait PluginObject {
    fn type_id(&self) -> TypeId;

    /// Named sub-variable, reachable as `object.name`.
    fn member(&self, _name: &str) -> Option<SharedVariable> {
        None
    }

    fn member_names(&self) -> Vec<&'static str> {
        Vec::new()
    }

    fn as_distribution(&self) -> Option<&dyn Distribution> {
        None
    }

    fn fmt_display(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result;
}

/// A probability distribution a stochastic node can be drawn from.
pub trait Distribution {
    fn name(&self) -> &str;

    /// Type of the values the distribution produces.
    fn value_type(&self) -> TypeId;

    /// Parameter variables; they become the parents of the stochastic node.
    fn parameters(&self) -> &BoundArguments;

    /// Starting value of a fresh stochastic node.
    fn initial_value(&self) -> EvalResult<Value>;
}

/// Shared handle to a plugin value.
#[derive(Clone)]
pub struct ObjectValue(Rc<dyn PluginObject>);

impl ObjectValue {
    pub fn new(object: impl PluginObject + 'static) -> Self {
        ObjectValue(Rc::new(object))
    }

    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl std::ops::Deref for ObjectValue {
    type Target = dyn PluginObject;

    fn deref(&self) -> &Self::Target {
        &*self.0
    }
}

impl fmt::Display for ObjectValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt_display(f)
    }
}

impl fmt::Debug for ObjectValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Object({self})")
    }
}
