//! Bracket indices and member access.
//!
//! Indices are consumed against vector variables first: `x[2]` on a vector
//! variable is the element variable itself, so a node reading it depends on
//! that element only. Once the addressed variable has no element structure
//! left, the remaining indices go through the value's `[]` method, each
//! producing a narrower helper variable named `x[2][1]`.

use rev_ir::ExprId;

use crate::arguments::Argument;
use crate::errors::{
    index_below_minimum, index_out_of_range, invalid_index, name_not_found, no_such_member,
    non_integer_index, not_indexable,
};
use crate::eval_mode::EvalMode;
use crate::interpreter::Interpreter;
use crate::types::TypeTable;
use crate::{EvalResult, SharedVariable, Value};

/// Zero-based position of a 1-based Rev index into `target`.
pub fn one_based_position(target: &str, index: &Value, types: &TypeTable) -> EvalResult<usize> {
    let raw = match index {
        Value::Integer(i) | Value::Natural(i) => *i,
        other => return Err(non_integer_index(target, types.name(other.type_id()))),
    };
    if raw < 1 {
        return Err(index_below_minimum(target, raw));
    }
    usize::try_from(raw - 1).map_err(|_| invalid_index(target, &raw.to_string()))
}

impl Interpreter<'_> {
    /// Apply bracket indices left to right. Index expressions are evaluated
    /// in value mode.
    pub(super) fn apply_indices(
        &mut self,
        variable: SharedVariable,
        indices: &[ExprId],
        mode: EvalMode,
    ) -> EvalResult<SharedVariable> {
        let mut current = variable;
        for &index in indices {
            let index = self.eval(index, EvalMode::Value)?.value()?;
            current = self.index_variable(current, &index, mode)?;
        }
        Ok(current)
    }

    fn index_variable(
        &mut self,
        variable: SharedVariable,
        index: &Value,
        mode: EvalMode,
    ) -> EvalResult<SharedVariable> {
        let target = variable.display_name();
        let resolved = variable.resolve();
        if let Some(elements) = resolved.elements() {
            let position = one_based_position(&target, index, self.types())?;
            return match elements.get(position) {
                Some(Some(element)) => Ok(element.clone()),
                Some(None) => Err(name_not_found(&format!("{target}[{}]", position + 1))),
                None => Err(index_out_of_range(&target, position + 1, elements.len())),
            };
        }

        let receiver_type = variable.type_id();
        if self
            .runtime
            .registry()
            .methods()
            .lookup(receiver_type, "[]", self.types())
            .is_none()
        {
            return Err(not_indexable(&target, self.types().name(receiver_type)));
        }
        let name = format!("{target}[{index}]");
        let args = vec![Argument::positional(SharedVariable::anonymous(index.clone()))];
        let element = self.call_method(variable, "[]", args, mode)?;
        Ok(SharedVariable::hidden(name, element.content()))
    }

    /// `receiver.name` for a non-call member.
    pub(super) fn member(&self, receiver: &SharedVariable, name: &str) -> EvalResult<SharedVariable> {
        let value = receiver.value()?;
        if let Value::Object(object) = &value {
            if let Some(member) = object.member(name) {
                return Ok(member);
            }
        }
        Err(no_such_member(name, self.types().name(value.type_id())))
    }
}
