//! Expression nodes.
//!
//! Statements are expressions: an assignment evaluates to the variable it
//! wrote, which is what makes `a <- b <- 5` chain.

use smallvec::SmallVec;

use super::operators::{AssignOp, BinaryOp, ParamMode, UnaryOp};
use crate::{ExprId, Name};

/// Bracket indices following a name, `x[i][j]`.
pub type IndexList = SmallVec<[ExprId; 2]>;

/// Expression variants.
#[derive(Clone, PartialEq, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ExprKind {
    /// `NULL`
    Null,
    /// `TRUE` / `FALSE`
    Bool(bool),
    /// Integer literal; always non-negative out of the parser.
    Int(i64),
    /// Real literal; always non-negative out of the parser.
    Real(f64),
    /// String literal.
    Str(Name),
    /// `name[i]...` or `base.name[i]...`
    Variable(VariableRef),
    /// `name(args)[i]...` or `base.name(args)[i]...`
    Call(Call),
    Unary {
        op: UnaryOp,
        operand: ExprId,
    },
    Binary {
        op: BinaryOp,
        left: ExprId,
        right: ExprId,
    },
    Assign {
        op: AssignOp,
        target: ExprId,
        value: ExprId,
    },
    /// `for (var in iterable) { body }`
    For {
        var: Name,
        iterable: ExprId,
        body: Vec<ExprId>,
    },
    /// `function [Type] name(params) { body }`
    FunctionDef(Box<FunctionDef>),
}

/// A (possibly member, possibly indexed) variable reference.
#[derive(Clone, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct VariableRef {
    /// Receiver for member access (`base.name`); `None` for a plain name.
    pub base: Option<ExprId>,
    pub name: Name,
    pub indices: IndexList,
}

/// A function or method call.
#[derive(Clone, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Call {
    /// Receiver for method calls (`base.name(..)`).
    pub base: Option<ExprId>,
    pub name: Name,
    pub args: Vec<CallArg>,
    /// Indices applied to the call's result.
    pub indices: IndexList,
}

/// One supplied argument, `label = value` or just `value`.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CallArg {
    pub label: Option<Name>,
    pub value: ExprId,
}

impl CallArg {
    pub fn positional(value: ExprId) -> Self {
        CallArg { label: None, value }
    }

    pub fn labeled(label: Name, value: ExprId) -> Self {
        CallArg {
            label: Some(label),
            value,
        }
    }
}

/// A user function definition.
#[derive(Clone, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FunctionDef {
    pub name: Name,
    /// Declared return type name (`Real`, `Natural[]`); `None` accepts anything.
    pub return_type: Option<Name>,
    pub params: Vec<Param>,
    pub body: Vec<ExprId>,
}

/// A declared parameter of a user function.
#[derive(Clone, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Param {
    pub label: Name,
    /// Type name as written, e.g. `RealPos` or `Real[]`.
    pub ty: Name,
    pub mode: ParamMode,
    /// Default value, evaluated once when the function is defined.
    pub default: Option<ExprId>,
}
