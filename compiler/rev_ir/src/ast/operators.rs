//! Operators and assignment forms.
//!
//! Arithmetic operators have no evaluator-level semantics of their own: each
//! one names the registered function it dispatches to, so overloads for new
//! value types come from the plugin library, not from the interpreter.

/// Binary operators.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Pow,
    /// `a:b`, an integer sequence.
    Range,
}

impl BinaryOp {
    /// Source-level symbol, for error messages.
    pub const fn as_symbol(self) -> &'static str {
        match self {
            Self::Add => "+",
            Self::Sub => "-",
            Self::Mul => "*",
            Self::Div => "/",
            Self::Pow => "^",
            Self::Range => ":",
        }
    }

    /// Name of the function this operator dispatches to.
    pub const fn function_name(self) -> &'static str {
        match self {
            Self::Add => "_add",
            Self::Sub => "_sub",
            Self::Mul => "_mul",
            Self::Div => "_div",
            Self::Pow => "_pow",
            Self::Range => "_range",
        }
    }
}

/// Unary operators.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum UnaryOp {
    Neg,
}

impl UnaryOp {
    pub const fn as_symbol(self) -> &'static str {
        match self {
            Self::Neg => "-",
        }
    }

    pub const fn function_name(self) -> &'static str {
        match self {
            Self::Neg => "_uminus",
        }
    }
}

/// The five assignment forms.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum AssignOp {
    /// `lhs <- rhs`: store a detached copy of the current value.
    Constant,
    /// `lhs := rhs`: store a value recomputed from the variables `rhs` reads.
    Deterministic,
    /// `lhs <-& rhs`: bind `lhs` as an alias of the variable `rhs` names.
    Reference,
    /// `lhs ~ rhs`: store a random variable drawn from the distribution `rhs`.
    Stochastic,
    /// `lhs = rhs`: store a workspace (control) value outside the model graph.
    Control,
}

impl AssignOp {
    pub const fn as_symbol(self) -> &'static str {
        match self {
            Self::Constant => "<-",
            Self::Deterministic => ":=",
            Self::Reference => "<-&",
            Self::Stochastic => "~",
            Self::Control => "=",
        }
    }
}

/// How a user-function parameter receives its argument.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ParamMode {
    /// `Real x`: a private copy.
    #[default]
    Value,
    /// `Real <-& x`: the caller's variable itself.
    Reference,
    /// `const Real x`: the caller's variable, read only.
    ConstReference,
}
