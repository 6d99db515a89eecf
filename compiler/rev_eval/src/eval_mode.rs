//! Evaluation modes.
//!
//! The same expression evaluates differently depending on what consumes it.
//! The right-hand side of `<-`, an index or a control assignment wants data
//! now ([`EvalMode::Value`]); the right-hand side of `:=` or `~` wants a
//! graph that stays connected to the variables it reads
//! ([`EvalMode::Reactive`]). Policy decisions go through the methods below
//! rather than matching on the mode at each use site.

use crate::function::FunctionKind;

/// Evaluation mode of one (sub-)expression.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum EvalMode {
    /// Resolve to plain data, dropping links to the variables read.
    #[default]
    Value,
    /// Keep a dependency edge to every variable read.
    Reactive,
}

impl EvalMode {
    /// Whether evaluation records the variables it reads.
    #[inline]
    pub fn links_dependencies(self) -> bool {
        matches!(self, Self::Reactive)
    }

    /// Whether conversions that can reject a value (`Real` to `RealPos`)
    /// may be applied to a non-constant argument.
    ///
    /// Only in value mode: the conversion is applied once, to the data at
    /// hand, rather than on every future recomputation.
    #[inline]
    pub fn allows_value_dependent_conversion(self) -> bool {
        matches!(self, Self::Value)
    }

    /// Whether a call to a function of `kind` runs now or becomes a
    /// deterministic node.
    #[inline]
    pub fn executes_immediately(self, kind: FunctionKind) -> bool {
        match self {
            Self::Value => true,
            Self::Reactive => !matches!(kind, FunctionKind::Pure),
        }
    }

    /// Whether workspace (control) variables are read as detached constants.
    #[inline]
    pub fn detaches_workspace_variables(self) -> bool {
        matches!(self, Self::Reactive)
    }
}
