//! Declared argument rules and the arguments bound to them.
//!
//! Functions declare an ordered [`ArgumentRules`] list. A call site supplies
//! [`Argument`]s (already evaluated variables, optionally labelled);
//! [`matching`] pairs the two and produces [`BoundArguments`], which is all a
//! function body ever sees.

pub mod matching;

use crate::types::TypeId;
use crate::{EvalResult, SharedVariable, Value};

/// How an argument variable reaches the function.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, Default)]
pub enum PassingMode {
    /// The caller's variable, read only. A conversion, if needed, goes
    /// through a helper variable.
    #[default]
    ByConstantReference,
    /// The caller's variable itself; the type must match without conversion.
    ByReference,
    /// A private constant copy.
    ByValue,
}

/// Constraint on the graph role of an argument.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, Default)]
pub enum Stochasticity {
    #[default]
    Any,
    /// Only stochastic nodes.
    Stochastic,
    /// Only deterministic nodes; constants are rejected too.
    Deterministic,
}

impl Stochasticity {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Any => "any",
            Self::Stochastic => "stochastic",
            Self::Deterministic => "deterministic",
        }
    }
}

/// One declared parameter.
#[derive(Clone, Debug)]
pub struct ArgumentRule {
    label: &'static str,
    type_id: TypeId,
    mode: PassingMode,
    stochasticity: Stochasticity,
    default: Option<Value>,
    variadic: bool,
}

impl ArgumentRule {
    pub fn new(label: &'static str, type_id: TypeId) -> Self {
        ArgumentRule {
            label,
            type_id,
            mode: PassingMode::default(),
            stochasticity: Stochasticity::default(),
            default: None,
            variadic: false,
        }
    }

    #[must_use]
    pub fn mode(mut self, mode: PassingMode) -> Self {
        self.mode = mode;
        self
    }

    #[must_use]
    pub fn by_value(self) -> Self {
        self.mode(PassingMode::ByValue)
    }

    #[must_use]
    pub fn by_reference(self) -> Self {
        self.mode(PassingMode::ByReference)
    }

    #[must_use]
    pub fn stochastic(mut self) -> Self {
        self.stochasticity = Stochasticity::Stochastic;
        self
    }

    #[must_use]
    pub fn deterministic(mut self) -> Self {
        self.stochasticity = Stochasticity::Deterministic;
        self
    }

    #[must_use]
    pub fn with_default(mut self, value: Value) -> Self {
        self.default = Some(value);
        self
    }

    /// Consume every argument left over after the other rules.
    #[must_use]
    pub fn variadic(mut self) -> Self {
        self.variadic = true;
        self
    }

    pub fn label(&self) -> &'static str {
        self.label
    }

    pub fn type_id(&self) -> TypeId {
        self.type_id
    }

    pub fn passing_mode(&self) -> PassingMode {
        self.mode
    }

    pub fn stochasticity(&self) -> Stochasticity {
        self.stochasticity
    }

    pub fn default_value(&self) -> Option<&Value> {
        self.default.as_ref()
    }

    pub fn is_variadic(&self) -> bool {
        self.variadic
    }
}

/// Ordered, immutable list of rules.
#[derive(Clone, Debug, Default)]
pub struct ArgumentRules {
    rules: Vec<ArgumentRule>,
}

impl ArgumentRules {
    /// # Panics
    /// Panics if a variadic rule is not the last rule.
    pub fn new(rules: Vec<ArgumentRule>) -> Self {
        let variadic = rules.iter().filter(|rule| rule.variadic).count();
        assert!(
            variadic == 0 || (variadic == 1 && rules.last().is_some_and(|rule| rule.variadic)),
            "only the last argument rule may be variadic"
        );
        ArgumentRules { rules }
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&ArgumentRule> {
        self.rules.get(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ArgumentRule> {
        self.rules.iter()
    }

    /// Rules other than the variadic one, in order.
    pub fn fixed(&self) -> &[ArgumentRule] {
        match self.rules.last() {
            Some(last) if last.variadic => &self.rules[..self.rules.len() - 1],
            _ => &self.rules,
        }
    }

    pub fn variadic(&self) -> Option<&ArgumentRule> {
        self.rules.last().filter(|rule| rule.variadic)
    }

    /// Same labels and types in the same order.
    pub fn same_formals(&self, other: &ArgumentRules) -> bool {
        self.rules.len() == other.rules.len()
            && self
                .rules
                .iter()
                .zip(&other.rules)
                .all(|(a, b)| a.label == b.label && a.type_id == b.type_id && a.variadic == b.variadic)
    }
}

impl<'a> IntoIterator for &'a ArgumentRules {
    type Item = &'a ArgumentRule;
    type IntoIter = std::slice::Iter<'a, ArgumentRule>;

    fn into_iter(self) -> Self::IntoIter {
        self.rules.iter()
    }
}

/// A supplied argument at a call site.
#[derive(Clone, Debug)]
pub struct Argument {
    pub label: Option<&'static str>,
    pub variable: SharedVariable,
}

impl Argument {
    pub fn positional(variable: SharedVariable) -> Self {
        Argument {
            label: None,
            variable,
        }
    }

    pub fn labeled(label: &'static str, variable: SharedVariable) -> Self {
        Argument {
            label: Some(label),
            variable,
        }
    }
}

/// An argument variable bound to a rule.
#[derive(Clone, Debug)]
pub struct BoundArgument {
    pub label: &'static str,
    pub variable: SharedVariable,
    pub mode: PassingMode,
}

/// Arguments bound to a function's rules: one per fixed rule, in rule
/// order, then whatever the variadic rule consumed.
#[derive(Clone, Debug, Default)]
pub struct BoundArguments {
    fixed: Vec<BoundArgument>,
    rest: Vec<BoundArgument>,
}

impl BoundArguments {
    pub fn new(fixed: Vec<BoundArgument>, rest: Vec<BoundArgument>) -> Self {
        BoundArguments { fixed, rest }
    }

    /// Variable bound to the fixed rule at `index`.
    ///
    /// # Panics
    /// Panics if the function has fewer fixed rules.
    pub fn get(&self, index: usize) -> &SharedVariable {
        &self.fixed[index].variable
    }

    /// Current value of the fixed argument at `index`.
    pub fn value(&self, index: usize) -> EvalResult<Value> {
        self.get(index).value()
    }

    pub fn by_label(&self, label: &str) -> Option<&BoundArgument> {
        self.fixed
            .iter()
            .chain(&self.rest)
            .find(|arg| arg.label == label)
    }

    pub fn fixed(&self) -> &[BoundArgument] {
        &self.fixed
    }

    /// Arguments consumed by the variadic rule.
    pub fn variadic(&self) -> &[BoundArgument] {
        &self.rest
    }

    /// Current values of the variadic arguments.
    pub fn variadic_values(&self) -> EvalResult<Vec<Value>> {
        self.rest.iter().map(|arg| arg.variable.value()).collect()
    }

    /// Every bound variable, fixed first.
    pub fn variables(&self) -> impl Iterator<Item = &SharedVariable> {
        self.fixed
            .iter()
            .chain(&self.rest)
            .map(|arg| &arg.variable)
    }

    pub fn len(&self) -> usize {
        self.fixed.len() + self.rest.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fixed.is_empty() && self.rest.is_empty()
    }
}
