//! Pairing supplied arguments with declared rules.
//!
//! Matching runs in two phases. [`match_arguments`] decides which supplied
//! argument fills which rule and whether it needs a conversion, without
//! touching any variable. [`bind`] then builds the variables the function
//! sees. Overload resolution only binds the overload that matched, so a
//! failed attempt leaves no side effects.
//!
//! Rules are filled by, in order: an exact label, a unique label prefix
//! among still-unfilled rules, the next positional argument, the rule's
//! default. A trailing variadic rule takes everything left over.

use std::fmt::Write as _;

use crate::arguments::{
    Argument, ArgumentRule, ArgumentRules, BoundArgument, BoundArguments, PassingMode,
    Stochasticity,
};
use crate::errors::{
    argument_type_mismatch, missing_argument, no_matching_overload, stochasticity_mismatch,
    unexpected_argument,
};
use crate::eval_mode::EvalMode;
use crate::function::FunctionRef;
use crate::graph::{GraphNode, NodeVariant, Recipe};
use crate::runtime::Runtime;
use crate::types::{ConversionKind, TypeTable};
use crate::{EvalError, EvalResult, SharedVariable, Value};

/// Why one overload rejected the supplied arguments.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum MatchFailure {
    #[error("missing argument '{label}'")]
    Missing { label: &'static str },
    #[error("unexpected argument {argument}")]
    Unexpected { argument: String },
    #[error("argument '{label}' expects {expected}, found {found}")]
    Type {
        label: &'static str,
        expected: String,
        found: String,
    },
    #[error("argument '{label}' must be {required}, found {found}")]
    Stochasticity {
        label: &'static str,
        required: &'static str,
        found: &'static str,
    },
}

impl MatchFailure {
    /// Evaluation error reporting this failure for a call to `function`.
    pub fn into_error(self, function: &str) -> EvalError {
        match self {
            MatchFailure::Missing { label } => missing_argument(function, label),
            MatchFailure::Unexpected { argument } => unexpected_argument(function, &argument),
            MatchFailure::Type {
                label,
                expected,
                found,
            } => argument_type_mismatch(function, label, &expected, &found),
            MatchFailure::Stochasticity {
                label,
                required,
                found,
            } => stochasticity_mismatch(function, label, required, found),
        }
    }
}

/// How a matched argument reaches its rule's type.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum Coercion {
    /// Already the rule's type or a subtype.
    Direct,
    /// Needs a registered conversion.
    Convert,
}

#[derive(Copy, Clone, Eq, PartialEq, Debug)]
enum Source {
    Supplied { index: usize, coercion: Coercion },
    Default,
}

/// Outcome of a successful match, before binding.
#[derive(Clone, Debug)]
pub struct MatchPlan {
    fixed: Vec<Source>,
    rest: Vec<(usize, Coercion)>,
}

impl MatchPlan {
    /// Supplied-argument index and coercion for each fixed rule; `None`
    /// where the default is used.
    pub fn fixed_sources(&self) -> impl Iterator<Item = Option<(usize, Coercion)>> + '_ {
        self.fixed.iter().map(|source| match *source {
            Source::Supplied { index, coercion } => Some((index, coercion)),
            Source::Default => None,
        })
    }

    /// Supplied-argument indices taken by the variadic rule.
    pub fn variadic_sources(&self) -> impl Iterator<Item = (usize, Coercion)> + '_ {
        self.rest.iter().copied()
    }
}

/// Decide how `args` fill `rules`.
pub fn match_arguments(
    rules: &ArgumentRules,
    args: &[Argument],
    types: &TypeTable,
    mode: EvalMode,
) -> Result<MatchPlan, MatchFailure> {
    let fixed = rules.fixed();
    let mut slots: Vec<Option<usize>> = vec![None; fixed.len()];
    let mut taken = vec![false; args.len()];

    // Exact labels.
    for (index, arg) in args.iter().enumerate() {
        let Some(label) = arg.label else { continue };
        if let Some(rule) = fixed.iter().position(|rule| rule.label() == label) {
            if slots[rule].is_none() {
                slots[rule] = Some(index);
                taken[index] = true;
            }
        }
    }

    // Unique prefixes among the rules still open.
    for (index, arg) in args.iter().enumerate() {
        if taken[index] {
            continue;
        }
        let Some(label) = arg.label else { continue };
        let candidates: Vec<usize> = fixed
            .iter()
            .enumerate()
            .filter(|(rule, candidate)| slots[*rule].is_none() && candidate.label().starts_with(label))
            .map(|(rule, _)| rule)
            .collect();
        if let [rule] = candidates[..] {
            slots[rule] = Some(index);
            taken[index] = true;
        }
    }

    // Positionals, in rule order.
    let mut positionals = args
        .iter()
        .enumerate()
        .filter(|(_, arg)| arg.label.is_none())
        .map(|(index, _)| index);
    for slot in &mut slots {
        if slot.is_some() {
            continue;
        }
        if let Some(index) = positionals.next() {
            *slot = Some(index);
            taken[index] = true;
        }
    }

    for (slot, rule) in slots.iter().zip(fixed) {
        if slot.is_none() && rule.default_value().is_none() {
            return Err(MatchFailure::Missing {
                label: rule.label(),
            });
        }
    }

    let leftovers: Vec<usize> = (0..args.len()).filter(|&index| !taken[index]).collect();
    let rest = match rules.variadic() {
        Some(rule) => leftovers
            .iter()
            .map(|&index| Ok((index, check(rule, &args[index].variable, types, mode)?)))
            .collect::<Result<Vec<_>, MatchFailure>>()?,
        None => {
            if let Some(&index) = leftovers.first() {
                return Err(MatchFailure::Unexpected {
                    argument: describe_argument(&args[index], index),
                });
            }
            Vec::new()
        }
    };

    let fixed = slots
        .iter()
        .zip(fixed)
        .map(|(slot, rule)| match *slot {
            Some(index) => Ok(Source::Supplied {
                index,
                coercion: check(rule, &args[index].variable, types, mode)?,
            }),
            None => Ok(Source::Default),
        })
        .collect::<Result<Vec<_>, MatchFailure>>()?;

    tracing::trace!(rules = rules.len(), args = args.len(), "arguments matched");
    Ok(MatchPlan { fixed, rest })
}

/// Check one argument against one rule.
fn check(
    rule: &ArgumentRule,
    variable: &SharedVariable,
    types: &TypeTable,
    mode: EvalMode,
) -> Result<Coercion, MatchFailure> {
    let variant = variable.variant();
    let violates = match rule.stochasticity() {
        Stochasticity::Any => false,
        Stochasticity::Stochastic => variant != NodeVariant::Stochastic,
        Stochasticity::Deterministic => variant != NodeVariant::Deterministic,
    };
    if violates {
        return Err(MatchFailure::Stochasticity {
            label: rule.label(),
            required: rule.stochasticity().as_str(),
            found: variant.as_str(),
        });
    }

    let found = variable.type_id();
    if types.is_derived_from(found, rule.type_id()) {
        return Ok(Coercion::Direct);
    }

    let mismatch = || MatchFailure::Type {
        label: rule.label(),
        expected: types.name(rule.type_id()).to_string(),
        found: types.name(found).to_string(),
    };

    if rule.passing_mode() == PassingMode::ByReference {
        return Err(mismatch());
    }

    let once = mode.allows_value_dependent_conversion() || variant == NodeVariant::Constant;
    match types.find_conversion(found, rule.type_id(), once) {
        Some(conversion) if conversion.kind == ConversionKind::Always => Ok(Coercion::Convert),
        Some(conversion) => {
            let converts = variable
                .value()
                .ok()
                .and_then(|value| conversion.apply(&value))
                .is_some();
            if converts {
                Ok(Coercion::Convert)
            } else {
                Err(mismatch())
            }
        }
        None => Err(mismatch()),
    }
}

fn describe_argument(arg: &Argument, index: usize) -> String {
    match arg.label {
        Some(label) => format!("'{label}'"),
        None => format!("#{}", index + 1),
    }
}

/// `Real, sd=RealPos` style summary of supplied argument types.
pub fn describe_arguments(args: &[Argument], types: &TypeTable) -> String {
    let mut out = String::new();
    for (i, arg) in args.iter().enumerate() {
        if i > 0 {
            out.push_str(", ");
        }
        if let Some(label) = arg.label {
            let _ = write!(out, "{label}=");
        }
        out.push_str(types.name(arg.variable.type_id()));
    }
    out
}

/// Build the variables a function sees from a successful plan.
pub fn bind(
    plan: &MatchPlan,
    rules: &ArgumentRules,
    args: &[Argument],
    runtime: &Runtime,
    mode: EvalMode,
) -> EvalResult<BoundArguments> {
    let fixed = rules
        .fixed()
        .iter()
        .zip(&plan.fixed)
        .map(|(rule, source)| {
            let variable = match *source {
                Source::Supplied { index, coercion } => {
                    bind_variable(rule, &args[index].variable, coercion, runtime, mode)?
                }
                Source::Default => {
                    SharedVariable::anonymous(rule.default_value().cloned().unwrap_or(Value::Null))
                }
            };
            Ok(BoundArgument {
                label: rule.label(),
                variable,
                mode: rule.passing_mode(),
            })
        })
        .collect::<EvalResult<Vec<_>>>()?;

    let rest = match rules.variadic() {
        Some(rule) => plan
            .rest
            .iter()
            .map(|&(index, coercion)| {
                let arg = &args[index];
                Ok(BoundArgument {
                    label: arg.label.unwrap_or(rule.label()),
                    variable: bind_variable(rule, &arg.variable, coercion, runtime, mode)?,
                    mode: rule.passing_mode(),
                })
            })
            .collect::<EvalResult<Vec<_>>>()?,
        None => Vec::new(),
    };

    Ok(BoundArguments::new(fixed, rest))
}

fn bind_variable(
    rule: &ArgumentRule,
    variable: &SharedVariable,
    coercion: Coercion,
    runtime: &Runtime,
    mode: EvalMode,
) -> EvalResult<SharedVariable> {
    let types = runtime.types();
    // In reactive mode a by-value argument stays linked; the function
    // copies it when it runs.
    let copies_now = rule.passing_mode() == PassingMode::ByValue && !mode.links_dependencies();
    match (rule.passing_mode(), coercion) {
        (PassingMode::ByValue, coercion) if copies_now => {
            let value = variable.value()?;
            let value = match coercion {
                Coercion::Direct => value,
                Coercion::Convert => value.convert_to(rule.type_id(), types)?,
            };
            Ok(SharedVariable::anonymous(value))
        }
        (_, Coercion::Direct) => {
            if mode.links_dependencies() && variable.is_named() {
                variable.narrow_required_type(rule.type_id(), types);
            }
            Ok(variable.clone())
        }
        (_, Coercion::Convert) => {
            if mode.links_dependencies() && (variable.is_named() || !variable.is_constant()) {
                let node = GraphNode::deterministic(
                    Recipe::Convert {
                        source: variable.clone(),
                        target: rule.type_id(),
                    },
                    rule.type_id(),
                    runtime.clone(),
                );
                Ok(SharedVariable::hidden(variable.name(), Value::Node(node)))
            } else {
                let value = variable.value()?.convert_to(rule.type_id(), types)?;
                Ok(SharedVariable::anonymous(value))
            }
        }
    }
}

/// Pick the first overload whose rules accept `args`.
///
/// Overloads are tried in declaration order; no ranking by specificity.
/// With a single overload its own failure is reported, otherwise a
/// summary of the supplied argument types.
pub fn resolve_overload<'f>(
    name: &str,
    overloads: &'f [FunctionRef],
    args: &[Argument],
    types: &TypeTable,
    mode: EvalMode,
) -> EvalResult<(&'f FunctionRef, MatchPlan)> {
    let mut first_failure = None;
    for (position, function) in overloads.iter().enumerate() {
        match match_arguments(function.rules(), args, types, mode) {
            Ok(plan) => {
                tracing::debug!(function = name, overload = position, "overload selected");
                return Ok((function, plan));
            }
            Err(failure) => {
                tracing::trace!(function = name, overload = position, %failure, "overload rejected");
                first_failure.get_or_insert(failure);
            }
        }
    }
    match first_failure {
        Some(failure) if overloads.len() == 1 => Err(failure.into_error(name)),
        _ => Err(no_matching_overload(name, &describe_arguments(args, types))),
    }
}
