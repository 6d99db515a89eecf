//! Distribution constructors.
//!
//! `dnorm(mu, 1)` builds a [`DistributionObject`] holding the bound argument
//! variables, not their values. A stochastic node drawn from it therefore
//! has the argument variables as parents. The starting value of a fresh
//! node is the distribution's central value; nothing is sampled.

use std::fmt;
use std::rc::Rc;

use crate::arguments::{ArgumentRule, ArgumentRules, BoundArguments};
use crate::function::{CallContext, Function, FunctionKind};
use crate::library::real_arg;
use crate::registry::RegistryBuilder;
use crate::runtime::Runtime;
use crate::types::{TypeId, TypeTable};
use crate::value::{Distribution, ObjectValue, PluginObject};
use crate::{EvalResult, SharedVariable, Value};

/// Starting value computed from the current parameter values.
type InitialValue = fn(&BoundArguments, &TypeTable) -> EvalResult<Value>;

/// A distribution with linked parameters.
pub struct DistributionObject {
    name: &'static str,
    type_id: TypeId,
    value_type: TypeId,
    parameters: BoundArguments,
    initial: InitialValue,
    runtime: Runtime,
}

impl PluginObject for DistributionObject {
    fn type_id(&self) -> TypeId {
        self.type_id
    }

    fn member(&self, name: &str) -> Option<SharedVariable> {
        self.parameters
            .by_label(name)
            .map(|parameter| parameter.variable.clone())
    }

    fn member_names(&self) -> Vec<&'static str> {
        self.parameters.fixed().iter().map(|parameter| parameter.label).collect()
    }

    fn as_distribution(&self) -> Option<&dyn Distribution> {
        Some(self)
    }

    fn fmt_display(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}(", self.name)?;
        for (i, parameter) in self.parameters.fixed().iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{} = {}", parameter.label, parameter.variable.content())?;
        }
        write!(f, ")")
    }
}

impl Distribution for DistributionObject {
    fn name(&self) -> &str {
        self.name
    }

    fn value_type(&self) -> TypeId {
        self.value_type
    }

    fn parameters(&self) -> &BoundArguments {
        &self.parameters
    }

    fn initial_value(&self) -> EvalResult<Value> {
        (self.initial)(&self.parameters, self.runtime.types())
    }
}

/// The `dnorm`-style function that builds a [`DistributionObject`].
struct DistributionConstructor {
    name: &'static str,
    rules: ArgumentRules,
    type_id: TypeId,
    value_type: TypeId,
    initial: InitialValue,
}

impl Function for DistributionConstructor {
    fn name(&self) -> &str {
        self.name
    }

    fn rules(&self) -> &ArgumentRules {
        &self.rules
    }

    fn return_type(&self, _: &BoundArguments, _: &TypeTable) -> TypeId {
        self.type_id
    }

    fn kind(&self) -> FunctionKind {
        FunctionKind::Constructor
    }

    fn execute(&self, args: &BoundArguments, ctx: &mut CallContext<'_>) -> EvalResult<Value> {
        Ok(Value::Object(ObjectValue::new(DistributionObject {
            name: self.name,
            type_id: self.type_id,
            value_type: self.value_type,
            parameters: args.clone(),
            initial: self.initial,
            runtime: ctx.runtime().clone(),
        })))
    }
}

impl fmt::Debug for DistributionConstructor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DistributionConstructor")
            .field("name", &self.name)
            .field("type_id", &self.type_id)
            .finish_non_exhaustive()
    }
}

fn normal_mean(args: &BoundArguments, types: &TypeTable) -> EvalResult<Value> {
    Ok(Value::Real(real_arg(args, 0, types)?))
}

fn exponential_mean(args: &BoundArguments, types: &TypeTable) -> EvalResult<Value> {
    Ok(Value::RealPos(1.0 / real_arg(args, 0, types)?))
}

fn uniform_midpoint(args: &BoundArguments, types: &TypeTable) -> EvalResult<Value> {
    let (lower, upper) = (real_arg(args, 0, types)?, real_arg(args, 1, types)?);
    Ok(Value::Real((lower + upper) / 2.0))
}

fn beta_mean(args: &BoundArguments, types: &TypeTable) -> EvalResult<Value> {
    let (alpha, beta) = (real_arg(args, 0, types)?, real_arg(args, 1, types)?);
    Ok(Value::Probability(alpha / (alpha + beta)))
}

pub(super) fn register(registry: &mut RegistryBuilder) -> EvalResult<()> {
    use TypeId as T;

    let table: [(&'static str, &str, Vec<ArgumentRule>, TypeId, InitialValue); 4] = [
        (
            "dnorm",
            "Dist_norm",
            vec![ArgumentRule::new("mean", T::REAL), ArgumentRule::new("sd", T::REAL_POS)],
            T::REAL,
            normal_mean,
        ),
        (
            "dexp",
            "Dist_exp",
            vec![ArgumentRule::new("lambda", T::REAL_POS).with_default(Value::RealPos(1.0))],
            T::REAL_POS,
            exponential_mean,
        ),
        (
            "dunif",
            "Dist_unif",
            vec![ArgumentRule::new("lower", T::REAL), ArgumentRule::new("upper", T::REAL)],
            T::REAL,
            uniform_midpoint,
        ),
        (
            "dbeta",
            "Dist_beta",
            vec![ArgumentRule::new("alpha", T::REAL_POS), ArgumentRule::new("beta", T::REAL_POS)],
            T::PROBABILITY,
            beta_mean,
        ),
    ];

    for (name, type_name, rules, value_type, initial) in table {
        let type_id = registry.register_type(type_name, T::DISTRIBUTION)?;
        registry.add_function(Rc::new(DistributionConstructor {
            name,
            rules: ArgumentRules::new(rules),
            type_id,
            value_type,
            initial,
        }))?;
    }
    Ok(())
}
