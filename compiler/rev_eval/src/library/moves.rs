//! Moves and monitors.
//!
//! Both are plain argument holders as far as the evaluator is concerned:
//! their constructors keep the bound variables linked, and every argument
//! is reachable as a member (`mv.lambda`, `mn.printgen`).

use std::fmt;
use std::rc::Rc;

use crate::arguments::{ArgumentRule, ArgumentRules, BoundArguments};
use crate::function::{CallContext, Function, FunctionKind};
use crate::registry::RegistryBuilder;
use crate::types::{TypeId, TypeTable};
use crate::value::{ObjectValue, PluginObject};
use crate::{EvalResult, SharedVariable, Value};

fn member(arguments: &BoundArguments, name: &str) -> Option<SharedVariable> {
    arguments.by_label(name).map(|arg| arg.variable.clone())
}

fn fmt_arguments(name: &str, arguments: &BoundArguments, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{name}(")?;
    for (i, arg) in arguments.fixed().iter().chain(arguments.variadic()).enumerate() {
        if i > 0 {
            write!(f, ", ")?;
        }
        if arg.variable.is_named() {
            write!(f, "{} = {}", arg.label, arg.variable.name())?;
        } else {
            write!(f, "{} = {}", arg.label, arg.variable.content())?;
        }
    }
    write!(f, ")")
}

/// An MCMC proposal on one stochastic variable.
pub struct MoveObject {
    name: &'static str,
    type_id: TypeId,
    arguments: BoundArguments,
}

impl MoveObject {
    /// The stochastic variable this move proposes new values for.
    pub fn target(&self) -> &SharedVariable {
        self.arguments.get(0)
    }
}

impl PluginObject for MoveObject {
    fn type_id(&self) -> TypeId {
        self.type_id
    }

    fn member(&self, name: &str) -> Option<SharedVariable> {
        member(&self.arguments, name)
    }

    fn member_names(&self) -> Vec<&'static str> {
        self.arguments.fixed().iter().map(|arg| arg.label).collect()
    }

    fn fmt_display(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt_arguments(self.name, &self.arguments, f)
    }
}

/// A monitor over a list of variables.
pub struct MonitorObject {
    name: &'static str,
    type_id: TypeId,
    arguments: BoundArguments,
}

impl MonitorObject {
    /// Monitored variables, in the order supplied.
    pub fn variables(&self) -> impl Iterator<Item = &SharedVariable> {
        self.arguments.variadic().iter().map(|arg| &arg.variable)
    }
}

impl PluginObject for MonitorObject {
    fn type_id(&self) -> TypeId {
        self.type_id
    }

    fn member(&self, name: &str) -> Option<SharedVariable> {
        member(&self.arguments, name)
    }

    fn member_names(&self) -> Vec<&'static str> {
        self.arguments.fixed().iter().map(|arg| arg.label).collect()
    }

    fn fmt_display(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt_arguments(self.name, &self.arguments, f)
    }
}

type Build = fn(&'static str, TypeId, BoundArguments) -> ObjectValue;

/// Constructor of a move or monitor.
struct ObjectConstructor {
    name: &'static str,
    rules: ArgumentRules,
    type_id: TypeId,
    build: Build,
}

impl Function for ObjectConstructor {
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

    fn execute(&self, args: &BoundArguments, _: &mut CallContext<'_>) -> EvalResult<Value> {
        Ok(Value::Object((self.build)(self.name, self.type_id, args.clone())))
    }
}

impl fmt::Debug for ObjectConstructor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObjectConstructor")
            .field("name", &self.name)
            .field("type_id", &self.type_id)
            .finish_non_exhaustive()
    }
}

fn build_move(name: &'static str, type_id: TypeId, arguments: BoundArguments) -> ObjectValue {
    ObjectValue::new(MoveObject {
        name,
        type_id,
        arguments,
    })
}

fn build_monitor(name: &'static str, type_id: TypeId, arguments: BoundArguments) -> ObjectValue {
    ObjectValue::new(MonitorObject {
        name,
        type_id,
        arguments,
    })
}

pub(super) fn register(registry: &mut RegistryBuilder) -> EvalResult<()> {
    use TypeId as T;

    let one = || Value::RealPos(1.0);
    let table: [(&'static str, &str, TypeId, Vec<ArgumentRule>, Build); 3] = [
        (
            "mvScale",
            "Move_scale",
            T::MOVE,
            vec![
                ArgumentRule::new("x", T::REAL_POS).by_reference().stochastic(),
                ArgumentRule::new("lambda", T::REAL_POS).with_default(one()),
                ArgumentRule::new("weight", T::REAL_POS).with_default(one()),
            ],
            build_move,
        ),
        (
            "mvSlide",
            "Move_slide",
            T::MOVE,
            vec![
                ArgumentRule::new("x", T::REAL).by_reference().stochastic(),
                ArgumentRule::new("delta", T::REAL_POS).with_default(one()),
                ArgumentRule::new("weight", T::REAL_POS).with_default(one()),
            ],
            build_move,
        ),
        (
            "mnScreen",
            "Monitor_screen",
            T::MONITOR,
            vec![
                ArgumentRule::new("printgen", T::NATURAL).with_default(Value::Natural(1)),
                ArgumentRule::new("x", T::OBJECT).by_reference().variadic(),
            ],
            build_monitor,
        ),
    ];

    for (name, type_name, parent, rules, build) in table {
        let type_id = registry.register_type(type_name, parent)?;
        registry.add_function(Rc::new(ObjectConstructor {
            name,
            rules: ArgumentRules::new(rules),
            type_id,
            build,
        }))?;
    }
    Ok(())
}
