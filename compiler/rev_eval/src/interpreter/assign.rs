//! The assignment forms.
//!
//! All five share target resolution: the left-hand side names a variable,
//! optionally a member of a plugin object, optionally followed by indices
//! that address element variables of a vector variable. Index expressions
//! on the left are evaluated before the right-hand side; the target slot
//! itself is created only once the right-hand side has evaluated.
//!
//! | form  | right-hand side | slot content                    |
//! |-------|-----------------|---------------------------------|
//! | `<-`  | value mode      | detached constant               |
//! | `:=`  | reactive mode   | deterministic node              |
//! | `~`   | reactive mode   | stochastic node                 |
//! | `<-&` | value mode      | alias of the referenced variable |
//! | `=`   | value mode      | workspace constant              |

use rev_ir::{AssignOp, ExprId, ExprKind, Name};
use smallvec::SmallVec;

use crate::errors::{
    alias_cycle, cyclic_dependency, illegal_assignment_target, masks_function, type_mismatch,
    variable_type_mismatch,
};
use crate::eval_mode::EvalMode;
use crate::graph::{GraphNode, NodeVariant, Recipe};
use crate::interpreter::{one_based_position, Interpreter};
use crate::value::ObjectValue;
use crate::variable::{coerce_to, VariableKind};
use crate::{EvalResult, SharedVariable, Value};

/// Left-hand side with its indices already evaluated.
struct TargetPath {
    name: Name,
    text: &'static str,
    receiver: Option<SharedVariable>,
    /// Zero-based element positions, outermost first.
    positions: SmallVec<[usize; 2]>,
}

impl TargetPath {
    fn is_plain_name(&self) -> bool {
        self.receiver.is_none() && self.positions.is_empty()
    }
}

/// The slot an assignment writes, plus the vector variables that own it.
struct Target {
    variable: SharedVariable,
    /// Outermost first.
    owners: Vec<SharedVariable>,
}

impl Interpreter<'_> {
    #[tracing::instrument(level = "debug", skip(self))]
    pub(super) fn eval_assign(
        &mut self,
        op: AssignOp,
        target: ExprId,
        value: ExprId,
    ) -> EvalResult<SharedVariable> {
        let path = self.target_path(target)?;
        match op {
            AssignOp::Constant => self.assign_constant(&path, value),
            AssignOp::Deterministic => self.assign_deterministic(&path, value),
            AssignOp::Stochastic => self.assign_stochastic(&path, value),
            AssignOp::Reference => self.assign_reference(&path, value),
            AssignOp::Control => self.assign_control(&path, value),
        }
    }

    fn target_path(&mut self, target: ExprId) -> EvalResult<TargetPath> {
        let arena = self.arena.clone();
        let ExprKind::Variable(reference) = arena.get(target) else {
            return Err(illegal_assignment_target(&self.describe(target)));
        };
        let text = self.text(reference.name);
        let receiver = match reference.base {
            Some(base) => Some(self.eval(base, EvalMode::Value)?),
            None => None,
        };
        let mut positions = SmallVec::with_capacity(reference.indices.len());
        let mut display = text.to_string();
        for &index in &reference.indices {
            let index = self.eval(index, EvalMode::Value)?.value()?;
            let position = one_based_position(&display, &index, self.types())?;
            display = format!("{display}[{}]", position + 1);
            positions.push(position);
        }
        Ok(TargetPath {
            name: reference.name,
            text,
            receiver,
            positions,
        })
    }

    /// Create (or find) the slot `path` names.
    fn bind_target(&mut self, path: &TargetPath) -> EvalResult<Target> {
        let root = match &path.receiver {
            Some(receiver) => self.member(receiver, path.text)?,
            None => self.env.declare_variable(path.name, path.text),
        };
        let mut owners = Vec::with_capacity(path.positions.len());
        let mut current = root;
        for &position in &path.positions {
            let owner = current.resolve();
            owner.make_vector_variable(self.types())?;
            current = owner.ensure_element(position);
            owners.push(owner);
        }
        Ok(Target {
            variable: current,
            owners,
        })
    }

    /// Replacing a function's name with a non-function value is not allowed.
    fn check_masking(&self, path: &TargetPath, value: &Value) -> EvalResult<()> {
        if path.is_plain_name()
            && !matches!(value, Value::Function(_))
            && self.runtime.registry().functions().contains(path.text)
        {
            return Err(masks_function(path.text));
        }
        Ok(())
    }

    /// Gather the elements of each owner, innermost first, into its content.
    fn rebuild_collections(&self, owners: &[SharedVariable]) {
        for owner in owners.iter().rev() {
            let elements = owner.elements().unwrap_or_default();
            let elem = self
                .types()
                .common_element_type(elements.iter().flatten().map(SharedVariable::type_id));
            let node = GraphNode::deterministic(
                Recipe::Collect {
                    owner: owner.name(),
                    elements,
                },
                elem.vector_of(),
                self.runtime.clone(),
            );
            owner.set_collection(node.clone());
            node.register_with_parents();
        }
    }

    /// `lhs <- rhs`
    #[tracing::instrument(level = "debug", skip_all, fields(target = path.text))]
    fn assign_constant(&mut self, path: &TargetPath, rhs: ExprId) -> EvalResult<SharedVariable> {
        let value = self.eval(rhs, EvalMode::Value)?.value()?;
        self.check_masking(path, &value)?;
        let target = self.bind_target(path)?;
        let value = coerce_to(
            &target.variable.name(),
            value,
            target.variable.required_type(),
            self.types(),
        )?;
        target
            .variable
            .replace_content(value, VariableKind::Ordinary);
        self.rebuild_collections(&target.owners);
        Ok(target.variable)
    }

    /// `lhs := rhs`
    #[tracing::instrument(level = "debug", skip_all, fields(target = path.text))]
    fn assign_deterministic(&mut self, path: &TargetPath, rhs: ExprId) -> EvalResult<SharedVariable> {
        let rhs = self.eval(rhs, EvalMode::Reactive)?;
        self.check_masking(path, &rhs.content())?;
        let target = self.bind_target(path)?;
        check_cycle(&target, |candidate| {
            rhs.ptr_eq(candidate) || rhs.depends_on(candidate)
        })?;

        let node = self.deterministic_node(&rhs);
        let node = self.fit_required_type(&target.variable, node)?;
        target
            .variable
            .replace_content(Value::Node(node.clone()), VariableKind::Ordinary);
        node.register_with_parents();
        self.rebuild_collections(&target.owners);
        Ok(target.variable)
    }

    /// Node whose value follows `rhs`.
    ///
    /// A named variable is referenced (`b := a`); an anonymous result that
    /// is already a deterministic node is used as is; a constant is lifted.
    fn deterministic_node(&self, rhs: &SharedVariable) -> GraphNode {
        if rhs.is_named() && !rhs.is_hidden() {
            return GraphNode::deterministic(
                Recipe::Reference(rhs.clone()),
                rhs.type_id(),
                self.runtime.clone(),
            );
        }
        match rhs.content() {
            Value::Node(node) if node.variant() == NodeVariant::Deterministic => node,
            Value::Node(node) => GraphNode::deterministic(
                Recipe::Reference(rhs.clone()),
                node.type_id(),
                self.runtime.clone(),
            ),
            other => {
                let ty = other.type_id();
                GraphNode::deterministic(Recipe::Lift(other), ty, self.runtime.clone())
            }
        }
    }

    /// Wrap `node` in a conversion if the variable requires a type the node
    /// reaches only by conversion.
    fn fit_required_type(&self, variable: &SharedVariable, node: GraphNode) -> EvalResult<GraphNode> {
        let types = self.types();
        let required = variable.required_type();
        let found = node.type_id();
        if types.is_derived_from(found, required) {
            return Ok(node);
        }
        if types.find_conversion(found, required, false).is_some() {
            let source = SharedVariable::hidden(variable.name(), Value::Node(node));
            return Ok(GraphNode::deterministic(
                Recipe::Convert {
                    source,
                    target: required,
                },
                required,
                self.runtime.clone(),
            ));
        }
        Err(variable_type_mismatch(
            &variable.name(),
            types.name(found),
            types.name(required),
        ))
    }

    /// `lhs ~ rhs`
    #[tracing::instrument(level = "debug", skip_all, fields(target = path.text))]
    fn assign_stochastic(&mut self, path: &TargetPath, rhs: ExprId) -> EvalResult<SharedVariable> {
        let content = self.eval(rhs, EvalMode::Reactive)?.value()?;
        let Some(distribution) = as_distribution_object(&content) else {
            let found = self.types().name(content.type_id());
            return Err(type_mismatch("Distribution", found).with_message(format!(
                "the right-hand side of '~' for '{}' must be a distribution, found {found}",
                path.text
            )));
        };
        let target = self.bind_target(path)?;
        if let Some(dist) = distribution.as_distribution() {
            check_cycle(&target, |candidate| {
                dist.parameters()
                    .variables()
                    .any(|param| param.ptr_eq(candidate) || param.depends_on(candidate))
            })?;
        }

        let node = GraphNode::stochastic(distribution)?;
        let types = self.types();
        let required = target.variable.required_type();
        if !types.is_derived_from(node.type_id(), required) {
            return Err(variable_type_mismatch(
                &target.variable.name(),
                types.name(node.type_id()),
                types.name(required),
            ));
        }
        target
            .variable
            .replace_content(Value::Node(node.clone()), VariableKind::Ordinary);
        node.register_with_parents();
        self.rebuild_collections(&target.owners);
        Ok(target.variable)
    }

    /// `lhs <-& rhs`
    #[tracing::instrument(level = "debug", skip_all, fields(target = path.text))]
    fn assign_reference(&mut self, path: &TargetPath, rhs: ExprId) -> EvalResult<SharedVariable> {
        let referenced = self.eval(rhs, EvalMode::Value)?;
        if !referenced.is_named() || referenced.is_hidden() {
            return Err(illegal_assignment_target(path.text).with_message(format!(
                "cannot make '{}' a reference to {}: only variables can be referenced",
                path.text,
                self.describe(rhs)
            )));
        }
        self.check_masking(path, &referenced.content())?;
        let target = self.bind_target(path)?;
        if referenced.aliases(&target.variable) {
            return Err(alias_cycle(&target.variable.name(), &referenced.name()));
        }
        let types = self.types();
        let required = target.variable.required_type();
        let found = referenced.type_id();
        if !types.is_derived_from(found, required) {
            target
                .variable
                .set_required_type(types.common_ancestor(required, found));
        }
        target.variable.make_reference(referenced);
        self.rebuild_collections(&target.owners);
        Ok(target.variable)
    }

    /// `lhs = rhs`
    #[tracing::instrument(level = "debug", skip_all, fields(target = path.text))]
    fn assign_control(&mut self, path: &TargetPath, rhs: ExprId) -> EvalResult<SharedVariable> {
        let value = self.eval(rhs, EvalMode::Value)?.value()?;
        self.check_masking(path, &value)?;
        let target = self.bind_target(path)?;
        target
            .variable
            .replace_content(value, VariableKind::Workspace);
        self.rebuild_collections(&target.owners);
        Ok(target.variable)
    }
}

fn as_distribution_object(value: &Value) -> Option<ObjectValue> {
    value
        .as_object()
        .filter(|object| object.as_distribution().is_some())
        .cloned()
}

/// Fail if the new content would read the target or one of its owners.
fn check_cycle(target: &Target, reads: impl Fn(&SharedVariable) -> bool) -> EvalResult<()> {
    let cyclic = reads(&target.variable) || target.owners.iter().any(&reads);
    if cyclic {
        return Err(cyclic_dependency(&target.variable.name()));
    }
    Ok(())
}
