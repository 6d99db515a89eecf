//! Graph nodes behind non-constant values.
//!
//! A deterministic node stores a recipe over input *variables*, not over
//! their values, so rebinding an input (`a <- 7`) is visible to every node
//! that reads `a`. Recomputation is pull-based: every variable write takes
//! a fresh version from a process-wide clock, a node's stamp is the largest
//! version among its inputs, and the cached value is reused while the stamp
//! is unchanged.
//!
//! Stochastic nodes hold a distribution object and a current value. Their
//! value changes only through `set_value`/`clamp`, never by recomputation.

use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};
use std::sync::atomic::{AtomicU64, Ordering};

use rev_stack::ensure_sufficient_stack;

use crate::arguments::BoundArguments;
use crate::errors::{not_settable, type_mismatch, unassigned_element};
use crate::function::{CallContext, FunctionRef};
use crate::runtime::Runtime;
use crate::types::{TypeId, TypeTable};
use crate::value::ObjectValue;
use crate::{EvalResult, SharedVariable, Value};

static CLOCK: AtomicU64 = AtomicU64::new(1);

/// Next write version. Strictly increasing for the life of the process.
pub(crate) fn next_version() -> u64 {
    CLOCK.fetch_add(1, Ordering::Relaxed)
}

/// Role of a value in the model graph.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum NodeVariant {
    /// Plain data.
    Constant,
    /// Computed from other variables.
    Deterministic,
    /// Drawn from a distribution.
    Stochastic,
}

impl NodeVariant {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Constant => "constant",
            Self::Deterministic => "deterministic",
            Self::Stochastic => "stochastic",
        }
    }
}

impl fmt::Display for NodeVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How a deterministic node computes its value.
pub enum Recipe {
    /// A pure function applied to bound arguments.
    Call {
        function: FunctionRef,
        args: BoundArguments,
    },
    /// The value of another variable (`b := a`).
    Reference(SharedVariable),
    /// An argument converted to a rule's type.
    Convert {
        source: SharedVariable,
        target: TypeId,
    },
    /// The elements of a vector variable, gathered into a vector value.
    Collect {
        owner: String,
        elements: Vec<Option<SharedVariable>>,
    },
    /// A constant lifted into a node (`x := 5`).
    Lift(Value),
}

impl Recipe {
    fn inputs(&self) -> Vec<SharedVariable> {
        match self {
            Recipe::Call { args, .. } => args.variables().cloned().collect(),
            Recipe::Reference(var) | Recipe::Convert { source: var, .. } => vec![var.clone()],
            Recipe::Collect { elements, .. } => elements.iter().flatten().cloned().collect(),
            Recipe::Lift(_) => Vec::new(),
        }
    }

    fn label(&self) -> &'static str {
        match self {
            Recipe::Call { .. } => "call",
            Recipe::Reference(_) => "reference",
            Recipe::Convert { .. } => "convert",
            Recipe::Collect { .. } => "collect",
            Recipe::Lift(_) => "lift",
        }
    }
}

struct DeterministicNode {
    recipe: Recipe,
    runtime: Runtime,
    cache: RefCell<Option<(u64, Value)>>,
}

impl DeterministicNode {
    fn recompute(&self, ty: TypeId) -> EvalResult<Value> {
        let types = self.runtime.types();
        let value = match &self.recipe {
            Recipe::Call { function, args } => {
                let mut ctx = CallContext::detached(&self.runtime);
                function.execute(args, &mut ctx)?.materialize()?
            }
            Recipe::Reference(var) => var.value()?,
            Recipe::Convert { source, target } => source.value()?.convert_to(*target, types)?,
            Recipe::Collect { owner, elements } => collect_elements(owner, elements, ty, types)?,
            Recipe::Lift(value) => value.materialize()?,
        };
        if types.is_derived_from(value.type_id(), ty) {
            Ok(value)
        } else {
            value.convert_to(ty, types)
        }
    }
}

fn collect_elements(
    owner: &str,
    elements: &[Option<SharedVariable>],
    ty: TypeId,
    types: &TypeTable,
) -> EvalResult<Value> {
    let elem = ty.element_of().unwrap_or(TypeId::OBJECT);
    let mut items = Vec::with_capacity(elements.len());
    for (i, element) in elements.iter().enumerate() {
        let Some(element) = element else {
            return Err(unassigned_element(owner, &format!("{owner}[{}]", i + 1)));
        };
        let value = element.value()?;
        items.push(if elem == TypeId::OBJECT {
            value
        } else {
            value.convert_to(elem, types)?.widened_to(elem)
        });
    }
    Ok(Value::vector(elem, items))
}

struct StochasticState {
    value: Value,
    clamped: bool,
    version: u64,
}

struct StochasticNode {
    distribution: ObjectValue,
    state: RefCell<StochasticState>,
}

enum NodeKind {
    Deterministic(DeterministicNode),
    Stochastic(StochasticNode),
}

struct NodeInner {
    ty: TypeId,
    kind: NodeKind,
}

/// Shared handle to a graph node.
#[derive(Clone)]
pub struct GraphNode(Rc<NodeInner>);

/// Non-owning handle, held by a node's parents.
#[derive(Clone)]
pub struct WeakNode(Weak<NodeInner>);

impl WeakNode {
    pub fn upgrade(&self) -> Option<GraphNode> {
        self.0.upgrade().map(GraphNode)
    }

    pub fn is_live(&self) -> bool {
        self.0.strong_count() > 0
    }
}

impl GraphNode {
    /// A deterministic node producing values of type `ty`.
    pub fn deterministic(recipe: Recipe, ty: TypeId, runtime: Runtime) -> Self {
        GraphNode(Rc::new(NodeInner {
            ty,
            kind: NodeKind::Deterministic(DeterministicNode {
                recipe,
                runtime,
                cache: RefCell::new(None),
            }),
        }))
    }

    /// A stochastic node drawn from `distribution`, starting at its initial value.
    pub fn stochastic(distribution: ObjectValue) -> EvalResult<Self> {
        let Some(dist) = distribution.as_distribution() else {
            return Err(type_mismatch("Distribution", "a non-distribution object"));
        };
        let ty = dist.value_type();
        let value = dist.initial_value()?;
        Ok(GraphNode(Rc::new(NodeInner {
            ty,
            kind: NodeKind::Stochastic(StochasticNode {
                distribution,
                state: RefCell::new(StochasticState {
                    value,
                    clamped: false,
                    version: next_version(),
                }),
            }),
        })))
    }

    /// Declared type of the values this node produces.
    #[inline]
    pub fn type_id(&self) -> TypeId {
        self.0.ty
    }

    pub fn variant(&self) -> NodeVariant {
        match self.0.kind {
            NodeKind::Deterministic(_) => NodeVariant::Deterministic,
            NodeKind::Stochastic(_) => NodeVariant::Stochastic,
        }
    }

    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    pub fn downgrade(&self) -> WeakNode {
        WeakNode(Rc::downgrade(&self.0))
    }

    pub fn recipe(&self) -> Option<&Recipe> {
        match &self.0.kind {
            NodeKind::Deterministic(node) => Some(&node.recipe),
            NodeKind::Stochastic(_) => None,
        }
    }

    pub fn distribution(&self) -> Option<&ObjectValue> {
        match &self.0.kind {
            NodeKind::Stochastic(node) => Some(&node.distribution),
            NodeKind::Deterministic(_) => None,
        }
    }

    /// Largest write version this node's value depends on.
    pub fn stamp(&self) -> u64 {
        match &self.0.kind {
            NodeKind::Stochastic(node) => node.state.borrow().version,
            NodeKind::Deterministic(node) => ensure_sufficient_stack(|| {
                node.recipe
                    .inputs()
                    .iter()
                    .map(SharedVariable::stamp)
                    .max()
                    .unwrap_or(0)
            }),
        }
    }

    /// Current value, recomputing a deterministic node if an input changed.
    pub fn value(&self) -> EvalResult<Value> {
        match &self.0.kind {
            NodeKind::Stochastic(node) => Ok(node.state.borrow().value.clone()),
            NodeKind::Deterministic(node) => {
                let stamp = self.stamp();
                if let Some((cached, value)) = &*node.cache.borrow() {
                    if *cached == stamp {
                        return Ok(value.clone());
                    }
                }
                let value = ensure_sufficient_stack(|| node.recompute(self.0.ty))?;
                tracing::debug!(recipe = node.recipe.label(), stamp, "recomputed node");
                *node.cache.borrow_mut() = Some((stamp, value.clone()));
                Ok(value)
            }
        }
    }

    /// Variables read directly by this node.
    pub(crate) fn inputs(&self) -> Vec<SharedVariable> {
        match &self.0.kind {
            NodeKind::Deterministic(node) => node.recipe.inputs(),
            NodeKind::Stochastic(node) => node
                .distribution
                .as_distribution()
                .map(|dist| dist.parameters().variables().cloned().collect())
                .unwrap_or_default(),
        }
    }

    /// Named variables this node reads, looking through anonymous
    /// intermediate results. Each parent appears once.
    pub fn parents(&self) -> Vec<SharedVariable> {
        let mut parents = Vec::new();
        collect_parents(&self.inputs(), &mut parents);
        parents
    }

    /// Record this node as a child of each of its parents.
    pub fn register_with_parents(&self) {
        for parent in self.parents() {
            parent.add_child(self.downgrade());
        }
    }

    /// Whether this node reads `target`, directly or through other nodes.
    pub fn depends_on(&self, target: &SharedVariable) -> bool {
        ensure_sufficient_stack(|| {
            self.inputs()
                .iter()
                .any(|input| input.ptr_eq(target) || input.depends_on(target))
        })
    }

    /// Mark dirty: a deterministic node recomputes on its next read, a
    /// stochastic node reports a new stamp to its children.
    pub fn touch(&self) {
        match &self.0.kind {
            NodeKind::Deterministic(node) => *node.cache.borrow_mut() = None,
            NodeKind::Stochastic(node) => node.state.borrow_mut().version = next_version(),
        }
    }

    /// Overwrite the value of a stochastic node. `name` is used in errors.
    pub fn set_value(&self, value: Value, name: &str) -> EvalResult<()> {
        let NodeKind::Stochastic(node) = &self.0.kind else {
            return Err(not_settable(name));
        };
        let mut state = node.state.borrow_mut();
        state.value = value;
        state.version = next_version();
        Ok(())
    }

    /// Fix a stochastic node to observed data.
    pub fn clamp(&self, value: Value, name: &str) -> EvalResult<()> {
        self.set_value(value, name)?;
        if let NodeKind::Stochastic(node) = &self.0.kind {
            node.state.borrow_mut().clamped = true;
        }
        Ok(())
    }

    pub fn unclamp(&self) {
        if let NodeKind::Stochastic(node) = &self.0.kind {
            node.state.borrow_mut().clamped = false;
        }
    }

    pub fn is_clamped(&self) -> bool {
        match &self.0.kind {
            NodeKind::Stochastic(node) => node.state.borrow().clamped,
            NodeKind::Deterministic(_) => false,
        }
    }
}

fn collect_parents(inputs: &[SharedVariable], parents: &mut Vec<SharedVariable>) {
    for input in inputs {
        if input.is_named() && !input.is_hidden() {
            if !parents.iter().any(|parent| parent.ptr_eq(input)) {
                parents.push(input.clone());
            }
        } else if let Some(node) = input.content().graph_node() {
            ensure_sufficient_stack(|| collect_parents(&node.inputs(), parents));
        }
    }
}

impl fmt::Debug for GraphNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.0.kind {
            NodeKind::Deterministic(node) => {
                write!(f, "Node(deterministic {}, {:?})", node.recipe.label(), self.0.ty)
            }
            NodeKind::Stochastic(node) => {
                let state = node.state.borrow();
                write!(
                    f,
                    "Node(stochastic, {:?}, value = {:?}, clamped = {})",
                    self.0.ty, state.value, state.clamped
                )
            }
        }
    }
}
