//! Variables: named, reassignable cells with identity.
//!
//! A [`SharedVariable`] is the unit the environment binds, graph nodes read
//! and assignments write. Replacing a variable's content keeps its identity,
//! so nodes that read it see the new content on their next evaluation.
//!
//! Borrow discipline: methods clone what they need out of the cell and drop
//! the borrow before following aliases or evaluating nodes, since those walks
//! can come back to this variable.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use bitflags::bitflags;

use crate::errors::{not_indexable, variable_type_mismatch};
use crate::graph::{next_version, GraphNode, NodeVariant, WeakNode};
use crate::types::{TypeId, TypeTable};
use crate::{EvalResult, Value};

/// How a variable's content was established.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, Default)]
pub enum VariableKind {
    /// Part of the model graph (`<-`, `:=`, `~`).
    #[default]
    Ordinary,
    /// Control variable outside the model graph (`=`, loop variables).
    Workspace,
    /// Alias of another variable (`<-&`).
    Reference,
}

bitflags! {
    /// Bookkeeping flags.
    #[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, Default)]
    pub struct VariableFlags: u8 {
        /// Internal helper (e.g. a conversion of an argument); never listed,
        /// never reported as a parent.
        const HIDDEN = 1;
        /// Element of a vector variable (`x[2]`).
        const ELEMENT = 1 << 1;
    }
}

/// The cell behind a [`SharedVariable`].
pub struct Variable {
    name: String,
    content: Value,
    kind: VariableKind,
    alias: Option<SharedVariable>,
    required_type: TypeId,
    version: u64,
    flags: VariableFlags,
    /// Element variables when this is a vector variable (`x[1] <- ...`).
    elements: Option<Vec<Option<SharedVariable>>>,
    children: Vec<WeakNode>,
}

/// Shared handle to a variable. Equality of identity is [`ptr_eq`](Self::ptr_eq).
#[derive(Clone)]
pub struct SharedVariable(Rc<RefCell<Variable>>);

impl SharedVariable {
    /// A variable named `name` holding `content`.
    pub fn new(name: impl Into<String>, content: Value) -> Self {
        SharedVariable(Rc::new(RefCell::new(Variable {
            name: name.into(),
            content,
            kind: VariableKind::Ordinary,
            alias: None,
            required_type: TypeId::OBJECT,
            version: next_version(),
            flags: VariableFlags::empty(),
            elements: None,
            children: Vec::new(),
        })))
    }

    /// An anonymous temporary, e.g. a literal or a call result.
    pub fn anonymous(content: Value) -> Self {
        Self::new(String::new(), content)
    }

    /// Hidden helper variable displayed as `name`.
    pub fn hidden(name: impl Into<String>, content: Value) -> Self {
        let var = Self::new(name, content);
        var.insert_flags(VariableFlags::HIDDEN);
        var
    }

    // Identity and bookkeeping

    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    pub fn name(&self) -> String {
        self.0.borrow().name.clone()
    }

    /// Name for error messages; anonymous variables show as `<value>`.
    pub fn display_name(&self) -> String {
        let var = self.0.borrow();
        if var.name.is_empty() {
            "<value>".to_string()
        } else {
            var.name.clone()
        }
    }

    pub fn is_named(&self) -> bool {
        !self.0.borrow().name.is_empty()
    }

    pub fn kind(&self) -> VariableKind {
        self.0.borrow().kind
    }

    pub fn flags(&self) -> VariableFlags {
        self.0.borrow().flags
    }

    pub fn insert_flags(&self, flags: VariableFlags) {
        self.0.borrow_mut().flags.insert(flags);
    }

    pub fn is_hidden(&self) -> bool {
        self.flags().contains(VariableFlags::HIDDEN)
    }

    pub fn required_type(&self) -> TypeId {
        self.0.borrow().required_type
    }

    pub fn set_required_type(&self, ty: TypeId) {
        self.0.borrow_mut().required_type = ty;
    }

    /// Tighten the required type to `ty` if `ty` is narrower than the current one.
    pub fn narrow_required_type(&self, ty: TypeId, types: &TypeTable) {
        let mut var = self.0.borrow_mut();
        if ty != var.required_type && types.is_derived_from(ty, var.required_type) {
            var.required_type = ty;
        }
    }

    // Aliasing

    /// Direct alias target, if this is a reference variable.
    pub fn alias(&self) -> Option<SharedVariable> {
        self.0.borrow().alias.clone()
    }

    /// The variable reads and in-place writes go to: the end of the alias chain.
    pub fn resolve(&self) -> SharedVariable {
        let mut current = self.clone();
        while let Some(next) = current.alias() {
            current = next;
        }
        current
    }

    /// Whether following aliases from `self` reaches `target`.
    pub fn aliases(&self, target: &SharedVariable) -> bool {
        let mut current = self.clone();
        loop {
            if current.ptr_eq(target) {
                return true;
            }
            match current.alias() {
                Some(next) => current = next,
                None => return false,
            }
        }
    }

    // Content

    /// Stored content of the resolved variable; nodes stay nodes.
    pub fn content(&self) -> Value {
        self.resolve().0.borrow().content.clone()
    }

    /// Current data, with nodes evaluated.
    pub fn value(&self) -> EvalResult<Value> {
        self.content().materialize()
    }

    pub fn type_id(&self) -> TypeId {
        self.content().type_id()
    }

    pub fn variant(&self) -> NodeVariant {
        self.content().variant()
    }

    pub fn is_constant(&self) -> bool {
        self.variant() == NodeVariant::Constant
    }

    /// Largest write version the current data depends on.
    pub fn stamp(&self) -> u64 {
        let (version, alias, content) = {
            let var = self.0.borrow();
            (var.version, var.alias.clone(), var.content.clone())
        };
        let upstream = match (alias, content) {
            (Some(target), _) => target.stamp(),
            (None, Value::Node(node)) => node.stamp(),
            (None, _) => 0,
        };
        version.max(upstream)
    }

    /// Replace the content and kind, dropping any alias and element structure.
    pub fn replace_content(&self, content: Value, kind: VariableKind) {
        let mut var = self.0.borrow_mut();
        var.content = content;
        var.kind = kind;
        var.alias = None;
        var.elements = None;
        var.version = next_version();
    }

    /// Rebind as an alias of `target`.
    pub fn make_reference(&self, target: SharedVariable) {
        let mut var = self.0.borrow_mut();
        var.content = Value::Null;
        var.kind = VariableKind::Reference;
        var.alias = Some(target);
        var.elements = None;
        var.version = next_version();
    }

    /// Write new data into the resolved variable without rebinding it.
    ///
    /// Stochastic content keeps its node and takes the value; deterministic
    /// content cannot be written. Plain content is replaced after a check
    /// against the required type.
    pub fn set_value_in_place(&self, value: Value, types: &TypeTable) -> EvalResult<()> {
        let target = self.resolve();
        let (name, content, required) = {
            let var = target.0.borrow();
            (var.name.clone(), var.content.clone(), var.required_type)
        };
        match content {
            Value::Node(node) => {
                let value = value.convert_to(node.type_id(), types)?;
                node.set_value(value, &name)
            }
            _ => {
                let value = coerce_to(&name, value, required, types)?;
                let mut var = target.0.borrow_mut();
                var.content = value;
                var.version = next_version();
                Ok(())
            }
        }
    }

    /// Whether this variable's data is computed from `target`.
    pub fn depends_on(&self, target: &SharedVariable) -> bool {
        let (alias, content, elements) = {
            let var = self.0.borrow();
            (var.alias.clone(), var.content.clone(), var.elements.clone())
        };
        if let Some(alias) = alias {
            return alias.ptr_eq(target) || alias.depends_on(target);
        }
        if let Value::Node(node) = content {
            return node.depends_on(target);
        }
        elements.is_some_and(|elements| {
            elements
                .iter()
                .flatten()
                .any(|element| element.ptr_eq(target) || element.depends_on(target))
        })
    }

    // Vector variables

    pub fn is_vector_variable(&self) -> bool {
        self.0.borrow().elements.is_some()
    }

    /// Element slots of a vector variable; `None` marks a gap.
    pub fn elements(&self) -> Option<Vec<Option<SharedVariable>>> {
        self.0.borrow().elements.clone()
    }

    /// Element at a zero-based position of a vector variable.
    pub fn element(&self, index: usize) -> Option<SharedVariable> {
        self.0
            .borrow()
            .elements
            .as_ref()
            .and_then(|elements| elements.get(index).cloned().flatten())
    }

    /// Turn an empty or plain-vector variable into a vector variable.
    ///
    /// Existing vector data is split into one constant element per item.
    /// Node-valued content cannot be split into elements.
    pub fn make_vector_variable(&self, types: &TypeTable) -> EvalResult<()> {
        if self.is_vector_variable() {
            return Ok(());
        }
        let (name, content) = {
            let var = self.0.borrow();
            (var.name.clone(), var.content.clone())
        };
        let elements = match &content {
            Value::Null => Vec::new(),
            Value::Vector(vector) => vector
                .iter()
                .enumerate()
                .map(|(i, item)| Some(element_variable(&name, i, item.clone())))
                .collect(),
            other => {
                return Err(not_indexable(&name, types.name(other.type_id()))
                    .with_message(format!("cannot assign to an element of '{name}'")));
            }
        };
        self.0.borrow_mut().elements = Some(elements);
        Ok(())
    }

    /// Element variable at a zero-based position, created empty if absent.
    pub fn ensure_element(&self, index: usize) -> SharedVariable {
        if let Some(existing) = self.element(index) {
            return existing;
        }
        let name = self.name();
        let element = element_variable(&name, index, Value::Null);
        let mut var = self.0.borrow_mut();
        let elements = var.elements.get_or_insert_with(Vec::new);
        if elements.len() <= index {
            elements.resize(index + 1, None);
        }
        elements[index] = Some(element.clone());
        element
    }

    /// Store a node gathering the current elements as this variable's content.
    pub fn set_collection(&self, node: GraphNode) {
        let mut var = self.0.borrow_mut();
        var.content = Value::Node(node);
        var.version = next_version();
    }

    // Children

    pub(crate) fn add_child(&self, child: WeakNode) {
        let mut var = self.0.borrow_mut();
        var.children.retain(WeakNode::is_live);
        var.children.push(child);
    }

    /// Live nodes that read this variable.
    pub fn children(&self) -> Vec<GraphNode> {
        self.0
            .borrow()
            .children
            .iter()
            .filter_map(WeakNode::upgrade)
            .collect()
    }
}

fn element_variable(owner: &str, index: usize, content: Value) -> SharedVariable {
    let element = SharedVariable::new(format!("{owner}[{}]", index + 1), content);
    element.insert_flags(VariableFlags::ELEMENT);
    element
}

/// Check `value` against a variable's required type, converting if needed.
pub(crate) fn coerce_to(
    name: &str,
    value: Value,
    required: TypeId,
    types: &TypeTable,
) -> EvalResult<Value> {
    let found = value.type_id();
    if types.is_derived_from(found, required) {
        return Ok(value);
    }
    if value.is_convertible_to(required, types) {
        return value.convert_to(required, types);
    }
    Err(variable_type_mismatch(
        name,
        types.name(found),
        types.name(required),
    ))
}

impl fmt::Debug for SharedVariable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let var = self.0.borrow();
        f.debug_struct("Variable")
            .field("name", &var.name)
            .field("kind", &var.kind)
            .field("content", &var.content)
            .field("alias", &var.alias.as_ref().map(SharedVariable::name))
            .finish_non_exhaustive()
    }
}
