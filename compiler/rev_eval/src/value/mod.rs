//! Runtime values.
//!
//! A [`Value`] is either plain data (numbers, strings, vectors, functions,
//! plugin objects) or a handle to a graph node whose data is computed on
//! demand. Plain data is the constant variant: it never changes after
//! construction, and cloning a value shares its heap payload.
//!
//! Numeric literals are typed by their magnitude: non-negative integers are
//! `Natural`, reals in `[0, 1]` are `Probability`, larger reals `RealPos`.
//! Negative values only come out of arithmetic.

mod heap;
mod object;

use std::fmt;
use std::rc::Rc;

pub use heap::Heap;
pub use object::{Distribution, ObjectValue, PluginObject};

use crate::errors::conversion_failed;
use crate::function::FunctionRef;
use crate::graph::{GraphNode, NodeVariant};
use crate::types::{TypeId, TypeTable};
use crate::EvalResult;

/// Runtime value.
#[derive(Clone)]
pub enum Value {
    Null,
    Bool(bool),
    /// Any integer.
    Integer(i64),
    /// Integer known to be `>= 0`.
    Natural(i64),
    Real(f64),
    /// Real known to be `>= 0`.
    RealPos(f64),
    /// Real known to be in `[0, 1]`.
    Probability(f64),
    Str(Heap<String>),
    Vector(VectorValue),
    Function(FunctionValue),
    Object(ObjectValue),
    /// Value computed by a deterministic or stochastic graph node.
    Node(GraphNode),
}

impl Value {
    // Factories

    /// Integer typed by sign: `Natural` when non-negative.
    #[inline]
    pub fn int(value: i64) -> Self {
        if value >= 0 {
            Value::Natural(value)
        } else {
            Value::Integer(value)
        }
    }

    /// Real typed by magnitude: `Probability` in `[0, 1]`, `RealPos` above.
    #[inline]
    pub fn real(value: f64) -> Self {
        if (0.0..=1.0).contains(&value) {
            Value::Probability(value)
        } else if value > 1.0 {
            Value::RealPos(value)
        } else {
            Value::Real(value)
        }
    }

    pub fn string(value: impl Into<String>) -> Self {
        Value::Str(Heap::new(value.into()))
    }

    /// Vector with element type `elem`.
    pub fn vector(elem: TypeId, items: Vec<Value>) -> Self {
        Value::Vector(VectorValue {
            elem,
            items: Heap::new(items),
        })
    }

    // Type information

    /// Runtime type. For nodes, the type the node was declared to produce.
    pub fn type_id(&self) -> TypeId {
        match self {
            Value::Null => TypeId::NULL,
            Value::Bool(_) => TypeId::BOOL,
            Value::Integer(_) => TypeId::INTEGER,
            Value::Natural(_) => TypeId::NATURAL,
            Value::Real(_) => TypeId::REAL,
            Value::RealPos(_) => TypeId::REAL_POS,
            Value::Probability(_) => TypeId::PROBABILITY,
            Value::Str(_) => TypeId::STRING,
            Value::Vector(v) => v.type_id(),
            Value::Function(_) => TypeId::FUNCTION,
            Value::Object(o) => o.type_id(),
            Value::Node(n) => n.type_id(),
        }
    }

    /// Graph variant; plain data is `Constant`.
    pub fn variant(&self) -> NodeVariant {
        match self {
            Value::Node(n) => n.variant(),
            _ => NodeVariant::Constant,
        }
    }

    #[inline]
    pub fn has_graph_node(&self) -> bool {
        matches!(self, Value::Node(_))
    }

    #[inline]
    pub fn graph_node(&self) -> Option<&GraphNode> {
        match self {
            Value::Node(n) => Some(n),
            _ => None,
        }
    }

    #[inline]
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Current data as a plain value, detached from any graph node.
    pub fn materialize(&self) -> EvalResult<Value> {
        match self {
            Value::Node(n) => n.value(),
            other => Ok(other.clone()),
        }
    }

    /// Whether this value is, or can be converted to, a `target`.
    pub fn is_convertible_to(&self, target: TypeId, types: &TypeTable) -> bool {
        let from = self.type_id();
        if types.is_derived_from(from, target) {
            return true;
        }
        let Some(conversion) = types.find_conversion(from, target, true) else {
            return false;
        };
        self.materialize()
            .ok()
            .and_then(|plain| conversion.apply(&plain))
            .is_some()
    }

    /// Convert to `target`, producing a new plain value.
    ///
    /// A value already derived from `target` comes back unchanged.
    pub fn convert_to(&self, target: TypeId, types: &TypeTable) -> EvalResult<Value> {
        let from = self.type_id();
        if types.is_derived_from(from, target) {
            return Ok(self.clone());
        }
        let plain = self.materialize()?;
        types
            .find_conversion(from, target, true)
            .and_then(|conversion| conversion.apply(&plain))
            .ok_or_else(|| conversion_failed(&plain.to_string(), types.name(from), types.name(target)))
    }

    /// The same number in the variant of the scalar supertype `target`.
    ///
    /// `Probability(0.5)` as `RealPos` is `RealPos(0.5)`. Anything else comes
    /// back unchanged.
    pub fn widened_to(&self, target: TypeId) -> Value {
        match (target, self) {
            (TypeId::INTEGER, Value::Natural(i)) => Value::Integer(*i),
            (TypeId::REAL, Value::RealPos(x) | Value::Probability(x)) => Value::Real(*x),
            (TypeId::REAL_POS, Value::Probability(x)) => Value::RealPos(*x),
            _ => self.clone(),
        }
    }

    // Accessors

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Integer(i) | Value::Natural(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            #[allow(clippy::cast_precision_loss, reason = "Rev reals are doubles")]
            Value::Integer(i) | Value::Natural(i) => Some(*i as f64),
            Value::Real(x) | Value::RealPos(x) | Value::Probability(x) => Some(*x),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s.as_str()),
            _ => None,
        }
    }

    pub fn as_vector(&self) -> Option<&VectorValue> {
        match self {
            Value::Vector(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_function(&self) -> Option<&FunctionValue> {
        match self {
            Value::Function(f) => Some(f),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&ObjectValue> {
        match self {
            Value::Object(o) => Some(o),
            _ => None,
        }
    }
}

impl Default for Value {
    fn default() -> Self {
        Value::Null
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Integer(a), Value::Integer(b)) | (Value::Natural(a), Value::Natural(b)) => {
                a == b
            }
            (Value::Real(a), Value::Real(b))
            | (Value::RealPos(a), Value::RealPos(b))
            | (Value::Probability(a), Value::Probability(b)) => a == b,
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::Vector(a), Value::Vector(b)) => a == b,
            (Value::Function(a), Value::Function(b)) => a.ptr_eq(b),
            (Value::Object(a), Value::Object(b)) => a.ptr_eq(b),
            (Value::Node(a), Value::Node(b)) => a.ptr_eq(b),
            _ => false,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "NULL"),
            Value::Bool(true) => write!(f, "TRUE"),
            Value::Bool(false) => write!(f, "FALSE"),
            Value::Integer(i) | Value::Natural(i) => write!(f, "{i}"),
            Value::Real(x) | Value::RealPos(x) | Value::Probability(x) => write!(f, "{x}"),
            Value::Str(s) => write!(f, "{}", s.as_str()),
            Value::Vector(v) => write!(f, "{v}"),
            Value::Function(func) => write!(f, "<function {}>", func.name()),
            Value::Object(o) => write!(f, "{o}"),
            Value::Node(n) => match n.value() {
                Ok(value) => write!(f, "{value}"),
                Err(_) => write!(f, "NA"),
            },
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "Null"),
            Value::Bool(b) => write!(f, "Bool({b})"),
            Value::Integer(i) => write!(f, "Integer({i})"),
            Value::Natural(i) => write!(f, "Natural({i})"),
            Value::Real(x) => write!(f, "Real({x:?})"),
            Value::RealPos(x) => write!(f, "RealPos({x:?})"),
            Value::Probability(x) => write!(f, "Probability({x:?})"),
            Value::Str(s) => write!(f, "Str({:?})", s.as_str()),
            Value::Vector(v) => write!(f, "Vector({:?}, {:?})", v.elem, &**v.items),
            Value::Function(func) => write!(f, "Function({})", func.name()),
            Value::Object(o) => write!(f, "{o:?}"),
            Value::Node(n) => write!(f, "{n:?}"),
        }
    }
}

/// Ordered sequence of plain values sharing an element type.
#[derive(Clone, PartialEq)]
pub struct VectorValue {
    elem: TypeId,
    items: Heap<Vec<Value>>,
}

impl VectorValue {
    /// Declared element type.
    #[inline]
    pub fn elem(&self) -> TypeId {
        self.elem
    }

    #[inline]
    pub fn type_id(&self) -> TypeId {
        self.elem.vector_of()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Element at a zero-based position.
    pub fn get(&self, index: usize) -> Option<&Value> {
        self.items.get(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Value> {
        self.items.iter()
    }

    pub fn as_slice(&self) -> &[Value] {
        &self.items
    }
}

impl fmt::Display for VectorValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.items.is_empty() {
            return write!(f, "[ ]");
        }
        write!(f, "[ ")?;
        for (i, item) in self.items.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{item}")?;
        }
        write!(f, " ]")
    }
}

/// A callable value: every overload registered under one name.
#[derive(Clone)]
pub struct FunctionValue {
    name: Rc<str>,
    overloads: Rc<[FunctionRef]>,
}

impl FunctionValue {
    pub fn new(name: &str, overloads: Vec<FunctionRef>) -> Self {
        FunctionValue {
            name: Rc::from(name),
            overloads: Rc::from(overloads),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Overloads in declaration order.
    pub fn overloads(&self) -> &[FunctionRef] {
        &self.overloads
    }

    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.overloads, &other.overloads)
    }
}

impl fmt::Debug for FunctionValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FunctionValue({}, {} overloads)", self.name, self.overloads.len())
    }
}
