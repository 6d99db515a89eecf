//! Runtime type hierarchy and the conversion table.
//!
//! Every value type is a node in one tree rooted at `RevObject`. Subtype
//! checks walk parent links, so they cost a handful of integer compares.
//! Conversions between unrelated types are registered explicitly; a
//! conversion to `T'` satisfies a request for `T` whenever `T'` derives
//! from `T`.

use rustc_hash::FxHashMap;

use crate::errors::custom;
use crate::{EvalResult, Value};

/// Identity of a runtime type.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, PartialOrd, Ord)]
#[repr(transparent)]
pub struct TypeId(u32);

impl TypeId {
    pub const OBJECT: TypeId = TypeId(0);
    pub const NULL: TypeId = TypeId(1);
    pub const BOOL: TypeId = TypeId(2);
    pub const INTEGER: TypeId = TypeId(3);
    pub const NATURAL: TypeId = TypeId(4);
    pub const REAL: TypeId = TypeId(5);
    pub const REAL_POS: TypeId = TypeId(6);
    pub const PROBABILITY: TypeId = TypeId(7);
    pub const STRING: TypeId = TypeId(8);
    pub const FUNCTION: TypeId = TypeId(9);
    pub const DISTRIBUTION: TypeId = TypeId(10);
    pub const MOVE: TypeId = TypeId(11);
    pub const MONITOR: TypeId = TypeId(12);
    pub const CONTAINER: TypeId = TypeId(13);
    pub const BOOL_VECTOR: TypeId = TypeId(14);
    pub const INTEGER_VECTOR: TypeId = TypeId(15);
    pub const NATURAL_VECTOR: TypeId = TypeId(16);
    pub const REAL_VECTOR: TypeId = TypeId(17);
    pub const REAL_POS_VECTOR: TypeId = TypeId(18);
    pub const PROBABILITY_VECTOR: TypeId = TypeId(19);
    pub const STRING_VECTOR: TypeId = TypeId(20);
    pub const OBJECT_VECTOR: TypeId = TypeId(21);

    /// First id handed to plugin-registered types.
    pub const FIRST_PLUGIN: u32 = 22;

    #[inline]
    pub const fn raw(self) -> u32 {
        self.0
    }

    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }

    /// Vector type holding elements of `self`.
    ///
    /// Scalars without a dedicated vector type (and vectors themselves)
    /// map to `RevObject[]`.
    pub const fn vector_of(self) -> TypeId {
        match self.0 {
            2 => Self::BOOL_VECTOR,
            3 => Self::INTEGER_VECTOR,
            4 => Self::NATURAL_VECTOR,
            5 => Self::REAL_VECTOR,
            6 => Self::REAL_POS_VECTOR,
            7 => Self::PROBABILITY_VECTOR,
            8 => Self::STRING_VECTOR,
            _ => Self::OBJECT_VECTOR,
        }
    }

    /// Element type of a built-in vector type.
    pub const fn element_of(self) -> Option<TypeId> {
        match self.0 {
            14 => Some(Self::BOOL),
            15 => Some(Self::INTEGER),
            16 => Some(Self::NATURAL),
            17 => Some(Self::REAL),
            18 => Some(Self::REAL_POS),
            19 => Some(Self::PROBABILITY),
            20 => Some(Self::STRING),
            21 => Some(Self::OBJECT),
            _ => None,
        }
    }

    #[inline]
    pub const fn is_vector(self) -> bool {
        self.element_of().is_some()
    }
}

/// Whether a conversion can fail on well-typed input.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum ConversionKind {
    /// Succeeds for every value of the source type.
    Always,
    /// Succeeds only for some values (e.g. `Integer` to `Natural` needs `>= 0`).
    ///
    /// Allowed only when the value is converted once: in value mode, or when
    /// the argument is a constant. A live node could later produce a value
    /// the conversion rejects.
    ValueDependent,
}

/// Data transform of a conversion; `None` rejects the value.
pub type ConvertFn = fn(&Value) -> Option<Value>;

/// A registered conversion from one type to another.
#[derive(Copy, Clone)]
pub struct Conversion {
    pub from: TypeId,
    pub to: TypeId,
    pub kind: ConversionKind,
    convert: ConvertFn,
}

impl Conversion {
    /// Apply the transform to a plain (materialized) value.
    #[inline]
    pub fn apply(&self, value: &Value) -> Option<Value> {
        (self.convert)(value)
    }
}

impl std::fmt::Debug for Conversion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Conversion")
            .field("from", &self.from)
            .field("to", &self.to)
            .field("kind", &self.kind)
            .finish_non_exhaustive()
    }
}

#[derive(Clone, Debug)]
struct TypeEntry {
    name: String,
    parent: Option<TypeId>,
}

/// The type hierarchy plus registered conversions.
#[derive(Clone, Debug)]
pub struct TypeTable {
    entries: Vec<TypeEntry>,
    by_name: FxHashMap<String, TypeId>,
    conversions: Vec<Conversion>,
}

impl TypeTable {
    /// Create a table holding the built-in types and conversions.
    pub fn new() -> Self {
        let mut table = TypeTable {
            entries: Vec::new(),
            by_name: FxHashMap::default(),
            conversions: Vec::new(),
        };
        table.register_builtins();
        table.register_builtin_conversions();
        table
    }

    fn register_builtins(&mut self) {
        // Order must match the `TypeId` constants.
        const BUILTINS: &[(&str, Option<TypeId>)] = &[
            ("RevObject", None),
            ("NULL", Some(TypeId::OBJECT)),
            ("Bool", Some(TypeId::OBJECT)),
            ("Integer", Some(TypeId::OBJECT)),
            ("Natural", Some(TypeId::INTEGER)),
            ("Real", Some(TypeId::OBJECT)),
            ("RealPos", Some(TypeId::REAL)),
            ("Probability", Some(TypeId::REAL_POS)),
            ("String", Some(TypeId::OBJECT)),
            ("Function", Some(TypeId::OBJECT)),
            ("Distribution", Some(TypeId::OBJECT)),
            ("Move", Some(TypeId::OBJECT)),
            ("Monitor", Some(TypeId::OBJECT)),
            ("Container", Some(TypeId::OBJECT)),
            ("Bool[]", Some(TypeId::CONTAINER)),
            ("Integer[]", Some(TypeId::CONTAINER)),
            ("Natural[]", Some(TypeId::INTEGER_VECTOR)),
            ("Real[]", Some(TypeId::CONTAINER)),
            ("RealPos[]", Some(TypeId::REAL_VECTOR)),
            ("Probability[]", Some(TypeId::REAL_POS_VECTOR)),
            ("String[]", Some(TypeId::CONTAINER)),
            ("RevObject[]", Some(TypeId::CONTAINER)),
        ];

        for (index, (name, parent)) in (0_u32..).zip(BUILTINS) {
            self.push_entry(TypeId(index), name, *parent);
        }
    }

    fn register_builtin_conversions(&mut self) {
        use ConversionKind::{Always, ValueDependent};

        self.add_conversion(TypeId::INTEGER, TypeId::REAL, Always, convert::integer_to_real);
        self.add_conversion(TypeId::NATURAL, TypeId::REAL_POS, Always, convert::natural_to_real_pos);
        self.add_conversion(TypeId::BOOL, TypeId::NATURAL, Always, convert::bool_to_natural);
        self.add_conversion(TypeId::BOOL, TypeId::REAL_POS, Always, convert::bool_to_real_pos);
        self.add_conversion(TypeId::INTEGER, TypeId::NATURAL, ValueDependent, convert::integer_to_natural);
        self.add_conversion(TypeId::REAL, TypeId::REAL_POS, ValueDependent, convert::real_to_real_pos);
        self.add_conversion(TypeId::REAL, TypeId::PROBABILITY, ValueDependent, convert::real_to_probability);

        self.add_conversion(TypeId::INTEGER_VECTOR, TypeId::REAL_VECTOR, Always, convert::integers_to_reals);
        self.add_conversion(TypeId::NATURAL_VECTOR, TypeId::REAL_POS_VECTOR, Always, convert::naturals_to_real_pos);
        self.add_conversion(TypeId::INTEGER_VECTOR, TypeId::NATURAL_VECTOR, ValueDependent, convert::integers_to_naturals);
        self.add_conversion(TypeId::REAL_VECTOR, TypeId::REAL_POS_VECTOR, ValueDependent, convert::reals_to_real_pos);
        self.add_conversion(TypeId::REAL_VECTOR, TypeId::PROBABILITY_VECTOR, ValueDependent, convert::reals_to_probabilities);
    }

    fn push_entry(&mut self, id: TypeId, name: &str, parent: Option<TypeId>) {
        self.entries.push(TypeEntry {
            name: name.to_string(),
            parent,
        });
        self.by_name.insert(name.to_string(), id);
    }

    /// Register a plugin type under `parent`.
    ///
    /// Registering an existing name returns its id unchanged. Fails once
    /// every `TypeId` is taken.
    pub fn register(&mut self, name: &str, parent: TypeId) -> EvalResult<TypeId> {
        if let Some(&id) = self.by_name.get(name) {
            return Ok(id);
        }
        let index = u32::try_from(self.entries.len())
            .map_err(|_| custom(format!("cannot register type {name}: the type table is full")))?;
        let id = TypeId(index);
        self.push_entry(id, name, Some(parent));
        Ok(id)
    }

    /// Register a conversion. Later registrations are tried after earlier ones.
    pub fn add_conversion(
        &mut self,
        from: TypeId,
        to: TypeId,
        kind: ConversionKind,
        convert: ConvertFn,
    ) {
        self.conversions.push(Conversion {
            from,
            to,
            kind,
            convert,
        });
    }

    /// Resolve a type name as written in a signature (`Real`, `Natural[]`).
    pub fn lookup(&self, name: &str) -> Option<TypeId> {
        self.by_name.get(name).copied()
    }

    /// Display name of a type.
    pub fn name(&self, id: TypeId) -> &str {
        self.entries
            .get(id.index())
            .map_or("<unknown type>", |entry| entry.name.as_str())
    }

    pub fn parent(&self, id: TypeId) -> Option<TypeId> {
        self.entries.get(id.index()).and_then(|entry| entry.parent)
    }

    /// Number of registered types.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Whether `ty` is `ancestor` or one of its descendants.
    pub fn is_derived_from(&self, ty: TypeId, ancestor: TypeId) -> bool {
        let mut current = Some(ty);
        while let Some(id) = current {
            if id == ancestor {
                return true;
            }
            current = self.parent(id);
        }
        false
    }

    /// `ty` followed by its ancestors up to the root.
    pub fn ancestors(&self, ty: TypeId) -> impl Iterator<Item = TypeId> + '_ {
        std::iter::successors(Some(ty), |&id| self.parent(id))
    }

    /// Nearest type both `a` and `b` derive from.
    pub fn common_ancestor(&self, a: TypeId, b: TypeId) -> TypeId {
        self.ancestors(a)
            .find(|&candidate| self.is_derived_from(b, candidate))
            .unwrap_or(TypeId::OBJECT)
    }

    /// Find a conversion turning a `from` value into something derived from `target`.
    ///
    /// Conversions registered on `from`'s ancestors apply too: a `Natural`
    /// reaches `Real` through `Integer -> Real` when nothing closer exists.
    pub fn find_conversion(
        &self,
        from: TypeId,
        target: TypeId,
        allow_value_dependent: bool,
    ) -> Option<&Conversion> {
        self.ancestors(from).find_map(|source| {
            self.conversions.iter().find(|conversion| {
                conversion.from == source
                    && (allow_value_dependent || conversion.kind == ConversionKind::Always)
                    && self.is_derived_from(conversion.to, target)
            })
        })
    }

    /// Element type of a vector holding values of the given types.
    ///
    /// The first of `Bool`, `Natural`, `Integer`, `Probability`, `RealPos`,
    /// `Real`, `String` that every type derives from or reaches through an
    /// `Always` conversion; `RevObject` if none does, or if there are no types.
    pub fn common_element_type(&self, types: impl IntoIterator<Item = TypeId>) -> TypeId {
        const CANDIDATES: [TypeId; 7] = [
            TypeId::BOOL,
            TypeId::NATURAL,
            TypeId::INTEGER,
            TypeId::PROBABILITY,
            TypeId::REAL_POS,
            TypeId::REAL,
            TypeId::STRING,
        ];
        let types: Vec<TypeId> = types.into_iter().collect();
        if types.is_empty() {
            return TypeId::OBJECT;
        }
        CANDIDATES
            .into_iter()
            .find(|&candidate| {
                types.iter().all(|&ty| {
                    self.is_derived_from(ty, candidate)
                        || self.find_conversion(ty, candidate, false).is_some()
                })
            })
            .unwrap_or(TypeId::OBJECT)
    }
}

impl Default for TypeTable {
    fn default() -> Self {
        Self::new()
    }
}

/// Built-in conversion transforms.
#[allow(clippy::cast_precision_loss, reason = "Rev reals are doubles")]
mod convert {
    use crate::types::TypeId;
    use crate::value::Value;

    pub(super) fn integer_to_real(value: &Value) -> Option<Value> {
        value.as_i64().map(|i| Value::Real(i as f64))
    }

    pub(super) fn natural_to_real_pos(value: &Value) -> Option<Value> {
        value.as_i64().map(|i| Value::RealPos(i as f64))
    }

    pub(super) fn bool_to_natural(value: &Value) -> Option<Value> {
        value.as_bool().map(|b| Value::Natural(i64::from(b)))
    }

    pub(super) fn bool_to_real_pos(value: &Value) -> Option<Value> {
        value.as_bool().map(|b| Value::RealPos(if b { 1.0 } else { 0.0 }))
    }

    pub(super) fn integer_to_natural(value: &Value) -> Option<Value> {
        value.as_i64().filter(|&i| i >= 0).map(Value::Natural)
    }

    pub(super) fn real_to_real_pos(value: &Value) -> Option<Value> {
        value.as_f64().filter(|&x| x >= 0.0).map(Value::RealPos)
    }

    pub(super) fn real_to_probability(value: &Value) -> Option<Value> {
        value
            .as_f64()
            .filter(|x| (0.0..=1.0).contains(x))
            .map(Value::Probability)
    }

    fn map_elements(value: &Value, elem: TypeId, convert: fn(&Value) -> Option<Value>) -> Option<Value> {
        let items = value
            .as_vector()?
            .iter()
            .map(convert)
            .collect::<Option<Vec<_>>>()?;
        Some(Value::vector(elem, items))
    }

    pub(super) fn integers_to_reals(value: &Value) -> Option<Value> {
        map_elements(value, TypeId::REAL, integer_to_real)
    }

    pub(super) fn naturals_to_real_pos(value: &Value) -> Option<Value> {
        map_elements(value, TypeId::REAL_POS, natural_to_real_pos)
    }

    pub(super) fn integers_to_naturals(value: &Value) -> Option<Value> {
        map_elements(value, TypeId::NATURAL, integer_to_natural)
    }

    pub(super) fn reals_to_real_pos(value: &Value) -> Option<Value> {
        map_elements(value, TypeId::REAL_POS, real_to_real_pos)
    }

    pub(super) fn reals_to_probabilities(value: &Value) -> Option<Value> {
        map_elements(value, TypeId::PROBABILITY, real_to_probability)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, reason = "tests use unwrap for brevity")]
mod tests;
