//! Function, method and type registries.
//!
//! A [`RegistryBuilder`] collects types, conversions, functions and methods
//! from every installed [`Plugin`]; [`RegistryBuilder::build`] freezes them
//! into a [`Registry`] that a session shares with everything it creates.
//! Nothing is registered lazily or through statics.

use rustc_hash::FxHashMap;

use crate::errors::custom;
use crate::function::FunctionRef;
use crate::types::{ConversionKind, ConvertFn, TypeId, TypeTable};
use crate::value::FunctionValue;
use crate::EvalResult;

/// Something that contributes to a registry.
pub trait Plugin {
    /// Name used in registration errors and logs.
    fn name(&self) -> &'static str;

    fn register(&self, builder: &mut RegistryBuilder) -> EvalResult<()>;
}

/// Key of a method: the receiver type it is registered on and its name.
#[derive(Clone, Eq, PartialEq, Hash, Debug)]
pub struct MethodKey {
    pub type_id: TypeId,
    pub method: String,
}

impl MethodKey {
    pub fn new(type_id: TypeId, method: &str) -> Self {
        MethodKey {
            type_id,
            method: method.to_string(),
        }
    }
}

/// Global functions by name, overloads in registration order.
#[derive(Default, Debug)]
pub struct FunctionTable {
    functions: FxHashMap<String, FunctionValue>,
}

impl FunctionTable {
    pub fn get(&self, name: &str) -> Option<&FunctionValue> {
        self.functions.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.functions.contains_key(name)
    }

    /// Registered names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.functions.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.functions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.functions.is_empty()
    }
}

/// Methods by receiver type.
#[derive(Default, Debug)]
pub struct MethodTable {
    methods: FxHashMap<MethodKey, FunctionValue>,
}

impl MethodTable {
    /// Find `method` on `receiver` or the nearest ancestor type that has it.
    pub fn lookup(&self, receiver: TypeId, method: &str, types: &TypeTable) -> Option<&FunctionValue> {
        let mut key = MethodKey::new(receiver, method);
        for ty in types.ancestors(receiver) {
            key.type_id = ty;
            if let Some(found) = self.methods.get(&key) {
                return Some(found);
            }
        }
        None
    }

    /// Method names callable on `receiver`, sorted and deduplicated.
    pub fn names_for(&self, receiver: TypeId, types: &TypeTable) -> Vec<&str> {
        let mut names: Vec<&str> = self
            .methods
            .keys()
            .filter(|key| types.is_derived_from(receiver, key.type_id))
            .map(|key| key.method.as_str())
            .collect();
        names.sort_unstable();
        names.dedup();
        names
    }

    pub fn len(&self) -> usize {
        self.methods.len()
    }

    pub fn is_empty(&self) -> bool {
        self.methods.is_empty()
    }
}

/// Frozen registry shared by a session.
#[derive(Debug)]
pub struct Registry {
    types: TypeTable,
    functions: FunctionTable,
    methods: MethodTable,
}

impl Registry {
    pub fn builder() -> RegistryBuilder {
        RegistryBuilder::new()
    }

    #[inline]
    pub fn types(&self) -> &TypeTable {
        &self.types
    }

    #[inline]
    pub fn functions(&self) -> &FunctionTable {
        &self.functions
    }

    #[inline]
    pub fn methods(&self) -> &MethodTable {
        &self.methods
    }
}

/// Mutable registry under construction.
pub struct RegistryBuilder {
    types: TypeTable,
    functions: FxHashMap<String, Vec<FunctionRef>>,
    methods: FxHashMap<MethodKey, Vec<FunctionRef>>,
}

impl RegistryBuilder {
    /// A builder holding the built-in types and conversions, and no functions.
    pub fn new() -> Self {
        RegistryBuilder {
            types: TypeTable::new(),
            functions: FxHashMap::default(),
            methods: FxHashMap::default(),
        }
    }

    pub fn types(&self) -> &TypeTable {
        &self.types
    }

    pub fn register_type(&mut self, name: &str, parent: TypeId) -> EvalResult<TypeId> {
        self.types.register(name, parent)
    }

    pub fn add_conversion(&mut self, from: TypeId, to: TypeId, kind: ConversionKind, convert: ConvertFn) {
        self.types.add_conversion(from, to, kind, convert);
    }

    /// Add an overload of a global function.
    ///
    /// Fails if an overload with the same labels and types already exists.
    pub fn add_function(&mut self, function: FunctionRef) -> EvalResult<()> {
        let name = function.name().to_string();
        let overloads = self.functions.entry(name).or_default();
        push_overload(overloads, function)
    }

    /// Add a method on `receiver` and its descendants.
    ///
    /// The method's first rule binds the receiver and must be labelled `self`.
    pub fn add_method(&mut self, receiver: TypeId, function: FunctionRef) -> EvalResult<()> {
        if function.rules().get(0).map(|rule| rule.label()) != Some("self") {
            return Err(custom(format!(
                "method '{}' must take the receiver as its first argument 'self'",
                function.name()
            )));
        }
        let key = MethodKey::new(receiver, function.name());
        let overloads = self.methods.entry(key).or_default();
        push_overload(overloads, function)
    }

    pub fn install(&mut self, plugin: &dyn Plugin) -> EvalResult<()> {
        plugin
            .register(self)
            .map_err(|err| err.with_note(format!("while installing plugin {}", plugin.name())))?;
        tracing::debug!(plugin = plugin.name(), "plugin installed");
        Ok(())
    }

    pub fn build(self) -> Registry {
        Registry {
            types: self.types,
            functions: FunctionTable {
                functions: self
                    .functions
                    .into_iter()
                    .map(|(name, overloads)| {
                        let value = FunctionValue::new(&name, overloads);
                        (name, value)
                    })
                    .collect(),
            },
            methods: MethodTable {
                methods: self
                    .methods
                    .into_iter()
                    .map(|(key, overloads)| {
                        let value = FunctionValue::new(&key.method, overloads);
                        (key, value)
                    })
                    .collect(),
            },
        }
    }
}

impl Default for RegistryBuilder {
    fn default() -> Self {
        Self::new()
    }
}

fn push_overload(overloads: &mut Vec<FunctionRef>, function: FunctionRef) -> EvalResult<()> {
    if overloads
        .iter()
        .any(|existing| existing.rules().same_formals(function.rules()))
    {
        return Err(custom(format!(
            "function '{}' already has an overload with these arguments",
            function.name()
        )));
    }
    overloads.push(function);
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used, reason = "tests use unwrap for brevity")]
mod tests;
