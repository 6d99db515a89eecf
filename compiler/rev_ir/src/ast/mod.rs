//! Syntax tree consumed by the evaluator.
//!
//! Nodes live in a flat [`ExprArena`] and refer to each other by [`ExprId`].
//! The grammar that produces them is not part of this workspace; the arena's
//! builder methods are how hosts (and tests) construct scripts directly.

mod expr;
mod operators;

use std::fmt;
use std::sync::Arc;

pub use expr::{Call, CallArg, ExprKind, FunctionDef, IndexList, Param, VariableRef};
pub use operators::{AssignOp, BinaryOp, ParamMode, UnaryOp};

use crate::Name;

/// Index into an expression arena.
#[derive(Copy, Clone, Eq, PartialEq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(transparent)]
pub struct ExprId(u32);

impl ExprId {
    /// Create a new `ExprId`.
    #[inline]
    pub const fn new(index: u32) -> Self {
        ExprId(index)
    }

    /// Index into the arena.
    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Debug for ExprId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ExprId({})", self.0)
    }
}

/// Flat storage for expression nodes.
#[derive(Clone, Default, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ExprArena {
    exprs: Vec<ExprKind>,
}

impl ExprArena {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a node and return its id.
    ///
    /// # Panics
    /// Panics if the arena holds more than `u32::MAX` nodes.
    pub fn alloc(&mut self, kind: ExprKind) -> ExprId {
        let index = u32::try_from(self.exprs.len())
            .unwrap_or_else(|_| panic!("expression arena exceeded {} nodes", u32::MAX));
        self.exprs.push(kind);
        ExprId(index)
    }

    /// The node behind `id`.
    ///
    /// # Panics
    /// Panics if `id` was not allocated by this arena.
    #[inline]
    pub fn get(&self, id: ExprId) -> &ExprKind {
        &self.exprs[id.index()]
    }

    pub fn len(&self) -> usize {
        self.exprs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.exprs.is_empty()
    }

    // Builders

    pub fn null(&mut self) -> ExprId {
        self.alloc(ExprKind::Null)
    }

    pub fn bool(&mut self, value: bool) -> ExprId {
        self.alloc(ExprKind::Bool(value))
    }

    pub fn int(&mut self, value: i64) -> ExprId {
        self.alloc(ExprKind::Int(value))
    }

    pub fn real(&mut self, value: f64) -> ExprId {
        self.alloc(ExprKind::Real(value))
    }

    pub fn string(&mut self, value: Name) -> ExprId {
        self.alloc(ExprKind::Str(value))
    }

    /// A plain variable reference, `name`.
    pub fn var(&mut self, name: Name) -> ExprId {
        self.indexed(name, [])
    }

    /// An indexed variable reference, `name[i]...`.
    pub fn indexed(&mut self, name: Name, indices: impl IntoIterator<Item = ExprId>) -> ExprId {
        self.alloc(ExprKind::Variable(VariableRef {
            base: None,
            name,
            indices: indices.into_iter().collect(),
        }))
    }

    /// A member reference, `base.name`.
    pub fn member(&mut self, base: ExprId, name: Name) -> ExprId {
        self.alloc(ExprKind::Variable(VariableRef {
            base: Some(base),
            name,
            indices: IndexList::new(),
        }))
    }

    /// A function call, `name(args)`.
    pub fn call(&mut self, name: Name, args: impl IntoIterator<Item = CallArg>) -> ExprId {
        self.alloc(ExprKind::Call(Call {
            base: None,
            name,
            args: args.into_iter().collect(),
            indices: IndexList::new(),
        }))
    }

    /// A method call, `base.name(args)`.
    pub fn method(
        &mut self,
        base: ExprId,
        name: Name,
        args: impl IntoIterator<Item = CallArg>,
    ) -> ExprId {
        self.alloc(ExprKind::Call(Call {
            base: Some(base),
            name,
            args: args.into_iter().collect(),
            indices: IndexList::new(),
        }))
    }

    pub fn unary(&mut self, op: UnaryOp, operand: ExprId) -> ExprId {
        self.alloc(ExprKind::Unary { op, operand })
    }

    pub fn binary(&mut self, op: BinaryOp, left: ExprId, right: ExprId) -> ExprId {
        self.alloc(ExprKind::Binary { op, left, right })
    }

    pub fn assign(&mut self, op: AssignOp, target: ExprId, value: ExprId) -> ExprId {
        self.alloc(ExprKind::Assign { op, target, value })
    }

    pub fn for_loop(&mut self, var: Name, iterable: ExprId, body: Vec<ExprId>) -> ExprId {
        self.alloc(ExprKind::For {
            var,
            iterable,
            body,
        })
    }

    pub fn function_def(&mut self, def: FunctionDef) -> ExprId {
        self.alloc(ExprKind::FunctionDef(Box::new(def)))
    }
}

/// Shared, immutable arena.
///
/// User functions keep their defining arena alive through this handle so
/// their bodies can run long after the defining statement returned.
#[derive(Clone, Debug)]
pub struct SharedArena(Arc<ExprArena>);

impl SharedArena {
    pub fn new(arena: ExprArena) -> Self {
        SharedArena(Arc::new(arena))
    }

    /// Whether both handles share one arena.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl std::ops::Deref for SharedArena {
    type Target = ExprArena;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl From<ExprArena> for SharedArena {
    fn from(arena: ExprArena) -> Self {
        SharedArena::new(arena)
    }
}
