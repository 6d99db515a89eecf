//! Names and syntax tree for the Rev interpreter.
//!
//! This crate has no evaluation logic: [`rev_eval`] consumes the trees built
//! here. Identifiers are interned into [`Name`]s; expressions live in an
//! [`ExprArena`] and are addressed by [`ExprId`].
//!
//! [`rev_eval`]: ../rev_eval/index.html

pub mod ast;
mod interner;
mod name;

pub use ast::{
    AssignOp, BinaryOp, Call, CallArg, ExprArena, ExprId, ExprKind, FunctionDef, IndexList, Param,
    ParamMode, SharedArena, UnaryOp, VariableRef,
};
pub use interner::{InternError, SharedInterner, StringInterner};
pub use name::Name;
