//! Weft IR - shared types for the directive lowering pipeline.
//!
//! This crate contains the data structures exchanged between the front-end
//! collaborators (clause parser, scope machinery) and the lowering core:
//! - Spans for source locations
//! - Names for interned identifiers
//! - Symbols and the per-unit symbol table
//! - Expression arena (data references, array sections, ranges)
//! - Statement tree (the shape the lowering pass rewrites in place)
//! - Raw clause surface (`ClauseSet`), as produced by the pragma parser
//! - The execution environment (`EnvNode` sum type + ordered node list)
//! - Data-sharing attributes, dependency items, target info, function task
//!   records
//!
//! # Design Philosophy
//!
//! - **Intern everything**: strings become `Name(u32)`
//! - **Flatten everything**: expressions live in an `ExprArena`, referenced
//!   by `ExprId(u32)` indices, never `Box<Expr>`
//! - **Closed sums**: the execution environment is a tagged union with
//!   exhaustive matching, so "one node per category" is checkable

mod arena;
mod clause;
mod deps;
mod env;
mod expr;
mod interner;
mod name;
mod pretty;
mod sharing;
mod span;
mod stmt;
mod symbol;
mod target;
mod task_info;
pub mod visitor;

pub use arena::ExprArena;
pub use clause::{Clause, ClauseKind, ClauseSet, DefaultKind};
pub use deps::{DepDirection, DependencyItem};
pub use env::{EnvNode, ExecutionEnvironment, ReductionItem};
pub use expr::{bare_symbol, BinaryOp, Expr, ExprId, ExprKind};
pub use interner::StringInterner;
pub use name::Name;
pub use pretty::pretty_expr;
pub use sharing::DataSharingAttribute;
pub use span::Span;
pub use stmt::{ConstructKind, Directive, DirectiveId, RangeFor, Stmt};
pub use symbol::{Symbol, SymbolId, SymbolTable};
pub use target::TargetInfo;
pub use task_info::{ErrorBehavior, FunctionTaskInfo, RealTimeInfo};
pub use visitor::{walk_expr, ExprFolder, SymbolSubst};
