//! Expression nodes.
//!
//! Only the shapes the lowering pass inspects or synthesizes are modeled:
//! data references (symbols, subscripts, ranges) for dependency items, and
//! the small arithmetic vocabulary the taskloop blocker emits. Anything the
//! front end hands us beyond that travels through untouched as `Opaque`.

use crate::{ExprArena, Name, Span, SymbolId};

/// Index into an [`ExprArena`].
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
#[cfg_attr(feature = "module", derive(serde::Serialize, serde::Deserialize))]
#[repr(transparent)]
pub struct ExprId(u32);

impl ExprId {
    #[inline]
    pub const fn raw(self) -> u32 {
        self.0
    }

    #[inline]
    pub const fn from_raw(raw: u32) -> Self {
        ExprId(raw)
    }
}

impl std::fmt::Debug for ExprId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ExprId({})", self.0)
    }
}

/// Binary operators the blocker synthesizes or folds.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
#[cfg_attr(feature = "module", derive(serde::Serialize, serde::Deserialize))]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    /// Integer division. Used for the `numtasks` → grainsize computation.
    Div,
    Lt,
}

/// Expression node kind.
#[derive(Clone, PartialEq, Eq, Hash, Debug)]
#[cfg_attr(feature = "module", derive(serde::Serialize, serde::Deserialize))]
pub enum ExprKind {
    /// Integer literal. Also the result of constant folding.
    Int(i64),
    /// Reference to a declared symbol.
    Symbol(SymbolId),
    /// Binary operation.
    Binary {
        op: BinaryOp,
        lhs: ExprId,
        rhs: ExprId,
    },
    /// Array subscript: `base[s0][s1]...`. One entry per bracket.
    Subscript { base: ExprId, indices: Vec<ExprId> },
    /// Inclusive range with stride: `lower : upper : stride`. Produced by
    /// array-section clauses and by the taskloop dependency rewrite.
    Range {
        lower: ExprId,
        upper: ExprId,
        stride: ExprId,
    },
    /// Front-end expression the lowering pass never looks into. The name
    /// is its pretty-printed spelling, kept for diagnostics.
    Opaque(Name),
}

/// An expression with its source location.
#[derive(Clone, PartialEq, Eq, Hash, Debug)]
#[cfg_attr(feature = "module", derive(serde::Serialize, serde::Deserialize))]
pub struct Expr {
    pub kind: ExprKind,
    pub span: Span,
}

impl Expr {
    pub fn new(kind: ExprKind, span: Span) -> Self {
        Expr { kind, span }
    }
}

/// The symbol named by a bare symbol reference, if the expression is one.
pub fn bare_symbol(arena: &ExprArena, id: ExprId) -> Option<SymbolId> {
    match arena.kind(id) {
        ExprKind::Symbol(sym) => Some(*sym),
        _ => None,
    }
}
