//! Expression rewriting.
//!
//! A folder is a pure tree-rewrite: it returns an [`ExprId`], allocating
//! new nodes for anything it changes and returning the input id untouched
//! otherwise. Existing nodes are never mutated, so an expression reachable
//! from several environment nodes can be rewritten for one of them without
//! affecting the others.

use crate::{Expr, ExprArena, ExprId, ExprKind, SymbolId};

/// Tree-rewrite visitor over expressions.
///
/// Implementors override the hooks they care about; [`walk_expr`] handles
/// recursion and node reconstruction.
pub trait ExprFolder {
    /// Rewrite one expression. Default: structural walk.
    fn fold_expr(&mut self, arena: &mut ExprArena, id: ExprId) -> ExprId {
        walk_expr(self, arena, id)
    }

    /// Hook for symbol references. Default: unchanged.
    fn fold_symbol(&mut self, arena: &mut ExprArena, id: ExprId, sym: SymbolId) -> ExprId {
        let _ = (arena, sym);
        id
    }

    /// Hook for one subscript index expression. Default: recurse.
    fn fold_subscript_index(&mut self, arena: &mut ExprArena, index: ExprId) -> ExprId {
        self.fold_expr(arena, index)
    }
}

/// Structural walk: fold children, reallocate the node only when a child
/// changed.
pub fn walk_expr<F: ExprFolder + ?Sized>(
    folder: &mut F,
    arena: &mut ExprArena,
    id: ExprId,
) -> ExprId {
    let span = arena.span(id);
    match arena.kind(id).clone() {
        ExprKind::Int(_) | ExprKind::Opaque(_) => id,
        ExprKind::Symbol(sym) => folder.fold_symbol(arena, id, sym),
        ExprKind::Binary { op, lhs, rhs } => {
            let new_lhs = folder.fold_expr(arena, lhs);
            let new_rhs = folder.fold_expr(arena, rhs);
            if new_lhs == lhs && new_rhs == rhs {
                id
            } else {
                arena.alloc(Expr::new(
                    ExprKind::Binary {
                        op,
                        lhs: new_lhs,
                        rhs: new_rhs,
                    },
                    span,
                ))
            }
        }
        ExprKind::Subscript { base, indices } => {
            let new_base = folder.fold_expr(arena, base);
            let new_indices: Vec<ExprId> = indices
                .iter()
                .map(|&ix| folder.fold_subscript_index(arena, ix))
                .collect();
            if new_base == base && new_indices == indices {
                id
            } else {
                arena.alloc(Expr::new(
                    ExprKind::Subscript {
                        base: new_base,
                        indices: new_indices,
                    },
                    span,
                ))
            }
        }
        ExprKind::Range {
            lower,
            upper,
            stride,
        } => {
            let new_lower = folder.fold_expr(arena, lower);
            let new_upper = folder.fold_expr(arena, upper);
            let new_stride = folder.fold_expr(arena, stride);
            if new_lower == lower && new_upper == upper && new_stride == stride {
                id
            } else {
                arena.alloc(Expr::new(
                    ExprKind::Range {
                        lower: new_lower,
                        upper: new_upper,
                        stride: new_stride,
                    },
                    span,
                ))
            }
        }
    }
}

/// Substitute every reference to one symbol with a reference to another.
pub struct SymbolSubst {
    pub from: SymbolId,
    pub to: SymbolId,
}

impl ExprFolder for SymbolSubst {
    fn fold_symbol(&mut self, arena: &mut ExprArena, id: ExprId, sym: SymbolId) -> ExprId {
        if sym == self.from {
            arena.symbol(self.to)
        } else {
            id
        }
    }
}
