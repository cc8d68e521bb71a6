//! Arena allocation for expressions.
//!
//! Expressions are flattened: children are `ExprId` indices into one arena
//! per compilation unit. Rewrites allocate new nodes instead of mutating,
//! so a dependency expression reachable from several environment nodes can
//! be rewritten for one of them without aliasing hazards.

use crate::{BinaryOp, Expr, ExprId, ExprKind, Span, SymbolId};

/// Flat expression storage.
#[derive(Default, Debug)]
pub struct ExprArena {
    exprs: Vec<Expr>,
}

impl ExprArena {
    pub fn new() -> Self {
        ExprArena::default()
    }

    /// Allocate an expression, returning its id.
    pub fn alloc(&mut self, expr: Expr) -> ExprId {
        let id = ExprId::from_raw(u32::try_from(self.exprs.len()).unwrap_or(u32::MAX));
        self.exprs.push(expr);
        id
    }

    pub fn kind(&self, id: ExprId) -> &ExprKind {
        &self.exprs[id.raw() as usize].kind
    }

    pub fn span(&self, id: ExprId) -> Span {
        self.exprs[id.raw() as usize].span
    }

    pub fn len(&self) -> usize {
        self.exprs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.exprs.is_empty()
    }

    // Convenience constructors for synthesized nodes. All carry dummy
    // spans; synthesized code has no source location.

    pub fn int(&mut self, value: i64) -> ExprId {
        self.alloc(Expr::new(ExprKind::Int(value), Span::DUMMY))
    }

    pub fn symbol(&mut self, sym: SymbolId) -> ExprId {
        self.alloc(Expr::new(ExprKind::Symbol(sym), Span::DUMMY))
    }

    pub fn binary(&mut self, op: BinaryOp, lhs: ExprId, rhs: ExprId) -> ExprId {
        self.alloc(Expr::new(ExprKind::Binary { op, lhs, rhs }, Span::DUMMY))
    }

    /// Binary operation, constant-folded when both operands are integer
    /// literals. The taskloop blocked step `grainsize * step` goes through
    /// here so compile-time-constant blocks stay literals.
    pub fn binary_folded(&mut self, op: BinaryOp, lhs: ExprId, rhs: ExprId) -> ExprId {
        if let (ExprKind::Int(a), ExprKind::Int(b)) = (self.kind(lhs), self.kind(rhs)) {
            let (a, b) = (*a, *b);
            let folded = match op {
                BinaryOp::Add => a.checked_add(b),
                BinaryOp::Sub => a.checked_sub(b),
                BinaryOp::Mul => a.checked_mul(b),
                BinaryOp::Div if b != 0 => a.checked_div(b),
                BinaryOp::Div | BinaryOp::Lt => None,
            };
            if let Some(value) = folded {
                return self.int(value);
            }
        }
        self.binary(op, lhs, rhs)
    }

    pub fn range(&mut self, lower: ExprId, upper: ExprId, stride: ExprId) -> ExprId {
        self.alloc(Expr::new(
            ExprKind::Range {
                lower,
                upper,
                stride,
            },
            Span::DUMMY,
        ))
    }

    /// Evaluate an expression if it is a compile-time integer constant.
    pub fn const_value(&self, id: ExprId) -> Option<i64> {
        match self.kind(id) {
            ExprKind::Int(v) => Some(*v),
            ExprKind::Binary { op, lhs, rhs } => {
                let a = self.const_value(*lhs)?;
                let b = self.const_value(*rhs)?;
                match op {
                    BinaryOp::Add => a.checked_add(b),
                    BinaryOp::Sub => a.checked_sub(b),
                    BinaryOp::Mul => a.checked_mul(b),
                    BinaryOp::Div if b != 0 => a.checked_div(b),
                    BinaryOp::Div => None,
                    BinaryOp::Lt => Some(i64::from(a < b)),
                }
            }
            _ => None,
        }
    }

    /// True when any node reachable from `id` references `sym`.
    pub fn references_symbol(&self, id: ExprId, sym: SymbolId) -> bool {
        match self.kind(id) {
            ExprKind::Int(_) | ExprKind::Opaque(_) => false,
            ExprKind::Symbol(s) => *s == sym,
            ExprKind::Binary { lhs, rhs, .. } => {
                self.references_symbol(*lhs, sym) || self.references_symbol(*rhs, sym)
            }
            ExprKind::Subscript { base, indices } => {
                self.references_symbol(*base, sym)
                    || indices.iter().any(|ix| self.references_symbol(*ix, sym))
            }
            ExprKind::Range {
                lower,
                upper,
                stride,
            } => {
                self.references_symbol(*lower, sym)
                    || self.references_symbol(*upper, sym)
                    || self.references_symbol(*stride, sym)
            }
        }
    }
}
