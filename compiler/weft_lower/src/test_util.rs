//! Shared fixtures for the crate's tests.

use weft_ir::{
    Clause, ClauseKind, ClauseSet, ConstructKind, Directive, DirectiveId, Expr, ExprId, ExprKind,
    Name, RangeFor, Span, Stmt, SymbolId,
};

use crate::sharing::DataSharingEnvironment;
use crate::{LowerConfig, LowerContext};

/// A lowering context plus builders for the tree shapes tests need.
pub struct TestUnit {
    pub ctx: LowerContext,
    next_directive: u32,
}

impl TestUnit {
    pub fn new() -> Self {
        Self::with_config(LowerConfig::default())
    }

    pub fn with_config(config: LowerConfig) -> Self {
        TestUnit {
            ctx: LowerContext::new(config),
            next_directive: 0,
        }
    }

    pub fn name(&self, text: &str) -> Name {
        self.ctx.interner.intern(text)
    }

    pub fn variable(&mut self, text: &str) -> SymbolId {
        let name = self.ctx.interner.intern(text);
        self.ctx.symbols.new_symbol(name, Span::DUMMY)
    }

    pub fn parameter(&mut self, text: &str, is_reference: bool) -> SymbolId {
        let name = self.ctx.interner.intern(text);
        self.ctx
            .symbols
            .new_parameter(name, Span::DUMMY, is_reference)
    }

    pub fn subscript(&mut self, base: ExprId, indices: Vec<ExprId>) -> ExprId {
        self.ctx
            .arena
            .alloc(Expr::new(ExprKind::Subscript { base, indices }, Span::DUMMY))
    }

    pub fn directive_id(&mut self) -> DirectiveId {
        let id = DirectiveId::from_raw(self.next_directive);
        self.next_directive += 1;
        id
    }

    /// `#pragma ... <kind> <clauses>` over `body`.
    pub fn directive(&mut self, kind: ConstructKind, clauses: ClauseSet, body: Stmt) -> Directive {
        Directive {
            id: self.directive_id(),
            kind,
            clauses,
            body: Some(Box::new(body)),
            symbols: Vec::new(),
            name: None,
            span: Span::new(1, 2),
        }
    }

    /// `for (iv = lower; iv <= upper; iv += step) ;` with literal bounds.
    pub fn counted_loop(&mut self, iv: SymbolId, lower: i64, upper: i64, step: i64) -> RangeFor {
        let lower = self.ctx.arena.int(lower);
        let upper = self.ctx.arena.int(upper);
        let step = self.ctx.arena.int(step);
        RangeFor {
            induction: iv,
            lower,
            upper,
            step,
            body: Box::new(Stmt::Empty),
        }
    }

    pub fn presence_clause(&self, kind: ClauseKind) -> Clause {
        Clause::new(kind, Span::new(1, 2))
    }

    pub fn expr_clause(&self, kind: ClauseKind, exprs: Vec<ExprId>) -> Clause {
        Clause::new(kind, Span::new(1, 2)).with_exprs(exprs)
    }

    pub fn token_clause(&self, kind: ClauseKind, tokens: &[&str]) -> Clause {
        let tokens = tokens.iter().map(|t| self.ctx.interner.intern(t)).collect();
        Clause::new(kind, Span::new(1, 2)).with_tokens(tokens)
    }

    pub fn empty_env(&self, construct: ConstructKind) -> DataSharingEnvironment {
        DataSharingEnvironment::new(construct)
    }
}
