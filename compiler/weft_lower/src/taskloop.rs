//! Taskloop blocking.
//!
//! A `taskloop` lowers to an outer driver loop that steps a fresh induction
//! variable by `grainsize * step` and spawns one task per block. Each task
//! runs the original loop body over `[block_start, block_extent]` with the
//! original induction variable and step. The block extent is clamped to the
//! loop's upper bound, so a trailing partial block covers exactly the
//! remaining iterations.
//!
//! Dependencies declared on the taskloop are rewritten per block: bare
//! references to the original induction variable become references to the
//! driver variable, and subscript indices that involve it become ranges
//! spanning the whole block. Reductions demote to task reductions, since
//! each block is an independent task.

use weft_ir::{
    walk_expr, BinaryOp, ClauseKind, ClauseSet, EnvNode, ExecutionEnvironment, ExprArena,
    ExprFolder, ExprId, ExprKind, RangeFor, Span, Stmt, SymbolId, SymbolSubst,
};

use crate::error::internal_error;
use crate::{LowerContext, LowerError, LowerResult};

/// Progress of one blocking run. The blocker is single-use.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum BlockerState {
    Initial,
    Validated,
    Blocked,
    Done,
}

/// Rewrites one `taskloop` into its blocked form.
#[derive(Debug)]
pub struct TaskloopBlocker {
    state: BlockerState,
}

impl TaskloopBlocker {
    pub fn new() -> Self {
        TaskloopBlocker {
            state: BlockerState::Initial,
        }
    }

    pub fn state(&self) -> BlockerState {
        self.state
    }

    /// Block `loop_` under the grain-size clauses of `clauses`, attaching
    /// `env` to the per-block task.
    ///
    /// On a clause validation failure nothing is transformed: no fresh
    /// symbols exist, no expression was rewritten, and the caller keeps the
    /// original statement.
    pub fn run(
        &mut self,
        ctx: &mut LowerContext,
        clauses: &ClauseSet,
        loop_: RangeFor,
        mut env: ExecutionEnvironment,
        span: Span,
    ) -> LowerResult<Stmt> {
        if self.state != BlockerState::Initial {
            internal_error!("taskloop blocker ran twice");
        }
        let grainsize = self.validate(ctx, clauses, &loop_, span)?;
        self.state = BlockerState::Validated;

        let driver = ctx.fresh_symbol("taskloop_iv");
        let extent = ctx.fresh_symbol("block_extent");

        self.rewrite_dependences(ctx, &mut env, loop_.induction, driver, extent)?;
        for node in env.nodes_mut() {
            if let EnvNode::Reduction(items) = node {
                *node = EnvNode::TaskReduction(std::mem::take(items));
            }
        }
        env.extend_firstprivate([driver, extent]);
        self.state = BlockerState::Blocked;

        // extent = driver + grainsize - 1, clamped to the loop bound.
        let driver_ref = ctx.arena.symbol(driver);
        let one = ctx.arena.int(1);
        let past_end = ctx.arena.binary_folded(BinaryOp::Add, driver_ref, grainsize);
        let extent_value = ctx.arena.binary_folded(BinaryOp::Sub, past_end, one);
        let assign_extent = Stmt::Assign {
            target: extent,
            value: extent_value,
        };
        let extent_ref = ctx.arena.symbol(extent);
        let overshoots = ctx.arena.binary(BinaryOp::Lt, loop_.upper, extent_ref);
        let clamp = Stmt::If {
            condition: overshoots,
            then_branch: Box::new(Stmt::Assign {
                target: extent,
                value: loop_.upper,
            }),
            else_branch: None,
        };

        let block_start = ctx.arena.symbol(driver);
        let block_end = ctx.arena.symbol(extent);
        let inner = Stmt::RangeFor(RangeFor {
            induction: loop_.induction,
            lower: block_start,
            upper: block_end,
            step: loop_.step,
            body: loop_.body,
        });
        let task = Stmt::Task {
            env,
            body: Box::new(inner),
        };

        let blocked_step = ctx.arena.binary_folded(BinaryOp::Mul, grainsize, loop_.step);
        let outer = Stmt::RangeFor(RangeFor {
            induction: driver,
            lower: loop_.lower,
            upper: loop_.upper,
            step: blocked_step,
            body: Box::new(Stmt::Compound(vec![assign_extent, clamp, task])),
        });
        self.state = BlockerState::Done;
        ctx.report(format_args!("Taskloop blocked into per-grain tasks"));
        Ok(outer)
    }

    /// Resolve the grain size from `grainsize`/`num_tasks`. Exactly one of
    /// the two clauses must be present.
    fn validate(
        &mut self,
        ctx: &mut LowerContext,
        clauses: &ClauseSet,
        loop_: &RangeFor,
        span: Span,
    ) -> LowerResult<ExprId> {
        let grainsize = clauses.get(ClauseKind::Grainsize);
        let num_tasks = clauses.get(ClauseKind::Numtasks);

        if grainsize.is_some() && num_tasks.is_some() {
            ctx.error(
                span,
                "'grainsize' and 'num_tasks' clauses cannot both appear \
                 in a 'taskloop' construct",
            );
            return Err(LowerError::ConstructAborted);
        }

        if let Some(clause) = grainsize {
            let [expr] = clause.exprs[..] else {
                ctx.error(clause.span, "'grainsize' clause requires a single expression");
                return Err(LowerError::ConstructAborted);
            };
            return Ok(expr);
        }

        if let Some(clause) = num_tasks {
            let [tasks] = clause.exprs[..] else {
                ctx.error(clause.span, "'num_tasks' clause requires a single expression");
                return Err(LowerError::ConstructAborted);
            };
            // grainsize = ceil(trip_count / num_tasks)
            let range = ctx
                .arena
                .binary_folded(BinaryOp::Sub, loop_.upper, loop_.lower);
            let spans = ctx.arena.binary_folded(BinaryOp::Div, range, loop_.step);
            let one = ctx.arena.int(1);
            let trip = ctx.arena.binary_folded(BinaryOp::Add, spans, one);
            let tasks_less_one = ctx.arena.binary_folded(BinaryOp::Sub, tasks, one);
            let rounded = ctx.arena.binary_folded(BinaryOp::Add, trip, tasks_less_one);
            return Ok(ctx.arena.binary_folded(BinaryOp::Div, rounded, tasks));
        }

        ctx.error(
            span,
            "'taskloop' construct is missing a 'grainsize' or a 'num_tasks' \
             clause",
        );
        Err(LowerError::ConstructAborted)
    }

    /// Rewrite every dependence expression for the blocked shape.
    fn rewrite_dependences(
        &mut self,
        ctx: &mut LowerContext,
        env: &mut ExecutionEnvironment,
        original: SymbolId,
        driver: SymbolId,
        extent: SymbolId,
    ) -> LowerResult<()> {
        let mut rewriter = DepBlockRewriter {
            extent,
            subst: SymbolSubst {
                from: original,
                to: driver,
            },
            nested_range: false,
        };
        for node in env.nodes_mut() {
            let items = match node {
                EnvNode::DepIn(items)
                | EnvNode::DepInPrivate(items)
                | EnvNode::DepOut(items)
                | EnvNode::DepInout(items)
                | EnvNode::Concurrent(items)
                | EnvNode::Commutative(items) => items,
                _ => continue,
            };
            for item in items.iter_mut() {
                item.expr = rewriter.fold_expr(&mut ctx.arena, item.expr);
            }
        }
        if rewriter.nested_range {
            internal_error!(
                "taskloop dependence already carries a range over the \
                 induction variable"
            );
        }
        Ok(())
    }
}

impl Default for TaskloopBlocker {
    fn default() -> Self {
        TaskloopBlocker::new()
    }
}

/// Per-block dependence rewrite.
///
/// Bare `i` becomes the driver variable; a subscript index involving `i`
/// becomes the block range `[rewritten_index : extent : 1]`. An index that
/// is already a range over `i` has no blocked equivalent and is a front-end
/// invariant violation, recorded for the caller to surface.
struct DepBlockRewriter {
    extent: SymbolId,
    subst: SymbolSubst,
    nested_range: bool,
}

impl ExprFolder for DepBlockRewriter {
    fn fold_symbol(&mut self, arena: &mut ExprArena, id: ExprId, sym: SymbolId) -> ExprId {
        self.subst.fold_symbol(arena, id, sym)
    }

    fn fold_subscript_index(&mut self, arena: &mut ExprArena, index: ExprId) -> ExprId {
        if matches!(arena.kind(index), ExprKind::Range { .. })
            && arena.references_symbol(index, self.subst.from)
        {
            self.nested_range = true;
            return index;
        }
        let blocked = arena.references_symbol(index, self.subst.from);
        let rewritten = walk_expr(self, arena, index);
        if !blocked {
            return rewritten;
        }
        let upper = arena.symbol(self.extent);
        let one = arena.int(1);
        arena.range(rewritten, upper, one)
    }
}
