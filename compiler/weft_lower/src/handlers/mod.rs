//! Per-construct lowering handlers.
//!
//! [`lower_unit`] drives a post-order traversal: statement bodies lower
//! before the directives that wrap them, so by the time a handler runs its
//! body is already in lowered form. Each handler wires one construct's
//! data-sharing environment and clause set through the environment builder
//! and replaces the directive with its lowered statement.
//!
//! A handler failing with [`LowerError::ConstructAborted`] has already
//! queued its diagnostic; the driver keeps the original directive statement
//! and moves on. [`LowerError::Internal`] propagates and aborts the run.

mod function_task;
mod parallel;
mod sync;
mod task;
mod worksharing;

pub use function_task::{register_function_task, FunctionTaskDecl};

use weft_ir::{ConstructKind, Directive, Stmt};

use crate::error::internal_error;
use crate::sharing::{DataSharingEnvironment, DataSharingRegistry};
use crate::{LowerContext, LowerError, LowerResult};

/// Lower every directive in `stmt`, bottom-up.
pub fn lower_unit(
    ctx: &mut LowerContext,
    registry: &mut DataSharingRegistry,
    stmt: Stmt,
) -> LowerResult<Stmt> {
    match stmt {
        Stmt::Compound(stmts) => {
            let mut lowered = Vec::with_capacity(stmts.len());
            for inner in stmts {
                lowered.push(lower_unit(ctx, registry, inner)?);
            }
            Ok(Stmt::Compound(lowered))
        }
        Stmt::If {
            condition,
            then_branch,
            else_branch,
        } => {
            let then_branch = Box::new(lower_unit(ctx, registry, *then_branch)?);
            let else_branch = match else_branch {
                Some(stmt) => Some(Box::new(lower_unit(ctx, registry, *stmt)?)),
                None => None,
            };
            Ok(Stmt::If {
                condition,
                then_branch,
                else_branch,
            })
        }
        Stmt::RangeFor(mut loop_) => {
            loop_.body = Box::new(lower_unit(ctx, registry, *loop_.body)?);
            Ok(Stmt::RangeFor(loop_))
        }
        Stmt::Directive(directive) => lower_directive_stmt(ctx, registry, directive),
        other => Ok(other),
    }
}

fn lower_directive_stmt(
    ctx: &mut LowerContext,
    registry: &mut DataSharingRegistry,
    mut directive: Directive,
) -> LowerResult<Stmt> {
    if let Some(body) = directive.body.take() {
        directive.body = Some(Box::new(lower_unit(ctx, registry, *body)?));
    }
    // A `section` block is consumed by its enclosing `sections` handler,
    // never dispatched on its own.
    if directive.kind == ConstructKind::Section {
        return Ok(Stmt::Directive(directive));
    }
    match lower_directive(ctx, registry, directive.clone()) {
        Ok(lowered) => Ok(lowered),
        Err(LowerError::ConstructAborted) => Ok(Stmt::Directive(directive)),
        Err(err) => Err(err),
    }
}

/// Lower one directive whose body is already lowered.
pub fn lower_directive(
    ctx: &mut LowerContext,
    registry: &mut DataSharingRegistry,
    directive: Directive,
) -> LowerResult<Stmt> {
    let _span =
        tracing::debug_span!("lower_directive", kind = ?directive.kind, id = directive.id.raw())
            .entered();
    match directive.kind {
        ConstructKind::Task => task::lower_task(ctx, registry, directive),
        ConstructKind::Taskloop => task::lower_taskloop(ctx, registry, directive),
        ConstructKind::Parallel => parallel::lower_parallel(ctx, registry, directive),
        ConstructKind::ParallelFor | ConstructKind::ParallelSections => {
            parallel::lower_combined(ctx, registry, directive)
        }
        ConstructKind::For => worksharing::lower_for(ctx, registry, directive),
        ConstructKind::Sections => worksharing::lower_sections(ctx, registry, directive),
        ConstructKind::Single => worksharing::lower_single(ctx, registry, directive),
        ConstructKind::Workshare => worksharing::lower_workshare(ctx, registry, directive),
        ConstructKind::Critical => sync::lower_critical(ctx, directive),
        ConstructKind::Taskwait => sync::lower_taskwait(ctx, registry, directive),
        ConstructKind::Taskyield => Ok(sync::lower_taskyield(ctx)),
        ConstructKind::Threadprivate => Ok(sync::lower_threadprivate(ctx, &directive)),
        ConstructKind::Section => {
            internal_error!("'section' directive outside an enclosing 'sections'")
        }
    }
}

/// The data-sharing environment the analysis pass prepared for `directive`.
fn take_sharing(
    registry: &mut DataSharingRegistry,
    directive: &Directive,
) -> LowerResult<DataSharingEnvironment> {
    match registry.take(directive.id) {
        Some(ds) => Ok(ds),
        None => internal_error!(
            "no data-sharing environment for {:?} directive",
            directive.kind
        ),
    }
}

fn take_body(directive: &mut Directive) -> LowerResult<Stmt> {
    match directive.body.take() {
        Some(body) => Ok(*body),
        None => internal_error!("{:?} directive without a body", directive.kind),
    }
}

#[cfg(test)]
#[expect(clippy::unwrap_used, reason = "Tests use unwrap for brevity")]
mod tests {
    use super::*;
    use crate::test_util::TestUnit;
    use pretty_assertions::assert_eq;
    use weft_ir::{
        ClauseKind, ClauseSet, DataSharingAttribute, EnvNode, ExprKind, Stmt,
    };

    fn registered(
        directive: &Directive,
        build: impl FnOnce(&mut DataSharingEnvironment),
    ) -> DataSharingRegistry {
        let mut ds = DataSharingEnvironment::new(directive.kind);
        build(&mut ds);
        let mut registry = DataSharingRegistry::new();
        registry.insert(directive.id, ds);
        registry
    }

    #[test]
    fn task_env_carries_sharings_then_target_then_flushes() {
        let mut unit = TestUnit::new();
        let x = unit.variable("x");
        let directive = unit.directive(
            weft_ir::ConstructKind::Task,
            ClauseSet::new(),
            Stmt::Empty,
        );
        let mut registry = registered(&directive, |ds| {
            ds.set_sharing(x, DataSharingAttribute::Firstprivate, false, "clause");
        });

        let lowered =
            lower_unit(&mut unit.ctx, &mut registry, Stmt::Directive(directive)).unwrap();
        let Stmt::Task { env, body } = lowered else {
            panic!("expected task, got {lowered:?}");
        };
        assert_eq!(*body, Stmt::Empty);
        assert_eq!(env.nodes().len(), 4);
        assert_eq!(env.nodes()[0], EnvNode::Firstprivate(vec![x]));
        assert!(matches!(env.nodes()[1], EnvNode::Target(_)));
        assert_eq!(env.nodes()[2], EnvNode::FlushAtEntry);
        assert_eq!(env.nodes()[3], EnvNode::FlushAtExit);
    }

    #[test]
    fn combined_worksharing_shares_outside_and_privatizes_inside() {
        let mut unit = TestUnit::new();
        let x = unit.variable("x");
        let i = unit.variable("i");
        let loop_ = unit.counted_loop(i, 0, 9, 1);
        let directive = unit.directive(
            weft_ir::ConstructKind::ParallelFor,
            ClauseSet::new(),
            Stmt::RangeFor(loop_),
        );
        let mut registry = registered(&directive, |ds| {
            ds.set_sharing(x, DataSharingAttribute::Firstprivate, false, "clause");
        });

        let lowered =
            lower_unit(&mut unit.ctx, &mut registry, Stmt::Directive(directive)).unwrap();
        let Stmt::Parallel { env, body, .. } = lowered else {
            panic!("expected parallel, got {lowered:?}");
        };
        assert_eq!(env.shared_symbols(), &[x]);
        assert!(env.has_barrier_at_end());
        let Stmt::For { env: inner, .. } = *body else {
            panic!("expected inner for, got {body:?}");
        };
        assert_eq!(inner.firstprivate_symbols(), &[x]);
        assert!(!inner.has_barrier_at_end());
        assert!(inner
            .nodes()
            .iter()
            .any(|n| matches!(n, EnvNode::CombinedWorksharing)));
    }

    #[test]
    fn aborted_construct_keeps_the_original_directive() {
        let mut unit = TestUnit::new();
        let i = unit.variable("i");
        let loop_ = unit.counted_loop(i, 0, 9, 1);
        let clauses =
            ClauseSet::new().with(unit.token_clause(ClauseKind::Schedule, &["sideways"]));
        let directive = unit.directive(
            weft_ir::ConstructKind::For,
            clauses,
            Stmt::RangeFor(loop_),
        );
        let mut registry = registered(&directive, |_| {});

        let lowered = lower_unit(
            &mut unit.ctx,
            &mut registry,
            Stmt::Directive(directive.clone()),
        )
        .unwrap();
        assert_eq!(lowered, Stmt::Directive(directive));
        assert_eq!(unit.ctx.diagnostics.error_count(), 1);
    }

    #[test]
    fn nested_directives_lower_bottom_up() {
        let mut unit = TestUnit::new();
        let inner = unit.directive(weft_ir::ConstructKind::Task, ClauseSet::new(), Stmt::Empty);
        let outer = unit.directive(
            weft_ir::ConstructKind::Parallel,
            ClauseSet::new(),
            Stmt::Directive(inner.clone()),
        );
        let mut registry = DataSharingRegistry::new();
        registry.insert(inner.id, DataSharingEnvironment::new(weft_ir::ConstructKind::Task));
        registry.insert(
            outer.id,
            DataSharingEnvironment::new(weft_ir::ConstructKind::Parallel),
        );

        let lowered = lower_unit(&mut unit.ctx, &mut registry, Stmt::Directive(outer)).unwrap();
        let Stmt::Parallel { body, .. } = lowered else {
            panic!("expected parallel, got {lowered:?}");
        };
        assert!(matches!(*body, Stmt::Task { .. }));
        assert!(registry.is_empty());
    }

    #[test]
    fn parallel_region_is_skipped_under_ompss_semantics() {
        let mut unit = TestUnit::with_config(crate::LowerConfig {
            ompss_mode: true,
            ..crate::LowerConfig::default()
        });
        let x = unit.variable("x");
        let x_ref = unit.ctx.arena.symbol(x);
        let directive = unit.directive(
            weft_ir::ConstructKind::Parallel,
            ClauseSet::new(),
            Stmt::Expr(x_ref),
        );
        let mut registry = registered(&directive, |_| {});

        let lowered =
            lower_unit(&mut unit.ctx, &mut registry, Stmt::Directive(directive)).unwrap();
        assert_eq!(lowered, Stmt::Expr(x_ref));
        assert_eq!(unit.ctx.diagnostics.warning_count(), 1);
    }

    #[test]
    fn threadprivate_marks_symbols_and_leaves_no_code() {
        let mut unit = TestUnit::new();
        let x = unit.variable("x");
        let mut directive = unit.directive(
            weft_ir::ConstructKind::Threadprivate,
            ClauseSet::new(),
            Stmt::Empty,
        );
        directive.body = None;
        directive.symbols = vec![x];
        let mut registry = DataSharingRegistry::new();

        let lowered =
            lower_unit(&mut unit.ctx, &mut registry, Stmt::Directive(directive)).unwrap();
        assert_eq!(lowered, Stmt::Empty);
        assert!(unit.ctx.symbols.get(x).is_threadprivate);
    }

    #[test]
    fn num_threads_becomes_the_parallel_operand() {
        let mut unit = TestUnit::new();
        let four = unit.ctx.arena.int(4);
        let clauses = ClauseSet::new().with(unit.expr_clause(ClauseKind::NumThreads, vec![four]));
        let directive =
            unit.directive(weft_ir::ConstructKind::Parallel, clauses, Stmt::Empty);
        let mut registry = registered(&directive, |_| {});

        let lowered =
            lower_unit(&mut unit.ctx, &mut registry, Stmt::Directive(directive)).unwrap();
        let Stmt::Parallel { num_threads, .. } = lowered else {
            panic!("expected parallel");
        };
        assert_eq!(
            num_threads.map(|e| unit.ctx.arena.kind(e).clone()),
            Some(ExprKind::Int(4))
        );
    }
}
