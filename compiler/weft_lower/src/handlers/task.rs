//! `task` and `taskloop` handlers.

use weft_ir::{ClauseKind, Directive, EnvNode, ExecutionEnvironment, Stmt};

use super::{take_body, take_sharing};
use crate::env_builder::ExecutionEnvironmentBuilder;
use crate::error::internal_error;
use crate::sharing::{DataSharingEnvironment, DataSharingRegistry};
use crate::taskloop::TaskloopBlocker;
use crate::{LowerContext, LowerResult};

/// Inline task: the environment plus the (already lowered) body.
pub(super) fn lower_task(
    ctx: &mut LowerContext,
    registry: &mut DataSharingRegistry,
    mut directive: Directive,
) -> LowerResult<Stmt> {
    let ds = take_sharing(registry, &directive)?;
    let env = task_environment(ctx, &ds, &directive, "task")?;
    let body = take_body(&mut directive)?;
    Ok(Stmt::Task {
        env,
        body: Box::new(body),
    })
}

/// `taskloop`: build the per-task environment, then hand the loop to the
/// blocker. Reductions demote to task reductions during blocking.
pub(super) fn lower_taskloop(
    ctx: &mut LowerContext,
    registry: &mut DataSharingRegistry,
    mut directive: Directive,
) -> LowerResult<Stmt> {
    let ds = take_sharing(registry, &directive)?;
    let env = task_environment(ctx, &ds, &directive, "taskloop")?;
    let body = take_body(&mut directive)?;
    let Stmt::RangeFor(loop_) = body else {
        internal_error!("taskloop body is not a counted loop");
    };
    TaskloopBlocker::new().run(ctx, &directive.clauses, loop_, env, directive.span)
}

/// The shared task-shaped environment: categorical nodes, then untied,
/// priority, the entry/exit flushes, label, `if`, `final`.
fn task_environment(
    ctx: &mut LowerContext,
    ds: &DataSharingEnvironment,
    directive: &Directive,
    construct_name: &str,
) -> LowerResult<ExecutionEnvironment> {
    // Taskloop reductions stay plain here; the blocker demotes them once
    // the per-block task exists.
    let is_inline_task = directive.kind == weft_ir::ConstructKind::Task;
    let mut builder = ExecutionEnvironmentBuilder::new(ctx);
    let mut env = builder.build(ds, false, is_inline_task)?;
    builder.append_untied(&mut env, &directive.clauses);
    if let Some(expr) =
        builder.single_expr_argument(&directive.clauses, ClauseKind::Priority, "priority")
    {
        env.push(EnvNode::Priority(expr));
    }
    env.push(EnvNode::FlushAtEntry);
    env.push(EnvNode::FlushAtExit);
    builder.append_label(&mut env, &directive.clauses, construct_name);
    if let Some(expr) = builder.single_expr_argument(&directive.clauses, ClauseKind::If, "if") {
        env.push(EnvNode::If(expr));
    }
    if let Some(expr) = builder.single_expr_argument(&directive.clauses, ClauseKind::Final, "final")
    {
        env.push(EnvNode::Final(expr));
    }
    Ok(env)
}

#[cfg(test)]
#[expect(clippy::unwrap_used, reason = "Tests use unwrap for brevity")]
mod tests {
    use super::*;
    use crate::test_util::TestUnit;
    use pretty_assertions::assert_eq;
    use weft_ir::{ClauseSet, ConstructKind, DataSharingAttribute, ReductionItem};

    #[test]
    fn untied_and_final_land_after_the_data_categories() {
        let mut unit = TestUnit::new();
        let one = unit.ctx.arena.int(1);
        let clauses = ClauseSet::new()
            .with(unit.presence_clause(ClauseKind::Untied))
            .with(unit.expr_clause(ClauseKind::Final, vec![one]));
        let directive = unit.directive(ConstructKind::Task, clauses, Stmt::Empty);
        let mut registry = DataSharingRegistry::new();
        registry.insert(directive.id, DataSharingEnvironment::new(ConstructKind::Task));

        let lowered =
            super::super::lower_directive(&mut unit.ctx, &mut registry, directive).unwrap();
        let Stmt::Task { env, .. } = lowered else {
            panic!("expected task");
        };
        assert!(env.is_untied());
        assert_eq!(
            env.nodes().last(),
            Some(&EnvNode::Final(one))
        );
    }

    #[test]
    fn taskloop_reduction_reaches_the_task_as_task_reduction() {
        let mut unit = TestUnit::new();
        let i = unit.variable("i");
        let acc = unit.variable("acc");
        let loop_ = unit.counted_loop(i, 0, 9, 1);
        let four = unit.ctx.arena.int(4);
        let clauses = ClauseSet::new().with(unit.expr_clause(ClauseKind::Grainsize, vec![four]));
        let directive = unit.directive(ConstructKind::Taskloop, clauses, Stmt::RangeFor(loop_));
        let mut ds = DataSharingEnvironment::new(ConstructKind::Taskloop);
        ds.set_sharing(i, DataSharingAttribute::Private, false, "induction");
        ds.add_reduction(ReductionItem {
            reductor: unit.name("+"),
            symbol: acc,
            reduction_type: unit.name("int"),
        });
        let mut registry = DataSharingRegistry::new();
        registry.insert(directive.id, ds);

        let lowered =
            super::super::lower_directive(&mut unit.ctx, &mut registry, directive).unwrap();
        let Stmt::RangeFor(outer) = lowered else {
            panic!("expected blocked loop");
        };
        let Stmt::Compound(body) = *outer.body else {
            panic!("expected compound");
        };
        let Some(Stmt::Task { env, .. }) = body.last() else {
            panic!("expected task");
        };
        assert!(env
            .nodes()
            .iter()
            .any(|n| matches!(n, EnvNode::TaskReduction(_))));
    }

    #[test]
    fn taskloop_over_a_non_loop_body_is_internal() {
        let mut unit = TestUnit::new();
        let directive = unit.directive(ConstructKind::Taskloop, ClauseSet::new(), Stmt::Empty);
        let mut registry = DataSharingRegistry::new();
        registry.insert(
            directive.id,
            DataSharingEnvironment::new(ConstructKind::Taskloop),
        );
        let result = super::super::lower_directive(&mut unit.ctx, &mut registry, directive);
        assert!(matches!(result, Err(crate::LowerError::Internal(_))));
    }
}
