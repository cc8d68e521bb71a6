//! Synchronization handlers: `critical`, `taskwait`, `taskyield`, and the
//! `threadprivate` declaration directive.

use weft_ir::{ClauseKind, Directive, EnvNode, ExecutionEnvironment, Stmt};

use super::take_body;
use crate::env_builder::ExecutionEnvironmentBuilder;
use crate::sharing::DataSharingRegistry;
use crate::{LowerContext, LowerResult};

/// `critical`: flush on entry and exit, plus the lock name when the region
/// is named.
pub(super) fn lower_critical(
    ctx: &mut LowerContext,
    mut directive: Directive,
) -> LowerResult<Stmt> {
    let body = take_body(&mut directive)?;
    let mut env = ExecutionEnvironment::new();
    env.push(EnvNode::FlushAtEntry);
    env.push(EnvNode::FlushAtExit);
    if let Some(name) = directive.name {
        env.push(EnvNode::CriticalName(name));
        let text = ctx.interner.resolve(name);
        ctx.report(format_args!("Critical section is named '{text}'"));
    }
    Ok(Stmt::Critical {
        env,
        body: Box::new(body),
    })
}

/// `taskwait`. With `on`-dependences (OmpSs only) the wait is shallow and
/// scoped to the listed data; otherwise it waits on all child tasks.
pub(super) fn lower_taskwait(
    ctx: &mut LowerContext,
    registry: &mut DataSharingRegistry,
    directive: Directive,
) -> LowerResult<Stmt> {
    let mut env = ExecutionEnvironment::new();
    let mut on_dependences = false;
    if let Some(ds) = registry.take(directive.id) {
        if !ds.dependencies().is_empty() {
            if ctx.config.ompss_mode {
                let mut builder = ExecutionEnvironmentBuilder::new(ctx);
                env = builder.build(&ds, true, false)?;
                on_dependences = true;
                ctx.report(format_args!(
                    "Taskwait waits only on the listed dependences"
                ));
            } else {
                ctx.warning(
                    directive.span,
                    "ignoring 'on' clause: taskwait dependences require OmpSs semantics",
                );
            }
        }
    }
    if directive.clauses.is_defined(ClauseKind::Noflush) {
        env.push(EnvNode::NoFlush);
    }
    Ok(Stmt::Taskwait {
        env,
        on_dependences,
    })
}

pub(super) fn lower_taskyield(ctx: &mut LowerContext) -> Stmt {
    ctx.report(format_args!("Taskyield point"));
    Stmt::Taskyield
}

/// `threadprivate` lowers to nothing; its effect is the sticky mark on the
/// listed symbols.
pub(super) fn lower_threadprivate(ctx: &mut LowerContext, directive: &Directive) -> Stmt {
    for &sym in &directive.symbols {
        ctx.symbols.mark_threadprivate(sym);
    }
    Stmt::Empty
}

#[cfg(test)]
#[expect(clippy::unwrap_used, reason = "Tests use unwrap for brevity")]
mod tests {
    use super::*;
    use crate::sharing::DataSharingEnvironment;
    use crate::test_util::TestUnit;
    use pretty_assertions::assert_eq;
    use weft_ir::{ClauseSet, ConstructKind, DepDirection, DependencyItem};

    fn taskwait_directive(unit: &mut TestUnit, clauses: ClauseSet) -> Directive {
        let mut directive = unit.directive(ConstructKind::Taskwait, clauses, Stmt::Empty);
        directive.body = None;
        directive
    }

    #[test]
    fn named_critical_carries_the_lock_name() {
        let mut unit = TestUnit::new();
        let mut directive =
            unit.directive(ConstructKind::Critical, ClauseSet::new(), Stmt::Empty);
        directive.name = Some(unit.name("queue_lock"));
        let mut registry = DataSharingRegistry::new();

        let lowered =
            super::super::lower_directive(&mut unit.ctx, &mut registry, directive).unwrap();
        let Stmt::Critical { env, .. } = lowered else {
            panic!("expected critical");
        };
        assert_eq!(
            env.nodes(),
            &[
                EnvNode::FlushAtEntry,
                EnvNode::FlushAtExit,
                EnvNode::CriticalName(unit.name("queue_lock")),
            ]
        );
    }

    #[test]
    fn taskwait_on_dependences_is_shallow_under_ompss() {
        let mut unit = TestUnit::with_config(crate::LowerConfig {
            ompss_mode: true,
            ..crate::LowerConfig::default()
        });
        let v = unit.variable("v");
        let v_ref = unit.ctx.arena.symbol(v);
        let directive = taskwait_directive(&mut unit, ClauseSet::new());
        let mut ds = DataSharingEnvironment::new(ConstructKind::Taskwait);
        ds.add_dependency(DependencyItem::new(v_ref, DepDirection::IN));
        let mut registry = DataSharingRegistry::new();
        registry.insert(directive.id, ds);

        let lowered =
            super::super::lower_directive(&mut unit.ctx, &mut registry, directive).unwrap();
        let Stmt::Taskwait { env, on_dependences } = lowered else {
            panic!("expected taskwait");
        };
        assert!(on_dependences);
        assert!(env
            .nodes()
            .iter()
            .any(|n| matches!(n, EnvNode::DepIn(_))));
    }

    #[test]
    fn taskwait_dependences_are_dropped_outside_ompss() {
        let mut unit = TestUnit::new();
        let v = unit.variable("v");
        let v_ref = unit.ctx.arena.symbol(v);
        let directive = taskwait_directive(&mut unit, ClauseSet::new());
        let mut ds = DataSharingEnvironment::new(ConstructKind::Taskwait);
        ds.add_dependency(DependencyItem::new(v_ref, DepDirection::IN));
        let mut registry = DataSharingRegistry::new();
        registry.insert(directive.id, ds);

        let lowered =
            super::super::lower_directive(&mut unit.ctx, &mut registry, directive).unwrap();
        let Stmt::Taskwait { env, on_dependences } = lowered else {
            panic!("expected taskwait");
        };
        assert!(!on_dependences);
        assert!(env.is_empty());
        assert_eq!(unit.ctx.diagnostics.warning_count(), 1);
    }

    #[test]
    fn noflush_survives_into_the_environment() {
        let mut unit = TestUnit::new();
        let clauses = ClauseSet::new().with(unit.presence_clause(ClauseKind::Noflush));
        let directive = taskwait_directive(&mut unit, clauses);
        let mut registry = DataSharingRegistry::new();

        let lowered =
            super::super::lower_directive(&mut unit.ctx, &mut registry, directive).unwrap();
        let Stmt::Taskwait { env, .. } = lowered else {
            panic!("expected taskwait");
        };
        assert_eq!(env.nodes(), &[EnvNode::NoFlush]);
    }
}
