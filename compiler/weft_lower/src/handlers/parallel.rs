//! `parallel` and the combined parallel-worksharing handlers.
//!
//! A combined construct lowers to two nested nodes: an outer parallel whose
//! environment shares every privatized symbol, and an inner worksharing
//! node carrying the full data-sharing environment plus the
//! combined-worksharing marker. The barrier lives on the parallel; the
//! inner node never repeats it.

use weft_ir::{ClauseKind, ConstructKind, Directive, EnvNode, Stmt};

use super::{take_body, take_sharing, worksharing};
use crate::env_builder::ExecutionEnvironmentBuilder;
use crate::error::internal_error;
use crate::sharing::DataSharingRegistry;
use crate::{LowerContext, LowerResult};

pub(super) fn lower_parallel(
    ctx: &mut LowerContext,
    registry: &mut DataSharingRegistry,
    mut directive: Directive,
) -> LowerResult<Stmt> {
    let body = take_body(&mut directive)?;
    if ctx.config.ompss_mode {
        ctx.warning(
            directive.span,
            "explicit parallel regions are ignored under OmpSs semantics; \
             lowering the body in place",
        );
        registry.take(directive.id);
        return Ok(body);
    }

    let ds = take_sharing(registry, &directive)?;
    let mut builder = ExecutionEnvironmentBuilder::new(ctx);
    let mut env = builder.build(&ds, false, false)?;
    builder.append_label(&mut env, &directive.clauses, "parallel");
    let num_threads =
        builder.single_expr_argument(&directive.clauses, ClauseKind::NumThreads, "num_threads");
    env.push(EnvNode::FlushAtEntry);
    env.push(EnvNode::FlushAtExit);
    env.push(EnvNode::BarrierAtEnd);
    if let Some(expr) = builder.single_expr_argument(&directive.clauses, ClauseKind::If, "if") {
        env.push(EnvNode::If(expr));
    }
    Ok(Stmt::Parallel {
        env,
        num_threads,
        body: Box::new(body),
    })
}

/// `parallel for` / `parallel sections`.
pub(super) fn lower_combined(
    ctx: &mut LowerContext,
    registry: &mut DataSharingRegistry,
    mut directive: Directive,
) -> LowerResult<Stmt> {
    let ds = take_sharing(registry, &directive)?;
    let body = take_body(&mut directive)?;
    let construct_name = match directive.kind {
        ConstructKind::ParallelFor => "parallel for",
        _ => "parallel sections",
    };

    let mut builder = ExecutionEnvironmentBuilder::new(ctx);
    let mut outer = builder.build_for_combined_worksharing(&ds)?;
    builder.append_label(&mut outer, &directive.clauses, construct_name);
    let num_threads =
        builder.single_expr_argument(&directive.clauses, ClauseKind::NumThreads, "num_threads");
    outer.push(EnvNode::FlushAtEntry);
    outer.push(EnvNode::FlushAtExit);
    outer.push(EnvNode::BarrierAtEnd);
    if let Some(expr) = builder.single_expr_argument(&directive.clauses, ClauseKind::If, "if") {
        outer.push(EnvNode::If(expr));
    }

    // The outer target node carries the offload info; the inner build
    // skips it.
    let mut inner_env = builder.build(&ds, true, false)?;
    let inner = if directive.kind == ConstructKind::ParallelFor {
        builder.append_schedule(&mut inner_env, &directive.clauses)?;
        builder.append_barrier_policy(&mut inner_env, false, true);
        if !matches!(body, Stmt::RangeFor(_)) {
            internal_error!("'parallel for' body is not a counted loop");
        }
        Stmt::For {
            env: inner_env,
            loop_: Box::new(body),
        }
    } else {
        builder.append_barrier_policy(&mut inner_env, false, true);
        Stmt::Sections {
            env: inner_env,
            sections: worksharing::section_bodies(body)?,
        }
    };

    Ok(Stmt::Parallel {
        env: outer,
        num_threads,
        body: Box::new(inner),
    })
}

#[cfg(test)]
#[expect(clippy::unwrap_used, reason = "Tests use unwrap for brevity")]
mod tests {
    use super::*;
    use crate::sharing::DataSharingEnvironment;
    use crate::test_util::TestUnit;
    use pretty_assertions::assert_eq;
    use weft_ir::{ClauseSet, DataSharingAttribute};

    #[test]
    fn parallel_gets_flushes_and_a_barrier() {
        let mut unit = TestUnit::new();
        let directive = unit.directive(ConstructKind::Parallel, ClauseSet::new(), Stmt::Empty);
        let mut registry = DataSharingRegistry::new();
        registry.insert(
            directive.id,
            DataSharingEnvironment::new(ConstructKind::Parallel),
        );

        let lowered =
            super::super::lower_directive(&mut unit.ctx, &mut registry, directive).unwrap();
        let Stmt::Parallel { env, num_threads, .. } = lowered else {
            panic!("expected parallel");
        };
        assert_eq!(num_threads, None);
        assert!(env.has_flush_at_exit());
        assert!(env.has_barrier_at_end());
        assert!(env
            .nodes()
            .iter()
            .any(|n| matches!(n, EnvNode::FlushAtEntry)));
    }

    #[test]
    fn parallel_sections_nests_sections_inside_the_parallel() {
        let mut unit = TestUnit::new();
        let x = unit.variable("x");
        let first = unit.directive(ConstructKind::Section, ClauseSet::new(), Stmt::Empty);
        let second = unit.directive(ConstructKind::Section, ClauseSet::new(), Stmt::Empty);
        let body = Stmt::Compound(vec![Stmt::Directive(first), Stmt::Directive(second)]);
        let directive = unit.directive(ConstructKind::ParallelSections, ClauseSet::new(), body);
        let mut ds = DataSharingEnvironment::new(ConstructKind::ParallelSections);
        ds.set_sharing(x, DataSharingAttribute::Private, false, "clause");
        let mut registry = DataSharingRegistry::new();
        registry.insert(directive.id, ds);

        let lowered =
            super::super::lower_directive(&mut unit.ctx, &mut registry, directive).unwrap();
        let Stmt::Parallel { env, body, .. } = lowered else {
            panic!("expected parallel");
        };
        assert_eq!(env.shared_symbols(), &[x]);
        let Stmt::Sections { sections, env: inner } = *body else {
            panic!("expected sections, got {body:?}");
        };
        assert_eq!(sections.len(), 2);
        assert_eq!(inner.nodes().first(), Some(&EnvNode::Private(vec![x])));
    }
}
