//! Worksharing handlers: `for`, `sections`, `single`, `workshare`.
//!
//! All four share the implicit-barrier policy: a flush and a barrier at the
//! end unless `nowait` is present.

use smallvec::SmallVec;
use weft_ir::{ClauseKind, ConstructKind, Directive, ExecutionEnvironment, Stmt};

use super::{take_body, take_sharing};
use crate::env_builder::ExecutionEnvironmentBuilder;
use crate::error::internal_error;
use crate::sharing::DataSharingRegistry;
use crate::{LowerContext, LowerResult};

pub(super) fn lower_for(
    ctx: &mut LowerContext,
    registry: &mut DataSharingRegistry,
    mut directive: Directive,
) -> LowerResult<Stmt> {
    let ds = take_sharing(registry, &directive)?;
    let body = take_body(&mut directive)?;
    if !matches!(body, Stmt::RangeFor(_)) {
        internal_error!("'for' directive body is not a counted loop");
    }
    let mut builder = ExecutionEnvironmentBuilder::new(ctx);
    let mut env = builder.build(&ds, false, false)?;
    builder.append_schedule(&mut env, &directive.clauses)?;
    append_barrier(&mut builder, &mut env, &directive);
    Ok(Stmt::For {
        env,
        loop_: Box::new(body),
    })
}

pub(super) fn lower_sections(
    ctx: &mut LowerContext,
    registry: &mut DataSharingRegistry,
    mut directive: Directive,
) -> LowerResult<Stmt> {
    let ds = take_sharing(registry, &directive)?;
    let body = take_body(&mut directive)?;
    let sections = section_bodies(body)?;
    let mut builder = ExecutionEnvironmentBuilder::new(ctx);
    let mut env = builder.build(&ds, false, false)?;
    append_barrier(&mut builder, &mut env, &directive);
    Ok(Stmt::Sections { env, sections })
}

pub(super) fn lower_single(
    ctx: &mut LowerContext,
    registry: &mut DataSharingRegistry,
    directive: Directive,
) -> LowerResult<Stmt> {
    let (env, body) = block_worksharing(ctx, registry, directive)?;
    Ok(Stmt::Single {
        env,
        body: Box::new(body),
    })
}

pub(super) fn lower_workshare(
    ctx: &mut LowerContext,
    registry: &mut DataSharingRegistry,
    directive: Directive,
) -> LowerResult<Stmt> {
    let (env, body) = block_worksharing(ctx, registry, directive)?;
    Ok(Stmt::Workshare {
        env,
        body: Box::new(body),
    })
}

/// `single` and `workshare` share everything but the output node. Neither
/// carries offload info.
fn block_worksharing(
    ctx: &mut LowerContext,
    registry: &mut DataSharingRegistry,
    mut directive: Directive,
) -> LowerResult<(ExecutionEnvironment, Stmt)> {
    let ds = take_sharing(registry, &directive)?;
    let body = take_body(&mut directive)?;
    let mut builder = ExecutionEnvironmentBuilder::new(ctx);
    let mut env = builder.build(&ds, true, false)?;
    append_barrier(&mut builder, &mut env, &directive);
    Ok((env, body))
}

fn append_barrier(
    builder: &mut ExecutionEnvironmentBuilder<'_>,
    env: &mut ExecutionEnvironment,
    directive: &Directive,
) {
    let barrier = !directive.clauses.is_defined(ClauseKind::Nowait);
    builder.append_barrier_policy(env, barrier, false);
}

/// Split a `sections` body into its per-section statements. The front end
/// guarantees the body is a compound of `section` blocks.
pub(super) fn section_bodies(body: Stmt) -> LowerResult<Vec<Stmt>> {
    let Stmt::Compound(stmts) = body else {
        internal_error!("'sections' body is not a compound statement");
    };
    let mut sections: SmallVec<[Stmt; 4]> = SmallVec::new();
    for stmt in stmts {
        let Stmt::Directive(section) = stmt else {
            internal_error!("'sections' body contains a statement outside any 'section'");
        };
        if section.kind != ConstructKind::Section {
            internal_error!("'sections' body contains a {:?} directive", section.kind);
        }
        sections.push(section.body.map_or(Stmt::Empty, |body| *body));
    }
    Ok(sections.into_vec())
}
