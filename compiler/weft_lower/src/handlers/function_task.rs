//! Function-declared tasks.
//!
//! A `task` pragma on a function declaration does not lower a statement; it
//! registers a [`FunctionTaskInfo`] consulted at every call site. The
//! dependence list is validated once here, in declaration order, against
//! the parameter list.

use weft_ir::{
    ClauseKind, ClauseSet, DepDirection, DependencyItem, ErrorBehavior, ExprId, FunctionTaskInfo,
    RealTimeInfo, Span, SymbolId, TargetInfo,
};

use crate::deps::dependence_list_check;
use crate::env_builder::ExecutionEnvironmentBuilder;
use crate::module_info::FunctionTaskRegistry;
use crate::{LowerContext, LowerResult};

/// One `task` pragma attached to a function declaration, as collected by
/// the front end.
#[derive(Clone, Debug)]
pub struct FunctionTaskDecl {
    pub function: SymbolId,
    /// Declared parameters, in signature order.
    pub parameters: Vec<SymbolId>,
    pub clauses: ClauseSet,
    pub target: TargetInfo,
    pub span: Span,
}

/// Validate a function-task declaration and record it in `registry`.
///
/// Fails with the construct-abort error when an output dependence names a
/// bare value parameter; in that case nothing is registered.
pub fn register_function_task(
    ctx: &mut LowerContext,
    registry: &mut FunctionTaskRegistry,
    decl: FunctionTaskDecl,
) -> LowerResult<()> {
    let mut dependencies = Vec::new();
    for clause in decl.clauses.iter() {
        let direction = match clause.kind {
            ClauseKind::In => DepDirection::IN,
            ClauseKind::Out => DepDirection::OUT,
            ClauseKind::Inout => DepDirection::INOUT,
            ClauseKind::InPrivate => DepDirection::IN_PRIVATE,
            ClauseKind::Concurrent => DepDirection::CONCURRENT,
            ClauseKind::Commutative => DepDirection::COMMUTATIVE,
            _ => continue,
        };
        dependencies.extend(
            clause
                .exprs
                .iter()
                .map(|&expr| DependencyItem::new(expr, direction)),
        );
    }
    dependence_list_check(ctx, &mut dependencies)?;

    let mut info = FunctionTaskInfo::new();
    info.dependencies = dependencies;
    info.real_time = real_time_info(ctx, &decl.clauses);
    info.untied = decl.clauses.is_defined(ClauseKind::Untied)
        || (ctx.config.untied_tasks_by_default && !decl.clauses.is_defined(ClauseKind::Tied));

    let mut builder = ExecutionEnvironmentBuilder::new(ctx);
    info.if_expr = builder.single_expr_argument(&decl.clauses, ClauseKind::If, "if");
    info.priority_expr = builder.single_expr_argument(&decl.clauses, ClauseKind::Priority, "priority");

    if let Some(clause) = decl.clauses.get(ClauseKind::Label) {
        if let [token] = clause.tokens[..] {
            info.label = Some(token);
        } else {
            ctx.warning(
                clause.span,
                "ignoring invalid 'label' clause in 'task' declaration",
            );
        }
    }

    let mut target = decl.target;
    if target.devices.is_empty() {
        target.devices.push(ctx.interner.intern("smp"));
    }
    // The declared function implements its own devices; an `implements`
    // table entry overrides per device.
    for &device in &target.devices {
        info.add_implementation(device, decl.function);
    }
    for &(device, function) in &target.implementations {
        info.add_implementation(device, function);
    }
    info.target = target;

    if registry.register(decl.function, info).is_some() {
        let name = ctx.symbol_name(decl.function);
        ctx.warning(
            decl.span,
            format!("task declaration of '{name}' shadows a previous declaration"),
        );
    }
    Ok(())
}

fn real_time_info(ctx: &mut LowerContext, clauses: &ClauseSet) -> RealTimeInfo {
    let mut real_time = RealTimeInfo {
        deadline: time_clause(ctx, clauses, ClauseKind::Deadline, "deadline"),
        release_after: time_clause(ctx, clauses, ClauseKind::ReleaseAfter, "release_after"),
        ..RealTimeInfo::default()
    };
    for clause in clauses.all(ClauseKind::Onerror) {
        match clause.tokens[..] {
            [action] => real_time.error_behaviors.push(ErrorBehavior {
                error: None,
                action,
            }),
            [error, action] => real_time.error_behaviors.push(ErrorBehavior {
                error: Some(error),
                action,
            }),
            _ => ctx.warning(
                clause.span,
                "ignoring invalid 'onerror' clause; expected 'onerror(action)' \
                 or 'onerror(error : action)'",
            ),
        }
    }
    real_time
}

/// A real-time clause takes one expression; a constant negative value makes
/// the constraint meaningless.
fn time_clause(
    ctx: &mut LowerContext,
    clauses: &ClauseSet,
    kind: ClauseKind,
    name: &str,
) -> Option<ExprId> {
    let clause = clauses.get(kind)?;
    let [expr] = clause.exprs[..] else {
        ctx.warning(clause.span, format!("ignoring invalid '{name}' clause"));
        return None;
    };
    if ctx.arena.const_value(expr).is_some_and(|value| value < 0) {
        ctx.warning(
            clause.span,
            format!("'{name}' value is negative; the task is eligible to run immediately"),
        );
    }
    Some(expr)
}
