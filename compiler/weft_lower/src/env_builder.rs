//! Execution environment synthesis.
//!
//! Consumes a data-sharing environment plus the directive's clauses and
//! produces the ordered node list, in the fixed order the code generator
//! relies on: data-sharing categories, reductions, dependencies, target
//! info, then the caller-appended synthetic nodes (schedule, flush and
//! barrier markers, untied, label, single-expression clauses).
//!
//! Combined worksharing constructs use a reduced builder that promotes all
//! privatizing categories into `Shared` for the outer parallel node: the
//! parallel region's children must see those symbols as shared slots that
//! the inner worksharing construct privatizes again.

use weft_ir::{
    ClauseKind, ClauseSet, DataSharingAttribute, DepDirection, DependencyItem, EnvNode,
    ExecutionEnvironment, ExprId,
};

use crate::error::internal_error;
use crate::sharing::DataSharingEnvironment;
use crate::{LowerContext, LowerError, LowerResult};

/// Schedule kinds accepted after prefix stripping.
const VALID_SCHEDULES: [&str; 5] = ["static", "dynamic", "guided", "runtime", "auto"];

/// Vendor prefixes a schedule kind may carry.
const SCHEDULE_PREFIXES: [&str; 3] = ["ompss_", "omp_", "openmp_"];

pub struct ExecutionEnvironmentBuilder<'a> {
    ctx: &'a mut LowerContext,
}

impl<'a> ExecutionEnvironmentBuilder<'a> {
    pub fn new(ctx: &'a mut LowerContext) -> Self {
        ExecutionEnvironmentBuilder { ctx }
    }

    pub fn ctx(&mut self) -> &mut LowerContext {
        self.ctx
    }

    /// Synthesize the environment node list for one construct.
    ///
    /// `ignore_target_info` skips the `Target` node (constructs with no
    /// offload surface: `single`, `workshare`, `taskwait`).
    /// `is_inline_task` turns reductions into task reductions.
    pub fn build(
        &mut self,
        ds: &DataSharingEnvironment,
        ignore_target_info: bool,
        is_inline_task: bool,
    ) -> LowerResult<ExecutionEnvironment> {
        self.check_default_none(ds)?;

        let mut env = ExecutionEnvironment::new();
        self.ctx.report(format_args!("Data sharings of variables"));

        self.push_sharing(&mut env, ds, DataSharingAttribute::Private, EnvNode::Private);
        self.push_sharing(
            &mut env,
            ds,
            DataSharingAttribute::Firstprivate,
            EnvNode::Firstprivate,
        );
        self.push_sharing(
            &mut env,
            ds,
            DataSharingAttribute::Lastprivate,
            EnvNode::Lastprivate,
        );
        self.push_sharing(
            &mut env,
            ds,
            DataSharingAttribute::FirstLastprivate,
            EnvNode::FirstLastprivate,
        );
        self.push_sharing(&mut env, ds, DataSharingAttribute::Auto, EnvNode::Auto);
        self.push_sharing(&mut env, ds, DataSharingAttribute::Shared, EnvNode::Shared);
        self.push_sharing(
            &mut env,
            ds,
            DataSharingAttribute::Threadprivate,
            EnvNode::Threadprivate,
        );

        if !ds.reductions().is_empty() {
            let items = ds.reductions().to_vec();
            if is_inline_task {
                env.push(EnvNode::TaskReduction(items));
            } else {
                env.push(EnvNode::Reduction(items));
            }
        }
        if !ds.simd_reductions().is_empty() {
            env.push(EnvNode::SimdReduction(ds.simd_reductions().to_vec()));
        }

        self.push_dependencies(&mut env, ds.dependencies());

        if !ignore_target_info {
            env.push(EnvNode::Target(self.defaulted_target(ds)));
        }
        Ok(env)
    }

    /// Reduced builder for the outer node of `parallel for` and
    /// `parallel sections`.
    ///
    /// Every privatizing category (and every reduced symbol) is promoted
    /// to `Shared`; dependencies are not emitted; the per-variable report
    /// path stays silent.
    pub fn build_for_combined_worksharing(
        &mut self,
        ds: &DataSharingEnvironment,
    ) -> LowerResult<ExecutionEnvironment> {
        self.check_default_none(ds)?;

        let mut env = ExecutionEnvironment::new();
        let mut shared = ds.symbols_with(DataSharingAttribute::Shared);
        for attribute in [
            DataSharingAttribute::Private,
            DataSharingAttribute::Firstprivate,
            DataSharingAttribute::Lastprivate,
            DataSharingAttribute::FirstLastprivate,
        ] {
            shared.extend(ds.symbols_with(attribute));
        }
        shared.extend(ds.reductions().iter().map(|item| item.symbol));
        let mut seen = rustc_hash::FxHashSet::default();
        shared.retain(|sym| seen.insert(*sym));
        if !shared.is_empty() {
            env.push(EnvNode::Shared(shared));
        }

        let threadprivate = ds.symbols_with(DataSharingAttribute::Threadprivate);
        if !threadprivate.is_empty() {
            env.push(EnvNode::Threadprivate(threadprivate));
        }

        env.push(EnvNode::Target(self.defaulted_target(ds)));
        Ok(env)
    }

    /// `default(none)` violations surface here, at synthesis time.
    fn check_default_none(&mut self, ds: &DataSharingEnvironment) -> LowerResult<()> {
        let mut fatal = false;
        let undefined = ds.symbols_with(DataSharingAttribute::Undefined);
        for sym in undefined {
            let name = self.ctx.symbol_name(sym);
            let span = self.ctx.symbols.get(sym).span;
            self.ctx.error(
                span,
                format!(
                    "variable '{name}' does not have a data-sharing attribute \
                     and 'default(none)' was specified for this construct"
                ),
            );
            fatal = true;
        }
        if fatal {
            return Err(LowerError::ConstructAborted);
        }
        Ok(())
    }

    fn push_sharing(
        &mut self,
        env: &mut ExecutionEnvironment,
        ds: &DataSharingEnvironment,
        attribute: DataSharingAttribute,
        make: fn(Vec<weft_ir::SymbolId>) -> EnvNode,
    ) {
        let symbols = ds.symbols_with(attribute);
        if symbols.is_empty() {
            return;
        }
        if self.ctx.config.emit_report {
            for &sym in &symbols {
                let name = self.ctx.symbol_name(sym);
                let reason = ds
                    .sharing(sym)
                    .map(|e| e.reason.clone())
                    .unwrap_or_default();
                self.ctx
                    .report(format_args!("'{name}' is {attribute} ({reason})"));
            }
        }
        env.push(make(symbols));
    }

    /// One node per non-empty direction class, items in clause order.
    /// Direction matching is exact: an inout item belongs to `DepInout`
    /// only.
    fn push_dependencies(&mut self, env: &mut ExecutionEnvironment, items: &[DependencyItem]) {
        let classes: [(DepDirection, fn(Vec<DependencyItem>) -> EnvNode); 6] = [
            (DepDirection::IN, EnvNode::DepIn),
            (DepDirection::IN_PRIVATE, EnvNode::DepInPrivate),
            (DepDirection::OUT, EnvNode::DepOut),
            (DepDirection::INOUT, EnvNode::DepInout),
            (DepDirection::CONCURRENT, EnvNode::Concurrent),
            (DepDirection::COMMUTATIVE, EnvNode::Commutative),
        ];
        for (direction, make) in classes {
            let matched: Vec<DependencyItem> = items
                .iter()
                .filter(|item| item.direction == direction)
                .copied()
                .collect();
            if !matched.is_empty() {
                env.push(make(matched));
            }
        }
    }

    fn defaulted_target(&mut self, ds: &DataSharingEnvironment) -> weft_ir::TargetInfo {
        let mut target = ds.target().clone();
        if target.devices.is_empty() {
            target.devices.push(self.ctx.interner.intern("smp"));
        }
        target
    }

    // Construct-specific synthetic nodes, appended by handlers after the
    // categorical part of the environment is built.

    /// `schedule(kind[, chunk])` with defaulting: no clause means implicit
    /// `static` with chunk 0 (runtime-default chunking); a chunkless
    /// non-static kind gets chunk 1. A vendor prefix is stripped before
    /// validity matching but kept in the emitted spelling.
    pub fn append_schedule(
        &mut self,
        env: &mut ExecutionEnvironment,
        clauses: &ClauseSet,
    ) -> LowerResult<()> {
        let Some(clause) = clauses.get(ClauseKind::Schedule) else {
            let chunk = self.ctx.arena.int(0);
            let kind = self.ctx.interner.intern("static");
            env.push(EnvNode::Schedule { kind, chunk });
            self.ctx
                .report(format_args!("Loop has been implicitly scheduled as 'STATIC'"));
            return Ok(());
        };

        let Some(&kind_token) = clause.tokens.first() else {
            internal_error!("schedule clause without a kind token");
        };
        if clause.exprs.len() > 1 {
            internal_error!("schedule clause with more than one chunk expression");
        }

        let spelled = self.ctx.interner.resolve(kind_token).to_ascii_lowercase();
        let stripped = SCHEDULE_PREFIXES
            .iter()
            .find_map(|prefix| spelled.strip_prefix(prefix))
            .unwrap_or(&spelled);

        if !VALID_SCHEDULES.contains(&stripped) {
            self.ctx.error(
                clause.span,
                format!("invalid schedule kind '{spelled}' in 'schedule' clause"),
            );
            return Err(LowerError::ConstructAborted);
        }

        let chunk = match clause.exprs.first() {
            Some(&expr) => expr,
            None if stripped == "static" => self.ctx.arena.int(0),
            None => self.ctx.arena.int(1),
        };
        let kind = self.ctx.interner.intern(&spelled);
        env.push(EnvNode::Schedule { kind, chunk });
        self.ctx
            .report(format_args!("Loop has been explicitly scheduled as '{spelled}'"));
        Ok(())
    }

    /// Implicit flush/barrier policy. With a barrier, the exit flush comes
    /// first. A combined inner worksharing gets the marker node instead;
    /// its enclosing parallel region carries the barrier.
    pub fn append_barrier_policy(
        &mut self,
        env: &mut ExecutionEnvironment,
        barrier_at_end: bool,
        is_combined_worksharing: bool,
    ) {
        if barrier_at_end {
            env.push(EnvNode::FlushAtExit);
            env.push(EnvNode::BarrierAtEnd);
            self.ctx
                .report(format_args!("This construct implies a BARRIER at end"));
        } else if is_combined_worksharing {
            self.ctx.report(format_args!(
                "This construct implies a BARRIER at the end of the enclosing PARALLEL"
            ));
        } else {
            self.ctx.report(format_args!(
                "This construct does not have any BARRIER at end due to the 'nowait' clause"
            ));
        }
        if is_combined_worksharing {
            env.push(EnvNode::CombinedWorksharing);
        }
    }

    /// Argument of a single-expression clause (`if`, `final`, `priority`,
    /// `num_threads`, ...).
    ///
    /// Policy (uniform across these clauses): a wrong argument count emits
    /// an error diagnostic and drops the clause, but lowering of the
    /// construct continues. The error counter still gates code generation.
    pub fn single_expr_argument(
        &mut self,
        clauses: &ClauseSet,
        kind: ClauseKind,
        clause_name: &str,
    ) -> Option<ExprId> {
        let clause = clauses.get(kind)?;
        if clause.exprs.len() == 1 {
            return clause.exprs.first().copied();
        }
        self.ctx.error(
            clause.span,
            format!("ignoring invalid '{clause_name}' clause"),
        );
        None
    }

    /// `label(name)`: exactly one token, or the clause is dropped with a
    /// warning.
    pub fn append_label(
        &mut self,
        env: &mut ExecutionEnvironment,
        clauses: &ClauseSet,
        construct_name: &str,
    ) {
        let Some(clause) = clauses.get(ClauseKind::Label) else {
            return;
        };
        if clause.tokens.len() == 1 {
            if let Some(&token) = clause.tokens.first() {
                env.push(EnvNode::TaskLabel(token));
                let text = self.ctx.interner.resolve(token);
                self.ctx
                    .report(format_args!("Label of this construct is '{text}'"));
            }
        } else {
            self.ctx.warning(
                clause.span,
                format!("ignoring invalid 'label' clause in '{construct_name}' construct"),
            );
        }
    }

    /// A task is untied if `untied` is present, or if untied-by-default is
    /// configured and no `tied` clause overrides it.
    pub fn append_untied(&mut self, env: &mut ExecutionEnvironment, clauses: &ClauseSet) {
        let untied = clauses.is_defined(ClauseKind::Untied)
            || (self.ctx.config.untied_tasks_by_default && !clauses.is_defined(ClauseKind::Tied));
        if untied {
            env.push(EnvNode::Untied);
            self.ctx.report(format_args!(
                "This is an untied task. The executing thread may change during execution"
            ));
        }
    }
}
