//! Default data-sharing resolution.
//!
//! Fills in attributes for variables that are referenced inside a
//! construct but not listed in any clause. Resolution is a pure function
//! of the current stack state: running it twice with no new clause input
//! yields the same mapping, because it only ever writes implicit entries
//! and recomputes them from the same inputs.

use weft_ir::{ConstructKind, DataSharingAttribute, DefaultKind, SymbolId, SymbolTable};

use super::DataSharingStack;

/// Computes default attributes per construct kind and `default` clause.
#[derive(Debug, Default)]
pub struct DataSharingResolver;

impl DataSharingResolver {
    pub fn new() -> Self {
        DataSharingResolver
    }

    /// Resolve defaults for every symbol in `referenced` on the top
    /// environment of `stack`.
    ///
    /// `induction_vars` names the loop induction variable(s) of the
    /// construct, which default to private under `parallel` and its
    /// combined forms.
    ///
    /// Variables with an explicit (non-implicit) classification are left
    /// untouched. With `default(none)` unlisted variables are recorded as
    /// `Undefined`; the violation becomes fatal at synthesis time, not
    /// here.
    pub fn resolve_defaults(
        &self,
        stack: &mut DataSharingStack,
        table: &SymbolTable,
        referenced: &[SymbolId],
        induction_vars: &[SymbolId],
    ) {
        for &sym in referenced {
            // Threadprivate symbols are never subject to default
            // resolution; the mark on the symbol wins.
            if table.get(sym).is_threadprivate {
                if let Some(top) = stack.current_mut() {
                    top.set_sharing(
                        sym,
                        DataSharingAttribute::Threadprivate,
                        true,
                        "the variable was declared threadprivate",
                    );
                }
                continue;
            }

            let Some(top) = stack.current() else { return };
            if top.sharing(sym).is_some_and(|e| !e.implicit) {
                continue;
            }
            let construct = top.construct();
            let default_kind = top.default_kind();

            let resolved = match default_kind {
                Some(DefaultKind::Shared) => Some((
                    DataSharingAttribute::Shared,
                    "explicitly determined by 'default(shared)'",
                )),
                Some(DefaultKind::Private) => Some((
                    DataSharingAttribute::Private,
                    "explicitly determined by 'default(private)'",
                )),
                Some(DefaultKind::Firstprivate) => Some((
                    DataSharingAttribute::Firstprivate,
                    "explicitly determined by 'default(firstprivate)'",
                )),
                Some(DefaultKind::None) => Some((
                    DataSharingAttribute::Undefined,
                    "not listed in any clause while 'default(none)' is in effect",
                )),
                None => Self::construct_fallback(stack, construct, sym, induction_vars),
            };

            if let Some((attribute, reason)) = resolved {
                if let Some(top) = stack.current_mut() {
                    top.set_sharing(sym, attribute, true, reason);
                }
            }
        }
    }

    /// Fallback rule table when no `default` clause applies.
    fn construct_fallback(
        stack: &DataSharingStack,
        construct: ConstructKind,
        sym: SymbolId,
        induction_vars: &[SymbolId],
    ) -> Option<(DataSharingAttribute, &'static str)> {
        match construct {
            // An inline task defers the real decision to data-flow
            // analysis; only the marker is recorded here.
            ConstructKind::Task | ConstructKind::Taskloop => Some((
                DataSharingAttribute::Auto,
                "implicitly determined, pending data-flow analysis",
            )),
            // Worksharing inherits from the enclosing construct, shared
            // when the enclosing environment says nothing.
            ConstructKind::For
            | ConstructKind::Sections
            | ConstructKind::Single
            | ConstructKind::Workshare => match stack.enclosing_attribute(sym) {
                Some(attribute) => Some((attribute, "inherited from the enclosing construct")),
                None => Some((
                    DataSharingAttribute::Shared,
                    "implicitly shared in a worksharing construct",
                )),
            },
            ConstructKind::Parallel
            | ConstructKind::ParallelFor
            | ConstructKind::ParallelSections => {
                if induction_vars.contains(&sym) {
                    Some((
                        DataSharingAttribute::Private,
                        "the loop induction variable is private",
                    ))
                } else {
                    Some((
                        DataSharingAttribute::Shared,
                        "implicitly shared in a parallel construct",
                    ))
                }
            }
            // The remaining constructs have no default rule.
            ConstructKind::Section
            | ConstructKind::Critical
            | ConstructKind::Taskwait
            | ConstructKind::Taskyield
            | ConstructKind::Threadprivate => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sharing::DataSharingEnvironment;
    use pretty_assertions::assert_eq;
    use weft_ir::{Name, Span};

    fn table_with(n: usize) -> (SymbolTable, Vec<SymbolId>) {
        let mut table = SymbolTable::new();
        let syms = (0..n)
            .map(|_| table.new_symbol(Name::EMPTY, Span::DUMMY))
            .collect();
        (table, syms)
    }

    fn attr(stack: &DataSharingStack, sym: SymbolId) -> Option<DataSharingAttribute> {
        stack
            .current()
            .and_then(|env| env.sharing(sym))
            .map(|e| e.attribute)
    }

    #[test]
    fn inline_task_defaults_to_auto_marker() {
        let (table, syms) = table_with(1);
        let mut stack = DataSharingStack::new();
        stack.push(DataSharingEnvironment::new(ConstructKind::Task));
        DataSharingResolver::new().resolve_defaults(&mut stack, &table, &syms, &[]);
        assert_eq!(attr(&stack, syms[0]), Some(DataSharingAttribute::Auto));
        assert!(stack
            .current()
            .and_then(|env| env.sharing(syms[0]))
            .is_some_and(|e| e.implicit));
    }

    #[test]
    fn worksharing_inherits_from_enclosing_construct() {
        let (table, syms) = table_with(2);
        let mut outer = DataSharingEnvironment::new(ConstructKind::Parallel);
        outer.set_sharing(
            syms[0],
            DataSharingAttribute::Firstprivate,
            false,
            "clause",
        );
        let mut stack = DataSharingStack::new();
        stack.push(outer);
        stack.push(DataSharingEnvironment::new(ConstructKind::For));

        DataSharingResolver::new().resolve_defaults(&mut stack, &table, &syms, &[]);
        assert_eq!(
            attr(&stack, syms[0]),
            Some(DataSharingAttribute::Firstprivate)
        );
        // Nothing known about syms[1] anywhere: worksharing default.
        assert_eq!(attr(&stack, syms[1]), Some(DataSharingAttribute::Shared));
    }

    #[test]
    fn parallel_privatizes_only_induction_variables() {
        let (table, syms) = table_with(2);
        let mut stack = DataSharingStack::new();
        stack.push(DataSharingEnvironment::new(ConstructKind::Parallel));
        DataSharingResolver::new().resolve_defaults(&mut stack, &table, &syms, &[syms[1]]);
        assert_eq!(attr(&stack, syms[0]), Some(DataSharingAttribute::Shared));
        assert_eq!(attr(&stack, syms[1]), Some(DataSharingAttribute::Private));
    }

    #[test]
    fn explicit_clauses_are_never_overridden() {
        let (table, syms) = table_with(1);
        let mut env = DataSharingEnvironment::new(ConstructKind::Parallel);
        env.set_sharing(syms[0], DataSharingAttribute::Private, false, "clause");
        let mut stack = DataSharingStack::new();
        stack.push(env);
        DataSharingResolver::new().resolve_defaults(&mut stack, &table, &syms, &[]);
        assert_eq!(attr(&stack, syms[0]), Some(DataSharingAttribute::Private));
    }

    #[test]
    fn default_none_records_undefined_for_synthesis_to_reject() {
        let (table, syms) = table_with(1);
        let mut env = DataSharingEnvironment::new(ConstructKind::Task);
        env.set_default_kind(DefaultKind::None);
        let mut stack = DataSharingStack::new();
        stack.push(env);
        DataSharingResolver::new().resolve_defaults(&mut stack, &table, &syms, &[]);
        assert_eq!(
            attr(&stack, syms[0]),
            Some(DataSharingAttribute::Undefined)
        );
    }

    #[test]
    fn threadprivate_mark_wins_over_every_rule() {
        let mut table = SymbolTable::new();
        let tp = table.new_symbol(Name::EMPTY, Span::DUMMY);
        table.mark_threadprivate(tp);
        let mut env = DataSharingEnvironment::new(ConstructKind::Parallel);
        env.set_default_kind(DefaultKind::None);
        let mut stack = DataSharingStack::new();
        stack.push(env);
        DataSharingResolver::new().resolve_defaults(&mut stack, &table, &[tp], &[]);
        assert_eq!(
            attr(&stack, tp),
            Some(DataSharingAttribute::Threadprivate)
        );
    }

    #[test]
    fn resolution_is_idempotent() {
        let (table, syms) = table_with(3);
        let mut stack = DataSharingStack::new();
        stack.push(DataSharingEnvironment::new(ConstructKind::Parallel));
        let resolver = DataSharingResolver::new();
        resolver.resolve_defaults(&mut stack, &table, &syms, &[syms[0]]);
        let first: Vec<_> = stack
            .current()
            .map(|env| env.entries().map(|(s, e)| (s, e.clone())).collect())
            .unwrap_or_default();
        resolver.resolve_defaults(&mut stack, &table, &syms, &[syms[0]]);
        let second: Vec<_> = stack
            .current()
            .map(|env| env.entries().map(|(s, e)| (s, e.clone())).collect())
            .unwrap_or_default();
        assert_eq!(first, second);
    }
}
