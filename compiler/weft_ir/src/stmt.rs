//! Statement tree.
//!
//! The lowering pass receives statements with [`Stmt::Directive`] nodes
//! still in place and rewrites each directive into its lowered form. The
//! non-directive shapes are deliberately minimal: compounds, the range
//! loops the blocker synthesizes, and the lowered construct nodes that
//! carry an [`ExecutionEnvironment`].

use crate::{ClauseSet, ExecutionEnvironment, ExprId, Name, Span, SymbolId};

/// Identity of one directive occurrence. The data-sharing registry (built
/// by an earlier analysis pass) is keyed by this.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug)]
#[repr(transparent)]
pub struct DirectiveId(u32);

impl DirectiveId {
    #[inline]
    pub const fn raw(self) -> u32 {
        self.0
    }

    #[inline]
    pub const fn from_raw(raw: u32) -> Self {
        DirectiveId(raw)
    }
}

/// Directive kinds this pipeline lowers.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum ConstructKind {
    /// Inline task attached to a statement.
    Task,
    Parallel,
    For,
    Sections,
    /// One `section` inside a `sections` body.
    Section,
    Single,
    Workshare,
    Critical,
    Taskwait,
    Taskyield,
    Taskloop,
    ParallelFor,
    ParallelSections,
    Threadprivate,
}

impl ConstructKind {
    /// Worksharing constructs inherit `shared` by default.
    pub fn is_worksharing(self) -> bool {
        matches!(
            self,
            ConstructKind::For
                | ConstructKind::Sections
                | ConstructKind::Single
                | ConstructKind::Workshare
        )
    }

    /// Combined parallel + worksharing constructs.
    pub fn is_combined_worksharing(self) -> bool {
        matches!(
            self,
            ConstructKind::ParallelFor | ConstructKind::ParallelSections
        )
    }
}

/// A directive occurrence: kind, clauses, and the statement it annotates.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Directive {
    pub id: DirectiveId,
    pub kind: ConstructKind,
    pub clauses: ClauseSet,
    /// Absent for standalone directives (`taskwait`, `threadprivate`, ...).
    pub body: Option<Box<Stmt>>,
    /// Symbols named by a `threadprivate` directive.
    pub symbols: Vec<SymbolId>,
    /// Name of a named `critical` section.
    pub name: Option<Name>,
    pub span: Span,
}

/// Range loop: `induction` runs from `lower` to `upper` inclusive with
/// `step`. Loop headers of `for`/`taskloop` bodies arrive normalized to
/// this shape by the front end.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RangeFor {
    pub induction: SymbolId,
    pub lower: ExprId,
    pub upper: ExprId,
    pub step: ExprId,
    pub body: Box<Stmt>,
}

/// One statement.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Stmt {
    /// Nothing. Left behind by directives that lower to no code.
    Empty,
    Expr(ExprId),
    /// `target = value`, as synthesized for the block-extent computation.
    Assign { target: SymbolId, value: ExprId },
    Compound(Vec<Stmt>),
    If {
        condition: ExprId,
        then_branch: Box<Stmt>,
        else_branch: Option<Box<Stmt>>,
    },
    RangeFor(RangeFor),
    /// A not-yet-lowered directive.
    Directive(Directive),

    // Lowered construct nodes.
    Task {
        env: ExecutionEnvironment,
        body: Box<Stmt>,
    },
    Parallel {
        env: ExecutionEnvironment,
        num_threads: Option<ExprId>,
        body: Box<Stmt>,
    },
    For {
        env: ExecutionEnvironment,
        loop_: Box<Stmt>,
    },
    Sections {
        env: ExecutionEnvironment,
        sections: Vec<Stmt>,
    },
    Single {
        env: ExecutionEnvironment,
        body: Box<Stmt>,
    },
    Workshare {
        env: ExecutionEnvironment,
        body: Box<Stmt>,
    },
    Critical {
        env: ExecutionEnvironment,
        body: Box<Stmt>,
    },
    Taskwait {
        env: ExecutionEnvironment,
        /// True when the taskwait carries `on`-dependences and waits on
        /// those instead of all children.
        on_dependences: bool,
    },
    Taskyield,
}

impl Stmt {
    /// The environment attached to a lowered construct node, if any.
    pub fn environment(&self) -> Option<&ExecutionEnvironment> {
        match self {
            Stmt::Task { env, .. }
            | Stmt::Parallel { env, .. }
            | Stmt::For { env, .. }
            | Stmt::Sections { env, .. }
            | Stmt::Single { env, .. }
            | Stmt::Workshare { env, .. }
            | Stmt::Critical { env, .. }
            | Stmt::Taskwait { env, .. } => Some(env),
            _ => None,
        }
    }
}
