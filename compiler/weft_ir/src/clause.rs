//! Raw clause surface.
//!
//! The pragma tokenizer (an external collaborator) turns each clause into a
//! [`Clause`]: a kind plus already-parsed expression arguments and/or raw
//! identifier tokens. This crate only defines the shape; interpretation is
//! the lowering core's job.

use crate::{ExprId, Name, Span};

/// Recognized clause names.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum ClauseKind {
    // Dependency clauses; `in`/`out` also accept the deprecated spellings
    // `input`/`output`, normalized by the parser.
    In,
    Out,
    Inout,
    InPrivate,
    Concurrent,
    Commutative,
    // Explicit data sharings
    Shared,
    Private,
    Firstprivate,
    Lastprivate,
    Reduction,
    // Single-expression clauses
    If,
    Final,
    Priority,
    NumThreads,
    Grainsize,
    Numtasks,
    Deadline,
    ReleaseAfter,
    // Presence-only flags
    Untied,
    Tied,
    Nowait,
    Noflush,
    // Token clauses
    Label,
    Default,
    Onerror,
    Schedule,
}

/// Kinds accepted by a `default(...)` clause.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum DefaultKind {
    Shared,
    Private,
    Firstprivate,
    /// `default(none)`: every referenced variable needs an explicit clause.
    None,
}

/// One occurrence of a clause with its parsed arguments.
///
/// `exprs` holds expression arguments in clause order; `tokens` holds raw
/// identifier/string tokens (schedule kind, label text, onerror actions).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Clause {
    pub kind: ClauseKind,
    pub exprs: Vec<ExprId>,
    pub tokens: Vec<Name>,
    pub span: Span,
}

impl Clause {
    pub fn new(kind: ClauseKind, span: Span) -> Self {
        Clause {
            kind,
            exprs: Vec::new(),
            tokens: Vec::new(),
            span,
        }
    }

    #[must_use]
    pub fn with_exprs(mut self, exprs: Vec<ExprId>) -> Self {
        self.exprs = exprs;
        self
    }

    #[must_use]
    pub fn with_tokens(mut self, tokens: Vec<Name>) -> Self {
        self.tokens = tokens;
        self
    }
}

/// All clauses of one directive occurrence, in source order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ClauseSet {
    clauses: Vec<Clause>,
}

impl ClauseSet {
    pub fn new() -> Self {
        ClauseSet::default()
    }

    pub fn push(&mut self, clause: Clause) {
        self.clauses.push(clause);
    }

    #[must_use]
    pub fn with(mut self, clause: Clause) -> Self {
        self.push(clause);
        self
    }

    /// First occurrence of `kind`, if present.
    pub fn get(&self, kind: ClauseKind) -> Option<&Clause> {
        self.clauses.iter().find(|c| c.kind == kind)
    }

    pub fn is_defined(&self, kind: ClauseKind) -> bool {
        self.get(kind).is_some()
    }

    /// All occurrences of `kind`, in source order. Dependency clauses may
    /// repeat.
    pub fn all(&self, kind: ClauseKind) -> impl Iterator<Item = &Clause> {
        self.clauses.iter().filter(move |c| c.kind == kind)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Clause> {
        self.clauses.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.clauses.is_empty()
    }
}
