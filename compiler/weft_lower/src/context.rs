//! Per-unit lowering context.
//!
//! Everything the handlers thread through: the interner, the symbol table,
//! the expression arena, the diagnostic queue, configuration, and the
//! fresh-name counter for synthesized variables. The counter is scoped to
//! the context (one per compilation unit) so runs never share state.

use weft_diagnostic::{Diagnostic, DiagnosticQueue};
use weft_ir::{ExprArena, Name, Span, StringInterner, SymbolId, SymbolTable};

/// Phase configuration, as registered by the driver.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LowerConfig {
    /// Tasks without a `tied` clause are untied.
    pub untied_tasks_by_default: bool,
    /// Emit per-construct report lines (through `tracing`).
    pub emit_report: bool,
    /// OmpSs semantics: `parallel` regions are ignored, taskwait may carry
    /// `on`-dependences.
    pub ompss_mode: bool,
}

/// Mutable state of one lowering run.
pub struct LowerContext {
    pub interner: StringInterner,
    pub symbols: SymbolTable,
    pub arena: ExprArena,
    pub diagnostics: DiagnosticQueue,
    pub config: LowerConfig,
    /// Monotonically increasing, never reused within a run.
    fresh_counter: u32,
}

impl LowerContext {
    pub fn new(config: LowerConfig) -> Self {
        LowerContext {
            interner: StringInterner::new(),
            symbols: SymbolTable::new(),
            arena: ExprArena::new(),
            diagnostics: DiagnosticQueue::new(),
            config,
            fresh_counter: 0,
        }
    }

    /// Fresh unique name for a synthesized variable.
    pub fn fresh_name(&mut self, prefix: &str) -> Name {
        let n = self.fresh_counter;
        self.fresh_counter += 1;
        self.interner.intern(&format!("{prefix}_{n}"))
    }

    /// Fresh synthesized variable, registered in the symbol table.
    pub fn fresh_symbol(&mut self, prefix: &str) -> SymbolId {
        let name = self.fresh_name(prefix);
        self.symbols.new_symbol(name, Span::DUMMY)
    }

    /// Spelling of a symbol, for diagnostics.
    pub fn symbol_name(&self, sym: SymbolId) -> &'static str {
        self.interner.resolve(self.symbols.get(sym).name)
    }

    pub fn error(&mut self, span: Span, message: impl Into<String>) {
        self.diagnostics.emit(Diagnostic::error(span, message));
    }

    pub fn warning(&mut self, span: Span, message: impl Into<String>) {
        self.diagnostics.emit(Diagnostic::warning(span, message));
    }

    /// Report line for the per-construct lowering report.
    pub fn report(&self, line: std::fmt::Arguments<'_>) {
        if self.config.emit_report {
            tracing::debug!(target: "weft::report", "{line}");
        }
    }
}

impl Default for LowerContext {
    fn default() -> Self {
        LowerContext::new(LowerConfig::default())
    }
}
