//! Diagnostic sink for the lowering pipeline.
//!
//! Diagnostics never unwind the traversal: a fatal classification error
//! aborts the *current construct* only, and processing continues so one
//! run surfaces as many errors as possible. The queue counts errors; the
//! driver consults [`DiagnosticQueue::has_errors`] before letting code
//! generation proceed.

mod diagnostic;
mod queue;

pub use diagnostic::{Diagnostic, Label, Severity};
pub use queue::{DiagnosticConfig, DiagnosticQueue};
