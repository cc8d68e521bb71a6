//! Directive lowering core.
//!
//! This crate turns parallel-directive constructs (`task`, `parallel`,
//! `for`, `sections`, `taskloop`, ...) into the normalized, ordered
//! execution environment consumed by the tasking-runtime code generator.
//!
//! # Pipeline Position
//!
//! ```text
//! Parse → Scope/Type analysis → Clause collection → **Lower** → Codegen
//! ```
//!
//! # What Happens During Lowering
//!
//! 1. **Default resolution** (`sharing::resolver`): variables referenced
//!    but not clause-listed get a data-sharing attribute per construct
//!    kind and `default` clause.
//!
//! 2. **Environment synthesis** (`env_builder`): one `EnvNode` per
//!    non-empty category, in fixed order (data sharings, reductions,
//!    dependencies, target info), followed by the caller's per-construct
//!    synthetic nodes (schedule, flush/barrier, untied, label, ...).
//!
//! 3. **Taskloop blocking** (`taskloop`): the loop + task pair is rewritten
//!    into an outer block loop and an inner per-block task, and every
//!    dependency expression naming the original induction variable is
//!    rewritten into a block-range expression.
//!
//! Handlers (`handlers`) are policy-free dispatch glue: one per construct,
//! each wiring a data-sharing environment and a clause set through the
//! builder and replacing the directive statement with its lowered form.
//!
//! # Error Discipline
//!
//! Fatal-for-construct problems emit an error diagnostic and abort the
//! current construct only ([`LowerError::ConstructAborted`]); the original
//! statement stays unchanged and traversal continues. Structural invariant
//! violations ([`LowerError::Internal`]) abort the whole run: they mean an
//! earlier-phase contract was broken, not that the user wrote bad code.

mod context;
mod deps;
mod env_builder;
mod error;
pub mod handlers;
mod module_info;
pub mod sharing;
mod taskloop;

pub use context::{LowerConfig, LowerContext};
pub use deps::dependence_list_check;
pub use env_builder::ExecutionEnvironmentBuilder;
pub use error::{LowerError, LowerResult};
pub use handlers::{lower_directive, lower_unit, register_function_task, FunctionTaskDecl};
pub use module_info::FunctionTaskRegistry;
#[cfg(feature = "module")]
pub use module_info::ModuleIoError;
pub use sharing::{
    DataSharingEnvironment, DataSharingRegistry, DataSharingResolver, DataSharingStack,
    SharingEntry,
};
pub use taskloop::{BlockerState, TaskloopBlocker};

#[cfg(test)]
mod test_util;
