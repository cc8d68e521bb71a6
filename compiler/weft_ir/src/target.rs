//! Device/offload metadata pass-through.
//!
//! Populated by an earlier analysis pass; the lowering core copies it into
//! a single `Target` environment node, defaulting the device list, and
//! otherwise treats it as opaque.

use crate::{ExprId, Name, SymbolId};

/// Offload metadata attached to a data-sharing environment.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "module", derive(serde::Serialize, serde::Deserialize))]
pub struct TargetInfo {
    /// Requested devices. Empty means the `smp` default applies.
    pub devices: Vec<Name>,
    pub copy_in: Vec<ExprId>,
    pub copy_out: Vec<ExprId>,
    pub copy_inout: Vec<ExprId>,
    pub ndrange: Vec<ExprId>,
    pub shmem: Vec<ExprId>,
    pub onto: Vec<ExprId>,
    pub file: Option<Name>,
    pub name: Option<Name>,
    /// Implementation table: device name → implementing function symbol.
    pub implementations: Vec<(Name, SymbolId)>,
}

impl TargetInfo {
    pub fn new() -> Self {
        TargetInfo::default()
    }
}
