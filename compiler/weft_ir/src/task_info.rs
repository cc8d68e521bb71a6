//! Persistent records for function-declared tasks.
//!
//! A `task` pragma attached to a function declaration produces a
//! [`FunctionTaskInfo`] that outlives the directive: it is keyed by the
//! function symbol, consulted at every call site, and may cross module
//! boundaries through the (optional) `module` serialization feature.

use crate::{DependencyItem, ExprId, Name, SymbolId, TargetInfo};

/// One `onerror` binding: which error (or any, when `error` is `None`)
/// maps to which recovery action.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
#[cfg_attr(feature = "module", derive(serde::Serialize, serde::Deserialize))]
pub struct ErrorBehavior {
    pub error: Option<Name>,
    pub action: Name,
}

/// Real-time clauses of a task: deadline, release time, error behavior.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "module", derive(serde::Serialize, serde::Deserialize))]
pub struct RealTimeInfo {
    pub deadline: Option<ExprId>,
    pub release_after: Option<ExprId>,
    pub error_behaviors: Vec<ErrorBehavior>,
}

impl RealTimeInfo {
    pub fn is_empty(&self) -> bool {
        self.deadline.is_none() && self.release_after.is_none() && self.error_behaviors.is_empty()
    }
}

/// Everything remembered about a function declared as a task.
///
/// Created when the declaration's pragma is processed; lives until the end
/// of the compilation unit. The dependence list is already filtered: the
/// useless-dependence check runs once, at registration, in parameter-list
/// order, and is never re-validated.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "module", derive(serde::Serialize, serde::Deserialize))]
pub struct FunctionTaskInfo {
    /// Filtered dependency parameter list, in registration order.
    pub dependencies: Vec<DependencyItem>,
    pub target: TargetInfo,
    pub real_time: RealTimeInfo,
    pub untied: bool,
    pub if_expr: Option<ExprId>,
    pub priority_expr: Option<ExprId>,
    pub label: Option<Name>,
    /// Implementation table: device name → implementing function symbol.
    pub implementations: Vec<(Name, SymbolId)>,
}

impl FunctionTaskInfo {
    pub fn new() -> Self {
        FunctionTaskInfo::default()
    }

    /// Record a device implementation, keeping one entry per device.
    pub fn add_implementation(&mut self, device: Name, function: SymbolId) {
        if let Some(entry) = self.implementations.iter_mut().find(|(d, _)| *d == device) {
            entry.1 = function;
        } else {
            self.implementations.push((device, function));
        }
    }
}
