//! Data-sharing attributes.

use std::fmt;

/// Classification of a variable's storage policy across concurrent
/// executions of a construct.
///
/// A variable has exactly one attribute value per construct scope.
/// Re-classification overwrites, never merges. Whether the value was
/// inferred (implicit) rather than clause-listed is tracked next to the
/// attribute by the data-sharing environment, not inside it.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
#[cfg_attr(feature = "module", derive(serde::Serialize, serde::Deserialize))]
pub enum DataSharingAttribute {
    /// Not yet determined. With `default(none)` this survives until
    /// synthesis, where it becomes a fatal error.
    Undefined,
    Shared,
    Private,
    Firstprivate,
    Lastprivate,
    /// Both firstprivate and lastprivate.
    FirstLastprivate,
    Reduction,
    Threadprivate,
    Copyin,
    Copyprivate,
    /// `default(none)` marker attribute.
    None,
    /// Deferred to data-flow analysis; this subsystem only records the
    /// marker.
    Auto,
}

impl fmt::Display for DataSharingAttribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            DataSharingAttribute::Undefined => "undefined",
            DataSharingAttribute::Shared => "shared",
            DataSharingAttribute::Private => "private",
            DataSharingAttribute::Firstprivate => "firstprivate",
            DataSharingAttribute::Lastprivate => "lastprivate",
            DataSharingAttribute::FirstLastprivate => "firstprivate and lastprivate",
            DataSharingAttribute::Reduction => "reduction",
            DataSharingAttribute::Threadprivate => "threadprivate",
            DataSharingAttribute::Copyin => "copyin",
            DataSharingAttribute::Copyprivate => "copyprivate",
            DataSharingAttribute::None => "none",
            DataSharingAttribute::Auto => "auto",
        };
        f.write_str(text)
    }
}
