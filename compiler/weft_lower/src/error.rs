//! Lowering failure modes.

/// Why lowering stopped.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LowerError {
    /// A fatal diagnostic was emitted for the current construct. The
    /// original statement is left unmodified; the unit keeps lowering.
    /// The diagnostic itself is already in the queue.
    #[error("lowering of the current construct was aborted")]
    ConstructAborted,

    /// A tree-shape assumption was broken. An earlier-phase contract was
    /// violated; the whole run aborts.
    #[error("internal error: {0}")]
    Internal(String),
}

pub type LowerResult<T> = Result<T, LowerError>;

/// Fail with [`LowerError::Internal`] from the enclosing function.
macro_rules! internal_error {
    ($($arg:tt)*) => {
        return Err($crate::LowerError::Internal(format!($($arg)*)))
    };
}

pub(crate) use internal_error;
