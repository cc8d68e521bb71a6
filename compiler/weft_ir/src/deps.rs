//! Dependency items and their direction bitmask.

use bitflags::bitflags;

use crate::ExprId;

bitflags! {
    /// Direction of a dependency item.
    ///
    /// `IN` and `OUT` combine into `INOUT`; every other direction is
    /// mutually exclusive per clause. Environment emission matches exact
    /// direction values, so an `INOUT` item lands in the `DepInout` node
    /// and nowhere else.
    #[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
    #[cfg_attr(feature = "module", derive(serde::Serialize, serde::Deserialize))]
    pub struct DepDirection: u8 {
        const IN = 1 << 0;
        const OUT = 1 << 1;
        const INOUT = Self::IN.bits() | Self::OUT.bits();
        /// Input dependence on data the task will privatize.
        const IN_PRIVATE = 1 << 2;
        const CONCURRENT = 1 << 3;
        const COMMUTATIVE = 1 << 4;
    }
}

/// One dependency: a data-reference expression plus a direction.
///
/// Owned by the data-sharing environment that created it; never shared
/// across constructs.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
#[cfg_attr(feature = "module", derive(serde::Serialize, serde::Deserialize))]
pub struct DependencyItem {
    pub expr: ExprId,
    pub direction: DepDirection,
}

impl DependencyItem {
    pub fn new(expr: ExprId, direction: DepDirection) -> Self {
        DependencyItem { expr, direction }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inout_is_in_or_out() {
        assert_eq!(DepDirection::IN | DepDirection::OUT, DepDirection::INOUT);
        assert!(DepDirection::INOUT.contains(DepDirection::OUT));
        assert!(!DepDirection::IN.contains(DepDirection::OUT));
    }

    #[test]
    fn concurrent_does_not_imply_out() {
        assert!(!DepDirection::CONCURRENT.contains(DepDirection::OUT));
    }
}
