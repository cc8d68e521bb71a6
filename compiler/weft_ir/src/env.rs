//! The execution environment: the ordered IR node list synthesized per
//! construct, and this subsystem's output contract.
//!
//! Node categories form a closed sum type. Each category appears at most
//! once per environment; dependency and data-sharing categories precede the
//! target node and the synthetic flush/barrier markers. Consumers scan
//! first-match-wins, so the accessors here stop at the first hit.

use crate::{DependencyItem, ExprId, Name, SymbolId, TargetInfo};

/// Reduction binding: (reductor symbol, reduced symbol, reduction type).
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
#[cfg_attr(feature = "module", derive(serde::Serialize, serde::Deserialize))]
pub struct ReductionItem {
    /// The reduction operator symbol (`+`, `max`, a declared reductor).
    pub reductor: Name,
    pub symbol: SymbolId,
    pub reduction_type: Name,
}

/// One node of the execution environment.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum EnvNode {
    // Data-sharing categories. Symbol order is first-seen order.
    Private(Vec<SymbolId>),
    Firstprivate(Vec<SymbolId>),
    Lastprivate(Vec<SymbolId>),
    FirstLastprivate(Vec<SymbolId>),
    Auto(Vec<SymbolId>),
    Shared(Vec<SymbolId>),
    Threadprivate(Vec<SymbolId>),
    // Reductions
    Reduction(Vec<ReductionItem>),
    TaskReduction(Vec<ReductionItem>),
    SimdReduction(Vec<ReductionItem>),
    // Dependencies, one node per direction class, items in clause order.
    DepIn(Vec<DependencyItem>),
    DepInPrivate(Vec<DependencyItem>),
    DepOut(Vec<DependencyItem>),
    DepInout(Vec<DependencyItem>),
    Concurrent(Vec<DependencyItem>),
    Commutative(Vec<DependencyItem>),
    // Offload metadata (device list already defaulted).
    Target(TargetInfo),
    // Synthetic synchronization markers and per-construct policy nodes.
    FlushAtEntry,
    FlushAtExit,
    BarrierAtEnd,
    NoFlush,
    CombinedWorksharing,
    Schedule { kind: Name, chunk: ExprId },
    If(ExprId),
    Final(ExprId),
    Priority(ExprId),
    Untied,
    TaskLabel(Name),
    CriticalName(Name),
}

impl EnvNode {
    /// True for data-sharing, reduction, and dependency categories, the
    /// nodes that must precede target info and synthetic markers.
    pub fn is_data_category(&self) -> bool {
        matches!(
            self,
            EnvNode::Private(_)
                | EnvNode::Firstprivate(_)
                | EnvNode::Lastprivate(_)
                | EnvNode::FirstLastprivate(_)
                | EnvNode::Auto(_)
                | EnvNode::Shared(_)
                | EnvNode::Threadprivate(_)
                | EnvNode::Reduction(_)
                | EnvNode::TaskReduction(_)
                | EnvNode::SimdReduction(_)
                | EnvNode::DepIn(_)
                | EnvNode::DepInPrivate(_)
                | EnvNode::DepOut(_)
                | EnvNode::DepInout(_)
                | EnvNode::Concurrent(_)
                | EnvNode::Commutative(_)
        )
    }
}

/// Ordered node list handed to the code generator.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ExecutionEnvironment {
    nodes: Vec<EnvNode>,
}

impl ExecutionEnvironment {
    pub fn new() -> Self {
        ExecutionEnvironment::default()
    }

    pub fn push(&mut self, node: EnvNode) {
        self.nodes.push(node);
    }

    pub fn nodes(&self) -> &[EnvNode] {
        &self.nodes
    }

    pub fn nodes_mut(&mut self) -> &mut [EnvNode] {
        &mut self.nodes
    }

    pub fn iter(&self) -> impl Iterator<Item = &EnvNode> {
        self.nodes.iter()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Append symbols to the `Firstprivate` category, creating the node if
    /// missing. A created node is inserted after the last data category so
    /// the ordering contract (data before target/synthetics) holds even
    /// when the environment was already finalized, as happens during
    /// taskloop blocking.
    pub fn extend_firstprivate(&mut self, symbols: impl IntoIterator<Item = SymbolId>) {
        let mut symbols = symbols.into_iter().collect::<Vec<_>>();
        if let Some(EnvNode::Firstprivate(existing)) = self
            .nodes
            .iter_mut()
            .find(|n| matches!(n, EnvNode::Firstprivate(_)))
        {
            existing.append(&mut symbols);
            return;
        }
        let at = self
            .nodes
            .iter()
            .rposition(EnvNode::is_data_category)
            .map_or(0, |i| i + 1);
        self.nodes.insert(at, EnvNode::Firstprivate(symbols));
    }

    // First-match-wins accessors, mirroring how consumers scan.

    pub fn schedule(&self) -> Option<(Name, ExprId)> {
        self.nodes.iter().find_map(|n| match n {
            EnvNode::Schedule { kind, chunk } => Some((*kind, *chunk)),
            _ => None,
        })
    }

    pub fn shared_symbols(&self) -> &[SymbolId] {
        self.nodes
            .iter()
            .find_map(|n| match n {
                EnvNode::Shared(syms) => Some(syms.as_slice()),
                _ => None,
            })
            .unwrap_or(&[])
    }

    pub fn firstprivate_symbols(&self) -> &[SymbolId] {
        self.nodes
            .iter()
            .find_map(|n| match n {
                EnvNode::Firstprivate(syms) => Some(syms.as_slice()),
                _ => None,
            })
            .unwrap_or(&[])
    }

    pub fn has_barrier_at_end(&self) -> bool {
        self.nodes.iter().any(|n| matches!(n, EnvNode::BarrierAtEnd))
    }

    pub fn has_flush_at_exit(&self) -> bool {
        self.nodes.iter().any(|n| matches!(n, EnvNode::FlushAtExit))
    }

    pub fn is_untied(&self) -> bool {
        self.nodes.iter().any(|n| matches!(n, EnvNode::Untied))
    }
}

impl IntoIterator for ExecutionEnvironment {
    type Item = EnvNode;
    type IntoIter = std::vec::IntoIter<EnvNode>;

    fn into_iter(self) -> Self::IntoIter {
        self.nodes.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extend_firstprivate_merges_into_existing_node() {
        let mut env = ExecutionEnvironment::new();
        env.push(EnvNode::Firstprivate(vec![SymbolId::from_raw(1)]));
        env.push(EnvNode::BarrierAtEnd);
        env.extend_firstprivate([SymbolId::from_raw(2)]);
        assert_eq!(
            env.firstprivate_symbols(),
            &[SymbolId::from_raw(1), SymbolId::from_raw(2)]
        );
        assert_eq!(env.len(), 2);
    }

    #[test]
    fn extend_firstprivate_inserts_before_synthetic_nodes() {
        let mut env = ExecutionEnvironment::new();
        env.push(EnvNode::Shared(vec![SymbolId::from_raw(1)]));
        env.push(EnvNode::FlushAtExit);
        env.push(EnvNode::BarrierAtEnd);
        env.extend_firstprivate([SymbolId::from_raw(3)]);
        assert_eq!(
            env.nodes()[1],
            EnvNode::Firstprivate(vec![SymbolId::from_raw(3)])
        );
        assert!(matches!(env.nodes()[2], EnvNode::FlushAtExit));
    }
}
