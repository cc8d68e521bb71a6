//! Per-construct data-sharing environments.
//!
//! One [`DataSharingEnvironment`] exists per directive occurrence. It is
//! created when the directive is first visited, pushed on a scope stack for
//! the duration of the construct, populated by clause processing, consumed
//! exactly once when the execution environment is synthesized, and then
//! discarded, unless the construct is a function-declared task, in which
//! case its content moves into a long-lived
//! [`weft_ir::FunctionTaskInfo`].

mod resolver;

pub use resolver::DataSharingResolver;

use rustc_hash::FxHashMap;
use weft_ir::{
    ConstructKind, DataSharingAttribute, DefaultKind, DependencyItem, DirectiveId, ReductionItem,
    SymbolId, TargetInfo,
};

/// One variable's classification inside a construct.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SharingEntry {
    pub attribute: DataSharingAttribute,
    /// Set when the attribute was inferred rather than clause-listed.
    pub implicit: bool,
    /// Why the variable got this attribute, for the lowering report.
    pub reason: String,
}

/// Stack-scoped mapping from variable to attribute, plus the construct's
/// reductions, dependencies, and target info.
///
/// Entry order is first-seen order; the environment builder relies on it.
#[derive(Debug)]
pub struct DataSharingEnvironment {
    construct: ConstructKind,
    entries: Vec<(SymbolId, SharingEntry)>,
    index: FxHashMap<SymbolId, usize>,
    reductions: Vec<ReductionItem>,
    simd_reductions: Vec<ReductionItem>,
    dependencies: Vec<DependencyItem>,
    target: TargetInfo,
    default_kind: Option<DefaultKind>,
}

impl DataSharingEnvironment {
    pub fn new(construct: ConstructKind) -> Self {
        DataSharingEnvironment {
            construct,
            entries: Vec::new(),
            index: FxHashMap::default(),
            reductions: Vec::new(),
            simd_reductions: Vec::new(),
            dependencies: Vec::new(),
            target: TargetInfo::new(),
            default_kind: None,
        }
    }

    pub fn construct(&self) -> ConstructKind {
        self.construct
    }

    /// Classify a variable. Re-classification overwrites: a variable has
    /// exactly one attribute value per construct scope.
    pub fn set_sharing(
        &mut self,
        sym: SymbolId,
        attribute: DataSharingAttribute,
        implicit: bool,
        reason: impl Into<String>,
    ) {
        let entry = SharingEntry {
            attribute,
            implicit,
            reason: reason.into(),
        };
        if let Some(&at) = self.index.get(&sym) {
            self.entries[at].1 = entry;
        } else {
            self.index.insert(sym, self.entries.len());
            self.entries.push((sym, entry));
        }
    }

    pub fn sharing(&self, sym: SymbolId) -> Option<&SharingEntry> {
        self.index.get(&sym).map(|&at| &self.entries[at].1)
    }

    /// Symbols carrying `attribute`, in first-seen order.
    pub fn symbols_with(&self, attribute: DataSharingAttribute) -> Vec<SymbolId> {
        self.entries
            .iter()
            .filter(|(_, e)| e.attribute == attribute)
            .map(|(sym, _)| *sym)
            .collect()
    }

    pub fn entries(&self) -> impl Iterator<Item = (SymbolId, &SharingEntry)> {
        self.entries.iter().map(|(sym, e)| (*sym, e))
    }

    pub fn add_reduction(&mut self, item: ReductionItem) {
        self.reductions.push(item);
    }

    pub fn add_simd_reduction(&mut self, item: ReductionItem) {
        self.simd_reductions.push(item);
    }

    pub fn reductions(&self) -> &[ReductionItem] {
        &self.reductions
    }

    pub fn simd_reductions(&self) -> &[ReductionItem] {
        &self.simd_reductions
    }

    pub fn add_dependency(&mut self, item: DependencyItem) {
        self.dependencies.push(item);
    }

    pub fn dependencies(&self) -> &[DependencyItem] {
        &self.dependencies
    }

    pub fn dependencies_mut(&mut self) -> &mut Vec<DependencyItem> {
        &mut self.dependencies
    }

    pub fn set_default_kind(&mut self, kind: DefaultKind) {
        self.default_kind = Some(kind);
    }

    pub fn default_kind(&self) -> Option<DefaultKind> {
        self.default_kind
    }

    pub fn set_target(&mut self, target: TargetInfo) {
        self.target = target;
    }

    pub fn target(&self) -> &TargetInfo {
        &self.target
    }
}

/// LIFO stack of environments, pushed/popped in construct nesting order.
///
/// A construct's environment must be popped before its lexical parent's is
/// touched again; the stack is passed explicitly to keep the pass
/// reentrant.
#[derive(Debug, Default)]
pub struct DataSharingStack {
    stack: Vec<DataSharingEnvironment>,
}

impl DataSharingStack {
    pub fn new() -> Self {
        DataSharingStack::default()
    }

    pub fn push(&mut self, env: DataSharingEnvironment) {
        self.stack.push(env);
    }

    pub fn pop(&mut self) -> Option<DataSharingEnvironment> {
        self.stack.pop()
    }

    pub fn current(&self) -> Option<&DataSharingEnvironment> {
        self.stack.last()
    }

    pub fn current_mut(&mut self) -> Option<&mut DataSharingEnvironment> {
        self.stack.last_mut()
    }

    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    /// Attribute of `sym` in the nearest enclosing (non-top) environment.
    pub fn enclosing_attribute(&self, sym: SymbolId) -> Option<DataSharingAttribute> {
        self.stack
            .iter()
            .rev()
            .skip(1)
            .find_map(|env| env.sharing(sym).map(|e| e.attribute))
    }
}

/// Environments keyed by directive, as built by the earlier analysis pass.
///
/// Each environment is consumed exactly once, when its directive's
/// execution environment is synthesized.
#[derive(Debug, Default)]
pub struct DataSharingRegistry {
    map: FxHashMap<DirectiveId, DataSharingEnvironment>,
}

impl DataSharingRegistry {
    pub fn new() -> Self {
        DataSharingRegistry::default()
    }

    pub fn insert(&mut self, id: DirectiveId, env: DataSharingEnvironment) {
        self.map.insert(id, env);
    }

    /// Remove and return the environment for a directive.
    pub fn take(&mut self, id: DirectiveId) -> Option<DataSharingEnvironment> {
        self.map.remove(&id)
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}
