//! Symbols and the per-unit symbol table.
//!
//! The real scope machinery (nesting, shadowing, C++ member lookup) is an
//! external collaborator; the lowering pass only needs a flat table with
//! the handful of flags its classification rules read.

use crate::{Name, Span};

/// Index into a [`SymbolTable`].
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug)]
#[cfg_attr(feature = "module", derive(serde::Serialize, serde::Deserialize))]
#[repr(transparent)]
pub struct SymbolId(u32);

impl SymbolId {
    #[inline]
    pub const fn raw(self) -> u32 {
        self.0
    }

    #[inline]
    pub const fn from_raw(raw: u32) -> Self {
        SymbolId(raw)
    }
}

/// One declared entity, as far as lowering cares.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Symbol {
    pub name: Name,
    pub span: Span,
    /// True for function parameters. Drives the useless-dependence filter.
    pub is_parameter: bool,
    /// True when the declared type is a reference type. A dependence on a
    /// bare non-reference parameter is never visible outside the call.
    pub is_reference: bool,
    /// Sticky `threadprivate` mark. Never cleared once set.
    pub is_threadprivate: bool,
}

impl Symbol {
    pub fn new(name: Name, span: Span) -> Self {
        Symbol {
            name,
            span,
            is_parameter: false,
            is_reference: false,
            is_threadprivate: false,
        }
    }
}

/// Flat symbol table for one compilation unit.
#[derive(Default, Debug)]
pub struct SymbolTable {
    symbols: Vec<Symbol>,
}

impl SymbolTable {
    pub fn new() -> Self {
        SymbolTable::default()
    }

    /// Register a plain variable.
    pub fn new_symbol(&mut self, name: Name, span: Span) -> SymbolId {
        self.push(Symbol::new(name, span))
    }

    /// Register a function parameter. `is_reference` reflects the declared
    /// parameter type.
    pub fn new_parameter(&mut self, name: Name, span: Span, is_reference: bool) -> SymbolId {
        self.push(Symbol {
            is_parameter: true,
            is_reference,
            ..Symbol::new(name, span)
        })
    }

    fn push(&mut self, symbol: Symbol) -> SymbolId {
        let id = SymbolId::from_raw(u32::try_from(self.symbols.len()).unwrap_or(u32::MAX));
        self.symbols.push(symbol);
        id
    }

    pub fn get(&self, id: SymbolId) -> &Symbol {
        &self.symbols[id.raw() as usize]
    }

    /// Force-mark a symbol `threadprivate`. Non-reversible; the mark
    /// persists past any construct.
    pub fn mark_threadprivate(&mut self, id: SymbolId) {
        self.symbols[id.raw() as usize].is_threadprivate = true;
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn threadprivate_mark_is_sticky() {
        let mut table = SymbolTable::new();
        let id = table.new_symbol(Name::EMPTY, Span::DUMMY);
        assert!(!table.get(id).is_threadprivate);
        table.mark_threadprivate(id);
        assert!(table.get(id).is_threadprivate);
    }

    #[test]
    fn parameters_carry_reference_flag() {
        let mut table = SymbolTable::new();
        let by_value = table.new_parameter(Name::EMPTY, Span::DUMMY, false);
        let by_ref = table.new_parameter(Name::EMPTY, Span::DUMMY, true);
        assert!(table.get(by_value).is_parameter);
        assert!(!table.get(by_value).is_reference);
        assert!(table.get(by_ref).is_reference);
    }
}
