//! Function-task records across the compilation unit, with optional
//! module-file persistence.
//!
//! Function-declared tasks outlive the directive that declared them: every
//! call site of the function consults the registry. With the `module`
//! feature enabled, the registry round-trips through a compact binary
//! module file so task declarations cross compilation-unit boundaries.

use rustc_hash::FxHashMap;
use weft_ir::{FunctionTaskInfo, SymbolId};

/// Function symbol → task declaration record.
#[derive(Debug, Default)]
pub struct FunctionTaskRegistry {
    map: FxHashMap<SymbolId, FunctionTaskInfo>,
}

impl FunctionTaskRegistry {
    pub fn new() -> Self {
        FunctionTaskRegistry::default()
    }

    /// Register a function task, returning the previous record when the
    /// function was already declared as a task.
    pub fn register(&mut self, function: SymbolId, info: FunctionTaskInfo) -> Option<FunctionTaskInfo> {
        self.map.insert(function, info)
    }

    pub fn get(&self, function: SymbolId) -> Option<&FunctionTaskInfo> {
        self.map.get(&function)
    }

    pub fn is_function_task(&self, function: SymbolId) -> bool {
        self.map.contains_key(&function)
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (SymbolId, &FunctionTaskInfo)> {
        self.map.iter().map(|(sym, info)| (*sym, info))
    }
}

#[cfg(feature = "module")]
pub use io::ModuleIoError;

#[cfg(feature = "module")]
mod io {
    use super::FunctionTaskRegistry;
    use weft_ir::{FunctionTaskInfo, SymbolId};

    /// Module file serialization failure.
    #[derive(Debug, thiserror::Error)]
    pub enum ModuleIoError {
        #[error("could not write module data: {0}")]
        Write(#[source] bincode::Error),
        #[error("could not read module data: {0}")]
        Read(#[source] bincode::Error),
    }

    impl FunctionTaskRegistry {
        /// Serialize the registry. Entries are written in symbol order so
        /// the output is deterministic across runs.
        pub fn write_module<W: std::io::Write>(&self, writer: W) -> Result<(), ModuleIoError> {
            let mut entries: Vec<(SymbolId, &FunctionTaskInfo)> = self
                .map
                .iter()
                .map(|(sym, info)| (*sym, info))
                .collect();
            entries.sort_by_key(|(sym, _)| *sym);
            bincode::serialize_into(writer, &entries).map_err(ModuleIoError::Write)
        }

        /// Deserialize a registry previously written by [`write_module`].
        ///
        /// [`write_module`]: FunctionTaskRegistry::write_module
        pub fn read_module<R: std::io::Read>(reader: R) -> Result<Self, ModuleIoError> {
            let entries: Vec<(SymbolId, FunctionTaskInfo)> =
                bincode::deserialize_from(reader).map_err(ModuleIoError::Read)?;
            let mut registry = FunctionTaskRegistry::new();
            for (sym, info) in entries {
                registry.register(sym, info);
            }
            Ok(registry)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn register_returns_the_shadowed_record() {
        let mut registry = FunctionTaskRegistry::new();
        let f = SymbolId::from_raw(3);
        assert!(registry.register(f, FunctionTaskInfo::new()).is_none());
        let mut second = FunctionTaskInfo::new();
        second.untied = true;
        let shadowed = registry.register(f, second);
        assert_eq!(shadowed, Some(FunctionTaskInfo::new()));
        assert!(registry.get(f).is_some_and(|info| info.untied));
    }

    #[cfg(feature = "module")]
    #[test]
    #[expect(clippy::unwrap_used, reason = "Tests use unwrap for brevity")]
    fn module_file_round_trips_sorted() {
        let mut registry = FunctionTaskRegistry::new();
        let mut info = FunctionTaskInfo::new();
        info.untied = true;
        registry.register(SymbolId::from_raw(7), info);
        registry.register(SymbolId::from_raw(1), FunctionTaskInfo::new());

        let mut buffer = Vec::new();
        registry.write_module(&mut buffer).unwrap();
        let restored = FunctionTaskRegistry::read_module(buffer.as_slice()).unwrap();

        assert_eq!(restored.len(), 2);
        assert!(restored
            .get(SymbolId::from_raw(7))
            .is_some_and(|info| info.untied));
    }
}
