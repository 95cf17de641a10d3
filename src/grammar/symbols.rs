use rustc_hash::FxHashMap;

use super::SymbolId;
use crate::error::GrammarErrorKind;

/// Name of the rule every grammar must define.
pub const ROOT: &str = "root";

/// Bidirectional mapping between rule names and dense ids.
///
/// Ids are handed out in first-use order, whether the first use is a
/// definition or a reference. Synthesized names embed their own id, so they
/// never collide with each other or with user names (which cannot contain
/// digits).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SymbolTable {
    names: Vec<String>,
    ids: FxHashMap<String, SymbolId>,
}

impl SymbolTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Id for `name`, allocating the next one on first use.
    pub fn resolve(&mut self, name: &str) -> SymbolId {
        if let Some(&id) = self.ids.get(name) {
            return id;
        }
        self.insert(name.to_string())
    }

    /// Allocate a fresh id named `<base>_<id>`.
    pub fn synthesize(&mut self, base: &str) -> SymbolId {
        let next = self.names.len();
        self.insert(format!("{base}_{next}"))
    }

    fn insert(&mut self, name: String) -> SymbolId {
        let id = SymbolId(self.names.len() as u32);
        self.ids.insert(name.clone(), id);
        self.names.push(name);
        id
    }

    pub fn get(&self, name: &str) -> Option<SymbolId> {
        self.ids.get(name).copied()
    }

    /// Reverse lookup, used to name undefined symbols in diagnostics.
    pub fn name(&self, id: SymbolId) -> Option<&str> {
        self.names.get(id.index()).map(String::as_str)
    }

    /// Id of the `root` rule.
    pub fn root(&self) -> Result<SymbolId, GrammarErrorKind> {
        self.get(ROOT).ok_or(GrammarErrorKind::MissingRoot)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// `(id, name)` pairs in id order.
    pub fn iter(&self) -> impl Iterator<Item = (SymbolId, &str)> {
        self.names
            .iter()
            .enumerate()
            .map(|(i, name)| (SymbolId(i as u32), name.as_str()))
    }
}
