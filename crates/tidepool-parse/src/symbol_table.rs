use tidepool_events::{N_SYMBOLS, SymbolId};

/// Compile-time-sized mapping between the exchange's `instId` names and the
/// dense `SymbolId`s used everywhere else in the pipeline.
#[derive(Clone, Debug)]
pub struct SymbolTable {
    names: [String; N_SYMBOLS],
}

impl SymbolTable {
    pub fn new(names: [String; N_SYMBOLS]) -> Self {
        Self { names }
    }

    pub fn resolve(&self, inst_id: &str) -> Option<SymbolId> {
        self.names
            .iter()
            .position(|n| n == inst_id)
            .map(|idx| SymbolId(idx as u16))
    }

    pub fn name(&self, id: SymbolId) -> &str {
        &self.names[id.index()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> SymbolTable {
        SymbolTable::new(std::array::from_fn(|i| format!("SYM{i}")))
    }

    #[test]
    fn resolves_known_symbol() {
        let t = table();
        assert_eq!(t.resolve("SYM3"), Some(SymbolId(3)));
    }

    #[test]
    fn rejects_unknown_symbol() {
        let t = table();
        assert_eq!(t.resolve("NOPE"), None);
    }
}
