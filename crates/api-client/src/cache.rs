use std::collections::HashMap;
use std::sync::{Arc, RwLock};

/// Shared lookup from base symbol to a provider-specific asset identifier.
///
/// Populated lazily and read many times. Concurrent resolutions of the same
/// symbol are idempotent, so the first stored id wins and later inserts return
/// it unchanged. Clones share the same table.
#[derive(Debug, Clone, Default)]
pub struct SymbolIdCache {
    inner: Arc<RwLock<HashMap<String, String>>>,
}

impl SymbolIdCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, symbol: &str) -> Option<String> {
        let map = self.inner.read().unwrap_or_else(|e| e.into_inner());
        map.get(&symbol.to_ascii_uppercase()).cloned()
    }

    /// Stores `id` unless the symbol is already known; returns the stored id.
    pub fn insert(&self, symbol: &str, id: impl Into<String>) -> String {
        let mut map = self.inner.write().unwrap_or_else(|e| e.into_inner());
        map.entry(symbol.to_ascii_uppercase())
            .or_insert_with(|| id.into())
            .clone()
    }

    pub fn len(&self) -> usize {
        self.inner.read().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
