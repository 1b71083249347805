//! Symbol configuration registry (spec §4.1): `setConfig`/`getConfig`/
//! `halt`/`resume`, keyed by symbol.
//!
//! Grounded on `original_source/src/SymbolConfigManager` (a mutex-guarded
//! `unordered_map<string, SymbolConfig>`) and the teacher's
//! `parking_lot::RwLock` usage for shared config maps throughout
//! `domain::orderbook`.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;

use super::model::SymbolConfig;

/// Shared, thread-safe store of per-symbol configuration.
///
/// A single `RwLock<HashMap<..>>` is sufficient here: config reads are far
/// more frequent than config writes (registration, halt, resume), but
/// config writes are rare control-plane events, not hot-path order flow.
#[derive(Default)]
pub struct SymbolConfigRegistry {
    inner: RwLock<HashMap<Arc<str>, SymbolConfig>>,
}

impl SymbolConfigRegistry {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(HashMap::new()),
        }
    }

    pub fn set_config(&self, symbol: Arc<str>, cfg: SymbolConfig) {
        self.inner.write().insert(symbol, cfg);
    }

    pub fn get_config(&self, symbol: &str) -> Option<SymbolConfig> {
        self.inner.read().get(symbol).cloned()
    }

    /// Halts trading for `symbol`. No-op if the symbol is unknown.
    pub fn halt(&self, symbol: &str) {
        if let Some(cfg) = self.inner.write().get_mut(symbol) {
            cfg.trading_halted = true;
        }
    }

    /// Resumes trading for `symbol`. No-op if the symbol is unknown.
    pub fn resume(&self, symbol: &str) {
        if let Some(cfg) = self.inner.write().get_mut(symbol) {
            cfg.trading_halted = false;
        }
    }

    pub fn is_halted(&self, symbol: &str) -> bool {
        self.inner
            .read()
            .get(symbol)
            .map(|c| c.trading_halted)
            .unwrap_or(false)
    }

    pub fn contains(&self, symbol: &str) -> bool {
        self.inner.read().contains_key(symbol)
    }
}
