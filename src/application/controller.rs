//! Engine Controller: routes each instruction to the correct per-symbol
//! engine and owns the `orderId → symbol` map needed to route cancels
//! (spec §4.4).
//!
//! Grounded on `partitioned_engine.rs` in the teacher for the
//! symbol-sharded registry shape, and on
//! `original_source/src/EngineController.cpp` for the two-genuinely-separate
//! locks (`enginesMutex` / `orderSymbolMapMutex`) confirmed in SPEC_FULL.md §B.4.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use tracing::{info, warn};

use crate::application::dto::{AddRequest, CancelReplaceRequest, CancelRequest, SnapshotRequestMsg, SnapshotResponse};
use crate::application::engine::MatchingEngine;
use crate::application::wal::WalSink;
use crate::domain::config::SymbolConfigRegistry;
use crate::domain::errors::RejectReason;
use crate::domain::model::SymbolConfig;
use crate::domain::orderbook::Trade;

/// Routes instructions to per-symbol engines.
///
/// The engine map and the orderId→symbol map are two genuinely independent
/// locks, matching the original's `enginesMutex`/`orderSymbolMapMutex`
/// split rather than one lock covering both structures.
pub struct EngineController {
    engines: RwLock<HashMap<Arc<str>, Arc<MatchingEngine>>>,
    order_symbol_map: Mutex<HashMap<u64, Arc<str>>>,
    config: Arc<SymbolConfigRegistry>,
    wal: Arc<dyn WalSink>,
}

impl EngineController {
    pub fn new(config: Arc<SymbolConfigRegistry>, wal: Arc<dyn WalSink>) -> Self {
        Self {
            engines: RwLock::new(HashMap::new()),
            order_symbol_map: Mutex::new(HashMap::new()),
            config,
            wal,
        }
    }

    /// Idempotent-rejecting: a second call for the same symbol is a no-op
    /// warning, not an error (spec §4.4).
    pub fn add_engine_for_symbol(
        &self,
        symbol: Arc<str>,
        tick_size: f64,
        min_quantity: u64,
        min_price: f64,
        max_price: f64,
        volatility_threshold: f64,
        reference_price: f64,
    ) {
        let mut engines = self.engines.write();
        if engines.contains_key(&symbol) {
            warn!(%symbol, "engine already registered for symbol, ignoring");
            return;
        }
        self.config.set_config(
            symbol.clone(),
            SymbolConfig::new(tick_size, min_quantity, min_price, max_price, volatility_threshold, reference_price),
        );
        engines.insert(
            symbol.clone(),
            Arc::new(MatchingEngine::new(symbol.clone(), self.config.clone(), self.wal.clone())),
        );
        info!(%symbol, "engine registered");
    }

    fn engine_for(&self, symbol: &str) -> Option<Arc<MatchingEngine>> {
        self.engines.read().get(symbol).cloned()
    }

    pub fn dispatch_add(&self, req: &AddRequest, timestamp: u64) -> Result<Vec<Trade>, RejectReason> {
        let engine = self.engine_for(&req.symbol).ok_or(RejectReason::NotFound)?;
        let result = engine.process_add(req, timestamp);
        if result.is_ok() {
            self.order_symbol_map.lock().insert(req.order_id, req.symbol.clone());
        }
        result
    }

    pub fn dispatch_cancel(&self, req: &CancelRequest) -> Result<(), RejectReason> {
        let symbol = self
            .order_symbol_map
            .lock()
            .get(&req.order_id)
            .cloned()
            .ok_or(RejectReason::NotFound)?;
        let engine = self.engine_for(&symbol).ok_or(RejectReason::NotFound)?;
        let result = engine.process_cancel(req);
        if result.is_ok() {
            self.order_symbol_map.lock().remove(&req.order_id);
        }
        result
    }

    pub fn dispatch_cancel_replace(
        &self,
        req: &CancelReplaceRequest,
        timestamp: u64,
    ) -> Result<Vec<Trade>, RejectReason> {
        let symbol = self
            .order_symbol_map
            .lock()
            .get(&req.order_id)
            .cloned()
            .ok_or(RejectReason::NotFound)?;
        let engine = self.engine_for(&symbol).ok_or(RejectReason::NotFound)?;
        engine.process_cancel_replace(req, timestamp)
    }

    pub fn dispatch_snapshot_request(&self, req: &SnapshotRequestMsg) -> Result<SnapshotResponse, RejectReason> {
        let engine = self.engine_for(&req.symbol).ok_or(RejectReason::NotFound)?;
        Ok(engine.process_snapshot_request())
    }
}
