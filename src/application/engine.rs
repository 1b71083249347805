//! Matching engine: one instance per symbol. Validates incoming
//! instructions, coordinates book mutations, assigns execution sequence
//! numbers, and emits executions to the WAL (spec §4.3).
//!
//! Grounded on `engine.rs` in the teacher for the public-operation shape
//! (`process_add`/`process_cancel`/...) and on
//! `original_source/src/MatchingEngine.cpp` for dispatch-by-type/TIF
//! semantics, corrected per the design notes: FOK is a true dry-run
//! all-or-nothing, and EXEC WAL lines are appended while the book's write
//! lock is still held (see SPEC_FULL.md §B.4 and spec §5/§9).

use std::sync::atomic::AtomicU64;
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::{error, info, warn};

use crate::application::dto::{AddRequest, CancelReplaceRequest, CancelRequest, SnapshotResponse};
use crate::application::wal::WalSink;
use crate::domain::config::SymbolConfigRegistry;
use crate::domain::errors::RejectReason;
use crate::domain::model::{Order, OrderType, TimeInForce};
use crate::domain::orderbook::{OrderBook, Trade};
use crate::domain::validation::{is_volatility_breach, validate_add, validate_cancel, validate_cancel_replace};
use crate::shared::metrics::METRICS;

pub struct MatchingEngine {
    symbol: Arc<str>,
    book: RwLock<OrderBook>,
    config: Arc<SymbolConfigRegistry>,
    wal: Arc<dyn WalSink>,
    next_sequence: AtomicU64,
}

impl MatchingEngine {
    pub fn new(symbol: Arc<str>, config: Arc<SymbolConfigRegistry>, wal: Arc<dyn WalSink>) -> Self {
        Self {
            book: RwLock::new(OrderBook::new(symbol.clone())),
            symbol,
            config,
            wal,
            next_sequence: AtomicU64::new(1),
        }
    }

    pub fn symbol(&self) -> &Arc<str> {
        &self.symbol
    }

    fn build_order(&self, req: &AddRequest, timestamp: u64) -> Order {
        let total = req.quantity;
        let (visible_quantity, exposed) = if req.order_type == OrderType::Iceberg {
            let v = if req.visible_quantity == 0 {
                total
            } else {
                req.visible_quantity.min(total)
            };
            (v, v)
        } else {
            (0, total)
        };
        Order {
            order_id: req.order_id,
            side: req.side,
            symbol: self.symbol.clone(),
            price: req.price,
            quantity: exposed,
            timestamp,
            participant_id: req.participant_id,
            tif: req.tif,
            order_type: req.order_type,
            trigger_price: req.trigger_price,
            visible_quantity,
            total_quantity: total,
            filled_quantity: 0,
        }
    }

    /// §4.3 `processAdd`. Returns the trades produced (possibly empty). A
    /// `RejectReason` means the book was never mutated and nothing was
    /// appended to the WAL.
    pub fn process_add(&self, req: &AddRequest, timestamp: u64) -> Result<Vec<Trade>, RejectReason> {
        let order = self.build_order(req, timestamp);
        let cfg = self.config.get_config(&self.symbol).ok_or(RejectReason::NotFound)?;

        if let Err(reason) = validate_add(&order, &cfg) {
            if reason == RejectReason::Policy && is_volatility_breach(&order, &cfg) {
                self.config.halt(&self.symbol);
                warn!(symbol = %self.symbol, price = order.price, "volatility breach, halting symbol");
            }
            warn!(symbol = %self.symbol, order_id = order.order_id, ?reason, "add rejected");
            return Err(reason);
        }

        let mut book = self.book.write();
        if book.contains(order.order_id) {
            warn!(symbol = %self.symbol, order_id = order.order_id, "add rejected: duplicate order id");
            return Err(RejectReason::Malformed);
        }

        let timer_start = std::time::Instant::now();

        self.wal
            .append_add(req.sequence, order.order_id, &self.symbol, order.price, order.total_quantity)
            .map_err(|e| {
                error!(symbol = %self.symbol, error = %e, "wal append (ADD) failed");
                RejectReason::WalFailure
            })?;

        let mut trades = match (order.order_type, order.tif) {
            (OrderType::StopLoss, TimeInForce::Gtc) => {
                book.add_order(order)?;
                Vec::new()
            }
            (OrderType::StopLoss, TimeInForce::Ioc) | (OrderType::StopLoss, TimeInForce::Fok) => {
                // original_source/src/MatchingEngine.cpp: handleIocFok places
                // the stop into the trigger map like any add, then
                // checkTimeInForce sees quantity still >0 and cancels it
                // immediately — a non-GTC stop never rests.
                let order_id = order.order_id;
                let participant = order.participant_id;
                book.add_order(order)?;
                let _ = book.cancel_order(order_id, participant);
                Vec::new()
            }
            (OrderType::Market, _) => {
                book.add_order(order.clone())?;
                let (_, trades) = book.match_market(order, timestamp, &self.next_sequence);
                trades
            }
            (_, TimeInForce::Fok) => {
                let mut dry = book.clone();
                let order_id = order.order_id;
                dry.add_order(order.clone())?;
                let dry_seq = AtomicU64::new(1);
                dry.match_book(timestamp, &dry_seq);
                if dry.contains(order_id) {
                    info!(symbol = %self.symbol, order_id, "fok did not fully fill, discarded");
                    Vec::new()
                } else {
                    book.add_order(order)?;
                    book.match_book(timestamp, &self.next_sequence)
                }
            }
            (_, TimeInForce::Ioc) => {
                let order_id = order.order_id;
                let participant = order.participant_id;
                book.add_order(order)?;
                let trades = book.match_book(timestamp, &self.next_sequence);
                let _ = book.cancel_order(order_id, participant);
                trades
            }
            (_, TimeInForce::Gtc) => {
                book.add_order(order)?;
                book.match_book(timestamp, &self.next_sequence)
            }
        };

        if !trades.is_empty() {
            let stop_trades = book.trigger_stops(timestamp, &self.next_sequence);
            trades.extend(stop_trades);
        }

        // Executions are WALed while the book's write lock is still held,
        // so WAL order matches the order in which trades become visible.
        for t in &trades {
            self.wal.append_exec(t.sequence, &self.symbol, t.price, t.quantity).map_err(|e| {
                error!(symbol = %self.symbol, error = %e, "wal append (EXEC) failed");
                RejectReason::WalFailure
            })?;
        }
        METRICS
            .matching_duration_us
            .with_label_values(&[&self.symbol])
            .observe(timer_start.elapsed().as_micros() as f64);
        drop(book);

        for t in &trades {
            info!(
                symbol = %self.symbol,
                sequence = t.sequence,
                price = t.price,
                qty = t.quantity,
                "execution"
            );
        }

        Ok(trades)
    }

    pub fn process_cancel(&self, req: &CancelRequest) -> Result<(), RejectReason> {
        validate_cancel(req.order_id)?;
        let mut book = self.book.write();
        if let Err(reason) = book.check_cancelable(req.order_id, req.participant_id) {
            METRICS.cancellations_total.with_label_values(&[&self.symbol, "nack"]).inc();
            warn!(symbol = %self.symbol, order_id = req.order_id, ?reason, "cancel rejected");
            return Err(reason);
        }
        self.wal.append_cancel(req.sequence, req.order_id).map_err(|e| {
            error!(symbol = %self.symbol, error = %e, "wal append (CANCEL) failed");
            RejectReason::WalFailure
        })?;
        // Already validated above under the same write lock, so this cannot
        // fail — cancel_order re-checks ownership defensively but the
        // outcome here is always `Ok`.
        let result = book.cancel_order(req.order_id, req.participant_id);
        METRICS
            .cancellations_total
            .with_label_values(&[&self.symbol, if result.is_ok() { "ack" } else { "nack" }])
            .inc();
        result
    }

    pub fn process_cancel_replace(
        &self,
        req: &CancelReplaceRequest,
        timestamp: u64,
    ) -> Result<Vec<Trade>, RejectReason> {
        let cfg = self.config.get_config(&self.symbol).ok_or(RejectReason::NotFound)?;
        validate_cancel_replace(req.order_id, req.new_price, req.new_quantity, &cfg)?;

        let mut book = self.book.write();
        book.check_modifiable(req.order_id, req.participant_id)?;

        let timer_start = std::time::Instant::now();

        self.wal
            .append_cancel_replace(req.sequence, req.order_id, req.new_price, req.new_quantity)
            .map_err(|e| {
                error!(symbol = %self.symbol, error = %e, "wal append (CANCEL_REPLACE) failed");
                RejectReason::WalFailure
            })?;

        // Already validated above under the same write lock, so this cannot
        // fail.
        book.modify_order(req.order_id, req.new_price, req.new_quantity, req.participant_id)?;
        // Unconditional: cheap when the book isn't crossed, and picks up
        // crosses created by other orders already resting (see SPEC_FULL.md §B.6).
        let mut trades = book.match_book(timestamp, &self.next_sequence);
        if !trades.is_empty() {
            let stop_trades = book.trigger_stops(timestamp, &self.next_sequence);
            trades.extend(stop_trades);
        }
        for t in &trades {
            self.wal.append_exec(t.sequence, &self.symbol, t.price, t.quantity).map_err(|e| {
                error!(symbol = %self.symbol, error = %e, "wal append (EXEC) failed");
                RejectReason::WalFailure
            })?;
        }
        METRICS
            .matching_duration_us
            .with_label_values(&[&self.symbol])
            .observe(timer_start.elapsed().as_micros() as f64);
        Ok(trades)
    }

    pub fn process_snapshot_request(&self) -> SnapshotResponse {
        let book = self.book.read();
        SnapshotResponse {
            symbol: self.symbol.clone(),
            best_bid: book.best_bid(),
            best_ask: book.best_ask(),
            last_trade_price: book.last_trade_price_vwap(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::wal::InMemoryWalSink;
    use crate::domain::model::{Side, SymbolConfig};

    fn engine() -> MatchingEngine {
        let config = Arc::new(SymbolConfigRegistry::new());
        config.set_config(Arc::from("AAPL"), SymbolConfig::new(0.01, 1, 1.00, 10000.00, 0.5, 150.00));
        MatchingEngine::new(Arc::from("AAPL"), config, Arc::new(InMemoryWalSink::new()))
    }

    fn add(order_id: u64, side: Side, price: f64, qty: u64, participant: u64) -> AddRequest {
        AddRequest {
            sequence: order_id,
            order_id,
            symbol: Arc::from("AAPL"),
            price,
            quantity: qty,
            side,
            tif: TimeInForce::Gtc,
            order_type: OrderType::Limit,
            participant_id: participant,
            trigger_price: 0.0,
            visible_quantity: 0,
        }
    }

    #[test]
    fn simple_cross_scenario_1() {
        let engine = engine();
        engine.process_add(&add(1, Side::Buy, 150.00, 100, 1), 1).unwrap();
        let trades = engine.process_add(&add(2, Side::Sell, 150.00, 60, 2), 2).unwrap();
        assert_eq!(trades.len(), 1);
        assert_eq!(trades[0].sequence, 1);
        assert_eq!(trades[0].quantity, 60);
        let snap = engine.process_snapshot_request();
        assert_eq!(snap.best_bid, Some(150.00));
        assert_eq!(snap.best_ask, None);
    }

    #[test]
    fn ioc_residue_cancelled_scenario_2() {
        let engine = engine();
        engine.process_add(&add(1, Side::Buy, 150.00, 100, 1), 1).unwrap();
        engine.process_add(&add(2, Side::Sell, 150.00, 60, 2), 2).unwrap();

        let mut ioc = add(3, Side::Sell, 150.00, 100, 2);
        ioc.tif = TimeInForce::Ioc;
        let trades = engine.process_add(&ioc, 3).unwrap();
        assert_eq!(trades.len(), 1);
        assert_eq!(trades[0].quantity, 40);

        let snap = engine.process_snapshot_request();
        assert_eq!(snap.best_bid, None);
        assert_eq!(snap.best_ask, None);
    }

    #[test]
    fn volatility_breach_halts_symbol_scenario_4() {
        let engine = engine();
        let mut order = add(1, Side::Buy, 226.00, 1, 1);
        order.price = 226.00;
        let result = engine.process_add(&order, 1);
        assert_eq!(result, Err(RejectReason::Policy));

        let second = add(2, Side::Buy, 150.00, 1, 1);
        assert_eq!(engine.process_add(&second, 2), Err(RejectReason::Policy));
    }

    #[test]
    fn fok_that_cannot_fill_leaves_book_untouched() {
        let engine = engine();
        engine.process_add(&add(1, Side::Sell, 150.00, 10, 1), 1).unwrap();

        let mut fok = add(2, Side::Buy, 150.00, 100, 2);
        fok.tif = TimeInForce::Fok;
        let trades = engine.process_add(&fok, 2).unwrap();
        assert!(trades.is_empty());

        let snap = engine.process_snapshot_request();
        assert_eq!(snap.best_ask, Some(150.00));
        assert_eq!(snap.best_bid, None);
    }

    #[test]
    fn fok_that_can_fully_fill_executes() {
        let engine = engine();
        engine.process_add(&add(1, Side::Sell, 150.00, 100, 1), 1).unwrap();

        let mut fok = add(2, Side::Buy, 150.00, 60, 2);
        fok.tif = TimeInForce::Fok;
        let trades = engine.process_add(&fok, 2).unwrap();
        assert_eq!(trades.len(), 1);
        assert_eq!(trades[0].quantity, 60);
    }

    #[test]
    fn self_trade_block_scenario_6() {
        let engine = engine();
        engine.process_add(&add(1, Side::Buy, 100.00, 10, 1), 1).unwrap();
        let trades = engine.process_add(&add(2, Side::Sell, 100.00, 10, 1), 2).unwrap();
        assert!(trades.is_empty());
        let snap = engine.process_snapshot_request();
        assert_eq!(snap.best_bid, Some(100.00));
        assert_eq!(snap.best_ask, Some(100.00));
    }

    fn cancel(order_id: u64, participant: u64) -> CancelRequest {
        CancelRequest { sequence: order_id, order_id, participant_id: participant }
    }

    fn engine_with_wal() -> (MatchingEngine, Arc<InMemoryWalSink>) {
        let wal = Arc::new(InMemoryWalSink::new());
        let config = Arc::new(SymbolConfigRegistry::new());
        config.set_config(Arc::from("AAPL"), SymbolConfig::new(0.01, 1, 1.00, 10000.00, 0.5, 150.00));
        (MatchingEngine::new(Arc::from("AAPL"), config, wal.clone()), wal)
    }

    #[test]
    fn cancel_of_unknown_order_leaves_no_wal_record() {
        let (engine, wal) = engine_with_wal();
        assert_eq!(engine.process_cancel(&cancel(999, 1)), Err(RejectReason::NotFound));
        assert!(wal.records().is_empty());
    }

    #[test]
    fn cancel_by_wrong_participant_leaves_no_wal_record_or_mutation() {
        let (engine, wal) = engine_with_wal();
        engine.process_add(&add(1, Side::Buy, 100.00, 10, 1), 1).unwrap();
        assert_eq!(engine.process_cancel(&cancel(1, 99)), Err(RejectReason::Policy));
        // only the ADD was ever appended, no CANCEL line for the rejected attempt
        assert_eq!(wal.records(), vec!["ADD|1|1|AAPL|100|10".to_string()]);
        let snap = engine.process_snapshot_request();
        assert_eq!(snap.best_bid, Some(100.00));
    }

    #[test]
    fn duplicate_order_id_leaves_no_second_wal_record() {
        let (engine, wal) = engine_with_wal();
        engine.process_add(&add(1, Side::Buy, 100.00, 10, 1), 1).unwrap();
        assert_eq!(
            engine.process_add(&add(1, Side::Sell, 100.00, 10, 2), 2),
            Err(RejectReason::Malformed)
        );
        assert_eq!(wal.records(), vec!["ADD|1|1|AAPL|100|10".to_string()]);
    }

    #[test]
    fn stop_loss_with_ioc_is_armed_then_immediately_cancelled() {
        let engine = engine();
        let mut stop = add(1, Side::Buy, 0.0, 50, 1);
        stop.order_type = OrderType::StopLoss;
        stop.trigger_price = 152.00;
        stop.tif = TimeInForce::Ioc;
        let trades = engine.process_add(&stop, 1).unwrap();
        assert!(trades.is_empty());
        assert!(!engine.book.read().contains(1));
    }

    #[test]
    fn stop_loss_with_fok_is_armed_then_immediately_cancelled() {
        let engine = engine();
        let mut stop = add(1, Side::Sell, 0.0, 50, 1);
        stop.order_type = OrderType::StopLoss;
        stop.trigger_price = 148.00;
        stop.tif = TimeInForce::Fok;
        let trades = engine.process_add(&stop, 1).unwrap();
        assert!(trades.is_empty());
        assert!(!engine.book.read().contains(1));
    }

    #[test]
    fn stop_loss_with_gtc_rests_until_triggered() {
        let engine = engine();
        let mut stop = add(1, Side::Buy, 0.0, 50, 1);
        stop.order_type = OrderType::StopLoss;
        stop.trigger_price = 152.00;
        let trades = engine.process_add(&stop, 1).unwrap();
        assert!(trades.is_empty());
        assert!(engine.book.read().contains(1));
    }
}
