/// Order Book — per-symbol resting orders and the matching algorithm.
///
/// Holds one symbol's bids, asks, stop-order triggers, and recent-trade
/// history, and implements price-time priority matching with self-trade
/// prevention, iceberg replenishment, and stop-loss activation.
///
/// Grounded on `orderbook.rs` in the teacher (RwLock-friendly interior
/// structure, pool-free ownership) and `original_source/src/OrderBook.cpp`
/// for the exact algorithm.
use std::collections::{BTreeMap, HashMap, HashSet, VecDeque};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crate::domain::errors::RejectReason;
use crate::domain::model::{Order, OrderType, Price, Side};

const RECENT_TRADES_CAPACITY: usize = 100;

/// A single execution produced by matching.
#[derive(Debug, Clone, PartialEq)]
pub struct Trade {
    pub sequence: u64,
    pub timestamp: u64,
    pub symbol: Arc<str>,
    pub buy_order_id: u64,
    pub sell_order_id: u64,
    pub buy_participant_id: u64,
    pub sell_participant_id: u64,
    pub quantity: u64,
    pub price: f64,
}

#[derive(Debug, Clone, Copy)]
enum OrderLocation {
    Bid(Price),
    Ask(Price),
    StopBuy(Price),
    StopSell(Price),
    /// Transient: present only for the duration of a single MARKET order's
    /// own matching invocation (spec §4.2.1).
    Market,
}

#[derive(Clone)]
pub struct OrderBook {
    pub symbol: Arc<str>,
    bids: BTreeMap<Price, VecDeque<Order>>,
    asks: BTreeMap<Price, VecDeque<Order>>,
    order_lookup: HashMap<u64, OrderLocation>,
    stop_orders_buy: BTreeMap<Price, VecDeque<Order>>,
    stop_orders_sell: BTreeMap<Price, VecDeque<Order>>,
    recent_trades: VecDeque<(f64, u64)>,
    /// Most recent single trade price; drives stop-loss triggering. Kept
    /// distinct from the VWAP reported by `last_trade_price_vwap` per the
    /// asymmetry the design notes call out explicitly.
    last_trade_price: f64,
}

impl OrderBook {
    pub fn new(symbol: Arc<str>) -> Self {
        Self {
            symbol,
            bids: BTreeMap::new(),
            asks: BTreeMap::new(),
            order_lookup: HashMap::new(),
            stop_orders_buy: BTreeMap::new(),
            stop_orders_sell: BTreeMap::new(),
            recent_trades: VecDeque::with_capacity(RECENT_TRADES_CAPACITY),
            last_trade_price: 0.0,
        }
    }

    pub fn best_bid(&self) -> Option<f64> {
        self.bids.keys().next_back().map(|p| p.0)
    }

    pub fn best_ask(&self) -> Option<f64> {
        self.asks.keys().next().map(|p| p.0)
    }

    /// Volume-weighted average over the last (up to) 100 trades; 0 when empty.
    pub fn last_trade_price_vwap(&self) -> f64 {
        if self.recent_trades.is_empty() {
            return 0.0;
        }
        let (notional, qty) = self
            .recent_trades
            .iter()
            .fold((0.0, 0u64), |(n, q), (p, x)| (n + p * (*x as f64), q + x));
        if qty == 0 {
            0.0
        } else {
            notional / qty as f64
        }
    }

    /// Most recent single trade price, used internally for stop triggering.
    pub fn last_trade_price(&self) -> f64 {
        self.last_trade_price
    }

    pub fn contains(&self, order_id: u64) -> bool {
        self.order_lookup.contains_key(&order_id)
    }

    // ---- 4.2.1 Placement ----

    pub fn add_order(&mut self, order: Order) -> Result<(), RejectReason> {
        if self.order_lookup.contains_key(&order.order_id) {
            return Err(RejectReason::Malformed);
        }
        match order.order_type {
            OrderType::StopLoss => {
                let trigger = Price(order.trigger_price);
                let loc = match order.side {
                    Side::Buy => {
                        self.stop_orders_buy.entry(trigger).or_default().push_back(order.clone());
                        OrderLocation::StopBuy(trigger)
                    }
                    Side::Sell => {
                        self.stop_orders_sell.entry(trigger).or_default().push_back(order.clone());
                        OrderLocation::StopSell(trigger)
                    }
                };
                self.order_lookup.insert(order.order_id, loc);
            }
            OrderType::Market => {
                self.order_lookup.insert(order.order_id, OrderLocation::Market);
            }
            OrderType::Limit | OrderType::Iceberg => {
                let price = Price(order.price);
                let id = order.order_id;
                match order.side {
                    Side::Buy => {
                        self.bids.entry(price).or_default().push_back(order);
                        self.order_lookup.insert(id, OrderLocation::Bid(price));
                    }
                    Side::Sell => {
                        self.asks.entry(price).or_default().push_back(order);
                        self.order_lookup.insert(id, OrderLocation::Ask(price));
                    }
                }
            }
        }
        Ok(())
    }

    fn push_trade(&mut self, trade_price: f64, trade_qty: u64) {
        if self.recent_trades.len() == RECENT_TRADES_CAPACITY {
            self.recent_trades.pop_front();
        }
        self.recent_trades.push_back((trade_price, trade_qty));
        self.last_trade_price = trade_price;
    }

    /// Replenishes an iceberg order whose visible slice just hit zero while
    /// hidden quantity remains, re-enqueuing it at the tail of its price
    /// level (§4.2.3). Returns `true` if the order is now fully exhausted
    /// and should be removed instead.
    fn refresh_or_exhaust_iceberg(side_book: &mut BTreeMap<Price, VecDeque<Order>>, price: Price) -> bool {
        let queue = side_book.get_mut(&price).expect("price level must exist");
        let mut front = queue.pop_front().expect("queue must be non-empty");
        let hidden = front.hidden_remaining();
        if hidden == 0 {
            true
        } else {
            front.quantity = front.visible_quantity.min(hidden);
            queue.push_back(front);
            false
        }
    }

    /// Trade price for a crossing pair: the passive (older-arrival) order's
    /// price. When one side just arrived (the common case) its timestamp is
    /// always the larger of the two, so this reduces to "match at the
    /// resting order's price" — and when both were already resting (e.g. a
    /// CANCEL_REPLACE reshuffle), it falls back to the strictly older order.
    fn trade_price(bid_ts: u64, bid_price: f64, ask_ts: u64, ask_price: f64) -> f64 {
        if bid_ts <= ask_ts {
            bid_price
        } else {
            ask_price
        }
    }

    /// 4.2.2 — repeatedly crosses the best bid against the best ask.
    pub fn match_book(&mut self, timestamp: u64, seq: &AtomicU64) -> Vec<Trade> {
        let mut trades = Vec::new();
        loop {
            let best_bid = match self.bids.keys().next_back().copied() {
                Some(p) => p,
                None => break,
            };
            let best_ask = match self.asks.keys().next().copied() {
                Some(p) => p,
                None => break,
            };
            if best_bid.0 < best_ask.0 {
                break;
            }

            let (b_id, b_participant, b_ts, b_qty) = {
                let o = self.bids.get(&best_bid).unwrap().front().unwrap();
                (o.order_id, o.participant_id, o.timestamp, o.quantity)
            };
            let (a_id, a_participant, a_ts, a_qty) = {
                let o = self.asks.get(&best_ask).unwrap().front().unwrap();
                (o.order_id, o.participant_id, o.timestamp, o.quantity)
            };

            if b_participant == a_participant {
                break;
            }

            let trade_qty = b_qty.min(a_qty);
            let price = Self::trade_price(b_ts, best_bid.0, a_ts, best_ask.0);
            let sequence = seq.fetch_add(1, Ordering::SeqCst);

            trades.push(Trade {
                sequence,
                timestamp,
                symbol: self.symbol.clone(),
                buy_order_id: b_id,
                sell_order_id: a_id,
                buy_participant_id: b_participant,
                sell_participant_id: a_participant,
                quantity: trade_qty,
                price,
            });
            self.push_trade(price, trade_qty);

            {
                let bid_order = self.bids.get_mut(&best_bid).unwrap().front_mut().unwrap();
                bid_order.quantity -= trade_qty;
                bid_order.filled_quantity += trade_qty;
            }
            {
                let ask_order = self.asks.get_mut(&best_ask).unwrap().front_mut().unwrap();
                ask_order.quantity -= trade_qty;
                ask_order.filled_quantity += trade_qty;
            }

            if b_qty - trade_qty == 0 {
                let is_iceberg = self.bids.get(&best_bid).unwrap().front().unwrap().order_type
                    == OrderType::Iceberg;
                let exhausted = if is_iceberg {
                    Self::refresh_or_exhaust_iceberg(&mut self.bids, best_bid)
                } else {
                    true
                };
                if exhausted {
                    self.bids.get_mut(&best_bid).unwrap().pop_front();
                    self.order_lookup.remove(&b_id);
                }
                if self.bids.get(&best_bid).map(|q| q.is_empty()).unwrap_or(false) {
                    self.bids.remove(&best_bid);
                }
            }
            if a_qty - trade_qty == 0 {
                let is_iceberg = self.asks.get(&best_ask).unwrap().front().unwrap().order_type
                    == OrderType::Iceberg;
                let exhausted = if is_iceberg {
                    Self::refresh_or_exhaust_iceberg(&mut self.asks, best_ask)
                } else {
                    true
                };
                if exhausted {
                    self.asks.get_mut(&best_ask).unwrap().pop_front();
                    self.order_lookup.remove(&a_id);
                }
                if self.asks.get(&best_ask).map(|q| q.is_empty()).unwrap_or(false) {
                    self.asks.remove(&best_ask);
                }
            }
        }
        trades
    }

    /// Immediate matching for a MARKET order, which never rests in a price
    /// level (spec §4.2.1). Walks the opposite side best-price-first,
    /// consuming resting liquidity until `order.quantity` is exhausted or
    /// the opposite side runs dry. Self-trade prevention and iceberg
    /// replenishment behave identically to `match_book`; the market order
    /// is always the "active" side so trades always print at the resting
    /// order's price.
    pub fn match_market(
        &mut self,
        mut order: Order,
        timestamp: u64,
        seq: &AtomicU64,
    ) -> (Order, Vec<Trade>) {
        let mut trades = Vec::new();
        let opposite_side = order.side.opposite();

        loop {
            if order.quantity == 0 {
                break;
            }
            let best_price = {
                let book = match opposite_side {
                    Side::Buy => &self.bids,
                    Side::Sell => &self.asks,
                };
                match opposite_side {
                    Side::Buy => book.keys().next_back().copied(),
                    Side::Sell => book.keys().next().copied(),
                }
            };
            let best_price = match best_price {
                Some(p) => p,
                None => break,
            };

            let (resting_id, resting_participant, resting_qty) = {
                let book = match opposite_side {
                    Side::Buy => &self.bids,
                    Side::Sell => &self.asks,
                };
                let o = book.get(&best_price).unwrap().front().unwrap();
                (o.order_id, o.participant_id, o.quantity)
            };
            if resting_participant == order.participant_id {
                break;
            }

            let trade_qty = order.quantity.min(resting_qty);
            let sequence = seq.fetch_add(1, Ordering::SeqCst);
            let price = best_price.0;

            let (buy_order_id, sell_order_id, buy_participant_id, sell_participant_id) =
                match order.side {
                    Side::Buy => (order.order_id, resting_id, order.participant_id, resting_participant),
                    Side::Sell => (resting_id, order.order_id, resting_participant, order.participant_id),
                };

            trades.push(Trade {
                sequence,
                timestamp,
                symbol: self.symbol.clone(),
                buy_order_id,
                sell_order_id,
                buy_participant_id,
                sell_participant_id,
                quantity: trade_qty,
                price,
            });
            self.push_trade(price, trade_qty);

            order.quantity -= trade_qty;
            order.filled_quantity += trade_qty;
            let book = match opposite_side {
                Side::Buy => &mut self.bids,
                Side::Sell => &mut self.asks,
            };
            {
                let resting = book.get_mut(&best_price).unwrap().front_mut().unwrap();
                resting.quantity -= trade_qty;
                resting.filled_quantity += trade_qty;
            }

            if resting_qty - trade_qty == 0 {
                let is_iceberg =
                    book.get(&best_price).unwrap().front().unwrap().order_type == OrderType::Iceberg;
                let exhausted = if is_iceberg {
                    Self::refresh_or_exhaust_iceberg(book, best_price)
                } else {
                    true
                };
                if exhausted {
                    book.get_mut(&best_price).unwrap().pop_front();
                    self.order_lookup.remove(&resting_id);
                }
                if book.get(&best_price).map(|q| q.is_empty()).unwrap_or(false) {
                    book.remove(&best_price);
                }
            }
        }

        self.order_lookup.remove(&order.order_id);
        (order, trades)
    }

    // ---- 4.2.4 Stop-loss triggering ----

    /// Activates and matches every stop order whose trigger has crossed,
    /// iterating to a fixed point: a triggered stop can itself move
    /// `last_trade_price` and trigger further stops. `already_triggered`
    /// guarantees no order re-fires twice within one outer call, bounding
    /// the iteration.
    pub fn trigger_stops(&mut self, timestamp: u64, seq: &AtomicU64) -> Vec<Trade> {
        let mut all_trades = Vec::new();
        let mut already_triggered: HashSet<u64> = HashSet::new();

        loop {
            let last = self.last_trade_price;
            let mut activated = Vec::new();

            let buy_triggers: Vec<Price> = self
                .stop_orders_buy
                .range(..=Price(last))
                .map(|(p, _)| *p)
                .collect();
            for price in buy_triggers {
                if let Some(queue) = self.stop_orders_buy.get_mut(&price) {
                    let mut remaining = VecDeque::new();
                    while let Some(o) = queue.pop_front() {
                        if already_triggered.contains(&o.order_id) {
                            remaining.push_back(o);
                        } else {
                            activated.push(o);
                        }
                    }
                    if remaining.is_empty() {
                        self.stop_orders_buy.remove(&price);
                    } else {
                        *queue = remaining;
                    }
                }
            }

            let sell_triggers: Vec<Price> = self
                .stop_orders_sell
                .range(Price(last)..)
                .map(|(p, _)| *p)
                .collect();
            for price in sell_triggers {
                if let Some(queue) = self.stop_orders_sell.get_mut(&price) {
                    let mut remaining = VecDeque::new();
                    while let Some(o) = queue.pop_front() {
                        if already_triggered.contains(&o.order_id) {
                            remaining.push_back(o);
                        } else {
                            activated.push(o);
                        }
                    }
                    if remaining.is_empty() {
                        self.stop_orders_sell.remove(&price);
                    } else {
                        *queue = remaining;
                    }
                }
            }

            if activated.is_empty() {
                break;
            }

            for mut o in activated {
                already_triggered.insert(o.order_id);
                self.order_lookup.remove(&o.order_id);
                o.order_type = OrderType::Market;
                let (_, trades) = self.match_market(o, timestamp, seq);
                all_trades.extend(trades);
            }

            if self.last_trade_price == last {
                break;
            }
        }

        all_trades
    }

    // ---- 4.2.5 Cancellation ----

    /// Read-only preflight for a cancel: does `order_id` exist and does it
    /// belong to `participant_id`? Lets a caller validate *before* writing a
    /// WAL record, so a NACK never leaves a phantom entry behind (spec §9:
    /// "failure paths never mutate the book or WAL").
    pub fn check_cancelable(&self, order_id: u64, participant_id: u64) -> Result<(), RejectReason> {
        let loc = match self.order_lookup.get(&order_id) {
            Some(l) => *l,
            None => return Err(RejectReason::NotFound),
        };
        match loc {
            OrderLocation::Bid(price) => Self::check_level_ownership(&self.bids, price, order_id, participant_id),
            OrderLocation::Ask(price) => Self::check_level_ownership(&self.asks, price, order_id, participant_id),
            OrderLocation::StopBuy(price) => {
                Self::check_level_ownership(&self.stop_orders_buy, price, order_id, participant_id)
            }
            OrderLocation::StopSell(price) => {
                Self::check_level_ownership(&self.stop_orders_sell, price, order_id, participant_id)
            }
            OrderLocation::Market => Ok(()),
        }
    }

    pub fn cancel_order(&mut self, order_id: u64, participant_id: u64) -> Result<(), RejectReason> {
        let loc = match self.order_lookup.get(&order_id) {
            Some(l) => *l,
            None => return Err(RejectReason::NotFound),
        };

        match loc {
            OrderLocation::Bid(price) => Self::remove_from_level(&mut self.bids, price, order_id, participant_id)?,
            OrderLocation::Ask(price) => Self::remove_from_level(&mut self.asks, price, order_id, participant_id)?,
            OrderLocation::StopBuy(price) => {
                Self::remove_from_level(&mut self.stop_orders_buy, price, order_id, participant_id)?
            }
            OrderLocation::StopSell(price) => {
                Self::remove_from_level(&mut self.stop_orders_sell, price, order_id, participant_id)?
            }
            OrderLocation::Market => {}
        };
        self.order_lookup.remove(&order_id);
        Ok(())
    }

    fn check_level_ownership(
        book: &BTreeMap<Price, VecDeque<Order>>,
        price: Price,
        order_id: u64,
        participant_id: u64,
    ) -> Result<(), RejectReason> {
        let queue = book.get(&price).ok_or(RejectReason::NotFound)?;
        let order = queue.iter().find(|o| o.order_id == order_id).ok_or(RejectReason::NotFound)?;
        if order.participant_id != participant_id {
            return Err(RejectReason::Policy);
        }
        Ok(())
    }

    fn remove_from_level(
        book: &mut BTreeMap<Price, VecDeque<Order>>,
        price: Price,
        order_id: u64,
        participant_id: u64,
    ) -> Result<(), RejectReason> {
        Self::check_level_ownership(book, price, order_id, participant_id)?;
        let queue = book.get_mut(&price).unwrap();
        let idx = queue.iter().position(|o| o.order_id == order_id).unwrap();
        queue.remove(idx);
        if queue.is_empty() {
            book.remove(&price);
        }
        Ok(())
    }

    // ---- 4.2.6 Modification ----

    /// Read-only preflight for a cancel-replace: does `order_id` exist, is
    /// it a LIMIT/ICEBERG order (the only modifiable types), and does it
    /// belong to `participant_id`? Same rationale as `check_cancelable`.
    pub fn check_modifiable(&self, order_id: u64, participant_id: u64) -> Result<(), RejectReason> {
        let loc = match self.order_lookup.get(&order_id) {
            Some(l) => *l,
            None => return Err(RejectReason::NotFound),
        };
        let (book, price) = match loc {
            OrderLocation::Bid(p) => (&self.bids, p),
            OrderLocation::Ask(p) => (&self.asks, p),
            _ => return Err(RejectReason::Invalid),
        };
        Self::check_level_ownership(book, price, order_id, participant_id)
    }

    /// LIMIT/ICEBERG only. Removes the order from its current level and
    /// re-enqueues at the tail of `new_price`, losing time priority.
    pub fn modify_order(
        &mut self,
        order_id: u64,
        new_price: f64,
        new_qty: u64,
        participant_id: u64,
    ) -> Result<(), RejectReason> {
        let loc = match self.order_lookup.get(&order_id) {
            Some(l) => *l,
            None => return Err(RejectReason::NotFound),
        };
        let old_book_side = match loc {
            OrderLocation::Bid(_) => Side::Buy,
            OrderLocation::Ask(_) => Side::Sell,
            _ => return Err(RejectReason::Invalid),
        };
        let old_price = match loc {
            OrderLocation::Bid(p) | OrderLocation::Ask(p) => p,
            _ => unreachable!(),
        };

        let book = match old_book_side {
            Side::Buy => &mut self.bids,
            Side::Sell => &mut self.asks,
        };
        let queue = book.get_mut(&old_price).ok_or(RejectReason::NotFound)?;
        let idx = queue
            .iter()
            .position(|o| o.order_id == order_id)
            .ok_or(RejectReason::NotFound)?;
        if queue[idx].participant_id != participant_id {
            return Err(RejectReason::Policy);
        }
        let mut order = queue.remove(idx).unwrap();
        if queue.is_empty() {
            book.remove(&old_price);
        }

        order.price = new_price;
        order.quantity = new_qty;
        order.total_quantity = new_qty;
        order.filled_quantity = 0;
        if order.order_type == OrderType::Iceberg {
            order.visible_quantity = order.visible_quantity.min(new_qty);
            order.quantity = order.visible_quantity;
        }

        let new_price_key = Price(new_price);
        let book = match old_book_side {
            Side::Buy => &mut self.bids,
            Side::Sell => &mut self.asks,
        };
        book.entry(new_price_key).or_default().push_back(order);
        let new_loc = match old_book_side {
            Side::Buy => OrderLocation::Bid(new_price_key),
            Side::Sell => OrderLocation::Ask(new_price_key),
        };
        self.order_lookup.insert(order_id, new_loc);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::TimeInForce;

    fn order(
        id: u64,
        side: Side,
        price: f64,
        qty: u64,
        ts: u64,
        participant: u64,
        order_type: OrderType,
    ) -> Order {
        Order {
            order_id: id,
            side,
            symbol: Arc::from("AAPL"),
            price,
            quantity: qty,
            timestamp: ts,
            participant_id: participant,
            tif: TimeInForce::Gtc,
            order_type,
            trigger_price: 0.0,
            visible_quantity: 0,
            total_quantity: qty,
            filled_quantity: 0,
        }
    }

    #[test]
    fn simple_cross_scenario() {
        let mut book = OrderBook::new(Arc::from("AAPL"));
        let seq = AtomicU64::new(1);
        book.add_order(order(1, Side::Buy, 150.00, 100, 1, 1, OrderType::Limit))
            .unwrap();
        book.add_order(order(2, Side::Sell, 150.00, 60, 2, 2, OrderType::Limit))
            .unwrap();
        let trades = book.match_book(100, &seq);
        assert_eq!(trades.len(), 1);
        assert_eq!(trades[0].sequence, 1);
        assert_eq!(trades[0].price, 150.00);
        assert_eq!(trades[0].quantity, 60);
        assert_eq!(book.best_bid(), Some(150.00));
        assert_eq!(book.best_ask(), None);
        assert_eq!(book.bids.get(&Price(150.00)).unwrap().front().unwrap().quantity, 40);
    }

    #[test]
    fn ioc_residue_is_engines_job_not_matchbooks() {
        // match_book only matches what's crossable; residue cancellation is
        // the engine's responsibility, exercised in application::engine tests.
        let mut book = OrderBook::new(Arc::from("AAPL"));
        let seq = AtomicU64::new(1);
        book.add_order(order(3, Side::Sell, 150.00, 100, 1, 2, OrderType::Limit))
            .unwrap();
        let trades = book.match_book(100, &seq);
        assert!(trades.is_empty());
    }

    #[test]
    fn iceberg_refresh_on_full_slice_consumption() {
        let mut book = OrderBook::new(Arc::from("AAPL"));
        let seq = AtomicU64::new(1);
        let mut iceberg = order(4, Side::Buy, 150.00, 100, 1, 1, OrderType::Iceberg);
        iceberg.visible_quantity = 100;
        iceberg.total_quantity = 500;
        book.add_order(iceberg).unwrap();
        book.add_order(order(5, Side::Sell, 150.00, 150, 2, 2, OrderType::Limit))
            .unwrap();

        let trades = book.match_book(100, &seq);
        assert_eq!(trades.len(), 2);
        assert_eq!(trades[0].quantity, 100);
        assert_eq!(trades[1].quantity, 50);
        assert_eq!(book.best_ask(), None);
        let resting = book.bids.get(&Price(150.00)).unwrap().front().unwrap();
        assert_eq!(resting.quantity, 50);
        assert_eq!(resting.total_quantity - resting.filled_quantity - resting.quantity, 300);
    }

    #[test]
    fn self_trade_prevention_halts_loop() {
        let mut book = OrderBook::new(Arc::from("AAPL"));
        let seq = AtomicU64::new(1);
        book.add_order(order(1, Side::Buy, 100.00, 10, 1, 42, OrderType::Limit))
            .unwrap();
        book.add_order(order(2, Side::Sell, 100.00, 10, 2, 42, OrderType::Limit))
            .unwrap();
        let trades = book.match_book(100, &seq);
        assert!(trades.is_empty());
        assert_eq!(book.best_bid(), Some(100.00));
        assert_eq!(book.best_ask(), Some(100.00));
    }

    #[test]
    fn stop_loss_activates_on_trade_price_cross() {
        // Price-time priority means a resting ask below the trigger always
        // trades before a higher level can print, so the ask the stop
        // eventually hits (153.00) must sit above every price the "push"
        // trades clear at, not below the trigger like the narrative
        // examples in spec §8 sketch for illustration.
        let mut book = OrderBook::new(Arc::from("AAPL"));
        let seq = AtomicU64::new(1);

        book.add_order(order(1, Side::Sell, 151.00, 10, 1, 10, OrderType::Limit)).unwrap();
        book.add_order(order(2, Side::Sell, 153.00, 50, 2, 11, OrderType::Limit)).unwrap();
        let mut stop = order(3, Side::Buy, 0.0, 50, 3, 1, OrderType::StopLoss);
        stop.trigger_price = 152.00;
        book.add_order(stop).unwrap();
        book.add_order(order(4, Side::Sell, 152.00, 10, 4, 12, OrderType::Limit)).unwrap();

        book.add_order(order(5, Side::Buy, 151.00, 10, 5, 20, OrderType::Limit)).unwrap();
        let push1 = book.match_book(100, &seq);
        assert_eq!(push1.len(), 1);
        assert_eq!(push1[0].price, 151.00);
        assert!(book.trigger_stops(100, &seq).is_empty());

        book.add_order(order(6, Side::Buy, 152.00, 10, 6, 21, OrderType::Limit)).unwrap();
        let push2 = book.match_book(200, &seq);
        assert_eq!(push2.len(), 1);
        assert_eq!(push2[0].price, 152.00);
        assert_eq!(book.last_trade_price(), 152.00);

        let trades = book.trigger_stops(200, &seq);
        assert_eq!(trades.len(), 1);
        assert_eq!(trades[0].price, 153.00);
        assert_eq!(trades[0].quantity, 50);
        assert!(!book.contains(3));
    }

    #[test]
    fn cancel_unknown_order_is_noop_nack() {
        let mut book = OrderBook::new(Arc::from("AAPL"));
        assert_eq!(book.cancel_order(999, 1), Err(RejectReason::NotFound));
    }

    #[test]
    fn cancel_wrong_participant_is_rejected() {
        let mut book = OrderBook::new(Arc::from("AAPL"));
        book.add_order(order(1, Side::Buy, 100.0, 10, 1, 42, OrderType::Limit))
            .unwrap();
        assert_eq!(book.cancel_order(1, 99), Err(RejectReason::Policy));
        assert!(book.contains(1));
    }

    #[test]
    fn cancel_restores_book_to_pre_add_state() {
        let mut book = OrderBook::new(Arc::from("AAPL"));
        assert_eq!(book.best_bid(), None);
        book.add_order(order(1, Side::Buy, 100.0, 10, 1, 42, OrderType::Limit))
            .unwrap();
        assert_eq!(book.best_bid(), Some(100.0));
        book.cancel_order(1, 42).unwrap();
        assert_eq!(book.best_bid(), None);
        assert!(!book.contains(1));
    }

    #[test]
    fn modify_order_loses_time_priority_and_can_cross() {
        let mut book = OrderBook::new(Arc::from("AAPL"));
        let seq = AtomicU64::new(1);
        book.add_order(order(1, Side::Buy, 99.00, 10, 1, 1, OrderType::Limit))
            .unwrap();
        book.add_order(order(2, Side::Sell, 100.00, 10, 2, 2, OrderType::Limit))
            .unwrap();
        book.modify_order(1, 100.00, 10, 1).unwrap();
        let trades = book.match_book(100, &seq);
        assert_eq!(trades.len(), 1);
        assert_eq!(trades[0].quantity, 10);
    }
}
