//! Core data model: orders, symbol configuration, and the small value types
//! the matching algorithm is built on.
//!
//! Mirrors `Order.h` / `SymbolConfig.h` from the original C++ implementation,
//! expressed as owned Rust values instead of pool-allocated pointers (see
//! DESIGN.md for the ownership rationale).

use std::sync::Arc;

/// Maximum symbol length per spec: up to 7 ASCII characters.
pub const MAX_SYMBOL_LEN: usize = 7;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Side {
    Buy,
    Sell,
}

impl Side {
    pub fn opposite(self) -> Side {
        match self {
            Side::Buy => Side::Sell,
            Side::Sell => Side::Buy,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimeInForce {
    Gtc,
    Ioc,
    Fok,
}

impl Default for TimeInForce {
    fn default() -> Self {
        TimeInForce::Gtc
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OrderType {
    Limit,
    Market,
    StopLoss,
    Iceberg,
}

impl Default for OrderType {
    fn default() -> Self {
        OrderType::Limit
    }
}

/// A totally-ordered wrapper around `f64` so prices can key a `BTreeMap`.
///
/// Order book prices are always validated against a tick grid before they
/// ever reach a book structure (see `domain::validation`), so NaN never
/// appears here in practice; `total_cmp` gives us a real `Ord` regardless.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Price(pub f64);

impl Eq for Price {}

impl PartialOrd for Price {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Price {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.0.total_cmp(&other.0)
    }
}

impl From<f64> for Price {
    fn from(v: f64) -> Self {
        Price(v)
    }
}

impl From<Price> for f64 {
    fn from(p: Price) -> Self {
        p.0
    }
}

/// A resting or in-flight trading instruction.
///
/// `quantity` is the amount currently exposed to matching (for an iceberg
/// order this is the visible slice, not the hidden reserve). `total_quantity`
/// is the original order size, fixed at creation and only ever replaced
/// wholesale by CANCEL_REPLACE. `filled_quantity` is the cumulative amount
/// executed across the order's lifetime and is what lets an iceberg order
/// compute how much hidden reserve remains (see `hidden_remaining`).
#[derive(Debug, Clone)]
pub struct Order {
    pub order_id: u64,
    pub side: Side,
    pub symbol: Arc<str>,
    pub price: f64,
    pub quantity: u64,
    pub timestamp: u64,
    pub participant_id: u64,
    pub tif: TimeInForce,
    pub order_type: OrderType,
    pub trigger_price: f64,
    pub visible_quantity: u64,
    pub total_quantity: u64,
    pub filled_quantity: u64,
}

impl Order {
    /// Remaining quantity not yet exposed and not yet filled (iceberg only;
    /// zero for every other order type since `quantity` already covers the
    /// whole remainder for those).
    pub fn hidden_remaining(&self) -> u64 {
        if self.order_type != OrderType::Iceberg {
            return 0;
        }
        self.total_quantity
            .saturating_sub(self.filled_quantity)
            .saturating_sub(self.quantity)
    }

    pub fn is_fully_filled(&self) -> bool {
        self.quantity == 0 && self.hidden_remaining() == 0
    }
}

/// Per-symbol validation rules and halt state (spec §3 `SymbolConfig`).
#[derive(Debug, Clone)]
pub struct SymbolConfig {
    pub tick_size: f64,
    pub min_quantity: u64,
    pub min_price: f64,
    pub max_price: f64,
    pub volatility_threshold: f64,
    pub reference_price: f64,
    pub trading_halted: bool,
}

impl SymbolConfig {
    pub fn new(
        tick_size: f64,
        min_quantity: u64,
        min_price: f64,
        max_price: f64,
        volatility_threshold: f64,
        reference_price: f64,
    ) -> Self {
        Self {
            tick_size,
            min_quantity,
            min_price,
            max_price,
            volatility_threshold,
            reference_price,
            trading_halted: false,
        }
    }
}
