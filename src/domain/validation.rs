/// Order Validator - Business Rule Validation
///
/// This module provides validation logic for order requests to ensure they
/// meet business requirements before being processed by the matching engine.
///
/// ## Validation Rules
/// - Symbol must be non-empty and at most `MAX_SYMBOL_LEN` characters
/// - Quantity must be at least the symbol's configured minimum
/// - LIMIT/ICEBERG prices must be positive, tick-aligned, and within range
/// - STOP_LOSS orders must carry a positive trigger price
/// - A price that moves more than `volatilityThreshold` away from
///   `referencePrice` is rejected and halts the symbol as a side effect
///
/// ## Usage
/// ```rust,ignore
/// match validate_add(&order, &cfg) {
///     Ok(()) => { /* proceed to matching */ }
///     Err(reason) => { /* NACK with reason */ }
/// }
/// ```
use crate::domain::errors::RejectReason;
use crate::domain::model::{MAX_SYMBOL_LEN, Order, OrderType, SymbolConfig};

/// Checks whether `price` sits on the symbol's tick grid, within a small
/// floating-point tolerance (mirrors the original `tickSizeValid`).
pub fn tick_aligned(price: f64, tick_size: f64) -> bool {
    if tick_size <= 0.0 {
        return false;
    }
    let ticks = price / tick_size;
    let rounded = ticks.round();
    (ticks - rounded).abs() < 1e-9
}

fn price_in_range(price: f64, cfg: &SymbolConfig) -> bool {
    price >= cfg.min_price && price <= cfg.max_price
}

/// Validates a new order against its symbol's configuration, exactly as
/// `processAdd` must before the order ever touches a book.
///
/// On a volatility breach this does NOT mutate `cfg` itself — `cfg` is an
/// owned snapshot — the caller (`application::engine::MatchingEngine`) is
/// responsible for calling `SymbolConfigRegistry::halt` when this returns
/// `Err(RejectReason::Policy)` for a volatility reason, matching the
/// original's `checkVolatilityHalt` which halts as a side effect of
/// validation failing.
pub fn validate_add(order: &Order, cfg: &SymbolConfig) -> Result<(), RejectReason> {
    if order.symbol.is_empty() || order.symbol.len() > MAX_SYMBOL_LEN || order.quantity == 0 {
        return Err(RejectReason::Malformed);
    }

    if order.quantity < cfg.min_quantity {
        return Err(RejectReason::Invalid);
    }

    if matches!(order.order_type, OrderType::Limit | OrderType::Iceberg) {
        if order.price <= 0.0 {
            return Err(RejectReason::Malformed);
        }
        if !tick_aligned(order.price, cfg.tick_size) {
            return Err(RejectReason::Invalid);
        }
        if !price_in_range(order.price, cfg) {
            return Err(RejectReason::Invalid);
        }
    }

    if order.order_type == OrderType::StopLoss && order.trigger_price <= 0.0 {
        return Err(RejectReason::Malformed);
    }

    if cfg.trading_halted {
        return Err(RejectReason::Policy);
    }

    if matches!(order.order_type, OrderType::Limit | OrderType::Iceberg) {
        let pct_change = ((order.price - cfg.reference_price) / cfg.reference_price).abs();
        if pct_change > cfg.volatility_threshold {
            return Err(RejectReason::Policy);
        }
    }

    Ok(())
}

/// True if this validation failure should also halt the symbol (a
/// volatility breach), as opposed to an ordinary halted-symbol rejection.
pub fn is_volatility_breach(order: &Order, cfg: &SymbolConfig) -> bool {
    if cfg.trading_halted || !matches!(order.order_type, OrderType::Limit | OrderType::Iceberg) {
        return false;
    }
    let pct_change = ((order.price - cfg.reference_price) / cfg.reference_price).abs();
    pct_change > cfg.volatility_threshold
}

pub fn validate_cancel(order_id: u64) -> Result<(), RejectReason> {
    if order_id == 0 {
        return Err(RejectReason::Malformed);
    }
    Ok(())
}

pub fn validate_cancel_replace(
    order_id: u64,
    new_price: f64,
    new_quantity: u64,
    cfg: &SymbolConfig,
) -> Result<(), RejectReason> {
    if order_id == 0 || new_price <= 0.0 || new_quantity == 0 {
        return Err(RejectReason::Malformed);
    }
    if !tick_aligned(new_price, cfg.tick_size) {
        return Err(RejectReason::Invalid);
    }
    if new_quantity < cfg.min_quantity {
        return Err(RejectReason::Invalid);
    }
    if !price_in_range(new_price, cfg) {
        return Err(RejectReason::Invalid);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::{Side, TimeInForce};
    use std::sync::Arc;

    fn cfg() -> SymbolConfig {
        SymbolConfig::new(0.01, 1, 1.00, 10000.00, 0.5, 150.00)
    }

    fn limit_order(price: f64, quantity: u64) -> Order {
        Order {
            order_id: 1,
            side: Side::Buy,
            symbol: Arc::from("AAPL"),
            price,
            quantity,
            timestamp: 0,
            participant_id: 1,
            tif: TimeInForce::Gtc,
            order_type: OrderType::Limit,
            trigger_price: 0.0,
            visible_quantity: 0,
            total_quantity: quantity,
            filled_quantity: 0,
        }
    }

    #[test]
    fn accepts_valid_limit_order() {
        assert_eq!(validate_add(&limit_order(150.00, 10), &cfg()), Ok(()));
    }

    #[test]
    fn rejects_zero_quantity_as_malformed() {
        assert_eq!(
            validate_add(&limit_order(150.00, 0), &cfg()),
            Err(RejectReason::Malformed)
        );
    }

    #[test]
    fn rejects_off_tick_price() {
        assert_eq!(
            validate_add(&limit_order(150.005, 10), &cfg()),
            Err(RejectReason::Invalid)
        );
    }

    #[test]
    fn accepts_tick_boundary_price() {
        assert_eq!(validate_add(&limit_order(150.01, 10), &cfg()), Ok(()));
    }

    #[test]
    fn rejects_price_outside_range() {
        assert_eq!(
            validate_add(&limit_order(10001.00, 10), &cfg()),
            Err(RejectReason::Invalid)
        );
    }

    #[test]
    fn rejects_volatility_breach_as_policy() {
        // 151 - 150 = 1; 1/150 = 0.0067 well under 0.5, pick a real breach
        let order = limit_order(300.00, 10);
        assert_eq!(validate_add(&order, &cfg()), Err(RejectReason::Policy));
        assert!(is_volatility_breach(&order, &cfg()));
    }

    #[test]
    fn rejects_stop_order_without_trigger_price() {
        let mut order = limit_order(150.00, 10);
        order.order_type = OrderType::StopLoss;
        order.trigger_price = 0.0;
        assert_eq!(validate_add(&order, &cfg()), Err(RejectReason::Malformed));
    }

    #[test]
    fn rejects_on_halted_symbol() {
        let mut c = cfg();
        c.trading_halted = true;
        assert_eq!(
            validate_add(&limit_order(150.00, 10), &c),
            Err(RejectReason::Policy)
        );
    }
}
