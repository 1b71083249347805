//! Data-transfer objects crossing the application/infrastructure boundary:
//! decoded requests going in, responses going out. Kept free of any wire
//! formatting concerns — `infrastructure::protocol` owns that.

use std::sync::Arc;

use crate::domain::model::{OrderType, Side, TimeInForce};

#[derive(Debug, Clone, PartialEq)]
pub struct AddRequest {
    pub sequence: u64,
    pub order_id: u64,
    pub symbol: Arc<str>,
    pub price: f64,
    pub quantity: u64,
    pub side: Side,
    pub tif: TimeInForce,
    pub order_type: OrderType,
    pub participant_id: u64,
    pub trigger_price: f64,
    pub visible_quantity: u64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CancelRequest {
    pub sequence: u64,
    pub order_id: u64,
    pub participant_id: u64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CancelReplaceRequest {
    pub sequence: u64,
    pub order_id: u64,
    pub new_price: f64,
    pub new_quantity: u64,
    pub participant_id: u64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SnapshotRequestMsg {
    pub sequence: u64,
    pub symbol: Arc<str>,
}

#[derive(Debug, Clone)]
pub struct SnapshotResponse {
    pub symbol: Arc<str>,
    pub best_bid: Option<f64>,
    pub best_ask: Option<f64>,
    pub last_trade_price: f64,
}
