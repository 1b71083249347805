//! Wire protocol: parses incoming `|`-delimited, LF-terminated instruction
//! lines into application DTOs, and formats outgoing ACK/NACK/SNAPSHOT lines
//! (spec §6).
//!
//! Grounded on `original_source/src/MessageParser.cpp` for field layout and
//! defaulting rules (optional fields from position 8 onward on ADD; a
//! missing `participantId` on CANCEL/CANCEL_REPLACE defaults to 0), and on
//! `original_source/src/Session.cpp` for the bare `TYPE_ACK`/`TYPE_NACK\n`
//! response lines. The `SNAPSHOT` line follows spec §6's literal grammar
//! rather than the original's empty `SNAPSHOT_SENT\n` acknowledgement.

use std::sync::Arc;

use thiserror::Error;

use crate::application::dto::{AddRequest, CancelReplaceRequest, CancelRequest, SnapshotRequestMsg, SnapshotResponse};
use crate::domain::model::{OrderType, Side, TimeInForce};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("empty line")]
    Empty,
    #[error("unknown message type: {0}")]
    UnknownType(String),
    #[error("too few fields for {0}")]
    TooFewFields(&'static str),
    #[error("invalid field {field} in {message_type}: {value}")]
    InvalidField {
        message_type: &'static str,
        field: &'static str,
        value: String,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub enum ClientMessage {
    Add(AddRequest),
    Cancel(CancelRequest),
    CancelReplace(CancelReplaceRequest),
    SnapshotRequest(SnapshotRequestMsg),
}

pub const ADD_ACK: &str = "ADD_ACK\n";
pub const ADD_NACK: &str = "ADD_NACK\n";
pub const CANCEL_ACK: &str = "CANCEL_ACK\n";
pub const CANCEL_NACK: &str = "CANCEL_NACK\n";
pub const CANCEL_REPLACE_ACK: &str = "CANCEL_REPLACE_ACK\n";
pub const CANCEL_REPLACE_NACK: &str = "CANCEL_REPLACE_NACK\n";

fn parse_u64(message_type: &'static str, field: &'static str, value: &str) -> Result<u64, ParseError> {
    value.parse().map_err(|_| ParseError::InvalidField {
        message_type,
        field,
        value: value.to_string(),
    })
}

fn parse_f64(message_type: &'static str, field: &'static str, value: &str) -> Result<f64, ParseError> {
    value.parse().map_err(|_| ParseError::InvalidField {
        message_type,
        field,
        value: value.to_string(),
    })
}

fn parse_side(value: &str) -> Result<Side, ParseError> {
    match value {
        "BUY" => Ok(Side::Buy),
        "SELL" => Ok(Side::Sell),
        other => Err(ParseError::InvalidField {
            message_type: "ADD",
            field: "side",
            value: other.to_string(),
        }),
    }
}

fn parse_tif(value: &str) -> TimeInForce {
    match value {
        "IOC" => TimeInForce::Ioc,
        "FOK" => TimeInForce::Fok,
        _ => TimeInForce::Gtc,
    }
}

fn parse_order_type(value: &str) -> OrderType {
    match value {
        "MARKET" => OrderType::Market,
        "STOP_LOSS" => OrderType::StopLoss,
        "ICEBERG" => OrderType::Iceberg,
        _ => OrderType::Limit,
    }
}

/// Parses one line (without its trailing LF) into a `ClientMessage`.
///
/// A malformed line (spec §7 taxonomy 1) is never partially applied — it is
/// always `Err` and the caller must drop it without advancing any state.
pub fn parse_line(line: &str) -> Result<ClientMessage, ParseError> {
    let line = line.trim_end_matches(['\r', '\n']);
    if line.is_empty() {
        return Err(ParseError::Empty);
    }
    let parts: Vec<&str> = line.split('|').collect();
    match parts[0] {
        "ADD" => parse_add(&parts).map(ClientMessage::Add),
        "CANCEL" => parse_cancel(&parts).map(ClientMessage::Cancel),
        "CANCEL_REPLACE" => parse_cancel_replace(&parts).map(ClientMessage::CancelReplace),
        "SNAPSHOT_REQUEST" => parse_snapshot_request(&parts).map(ClientMessage::SnapshotRequest),
        other => Err(ParseError::UnknownType(other.to_string())),
    }
}

/// `ADD|seq|ts|orderId|symbol|price|qty|side|tif|ordertype|participantId|triggerPrice|visibleQty`
fn parse_add(parts: &[&str]) -> Result<AddRequest, ParseError> {
    const T: &str = "ADD";
    if parts.len() < 8 {
        return Err(ParseError::TooFewFields(T));
    }
    let sequence = parse_u64(T, "seq", parts[1])?;
    let order_id = parse_u64(T, "orderId", parts[3])?;
    let symbol: Arc<str> = Arc::from(parts[4]);
    let price = parse_f64(T, "price", parts[5])?;
    let quantity = parse_u64(T, "qty", parts[6])?;
    let side = parse_side(parts[7])?;

    let tif = parts.get(8).map(|s| parse_tif(s)).unwrap_or_default();
    let order_type = parts.get(9).map(|s| parse_order_type(s)).unwrap_or_default();
    let participant_id = match parts.get(10) {
        Some(v) => parse_u64(T, "participantId", v)?,
        None => 0,
    };
    let trigger_price = match parts.get(11) {
        Some(v) => parse_f64(T, "triggerPrice", v)?,
        None => 0.0,
    };
    let visible_quantity = match parts.get(12) {
        Some(v) => parse_u64(T, "visibleQty", v)?,
        None => quantity,
    };

    Ok(AddRequest {
        sequence,
        order_id,
        symbol,
        price,
        quantity,
        side,
        tif,
        order_type,
        participant_id,
        trigger_price,
        visible_quantity,
    })
}

/// `CANCEL|seq|ts|orderId|participantId`
fn parse_cancel(parts: &[&str]) -> Result<CancelRequest, ParseError> {
    const T: &str = "CANCEL";
    if parts.len() < 4 {
        return Err(ParseError::TooFewFields(T));
    }
    let sequence = parse_u64(T, "seq", parts[1])?;
    let order_id = parse_u64(T, "orderId", parts[3])?;
    let participant_id = match parts.get(4) {
        Some(v) => parse_u64(T, "participantId", v)?,
        None => 0,
    };
    Ok(CancelRequest { sequence, order_id, participant_id })
}

/// `CANCEL_REPLACE|seq|ts|orderId|newPrice|newQty|participantId`
fn parse_cancel_replace(parts: &[&str]) -> Result<CancelReplaceRequest, ParseError> {
    const T: &str = "CANCEL_REPLACE";
    if parts.len() < 6 {
        return Err(ParseError::TooFewFields(T));
    }
    let sequence = parse_u64(T, "seq", parts[1])?;
    let order_id = parse_u64(T, "orderId", parts[3])?;
    let new_price = parse_f64(T, "newPrice", parts[4])?;
    let new_quantity = parse_u64(T, "newQty", parts[5])?;
    let participant_id = match parts.get(6) {
        Some(v) => parse_u64(T, "participantId", v)?,
        None => 0,
    };
    Ok(CancelReplaceRequest { sequence, order_id, new_price, new_quantity, participant_id })
}

/// `SNAPSHOT_REQUEST|seq|ts|symbol`
fn parse_snapshot_request(parts: &[&str]) -> Result<SnapshotRequestMsg, ParseError> {
    const T: &str = "SNAPSHOT_REQUEST";
    if parts.len() < 4 {
        return Err(ParseError::TooFewFields(T));
    }
    let sequence = parse_u64(T, "seq", parts[1])?;
    let symbol: Arc<str> = Arc::from(parts[3]);
    Ok(SnapshotRequestMsg { sequence, symbol })
}

/// `SNAPSHOT|symbol=<s>|bestBid=<p>|bestAsk=<p>|lastTradePrice=<p>`. An empty
/// book side formats as `0.00`, matching the original's `0.0`-when-empty
/// convention (spec §6, SPEC_FULL.md §B.3).
pub fn format_snapshot(resp: &SnapshotResponse) -> String {
    format!(
        "SNAPSHOT|symbol={}|bestBid={:.2}|bestAsk={:.2}|lastTradePrice={:.2}\n",
        resp.symbol,
        resp.best_bid.unwrap_or(0.0),
        resp.best_ask.unwrap_or(0.0),
        resp.last_trade_price
    )
}
