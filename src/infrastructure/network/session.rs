//! Session layer: the line-delimited TCP collaborator boundary named in
//! spec §2 item 6 ("hands decoded messages to Controller, forwards
//! ACK/NACK/SNAPSHOT bytes"). Framing is the simplest thing that satisfies
//! spec §6 ("one message per LF-terminated line") — `tokio::io::AsyncBufReadExt`
//! reading to `\n`, no custom codec.
//!
//! Grounded on `original_source/src/Session.cpp` for the per-connection
//! read/dispatch/respond loop (there it is a readiness-driven `onReadable`;
//! here each connection is its own spawned task, which is the natural tokio
//! analogue spec §9's design notes call for — "one actor/task per symbol"
//! generalizes just as well to "one task per connection").

use std::sync::Arc;

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};
use tracing::{info, warn};

use crate::application::controller::EngineController;
use crate::domain::errors::RejectReason;
use crate::infrastructure::protocol::{self, ClientMessage};
use crate::shared::metrics::METRICS;
use crate::shared::timestamp::get_fast_timestamp;

/// Accepts connections on `listener` until the listener errors, dispatching
/// every decoded line to `controller`. Each connection runs in its own
/// spawned task so one slow client cannot stall another (spec §5: "no
/// operation in the core awaits on network I/O" — only this boundary does).
pub async fn serve(listener: TcpListener, controller: Arc<EngineController>) -> std::io::Result<()> {
    loop {
        let (socket, addr) = listener.accept().await?;
        let controller = controller.clone();
        tokio::spawn(async move {
            info!(%addr, "session connected");
            if let Err(e) = handle_connection(socket, controller).await {
                warn!(%addr, error = %e, "session ended with error");
            } else {
                info!(%addr, "session disconnected");
            }
        });
    }
}

async fn handle_connection(socket: TcpStream, controller: Arc<EngineController>) -> std::io::Result<()> {
    let (reader, mut writer) = socket.into_split();
    let mut lines = BufReader::new(reader).lines();

    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }
        if let Some(response) = dispatch_line(&controller, &line) {
            writer.write_all(response.as_bytes()).await?;
        }
    }
    Ok(())
}

/// Parses and dispatches a single line, returning the bytes to send back to
/// the session (or `None` for a malformed line, which per spec §7.1 is
/// dropped silently after a warning — no ACK/NACK, no state change).
fn dispatch_line(controller: &EngineController, line: &str) -> Option<String> {
    let msg = match protocol::parse_line(line) {
        Ok(msg) => msg,
        Err(e) => {
            warn!(error = %e, line, "dropping malformed instruction");
            return None;
        }
    };

    let timestamp = get_fast_timestamp();
    match msg {
        ClientMessage::Add(req) => {
            METRICS.orders_received_total.with_label_values(&[&req.symbol]).inc();
            let symbol = req.symbol.clone();
            let result = controller.dispatch_add(&req, timestamp);
            record_add_outcome(&symbol, &result);
            Some(match result {
                Ok(_) => protocol::ADD_ACK.to_string(),
                Err(_) => protocol::ADD_NACK.to_string(),
            })
        }
        ClientMessage::Cancel(req) => {
            let result = controller.dispatch_cancel(&req);
            if let Err(reason) = &result {
                METRICS.rejects_total.with_label_values(&["-", reason.as_str()]).inc();
            }
            Some(match result {
                Ok(()) => protocol::CANCEL_ACK.to_string(),
                Err(_) => protocol::CANCEL_NACK.to_string(),
            })
        }
        ClientMessage::CancelReplace(req) => {
            let result = controller.dispatch_cancel_replace(&req, timestamp);
            if let Err(reason) = &result {
                METRICS.rejects_total.with_label_values(&["-", reason.as_str()]).inc();
            }
            Some(match result {
                Ok(trades) => {
                    for t in &trades {
                        METRICS.trades_total.with_label_values(&[&t.symbol]).inc();
                    }
                    protocol::CANCEL_REPLACE_ACK.to_string()
                }
                Err(_) => protocol::CANCEL_REPLACE_NACK.to_string(),
            })
        }
        ClientMessage::SnapshotRequest(req) => match controller.dispatch_snapshot_request(&req) {
            Ok(snap) => Some(protocol::format_snapshot(&snap)),
            Err(_) => None,
        },
    }
}

fn record_add_outcome(symbol: &str, result: &Result<Vec<crate::domain::orderbook::Trade>, RejectReason>) {
    match result {
        Ok(trades) => {
            for _ in trades {
                METRICS.trades_total.with_label_values(&[symbol]).inc();
            }
        }
        Err(reason) => {
            METRICS.rejects_total.with_label_values(&[symbol, reason.as_str()]).inc();
            if *reason == RejectReason::Policy {
                METRICS.symbol_halted.with_label_values(&[symbol]).set(1.0);
            }
        }
    }
}
