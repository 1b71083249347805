//! Write-ahead log sink: durably records inputs and executions in sequence
//! order, per spec §6's WAL line format.
//!
//! Grounded on `original_source/src/Replay.h` (append-only text log,
//! `logAddMessage`/`logCancelMessage`/`logCancelReplaceMessage`/
//! `logExecutionMessage`) and the teacher's trait-based collaborator
//! boundaries in `application::services::matching_service` (injected
//! dependencies behind a small trait rather than a concrete type).

use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::Path;
use std::sync::Mutex;

use crate::domain::errors::EngineError;

/// Durable record sink for the matching core's write-ahead log.
///
/// A WAL append failure is NACK-worthy for the triggering request (spec
/// §7.4) but must never unwind the process, so callers propagate `Err`
/// straight into a `RejectReason::WalFailure`.
pub trait WalSink: Send + Sync {
    fn append_add(&self, seq: u64, order_id: u64, symbol: &str, price: f64, qty: u64) -> Result<(), EngineError>;
    fn append_cancel(&self, seq: u64, order_id: u64) -> Result<(), EngineError>;
    fn append_cancel_replace(
        &self,
        seq: u64,
        order_id: u64,
        new_price: f64,
        new_qty: u64,
    ) -> Result<(), EngineError>;
    fn append_exec(&self, seq: u64, symbol: &str, price: f64, qty: u64) -> Result<(), EngineError>;
}

/// Append-only text-file WAL, one record per line, flushed on every write
/// so a completed `append_*` call really means "durable enough to ACK".
pub struct FileWalSink {
    writer: Mutex<BufWriter<File>>,
}

impl FileWalSink {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, EngineError> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self {
            writer: Mutex::new(BufWriter::new(file)),
        })
    }

    fn write_line(&self, line: &str) -> Result<(), EngineError> {
        let mut w = self.writer.lock().unwrap_or_else(|e| e.into_inner());
        w.write_all(line.as_bytes())?;
        w.write_all(b"\n")?;
        w.flush()?;
        Ok(())
    }
}

impl WalSink for FileWalSink {
    fn append_add(&self, seq: u64, order_id: u64, symbol: &str, price: f64, qty: u64) -> Result<(), EngineError> {
        self.write_line(&format!("ADD|{seq}|{order_id}|{symbol}|{price}|{qty}"))
    }

    fn append_cancel(&self, seq: u64, order_id: u64) -> Result<(), EngineError> {
        self.write_line(&format!("CANCEL|{seq}|{order_id}"))
    }

    fn append_cancel_replace(
        &self,
        seq: u64,
        order_id: u64,
        new_price: f64,
        new_qty: u64,
    ) -> Result<(), EngineError> {
        self.write_line(&format!("CANCEL_REPLACE|{seq}|{order_id}|{new_price}|{new_qty}"))
    }

    fn append_exec(&self, seq: u64, symbol: &str, price: f64, qty: u64) -> Result<(), EngineError> {
        self.write_line(&format!("EXEC|{seq}|{symbol}|{price}|{qty}"))
    }
}

/// In-memory WAL used by tests and by any deployment that does not need
/// durability across restarts (persistence/replay on startup is an
/// explicit non-goal of this core).
#[derive(Default)]
pub struct InMemoryWalSink {
    records: Mutex<Vec<String>>,
}

impl InMemoryWalSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> Vec<String> {
        self.records.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }
}

impl WalSink for InMemoryWalSink {
    fn append_add(&self, seq: u64, order_id: u64, symbol: &str, price: f64, qty: u64) -> Result<(), EngineError> {
        self.records
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(format!("ADD|{seq}|{order_id}|{symbol}|{price}|{qty}"));
        Ok(())
    }

    fn append_cancel(&self, seq: u64, order_id: u64) -> Result<(), EngineError> {
        self.records
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(format!("CANCEL|{seq}|{order_id}"));
        Ok(())
    }

    fn append_cancel_replace(
        &self,
        seq: u64,
        order_id: u64,
        new_price: f64,
        new_qty: u64,
    ) -> Result<(), EngineError> {
        self.records
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(format!("CANCEL_REPLACE|{seq}|{order_id}|{new_price}|{new_qty}"));
        Ok(())
    }

    fn append_exec(&self, seq: u64, symbol: &str, price: f64, qty: u64) -> Result<(), EngineError> {
        self.records
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(format!("EXEC|{seq}|{symbol}|{price}|{qty}"));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn in_memory_sink_records_in_order() {
        let wal = InMemoryWalSink::new();
        wal.append_add(1, 10, "AAPL", 150.0, 100).unwrap();
        wal.append_exec(1, "AAPL", 150.0, 60).unwrap();
        assert_eq!(
            wal.records(),
            vec!["ADD|1|10|AAPL|150|100".to_string(), "EXEC|1|AAPL|150|60".to_string()]
        );
    }
}
