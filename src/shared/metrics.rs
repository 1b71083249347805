//! Prometheus Metrics Module
//!
//! 撮合核心对外暴露的指标：收到的指令、成交、撤单、按类别统计的拒绝，
//! 以及撮合耗时和停牌状态。
//!
//! ## 使用示例
//! ```rust,ignore
//! use matching_engine::shared::metrics::METRICS;
//!
//! METRICS.orders_received_total.with_label_values(&["AAPL"]).inc();
//! ```

use lazy_static::lazy_static;
use prometheus::{
    register_counter_vec, register_gauge_vec, register_histogram_vec, CounterVec, Encoder, GaugeVec, HistogramVec,
    TextEncoder,
};

lazy_static! {
    /// 全局Metrics实例
    pub static ref METRICS: Metrics = Metrics::new();
}

pub struct Metrics {
    /// ADD instructions received, by symbol.
    pub orders_received_total: CounterVec,

    /// Trades executed, by symbol.
    pub trades_total: CounterVec,

    /// Cancellations, by symbol and outcome (ack/nack).
    pub cancellations_total: CounterVec,

    /// Rejected instructions, by taxonomy category (spec §7).
    pub rejects_total: CounterVec,

    /// Matching duration per processAdd/processCancelReplace call (µs).
    pub matching_duration_us: HistogramVec,

    /// 1 when a symbol is halted, 0 otherwise.
    pub symbol_halted: GaugeVec,
}

impl Metrics {
    pub fn new() -> Self {
        Self {
            orders_received_total: register_counter_vec!(
                "matching_engine_orders_received_total",
                "Total number of ADD instructions received",
                &["symbol"]
            )
            .unwrap(),

            trades_total: register_counter_vec!(
                "matching_engine_trades_total",
                "Total number of trades executed",
                &["symbol"]
            )
            .unwrap(),

            cancellations_total: register_counter_vec!(
                "matching_engine_cancellations_total",
                "Total number of order cancellations",
                &["symbol", "outcome"]
            )
            .unwrap(),

            rejects_total: register_counter_vec!(
                "matching_engine_rejects_total",
                "Total number of rejected instructions by category",
                &["symbol", "reason"]
            )
            .unwrap(),

            matching_duration_us: register_histogram_vec!(
                "matching_engine_matching_duration_microseconds",
                "Order matching duration in microseconds",
                &["symbol"],
                vec![1.0, 5.0, 10.0, 50.0, 100.0, 500.0, 1000.0, 5000.0]
            )
            .unwrap(),

            symbol_halted: register_gauge_vec!(
                "matching_engine_symbol_halted",
                "1 when trading is halted for the symbol, 0 otherwise",
                &["symbol"]
            )
            .unwrap(),
        }
    }

    pub fn export(&self) -> String {
        let encoder = TextEncoder::new();
        let metric_families = prometheus::gather();
        let mut buffer = vec![];
        encoder.encode(&metric_families, &mut buffer).unwrap();
        String::from_utf8(buffer).unwrap()
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}
