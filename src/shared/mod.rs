//! Shared utilities used across layers.
//!
//! - `timestamp`: batched wall-clock timestamp source (spec §9's
//!   "timestamp is a tie-breaker" plus SPEC_FULL.md §B.2's wall-clock
//!   nanosecond grounding)
//! - `metrics`: Prometheus metrics exported over the observability server
//!   (SPEC_FULL.md §A.4)

pub mod metrics;
pub mod timestamp;

pub use timestamp::get_fast_timestamp;
