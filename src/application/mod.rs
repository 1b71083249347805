/// Application Layer - Orchestration
///
/// This layer orchestrates domain logic (validation, the order book) to
/// implement the matching engine's public operations. It depends on the
/// domain layer but is independent of infrastructure details (thanks to
/// dependency injection of the WAL sink).
///
/// ## Modules
/// - `engine`: the per-symbol `MatchingEngine` (§4.3)
/// - `controller`: the `EngineController` symbol router (§4.4)
/// - `wal`: the write-ahead log sink trait and implementations
/// - `dto`: data transfer objects crossing the infrastructure boundary
pub mod controller;
pub mod dto;
pub mod engine;
pub mod wal;

pub use controller::EngineController;
pub use engine::MatchingEngine;
