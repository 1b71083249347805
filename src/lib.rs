#[cfg(not(target_env = "msvc"))]
use tikv_jemallocator::Jemalloc;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

// Layered architecture, dependencies flow one way:
// interfaces -> application -> domain <- infrastructure

/// Domain Layer - core business logic, no external dependencies.
pub mod domain;

/// Application Layer - use-case orchestration (engine, controller, WAL).
pub mod application;

/// Infrastructure Layer - wire protocol, TCP session boundary, observability.
pub mod infrastructure;

/// Shared - utilities used across every layer.
pub mod shared;

/// Interfaces - process entry point.
pub mod interfaces;
