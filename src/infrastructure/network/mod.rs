//! Network infrastructure: the TCP session boundary (spec §2 item 6).
//!
//! The socket acceptor and readiness loop are explicitly out of scope for
//! the core (spec §1); this module is the thin, swappable collaborator that
//! satisfies the interface, built directly on tokio rather than the
//! multi-backend (tokio/io_uring/DPDK) abstraction the teacher carries for
//! its own tick-array engine (see DESIGN.md for why that layer was dropped).

pub mod session;

pub use session::serve;
