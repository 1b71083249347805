//! Infrastructure Layer - Technical Implementations
//!
//! Contains the collaborators the core depends on but does not own the
//! internals of: the wire protocol codec, the TCP session boundary, and the
//! observability HTTP server. Depends on `domain`/`application`; neither
//! depends back on this layer (dependency inversion).

pub mod network;
pub mod observability;
pub mod protocol;
