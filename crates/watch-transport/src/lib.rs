//! Transport layer for roomwatch.
//!
//! Defines the narrow [`ChatTransport`] seam the runtime talks to (log in,
//! resolve a room, receive its live message stream) and ships one concrete
//! implementation, [`FeedTransport`], which reads each room from a JSONL
//! feed file that another process appends to.

pub mod feed;
pub mod reader;
pub mod transport;

pub use feed::FeedTransport;
pub use transport::{ChatTransport, Room, TransportError};

pub use watch_core as core;
