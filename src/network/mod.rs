//! Network Module
//!
//! Client side of the TCP transport.
//!
//! ## Model
//! - One `Connection` per handle, no pooling
//! - Strictly request/reply: each call blocks until its reply is read
//! - Socket timeouts are the only deadline

mod connection;

pub use connection::Connection;
