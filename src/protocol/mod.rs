//! Protocol Module
//!
//! Binary request/reply frames spoken by the store.
//!
//! ## Request Format
//! ```text
//! ┌───────────┬──────────┬──────────────────────────────────┐
//! │ Magic (1) │  Op (1)  │  Fixed fields  │  Variable data  │
//! └───────────┴──────────┴──────────────────────────────────┘
//! ```
//! Magic is always `0xC8`. Integers are big-endian; lengths precede the
//! byte strings they describe, and all fixed fields come before any data.
//!
//! ## Reply Format
//! ```text
//! ┌────────────┬─────────────────────────────┐
//! │ Status (1) │ Body (only when status = 0) │
//! └────────────┴─────────────────────────────┘
//! ```
//! The body layout depends on the request (see [`ReplyShape`]).
//! `putnr` has no reply at all.

mod command;
mod reply;
mod codec;

pub use command::{Command, CommandType, MAGIC};
pub use reply::{Body, Reply, ReplyShape, STATUS_FAILURE, STATUS_SUCCESS};
pub use codec::{
    decode_command, decode_reply, encode_command, encode_reply, read_command, read_reply,
    write_command, write_reply, MAX_PAYLOAD_SIZE,
};
