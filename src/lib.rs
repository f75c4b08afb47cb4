//! # TyrantKV
//!
//! A blocking client for Tokyo Tyrant compatible key-value servers:
//! - Wire-list marshaling between caller containers and the store's flat lists
//! - Scalar and batched put/get/out, prefix search, counters, extensions
//! - Server-side iteration exposed as a restartable lazy key sequence
//! - Administrative calls (sync, optimize, vanish, copy, restore, setmaster)
//! - An in-memory mock server speaking the same protocol
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                         Handle                               │
//! │        (open / tune / close, one connection, Drop)           │
//! └──────────┬──────────────────────────────┬───────────────────┘
//!            │                              │
//!            ▼                              ▼
//!   ┌─────────────────┐            ┌─────────────────┐
//!   │   Dispatcher    │            │     Cursor      │
//!   │  (scalar/batch) │            │  (Keys<'_>)     │
//!   └────────┬────────┘            └────────┬────────┘
//!            │  Wire-List Codec             │
//!            ▼                              ▼
//!   ┌─────────────────────────────────────────────────┐
//!   │        Protocol (frames) + Connection (TCP)      │
//!   └─────────────────────────────────────────────────┘
//! ```
//!
//! ## Example
//!
//! ```no_run
//! use tyrantkv::{Handle, PutMode};
//!
//! # fn main() -> tyrantkv::Result<()> {
//! let mut db = Handle::open("localhost", 1978)?;
//! db.put("greeting", "hello")?;
//! db.put_with("greeting", ", world", PutMode::Concat)?;
//! assert_eq!(db.get("greeting")?, Some(b"hello, world".to_vec()));
//!
//! for key in db.keys()? {
//!     println!("{}", String::from_utf8_lossy(&key?));
//! }
//! db.close()?;
//! # Ok(())
//! # }
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod config;
pub mod options;

pub mod wire;
pub mod protocol;
pub mod network;
pub mod handle;
pub mod ops;
pub mod cursor;
pub mod mock;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use error::{ErrorCode, Result, TyrantError};
pub use config::Config;
pub use options::{ExtOptions, MiscOptions, PutMode, RestoreOptions, TuneOptions};
pub use wire::{Value, WireList};
pub use handle::Handle;
pub use cursor::Keys;

// =============================================================================
// Version Info
// =============================================================================

/// Current version of TyrantKV
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
