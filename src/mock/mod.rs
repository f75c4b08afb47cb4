//! Mock Server Module
//!
//! An in-memory store that speaks the same wire protocol, for tests and
//! local development without a real server.
//!
//! ## Architecture
//! ```text
//!   acceptor thread ──► session thread per client ──► MemStore
//!                         (own iteration cursor)      (RwLock<BTreeMap>)
//! ```
//! - `copy` / `restore` write and load CRC-checked snapshot files
//! - extension functions are registered up front on the builder

mod store;
mod session;
mod server;
mod snapshot;

pub use store::{Extension, IterCursor, MemStore};
pub use session::Session;
pub use server::{MockServer, MockServerBuilder};
pub use snapshot::{read_snapshot, write_snapshot, Snapshot};
