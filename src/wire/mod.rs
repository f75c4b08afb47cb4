//! Wire-List Codec
//!
//! Converts between generic caller containers and the store's flat list
//! encoding used by batched calls.
//!
//! ## Encodings
//! ```text
//! flat array:     [ k0 | k1 | k2 | ... ]             (key-only batches)
//! flat pairs:     [ k0 | v0 | k1 | v1 | ... ]        (batched put input, get output)
//! ```
//!
//! Elements are plain byte sequences. Numbers are sent as their canonical
//! decimal text; values that have no byte form (booleans, nil) are dropped.

mod value;
mod list;

pub use value::{format_number, Value};
pub use list::{list_to_mapping, list_to_sequence, mapping_to_list, sequence_to_list, WireList};
