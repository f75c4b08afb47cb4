//! Snapshot files written by `copy` and loaded by `restore`
//!
//! ## File Format
//! ```text
//! ┌───────────┬─────────┬───────────┬────────────────────────┐
//! │ Magic (4) │ CRC (4) │  Len (8)  │  bincode(Snapshot)     │
//! └───────────┴─────────┴───────────┴────────────────────────┘
//! ```
//! The CRC covers the bincode payload only.

use std::collections::BTreeMap;
use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Read, Write};
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

use crate::error::{Result, TyrantError};

const MAGIC: &[u8; 4] = b"TKVS";
const HEADER_SIZE: usize = 16;

/// Point-in-time copy of every record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Snapshot {
    /// Unix millis when the snapshot was taken
    pub created_ms: u64,

    /// Records in key order
    pub records: Vec<(Vec<u8>, Vec<u8>)>,
}

/// Write all records to `path`, returning how many were written
pub fn write_snapshot(path: &Path, records: &BTreeMap<Vec<u8>, Vec<u8>>) -> Result<usize> {
    let snapshot = Snapshot {
        created_ms: SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or(0),
        records: records
            .iter()
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect(),
    };

    let payload =
        bincode::serialize(&snapshot).map_err(|e| TyrantError::Serialization(e.to_string()))?;

    let file = OpenOptions::new()
        .create(true)
        .write(true)
        .truncate(true)
        .open(path)?;
    let mut writer = BufWriter::new(file);

    writer.write_all(MAGIC)?;
    writer.write_all(&crc32fast::hash(&payload).to_be_bytes())?;
    writer.write_all(&(payload.len() as u64).to_be_bytes())?;
    writer.write_all(&payload)?;
    writer.flush()?;
    writer.get_ref().sync_all()?;

    Ok(snapshot.records.len())
}

/// Load and verify a snapshot file
pub fn read_snapshot(path: &Path) -> Result<Snapshot> {
    let mut bytes = Vec::new();
    File::open(path)?.read_to_end(&mut bytes)?;

    if bytes.len() < HEADER_SIZE || &bytes[..4] != MAGIC {
        return Err(TyrantError::SnapshotCorruption(format!(
            "{} is not a snapshot file",
            path.display()
        )));
    }

    let expected_crc = u32::from_be_bytes([bytes[4], bytes[5], bytes[6], bytes[7]]);
    let mut len_bytes = [0u8; 8];
    len_bytes.copy_from_slice(&bytes[8..HEADER_SIZE]);
    let payload_len = u64::from_be_bytes(len_bytes) as usize;

    let payload = &bytes[HEADER_SIZE..];
    if payload.len() != payload_len {
        return Err(TyrantError::SnapshotCorruption(format!(
            "payload length mismatch: header says {}, file has {}",
            payload_len,
            payload.len()
        )));
    }

    let actual_crc = crc32fast::hash(payload);
    if actual_crc != expected_crc {
        return Err(TyrantError::SnapshotCorruption(format!(
            "CRC mismatch: expected {:08x}, got {:08x}",
            expected_crc, actual_crc
        )));
    }

    bincode::deserialize(payload).map_err(|e| TyrantError::Serialization(e.to_string()))
}
