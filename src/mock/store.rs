//! In-memory record store behind the mock server
//!
//! Ordered map under a parking_lot `RwLock`; reads share the lock,
//! mutations take it exclusively, so every command is atomic.

use std::collections::{BTreeMap, HashMap};
use std::ops::Bound;
use std::path::Path;
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};

use crate::protocol::{Body, Command, Reply};
use crate::wire::WireList;

use super::snapshot::{read_snapshot, write_snapshot};

/// Server-side extension function: `(key, value) -> result`, None = failure
pub type Extension = Arc<dyn Fn(&[u8], &[u8]) -> Option<Vec<u8>> + Send + Sync>;

/// Per-session iteration position
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum IterCursor {
    /// `iterinit` has not been issued
    #[default]
    Unset,

    /// Next pull returns the first key
    Start,

    /// Next pull returns the first key after this one
    After(Vec<u8>),
}

/// Records plus the server-wide state the mock keeps
pub struct MemStore {
    records: RwLock<BTreeMap<Vec<u8>, Vec<u8>>>,
    extensions: HashMap<Vec<u8>, Extension>,
    master: Mutex<Option<(String, u32)>>,
}

impl MemStore {
    /// Create an empty store with the given extension functions
    pub fn new(extensions: HashMap<Vec<u8>, Extension>) -> Self {
        Self {
            records: RwLock::new(BTreeMap::new()),
            extensions,
            master: Mutex::new(None),
        }
    }

    /// Read a record directly (bypassing the protocol)
    pub fn get(&self, key: &[u8]) -> Option<Vec<u8>> {
        self.records.read().get(key).cloned()
    }

    /// Number of records
    pub fn len(&self) -> usize {
        self.records.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.read().is_empty()
    }

    /// Replication master recorded by `setmst`
    pub fn master(&self) -> Option<(String, u32)> {
        self.master.lock().clone()
    }

    /// Execute a command
    ///
    /// Returns `None` for commands that get no reply.
    pub fn execute(&self, command: Command, cursor: &mut IterCursor) -> Option<Reply> {
        let reply = match command {
            Command::Put { key, value } => {
                self.records.write().insert(key, value);
                Reply::ok(Body::Empty)
            }
            Command::PutNr { key, value } => {
                self.records.write().insert(key, value);
                return None;
            }
            Command::PutKeep { key, value } => {
                let mut records = self.records.write();
                if records.contains_key(&key) {
                    Reply::failure()
                } else {
                    records.insert(key, value);
                    Reply::ok(Body::Empty)
                }
            }
            Command::PutCat { key, value } => {
                self.records.write().entry(key).or_default().extend_from_slice(&value);
                Reply::ok(Body::Empty)
            }
            Command::PutShl { key, value, width } => {
                let mut records = self.records.write();
                let stored = records.entry(key).or_default();
                stored.extend_from_slice(&value);
                let excess = stored.len().saturating_sub(width as usize);
                stored.drain(..excess);
                Reply::ok(Body::Empty)
            }
            Command::Out { key } => match self.records.write().remove(&key) {
                Some(_) => Reply::ok(Body::Empty),
                None => Reply::failure(),
            },
            Command::Get { key } => match self.get(&key) {
                Some(value) => Reply::ok(Body::Bytes(value)),
                None => Reply::failure(),
            },
            Command::Vsiz { key } => match self.records.read().get(&key) {
                Some(value) => Reply::ok(Body::Size(value.len() as u32)),
                None => Reply::failure(),
            },
            Command::IterInit => {
                *cursor = IterCursor::Start;
                Reply::ok(Body::Empty)
            }
            Command::IterNext => self.iter_next(cursor),
            Command::FwmKeys { prefix, max } => {
                let records = self.records.read();
                let limit = usize::try_from(max).unwrap_or(usize::MAX);
                let keys: WireList = records
                    .range::<Vec<u8>, _>((Bound::Included(&prefix), Bound::Unbounded))
                    .map(|(key, _)| key)
                    .take_while(|key| key.starts_with(&prefix))
                    .take(limit)
                    .cloned()
                    .collect();
                Reply::ok(Body::List(keys))
            }
            Command::AddInt { key, num } => self.add_int(key, num),
            Command::AddDouble { key, num } => self.add_double(key, num),
            Command::Ext { name, key, value, .. } => match self.extensions.get(&name) {
                Some(extension) => match extension(&key, &value) {
                    Some(result) => Reply::ok(Body::Bytes(result)),
                    None => Reply::failure(),
                },
                None => {
                    tracing::debug!("Unknown extension: {}", String::from_utf8_lossy(&name));
                    Reply::failure()
                }
            },
            Command::Sync | Command::Optimize { .. } => Reply::ok(Body::Empty),
            Command::Vanish => {
                self.records.write().clear();
                Reply::ok(Body::Empty)
            }
            Command::Copy { path } => self.copy(&path),
            Command::Restore { path, .. } => self.restore(&path),
            Command::SetMaster { host, port, .. } => {
                let host = String::from_utf8_lossy(&host).into_owned();
                *self.master.lock() = if host.is_empty() { None } else { Some((host, port)) };
                Reply::ok(Body::Empty)
            }
            Command::Rnum => Reply::ok(Body::Count(self.len() as u64)),
            Command::Size => Reply::ok(Body::Count(self.size())),
            Command::Stat => Reply::ok(Body::Bytes(self.stat().into_bytes())),
            Command::Misc { name, args, .. } => self.misc(&name, args),
        };

        Some(reply)
    }

    // =========================================================================
    // Command helpers
    // =========================================================================

    fn iter_next(&self, cursor: &mut IterCursor) -> Reply {
        let records = self.records.read();
        let next = match cursor {
            IterCursor::Unset => None,
            IterCursor::Start => records.keys().next(),
            IterCursor::After(last) => records
                .range::<Vec<u8>, _>((Bound::Excluded(&*last), Bound::Unbounded))
                .map(|(key, _)| key)
                .next(),
        };

        match next {
            Some(key) => {
                *cursor = IterCursor::After(key.clone());
                Reply::ok(Body::Bytes(key.clone()))
            }
            None => Reply::failure(),
        }
    }

    fn add_int(&self, key: Vec<u8>, num: i32) -> Reply {
        let mut records = self.records.write();
        let current = match records.get(&key) {
            Some(stored) => match <[u8; 4]>::try_from(stored.as_slice()) {
                Ok(bytes) => i32::from_le_bytes(bytes),
                Err(_) => return Reply::failure(),
            },
            None => 0,
        };
        let sum = current.wrapping_add(num);
        records.insert(key, sum.to_le_bytes().to_vec());
        Reply::ok(Body::Int(sum))
    }

    fn add_double(&self, key: Vec<u8>, num: f64) -> Reply {
        let mut records = self.records.write();
        let current = match records.get(&key) {
            Some(stored) => match <[u8; 8]>::try_from(stored.as_slice()) {
                Ok(bytes) => f64::from_le_bytes(bytes),
                Err(_) => return Reply::failure(),
            },
            None => 0.0,
        };
        let sum = current + num;
        records.insert(key, sum.to_le_bytes().to_vec());
        Reply::ok(Body::Double(sum))
    }

    fn copy(&self, path: &[u8]) -> Reply {
        let path = String::from_utf8_lossy(path).into_owned();
        let records = self.records.read();
        match write_snapshot(Path::new(&path), &records) {
            Ok(count) => {
                tracing::debug!("Copied {} records to {}", count, path);
                Reply::ok(Body::Empty)
            }
            Err(e) => {
                tracing::warn!("Copy to {} failed: {}", path, e);
                Reply::failure()
            }
        }
    }

    fn restore(&self, path: &[u8]) -> Reply {
        let path = String::from_utf8_lossy(path).into_owned();
        match read_snapshot(Path::new(&path)) {
            Ok(snapshot) => {
                let mut records = self.records.write();
                records.clear();
                records.extend(snapshot.records);
                tracing::debug!("Restored {} records from {}", records.len(), path);
                Reply::ok(Body::Empty)
            }
            Err(e) => {
                tracing::warn!("Restore from {} failed: {}", path, e);
                Reply::failure()
            }
        }
    }

    fn size(&self) -> u64 {
        self.records
            .read()
            .iter()
            .map(|(key, value)| (key.len() + value.len()) as u64)
            .sum()
    }

    fn stat(&self) -> String {
        let mut text = format!(
            "version\t{}\ntype\tmock\nrnum\t{}\nsize\t{}\n",
            crate::VERSION,
            self.len(),
            self.size()
        );
        if let Some((host, port)) = self.master() {
            text.push_str(&format!("mhost\t{}\nmport\t{}\n", host, port));
        }
        text
    }

    fn misc(&self, name: &[u8], args: WireList) -> Reply {
        match name {
            b"putlist" => {
                let mut records = self.records.write();
                for (key, value) in args.pairs() {
                    records.insert(key.to_vec(), value.to_vec());
                }
                Reply::ok(Body::List(WireList::new()))
            }
            b"outlist" => {
                let mut records = self.records.write();
                let mut missing = false;
                for key in args.iter() {
                    missing |= records.remove(key).is_none();
                }
                if missing {
                    Reply::failure()
                } else {
                    Reply::ok(Body::List(WireList::new()))
                }
            }
            b"getlist" => {
                let records = self.records.read();
                let mut found = WireList::new();
                for key in args.iter() {
                    if let Some(value) = records.get(key) {
                        found.push(key);
                        found.push(value.clone());
                    }
                }
                Reply::ok(Body::List(found))
            }
            other => {
                tracing::debug!("Unknown misc procedure: {}", String::from_utf8_lossy(other));
                Reply::failure()
            }
        }
    }
}

impl Default for MemStore {
    fn default() -> Self {
        Self::new(HashMap::new())
    }
}
