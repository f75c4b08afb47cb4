//! Operation Dispatcher
//!
//! Every remote operation of the store, as methods on [`Handle`].
//!
//! Scalar and batched shapes are separate entry points (`get` / `get_list`,
//! `out` / `out_list`, `put_with` / `put_list`). Keys and values accept
//! anything convertible into a [`Value`]; numbers travel as their decimal
//! text. Passing a value with no byte form (bool, nil) is a local
//! [`TyrantError::InvalidArgument`], reported before anything is sent.
//!
//! Failures follow one convention: `Err` for anything that went wrong,
//! while legitimately absent data is `Ok(None)` (`get`, `vsize`) or
//! `Ok(false)` (`put_with` in `Keep` mode on an existing key).

use std::collections::HashMap;

use crate::error::{ErrorCode, Result, TyrantError};
use crate::handle::Handle;
use crate::options::{ExtOptions, MiscOptions, PutMode, RestoreOptions};
use crate::protocol::Command;
use crate::wire::{list_to_mapping, list_to_sequence, mapping_to_list, sequence_to_list, Value, WireList};

/// Misc procedure names used by the batched operations
const MISC_PUTLIST: &str = "putlist";
const MISC_OUTLIST: &str = "outlist";
const MISC_GETLIST: &str = "getlist";

/// Convert a scalar argument, rejecting values with no byte form
fn scalar(arg: impl Into<Value>, what: &str) -> Result<Vec<u8>> {
    let value: Value = arg.into();
    value.into_wire().ok_or_else(|| {
        TyrantError::InvalidArgument(format!("{} must be a number or a string", what))
    })
}

/// Absent-record failures become `None`; anything else stays an error
fn absent_as_none<T>(result: Result<T>) -> Result<Option<T>> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(TyrantError::Remote {
            code: ErrorCode::NoRecord,
        }) => Ok(None),
        Err(e) => Err(e),
    }
}

impl Handle {
    // =========================================================================
    // Put
    // =========================================================================

    /// Store a record, replacing any existing value
    pub fn put(&mut self, key: impl Into<Value>, value: impl Into<Value>) -> Result<()> {
        self.put_with(key, value, PutMode::Overwrite).map(|_| ())
    }

    /// Store a record using the given mode
    ///
    /// Returns `Ok(false)` only in [`PutMode::Keep`] when the key already
    /// exists and nothing was written.
    pub fn put_with(
        &mut self,
        key: impl Into<Value>,
        value: impl Into<Value>,
        mode: PutMode,
    ) -> Result<bool> {
        let key = scalar(key, "key")?;
        let value = scalar(value, "value")?;

        let command = match mode {
            PutMode::Overwrite => Command::Put { key, value },
            PutMode::Keep => Command::PutKeep { key, value },
            PutMode::Concat => Command::PutCat { key, value },
            PutMode::ConcatShiftLeft { width } => Command::PutShl { key, value, width },
            PutMode::NoReply => Command::PutNr { key, value },
        };

        match self.request(command) {
            Ok(_) => Ok(true),
            Err(TyrantError::Remote {
                code: ErrorCode::Keep,
            }) => Ok(false),
            Err(e) => Err(e),
        }
    }

    /// Store every entry of a mapping in one batched call (overwrite semantics)
    pub fn put_list<I, K, V>(&mut self, mapping: I, options: MiscOptions) -> Result<()>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<Value>,
        V: Into<Value>,
    {
        let list = mapping_to_list(mapping);
        self.misc(MISC_PUTLIST, options, list).map(|_| ())
    }

    // =========================================================================
    // Out
    // =========================================================================

    /// Remove a record; removing an absent key is a `NoRecord` error
    pub fn out(&mut self, key: impl Into<Value>) -> Result<()> {
        let key = scalar(key, "key")?;
        self.request(Command::Out { key }).map(|_| ())
    }

    /// Alias of [`out`](Self::out)
    pub fn del(&mut self, key: impl Into<Value>) -> Result<()> {
        self.out(key)
    }

    /// Remove a sequence of keys in one batched call
    pub fn out_list<I, T>(&mut self, keys: I, options: MiscOptions) -> Result<()>
    where
        I: IntoIterator<Item = T>,
        T: Into<Value>,
    {
        let list = sequence_to_list(keys);
        self.misc(MISC_OUTLIST, options, list).map(|_| ())
    }

    // =========================================================================
    // Get
    // =========================================================================

    /// Fetch a value; `Ok(None)` when the key does not exist
    pub fn get(&mut self, key: impl Into<Value>) -> Result<Option<Vec<u8>>> {
        let key = scalar(key, "key")?;
        let body = absent_as_none(self.request(Command::Get { key }))?;
        body.map(|body| body.into_bytes()).transpose()
    }

    /// Fetch several keys at once; absent keys are simply missing from the map
    pub fn get_list<I, T>(&mut self, keys: I, options: MiscOptions) -> Result<HashMap<Vec<u8>, Vec<u8>>>
    where
        I: IntoIterator<Item = T>,
        T: Into<Value>,
    {
        let list = sequence_to_list(keys);
        let pairs = self.misc(MISC_GETLIST, options, list)?;
        Ok(list_to_mapping(pairs))
    }

    /// Size in bytes of the stored value; `Ok(None)` when the key does not exist
    pub fn vsize(&mut self, key: impl Into<Value>) -> Result<Option<u32>> {
        let key = scalar(key, "key")?;
        let body = absent_as_none(self.request(Command::Vsiz { key }))?;
        body.map(|body| body.into_size()).transpose()
    }

    // =========================================================================
    // Counters
    // =========================================================================

    /// Atomically add `delta` to a floating point record, returning the new value
    pub fn add_num(&mut self, key: impl Into<Value>, delta: f64) -> Result<f64> {
        let key = scalar(key, "key")?;
        self.request(Command::AddDouble { key, num: delta })?.into_double()
    }

    /// Atomically add `delta` to an integer record, returning the new value
    pub fn add_int(&mut self, key: impl Into<Value>, delta: i32) -> Result<i32> {
        let key = scalar(key, "key")?;
        self.request(Command::AddInt { key, num: delta })?.into_int()
    }

    // =========================================================================
    // Search
    // =========================================================================

    /// Keys starting with `prefix`, at most `max` of them (None = unbounded)
    pub fn fwmkeys(&mut self, prefix: impl Into<Value>, max: Option<usize>) -> Result<Vec<Vec<u8>>> {
        let prefix = scalar(prefix, "prefix")?;
        let max = match max {
            Some(max) => i32::try_from(max).unwrap_or(i32::MAX),
            None => -1,
        };
        let list = self.request(Command::FwmKeys { prefix, max })?.into_list()?;
        Ok(list_to_sequence(list))
    }

    // =========================================================================
    // Extensions and raw calls
    // =========================================================================

    /// Invoke a server-side extension function and return its raw result
    pub fn ext(
        &mut self,
        name: &str,
        key: impl Into<Value>,
        value: impl Into<Value>,
        options: ExtOptions,
    ) -> Result<Vec<u8>> {
        let key = scalar(key, "key")?;
        let value = scalar(value, "value")?;
        self.request(Command::Ext {
            name: name.as_bytes().to_vec(),
            options: options.bits(),
            key,
            value,
        })?
        .into_bytes()
    }

    /// Call a named misc procedure with a wire list
    pub fn misc(&mut self, name: &str, options: MiscOptions, args: WireList) -> Result<WireList> {
        self.request(Command::Misc {
            name: name.as_bytes().to_vec(),
            options: options.bits(),
            args,
        })?
        .into_list()
    }

    // =========================================================================
    // Administration
    // =========================================================================

    /// Flush the server's database to its device
    pub fn sync(&mut self) -> Result<()> {
        self.request(Command::Sync).map(|_| ())
    }

    /// Optimize the server's database with optional tuning parameters
    pub fn optimize(&mut self, params: Option<&str>) -> Result<()> {
        let params = params.unwrap_or_default().as_bytes().to_vec();
        self.request(Command::Optimize { params }).map(|_| ())
    }

    /// Remove every record
    pub fn vanish(&mut self) -> Result<()> {
        self.request(Command::Vanish).map(|_| ())
    }

    /// Copy the database file to `path` on the server host
    pub fn copy(&mut self, path: &str) -> Result<()> {
        let path = path.as_bytes().to_vec();
        self.request(Command::Copy { path }).map(|_| ())
    }

    /// Restore from the update log at `path`, starting at `timestamp` (microseconds)
    pub fn restore(&mut self, path: &str, timestamp: u64, options: RestoreOptions) -> Result<()> {
        self.request(Command::Restore {
            path: path.as_bytes().to_vec(),
            timestamp,
            options: options.bits(),
        })
        .map(|_| ())
    }

    /// Point replication at a master (None = no master)
    pub fn set_master(
        &mut self,
        host: Option<&str>,
        port: u16,
        timestamp: u64,
        options: RestoreOptions,
    ) -> Result<()> {
        self.request(Command::SetMaster {
            host: host.unwrap_or_default().as_bytes().to_vec(),
            port: port as u32,
            timestamp,
            options: options.bits(),
        })
        .map(|_| ())
    }

    // =========================================================================
    // Introspection
    // =========================================================================

    /// Number of records
    pub fn rnum(&mut self) -> Result<u64> {
        self.request(Command::Rnum)?.into_count()
    }

    /// Same as [`rnum`](Self::rnum)
    pub fn len(&mut self) -> Result<u64> {
        self.rnum()
    }

    pub fn is_empty(&mut self) -> Result<bool> {
        Ok(self.rnum()? == 0)
    }

    /// Size of the database in bytes
    pub fn size(&mut self) -> Result<u64> {
        self.request(Command::Size)?.into_count()
    }

    /// Server status text (`name\tvalue` lines)
    pub fn stat(&mut self) -> Result<String> {
        let bytes = self.request(Command::Stat)?.into_bytes()?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }

    /// Server status parsed into name/value pairs
    pub fn stat_map(&mut self) -> Result<HashMap<String, String>> {
        let text = self.stat()?;
        Ok(text
            .lines()
            .filter_map(|line| line.split_once('\t'))
            .map(|(name, value)| (name.to_string(), value.to_string()))
            .collect())
    }
}
