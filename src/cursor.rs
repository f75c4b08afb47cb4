//! Iteration Cursor
//!
//! The server keeps one iteration position per connection. [`Handle::keys`]
//! resets it and hands back an iterator that borrows the handle mutably, so
//! no other operation can move the cursor while the iteration is live.

use std::iter::FusedIterator;

use crate::error::Result;
use crate::handle::Handle;
use crate::protocol::Command;

impl Handle {
    /// Reset the server-side cursor to the first key
    pub fn iter_init(&mut self) -> Result<()> {
        self.request(Command::IterInit).map(|_| ())
    }

    /// Advance the cursor; `Ok(None)` once every key has been returned
    pub fn iter_next(&mut self) -> Result<Option<Vec<u8>>> {
        match self.call(&Command::IterNext)? {
            Some(reply) if reply.is_ok() => Ok(Some(reply.body.into_bytes()?)),
            _ => Ok(None),
        }
    }

    /// Iterate over every key in the store
    ///
    /// Each call restarts from the first key. Failing to initialize the
    /// cursor is reported here rather than on the first pull.
    pub fn keys(&mut self) -> Result<Keys<'_>> {
        self.iter_init()?;
        Ok(Keys {
            handle: self,
            finished: false,
        })
    }
}

/// Lazy sequence of keys produced by [`Handle::keys`]
pub struct Keys<'a> {
    handle: &'a mut Handle,
    finished: bool,
}

impl Iterator for Keys<'_> {
    type Item = Result<Vec<u8>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }

        match self.handle.iter_next() {
            Ok(Some(key)) => Some(Ok(key)),
            Ok(None) => {
                self.finished = true;
                None
            }
            Err(e) => {
                self.finished = true;
                Some(Err(e))
            }
        }
    }
}

impl FusedIterator for Keys<'_> {}
