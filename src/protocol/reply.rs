//! Reply definitions
//!
//! Represents the server's answer to a command.

use crate::error::{Result, TyrantError};
use crate::wire::WireList;

use super::CommandType;

/// Status byte for success
pub const STATUS_SUCCESS: u8 = 0x00;

/// Status byte servers send on failure
pub const STATUS_FAILURE: u8 = 0x01;

/// Body layout following a success status
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplyShape {
    /// No reply is sent at all
    None,
    /// Status byte only
    Empty,
    /// size (4) + bytes
    Bytes,
    /// u32 size
    Size,
    /// i32 number
    Int,
    /// integral (8) + fractional (8) trillionths
    Double,
    /// u64 count
    Count,
    /// count (4) + { size (4) + bytes }*
    List,
}

/// Decoded reply body
#[derive(Debug, Clone, PartialEq)]
pub enum Body {
    Empty,
    Bytes(Vec<u8>),
    Size(u32),
    Int(i32),
    Double(f64),
    Count(u64),
    List(WireList),
}

impl Body {
    /// Shape this body is encoded with
    pub fn shape(&self) -> ReplyShape {
        match self {
            Body::Empty => ReplyShape::Empty,
            Body::Bytes(_) => ReplyShape::Bytes,
            Body::Size(_) => ReplyShape::Size,
            Body::Int(_) => ReplyShape::Int,
            Body::Double(_) => ReplyShape::Double,
            Body::Count(_) => ReplyShape::Count,
            Body::List(_) => ReplyShape::List,
        }
    }

    pub fn into_bytes(self) -> Result<Vec<u8>> {
        match self {
            Body::Bytes(bytes) => Ok(bytes),
            other => Err(unexpected("bytes", &other)),
        }
    }

    pub fn into_size(self) -> Result<u32> {
        match self {
            Body::Size(size) => Ok(size),
            other => Err(unexpected("size", &other)),
        }
    }

    pub fn into_int(self) -> Result<i32> {
        match self {
            Body::Int(num) => Ok(num),
            other => Err(unexpected("int", &other)),
        }
    }

    pub fn into_double(self) -> Result<f64> {
        match self {
            Body::Double(num) => Ok(num),
            other => Err(unexpected("double", &other)),
        }
    }

    pub fn into_count(self) -> Result<u64> {
        match self {
            Body::Count(count) => Ok(count),
            other => Err(unexpected("count", &other)),
        }
    }

    pub fn into_list(self) -> Result<WireList> {
        match self {
            Body::List(list) => Ok(list),
            other => Err(unexpected("list", &other)),
        }
    }
}

fn unexpected(expected: &str, body: &Body) -> TyrantError {
    TyrantError::Protocol(format!(
        "expected {} reply body, got {:?}",
        expected,
        body.shape()
    ))
}

/// A reply from the server
#[derive(Debug, Clone, PartialEq)]
pub struct Reply {
    /// Status byte (0 = success)
    pub status: u8,

    /// Body; always `Body::Empty` when status is non-zero
    pub body: Body,
}

impl Reply {
    /// Create a success reply
    pub fn ok(body: Body) -> Self {
        Self {
            status: STATUS_SUCCESS,
            body,
        }
    }

    /// Create a failure reply
    pub fn failure() -> Self {
        Self {
            status: STATUS_FAILURE,
            body: Body::Empty,
        }
    }

    pub fn is_ok(&self) -> bool {
        self.status == STATUS_SUCCESS
    }

    /// Body on success; the command's remote error code otherwise
    pub fn into_result(self, command_type: CommandType) -> Result<Body> {
        if self.is_ok() {
            Ok(self.body)
        } else {
            Err(TyrantError::remote(command_type.failure_code()))
        }
    }
}
