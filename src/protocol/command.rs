//! Command definitions
//!
//! One variant per remote operation the client issues.

use crate::error::ErrorCode;
use crate::wire::WireList;

use super::ReplyShape;

/// First byte of every request
pub const MAGIC: u8 = 0xC8;

/// Command opcodes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum CommandType {
    Put = 0x10,
    PutKeep = 0x11,
    PutCat = 0x12,
    PutShl = 0x13,
    PutNr = 0x18,
    Out = 0x20,
    Get = 0x30,
    Vsiz = 0x38,
    IterInit = 0x50,
    IterNext = 0x51,
    FwmKeys = 0x58,
    AddInt = 0x60,
    AddDouble = 0x61,
    Ext = 0x68,
    Sync = 0x70,
    Optimize = 0x71,
    Vanish = 0x72,
    Copy = 0x73,
    Restore = 0x74,
    SetMaster = 0x78,
    Rnum = 0x80,
    Size = 0x81,
    Stat = 0x88,
    Misc = 0x90,
}

impl CommandType {
    /// Resolve an opcode byte
    pub fn from_u8(op: u8) -> Option<Self> {
        let command_type = match op {
            0x10 => CommandType::Put,
            0x11 => CommandType::PutKeep,
            0x12 => CommandType::PutCat,
            0x13 => CommandType::PutShl,
            0x18 => CommandType::PutNr,
            0x20 => CommandType::Out,
            0x30 => CommandType::Get,
            0x38 => CommandType::Vsiz,
            0x50 => CommandType::IterInit,
            0x51 => CommandType::IterNext,
            0x58 => CommandType::FwmKeys,
            0x60 => CommandType::AddInt,
            0x61 => CommandType::AddDouble,
            0x68 => CommandType::Ext,
            0x70 => CommandType::Sync,
            0x71 => CommandType::Optimize,
            0x72 => CommandType::Vanish,
            0x73 => CommandType::Copy,
            0x74 => CommandType::Restore,
            0x78 => CommandType::SetMaster,
            0x80 => CommandType::Rnum,
            0x81 => CommandType::Size,
            0x88 => CommandType::Stat,
            0x90 => CommandType::Misc,
            _ => return None,
        };
        Some(command_type)
    }

    /// Layout of the body that follows a success status
    pub fn reply_shape(self) -> ReplyShape {
        match self {
            CommandType::PutNr => ReplyShape::None,
            CommandType::Get | CommandType::IterNext | CommandType::Ext | CommandType::Stat => {
                ReplyShape::Bytes
            }
            CommandType::Vsiz => ReplyShape::Size,
            CommandType::FwmKeys | CommandType::Misc => ReplyShape::List,
            CommandType::AddInt => ReplyShape::Int,
            CommandType::AddDouble => ReplyShape::Double,
            CommandType::Rnum | CommandType::Size => ReplyShape::Count,
            _ => ReplyShape::Empty,
        }
    }

    /// Error code a failure status stands for on this command
    pub fn failure_code(self) -> ErrorCode {
        match self {
            CommandType::PutKeep => ErrorCode::Keep,
            CommandType::Out | CommandType::Get | CommandType::Vsiz => ErrorCode::NoRecord,
            _ => ErrorCode::Misc,
        }
    }

    /// Whether executing the request twice leaves the store as executing it once
    pub fn is_idempotent(self) -> bool {
        matches!(
            self,
            CommandType::Get
                | CommandType::Vsiz
                | CommandType::IterInit
                | CommandType::FwmKeys
                | CommandType::Rnum
                | CommandType::Size
                | CommandType::Stat
        )
    }

    /// Whether the request may be resent after a transport failure with `code`
    ///
    /// A failed send never delivered a complete frame, so anything may be
    /// resent. A failed receive may follow a request the server already
    /// applied, so only idempotent requests are resent.
    pub fn is_retryable(self, code: ErrorCode) -> bool {
        match code {
            ErrorCode::Send => true,
            ErrorCode::Recv => self.is_idempotent(),
            _ => false,
        }
    }
}

/// A request to the store
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Put { key: Vec<u8>, value: Vec<u8> },
    PutKeep { key: Vec<u8>, value: Vec<u8> },
    PutCat { key: Vec<u8>, value: Vec<u8> },
    PutShl { key: Vec<u8>, value: Vec<u8>, width: u32 },
    PutNr { key: Vec<u8>, value: Vec<u8> },
    Out { key: Vec<u8> },
    Get { key: Vec<u8> },
    Vsiz { key: Vec<u8> },
    IterInit,
    IterNext,

    /// Keys starting with `prefix`; negative `max` means unbounded
    FwmKeys { prefix: Vec<u8>, max: i32 },
    AddInt { key: Vec<u8>, num: i32 },
    AddDouble { key: Vec<u8>, num: f64 },

    /// Call a server-side extension function
    Ext {
        name: Vec<u8>,
        options: u32,
        key: Vec<u8>,
        value: Vec<u8>,
    },
    Sync,
    Optimize { params: Vec<u8> },
    Vanish,
    Copy { path: Vec<u8> },
    Restore {
        path: Vec<u8>,
        timestamp: u64,
        options: u32,
    },
    SetMaster {
        host: Vec<u8>,
        port: u32,
        timestamp: u64,
        options: u32,
    },
    Rnum,
    Size,
    Stat,

    /// Generic named procedure carrying a wire list
    Misc {
        name: Vec<u8>,
        options: u32,
        args: WireList,
    },
}

impl Command {
    /// Get the command type
    pub fn command_type(&self) -> CommandType {
        match self {
            Command::Put { .. } => CommandType::Put,
            Command::PutKeep { .. } => CommandType::PutKeep,
            Command::PutCat { .. } => CommandType::PutCat,
            Command::PutShl { .. } => CommandType::PutShl,
            Command::PutNr { .. } => CommandType::PutNr,
            Command::Out { .. } => CommandType::Out,
            Command::Get { .. } => CommandType::Get,
            Command::Vsiz { .. } => CommandType::Vsiz,
            Command::IterInit => CommandType::IterInit,
            Command::IterNext => CommandType::IterNext,
            Command::FwmKeys { .. } => CommandType::FwmKeys,
            Command::AddInt { .. } => CommandType::AddInt,
            Command::AddDouble { .. } => CommandType::AddDouble,
            Command::Ext { .. } => CommandType::Ext,
            Command::Sync => CommandType::Sync,
            Command::Optimize { .. } => CommandType::Optimize,
            Command::Vanish => CommandType::Vanish,
            Command::Copy { .. } => CommandType::Copy,
            Command::Restore { .. } => CommandType::Restore,
            Command::SetMaster { .. } => CommandType::SetMaster,
            Command::Rnum => CommandType::Rnum,
            Command::Size => CommandType::Size,
            Command::Stat => CommandType::Stat,
            Command::Misc { .. } => CommandType::Misc,
        }
    }
}
