//! Protocol codec
//!
//! Encoding and decoding functions for the wire protocol.
//!
//! ### Request bodies (after magic + opcode)
//! - put/putkeep/putcat/putnr: ksiz (4) + vsiz (4) + key + value
//! - putshl:    ksiz (4) + vsiz (4) + width (4) + key + value
//! - out/get/vsiz: ksiz (4) + key
//! - fwmkeys:   psiz (4) + max (4) + prefix
//! - addint:    ksiz (4) + num (4) + key
//! - adddouble: ksiz (4) + integ (8) + fract (8) + key
//! - ext:       nsiz (4) + opts (4) + ksiz (4) + vsiz (4) + name + key + value
//! - optimize/copy: size (4) + bytes
//! - restore:   psiz (4) + ts (8) + opts (4) + path
//! - setmst:    hsiz (4) + port (4) + ts (8) + opts (4) + host
//! - misc:      nsiz (4) + opts (4) + rnum (4) + name + { esiz (4) + elem }*
//! - everything else: empty

use std::io::{self, Read, Write};

use bytes::BufMut;

use crate::error::{ErrorCode, Result, TyrantError};
use crate::wire::WireList;

use super::{Body, Command, CommandType, Reply, ReplyShape, MAGIC, STATUS_SUCCESS};

/// Maximum size of any single length-prefixed field (256 MB)
pub const MAX_PAYLOAD_SIZE: u32 = 256 * 1024 * 1024;

/// Doubles travel as integral part plus fractional trillionths
const DOUBLE_FRACTION: f64 = 1_000_000_000_000.0;

/// Upper bound on list capacity reserved before elements arrive
const MAX_PREALLOC_ELEMENTS: usize = 1024;

/// Upper bound on field capacity reserved before bytes arrive
const MAX_PREALLOC_BYTES: usize = 64 * 1024;

// =============================================================================
// Command Encoding/Decoding
// =============================================================================

/// Encode a command to bytes
///
/// Fails with `InvalidArgument` if any field is longer than
/// `MAX_PAYLOAD_SIZE`, before anything is written.
pub fn encode_command(command: &Command) -> Result<Vec<u8>> {
    let mut buf = Vec::with_capacity(64);
    buf.put_u8(MAGIC);
    buf.put_u8(command.command_type() as u8);

    match command {
        Command::Put { key, value }
        | Command::PutKeep { key, value }
        | Command::PutCat { key, value }
        | Command::PutNr { key, value } => {
            buf.put_u32(field_len(key.len())?);
            buf.put_u32(field_len(value.len())?);
            buf.put_slice(key);
            buf.put_slice(value);
        }
        Command::PutShl { key, value, width } => {
            buf.put_u32(field_len(key.len())?);
            buf.put_u32(field_len(value.len())?);
            buf.put_u32(*width);
            buf.put_slice(key);
            buf.put_slice(value);
        }
        Command::Out { key } | Command::Get { key } | Command::Vsiz { key } => {
            buf.put_u32(field_len(key.len())?);
            buf.put_slice(key);
        }
        Command::FwmKeys { prefix, max } => {
            buf.put_u32(field_len(prefix.len())?);
            buf.put_i32(*max);
            buf.put_slice(prefix);
        }
        Command::AddInt { key, num } => {
            buf.put_u32(field_len(key.len())?);
            buf.put_i32(*num);
            buf.put_slice(key);
        }
        Command::AddDouble { key, num } => {
            let (integ, fract) = split_double(*num);
            buf.put_u32(field_len(key.len())?);
            buf.put_i64(integ);
            buf.put_i64(fract);
            buf.put_slice(key);
        }
        Command::Ext {
            name,
            options,
            key,
            value,
        } => {
            buf.put_u32(field_len(name.len())?);
            buf.put_u32(*options);
            buf.put_u32(field_len(key.len())?);
            buf.put_u32(field_len(value.len())?);
            buf.put_slice(name);
            buf.put_slice(key);
            buf.put_slice(value);
        }
        Command::Optimize { params: bytes } | Command::Copy { path: bytes } => {
            buf.put_u32(field_len(bytes.len())?);
            buf.put_slice(bytes);
        }
        Command::Restore {
            path,
            timestamp,
            options,
        } => {
            buf.put_u32(field_len(path.len())?);
            buf.put_u64(*timestamp);
            buf.put_u32(*options);
            buf.put_slice(path);
        }
        Command::SetMaster {
            host,
            port,
            timestamp,
            options,
        } => {
            buf.put_u32(field_len(host.len())?);
            buf.put_u32(*port);
            buf.put_u64(*timestamp);
            buf.put_u32(*options);
            buf.put_slice(host);
        }
        Command::Misc {
            name,
            options,
            args,
        } => {
            buf.put_u32(field_len(name.len())?);
            buf.put_u32(*options);
            buf.put_u32(field_len(args.len())?);
            buf.put_slice(name);
            for element in args.iter() {
                field_len(element.len())?;
            }
            put_elements(&mut buf, args);
        }
        Command::IterInit
        | Command::IterNext
        | Command::Sync
        | Command::Vanish
        | Command::Rnum
        | Command::Size
        | Command::Stat => {}
    }

    Ok(buf)
}

/// Decode a command from bytes
pub fn decode_command(bytes: &[u8]) -> Result<Command> {
    let mut reader = FrameReader::new(bytes);
    parse_command(&mut reader).map_err(incomplete)
}

fn parse_command<R: Read>(reader: &mut FrameReader<R>) -> Result<Command> {
    let magic = reader.u8()?;
    if magic != MAGIC {
        return Err(TyrantError::Protocol(format!(
            "Bad magic byte: 0x{:02x}",
            magic
        )));
    }

    let op = reader.u8()?;
    let command_type = CommandType::from_u8(op)
        .ok_or_else(|| TyrantError::Protocol(format!("Unknown command type: 0x{:02x}", op)))?;

    let command = match command_type {
        CommandType::Put | CommandType::PutKeep | CommandType::PutCat | CommandType::PutNr => {
            let ksiz = reader.len()?;
            let vsiz = reader.len()?;
            let key = reader.bytes(ksiz)?;
            let value = reader.bytes(vsiz)?;
            match command_type {
                CommandType::Put => Command::Put { key, value },
                CommandType::PutKeep => Command::PutKeep { key, value },
                CommandType::PutCat => Command::PutCat { key, value },
                _ => Command::PutNr { key, value },
            }
        }
        CommandType::PutShl => {
            let ksiz = reader.len()?;
            let vsiz = reader.len()?;
            let width = reader.u32()?;
            Command::PutShl {
                key: reader.bytes(ksiz)?,
                value: reader.bytes(vsiz)?,
                width,
            }
        }
        CommandType::Out | CommandType::Get | CommandType::Vsiz => {
            let key = reader.sized_bytes()?;
            match command_type {
                CommandType::Out => Command::Out { key },
                CommandType::Get => Command::Get { key },
                _ => Command::Vsiz { key },
            }
        }
        CommandType::FwmKeys => {
            let psiz = reader.len()?;
            let max = reader.i32()?;
            Command::FwmKeys {
                prefix: reader.bytes(psiz)?,
                max,
            }
        }
        CommandType::AddInt => {
            let ksiz = reader.len()?;
            let num = reader.i32()?;
            Command::AddInt {
                key: reader.bytes(ksiz)?,
                num,
            }
        }
        CommandType::AddDouble => {
            let ksiz = reader.len()?;
            let integ = reader.i64()?;
            let fract = reader.i64()?;
            Command::AddDouble {
                key: reader.bytes(ksiz)?,
                num: join_double(integ, fract),
            }
        }
        CommandType::Ext => {
            let nsiz = reader.len()?;
            let options = reader.u32()?;
            let ksiz = reader.len()?;
            let vsiz = reader.len()?;
            Command::Ext {
                name: reader.bytes(nsiz)?,
                options,
                key: reader.bytes(ksiz)?,
                value: reader.bytes(vsiz)?,
            }
        }
        CommandType::Optimize => Command::Optimize {
            params: reader.sized_bytes()?,
        },
        CommandType::Copy => Command::Copy {
            path: reader.sized_bytes()?,
        },
        CommandType::Restore => {
            let psiz = reader.len()?;
            let timestamp = reader.u64()?;
            let options = reader.u32()?;
            Command::Restore {
                path: reader.bytes(psiz)?,
                timestamp,
                options,
            }
        }
        CommandType::SetMaster => {
            let hsiz = reader.len()?;
            let port = reader.u32()?;
            let timestamp = reader.u64()?;
            let options = reader.u32()?;
            Command::SetMaster {
                host: reader.bytes(hsiz)?,
                port,
                timestamp,
                options,
            }
        }
        CommandType::Misc => {
            let nsiz = reader.len()?;
            let options = reader.u32()?;
            let rnum = reader.len()?;
            let name = reader.bytes(nsiz)?;
            Command::Misc {
                name,
                options,
                args: reader.elements(rnum)?,
            }
        }
        CommandType::IterInit => Command::IterInit,
        CommandType::IterNext => Command::IterNext,
        CommandType::Sync => Command::Sync,
        CommandType::Vanish => Command::Vanish,
        CommandType::Rnum => Command::Rnum,
        CommandType::Size => Command::Size,
        CommandType::Stat => Command::Stat,
    };

    Ok(command)
}

// =============================================================================
// Reply Encoding/Decoding
// =============================================================================

/// Encode a reply to bytes
///
/// Failure replies carry only the status byte.
pub fn encode_reply(reply: &Reply) -> Vec<u8> {
    let mut buf = Vec::with_capacity(16);
    buf.put_u8(reply.status);
    if reply.status != STATUS_SUCCESS {
        return buf;
    }

    match &reply.body {
        Body::Empty => {}
        Body::Bytes(bytes) => {
            buf.put_u32(bytes.len() as u32);
            buf.put_slice(bytes);
        }
        Body::Size(size) => buf.put_u32(*size),
        Body::Int(num) => buf.put_i32(*num),
        Body::Double(num) => {
            let (integ, fract) = split_double(*num);
            buf.put_i64(integ);
            buf.put_i64(fract);
        }
        Body::Count(count) => buf.put_u64(*count),
        Body::List(list) => {
            buf.put_u32(list.len() as u32);
            put_elements(&mut buf, list);
        }
    }

    buf
}

/// Decode the reply to a command of the given type
pub fn decode_reply(bytes: &[u8], command_type: CommandType) -> Result<Reply> {
    let mut reader = FrameReader::new(bytes);
    parse_reply(&mut reader, command_type.reply_shape()).map_err(incomplete)
}

fn parse_reply<R: Read>(reader: &mut FrameReader<R>, shape: ReplyShape) -> Result<Reply> {
    if shape == ReplyShape::None {
        return Err(TyrantError::Protocol(
            "command does not produce a reply".to_string(),
        ));
    }

    let status = reader.u8()?;
    if status != STATUS_SUCCESS {
        return Ok(Reply {
            status,
            body: Body::Empty,
        });
    }

    let body = match shape {
        ReplyShape::None | ReplyShape::Empty => Body::Empty,
        ReplyShape::Bytes => Body::Bytes(reader.sized_bytes()?),
        ReplyShape::Size => Body::Size(reader.u32()?),
        ReplyShape::Int => Body::Int(reader.i32()?),
        ReplyShape::Double => {
            let integ = reader.i64()?;
            let fract = reader.i64()?;
            Body::Double(join_double(integ, fract))
        }
        ReplyShape::Count => Body::Count(reader.u64()?),
        ReplyShape::List => {
            let count = reader.len()?;
            Body::List(reader.elements(count)?)
        }
    };

    Ok(Reply::ok(body))
}

// =============================================================================
// Stream-based I/O helpers
// =============================================================================

/// Read a complete command from a stream
///
/// Blocks until a complete command is received or an error occurs
pub fn read_command<R: Read>(reader: &mut R) -> Result<Command> {
    parse_command(&mut FrameReader::new(reader))
}

/// Write a command to a stream
pub fn write_command<W: Write>(writer: &mut W, command: &Command) -> Result<()> {
    let bytes = encode_command(command)?;
    send(writer, &bytes)
}

/// Read the reply to a command of the given type from a stream
pub fn read_reply<R: Read>(reader: &mut R, command_type: CommandType) -> Result<Reply> {
    parse_reply(&mut FrameReader::new(reader), command_type.reply_shape())
}

/// Write a reply to a stream
pub fn write_reply<W: Write>(writer: &mut W, reply: &Reply) -> Result<()> {
    let bytes = encode_reply(reply);
    send(writer, &bytes)
}

fn send<W: Write>(writer: &mut W, bytes: &[u8]) -> Result<()> {
    writer
        .write_all(bytes)
        .and_then(|_| writer.flush())
        .map_err(|e| TyrantError::transport(ErrorCode::Send, e))
}

// =============================================================================
// Field helpers
// =============================================================================

/// Length prefix for an outgoing field
fn field_len(len: usize) -> Result<u32> {
    match u32::try_from(len) {
        Ok(len) if len <= MAX_PAYLOAD_SIZE => Ok(len),
        _ => Err(TyrantError::InvalidArgument(format!(
            "Field too large: {} bytes (max {})",
            len, MAX_PAYLOAD_SIZE
        ))),
    }
}

fn put_elements(buf: &mut Vec<u8>, list: &WireList) {
    for element in list.iter() {
        buf.put_u32(element.len() as u32);
        buf.put_slice(element);
    }
}

fn split_double(num: f64) -> (i64, i64) {
    let integ = num.trunc();
    let fract = (num - integ) * DOUBLE_FRACTION;
    (integ as i64, fract.round() as i64)
}

fn join_double(integ: i64, fract: i64) -> f64 {
    integ as f64 + fract as f64 / DOUBLE_FRACTION
}

/// Running out of input on an in-memory buffer is a framing problem
fn incomplete(err: TyrantError) -> TyrantError {
    match err {
        TyrantError::Transport { source, .. } if source.kind() == io::ErrorKind::UnexpectedEof => {
            TyrantError::Protocol("Incomplete frame".to_string())
        }
        other => other,
    }
}

/// Big-endian field reader over any byte source
struct FrameReader<R> {
    inner: R,
}

impl<R: Read> FrameReader<R> {
    fn new(inner: R) -> Self {
        Self { inner }
    }

    fn fill<const N: usize>(&mut self) -> Result<[u8; N]> {
        let mut buf = [0u8; N];
        self.inner
            .read_exact(&mut buf)
            .map_err(|e| TyrantError::transport(ErrorCode::Recv, e))?;
        Ok(buf)
    }

    fn u8(&mut self) -> Result<u8> {
        Ok(self.fill::<1>()?[0])
    }

    fn u32(&mut self) -> Result<u32> {
        Ok(u32::from_be_bytes(self.fill()?))
    }

    fn i32(&mut self) -> Result<i32> {
        Ok(i32::from_be_bytes(self.fill()?))
    }

    fn u64(&mut self) -> Result<u64> {
        Ok(u64::from_be_bytes(self.fill()?))
    }

    fn i64(&mut self) -> Result<i64> {
        Ok(i64::from_be_bytes(self.fill()?))
    }

    /// Length or count field, validated against `MAX_PAYLOAD_SIZE`
    fn len(&mut self) -> Result<usize> {
        let len = self.u32()?;
        if len > MAX_PAYLOAD_SIZE {
            return Err(TyrantError::Protocol(format!(
                "Field too large: {} bytes (max {})",
                len, MAX_PAYLOAD_SIZE
            )));
        }
        Ok(len as usize)
    }

    /// Read `len` bytes; the buffer grows with the data actually received
    fn bytes(&mut self, len: usize) -> Result<Vec<u8>> {
        let mut buf = Vec::with_capacity(len.min(MAX_PREALLOC_BYTES));
        (&mut self.inner)
            .take(len as u64)
            .read_to_end(&mut buf)
            .map_err(|e| TyrantError::transport(ErrorCode::Recv, e))?;
        if buf.len() < len {
            return Err(TyrantError::transport(
                ErrorCode::Recv,
                io::Error::from(io::ErrorKind::UnexpectedEof),
            ));
        }
        Ok(buf)
    }

    fn sized_bytes(&mut self) -> Result<Vec<u8>> {
        let len = self.len()?;
        self.bytes(len)
    }

    fn elements(&mut self, count: usize) -> Result<WireList> {
        let mut list = WireList::with_capacity(count.min(MAX_PREALLOC_ELEMENTS));
        for _ in 0..count {
            list.push(self.sized_bytes()?);
        }
        Ok(list)
    }
}
