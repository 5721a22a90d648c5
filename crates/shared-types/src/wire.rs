//! # Wire Codec
//!
//! Length-prefixed binary encoding used at the mempool boundary.
//!
//! ## Length prefix (two regimes)
//!
//! Existing peers expect this exact prefix, so it is preserved verbatim:
//!
//! - lengths `0..=127`: a single byte holding the length;
//! - larger lengths: `0x80 | n` where `n` is the byte-length of the
//!   length, followed by the length value big-endian in `n` bytes.
//!
//! ## Per-type codecs
//!
//! Every message type gets explicit `encode_*`/`decode_*` functions that
//! write and read fields in a fixed order. There is deliberately no
//! generic struct-walking marshaller here.

use crate::entities::{PriorityClass, TransactionRecord, U256};
use thiserror::Error;

/// Wire codec errors.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum WireError {
    /// Input ended before the announced length was read.
    #[error("unexpected end of input at offset {offset}")]
    UnexpectedEof { offset: usize },

    /// Length prefix announces a length wider than usize.
    #[error("length prefix of {width} bytes exceeds supported width")]
    LengthTooWide { width: usize },

    /// Unknown priority class byte.
    #[error("invalid priority class byte: {0}")]
    InvalidPriority(u8),

    /// Input not fully consumed by the decoder.
    #[error("{0} trailing bytes after message")]
    TrailingBytes(usize),
}

/// Appends the two-regime length prefix for `len` to `buf`.
pub fn write_length(buf: &mut Vec<u8>, len: usize) {
    if len <= 127 {
        buf.push(len as u8);
        return;
    }
    let be = len.to_be_bytes();
    let skip = be.iter().take_while(|b| **b == 0).count();
    let width = be.len() - skip;
    buf.push(0x80 | width as u8);
    buf.extend_from_slice(&be[skip..]);
}

/// Reads a length prefix from `input` starting at `*offset`, advancing it.
pub fn read_length(input: &[u8], offset: &mut usize) -> Result<usize, WireError> {
    let first = *input
        .get(*offset)
        .ok_or(WireError::UnexpectedEof { offset: *offset })?;
    *offset += 1;

    if first & 0x80 == 0 {
        return Ok(first as usize);
    }

    let width = (first & 0x7F) as usize;
    if width > std::mem::size_of::<usize>() {
        return Err(WireError::LengthTooWide { width });
    }
    if input.len() < *offset + width {
        return Err(WireError::UnexpectedEof { offset: input.len() });
    }
    let mut len = 0usize;
    for b in &input[*offset..*offset + width] {
        len = (len << 8) | *b as usize;
    }
    *offset += width;
    Ok(len)
}

/// Appends a length-prefixed blob to `buf`.
pub fn write_blob(buf: &mut Vec<u8>, blob: &[u8]) {
    write_length(buf, blob.len());
    buf.extend_from_slice(blob);
}

/// Reads a length-prefixed blob, advancing `*offset`.
pub fn read_blob(input: &[u8], offset: &mut usize) -> Result<Vec<u8>, WireError> {
    let len = read_length(input, offset)?;
    if input.len() < *offset + len {
        return Err(WireError::UnexpectedEof { offset: input.len() });
    }
    let blob = input[*offset..*offset + len].to_vec();
    *offset += len;
    Ok(blob)
}

fn read_array<const N: usize>(input: &[u8], offset: &mut usize) -> Result<[u8; N], WireError> {
    if input.len() < *offset + N {
        return Err(WireError::UnexpectedEof { offset: input.len() });
    }
    let mut out = [0u8; N];
    out.copy_from_slice(&input[*offset..*offset + N]);
    *offset += N;
    Ok(out)
}

/// Encodes a [`TransactionRecord`] field by field.
///
/// Layout: hash (32) | sender_key (32) | priority (1) | fee (32, BE) |
/// submitted_at (8, BE) | flags (1: used, sent, verified) | payload (blob).
pub fn encode_transaction(tx: &TransactionRecord) -> Vec<u8> {
    let mut buf = Vec::with_capacity(110 + tx.payload.len());
    buf.extend_from_slice(&tx.hash);
    buf.extend_from_slice(&tx.sender_key);
    buf.push(tx.priority as u8);
    let mut fee = [0u8; 32];
    tx.fee.to_big_endian(&mut fee);
    buf.extend_from_slice(&fee);
    buf.extend_from_slice(&tx.submitted_at.to_be_bytes());
    let flags =
        (tx.used as u8) | ((tx.sent as u8) << 1) | ((tx.verified as u8) << 2);
    buf.push(flags);
    write_blob(&mut buf, &tx.payload);
    buf
}

/// Decodes a [`TransactionRecord`], rejecting trailing garbage.
pub fn decode_transaction(input: &[u8]) -> Result<TransactionRecord, WireError> {
    let mut offset = 0usize;

    let hash = read_array::<32>(input, &mut offset)?;
    let sender_key = read_array::<32>(input, &mut offset)?;

    let priority_byte = *input
        .get(offset)
        .ok_or(WireError::UnexpectedEof { offset })?;
    offset += 1;
    let priority =
        PriorityClass::from_wire(priority_byte).ok_or(WireError::InvalidPriority(priority_byte))?;

    let fee = U256::from_big_endian(&read_array::<32>(input, &mut offset)?);
    let submitted_at = u64::from_be_bytes(read_array::<8>(input, &mut offset)?);

    let flags = *input
        .get(offset)
        .ok_or(WireError::UnexpectedEof { offset })?;
    offset += 1;

    let payload = read_blob(input, &mut offset)?;

    if offset != input.len() {
        return Err(WireError::TrailingBytes(input.len() - offset));
    }

    Ok(TransactionRecord {
        hash,
        payload,
        priority,
        fee,
        submitted_at,
        sender_key,
        used: flags & 0b001 != 0,
        sent: flags & 0b010 != 0,
        verified: flags & 0b100 != 0,
    })
}
