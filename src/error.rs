//! Errors reported while decoding a QOA stream.
//!
//! Every error is fatal for the decode call that produced it. Each kind
//! carries the byte offset into the input where the problem was detected.

use crate::lms::LmsOverflow;

/// Stream parameters that must stay the same across frames.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct StreamParameters {
    /// Number of channels.
    pub num_channels: u8,
    /// Sample rate in HZ.
    pub sample_rate: u32,
}

/// Reason a frame header was rejected before any slice was read.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum InvalidFrameReason {
    /// The header declares zero channels.
    NoChannels,
    /// The header declares a sample rate of 0 HZ.
    NoSampleRate,
    /// The header declares more samples per channel than fit in a frame.
    TooManySamples(u16),
}

/// Errors that can occur during QOA decoding.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum DecodeError {
    /// The input does not start with the `qoaf` magic.
    #[error("not a qoa stream: expected magic \"qoaf\", found {found:02x?}")]
    BadMagic { found: Vec<u8> },

    /// The input ended before a header, LMS state or slice could be read.
    #[error("stream truncated at byte {offset}: needed {needed} bytes, {available} available")]
    TruncatedStream {
        offset: usize,
        needed: usize,
        available: usize,
    },

    /// Channel count or sample rate changed between frames.
    #[error("frame at byte {offset} has parameters {found:?}, stream was declared as {expected:?}")]
    InconsistentStreamParameters {
        offset: usize,
        expected: StreamParameters,
        found: StreamParameters,
    },

    /// The frame consumed a different number of bytes than its header declares.
    #[error("frame at byte {offset} declares {declared} bytes but decoding consumed {consumed}")]
    FrameSizeMismatch {
        offset: usize,
        declared: usize,
        consumed: usize,
    },

    /// The LMS filter left its signed range while decoding a slice.
    #[error("arithmetic overflow in slice at byte {offset}: {source}")]
    ArithmeticOverflow {
        offset: usize,
        #[source]
        source: LmsOverflow,
    },

    /// The frame header is structurally invalid.
    #[error("invalid frame header at byte {offset}: {reason:?}")]
    InvalidFrameHeader {
        offset: usize,
        reason: InvalidFrameReason,
    },
}

impl DecodeError {
    /// Byte offset into the input where the error was detected.
    pub fn offset(&self) -> usize {
        match self {
            DecodeError::BadMagic { .. } => 0,
            DecodeError::TruncatedStream { offset, .. }
            | DecodeError::InconsistentStreamParameters { offset, .. }
            | DecodeError::FrameSizeMismatch { offset, .. }
            | DecodeError::ArithmeticOverflow { offset, .. }
            | DecodeError::InvalidFrameHeader { offset, .. } => *offset,
        }
    }
}

/// Borrow `len` bytes of `buf` starting at `offset`, or report truncation.
pub(crate) fn read_bytes(buf: &[u8], offset: usize, len: usize) -> Result<&[u8], DecodeError> {
    match offset.checked_add(len) {
        Some(end) if end <= buf.len() => Ok(&buf[offset..end]),
        _ => Err(DecodeError::TruncatedStream {
            offset,
            needed: len,
            available: buf.len().saturating_sub(offset),
        }),
    }
}

pub(crate) fn read_array<const LEN: usize>(
    buf: &[u8],
    offset: usize,
) -> Result<[u8; LEN], DecodeError> {
    let mut bytes = [0_u8; LEN];
    bytes.copy_from_slice(read_bytes(buf, offset, LEN)?);
    Ok(bytes)
}

pub(crate) fn read_u32_be(buf: &[u8], offset: usize) -> Result<u32, DecodeError> {
    Ok(u32::from_be_bytes(read_array(buf, offset)?))
}

pub(crate) fn read_u64_be(buf: &[u8], offset: usize) -> Result<u64, DecodeError> {
    Ok(u64::from_be_bytes(read_array(buf, offset)?))
}
