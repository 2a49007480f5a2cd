//! Frame header parsing and frame decoding.
//!
//! A frame is an 8-byte header, one 16-byte LMS state per channel, then
//! slices interleaved by channel: the first slice of every channel, then the
//! second slice of every channel, and so on.

use log::trace;

use crate::error::{read_array, read_u64_be, DecodeError, InvalidFrameReason, StreamParameters};
use crate::lms::{Lms, QOA_LMS_STATE_SIZE};
use crate::slice::{Slice, QOA_SLICE_SIZE};
use crate::{QOA_FRAME_LEN, QOA_SLICE_LEN};

/// Size in bytes of a frame header.
pub const QOA_FRAME_HEADER_SIZE: usize = 8;

/// The metadata at the beginning of each frame of slices.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub struct FrameHeader {
    /// Number of channels in this frame
    pub num_channels: u8,
    /// Sample rate in HZ for this frame
    pub sample_rate: u32,
    /// Samples per channel in this frame
    pub num_samples_per_channel: u16,
    /// Size in bytes of the whole frame, header included
    pub frame_size: u16,
}

impl FrameHeader {
    /// Read the frame header starting at `offset`. No validation is done.
    pub fn parse(buf: &[u8], offset: usize) -> Result<Self, DecodeError> {
        let header = read_u64_be(buf, offset)?;
        Ok(FrameHeader {
            num_channels: ((header >> 56) & 0xff) as u8,
            sample_rate: ((header >> 32) & 0xff_ffff) as u32,
            num_samples_per_channel: ((header >> 16) & 0xffff) as u16,
            frame_size: (header & 0xffff) as u16,
        })
    }

    pub fn parameters(&self) -> StreamParameters {
        StreamParameters {
            num_channels: self.num_channels,
            sample_rate: self.sample_rate,
        }
    }

    pub fn num_slices_per_channel(&self) -> usize {
        (self.num_samples_per_channel as usize).div_ceil(QOA_SLICE_LEN)
    }

    /// Number of bytes the frame occupies according to its channel and sample
    /// counts.
    pub fn layout_size(&self) -> usize {
        let channels = self.num_channels as usize;
        QOA_FRAME_HEADER_SIZE
            + QOA_LMS_STATE_SIZE * channels
            + QOA_SLICE_SIZE * self.num_slices_per_channel() * channels
    }

    pub(crate) fn validate(&self, offset: usize) -> Result<(), DecodeError> {
        let reason = if self.num_channels == 0 {
            InvalidFrameReason::NoChannels
        } else if self.sample_rate == 0 {
            InvalidFrameReason::NoSampleRate
        } else if self.num_samples_per_channel as usize > QOA_FRAME_LEN {
            InvalidFrameReason::TooManySamples(self.num_samples_per_channel)
        } else {
            return Ok(());
        };
        Err(DecodeError::InvalidFrameHeader { offset, reason })
    }
}

/// Decode the frame at `offset` into `dest`.
///
/// `dest` holds `valid_samples` interleaved samples per channel. Samples
/// past `valid_samples` are skipped, so the padding of a final partial slice
/// never reaches the output. `lms` is scratch space and is reloaded from the
/// frame.
///
/// Returns the number of bytes consumed, which always equals the frame size
/// declared in `header`.
pub(crate) fn decode_frame(
    buf: &[u8],
    offset: usize,
    header: &FrameHeader,
    valid_samples: usize,
    lms: &mut Vec<Lms>,
    dest: &mut [i16],
) -> Result<usize, DecodeError> {
    let channels = header.num_channels as usize;
    debug_assert_eq!(dest.len(), valid_samples * channels);
    let mut cursor = offset + QOA_FRAME_HEADER_SIZE;

    lms.clear();
    for channel in 0..channels {
        let state = Lms::from_be_bytes(read_array(buf, cursor)?);
        trace!(
            "channel {} lms history={:?} weights={:?}",
            channel,
            state.history(),
            state.weights()
        );
        lms.push(state);
        cursor += QOA_LMS_STATE_SIZE;
    }

    let num_samples = header.num_samples_per_channel as usize;
    for sample_index in (0..num_samples).step_by(QOA_SLICE_LEN) {
        let slice_len = valid_samples.saturating_sub(sample_index).min(QOA_SLICE_LEN);
        for (channel, lms) in lms.iter_mut().enumerate() {
            let slice = Slice::from_be_bytes(read_array(buf, cursor)?);
            for (k, sample) in slice.decode(lms).take(slice_len).enumerate() {
                let sample = sample.map_err(|source| DecodeError::ArithmeticOverflow {
                    offset: cursor,
                    source,
                })?;
                dest[(sample_index + k) * channels + channel] = sample;
            }
            cursor += QOA_SLICE_SIZE;
        }
    }

    let consumed = cursor - offset;
    if consumed != header.frame_size as usize {
        return Err(DecodeError::FrameSizeMismatch {
            offset,
            declared: header.frame_size as usize,
            consumed,
        });
    }
    Ok(consumed)
}
