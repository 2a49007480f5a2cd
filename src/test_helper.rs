//! Helpers for assembling raw QOA byte streams in tests.
//!
//! Slices are written as given; nothing here quantizes audio.

use crate::frame::FrameHeader;
use crate::lms::Lms;
use crate::{QOA_MAGIC, QOA_SLICES_PER_FRAME, QOA_SLICE_LEN};

/// Pack a scale factor index and 20 residual codes into a slice.
pub fn slice_of(sf_index: u64, codes: [u64; QOA_SLICE_LEN]) -> u64 {
    codes
        .iter()
        .fold(sf_index & 0xf, |slice, &code| (slice << 3) | (code & 0x7))
}

/// A slice that decodes to all-ones under a zero filter.
pub fn ones_slice() -> u64 {
    slice_of(0, [0; QOA_SLICE_LEN])
}

/// Serialize one frame. `slices` are in stream order (slice 0 of every
/// channel, then slice 1 of every channel, ...). The frame size field is
/// computed from the layout unless `frame_size` overrides it.
pub fn frame_bytes(
    num_channels: u8,
    sample_rate: u32,
    num_samples_per_channel: u16,
    lms: &[Lms],
    slices: &[u64],
    frame_size: Option<u16>,
) -> Vec<u8> {
    let layout = FrameHeader {
        num_channels,
        sample_rate,
        num_samples_per_channel,
        frame_size: 0,
    }
    .layout_size();
    let frame_size = frame_size.unwrap_or(layout as u16);

    let mut bytes = Vec::with_capacity(layout);
    let header = (u64::from(num_channels) << 56)
        | (u64::from(sample_rate & 0xff_ffff) << 32)
        | (u64::from(num_samples_per_channel) << 16)
        | u64::from(frame_size);
    bytes.extend_from_slice(&header.to_be_bytes());
    for state in lms {
        for h in state.history() {
            bytes.extend_from_slice(&h.to_be_bytes());
        }
        for w in state.weights() {
            bytes.extend_from_slice(&w.to_be_bytes());
        }
    }
    for slice in slices {
        bytes.extend_from_slice(&slice.to_be_bytes());
    }
    bytes
}

/// Builder for a complete stream: file header followed by frames.
pub struct StreamBuilder {
    bytes: Vec<u8>,
}

impl StreamBuilder {
    pub fn new(total_samples: u32) -> Self {
        let mut bytes = Vec::new();
        bytes.extend_from_slice(&QOA_MAGIC.to_be_bytes());
        bytes.extend_from_slice(&total_samples.to_be_bytes());
        Self { bytes }
    }

    pub fn raw(mut self, data: &[u8]) -> Self {
        self.bytes.extend_from_slice(data);
        self
    }

    /// Append a frame where every channel repeats `slice` and starts from a
    /// zero filter.
    pub fn uniform_frame(
        self,
        num_channels: u8,
        sample_rate: u32,
        num_samples_per_channel: u16,
        slice: u64,
    ) -> Self {
        let header = FrameHeader {
            num_channels,
            sample_rate,
            num_samples_per_channel,
            frame_size: 0,
        };
        let lms = vec![Lms::default(); num_channels as usize];
        let slices = vec![slice; header.num_slices_per_channel() * num_channels as usize];
        let frame = frame_bytes(
            num_channels,
            sample_rate,
            num_samples_per_channel,
            &lms,
            &slices,
            None,
        );
        self.raw(&frame)
    }

    pub fn build(self) -> Vec<u8> {
        self.bytes
    }
}

/// A fixed-size stream of `total_samples` per channel, split into full
/// frames, where every sample decodes to 1.
pub fn ones_stream(num_channels: u8, sample_rate: u32, total_samples: u32) -> Vec<u8> {
    let frame_len = (QOA_SLICES_PER_FRAME * QOA_SLICE_LEN) as u32;
    let mut builder = StreamBuilder::new(total_samples);
    let mut remaining = total_samples;
    while remaining > 0 {
        let frame_samples = remaining.min(frame_len);
        builder = builder.uniform_frame(num_channels, sample_rate, frame_samples as u16, ones_slice());
        remaining -= frame_samples;
    }
    builder.build()
}
