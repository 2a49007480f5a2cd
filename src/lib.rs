#![forbid(unsafe_code)]
//! # QOA - Quite OK Audio Format
//!
//! A bit-exact decoder for qoa streams.
//!
//! ```no_run
//! let bytes = std::fs::read("sound.qoa")?;
//! let decoded = qoaref::decode_all(&bytes)?;
//! println!(
//!     "{} channels at {} HZ, {} samples per channel",
//!     decoded.num_channels,
//!     decoded.sample_rate,
//!     decoded.samples_per_channel()
//! );
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! Decoding is all-or-nothing: any structural problem or arithmetic overflow
//! in the stream is reported as a [`DecodeError`] with the byte offset where
//! it was found, and no partial output is returned. Callers that want to stop
//! early can iterate a [`StreamDecoder`] frame by frame instead.
mod config;
pub mod dequant;
mod error;
mod frame;
mod lms;
mod slice;
mod stream;

#[cfg(feature = "rodio")]
mod rodio_source;
#[cfg(test)]
mod test_helper;

pub use config::DecoderConfig;
pub use error::{DecodeError, InvalidFrameReason, StreamParameters};
pub use frame::{FrameHeader, QOA_FRAME_HEADER_SIZE};
pub use lms::{Lms, LmsOverflow, QOA_LMS_STATE_SIZE};
#[cfg(feature = "rodio")]
pub use rodio_source::QoaRodioSource;
pub use slice::{Slice, SliceDecoder, QOA_SLICE_SIZE};
pub use stream::{
    DecodedFrame, DecodedQoa, FileHeader, FrameInfo, ProcessingMode, StreamDecoder,
};

pub const QOA_SLICE_LEN: usize = 20;
pub const QOA_LMS_LEN: usize = 4;
pub const QOA_HEADER_SIZE: usize = 8;
pub const QOA_MAGIC: u32 = u32::from_be_bytes(*b"qoaf");
pub const QOA_SLICES_PER_FRAME: usize = 256;
pub const QOA_FRAME_LEN: usize = QOA_SLICES_PER_FRAME * QOA_SLICE_LEN;

/// Decode all samples of a QOA stream held in `bytes`.
///
/// If not all frames have the same number of channels and the same sample
/// rate, [`DecodeError::InconsistentStreamParameters`] is returned. Use
/// [`decode_all_with`] to accept sample rate changes.
pub fn decode_all(bytes: &[u8]) -> Result<DecodedQoa, DecodeError> {
    decode_all_with(bytes, &DecoderConfig::default())
}

/// Same as [`decode_all`] with an explicit configuration.
pub fn decode_all_with(bytes: &[u8], config: &DecoderConfig) -> Result<DecodedQoa, DecodeError> {
    StreamDecoder::with_config(bytes, config.clone())?.decode()
}
