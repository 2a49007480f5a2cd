//! Stream decoding: the file header followed by a sequence of frames.

use std::time::Duration;

use log::debug;

use crate::config::DecoderConfig;
use crate::error::{read_array, read_u32_be, DecodeError, StreamParameters};
use crate::frame::{decode_frame, FrameHeader};
use crate::lms::Lms;
use crate::slice::QOA_SLICE_SIZE;
use crate::{QOA_HEADER_SIZE, QOA_MAGIC, QOA_SLICE_LEN};

/// The 8-byte header at the start of every QOA stream.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct FileHeader {
    /// Samples per channel in the whole stream, 0 for a streaming file.
    pub total_samples: u32,
}

impl FileHeader {
    pub fn parse(buf: &[u8]) -> Result<Self, DecodeError> {
        let magic: [u8; 4] = read_array(buf, 0)?;
        if magic != QOA_MAGIC.to_be_bytes() {
            return Err(DecodeError::BadMagic {
                found: magic.to_vec(),
            });
        }
        let total_samples = read_u32_be(buf, 4)?;
        Ok(FileHeader { total_samples })
    }
}

/// The decoding mode of the QOA stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProcessingMode {
    /// Total number of samples per channel is known from the file header.
    FixedSamples {
        /// Number of samples per channel in the entire stream.
        samples: u32,
    },
    /// Total number of samples is not known; frames run to the end of the
    /// input.
    Streaming,
}

/// One decoded frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedFrame {
    pub header: FrameHeader,
    /// Byte offset of the frame header in the input.
    pub offset: usize,
    /// Interleaved samples of all channels in this frame.
    pub samples: Vec<i16>,
}

impl DecodedFrame {
    pub fn samples_per_channel(&self) -> usize {
        self.samples.len() / self.header.num_channels as usize
    }
}

/// A fully decoded QOA stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedQoa {
    /// Number of channels in `samples`, 0 if the stream held no frame
    pub num_channels: u8,
    /// Sample rate in HZ declared by the first frame
    pub sample_rate: u32,
    /// Interleaved samples of all channels (e.g. L-R-L-R-L-R... if there are
    /// two channels)
    pub samples: Vec<i16>,
    /// Bytes of input covered by the file header and decoded frames
    pub bytes_consumed: usize,
}

impl DecodedQoa {
    pub fn samples_per_channel(&self) -> usize {
        match self.num_channels {
            0 => 0,
            channels => self.samples.len() / channels as usize,
        }
    }

    /// Samples of a single channel in time order.
    pub fn channel(&self, channel: usize) -> impl Iterator<Item = i16> + '_ {
        let channels = (self.num_channels as usize).max(1);
        let start = if channel < self.num_channels as usize {
            channel
        } else {
            self.samples.len()
        };
        self.samples.iter().skip(start).step_by(channels).copied()
    }

    pub fn duration(&self) -> Option<Duration> {
        if self.sample_rate == 0 {
            return None;
        }
        Some(Duration::from_secs_f64(
            self.samples_per_channel() as f64 / self.sample_rate as f64,
        ))
    }
}

/// Decoder of a QOA stream held in memory.
///
/// [`StreamDecoder::decode`] produces the whole stream in one buffer. The
/// decoder is also an iterator over [`DecodedFrame`]s, which lets a caller
/// stop between frames. After an error, iteration is finished.
#[derive(Debug)]
pub struct StreamDecoder<'a> {
    buf: &'a [u8],
    config: DecoderConfig,
    header: FileHeader,
    mode: ProcessingMode,
    /// Declared by the first frame; `None` until one has been read.
    parameters: Option<StreamParameters>,
    position: usize,
    samples_decoded: u64,
    lms: Vec<Lms>,
    finished: bool,
}

/// Where a frame landed, reported by [`StreamDecoder::decode_frame_into`].
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct FrameInfo {
    pub header: FrameHeader,
    pub offset: usize,
    /// Samples per channel written to the destination.
    pub samples_written: usize,
}

impl<'a> StreamDecoder<'a> {
    /// Read the file header of `buf` with the default configuration.
    pub fn new(buf: &'a [u8]) -> Result<Self, DecodeError> {
        Self::with_config(buf, DecoderConfig::default())
    }

    pub fn with_config(buf: &'a [u8], config: DecoderConfig) -> Result<Self, DecodeError> {
        let header = FileHeader::parse(buf)?;
        let mode = if header.total_samples == 0 {
            ProcessingMode::Streaming
        } else {
            ProcessingMode::FixedSamples {
                samples: header.total_samples,
            }
        };
        debug!("qoa stream of {} bytes, mode {:?}", buf.len(), mode);

        Ok(Self {
            buf,
            config,
            header,
            mode,
            parameters: None,
            position: QOA_HEADER_SIZE,
            samples_decoded: 0,
            lms: Vec::new(),
            finished: false,
        })
    }

    pub fn file_header(&self) -> &FileHeader {
        &self.header
    }

    pub fn mode(&self) -> &ProcessingMode {
        &self.mode
    }

    /// Channel count and sample rate declared by the first frame.
    pub fn parameters(&self) -> Option<StreamParameters> {
        self.parameters
    }

    /// Byte offset of the next frame.
    pub fn position(&self) -> usize {
        self.position
    }

    /// Samples per channel decoded so far.
    pub fn samples_decoded(&self) -> u64 {
        self.samples_decoded
    }

    /// Duration of the whole stream, known once the first frame is read in
    /// fixed mode.
    pub fn total_duration(&self) -> Option<Duration> {
        match (&self.mode, self.parameters) {
            (ProcessingMode::FixedSamples { samples }, Some(parameters))
                if parameters.sample_rate > 0 =>
            {
                Some(Duration::from_secs_f64(
                    *samples as f64 / parameters.sample_rate as f64,
                ))
            }
            _ => None,
        }
    }

    /// Decode every remaining frame into one interleaved buffer.
    ///
    /// Every frame must have the channel count of the first one. The sample
    /// rate may only change with
    /// [`DecoderConfig::allow_dynamic_parameters`].
    pub fn decode(mut self) -> Result<DecodedQoa, DecodeError> {
        let mut samples = Vec::new();
        if let (ProcessingMode::FixedSamples { samples: total }, Ok(first)) =
            (&self.mode, FrameHeader::parse(self.buf, self.position))
        {
            // A corrupt header can claim far more samples than the input holds.
            let remaining = u64::from(*total).saturating_sub(self.samples_decoded);
            let wanted = remaining.saturating_mul(u64::from(first.num_channels));
            let bound = (self.buf.len() / QOA_SLICE_SIZE * QOA_SLICE_LEN) as u64;
            samples.reserve_exact(wanted.min(bound) as usize);
        }

        while self.decode_frame_into(&mut samples)?.is_some() {}

        let parameters = self.parameters.unwrap_or(StreamParameters {
            num_channels: 0,
            sample_rate: 0,
        });
        Ok(DecodedQoa {
            num_channels: parameters.num_channels,
            sample_rate: parameters.sample_rate,
            samples,
            bytes_consumed: self.position,
        })
    }

    /// Decode the next frame and append its interleaved samples to `dest`.
    ///
    /// Returns `Ok(None)` once the stream is complete. The channel count must
    /// match the first frame. On error `dest` is left as it was.
    pub fn decode_frame_into(
        &mut self,
        dest: &mut Vec<i16>,
    ) -> Result<Option<FrameInfo>, DecodeError> {
        let result = self.next_frame_into(dest, true);
        if result.is_err() {
            self.finished = true;
        }
        result
    }

    fn next_frame_into(
        &mut self,
        dest: &mut Vec<i16>,
        fixed_shape: bool,
    ) -> Result<Option<FrameInfo>, DecodeError> {
        let Some((header, valid_samples)) = self.begin_frame(fixed_shape)? else {
            return Ok(None);
        };
        let offset = self.position;
        debug!(
            "starting frame @{} => samples @[{}: +{}]",
            offset, self.samples_decoded, header.num_samples_per_channel
        );

        let start = dest.len();
        dest.resize(start + valid_samples * header.num_channels as usize, 0);
        let consumed = match decode_frame(
            self.buf,
            offset,
            &header,
            valid_samples,
            &mut self.lms,
            &mut dest[start..],
        ) {
            Ok(consumed) => consumed,
            Err(e) => {
                dest.truncate(start);
                return Err(e);
            }
        };

        self.position += consumed;
        self.samples_decoded += valid_samples as u64;
        debug!(
            "finished frame of {} bytes @{} => {} samples decoded",
            consumed, offset, self.samples_decoded
        );

        Ok(Some(FrameInfo {
            header,
            offset,
            samples_written: valid_samples,
        }))
    }

    /// Read and check the next frame header. Returns the header and the
    /// number of samples per channel to keep from the frame, or `None` at the
    /// end of the stream.
    fn begin_frame(
        &mut self,
        fixed_shape: bool,
    ) -> Result<Option<(FrameHeader, usize)>, DecodeError> {
        if self.finished {
            return Ok(None);
        }
        let remaining = match self.mode {
            ProcessingMode::FixedSamples { samples } => {
                let remaining = u64::from(samples).saturating_sub(self.samples_decoded);
                if remaining == 0 {
                    if self.position < self.buf.len() {
                        debug!(
                            "ignoring {} trailing bytes @{}",
                            self.buf.len() - self.position,
                            self.position
                        );
                    }
                    self.finished = true;
                    return Ok(None);
                }
                Some(remaining)
            }
            ProcessingMode::Streaming => {
                if self.position >= self.buf.len() {
                    self.finished = true;
                    return Ok(None);
                }
                None
            }
        };

        let header = FrameHeader::parse(self.buf, self.position)?;
        if header.frame_size == 0 {
            if remaining.is_some() {
                return Err(DecodeError::FrameSizeMismatch {
                    offset: self.position,
                    declared: 0,
                    consumed: header.layout_size(),
                });
            }
            debug!("zero-sized frame @{} ends the stream", self.position);
            self.finished = true;
            return Ok(None);
        }
        header.validate(self.position)?;
        self.check_parameters(&header, fixed_shape)?;

        let declared = header.num_samples_per_channel as usize;
        let valid_samples = match remaining {
            Some(remaining) => declared.min(usize::try_from(remaining).unwrap_or(usize::MAX)),
            None => declared,
        };
        Ok(Some((header, valid_samples)))
    }

    fn check_parameters(
        &mut self,
        header: &FrameHeader,
        fixed_shape: bool,
    ) -> Result<(), DecodeError> {
        let found = header.parameters();
        let Some(expected) = self.parameters else {
            self.parameters = Some(found);
            return Ok(());
        };
        let dynamic = self.config.allow_dynamic_parameters;
        let sample_rate_ok = found.sample_rate == expected.sample_rate || dynamic;
        let channels_ok = found.num_channels == expected.num_channels || (dynamic && !fixed_shape);
        if sample_rate_ok && channels_ok {
            Ok(())
        } else {
            Err(DecodeError::InconsistentStreamParameters {
                offset: self.position,
                expected,
                found,
            })
        }
    }
}

impl Iterator for StreamDecoder<'_> {
    type Item = Result<DecodedFrame, DecodeError>;

    /// Decode the next frame into its own buffer.
    fn next(&mut self) -> Option<Self::Item> {
        let mut samples = Vec::new();
        match self.next_frame_into(&mut samples, false) {
            Ok(Some(info)) => Some(Ok(DecodedFrame {
                header: info.header,
                offset: info.offset,
                samples,
            })),
            Ok(None) => None,
            Err(e) => {
                self.finished = true;
                Some(Err(e))
            }
        }
    }
}

impl std::iter::FusedIterator for StreamDecoder<'_> {}
