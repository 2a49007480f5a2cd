use std::time::Duration;

use log::warn;

use crate::{DecodeError, DecodedFrame, StreamDecoder};

/// Plays a QOA stream through Rodio, one decoded frame at a time.
///
/// Errors stop iteration; the error that ended playback is kept and can be
/// inspected with [`QoaRodioSource::error`].
#[derive(Debug)]
pub struct QoaRodioSource<'a> {
    decoder: StreamDecoder<'a>,
    frame: Option<DecodedFrame>,
    next_sample: usize,
    error: Option<DecodeError>,
}

impl<'a> QoaRodioSource<'a> {
    /// Wrap a decoder as a Rodio Source for playback.
    pub fn new(decoder: StreamDecoder<'a>) -> Self {
        let mut source = Self {
            decoder,
            frame: None,
            next_sample: 0,
            error: None,
        };
        source.advance_frame();
        source
    }

    /// The error that stopped playback, if any.
    pub fn error(&self) -> Option<&DecodeError> {
        self.error.as_ref()
    }

    /// Load the next frame with samples, so `channels` and `sample_rate`
    /// always describe the next sample to be returned.
    fn advance_frame(&mut self) {
        self.next_sample = 0;
        self.frame = None;
        for item in self.decoder.by_ref() {
            match item {
                Ok(frame) if frame.samples.is_empty() => continue,
                Ok(frame) => {
                    self.frame = Some(frame);
                    return;
                }
                Err(e) => {
                    warn!("stopping qoa playback: {}", e);
                    self.error = Some(e);
                    return;
                }
            }
        }
    }
}

impl Iterator for QoaRodioSource<'_> {
    type Item = i16;

    fn next(&mut self) -> Option<Self::Item> {
        let frame = self.frame.as_ref()?;
        let sample = *frame.samples.get(self.next_sample)?;
        self.next_sample += 1;
        if self.next_sample >= frame.samples.len() {
            self.advance_frame();
        }
        Some(sample)
    }
}

impl rodio::Source for QoaRodioSource<'_> {
    fn current_frame_len(&self) -> Option<usize> {
        let remaining = self
            .frame
            .as_ref()
            .map_or(0, |frame| frame.samples.len() - self.next_sample);
        Some(remaining)
    }

    fn channels(&self) -> u16 {
        self.frame
            .as_ref()
            .map_or(1, |frame| frame.header.num_channels.into())
    }

    fn sample_rate(&self) -> u32 {
        self.frame
            .as_ref()
            .map(|frame| frame.header.sample_rate)
            .or_else(|| self.decoder.parameters().map(|p| p.sample_rate))
            .unwrap_or(44100)
    }

    fn total_duration(&self) -> Option<Duration> {
        self.decoder.total_duration()
    }
}
