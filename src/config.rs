//! Decoder configuration.

#[cfg(feature = "serde")]
use serde::Deserialize;
#[cfg(feature = "serde")]
use serde::Serialize;

/// Configuration for [`StreamDecoder`](crate::StreamDecoder).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct DecoderConfig {
    /// Accept frames whose sample rate or channel count differs from the
    /// first frame.
    ///
    /// Whole-stream decoding writes into a buffer shaped by the first frame,
    /// so it rejects channel count changes even when this is set. Only
    /// frame-by-frame decoding can follow them.
    pub allow_dynamic_parameters: bool,
}

impl DecoderConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn allow_dynamic_parameters(mut self, allow: bool) -> Self {
        self.allow_dynamic_parameters = allow;
        self
    }
}
