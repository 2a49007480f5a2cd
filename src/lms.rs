//! Sign-sign LMS predictor.
//!
//! Each channel owns one filter. It predicts the next sample from the last
//! four decoded samples and adapts its weights from the sign of the history,
//! never from the sign of the residual. All arithmetic is checked: a
//! prediction sum outside `i32` or a weight outside `i16` is an error.

use crate::QOA_LMS_LEN;

/// Size in bytes of one channel's LMS state in a frame.
pub const QOA_LMS_STATE_SIZE: usize = QOA_LMS_LEN * 2 * 2;

/// The LMS filter left its fixed-point range.
#[derive(Debug, Copy, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LmsOverflow {
    /// The weighted sum of the history does not fit in 32 bits.
    #[error("prediction sum {sum} exceeds 32-bit range")]
    Prediction { sum: i64 },
    /// An updated weight does not fit in 16 bits.
    #[error("weight {tap} updated to {value}, outside 16-bit range")]
    Weight { tap: usize, value: i32 },
}

/// Adaptive filter state for a single channel.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Lms {
    /// Last four reconstructed samples, most recent last.
    history: [i16; QOA_LMS_LEN],
    weights: [i16; QOA_LMS_LEN],
}

impl Lms {
    /// Build a filter from explicit history and weights.
    pub fn load(history: [i16; QOA_LMS_LEN], weights: [i16; QOA_LMS_LEN]) -> Self {
        Self { history, weights }
    }

    /// Build a filter from the 16 bytes stored per channel at the start of a
    /// frame: four big-endian history values, then four weights.
    pub fn from_be_bytes(bytes: [u8; QOA_LMS_STATE_SIZE]) -> Self {
        let mut history = [0; QOA_LMS_LEN];
        let mut weights = [0; QOA_LMS_LEN];
        for i in 0..QOA_LMS_LEN {
            history[i] = i16::from_be_bytes([bytes[2 * i], bytes[2 * i + 1]]);
            let w = 2 * (QOA_LMS_LEN + i);
            weights[i] = i16::from_be_bytes([bytes[w], bytes[w + 1]]);
        }
        Self { history, weights }
    }

    pub fn history(&self) -> &[i16; QOA_LMS_LEN] {
        &self.history
    }

    pub fn weights(&self) -> &[i16; QOA_LMS_LEN] {
        &self.weights
    }

    /// Predict the next sample: the weighted history sum shifted right by 13.
    #[inline(always)]
    pub fn predict(&self) -> Result<i32, LmsOverflow> {
        let sum: i64 = self
            .weights
            .iter()
            .zip(self.history.iter())
            .map(|(&w, &h)| i64::from(w) * i64::from(h))
            .sum();
        let sum = i32::try_from(sum).map_err(|_| LmsOverflow::Prediction { sum })?;
        Ok(sum >> 13)
    }

    /// Adapt the weights with `residual` and push `sample` into the history.
    ///
    /// Nothing is modified when a weight would overflow.
    #[inline(always)]
    pub fn update(&mut self, sample: i16, residual: i32) -> Result<(), LmsOverflow> {
        let delta = residual >> 4;
        let mut weights = self.weights;
        for (tap, (weight, &h)) in weights.iter_mut().zip(self.history.iter()).enumerate() {
            // Zero history counts as positive.
            let value = i32::from(*weight) + if h < 0 { -delta } else { delta };
            *weight = i16::try_from(value).map_err(|_| LmsOverflow::Weight { tap, value })?;
        }
        self.weights = weights;

        self.history.rotate_left(1);
        self.history[QOA_LMS_LEN - 1] = sample;
        Ok(())
    }
}
