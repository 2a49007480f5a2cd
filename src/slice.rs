//! Slice decoding.
//!
//! A slice is one big-endian `u64`: a 4-bit scale factor index in bits 60-63
//! followed by twenty 3-bit residual codes, the first sample in the highest
//! group.

use crate::dequant::dequantize;
use crate::lms::{Lms, LmsOverflow};
use crate::QOA_SLICE_LEN;

/// Size in bytes of one encoded slice.
pub const QOA_SLICE_SIZE: usize = 8;

/// One packed slice.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Slice(pub u64);

impl Slice {
    pub fn from_be_bytes(bytes: [u8; QOA_SLICE_SIZE]) -> Self {
        Slice(u64::from_be_bytes(bytes))
    }

    pub fn scale_factor_index(&self) -> usize {
        ((self.0 >> 60) & 0xf) as usize
    }

    /// Residual code of the `k`-th sample in the slice.
    pub fn code(&self, k: usize) -> usize {
        debug_assert!(k < QOA_SLICE_LEN);
        ((self.0 >> ((QOA_SLICE_LEN - 1 - k) * 3)) & 0x7) as usize
    }

    /// Decode this slice with `lms`, which advances after every sample.
    pub fn decode(self, lms: &mut Lms) -> SliceDecoder<'_> {
        SliceDecoder {
            slice: self,
            lms,
            next: 0,
            failed: false,
        }
    }
}

/// Lazy decoder of the 20 samples in a slice.
///
/// Samples are reconstructed one at a time. Stopping early leaves the filter
/// exactly after the last sample returned. After an error no more samples
/// are produced.
#[derive(Debug)]
pub struct SliceDecoder<'a> {
    slice: Slice,
    lms: &'a mut Lms,
    next: usize,
    failed: bool,
}

impl Iterator for SliceDecoder<'_> {
    type Item = Result<i16, LmsOverflow>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed || self.next >= QOA_SLICE_LEN {
            return None;
        }
        let code = self.slice.code(self.next);
        self.next += 1;

        let result = decode_sample(self.lms, self.slice.scale_factor_index(), code);
        self.failed = result.is_err();
        Some(result)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = if self.failed {
            0
        } else {
            QOA_SLICE_LEN - self.next
        };
        (0, Some(remaining))
    }
}

impl std::iter::FusedIterator for SliceDecoder<'_> {}

#[inline(always)]
fn decode_sample(lms: &mut Lms, sf_index: usize, code: usize) -> Result<i16, LmsOverflow> {
    let predicted = lms.predict()?;
    let dequantized = dequantize(sf_index, code);
    let reconstructed = (predicted + dequantized).clamp(-32768, 32767) as i16;
    // The filter sees the clamped sample and the dequantized residual.
    lms.update(reconstructed, dequantized)?;
    Ok(reconstructed)
}
