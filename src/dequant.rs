//! Dequantization table.
//!
//! Each slice selects one of 16 scale factors; the scale factor multiplies
//! one of 8 fixed ratios picked by a 3-bit residual code. The table is derived
//! from the closed-form definitions once, on first use, and is immutable
//! afterwards.

use once_cell::sync::Lazy;

/// Number of scale factors a slice can select.
pub const QOA_SCALE_FACTORS: usize = 16;

/// Number of distinct 3-bit residual codes.
pub const QOA_QUANT_CODES: usize = 8;

/// Ratios applied to the scale factor, indexed by residual code.
const DEQUANT_RATIOS: [f64; QOA_QUANT_CODES] = [0.75, -0.75, 2.5, -2.5, 4.5, -4.5, 7.0, -7.0];

static QOA_DEQUANT_TAB: Lazy<[[i32; QOA_QUANT_CODES]; QOA_SCALE_FACTORS]> = Lazy::new(|| {
    let mut table = [[0; QOA_QUANT_CODES]; QOA_SCALE_FACTORS];
    for (sf_index, row) in table.iter_mut().enumerate() {
        let sf = scale_factor(sf_index);
        for (entry, ratio) in row.iter_mut().zip(DEQUANT_RATIOS) {
            *entry = round_residual(sf * ratio);
        }
    }
    table
});

/// `round((sf_index + 1) ^ 2.75)`, rounding half away from zero.
fn scale_factor(sf_index: usize) -> f64 {
    ((sf_index + 1) as f64).powf(2.75).round()
}

/// Piecewise rounding of a dequantized residual: ties go away from zero on
/// both sides of the origin.
fn round_residual(r: f64) -> i32 {
    if r < 0.0 {
        (r - 0.5).ceil() as i32
    } else {
        (r + 0.5).floor() as i32
    }
}

/// The full 16x8 dequantization table.
pub fn table() -> &'static [[i32; QOA_QUANT_CODES]; QOA_SCALE_FACTORS] {
    &QOA_DEQUANT_TAB
}

/// Dequantized residual for `code` under scale factor `sf_index`.
///
/// Both indices come from masked bit fields, so they are always in range.
#[inline(always)]
pub fn dequantize(sf_index: usize, code: usize) -> i32 {
    QOA_DEQUANT_TAB[sf_index & 0xf][code & 0x7]
}
