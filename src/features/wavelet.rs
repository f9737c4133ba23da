use std::f64::consts::FRAC_1_SQRT_2;

use crate::error::{PipelineError, Result};

/// Minimum signal length fed to the wavelet transform.
pub const MIN_SIGNAL_LEN: usize = 4;

/// Multi-level Haar ("db1") decomposition of a signal.
///
/// Only the approximation is kept; every feature is derived from it.
#[derive(Debug, Clone, PartialEq)]
pub struct WaveletDecomposition {
    /// Approximation (low-pass) coefficients at the applied level.
    pub approximation: Vec<f64>,
}

/// Pads `signal` with trailing zeros up to `min_len`.
pub fn zero_pad(signal: &[f64], min_len: usize) -> Vec<f64> {
    let mut padded = signal.to_vec();
    if padded.len() < min_len {
        padded.resize(min_len, 0.0);
    }
    padded
}

/// Deepest useful decomposition level for a signal of `len` samples with the
/// two-tap Haar filter: `floor(log2(len))`, or 0 for fewer than two samples.
pub fn max_level(len: usize) -> usize {
    if len < 2 {
        0
    } else {
        (usize::BITS - 1 - len.leading_zeros()) as usize
    }
}

/// One analysis step with symmetric boundary extension.
///
/// Odd-length input mirrors its last sample, so the output has
/// `ceil(len / 2)` coefficients.
pub fn haar_step(signal: &[f64]) -> (Vec<f64>, Vec<f64>) {
    let half = (signal.len() + 1) / 2;
    let mut approximation = Vec::with_capacity(half);
    let mut detail = Vec::with_capacity(half);
    for pair in signal.chunks(2) {
        let a = pair[0];
        let b = if pair.len() == 2 { pair[1] } else { pair[0] };
        approximation.push((a + b) * FRAC_1_SQRT_2);
        detail.push((a - b) * FRAC_1_SQRT_2);
    }
    (approximation, detail)
}

/// Decomposes `signal` (zero-padded to [`MIN_SIGNAL_LEN`]) up to
/// `min(requested_level, max_level(len))`.
pub fn wavedec(signal: &[f64], requested_level: usize) -> Result<WaveletDecomposition> {
    if signal.iter().any(|v| !v.is_finite()) {
        return Err(PipelineError::Computation(
            "wavelet input contains non-finite values".to_string(),
        ));
    }

    let padded = zero_pad(signal, MIN_SIGNAL_LEN);
    let level = requested_level.min(max_level(padded.len()));

    let mut approximation = padded;
    for _ in 0..level {
        let (next, _detail) = haar_step(&approximation);
        approximation = next;
    }

    Ok(WaveletDecomposition { approximation })
}
