use crate::error::{PipelineError, Result};

/// Additive constant applied to histogram densities before taking entropy.
pub const HISTOGRAM_EPSILON: f64 = 1e-10;

/// Equal-width histogram over `[min, max]` of `values`, normalised to a density
/// (integral over the range equals one).
///
/// A constant signal widens its range by 0.5 on each side. The last bin is
/// closed on the right so the maximum lands in bin `bins - 1`.
pub fn density_histogram(values: &[f64], bins: usize) -> Result<Vec<f64>> {
    if bins == 0 {
        return Err(PipelineError::Computation("histogram needs at least one bin".to_string()));
    }
    if values.is_empty() {
        return Err(PipelineError::Computation("histogram of an empty signal".to_string()));
    }
    if values.iter().any(|v| !v.is_finite()) {
        return Err(PipelineError::Computation(
            "histogram range is not finite".to_string(),
        ));
    }

    let mut first = values.iter().cloned().fold(f64::INFINITY, f64::min);
    let mut last = values.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
    if first == last {
        first -= 0.5;
        last += 0.5;
    }

    let step = (last - first) / bins as f64;
    let edges: Vec<f64> = (0..=bins)
        .map(|i| if i == bins { last } else { first + i as f64 * step })
        .collect();

    let norm = bins as f64 / (last - first);
    let mut counts = vec![0usize; bins];
    for &value in values {
        let mut index = ((value - first) * norm) as usize;
        if index >= bins {
            index = bins - 1;
        }
        // Float rounding can put a value one bin off its true edge.
        if index > 0 && value < edges[index] {
            index -= 1;
        } else if index + 1 < bins && value >= edges[index + 1] {
            index += 1;
        }
        counts[index] += 1;
    }

    let total = values.len() as f64;
    Ok(counts
        .iter()
        .zip(edges.windows(2))
        .map(|(count, edge)| *count as f64 / total / (edge[1] - edge[0]))
        .collect())
}

/// Shannon entropy (natural log) of a non-negative weight vector.
///
/// Weights are normalised to sum to one first; zero weights contribute nothing.
pub fn shannon_entropy(weights: &[f64]) -> Result<f64> {
    if weights.iter().any(|w| *w < 0.0 || !w.is_finite()) {
        return Err(PipelineError::Computation(
            "entropy weights must be finite and non-negative".to_string(),
        ));
    }
    let total: f64 = weights.iter().sum();
    if total <= 0.0 {
        return Err(PipelineError::Computation("entropy of an all-zero vector".to_string()));
    }
    Ok(weights
        .iter()
        .filter(|w| **w > 0.0)
        .map(|w| {
            let p = w / total;
            -p * p.ln()
        })
        .sum())
}

/// Entropy of the density histogram of `values` with `bins` bins, each density
/// shifted by `epsilon` so empty bins stay finite under the logarithm.
pub fn histogram_entropy(values: &[f64], bins: usize, epsilon: f64) -> Result<f64> {
    let histogram = density_histogram(values, bins)?;
    let shifted: Vec<f64> = histogram.iter().map(|d| d + epsilon).collect();
    shannon_entropy(&shifted)
}
