use std::collections::HashMap;
use std::hash::Hash;

use crate::error::{PipelineError, Result};

/// Rounds a real-valued series to integer symbols.
pub fn discretize(values: &[f64]) -> Vec<i64> {
    values.iter().map(|v| v.round() as i64).collect()
}

/// Mutual information (natural log) between two paired symbol sequences,
/// estimated from their contingency table.
///
/// `MI = Σ (n_ij / N) · ln(N · n_ij / (a_i · b_j))`, where `a_i` and `b_j` are
/// the marginal counts. Negative rounding residue is clipped to zero.
pub fn mutual_information<T>(first: &[T], second: &[T]) -> Result<f64>
where
    T: Eq + Hash,
{
    if first.len() != second.len() {
        return Err(PipelineError::Computation(format!(
            "mutual information needs equal-length series ({} vs {})",
            first.len(),
            second.len()
        )));
    }
    if first.is_empty() {
        return Err(PipelineError::Computation(
            "mutual information of empty series".to_string(),
        ));
    }

    let mut joint: HashMap<(&T, &T), usize> = HashMap::new();
    let mut first_counts: HashMap<&T, usize> = HashMap::new();
    let mut second_counts: HashMap<&T, usize> = HashMap::new();
    for (a, b) in first.iter().zip(second.iter()) {
        *joint.entry((a, b)).or_insert(0) += 1;
        *first_counts.entry(a).or_insert(0) += 1;
        *second_counts.entry(b).or_insert(0) += 1;
    }

    let n = first.len() as f64;
    let mi: f64 = joint
        .iter()
        .map(|((a, b), count)| {
            let n_ij = *count as f64;
            let a_i = first_counts[a] as f64;
            let b_j = second_counts[b] as f64;
            (n_ij / n) * ((n * n_ij) / (a_i * b_j)).ln()
        })
        .sum();

    Ok(mi.max(0.0))
}
