use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};

use crate::error::{PipelineError, Result};

use super::entropy::{histogram_entropy, shannon_entropy, HISTOGRAM_EPSILON};
use super::mutual_info::{discretize, mutual_information};
use super::stats::{l2_norm, sum_of_squares, FeatureStats};
use super::wavelet::{wavedec, zero_pad, MIN_SIGNAL_LEN};

pub const MI_DIR_L5_WEIGHT: &str = "MI-dir-L5-weight";
pub const HH_L3_WEIGHT: &str = "HH-L3-weight";
pub const HH_L001_WEIGHT: &str = "HH-L0.01-weight";
pub const HPHP_L001_WEIGHT: &str = "HpHp-L0.01-weight";
pub const HPHP_L001_MEAN: &str = "HpHp-L0.01-mean";
pub const HPHP_L001_STD: &str = "HpHp-L0.01-std";
pub const HPHP_L001_MAGNITUDE: &str = "HpHp-L0.01-magnitude";

/// Additive constant of the legacy entropy and power-sum formulas.
const LEGACY_EPSILON: f64 = 1e-6;

/// Which formula set produces the entropy-style and weight features.
///
/// Both versions agree on the mutual information and on the mean, standard
/// deviation and magnitude of the approximation coefficients.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum FeatureVersion {
    /// `HH-*` are Shannon entropy / power sum of the raw signal and
    /// `HpHp-L0.01-weight` is the energy of the raw signal.
    V1,
    /// `HH-*` are entropies of density histograms with configurable bin counts and
    /// `HpHp-L0.01-weight` is the energy of the approximation coefficients.
    V2,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SignalParams {
    pub version: FeatureVersion,
    pub wavelet_level: usize,
    pub bins_l3: usize,
    pub bins_l001: usize,
}

impl Default for SignalParams {
    fn default() -> Self {
        SignalParams {
            version: FeatureVersion::V2,
            wavelet_level: 2,
            bins_l3: 8,
            bins_l001: 100,
        }
    }
}

/// Everything derived from one short per-flow signal.
#[derive(Debug, Clone, PartialEq)]
pub struct SignalFeatures {
    pub mi_dir_l5_weight: f64,
    pub hh_l3_weight: f64,
    pub hh_l001_weight: f64,
    pub hphp_weight: f64,
    pub hphp_mean: f64,
    pub hphp_std: f64,
    pub hphp_magnitude: f64,
    /// Summary statistics over the signal before padding.
    pub max: f64,
    pub mean: f64,
    pub min: f64,
    pub stddev: f64,
}

impl SignalFeatures {
    /// Named values in output order.
    pub fn named(&self) -> [(&'static str, f64); 7] {
        [
            (MI_DIR_L5_WEIGHT, self.mi_dir_l5_weight),
            (HH_L3_WEIGHT, self.hh_l3_weight),
            (HH_L001_WEIGHT, self.hh_l001_weight),
            (HPHP_L001_WEIGHT, self.hphp_weight),
            (HPHP_L001_MEAN, self.hphp_mean),
            (HPHP_L001_STD, self.hphp_std),
            (HPHP_L001_MAGNITUDE, self.hphp_magnitude),
        ]
    }
}

pub fn compute_signal_features(signal: &[f64], params: &SignalParams) -> Result<SignalFeatures> {
    if signal.is_empty() {
        return Err(PipelineError::Computation("empty signal".to_string()));
    }
    let stats = FeatureStats::from_values(signal);

    let padded = zero_pad(signal, MIN_SIGNAL_LEN);
    let decomposition = wavedec(&padded, params.wavelet_level)?;
    let approx = &decomposition.approximation;
    let approx_stats = FeatureStats::from_values(approx);

    let positions: Vec<i64> = (0..padded.len() as i64).collect();
    let mi_dir_l5_weight = mutual_information(&positions, &discretize(&padded))?;

    let (hh_l3_weight, hh_l001_weight, hphp_weight) = match params.version {
        FeatureVersion::V1 => {
            let shifted: Vec<f64> = padded.iter().map(|v| v + LEGACY_EPSILON).collect();
            (
                shannon_entropy(&shifted)?,
                legacy_power_sum(&padded)?,
                sum_of_squares(&padded),
            )
        }
        FeatureVersion::V2 => (
            histogram_entropy(&padded, params.bins_l3, HISTOGRAM_EPSILON)?,
            histogram_entropy(&padded, params.bins_l001, HISTOGRAM_EPSILON)?,
            sum_of_squares(approx),
        ),
    };

    Ok(SignalFeatures {
        mi_dir_l5_weight,
        hh_l3_weight,
        hh_l001_weight,
        hphp_weight,
        hphp_mean: approx_stats.get_mean(),
        hphp_std: approx_stats.get_std(),
        hphp_magnitude: l2_norm(approx),
        max: stats.get_max(),
        mean: stats.get_mean(),
        min: stats.get_min(),
        stddev: stats.get_std(),
    })
}

/// `Σ (vᵢ / Σ(vⱼ + ε))^0.01`.
fn legacy_power_sum(values: &[f64]) -> Result<f64> {
    if values.iter().any(|v| *v < 0.0) {
        return Err(PipelineError::Computation(
            "power sum of a negative signal".to_string(),
        ));
    }
    let denominator: f64 = values.iter().map(|v| v + LEGACY_EPSILON).sum();
    Ok(values.iter().map(|v| (v / denominator).powf(0.01)).sum())
}
