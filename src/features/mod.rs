//! Per-flow feature math: summary statistics, Haar wavelet decomposition,
//! histogram entropy, discretized mutual information and the connection state.

pub mod entropy;
pub mod mutual_info;
pub mod signal;
pub mod state;
pub mod stats;
pub mod wavelet;
