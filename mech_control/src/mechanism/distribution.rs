//! Splitting a mechanism's feedforward across its actuators.

use mech_common::consts::ASSUMED_ACTUATOR_EFFICIENCY;
use serde::{Deserialize, Serialize};

/// How a feedforward magnitude is shared between actuators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum DistributionPolicy {
    /// `M / K` each.
    #[serde(rename = "equal")]
    EqualSplit,
    /// `M · g_i / Σg / η` each, η = assumed actuator efficiency.
    #[default]
    #[serde(rename = "weighted")]
    GearRatioWeighted,
}

impl DistributionPolicy {
    /// Per-actuator shares of `magnitude`, in actuator order.
    ///
    /// Gear ratios must be > 0; mechanisms enforce this at registration.
    /// A non-positive sum yields all-zero shares.
    pub fn distribute(&self, magnitude: f64, gear_ratios: &[f64]) -> Vec<f64> {
        let k = gear_ratios.len();
        if k == 0 {
            return Vec::new();
        }
        match self {
            Self::EqualSplit => vec![magnitude / k as f64; k],
            Self::GearRatioWeighted => {
                let total: f64 = gear_ratios.iter().sum();
                if total <= 0.0 || !total.is_finite() {
                    return vec![0.0; k];
                }
                gear_ratios
                    .iter()
                    .map(|g| magnitude * (g / total) / ASSUMED_ACTUATOR_EFFICIENCY)
                    .collect()
            }
        }
    }
}
