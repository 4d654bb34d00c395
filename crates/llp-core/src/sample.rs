//! Weighted momentum samples forming unnormalized ensembles.

use serde::{Deserialize, Serialize};

use crate::kinematics::FourMomentum;

/// A four-momentum paired with a scalar weight.
///
/// The weight carries the same currency as the input spectrum (pb, or a
/// dimensionless probability mass). A collection of samples approximates a
/// differential distribution; the total weight integrates to the physical
/// quantity (branching fraction times cross-section times mixing factor),
/// not to one.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WeightedSample {
    /// Lab- or rest-frame four-momentum, depending on context.
    pub momentum: FourMomentum,
    /// Partial cross-section / branching contribution.
    pub weight: f64,
}

impl WeightedSample {
    /// Creates a weighted sample.
    pub fn new(momentum: FourMomentum, weight: f64) -> Self {
        Self { momentum, weight }
    }
}

/// Sums the weights of an ensemble.
pub fn total_weight(samples: &[WeightedSample]) -> f64 {
    samples.iter().map(|sample| sample.weight).sum()
}
