//! Detector acceptance and decay/interaction probabilities inside the
//! fiducial volume.

use llp_core::FourMomentum;

use crate::config::DetectorConfig;

/// Conversion between natural cross-section units (GeV^-2) and the meter
/// based number-density/length units, `(5e15)^2`.
pub const GEV2_PER_INV_M2: f64 = 2.5e31;

/// Transverse position where the momentum direction, extrapolated from the
/// interaction point, crosses the plane at `distance` along the beam axis.
pub fn transverse_position(distance: f64, momentum: &FourMomentum) -> (f64, f64) {
    let scale = distance / momentum.pz;
    (momentum.px * scale, momentum.py * scale)
}

/// Geometric acceptance test: the extrapolated transverse position must
/// satisfy the configured aperture predicate. Backward momenta never reach
/// the fiducial plane and fail outright.
pub fn accepts(config: &DetectorConfig, momentum: &FourMomentum) -> bool {
    if momentum.pz <= 0.0 {
        return false;
    }
    let (x, y) = transverse_position(config.distance, momentum);
    config.aperture.accepts(x, y)
}

/// Probability that a particle of the given proper decay length and
/// momentum decays inside `[distance, distance + length]`.
///
/// This is the difference of two survival probabilities, i.e. the
/// decay-in-volume probability, not the total decay probability. The limits
/// are well-defined without special cases: an effectively stable particle
/// (`ctau -> inf`) and an immediately decaying one (`ctau -> 0`) both give
/// zero.
pub fn decay_in_volume_probability(
    ctau: f64,
    momentum: &FourMomentum,
    mass: f64,
    distance: f64,
    length: f64,
) -> f64 {
    let dbar = ctau * momentum.p() / mass;
    if !(dbar > 0.0) {
        return 0.0;
    }
    let probability = (-distance / dbar).exp() - (-(distance + length) / dbar).exp();
    probability.clamp(0.0, 1.0)
}

/// Probability that a particle interacts while crossing the volume:
/// `length / mean-free-path` with mean free path `1/(n sigma)`, converting
/// the natural-unit cross-section into meters.
pub fn interaction_probability(sigma: f64, number_density: f64, length: f64) -> f64 {
    (length * number_density * sigma / GEV2_PER_INV_M2).clamp(0.0, 1.0)
}
