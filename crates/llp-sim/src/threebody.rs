//! Monte Carlo three-body decay integrator.
//!
//! The decay `parent -> d1 + d2 + LLP` is parametrized as a cascade of two
//! two-body decays through a virtual intermediate of invariant mass `q`:
//! `parent -> d1 + q`, then `q -> d2 + LLP`. `q^2` is sampled uniformly in
//! `[(m2+m3)^2, (m0-m1)^2]` and the intermediate decay angle uniformly in
//! `cos theta`; the remaining orientations are isotropic. Each draw is
//! weighted by the user differential rate times the phase-space volume over
//! the sample count, a plain (non-importance-sampled) Monte Carlo estimator
//! whose standard error falls as `1/sqrt(N)`. Downstream calibrations are
//! tuned to this exact estimator, so it must not be replaced by an
//! importance-sampled variant.

use llp_core::errors::ErrorInfo;
use llp_core::{FourMomentum, RngHandle, SimError, WeightedSample};
use llp_model::{DifferentialRateFn, ThreeBodyPoint};

use crate::twobody::two_body_decay;

/// Samples `nsample` phase-space points of the cascade and returns the LLP
/// (the final daughter of mass `m3`) as weighted samples in the parent rest
/// frame. The two visible daughters only enforce four-momentum conservation
/// through the cascade and are discarded.
pub fn decay_in_restframe_three_body(
    rate: &DifferentialRateFn,
    coupling: f64,
    m0: f64,
    m1: f64,
    m2: f64,
    m3: f64,
    nsample: usize,
    rng: &mut RngHandle,
) -> Result<Vec<WeightedSample>, SimError> {
    let q2_min = (m2 + m3) * (m2 + m3);
    let q2_max = (m0 - m1) * (m0 - m1);
    if q2_max <= q2_min {
        return Err(SimError::Kinematics(
            ErrorInfo::new("empty-phase-space", "three-body phase space is empty")
                .with_context("q2_min", q2_min.to_string())
                .with_context("q2_max", q2_max.to_string()),
        ));
    }

    let mother = FourMomentum::at_rest(m0);
    // Jacobian of the uniform (q^2, cos theta) sampling.
    let volume = (q2_max - q2_min) * 2.0 / nsample as f64;

    let mut samples = Vec::with_capacity(nsample);
    for _ in 0..nsample {
        let q2 = rng.uniform(q2_min, q2_max);
        let costheta = rng.uniform(-1.0, 1.0);
        let q = q2.sqrt();

        let (cos_mother, phi_mother) = rng.isotropic_angles();
        let phi_q = rng.uniform(-std::f64::consts::PI, std::f64::consts::PI);

        let (_, intermediate) = two_body_decay(&mother, m0, m1, q, phi_mother, cos_mother)?;
        let (_, llp) = two_body_decay(&intermediate, q, m2, m3, phi_q, costheta)?;

        let point = ThreeBodyPoint {
            q2,
            q,
            costheta,
            coupling,
        };
        samples.push(WeightedSample::new(llp, rate(&point) * volume));
    }
    Ok(samples)
}
