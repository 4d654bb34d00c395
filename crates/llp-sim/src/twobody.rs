//! Closed-form two-body decay kinematics and the rest-frame sampler.

use llp_core::errors::ErrorInfo;
use llp_core::{FourMomentum, RngHandle, SimError, ThreeVector, WeightedSample};

/// Decays `p0 -> p1 + p2` for an angular sample `(costheta, phi)` given in
/// the parent rest frame, returning both daughters in the frame of `p0`.
///
/// Rest-frame energies follow two-body kinematics,
/// `E1 = (m0^2 + m1^2 - m2^2) / 2 m0` and analogously for `E2`; the
/// daughters are emitted back to back. The rest-frame polar axis is rotated
/// onto the parent flight direction before boosting by the parent velocity,
/// so a parent at rest comes back unrotated and unboosted. Deterministic
/// given its inputs; the caller supplies the angular sample.
pub fn two_body_decay(
    p0: &FourMomentum,
    m0: f64,
    m1: f64,
    m2: f64,
    phi: f64,
    costheta: f64,
) -> Result<(FourMomentum, FourMomentum), SimError> {
    if m0 < m1 + m2 {
        return Err(SimError::Kinematics(
            ErrorInfo::new("below-threshold", "parent mass below daughter mass sum")
                .with_context("m0", m0.to_string())
                .with_context("m1", m1.to_string())
                .with_context("m2", m2.to_string()),
        ));
    }

    let e1 = (m0 * m0 + m1 * m1 - m2 * m2) / (2.0 * m0);
    let e2 = (m0 * m0 - m1 * m1 + m2 * m2) / (2.0 * m0);
    // Round-off at the phase-space boundary can push these slightly negative.
    let momentum1 = (e1 * e1 - m1 * m1).max(0.0).sqrt();
    let momentum2 = (e2 * e2 - m2 * m2).max(0.0).sqrt();

    let sintheta = (1.0 - costheta * costheta).max(0.0).sqrt();
    let (sinphi, cosphi) = phi.sin_cos();
    let direction = ThreeVector::new(sintheta * cosphi, sintheta * sinphi, costheta);

    let first = FourMomentum::new(
        -momentum1 * direction.x,
        -momentum1 * direction.y,
        -momentum1 * direction.z,
        e1,
    );
    let second = FourMomentum::new(
        momentum2 * direction.x,
        momentum2 * direction.y,
        momentum2 * direction.z,
        e2,
    );

    let (first, second) = match p0.spatial().unit() {
        None => (first, second),
        Some(flight) => {
            let zaxis = ThreeVector::new(0.0, 0.0, 1.0);
            let axis = zaxis.cross(&flight);
            let angle = zaxis.dot(&flight).clamp(-1.0, 1.0).acos();
            let (first, second) = if axis.norm() <= f64::EPSILON {
                if angle > std::f64::consts::FRAC_PI_2 {
                    // Anti-parallel to the beam axis: flip about x.
                    let xaxis = ThreeVector::new(1.0, 0.0, 0.0);
                    (
                        first.rotated(&xaxis, std::f64::consts::PI),
                        second.rotated(&xaxis, std::f64::consts::PI),
                    )
                } else {
                    (first, second)
                }
            } else {
                (first.rotated(&axis, angle), second.rotated(&axis, angle))
            };
            let beta = p0.boost_velocity();
            (first.boosted(&beta), second.boosted(&beta))
        }
    };

    Ok((first, second))
}

/// Samples `nsample` isotropic two-body decays of a parent at rest and
/// returns the second daughter (the LLP) as weighted samples of weight
/// `branching / nsample`.
pub fn decay_in_restframe_two_body(
    branching: f64,
    m0: f64,
    m1: f64,
    m2: f64,
    nsample: usize,
    rng: &mut RngHandle,
) -> Result<Vec<WeightedSample>, SimError> {
    let mother = FourMomentum::at_rest(m0);
    let weight = branching / nsample as f64;
    let mut samples = Vec::with_capacity(nsample);
    for _ in 0..nsample {
        let (costheta, phi) = rng.isotropic_angles();
        let (_, llp) = two_body_decay(&mother, m0, m1, m2, phi, costheta)?;
        samples.push(WeightedSample::new(llp, weight));
    }
    Ok(samples)
}
