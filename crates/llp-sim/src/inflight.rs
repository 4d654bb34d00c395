//! Probability that a short-lived parent hadron decays in flight before
//! being absorbed by the upstream material.

use llp_core::{FourMomentum, ParticleId};

// Absorber geometry in meters: neutral kaons see a 140 m section close to
// the beamline and a 20 m section at wider angles before the 0.05 m beam
// pipe radius takes over; charged pions and kaons only see the short
// section.
const L_NEAR_BEAM: f64 = 140.0;
const L_SHORT: f64 = 20.0;
const R_PIPE: f64 = 0.05;

/// Probability that the parent decays before absorption.
///
/// Only charged pions, charged kaons, `K_S` and `K_L` have lifetimes in the
/// regime where this matters; every other species (promptly decaying or
/// stable on detector timescales) gets probability 1, including identifiers
/// outside the recognized set. The boosted decay length is decomposed into
/// longitudinal and transverse components and compared against the absorber
/// section selected by the flight angle. Never fails; the result is clamped
/// to `[0, 1]`.
pub fn decay_in_flight_probability(pid: ParticleId, momentum: &FourMomentum) -> f64 {
    let raw = pid.as_raw();
    let neutral_kaon = raw == 130 || raw == 310;
    let charged = matches!(raw.abs(), 211 | 321);
    if !neutral_kaon && !charged {
        return 1.0;
    }
    let Some(ctau) = pid.ctau() else {
        return 1.0;
    };

    let mass = momentum.mass();
    let theta = momentum.theta();
    let dbar_z = ctau * momentum.pz / mass;
    let dbar_t = ctau * momentum.pt() / mass;

    let probability = if neutral_kaon {
        if theta < 0.017 / L_SHORT {
            1.0 - (-L_NEAR_BEAM / dbar_z).exp()
        } else if theta < 0.05 / L_SHORT {
            1.0 - (-L_SHORT / dbar_z).exp()
        } else {
            1.0 - (-R_PIPE / dbar_t).exp()
        }
    } else if theta < 0.05 / L_SHORT {
        1.0 - (-L_SHORT / dbar_z).exp()
    } else {
        1.0 - (-R_PIPE / dbar_t).exp()
    };

    if probability.is_nan() {
        return 1.0;
    }
    probability.clamp(0.0, 1.0)
}
