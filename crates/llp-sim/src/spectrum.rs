//! Production-channel dispatcher: turns parent-hadron spectra into
//! lab-frame LLP ensembles, one persisted artifact per channel.

use llp_core::errors::ErrorInfo;
use llp_core::{
    derive_substream_seed, FourMomentum, RngHandle, SimError, WeightedSample,
};
use llp_model::{
    DirectChannel, MixingChannel, Model, ProductionChannel, ThreeBodyChannel, TwoBodyChannel,
};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::config::PreselectionFn;
use crate::inflight::decay_in_flight_probability;
use crate::persist::{ArtifactKey, SpectrumStore};
use crate::provider::{SpectrumProvider, SpectrumRecord};
use crate::threebody::decay_in_restframe_three_body;
use crate::twobody::decay_in_restframe_two_body;

/// Spectrum records below this weight carry no measurable flux and are
/// dropped before sampling.
pub const WEIGHT_FLOOR: f64 = 1e-6;

/// Mixing production is only defined below this LLP mass.
const MIXING_MASS_MAX: f64 = 1.699;

/// Relative smearing width applied when a record is resampled more than
/// once.
const SMEAR_SIGMA: f64 = 0.05;

/// Why a channel produced no ensemble at the requested mass. None of these
/// abort the run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SkipReason {
    /// The requested mass lies outside the channel's configured window.
    MassWindow,
    /// The parent mass does not exceed the daughter plus LLP masses.
    BelowThreshold,
    /// The spectrum provider has no table for the parent.
    MissingSpectrum,
    /// A direct-production benchmark ensemble is unavailable.
    MissingBenchmark,
}

/// Per-channel dispatch outcome.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum ChannelOutcome {
    /// The ensemble was generated and persisted.
    Generated {
        /// Number of lab-frame samples.
        samples: usize,
        /// Sum of the sample weights.
        total_weight: f64,
    },
    /// The channel was skipped at this mass.
    Skipped(SkipReason),
}

/// Summary returned to callers after dispatching all selected channels.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductionSummary {
    /// Outcome per channel label.
    pub channels: BTreeMap<String, ChannelOutcome>,
}

/// Converts spectrum records into a four-momentum ensemble at the given
/// particle mass.
///
/// Each record is assigned a uniform azimuth; when `nsample > 1` the angle
/// and momentum are additionally smeared by a 5 % Gaussian factor and the
/// weight split evenly across the resamples. Records below the weight floor
/// are dropped unless `keep_all` is set (benchmark ensembles keep every
/// record so they stay aligned pairwise).
pub fn ensemble_from_records(
    records: &[SpectrumRecord],
    mass: f64,
    nsample: usize,
    preselection: Option<&PreselectionFn>,
    keep_all: bool,
    rng: &mut RngHandle,
) -> Vec<WeightedSample> {
    let mut samples = Vec::new();
    for record in records {
        if !keep_all && record.weight < WEIGHT_FLOOR {
            continue;
        }
        if !keep_all {
            if let Some(cut) = preselection {
                if !cut(record.theta, record.p) {
                    continue;
                }
            }
        }
        for _ in 0..nsample {
            let phi = rng.uniform(-std::f64::consts::PI, std::f64::consts::PI);
            let (f_theta, f_p) = if nsample == 1 {
                (1.0, 1.0)
            } else {
                (rng.normal(1.0, SMEAR_SIGMA), rng.normal(1.0, SMEAR_SIGMA))
            };
            let theta = record.theta * f_theta;
            let p = record.p * f_p;
            let e = (p * p + mass * mass).sqrt();
            let (sin_theta, cos_theta) = theta.sin_cos();
            let pz = p * cos_theta;
            let pt = p * sin_theta;
            let (sin_phi, cos_phi) = phi.sin_cos();
            samples.push(WeightedSample::new(
                FourMomentum::new(pt * cos_phi, pt * sin_phi, pz, e),
                record.weight / nsample as f64,
            ));
        }
    }
    samples
}

/// Generates and persists the lab-frame LLP ensemble of every selected
/// production channel at the given mass and coupling.
///
/// Channels are independent and dispatched in parallel, each with its own
/// substream-seeded RNG, so the result is reproducible for a fixed master
/// seed regardless of scheduling.
pub fn generate_llp_spectra(
    model: &Model,
    mass: f64,
    coupling: f64,
    selection: Option<&[String]>,
    provider: &dyn SpectrumProvider,
    store: &dyn SpectrumStore,
    seed: u64,
) -> Result<ProductionSummary, SimError> {
    let selected: Vec<(&String, &ProductionChannel)> = model
        .channels()
        .iter()
        .filter(|(label, _)| {
            selection.map_or(true, |labels| labels.iter().any(|l| l == *label))
        })
        .collect();

    let outcomes: Result<Vec<(String, ChannelOutcome)>, SimError> = selected
        .par_iter()
        .enumerate()
        .map(|(index, (label, channel))| {
            let mut rng = RngHandle::from_seed(derive_substream_seed(seed, index as u64));
            let outcome =
                dispatch_channel(model, label, channel, mass, coupling, provider, store, &mut rng)?;
            Ok(((*label).clone(), outcome))
        })
        .collect();

    Ok(ProductionSummary {
        channels: outcomes?.into_iter().collect(),
    })
}

#[allow(clippy::too_many_arguments)]
fn dispatch_channel(
    model: &Model,
    label: &str,
    channel: &ProductionChannel,
    mass: f64,
    coupling: f64,
    provider: &dyn SpectrumProvider,
    store: &dyn SpectrumStore,
    rng: &mut RngHandle,
) -> Result<ChannelOutcome, SimError> {
    if let Some((lo, hi)) = channel.mass_range() {
        if mass < lo || mass > hi {
            return Ok(ChannelOutcome::Skipped(SkipReason::MassWindow));
        }
    }

    let ensemble = match channel {
        ProductionChannel::TwoBody(two_body) => {
            match two_body_ensemble(two_body, mass, coupling, provider, rng)? {
                Err(reason) => return Ok(ChannelOutcome::Skipped(reason)),
                Ok(ensemble) => ensemble,
            }
        }
        ProductionChannel::ThreeBody(three_body) => {
            match three_body_ensemble(three_body, mass, coupling, provider, rng)? {
                Err(reason) => return Ok(ChannelOutcome::Skipped(reason)),
                Ok(ensemble) => ensemble,
            }
        }
        ProductionChannel::Mixing(mixing) => {
            match mixing_ensemble(mixing, mass, coupling, provider, rng)? {
                Err(reason) => return Ok(ChannelOutcome::Skipped(reason)),
                Ok(ensemble) => ensemble,
            }
        }
        ProductionChannel::Direct(direct) => {
            match direct_ensemble(direct, model.name(), label, mass, coupling, provider, rng)? {
                Err(reason) => return Ok(ChannelOutcome::Skipped(reason)),
                Ok(ensemble) => ensemble,
            }
        }
    };

    let key = ArtifactKey::new(model.name(), channel.energy(), label, mass);
    store.store(&key, &ensemble)?;
    Ok(ChannelOutcome::Generated {
        samples: ensemble.len(),
        total_weight: llp_core::total_weight(&ensemble),
    })
}

type ChannelEnsemble = Result<Vec<WeightedSample>, SkipReason>;

fn unknown_species(label: &str, pid: i32) -> SimError {
    SimError::Production(
        ErrorInfo::new("unknown-species", "no mass table entry for particle")
            .with_context("channel", label)
            .with_context("pid", pid.to_string()),
    )
}

fn two_body_ensemble(
    channel: &TwoBodyChannel,
    mass: f64,
    coupling: f64,
    provider: &dyn SpectrumProvider,
    rng: &mut RngHandle,
) -> Result<ChannelEnsemble, SimError> {
    let m0 = channel
        .parent
        .mass(mass)
        .ok_or_else(|| unknown_species("2body", channel.parent.as_raw()))?;
    let m1 = channel
        .daughter
        .mass(mass)
        .ok_or_else(|| unknown_species("2body", channel.daughter.as_raw()))?;
    if m0 <= m1 + mass {
        return Ok(Err(SkipReason::BelowThreshold));
    }

    let Some(records) = provider.spectrum(&channel.generator, &channel.energy, channel.parent)?
    else {
        return Ok(Err(SkipReason::MissingSpectrum));
    };
    let parents = ensemble_from_records(&records, m0, 1, None, false, rng);

    let branching = (channel.branching)(mass, coupling);
    let rest_frame =
        decay_in_restframe_two_body(branching, m0, m1, mass, channel.nsample, rng)?;

    Ok(Ok(combine_with_parents(channel.parent, &parents, &rest_frame)))
}

fn three_body_ensemble(
    channel: &ThreeBodyChannel,
    mass: f64,
    coupling: f64,
    provider: &dyn SpectrumProvider,
    rng: &mut RngHandle,
) -> Result<ChannelEnsemble, SimError> {
    let m0 = channel
        .parent
        .mass(mass)
        .ok_or_else(|| unknown_species("3body", channel.parent.as_raw()))?;
    let m1 = channel
        .daughter1
        .mass(mass)
        .ok_or_else(|| unknown_species("3body", channel.daughter1.as_raw()))?;
    let m2 = channel
        .daughter2
        .mass(mass)
        .ok_or_else(|| unknown_species("3body", channel.daughter2.as_raw()))?;
    if m0 <= m1 + m2 + mass {
        return Ok(Err(SkipReason::BelowThreshold));
    }

    let Some(records) = provider.spectrum(&channel.generator, &channel.energy, channel.parent)?
    else {
        return Ok(Err(SkipReason::MissingSpectrum));
    };
    let parents = ensemble_from_records(&records, m0, 1, None, false, rng);

    let rest_frame = decay_in_restframe_three_body(
        &channel.rate,
        coupling,
        m0,
        m1,
        m2,
        mass,
        channel.nsample,
        rng,
    )?;

    Ok(Ok(combine_with_parents(channel.parent, &parents, &rest_frame)))
}

/// The O(parents x rest-frame samples) combinatorial expansion; the
/// dominant cost driver of a production run.
fn combine_with_parents(
    parent_id: llp_core::ParticleId,
    parents: &[WeightedSample],
    rest_frame: &[WeightedSample],
) -> Vec<WeightedSample> {
    let mut ensemble = Vec::with_capacity(parents.len() * rest_frame.len());
    for parent in parents {
        let in_flight = decay_in_flight_probability(parent_id, &parent.momentum);
        let beta = parent.momentum.boost_velocity();
        for llp in rest_frame {
            ensemble.push(WeightedSample::new(
                llp.momentum.boosted(&beta),
                parent.weight * llp.weight * in_flight,
            ));
        }
    }
    ensemble
}

fn mixing_ensemble(
    channel: &MixingChannel,
    mass: f64,
    coupling: f64,
    provider: &dyn SpectrumProvider,
    rng: &mut RngHandle,
) -> Result<ChannelEnsemble, SimError> {
    if mass > MIXING_MASS_MAX {
        return Ok(Err(SkipReason::MassWindow));
    }
    let parent_mass = channel
        .parent
        .mass(mass)
        .ok_or_else(|| unknown_species("mixing", channel.parent.as_raw()))?;

    let Some(records) = provider.spectrum(&channel.generator, &channel.energy, channel.parent)?
    else {
        return Ok(Err(SkipReason::MissingSpectrum));
    };
    let parents = ensemble_from_records(&records, parent_mass, 1, None, false, rng);

    let angle = (channel.mixing)(mass, coupling);
    let factor = angle * angle;
    Ok(Ok(parents
        .into_iter()
        .map(|parent| WeightedSample::new(parent.momentum, parent.weight * factor))
        .collect()))
}

fn direct_ensemble(
    channel: &DirectChannel,
    model_name: &str,
    label: &str,
    mass: f64,
    coupling: f64,
    provider: &dyn SpectrumProvider,
    rng: &mut RngHandle,
) -> Result<ChannelEnsemble, SimError> {
    let masses = &channel.benchmark_masses;
    let (Some(first), Some(last)) = (masses.first().copied(), masses.last().copied()) else {
        return Ok(Err(SkipReason::MissingBenchmark));
    };
    if mass < first || mass > last {
        return Ok(Err(SkipReason::MassWindow));
    }

    // Bracketing benchmarks; an exact hit on the top benchmark collapses to
    // a single point.
    let mass0 = masses.iter().copied().filter(|m| *m <= mass).fold(first, f64::max);
    let mass1 = masses
        .iter()
        .copied()
        .filter(|m| *m > mass)
        .fold(f64::INFINITY, f64::min);
    let mass1 = if mass1.is_finite() { mass1 } else { mass0 };

    let Some(records0) = provider.direct_benchmark(model_name, &channel.energy, label, mass0)?
    else {
        return Ok(Err(SkipReason::MissingBenchmark));
    };
    let Some(records1) = provider.direct_benchmark(model_name, &channel.energy, label, mass1)?
    else {
        return Ok(Err(SkipReason::MissingBenchmark));
    };

    let momenta = ensemble_from_records(&records0, mass0, 1, None, true, rng);
    let coupling_factor = coupling * coupling / (channel.coupling_ref * channel.coupling_ref);

    let mut ensemble = Vec::new();
    for (sample0, record1) in momenta.iter().zip(records1.iter()) {
        if let Some(condition) = &channel.condition {
            if !condition(&sample0.momentum) {
                continue;
            }
        }
        let weight = if mass1 > mass0 {
            sample0.weight + (record1.weight - sample0.weight) * (mass - mass0) / (mass1 - mass0)
        } else {
            sample0.weight
        };
        ensemble.push(WeightedSample::new(
            sample0.momentum,
            weight * coupling_factor,
        ));
    }
    Ok(Ok(ensemble))
}
