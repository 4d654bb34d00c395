//! Event-count aggregation over a coupling scan.
//!
//! The aggregator reads persisted channel ensembles back from the store,
//! resamples them under the configured preselection, and folds every
//! accepted sample into per-coupling expected event counts. The kinematics
//! of a stored ensemble do not depend on the coupling, so one pass over the
//! samples serves the entire coupling grid.

use llp_core::{derive_substream_seed, RngHandle, SimError};
use llp_model::Model;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::config::{DetectorConfig, ScanConfig};
use crate::detector::{accepts, decay_in_volume_probability, interaction_probability};
use crate::persist::{ArtifactKey, SpectrumStore};
use crate::provider::SpectrumRecord;
use crate::spectrum::ensemble_from_records;

/// Conversion from inverse femtobarns to inverse picobarns, matching the
/// picobarn spectrum weights.
pub const INV_FB_TO_INV_PB: f64 = 1000.0;

/// Kinematics of one accepted sample, kept per coupling for downstream
/// histogramming.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EventDiagnostic {
    /// Transverse-over-longitudinal momentum slope.
    pub slope: f64,
    /// Sample energy in GeV.
    pub energy: f64,
    /// Expected-event weight contributed by the sample.
    pub weight: f64,
}

/// Result of a coupling scan: one expected event count per coupling, plus
/// the accepted-sample diagnostics behind it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CouplingScanResult {
    /// Scanned coupling values, in scan order.
    pub couplings: Vec<f64>,
    /// Proper decay length per coupling; empty for interaction counting.
    pub ctaus: Vec<f64>,
    /// Expected event counts per coupling.
    pub yields: Vec<f64>,
    /// One entry per geometrically accepted sample, per coupling, including
    /// samples whose probability underflowed to zero weight.
    pub diagnostics: Vec<Vec<EventDiagnostic>>,
}

struct Accumulator {
    yields: Vec<f64>,
    diagnostics: Vec<Vec<EventDiagnostic>>,
}

impl Accumulator {
    fn empty(ncoup: usize) -> Self {
        Self {
            yields: vec![0.0; ncoup],
            diagnostics: vec![Vec::new(); ncoup],
        }
    }

    fn merge(mut self, other: Self) -> Self {
        for (lhs, rhs) in self.yields.iter_mut().zip(other.yields) {
            *lhs += rhs;
        }
        for (lhs, rhs) in self.diagnostics.iter_mut().zip(other.diagnostics) {
            lhs.extend(rhs);
        }
        self
    }
}

/// Expected number of LLP decays inside the fiducial volume, per coupling.
///
/// For every selected production mode the persisted ensemble is loaded,
/// resampled, filtered through the geometric acceptance, and weighted by the
/// decay-in-volume probability, the production rescaling to the target
/// coupling, the visible branching factor and the integrated luminosity. A
/// mode with no persisted ensemble is silently skipped.
pub fn count_decay_events(
    model: &Model,
    mass: f64,
    energy: &str,
    scan: &ScanConfig,
    detector: &DetectorConfig,
    store: &dyn SpectrumStore,
    seed: u64,
) -> Result<CouplingScanResult, SimError> {
    let ncoup = scan.couplings.len();
    let mut ctaus = Vec::with_capacity(ncoup);
    let mut branchings = Vec::with_capacity(ncoup);
    for coupling in &scan.couplings {
        ctaus.push(model.ctau(mass, *coupling)?);
        branchings.push(visible_branching(model, mass, *coupling, detector)?);
    }

    let mut total = Accumulator::empty(ncoup);
    for (index, mode) in selected_modes(model, scan).iter().enumerate() {
        let Some((samples, scalings)) =
            mode_samples(model, mass, energy, mode, scan, store, seed, index)?
        else {
            continue;
        };

        let partial = samples
            .par_iter()
            .fold(
                || Accumulator::empty(ncoup),
                |mut acc, sample| {
                    if !accepts(detector, &sample.momentum) {
                        return acc;
                    }
                    let base = sample.weight * detector.luminosity * INV_FB_TO_INV_PB;
                    for icoup in 0..ncoup {
                        let prob = decay_in_volume_probability(
                            ctaus[icoup],
                            &sample.momentum,
                            mass,
                            detector.distance,
                            detector.length,
                        );
                        let weight = base * scalings[icoup] * prob * branchings[icoup];
                        acc.yields[icoup] += weight;
                        acc.diagnostics[icoup].push(EventDiagnostic {
                            slope: sample.momentum.pt() / sample.momentum.pz,
                            energy: sample.momentum.e,
                            weight,
                        });
                    }
                    acc
                },
            )
            .reduce(|| Accumulator::empty(ncoup), Accumulator::merge);
        total = total.merge(partial);
    }

    Ok(CouplingScanResult {
        couplings: scan.couplings.clone(),
        ctaus,
        yields: total.yields,
        diagnostics: total.diagnostics,
    })
}

/// Expected number of LLP scatterings off the instrumented target, per
/// coupling.
///
/// Mirrors [`count_decay_events`] with the decay-in-volume probability
/// replaced by the interaction probability; the cross-section depends on the
/// sample energy, so it is evaluated per sample through the model's
/// cross-section collaborator.
pub fn count_interaction_events(
    model: &Model,
    mass: f64,
    energy: &str,
    scan: &ScanConfig,
    detector: &DetectorConfig,
    store: &dyn SpectrumStore,
    seed: u64,
) -> Result<CouplingScanResult, SimError> {
    let ncoup = scan.couplings.len();

    let mut total = Accumulator::empty(ncoup);
    for (index, mode) in selected_modes(model, scan).iter().enumerate() {
        let Some((samples, scalings)) =
            mode_samples(model, mass, energy, mode, scan, store, seed, index)?
        else {
            continue;
        };

        let partial = samples
            .par_iter()
            .try_fold(
                || Accumulator::empty(ncoup),
                |mut acc, sample| {
                    if !accepts(detector, &sample.momentum) {
                        return Ok(acc);
                    }
                    let sigmas = model.cross_sections(
                        mass,
                        &scan.couplings,
                        sample.momentum.e,
                        detector.recoil_min,
                        detector.recoil_max,
                    )?;
                    let base = sample.weight * detector.luminosity * INV_FB_TO_INV_PB;
                    for icoup in 0..ncoup {
                        let prob = interaction_probability(
                            sigmas[icoup],
                            detector.number_density,
                            detector.length,
                        );
                        let weight = base * scalings[icoup] * prob;
                        acc.yields[icoup] += weight;
                        acc.diagnostics[icoup].push(EventDiagnostic {
                            slope: sample.momentum.pt() / sample.momentum.pz,
                            energy: sample.momentum.e,
                            weight,
                        });
                    }
                    Ok(acc)
                },
            )
            .try_reduce(
                || Accumulator::empty(ncoup),
                |lhs, rhs| Ok(lhs.merge(rhs)),
            )?;
        total = total.merge(partial);
    }

    Ok(CouplingScanResult {
        couplings: scan.couplings.clone(),
        ctaus: Vec::new(),
        yields: total.yields,
        diagnostics: total.diagnostics,
    })
}

fn visible_branching(
    model: &Model,
    mass: f64,
    coupling: f64,
    detector: &DetectorConfig,
) -> Result<f64, SimError> {
    match &detector.visible_channels {
        None => Ok(1.0),
        Some(channels) => {
            let mut sum = 0.0;
            for channel in channels {
                sum += model.branching_ratio(channel, mass, coupling)?;
            }
            Ok(sum)
        }
    }
}

fn selected_modes(model: &Model, scan: &ScanConfig) -> Vec<String> {
    match &scan.modes {
        Some(modes) => modes.clone(),
        None => model.channels().keys().cloned().collect(),
    }
}

/// Loads and resamples one mode's persisted ensemble, returning `None` when
/// the mode was never simulated or its label is unknown. The per-coupling
/// production rescaling factors ride along.
#[allow(clippy::too_many_arguments)]
fn mode_samples(
    model: &Model,
    mass: f64,
    energy: &str,
    mode: &str,
    scan: &ScanConfig,
    store: &dyn SpectrumStore,
    seed: u64,
    index: usize,
) -> Result<Option<(Vec<llp_core::WeightedSample>, Vec<f64>)>, SimError> {
    let Some(channel) = model.channel(mode) else {
        return Ok(None);
    };
    let key = ArtifactKey::new(model.name(), energy, mode, mass);
    let Some(stored) = store.load(&key)? else {
        return Ok(None);
    };

    let records: Vec<SpectrumRecord> = stored
        .iter()
        .map(|sample| {
            SpectrumRecord::new(sample.momentum.theta(), sample.momentum.p(), sample.weight)
        })
        .collect();

    let mut rng = RngHandle::from_seed(derive_substream_seed(seed, index as u64));
    let samples = ensemble_from_records(
        &records,
        mass,
        scan.nsample,
        scan.preselection.as_ref(),
        false,
        &mut rng,
    );

    let scalings = scan
        .couplings
        .iter()
        .map(|coupling| channel.scaling_factor(*coupling, scan.coupling_ref))
        .collect();

    Ok(Some((samples, scalings)))
}
