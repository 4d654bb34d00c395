//! The model aggregate: production channels plus the lifetime, branching
//! ratio and interaction cross-section collaborators.
//!
//! The collaborator functions are black boxes (typically backed by tabulated
//! interpolation outside this crate). Each is either parametrized by a single
//! reference coupling with a fixed power-law dependence, or supplied as an
//! explicit function of `(mass, coupling)` with no assumed scaling. An unset
//! collaborator is a configuration error, not a silent default, so callers
//! can distinguish "physically negligible" from "not configured".

use std::collections::BTreeMap;

use llp_core::errors::ErrorInfo;
use llp_core::SimError;

use crate::channel::ProductionChannel;

/// Proper decay length at the reference coupling, as a function of mass.
pub type CtauRefFn = Box<dyn Fn(f64) -> f64 + Send + Sync>;

/// Proper decay length as an explicit function of `(mass, coupling)`.
pub type CtauFn = Box<dyn Fn(f64, f64) -> f64 + Send + Sync>;

/// Branching ratio as a function of mass only.
pub type BrMassFn = Box<dyn Fn(f64) -> f64 + Send + Sync>;

/// Branching ratio as a function of `(mass, coupling)`.
pub type BrMassCouplingFn = Box<dyn Fn(f64, f64) -> f64 + Send + Sync>;

/// Integrated cross-section at the reference coupling, as a function of
/// `(mass, energy, recoil_min, recoil_max)`.
pub type SigmaRefFn = Box<dyn Fn(f64, f64, f64, f64) -> f64 + Send + Sync>;

/// Integrated cross-section as an explicit function of
/// `(mass, coupling, energy, recoil_min, recoil_max)`.
pub type SigmaFn = Box<dyn Fn(f64, f64, f64, f64, f64) -> f64 + Send + Sync>;

/// Lifetime collaborator.
pub enum Lifetime {
    /// `ctau(mass)` tabulated at `coupling_ref`, rescaled as
    /// `ctau(mass) * coupling_ref^2 / coupling^2`.
    Scaled {
        /// Coupling at which the table was produced.
        coupling_ref: f64,
        /// Proper decay length at the reference coupling.
        ctau: CtauRefFn,
    },
    /// Explicit two-argument function with no assumed scaling.
    Explicit(CtauFn),
}

/// Branching-ratio collaborator for one decay channel.
pub enum BranchingRatio {
    /// One-dimensional table over mass.
    MassOnly(BrMassFn),
    /// Two-dimensional table over mass and coupling.
    MassCoupling(BrMassCouplingFn),
}

/// Interaction cross-section collaborator.
pub enum CrossSection {
    /// Cross-section at `coupling_ref`, rescaled as `coupling^2/ref^2`.
    Scaled {
        /// Coupling at which the cross-section was computed.
        coupling_ref: f64,
        /// Integrated cross-section at the reference coupling.
        sigma: SigmaRefFn,
    },
    /// Explicit function with no assumed scaling.
    Explicit(SigmaFn),
}

/// Aggregate describing one LLP model: production channels keyed by label
/// plus the coupling-rescalable collaborator functions.
pub struct Model {
    name: String,
    channels: BTreeMap<String, ProductionChannel>,
    lifetime: Option<Lifetime>,
    branching: BTreeMap<String, BranchingRatio>,
    cross_section: Option<CrossSection>,
}

impl Model {
    /// Creates an empty model.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            channels: BTreeMap::new(),
            lifetime: None,
            branching: BTreeMap::new(),
            cross_section: None,
        }
    }

    /// Model name, used as the artifact key prefix.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Registers a production channel under a unique label. Channel labels
    /// are resolved once here; malformed channels are rejected immediately.
    pub fn add_production(
        &mut self,
        label: impl Into<String>,
        channel: ProductionChannel,
    ) -> Result<(), SimError> {
        let label = label.into();
        channel.validate(&label)?;
        if self.channels.contains_key(&label) {
            return Err(SimError::Production(
                ErrorInfo::new("duplicate-label", "production channel label already registered")
                    .with_context("channel", label),
            ));
        }
        self.channels.insert(label, channel);
        Ok(())
    }

    /// All registered channels, keyed by label.
    pub fn channels(&self) -> &BTreeMap<String, ProductionChannel> {
        &self.channels
    }

    /// Looks up a channel by label.
    pub fn channel(&self, label: &str) -> Option<&ProductionChannel> {
        self.channels.get(label)
    }

    /// Installs the lifetime collaborator.
    pub fn set_lifetime(&mut self, lifetime: Lifetime) {
        self.lifetime = Some(lifetime);
    }

    /// Installs a branching-ratio collaborator for a visible decay channel.
    pub fn set_branching_ratio(&mut self, channel: impl Into<String>, br: BranchingRatio) {
        self.branching.insert(channel.into(), br);
    }

    /// Installs the interaction cross-section collaborator.
    pub fn set_cross_section(&mut self, cross_section: CrossSection) {
        self.cross_section = Some(cross_section);
    }

    /// Proper decay length for the given mass and coupling.
    pub fn ctau(&self, mass: f64, coupling: f64) -> Result<f64, SimError> {
        match &self.lifetime {
            None => Err(SimError::Config(
                ErrorInfo::new("lifetime-unset", "no lifetime model configured")
                    .with_context("model", self.name.clone())
                    .with_hint("call Model::set_lifetime before simulating"),
            )),
            Some(Lifetime::Scaled { coupling_ref, ctau }) => {
                Ok(ctau(mass) * coupling_ref * coupling_ref / (coupling * coupling))
            }
            Some(Lifetime::Explicit(ctau)) => Ok(ctau(mass, coupling)),
        }
    }

    /// Branching ratio into a visible decay channel.
    pub fn branching_ratio(
        &self,
        channel: &str,
        mass: f64,
        coupling: f64,
    ) -> Result<f64, SimError> {
        match self.branching.get(channel) {
            None => Err(SimError::Config(
                ErrorInfo::new("branching-unset", "no branching ratio configured for channel")
                    .with_context("model", self.name.clone())
                    .with_context("channel", channel)
                    .with_hint("call Model::set_branching_ratio for this channel"),
            )),
            Some(BranchingRatio::MassOnly(br)) => Ok(br(mass)),
            Some(BranchingRatio::MassCoupling(br)) => Ok(br(mass, coupling)),
        }
    }

    /// Integrated interaction cross-sections for a set of couplings at one
    /// event energy. With a reference-coupling model the quadrature runs once
    /// and the per-coupling values follow from the `coupling^2` rescaling.
    pub fn cross_sections(
        &self,
        mass: f64,
        couplings: &[f64],
        energy: f64,
        recoil_min: f64,
        recoil_max: f64,
    ) -> Result<Vec<f64>, SimError> {
        match &self.cross_section {
            None => Err(SimError::Config(
                ErrorInfo::new("cross-section-unset", "no interaction rate configured")
                    .with_context("model", self.name.clone())
                    .with_hint("call Model::set_cross_section before interaction counting"),
            )),
            Some(CrossSection::Scaled { coupling_ref, sigma }) => {
                let reference = sigma(mass, energy, recoil_min, recoil_max);
                Ok(couplings
                    .iter()
                    .map(|coupling| reference * coupling * coupling / (coupling_ref * coupling_ref))
                    .collect())
            }
            Some(CrossSection::Explicit(sigma)) => Ok(couplings
                .iter()
                .map(|coupling| sigma(mass, *coupling, energy, recoil_min, recoil_max))
                .collect()),
        }
    }

    /// Coupling-rescaling factor for a registered channel, or `None` for an
    /// unknown label.
    pub fn production_scaling(
        &self,
        label: &str,
        coupling: f64,
        reference: f64,
    ) -> Option<f64> {
        self.channels
            .get(label)
            .map(|channel| channel.scaling_factor(coupling, reference))
    }
}
