//! Production-channel descriptions.
//!
//! Each channel is registered once at model-configuration time and is
//! immutable thereafter. The original heterogeneous positional records are
//! re-architected as a sum type with named fields per variant, and the
//! string-embedded branching/condition expressions are replaced by typed
//! closures resolved at registration.

use llp_core::errors::ErrorInfo;
use llp_core::{FourMomentum, ParticleId, SimError};

use crate::rescale::CouplingScaling;

/// Branching fraction as a function of `(mass, coupling)`.
pub type BranchingFn = Box<dyn Fn(f64, f64) -> f64 + Send + Sync>;

/// Mixing angle as a function of `(mass, coupling)`.
pub type MixingFn = Box<dyn Fn(f64, f64) -> f64 + Send + Sync>;

/// Per-sample filter over kinematic observables of a direct-production
/// benchmark sample.
pub type ConditionFn = Box<dyn Fn(&FourMomentum) -> bool + Send + Sync>;

/// Kinematic point at which a three-body differential rate is evaluated.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ThreeBodyPoint {
    /// Invariant mass squared of the virtual intermediate.
    pub q2: f64,
    /// Invariant mass of the virtual intermediate.
    pub q: f64,
    /// Cosine of the intermediate decay angle.
    pub costheta: f64,
    /// Coupling at which the ensemble is generated.
    pub coupling: f64,
}

/// Differential branching rate `dGamma/dq2 dcos(theta)` for three-body decays.
pub type DifferentialRateFn = Box<dyn Fn(&ThreeBodyPoint) -> f64 + Send + Sync>;

/// LLP production through a two-body parent decay `parent -> daughter + LLP`.
pub struct TwoBodyChannel {
    /// Parent hadron.
    pub parent: ParticleId,
    /// Visible daughter.
    pub daughter: ParticleId,
    /// Branching fraction of the decay.
    pub branching: BranchingFn,
    /// Spectrum generator identifier.
    pub generator: String,
    /// Collider energy identifier (TeV label).
    pub energy: String,
    /// Number of rest-frame decay samples per parent.
    pub nsample: usize,
    /// Optional valid LLP mass window.
    pub mass_range: Option<(f64, f64)>,
    /// Coupling-scaling rule.
    pub scaling: CouplingScaling,
}

impl TwoBodyChannel {
    /// Creates a channel with one rest-frame sample, no mass window and the
    /// default amplitude-squared scaling.
    pub fn new(
        parent: ParticleId,
        daughter: ParticleId,
        branching: BranchingFn,
        generator: impl Into<String>,
        energy: impl Into<String>,
    ) -> Self {
        Self {
            parent,
            daughter,
            branching,
            generator: generator.into(),
            energy: energy.into(),
            nsample: 1,
            mass_range: None,
            scaling: CouplingScaling::default_power(),
        }
    }

    /// Sets the rest-frame sample count.
    pub fn with_nsample(mut self, nsample: usize) -> Self {
        self.nsample = nsample;
        self
    }

    /// Restricts the channel to an LLP mass window.
    pub fn with_mass_range(mut self, lo: f64, hi: f64) -> Self {
        self.mass_range = Some((lo, hi));
        self
    }

    /// Overrides the coupling-scaling rule.
    pub fn with_scaling(mut self, scaling: CouplingScaling) -> Self {
        self.scaling = scaling;
        self
    }
}

/// LLP production through a three-body parent decay
/// `parent -> daughter1 + daughter2 + LLP`.
pub struct ThreeBodyChannel {
    /// Parent hadron.
    pub parent: ParticleId,
    /// First visible daughter.
    pub daughter1: ParticleId,
    /// Second visible daughter.
    pub daughter2: ParticleId,
    /// Differential branching rate evaluated per Monte Carlo draw.
    pub rate: DifferentialRateFn,
    /// Spectrum generator identifier.
    pub generator: String,
    /// Collider energy identifier (TeV label).
    pub energy: String,
    /// Number of rest-frame phase-space draws per parent.
    pub nsample: usize,
    /// Optional valid LLP mass window.
    pub mass_range: Option<(f64, f64)>,
    /// Coupling-scaling rule.
    pub scaling: CouplingScaling,
}

impl ThreeBodyChannel {
    /// Creates a channel with one phase-space draw, no mass window and the
    /// default amplitude-squared scaling.
    pub fn new(
        parent: ParticleId,
        daughter1: ParticleId,
        daughter2: ParticleId,
        rate: DifferentialRateFn,
        generator: impl Into<String>,
        energy: impl Into<String>,
    ) -> Self {
        Self {
            parent,
            daughter1,
            daughter2,
            rate,
            generator: generator.into(),
            energy: energy.into(),
            nsample: 1,
            mass_range: None,
            scaling: CouplingScaling::default_power(),
        }
    }

    /// Sets the phase-space draw count.
    pub fn with_nsample(mut self, nsample: usize) -> Self {
        self.nsample = nsample;
        self
    }

    /// Restricts the channel to an LLP mass window.
    pub fn with_mass_range(mut self, lo: f64, hi: f64) -> Self {
        self.mass_range = Some((lo, hi));
        self
    }

    /// Overrides the coupling-scaling rule.
    pub fn with_scaling(mut self, scaling: CouplingScaling) -> Self {
        self.scaling = scaling;
        self
    }
}

/// LLP production through mixing with a SM hadron: each parent spectrum
/// sample is reused directly as the LLP momentum, weighted by the mixing
/// angle squared.
pub struct MixingChannel {
    /// Mixing partner hadron.
    pub parent: ParticleId,
    /// Mixing angle as a function of `(mass, coupling)`.
    pub mixing: MixingFn,
    /// Spectrum generator identifier.
    pub generator: String,
    /// Collider energy identifier (TeV label).
    pub energy: String,
    /// Optional valid LLP mass window.
    pub mass_range: Option<(f64, f64)>,
    /// Coupling-scaling rule.
    pub scaling: CouplingScaling,
}

impl MixingChannel {
    /// Creates a channel with no mass window and the default scaling.
    pub fn new(
        parent: ParticleId,
        mixing: MixingFn,
        generator: impl Into<String>,
        energy: impl Into<String>,
    ) -> Self {
        Self {
            parent,
            mixing,
            generator: generator.into(),
            energy: energy.into(),
            mass_range: None,
            scaling: CouplingScaling::default_power(),
        }
    }

    /// Restricts the channel to an LLP mass window.
    pub fn with_mass_range(mut self, lo: f64, hi: f64) -> Self {
        self.mass_range = Some((lo, hi));
        self
    }

    /// Overrides the coupling-scaling rule.
    pub fn with_scaling(mut self, scaling: CouplingScaling) -> Self {
        self.scaling = scaling;
        self
    }
}

/// Direct LLP production from externally precomputed benchmark ensembles at
/// fixed mass points; weights are interpolated linearly between the two
/// benchmarks bracketing the requested mass.
pub struct DirectChannel {
    /// Collider energy identifier (TeV label).
    pub energy: String,
    /// Coupling at which the benchmark ensembles were produced. The
    /// `coupling^2/reference^2` dependence is baked into the stored weights
    /// rather than routed through the rescaling law.
    pub coupling_ref: f64,
    /// Optional per-sample filter applied before interpolation.
    pub condition: Option<ConditionFn>,
    /// Available benchmark masses, strictly increasing.
    pub benchmark_masses: Vec<f64>,
    /// Power-law exponent used when rescaling aggregated yields.
    pub scaling_exponent: f64,
}

impl DirectChannel {
    /// Creates a channel with reference coupling one, no filter and the
    /// default exponent.
    pub fn new(energy: impl Into<String>, benchmark_masses: Vec<f64>) -> Self {
        Self {
            energy: energy.into(),
            coupling_ref: 1.0,
            condition: None,
            benchmark_masses,
            scaling_exponent: 2.0,
        }
    }

    /// Sets the benchmark reference coupling.
    pub fn with_coupling_ref(mut self, coupling_ref: f64) -> Self {
        self.coupling_ref = coupling_ref;
        self
    }

    /// Installs a per-sample filter.
    pub fn with_condition(mut self, condition: ConditionFn) -> Self {
        self.condition = Some(condition);
        self
    }

    /// Overrides the power-law exponent.
    pub fn with_scaling_exponent(mut self, exponent: f64) -> Self {
        self.scaling_exponent = exponent;
        self
    }
}

/// Tagged union over the supported production mechanisms.
pub enum ProductionChannel {
    /// Two-body parent decay.
    TwoBody(TwoBodyChannel),
    /// Three-body parent decay.
    ThreeBody(ThreeBodyChannel),
    /// Mixing with a SM hadron.
    Mixing(MixingChannel),
    /// Precomputed direct production.
    Direct(DirectChannel),
}

impl ProductionChannel {
    /// Optional LLP mass window for the channel.
    pub fn mass_range(&self) -> Option<(f64, f64)> {
        match self {
            ProductionChannel::TwoBody(channel) => channel.mass_range,
            ProductionChannel::ThreeBody(channel) => channel.mass_range,
            ProductionChannel::Mixing(channel) => channel.mass_range,
            ProductionChannel::Direct(_) => None,
        }
    }

    /// Collider energy identifier.
    pub fn energy(&self) -> &str {
        match self {
            ProductionChannel::TwoBody(channel) => &channel.energy,
            ProductionChannel::ThreeBody(channel) => &channel.energy,
            ProductionChannel::Mixing(channel) => &channel.energy,
            ProductionChannel::Direct(channel) => &channel.energy,
        }
    }

    /// Coupling-rescaling factor mapping a reference-coupling weight to the
    /// target coupling.
    pub fn scaling_factor(&self, coupling: f64, reference: f64) -> f64 {
        match self {
            ProductionChannel::TwoBody(channel) => channel.scaling.factor(coupling, reference),
            ProductionChannel::ThreeBody(channel) => channel.scaling.factor(coupling, reference),
            ProductionChannel::Mixing(channel) => channel.scaling.factor(coupling, reference),
            ProductionChannel::Direct(channel) => {
                (coupling / reference).powf(channel.scaling_exponent)
            }
        }
    }

    /// Validates the channel at registration time so malformed configurations
    /// fail fast instead of deep inside the sampling loop.
    pub fn validate(&self, label: &str) -> Result<(), SimError> {
        let invalid = |code: &str, message: &str| {
            Err(SimError::Production(
                ErrorInfo::new(code, message).with_context("channel", label),
            ))
        };
        if let Some((lo, hi)) = self.mass_range() {
            if lo > hi {
                return invalid("mass-range-inverted", "mass window lower bound exceeds upper");
            }
        }
        match self {
            ProductionChannel::TwoBody(channel) => {
                if channel.nsample == 0 {
                    return invalid("nsample-zero", "two-body channel needs at least one sample");
                }
            }
            ProductionChannel::ThreeBody(channel) => {
                if channel.nsample == 0 {
                    return invalid("nsample-zero", "three-body channel needs at least one draw");
                }
            }
            ProductionChannel::Mixing(_) => {}
            ProductionChannel::Direct(channel) => {
                if channel.benchmark_masses.is_empty() {
                    return invalid("benchmarks-empty", "direct channel has no benchmark masses");
                }
                if channel
                    .benchmark_masses
                    .windows(2)
                    .any(|pair| pair[0] >= pair[1])
                {
                    return invalid(
                        "benchmarks-unsorted",
                        "benchmark masses must be strictly increasing",
                    );
                }
                if channel.coupling_ref <= 0.0 {
                    return invalid("coupling-ref-invalid", "reference coupling must be positive");
                }
            }
        }
        Ok(())
    }
}
