//! Parent-spectrum collaborator contract.
//!
//! Reading spectrum tables from disk (and their directory conventions) lives
//! outside the engine; the dispatcher only consumes `(angle, momentum,
//! weight)` triplets through this trait.

use llp_core::{ParticleId, SimError};
use serde::{Deserialize, Serialize};

/// One record of a parent-hadron spectrum: polar angle with respect to the
/// beam axis, total momentum, and the weight carried by the bin.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpectrumRecord {
    /// Polar angle in radians.
    pub theta: f64,
    /// Total momentum in GeV.
    pub p: f64,
    /// Cross-section weight of the record.
    pub weight: f64,
}

impl SpectrumRecord {
    /// Creates a record.
    pub fn new(theta: f64, p: f64, weight: f64) -> Self {
        Self { theta, p, weight }
    }
}

/// External provider of parent spectra and direct-production benchmarks.
///
/// Absence of a table is a normal outcome (`Ok(None)`), causing the
/// dispatcher to skip the channel; errors are reserved for genuinely broken
/// lookups.
pub trait SpectrumProvider: Send + Sync {
    /// Parent-hadron lab-frame spectrum for a generator/energy combination.
    fn spectrum(
        &self,
        generator: &str,
        energy: &str,
        parent: ParticleId,
    ) -> Result<Option<Vec<SpectrumRecord>>, SimError>;

    /// Precomputed LLP ensemble for a direct-production channel at one of
    /// its benchmark masses.
    fn direct_benchmark(
        &self,
        model: &str,
        energy: &str,
        label: &str,
        mass: f64,
    ) -> Result<Option<Vec<SpectrumRecord>>, SimError>;
}
