//! Coupling rescaling law.
//!
//! Every production channel records the coupling at which its ensemble was
//! simulated; all other couplings in a scan are obtained by multiplying the
//! stored weights with the channel's scaling factor instead of resimulating.
//! Different new-physics operators scale production rates with different
//! powers of the coupling, so the law is explicit and channel-specific.

/// Amplitude-level function of the coupling used by manual scaling rules.
pub type AmplitudeFn = Box<dyn Fn(f64) -> f64 + Send + Sync>;

/// Channel-specific coupling-scaling rule.
pub enum CouplingScaling {
    /// Fixed power law `(coupling/reference)^n`. The default `n = 2` matches
    /// an amplitude-squared dependence.
    Power(f64),
    /// User-supplied rescaling expression evaluated at both couplings.
    Manual {
        /// Amplitude expression in the coupling variable.
        amplitude: AmplitudeFn,
        /// Whether the amplitude ratio is squared. True for mixing channels,
        /// where the stored weight carries the mixing angle squared; false
        /// for body-decay channels whose rate expression already carries the
        /// full coupling dependence.
        squared: bool,
    },
}

impl CouplingScaling {
    /// The default amplitude-squared power law.
    pub fn default_power() -> Self {
        CouplingScaling::Power(2.0)
    }

    /// Manual rule with an unsquared amplitude ratio (body decays).
    pub fn manual(amplitude: AmplitudeFn) -> Self {
        CouplingScaling::Manual {
            amplitude,
            squared: false,
        }
    }

    /// Manual rule with a squared amplitude ratio (mixing).
    pub fn manual_squared(amplitude: AmplitudeFn) -> Self {
        CouplingScaling::Manual {
            amplitude,
            squared: true,
        }
    }

    /// Multiplicative factor mapping a weight computed at `reference` to the
    /// target `coupling`.
    pub fn factor(&self, coupling: f64, reference: f64) -> f64 {
        match self {
            CouplingScaling::Power(exponent) => (coupling / reference).powf(*exponent),
            CouplingScaling::Manual { amplitude, squared } => {
                let ratio = amplitude(coupling) / amplitude(reference);
                if *squared {
                    ratio * ratio
                } else {
                    ratio
                }
            }
        }
    }
}

impl std::fmt::Debug for CouplingScaling {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CouplingScaling::Power(exponent) => {
                f.debug_tuple("Power").field(exponent).finish()
            }
            CouplingScaling::Manual { squared, .. } => f
                .debug_struct("Manual")
                .field("squared", squared)
                .finish_non_exhaustive(),
        }
    }
}
