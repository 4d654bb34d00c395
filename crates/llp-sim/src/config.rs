//! Explicit configuration objects for detector geometry and coupling scans.
//!
//! There is no process-wide state: every simulation and aggregation call
//! receives its configuration as a read-only argument, so concurrent runs
//! with different setups are safe.

/// Geometric acceptance predicate over the transverse position at the
/// fiducial-volume entrance.
pub enum Aperture {
    /// Circular aperture of the given radius, centered on the beam axis.
    Circle {
        /// Aperture radius in meters.
        radius: f64,
    },
    /// Arbitrary predicate over `(x, y)` in meters.
    Custom(Box<dyn Fn(f64, f64) -> bool + Send + Sync>),
}

impl Aperture {
    /// Whether the transverse position lies inside the aperture.
    pub fn accepts(&self, x: f64, y: f64) -> bool {
        match self {
            Aperture::Circle { radius } => (x * x + y * y).sqrt() < *radius,
            Aperture::Custom(predicate) => predicate(x, y),
        }
    }
}

impl std::fmt::Debug for Aperture {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Aperture::Circle { radius } => f.debug_struct("Circle").field("radius", radius).finish(),
            Aperture::Custom(_) => f.debug_struct("Custom").finish_non_exhaustive(),
        }
    }
}

/// Detector geometry and run conditions, configured once and read-only
/// during simulation.
#[derive(Debug)]
pub struct DetectorConfig {
    /// Distance from the interaction point to the fiducial volume entrance,
    /// in meters.
    pub distance: f64,
    /// Fiducial volume length along the beam axis, in meters.
    pub length: f64,
    /// Integrated luminosity in inverse femtobarns.
    pub luminosity: f64,
    /// Transverse acceptance predicate at the volume entrance.
    pub aperture: Aperture,
    /// Target number density for interaction mode, per cubic meter.
    pub number_density: f64,
    /// Lower edge of the recoil-energy integration window, in GeV.
    pub recoil_min: f64,
    /// Upper edge of the recoil-energy integration window, in GeV.
    pub recoil_max: f64,
    /// Visible decay channels summed into the branching factor; `None`
    /// counts all decays (branching factor 1).
    pub visible_channels: Option<Vec<String>>,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            distance: 480.0,
            length: 5.0,
            luminosity: 3000.0,
            aperture: Aperture::Circle { radius: 1.0 },
            number_density: 3.754e29,
            recoil_min: 0.03,
            recoil_max: 1.0,
            visible_channels: None,
        }
    }
}

/// Preselection cut over `(theta, p)` of a stored sample, applied before
/// resampling during aggregation.
pub type PreselectionFn = Box<dyn Fn(f64, f64) -> bool + Send + Sync>;

/// Coupling-scan configuration for the event-count aggregator.
pub struct ScanConfig {
    /// Coupling values to scan, in scan order.
    pub couplings: Vec<f64>,
    /// Production-channel labels to aggregate; `None` selects all channels
    /// registered on the model.
    pub modes: Option<Vec<String>>,
    /// Number of smeared resamples per stored sample.
    pub nsample: usize,
    /// Optional preselection cut.
    pub preselection: Option<PreselectionFn>,
    /// Coupling at which the persisted ensembles were generated.
    pub coupling_ref: f64,
}

impl ScanConfig {
    /// Creates a scan over the given couplings with one resample per stored
    /// sample, no preselection and reference coupling one.
    pub fn new(couplings: Vec<f64>) -> Self {
        Self {
            couplings,
            modes: None,
            nsample: 1,
            preselection: None,
            coupling_ref: 1.0,
        }
    }

    /// Restricts aggregation to the given production modes.
    pub fn with_modes(mut self, modes: Vec<String>) -> Self {
        self.modes = Some(modes);
        self
    }

    /// Sets the resample count.
    pub fn with_nsample(mut self, nsample: usize) -> Self {
        self.nsample = nsample;
        self
    }

    /// Installs a preselection cut.
    pub fn with_preselection(mut self, preselection: PreselectionFn) -> Self {
        self.preselection = Some(preselection);
        self
    }

    /// Installs the standard forward preselection, `theta < 0.01` and
    /// `p > 100` GeV.
    pub fn with_forward_preselection(self) -> Self {
        self.with_preselection(Box::new(|theta, p| theta < 0.01 && p > 100.0))
    }

    /// Sets the reference coupling the ensembles were generated at.
    pub fn with_coupling_ref(mut self, coupling_ref: f64) -> Self {
        self.coupling_ref = coupling_ref;
        self
    }
}

/// Log-spaced coupling grid from `10^min_exp` to `10^max_exp` inclusive.
pub fn log_spaced_couplings(min_exp: f64, max_exp: f64, count: usize) -> Vec<f64> {
    if count == 0 {
        return Vec::new();
    }
    if count == 1 {
        return vec![10f64.powf(min_exp)];
    }
    let step = (max_exp - min_exp) / (count - 1) as f64;
    (0..count)
        .map(|index| 10f64.powf(min_exp + step * index as f64))
        .collect()
}
