//! Forward-LLP simulation engine: production-channel dispatch, detector
//! acceptance and coupling-scan aggregation.
//!
//! The pipeline has two halves joined by a persistence store. The dispatcher
//! ([`generate_llp_spectra`]) turns parent-hadron spectra into lab-frame LLP
//! ensembles at a reference coupling, one artifact per production channel.
//! The aggregators ([`count_decay_events`], [`count_interaction_events`])
//! read those artifacts back and fold them into expected event counts over a
//! coupling grid, rescaling weights instead of re-simulating.

#![deny(missing_docs)]

pub mod aggregate;
pub mod config;
pub mod detector;
pub mod inflight;
pub mod persist;
pub mod provider;
pub mod spectrum;
pub mod threebody;
pub mod twobody;

pub use aggregate::{
    count_decay_events, count_interaction_events, CouplingScanResult, EventDiagnostic,
    INV_FB_TO_INV_PB,
};
pub use config::{log_spaced_couplings, Aperture, DetectorConfig, PreselectionFn, ScanConfig};
pub use detector::{
    accepts, decay_in_volume_probability, interaction_probability, transverse_position,
};
pub use inflight::decay_in_flight_probability;
pub use persist::{ArtifactKey, DirStore, MemoryStore, SpectrumStore};
pub use provider::{SpectrumProvider, SpectrumRecord};
pub use spectrum::{
    ensemble_from_records, generate_llp_spectra, ChannelOutcome, ProductionSummary, SkipReason,
    WEIGHT_FLOOR,
};
pub use threebody::decay_in_restframe_three_body;
pub use twobody::{decay_in_restframe_two_body, two_body_decay};
