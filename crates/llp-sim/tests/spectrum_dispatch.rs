//! Production-channel dispatch: per-variant weighting, skip reasons and
//! artifact persistence.

use std::collections::BTreeMap;

use llp_core::{FourMomentum, ParticleId, SimError};
use llp_model::{
    DifferentialRateFn, DirectChannel, MixingChannel, Model, ProductionChannel, ThreeBodyChannel,
    TwoBodyChannel,
};
use llp_sim::{
    decay_in_flight_probability, generate_llp_spectra, ArtifactKey, ChannelOutcome, DirStore,
    MemoryStore, SkipReason, SpectrumProvider, SpectrumRecord, SpectrumStore,
};

const B0: i32 = 511;
const KAON: i32 = 321;
const K_LONG: i32 = 130;

#[derive(Default)]
struct StubProvider {
    spectra: BTreeMap<i32, Vec<SpectrumRecord>>,
    benchmarks: BTreeMap<String, Vec<SpectrumRecord>>,
}

impl StubProvider {
    fn with_spectrum(mut self, pid: i32, records: Vec<SpectrumRecord>) -> Self {
        self.spectra.insert(pid, records);
        self
    }

    fn with_benchmark(mut self, label: &str, mass: f64, records: Vec<SpectrumRecord>) -> Self {
        self.benchmarks.insert(format!("{label}:{mass}"), records);
        self
    }
}

impl SpectrumProvider for StubProvider {
    fn spectrum(
        &self,
        _generator: &str,
        _energy: &str,
        parent: ParticleId,
    ) -> Result<Option<Vec<SpectrumRecord>>, SimError> {
        Ok(self.spectra.get(&parent.as_raw()).cloned())
    }

    fn direct_benchmark(
        &self,
        _model: &str,
        _energy: &str,
        label: &str,
        mass: f64,
    ) -> Result<Option<Vec<SpectrumRecord>>, SimError> {
        Ok(self.benchmarks.get(&format!("{label}:{mass}")).cloned())
    }
}

fn b_spectrum() -> Vec<SpectrumRecord> {
    vec![
        SpectrumRecord::new(0.001, 300.0, 0.4),
        SpectrumRecord::new(0.002, 500.0, 0.6),
        // Below the weight floor; must be dropped.
        SpectrumRecord::new(0.003, 100.0, 1e-9),
    ]
}

fn two_body_model(branching: f64) -> Model {
    let mut model = Model::new("test");
    model
        .add_production(
            "B0_K",
            ProductionChannel::TwoBody(TwoBodyChannel::new(
                ParticleId::from_raw(B0),
                ParticleId::from_raw(KAON),
                Box::new(move |_, _| branching),
                "Pythia8",
                "14",
            )),
        )
        .unwrap();
    model
}

#[test]
fn two_body_channel_weight_is_parent_flux_times_branching() {
    let model = two_body_model(2e-5);
    let provider = StubProvider::default().with_spectrum(B0, b_spectrum());
    let store = MemoryStore::new();

    let summary = generate_llp_spectra(&model, 1.0, 1e-4, None, &provider, &store, 42).unwrap();
    let ChannelOutcome::Generated {
        samples,
        total_weight,
    } = summary.channels["B0_K"]
    else {
        panic!("channel was skipped: {:?}", summary.channels["B0_K"]);
    };
    // Two surviving parents, one rest-frame sample each; the B meson never
    // decays upstream so no in-flight attenuation applies.
    assert_eq!(samples, 2);
    assert!((total_weight - 1.0 * 2e-5).abs() < 1e-18);

    let key = ArtifactKey::new("test", "14", "B0_K", 1.0);
    let stored = store.load(&key).unwrap().expect("artifact must exist");
    assert_eq!(stored.len(), 2);
}

#[test]
fn heavy_llp_skips_channel_below_threshold() {
    let model = two_body_model(2e-5);
    let provider = StubProvider::default().with_spectrum(B0, b_spectrum());
    let store = MemoryStore::new();

    let summary = generate_llp_spectra(&model, 6.0, 1e-4, None, &provider, &store, 42).unwrap();
    assert_eq!(
        summary.channels["B0_K"],
        ChannelOutcome::Skipped(SkipReason::BelowThreshold)
    );
    let key = ArtifactKey::new("test", "14", "B0_K", 6.0);
    assert!(store.load(&key).unwrap().is_none());
}

#[test]
fn mass_window_and_missing_spectrum_are_reported() {
    let mut model = Model::new("test");
    model
        .add_production(
            "windowed",
            ProductionChannel::TwoBody(
                TwoBodyChannel::new(
                    ParticleId::from_raw(B0),
                    ParticleId::from_raw(KAON),
                    Box::new(|_, _| 1e-5),
                    "Pythia8",
                    "14",
                )
                .with_mass_range(0.1, 0.5),
            ),
        )
        .unwrap();
    model
        .add_production(
            "no_table",
            ProductionChannel::TwoBody(TwoBodyChannel::new(
                ParticleId::from_raw(521),
                ParticleId::from_raw(KAON),
                Box::new(|_, _| 1e-5),
                "Pythia8",
                "14",
            )),
        )
        .unwrap();
    let provider = StubProvider::default().with_spectrum(B0, b_spectrum());
    let store = MemoryStore::new();

    let summary = generate_llp_spectra(&model, 1.0, 1e-4, None, &provider, &store, 7).unwrap();
    assert_eq!(
        summary.channels["windowed"],
        ChannelOutcome::Skipped(SkipReason::MassWindow)
    );
    assert_eq!(
        summary.channels["no_table"],
        ChannelOutcome::Skipped(SkipReason::MissingSpectrum)
    );
}

#[test]
fn short_lived_parent_weight_carries_in_flight_attenuation() {
    let mut model = Model::new("test");
    model
        .add_production(
            "K_pi",
            ProductionChannel::TwoBody(TwoBodyChannel::new(
                ParticleId::from_raw(KAON),
                ParticleId::from_raw(211),
                Box::new(|_, _| 1e-5),
                "EPOSLHC",
                "14",
            )),
        )
        .unwrap();
    let theta = 1e-4;
    let p = 100.0;
    let provider = StubProvider::default()
        .with_spectrum(KAON, vec![SpectrumRecord::new(theta, p, 0.5)]);
    let store = MemoryStore::new();

    let summary = generate_llp_spectra(&model, 0.1, 1e-4, None, &provider, &store, 9).unwrap();
    let ChannelOutcome::Generated {
        samples,
        total_weight,
    } = summary.channels["K_pi"]
    else {
        panic!("kaon channel skipped: {:?}", summary.channels["K_pi"]);
    };
    assert_eq!(samples, 1);

    // Rebuild the parent momentum the dispatcher derives from the record;
    // most charged kaons are absorbed before decaying, so the attenuation
    // must bite.
    let kaon = ParticleId::from_raw(KAON);
    let m_k = kaon.mass(0.0).unwrap();
    let (sin, cos) = theta.sin_cos();
    let parent = FourMomentum::new(p * sin, 0.0, p * cos, (p * p + m_k * m_k).sqrt());
    let attenuation = decay_in_flight_probability(kaon, &parent);
    assert!(attenuation > 0.0 && attenuation < 1.0);

    let expected = 0.5 * 1e-5 * attenuation;
    assert!(
        (total_weight - expected).abs() < 1e-9 * expected,
        "total {total_weight} vs {expected}"
    );
}

#[test]
fn three_body_channel_integrates_flux_times_rate_volume() {
    let b_plus = ParticleId::from_raw(521);
    let rate = 2e-6;
    let rate_fn: DifferentialRateFn = Box::new(move |_| rate);
    let mut model = Model::new("test");
    model
        .add_production(
            "B_K_pi",
            ProductionChannel::ThreeBody(
                ThreeBodyChannel::new(
                    b_plus,
                    ParticleId::from_raw(KAON),
                    ParticleId::from_raw(211),
                    rate_fn,
                    "Pythia8",
                    "14",
                )
                .with_nsample(40),
            ),
        )
        .unwrap();
    let provider = StubProvider::default().with_spectrum(
        521,
        vec![
            SpectrumRecord::new(0.001, 300.0, 0.4),
            SpectrumRecord::new(0.002, 500.0, 0.6),
        ],
    );
    let store = MemoryStore::new();

    let mass = 1.0;
    let summary = generate_llp_spectra(&model, mass, 1e-4, None, &provider, &store, 21).unwrap();
    let ChannelOutcome::Generated {
        samples,
        total_weight,
    } = summary.channels["B_K_pi"]
    else {
        panic!("three-body channel skipped: {:?}", summary.channels["B_K_pi"]);
    };
    // Two parents, forty phase-space draws each.
    assert_eq!(samples, 80);

    // Flat differential rate: the estimator integrates rate * phase-space
    // area exactly, independent of the draws; B mesons see no in-flight
    // attenuation.
    let m0 = b_plus.mass(mass).unwrap();
    let m1 = ParticleId::from_raw(KAON).mass(mass).unwrap();
    let m2 = ParticleId::from_raw(211).mass(mass).unwrap();
    let q2_min = (m2 + mass) * (m2 + mass);
    let q2_max = (m0 - m1) * (m0 - m1);
    let expected = (0.4 + 0.6) * rate * (q2_max - q2_min) * 2.0;
    assert!(
        (total_weight - expected).abs() < 1e-9 * expected,
        "total {total_weight} vs {expected}"
    );
}

#[test]
fn mixing_channel_weights_by_squared_mixing_angle() {
    let mut model = Model::new("test");
    model
        .add_production(
            "KL_mix",
            ProductionChannel::Mixing(MixingChannel::new(
                ParticleId::from_raw(K_LONG),
                Box::new(|_, coupling| 5.0 * coupling),
                "EPOSLHC",
                "14",
            )),
        )
        .unwrap();
    let records = vec![SpectrumRecord::new(0.001, 200.0, 0.7)];
    let provider = StubProvider::default().with_spectrum(K_LONG, records);
    let store = MemoryStore::new();

    let coupling = 1e-3;
    let summary =
        generate_llp_spectra(&model, 0.8, coupling, None, &provider, &store, 3).unwrap();
    let ChannelOutcome::Generated { total_weight, .. } = summary.channels["KL_mix"] else {
        panic!("mixing channel skipped");
    };
    let angle = 5.0 * coupling;
    assert!((total_weight - 0.7 * angle * angle).abs() < 1e-15);

    // Mixing production is undefined above the mass cap.
    let summary =
        generate_llp_spectra(&model, 1.7, coupling, None, &provider, &store, 3).unwrap();
    assert_eq!(
        summary.channels["KL_mix"],
        ChannelOutcome::Skipped(SkipReason::MassWindow)
    );
}

fn direct_model(condition: bool) -> Model {
    let mut model = Model::new("test");
    let mut channel = DirectChannel::new("14", vec![1.0, 2.0]);
    if condition {
        channel = channel.with_condition(Box::new(|momentum| momentum.p() > 60.0));
    }
    model
        .add_production("direct", ProductionChannel::Direct(channel))
        .unwrap();
    model
}

fn direct_provider() -> StubProvider {
    StubProvider::default()
        .with_benchmark(
            "direct",
            1.0,
            vec![
                SpectrumRecord::new(0.001, 100.0, 10.0),
                SpectrumRecord::new(0.1, 50.0, 20.0),
            ],
        )
        .with_benchmark(
            "direct",
            2.0,
            vec![
                SpectrumRecord::new(0.001, 100.0, 30.0),
                SpectrumRecord::new(0.1, 50.0, 40.0),
            ],
        )
}

#[test]
fn direct_channel_interpolates_between_benchmarks() {
    let model = direct_model(false);
    let provider = direct_provider();
    let store = MemoryStore::new();

    // Halfway between the benchmarks, coupling 2 at reference 1.
    let summary = generate_llp_spectra(&model, 1.5, 2.0, None, &provider, &store, 11).unwrap();
    let ChannelOutcome::Generated {
        samples,
        total_weight,
    } = summary.channels["direct"]
    else {
        panic!("direct channel skipped");
    };
    assert_eq!(samples, 2);
    // Interpolated weights (20, 30) times coupling^2 = 4.
    assert!((total_weight - 200.0).abs() < 1e-9);
}

#[test]
fn direct_channel_condition_filters_benchmark_samples() {
    let model = direct_model(true);
    let provider = direct_provider();
    let store = MemoryStore::new();

    let summary = generate_llp_spectra(&model, 1.5, 2.0, None, &provider, &store, 11).unwrap();
    let ChannelOutcome::Generated {
        samples,
        total_weight,
    } = summary.channels["direct"]
    else {
        panic!("direct channel skipped");
    };
    // Only the p = 100 sample passes the p > 60 cut.
    assert_eq!(samples, 1);
    assert!((total_weight - 80.0).abs() < 1e-9);
}

#[test]
fn direct_channel_skip_reasons() {
    let model = direct_model(false);
    let store = MemoryStore::new();

    // Outside the benchmark range.
    let provider = direct_provider();
    let summary = generate_llp_spectra(&model, 3.0, 1.0, None, &provider, &store, 11).unwrap();
    assert_eq!(
        summary.channels["direct"],
        ChannelOutcome::Skipped(SkipReason::MassWindow)
    );

    // Benchmark table missing entirely.
    let empty = StubProvider::default();
    let summary = generate_llp_spectra(&model, 1.5, 1.0, None, &empty, &store, 11).unwrap();
    assert_eq!(
        summary.channels["direct"],
        ChannelOutcome::Skipped(SkipReason::MissingBenchmark)
    );
}

#[test]
fn selection_restricts_dispatch_to_named_channels() {
    let model = two_body_model(2e-5);
    let provider = StubProvider::default().with_spectrum(B0, b_spectrum());
    let store = MemoryStore::new();

    let summary = generate_llp_spectra(
        &model,
        1.0,
        1e-4,
        Some(&["unrelated".to_string()]),
        &provider,
        &store,
        42,
    )
    .unwrap();
    assert!(summary.channels.is_empty());
}

#[test]
fn same_seed_reproduces_the_summary() {
    let model = two_body_model(2e-5);
    let provider = StubProvider::default().with_spectrum(B0, b_spectrum());

    let store_a = MemoryStore::new();
    let store_b = MemoryStore::new();
    let summary_a = generate_llp_spectra(&model, 1.0, 1e-4, None, &provider, &store_a, 42).unwrap();
    let summary_b = generate_llp_spectra(&model, 1.0, 1e-4, None, &provider, &store_b, 42).unwrap();
    assert_eq!(summary_a, summary_b);

    let key = ArtifactKey::new("test", "14", "B0_K", 1.0);
    assert_eq!(store_a.load(&key).unwrap(), store_b.load(&key).unwrap());
}

#[test]
fn dir_store_round_trips_and_reports_missing_artifacts() {
    let dir = tempfile::tempdir().unwrap();
    let store = DirStore::new(dir.path());
    let model = two_body_model(2e-5);
    let provider = StubProvider::default().with_spectrum(B0, b_spectrum());

    let summary = generate_llp_spectra(&model, 1.0, 1e-4, None, &provider, &store, 5).unwrap();
    assert!(matches!(
        summary.channels["B0_K"],
        ChannelOutcome::Generated { .. }
    ));

    let key = ArtifactKey::new("test", "14", "B0_K", 1.0);
    let stored = store.load(&key).unwrap().expect("artifact must exist");
    assert_eq!(stored.len(), 2);

    let missing = ArtifactKey::new("test", "14", "B0_K", 2.0);
    assert!(store.load(&missing).unwrap().is_none());
}
