use llp_core::{ParticleId, SimError};
use llp_model::{
    CouplingScaling, DirectChannel, Lifetime, MixingChannel, Model, ProductionChannel,
    TwoBodyChannel,
};

#[test]
fn power_law_is_exact_for_representable_inputs() {
    let scaling = CouplingScaling::Power(2.0);
    assert_eq!(scaling.factor(4.0, 2.0), 4.0);
    assert_eq!(scaling.factor(2.0, 2.0), 1.0);
    let cubic = CouplingScaling::Power(3.0);
    assert_eq!(cubic.factor(2.0, 1.0), 8.0);
}

#[test]
fn rescaling_composes_to_identity() {
    let scaling = CouplingScaling::Power(2.0);
    let c = 3.7e-5;
    let c_ref = 1.0e-4;
    let forward = scaling.factor(c, c_ref);
    let backward = scaling.factor(c_ref, c);
    assert!((forward * backward - 1.0).abs() < 1e-12);
}

#[test]
fn manual_rule_takes_the_amplitude_ratio() {
    let scaling = CouplingScaling::manual(Box::new(|coupling| coupling * coupling));
    assert!((scaling.factor(3.0, 1.0) - 9.0).abs() < 1e-12);
    let squared = CouplingScaling::manual_squared(Box::new(|coupling| coupling));
    assert!((squared.factor(3.0, 1.0) - 9.0).abs() < 1e-12);
}

#[test]
fn mixing_channel_defaults_to_power_two() {
    let channel = ProductionChannel::Mixing(MixingChannel::new(
        ParticleId::from_raw(111),
        Box::new(|_, coupling| coupling),
        "EPOSLHC",
        "14",
    ));
    assert!((channel.scaling_factor(2.0, 1.0) - 4.0).abs() < 1e-12);
}

#[test]
fn scaled_lifetime_follows_inverse_coupling_square() {
    let mut model = Model::new("demo");
    model.set_lifetime(Lifetime::Scaled {
        coupling_ref: 1.0,
        ctau: Box::new(|mass| 10.0 / mass),
    });
    let ctau = model.ctau(2.0, 1.0e-2).unwrap();
    assert!((ctau - 5.0e4).abs() < 1e-6);
}

#[test]
fn unset_lifetime_is_a_config_error() {
    let model = Model::new("demo");
    match model.ctau(1.0, 1.0) {
        Err(SimError::Config(info)) => assert_eq!(info.code, "lifetime-unset"),
        other => panic!("expected config error, got {other:?}"),
    }
}

#[test]
fn unset_branching_is_a_config_error() {
    let model = Model::new("demo");
    match model.branching_ratio("e_e", 1.0, 1.0) {
        Err(SimError::Config(info)) => assert_eq!(info.code, "branching-unset"),
        other => panic!("expected config error, got {other:?}"),
    }
}

#[test]
fn duplicate_channel_labels_are_rejected() {
    let mut model = Model::new("demo");
    let make = || {
        ProductionChannel::TwoBody(TwoBodyChannel::new(
            ParticleId::from_raw(511),
            ParticleId::from_raw(321),
            Box::new(|_, _| 1.0e-4),
            "Pythia8",
            "14",
        ))
    };
    model.add_production("B_K", make()).unwrap();
    match model.add_production("B_K", make()) {
        Err(SimError::Production(info)) => assert_eq!(info.code, "duplicate-label"),
        other => panic!("expected production error, got {other:?}"),
    }
}

#[test]
fn malformed_channels_fail_at_registration() {
    let mut model = Model::new("demo");
    let unsorted = ProductionChannel::Direct(DirectChannel::new("14", vec![1.0, 0.5]));
    match model.add_production("direct", unsorted) {
        Err(SimError::Production(info)) => assert_eq!(info.code, "benchmarks-unsorted"),
        other => panic!("expected production error, got {other:?}"),
    }
    let zero_samples = ProductionChannel::TwoBody(
        TwoBodyChannel::new(
            ParticleId::from_raw(511),
            ParticleId::from_raw(321),
            Box::new(|_, _| 1.0e-4),
            "Pythia8",
            "14",
        )
        .with_nsample(0),
    );
    match model.add_production("b", zero_samples) {
        Err(SimError::Production(info)) => assert_eq!(info.code, "nsample-zero"),
        other => panic!("expected production error, got {other:?}"),
    }
}

#[test]
fn scaled_cross_section_runs_quadrature_once() {
    let mut model = Model::new("demo");
    model.set_cross_section(llp_model::CrossSection::Scaled {
        coupling_ref: 1.0,
        sigma: Box::new(|_mass, energy, _ermin, _ermax| 2.0 * energy),
    });
    let sigmas = model
        .cross_sections(0.1, &[1.0, 2.0], 100.0, 0.03, 1.0)
        .unwrap();
    assert!((sigmas[0] - 200.0).abs() < 1e-9);
    assert!((sigmas[1] - 800.0).abs() < 1e-9);
}
