use llp_core::{ErrorInfo, FourMomentum, SimError, WeightedSample};

#[test]
fn four_momentum_roundtrips_through_json() {
    let p = FourMomentum::new(0.03, -0.02, 850.0, 850.0001459);
    let json = serde_json::to_string(&p).unwrap();
    let back: FourMomentum = serde_json::from_str(&json).unwrap();
    assert_eq!(back, p);
}

#[test]
fn weighted_sample_roundtrips_through_json() {
    let sample = WeightedSample::new(FourMomentum::at_rest(1.25), 3.2e-5);
    let json = serde_json::to_string(&sample).unwrap();
    let back: WeightedSample = serde_json::from_str(&json).unwrap();
    assert_eq!(back, sample);
}

#[test]
fn error_payload_roundtrips_with_context_and_hint() {
    let err = SimError::Config(
        ErrorInfo::new("lifetime-unset", "no lifetime model configured")
            .with_context("model", "demo")
            .with_hint("call Model::set_lifetime before simulating"),
    );
    let json = serde_json::to_string(&err).unwrap();
    let back: SimError = serde_json::from_str(&json).unwrap();
    assert_eq!(back, err);
    assert_eq!(back.info().code, "lifetime-unset");
}

#[test]
fn error_payload_tolerates_missing_optional_fields() {
    let json = r#"{"family":"Persist","detail":{"code":"ensemble-read","message":"io"}}"#;
    let err: SimError = serde_json::from_str(json).unwrap();
    assert!(err.info().context.is_empty());
    assert!(err.info().hint.is_none());
}
