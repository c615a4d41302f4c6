use pwa_core::errors::PwaError;
use pwa_core::{FitParameter, ParameterSet};

#[test]
fn revisions_move_only_on_change() {
    let mut params = ParameterSet::new();
    params.declare(FitParameter::free("mag", 1.0));
    let before = params.revision("mag").unwrap();

    params.set_value("mag", 1.0).unwrap();
    assert_eq!(params.revision("mag").unwrap(), before);

    params.set_value("mag", 2.0).unwrap();
    assert_eq!(params.revision("mag").unwrap(), before + 1);
    assert_eq!(params.value("mag").unwrap(), 2.0);
}

#[test]
fn lenient_update_ignores_unknown_and_fixed() {
    let mut params = ParameterSet::new();
    params.declare(FitParameter::free("mag", 1.0));
    params.declare(FitParameter::fixed("width", 0.1));

    params.update_from_named(&[
        ("mag".to_string(), 3.0),
        ("width".to_string(), 9.0),
        ("no-such".to_string(), 5.0),
    ]);
    assert_eq!(params.value("mag").unwrap(), 3.0);
    assert_eq!(params.value("width").unwrap(), 0.1);
}

#[test]
fn strict_update_rejects_unknown_before_applying() {
    let mut params = ParameterSet::new();
    params.declare(FitParameter::free("mag", 1.0));

    let err = params
        .update_from_named_strict(&[
            ("mag".to_string(), 3.0),
            ("no-such".to_string(), 5.0),
        ])
        .unwrap_err();
    assert!(matches!(err, PwaError::Params(info) if info.code == "unknown-parameter"));
    // nothing was applied
    assert_eq!(params.value("mag").unwrap(), 1.0);
}

#[test]
fn redeclaration_keeps_first_value() {
    let mut params = ParameterSet::new();
    params.declare(FitParameter::free("shared", 1.5));
    params.declare(FitParameter::free("shared", 9.0));
    assert_eq!(params.len(), 1);
    assert_eq!(params.value("shared").unwrap(), 1.5);
}

#[test]
fn fit_parameter_serde_roundtrip() {
    let parameter = FitParameter::free("mass", 1.2).with_bounds(0.5, 2.5);
    let json = serde_json::to_string(&parameter).unwrap();
    let restored: FitParameter = serde_json::from_str(&json).unwrap();
    assert_eq!(parameter, restored);
}
