use super::*;

#[test]
fn defaults_match_documented_values() {
    let cfg = BridgeConfig::default();
    assert!(cfg.run_simulation_inline);
    assert_eq!(cfg.stale_target_window(), Duration::from_secs(20));
    assert_eq!(cfg.default_target_size, Extent::new(500, 500));
    assert_eq!(cfg.default_fit, FitType::Contain);
    assert_eq!(cfg.default_alignment, Alignment::Center);
    cfg.validate().unwrap();
}

#[test]
fn partial_json_keeps_defaults_for_missing_keys() {
    let cfg = BridgeConfig::from_json_str(
        r#"{ "run_simulation_inline": false, "default_fit": "cover" }"#,
    )
    .unwrap();
    assert!(!cfg.run_simulation_inline);
    assert_eq!(cfg.default_fit, FitType::Cover);
    assert_eq!(cfg.stale_target_window_ms, 20_000);
}

#[test]
fn unknown_keys_are_rejected() {
    let err = BridgeConfig::from_json_str(r#"{ "bogus": 1 }"#).unwrap_err();
    assert!(matches!(err, BridgeError::Serde(_)));
}

#[test]
fn zero_window_fails_validation() {
    let err = BridgeConfig::from_json_str(r#"{ "stale_target_window_ms": 0 }"#).unwrap_err();
    assert!(err.to_string().contains("stale_target_window_ms"));
}

#[test]
fn zero_target_size_fails_validation() {
    let cfg = BridgeConfig {
        default_target_size: Extent::new(0, 10),
        ..BridgeConfig::default()
    };
    assert!(cfg.validate().is_err());
}

#[test]
fn missing_file_is_config_error() {
    let err = BridgeConfig::from_path("/definitely/not/here.json").unwrap_err();
    assert!(matches!(err, BridgeError::Config(_)));
}
