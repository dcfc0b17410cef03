// Copyright (C) 2025 Jeremy J. Carroll. See LICENSE for details.

//! Cross-field configuration rules.

use bbrc_miner::{ConfigConflict, MinerConfig, MinerError, PatternKind};

#[test]
fn test_every_conflict_is_reported() {
    let config = MinerConfig {
        min_frequency: 0,
        backbone: false,
        static_pruning: false,
        bbrc_separator: true,
        ..MinerConfig::default()
    };
    assert_eq!(
        config.conflicts(),
        vec![
            ConfigConflict::MinFrequencyZero,
            ConfigConflict::DynamicBoundWithoutBackbone,
            ConfigConflict::DynamicBoundWithoutPruning,
            ConfigConflict::SeparatorWithoutPruning,
        ]
    );
    match config.validate() {
        Err(MinerError::Configuration(conflicts)) => assert_eq!(conflicts.len(), 4),
        other => panic!("expected a configuration error, got {other:?}"),
    }
}

#[test]
fn test_regression_needs_pruning_off() {
    let config = MinerConfig {
        regression: true,
        ..MinerConfig::default()
    };
    assert_eq!(config.conflicts(), vec![ConfigConflict::RegressionWithPruning]);
    let fixed = MinerConfig {
        regression: true,
        static_pruning: false,
        dynamic_upper_bound: false,
        backbone: true,
        ..MinerConfig::default()
    };
    let validated = fixed.validate().unwrap();
    assert_eq!(validated.threshold(), 0.95);
}

#[test]
fn test_frequent_only_needs_no_statistics() {
    let validated = MinerConfig::frequent_only(3, PatternKind::Graph)
        .validate()
        .unwrap();
    assert_eq!(validated.kind(), PatternKind::Graph);
    assert_eq!(validated.min_frequency(), 3.0);
    let filtered = MinerConfig {
        backbone: true,
        ..MinerConfig::frequent_only(3, PatternKind::Graph)
    };
    assert_eq!(filtered.conflicts(), vec![ConfigConflict::RequiresSignificanceFilter]);
}

#[test]
fn test_chi_square_threshold() {
    let validated = MinerConfig::default().validate().unwrap();
    assert!((validated.threshold() - 3.841).abs() < 1e-3);
}
