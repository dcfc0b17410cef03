// Copyright (C) 2025 Jeremy J. Carroll. See LICENSE for details.

//! Mining settings and their cross-field validation.

use crate::constraints::quantile::chi_square_quantile;
use crate::error::{MinerError, Result};
use std::fmt;
use strum_macros::{Display, EnumIter, EnumString};

/// Which shapes the search is allowed to grow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, EnumString, Display, EnumIter)]
#[strum(serialize_all = "lowercase")]
pub enum PatternKind {
    Path,
    Tree,
    Graph,
}

impl PatternKind {
    /// The numeric level used on the command line (`-l 1|2|3`).
    pub fn from_level(level: u8) -> Option<Self> {
        match level {
            1 => Some(PatternKind::Path),
            2 => Some(PatternKind::Tree),
            3 => Some(PatternKind::Graph),
            _ => None,
        }
    }
}

/// How emitted patterns are encoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumString, Display, EnumIter)]
#[strum(serialize_all = "lowercase")]
pub enum OutputFormat {
    /// One YAML list item per pattern.
    Yaml,
    /// SMARTS followed by the statistics, whitespace separated.
    Plain,
    /// Each pattern as a GSP graph record.
    Gsp,
}

/// One violated cross-field rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigConflict {
    MinFrequencyZero,
    SignificanceOutOfRange,
    RequiresSignificanceFilter,
    DynamicBoundWithoutBackbone,
    DynamicBoundWithoutPruning,
    RegressionWithPruning,
    SeparatorWithBackbone,
    SeparatorWithoutPruning,
    RefineSinglesNeedsMinFrequencyOne,
}

impl fmt::Display for ConfigConflict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            ConfigConflict::MinFrequencyZero => "minimum frequency must be at least 1",
            ConfigConflict::SignificanceOutOfRange => "significance must lie in [0, 1]",
            ConfigConflict::RequiresSignificanceFilter => {
                "backbone mode and upper-bound pruning need the significance filter"
            }
            ConfigConflict::DynamicBoundWithoutBackbone => {
                "the dynamic upper bound needs backbone mode"
            }
            ConfigConflict::DynamicBoundWithoutPruning => {
                "the dynamic upper bound needs static upper-bound pruning"
            }
            ConfigConflict::RegressionWithPruning => {
                "regression has no anti-monotone bound, disable upper-bound pruning"
            }
            ConfigConflict::SeparatorWithBackbone => {
                "the backbone class separator cannot be combined with backbone mode"
            }
            ConfigConflict::SeparatorWithoutPruning => {
                "the backbone class separator needs upper-bound pruning"
            }
            ConfigConflict::RefineSinglesNeedsMinFrequencyOne => {
                "refining single occurrences needs a minimum frequency of 1"
            }
        };
        f.write_str(text)
    }
}

/// User-facing settings. Construct with `Default` and adjust fields.
#[derive(Debug, Clone, PartialEq)]
pub struct MinerConfig {
    pub min_frequency: u32,
    pub kind: PatternKind,
    /// Report (and prune by) significance. Off means plain frequent mining.
    pub significance_filter: bool,
    /// Probability in [0, 1].
    pub significance: f64,
    /// Report one most significant pattern per backbone refinement class.
    pub backbone: bool,
    pub dynamic_upper_bound: bool,
    pub static_pruning: bool,
    pub refine_singles: bool,
    /// Continuous activities with the Kolmogorov-Smirnov test.
    pub regression: bool,
    /// Passed through to molecule parsers; the miner itself ignores it.
    pub aromatic: bool,
    pub bbrc_separator: bool,
    pub output_format: OutputFormat,
    /// Print chi-square values as probabilities.
    pub p_values: bool,
}

impl Default for MinerConfig {
    fn default() -> Self {
        MinerConfig {
            min_frequency: 2,
            kind: PatternKind::Tree,
            significance_filter: true,
            significance: 0.95,
            backbone: true,
            dynamic_upper_bound: true,
            static_pruning: true,
            refine_singles: false,
            regression: false,
            aromatic: true,
            bbrc_separator: false,
            output_format: OutputFormat::Yaml,
            p_values: false,
        }
    }
}

impl MinerConfig {
    /// Settings for plain frequent pattern mining without any statistics.
    pub fn frequent_only(min_frequency: u32, kind: PatternKind) -> Self {
        MinerConfig {
            min_frequency,
            kind,
            significance_filter: false,
            backbone: false,
            dynamic_upper_bound: false,
            static_pruning: false,
            ..MinerConfig::default()
        }
    }

    /// Every rule this configuration breaks, in a fixed order.
    pub fn conflicts(&self) -> Vec<ConfigConflict> {
        let mut conflicts = Vec::new();
        if self.min_frequency == 0 {
            conflicts.push(ConfigConflict::MinFrequencyZero);
        }
        if !(0.0..=1.0).contains(&self.significance) {
            conflicts.push(ConfigConflict::SignificanceOutOfRange);
        }
        if !self.significance_filter
            && (self.backbone || self.static_pruning || self.dynamic_upper_bound)
        {
            conflicts.push(ConfigConflict::RequiresSignificanceFilter);
        }
        if self.dynamic_upper_bound && !self.backbone {
            conflicts.push(ConfigConflict::DynamicBoundWithoutBackbone);
        }
        if self.dynamic_upper_bound && !self.static_pruning {
            conflicts.push(ConfigConflict::DynamicBoundWithoutPruning);
        }
        if self.regression && self.static_pruning {
            conflicts.push(ConfigConflict::RegressionWithPruning);
        }
        if self.bbrc_separator && self.backbone {
            conflicts.push(ConfigConflict::SeparatorWithBackbone);
        }
        if self.bbrc_separator && !self.static_pruning {
            conflicts.push(ConfigConflict::SeparatorWithoutPruning);
        }
        if self.refine_singles && self.min_frequency > 1 {
            conflicts.push(ConfigConflict::RefineSinglesNeedsMinFrequencyOne);
        }
        conflicts
    }

    pub fn validate(self) -> Result<ValidatedConfig> {
        let conflicts = self.conflicts();
        if !conflicts.is_empty() {
            return Err(MinerError::Configuration(conflicts));
        }
        let threshold = if self.regression {
            self.significance
        } else {
            chi_square_quantile(self.significance)
        };
        Ok(ValidatedConfig {
            config: self,
            threshold,
        })
    }
}

/// A configuration that passed [`MinerConfig::validate`].
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedConfig {
    config: MinerConfig,
    threshold: f64,
}

impl ValidatedConfig {
    pub fn config(&self) -> &MinerConfig {
        &self.config
    }

    /// The significance threshold in the statistic's own scale.
    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    pub fn min_frequency(&self) -> f64 {
        f64::from(self.config.min_frequency)
    }

    pub fn kind(&self) -> PatternKind {
        self.config.kind
    }
}

impl std::ops::Deref for ValidatedConfig {
    type Target = MinerConfig;

    fn deref(&self) -> &MinerConfig {
        &self.config
    }
}
