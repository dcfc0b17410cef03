// Copyright (C) 2025 Jeremy J. Carroll. See LICENSE for details.

//! Significance of a pattern's occurrence split, and bounds on what any
//! refinement of it can still reach.

mod chisq;
mod ks;
pub mod quantile;

pub use chisq::ChisqConstraint;
pub use ks::KsConstraint;

use crate::config::ValidatedConfig;
use crate::database::Database;
use crate::types::{OrigId, Tid};
use std::collections::BTreeSet;

/// The statistic of one pattern.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Evaluation {
    /// Value of the statistic; larger is more significant.
    pub p: f64,
    /// Largest value any refinement can reach. Infinite when unknown.
    pub upper_bound: f64,
    /// Original ids of the matched graphs in the active class (all matched
    /// graphs in regression mode).
    pub active_ids: BTreeSet<OrigId>,
    pub inactive_ids: BTreeSet<OrigId>,
    /// The pattern is more frequent among actives than expected.
    pub activating: bool,
}

pub trait Constraint {
    /// Evaluates a pattern occurring in the distinct graphs `tids`.
    fn evaluate(&self, db: &Database, tids: &[Tid]) -> Evaluation;
}

/// The constraint matching the configured mode.
pub fn for_config(config: &ValidatedConfig, db: &Database) -> Box<dyn Constraint> {
    if config.regression {
        Box::new(KsConstraint::new(db))
    } else {
        Box::new(ChisqConstraint::new(db))
    }
}
