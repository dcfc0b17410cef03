// Copyright (C) 2025 Jeremy J. Carroll. See LICENSE for details.

//! Two-sample Kolmogorov-Smirnov test of a pattern's activities against the
//! whole database, for continuous activities.

use super::{Constraint, Evaluation};
use crate::database::Database;
use crate::types::Tid;
use std::collections::BTreeSet;

#[derive(Debug, Clone, PartialEq)]
pub struct KsConstraint {
    /// Every activity in the database, sorted.
    all: Vec<f64>,
}

fn sorted(mut values: Vec<f64>) -> Vec<f64> {
    values.sort_by(f64::total_cmp);
    values
}

/// Median of an already sorted sample without NaN.
fn median(sample: &[f64]) -> f64 {
    let n = sample.len();
    if n == 0 {
        return f64::NAN;
    }
    if n % 2 == 1 {
        sample[n / 2]
    } else {
        (sample[n / 2 - 1] + sample[n / 2]) / 2.0
    }
}

impl KsConstraint {
    pub fn new(db: &Database) -> Self {
        KsConstraint {
            all: sorted(db.trees().iter().filter_map(|t| t.activity).collect()),
        }
    }

    /// One minus the asymptotic KS probability that `feature` and the
    /// database sample come from the same distribution. Both samples must
    /// be sorted.
    pub fn statistic(all: &[f64], feature: &[f64]) -> f64 {
        let (en1, en2) = (all.len() as f64, feature.len() as f64);
        if en1 == 0.0 || en2 == 0.0 {
            return 0.0;
        }
        let (mut j1, mut j2) = (0usize, 0usize);
        let (mut fn1, mut fn2) = (0.0, 0.0);
        let (mut d_plus, mut d_minus) = (0.0f64, 0.0f64);
        while j1 < all.len() && j2 < feature.len() {
            let (d1, d2) = (all[j1], feature[j2]);
            if d1.is_nan() || d2.is_nan() {
                j1 += usize::from(d1.is_nan());
                j2 += usize::from(d2.is_nan());
                continue;
            }
            if d1 <= d2 {
                j1 += 1;
                fn1 = j1 as f64 / en1;
            }
            if d2 <= d1 {
                j2 += 1;
                fn2 = j2 as f64 / en2;
            }
            d_plus = d_plus.max(fn2 - fn1);
            d_minus = d_minus.max(fn1 - fn2);
        }
        let d = d_plus + d_minus;
        let en = (en1 * en2 / (en1 + en2)).sqrt();
        let lambda = (en + 0.155 + 0.24 / en) * d;
        kolmogorov_tail_complement(lambda)
    }
}

/// `1 - Q_KS(lambda)` from the alternating series; 0 when it does not converge.
fn kolmogorov_tail_complement(lambda: f64) -> f64 {
    let a2 = -2.0 * lambda * lambda;
    let fac2 = 4.0 * lambda * lambda;
    let mut sum = 0.0;
    let mut previous = 0.0;
    for j in 1..=100 {
        let j2 = f64::from(j * j);
        let term = 2.0 * (fac2 * j2 - 1.0) * (a2 * j2).exp();
        sum += term;
        if term.abs() <= 0.001 * previous || term.abs() <= 1.0e-8 * sum {
            return 1.0 - sum;
        }
        previous = term.abs();
    }
    0.0
}

impl Constraint for KsConstraint {
    fn evaluate(&self, db: &Database, tids: &[Tid]) -> Evaluation {
        let mut active_ids = BTreeSet::new();
        let mut feature = Vec::with_capacity(tids.len());
        for &tid in tids {
            let tree = db.tree(tid);
            active_ids.insert(tree.orig_id);
            if let Some(a) = tree.activity {
                feature.push(a);
            }
        }
        let feature = sorted(feature);
        let clean = |s: &[f64]| s.iter().copied().filter(|v| !v.is_nan()).collect::<Vec<_>>();
        Evaluation {
            p: KsConstraint::statistic(&self.all, &feature),
            upper_bound: f64::INFINITY,
            active_ids,
            inactive_ids: BTreeSet::new(),
            activating: median(&clean(&feature)) > median(&clean(&self.all)),
        }
    }
}
