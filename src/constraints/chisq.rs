// Copyright (C) 2025 Jeremy J. Carroll. See LICENSE for details.

//! Yates-corrected chi-square test for two activity classes.

use super::{Constraint, Evaluation};
use crate::database::Database;
use crate::types::Tid;
use std::collections::BTreeSet;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChisqConstraint {
    /// Weighted number of active graphs in the database.
    na: f64,
    ni: f64,
    n: f64,
    /// Smallest positive weight of a labelled graph; no non-empty subset
    /// of graphs weighs less.
    min_weight: f64,
}

impl ChisqConstraint {
    /// Counts the class base rates. Graphs with activity 1 are active,
    /// activity 0 inactive; anything else takes no part.
    pub fn new(db: &Database) -> Self {
        let (mut na, mut ni) = (0.0, 0.0);
        let mut min_weight = f64::INFINITY;
        for tree in db.trees() {
            match tree.activity {
                Some(a) if a == 1.0 => na += tree.weight,
                Some(a) if a == 0.0 => ni += tree.weight,
                _ => continue,
            }
            if tree.weight > 0.0 {
                min_weight = min_weight.min(tree.weight);
            }
        }
        ChisqConstraint {
            na,
            ni,
            n: na + ni,
            min_weight,
        }
    }

    /// Statistic for a pattern covering weight `x`, of which `y` is active.
    pub fn chi_square(&self, x: f64, y: f64) -> f64 {
        if self.n <= 0.0 {
            return 0.0;
        }
        let impact = x / self.n;
        let ea = self.na * impact;
        let ei = self.ni * impact;
        if ea > 0.0 && ei > 0.0 {
            (y - ea - 0.5).powi(2) / ea + (x - y - ei - 0.5).powi(2) / ei
        } else {
            0.0
        }
    }

    /// Largest statistic reachable by any subset of a pattern's graphs,
    /// active weight `fa` and inactive weight `fi`.
    ///
    /// For a fixed covered weight the statistic is a convex quadratic in the
    /// active share, so its maximum lies on the border of the box
    /// `[0, fa] x [0, fi]`. Along each border edge it has the form
    /// `a*x + b + c/x` with `a >= 0`, which is either convex or increasing,
    /// so only the edge ends need checking. The edges touching the origin
    /// end at the lightest single graph.
    pub fn upper_bound(&self, fa: f64, fi: f64) -> f64 {
        let mut corners = vec![(fa, 0.0), (0.0, fi), (fa, fi)];
        if fa > 0.0 {
            corners.push((self.min_weight.min(fa), 0.0));
        }
        if fi > 0.0 {
            corners.push((0.0, self.min_weight.min(fi)));
        }
        corners
            .into_iter()
            .map(|(a, i)| self.chi_square(a + i, a))
            .fold(0.0, f64::max)
    }

    fn expected_active(&self, x: f64) -> f64 {
        if self.n <= 0.0 {
            0.0
        } else {
            self.na * x / self.n
        }
    }
}

impl Constraint for ChisqConstraint {
    fn evaluate(&self, db: &Database, tids: &[Tid]) -> Evaluation {
        let (mut fa, mut fi) = (0.0, 0.0);
        let mut active_ids = BTreeSet::new();
        let mut inactive_ids = BTreeSet::new();
        for &tid in tids {
            let tree = db.tree(tid);
            match tree.activity {
                Some(a) if a == 1.0 => {
                    fa += tree.weight;
                    active_ids.insert(tree.orig_id);
                }
                Some(a) if a == 0.0 => {
                    fi += tree.weight;
                    inactive_ids.insert(tree.orig_id);
                }
                _ => {}
            }
        }
        let p = self.chi_square(fa + fi, fa);
        let upper_bound = self.upper_bound(fa, fi);
        Evaluation {
            p,
            upper_bound,
            active_ids,
            inactive_ids,
            activating: fa > self.expected_active(fa + fi),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::TreeRecord;

    fn database(activities: &[f64]) -> Database {
        let mut db = Database::new();
        for (i, &a) in activities.iter().enumerate() {
            db.add_tree(TreeRecord::new(i as u32 + 1).with_node(6).with_activity(a))
                .unwrap();
        }
        db.finalize(1.0);
        db
    }

    #[test]
    fn test_base_rates_use_weights() {
        let mut db = Database::new();
        db.add_tree(TreeRecord::new(1).with_node(6).with_activity(1.0).with_weight(2.0))
            .unwrap();
        db.add_tree(TreeRecord::new(2).with_node(6).with_activity(0.0)).unwrap();
        let c = ChisqConstraint::new(&db);
        assert_eq!((c.na, c.ni, c.n), (2.0, 1.0, 3.0));
    }

    #[test]
    fn test_pure_active_split_is_significant() {
        let db = database(&[1.0, 1.0, 1.0, 1.0, 0.0, 0.0, 0.0, 0.0]);
        let c = ChisqConstraint::new(&db);
        let e = c.evaluate(&db, &[0, 1, 2, 3]);
        // ea = ei = 2: (4-2-0.5)^2/2 + (0-2-0.5)^2/2
        assert!((e.p - (1.125 + 3.125)).abs() < 1e-9);
        assert!(e.activating);
        assert_eq!(e.active_ids.iter().copied().collect::<Vec<_>>(), vec![1, 2, 3, 4]);
        assert!(e.inactive_ids.is_empty());
    }

    #[test]
    fn test_bound_dominates_every_subset() {
        let db = database(&[1.0, 1.0, 1.0, 0.0, 0.0, 0.0]);
        let c = ChisqConstraint::new(&db);
        let e = c.evaluate(&db, &[0, 1, 3, 4]);
        for subset in [&[0u32][..], &[0, 1], &[3, 4], &[0, 3], &[1, 3, 4]] {
            assert!(c.evaluate(&db, subset).p <= e.upper_bound + 1e-12);
        }
    }

    #[test]
    fn test_bound_dominates_subsets_of_small_databases() {
        for na in 1..=4 {
            for ni in 1..=4 {
                let mut activities = vec![1.0; na];
                activities.extend(vec![0.0; ni]);
                let c = ChisqConstraint::new(&database(&activities));
                for fa in 0..=na {
                    for fi in 0..=ni {
                        let u = c.upper_bound(fa as f64, fi as f64);
                        for sa in 0..=fa {
                            for si in 0..=fi {
                                let p = c.chi_square((sa + si) as f64, sa as f64);
                                assert!(
                                    p <= u + 1e-9,
                                    "na={na} ni={ni} fa={fa} fi={fi}: {p} > {u}"
                                );
                            }
                        }
                    }
                }
            }
        }
    }

    #[test]
    fn test_bound_covers_single_inactive_graph() {
        let db = database(&[1.0, 0.0, 0.0]);
        let c = ChisqConstraint::new(&db);
        let both = c.evaluate(&db, &[1, 2]);
        let one = c.evaluate(&db, &[1]);
        assert!((one.p - 2.125).abs() < 1e-9);
        assert!(both.upper_bound >= one.p);
    }

    #[test]
    fn test_unlabelled_database_gives_zero() {
        let db = database(&[]);
        let c = ChisqConstraint::new(&db);
        assert_eq!(c.chi_square(3.0, 1.0), 0.0);
    }
}
