// Copyright (C) 2025 Jeremy J. Carroll. See LICENSE for details.

//! Property tests over random tree databases.

mod common;

use bbrc_miner::{MinedPattern, MinerConfig, PatternKind};
use common::{
    has_edge, has_fork, mine, mine_events, molecule, pattern_form, random_trees, render, shape,
};
use proptest::prelude::*;
use std::collections::{HashMap, HashSet};

/// Number of records that contain `pattern`, for patterns of up to two edges.
fn brute_force_support(pattern: &MinedPattern, records: &[bbrc_miner::TreeRecord]) -> usize {
    let labels = pattern.graph.node_labels();
    let edges = pattern.graph.edges();
    match edges.as_slice() {
        [e] => records
            .iter()
            .filter(|r| has_edge(r, labels[e.from], labels[e.to], e.label))
            .count(),
        [e, f] => {
            let center = [e.from, e.to]
                .into_iter()
                .find(|&n| n == f.from || n == f.to)
                .expect("two edges of a tree share a node");
            let other = |edge: &bbrc_miner::graphstate::PatternEdge| {
                let end = if edge.from == center { edge.to } else { edge.from };
                (labels[end], edge.label)
            };
            records
                .iter()
                .filter(|r| has_fork(r, labels[center], other(e), other(f)))
                .count()
        }
        _ => unreachable!("only small patterns are checked"),
    }
}

fn unpruned(kind: PatternKind) -> MinerConfig {
    MinerConfig {
        min_frequency: 1,
        kind,
        significance: 0.0,
        backbone: false,
        dynamic_upper_bound: false,
        static_pruning: false,
        refine_singles: true,
        ..MinerConfig::default()
    }
}

#[test]
fn test_pruning_keeps_refinements_of_a_pure_inactive_pattern() {
    let records = vec![
        molecule(1, &[6], &[]).with_activity(1.0),
        molecule(2, &[7, 6, 8], &[(0, 1, 1), (1, 2, 1)]).with_activity(0.0),
        molecule(3, &[7, 6, 8, 9], &[(0, 1, 1), (1, 2, 1), (2, 3, 1)]).with_activity(0.0),
    ];
    let pruned = MinerConfig {
        min_frequency: 1,
        significance: 0.852,
        backbone: false,
        dynamic_upper_bound: false,
        refine_singles: true,
        ..MinerConfig::default()
    };
    let unpruned = MinerConfig {
        static_pruning: false,
        ..pruned.clone()
    };
    let forms = |config| {
        let mut forms: Vec<_> = mine(config, &records).iter().map(pattern_form).collect();
        forms.sort();
        forms
    };
    let all = forms(unpruned);
    let chain = common::canonical_form(&[7, 6, 8, 9], &[(0, 1, 1), (1, 2, 1), (2, 3, 1)]);
    assert!(all.contains(&chain));
    assert_eq!(forms(pruned), all);
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(40))]

    #[test]
    fn test_backbone_mode_agrees_with_full_output(records in random_trees(10, 6)) {
        let dynamic = MinerConfig {
            min_frequency: 1,
            significance: 0.0,
            refine_singles: true,
            ..MinerConfig::default()
        };
        let fixed = MinerConfig {
            dynamic_upper_bound: false,
            ..dynamic.clone()
        };
        let summarize = |patterns: Vec<MinedPattern>| {
            let mut summary: Vec<_> = patterns
                .iter()
                .map(|p| (pattern_form(p), p.p_value.to_bits()))
                .collect();
            summary.sort();
            summary.dedup();
            summary
        };
        let full: HashMap<_, _> = mine(unpruned(PatternKind::Tree), &records)
            .iter()
            .map(|p| (pattern_form(p), p.p_value))
            .collect();
        let chosen = summarize(mine(dynamic, &records));
        for (form, p) in &chosen {
            let p = f64::from_bits(*p);
            let q = full.get(form).copied();
            prop_assert!(q.is_some_and(|q| (p - q).abs() < 1e-9), "{:?}: {} against {:?}", form, p, q);
        }
        // the carried best only prunes refinements that cannot beat it
        prop_assert_eq!(chosen, summarize(mine(fixed, &records)));
    }

    #[test]
    fn test_join_frequencies_match_brute_force(records in random_trees(8, 6)) {
        let patterns = mine(MinerConfig::frequent_only(1, PatternKind::Tree), &records);
        for pattern in patterns.iter().filter(|p| p.size <= 3) {
            let support = brute_force_support(pattern, &records);
            prop_assert_eq!(pattern.frequency, support as f64, "pattern {}", pattern.smarts);
        }
    }

    #[test]
    fn test_every_small_pattern_is_found_once(records in random_trees(6, 5)) {
        let patterns = mine(MinerConfig::frequent_only(1, PatternKind::Tree), &records);
        let mut seen = HashSet::new();
        for pattern in patterns.iter().filter(|p| p.size <= 3) {
            prop_assert!(seen.insert(shape(pattern)), "duplicate {}", pattern.smarts);
        }
        for record in &records {
            for &(x, y, bond) in &record.edges {
                let (a, b) = (record.nodes[x], record.nodes[y]);
                let edge = (vec![a.min(b), a.max(b)], vec![(a.min(b), a.max(b), bond)]);
                prop_assert!(seen.contains(&edge));
            }
        }
    }

    #[test]
    fn test_refinements_are_less_frequent_and_bounded(records in random_trees(10, 5)) {
        let patterns = mine(unpruned(PatternKind::Tree), &records);
        let by_shape: Vec<_> = patterns.iter().map(|p| (shape(p), p)).collect();
        for (big_shape, big) in by_shape.iter().filter(|(_, p)| p.size == 3) {
            for edge in &big_shape.1 {
                let small_shape = (vec![edge.0, edge.1], vec![*edge]);
                let (_, small) = by_shape
                    .iter()
                    .find(|(s, _)| *s == small_shape)
                    .expect("every edge of a pattern is a pattern");
                prop_assert!(big.frequency <= small.frequency);
                prop_assert!(small.upper_bound >= big.p_value);
            }
        }
    }

    #[test]
    fn test_pruning_only_removes_patterns(records in random_trees(12, 5)) {
        let pruned = MinerConfig {
            min_frequency: 1,
            backbone: false,
            dynamic_upper_bound: false,
            refine_singles: true,
            ..MinerConfig::default()
        };
        let unpruned = MinerConfig {
            static_pruning: false,
            ..pruned.clone()
        };
        let all: HashSet<String> = mine(unpruned, &records).into_iter().map(|p| p.smarts).collect();
        for pattern in mine(pruned, &records) {
            prop_assert!(all.contains(&pattern.smarts), "{} lost", pattern.smarts);
        }
    }

    #[test]
    fn test_runs_are_deterministic(records in random_trees(8, 6)) {
        let config = MinerConfig {
            min_frequency: 1,
            refine_singles: true,
            ..MinerConfig::default()
        };
        let first = render(&config, &mine_events(config.clone(), &records));
        let second = render(&config, &mine_events(config.clone(), &records));
        prop_assert_eq!(first, second);
    }

    #[test]
    fn test_node_order_does_not_change_patterns(records in random_trees(6, 5)) {
        let reversed: Vec<_> = records
            .iter()
            .map(|record| {
                let n = record.nodes.len();
                let mut copy = record.clone();
                copy.nodes.reverse();
                copy.edges = record
                    .edges
                    .iter()
                    .rev()
                    .map(|&(x, y, label)| (n - 1 - y, n - 1 - x, label))
                    .collect();
                copy
            })
            .collect();
        // without refining singles, which frequency-1 patterns are reached
        // depends on label numbering
        let config = MinerConfig {
            refine_singles: true,
            ..MinerConfig::frequent_only(1, PatternKind::Tree)
        };
        let summarize = |patterns: Vec<MinedPattern>| {
            let mut shapes: Vec<_> = patterns
                .iter()
                .map(|p| (shape(p), p.frequency.to_bits()))
                .collect();
            shapes.sort();
            shapes
        };
        prop_assert_eq!(
            summarize(mine(config.clone(), &records)),
            summarize(mine(config, &reversed))
        );
    }

    #[test]
    fn test_backbone_mode_reports_each_pattern_once(records in random_trees(12, 6)) {
        let config = MinerConfig {
            min_frequency: 1,
            significance: 0.0,
            refine_singles: true,
            ..MinerConfig::default()
        };
        let mut seen = HashSet::new();
        for pattern in mine(config, &records) {
            prop_assert!(seen.insert(pattern.smarts.clone()), "{} twice", pattern.smarts);
        }
    }
}
