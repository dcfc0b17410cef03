// Copyright (C) 2025 Jeremy J. Carroll. See LICENSE for details.

//! Cyclic patterns and GSP input handling.

mod common;

use bbrc_miner::{Miner, MinerConfig, MinerError, MinedPattern, PatternKind};
use common::{
    canonical_form, connected_subgraphs, mine, molecule, pattern_form, random_cyclic_graphs, Form,
};
use proptest::prelude::*;
use std::collections::HashMap;

fn all_graphs() -> MinerConfig {
    MinerConfig {
        refine_singles: true,
        ..MinerConfig::frequent_only(1, PatternKind::Graph)
    }
}

/// Every pattern's form with the number of times it was reported.
fn report_counts(patterns: &[MinedPattern]) -> HashMap<Form, usize> {
    let mut counts = HashMap::new();
    for pattern in patterns {
        *counts.entry(pattern_form(pattern)).or_insert(0) += 1;
    }
    counts
}

fn hexagon(id: u32) -> bbrc_miner::TreeRecord {
    let bonds: Vec<_> = (0..6).map(|i| (i, (i + 1) % 6, 1)).collect();
    molecule(id, &[6; 6], &bonds)
}

#[test]
fn test_ring_is_reported_once() {
    let records = vec![hexagon(1), hexagon(2)];
    let patterns = mine(MinerConfig::frequent_only(2, PatternKind::Graph), &records);
    let rings: Vec<_> = patterns.iter().filter(|p| p.kind == PatternKind::Graph).collect();
    assert_eq!(rings.len(), 1);
    assert_eq!(rings[0].size, 6);
    assert_eq!(rings[0].graph.edge_count(), 6);
    assert_eq!(rings[0].frequency, 2.0);
    // open chains of every length up to six nodes
    let chains = patterns.iter().filter(|p| p.kind != PatternKind::Graph).count();
    assert_eq!(chains, 5);
}

#[test]
fn test_four_ring_with_branch_is_reported_once() {
    let atoms = [6, 7, 6, 6, 7];
    let bonds = [(0, 1, 1), (1, 2, 1), (1, 3, 1), (0, 4, 1), (2, 4, 1)];
    let patterns = mine(all_graphs(), &[molecule(1, &atoms, &bonds)]);
    let whole = canonical_form(&atoms, &bonds);
    let counts = report_counts(&patterns);
    assert_eq!(counts.get(&whole), Some(&1));
    assert!(counts.values().all(|&n| n == 1));
}

#[test]
fn test_triangle_with_two_tails_is_found() {
    let atoms = [6, 7, 6, 7, 7];
    let bonds = [(0, 1, 1), (1, 2, 1), (0, 3, 1), (1, 4, 1), (0, 4, 1)];
    let patterns = mine(all_graphs(), &[molecule(1, &atoms, &bonds)]);
    let whole = canonical_form(&atoms, &bonds);
    let found: Vec<_> = patterns
        .iter()
        .filter(|p| pattern_form(p) == whole)
        .collect();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].kind, PatternKind::Graph);
    assert_eq!(found[0].frequency, 1.0);
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(40))]

    #[test]
    fn test_graph_mode_finds_every_connected_subgraph_once(records in random_cyclic_graphs(4, 5)) {
        let mut support: HashMap<Form, f64> = HashMap::new();
        for record in &records {
            for form in connected_subgraphs(record) {
                *support.entry(form).or_insert(0.0) += 1.0;
            }
        }
        let patterns = mine(all_graphs(), &records);
        let counts = report_counts(&patterns);
        for pattern in &patterns {
            let form = pattern_form(pattern);
            prop_assert_eq!(counts[&form], 1, "{} reported twice", pattern.smarts);
            prop_assert_eq!(support.get(&form).copied(), Some(pattern.frequency), "{}", pattern.smarts);
        }
        for form in support.keys() {
            prop_assert!(counts.contains_key(form), "missing {:?}", form);
        }
    }
}

#[test]
fn test_trees_ignore_closing_edges() {
    let records = vec![hexagon(1), hexagon(2)];
    let patterns = mine(MinerConfig::frequent_only(2, PatternKind::Tree), &records);
    assert!(patterns.iter().all(|p| p.kind != PatternKind::Graph));
    assert!(patterns.iter().all(|p| p.graph.edge_count() + 1 == p.size));
}

#[test]
fn test_gsp_records_with_errors_are_skipped() {
    let text = "\
t # 10
v 0 6
v 1 8
e 0 1 1
t # 11
v 0 6
v 2 8
t # 12
v 0 6
v 1 8
e 0 5 1
t # 13
v 0 6
v 1 8
e 0 1 1
";
    let mut miner = Miner::new(
        MinerConfig::frequent_only(2, PatternKind::Tree)
            .validate()
            .unwrap(),
    );
    assert_eq!(miner.read_gsp(text.as_bytes()).unwrap(), 2);
    let mut patterns: Vec<MinedPattern> = Vec::new();
    miner.mine_all(&mut patterns).unwrap();
    assert_eq!(patterns.len(), 1);
    assert_eq!(patterns[0].active_ids, Vec::<u32>::new());
}

#[test]
fn test_activities_for_unknown_graphs_are_skipped() {
    let mut miner = Miner::new(MinerConfig::default().validate().unwrap());
    miner
        .read_gsp("t # 1\nv 0 6\nt # 2\nv 0 6\n".as_bytes())
        .unwrap();
    let set = miner
        .read_activities("# id name value\n1 a 1\n2 b 0\n3 c 1\n4 d 7\n".as_bytes())
        .unwrap();
    assert_eq!(set, 2);
    let mut patterns: Vec<MinedPattern> = Vec::new();
    assert!(miner.mine_all(&mut patterns).is_ok());
}

#[test]
fn test_missing_activity_aborts() {
    let mut miner = Miner::new(MinerConfig::default().validate().unwrap());
    miner.read_gsp("t # 1\nv 0 6\nt # 2\nv 0 6\n".as_bytes()).unwrap();
    miner.set_activity(2, 1.0);
    let mut patterns: Vec<MinedPattern> = Vec::new();
    assert!(matches!(
        miner.mine_all(&mut patterns),
        Err(MinerError::MissingActivity { id: 1 })
    ));
}
