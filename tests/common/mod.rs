// Copyright (C) 2025 Jeremy J. Carroll. See LICENSE for details.

//! Common test utilities shared across integration tests.

#![allow(dead_code)]

use bbrc_miner::{LineFormatter, MinedPattern, Miner, MinerConfig, MiningEvent, TreeRecord};
use proptest::prelude::*;
use proptest::sample::Index;

/// A molecule-like record: `atoms[i]` is the label of node `i`, bonds are
/// `(from, to, label)`.
pub fn molecule(id: u32, atoms: &[u32], bonds: &[(usize, usize, u32)]) -> TreeRecord {
    let mut record = TreeRecord::new(id);
    for &atom in atoms {
        record = record.with_node(atom);
    }
    for &(from, to, label) in bonds {
        record = record.with_edge(from, to, label);
    }
    record
}

/// Mines all roots and returns every event in discovery order.
pub fn mine_events(config: MinerConfig, records: &[TreeRecord]) -> Vec<MiningEvent> {
    let mut miner = Miner::new(config.validate().expect("valid configuration"));
    for record in records {
        miner.add_tree(record.clone()).expect("record accepted");
    }
    let mut events: Vec<MiningEvent> = Vec::new();
    miner.mine_all(&mut events).expect("mining succeeds");
    events
}

pub fn mine(config: MinerConfig, records: &[TreeRecord]) -> Vec<MinedPattern> {
    mine_events(config, records)
        .into_iter()
        .filter_map(|event| match event {
            MiningEvent::Pattern(pattern) => Some(pattern),
            MiningEvent::Separator => None,
        })
        .collect()
}

/// The output lines the command line tool would print.
pub fn render(config: &MinerConfig, events: &[MiningEvent]) -> Vec<String> {
    let mut formatter = LineFormatter::new(config);
    events.iter().map(|event| formatter.render(event)).collect()
}

/// Labels independent of node numbering: sorted node labels and sorted
/// `(smaller end, larger end, bond)` edges.
pub fn shape(pattern: &MinedPattern) -> (Vec<u32>, Vec<(u32, u32, u32)>) {
    let labels = pattern.graph.node_labels();
    let mut nodes = labels.to_vec();
    nodes.sort_unstable();
    let mut edges: Vec<(u32, u32, u32)> = pattern
        .graph
        .edges()
        .iter()
        .map(|e| {
            let (a, b) = (labels[e.from], labels[e.to]);
            (a.min(b), a.max(b), e.label)
        })
        .collect();
    edges.sort_unstable();
    (nodes, edges)
}

/// Random labeled trees: node labels from {6, 7, 8}, bond labels 1 or 2,
/// each node attached to a random earlier node.
pub fn random_trees(max_trees: usize, max_nodes: usize) -> impl Strategy<Value = Vec<TreeRecord>> {
    let tree = (
        prop::collection::vec(0u32..3, 2..=max_nodes),
        prop::collection::vec(any::<Index>(), max_nodes),
        prop::collection::vec(1u32..=2, max_nodes),
        any::<bool>(),
    );
    prop::collection::vec(tree, 2..=max_trees).prop_map(|trees| {
        trees
            .into_iter()
            .enumerate()
            .map(|(i, (labels, parents, bonds, active))| {
                let atoms: Vec<u32> = labels.iter().map(|l| 6 + l).collect();
                let edges: Vec<(usize, usize, u32)> = (1..atoms.len())
                    .map(|n| (parents[n].index(n), n, bonds[n]))
                    .collect();
                molecule(i as u32 + 1, &atoms, &edges)
                    .with_activity(if active { 1.0 } else { 0.0 })
            })
            .collect()
    })
}

/// Whether `record` contains the one-edge pattern `a -bond- b`.
pub fn has_edge(record: &TreeRecord, a: u32, b: u32, bond: u32) -> bool {
    record.edges.iter().any(|&(x, y, label)| {
        let (lx, ly) = (record.nodes[x], record.nodes[y]);
        label == bond && ((lx, ly) == (a, b) || (lx, ly) == (b, a))
    })
}

/// Whether `record` contains two distinct edges meeting at a node labeled
/// `center`, reaching `(end, bond)` pairs `first` and `second`.
pub fn has_fork(record: &TreeRecord, center: u32, first: (u32, u32), second: (u32, u32)) -> bool {
    let neighbors = |node: usize| -> Vec<(usize, (u32, u32))> {
        record
            .edges
            .iter()
            .filter_map(|&(x, y, label)| {
                if x == node {
                    Some((y, (record.nodes[y], label)))
                } else if y == node {
                    Some((x, (record.nodes[x], label)))
                } else {
                    None
                }
            })
            .collect()
    };
    (0..record.nodes.len())
        .filter(|&node| record.nodes[node] == center)
        .any(|node| {
            let around = neighbors(node);
            around.iter().any(|&(u, lu)| {
                lu == first && around.iter().any(|&(v, lv)| v != u && lv == second)
            })
        })
}

/// Node labels and `(smaller, larger, bond)` edges under the node
/// numbering that makes them smallest. Equal for isomorphic graphs only.
pub type Form = (Vec<u32>, Vec<(usize, usize, u32)>);

/// Tries every numbering of the nodes; meant for graphs of a few nodes.
pub fn canonical_form(nodes: &[u32], edges: &[(usize, usize, u32)]) -> Form {
    fn search(
        nodes: &[u32],
        edges: &[(usize, usize, u32)],
        numbering: &mut Vec<usize>,
        used: &mut Vec<bool>,
        best: &mut Option<Form>,
    ) {
        if numbering.len() == nodes.len() {
            let mut labels = vec![0; nodes.len()];
            for (old, &new) in numbering.iter().enumerate() {
                labels[new] = nodes[old];
            }
            let mut renamed: Vec<_> = edges
                .iter()
                .map(|&(x, y, bond)| {
                    let (a, b) = (numbering[x], numbering[y]);
                    (a.min(b), a.max(b), bond)
                })
                .collect();
            renamed.sort_unstable();
            let form = (labels, renamed);
            if best.as_ref().map_or(true, |b| form < *b) {
                *best = Some(form);
            }
            return;
        }
        for new in 0..nodes.len() {
            if !used[new] {
                used[new] = true;
                numbering.push(new);
                search(nodes, edges, numbering, used, best);
                numbering.pop();
                used[new] = false;
            }
        }
    }
    let mut best = None;
    search(nodes, edges, &mut Vec::new(), &mut vec![false; nodes.len()], &mut best);
    best.unwrap_or_default()
}

pub fn pattern_form(pattern: &MinedPattern) -> Form {
    let edges: Vec<_> = pattern
        .graph
        .edges()
        .iter()
        .map(|e| (e.from, e.to, e.label))
        .collect();
    canonical_form(pattern.graph.node_labels(), &edges)
}

/// Forms of every connected subgraph of `record` with at least one edge.
pub fn connected_subgraphs(record: &TreeRecord) -> std::collections::HashSet<Form> {
    let m = record.edges.len();
    let mut forms = std::collections::HashSet::new();
    for mask in 1u32..(1 << m) {
        let chosen: Vec<_> = (0..m)
            .filter(|i| mask & (1 << i) != 0)
            .map(|i| record.edges[i])
            .collect();
        let mut index = vec![usize::MAX; record.nodes.len()];
        let mut nodes = Vec::new();
        for &(x, y, _) in &chosen {
            for v in [x, y] {
                if index[v] == usize::MAX {
                    index[v] = nodes.len();
                    nodes.push(record.nodes[v]);
                }
            }
        }
        let edges: Vec<_> = chosen
            .iter()
            .map(|&(x, y, bond)| (index[x], index[y], bond))
            .collect();
        // connected when flooding from node 0 reaches every node
        let mut reached = vec![false; nodes.len()];
        reached[0] = true;
        let mut grew = true;
        while grew {
            grew = false;
            for &(a, b, _) in &edges {
                if reached[a] != reached[b] {
                    reached[a] = true;
                    reached[b] = true;
                    grew = true;
                }
            }
        }
        if reached.iter().all(|&r| r) {
            forms.insert(canonical_form(&nodes, &edges));
        }
    }
    forms
}

/// Random small connected graphs: a random tree over labels {6, 7} plus
/// up to two extra bonds between nodes not yet bonded.
pub fn random_cyclic_graphs(max_graphs: usize, max_nodes: usize) -> impl Strategy<Value = Vec<TreeRecord>> {
    let graph = (
        prop::collection::vec(0u32..2, 3..=max_nodes),
        prop::collection::vec(any::<Index>(), max_nodes),
        prop::collection::vec(1u32..=2, max_nodes + 2),
        prop::collection::vec((any::<Index>(), any::<Index>()), 1..=2),
    );
    prop::collection::vec(graph, 2..=max_graphs).prop_map(move |graphs| {
        graphs
            .into_iter()
            .enumerate()
            .map(|(i, (labels, parents, bonds, extra))| {
                let atoms: Vec<u32> = labels.iter().map(|l| 6 + l).collect();
                let n = atoms.len();
                let mut edges: Vec<(usize, usize, u32)> = (1..n)
                    .map(|v| (parents[v].index(v), v, bonds[v]))
                    .collect();
                for (k, (a, b)) in extra.into_iter().enumerate() {
                    let (x, y) = (a.index(n), b.index(n));
                    let bonded = edges
                        .iter()
                        .any(|&(p, q, _)| (p, q) == (x, y) || (p, q) == (y, x));
                    if x != y && !bonded {
                        edges.push((x.min(y), x.max(y), bonds[max_nodes + k]));
                    }
                }
                molecule(i as u32 + 1, &atoms, &edges)
            })
            .collect()
    })
}
