// Copyright (C) 2025 Jeremy J. Carroll. See LICENSE for details.

//! Extension of a leg by one database edge in every possible direction.

use super::{CloseCandidates, CloseLegOccurrence, LegOccurrence, LegOccurrences, OccurrenceChain};
use crate::database::Database;
use crate::graphstate::GraphState;
use crate::types::{EdgeLabel, NO_TID};

/// Result of extending one occurrence list.
#[derive(Debug, Clone)]
pub struct Extension {
    /// Indexed by frequent edge label.
    pub legs: Vec<LegOccurrences>,
    pub closes: CloseCandidates,
}

/// All extensions of `chain.level`, by any frequent edge label.
pub fn extend(db: &Database, graph_state: &GraphState, chain: &OccurrenceChain<'_>) -> Extension {
    extend_filtered(db, graph_state, chain, None)
}

/// Extensions restricted to labels `>= min_label` other than `neglect`.
/// Closing edges are always collected.
pub fn extend_restricted(
    db: &Database,
    graph_state: &GraphState,
    chain: &OccurrenceChain<'_>,
    min_label: EdgeLabel,
    neglect: EdgeLabel,
) -> Extension {
    extend_filtered(db, graph_state, chain, Some((min_label, neglect)))
}

fn extend_filtered(
    db: &Database,
    graph_state: &GraphState,
    chain: &OccurrenceChain<'_>,
    restriction: Option<(EdgeLabel, EdgeLabel)>,
) -> Extension {
    let source = chain.level;
    let label_count = db.frequent_edge_label_count();
    let mut legs = vec![LegOccurrences::with_number(source.number + 1); label_count];
    let mut last_self = vec![NO_TID; label_count];
    let mut closes = CloseCandidates::new(source.number + 1, label_count);
    let last_parent = graph_state.last_node_first_neighbor();

    for (i, occ) in source.elements.iter().enumerate() {
        let i = i as u32;
        let tree = db.tree(occ.tid);
        let weight = tree.weight;
        let node_in_cycle = tree.in_cycle(occ.to_node);
        for edge in tree.node_edges(occ.to_node) {
            if edge.to_node == occ.from_node {
                continue;
            }
            let label = edge.edge_label;
            let number = if node_in_cycle && tree.in_cycle(edge.to_node) {
                chain.pattern_number_of(i, edge.to_node)
            } else {
                0
            };
            let degree = tree.degree(edge.to_node);
            if number == 0 {
                if let Some((min_label, neglect)) = restriction {
                    if label < min_label || label == neglect {
                        continue;
                    }
                }
                let candidate = &mut legs[label as usize];
                match candidate.elements.last() {
                    None => candidate.frequency += weight,
                    Some(back) => {
                        if back.tid != occ.tid {
                            candidate.frequency += weight;
                        }
                        if back.occurrence_id == i && last_self[label as usize] != occ.tid {
                            last_self[label as usize] = occ.tid;
                            candidate.self_join += weight;
                        }
                    }
                }
                candidate
                    .elements
                    .push(LegOccurrence::new(occ.tid, i, edge.to_node, occ.to_node));
                candidate.raise_max_degree(degree);
            } else if last_parent.map_or(true, |parent| u32::from(parent) != number - 1) {
                closes.record(number, label, CloseLegOccurrence { tid: occ.tid, occurrence_id: i }, weight);
                legs[label as usize].raise_max_degree(degree);
            }
        }
    }
    Extension { legs, closes }
}
