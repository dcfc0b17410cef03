// Copyright (C) 2025 Jeremy J. Carroll. See LICENSE for details.

//! Merge joins of two sibling legs, and of a leg with itself.

use super::{LegOccurrence, LegOccurrences};
use crate::database::Database;
use crate::graphstate::GraphState;
use crate::types::{Frequency, NodeId, NO_TID};

/// Embeddings of `a` that can also be extended by `b` at the same parent
/// embedding, mapping `b`'s node onto a different database node.
///
/// Returns `None` when the connecting node has no free degree left or the
/// join is infrequent.
pub fn join(
    db: &Database,
    graph_state: &GraphState,
    min_frequency: Frequency,
    a: &LegOccurrences,
    connecting_node: NodeId,
    b: &LegOccurrences,
) -> Option<LegOccurrences> {
    if graph_state.node_degree(connecting_node) == graph_state.node_max_degree(connecting_node) {
        return None;
    }
    let (left, right) = (&a.elements, &b.elements);
    if left.is_empty() || right.is_empty() {
        return None;
    }
    let mut result = LegOccurrences::with_number(a.number + 1);
    let mut last_tid = NO_TID;
    let mut last_self = NO_TID;
    let (mut j, mut k) = (0usize, 0usize);
    loop {
        while j < left.len() && left[j].occurrence_id < right[k].occurrence_id {
            j += 1;
        }
        if j >= left.len() {
            break;
        }
        let group = left[j];
        while k < right.len() && right[k].occurrence_id < group.occurrence_id {
            k += 1;
        }
        if k >= right.len() {
            break;
        }
        if right[k].occurrence_id != group.occurrence_id {
            continue;
        }
        let m = j;
        while j < left.len() && left[j].occurrence_id == group.occurrence_id {
            j += 1;
        }
        let l = k;
        while k < right.len() && right[k].occurrence_id == group.occurrence_id {
            k += 1;
        }
        let tree = db.tree(group.tid);
        let mut added = false;
        for m2 in m..j {
            let mut d = 0;
            for other in &right[l..k] {
                if left[m2].to_node != other.to_node {
                    result.elements.push(LegOccurrence::new(
                        group.tid,
                        m2 as u32,
                        other.to_node,
                        other.from_node,
                    ));
                    result.raise_max_degree(tree.degree(other.to_node));
                    added = true;
                    d += 1;
                }
            }
            if d > 1 && group.tid != last_self {
                last_self = group.tid;
                result.self_join += tree.weight;
            }
        }
        if added && group.tid != last_tid {
            last_tid = group.tid;
            result.frequency += tree.weight;
        }
        if k == right.len() {
            break;
        }
    }
    (result.frequency >= min_frequency).then_some(result)
}

/// Pairs of distinct occurrences of `a` sharing a parent embedding: the
/// pattern gets the same leg twice.
pub fn self_join(
    db: &Database,
    min_frequency: Frequency,
    a: &LegOccurrences,
) -> Option<LegOccurrences> {
    if a.self_join < min_frequency || a.elements.is_empty() {
        return None;
    }
    let occs = &a.elements;
    let mut result = LegOccurrences::with_number(a.number + 1);
    result.frequency = a.self_join;
    let mut last_self = NO_TID;
    let mut j = 0usize;
    while j < occs.len() {
        let k = j;
        let group = occs[k];
        j += 1;
        while j < occs.len() && occs[j].occurrence_id == group.occurrence_id {
            j += 1;
        }
        let tree = db.tree(group.tid);
        for l in k..j {
            for m in k..j {
                if l != m {
                    result.elements.push(LegOccurrence::new(
                        group.tid,
                        l as u32,
                        occs[m].to_node,
                        occs[m].from_node,
                    ));
                    result.raise_max_degree(tree.degree(occs[m].to_node));
                }
            }
        }
        if j - k > 2 && group.tid != last_self {
            last_self = group.tid;
            result.self_join += tree.weight;
        }
    }
    Some(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::TreeRecord;
    use crate::occurrence::{extend, OccurrenceChain};

    /// Carbon with two oxygens and one nitrogen, plus a carbon with one of each.
    fn database() -> Database {
        let mut db = Database::new();
        db.add_tree(
            TreeRecord::new(1)
                .with_node(6)
                .with_node(8)
                .with_node(8)
                .with_node(7)
                .with_edge(0, 1, 1)
                .with_edge(0, 2, 1)
                .with_edge(0, 3, 1),
        )
        .unwrap();
        db.add_tree(
            TreeRecord::new(2)
                .with_node(6)
                .with_node(8)
                .with_node(7)
                .with_edge(0, 1, 1)
                .with_edge(0, 2, 1),
        )
        .unwrap();
        db.finalize(1.0);
        db
    }

    fn legs(db: &Database) -> (GraphState, Vec<LegOccurrences>) {
        let carbon = db.node_label_of(6).unwrap();
        let mut gs = GraphState::new();
        gs.insert_start_node(carbon);
        let chain = OccurrenceChain::root(&db.node_label(carbon).occurrences);
        let legs = extend(db, &gs, &chain).legs;
        (gs, legs)
    }

    #[test]
    fn test_join_of_sibling_legs() {
        let db = database();
        let (mut gs, legs) = legs(&db);
        let co = &legs[db.edge_rank(1, 6, 8).unwrap() as usize];
        let cn = &legs[db.edge_rank(1, 6, 7).unwrap() as usize];
        gs.insert_node(&db, 0, db.edge_rank(1, 6, 8).unwrap(), co.max_degree);
        let joined = join(&db, &gs, 1.0, co, 0, cn).unwrap();
        assert_eq!(joined.frequency, 2.0);
        // two oxygens times one nitrogen, plus one pair in the second graph
        assert_eq!(joined.elements.len(), 3);
        assert_eq!(joined.number, 3);
        assert!(join(&db, &gs, 3.0, co, 0, cn).is_none());
    }

    #[test]
    fn test_self_join_needs_two_siblings() {
        let db = database();
        let (_gs, legs) = legs(&db);
        let co = &legs[db.edge_rank(1, 6, 8).unwrap() as usize];
        assert_eq!(co.self_join, 1.0);
        let joined = self_join(&db, 1.0, co).unwrap();
        assert_eq!(joined.frequency, 1.0);
        assert_eq!(joined.elements.len(), 2);
        assert!(self_join(&db, 2.0, co).is_none());
    }

    #[test]
    fn test_join_refused_when_degree_saturated() {
        let db = database();
        let (mut gs, legs) = legs(&db);
        let co = &legs[db.edge_rank(1, 6, 8).unwrap() as usize];
        let cn = &legs[db.edge_rank(1, 6, 7).unwrap() as usize];
        gs.insert_node(&db, 0, db.edge_rank(1, 6, 8).unwrap(), co.max_degree);
        gs.set_node_max_degree(0, 1);
        assert!(join(&db, &gs, 1.0, co, 0, cn).is_none());
    }
}
