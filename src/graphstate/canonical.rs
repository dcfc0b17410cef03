// Copyright (C) 2025 Jeremy J. Carroll. See LICENSE for details.

//! Canonical-form check for patterns with closing edges.
//!
//! A cyclic pattern is reached once for every spanning tree the search can
//! grow it from, and once for every way of numbering that tree's nodes. It
//! is kept only when the search's own spanning tree has the smallest
//! [`TreeShape`] key of all spanning trees, and no isomorphism from another
//! spanning tree of that shape onto it renames the remaining edges into
//! smaller closing edges.

use super::normalize::TreeShape;
use super::{CanonicalForm, GraphState, NONE};
use crate::error::{MinerError, Result};
use crate::occurrence::CloseTuple;
use std::cmp::Ordering;

/// Largest number of closing edges a pattern may carry: one cycle-mark bit
/// per deletion level.
pub const MAX_CLOSING_EDGES: usize = 63;

/// The search's own spanning tree and its closing edges, sorted.
pub(super) struct Target {
    tree: TreeShape,
    close_tuples: Vec<CloseTuple>,
}

impl GraphState {
    /// Decides whether the current pattern, grown as the spanning tree of
    /// its non-closing edges plus the closing edges `close_tuples` (each
    /// with `from > to`), is in canonical form.
    ///
    /// No edges may be deleted when this is called; the graph is left as it
    /// was found.
    pub fn is_canonical(&mut self, close_tuples: &[CloseTuple]) -> Result<CanonicalForm> {
        if close_tuples.len() > MAX_CLOSING_EDGES {
            return Err(MinerError::ResourceLimitExceeded {
                what: "closing edges in one pattern",
                limit: MAX_CLOSING_EDGES,
            });
        }
        if self.nodes.is_empty() || close_tuples.is_empty() {
            return Ok(CanonicalForm::Canonical);
        }
        if self.deleted.len() != 1 {
            return Err(MinerError::InternalInvariantViolation(format!(
                "{} edges still deleted before the canonical check",
                self.deleted.len() - 1
            )));
        }
        let mut sorted = close_tuples.to_vec();
        sorted.sort_unstable();
        let target = Target {
            tree: self.normalize_self(),
            close_tuples: sorted,
        };
        self.enumerate_spanning(&target)
    }

    /// Shape of the spanning tree the search itself built.
    pub(super) fn normalize_self(&self) -> TreeShape {
        TreeShape::new(self, |edge| !edge.close)
    }

    /// Compares the spanning tree left after the current deletions with
    /// the target.
    fn normalize_tree(&self, target: &Target) -> CanonicalForm {
        let spanning = TreeShape::new(self, |_| true);
        match spanning.key().cmp(target.tree.key()) {
            Ordering::Less => return CanonicalForm::SmallerFoundWithPrefix,
            Ordering::Greater => return CanonicalForm::Canonical,
            Ordering::Equal => {}
        }
        let removed = &self.deleted[1..];
        let mut renamed = Vec::with_capacity(removed.len());
        let mut smaller = false;
        spanning.isomorphisms(&target.tree, &mut |map| {
            renamed.clear();
            renamed.extend(removed.iter().map(|edge| {
                let (a, b) = (map[edge.from_node] as u32 + 1, map[edge.to_node] as u32 + 1);
                CloseTuple {
                    from: a.max(b),
                    to: a.min(b),
                    label: edge.edge_label,
                }
            }));
            renamed.sort_unstable();
            smaller = renamed < target.close_tuples;
            smaller
        });
        if smaller {
            CanonicalForm::SmallerFoundTailOnly
        } else {
            CanonicalForm::Canonical
        }
    }

    /// Marks with `bit` every edge that lies on a cycle.
    fn determine_cycles(&mut self, bit: u64) {
        for node in &mut self.nodes {
            for edge in &mut node.edges {
                edge.cycle_mark &= !bit;
            }
        }
        let mut in_stack = vec![false; self.nodes.len()];
        // slot 0 is a sentinel so the parent of the top is always readable
        let mut node_stack = vec![NONE, 0];
        let mut edge_stack = vec![NONE, 0];
        in_stack[0] = true;
        while node_stack.len() > 1 {
            let top = node_stack.len() - 1;
            let node = node_stack[top];
            if edge_stack[top] >= self.nodes[node].edges.len() {
                in_stack[node] = false;
                node_stack.pop();
                edge_stack.pop();
                if let Some(next) = edge_stack.last_mut() {
                    *next = next.wrapping_add(1);
                }
                continue;
            }
            let edge = self.nodes[node].edges[edge_stack[top]];
            if edge.cycle_mark & bit != 0 {
                edge_stack[top] += 1;
                continue;
            }
            if in_stack[edge.to_node] {
                if edge.to_node != node_stack[top - 1] {
                    let mut k = top;
                    loop {
                        let at = node_stack[k];
                        let on_stack = self.nodes[at].edges[edge_stack[k]];
                        self.nodes[at].edges[edge_stack[k]].cycle_mark |= bit;
                        self.nodes[on_stack.to_node].edges[on_stack.pos_to_node].cycle_mark |= bit;
                        if at == edge.to_node {
                            break;
                        }
                        k -= 1;
                    }
                }
                edge_stack[top] += 1;
            } else {
                node_stack.push(edge.to_node);
                edge_stack.push(0);
                in_stack[edge.to_node] = true;
            }
        }
    }

    /// Deletes cycle edges in decreasing order until a spanning tree
    /// remains, so that every spanning tree is visited once, and compares
    /// each with the target.
    fn enumerate_spanning(&mut self, target: &Target) -> Result<CanonicalForm> {
        if self.edges_size + 1 == self.nodes.len() {
            return Ok(self.normalize_tree(target));
        }
        let level = self.deleted.len() - 1;
        if level >= MAX_CLOSING_EDGES {
            return Err(MinerError::ResourceLimitExceeded {
                what: "closing edges in one pattern",
                limit: MAX_CLOSING_EDGES,
            });
        }
        let bit = 1u64 << level;
        self.determine_cycles(bit);
        let (last_from, last_to) = match self.deleted.last() {
            Some(last) => (last.from_node, last.to_node),
            None => (NONE, NONE),
        };
        let mut form = CanonicalForm::Canonical;
        for i in 0..self.nodes.len() {
            let mut j = 0;
            while j < self.nodes[i].edges.len() {
                let edge = self.nodes[i].edges[j];
                if edge.cycle_mark & bit != 0
                    && edge.to_node > i
                    && (i < last_from || (i == last_from && edge.to_node < last_to))
                {
                    self.delete_edge_at(i, j);
                    let found = self.enumerate_spanning(target);
                    self.reinsert_edge();
                    match found? {
                        CanonicalForm::SmallerFoundWithPrefix => {
                            return Ok(CanonicalForm::SmallerFoundWithPrefix)
                        }
                        CanonicalForm::SmallerFoundTailOnly => {
                            form = CanonicalForm::SmallerFoundTailOnly
                        }
                        CanonicalForm::Canonical => {}
                    }
                }
                j += 1;
            }
        }
        Ok(form)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::{Database, TreeRecord};
    use crate::types::EdgeLabel;

    fn carbon_ring(size: usize) -> Database {
        let mut record = TreeRecord::new(1);
        for i in 0..size {
            record = record.with_node(6).with_edge(i, (i + 1) % size, 1);
        }
        let mut db = Database::new();
        db.add_tree(record).unwrap();
        db.finalize(1.0);
        db
    }

    fn carbon_path(db: &Database, size: usize) -> (GraphState, EdgeLabel) {
        let carbon = db.node_label_of(6).unwrap();
        let cc = db.edge_rank(1, 6, 6).unwrap();
        let mut gs = GraphState::new();
        gs.insert_start_node(carbon);
        for i in 1..size {
            gs.insert_node(db, (i - 1) as u16, cc, 2);
        }
        (gs, cc)
    }

    /// A carbon with three carbon neighbours.
    fn carbon_star(db: &Database) -> (GraphState, EdgeLabel) {
        let carbon = db.node_label_of(6).unwrap();
        let cc = db.edge_rank(1, 6, 6).unwrap();
        let mut gs = GraphState::new();
        gs.insert_start_node(carbon);
        for _ in 0..3 {
            gs.insert_node(db, 0, cc, 3);
        }
        (gs, cc)
    }

    #[test]
    fn test_ring_closed_from_path_is_canonical() {
        let db = carbon_ring(4);
        let (mut gs, cc) = carbon_path(&db, 4);
        gs.insert_edge(4, 1, cc);
        let tuples = [CloseTuple { from: 4, to: 1, label: cc }];
        assert_eq!(gs.is_canonical(&tuples).unwrap(), CanonicalForm::Canonical);
        // the graph is handed back untouched
        assert_eq!(gs.edge_count(), 4);
        assert_eq!(gs.close_tuples(), tuples.to_vec());
        assert_eq!(gs.deleted.len(), 1);
    }

    #[test]
    fn test_triangle_with_tail_prefers_the_star() {
        let db = carbon_ring(4);
        let (mut gs, cc) = carbon_path(&db, 4);
        // triangle 1-2-3 with 4 hanging off 3: removing 1-2 leaves a star,
        // which is smaller than the path the search grew
        gs.insert_edge(3, 1, cc);
        let tuples = [CloseTuple { from: 3, to: 1, label: cc }];
        assert_eq!(
            gs.is_canonical(&tuples).unwrap(),
            CanonicalForm::SmallerFoundWithPrefix
        );
        assert_eq!(gs.edge_count(), 4);
    }

    #[test]
    fn test_star_closes_its_first_two_leaves_only() {
        let db = carbon_ring(4);
        let (mut gs, cc) = carbon_star(&db);
        gs.insert_edge(4, 3, cc);
        let late = [CloseTuple { from: 4, to: 3, label: cc }];
        assert_eq!(
            gs.is_canonical(&late).unwrap(),
            CanonicalForm::SmallerFoundTailOnly
        );
        gs.delete_edge(4, 3);
        gs.insert_edge(3, 2, cc);
        let early = [CloseTuple { from: 3, to: 2, label: cc }];
        assert_eq!(gs.is_canonical(&early).unwrap(), CanonicalForm::Canonical);
    }

    #[test]
    fn test_check_refuses_pending_deletions() {
        let db = carbon_ring(4);
        let (mut gs, cc) = carbon_path(&db, 4);
        gs.insert_edge(4, 1, cc);
        gs.delete_edge_at(0, 0);
        let tuples = [CloseTuple { from: 4, to: 1, label: cc }];
        assert!(matches!(
            gs.is_canonical(&tuples),
            Err(MinerError::InternalInvariantViolation(_))
        ));
    }

    #[test]
    fn test_cycle_marks_cover_the_ring_only() {
        let mut record = TreeRecord::new(1);
        for label in [6, 6, 6, 8] {
            record = record.with_node(label);
        }
        record = record.with_edge(0, 1, 1).with_edge(1, 2, 1).with_edge(2, 3, 1);
        let mut db = Database::new();
        db.add_tree(record).unwrap();
        db.finalize(1.0);
        let (mut gs, cc) = carbon_path(&db, 3);
        let co = db.edge_rank(1, 6, 8).unwrap();
        gs.insert_node(&db, 0, co, 1);
        gs.insert_edge(3, 1, cc);
        gs.determine_cycles(1);
        let on_cycle: Vec<bool> = gs.nodes()[0]
            .edges
            .iter()
            .map(|e| e.cycle_mark & 1 != 0)
            .collect();
        // node 0: edge to 1 (ring), edge to the oxygen (tail), closing edge to 2
        assert_eq!(on_cycle, vec![true, false, true]);
    }
}
