// Copyright (C) 2025 Jeremy J. Carroll. See LICENSE for details.

//! The graph database and its label index.
//!
//! Graphs are added one at a time; each node label and each combined
//! `(edge label, endpoint label, endpoint label)` triple is interned into a
//! dense internal label the first time it is seen, and its weighted
//! support is counted. [`Database::finalize`] then ranks the frequent edge
//! labels by ascending support, renames every database edge to its rank,
//! strips infrequent edges, and records the root occurrences of every
//! frequent node label. After that the database is read-only.

mod activity;
mod gsp;
mod tree;

pub use activity::{ActivityReader, ActivityRecord};
pub use gsp::GspReader;
pub use tree::{DatabaseTree, DatabaseTreeEdge, DatabaseTreeNode, TreeRecord};

use crate::error::{MinerError, Result};
use crate::occurrence::{LegOccurrence, LegOccurrences};
use crate::types::{
    EdgeLabel, Frequency, InputEdgeLabel, InputNodeLabel, NodeId, NodeLabel, OrigId, Tid,
    NO_EDGE_LABEL, NO_NODE, NO_NODE_LABEL, NO_TID,
};
use rustc_hash::FxHashMap;
use tracing::debug;

#[derive(Debug, Clone)]
pub struct NodeLabelEntry {
    pub input_label: InputNodeLabel,
    pub frequency: Frequency,
    last_tid: Tid,
    /// One occurrence per database node carrying this label.
    pub occurrences: LegOccurrences,
    /// Ranks of the frequent edge labels incident to this label, ascending.
    pub frequent_edge_labels: Vec<EdgeLabel>,
}

#[derive(Debug, Clone)]
pub struct EdgeLabelEntry {
    pub input_edge_label: InputEdgeLabel,
    /// The smaller internal endpoint label.
    pub from_node_label: NodeLabel,
    pub to_node_label: NodeLabel,
    /// Frequency rank, assigned at finalization.
    pub rank: EdgeLabel,
    pub frequency: Frequency,
    last_tid: Tid,
}

impl EdgeLabelEntry {
    /// The endpoint label opposite to `label`.
    pub fn other_end(&self, label: NodeLabel) -> NodeLabel {
        if self.from_node_label == label {
            self.to_node_label
        } else {
            self.from_node_label
        }
    }
}

#[derive(Debug, Default)]
pub struct Database {
    trees: Vec<DatabaseTree>,
    by_orig_id: FxHashMap<OrigId, Tid>,
    node_labels: Vec<NodeLabelEntry>,
    edge_labels: Vec<EdgeLabelEntry>,
    node_label_map: FxHashMap<InputNodeLabel, NodeLabel>,
    edge_label_map: FxHashMap<(InputEdgeLabel, NodeLabel, NodeLabel), EdgeLabel>,
    /// Rank to position in `edge_labels`, frequent labels only.
    rank_index: Vec<usize>,
    finalized: bool,
}

impl Database {
    pub fn new() -> Self {
        Database::default()
    }

    /// Validates and stores one graph, returning its dense id.
    ///
    /// A rejected record leaves the database untouched.
    pub fn add_tree(&mut self, record: TreeRecord) -> Result<Tid> {
        let format_error = |message: String| MinerError::InputFormat {
            line: record.line_nr,
            message,
        };
        if self.finalized {
            return Err(format_error("graphs cannot be added after mining started".into()));
        }
        if record.nodes.len() >= NO_NODE as usize {
            return Err(MinerError::ResourceLimitExceeded {
                what: "nodes in one graph",
                limit: NO_NODE as usize - 1,
            });
        }
        if self.trees.len() >= NO_TID as usize {
            return Err(MinerError::ResourceLimitExceeded {
                what: "graphs in the database",
                limit: NO_TID as usize - 1,
            });
        }
        if !(record.weight.is_finite() && record.weight >= 0.0) {
            return Err(format_error(format!("invalid weight {}", record.weight)));
        }
        if self.by_orig_id.contains_key(&record.orig_id) {
            return Err(format_error(format!("duplicate graph id {}", record.orig_id)));
        }
        for &(from, to, _) in &record.edges {
            if from >= record.nodes.len() || to >= record.nodes.len() {
                return Err(format_error(format!(
                    "edge {}-{} refers to a missing node ({} nodes)",
                    from,
                    to,
                    record.nodes.len()
                )));
            }
            if from == to {
                return Err(format_error(format!("self loop on node {}", from)));
            }
        }
        self.check_label_capacity(&record)?;

        let tid = self.trees.len() as Tid;
        let weight = record.weight;
        let labels: Vec<NodeLabel> = record
            .nodes
            .iter()
            .map(|&input| self.intern_node_label(input, tid, weight))
            .collect();
        let mut adjacency = vec![Vec::new(); record.nodes.len()];
        for &(from, to, input_edge_label) in &record.edges {
            let (l1, l2) = if labels[from] <= labels[to] {
                (labels[from], labels[to])
            } else {
                (labels[to], labels[from])
            };
            let edge_label = self.intern_edge_label(input_edge_label, l1, l2, tid, weight);
            adjacency[from].push(DatabaseTreeEdge {
                edge_label,
                to_node: to as NodeId,
            });
            adjacency[to].push(DatabaseTreeEdge {
                edge_label,
                to_node: from as NodeId,
            });
        }
        let tree = DatabaseTree::from_adjacency(tid, &record, labels, adjacency);
        self.by_orig_id.insert(record.orig_id, tid);
        self.trees.push(tree);
        Ok(tid)
    }

    fn check_label_capacity(&self, record: &TreeRecord) -> Result<()> {
        let mut fresh: Vec<InputNodeLabel> = record
            .nodes
            .iter()
            .copied()
            .filter(|l| !self.node_label_map.contains_key(l))
            .collect();
        fresh.sort_unstable();
        fresh.dedup();
        if self.node_labels.len() + fresh.len() >= NO_NODE_LABEL as usize {
            return Err(MinerError::ResourceLimitExceeded {
                what: "distinct node labels",
                limit: NO_NODE_LABEL as usize - 1,
            });
        }
        let mut fresh_edges: Vec<(InputEdgeLabel, InputNodeLabel, InputNodeLabel)> = Vec::new();
        for &(from, to, input) in &record.edges {
            let (a, b) = (record.nodes[from], record.nodes[to]);
            let known = match (self.node_label_map.get(&a), self.node_label_map.get(&b)) {
                (Some(&la), Some(&lb)) => self
                    .edge_label_map
                    .contains_key(&(input, la.min(lb), la.max(lb))),
                _ => false,
            };
            if !known {
                fresh_edges.push((input, a.min(b), a.max(b)));
            }
        }
        fresh_edges.sort_unstable();
        fresh_edges.dedup();
        if self.edge_labels.len() + fresh_edges.len() >= NO_EDGE_LABEL as usize {
            return Err(MinerError::ResourceLimitExceeded {
                what: "distinct edge labels",
                limit: NO_EDGE_LABEL as usize - 1,
            });
        }
        Ok(())
    }

    fn intern_node_label(&mut self, input: InputNodeLabel, tid: Tid, weight: f64) -> NodeLabel {
        if let Some(&label) = self.node_label_map.get(&input) {
            let entry = &mut self.node_labels[label as usize];
            if entry.last_tid != tid {
                entry.frequency += weight;
                entry.last_tid = tid;
            }
            return label;
        }
        let label = self.node_labels.len() as NodeLabel;
        self.node_label_map.insert(input, label);
        self.node_labels.push(NodeLabelEntry {
            input_label: input,
            frequency: weight,
            last_tid: tid,
            occurrences: LegOccurrences::with_number(1),
            frequent_edge_labels: Vec::new(),
        });
        label
    }

    fn intern_edge_label(
        &mut self,
        input: InputEdgeLabel,
        l1: NodeLabel,
        l2: NodeLabel,
        tid: Tid,
        weight: f64,
    ) -> EdgeLabel {
        if let Some(&label) = self.edge_label_map.get(&(input, l1, l2)) {
            let entry = &mut self.edge_labels[label as usize];
            if entry.last_tid != tid {
                entry.frequency += weight;
                entry.last_tid = tid;
            }
            return label;
        }
        let label = self.edge_labels.len() as EdgeLabel;
        self.edge_label_map.insert((input, l1, l2), label);
        self.edge_labels.push(EdgeLabelEntry {
            input_edge_label: input,
            from_node_label: l1,
            to_node_label: l2,
            rank: NO_EDGE_LABEL,
            frequency: weight,
            last_tid: tid,
        });
        label
    }

    /// Ranks frequent edge labels, prunes infrequent edges and builds the
    /// root occurrence lists. Only the first call has an effect.
    pub fn finalize(&mut self, min_frequency: Frequency) {
        if self.finalized {
            return;
        }
        self.finalized = true;

        let Database {
            trees,
            node_labels,
            edge_labels,
            rank_index,
            ..
        } = self;

        let mut frequent: Vec<usize> = (0..edge_labels.len())
            .filter(|&i| edge_labels[i].frequency >= min_frequency)
            .collect();
        frequent.sort_by(|&a, &b| {
            let (ea, eb) = (&edge_labels[a], &edge_labels[b]);
            ea.frequency
                .total_cmp(&eb.frequency)
                .then(ea.from_node_label.cmp(&eb.from_node_label))
                .then(ea.to_node_label.cmp(&eb.to_node_label))
                .then(ea.input_edge_label.cmp(&eb.input_edge_label))
        });
        // add_tree keeps the edge label count below NO_EDGE_LABEL
        for (rank, &index) in frequent.iter().enumerate() {
            let entry = &mut edge_labels[index];
            entry.rank = rank as EdgeLabel;
            node_labels[entry.to_node_label as usize]
                .frequent_edge_labels
                .push(rank as EdgeLabel);
            if entry.from_node_label != entry.to_node_label {
                node_labels[entry.from_node_label as usize]
                    .frequent_edge_labels
                    .push(rank as EdgeLabel);
            }
        }
        *rank_index = frequent;

        for tree in trees.iter_mut() {
            for j in 0..tree.nodes.len() {
                let label = tree.nodes[j].node_label as usize;
                let entry = &mut node_labels[label];
                if entry.frequency >= min_frequency {
                    let id = entry.occurrences.elements.len() as u32;
                    entry
                        .occurrences
                        .elements
                        .push(LegOccurrence::new(tree.tid, id, j as NodeId, NO_NODE));
                    tree.retain_node_edges(j, |raw| {
                        let edge = &edge_labels[raw as usize];
                        (edge.frequency >= min_frequency).then_some(edge.rank)
                    });
                } else {
                    tree.retain_node_edges(j, |_| None);
                }
            }
        }
        for entry in node_labels.iter_mut() {
            entry.occurrences.frequency = entry.frequency;
        }
        debug!(
            graphs = self.trees.len(),
            node_labels = self.node_labels.len(),
            frequent_edge_labels = self.rank_index.len(),
            "database finalized"
        );
    }

    pub fn is_finalized(&self) -> bool {
        self.finalized
    }

    pub fn is_empty(&self) -> bool {
        self.trees.is_empty()
    }

    pub fn tree_count(&self) -> usize {
        self.trees.len()
    }

    pub fn trees(&self) -> &[DatabaseTree] {
        &self.trees
    }

    pub fn tree(&self, tid: Tid) -> &DatabaseTree {
        &self.trees[tid as usize]
    }

    pub fn tid_of(&self, orig_id: OrigId) -> Option<Tid> {
        self.by_orig_id.get(&orig_id).copied()
    }

    /// Sets the activity of the graph with the given caller id.
    /// Returns `false` if no such graph exists.
    pub fn set_activity(&mut self, orig_id: OrigId, activity: f64) -> bool {
        match self.by_orig_id.get(&orig_id) {
            Some(&tid) => {
                self.trees[tid as usize].activity = Some(activity);
                true
            }
            None => false,
        }
    }

    pub fn node_label_count(&self) -> usize {
        self.node_labels.len()
    }

    pub fn node_label(&self, label: NodeLabel) -> &NodeLabelEntry {
        &self.node_labels[label as usize]
    }

    pub fn node_labels(&self) -> &[NodeLabelEntry] {
        &self.node_labels
    }

    pub fn node_label_of(&self, input: InputNodeLabel) -> Option<NodeLabel> {
        self.node_label_map.get(&input).copied()
    }

    pub fn frequent_edge_label_count(&self) -> usize {
        self.rank_index.len()
    }

    /// The edge label with frequency rank `rank`.
    pub fn edge_label(&self, rank: EdgeLabel) -> &EdgeLabelEntry {
        &self.edge_labels[self.rank_index[rank as usize]]
    }

    /// Rank of the frequent edge `input_edge` between two input node labels.
    pub fn edge_rank(
        &self,
        input_edge: InputEdgeLabel,
        a: InputNodeLabel,
        b: InputNodeLabel,
    ) -> Option<EdgeLabel> {
        let (la, lb) = (self.node_label_of(a)?, self.node_label_of(b)?);
        let index = *self.edge_label_map.get(&(input_edge, la.min(lb), la.max(lb)))?;
        let rank = self.edge_labels[index as usize].rank;
        (rank != NO_EDGE_LABEL).then_some(rank)
    }
}
