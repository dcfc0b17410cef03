// Copyright (C) 2025 Jeremy J. Carroll. See LICENSE for details.

//! One input graph: nodes with dense labels, flattened adjacency, cycle flags.

use crate::types::{EdgeLabel, InputEdgeLabel, InputNodeLabel, NodeId, NodeLabel, OrigId, Tid};

/// A graph as handed over by a parser, before labels are interned.
///
/// Node `i` of the record is `nodes[i]`; edges are undirected.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TreeRecord {
    pub orig_id: OrigId,
    pub line_nr: usize,
    pub nodes: Vec<InputNodeLabel>,
    pub edges: Vec<(usize, usize, InputEdgeLabel)>,
    pub activity: Option<f64>,
    pub weight: f64,
}

impl TreeRecord {
    pub fn new(orig_id: OrigId) -> Self {
        TreeRecord {
            orig_id,
            weight: 1.0,
            ..TreeRecord::default()
        }
    }

    pub fn with_node(mut self, label: InputNodeLabel) -> Self {
        self.nodes.push(label);
        self
    }

    pub fn with_edge(mut self, from: usize, to: usize, label: InputEdgeLabel) -> Self {
        self.edges.push((from, to, label));
        self
    }

    pub fn with_activity(mut self, activity: f64) -> Self {
        self.activity = Some(activity);
        self
    }

    pub fn with_weight(mut self, weight: f64) -> Self {
        self.weight = weight;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DatabaseTreeEdge {
    pub edge_label: EdgeLabel,
    pub to_node: NodeId,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatabaseTreeNode {
    pub node_label: NodeLabel,
    pub in_cycle: bool,
    edge_start: usize,
    edge_len: usize,
}

#[derive(Debug, Clone)]
pub struct DatabaseTree {
    pub tid: Tid,
    pub orig_id: OrigId,
    pub line_nr: usize,
    pub nodes: Vec<DatabaseTreeNode>,
    edges: Vec<DatabaseTreeEdge>,
    pub activity: Option<f64>,
    pub weight: f64,
}

impl DatabaseTree {
    /// Builds a tree from per-node adjacency lists and marks its cycle nodes.
    pub(crate) fn from_adjacency(
        tid: Tid,
        record: &TreeRecord,
        labels: Vec<NodeLabel>,
        adjacency: Vec<Vec<DatabaseTreeEdge>>,
    ) -> Self {
        let mut nodes = Vec::with_capacity(labels.len());
        let mut edges = Vec::with_capacity(adjacency.iter().map(Vec::len).sum());
        for (label, node_edges) in labels.into_iter().zip(adjacency) {
            nodes.push(DatabaseTreeNode {
                node_label: label,
                in_cycle: false,
                edge_start: edges.len(),
                edge_len: node_edges.len(),
            });
            edges.extend(node_edges);
        }
        let mut tree = DatabaseTree {
            tid,
            orig_id: record.orig_id,
            line_nr: record.line_nr,
            nodes,
            edges,
            activity: record.activity,
            weight: record.weight,
        };
        tree.determine_cycled_nodes();
        tree
    }

    pub fn node_edges(&self, node: NodeId) -> &[DatabaseTreeEdge] {
        let n = &self.nodes[node as usize];
        &self.edges[n.edge_start..n.edge_start + n.edge_len]
    }

    pub fn degree(&self, node: NodeId) -> usize {
        self.nodes[node as usize].edge_len
    }

    pub fn node_label(&self, node: NodeId) -> NodeLabel {
        self.nodes[node as usize].node_label
    }

    pub fn in_cycle(&self, node: NodeId) -> bool {
        self.nodes[node as usize].in_cycle
    }

    /// Keeps the edges selected by `keep` (relabelled) and drops the rest, in place.
    pub(crate) fn retain_node_edges<F>(&mut self, node: usize, mut keep: F)
    where
        F: FnMut(EdgeLabel) -> Option<EdgeLabel>,
    {
        let start = self.nodes[node].edge_start;
        let len = self.nodes[node].edge_len;
        let mut k = 0;
        for l in 0..len {
            let edge = self.edges[start + l];
            if let Some(label) = keep(edge.edge_label) {
                self.edges[start + k] = DatabaseTreeEdge {
                    edge_label: label,
                    to_node: edge.to_node,
                };
                k += 1;
            }
        }
        self.nodes[node].edge_len = k;
    }

    /// Marks every node lying on a cycle.
    ///
    /// Depth-first search with an explicit stack; a back edge to a node on the
    /// current path (other than the immediate parent) marks the path segment
    /// between the two as cyclic.
    fn determine_cycled_nodes(&mut self) {
        let n = self.nodes.len();
        let mut visited = vec![false; n];
        let mut on_path = vec![false; n];
        // (node, next edge to try)
        let mut stack: Vec<(usize, usize)> = Vec::new();
        for start in 0..n {
            if visited[start] {
                continue;
            }
            visited[start] = true;
            on_path[start] = true;
            stack.push((start, 0));
            while let Some(&(node, next)) = stack.last() {
                let node_edges = self.node_edges(node as NodeId);
                if next >= node_edges.len() {
                    on_path[node] = false;
                    stack.pop();
                    continue;
                }
                let to = node_edges[next].to_node as usize;
                if let Some(top) = stack.last_mut() {
                    top.1 += 1;
                }
                if !visited[to] {
                    visited[to] = true;
                    on_path[to] = true;
                    stack.push((to, 0));
                } else if on_path[to] && (stack.len() == 1 || stack[stack.len() - 2].0 != to) {
                    for &(member, _) in stack.iter().rev() {
                        self.nodes[member].in_cycle = true;
                        if member == to {
                            break;
                        }
                    }
                }
            }
        }
    }
}
