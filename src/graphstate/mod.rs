// Copyright (C) 2025 Jeremy J. Carroll. See LICENSE for details.

//! The pattern under construction.
//!
//! The search grows one shared pattern by pushing and popping nodes and
//! closing edges in strict stack order. The canonical-form checker
//! additionally deletes arbitrary edges to walk the spanning trees of a
//! cyclic pattern; every such deletion is recorded so that
//! [`GraphState::reinsert_edge`] puts the edge back into exactly the slots
//! it came from.
//!
//! Node ids are positions in insertion order. Close tuples and occurrence
//! list numbers refer to nodes 1-based.

mod canonical;
mod normalize;
mod snapshot;

pub use snapshot::{PatternEdge, PatternGraph};

use crate::database::Database;
use crate::occurrence::CloseTuple;
use crate::types::{Depth, EdgeLabel, NodeId, NodeLabel};

const NONE: usize = usize::MAX;

/// One step of a tree pattern's code: an edge with the given label leaving
/// the backbone root path at `depth`, attached to `connecting_node`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TreeTuple {
    pub depth: Depth,
    pub label: EdgeLabel,
    pub connecting_node: NodeId,
}

impl TreeTuple {
    pub fn new(depth: Depth, label: EdgeLabel, connecting_node: NodeId) -> Self {
        TreeTuple {
            depth,
            label,
            connecting_node,
        }
    }

    /// Same depth and label. The connecting node does not take part.
    pub fn same_step(&self, other: &TreeTuple) -> bool {
        self.depth == other.depth && self.label == other.label
    }
}

/// Outcome of [`GraphState::is_canonical`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CanonicalForm {
    Canonical,
    /// Another numbering of the same spanning tree gives smaller closing
    /// edges. Patterns with more closing edges may still be canonical.
    SmallerFoundTailOnly,
    /// A spanning tree with a smaller shape exists, so no pattern grown
    /// from this one is canonical.
    SmallerFoundWithPrefix,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GsEdge {
    pub to_node: usize,
    /// Position of the reverse edge in `to_node`'s edge list.
    pub pos_to_node: usize,
    pub edge_label: EdgeLabel,
    cycle_mark: u64,
    pub close: bool,
}

impl GsEdge {
    fn new(to_node: usize, pos_to_node: usize, edge_label: EdgeLabel, close: bool) -> Self {
        GsEdge {
            to_node,
            pos_to_node,
            edge_label,
            cycle_mark: 0,
            close,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GsNode {
    pub label: NodeLabel,
    /// Largest degree any database node embedding this node has.
    pub max_degree: u16,
    pub edges: Vec<GsEdge>,
}

#[derive(Debug, Clone, Copy)]
struct DeletedEdge {
    from_node: usize,
    to_node: usize,
    edge_label: EdgeLabel,
    pos_from_node: usize,
    pos_to_node: usize,
    close: bool,
    cycle_mark: u64,
}

impl DeletedEdge {
    fn sentinel() -> Self {
        DeletedEdge {
            from_node: NONE,
            to_node: NONE,
            edge_label: 0,
            pos_from_node: 0,
            pos_to_node: 0,
            close: false,
            cycle_mark: 0,
        }
    }
}

#[derive(Debug, Clone)]
pub struct GraphState {
    nodes: Vec<GsNode>,
    edges_size: usize,
    deleted: Vec<DeletedEdge>,
}

impl Default for GraphState {
    fn default() -> Self {
        GraphState::new()
    }
}

impl GraphState {
    pub fn new() -> Self {
        GraphState {
            nodes: Vec::new(),
            edges_size: 0,
            deleted: vec![DeletedEdge::sentinel()],
        }
    }

    pub fn nodes(&self) -> &[GsNode] {
        &self.nodes
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges_size
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Id of the most recently inserted node.
    pub fn last_node(&self) -> NodeId {
        self.nodes.len().saturating_sub(1) as NodeId
    }

    /// The node the most recently inserted node hangs from, if any.
    pub fn last_node_first_neighbor(&self) -> Option<NodeId> {
        self.nodes
            .last()
            .and_then(|node| node.edges.first())
            .map(|edge| edge.to_node as NodeId)
    }

    pub fn node_degree(&self, node: NodeId) -> usize {
        self.nodes[node as usize].edges.len()
    }

    pub fn node_max_degree(&self, node: NodeId) -> usize {
        usize::from(self.nodes[node as usize].max_degree)
    }

    #[cfg(test)]
    pub(crate) fn set_node_max_degree(&mut self, node: NodeId, max_degree: u16) {
        self.nodes[node as usize].max_degree = max_degree;
    }

    fn push_node(&mut self, label: NodeLabel, max_degree: u16) {
        self.nodes.push(GsNode {
            label,
            max_degree,
            edges: Vec::new(),
        });
    }

    /// Starts a new pattern. The root never saturates.
    pub fn insert_start_node(&mut self, label: NodeLabel) {
        self.push_node(label, u16::MAX);
    }

    pub fn delete_start_node(&mut self) {
        self.nodes.pop();
    }

    /// Adds a node hanging from `from` by the frequent edge `edge_label`.
    pub fn insert_node(&mut self, db: &Database, from: NodeId, edge_label: EdgeLabel, max_degree: u16) {
        let from = from as usize;
        let to_label = db.edge_label(edge_label).other_end(self.nodes[from].label);
        let to = self.nodes.len();
        self.push_node(to_label, max_degree);
        let pos_in_from = self.nodes[from].edges.len();
        self.nodes[to]
            .edges
            .push(GsEdge::new(from, pos_in_from, edge_label, false));
        self.nodes[from].edges.push(GsEdge::new(to, 0, edge_label, false));
        self.edges_size += 1;
    }

    /// Removes the most recently inserted node and its edge.
    pub fn delete_node(&mut self) {
        if let Some(node) = self.nodes.pop() {
            if let Some(edge) = node.edges.first() {
                self.nodes[edge.to_node].edges.pop();
                self.edges_size -= 1;
            }
        }
    }

    /// Adds a closing edge between the 1-based nodes `from` and `to`.
    pub fn insert_edge(&mut self, from: u32, to: u32, edge_label: EdgeLabel) {
        let (from, to) = (from as usize - 1, to as usize - 1);
        let pos_in_from = self.nodes[from].edges.len();
        self.nodes[to]
            .edges
            .push(GsEdge::new(from, pos_in_from, edge_label, true));
        let pos_in_to = self.nodes[to].edges.len() - 1;
        self.nodes[from]
            .edges
            .push(GsEdge::new(to, pos_in_to, edge_label, true));
        self.edges_size += 1;
    }

    /// Undoes the matching [`GraphState::insert_edge`].
    pub fn delete_edge(&mut self, from: u32, to: u32) {
        let (from, to) = (from as usize - 1, to as usize - 1);
        self.nodes[to].edges.pop();
        self.nodes[from].edges.pop();
        self.edges_size -= 1;
    }

    /// Deletes edge `pos` of `node`, remembering both of its slots.
    fn delete_edge_at(&mut self, node: usize, pos: usize) {
        let edge = self.nodes[node].edges[pos];
        let reverse = self.nodes[edge.to_node].edges[edge.pos_to_node];
        let deleted = DeletedEdge {
            from_node: reverse.to_node,
            to_node: edge.to_node,
            edge_label: edge.edge_label,
            pos_from_node: reverse.pos_to_node,
            pos_to_node: edge.pos_to_node,
            close: edge.close,
            cycle_mark: edge.cycle_mark,
        };
        self.remove_slot(deleted.to_node, deleted.pos_to_node);
        self.remove_slot(deleted.from_node, deleted.pos_from_node);
        self.edges_size -= 1;
        self.deleted.push(deleted);
    }

    /// Puts the most recently deleted edge back into its original slots.
    fn reinsert_edge(&mut self) {
        let Some(deleted) = self.deleted.pop() else {
            return;
        };
        let toward_from = GsEdge {
            to_node: deleted.from_node,
            pos_to_node: deleted.pos_from_node,
            edge_label: deleted.edge_label,
            cycle_mark: deleted.cycle_mark,
            close: deleted.close,
        };
        self.insert_slot(deleted.to_node, deleted.pos_to_node, toward_from);
        let toward_to = GsEdge {
            to_node: deleted.to_node,
            pos_to_node: deleted.pos_to_node,
            ..toward_from
        };
        self.insert_slot(deleted.from_node, deleted.pos_from_node, toward_to);
        self.edges_size += 1;
    }

    fn remove_slot(&mut self, node: usize, pos: usize) {
        let last = self.nodes[node].edges.len() - 1;
        if pos != last {
            let moved = self.nodes[node].edges[last];
            self.nodes[moved.to_node].edges[moved.pos_to_node].pos_to_node = pos;
            self.nodes[node].edges.swap(pos, last);
        }
        self.nodes[node].edges.pop();
    }

    fn insert_slot(&mut self, node: usize, pos: usize, edge: GsEdge) {
        self.nodes[node].edges.push(edge);
        let last = self.nodes[node].edges.len() - 1;
        if pos != last {
            let displaced = self.nodes[node].edges[pos];
            self.nodes[displaced.to_node].edges[displaced.pos_to_node].pos_to_node = last;
            self.nodes[node].edges.swap(pos, last);
        }
    }

    /// Closing edges currently in the pattern, as (from, to, label) with
    /// 1-based `from > to`, in insertion order.
    pub fn close_tuples(&self) -> Vec<CloseTuple> {
        let mut tuples = Vec::new();
        for (i, node) in self.nodes.iter().enumerate() {
            for edge in &node.edges {
                if edge.close && edge.to_node < i {
                    tuples.push(CloseTuple {
                        from: i as u32 + 1,
                        to: edge.to_node as u32 + 1,
                        label: edge.edge_label,
                    });
                }
            }
        }
        tuples
    }
}
