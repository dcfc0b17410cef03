// Copyright (C) 2025 Jeremy J. Carroll. See LICENSE for details.

//! Normal form of one spanning tree of the current pattern.
//!
//! The tree is rooted at its center, or at its pair of adjacent centers,
//! and every subtree gets a code built bottom up from its node label and
//! the sorted `(edge label, child code)` pairs below it. Two trees have the
//! same key exactly when they are isomorphic, and every isomorphism maps
//! centers onto centers and subtrees onto subtrees with equal codes, which
//! is how [`TreeShape::isomorphisms`] walks them.

use super::{GraphState, GsEdge, NONE};
use crate::types::EdgeLabel;

const OPEN: u32 = u32::MAX;
const CLOSE: u32 = u32::MAX - 1;
const SEPARATOR: u32 = u32::MAX - 2;

#[derive(Debug, Clone)]
pub(super) struct TreeShape {
    adjacency: Vec<Vec<(usize, EdgeLabel)>>,
    centers: Vec<usize>,
    /// Toward the centers; the two centers of a bicentered tree are each
    /// other's parent.
    parent: Vec<usize>,
    parent_label: Vec<EdgeLabel>,
    /// Breadth first from the centers.
    order: Vec<usize>,
    codes: Vec<Vec<u32>>,
    key: Vec<u32>,
}

impl TreeShape {
    /// Shape of the tree formed by the edges of `graph` that `keep` accepts.
    /// Those edges must form a spanning tree.
    pub fn new(graph: &GraphState, keep: impl Fn(&GsEdge) -> bool) -> TreeShape {
        let n = graph.nodes.len();
        let adjacency: Vec<Vec<(usize, EdgeLabel)>> = graph
            .nodes
            .iter()
            .map(|node| {
                node.edges
                    .iter()
                    .filter(|edge| keep(*edge))
                    .map(|edge| (edge.to_node, edge.edge_label))
                    .collect()
            })
            .collect();
        let centers = centers(&adjacency);

        let mut parent = vec![NONE; n];
        let mut parent_label = vec![0; n];
        if let [a, b] = centers[..] {
            parent[a] = b;
            parent[b] = a;
            if let Some(&(_, label)) = adjacency[a].iter().find(|&&(w, _)| w == b) {
                parent_label[a] = label;
                parent_label[b] = label;
            }
        }
        let mut order = centers.clone();
        let mut head = 0;
        while head < order.len() {
            let v = order[head];
            head += 1;
            for &(w, label) in &adjacency[v] {
                if w != parent[v] {
                    parent[w] = v;
                    parent_label[w] = label;
                    order.push(w);
                }
            }
        }

        let mut codes = vec![Vec::new(); n];
        for &v in order.iter().rev() {
            let mut pieces: Vec<Vec<u32>> = adjacency[v]
                .iter()
                .filter(|&&(w, _)| w != parent[v])
                .map(|&(w, label)| {
                    let mut piece = Vec::with_capacity(codes[w].len() + 3);
                    piece.push(OPEN);
                    piece.push(u32::from(label));
                    piece.extend_from_slice(&codes[w]);
                    piece.push(CLOSE);
                    piece
                })
                .collect();
            pieces.sort_unstable();
            let mut code = vec![u32::from(graph.nodes[v].label)];
            code.extend(pieces.into_iter().flatten());
            codes[v] = code;
        }

        let key = match centers[..] {
            [c] => {
                let mut key = vec![0];
                key.extend_from_slice(&codes[c]);
                key
            }
            [a, b] => {
                let (low, high) = if codes[a] <= codes[b] { (a, b) } else { (b, a) };
                let mut key = vec![1, u32::from(parent_label[low])];
                key.extend_from_slice(&codes[low]);
                key.push(SEPARATOR);
                key.extend_from_slice(&codes[high]);
                key
            }
            _ => Vec::new(),
        };

        TreeShape {
            adjacency,
            centers,
            parent,
            parent_label,
            order,
            codes,
            key,
        }
    }

    /// Equal for isomorphic trees only.
    pub fn key(&self) -> &[u32] {
        &self.key
    }

    /// Calls `visit` with every isomorphism from this tree onto `onto`, as
    /// a map from node to node, until it returns `true`.
    pub fn isomorphisms(&self, onto: &TreeShape, visit: &mut dyn FnMut(&[usize]) -> bool) {
        if self.key != onto.key {
            return;
        }
        let n = self.order.len();
        let mut map = vec![NONE; n];
        let mut used = vec![false; n];
        match (&self.centers[..], &onto.centers[..]) {
            (&[a], &[x]) => {
                map[a] = x;
                used[x] = true;
                self.assign(onto, 1, &mut map, &mut used, visit);
            }
            (&[a, b], &[x, y]) => {
                for (p, q) in [(x, y), (y, x)] {
                    if self.codes[a] != onto.codes[p] || self.codes[b] != onto.codes[q] {
                        continue;
                    }
                    map[a] = p;
                    map[b] = q;
                    used[p] = true;
                    used[q] = true;
                    let stop = self.assign(onto, 2, &mut map, &mut used, visit);
                    used[p] = false;
                    used[q] = false;
                    if stop {
                        return;
                    }
                }
            }
            _ => {}
        }
    }

    fn assign(
        &self,
        onto: &TreeShape,
        at: usize,
        map: &mut [usize],
        used: &mut [bool],
        visit: &mut dyn FnMut(&[usize]) -> bool,
    ) -> bool {
        let Some(&v) = self.order.get(at) else {
            return visit(map);
        };
        let image_parent = map[self.parent[v]];
        for &(w, label) in &onto.adjacency[image_parent] {
            if used[w] || label != self.parent_label[v] || onto.codes[w] != self.codes[v] {
                continue;
            }
            map[v] = w;
            used[w] = true;
            let stop = self.assign(onto, at + 1, map, used, visit);
            used[w] = false;
            map[v] = NONE;
            if stop {
                return true;
            }
        }
        false
    }
}

/// The one or two nodes left after peeling leaves layer by layer.
fn centers(adjacency: &[Vec<(usize, EdgeLabel)>]) -> Vec<usize> {
    let n = adjacency.len();
    let mut degree: Vec<usize> = adjacency.iter().map(Vec::len).collect();
    let mut removed = vec![false; n];
    let mut layer: Vec<usize> = (0..n).filter(|&v| degree[v] <= 1).collect();
    let mut remaining = n;
    while remaining > 2 {
        remaining -= layer.len();
        for &v in &layer {
            removed[v] = true;
        }
        let mut next = Vec::new();
        for &v in &layer {
            for &(w, _) in &adjacency[v] {
                if !removed[w] {
                    degree[w] -= 1;
                    if degree[w] == 1 {
                        next.push(w);
                    }
                }
            }
        }
        layer = next;
    }
    layer
}
