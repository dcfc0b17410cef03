// Copyright (C) 2025 Jeremy J. Carroll. See LICENSE for details.

//! An owned copy of the current pattern in input labels, and its SMARTS
//! and GSP renderings.

use super::GraphState;
use crate::database::Database;
use crate::types::{InputEdgeLabel, InputNodeLabel};
use std::fmt::Write;
use tracing::warn;

/// Input label of an aromatic carbon, written as a plain carbon.
const AROMATIC_CARBON: InputNodeLabel = 254;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PatternEdge {
    pub from: usize,
    pub to: usize,
    pub label: InputEdgeLabel,
}

/// A pattern detached from the search, with adjacency in insertion order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PatternGraph {
    nodes: Vec<InputNodeLabel>,
    adjacency: Vec<Vec<(usize, InputEdgeLabel)>>,
}

impl GraphState {
    pub fn snapshot(&self, db: &Database) -> PatternGraph {
        PatternGraph {
            nodes: self
                .nodes
                .iter()
                .map(|n| db.node_label(n.label).input_label)
                .collect(),
            adjacency: self
                .nodes
                .iter()
                .map(|n| {
                    n.edges
                        .iter()
                        .map(|e| (e.to_node, db.edge_label(e.edge_label).input_edge_label))
                        .collect()
                })
                .collect(),
        }
    }
}

fn bond_symbol(label: InputEdgeLabel) -> char {
    match label {
        1 => '-',
        2 => '=',
        3 => '#',
        4 => ':',
        other => {
            warn!(bond = other, "bond order not supported in SMARTS, writing '~'");
            '~'
        }
    }
}

fn ring_digit(out: &mut String, digit: usize) {
    if digit > 9 {
        let _ = write!(out, "%{digit:02}");
    } else {
        let _ = write!(out, "{digit}");
    }
}

/// A ring bond as discovered by the depth-first walk.
struct Ring {
    opens_at: usize,
    label: InputEdgeLabel,
}

struct SmartsWriter<'a> {
    graph: &'a PatternGraph,
    root: usize,
    /// Tree children per node, with the connecting bond label.
    children: Vec<Vec<(usize, InputEdgeLabel)>>,
    /// Rings touching each node, in discovery order.
    rings_at: Vec<Vec<usize>>,
    rings: Vec<Ring>,
    digit_of: Vec<usize>,
    digits_in_use: Vec<bool>,
}

impl<'a> SmartsWriter<'a> {
    fn new(graph: &'a PatternGraph, root: usize) -> Self {
        let n = graph.nodes.len();
        let mut writer = SmartsWriter {
            graph,
            root,
            children: vec![Vec::new(); n],
            rings_at: vec![Vec::new(); n],
            rings: Vec::new(),
            digit_of: Vec::new(),
            digits_in_use: Vec::new(),
        };
        writer.discover();
        writer
    }

    /// Splits the edges into a depth-first spanning tree and ring bonds.
    fn discover(&mut self) {
        let n = self.graph.nodes.len();
        let mut visited = vec![false; n];
        let mut used: Vec<Vec<bool>> = self.graph.adjacency.iter().map(|a| vec![false; a.len()]).collect();
        let mut stack = vec![(self.root, 0usize)];
        visited[self.root] = true;
        while let Some(top) = stack.last_mut() {
            let (node, index) = *top;
            top.1 += 1;
            let Some(&(to, label)) = self.graph.adjacency[node].get(index) else {
                stack.pop();
                continue;
            };
            if used[node][index] {
                continue;
            }
            used[node][index] = true;
            if let Some(back) = self.graph.adjacency[to].iter().position(|&(t, _)| t == node) {
                used[to][back] = true;
            }
            if visited[to] {
                let ring = self.rings.len();
                self.rings.push(Ring { opens_at: to, label });
                self.rings_at[to].push(ring);
                self.rings_at[node].push(ring);
            } else {
                visited[to] = true;
                self.children[node].push((to, label));
                stack.push((to, 0));
            }
        }
    }

    fn write(mut self) -> String {
        self.digit_of = vec![0; self.rings.len()];
        let mut out = String::new();
        self.write_node(self.root, &mut out);
        out
    }

    fn write_node(&mut self, node: usize, out: &mut String) {
        let label = match self.graph.nodes[node] {
            AROMATIC_CARBON => 6,
            label => label,
        };
        let _ = write!(out, "[#{label}]");
        for i in 0..self.rings_at[node].len() {
            let ring = self.rings_at[node][i];
            if self.rings[ring].opens_at == node {
                let digit = self.take_digit();
                self.digit_of[ring] = digit;
                out.push(bond_symbol(self.rings[ring].label));
                ring_digit(out, digit);
            } else {
                let digit = self.digit_of[ring];
                ring_digit(out, digit);
                self.digits_in_use[digit] = false;
            }
        }
        let fanout = self.graph.adjacency[node].len();
        let children = std::mem::take(&mut self.children[node]);
        let branch = fanout > 2 || (node == self.root && children.len() > 1);
        for &(child, label) in &children {
            if branch {
                out.push('(');
            }
            out.push(bond_symbol(label));
            self.write_node(child, out);
            if branch {
                out.push(')');
            }
        }
    }

    fn take_digit(&mut self) -> usize {
        match self.digits_in_use.iter().skip(1).position(|used| !used) {
            Some(free) => {
                self.digits_in_use[free + 1] = true;
                free + 1
            }
            None => {
                if self.digits_in_use.is_empty() {
                    self.digits_in_use.push(false);
                }
                self.digits_in_use.push(true);
                self.digits_in_use.len() - 1
            }
        }
    }
}

impl PatternGraph {
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.adjacency.iter().map(Vec::len).sum::<usize>() / 2
    }

    pub fn node_labels(&self) -> &[InputNodeLabel] {
        &self.nodes
    }

    /// Every edge once, with `from < to`, in insertion order of `from`.
    pub fn edges(&self) -> Vec<PatternEdge> {
        let mut edges = Vec::new();
        for (from, list) in self.adjacency.iter().enumerate() {
            for &(to, label) in list {
                if from < to {
                    edges.push(PatternEdge { from, to, label });
                }
            }
        }
        edges
    }

    /// SMARTS, walked from the last inserted leaf.
    pub fn to_smarts(&self) -> String {
        if self.nodes.is_empty() {
            return String::new();
        }
        let root = (0..self.nodes.len())
            .rev()
            .find(|&i| self.adjacency[i].len() == 1)
            .unwrap_or(0);
        SmartsWriter::new(self, root).write()
    }

    /// GSP record `t # <counter>` followed by its `v` and `e` lines.
    pub fn to_gsp(&self, counter: usize) -> String {
        let mut out = format!("t # {counter}\n");
        for (i, label) in self.nodes.iter().enumerate() {
            let _ = writeln!(out, "v {i} {label}");
        }
        for edge in self.edges() {
            let _ = writeln!(out, "e {} {} {}", edge.from, edge.to, edge.label);
        }
        out
    }
}
