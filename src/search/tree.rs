// Copyright (C) 2025 Jeremy J. Carroll. See LICENSE for details.

//! Tree frames: patterns that branch off their backbone path.
//!
//! The code of a tree lists its edges as `(depth, label)` tuples in
//! preorder, hanging from the center of the backbone: first the root path
//! (one half of the backbone) with its branches, then the second path with
//! its branches. A leg may only be added if the code stays the smallest of
//! all codes of the same tree; the prefix bookkeeping below restricts the
//! candidate labels at each depth so that non-canonical trees are never
//! built.

use super::graph;
use super::path::{PathFrame, PathLeg};
use super::{visit_leg, Attachment};
use crate::config::PatternKind;
use crate::context::{Best, MiningContext};
use crate::error::Result;
use crate::graphstate::TreeTuple;
use crate::occurrence::{
    add_close_extensions, inherit_close_legs, CloseLeg, LegOccurrences, OccurrenceChain,
};
use crate::types::{Depth, EdgeLabel, NodeId, MAX_EDGE_LABEL, NO_DEPTH, NO_EDGE_LABEL};
use tracing::trace;

#[derive(Debug, Clone)]
struct TreeLeg {
    tuple: TreeTuple,
    occurrences: LegOccurrences,
}

#[derive(Debug, Clone)]
pub(super) struct PatternTree {
    code: Vec<TreeTuple>,
    legs: Vec<TreeLeg>,
    close_legs: Vec<CloseLeg>,
    /// Per depth of the rightmost branch, how its label compares with the
    /// root path at that depth (zero while they are equal).
    root_path_relations: Vec<i32>,
    /// Per depth, index in the code of the rightmost tuple at that depth.
    rightmost_indexes: Vec<usize>,
    /// Index of the tuple a copy of an earlier prefix would continue with.
    next_prefix_index: Option<usize>,
    root_path_start: usize,
    next_path_start: usize,
    /// Legs before this index extend the first path.
    second_path_leg: usize,
    max_depth: i64,
    /// Non-zero for a backbone that reads the same in both directions.
    symmetric: u8,
}

fn diff(a: EdgeLabel, b: EdgeLabel) -> i32 {
    i32::from(a) - i32::from(b)
}

impl PatternTree {
    fn empty(close_legs: Vec<CloseLeg>, max_depth: i64, symmetric: u8) -> Self {
        PatternTree {
            code: Vec::new(),
            legs: Vec::new(),
            close_legs,
            root_path_relations: Vec::new(),
            rightmost_indexes: Vec::new(),
            next_prefix_index: None,
            root_path_start: 0,
            next_path_start: 0,
            second_path_leg: 0,
            max_depth,
            symmetric,
        }
    }

    fn tuples(&self) -> &[TreeTuple] {
        &self.code
    }

    fn last_relation(&self) -> i32 {
        self.root_path_relations.last().copied().unwrap_or(0)
    }

    fn at_max_depth(&self, depth: Depth) -> bool {
        i64::from(depth) == self.max_depth
    }

    fn add_leg(&mut self, connecting_node: NodeId, depth: Depth, label: EdgeLabel, occurrences: LegOccurrences) {
        self.legs.push(TreeLeg {
            tuple: TreeTuple::new(depth, label, connecting_node),
            occurrences,
        });
    }

    /// Joins `occurrences` with a leg of the backbone path and keeps it at
    /// tree depth `depth`.
    fn join_path_leg(
        &mut self,
        ctx: &mut MiningContext<'_>,
        occurrences: &LegOccurrences,
        other: &PathLeg,
        depth: Depth,
    ) {
        if let Some(joined) = ctx.join(occurrences, other.connecting_node, &other.occurrences) {
            self.add_leg(other.connecting_node, depth, other.edge_label, joined);
        }
    }

    fn push_left_half(&mut self, edge_labels: &[EdgeLabel], left_start: usize) {
        for (depth, i) in (0..=left_start).rev().enumerate() {
            self.code.push(TreeTuple::new(depth as Depth, edge_labels[i], 0));
        }
    }

    fn push_right_half(&mut self, edge_labels: &[EdgeLabel], right_start: usize) {
        for (depth, &label) in edge_labels[right_start..].iter().enumerate() {
            self.code.push(TreeTuple::new(depth as Depth, label, 0));
        }
    }

    /// Appends the first branch, hanging from the root path that starts at
    /// `root_path_start`, and initializes the rightmost-path bookkeeping.
    fn push_branch(&mut self, label: EdgeLabel, depth: Depth, root_path_start: usize) -> TreeTuple {
        let tuple = TreeTuple::new(depth, label, 0);
        self.code.push(tuple);
        let depth = depth as usize;
        for i in 0..depth {
            self.root_path_relations.push(0);
            self.rightmost_indexes.push(root_path_start + i);
        }
        self.rightmost_indexes.push(self.code.len() - 1);
        let on_path = self.code[depth + root_path_start].label;
        if on_path == label {
            self.next_prefix_index = Some(depth + root_path_start + 1);
            self.root_path_relations.push(0);
        } else {
            self.next_prefix_index = None;
            self.root_path_relations.push(diff(on_path, label));
        }
        tuple
    }

    /// Collects only the closing edges of `occurrences`.
    fn add_close_legs_only(
        &mut self,
        ctx: &mut MiningContext<'_>,
        chain: &OccurrenceChain<'_>,
        number: u32,
    ) {
        let extension = ctx.extend_restricted(chain, MAX_EDGE_LABEL, NO_EDGE_LABEL);
        add_close_extensions(&mut self.close_legs, extension.closes, number, ctx.min_frequency());
    }

    /// Legs that hang from the node just added by the leg with `tuple`.
    fn add_extension_legs(
        &mut self,
        ctx: &mut MiningContext<'_>,
        chain: &OccurrenceChain<'_>,
        tuple: TreeTuple,
        occurrences: &LegOccurrences,
    ) {
        if occurrences.max_degree == 1 {
            return;
        }
        if self.at_max_depth(tuple.depth) {
            self.add_close_legs_only(ctx, chain, occurrences.number);
            return;
        }
        let mut min_label = NO_EDGE_LABEL;
        let mut neglect = 0;
        let path_lowest =
            self.tuples()[tuple.depth as usize + 1 + self.root_path_start].label;
        if let Some(next) = self.next_prefix_index.and_then(|i| self.tuples().get(i)).copied() {
            if next.depth <= tuple.depth {
                self.add_close_legs_only(ctx, chain, occurrences.number);
                return;
            }
            min_label = next.label;
            if min_label == path_lowest {
                min_label = NO_EDGE_LABEL;
            } else {
                neglect = path_lowest;
            }
        }
        if i64::from(tuple.depth) == self.max_depth - 1 {
            let relation = self.last_relation();
            if relation > 0 {
                self.add_close_legs_only(ctx, chain, occurrences.number);
                return;
            }
            if relation == 0 {
                neglect = NO_EDGE_LABEL;
                if min_label == NO_EDGE_LABEL || path_lowest > min_label {
                    min_label = path_lowest;
                }
            }
        }
        let mut extension = if min_label != NO_EDGE_LABEL {
            ctx.extend_restricted(chain, min_label, neglect)
        } else {
            ctx.extend(chain)
        };
        let min_frequency = ctx.min_frequency();
        let connecting_node = ctx.graph_state.last_node();
        let depth = tuple.depth + 1;
        let lowest = &mut extension.legs[path_lowest as usize];
        if lowest.frequency >= min_frequency {
            let lowest = std::mem::take(lowest);
            self.add_leg(connecting_node, depth, path_lowest, lowest);
        }
        for (label, candidate) in extension.legs.iter_mut().enumerate() {
            let label = label as EdgeLabel;
            if candidate.frequency >= min_frequency && label != path_lowest {
                self.add_leg(connecting_node, depth, label, std::mem::take(candidate));
            }
        }
        add_close_extensions(
            &mut self.close_legs,
            extension.closes,
            occurrences.number,
            min_frequency,
        );
    }

    /// Branches of the left half, from path legs `legindex + 1` onwards.
    /// Returns the first path leg not considered.
    #[allow(clippy::too_many_arguments)]
    fn add_left_legs(
        &mut self,
        ctx: &mut MiningContext<'_>,
        path: &PathFrame,
        legindex: usize,
        tuple: TreeTuple,
        left_end: usize,
        edge_size2: usize,
    ) -> usize {
        let leg = &path.legs[legindex];
        if let Some(joined) = ctx.self_join(&leg.occurrences) {
            self.add_leg(leg.connecting_node, tuple.depth, tuple.label, joined);
        }
        if self.last_relation() == 0 && !self.at_max_depth(tuple.depth) {
            let mut first = legindex;
            while first > 0 && path.legs[first - 1].depth == leg.depth {
                first -= 1;
            }
            let lowest = path.edge_labels[leg.depth as usize - 1];
            for other in &path.legs[first..legindex] {
                if other.edge_label != lowest {
                    self.join_path_leg(ctx, &leg.occurrences, other, tuple.depth);
                }
            }
        }
        let mut i = legindex + 1;
        self.add_left_legs_from(
            ctx,
            path,
            legindex,
            &mut i,
            leg.depth,
            path.edge_labels[leg.depth as usize - 1],
            left_end,
            edge_size2,
        );
        i
    }

    /// Branches of the left half from path leg `*i` up to depth `left_end`.
    /// At each new depth the leg continuing the backbone label comes first.
    #[allow(clippy::too_many_arguments)]
    fn add_left_legs_from(
        &mut self,
        ctx: &mut MiningContext<'_>,
        path: &PathFrame,
        legindex: usize,
        i: &mut usize,
        mut old_depth: Depth,
        mut lowest: EdgeLabel,
        left_end: usize,
        edge_size2: usize,
    ) {
        let occurrences = &path.legs[legindex].occurrences;
        while *i < path.legs.len() && path.legs[*i].depth as usize <= left_end {
            let current = &path.legs[*i];
            if current.depth != old_depth {
                old_depth = current.depth;
                lowest = path.edge_labels[old_depth as usize - 1];
                let depth = (edge_size2 - old_depth as usize) as Depth;
                let continuing = path.legs[*i..]
                    .iter()
                    .take_while(|other| other.depth == old_depth)
                    .find(|other| other.edge_label == lowest);
                if let Some(other) = continuing {
                    self.join_path_leg(ctx, occurrences, other, depth);
                }
            }
            if current.edge_label != lowest {
                let depth = (edge_size2 - old_depth as usize) as Depth;
                self.join_path_leg(ctx, occurrences, current, depth);
            }
            *i += 1;
        }
    }

    /// Branches of the right half, from path legs before `legindex`
    /// downwards. Returns the last path leg not considered, or -1.
    #[allow(clippy::too_many_arguments)]
    fn add_right_legs(
        &mut self,
        ctx: &mut MiningContext<'_>,
        path: &PathFrame,
        legindex: usize,
        tuple: TreeTuple,
        right_start: usize,
        node_size2: usize,
    ) -> isize {
        let leg = &path.legs[legindex];
        if let Some(joined) = ctx.self_join(&leg.occurrences) {
            self.add_leg(leg.connecting_node, tuple.depth, tuple.label, joined);
        }
        let mut i = legindex as isize - 1;
        while i >= 0 && path.legs[i as usize].depth == leg.depth {
            i -= 1;
        }
        if self.last_relation() == 0 && !self.at_max_depth(tuple.depth) {
            for other in &path.legs[(i + 1) as usize..legindex] {
                self.join_path_leg(ctx, &leg.occurrences, other, tuple.depth);
            }
        }
        let lowest = path.edge_labels[leg.depth as usize];
        for other in path.legs[legindex + 1..]
            .iter()
            .take_while(|other| other.depth == leg.depth)
        {
            if other.edge_label != lowest {
                self.join_path_leg(ctx, &leg.occurrences, other, tuple.depth);
            }
        }
        if i >= 0 {
            self.add_right_legs_from(ctx, path, legindex, &mut i, leg.depth, lowest, right_start, node_size2);
        }
        i
    }

    /// Branches of the right half from path leg `*i` down to depth
    /// `right_start`. Within one depth the backbone label is joined first.
    #[allow(clippy::too_many_arguments)]
    fn add_right_legs_from(
        &mut self,
        ctx: &mut MiningContext<'_>,
        path: &PathFrame,
        legindex: usize,
        i: &mut isize,
        mut old_depth: Depth,
        mut lowest: EdgeLabel,
        right_start: usize,
        node_size2: usize,
    ) {
        let occurrences = &path.legs[legindex].occurrences;
        let shifted = |other: &PathLeg| (other.depth as usize - node_size2) as Depth;
        let mut end = *i + 1;
        while *i >= 0 && path.legs[*i as usize].depth as usize >= right_start {
            let current = &path.legs[*i as usize];
            if current.depth != old_depth {
                for other in &path.legs[(*i + 1) as usize..end as usize] {
                    if other.edge_label != lowest {
                        self.join_path_leg(ctx, occurrences, other, shifted(other));
                    }
                }
                end = *i + 1;
                old_depth = current.depth;
                lowest = path.edge_labels[old_depth as usize];
            }
            if current.edge_label == lowest {
                self.join_path_leg(ctx, occurrences, current, shifted(current));
            }
            *i -= 1;
        }
        for other in &path.legs[(*i + 1) as usize..end as usize] {
            if other.edge_label != lowest {
                self.join_path_leg(ctx, occurrences, other, shifted(other));
            }
        }
    }

    /// The first tree grown from a path, by branching at path leg
    /// `legindex`. `chain` ends at that leg's occurrences.
    pub(super) fn from_path(
        ctx: &mut MiningContext<'_>,
        path: &PathFrame,
        legindex: usize,
        chain: &OccurrenceChain<'_>,
    ) -> PatternTree {
        let db = ctx.db;
        let leg = &path.legs[legindex];
        let edge_labels = &path.edge_labels;
        let node_labels = &path.node_labels;
        let (n_nodes, n_edges) = (node_labels.len(), edge_labels.len());
        let node_size2 = n_nodes / 2;
        let edge_size2 = n_edges / 2;
        let symmetric = if path.total_symmetry == 0 {
            (n_nodes % 2 + 1) as u8
        } else {
            0
        };
        let close_legs =
            inherit_close_legs(db, ctx.min_frequency(), &path.close_legs, &leg.occurrences);
        let mut tree = PatternTree::empty(close_legs, edge_size2 as i64 - 1, symmetric);
        tree.code.reserve(n_edges + 1);

        let right_start = node_size2;
        let left_start = edge_size2 - 1;
        let mut left_walk = left_start as isize;
        let mut right_walk = right_start;
        while left_walk >= 0 && edge_labels[left_walk as usize] == edge_labels[right_walk] {
            left_walk -= 1;
            right_walk += 1;
        }
        let symmetric_halves = left_walk < 0;
        let leg_depth = leg.depth as usize;

        if path.total_symmetry != 0 || leg_depth * 2 == n_edges {
            if symmetric_halves || edge_labels[left_walk as usize] < edge_labels[right_walk] {
                // the left half is the root path
                tree.push_left_half(edge_labels, left_start);
                let left_end = node_size2 - 1;
                if leg_depth <= left_end {
                    let tuple =
                        tree.push_branch(leg.edge_label, (edge_size2 - leg_depth) as Depth, 0);
                    tree.root_path_start = 0;
                    tree.next_path_start = tree.tuples().len();
                    tree.add_extension_legs(ctx, chain, tuple, &leg.occurrences);
                    tree.push_right_half(edge_labels, right_start);
                    let i = tree.add_left_legs(ctx, path, legindex, tuple, left_end, edge_size2) as isize;
                    tree.second_path_leg = tree.legs.len();
                    let depth_of = |j: isize| path.legs[j as usize].depth as usize;
                    let mut end = path.legs.len() as isize;
                    let mut j = end - 1;
                    if j >= i && depth_of(j) == n_edges {
                        while j >= i && depth_of(j) == n_edges {
                            j -= 1;
                        }
                        end = j + 1;
                    }
                    let last_edge = edge_labels[n_edges - 1];
                    if j >= i && depth_of(j) == n_nodes - 2 {
                        if path.legs[j as usize].edge_label >= last_edge {
                            while j >= i
                                && depth_of(j) == n_nodes - 2
                                && path.legs[j as usize].edge_label >= last_edge
                            {
                                j -= 1;
                            }
                            for other in &path.legs[(j + 1) as usize..end as usize] {
                                let depth = (other.depth as usize - node_size2) as Depth;
                                tree.join_path_leg(ctx, &leg.occurrences, other, depth);
                            }
                        }
                        while j >= i && depth_of(j) == n_nodes - 2 {
                            j -= 1;
                        }
                    }
                    if j >= i {
                        tree.add_right_legs_from(
                            ctx, path, legindex, &mut j, NO_DEPTH, NO_EDGE_LABEL, right_start, node_size2,
                        );
                    }
                } else {
                    tree.root_path_start = tree.tuples().len();
                    tree.next_path_start = tree.root_path_start;
                    tree.push_right_half(edge_labels, right_start);
                    let tuple = tree.push_branch(
                        leg.edge_label,
                        (leg_depth - node_size2) as Depth,
                        tree.root_path_start,
                    );
                    tree.add_extension_legs(ctx, chain, tuple, &leg.occurrences);
                    tree.add_right_legs(ctx, path, legindex, tuple, right_start, node_size2);
                    tree.second_path_leg = tree.legs.len();
                }
            } else {
                // the right half is the root path
                tree.push_right_half(edge_labels, right_start);
                let left_end = edge_size2;
                let right_start = left_end + 1;
                if leg_depth <= left_end {
                    tree.root_path_start = tree.tuples().len();
                    tree.next_path_start = tree.root_path_start;
                    tree.push_left_half(edge_labels, left_start);
                    let tuple = tree.push_branch(
                        leg.edge_label,
                        (edge_size2 - leg_depth) as Depth,
                        tree.root_path_start,
                    );
                    tree.add_extension_legs(ctx, chain, tuple, &leg.occurrences);
                    tree.add_left_legs(ctx, path, legindex, tuple, left_end, edge_size2);
                    tree.second_path_leg = tree.legs.len();
                } else {
                    let tuple =
                        tree.push_branch(leg.edge_label, (leg_depth - node_size2) as Depth, 0);
                    tree.root_path_start = 0;
                    tree.next_path_start = tree.tuples().len();
                    tree.add_extension_legs(ctx, chain, tuple, &leg.occurrences);
                    tree.push_left_half(edge_labels, left_start);
                    let i = tree.add_right_legs(ctx, path, legindex, tuple, right_start, node_size2);
                    tree.second_path_leg = tree.legs.len();
                    let mut j = 0isize;
                    while j <= i && path.legs[j as usize].depth == 0 {
                        j += 1;
                    }
                    while j <= i
                        && path.legs[j as usize].depth == 1
                        && path.legs[j as usize].edge_label < edge_labels[0]
                    {
                        j += 1;
                    }
                    if j <= i {
                        let mut j = j as usize;
                        tree.add_left_legs_from(
                            ctx, path, legindex, &mut j, NO_DEPTH, NO_EDGE_LABEL, left_end, edge_size2,
                        );
                    }
                }
            }
        } else {
            // symmetric backbone, branching from the left half
            tree.push_left_half(edge_labels, left_start);
            let tuple = tree.push_branch(leg.edge_label, (edge_size2 - leg_depth) as Depth, 0);
            tree.root_path_start = 0;
            tree.next_path_start = tree.tuples().len();
            tree.add_extension_legs(ctx, chain, tuple, &leg.occurrences);
            tree.push_right_half(edge_labels, right_start);
            let i = tree.add_left_legs(ctx, path, legindex, tuple, right_start - 1, edge_size2) as isize;
            tree.second_path_leg = tree.legs.len();
            let depth_of = |j: isize| path.legs[j as usize].depth as usize;
            let target = n_nodes - 1 - leg_depth;
            let mut j = path.legs.len() as isize - 1;
            while j >= i && depth_of(j) > target {
                j -= 1;
            }
            if target == n_edges - 1 {
                let end = j;
                while j >= i && depth_of(j) == target && path.legs[j as usize].edge_label >= leg.edge_label {
                    j -= 1;
                }
                for other in &path.legs[(j + 1) as usize..=end as usize] {
                    tree.join_path_leg(ctx, &leg.occurrences, other, tuple.depth);
                }
                while j >= i && depth_of(j) == target {
                    j -= 1;
                }
            } else if j >= i && tree.last_relation() != 0 && depth_of(j) == target {
                let end = j;
                let lowest = edge_labels[target];
                while j >= i && depth_of(j) == target && path.legs[j as usize].edge_label >= tuple.label {
                    j -= 1;
                }
                for other in &path.legs[(j + 1) as usize..=end as usize] {
                    if other.edge_label != lowest {
                        tree.join_path_leg(ctx, &leg.occurrences, other, tuple.depth);
                    }
                }
                while j >= i && depth_of(j) == target {
                    j -= 1;
                }
            }
            if j >= i {
                tree.add_right_legs_from(
                    ctx, path, legindex, &mut j, NO_DEPTH, NO_EDGE_LABEL, right_start, node_size2,
                );
            }
        }

        tree.close_legs.sort_by_key(|close| close.tuple);
        tree
    }

    /// The tree obtained by adding leg `legindex` of `parent`.
    fn child(
        ctx: &mut MiningContext<'_>,
        parent: &PatternTree,
        legindex: usize,
        chain: &OccurrenceChain<'_>,
    ) -> PatternTree {
        let leg = &parent.legs[legindex];
        let parent_tuples = parent.tuples();
        let close_legs =
            inherit_close_legs(ctx.db, ctx.min_frequency(), &parent.close_legs, &leg.occurrences);
        let mut tree = PatternTree::empty(close_legs, parent.max_depth, parent.symmetric);
        tree.code.reserve(parent_tuples.len() + 1);
        let on_first_path = parent.root_path_start == 0 && legindex < parent.second_path_leg;
        let position;
        let max_leg;
        if on_first_path {
            tree.code.extend_from_slice(&parent_tuples[..parent.next_path_start]);
            position = tree.tuples().len();
            tree.code.push(leg.tuple);
            tree.next_path_start = tree.tuples().len();
            tree.root_path_start = 0;
            tree.code.extend_from_slice(&parent_tuples[parent.next_path_start..]);
            max_leg = parent.second_path_leg;
        } else {
            tree.next_path_start = parent.next_path_start;
            tree.root_path_start = parent.next_path_start;
            tree.code.extend_from_slice(parent_tuples);
            position = tree.tuples().len();
            tree.code.push(leg.tuple);
            max_leg = parent.legs.len();
        }

        let depth = leg.tuple.depth as usize;
        let root_path_start = tree.root_path_start;
        let on_path = tree.tuples()[root_path_start + depth].label;
        if parent.root_path_start == 0 && legindex >= parent.second_path_leg {
            // first leg of the second path
            for i in 0..depth {
                tree.root_path_relations.push(0);
                tree.rightmost_indexes.push(root_path_start + i);
            }
            tree.root_path_relations.push(diff(on_path, leg.tuple.label));
            tree.rightmost_indexes.push(tree.tuples().len() - 1);
            let mirrors_root = tree.symmetric != 0
                && tree
                    .tuples()
                    .get((tree.max_depth + 1) as usize)
                    .zip(tree.tuples().last())
                    .is_some_and(|(a, b)| a.same_step(b));
            tree.next_prefix_index = if mirrors_root {
                Some((tree.max_depth + 2) as usize)
            } else if on_path == leg.tuple.label {
                Some(root_path_start + depth + 1)
            } else {
                None
            };
        } else {
            for i in 0..depth {
                tree.root_path_relations
                    .push(parent.root_path_relations.get(i).copied().unwrap_or(0));
                tree.rightmost_indexes.push(
                    parent
                        .rightmost_indexes
                        .get(i)
                        .copied()
                        .unwrap_or(root_path_start + i),
                );
            }
            tree.rightmost_indexes.push(position);
            let relation = match tree.root_path_relations.last() {
                Some(&relation) if relation != 0 => relation,
                _ => diff(on_path, leg.tuple.label),
            };
            tree.root_path_relations.push(relation);
            let continues_prefix = parent
                .next_prefix_index
                .filter(|&i| parent_tuples.get(i).is_some_and(|t| t.same_step(&leg.tuple)));
            tree.next_prefix_index = match continues_prefix {
                Some(i) => Some(i + 1),
                None => parent
                    .rightmost_indexes
                    .get(depth)
                    .filter(|&&i| parent_tuples[i].label == leg.tuple.label)
                    .map(|&i| i + 1),
            };
        }

        if tree.next_prefix_index == Some(tree.next_path_start) && tree.symmetric == 1 {
            tree.second_path_leg = 0;
            tree.add_close_legs_only(ctx, chain, leg.occurrences.number);
            tree.close_legs.sort_by_key(|close| close.tuple);
            return tree;
        }
        tree.add_extension_legs(ctx, chain, leg.tuple, &leg.occurrences);

        let mut index = legindex;
        let next = tree
            .next_prefix_index
            .and_then(|i| tree.tuples().get(i))
            .copied();
        if let Some(next) = next.filter(|next| next.depth <= leg.tuple.depth) {
            let lowest = tree.tuples()[root_path_start + next.depth as usize].label;
            while index < max_leg && parent.legs[index].tuple.depth > next.depth {
                index += 1;
            }
            if index < max_leg && parent.legs[index].tuple.depth == next.depth && next.label != lowest {
                if parent.legs[index].tuple.label == lowest {
                    index += 1;
                }
                while index < max_leg
                    && parent.legs[index].tuple.depth == next.depth
                    && parent.legs[index].tuple.label < next.label
                {
                    index += 1;
                }
            }
        }
        if index == legindex {
            if let Some(joined) = ctx.self_join(&leg.occurrences) {
                tree.add_leg(leg.tuple.connecting_node, leg.tuple.depth, leg.tuple.label, joined);
            }
            index += 1;
        }
        if tree.root_path_start == 0 {
            tree.second_path_leg = tree.legs.len();
            while index < parent.legs.len() {
                if index == parent.second_path_leg {
                    tree.second_path_leg = tree.legs.len();
                }
                tree.join_tree_leg(ctx, &leg.occurrences, &parent.legs[index]);
                index += 1;
            }
            if index == parent.second_path_leg {
                tree.second_path_leg = tree.legs.len();
            }
        } else {
            for other in parent.legs.iter().skip(index) {
                tree.join_tree_leg(ctx, &leg.occurrences, other);
            }
            tree.second_path_leg = tree.legs.len();
        }
        tree.close_legs.sort_by_key(|close| close.tuple);
        tree
    }

    fn join_tree_leg(&mut self, ctx: &mut MiningContext<'_>, occurrences: &LegOccurrences, other: &TreeLeg) {
        let t = other.tuple;
        if let Some(joined) = ctx.join(occurrences, t.connecting_node, &other.occurrences) {
            self.add_leg(t.connecting_node, t.depth, t.label, joined);
        }
    }

    pub(super) fn expand(
        &self,
        ctx: &mut MiningContext<'_>,
        chain: &OccurrenceChain<'_>,
        best: &Best,
    ) -> Result<()> {
        ctx.enter_frame()?;
        ctx.statistics
            .record_frequent(PatternKind::Tree, ctx.graph_state.node_count());
        trace!(tuples = self.tuples().len(), legs = self.legs.len(), "tree frame");
        let config = ctx.config;
        if config.backbone && self.legs.is_empty() {
            if ctx.updated {
                ctx.flush(best);
            }
            ctx.updated = false;
        }
        for (i, leg) in self.legs.iter().enumerate().rev() {
            let attachment = Attachment {
                from: leg.tuple.connecting_node,
                edge_label: leg.tuple.label,
                max_degree: leg.occurrences.max_degree,
            };
            visit_leg(ctx, PatternKind::Tree, attachment, &leg.occurrences, best, |ctx, best| {
                let child_chain = chain.push(&leg.occurrences);
                let child = PatternTree::child(ctx, self, i, &child_chain);
                child.expand(ctx, &child_chain, best)
            })?;
        }
        if config.kind == PatternKind::Graph && !self.close_legs.is_empty() {
            graph::expand_closing(ctx, &self.close_legs, &mut Vec::new(), best)?;
        }
        if config.bbrc_separator && !config.backbone && self.legs.is_empty() {
            ctx.separator();
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::config::{MinerConfig, PatternKind};
    use crate::context::{CancellationToken, MiningContext};
    use crate::database::{Database, TreeRecord};
    use crate::output::MiningEvent;
    use crate::search::PathFrame;

    /// Every graph is a carbon carrying a nitrogen, an oxygen and a fluorine.
    fn stars() -> Database {
        let mut db = Database::new();
        for id in 1..=2 {
            db.add_tree(
                TreeRecord::new(id)
                    .with_node(6)
                    .with_node(7)
                    .with_node(8)
                    .with_node(9)
                    .with_edge(0, 1, 1)
                    .with_edge(0, 2, 1)
                    .with_edge(0, 3, 1),
            )
            .unwrap();
        }
        db.finalize(2.0);
        db
    }

    fn mine_all(db: &Database, kind: PatternKind) -> Vec<MiningEvent> {
        let config = MinerConfig::frequent_only(2, kind).validate().unwrap();
        let mut sink: Vec<MiningEvent> = Vec::new();
        {
            let mut ctx = MiningContext::new(db, &config, &mut sink, CancellationToken::new());
            for label in 0..db.node_label_count() {
                PathFrame::mine(&mut ctx, label as u16).unwrap();
            }
        }
        sink
    }

    fn sizes(events: &[MiningEvent], kind: PatternKind) -> Vec<usize> {
        let mut sizes: Vec<usize> = events
            .iter()
            .filter_map(|event| match event {
                MiningEvent::Pattern(p) if p.kind == kind => Some(p.size),
                _ => None,
            })
            .collect();
        sizes.sort_unstable();
        sizes
    }

    #[test]
    fn test_star_branches_once() {
        let db = stars();
        let events = mine_all(&db, PatternKind::Tree);
        // three edges and three two-edge paths; the whole star is the only tree
        assert_eq!(sizes(&events, PatternKind::Path), vec![2, 2, 2, 3, 3, 3]);
        assert_eq!(sizes(&events, PatternKind::Tree), vec![4]);
    }

    #[test]
    fn test_path_mode_never_branches() {
        let db = stars();
        let events = mine_all(&db, PatternKind::Path);
        assert!(sizes(&events, PatternKind::Tree).is_empty());
        assert_eq!(sizes(&events, PatternKind::Path).len(), 6);
    }
}
