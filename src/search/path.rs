// Copyright (C) 2025 Jeremy J. Carroll. See LICENSE for details.

//! Path frames: patterns whose every node has degree at most two.
//!
//! A path grows at both ends. The symmetry fields compare the path with
//! its own reversal (`total_symmetry`) and with the reversals of the path
//! minus its first (`front_symmetry`) or last (`back_symmetry`) node; their
//! sign decides which end a new leg may extend without producing the
//! reversed duplicate.

use super::graph;
use super::tree::PatternTree;
use super::{visit_leg, Attachment};
use crate::config::PatternKind;
use crate::context::{Best, MiningContext};
use crate::database::Database;
use crate::error::Result;
use crate::occurrence::{
    add_close_extensions, distinct_tids, inherit_close_legs, CloseLeg, LegOccurrence,
    LegOccurrences, OccurrenceChain,
};
use crate::types::{Depth, EdgeLabel, NodeId, NodeLabel, NO_TID};
use tracing::trace;

#[derive(Debug, Clone)]
pub(super) struct PathLeg {
    /// Path position of the node the leg hangs from.
    pub depth: Depth,
    pub edge_label: EdgeLabel,
    /// Label of the node the leg adds.
    pub node_label: NodeLabel,
    pub connecting_node: NodeId,
    pub occurrences: LegOccurrences,
}

impl PathLeg {
    fn attachment(&self) -> Attachment {
        Attachment {
            from: self.connecting_node,
            edge_label: self.edge_label,
            max_degree: self.occurrences.max_degree,
        }
    }
}

#[derive(Debug, Clone)]
pub struct PathFrame {
    pub(super) node_labels: Vec<NodeLabel>,
    pub(super) edge_labels: Vec<EdgeLabel>,
    front_symmetry: i32,
    back_symmetry: i32,
    pub(super) total_symmetry: i32,
    /// Sorted by depth.
    pub(super) legs: Vec<PathLeg>,
    pub(super) close_legs: Vec<CloseLeg>,
}

fn diff(a: u16, b: u16) -> i32 {
    i32::from(a) - i32::from(b)
}

impl PathFrame {
    /// Mines every pattern rooted at node label `label`.
    pub fn mine(ctx: &mut MiningContext<'_>, label: NodeLabel) -> Result<()> {
        let db = ctx.db;
        ctx.graph_state.insert_start_node(label);
        let frame = PathFrame::root(db, label);
        let chain = OccurrenceChain::root(&db.node_label(label).occurrences);
        let result = frame.expand_root(ctx, &chain);
        ctx.graph_state.delete_start_node();
        result
    }

    /// The single-node pattern, with one leg per frequent edge label of the
    /// node, built directly from the root occurrences.
    fn root(db: &Database, label: NodeLabel) -> PathFrame {
        let entry = db.node_label(label);
        let mut ranks = entry.frequent_edge_labels.clone();
        ranks.sort_unstable();
        let mut position = vec![None; db.frequent_edge_label_count()];
        let mut legs: Vec<PathLeg> = ranks
            .iter()
            .enumerate()
            .map(|(i, &rank)| {
                position[rank as usize] = Some(i);
                let edge = db.edge_label(rank);
                PathLeg {
                    depth: 0,
                    edge_label: rank,
                    node_label: edge.other_end(label),
                    connecting_node: 0,
                    occurrences: LegOccurrences {
                        frequency: edge.frequency,
                        ..LegOccurrences::with_number(2)
                    },
                }
            })
            .collect();
        let mut last_self = vec![NO_TID; legs.len()];
        for (i, occ) in entry.occurrences.elements.iter().enumerate() {
            let i = i as u32;
            let tree = db.tree(occ.tid);
            for edge in tree.node_edges(occ.to_node) {
                let Some(index) = position.get(edge.edge_label as usize).copied().flatten() else {
                    continue;
                };
                let leg = &mut legs[index].occurrences;
                if leg.elements.last().is_some_and(|back| back.occurrence_id == i)
                    && last_self[index] != tree.tid
                {
                    leg.self_join += tree.weight;
                    last_self[index] = tree.tid;
                }
                leg.elements
                    .push(LegOccurrence::new(tree.tid, i, edge.to_node, occ.to_node));
                leg.raise_max_degree(tree.degree(edge.to_node));
            }
        }
        PathFrame {
            node_labels: vec![label],
            edge_labels: Vec::new(),
            front_symmetry: 0,
            back_symmetry: 0,
            total_symmetry: 0,
            legs,
            close_legs: Vec::new(),
        }
    }

    /// The path obtained by adding leg `index` of `parent`, whose node is
    /// already in the graph state. `chain` ends at that leg's occurrences.
    fn child(
        ctx: &mut MiningContext<'_>,
        parent: &PathFrame,
        index: usize,
        chain: &OccurrenceChain<'_>,
    ) -> PathFrame {
        let db = ctx.db;
        let min_frequency = ctx.min_frequency();
        let leg = &parent.legs[index];
        let pn = &parent.node_labels;
        let pe = &parent.edge_labels;
        let n = pn.len();
        let mut frame = PathFrame {
            node_labels: vec![0; n + 1],
            edge_labels: vec![0; n],
            front_symmetry: 0,
            back_symmetry: 0,
            total_symmetry: 0,
            legs: Vec::new(),
            close_legs: inherit_close_legs(db, min_frequency, &parent.close_legs, &leg.occurrences),
        };
        let mut closes = None;
        let position_shift: Depth;
        if n == 1 {
            frame.total_symmetry = diff(pn[0], leg.node_label);
            frame.node_labels = vec![pn[0], leg.node_label];
            frame.edge_labels = vec![leg.edge_label];
            position_shift = 0;
        } else if leg.depth == 0 {
            // the new node goes in front of node 0
            position_shift = 1;
            frame.node_labels[0] = leg.node_label;
            frame.edge_labels[0] = leg.edge_label;
            frame.back_symmetry = parent.total_symmetry;
            let mut front = diff(leg.node_label, pn[n - 2]);
            let mut total = diff(leg.node_label, pn[n - 1]);
            if total == 0 {
                total = diff(leg.edge_label, pe[pe.len() - 1]);
            }
            let mut i = 0;
            if n > 2 {
                if front == 0 {
                    front = diff(leg.edge_label, pe[n - 3]);
                }
                while front == 0 && i < pe.len() / 2 {
                    frame.node_labels[i + 1] = pn[i];
                    frame.edge_labels[i + 1] = pe[i];
                    front = diff(pn[i], pn[n - i - 3]);
                    if front == 0 && n > 3 {
                        front = diff(pe[i], pe[n - i - 4]);
                    }
                    if total == 0 {
                        total = diff(pn[i], pn[n - i - 2]);
                        if total == 0 {
                            total = diff(pe[i], pe[n - i - 3]);
                        }
                    }
                    i += 1;
                }
            }
            while total == 0 && i < pe.len() / 2 {
                frame.node_labels[i + 1] = pn[i];
                frame.edge_labels[i + 1] = pe[i];
                total = diff(pn[i], pn[n - i - 2]);
                if total == 0 && n > 3 {
                    total = diff(pe[i], pe[n - i - 3]);
                }
                i += 1;
            }
            while i < pe.len() {
                frame.node_labels[i + 1] = pn[i];
                frame.edge_labels[i + 1] = pe[i];
                i += 1;
            }
            frame.node_labels[i + 1] = pn[i];
            frame.front_symmetry = front;
            frame.total_symmetry = total;

            let mut extension = ctx.extend(chain);
            let connecting_node = ctx.graph_state.last_node();
            for (label, occurrences) in extension.legs.iter_mut().enumerate() {
                if occurrences.frequency >= min_frequency {
                    let label = label as EdgeLabel;
                    frame.legs.push(PathLeg {
                        depth: 0,
                        edge_label: label,
                        node_label: db.edge_label(label).other_end(leg.node_label),
                        connecting_node,
                        occurrences: std::mem::take(occurrences),
                    });
                }
            }
            closes = Some(extension.closes);
        } else {
            position_shift = 0;
            frame.front_symmetry = parent.total_symmetry;
            let mut back = diff(pn[1], leg.node_label);
            let mut total = diff(pn[0], leg.node_label);
            if total == 0 {
                total = diff(pe[0], leg.edge_label);
            }
            let mut i = 0;
            if n > 2 {
                if back == 0 {
                    back = diff(pe[1], leg.edge_label);
                }
                while back == 0 && i < pe.len() / 2 {
                    frame.node_labels[i] = pn[i];
                    frame.edge_labels[i] = pe[i];
                    back = diff(pn[i + 2], pn[n - i - 1]);
                    if back == 0 && n > 3 {
                        back = diff(pe[i + 2], pe[n - i - 2]);
                    }
                    if total == 0 {
                        total = diff(pn[i + 1], pn[n - i - 1]);
                        if total == 0 && n > 3 {
                            total = diff(pe[i + 1], pe[n - i - 2]);
                        }
                    }
                    i += 1;
                }
            }
            while total == 0 && i < pe.len() / 2 {
                frame.node_labels[i] = pn[i];
                frame.edge_labels[i] = pe[i];
                total = diff(pn[i + 1], pn[n - i - 1]);
                if total == 0 && i + 1 < pe.len() {
                    total = diff(pe[i + 1], pe[n - i - 2]);
                }
                i += 1;
            }
            while i < pe.len() {
                frame.node_labels[i] = pn[i];
                frame.edge_labels[i] = pe[i];
                i += 1;
            }
            frame.node_labels[i] = pn[i];
            frame.edge_labels[i] = leg.edge_label;
            frame.node_labels[i + 1] = leg.node_label;
            frame.back_symmetry = back;
            frame.total_symmetry = total;
        }

        for (j, other) in parent.legs.iter().enumerate() {
            let joined = if j == index {
                ctx.self_join(&leg.occurrences)
            } else {
                ctx.join(&leg.occurrences, other.connecting_node, &other.occurrences)
            };
            if let Some(occurrences) = joined {
                frame.legs.push(PathLeg {
                    depth: other.depth + position_shift,
                    occurrences,
                    ..*other
                });
            }
        }

        let number = leg.occurrences.number;
        let closes = match closes {
            Some(closes) => closes,
            None => {
                let mut extension = ctx.extend(chain);
                let connecting_node = ctx.graph_state.last_node();
                for (label, occurrences) in extension.legs.iter_mut().enumerate() {
                    if occurrences.frequency >= min_frequency {
                        let label = label as EdgeLabel;
                        frame.legs.push(PathLeg {
                            depth: leg.depth + 1,
                            edge_label: label,
                            node_label: db.edge_label(label).other_end(leg.node_label),
                            connecting_node,
                            occurrences: std::mem::take(occurrences),
                        });
                    }
                }
                extension.closes
            }
        };
        add_close_extensions(&mut frame.close_legs, closes, number, min_frequency);
        frame.close_legs.sort_by_key(|close| close.tuple);
        frame
    }

    fn expand_root(&self, ctx: &mut MiningContext<'_>, chain: &OccurrenceChain<'_>) -> Result<()> {
        ctx.enter_frame()?;
        let backbone = ctx.config.backbone;
        for (i, leg) in self.legs.iter().enumerate() {
            if leg.node_label < self.node_labels[0] {
                continue;
            }
            ctx.check_pattern_size()?;
            let tids = distinct_tids(leg.occurrences.tids());
            let evaluation = ctx.evaluate(&tids);
            let attachment = leg.attachment();
            ctx.graph_state.insert_node(
                ctx.db,
                attachment.from,
                attachment.edge_label,
                attachment.max_degree,
            );
            let mut pattern = ctx.describe(PatternKind::Path, leg.occurrences.frequency, &evaluation);
            if !backbone {
                if let Some(pattern) = pattern.take() {
                    ctx.emit(pattern);
                }
            }
            let child_chain = chain.push(&leg.occurrences);
            let child = PathFrame::child(ctx, self, i, &child_chain);
            ctx.updated = true;
            let best = Best {
                p: evaluation.p,
                pattern,
            };
            let result = child.expand(ctx, &child_chain, &best);
            ctx.graph_state.delete_node();
            result?;
        }
        Ok(())
    }

    /// Refines a path of at least two nodes.
    fn expand(
        &self,
        ctx: &mut MiningContext<'_>,
        chain: &OccurrenceChain<'_>,
        best: &Best,
    ) -> Result<()> {
        ctx.enter_frame()?;
        let n = self.node_labels.len();
        ctx.statistics.record_frequent(PatternKind::Path, n);
        trace!(nodes = n, legs = self.legs.len(), "path frame");
        let (first_node, last_node) = (self.node_labels[0], self.node_labels[n - 1]);
        let (first_edge, last_edge) = (self.edge_labels[0], self.edge_labels[n - 2]);
        let tail = (n - 1) as Depth;

        let forward = self.legs.iter().enumerate().filter(|(_, leg)| {
            leg.depth == tail
                && (leg.node_label > first_node
                    || (leg.node_label == first_node
                        && (leg.edge_label > first_edge
                            || (leg.edge_label == first_edge && self.back_symmetry <= 0))))
        });
        let backward = self.legs.iter().enumerate().filter(|(_, leg)| {
            leg.depth != tail
                && leg.depth == 0
                && self.total_symmetry != 0
                && (leg.node_label > last_node
                    || (leg.node_label == last_node
                        && (leg.edge_label > last_edge
                            || (leg.edge_label == last_edge && self.front_symmetry >= 0))))
        });
        let path_legs: Vec<usize> = forward.chain(backward).map(|(i, _)| i).collect();

        let config = ctx.config;
        if config.backbone && path_legs.is_empty() && ctx.updated {
            ctx.flush(best);
        }
        for &i in &path_legs {
            let leg = &self.legs[i];
            visit_leg(ctx, PatternKind::Path, leg.attachment(), &leg.occurrences, best, |ctx, best| {
                let child_chain = chain.push(&leg.occurrences);
                let child = PathFrame::child(ctx, self, i, &child_chain);
                child.expand(ctx, &child_chain, best)
            })?;
        }

        let updated = ctx.updated;
        if config.bbrc_separator && !config.backbone && !self.legs.is_empty() {
            ctx.separator();
        }
        if config.kind >= PatternKind::Tree {
            let half = (n - 1) / 2;
            for (i, leg) in self.legs.iter().enumerate() {
                let depth = leg.depth as usize;
                if depth == n - 1 || depth == 0 {
                    continue;
                }
                let branches = (self.total_symmetry != 0 || depth <= half)
                    && (depth != 1 || leg.edge_label >= first_edge)
                    && (depth != n - 2 || leg.edge_label >= last_edge);
                if !branches {
                    continue;
                }
                visit_leg(ctx, PatternKind::Tree, leg.attachment(), &leg.occurrences, best, |ctx, best| {
                    let child_chain = chain.push(&leg.occurrences);
                    let tree = PatternTree::from_path(ctx, self, i, &child_chain);
                    tree.expand(ctx, &child_chain, best)
                })?;
            }
        }
        if config.kind == PatternKind::Graph && !self.close_legs.is_empty() {
            graph::expand_closing(ctx, &self.close_legs, &mut Vec::new(), best)?;
        }
        ctx.updated = updated;
        Ok(())
    }
}
