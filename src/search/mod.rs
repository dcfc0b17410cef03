// Copyright (C) 2025 Jeremy J. Carroll. See LICENSE for details.

//! Depth-first search over backbone paths, the trees branching from them
//! and, in graph mode, the cycles closed on either.
//!
//! Each recursion frame owns the candidate legs of its pattern. A frame
//! inserts a leg into the shared [`GraphState`](crate::graphstate::GraphState),
//! evaluates it, builds the child frame and removes the leg again before
//! trying the next one.
//!
//! Reporting follows the backbone refinement class policy when backbone
//! mode is on: the most significant pattern of a backbone is carried down
//! as a [`Best`] and reported once, when the backbone can grow no further
//! or its refinement is pruned.

mod graph;
mod path;
mod tree;

pub use path::PathFrame;

use crate::config::PatternKind;
use crate::constraints::Evaluation;
use crate::context::{Best, MiningContext};
use crate::error::Result;
use crate::occurrence::{distinct_tids, LegOccurrences};
use crate::state::statistics::Counters;
use crate::types::{EdgeLabel, Frequency, NodeId};

/// How a leg hangs from the pattern.
#[derive(Debug, Clone, Copy)]
struct Attachment {
    from: NodeId,
    edge_label: EdgeLabel,
    max_degree: u16,
}

/// Inserts one node leg, reports it and refines it with `refine` unless
/// the upper bound prunes it.
fn visit_leg<'a, F>(
    ctx: &mut MiningContext<'a>,
    kind: PatternKind,
    attachment: Attachment,
    occurrences: &LegOccurrences,
    best: &Best,
    refine: F,
) -> Result<()>
where
    F: FnOnce(&mut MiningContext<'a>, &Best) -> Result<()>,
{
    ctx.check_pattern_size()?;
    let tids = distinct_tids(occurrences.tids());
    let evaluation = ctx.evaluate(&tids);
    ctx.graph_state.insert_node(
        ctx.db,
        attachment.from,
        attachment.edge_label,
        attachment.max_degree,
    );
    let result = report_and_refine(ctx, kind, occurrences.frequency, &evaluation, best, refine);
    ctx.graph_state.delete_node();
    result
}

/// The current pattern has just been completed: report it, then refine
/// or prune. Shared by node legs and closing edges.
fn report_and_refine<'a, F>(
    ctx: &mut MiningContext<'a>,
    kind: PatternKind,
    frequency: Frequency,
    evaluation: &Evaluation,
    best: &Best,
    refine: F,
) -> Result<()>
where
    F: FnOnce(&mut MiningContext<'a>, &Best) -> Result<()>,
{
    let backbone = ctx.config.backbone;
    let improves = evaluation.p > best.p;
    let mut pattern = if !backbone || improves {
        ctx.describe(kind, frequency, evaluation)
    } else {
        None
    };
    if !backbone {
        if let Some(pattern) = pattern.take() {
            ctx.emit(pattern);
        }
    }
    if ctx.should_refine(evaluation, best.p, frequency) {
        if improves {
            ctx.updated = true;
            let improved = Best {
                p: evaluation.p,
                pattern,
            };
            refine(ctx, &improved)
        } else {
            refine(ctx, best)
        }
    } else {
        ctx.statistics.increment(Counters::PrunedSubtrees);
        if backbone && ctx.updated {
            ctx.flush(best);
        }
        Ok(())
    }
}
