// Copyright (C) 2025 Jeremy J. Carroll. See LICENSE for details.

//! Cyclic patterns: closing edges added on top of a path or tree.
//!
//! Every closing edge joins two nodes already in the pattern, so no node
//! is inserted here. A cyclic graph has several spanning trees; it is only
//! reported from the spanning tree and closing edges the canonical check
//! accepts.

use super::report_and_refine;
use crate::config::PatternKind;
use crate::context::{Best, MiningContext};
use crate::database::Database;
use crate::error::Result;
use crate::graphstate::CanonicalForm;
use crate::occurrence::{distinct_tids, join_close_close, CloseLeg, CloseTuple};
use crate::state::statistics::Counters;
use tracing::trace;

/// Tries each of `legs` (sorted by tuple) as the next closing edge of the
/// current pattern, whose closing edges so far are `tuples`.
pub(super) fn expand_closing(
    ctx: &mut MiningContext<'_>,
    legs: &[CloseLeg],
    tuples: &mut Vec<CloseTuple>,
    best: &Best,
) -> Result<()> {
    for (k, leg) in legs.iter().enumerate() {
        ctx.enter_frame()?;
        let tuple = leg.tuple;
        ctx.graph_state.insert_edge(tuple.from, tuple.to, tuple.label);
        tuples.push(tuple);
        let result = close_one(ctx, legs, k, tuples, best);
        tuples.pop();
        ctx.graph_state.delete_edge(tuple.from, tuple.to);
        result?;
    }
    Ok(())
}

fn close_one(
    ctx: &mut MiningContext<'_>,
    legs: &[CloseLeg],
    k: usize,
    tuples: &mut Vec<CloseTuple>,
    best: &Best,
) -> Result<()> {
    ctx.statistics.increment(Counters::CanonicalChecks);
    let form = ctx.graph_state.is_canonical(tuples)?;
    trace!(closing_edges = tuples.len(), ?form, "closing edge");
    let leg = &legs[k];
    let min_frequency = ctx.min_frequency();
    let children = |db: &Database| -> Vec<CloseLeg> {
        legs[k + 1..]
            .iter()
            .filter_map(|other| {
                join_close_close(db, min_frequency, &leg.occurrences, &other.occurrences).map(
                    |occurrences| CloseLeg {
                        tuple: other.tuple,
                        occurrences,
                    },
                )
            })
            .collect()
    };
    match form {
        CanonicalForm::Canonical => {
            let tids = distinct_tids(leg.occurrences.tids());
            let evaluation = ctx.evaluate(&tids);
            ctx.statistics
                .record_frequent(PatternKind::Graph, ctx.graph_state.node_count());
            let frequency = leg.occurrences.frequency;
            report_and_refine(ctx, PatternKind::Graph, frequency, &evaluation, best, |ctx, best| {
                let next = children(ctx.db);
                if next.is_empty() {
                    if ctx.config.backbone && ctx.updated {
                        ctx.flush(best);
                    }
                    return Ok(());
                }
                expand_closing(ctx, &next, tuples, best)
            })
        }
        // another numbering of the same spanning tree closes the graph with
        // smaller edges; supergraphs may still be canonical here
        CanonicalForm::SmallerFoundTailOnly => {
            let next = children(ctx.db);
            expand_closing(ctx, &next, tuples, best)
        }
        CanonicalForm::SmallerFoundWithPrefix => {
            ctx.statistics.increment(Counters::CanonicalRejections);
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::config::{MinerConfig, PatternKind};
    use crate::context::{CancellationToken, MiningContext};
    use crate::database::{Database, TreeRecord};
    use crate::output::MiningEvent;
    use crate::search::PathFrame;
    use crate::state::statistics::Counters;

    fn triangles() -> Database {
        let mut db = Database::new();
        for id in 1..=2 {
            db.add_tree(
                TreeRecord::new(id)
                    .with_node(6)
                    .with_node(6)
                    .with_node(6)
                    .with_edge(0, 1, 1)
                    .with_edge(1, 2, 1)
                    .with_edge(2, 0, 1),
            )
            .unwrap();
        }
        db.finalize(2.0);
        db
    }

    #[test]
    fn test_ring_is_reported_once() {
        let db = triangles();
        let config = MinerConfig::frequent_only(2, PatternKind::Graph)
            .validate()
            .unwrap();
        let mut sink: Vec<MiningEvent> = Vec::new();
        let statistics = {
            let mut ctx = MiningContext::new(&db, &config, &mut sink, CancellationToken::new());
            PathFrame::mine(&mut ctx, 0).unwrap();
            ctx.into_statistics()
        };
        let rings: Vec<_> = sink
            .iter()
            .filter_map(|event| match event {
                MiningEvent::Pattern(p) if p.kind == PatternKind::Graph => Some(p),
                _ => None,
            })
            .collect();
        assert_eq!(rings.len(), 1);
        assert_eq!(rings[0].size, 3);
        assert!(statistics.get(Counters::CanonicalChecks) >= 1);
    }
}
