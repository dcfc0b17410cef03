// Copyright (C) 2025 Jeremy J. Carroll. See LICENSE for details.

//! Mining context.
//!
//! One [`MiningContext`] is created per mined root label. It borrows the
//! finalized database and the validated configuration, and owns everything
//! the search mutates: the pattern under construction, the counters, the
//! constraint and the backbone bookkeeping. Frames of the recursion hold
//! only their own legs and receive the context by exclusive reference.

use crate::config::{PatternKind, ValidatedConfig};
use crate::constraints::{self, Constraint, Evaluation};
use crate::database::Database;
use crate::error::{MinerError, Result};
use crate::graphstate::GraphState;
use crate::occurrence::{self, Extension, LegOccurrences, OccurrenceChain};
use crate::output::{MinedPattern, MiningEvent, PatternSink};
use crate::state::statistics::{Counters, Statistics};
use crate::types::{EdgeLabel, Frequency, NodeId, Tid, MAX_PATTERN_SIZE};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Shared flag that stops a running search at its next frame.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken(Arc<AtomicBool>);

impl CancellationToken {
    pub fn new() -> Self {
        CancellationToken::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }

    /// Clears the flag so the token can be reused for the next run.
    pub fn reset(&self) {
        self.0.store(false, Ordering::Relaxed);
    }
}

/// The most significant pattern seen so far on the current backbone.
#[derive(Debug, Clone, Default)]
pub struct Best {
    pub p: f64,
    /// `None` when that pattern did not pass the significance filter.
    pub pattern: Option<MinedPattern>,
}

pub struct MiningContext<'a> {
    pub db: &'a Database,
    pub config: &'a ValidatedConfig,
    pub graph_state: GraphState,
    pub statistics: Statistics,
    constraint: Option<Box<dyn Constraint>>,
    sink: &'a mut dyn PatternSink,
    cancellation: CancellationToken,
    /// The carried best pattern has not been reported yet.
    pub updated: bool,
    emitted_since_separator: bool,
}

impl<'a> MiningContext<'a> {
    pub fn new(
        db: &'a Database,
        config: &'a ValidatedConfig,
        sink: &'a mut dyn PatternSink,
        cancellation: CancellationToken,
    ) -> Self {
        let constraint = config
            .significance_filter
            .then(|| constraints::for_config(config, db));
        MiningContext {
            db,
            config,
            graph_state: GraphState::new(),
            statistics: Statistics::new(),
            constraint,
            sink,
            cancellation,
            updated: false,
            emitted_since_separator: false,
        }
    }

    pub fn min_frequency(&self) -> Frequency {
        self.config.min_frequency()
    }

    /// Called on entry to every frame.
    pub fn enter_frame(&mut self) -> Result<()> {
        if self.cancellation.is_cancelled() {
            return Err(MinerError::Cancelled);
        }
        self.statistics.increment(Counters::FramesVisited);
        Ok(())
    }

    /// Fails when one more node would overflow the pattern node ids.
    pub fn check_pattern_size(&self) -> Result<()> {
        if self.graph_state.node_count() >= MAX_PATTERN_SIZE {
            return Err(MinerError::ResourceLimitExceeded {
                what: "nodes in one pattern",
                limit: MAX_PATTERN_SIZE,
            });
        }
        Ok(())
    }

    pub fn evaluate(&self, tids: &[Tid]) -> Evaluation {
        match &self.constraint {
            Some(constraint) => constraint.evaluate(self.db, tids),
            None => Evaluation::default(),
        }
    }

    /// The current pattern as it would be reported, or `None` when the
    /// significance filter rejects it.
    pub fn describe(
        &self,
        kind: PatternKind,
        frequency: Frequency,
        evaluation: &Evaluation,
    ) -> Option<MinedPattern> {
        if self.constraint.is_some() && evaluation.p < self.config.threshold() {
            return None;
        }
        let graph = self.graph_state.snapshot(self.db);
        Some(MinedPattern {
            smarts: graph.to_smarts(),
            size: graph.node_count(),
            graph,
            kind,
            p_value: evaluation.p,
            upper_bound: evaluation.upper_bound,
            frequency,
            active_ids: evaluation.active_ids.iter().copied().collect(),
            inactive_ids: evaluation.inactive_ids.iter().copied().collect(),
            activating: evaluation.activating,
        })
    }

    /// Upper-bound pruning: can a refinement of a pattern with this
    /// evaluation still matter?
    pub fn should_refine(&self, evaluation: &Evaluation, best_p: f64, frequency: Frequency) -> bool {
        let config = self.config;
        let bound_holds = if !config.static_pruning {
            true
        } else if config.dynamic_upper_bound {
            let cmax = config.threshold().max(best_p).max(evaluation.p);
            evaluation.upper_bound >= cmax
        } else {
            evaluation.upper_bound >= config.threshold()
        };
        bound_holds && (config.refine_singles || frequency > 1.0)
    }

    pub fn emit(&mut self, pattern: MinedPattern) {
        self.statistics.increment(Counters::PatternsEmitted);
        self.emitted_since_separator = true;
        self.sink.accept(MiningEvent::Pattern(pattern));
    }

    /// Reports the carried pattern of a finished backbone.
    pub fn flush(&mut self, best: &Best) {
        self.statistics.increment(Counters::BackboneFlushes);
        if let Some(pattern) = &best.pattern {
            self.emit(pattern.clone());
        }
        self.updated = false;
    }

    /// Closes a backbone class in separator mode. Never writes two
    /// separators in a row, nor one before the first pattern.
    pub fn separator(&mut self) {
        if self.emitted_since_separator {
            self.emitted_since_separator = false;
            self.sink.accept(MiningEvent::Separator);
        }
    }

    pub fn extend(&self, chain: &OccurrenceChain<'_>) -> Extension {
        occurrence::extend(self.db, &self.graph_state, chain)
    }

    pub fn extend_restricted(
        &self,
        chain: &OccurrenceChain<'_>,
        min_label: EdgeLabel,
        neglect: EdgeLabel,
    ) -> Extension {
        occurrence::extend_restricted(self.db, &self.graph_state, chain, min_label, neglect)
    }

    pub fn join(
        &mut self,
        a: &LegOccurrences,
        connecting_node: NodeId,
        b: &LegOccurrences,
    ) -> Option<LegOccurrences> {
        self.statistics.increment(Counters::JoinsAttempted);
        let joined = occurrence::join(
            self.db,
            &self.graph_state,
            self.min_frequency(),
            a,
            connecting_node,
            b,
        );
        if joined.is_some() {
            self.statistics.increment(Counters::JoinsSucceeded);
        }
        joined
    }

    pub fn self_join(&mut self, a: &LegOccurrences) -> Option<LegOccurrences> {
        self.statistics.increment(Counters::JoinsAttempted);
        let joined = occurrence::self_join(self.db, self.min_frequency(), a);
        if joined.is_some() {
            self.statistics.increment(Counters::JoinsSucceeded);
        }
        joined
    }

    pub fn into_statistics(self) -> Statistics {
        self.statistics
    }
}
