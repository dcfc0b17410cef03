// Copyright (C) 2025 Jeremy J. Carroll. See LICENSE for details.

//! The mining session: load graphs and activities, then mine root labels.

use crate::config::ValidatedConfig;
use crate::context::{CancellationToken, MiningContext};
use crate::database::{ActivityReader, Database, GspReader, TreeRecord};
use crate::error::{MinerError, Result};
use crate::output::PatternSink;
use crate::search::PathFrame;
use crate::state::statistics::Statistics;
use crate::types::{NodeLabel, OrigId, Tid};
use std::io::BufRead;
use tracing::{debug, info, info_span, warn};

/// A database of graphs with the settings to mine it.
///
/// Graphs are added first. The database is finalized by the first call to
/// [`Miner::mine_root`] or [`Miner::mine_all`]; afterwards no graphs can be
/// added until [`Miner::reset`].
pub struct Miner {
    config: ValidatedConfig,
    database: Database,
    statistics: Statistics,
    cancellation: CancellationToken,
}

impl Miner {
    pub fn new(config: ValidatedConfig) -> Self {
        Miner {
            config,
            database: Database::new(),
            statistics: Statistics::new(),
            cancellation: CancellationToken::new(),
        }
    }

    pub fn config(&self) -> &ValidatedConfig {
        &self.config
    }

    pub fn database(&self) -> &Database {
        &self.database
    }

    pub fn add_tree(&mut self, record: TreeRecord) -> Result<Tid> {
        self.database.add_tree(record)
    }

    /// Loads every graph of a GSP stream. Malformed records are skipped
    /// with a warning; I/O errors abort. Returns the number of graphs added.
    pub fn read_gsp<R: BufRead>(&mut self, input: R) -> Result<usize> {
        let mut added = 0;
        for record in GspReader::new(input) {
            let outcome = record.and_then(|record| self.database.add_tree(record));
            match outcome {
                Ok(_) => added += 1,
                Err(MinerError::InputFormat { line, message }) => {
                    warn!(line, %message, "skipping graph");
                }
                Err(e) => return Err(e),
            }
        }
        debug!(graphs = added, "graphs read");
        Ok(added)
    }

    /// Returns `false` if no graph has this id.
    pub fn set_activity(&mut self, orig_id: OrigId, value: f64) -> bool {
        self.database.set_activity(orig_id, value)
    }

    /// Loads an activity table. Lines naming unknown graphs and malformed
    /// lines are skipped with a warning. Returns the number of values set.
    pub fn read_activities<R: BufRead>(&mut self, input: R) -> Result<usize> {
        let mut set = 0;
        for record in ActivityReader::new(input, self.config.regression) {
            match record {
                Ok(record) => {
                    if self.database.set_activity(record.orig_id, record.value) {
                        set += 1;
                    } else {
                        warn!(line = record.line_nr, id = record.orig_id, "activity for unknown graph");
                    }
                }
                Err(MinerError::InputFormat { line, message }) => {
                    warn!(line, %message, "skipping activity");
                }
                Err(e) => return Err(e),
            }
        }
        debug!(activities = set, "activities read");
        Ok(set)
    }

    /// A token that stops a running [`Miner::mine_root`] from another thread.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancellation.clone()
    }

    fn prepare(&mut self) -> Result<()> {
        if !self.database.is_finalized() {
            if self.config.significance_filter {
                if let Some(tree) = self.database.trees().iter().find(|t| t.activity.is_none()) {
                    return Err(MinerError::MissingActivity { id: tree.orig_id });
                }
            }
            self.database.finalize(self.config.min_frequency());
            info!(
                graphs = self.database.tree_count(),
                labels = self.database.node_label_count(),
                min_frequency = self.config.min_frequency,
                kind = %self.config.kind,
                threshold = self.config.threshold(),
                backbone = self.config.backbone,
                dynamic_upper_bound = self.config.dynamic_upper_bound,
                "mining settings"
            );
        }
        Ok(())
    }

    /// Internal labels that are frequent enough to root a pattern, ascending.
    pub fn frequent_roots(&mut self) -> Result<Vec<usize>> {
        self.prepare()?;
        let min_frequency = self.config.min_frequency();
        Ok(self
            .database
            .node_labels()
            .iter()
            .enumerate()
            .filter(|(_, entry)| entry.frequency >= min_frequency)
            .map(|(label, _)| label)
            .collect())
    }

    /// Mines every pattern whose first node has internal label `label`.
    pub fn mine_root(&mut self, label: usize, sink: &mut dyn PatternSink) -> Result<()> {
        self.prepare()?;
        let available = self.database.node_label_count();
        if label >= available {
            return Err(MinerError::UnknownRoot { label, available });
        }
        if self.database.node_label(label as NodeLabel).frequency < self.config.min_frequency() {
            debug!(label, "root label is not frequent");
            return Ok(());
        }
        let span = info_span!("mine_root", label);
        let _guard = span.enter();
        let mut ctx = MiningContext::new(
            &self.database,
            &self.config,
            sink,
            self.cancellation.clone(),
        );
        let result = PathFrame::mine(&mut ctx, label as NodeLabel);
        let statistics = ctx.into_statistics();
        self.statistics.merge(&statistics);
        result
    }

    /// Mines every frequent root label in ascending order.
    pub fn mine_all(&mut self, sink: &mut dyn PatternSink) -> Result<()> {
        for label in self.frequent_roots()? {
            self.mine_root(label, sink)?;
        }
        Ok(())
    }

    /// Counters accumulated over all runs since the last reset.
    pub fn statistics(&self) -> &Statistics {
        &self.statistics
    }

    pub fn log_summary(&self) {
        self.statistics.log_summary();
    }

    /// Drops all graphs and counters so a new database can be loaded.
    pub fn reset(&mut self) {
        self.database = Database::new();
        self.statistics = Statistics::new();
        self.cancellation.reset();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{MinerConfig, PatternKind};
    use crate::output::MinedPattern;

    const GSP: &str = "t # 1\nv 0 6\nv 1 8\ne 0 1 1\nt # 2\nv 0 6\nv 1 8\ne 0 1 1\n";

    fn frequent_miner() -> Miner {
        Miner::new(
            MinerConfig::frequent_only(2, PatternKind::Tree)
                .validate()
                .unwrap(),
        )
    }

    #[test]
    fn test_read_gsp_skips_bad_records() {
        let mut miner = frequent_miner();
        let text = format!("{GSP}t # 3\nv 1 6\n");
        assert_eq!(miner.read_gsp(text.as_bytes()).unwrap(), 2);
        assert_eq!(miner.database().tree_count(), 2);
    }

    #[test]
    fn test_unknown_root() {
        let mut miner = frequent_miner();
        miner.read_gsp(GSP.as_bytes()).unwrap();
        let mut sink: Vec<MinedPattern> = Vec::new();
        let err = miner.mine_root(9, &mut sink).unwrap_err();
        assert!(matches!(err, MinerError::UnknownRoot { label: 9, available: 2 }));
    }

    #[test]
    fn test_missing_activity_is_reported() {
        let mut miner = Miner::new(MinerConfig::default().validate().unwrap());
        miner.read_gsp(GSP.as_bytes()).unwrap();
        assert!(miner.set_activity(1, 1.0));
        let mut sink: Vec<MinedPattern> = Vec::new();
        let err = miner.mine_all(&mut sink).unwrap_err();
        assert!(matches!(err, MinerError::MissingActivity { id: 2 }));
    }

    #[test]
    fn test_trees_cannot_be_added_after_mining() {
        let mut miner = frequent_miner();
        miner.read_gsp(GSP.as_bytes()).unwrap();
        let mut sink: Vec<MinedPattern> = Vec::new();
        miner.mine_all(&mut sink).unwrap();
        assert_eq!(sink.len(), 1);
        assert!(["[#6]-[#8]", "[#8]-[#6]"].contains(&sink[0].smarts.as_str()));
        assert!(matches!(
            miner.add_tree(TreeRecord::new(5).with_node(6)),
            Err(MinerError::InputFormat { .. })
        ));
        miner.reset();
        assert!(miner.add_tree(TreeRecord::new(5).with_node(6)).is_ok());
    }

    #[test]
    fn test_cancelled_run() {
        let mut miner = frequent_miner();
        miner.read_gsp(GSP.as_bytes()).unwrap();
        miner.cancellation_token().cancel();
        let mut sink: Vec<MinedPattern> = Vec::new();
        assert!(matches!(miner.mine_all(&mut sink), Err(MinerError::Cancelled)));
        assert!(sink.is_empty());
    }
}
