// Copyright (C) 2025 Jeremy J. Carroll. See LICENSE for details.

//! Mined patterns, the sink they are pushed to, and their text renderings.

use crate::config::{MinerConfig, OutputFormat, PatternKind};
use crate::constraints::quantile::chi_square_cdf;
use crate::graphstate::PatternGraph;
use crate::types::{Frequency, OrigId};
use std::fmt::Write;

/// One reported pattern.
#[derive(Debug, Clone, PartialEq)]
pub struct MinedPattern {
    pub smarts: String,
    pub graph: PatternGraph,
    pub kind: PatternKind,
    /// Number of nodes.
    pub size: usize,
    pub p_value: f64,
    pub upper_bound: f64,
    pub frequency: Frequency,
    pub active_ids: Vec<OrigId>,
    pub inactive_ids: Vec<OrigId>,
    pub activating: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub enum MiningEvent {
    Pattern(MinedPattern),
    /// Boundary between two backbone refinement classes.
    Separator,
}

/// Receives the patterns in discovery order.
pub trait PatternSink {
    fn accept(&mut self, event: MiningEvent);
}

impl PatternSink for Vec<MiningEvent> {
    fn accept(&mut self, event: MiningEvent) {
        self.push(event);
    }
}

impl PatternSink for Vec<MinedPattern> {
    fn accept(&mut self, event: MiningEvent) {
        if let MiningEvent::Pattern(pattern) = event {
            self.push(pattern);
        }
    }
}

/// Renders events as the lines the command line tool prints.
#[derive(Debug, Clone)]
pub struct LineFormatter {
    format: OutputFormat,
    significance_filter: bool,
    regression: bool,
    p_values: bool,
    gsp_counter: usize,
}

fn id_list(out: &mut String, ids: &[OrigId]) {
    for (i, id) in ids.iter().enumerate() {
        if i > 0 {
            out.push(',');
        }
        let _ = write!(out, " {id}");
        if i + 1 == ids.len() {
            out.push(' ');
        }
    }
}

impl LineFormatter {
    pub fn new(config: &MinerConfig) -> Self {
        LineFormatter {
            format: config.output_format,
            significance_filter: config.significance_filter,
            regression: config.regression,
            p_values: config.p_values,
            gsp_counter: 0,
        }
    }

    pub fn separator(&self) -> &'static str {
        match self.format {
            OutputFormat::Gsp => "#",
            OutputFormat::Yaml => "---",
            OutputFormat::Plain => " ",
        }
    }

    /// Text for one event, without the trailing newline.
    pub fn render(&mut self, event: &MiningEvent) -> String {
        match event {
            MiningEvent::Pattern(pattern) => self.pattern(pattern),
            MiningEvent::Separator => self.separator().to_string(),
        }
    }

    pub fn pattern(&mut self, pattern: &MinedPattern) -> String {
        match self.format {
            OutputFormat::Gsp => {
                self.gsp_counter += 1;
                let mut text = pattern.graph.to_gsp(self.gsp_counter);
                text.pop();
                text
            }
            OutputFormat::Yaml => self.yaml(pattern),
            OutputFormat::Plain => self.plain(pattern),
        }
    }

    fn yaml(&self, pattern: &MinedPattern) -> String {
        let mut out = format!("- [ \"{}\", ", pattern.smarts);
        if !self.significance_filter {
            let _ = write!(out, "{} ]", pattern.frequency);
            return out;
        }
        let shown = if self.p_values && !self.regression {
            chi_square_cdf(pattern.p_value)
        } else {
            pattern.p_value
        };
        let _ = write!(out, "{shown:.4}, [");
        id_list(&mut out, &pattern.active_ids);
        if !self.regression {
            out.push_str("], [");
            id_list(&mut out, &pattern.inactive_ids);
        }
        out.push_str("] ]");
        out
    }

    fn plain(&self, pattern: &MinedPattern) -> String {
        let mut out = format!("{}\t", pattern.smarts);
        if !self.significance_filter {
            let _ = write!(out, "{}", pattern.frequency);
            return out;
        }
        let mut ids: Vec<OrigId> = pattern
            .active_ids
            .iter()
            .chain(&pattern.inactive_ids)
            .copied()
            .collect();
        ids.sort_unstable();
        ids.dedup();
        out.push('[');
        for id in ids {
            let _ = write!(out, " {id}");
        }
        out.push_str(" ]");
        out
    }
}
