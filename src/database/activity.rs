// Copyright (C) 2025 Jeremy J. Carroll. See LICENSE for details.

//! Reader for activity tables: `id [name] value` per line, `#` comments.

use crate::error::{MinerError, Result};
use crate::types::OrigId;
use std::io::BufRead;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ActivityRecord {
    pub orig_id: OrigId,
    pub value: f64,
    pub line_nr: usize,
}

/// Yields one [`ActivityRecord`] per data line. In classification mode
/// values must be `0` or `1`.
pub struct ActivityReader<R> {
    input: std::io::Lines<R>,
    line_nr: usize,
    regression: bool,
}

impl<R: BufRead> ActivityReader<R> {
    pub fn new(input: R, regression: bool) -> Self {
        ActivityReader {
            input: input.lines(),
            line_nr: 0,
            regression,
        }
    }

    fn parse(&self, line: &str) -> Result<ActivityRecord> {
        let bad = |message: String| MinerError::InputFormat {
            line: self.line_nr,
            message,
        };
        let fields: Vec<&str> = line.split_whitespace().collect();
        if fields.len() < 2 {
            return Err(bad(format!("expected 'id name value', got '{}'", line)));
        }
        let orig_id = fields[0]
            .parse::<OrigId>()
            .map_err(|_| bad(format!("invalid graph id '{}'", fields[0])))?;
        let raw = fields[fields.len() - 1];
        let value = raw
            .parse::<f64>()
            .ok()
            .filter(|v| v.is_finite())
            .ok_or_else(|| bad(format!("invalid activity '{}'", raw)))?;
        if !self.regression && value != 0.0 && value != 1.0 {
            return Err(bad(format!("class activity must be 0 or 1, got {}", raw)));
        }
        Ok(ActivityRecord {
            orig_id,
            value,
            line_nr: self.line_nr,
        })
    }
}

impl<R: BufRead> Iterator for ActivityReader<R> {
    type Item = Result<ActivityRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let line = match self.input.next()? {
                Ok(line) => line,
                Err(e) => return Some(Err(e.into())),
            };
            self.line_nr += 1;
            let trimmed = line.trim();
            if trimmed.is_empty() || trimmed.starts_with('#') {
                continue;
            }
            return Some(self.parse(trimmed));
        }
    }
}
