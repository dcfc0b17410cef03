// Copyright (C) 2025 Jeremy J. Carroll. See LICENSE for details.

//! Reader for the line-based GSP graph format.
//!
//! ```text
//! t # 17
//! v 0 6
//! v 1 8
//! e 0 1 2
//! ```

use super::TreeRecord;
use crate::error::{MinerError, Result};
use crate::types::OrigId;
use std::io::BufRead;

/// Yields one [`TreeRecord`] per `t` line.
///
/// A malformed record yields an `InputFormat` error and reading resumes at
/// the next `t` line. I/O failures are returned as `Io` and end the stream.
pub struct GspReader<R> {
    input: std::io::Lines<R>,
    line_nr: usize,
    pending_header: Option<(usize, String)>,
    records_read: u32,
    done: bool,
}

impl<R: BufRead> GspReader<R> {
    pub fn new(input: R) -> Self {
        GspReader {
            input: input.lines(),
            line_nr: 0,
            pending_header: None,
            records_read: 0,
            done: false,
        }
    }

    fn next_line(&mut self) -> Option<std::io::Result<(usize, String)>> {
        let line = self.input.next()?;
        self.line_nr += 1;
        Some(line.map(|l| (self.line_nr, l)))
    }

    /// Reads the next `t` line, reporting stray lines before it.
    fn next_header(&mut self) -> Option<Result<(usize, String)>> {
        if let Some(header) = self.pending_header.take() {
            return Some(Ok(header));
        }
        let mut stray: Option<usize> = None;
        loop {
            match self.next_line()? {
                Err(e) => return Some(Err(e.into())),
                Ok((nr, line)) => {
                    let trimmed = line.trim();
                    if trimmed.starts_with('t') {
                        if let Some(stray) = stray {
                            self.pending_header = Some((nr, line));
                            return Some(Err(MinerError::InputFormat {
                                line: stray,
                                message: "content outside of a graph record".into(),
                            }));
                        }
                        return Some(Ok((nr, line)));
                    }
                    if !trimmed.is_empty() && stray.is_none() {
                        stray = Some(nr);
                    }
                }
            }
        }
    }
}

fn first_number(text: &str) -> Option<u32> {
    let start = text.find(|c: char| c.is_ascii_digit())?;
    let digits: String = text[start..]
        .chars()
        .take_while(char::is_ascii_digit)
        .collect();
    digits.parse().ok()
}

fn parse_fields<const N: usize>(rest: &str) -> Option<[u32; N]> {
    let mut out = [0u32; N];
    let mut fields = rest.split_whitespace();
    for slot in out.iter_mut() {
        *slot = fields.next()?.parse().ok()?;
    }
    Some(out)
}

impl<R: BufRead> Iterator for GspReader<R> {
    type Item = Result<TreeRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        let (header_nr, header) = match self.next_header()? {
            Ok(header) => header,
            Err(e @ MinerError::Io(_)) => {
                self.done = true;
                return Some(Err(e));
            }
            Err(e) => return Some(Err(e)),
        };
        let orig_id = first_number(&header.trim_start()[1..]).unwrap_or(self.records_read as OrigId);
        self.records_read += 1;
        let mut record = TreeRecord::new(orig_id);
        record.line_nr = header_nr;
        let mut error: Option<MinerError> = None;

        while let Some(line) = self.next_line() {
            let (nr, line) = match line {
                Ok(l) => l,
                Err(e) => {
                    self.done = true;
                    return Some(Err(e.into()));
                }
            };
            let trimmed = line.trim();
            if trimmed.starts_with('t') {
                self.pending_header = Some((nr, line));
                break;
            }
            if trimmed.is_empty() || error.is_some() {
                continue;
            }
            let (command, rest) = trimmed.split_at(1);
            let bad = |message: String| MinerError::InputFormat { line: nr, message };
            match command {
                "v" => match parse_fields::<2>(rest) {
                    Some([n, label]) if n as usize == record.nodes.len() => {
                        record.nodes.push(label);
                    }
                    Some([n, _]) => {
                        error = Some(bad(format!(
                            "node number {} does not correspond to its position {}",
                            n,
                            record.nodes.len()
                        )))
                    }
                    None => error = Some(bad(format!("malformed vertex line '{}'", trimmed))),
                },
                "e" => match parse_fields::<3>(rest) {
                    Some([from, to, label]) => record.edges.push((from as usize, to as usize, label)),
                    None => error = Some(bad(format!("malformed edge line '{}'", trimmed))),
                },
                _ => error = Some(bad(format!("unknown record line '{}'", trimmed))),
            }
        }
        Some(match error {
            Some(e) => Err(e),
            None => Ok(record),
        })
    }
}
