// Copyright (C) 2025 Jeremy J. Carroll. See LICENSE for details.

//! Cycle-closing legs: collection during extension and their merge joins.

use super::{CloseLeg, CloseLegOccurrence, CloseLegOccurrences, CloseTuple, LegOccurrences};
use crate::database::Database;
use crate::types::{EdgeLabel, Frequency, NO_TID};
use std::cmp::Ordering;

/// Closing-edge occurrences gathered by one extension, indexed by the
/// target pattern node number and then by edge label. Tables are allocated
/// only for node numbers that actually receive an occurrence.
#[derive(Debug, Clone, Default)]
pub struct CloseCandidates {
    tables: Vec<Option<Vec<CloseLegOccurrences>>>,
    label_count: usize,
}

impl CloseCandidates {
    pub fn new(max_number: u32, label_count: usize) -> Self {
        CloseCandidates {
            tables: vec![None; max_number as usize],
            label_count,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.tables.iter().all(Option::is_none)
    }

    pub(crate) fn record(&mut self, number: u32, label: EdgeLabel, occ: CloseLegOccurrence, weight: f64) {
        let index = number as usize;
        if index >= self.tables.len() {
            self.tables.resize(index + 1, None);
        }
        let label_count = self.label_count;
        let table = self.tables[index]
            .get_or_insert_with(|| vec![CloseLegOccurrences::default(); label_count]);
        let entry = &mut table[label as usize];
        if entry.elements.last().map_or(true, |back| back.tid != occ.tid) {
            entry.frequency += weight;
        }
        entry.elements.push(occ);
    }
}

/// Moves every frequent closing candidate into `target` as a leg closing
/// from pattern node `number`.
pub fn add_close_extensions(
    target: &mut Vec<CloseLeg>,
    candidates: CloseCandidates,
    number: u32,
    min_frequency: Frequency,
) {
    for (to, table) in candidates.tables.into_iter().enumerate().skip(1) {
        let Some(table) = table else { continue };
        for (label, occurrences) in table.into_iter().enumerate() {
            if occurrences.frequency >= min_frequency {
                target.push(CloseLeg {
                    tuple: CloseTuple {
                        from: number,
                        to: to as u32,
                        label: label as EdgeLabel,
                    },
                    occurrences,
                });
            }
        }
    }
}

/// Carries the closing legs of the parent frame over to the embeddings in
/// `occs`, keeping those that stay frequent.
pub fn inherit_close_legs(
    db: &Database,
    min_frequency: Frequency,
    source: &[CloseLeg],
    occs: &LegOccurrences,
) -> Vec<CloseLeg> {
    source
        .iter()
        .filter_map(|leg| {
            join_leg_close(db, min_frequency, occs, &leg.occurrences).map(|occurrences| CloseLeg {
                tuple: leg.tuple,
                occurrences,
            })
        })
        .collect()
}

/// Embeddings in `legs` whose parent embedding admits the closing edge.
pub fn join_leg_close(
    db: &Database,
    min_frequency: Frequency,
    legs: &LegOccurrences,
    close: &CloseLegOccurrences,
) -> Option<CloseLegOccurrences> {
    let (left, right) = (&legs.elements, &close.elements);
    if left.is_empty() || right.is_empty() {
        return None;
    }
    let mut result = CloseLegOccurrences::default();
    let mut last_tid = NO_TID;
    let (mut j, mut k) = (0usize, 0usize);
    loop {
        match left[j].occurrence_id.cmp(&right[k].occurrence_id) {
            Ordering::Less => {
                j += 1;
                if j == left.len() {
                    break;
                }
            }
            Ordering::Equal => {
                let tid = left[j].tid;
                result.elements.push(CloseLegOccurrence {
                    tid,
                    occurrence_id: j as u32,
                });
                if tid != last_tid {
                    last_tid = tid;
                    result.frequency += db.tree(tid).weight;
                }
                j += 1;
                if j == left.len() {
                    break;
                }
            }
            Ordering::Greater => {
                k += 1;
                if k == right.len() {
                    break;
                }
            }
        }
    }
    (result.frequency >= min_frequency).then_some(result)
}

/// Embeddings that admit both closing edges.
pub fn join_close_close(
    db: &Database,
    min_frequency: Frequency,
    a: &CloseLegOccurrences,
    b: &CloseLegOccurrences,
) -> Option<CloseLegOccurrences> {
    let (left, right) = (&a.elements, &b.elements);
    if left.is_empty() || right.is_empty() {
        return None;
    }
    let mut result = CloseLegOccurrences::default();
    let mut last_tid = NO_TID;
    let (mut j, mut k) = (0usize, 0usize);
    loop {
        let ordering = left[j].occurrence_id.cmp(&right[k].occurrence_id);
        if ordering == Ordering::Less {
            j += 1;
            if j == left.len() {
                break;
            }
            continue;
        }
        if ordering == Ordering::Equal {
            let occ = left[j];
            result.elements.push(occ);
            if occ.tid != last_tid {
                last_tid = occ.tid;
                result.frequency += db.tree(occ.tid).weight;
            }
            j += 1;
            if j == left.len() {
                break;
            }
        }
        k += 1;
        if k == right.len() {
            break;
        }
    }
    (result.frequency >= min_frequency).then_some(result)
}
