// Copyright (C) 2025 Jeremy J. Carroll. See LICENSE for details.

//! Occurrence lists: where each candidate extension of the current pattern
//! embeds into the database.
//!
//! An occurrence refers to its parent embedding by index (`occurrence_id`)
//! into the occurrence list of the leg the current frame was grown from.
//! Lists are ordered by `occurrence_id`, which the merge joins rely on.
//! Instead of parent pointers, the chain of parent lists is passed down the
//! recursion as an [`OccurrenceChain`] borrowed from the ancestor frames.

mod close;
mod extend;
mod join;

pub use close::{
    add_close_extensions, inherit_close_legs, join_close_close, join_leg_close, CloseCandidates,
};
pub use extend::{extend, extend_restricted, Extension};
pub use join::{join, self_join};

use crate::types::{EdgeLabel, Frequency, NodeId, OccurrenceId, Tid};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LegOccurrence {
    pub tid: Tid,
    /// Index into the parent occurrence list.
    pub occurrence_id: OccurrenceId,
    pub to_node: NodeId,
    pub from_node: NodeId,
}

impl LegOccurrence {
    pub fn new(tid: Tid, occurrence_id: OccurrenceId, to_node: NodeId, from_node: NodeId) -> Self {
        LegOccurrence {
            tid,
            occurrence_id,
            to_node,
            from_node,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct LegOccurrences {
    pub elements: Vec<LegOccurrence>,
    /// Weighted number of distinct graphs among `elements`.
    pub frequency: Frequency,
    /// Largest database degree of any `to_node`.
    pub max_degree: u16,
    /// Weighted number of graphs in which two occurrences share a parent.
    pub self_join: Frequency,
    /// Pattern node number of the node this list embeds (1-based).
    pub number: u32,
}

impl LegOccurrences {
    pub fn with_number(number: u32) -> Self {
        LegOccurrences {
            number,
            ..LegOccurrences::default()
        }
    }

    pub fn tids(&self) -> impl Iterator<Item = Tid> + '_ {
        self.elements.iter().map(|o| o.tid)
    }

    pub(crate) fn raise_max_degree(&mut self, degree: usize) {
        let degree = u16::try_from(degree).unwrap_or(u16::MAX);
        if degree > self.max_degree {
            self.max_degree = degree;
        }
    }
}

/// A closing edge: from pattern node `from` to pattern node `to` (both
/// 1-based), ordered by `(from, to, label)`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CloseTuple {
    pub from: u32,
    pub to: u32,
    pub label: EdgeLabel,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CloseLegOccurrence {
    pub tid: Tid,
    pub occurrence_id: OccurrenceId,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CloseLegOccurrences {
    pub elements: Vec<CloseLegOccurrence>,
    pub frequency: Frequency,
}

impl CloseLegOccurrences {
    pub fn tids(&self) -> impl Iterator<Item = Tid> + '_ {
        self.elements.iter().map(|o| o.tid)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CloseLeg {
    pub tuple: CloseTuple,
    pub occurrences: CloseLegOccurrences,
}

/// The occurrence lists of the legs along the current recursion path,
/// innermost first.
#[derive(Debug, Clone, Copy)]
pub struct OccurrenceChain<'a> {
    pub level: &'a LegOccurrences,
    pub parent: Option<&'a OccurrenceChain<'a>>,
}

impl<'a> OccurrenceChain<'a> {
    pub fn root(level: &'a LegOccurrences) -> Self {
        OccurrenceChain {
            level,
            parent: None,
        }
    }

    pub fn push(&'a self, level: &'a LegOccurrences) -> OccurrenceChain<'a> {
        OccurrenceChain {
            level,
            parent: Some(self),
        }
    }

    /// Pattern node number at which the embedding of `occurrence_id`
    /// already maps onto database node `node`, or 0 if it does not.
    pub fn pattern_number_of(&self, mut occurrence_id: OccurrenceId, node: NodeId) -> u32 {
        let mut current = Some(self);
        while let Some(chain) = current {
            let Some(occ) = chain.level.elements.get(occurrence_id as usize) else {
                return 0;
            };
            if occ.to_node == node {
                return chain.level.number;
            }
            occurrence_id = occ.occurrence_id;
            current = chain.parent;
        }
        0
    }
}

/// Distinct graph ids of an occurrence list, in order.
pub fn distinct_tids<I: IntoIterator<Item = Tid>>(tids: I) -> Vec<Tid> {
    let mut out: Vec<Tid> = tids.into_iter().collect();
    out.sort_unstable();
    out.dedup();
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chain_walks_to_the_root() {
        let root = LegOccurrences {
            elements: vec![LegOccurrence::new(0, 0, 4, crate::types::NO_NODE)],
            number: 1,
            ..Default::default()
        };
        let second = LegOccurrences {
            elements: vec![LegOccurrence::new(0, 0, 5, 4)],
            number: 2,
            ..Default::default()
        };
        let chain = OccurrenceChain::root(&root);
        let chain2 = chain.push(&second);
        assert_eq!(chain2.pattern_number_of(0, 5), 2);
        assert_eq!(chain2.pattern_number_of(0, 4), 1);
        assert_eq!(chain2.pattern_number_of(0, 9), 0);
    }

    #[test]
    fn test_close_tuples_order_by_from_then_to_then_label() {
        let a = CloseTuple { from: 3, to: 1, label: 9 };
        let b = CloseTuple { from: 3, to: 2, label: 0 };
        let c = CloseTuple { from: 4, to: 1, label: 0 };
        let mut v = vec![c, b, a];
        v.sort();
        assert_eq!(v, vec![a, b, c]);
    }

    #[test]
    fn test_distinct_tids() {
        assert_eq!(distinct_tids(vec![3, 1, 1, 2, 3]), vec![1, 2, 3]);
    }
}
