// Copyright (C) 2025 Jeremy J. Carroll. See LICENSE for details.

//! Scalar types shared by the database, the occurrence lists and the search.
//!
//! Labels are dense internal ids assigned by the [`Database`](crate::database::Database).
//! Each type reserves its maximum value as a "none" marker.

/// Dense internal node label (order of first appearance in the input).
pub type NodeLabel = u16;
/// Internal edge label. Before finalization this indexes the raw edge label
/// table; afterwards it is the frequency rank of a frequent edge label.
pub type EdgeLabel = u16;
/// Node index inside one database graph or inside the current pattern.
pub type NodeId = u16;
/// Position of a graph in the database.
pub type Tid = u32;
/// Index into a parent occurrence list.
pub type OccurrenceId = u32;
/// Caller-supplied graph identifier.
pub type OrigId = u32;
/// Node label as it appears in the input (an atomic number for molecules).
pub type InputNodeLabel = u32;
/// Edge label as it appears in the input (a bond order for molecules).
pub type InputEdgeLabel = u32;
/// Weighted support.
pub type Frequency = f64;
/// Depth of a leg along the backbone of a pattern tree.
pub type Depth = u32;

pub const NO_TID: Tid = Tid::MAX;
pub const NO_NODE: NodeId = NodeId::MAX;
pub const NO_EDGE_LABEL: EdgeLabel = EdgeLabel::MAX;
pub const MAX_EDGE_LABEL: EdgeLabel = NO_EDGE_LABEL;
pub const NO_NODE_LABEL: NodeLabel = NodeLabel::MAX;
pub const NO_DEPTH: Depth = Depth::MAX;

/// Largest pattern (in nodes) the search will build before reporting a limit.
pub const MAX_PATTERN_SIZE: usize = NodeId::MAX as usize - 1;
