// Copyright (C) 2025 Jeremy J. Carroll. See LICENSE for details.

//! Backbone refinement class mining of significant subtrees and subgraphs
//! in databases of labeled graphs, typically molecules.
//!
//! # Architecture
//!
//! ## Tier 1: Database (immutable while mining)
//!
//! - [`database`]: graphs with dense internal labels, frequency-ranked
//!   edge labels and root occurrence lists, built by the GSP reader or the
//!   record API and finalized once before mining
//! - [`constraints`]: chi-square and Kolmogorov-Smirnov evaluation of a
//!   pattern's occurrence set, with its upper bound
//!
//! ## Tier 2: Search state (mutable, restored on backtrack)
//!
//! - [`graphstate`]: the pattern under construction and its canonical-form
//!   check for cyclic patterns
//! - [`occurrence`]: embedding lists of candidate legs and their joins
//! - [`context`]: everything a search frame mutates, plus cancellation
//!
//! # Search
//!
//! [`Miner::mine_root`] grows paths from one root label. Paths branch into
//! trees and, in graph mode, both receive cycle-closing edges. In backbone
//! mode only the most significant pattern of each backbone refinement
//! class is reported, and dynamic upper-bound pruning cuts every subtree
//! that cannot beat it.
//!
//! # References
//!
//! - Maunz, A., Helma, C., Kramer, S. (2009). "Large-scale graph mining
//!   using backbone refinement classes." KDD '09.
//! - Nijssen, S., Kok, J. N. (2004). "A quickstart in frequent structure
//!   mining can make a difference." KDD '04.

pub mod config;
pub mod constraints;
pub mod context;
pub mod database;
pub mod error;
pub mod graphstate;
pub mod miner;
pub mod occurrence;
pub mod output;
mod search;
pub mod state;
pub mod types;

// Re-export commonly used types
pub use config::{ConfigConflict, MinerConfig, OutputFormat, PatternKind, ValidatedConfig};
pub use context::CancellationToken;
pub use database::{Database, TreeRecord};
pub use error::{MinerError, Result};
pub use miner::Miner;
pub use output::{LineFormatter, MinedPattern, MiningEvent, PatternSink};
pub use state::statistics::{Counters, Statistics};
