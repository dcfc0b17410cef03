// Copyright (C) 2025 Jeremy J. Carroll. See LICENSE for details.

//! Error types for loading, configuring and mining.

use crate::config::ConfigConflict;
use crate::types::OrigId;
use thiserror::Error;

/// Everything that can go wrong in a mining session.
#[derive(Debug, Error)]
pub enum MinerError {
    /// The settings contradict each other. All conflicts are reported at once.
    #[error("invalid configuration: {}", join_conflicts(.0))]
    Configuration(Vec<ConfigConflict>),

    /// A graph or activity record could not be parsed.
    #[error("input format error at line {line}: {message}")]
    InputFormat { line: usize, message: String },

    /// The significance filter is active but a graph has no activity value.
    #[error("graph {id} has no activity value")]
    MissingActivity { id: OrigId },

    /// Mining was requested for a root label that does not exist.
    #[error("unknown root node label {label} (only {available} labels known)")]
    UnknownRoot { label: usize, available: usize },

    /// A fixed-width counter or index would overflow.
    #[error("{what} exceeds the limit of {limit}")]
    ResourceLimitExceeded { what: &'static str, limit: usize },

    /// A structural assumption of the search was broken.
    #[error("internal invariant violated: {0}")]
    InternalInvariantViolation(String),

    /// The caller cancelled the search.
    #[error("mining was cancelled")]
    Cancelled,

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

fn join_conflicts(conflicts: &[ConfigConflict]) -> String {
    conflicts
        .iter()
        .map(|c| c.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

pub type Result<T> = std::result::Result<T, MinerError>;
