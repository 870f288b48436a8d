//! # Error Types
//!
//! Errors raised while validating shared configuration.

use thiserror::Error;

/// Run-mode configuration rejected before any store is touched.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// Backfill id is empty.
    #[error("Backfill id must not be empty")]
    EmptyBackfillId,

    /// Ending version lies before the starting version.
    #[error("Ending version {ending} is before starting version {starting}")]
    EndingBeforeStart { starting: u64, ending: u64 },

    /// Run-mode document could not be parsed.
    #[error("Invalid run mode: {0}")]
    Parse(String),
}
