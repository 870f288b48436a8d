//! # Run Modes
//!
//! Which checkpoint a processor reads and advances depends on the mode it
//! runs in:
//!
//! | Mode | Reads | Writes |
//! |------|-------|--------|
//! | `default` | processor checkpoint | processor checkpoint |
//! | `backfill` | backfill checkpoint | backfill checkpoint |
//! | `testing` | nothing | nothing |
//!
//! The JSON form is internally tagged:
//!
//! ```json
//! { "type": "backfill", "backfill_id": "fix-42", "initial_starting_version": 0,
//!   "ending_version": 1000, "overwrite_checkpoint": false }
//! ```

use serde::{Deserialize, Serialize};

use crate::entities::Version;
use crate::errors::ConfigError;

/// Live processing from the last checkpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BootstrapConfig {
    /// Version to start from when no checkpoint exists yet.
    #[serde(default)]
    pub initial_starting_version: Version,
}

/// A named, bounded re-processing run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackfillConfig {
    /// Identifier of this backfill, unique per processor.
    pub backfill_id: String,
    /// Version the run starts from.
    #[serde(default)]
    pub initial_starting_version: Version,
    /// Last version to process (inclusive); unset runs until stopped.
    #[serde(default)]
    pub ending_version: Option<Version>,
    /// Discard prior progress for this backfill and start over.
    #[serde(default)]
    pub overwrite_checkpoint: bool,
}

/// Replay of a fixed range that never persists progress.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestingConfig {
    /// Version to start from, ignoring any checkpoint.
    pub override_starting_version: Version,
    /// Last version to process; defaults to the starting version.
    #[serde(default)]
    pub ending_version: Option<Version>,
}

/// Processor run mode.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RunMode {
    /// Live mode.
    Default(BootstrapConfig),
    /// Backfill mode.
    Backfill(BackfillConfig),
    /// Testing mode.
    Testing(TestingConfig),
}

impl Default for RunMode {
    fn default() -> Self {
        RunMode::Default(BootstrapConfig {
            initial_starting_version: 0,
        })
    }
}

impl RunMode {
    /// Parse a JSON run-mode document and validate it.
    pub fn from_json(data: &str) -> Result<Self, ConfigError> {
        let mode: RunMode =
            serde_json::from_str(data).map_err(|e| ConfigError::Parse(e.to_string()))?;
        mode.validate()?;
        Ok(mode)
    }

    /// Check internal consistency of the configured versions.
    pub fn validate(&self) -> Result<(), ConfigError> {
        match self {
            RunMode::Default(_) => Ok(()),
            RunMode::Backfill(config) => {
                if config.backfill_id.trim().is_empty() {
                    return Err(ConfigError::EmptyBackfillId);
                }
                check_order(config.initial_starting_version, config.ending_version)
            }
            RunMode::Testing(config) => {
                check_order(config.override_starting_version, config.ending_version)
            }
        }
    }

    /// Short label used in logs and metrics.
    pub fn label(&self) -> &'static str {
        match self {
            RunMode::Default(_) => "default",
            RunMode::Backfill(_) => "backfill",
            RunMode::Testing(_) => "testing",
        }
    }

    /// Whether this mode persists checkpoints at all.
    pub fn persists_checkpoints(&self) -> bool {
        !matches!(self, RunMode::Testing(_))
    }
}

fn check_order(starting: Version, ending: Option<Version>) -> Result<(), ConfigError> {
    match ending {
        Some(ending) if ending < starting => {
            Err(ConfigError::EndingBeforeStart { starting, ending })
        }
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_backfill() {
        let mode = RunMode::from_json(
            r#"{"type":"backfill","backfill_id":"fix-42","initial_starting_version":10,"ending_version":20}"#,
        )
        .unwrap();

        match mode {
            RunMode::Backfill(config) => {
                assert_eq!(config.backfill_id, "fix-42");
                assert_eq!(config.initial_starting_version, 10);
                assert_eq!(config.ending_version, Some(20));
                assert!(!config.overwrite_checkpoint);
            }
            other => panic!("Expected backfill, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_default_without_fields() {
        let mode = RunMode::from_json(r#"{"type":"default"}"#).unwrap();
        assert_eq!(mode, RunMode::default());
        assert!(mode.persists_checkpoints());
    }

    #[test]
    fn test_testing_never_persists() {
        let mode = RunMode::from_json(r#"{"type":"testing","override_starting_version":5}"#)
            .unwrap();
        assert!(!mode.persists_checkpoints());
        assert_eq!(mode.label(), "testing");
    }

    #[test]
    fn test_rejects_inverted_range() {
        let result = RunMode::from_json(
            r#"{"type":"backfill","backfill_id":"b","initial_starting_version":10,"ending_version":3}"#,
        );
        assert_eq!(
            result,
            Err(ConfigError::EndingBeforeStart {
                starting: 10,
                ending: 3
            })
        );
    }

    #[test]
    fn test_rejects_empty_backfill_id() {
        let result = RunMode::from_json(r#"{"type":"backfill","backfill_id":"  "}"#);
        assert_eq!(result, Err(ConfigError::EmptyBackfillId));
    }

    #[test]
    fn test_unknown_mode_is_parse_error() {
        let result = RunMode::from_json(r#"{"type":"bootstrap"}"#);
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }
}
