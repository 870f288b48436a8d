//! Prometheus metrics for the checkpoint ledger.
//!
//! All metrics follow the naming convention: `ledger_<metric>_<unit>`

use lazy_static::lazy_static;
use prometheus::{Counter, CounterVec, Encoder, Opts, Registry, TextEncoder};

use crate::TelemetryError;

lazy_static! {
    /// Global metrics registry
    pub static ref REGISTRY: Registry = Registry::new();

    // =========================================================================
    // CHECKPOINT METRICS
    // =========================================================================

    /// Checkpoint rows advanced
    pub static ref CHECKPOINT_ADVANCES: CounterVec = CounterVec::new(
        Opts::new("ledger_checkpoint_advances_total", "Checkpoint rows advanced"),
        &["mode"]  // mode: default/backfill
    ).expect("metric creation failed");

    /// Backfill runs that reached their ending version
    pub static ref BACKFILLS_COMPLETED: Counter = Counter::new(
        "ledger_backfills_completed_total",
        "Backfill runs marked complete"
    ).expect("metric creation failed");

    /// Chain id checks
    pub static ref CHAIN_VERIFICATIONS: CounterVec = CounterVec::new(
        Opts::new("ledger_chain_verifications_total", "Chain id initialization and checks"),
        &["outcome"]  // outcome: initialized/verified/mismatch
    ).expect("metric creation failed");

    // =========================================================================
    // IDENTITY METRICS
    // =========================================================================

    /// Identity rows upserted
    pub static ref IDENTITY_ROWS_WRITTEN: CounterVec = CounterVec::new(
        Opts::new("ledger_identity_rows_written_total", "Identity link rows upserted"),
        &["table"]
    ).expect("metric creation failed");

    // =========================================================================
    // REPLAY METRICS
    // =========================================================================

    /// Writes ignored because the stored row was already at or past the version
    pub static ref STALE_WRITES_IGNORED: CounterVec = CounterVec::new(
        Opts::new("ledger_stale_writes_ignored_total", "Stale writes ignored as replays"),
        &["table"]
    ).expect("metric creation failed");
}

/// Register all metrics with the global registry.
///
/// Calling this more than once is harmless.
pub fn register_metrics() -> Result<(), TelemetryError> {
    let metrics: Vec<Box<dyn prometheus::core::Collector>> = vec![
        Box::new(CHECKPOINT_ADVANCES.clone()),
        Box::new(BACKFILLS_COMPLETED.clone()),
        Box::new(CHAIN_VERIFICATIONS.clone()),
        Box::new(IDENTITY_ROWS_WRITTEN.clone()),
        Box::new(STALE_WRITES_IGNORED.clone()),
    ];

    for metric in metrics {
        match REGISTRY.register(metric) {
            Ok(()) | Err(prometheus::Error::AlreadyReg) => {}
            Err(e) => return Err(TelemetryError::MetricsInit(e.to_string())),
        }
    }

    Ok(())
}

/// Encode all metrics as Prometheus text format.
pub fn encode_metrics() -> Result<String, TelemetryError> {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    encoder
        .encode(&metric_families, &mut buffer)
        .map_err(|e| TelemetryError::MetricsInit(e.to_string()))?;
    String::from_utf8(buffer).map_err(|e| TelemetryError::MetricsInit(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_twice() {
        register_metrics().unwrap();
        register_metrics().unwrap();
    }

    #[test]
    fn test_encode_contains_registered_counter() {
        register_metrics().unwrap();
        CHAIN_VERIFICATIONS.with_label_values(&["verified"]).inc();

        let text = encode_metrics().unwrap();
        assert!(text.contains("ledger_chain_verifications_total"));
    }

    #[test]
    fn test_stale_counter_by_table() {
        let before = STALE_WRITES_IGNORED
            .with_label_values(&["processor_checkpoint"])
            .get();
        STALE_WRITES_IGNORED
            .with_label_values(&["processor_checkpoint"])
            .inc();
        assert!(
            STALE_WRITES_IGNORED
                .with_label_values(&["processor_checkpoint"])
                .get()
                >= before + 1.0
        );
    }
}
