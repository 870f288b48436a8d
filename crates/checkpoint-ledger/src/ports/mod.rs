//! # Ports
//!
//! - `inbound`: the ledger API driven by the ingestion loop
//! - `outbound`: storage and infrastructure the ledger depends on

pub mod inbound;
pub mod outbound;
