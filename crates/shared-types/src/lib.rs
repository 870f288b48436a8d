//! # Shared Types Crate
//!
//! Value types shared by the ledger crates: transaction versions, chain ids,
//! batch metadata handed over by the ingestion loop, and the run-mode
//! configuration that decides which checkpoint a processor consults.
//!
//! ## Design Principles
//!
//! - **Single Source of Truth**: Types crossing crate boundaries live here.
//! - **Consumed, not owned**: Run-mode configuration is parsed by the host
//!   process; the ledger only reads it.

pub mod entities;
pub mod errors;
pub mod run_mode;

pub use entities::*;
pub use errors::*;
pub use run_mode::*;
