//! # Database Process Locking
//!
//! Prevents two processes from opening the same ledger data directory.
//!
//! ## Modules
//!
//! - `flock`: `DatabaseLock` using fs2
//! - `security`: lock timeouts and holder diagnostics

mod flock;
mod security;
#[cfg(test)]
mod tests;

pub use flock::{DatabaseLock, LockError};
pub use security::DEFAULT_LOCK_TIMEOUT;
