//! # ttlkv
//!
//! An in-memory key-value store with per-entry TTL expiration:
//! - Point lookups that treat expired entries as absent (lazy expiration)
//! - Lexicographically ordered range scans over live keys
//! - Incremental reclamation of expired entries, one key per call
//! - Injected clock for deterministic time in tests
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                         TtlStore                            │
//! │                                                             │
//! │  ┌───────────────┐   ┌───────────────┐   ┌──────────────┐   │
//! │  │  Value Index  │   │  Expiration   │   │  Key Order   │   │
//! │  │   (HashMap)   │   │   Schedule    │   │  (BTreeSet)  │   │
//! │  │  key → entry  │   │  (BTreeMap)   │   │ sorted keys  │   │
//! │  └───────────────┘   │ when → {keys} │   └──────────────┘   │
//! │                      └───────────────┘                      │
//! └───────────────────────────┬─────────────────────────────────┘
//!                             │
//!                      ┌──────▼──────┐
//!                      │    Clock    │
//!                      │ (injected)  │
//!                      └─────────────┘
//! ```
//!
//! The three indexes cover one logical key space and stay mutually
//! consistent across every mutation. Reads never delete; an external
//! caller drives physical deletion of expired entries through
//! [`TtlStore::reclaim_one_expired`].

// =============================================================================
// Module Declarations
// =============================================================================

pub mod clock;
pub mod store;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use clock::{Clock, ManualClock, SystemClock};
pub use store::{Entry, TtlStore};

// =============================================================================
// Version Info
// =============================================================================

/// Current version of ttlkv
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
