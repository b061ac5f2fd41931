//! Canonical value types shared by every Tablestake crate.
//!
//! Anything that is hashed into an event id, written to the journal, or
//! compared as a caller identity lives here: account identifiers, token
//! amounts, timestamps, digests and the canonical JSON encoder.
//!
#![deny(missing_docs)]

/// Token quantities held in escrow.
pub mod amount;
/// Canonical JSON encoding for deterministic hashing.
pub mod canonicalizer;
/// Digest primitives.
pub mod digest;
/// Content-derived event identifiers.
pub mod event_id;
/// Account identifiers and timestamps.
pub mod identifiers;
/// Validation errors for canonical types.
pub mod validation;

pub use amount::Amount;
pub use canonicalizer::{CanonicalizationError, Canonicalizer};
pub use digest::{Digest, DigestAlg};
pub use event_id::{compute_event_id, verify_event_id, EventIdError};
pub use identifiers::{AccountId, Timestamp};
pub use validation::ValidationError;
