//! Reservation escrow state machine for Tablestake.
//!
//! A party reserves a slot at a venue by escrowing a refundable deposit in a
//! single fungible token. The deposit comes back on cancellation, or after a
//! verified check-in through an explicit withdrawal.
//!
//! This crate provides:
//! - [`ReservationLedger`]: the state machine and its five mutating operations
//! - [`EscrowCustodian`]: the minimal token contract the ledger moves value through
//! - [`LedgerEvent`] and [`EventChain`]: emitted transitions and their hash-linked envelopes
//! - [`Projection`]: rebuilds ledger state from events alone
//! - [`audit_state`]: invariant checks over live state
//!
//! Core invariants:
//! - Reservation ids start at 1 and strictly increase
//! - A deposit is paid out at most once; local state is zeroed before any payout transfer
//! - Escrowed deposits never exceed the ledger account's custodian balance
//! - Every operation either commits completely or leaves no trace
//!
#![deny(missing_docs)]

/// Invariant checks over ledger state.
pub mod audit;
/// Time sources.
pub mod clock;
/// Escrow token custodian contract and an in-memory implementation.
pub mod custodian;
/// Error types for ledger operations.
pub mod errors;
/// Ledger events and the hash-linked event chain.
pub mod events;
/// The reservation ledger state machine.
pub mod ledger;
/// Event-sourced reconstruction of ledger state.
pub mod projection;
/// Reservation records and identifiers.
pub mod reservation;

pub use audit::{audit_state, InvariantViolation};
pub use clock::{Clock, FixedClock, SystemClock};
pub use custodian::{CustodyError, EscrowCustodian, InMemoryToken};
pub use errors::{CoreError, ErrorKind, LedgerError};
pub use events::{EmittedEvent, EventChain, EventEnvelope, EventKind, LedgerEvent};
pub use ledger::{LedgerConfig, LedgerState, ReservationLedger};
pub use projection::{Projection, ProjectionError};
pub use reservation::{Reservation, ReservationId};
