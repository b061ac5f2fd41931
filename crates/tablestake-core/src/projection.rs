//! Rebuilds ledger state from its event history.
//!
//! Events carry every field a record holds, so folding a complete history
//! must reproduce the ledger's live [`LedgerState`] exactly.

use tablestake_canonical::Amount;
use thiserror::Error;

use crate::events::LedgerEvent;
use crate::ledger::LedgerState;
use crate::reservation::{Reservation, ReservationId};

/// Event that cannot follow the history applied so far.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProjectionError {
    /// A creation event skipped or repeated an id.
    #[error("creation out of order: expected reservation {expected}, got {found}")]
    OutOfOrder {
        /// Next id the history allows.
        expected: ReservationId,
        /// Id in the event.
        found: ReservationId,
    },
    /// Event references a reservation that was never created.
    #[error("event references unknown reservation {0}")]
    UnknownReservation(ReservationId),
}

/// Event-sourced ledger state.
#[derive(Debug, Clone, Default)]
pub struct Projection {
    state: LedgerState,
    applied: u64,
}

impl Projection {
    /// Starts from an empty ledger.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of events applied.
    pub fn applied(&self) -> u64 {
        self.applied
    }

    /// State rebuilt so far.
    pub fn state(&self) -> &LedgerState {
        &self.state
    }

    /// Consumes the projection.
    pub fn into_state(self) -> LedgerState {
        self.state
    }

    /// Folds one event into the state.
    pub fn apply(&mut self, event: &LedgerEvent) -> Result<(), ProjectionError> {
        match event {
            LedgerEvent::ReservationCreated {
                reservation_id,
                owner,
                venue_name,
                date,
                party_size,
                deposit_amount,
            } => {
                let expected = ReservationId(self.state.last_id() + 1);
                if *reservation_id != expected {
                    return Err(ProjectionError::OutOfOrder {
                        expected,
                        found: *reservation_id,
                    });
                }
                self.state.insert(Reservation {
                    id: *reservation_id,
                    owner: owner.clone(),
                    venue_name: venue_name.clone(),
                    date: *date,
                    party_size: *party_size,
                    deposit_amount: *deposit_amount,
                    is_active: true,
                    is_checked_in: false,
                });
            }
            LedgerEvent::ReservationChanged {
                reservation_id,
                new_date,
                new_party_size,
            } => {
                let record = self.record_mut(*reservation_id)?;
                record.date = *new_date;
                record.party_size = *new_party_size;
            }
            LedgerEvent::ReservationCancelled { reservation_id, .. } => {
                let record = self.record_mut(*reservation_id)?;
                record.is_active = false;
                record.deposit_amount = Amount::ZERO;
            }
            LedgerEvent::CheckedIn { reservation_id } => {
                self.record_mut(*reservation_id)?.is_checked_in = true;
            }
            LedgerEvent::DepositWithdrawn { reservation_id, .. } => {
                self.record_mut(*reservation_id)?.deposit_amount = Amount::ZERO;
            }
        }
        self.applied += 1;
        Ok(())
    }

    fn record_mut(&mut self, id: ReservationId) -> Result<&mut Reservation, ProjectionError> {
        self.state
            .reservations
            .get_mut(&id)
            .ok_or(ProjectionError::UnknownReservation(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tablestake_canonical::AccountId;

    fn created(id: u64) -> LedgerEvent {
        LedgerEvent::ReservationCreated {
            reservation_id: ReservationId(id),
            owner: AccountId::parse("user:alice").unwrap(),
            venue_name: "Restaurant A".to_string(),
            date: 1_800_000_000,
            party_size: 2,
            deposit_amount: Amount::new(100),
        }
    }

    #[test]
    fn rejects_skipped_creation() {
        let mut projection = Projection::new();
        assert_eq!(
            projection.apply(&created(2)),
            Err(ProjectionError::OutOfOrder {
                expected: ReservationId(1),
                found: ReservationId(2),
            })
        );
    }

    #[test]
    fn rejects_event_for_unknown_reservation() {
        let mut projection = Projection::new();
        projection.apply(&created(1)).unwrap();
        assert_eq!(
            projection.apply(&LedgerEvent::CheckedIn {
                reservation_id: ReservationId(7)
            }),
            Err(ProjectionError::UnknownReservation(ReservationId(7)))
        );
        assert_eq!(projection.applied(), 1);
    }

    #[test]
    fn cancellation_zeroes_deposit() {
        let mut projection = Projection::new();
        projection.apply(&created(1)).unwrap();
        projection
            .apply(&LedgerEvent::ReservationCancelled {
                reservation_id: ReservationId(1),
                refunded: Amount::new(100),
            })
            .unwrap();
        let record = projection.state().get(ReservationId(1)).unwrap();
        assert!(!record.is_active);
        assert_eq!(record.deposit_amount, Amount::ZERO);
    }
}
