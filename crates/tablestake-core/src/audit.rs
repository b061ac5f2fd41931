//! Invariant checks over ledger state.

use tablestake_canonical::{AccountId, Amount};
use thiserror::Error;

use crate::ledger::LedgerState;
use crate::reservation::ReservationId;

/// First invariant found broken.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum InvariantViolation {
    /// Record ids are not exactly `1..=last_id`.
    #[error("reservation ids are not contiguous: expected {expected}, found {found}")]
    IdGap {
        /// Id that should be present next.
        expected: u64,
        /// Id actually present (0 when records run out).
        found: u64,
    },
    /// A record is stored under a key that differs from its own id.
    #[error("reservation stored under {key} carries id {id}")]
    KeyMismatch {
        /// Map key.
        key: ReservationId,
        /// Id in the record.
        id: ReservationId,
    },
    /// Owner index and records disagree.
    #[error("owner index for {owner} is inconsistent at reservation {id}")]
    IndexMismatch {
        /// Indexed owner.
        owner: AccountId,
        /// Offending id.
        id: ReservationId,
    },
    /// A cancelled reservation still holds a deposit.
    #[error("cancelled reservation {0} still holds a deposit")]
    CancelledHoldsDeposit(ReservationId),
    /// Escrowed deposits exceed what the custodian holds for the ledger.
    #[error("escrowed {escrowed} exceeds custodian balance {held}")]
    Undercollateralized {
        /// Sum of live deposits.
        escrowed: Amount,
        /// Custodian balance of the ledger account.
        held: Amount,
    },
}

/// Checks `state` against itself and against the custodian balance `held`.
pub fn audit_state(state: &LedgerState, held: Amount) -> Result<(), InvariantViolation> {
    let mut expected = 1u64;
    for (key, record) in &state.reservations {
        if *key != record.id {
            return Err(InvariantViolation::KeyMismatch {
                key: *key,
                id: record.id,
            });
        }
        if key.get() != expected {
            return Err(InvariantViolation::IdGap {
                expected,
                found: key.get(),
            });
        }
        if !record.is_active && !record.deposit_amount.is_zero() {
            return Err(InvariantViolation::CancelledHoldsDeposit(record.id));
        }
        expected += 1;
    }
    if expected - 1 != state.last_id {
        return Err(InvariantViolation::IdGap {
            expected: state.last_id,
            found: expected - 1,
        });
    }

    let mut indexed = 0usize;
    for (owner, ids) in &state.by_owner {
        let mut previous = ReservationId(0);
        for id in ids {
            let owned = state
                .reservations
                .get(id)
                .map(|r| r.owner == *owner)
                .unwrap_or(false);
            if !owned || *id <= previous {
                return Err(InvariantViolation::IndexMismatch {
                    owner: owner.clone(),
                    id: *id,
                });
            }
            previous = *id;
            indexed += 1;
        }
    }
    if indexed != state.reservations.len() {
        let orphan = state
            .reservations
            .values()
            .find(|r| !state.ids_for(&r.owner).contains(&r.id));
        if let Some(record) = orphan {
            return Err(InvariantViolation::IndexMismatch {
                owner: record.owner.clone(),
                id: record.id,
            });
        }
    }

    let escrowed = state.total_escrowed();
    if escrowed > held {
        return Err(InvariantViolation::Undercollateralized { escrowed, held });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reservation::Reservation;

    fn record(id: u64, owner: &str, deposit: u128, active: bool) -> Reservation {
        Reservation {
            id: ReservationId(id),
            owner: AccountId::parse(owner).unwrap(),
            venue_name: "Restaurant A".to_string(),
            date: 1_800_000_000,
            party_size: 2,
            deposit_amount: Amount::new(deposit),
            is_active: active,
            is_checked_in: false,
        }
    }

    fn state_of(records: Vec<Reservation>) -> LedgerState {
        let mut state = LedgerState::default();
        for r in records {
            state.insert(r);
        }
        state
    }

    #[test]
    fn empty_state_is_consistent() {
        assert!(audit_state(&LedgerState::default(), Amount::ZERO).is_ok());
    }

    #[test]
    fn consistent_state_passes() {
        let state = state_of(vec![
            record(1, "user:alice", 100, true),
            record(2, "user:bob", 0, false),
            record(3, "user:alice", 50, true),
        ]);
        assert!(audit_state(&state, Amount::new(150)).is_ok());
    }

    #[test]
    fn detects_undercollateralized_escrow() {
        let state = state_of(vec![record(1, "user:alice", 100, true)]);
        assert_eq!(
            audit_state(&state, Amount::new(99)),
            Err(InvariantViolation::Undercollateralized {
                escrowed: Amount::new(100),
                held: Amount::new(99),
            })
        );
    }

    #[test]
    fn detects_cancelled_deposit() {
        let state = state_of(vec![record(1, "user:alice", 100, false)]);
        assert_eq!(
            audit_state(&state, Amount::new(100)),
            Err(InvariantViolation::CancelledHoldsDeposit(ReservationId(1)))
        );
    }

    #[test]
    fn detects_id_gap() {
        let state = state_of(vec![record(1, "user:alice", 0, true), record(3, "user:alice", 0, true)]);
        assert_eq!(
            audit_state(&state, Amount::ZERO),
            Err(InvariantViolation::IdGap { expected: 2, found: 3 })
        );
    }

    #[test]
    fn detects_foreign_index_entry() {
        let mut state = state_of(vec![record(1, "user:alice", 0, true)]);
        state
            .by_owner
            .insert(AccountId::parse("user:mallory").unwrap(), vec![ReservationId(1)]);
        assert!(matches!(
            audit_state(&state, Amount::ZERO),
            Err(InvariantViolation::IndexMismatch { .. })
        ));
    }

    #[test]
    fn detects_unindexed_record() {
        let mut state = state_of(vec![record(1, "user:alice", 0, true)]);
        state.by_owner.clear();
        assert!(matches!(
            audit_state(&state, Amount::ZERO),
            Err(InvariantViolation::IndexMismatch { .. })
        ));
    }
}
