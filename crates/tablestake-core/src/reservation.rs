use serde::{Deserialize, Serialize};
use std::fmt;
use tablestake_canonical::{AccountId, Amount};

/// Reservation identifier; the first reservation is `1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ReservationId(pub u64);

impl ReservationId {
    /// Returns the raw counter value.
    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ReservationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A reservation record.
///
/// Records are never deleted; cancelled and withdrawn reservations stay
/// queryable with `deposit_amount == 0`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reservation {
    /// Reservation id.
    pub id: ReservationId,
    /// Account that created the reservation and the only one allowed to mutate it.
    pub owner: AccountId,
    /// Opaque venue label.
    pub venue_name: String,
    /// Reserved time, unix seconds.
    pub date: i64,
    /// Number of guests.
    pub party_size: u32,
    /// Deposit currently escrowed for this reservation.
    pub deposit_amount: Amount,
    /// False once cancelled.
    pub is_active: bool,
    /// True once the owner has checked in.
    pub is_checked_in: bool,
}

impl Reservation {
    /// True when a withdrawal would pay out.
    pub fn is_withdrawable(&self) -> bool {
        self.is_checked_in && !self.deposit_amount.is_zero()
    }
}
