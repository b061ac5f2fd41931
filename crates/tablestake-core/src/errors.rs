use crate::custodian::CustodyError;
use crate::reservation::ReservationId;
use tablestake_canonical::AccountId;
use thiserror::Error;

/// Failure classes for ledger operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Caller is not allowed to touch the reservation.
    Authorization,
    /// Operation is invalid for the reservation's current state.
    State,
    /// Arguments are out of range.
    Validation,
    /// The custodian could not move funds.
    Resource,
}

/// Rejections returned by [`ReservationLedger`](crate::ReservationLedger).
///
/// A rejected operation leaves ledger state, custodian balances and the
/// event outbox exactly as they were.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LedgerError {
    /// Caller does not own the reservation.
    #[error("{caller} is not the owner of reservation {id}")]
    NotOwner {
        /// Reservation id.
        id: ReservationId,
        /// Rejected caller.
        caller: AccountId,
    },
    /// The escrow account cannot hold reservations against itself.
    #[error("{0} holds the escrow and cannot create reservations")]
    EscrowAccountCaller(AccountId),
    /// No reservation with this id was ever created.
    #[error("reservation {0} not found")]
    NotFound(ReservationId),
    /// Reservation has been cancelled.
    #[error("reservation {0} is not active")]
    NotActive(ReservationId),
    /// Reservation is already checked in.
    #[error("reservation {0} is already checked in")]
    AlreadyCheckedIn(ReservationId),
    /// Withdrawal attempted before check-in.
    #[error("reservation {0} is not checked in")]
    NotCheckedIn(ReservationId),
    /// Deposit has already been paid out.
    #[error("reservation {0} has nothing to withdraw")]
    NothingToWithdraw(ReservationId),
    /// The counter cannot allocate another id.
    #[error("reservation id space exhausted")]
    IdSpaceExhausted,
    /// Date is not strictly after the current time.
    #[error("reservation date must be in the future (date {date}, now {now})")]
    InvalidDate {
        /// Requested date, unix seconds.
        date: i64,
        /// Current time, unix seconds.
        now: i64,
    },
    /// Party size is zero.
    #[error("party size must be positive")]
    InvalidPartySize,
    /// The custodian rejected the transfer.
    #[error("escrow transfer failed: {0}")]
    Custody(#[from] CustodyError),
}

impl LedgerError {
    /// Classifies the rejection.
    pub fn kind(&self) -> ErrorKind {
        match self {
            LedgerError::NotOwner { .. } | LedgerError::EscrowAccountCaller(_) => {
                ErrorKind::Authorization
            }
            LedgerError::NotFound(_)
            | LedgerError::NotActive(_)
            | LedgerError::AlreadyCheckedIn(_)
            | LedgerError::NotCheckedIn(_)
            | LedgerError::NothingToWithdraw(_)
            | LedgerError::IdSpaceExhausted => ErrorKind::State,
            LedgerError::InvalidDate { .. } | LedgerError::InvalidPartySize => {
                ErrorKind::Validation
            }
            LedgerError::Custody(_) => ErrorKind::Resource,
        }
    }
}

/// Errors raised while sealing or checking events.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Event id computation failed.
    #[error("event ID computation failed: {0}")]
    EventId(#[from] tablestake_canonical::EventIdError),
    /// A value could not be represented canonically.
    #[error("invalid value: {0}")]
    Validation(#[from] tablestake_canonical::ValidationError),
}
