use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tablestake_canonical::{compute_event_id, AccountId, Amount, Canonicalizer, Digest, Timestamp};

use crate::errors::CoreError;
use crate::reservation::ReservationId;

/// A committed ledger transition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event_type", rename_all = "snake_case")]
pub enum LedgerEvent {
    /// A reservation was created and its deposit escrowed.
    ReservationCreated {
        /// New reservation id.
        reservation_id: ReservationId,
        /// Creating account.
        owner: AccountId,
        /// Venue label.
        venue_name: String,
        /// Reserved time, unix seconds.
        date: i64,
        /// Number of guests.
        party_size: u32,
        /// Escrowed deposit.
        deposit_amount: Amount,
    },
    /// Date and party size were replaced.
    ReservationChanged {
        /// Reservation id.
        reservation_id: ReservationId,
        /// New reserved time, unix seconds.
        new_date: i64,
        /// New number of guests.
        new_party_size: u32,
    },
    /// The reservation was cancelled and its deposit refunded.
    ReservationCancelled {
        /// Reservation id.
        reservation_id: ReservationId,
        /// Amount returned to the owner.
        refunded: Amount,
    },
    /// The owner checked in.
    CheckedIn {
        /// Reservation id.
        reservation_id: ReservationId,
    },
    /// The deposit was withdrawn after check-in.
    DepositWithdrawn {
        /// Reservation id.
        reservation_id: ReservationId,
        /// Account that received the deposit.
        recipient: AccountId,
        /// Amount paid out.
        amount: Amount,
    },
}

impl LedgerEvent {
    /// Reservation this event belongs to.
    pub fn reservation_id(&self) -> ReservationId {
        match self {
            LedgerEvent::ReservationCreated { reservation_id, .. }
            | LedgerEvent::ReservationChanged { reservation_id, .. }
            | LedgerEvent::ReservationCancelled { reservation_id, .. }
            | LedgerEvent::CheckedIn { reservation_id }
            | LedgerEvent::DepositWithdrawn { reservation_id, .. } => *reservation_id,
        }
    }

    /// Event discriminant.
    pub fn kind(&self) -> EventKind {
        match self {
            LedgerEvent::ReservationCreated { .. } => EventKind::ReservationCreated,
            LedgerEvent::ReservationChanged { .. } => EventKind::ReservationChanged,
            LedgerEvent::ReservationCancelled { .. } => EventKind::ReservationCancelled,
            LedgerEvent::CheckedIn { .. } => EventKind::CheckedIn,
            LedgerEvent::DepositWithdrawn { .. } => EventKind::DepositWithdrawn,
        }
    }
}

/// Event discriminant, spelled as the serialized `event_type`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    /// `reservation_created`
    ReservationCreated,
    /// `reservation_changed`
    ReservationChanged,
    /// `reservation_cancelled`
    ReservationCancelled,
    /// `checked_in`
    CheckedIn,
    /// `deposit_withdrawn`
    DepositWithdrawn,
}

impl EventKind {
    /// Serialized name.
    pub fn as_str(self) -> &'static str {
        match self {
            EventKind::ReservationCreated => "reservation_created",
            EventKind::ReservationChanged => "reservation_changed",
            EventKind::ReservationCancelled => "reservation_cancelled",
            EventKind::CheckedIn => "checked_in",
            EventKind::DepositWithdrawn => "deposit_withdrawn",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EventKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "reservation_created" | "created" => Ok(EventKind::ReservationCreated),
            "reservation_changed" | "changed" => Ok(EventKind::ReservationChanged),
            "reservation_cancelled" | "cancelled" => Ok(EventKind::ReservationCancelled),
            "checked_in" => Ok(EventKind::CheckedIn),
            "deposit_withdrawn" | "withdrawn" => Ok(EventKind::DepositWithdrawn),
            other => Err(format!("unknown event kind: {}", other)),
        }
    }
}

/// An event as it leaves the ledger: who triggered it and when.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmittedEvent {
    /// Authenticated caller of the operation.
    pub actor: AccountId,
    /// Ledger clock at the time of the operation, unix seconds.
    pub at: i64,
    /// The transition.
    pub event: LedgerEvent,
}

/// Hash-linked, content-addressed wrapper around a ledger event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventEnvelope {
    /// `sha256(domain || canonical(envelope without event_id))`.
    pub event_id: Digest,
    /// Id of the preceding envelope; absent for the first one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prev_event_id: Option<Digest>,
    /// Position in the chain, starting at 1.
    pub sequence: u64,
    /// When the transition was committed.
    pub occurred_at: Timestamp,
    /// Ledger account that emitted the event.
    pub ledger: AccountId,
    /// Caller that triggered the transition.
    pub actor: AccountId,
    /// The transition itself.
    pub payload: LedgerEvent,
}

impl EventEnvelope {
    /// Recomputes the id and compares it with `event_id`.
    pub fn verify_id(&self, canonicalizer: &Canonicalizer) -> Result<bool, CoreError> {
        Ok(compute_event_id(self, canonicalizer)? == self.event_id)
    }
}

/// Seals emitted events into a hash-linked sequence of envelopes.
#[derive(Debug, Clone)]
pub struct EventChain {
    ledger: AccountId,
    canonicalizer: Canonicalizer,
    height: u64,
    tip: Option<Digest>,
}

impl EventChain {
    /// Starts an empty chain for `ledger`.
    pub fn new(ledger: AccountId) -> Self {
        Self::resume(ledger, 0, None)
    }

    /// Continues an existing chain whose last envelope has `height` and id `tip`.
    pub fn resume(ledger: AccountId, height: u64, tip: Option<Digest>) -> Self {
        Self {
            ledger,
            canonicalizer: Canonicalizer::new(),
            height,
            tip,
        }
    }

    /// Sequence number of the last sealed envelope (0 when empty).
    pub fn height(&self) -> u64 {
        self.height
    }

    /// Id of the last sealed envelope.
    pub fn tip(&self) -> Option<&Digest> {
        self.tip.as_ref()
    }

    /// Wraps `emitted` in the next envelope and advances the tip.
    pub fn seal(&mut self, emitted: EmittedEvent) -> Result<EventEnvelope, CoreError> {
        let mut envelope = EventEnvelope {
            event_id: Digest::sha256([b"".as_slice()]),
            prev_event_id: self.tip.clone(),
            sequence: self.height + 1,
            occurred_at: Timestamp::from_unix_seconds(emitted.at)?,
            ledger: self.ledger.clone(),
            actor: emitted.actor,
            payload: emitted.event,
        };
        envelope.event_id = compute_event_id(&envelope, &self.canonicalizer)?;

        self.height = envelope.sequence;
        self.tip = Some(envelope.event_id.clone());
        Ok(envelope)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn account(raw: &str) -> AccountId {
        AccountId::parse(raw).unwrap()
    }

    fn checked_in(id: u64) -> EmittedEvent {
        EmittedEvent {
            actor: account("user:alice"),
            at: 1_700_000_000,
            event: LedgerEvent::CheckedIn {
                reservation_id: ReservationId(id),
            },
        }
    }

    #[test]
    fn events_serialize_with_snake_case_tag() {
        let event = LedgerEvent::DepositWithdrawn {
            reservation_id: ReservationId(1),
            recipient: account("user:alice"),
            amount: Amount::new(100),
        };
        assert_eq!(
            serde_json::to_value(&event).unwrap(),
            json!({
                "event_type": "deposit_withdrawn",
                "reservation_id": 1,
                "recipient": "user:alice",
                "amount": "100"
            })
        );
    }

    #[test]
    fn event_kind_parses_short_and_long_names() {
        assert_eq!("cancelled".parse::<EventKind>().unwrap(), EventKind::ReservationCancelled);
        assert_eq!(
            "reservation_cancelled".parse::<EventKind>().unwrap(),
            EventKind::ReservationCancelled
        );
        assert!("refunded".parse::<EventKind>().is_err());
    }

    #[test]
    fn chain_links_envelopes() {
        let mut chain = EventChain::new(account("ledger:main"));
        let first = chain.seal(checked_in(1)).unwrap();
        let second = chain.seal(checked_in(2)).unwrap();

        assert_eq!(first.sequence, 1);
        assert!(first.prev_event_id.is_none());
        assert_eq!(second.sequence, 2);
        assert_eq!(second.prev_event_id.as_ref(), Some(&first.event_id));
        assert_eq!(chain.tip(), Some(&second.event_id));
        assert_eq!(chain.height(), 2);
    }

    #[test]
    fn sealed_envelope_verifies_and_detects_tampering() {
        let canonicalizer = Canonicalizer::new();
        let mut chain = EventChain::new(account("ledger:main"));
        let mut envelope = chain.seal(checked_in(1)).unwrap();
        assert!(envelope.verify_id(&canonicalizer).unwrap());

        envelope.payload = LedgerEvent::CheckedIn {
            reservation_id: ReservationId(9),
        };
        assert!(!envelope.verify_id(&canonicalizer).unwrap());
    }

    #[test]
    fn resumed_chain_matches_uninterrupted_chain() {
        let ledger = account("ledger:main");
        let mut straight = EventChain::new(ledger.clone());
        let first = straight.seal(checked_in(1)).unwrap();
        let second = straight.seal(checked_in(2)).unwrap();

        let mut resumed = EventChain::resume(ledger, first.sequence, Some(first.event_id));
        assert_eq!(resumed.tip(), second.prev_event_id.as_ref());
        assert_eq!(resumed.seal(checked_in(2)).unwrap(), second);
        assert_eq!(resumed.tip(), straight.tip());
        assert_eq!(resumed.height(), straight.height());
    }

    #[test]
    fn envelope_round_trips_through_json() {
        let mut chain = EventChain::new(account("ledger:main"));
        let envelope = chain.seal(checked_in(3)).unwrap();
        let json = serde_json::to_string(&envelope).unwrap();
        let restored: EventEnvelope = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, envelope);
    }
}
