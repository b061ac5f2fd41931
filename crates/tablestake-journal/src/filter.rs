//! Envelope filtering for selective journal iteration.

use crate::errors::JournalError;
use crate::reader::EnvelopeSource;
use tablestake_canonical::AccountId;
use tablestake_core::{EventEnvelope, EventKind, LedgerEvent, ReservationId};

/// Predicate over envelopes.
pub trait EventFilter {
    /// Returns true if the envelope should be kept.
    fn matches(&self, envelope: &EventEnvelope) -> bool;
}

/// Envelopes belonging to one reservation.
#[derive(Debug, Clone)]
pub struct ReservationFilter {
    /// Reservation to match.
    pub reservation_id: ReservationId,
}

impl EventFilter for ReservationFilter {
    fn matches(&self, envelope: &EventEnvelope) -> bool {
        envelope.payload.reservation_id() == self.reservation_id
    }
}

/// Envelopes of one event kind.
#[derive(Debug, Clone)]
pub struct KindFilter {
    /// Kind to match.
    pub kind: EventKind,
}

impl EventFilter for KindFilter {
    fn matches(&self, envelope: &EventEnvelope) -> bool {
        envelope.payload.kind() == self.kind
    }
}

/// Envelopes an account took part in: as actor, owner, or payout recipient.
#[derive(Debug, Clone)]
pub struct AccountFilter {
    /// Account to match.
    pub account: AccountId,
}

impl EventFilter for AccountFilter {
    fn matches(&self, envelope: &EventEnvelope) -> bool {
        if envelope.actor == self.account {
            return true;
        }
        match &envelope.payload {
            LedgerEvent::ReservationCreated { owner, .. } => *owner == self.account,
            LedgerEvent::DepositWithdrawn { recipient, .. } => *recipient == self.account,
            _ => false,
        }
    }
}

/// All filters must match. An empty list matches everything.
#[derive(Default)]
pub struct AndFilter {
    /// Filters to combine.
    pub filters: Vec<Box<dyn EventFilter>>,
}

impl EventFilter for AndFilter {
    fn matches(&self, envelope: &EventEnvelope) -> bool {
        self.filters.iter().all(|f| f.matches(envelope))
    }
}

/// Source that only yields envelopes accepted by a filter.
pub struct FilteredReader<R: EnvelopeSource, F: EventFilter> {
    reader: R,
    filter: F,
}

impl<R: EnvelopeSource, F: EventFilter> FilteredReader<R, F> {
    /// Wraps `reader`.
    pub fn new(reader: R, filter: F) -> Self {
        Self { reader, filter }
    }
}

impl<R: EnvelopeSource, F: EventFilter> EnvelopeSource for FilteredReader<R, F> {
    fn next_envelope(&mut self) -> Result<Option<EventEnvelope>, JournalError> {
        loop {
            match self.reader.next_envelope()? {
                None => return Ok(None),
                Some(envelope) if self.filter.matches(&envelope) => return Ok(Some(envelope)),
                Some(_) => continue,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tablestake_canonical::Amount;
    use tablestake_core::{EmittedEvent, EventChain};

    fn account(raw: &str) -> AccountId {
        AccountId::parse(raw).unwrap()
    }

    fn sealed(actor: &str, event: LedgerEvent) -> EventEnvelope {
        EventChain::new(account("ledger:main"))
            .seal(EmittedEvent {
                actor: account(actor),
                at: 1_700_000_000,
                event,
            })
            .unwrap()
    }

    #[test]
    fn account_filter_matches_recipient() {
        let envelope = sealed(
            "user:alice",
            LedgerEvent::DepositWithdrawn {
                reservation_id: ReservationId(1),
                recipient: account("user:alice"),
                amount: Amount::new(100),
            },
        );
        let alice = AccountFilter {
            account: account("user:alice"),
        };
        let bob = AccountFilter {
            account: account("user:bob"),
        };
        assert!(alice.matches(&envelope));
        assert!(!bob.matches(&envelope));
    }

    #[test]
    fn and_filter_requires_all() {
        let envelope = sealed(
            "user:alice",
            LedgerEvent::CheckedIn {
                reservation_id: ReservationId(2),
            },
        );
        let both = AndFilter {
            filters: vec![
                Box::new(KindFilter {
                    kind: EventKind::CheckedIn,
                }),
                Box::new(ReservationFilter {
                    reservation_id: ReservationId(2),
                }),
            ],
        };
        assert!(both.matches(&envelope));

        let mismatched = AndFilter {
            filters: vec![
                Box::new(KindFilter {
                    kind: EventKind::CheckedIn,
                }),
                Box::new(ReservationFilter {
                    reservation_id: ReservationId(3),
                }),
            ],
        };
        assert!(!mismatched.matches(&envelope));
        assert!(AndFilter::default().matches(&envelope));
    }
}
