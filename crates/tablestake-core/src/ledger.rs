//! The reservation ledger state machine.
//!
//! Every mutating operation follows the same order: authorize and validate,
//! write local state (zeroing any deposit that is about to leave), call the
//! custodian, then emit the event. A custodian failure restores the record
//! that was written before the call.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tablestake_canonical::{AccountId, Amount};
use tracing::{debug, info};

use crate::audit::{audit_state, InvariantViolation};
use crate::clock::{Clock, SystemClock};
use crate::custodian::EscrowCustodian;
use crate::errors::LedgerError;
use crate::events::{EmittedEvent, LedgerEvent};
use crate::reservation::{Reservation, ReservationId};

/// Deployment parameters of a ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerConfig {
    /// Custodian account that holds escrowed deposits.
    pub ledger_account: AccountId,
    /// Symbol of the single escrow asset.
    pub token_symbol: String,
}

/// Persistent ledger state: id counter, records, and per-owner index.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerState {
    pub(crate) last_id: u64,
    pub(crate) reservations: BTreeMap<ReservationId, Reservation>,
    pub(crate) by_owner: BTreeMap<AccountId, Vec<ReservationId>>,
}

impl LedgerState {
    /// Highest id allocated so far (0 when empty).
    pub fn last_id(&self) -> u64 {
        self.last_id
    }

    /// All records in id order.
    pub fn reservations(&self) -> impl Iterator<Item = &Reservation> {
        self.reservations.values()
    }

    /// Record by id.
    pub fn get(&self, id: ReservationId) -> Option<&Reservation> {
        self.reservations.get(&id)
    }

    /// Ids created by `owner`, in creation order.
    pub fn ids_for(&self, owner: &AccountId) -> &[ReservationId] {
        self.by_owner.get(owner).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Sum of deposits still escrowed.
    pub fn total_escrowed(&self) -> Amount {
        self.reservations.values().map(|r| r.deposit_amount).sum()
    }

    pub(crate) fn insert(&mut self, record: Reservation) {
        self.last_id = record.id.get();
        self.by_owner
            .entry(record.owner.clone())
            .or_default()
            .push(record.id);
        self.reservations.insert(record.id, record);
    }
}

/// Deposit-backed reservation ledger.
///
/// Generic over the escrow custodian `C` and the time source `K`. Callers
/// are identified by the host and passed explicitly to every operation.
pub struct ReservationLedger<C, K = SystemClock> {
    config: LedgerConfig,
    state: LedgerState,
    custodian: C,
    clock: K,
    outbox: Vec<EmittedEvent>,
}

impl<C: EscrowCustodian, K: Clock> ReservationLedger<C, K> {
    /// Creates an empty ledger.
    pub fn new(config: LedgerConfig, custodian: C, clock: K) -> Self {
        Self::from_parts(config, LedgerState::default(), custodian, clock)
    }

    /// Reassembles a ledger from persisted state.
    pub fn from_parts(config: LedgerConfig, state: LedgerState, custodian: C, clock: K) -> Self {
        Self {
            config,
            state,
            custodian,
            clock,
            outbox: Vec::new(),
        }
    }

    /// Splits the ledger back into its persistable parts. Undrained events are dropped.
    pub fn into_parts(self) -> (LedgerConfig, LedgerState, C) {
        (self.config, self.state, self.custodian)
    }

    /// Deployment parameters.
    pub fn config(&self) -> &LedgerConfig {
        &self.config
    }

    /// Custodian account holding escrowed deposits.
    pub fn ledger_account(&self) -> &AccountId {
        &self.config.ledger_account
    }

    /// Current state.
    pub fn state(&self) -> &LedgerState {
        &self.state
    }

    /// The escrow custodian.
    pub fn custodian(&self) -> &C {
        &self.custodian
    }

    /// Mutable custodian access for the host (funding, approvals).
    pub fn custodian_mut(&mut self) -> &mut C {
        &mut self.custodian
    }

    /// The time source.
    pub fn clock(&self) -> &K {
        &self.clock
    }

    /// Number of reservations ever created.
    pub fn reservation_count(&self) -> u64 {
        self.state.last_id
    }

    /// Sum of deposits still escrowed.
    pub fn total_escrowed(&self) -> Amount {
        self.state.total_escrowed()
    }

    /// Drains events emitted since the previous call, oldest first.
    pub fn take_events(&mut self) -> Vec<EmittedEvent> {
        std::mem::take(&mut self.outbox)
    }

    /// Checks the ledger invariants against live state and custodian balance.
    pub fn audit(&self) -> Result<(), InvariantViolation> {
        let held = self.custodian.balance_of(&self.config.ledger_account);
        audit_state(&self.state, held)
    }

    /// Reservation by id.
    pub fn get_reservation(&self, id: ReservationId) -> Result<&Reservation, LedgerError> {
        self.state.get(id).ok_or(LedgerError::NotFound(id))
    }

    /// Ids created by `account`, in creation order.
    pub fn get_user_reservations(&self, account: &AccountId) -> Vec<ReservationId> {
        self.state.ids_for(account).to_vec()
    }

    /// Escrows `deposit_amount` from `caller` and records a new reservation.
    pub fn create_reservation(
        &mut self,
        caller: &AccountId,
        venue_name: impl Into<String>,
        date: i64,
        party_size: u32,
        deposit_amount: Amount,
    ) -> Result<ReservationId, LedgerError> {
        let venue_name = venue_name.into();
        self.create_inner(caller, venue_name, date, party_size, deposit_amount)
            .inspect_err(|err| debug!(op = "create", %caller, error = %err, "rejected"))
    }

    /// Replaces date and party size of an active reservation.
    pub fn change_reservation(
        &mut self,
        caller: &AccountId,
        id: ReservationId,
        new_date: i64,
        new_party_size: u32,
    ) -> Result<(), LedgerError> {
        self.change_inner(caller, id, new_date, new_party_size)
            .inspect_err(|err| debug!(op = "change", %caller, %id, error = %err, "rejected"))
    }

    /// Cancels an active, not-yet-checked-in reservation and refunds its deposit.
    pub fn cancel_reservation(
        &mut self,
        caller: &AccountId,
        id: ReservationId,
    ) -> Result<(), LedgerError> {
        self.cancel_inner(caller, id)
            .inspect_err(|err| debug!(op = "cancel", %caller, %id, error = %err, "rejected"))
    }

    /// Marks an active reservation as honored. Moves no funds.
    pub fn check_in(&mut self, caller: &AccountId, id: ReservationId) -> Result<(), LedgerError> {
        self.check_in_inner(caller, id)
            .inspect_err(|err| debug!(op = "check_in", %caller, %id, error = %err, "rejected"))
    }

    /// Pays the deposit of a checked-in reservation back to its owner.
    pub fn withdraw(&mut self, caller: &AccountId, id: ReservationId) -> Result<Amount, LedgerError> {
        self.withdraw_inner(caller, id)
            .inspect_err(|err| debug!(op = "withdraw", %caller, %id, error = %err, "rejected"))
    }

    fn create_inner(
        &mut self,
        caller: &AccountId,
        venue_name: String,
        date: i64,
        party_size: u32,
        deposit_amount: Amount,
    ) -> Result<ReservationId, LedgerError> {
        if *caller == self.config.ledger_account {
            return Err(LedgerError::EscrowAccountCaller(caller.clone()));
        }
        let now = self.clock.now();
        validate_schedule(date, party_size, now)?;
        let id = self
            .state
            .last_id
            .checked_add(1)
            .map(ReservationId)
            .ok_or(LedgerError::IdSpaceExhausted)?;

        let ledger = self.config.ledger_account.clone();
        self.custodian
            .transfer_from(&ledger, caller, &ledger, deposit_amount)?;

        self.state.insert(Reservation {
            id,
            owner: caller.clone(),
            venue_name: venue_name.clone(),
            date,
            party_size,
            deposit_amount,
            is_active: true,
            is_checked_in: false,
        });
        info!(%id, owner = %caller, deposit = %deposit_amount, "reservation created");
        self.emit(
            caller,
            now,
            LedgerEvent::ReservationCreated {
                reservation_id: id,
                owner: caller.clone(),
                venue_name,
                date,
                party_size,
                deposit_amount,
            },
        );
        Ok(id)
    }

    fn change_inner(
        &mut self,
        caller: &AccountId,
        id: ReservationId,
        new_date: i64,
        new_party_size: u32,
    ) -> Result<(), LedgerError> {
        let now = self.clock.now();
        let record = self.authorize(caller, id)?;
        if !record.is_active {
            return Err(LedgerError::NotActive(id));
        }
        validate_schedule(new_date, new_party_size, now)?;

        let mut updated = record.clone();
        updated.date = new_date;
        updated.party_size = new_party_size;
        self.state.reservations.insert(id, updated);

        info!(%id, new_date, new_party_size, "reservation changed");
        self.emit(
            caller,
            now,
            LedgerEvent::ReservationChanged {
                reservation_id: id,
                new_date,
                new_party_size,
            },
        );
        Ok(())
    }

    fn cancel_inner(&mut self, caller: &AccountId, id: ReservationId) -> Result<(), LedgerError> {
        let now = self.clock.now();
        let record = self.authorize(caller, id)?;
        if !record.is_active {
            return Err(LedgerError::NotActive(id));
        }
        if record.is_checked_in {
            return Err(LedgerError::AlreadyCheckedIn(id));
        }

        let before = record.clone();
        let refund = before.deposit_amount;
        let mut after = before.clone();
        after.is_active = false;
        after.deposit_amount = Amount::ZERO;
        self.pay_out(before, after, caller, refund)?;

        info!(%id, refunded = %refund, "reservation cancelled");
        self.emit(
            caller,
            now,
            LedgerEvent::ReservationCancelled {
                reservation_id: id,
                refunded: refund,
            },
        );
        Ok(())
    }

    fn check_in_inner(&mut self, caller: &AccountId, id: ReservationId) -> Result<(), LedgerError> {
        let now = self.clock.now();
        let record = self.authorize(caller, id)?;
        if !record.is_active {
            return Err(LedgerError::NotActive(id));
        }
        if record.is_checked_in {
            return Err(LedgerError::AlreadyCheckedIn(id));
        }

        let mut updated = record.clone();
        updated.is_checked_in = true;
        self.state.reservations.insert(id, updated);

        info!(%id, "checked in");
        self.emit(caller, now, LedgerEvent::CheckedIn { reservation_id: id });
        Ok(())
    }

    fn withdraw_inner(&mut self, caller: &AccountId, id: ReservationId) -> Result<Amount, LedgerError> {
        let now = self.clock.now();
        let record = self.authorize(caller, id)?;
        if !record.is_checked_in {
            return Err(LedgerError::NotCheckedIn(id));
        }
        if record.deposit_amount.is_zero() {
            return Err(LedgerError::NothingToWithdraw(id));
        }

        let before = record.clone();
        let amount = before.deposit_amount;
        let mut after = before.clone();
        after.deposit_amount = Amount::ZERO;
        self.pay_out(before, after, caller, amount)?;

        info!(%id, recipient = %caller, %amount, "deposit withdrawn");
        self.emit(
            caller,
            now,
            LedgerEvent::DepositWithdrawn {
                reservation_id: id,
                recipient: caller.clone(),
                amount,
            },
        );
        Ok(amount)
    }

    fn authorize(&self, caller: &AccountId, id: ReservationId) -> Result<&Reservation, LedgerError> {
        let record = self.get_reservation(id)?;
        if record.owner != *caller {
            return Err(LedgerError::NotOwner {
                id,
                caller: caller.clone(),
            });
        }
        Ok(record)
    }

    /// Commits `after` before the custodian call; puts `before` back if the transfer fails.
    fn pay_out(
        &mut self,
        before: Reservation,
        after: Reservation,
        recipient: &AccountId,
        amount: Amount,
    ) -> Result<(), LedgerError> {
        let id = after.id;
        self.state.reservations.insert(id, after);
        let ledger = self.config.ledger_account.clone();
        if let Err(err) = self.custodian.transfer(&ledger, recipient, amount) {
            self.state.reservations.insert(id, before);
            return Err(err.into());
        }
        Ok(())
    }

    fn emit(&mut self, actor: &AccountId, at: i64, event: LedgerEvent) {
        self.outbox.push(EmittedEvent {
            actor: actor.clone(),
            at,
            event,
        });
    }
}

fn validate_schedule(date: i64, party_size: u32, now: i64) -> Result<(), LedgerError> {
    if date <= now {
        return Err(LedgerError::InvalidDate { date, now });
    }
    if party_size == 0 {
        return Err(LedgerError::InvalidPartySize);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use crate::custodian::{CustodyError, InMemoryToken};
    use crate::errors::ErrorKind;

    const NOW: i64 = 1_700_000_000;
    const DAY: i64 = 86_400;

    fn account(raw: &str) -> AccountId {
        AccountId::parse(raw).unwrap()
    }

    fn ledger_with_funded(user: &AccountId, funds: u128) -> ReservationLedger<InMemoryToken, FixedClock> {
        let config = LedgerConfig {
            ledger_account: account("ledger:main"),
            token_symbol: "mUSDC".to_string(),
        };
        let mut token = InMemoryToken::new("mUSDC");
        token.mint(user, Amount::new(funds)).unwrap();
        token.approve(user, &config.ledger_account, Amount::new(funds));
        ReservationLedger::new(config, token, FixedClock::at(NOW))
    }

    /// Custodian that accepts deposits but refuses every payout.
    struct FrozenPayouts(InMemoryToken);

    impl EscrowCustodian for FrozenPayouts {
        fn balance_of(&self, account: &AccountId) -> Amount {
            self.0.balance_of(account)
        }

        fn transfer_from(
            &mut self,
            spender: &AccountId,
            from: &AccountId,
            to: &AccountId,
            amount: Amount,
        ) -> Result<(), CustodyError> {
            self.0.transfer_from(spender, from, to, amount)
        }

        fn transfer(&mut self, from: &AccountId, _to: &AccountId, amount: Amount) -> Result<(), CustodyError> {
            Err(CustodyError::InsufficientBalance {
                account: from.clone(),
                available: Amount::ZERO,
                required: amount,
            })
        }
    }

    #[test]
    fn ids_start_at_one_and_increase() {
        let alice = account("user:alice");
        let mut ledger = ledger_with_funded(&alice, 1_000);
        let first = ledger
            .create_reservation(&alice, "Restaurant A", NOW + DAY, 2, Amount::new(100))
            .unwrap();
        let second = ledger
            .create_reservation(&alice, "Restaurant B", NOW + DAY, 2, Amount::new(100))
            .unwrap();
        assert_eq!(first, ReservationId(1));
        assert_eq!(second, ReservationId(2));
        assert_eq!(ledger.reservation_count(), 2);
    }

    #[test]
    fn date_equal_to_now_is_rejected() {
        let alice = account("user:alice");
        let mut ledger = ledger_with_funded(&alice, 1_000);
        let err = ledger
            .create_reservation(&alice, "Restaurant A", NOW, 2, Amount::new(100))
            .unwrap_err();
        assert_eq!(err, LedgerError::InvalidDate { date: NOW, now: NOW });
        assert_eq!(err.kind(), ErrorKind::Validation);
    }

    #[test]
    fn zero_party_size_is_rejected() {
        let alice = account("user:alice");
        let mut ledger = ledger_with_funded(&alice, 1_000);
        let err = ledger
            .create_reservation(&alice, "Restaurant A", NOW + DAY, 0, Amount::new(100))
            .unwrap_err();
        assert_eq!(err, LedgerError::InvalidPartySize);
    }

    #[test]
    fn failed_pull_consumes_no_id() {
        let alice = account("user:alice");
        let mut ledger = ledger_with_funded(&alice, 50);
        let err = ledger
            .create_reservation(&alice, "Restaurant A", NOW + DAY, 2, Amount::new(100))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Resource);
        assert_eq!(ledger.reservation_count(), 0);
        assert!(ledger.take_events().is_empty());

        let id = ledger
            .create_reservation(&alice, "Restaurant A", NOW + DAY, 2, Amount::new(50))
            .unwrap();
        assert_eq!(id, ReservationId(1));
    }

    #[test]
    fn cancel_rolls_back_when_refund_fails() {
        let alice = account("user:alice");
        let ReservationLedger { config, custodian, clock, .. } = ledger_with_funded(&alice, 1_000);
        let mut ledger = ReservationLedger::new(config, FrozenPayouts(custodian), clock);
        let id = ledger
            .create_reservation(&alice, "Restaurant A", NOW + DAY, 2, Amount::new(100))
            .unwrap();
        ledger.take_events();

        let err = ledger.cancel_reservation(&alice, id).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Resource);

        let record = ledger.get_reservation(id).unwrap();
        assert!(record.is_active);
        assert_eq!(record.deposit_amount, Amount::new(100));
        assert!(ledger.take_events().is_empty());
        assert!(ledger.audit().is_ok());
    }

    #[test]
    fn withdraw_rolls_back_when_payout_fails() {
        let alice = account("user:alice");
        let ReservationLedger { config, custodian, clock, .. } = ledger_with_funded(&alice, 1_000);
        let mut ledger = ReservationLedger::new(config, FrozenPayouts(custodian), clock);
        let id = ledger
            .create_reservation(&alice, "Restaurant A", NOW + DAY, 2, Amount::new(100))
            .unwrap();
        ledger.check_in(&alice, id).unwrap();

        assert!(ledger.withdraw(&alice, id).is_err());
        assert_eq!(ledger.get_reservation(id).unwrap().deposit_amount, Amount::new(100));
    }

    #[test]
    fn cancel_after_check_in_is_rejected() {
        let alice = account("user:alice");
        let mut ledger = ledger_with_funded(&alice, 1_000);
        let id = ledger
            .create_reservation(&alice, "Restaurant A", NOW + DAY, 2, Amount::new(100))
            .unwrap();
        ledger.check_in(&alice, id).unwrap();

        assert_eq!(
            ledger.cancel_reservation(&alice, id),
            Err(LedgerError::AlreadyCheckedIn(id))
        );
        assert_eq!(ledger.total_escrowed(), Amount::new(100));
    }

    #[test]
    fn events_carry_actor_and_clock_time() {
        let alice = account("user:alice");
        let mut ledger = ledger_with_funded(&alice, 1_000);
        let id = ledger
            .create_reservation(&alice, "Restaurant A", NOW + DAY, 2, Amount::new(100))
            .unwrap();
        ledger.clock().advance(60);
        ledger.check_in(&alice, id).unwrap();

        let events = ledger.take_events();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].at, NOW);
        assert_eq!(events[1].at, NOW + 60);
        assert!(events.iter().all(|e| e.actor == alice));
        assert!(ledger.take_events().is_empty());
    }

    #[test]
    fn state_round_trips_through_json() {
        let alice = account("user:alice");
        let mut ledger = ledger_with_funded(&alice, 1_000);
        ledger
            .create_reservation(&alice, "Restaurant A", NOW + DAY, 2, Amount::new(100))
            .unwrap();

        let json = serde_json::to_string(ledger.state()).unwrap();
        let restored: LedgerState = serde_json::from_str(&json).unwrap();
        assert_eq!(&restored, ledger.state());
    }
}
