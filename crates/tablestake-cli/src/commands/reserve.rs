//! Mutating ledger commands.

use crate::state::Sandbox;
use tablestake_canonical::{AccountId, Amount};
use tablestake_core::ReservationId;

pub fn create(
    sandbox: &Sandbox,
    caller: AccountId,
    venue: String,
    date: i64,
    party_size: u32,
    deposit: Amount,
) -> Result<(), Box<dyn std::error::Error>> {
    let id = sandbox
        .transact(|ledger| ledger.create_reservation(&caller, venue, date, party_size, deposit))?;
    println!("{}", id);
    Ok(())
}

pub fn change(
    sandbox: &Sandbox,
    id: u64,
    caller: AccountId,
    date: i64,
    party_size: u32,
) -> Result<(), Box<dyn std::error::Error>> {
    let id = ReservationId(id);
    sandbox.transact(|ledger| ledger.change_reservation(&caller, id, date, party_size))?;
    println!("Changed reservation {}", id);
    Ok(())
}

pub fn cancel(sandbox: &Sandbox, id: u64, caller: AccountId) -> Result<(), Box<dyn std::error::Error>> {
    let id = ReservationId(id);
    let refunded = sandbox.transact(|ledger| {
        let deposit = ledger.get_reservation(id)?.deposit_amount;
        ledger.cancel_reservation(&caller, id).map(|()| deposit)
    })?;
    println!("Cancelled reservation {}, refunded {}", id, refunded);
    Ok(())
}

pub fn check_in(sandbox: &Sandbox, id: u64, caller: AccountId) -> Result<(), Box<dyn std::error::Error>> {
    let id = ReservationId(id);
    sandbox.transact(|ledger| ledger.check_in(&caller, id))?;
    println!("Checked in reservation {}", id);
    Ok(())
}

pub fn withdraw(sandbox: &Sandbox, id: u64, caller: AccountId) -> Result<(), Box<dyn std::error::Error>> {
    let id = ReservationId(id);
    let amount = sandbox.transact(|ledger| ledger.withdraw(&caller, id))?;
    println!("Withdrew {} from reservation {}", amount, id);
    Ok(())
}
