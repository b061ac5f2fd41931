//! Read-only reservation queries.

use crate::output;
use crate::state::Sandbox;
use tablestake_canonical::AccountId;
use tablestake_core::{LedgerError, Reservation, ReservationId};

pub fn show(sandbox: &Sandbox, id: u64, json: bool) -> Result<(), Box<dyn std::error::Error>> {
    let snapshot = sandbox.load()?;
    let id = ReservationId(id);
    let record = snapshot.state.get(id).ok_or(LedgerError::NotFound(id))?;

    if json {
        println!("{}", serde_json::to_string_pretty(record)?);
    } else {
        println!("id:          {}", record.id);
        println!("owner:       {}", record.owner);
        println!("venue:       {}", record.venue_name);
        println!("date:        {} ({})", output::format_time(record.date), record.date);
        println!("party size:  {}", record.party_size);
        println!("deposit:     {}", record.deposit_amount);
        println!("status:      {}", output::status(record));
        println!(
            "withdrawable: {}",
            if record.is_withdrawable() { "yes" } else { "no" }
        );
    }
    Ok(())
}

pub fn list(sandbox: &Sandbox, account: AccountId, json: bool) -> Result<(), Box<dyn std::error::Error>> {
    let snapshot = sandbox.load()?;
    let records: Vec<&Reservation> = snapshot
        .state
        .ids_for(&account)
        .iter()
        .filter_map(|id| snapshot.state.get(*id))
        .collect();

    if json {
        println!("{}", serde_json::to_string_pretty(&records)?);
    } else {
        output::print_reservation_header();
        for record in records {
            println!("{}", output::format_reservation_row(record));
        }
    }
    Ok(())
}
