//! Events command implementation.

use crate::output;
use crate::state::Sandbox;
use tablestake_canonical::AccountId;
use tablestake_core::{EventKind, ReservationId};
use tablestake_journal::{
    AccountFilter, AndFilter, EnvelopeSource, EventFilter, FilteredReader, JournalReader,
    KindFilter, ReadMode, ReservationFilter,
};

pub fn run(
    sandbox: &Sandbox,
    reservation: Option<u64>,
    kind: Option<EventKind>,
    account: Option<AccountId>,
    json: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut filters: Vec<Box<dyn EventFilter>> = Vec::new();
    if let Some(id) = reservation {
        filters.push(Box::new(ReservationFilter {
            reservation_id: ReservationId(id),
        }));
    }
    if let Some(kind) = kind {
        filters.push(Box::new(KindFilter { kind }));
    }
    if let Some(account) = account {
        filters.push(Box::new(AccountFilter { account }));
    }

    let reader = JournalReader::open(&sandbox.journal_path, ReadMode::Strict).map_err(|e| {
        format!(
            "Failed to open journal {}: {}",
            sandbox.journal_path.display(),
            e
        )
    })?;
    let mut filtered = FilteredReader::new(reader, AndFilter { filters });

    if !json {
        output::print_event_header();
    }
    while let Some(envelope) = filtered.next_envelope()? {
        if json {
            println!("{}", serde_json::to_string(&envelope)?);
        } else {
            println!("{}", output::format_event_row(&envelope));
        }
    }
    Ok(())
}
