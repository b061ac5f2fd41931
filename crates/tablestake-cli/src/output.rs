//! Output formatting utilities.

use tablestake_core::{EventEnvelope, LedgerEvent, Reservation};

/// Prints the reservation table header.
#[allow(clippy::print_literal)]
pub fn print_reservation_header() {
    println!(
        "{:<6} {:<24} {:<20} {:>5} {:>12} {:<9} {}",
        "ID", "VENUE", "DATE", "PARTY", "DEPOSIT", "STATUS", "OWNER"
    );
    println!("{}", "-".repeat(100));
}

/// Formats a reservation as a table row.
pub fn format_reservation_row(record: &Reservation) -> String {
    format!(
        "{:<6} {:<24} {:<20} {:>5} {:>12} {:<9} {}",
        record.id.to_string(),
        truncate(&record.venue_name, 24),
        format_time(record.date),
        record.party_size,
        record.deposit_amount.to_string(),
        status(record),
        record.owner
    )
}

/// Human status of a reservation.
pub fn status(record: &Reservation) -> &'static str {
    match (record.is_active, record.is_checked_in) {
        (false, _) => "cancelled",
        (true, true) => "checked-in",
        (true, false) => "active",
    }
}

/// Prints the event table header.
#[allow(clippy::print_literal)]
pub fn print_event_header() {
    println!(
        "{:<5} {:<22} {:<6} {:<20} {:<24} {}",
        "SEQ", "TYPE", "RES", "OCCURRED_AT", "ACTOR", "DETAIL"
    );
    println!("{}", "-".repeat(100));
}

/// Formats an envelope as a table row.
pub fn format_event_row(envelope: &EventEnvelope) -> String {
    format!(
        "{:<5} {:<22} {:<6} {:<20} {:<24} {}",
        envelope.sequence,
        envelope.payload.kind().as_str(),
        envelope.payload.reservation_id().to_string(),
        envelope.occurred_at.as_str(),
        truncate(envelope.actor.as_str(), 24),
        detail(&envelope.payload)
    )
}

fn detail(event: &LedgerEvent) -> String {
    match event {
        LedgerEvent::ReservationCreated {
            venue_name,
            date,
            party_size,
            deposit_amount,
            ..
        } => format!(
            "{} at {} for {}, deposit {}",
            venue_name,
            format_time(*date),
            party_size,
            deposit_amount
        ),
        LedgerEvent::ReservationChanged {
            new_date,
            new_party_size,
            ..
        } => format!("now {} for {}", format_time(*new_date), new_party_size),
        LedgerEvent::ReservationCancelled { refunded, .. } => format!("refunded {}", refunded),
        LedgerEvent::CheckedIn { .. } => String::new(),
        LedgerEvent::DepositWithdrawn {
            recipient, amount, ..
        } => format!("{} to {}", amount, recipient),
    }
}

/// Renders unix seconds as RFC3339, falling back to the raw number.
pub fn format_time(seconds: i64) -> String {
    chrono::DateTime::from_timestamp(seconds, 0)
        .map(|t| t.format("%Y-%m-%dT%H:%M:%SZ").to_string())
        .unwrap_or_else(|| seconds.to_string())
}

fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}
