//! Tablestake CLI - local sandbox for the reservation ledger.
//!
//! Ledger state and the sandbox token live in a JSON snapshot; every
//! committed transition is sealed into the append-only journal.

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tablestake_canonical::{AccountId, Amount};
use tablestake_core::EventKind;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

mod commands;
mod output;
mod state;

use commands::{events, funds, init, query, reserve, verify};
use state::Sandbox;

#[derive(Parser)]
#[command(name = "tablestake")]
#[command(about = "Deposit-backed reservation ledger sandbox")]
struct Cli {
    /// Ledger snapshot file
    #[arg(long, global = true, env = "TABLESTAKE_STATE", default_value = "tablestake.json")]
    state: PathBuf,
    /// Event journal file
    #[arg(long, global = true, env = "TABLESTAKE_JOURNAL", default_value = "tablestake.tsj")]
    journal: PathBuf,
    /// Current time as unix seconds or RFC3339 (default: system time)
    #[arg(long, global = true, env = "TABLESTAKE_NOW", value_parser = state::parse_time)]
    now: Option<i64>,
    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a fresh ledger snapshot and journal
    Init {
        /// Account that holds escrowed deposits
        #[arg(long)]
        ledger: AccountId,
        /// Sandbox token symbol
        #[arg(long, default_value = "mUSDC")]
        symbol: String,
    },
    /// Credit sandbox tokens to an account
    Mint {
        /// Account to credit
        account: AccountId,
        /// Amount in base units
        amount: Amount,
    },
    /// Set the ledger's allowance over an owner's tokens
    Approve {
        /// Token owner
        owner: AccountId,
        /// Allowance in base units
        amount: Amount,
    },
    /// Show token balance and allowance to the ledger
    Balance {
        /// Account to inspect
        account: AccountId,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Create a reservation and escrow its deposit
    Create {
        /// Calling account
        #[arg(long)]
        caller: AccountId,
        /// Venue label
        #[arg(long)]
        venue: String,
        /// Reserved time (unix seconds or RFC3339)
        #[arg(long, value_parser = state::parse_time)]
        date: i64,
        /// Number of guests
        #[arg(long)]
        party_size: u32,
        /// Deposit in base units
        #[arg(long)]
        deposit: Amount,
    },
    /// Change date and party size of a reservation
    Change {
        /// Reservation id
        id: u64,
        /// Calling account
        #[arg(long)]
        caller: AccountId,
        /// New reserved time (unix seconds or RFC3339)
        #[arg(long, value_parser = state::parse_time)]
        date: i64,
        /// New number of guests
        #[arg(long)]
        party_size: u32,
    },
    /// Cancel a reservation and refund its deposit
    Cancel {
        /// Reservation id
        id: u64,
        /// Calling account
        #[arg(long)]
        caller: AccountId,
    },
    /// Check in to a reservation
    CheckIn {
        /// Reservation id
        id: u64,
        /// Calling account
        #[arg(long)]
        caller: AccountId,
    },
    /// Withdraw the deposit of a checked-in reservation
    Withdraw {
        /// Reservation id
        id: u64,
        /// Calling account
        #[arg(long)]
        caller: AccountId,
    },
    /// Show one reservation
    Show {
        /// Reservation id
        id: u64,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// List reservations created by an account
    List {
        /// Owner account
        account: AccountId,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// List journaled events
    Events {
        /// Only events for this reservation
        #[arg(long)]
        reservation: Option<u64>,
        /// Only events of this kind (e.g. created, checked_in)
        #[arg(long)]
        kind: Option<EventKind>,
        /// Only events this account took part in
        #[arg(long)]
        account: Option<AccountId>,
        /// Output as JSON lines
        #[arg(long)]
        json: bool,
    },
    /// Verify journal chain, snapshot consistency, and ledger invariants
    Verify {
        /// Exit with error code if any check fails
        #[arg(long)]
        strict: bool,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

fn main() {
    dotenv::dotenv().ok();
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .without_time()
                .with_writer(std::io::stderr),
        )
        .init();

    let sandbox = Sandbox::new(cli.state, cli.journal, cli.now);

    let result = match cli.command {
        Commands::Init { ledger, symbol } => init::run(&sandbox, ledger, symbol),
        Commands::Mint { account, amount } => funds::mint(&sandbox, account, amount),
        Commands::Approve { owner, amount } => funds::approve(&sandbox, owner, amount),
        Commands::Balance { account, json } => funds::balance(&sandbox, account, json),
        Commands::Create {
            caller,
            venue,
            date,
            party_size,
            deposit,
        } => reserve::create(&sandbox, caller, venue, date, party_size, deposit),
        Commands::Change {
            id,
            caller,
            date,
            party_size,
        } => reserve::change(&sandbox, id, caller, date, party_size),
        Commands::Cancel { id, caller } => reserve::cancel(&sandbox, id, caller),
        Commands::CheckIn { id, caller } => reserve::check_in(&sandbox, id, caller),
        Commands::Withdraw { id, caller } => reserve::withdraw(&sandbox, id, caller),
        Commands::Show { id, json } => query::show(&sandbox, id, json),
        Commands::List { account, json } => query::list(&sandbox, account, json),
        Commands::Events {
            reservation,
            kind,
            account,
            json,
        } => events::run(&sandbox, reservation, kind, account, json),
        Commands::Verify { strict, json } => verify::run(&sandbox, strict, json),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
