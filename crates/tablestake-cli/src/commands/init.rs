//! Init command implementation.

use crate::state::{Sandbox, Snapshot};
use tablestake_canonical::AccountId;
use tablestake_core::LedgerConfig;
use tablestake_journal::{JournalWriter, WriteOptions};
use tracing::info;

pub fn run(sandbox: &Sandbox, ledger: AccountId, symbol: String) -> Result<(), Box<dyn std::error::Error>> {
    if sandbox.state_path.exists() {
        return Err(format!(
            "ledger snapshot {} already exists",
            sandbox.state_path.display()
        )
        .into());
    }
    if sandbox.journal_path.exists() {
        return Err(format!("journal {} already exists", sandbox.journal_path.display()).into());
    }

    JournalWriter::open(&sandbox.journal_path, WriteOptions::default())?.finish()?;
    let snapshot = Snapshot::new(LedgerConfig {
        ledger_account: ledger.clone(),
        token_symbol: symbol,
    });
    sandbox.save(&snapshot)?;

    info!(ledger = %ledger, "ledger initialized");
    println!("Initialized ledger {} ({})", ledger, snapshot.config.token_symbol);
    Ok(())
}
