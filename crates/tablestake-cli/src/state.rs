//! Sandbox snapshot persistence and the load-operate-journal-save cycle.

use chrono::DateTime;
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use tablestake_core::{
    Clock, EventChain, FixedClock, InMemoryToken, LedgerConfig, LedgerError, LedgerState,
    ReservationLedger, SystemClock,
};
use tablestake_journal::{read_tip, JournalWriter, WriteOptions};
use tracing::debug;

/// Ledger as driven by the sandbox.
pub type SandboxLedger = ReservationLedger<InMemoryToken, FixedClock>;

/// Everything the sandbox persists between commands.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Snapshot {
    pub config: LedgerConfig,
    pub state: LedgerState,
    pub token: InMemoryToken,
    /// Envelopes journaled so far.
    pub chain_height: u64,
}

impl Snapshot {
    pub fn new(config: LedgerConfig) -> Self {
        let token = InMemoryToken::new(config.token_symbol.clone());
        Self {
            config,
            state: LedgerState::default(),
            token,
            chain_height: 0,
        }
    }
}

/// Paths and clock override shared by every command.
pub struct Sandbox {
    pub state_path: PathBuf,
    pub journal_path: PathBuf,
    now: Option<i64>,
}

impl Sandbox {
    pub fn new(state_path: PathBuf, journal_path: PathBuf, now: Option<i64>) -> Self {
        Self {
            state_path,
            journal_path,
            now,
        }
    }

    pub fn now(&self) -> i64 {
        self.now.unwrap_or_else(|| SystemClock.now())
    }

    pub fn load(&self) -> Result<Snapshot, Box<dyn std::error::Error>> {
        let bytes = fs::read(&self.state_path).map_err(|e| {
            format!(
                "cannot read ledger snapshot {}: {} (run `tablestake init` first)",
                self.state_path.display(),
                e
            )
        })?;
        let snapshot = serde_json::from_slice(&bytes)
            .map_err(|e| format!("corrupt ledger snapshot {}: {}", self.state_path.display(), e))?;
        Ok(snapshot)
    }

    /// Writes the snapshot to a sibling temp file, syncs it, then renames it into place.
    pub fn save(&self, snapshot: &Snapshot) -> Result<(), Box<dyn std::error::Error>> {
        let tmp = temp_path(&self.state_path);
        let mut file = File::create(&tmp)?;
        file.write_all(&serde_json::to_vec_pretty(snapshot)?)?;
        file.sync_all()?;
        drop(file);
        fs::rename(&tmp, &self.state_path)?;
        debug!(path = %self.state_path.display(), "snapshot saved");
        Ok(())
    }

    /// Runs one ledger operation against the snapshot.
    ///
    /// On success the emitted events are sealed onto the journal's chain and
    /// the snapshot is replaced. On failure nothing is written.
    pub fn transact<T>(
        &self,
        op: impl FnOnce(&mut SandboxLedger) -> Result<T, LedgerError>,
    ) -> Result<T, Box<dyn std::error::Error>> {
        let snapshot = self.load()?;
        let tip = read_tip(&self.journal_path)?;
        let height = tip.as_ref().map(|(sequence, _)| *sequence).unwrap_or(0);
        if height != snapshot.chain_height {
            return Err(format!(
                "journal holds {} events but snapshot expects {}",
                height, snapshot.chain_height
            )
            .into());
        }

        let mut ledger = ReservationLedger::from_parts(
            snapshot.config,
            snapshot.state,
            snapshot.token,
            FixedClock::at(self.now()),
        );
        let value = op(&mut ledger)?;

        let mut chain = EventChain::resume(
            ledger.ledger_account().clone(),
            height,
            tip.map(|(_, id)| id),
        );
        let envelopes = ledger
            .take_events()
            .into_iter()
            .map(|emitted| chain.seal(emitted))
            .collect::<Result<Vec<_>, _>>()?;

        let mut writer = JournalWriter::open(&self.journal_path, WriteOptions::default())?;
        for envelope in &envelopes {
            writer.append(envelope)?;
        }
        writer.finish()?;

        let (config, state, token) = ledger.into_parts();
        self.save(&Snapshot {
            config,
            state,
            token,
            chain_height: chain.height(),
        })?;
        Ok(value)
    }
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}

/// Parses unix seconds or an RFC3339 timestamp.
pub fn parse_time(value: &str) -> Result<i64, String> {
    if let Ok(seconds) = value.parse::<i64>() {
        return Ok(seconds);
    }
    DateTime::parse_from_rfc3339(value)
        .map(|t| t.timestamp())
        .map_err(|_| format!("expected unix seconds or RFC3339 time, got '{}'", value))
}
