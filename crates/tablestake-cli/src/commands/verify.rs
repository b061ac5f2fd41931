//! Verify command implementation.

use crate::state::Sandbox;
use serde_json::json;
use tablestake_core::{audit_state, EscrowCustodian, Projection};
use tablestake_journal::{verify_chain, ChainReport, JournalReader, ReadMode};

pub fn run(sandbox: &Sandbox, strict: bool, json_output: bool) -> Result<(), Box<dyn std::error::Error>> {
    let snapshot = sandbox.load()?;
    let open = || {
        JournalReader::open(&sandbox.journal_path, ReadMode::Strict).map_err(|e| {
            format!(
                "Failed to open journal {}: {}",
                sandbox.journal_path.display(),
                e
            )
        })
    };

    let report: ChainReport = verify_chain(&mut open()?)?;
    let chain_problem = report.first_break.as_ref().map(|b| {
        format!(
            "envelope {} (sequence {}): {}",
            b.position, b.sequence, b.fault
        )
    });

    let mut projection = Projection::new();
    let mut reader = open()?;
    let mut replay_problem = None;
    while let Some(envelope) = reader.read_envelope()? {
        if let Err(e) = projection.apply(&envelope.payload) {
            replay_problem = Some(format!("sequence {}: {}", envelope.sequence, e));
            break;
        }
    }
    let applied = projection.applied();
    let replayed = projection.into_state();
    let snapshot_problem = replay_problem.or_else(|| {
        if applied != snapshot.chain_height {
            Some(format!(
                "journal holds {} events, snapshot expects {}",
                applied, snapshot.chain_height
            ))
        } else if replayed != snapshot.state {
            Some("replayed journal does not reproduce snapshot state".to_string())
        } else {
            None
        }
    });

    let held = snapshot.token.balance_of(&snapshot.config.ledger_account);
    let audit_problem = audit_state(&snapshot.state, held).err().map(|e| e.to_string());

    let checks = [
        ("chain", chain_problem),
        ("snapshot", snapshot_problem),
        ("audit", audit_problem),
    ];
    let all_ok = checks.iter().all(|(_, problem)| problem.is_none());

    if json_output {
        let value = json!({
            "envelopes": report.envelopes,
            "tip": report.tip.as_ref().map(|(sequence, id)| json!({
                "sequence": sequence,
                "event_id": id,
            })),
            "checks": checks
                .iter()
                .map(|(name, problem)| json!({
                    "check": name,
                    "ok": problem.is_none(),
                    "detail": problem,
                }))
                .collect::<Vec<_>>(),
            "ok": all_ok,
        });
        println!("{}", serde_json::to_string_pretty(&value)?);
    } else {
        println!("{:<10} {:<6} {}", "CHECK", "RESULT", "DETAIL");
        println!("{}", "-".repeat(70));
        for (name, problem) in &checks {
            match problem {
                None => println!("{:<10} {:<6}", name, "ok"),
                Some(detail) => println!("{:<10} {:<6} {}", name, "FAIL", detail),
            }
        }
        println!("{} envelopes", report.envelopes);
    }

    if strict && !all_ok {
        return Err("verification failed".into());
    }
    Ok(())
}
