use tablestake_canonical::{AccountId, Amount};
use tablestake_core::{EmittedEvent, EventChain, EventEnvelope, EventKind, LedgerEvent, ReservationId};
use tablestake_journal::{
    read_tip, verify_chain, AccountFilter, AndFilter, ChainFault, EnvelopeSource, FilteredReader,
    JournalReader, JournalWriter, KindFilter, ReadMode, ReservationFilter, WriteOptions,
};
use tempfile::TempDir;

fn account(raw: &str) -> AccountId {
    AccountId::parse(raw).unwrap()
}

fn make_history() -> Vec<LedgerEvent> {
    vec![
        LedgerEvent::ReservationCreated {
            reservation_id: ReservationId(1),
            owner: account("user:alice"),
            venue_name: "Restaurant A".to_string(),
            date: 1_700_086_400,
            party_size: 2,
            deposit_amount: Amount::new(100),
        },
        LedgerEvent::ReservationCreated {
            reservation_id: ReservationId(2),
            owner: account("user:bob"),
            venue_name: "Restaurant B".to_string(),
            date: 1_700_086_400,
            party_size: 4,
            deposit_amount: Amount::new(50),
        },
        LedgerEvent::CheckedIn {
            reservation_id: ReservationId(1),
        },
        LedgerEvent::DepositWithdrawn {
            reservation_id: ReservationId(1),
            recipient: account("user:alice"),
            amount: Amount::new(100),
        },
        LedgerEvent::ReservationCancelled {
            reservation_id: ReservationId(2),
            refunded: Amount::new(50),
        },
    ]
}

fn make_envelopes(chain: &mut EventChain, events: Vec<LedgerEvent>) -> Vec<EventEnvelope> {
    events
        .into_iter()
        .enumerate()
        .map(|(i, event)| {
            let actor = match &event {
                LedgerEvent::ReservationCreated { owner, .. } => owner.clone(),
                other if other.reservation_id() == ReservationId(2) => account("user:bob"),
                _ => account("user:alice"),
            };
            chain
                .seal(EmittedEvent {
                    actor,
                    at: 1_700_000_000 + i as i64,
                    event,
                })
                .unwrap()
        })
        .collect()
}

fn write_all(path: &std::path::Path, envelopes: &[EventEnvelope]) {
    let mut writer = JournalWriter::open(path, WriteOptions::default()).unwrap();
    for envelope in envelopes {
        writer.append(envelope).unwrap();
    }
    writer.finish().unwrap();
}

fn collect<S: EnvelopeSource>(source: &mut S) -> Vec<EventEnvelope> {
    let mut out = Vec::new();
    while let Some(envelope) = source.next_envelope().unwrap() {
        out.push(envelope);
    }
    out
}

#[test]
fn test_write_read_round_trip() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("events.tsj");
    let mut chain = EventChain::new(account("ledger:main"));
    let envelopes = make_envelopes(&mut chain, make_history());

    write_all(&path, &envelopes);

    let mut reader = JournalReader::open(&path, ReadMode::Strict).unwrap();
    assert_eq!(collect(&mut reader), envelopes);
    assert!(reader.read_envelope().unwrap().is_none());
}

#[test]
fn test_append_to_existing_continues_chain() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("events.tsj");
    let ledger = account("ledger:main");
    let mut history = make_history();
    let tail = history.split_off(3);

    let mut chain = EventChain::new(ledger.clone());
    write_all(&path, &make_envelopes(&mut chain, history));

    let (height, tip) = read_tip(&path).unwrap().unwrap();
    assert_eq!(height, 3);
    let mut resumed = EventChain::resume(ledger, height, Some(tip));
    write_all(&path, &make_envelopes(&mut resumed, tail));

    let mut reader = JournalReader::open(&path, ReadMode::Strict).unwrap();
    let report = verify_chain(&mut reader).unwrap();
    assert!(report.is_intact());
    assert_eq!(report.envelopes, 5);
    assert_eq!(report.tip.map(|(sequence, _)| sequence), Some(5));
}

#[test]
fn test_read_tip_of_missing_journal_is_none() {
    let temp_dir = TempDir::new().unwrap();
    assert!(read_tip(temp_dir.path().join("absent.tsj")).unwrap().is_none());
}

#[test]
fn test_verify_detects_tampered_payload() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("events.tsj");
    let mut chain = EventChain::new(account("ledger:main"));
    let mut envelopes = make_envelopes(&mut chain, make_history());
    envelopes[3].payload = LedgerEvent::DepositWithdrawn {
        reservation_id: ReservationId(1),
        recipient: account("user:mallory"),
        amount: Amount::new(100),
    };
    write_all(&path, &envelopes);

    let mut reader = JournalReader::open(&path, ReadMode::Strict).unwrap();
    let report = verify_chain(&mut reader).unwrap();
    let fault = report.first_break.unwrap();
    assert_eq!(fault.position, 4);
    assert_eq!(fault.fault, ChainFault::IdMismatch);
    assert_eq!(report.envelopes, 5);
}

#[test]
fn test_verify_detects_broken_link() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("events.tsj");
    let mut first = EventChain::new(account("ledger:main"));
    let mut second = EventChain::new(account("ledger:main"));
    let a = make_envelopes(&mut first, make_history());
    let mut b = make_history();
    b.rotate_left(1);
    let b = make_envelopes(&mut second, b);

    write_all(&path, &[a[0].clone(), b[1].clone()]);

    let mut reader = JournalReader::open(&path, ReadMode::Strict).unwrap();
    let report = verify_chain(&mut reader).unwrap();
    assert_eq!(report.first_break.unwrap().fault, ChainFault::BrokenLink);
}

#[test]
fn test_verify_detects_sequence_gap() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("events.tsj");
    let mut chain = EventChain::new(account("ledger:main"));
    let envelopes = make_envelopes(&mut chain, make_history());

    write_all(&path, &[envelopes[1].clone()]);

    let mut reader = JournalReader::open(&path, ReadMode::Strict).unwrap();
    let report = verify_chain(&mut reader).unwrap();
    assert_eq!(
        report.first_break.unwrap().fault,
        ChainFault::SequenceGap { expected: 1 }
    );
}

#[test]
fn test_filtered_reader() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("events.tsj");
    let mut chain = EventChain::new(account("ledger:main"));
    write_all(&path, &make_envelopes(&mut chain, make_history()));

    let reader = JournalReader::open(&path, ReadMode::Strict).unwrap();
    let mut by_reservation = FilteredReader::new(
        reader,
        ReservationFilter {
            reservation_id: ReservationId(1),
        },
    );
    let sequences: Vec<u64> = collect(&mut by_reservation).iter().map(|e| e.sequence).collect();
    assert_eq!(sequences, vec![1, 3, 4]);

    let reader = JournalReader::open(&path, ReadMode::Strict).unwrap();
    let mut bob_created = FilteredReader::new(
        reader,
        AndFilter {
            filters: vec![
                Box::new(AccountFilter {
                    account: account("user:bob"),
                }),
                Box::new(KindFilter {
                    kind: EventKind::ReservationCreated,
                }),
            ],
        },
    );
    let found = collect(&mut bob_created);
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].payload.reservation_id(), ReservationId(2));
}
