use crate::errors::JournalError;
use crate::reader::{EnvelopeSource, JournalReader, ReadMode};
use std::fmt;
use std::path::Path;
use tablestake_canonical::{Canonicalizer, Digest};
use tablestake_core::EventEnvelope;

/// What is wrong with a chain link.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChainFault {
    /// Recomputed id differs from the stored `event_id`.
    IdMismatch,
    /// `prev_event_id` does not name the preceding envelope.
    BrokenLink,
    /// Sequence number is not one past the preceding envelope's.
    SequenceGap {
        /// Sequence the chain expected.
        expected: u64,
    },
}

impl fmt::Display for ChainFault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChainFault::IdMismatch => f.write_str("event_id does not match envelope content"),
            ChainFault::BrokenLink => f.write_str("prev_event_id does not match preceding envelope"),
            ChainFault::SequenceGap { expected } => write!(f, "expected sequence {}", expected),
        }
    }
}

/// First faulty envelope found.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChainBreak {
    /// 1-based position of the envelope in the journal.
    pub position: u64,
    /// Sequence number the envelope claims.
    pub sequence: u64,
    /// What is wrong.
    pub fault: ChainFault,
}

/// Outcome of [`verify_chain`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChainReport {
    /// Envelopes read.
    pub envelopes: u64,
    /// Sequence and id of the last envelope.
    pub tip: Option<(u64, Digest)>,
    /// First fault, if any.
    pub first_break: Option<ChainBreak>,
}

impl ChainReport {
    /// True when no envelope was faulty.
    pub fn is_intact(&self) -> bool {
        self.first_break.is_none()
    }
}

/// Walks `source` and checks every envelope's id, back-link, and sequence.
///
/// Reading continues past a fault so the report covers the whole journal.
pub fn verify_chain<S: EnvelopeSource>(source: &mut S) -> Result<ChainReport, JournalError> {
    let canonicalizer = Canonicalizer::new();
    let mut report = ChainReport::default();
    let mut previous: Option<(u64, Digest)> = None;

    while let Some(envelope) = source.next_envelope()? {
        report.envelopes += 1;
        if report.first_break.is_none() {
            if let Some(fault) = check_link(&envelope, previous.as_ref(), &canonicalizer)? {
                report.first_break = Some(ChainBreak {
                    position: report.envelopes,
                    sequence: envelope.sequence,
                    fault,
                });
            }
        }
        previous = Some((envelope.sequence, envelope.event_id));
    }

    report.tip = previous;
    Ok(report)
}

fn check_link(
    envelope: &EventEnvelope,
    previous: Option<&(u64, Digest)>,
    canonicalizer: &Canonicalizer,
) -> Result<Option<ChainFault>, JournalError> {
    if !envelope.verify_id(canonicalizer)? {
        return Ok(Some(ChainFault::IdMismatch));
    }
    let (expected, prev_id) = match previous {
        Some((sequence, id)) => (sequence + 1, Some(id)),
        None => (1, None),
    };
    if envelope.sequence != expected {
        return Ok(Some(ChainFault::SequenceGap { expected }));
    }
    if envelope.prev_event_id.as_ref() != prev_id {
        return Ok(Some(ChainFault::BrokenLink));
    }
    Ok(None)
}

/// Sequence and id of the last envelope in the journal at `path`.
///
/// A missing file is an empty chain. Torn tails are errors so a chain is
/// never resumed from a half-written journal.
pub fn read_tip<P: AsRef<Path>>(path: P) -> Result<Option<(u64, Digest)>, JournalError> {
    let path = path.as_ref();
    if !path.exists() {
        return Ok(None);
    }
    let mut reader = JournalReader::open(path, ReadMode::Strict)?;
    let mut tip = None;
    while let Some(envelope) = reader.read_envelope()? {
        tip = Some((envelope.sequence, envelope.event_id));
    }
    Ok(tip)
}
