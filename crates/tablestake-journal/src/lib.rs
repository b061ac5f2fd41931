//! Append-only journal of sealed Tablestake ledger events.
//!
//! This crate provides:
//! - Framed, append-only storage for [`EventEnvelope`](tablestake_core::EventEnvelope) JSON
//! - Reader/writer APIs with strict and permissive torn-tail handling
//! - Envelope filters for selective iteration
//! - Chain verification and tip lookup for resuming a chain
//!
//! ## Quick Start
//!
//! ```rust
//! use tablestake_canonical::AccountId;
//! use tablestake_core::{EmittedEvent, EventChain, LedgerEvent, ReservationId};
//! use tablestake_journal::{verify_chain, JournalReader, JournalWriter, ReadMode, WriteOptions};
//!
//! let dir = tempfile::tempdir()?;
//! let path = dir.path().join("events.tsj");
//!
//! let mut chain = EventChain::new(AccountId::parse("ledger:main")?);
//! let envelope = chain.seal(EmittedEvent {
//!     actor: AccountId::parse("user:alice")?,
//!     at: 1_700_000_000,
//!     event: LedgerEvent::CheckedIn { reservation_id: ReservationId(1) },
//! })?;
//!
//! let mut writer = JournalWriter::open(&path, WriteOptions::default())?;
//! writer.append(&envelope)?;
//! writer.finish()?;
//!
//! let mut reader = JournalReader::open(&path, ReadMode::Strict)?;
//! let report = verify_chain(&mut reader)?;
//! assert!(report.is_intact());
//! assert_eq!(report.envelopes, 1);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! ## File format
//!
//! A 16-byte header (`TSJ1`, version `u16` LE, flags `u16`, 8 reserved bytes)
//! followed by frames: kind `u8`, 3 reserved bytes, payload length `u32` LE,
//! payload. Kind `0x01` carries one envelope as JSON. Unknown kinds are
//! skipped by readers.

#![deny(missing_docs)]

/// Error types for journal operations.
pub mod errors;
/// Envelope filters.
pub mod filter;
/// Header and frame layout.
pub mod frame;
/// Journal reader.
pub mod reader;
/// Chain verification over journal contents.
pub mod verification;
/// Journal writer.
pub mod writer;

pub use errors::JournalError;
pub use filter::{AccountFilter, AndFilter, EventFilter, FilteredReader, KindFilter, ReservationFilter};
pub use frame::{FrameKind, JournalHeader, RecordFrame};
pub use reader::{EnvelopeSource, JournalReader, ReadMode};
pub use verification::{read_tip, verify_chain, ChainBreak, ChainFault, ChainReport};
pub use writer::{JournalWriter, WriteOptions};
