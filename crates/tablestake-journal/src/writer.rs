use crate::errors::JournalError;
use crate::frame::{FrameKind, JournalHeader, RecordFrame, HEADER_SIZE};
use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::Path;
use tablestake_core::EventEnvelope;
use tracing::debug;

/// Options for opening a journal for writing.
#[derive(Debug, Clone)]
pub struct WriteOptions {
    /// Fsync after each append (default: false).
    pub sync: bool,
    /// Create the file if it doesn't exist (default: true).
    pub create: bool,
}

impl Default for WriteOptions {
    fn default() -> Self {
        Self {
            sync: false,
            create: true,
        }
    }
}

/// Append-only writer for `.tsj` journal files.
///
/// A new or empty file gets a header first; an existing file must already
/// carry a valid one and is appended to.
pub struct JournalWriter {
    file: File,
    sync: bool,
}

impl JournalWriter {
    /// Opens or creates a journal for appending.
    ///
    /// # Errors
    ///
    /// Fails if the file cannot be opened, is non-empty but shorter than a
    /// header, or carries an invalid header.
    pub fn open<P: AsRef<Path>>(path: P, options: WriteOptions) -> Result<Self, JournalError> {
        let path = path.as_ref();
        let mut file = OpenOptions::new()
            .create(options.create)
            .read(true)
            .write(true)
            .open(path)?;

        let len = file.metadata()?.len();
        if len == 0 {
            file.write_all(&JournalHeader::new().to_bytes())?;
            file.flush()?;
            if options.sync {
                file.sync_all()?;
            }
            debug!(path = %path.display(), "journal created");
        } else if len < HEADER_SIZE as u64 {
            return Err(JournalError::FileNotEmpty);
        } else {
            let mut header = [0u8; HEADER_SIZE];
            file.seek(SeekFrom::Start(0))?;
            file.read_exact(&mut header)?;
            JournalHeader::from_bytes(&header)?;
            file.seek(SeekFrom::End(0))?;
            debug!(path = %path.display(), bytes = len, "journal opened for append");
        }

        Ok(Self {
            file,
            sync: options.sync,
        })
    }

    /// Appends a sealed envelope as an envelope frame.
    pub fn append(&mut self, envelope: &EventEnvelope) -> Result<(), JournalError> {
        let payload = serde_json::to_vec(envelope)?;
        self.append_raw(FrameKind::Envelope, &payload)?;
        debug!(sequence = envelope.sequence, event_id = %envelope.event_id, "envelope appended");
        Ok(())
    }

    /// Appends a frame with an arbitrary kind and payload.
    pub fn append_raw(&mut self, kind: FrameKind, payload: &[u8]) -> Result<(), JournalError> {
        let frame = RecordFrame::new(kind, payload.len())?;
        self.file.write_all(&frame.to_bytes())?;
        self.file.write_all(payload)?;
        self.file.flush()?;
        if self.sync {
            self.file.sync_all()?;
        }
        Ok(())
    }

    /// Flushes and closes the journal.
    pub fn finish(mut self) -> Result<(), JournalError> {
        self.file.flush()?;
        if self.sync {
            self.file.sync_all()?;
        }
        Ok(())
    }
}

impl Drop for JournalWriter {
    fn drop(&mut self) {
        let _ = self.file.flush();
        if self.sync {
            let _ = self.file.sync_all();
        }
    }
}
