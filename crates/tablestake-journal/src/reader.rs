use crate::errors::JournalError;
use crate::frame::{FrameKind, JournalHeader, RecordFrame, FRAME_HEADER_SIZE, HEADER_SIZE};
use std::fs::File;
use std::io::{self, BufReader, Read};
use std::path::Path;
use tablestake_core::EventEnvelope;

/// How a torn tail is treated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadMode {
    /// A truncated frame is an error.
    Strict,
    /// A truncated frame is end-of-file.
    Permissive,
}

/// Anything that yields envelopes in journal order.
pub trait EnvelopeSource {
    /// Next envelope, or `None` at the end.
    fn next_envelope(&mut self) -> Result<Option<EventEnvelope>, JournalError>;
}

/// Sequential reader for `.tsj` journal files.
pub struct JournalReader {
    input: BufReader<File>,
    mode: ReadMode,
    position: u64,
}

impl JournalReader {
    /// Opens a journal and validates its header.
    pub fn open<P: AsRef<Path>>(path: P, mode: ReadMode) -> Result<Self, JournalError> {
        let mut input = BufReader::new(File::open(path)?);
        let mut header = [0u8; HEADER_SIZE];
        match input.read_exact(&mut header) {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => {
                return Err(JournalError::InvalidHeader("file shorter than header".to_string()))
            }
            Err(e) => return Err(e.into()),
        }
        JournalHeader::from_bytes(&header)?;
        Ok(Self {
            input,
            mode,
            position: HEADER_SIZE as u64,
        })
    }

    /// Byte offset of the next frame.
    pub fn position(&self) -> u64 {
        self.position
    }

    /// Reads the next frame of any kind.
    ///
    /// Returns `Ok(None)` at end-of-file, and on a torn tail in permissive mode.
    pub fn read_frame(&mut self) -> Result<Option<(FrameKind, Vec<u8>)>, JournalError> {
        let start = self.position;
        let mut header = [0u8; FRAME_HEADER_SIZE];
        let got = read_up_to(&mut self.input, &mut header)?;
        if got == 0 {
            return Ok(None);
        }
        if got < FRAME_HEADER_SIZE {
            return self.torn(start);
        }

        let frame = RecordFrame::from_bytes(&header, start)?;
        let mut payload = vec![0u8; frame.len as usize];
        if read_up_to(&mut self.input, &mut payload)? < payload.len() {
            return self.torn(start);
        }

        self.position = start + FRAME_HEADER_SIZE as u64 + u64::from(frame.len);
        Ok(Some((frame.kind, payload)))
    }

    /// Reads the next envelope, skipping frames of unknown kind.
    pub fn read_envelope(&mut self) -> Result<Option<EventEnvelope>, JournalError> {
        loop {
            match self.read_frame()? {
                None => return Ok(None),
                Some((FrameKind::Envelope, payload)) => {
                    let text = std::str::from_utf8(&payload)?;
                    return Ok(Some(serde_json::from_str(text)?));
                }
                Some((FrameKind::Unknown(_), _)) => continue,
            }
        }
    }

    fn torn<T>(&self, offset: u64) -> Result<Option<T>, JournalError> {
        match self.mode {
            ReadMode::Permissive => Ok(None),
            ReadMode::Strict => Err(JournalError::TruncatedFrame { offset }),
        }
    }
}

impl EnvelopeSource for JournalReader {
    fn next_envelope(&mut self) -> Result<Option<EventEnvelope>, JournalError> {
        self.read_envelope()
    }
}

/// Fills `buf` as far as the input allows and returns the byte count.
fn read_up_to<R: Read>(input: &mut R, buf: &mut [u8]) -> io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match input.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}
