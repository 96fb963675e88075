use thiserror::Error;

use crate::vlq::VlqError;

#[doc = r#"
A set of errors that can occur while reading an encoded file back
"#]
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Reading at Position {position}, {kind}")]
pub struct ReaderError {
    position: usize,
    pub(crate) kind: ReaderErrorKind,
}

/// A kind of error that a reader can produce
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReaderErrorKind {
    /// Reading out of bounds.
    #[error("Read out of bounds!")]
    OutOfBounds,
    /// A chunk did not carry the expected type identifier.
    #[error("Expected chunk {}, found {}", String::from_utf8_lossy(.expected), String::from_utf8_lossy(.found))]
    Tag {
        /// What should have been there
        expected: [u8; 4],
        /// What was there
        found: [u8; 4],
    },
    /// The header chunk was not 6 bytes long.
    #[error("Header length is {0}, expected 6")]
    HeaderLength(u32),
    /// The format word is not 0, 1 or 2.
    #[error("Unknown format {0}")]
    Format(u16),
    /// SMPTE divisions are never written by the encoder.
    #[error("Unsupported division {0:#06X}")]
    Division(u16),
    /// The header's track count disagrees with the chunks present.
    #[error("Header declares {declared} tracks, found {found}")]
    TrackCount {
        /// From the header
        declared: u16,
        /// Counted
        found: usize,
    },
    /// A delta-time or meta length was malformed.
    #[error("Variable-length quantity: {0}")]
    Vlq(#[from] VlqError),
    /// A status byte the encoder never writes, including running status.
    #[error("Unsupported status byte {0:#04X}")]
    Status(u8),
    /// A track body ended without `FF 2F 00`.
    #[error("Track does not end with end-of-track")]
    MissingEndOfTrack,
    /// Bytes follow the end-of-track event.
    #[error("Events follow end-of-track")]
    EventsAfterEndOfTrack,
    /// A key was struck and never released.
    #[error("Note {key} on channel {channel} is never released")]
    UnmatchedNoteOn {
        /// Zero-based channel
        channel: u8,
        /// MIDI note number
        key: u8,
    },
    /// A key was released that was not sounding.
    #[error("Note {key} on channel {channel} is released without being struck")]
    UnmatchedNoteOff {
        /// Zero-based channel
        channel: u8,
        /// MIDI note number
        key: u8,
    },
}

impl ReaderError {
    /// Create a reader error from a position and kind
    pub const fn new(position: usize, kind: ReaderErrorKind) -> Self {
        Self { position, kind }
    }
    /// True if out of bounds or unexpected end of file
    pub const fn is_out_of_bounds(&self) -> bool {
        matches!(self.kind, ReaderErrorKind::OutOfBounds)
    }
    /// Returns the error kind of the reader.
    pub fn error_kind(&self) -> &ReaderErrorKind {
        &self.kind
    }
    /// Returns the position where the read error occurred.
    pub fn position(&self) -> usize {
        self.position
    }

    /// Create a new out of bounds error
    pub const fn oob(position: usize) -> Self {
        Self {
            position,
            kind: ReaderErrorKind::OutOfBounds,
        }
    }
}

/// The Read Result type (see [`ReaderError`])
pub type ReadResult<T> = Result<T, ReaderError>;
