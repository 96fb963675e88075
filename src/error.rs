#![doc = r#"
Error types produced while encoding a Standard MIDI File.

Errors are layered. [`NoteError`]s describe a single bad input item and are
never fatal: the encoder skips (or clamps) the item and records it in the
[`ExportReport`](crate::report::ExportReport). [`EncodeError`]s are structural
and are returned to the caller in place of a buffer.
"#]

use thiserror::Error;

use crate::{
    file::{TrackKind, TrackStage},
    reader::ReaderError,
    vlq::VlqError,
};

/// A problem with one note, chord or chord tone of the caller's input.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum NoteError {
    /// The note name does not start with a recognised letter, or has trailing garbage.
    #[error("Invalid pitch name {0:?}")]
    InvalidPitchName(String),
    /// The resolved MIDI number fell outside of `[0, 127]`.
    #[error("Pitch {0} is outside of the MIDI range 0-127")]
    OutOfRangePitch(i64),
    /// The duration was negative, zero, non-finite or too long to encode.
    #[error("Invalid duration {0}")]
    InvalidDuration(f64),
    /// The start time (or chord position) was negative, non-finite or too late to encode.
    #[error("Invalid start time {0}")]
    InvalidStartTime(f64),
    /// The velocity was not a finite number.
    #[error("Invalid velocity {0}")]
    InvalidVelocity(f64),
    /// The note carried no pitch at all.
    #[error("Note has no pitch")]
    MissingPitch,
    /// None of the chord's tones could be resolved.
    #[error("Chord has no playable tones")]
    EmptyChord,
}

#[doc = r#"
A structural failure. No bytes are returned when one of these occurs.
"#]
#[derive(Debug, Error)]
pub enum EncodeError {
    /// No melody, chord or bass track qualified for export.
    #[error("Nothing to export: no melody, chord or bass track contained playable notes")]
    NothingToExport,
    /// The assembled buffer failed verification.
    #[error("Assembled file failed verification: {0}")]
    AssemblyFailure(#[from] ReaderError),
    /// A delta-time or length could not be written as a variable-length quantity.
    #[error("Could not encode variable-length quantity: {0}")]
    Vlq(#[from] VlqError),
    /// A channel outside of `0..=15` was configured.
    #[error("MIDI channel {0} is outside of 0-15")]
    InvalidChannel(u8),
    /// A General MIDI program outside of `0..=127` was configured.
    #[error("General MIDI program {0} is outside of 0-127")]
    InvalidProgram(u8),
    /// A track body grew beyond what a 4 byte chunk length can describe.
    #[error("Track body of {0} bytes does not fit in a chunk")]
    TrackTooLong(usize),
    /// More tracks were produced than the header's 16-bit track count allows.
    #[error("{0} tracks do not fit in the header")]
    TooManyTracks(usize),
    /// A track was built out of order, e.g. an event after end-of-track.
    #[error("{track} track: {action} is not allowed at stage {stage:?}")]
    TrackOrder {
        /// The track being built
        track: TrackKind,
        /// What was attempted
        action: &'static str,
        /// Where the track was
        stage: TrackStage,
    },
}

impl EncodeError {
    /// True if the failure is an internal invariant violation rather than bad input.
    pub const fn is_internal(&self) -> bool {
        matches!(
            self,
            Self::AssemblyFailure(_) | Self::Vlq(_) | Self::TrackOrder { .. }
        )
    }
}

/// The result type of the encoder (see [`EncodeError`]).
pub type EncodeResult<T> = Result<T, EncodeError>;
