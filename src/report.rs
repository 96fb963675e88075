#![doc = r#"
Diagnostics collected while encoding.

Bad input items never abort an export. Each one is skipped or corrected and
described here, so the caller can tell the user what was left out.
"#]

use core::fmt;

use crate::{NoteError, file::TrackKind};

/// What happened to one input item.
#[derive(Debug, Clone, PartialEq)]
pub enum DiagnosticKind {
    /// The whole note or chord was left out.
    Skipped(NoteError),
    /// One tone of a chord was left out, the rest of the chord was kept.
    ToneSkipped {
        /// Position of the tone within the chord
        tone: usize,
        /// Why
        error: NoteError,
    },
    /// A tone repeated a pitch already in the chord and was written once.
    DuplicateTone {
        /// Position of the tone within the chord
        tone: usize,
        /// The repeated MIDI note
        pitch: u8,
    },
    /// The pitch fell outside of `0..=127` and was clamped.
    PitchClamped {
        /// The MIDI number asked for
        requested: i64,
        /// The MIDI number written
        pitch: u8,
    },
    /// The note name had no octave and octave 4 was assumed.
    OctaveDefaulted {
        /// The name as given
        name: String,
    },
    /// The velocity fell outside of `[0, 1]` and was clamped.
    VelocityClamped {
        /// The velocity asked for
        requested: f64,
        /// The velocity byte written
        velocity: u8,
    },
    /// The duration rounded to zero ticks and was lengthened to one tick.
    DurationExtended {
        /// The duration asked for, in beats
        requested: f64,
    },
    /// The tempo was unusable and the default was written.
    TempoDefaulted {
        /// The tempo asked for, in beats per minute
        requested: f64,
    },
    /// Humanize was requested. It does not alter the output.
    HumanizeIgnored,
}

/// One diagnostic, located by track and input index.
#[derive(Debug, Clone, PartialEq)]
pub struct Diagnostic {
    /// The track the item belonged to
    pub track: TrackKind,
    /// Index of the note or chord in the caller's input
    pub index: usize,
    /// What happened
    pub kind: DiagnosticKind,
}

impl Diagnostic {
    /// True if the item was left out of the file entirely.
    pub const fn is_skip(&self) -> bool {
        matches!(self.kind, DiagnosticKind::Skipped(_))
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use DiagnosticKind::*;
        write!(f, "{} #{}: ", self.track, self.index)?;
        match &self.kind {
            Skipped(e) => write!(f, "skipped, {e}"),
            ToneSkipped { tone, error } => write!(f, "tone {tone} skipped, {error}"),
            DuplicateTone { tone, pitch } => write!(f, "tone {tone} repeats pitch {pitch}"),
            PitchClamped { requested, pitch } => {
                write!(f, "pitch {requested} clamped to {pitch}")
            }
            OctaveDefaulted { name } => write!(f, "{name:?} has no octave, assumed octave 4"),
            VelocityClamped {
                requested,
                velocity,
            } => write!(f, "velocity {requested} clamped to {velocity}"),
            DurationExtended { requested } => {
                write!(f, "duration {requested} lengthened to one tick")
            }
            TempoDefaulted { requested } => write!(f, "tempo {requested} replaced with 120 BPM"),
            HumanizeIgnored => write!(f, "humanize has no effect"),
        }
    }
}

/// Every diagnostic raised by one encode, in the order they were raised.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExportReport {
    diagnostics: Vec<Diagnostic>,
}

impl ExportReport {
    /// Records a diagnostic and logs it.
    pub fn push(&mut self, track: TrackKind, index: usize, kind: DiagnosticKind) {
        let diagnostic = Diagnostic { track, index, kind };
        match diagnostic.kind {
            DiagnosticKind::Skipped(_) | DiagnosticKind::ToneSkipped { .. } => {
                tracing::warn!(%track, index, "{diagnostic}")
            }
            DiagnosticKind::HumanizeIgnored | DiagnosticKind::DuplicateTone { .. } => {
                tracing::debug!(%track, index, "{diagnostic}")
            }
            _ => tracing::info!(%track, index, "{diagnostic}"),
        }
        self.diagnostics.push(diagnostic);
    }

    /// True if nothing was skipped or corrected.
    pub fn is_clean(&self) -> bool {
        self.diagnostics.is_empty()
    }

    /// All diagnostics.
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    /// Diagnostics raised for one track.
    pub fn for_track(&self, track: TrackKind) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics.iter().filter(move |d| d.track == track)
    }

    /// The number of notes and chords left out of the file.
    pub fn skipped(&self) -> usize {
        self.diagnostics.iter().filter(|d| d.is_skip()).count()
    }
}

#[test]
fn counts_skips() {
    let mut report = ExportReport::default();
    assert!(report.is_clean());
    report.push(
        TrackKind::Melody,
        2,
        DiagnosticKind::Skipped(NoteError::MissingPitch),
    );
    report.push(
        TrackKind::Chords,
        0,
        DiagnosticKind::OctaveDefaulted {
            name: "E".to_string(),
        },
    );
    assert_eq!(report.skipped(), 1);
    assert_eq!(report.for_track(TrackKind::Chords).count(), 1);
    assert_eq!(
        report.diagnostics()[0].to_string(),
        "Melody #2: skipped, Note has no pitch"
    );
}
