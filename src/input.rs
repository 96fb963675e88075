#![doc = r#"
The caller's musical input, and its normalization into timed voice notes.

The generation layer hands over a melody ([`NoteData`]) and a chord
progression ([`ChordData`]), either of which may be absent. Melody times are in
beats (a quarter note is `1.0`), chord times are in bars.

Normalization resolves every pitch, converts times to ticks on the file's
division, drops what cannot be played and records why in the
[`ExportReport`].
"#]

use crate::{
    NoteError,
    file::{TicksPerQuarterNote, TrackKind},
    message::channel::Velocity,
    pitch::{Pitch, ResolvedPitch, resolve_midi_number, resolve_pitch},
    report::{DiagnosticKind, ExportReport},
    vlq::MAX_VLQ,
};

/// Velocity of every chord tone.
pub const CHORD_VELOCITY: Velocity = Velocity::clamped(80);
/// Velocity of every derived bass note.
pub const BASS_VELOCITY: Velocity = Velocity::clamped(90);
/// Velocity of a melody note that does not specify one.
pub const DEFAULT_NOTE_VELOCITY: f64 = 0.8;

/// A pitch as the caller spells it: a note name or a MIDI note number.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(untagged)
)]
pub enum PitchInput {
    /// A MIDI note number. Clamped into `0..=127`.
    Number(i64),
    /// A note name such as `"F#4"`
    Name(String),
}

impl From<&str> for PitchInput {
    fn from(value: &str) -> Self {
        Self::Name(value.to_string())
    }
}

impl From<i64> for PitchInput {
    fn from(value: i64) -> Self {
        Self::Number(value)
    }
}

/// One melody note.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(rename_all = "camelCase")
)]
pub struct MelodyNote {
    /// The pitch. A note without one is skipped.
    #[cfg_attr(feature = "serde", serde(default))]
    pub pitch: Option<PitchInput>,
    /// Length in beats
    pub duration: f64,
    /// Loudness in `[0, 1]`
    #[cfg_attr(feature = "serde", serde(default = "default_velocity"))]
    pub velocity: f64,
    /// Onset in beats from the start of the file
    #[cfg_attr(feature = "serde", serde(default))]
    pub start_time: f64,
}

#[cfg(feature = "serde")]
fn default_velocity() -> f64 {
    DEFAULT_NOTE_VELOCITY
}

impl MelodyNote {
    /// Create a new melody note
    pub fn new(pitch: impl Into<PitchInput>, start_time: f64, duration: f64, velocity: f64) -> Self {
        Self {
            pitch: Some(pitch.into()),
            duration,
            velocity,
            start_time,
        }
    }
}

/// A melody.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(rename_all = "camelCase")
)]
pub struct NoteData {
    /// The notes, in any order
    #[cfg_attr(feature = "serde", serde(default))]
    pub notes: Vec<MelodyNote>,
    /// Beats per minute the melody was generated at
    #[cfg_attr(feature = "serde", serde(default))]
    pub tempo: Option<f64>,
}

impl NoteData {
    /// Create a melody from notes
    pub fn new(notes: Vec<MelodyNote>) -> Self {
        Self { notes, tempo: None }
    }

    /// Sets the tempo
    pub fn with_tempo(mut self, bpm: f64) -> Self {
        self.tempo = Some(bpm);
        self
    }
}

/// One chord of a progression.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(rename_all = "camelCase")
)]
pub struct ChordEvent {
    /// Root note name. Usually has no octave, e.g. `"C"`. The bass plays it.
    pub root: String,
    /// Chord tones, lowest first. Repeats are allowed.
    pub notes: Vec<String>,
    /// Length in bars
    pub duration: f64,
    /// Onset in bars from the start of the file
    #[cfg_attr(feature = "serde", serde(default))]
    pub position: f64,
}

impl ChordEvent {
    /// Create a new chord
    pub fn new<S: Into<String>>(
        root: impl Into<String>,
        notes: impl IntoIterator<Item = S>,
        position: f64,
        duration: f64,
    ) -> Self {
        Self {
            root: root.into(),
            notes: notes.into_iter().map(Into::into).collect(),
            duration,
            position,
        }
    }
}

/// A chord progression.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(rename_all = "camelCase")
)]
pub struct ChordData {
    /// The chords, in any order
    #[cfg_attr(feature = "serde", serde(default))]
    pub progression: Vec<ChordEvent>,
    /// Beats per minute the progression was generated at
    #[cfg_attr(feature = "serde", serde(default))]
    pub tempo: Option<f64>,
}

impl ChordData {
    /// Create a progression from chords
    pub fn new(progression: Vec<ChordEvent>) -> Self {
        Self {
            progression,
            tempo: None,
        }
    }

    /// Sets the tempo
    pub fn with_tempo(mut self, bpm: f64) -> Self {
        self.tempo = Some(bpm);
        self
    }
}

#[doc = r#"
One normalized note or chord, on the tick grid.

All pitches sound together from `start` for `duration` ticks.
`duration` is at least one tick.
"#]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VoiceNote {
    /// Onset tick
    pub start: u32,
    /// Length in ticks
    pub duration: u32,
    /// One pitch for a melody or bass note, one per tone for a chord
    pub pitches: Vec<Pitch>,
    /// Note-on velocity for every pitch
    pub velocity: Velocity,
}

impl VoiceNote {
    /// The tick the note-offs fall on
    pub const fn end(&self) -> u32 {
        self.start + self.duration
    }
}

/// Converts the caller's time values into ticks, recording anything that was off.
pub struct Normalizer<'r> {
    tpqn: TicksPerQuarterNote,
    beats_per_bar: u8,
    report: &'r mut ExportReport,
}

impl<'r> Normalizer<'r> {
    /// Create a normalizer writing diagnostics into `report`.
    pub fn new(tpqn: TicksPerQuarterNote, beats_per_bar: u8, report: &'r mut ExportReport) -> Self {
        Self {
            tpqn,
            beats_per_bar,
            report,
        }
    }

    /// Resolves and times the melody, sorted by onset. Ties keep input order.
    pub fn melody(&mut self, notes: &[MelodyNote]) -> Vec<VoiceNote> {
        let mut out = Vec::with_capacity(notes.len());
        for (index, note) in notes.iter().enumerate() {
            match self.melody_note(index, note) {
                Ok(voice) => out.push(voice),
                Err(e) => self.skip(TrackKind::Melody, index, e),
            }
        }
        out.sort_by_key(|n| n.start);
        out
    }

    fn melody_note(&mut self, index: usize, note: &MelodyNote) -> Result<VoiceNote, NoteError> {
        let track = TrackKind::Melody;
        let pitch = note.pitch.as_ref().ok_or(NoteError::MissingPitch)?;
        let (start, duration) = self.span(index, track, note.start_time, note.duration)?;

        let velocity =
            Velocity::from_unit(note.velocity).ok_or(NoteError::InvalidVelocity(note.velocity))?;
        let resolved = match pitch {
            PitchInput::Number(n) => resolve_midi_number(*n),
            PitchInput::Name(name) => resolve_pitch(name)?,
        };
        self.check_resolved(track, index, pitch_name(pitch), &resolved);

        if !(0. ..=1.).contains(&note.velocity) {
            self.report.push(
                track,
                index,
                DiagnosticKind::VelocityClamped {
                    requested: note.velocity,
                    velocity: velocity.byte(),
                },
            );
        }

        Ok(VoiceNote {
            start,
            duration,
            pitches: vec![resolved.pitch],
            velocity,
        })
    }

    /// Resolves and times every chord, sorted by onset. Ties keep input order.
    ///
    /// Unresolvable tones are dropped from their chord. A chord left with no
    /// tones is dropped.
    pub fn chords(&mut self, progression: &[ChordEvent]) -> Vec<VoiceNote> {
        let mut out = Vec::with_capacity(progression.len());
        for (index, chord) in progression.iter().enumerate() {
            match self.chord(index, chord) {
                Ok(voice) => out.push(voice),
                Err(e) => self.skip(TrackKind::Chords, index, e),
            }
        }
        out.sort_by_key(|n| n.start);
        out
    }

    fn chord(&mut self, index: usize, chord: &ChordEvent) -> Result<VoiceNote, NoteError> {
        let track = TrackKind::Chords;
        let (start, duration) = self.bar_span(index, track, chord)?;

        let mut pitches: Vec<Pitch> = Vec::with_capacity(chord.notes.len());
        for (tone, name) in chord.notes.iter().enumerate() {
            let resolved = match resolve_pitch(name) {
                Ok(resolved) => resolved,
                Err(error) => {
                    self.report
                        .push(track, index, DiagnosticKind::ToneSkipped { tone, error });
                    continue;
                }
            };
            self.check_resolved(track, index, Some(name), &resolved);
            if pitches.contains(&resolved.pitch) {
                self.report.push(
                    track,
                    index,
                    DiagnosticKind::DuplicateTone {
                        tone,
                        pitch: resolved.pitch.byte(),
                    },
                );
                continue;
            }
            pitches.push(resolved.pitch);
        }
        if pitches.is_empty() {
            return Err(NoteError::EmptyChord);
        }

        Ok(VoiceNote {
            start,
            duration,
            pitches,
            velocity: CHORD_VELOCITY,
        })
    }

    /// One bass note per chord: the root, an octave below octave 4 (or below the
    /// octave the root names), for the length of the chord.
    pub fn bass(&mut self, progression: &[ChordEvent]) -> Vec<VoiceNote> {
        let mut out = Vec::with_capacity(progression.len());
        for (index, chord) in progression.iter().enumerate() {
            match self.bass_note(index, chord) {
                Ok(voice) => out.push(voice),
                Err(e) => self.skip(TrackKind::Bass, index, e),
            }
        }
        out.sort_by_key(|n| n.start);
        out
    }

    fn bass_note(&mut self, index: usize, chord: &ChordEvent) -> Result<VoiceNote, NoteError> {
        let track = TrackKind::Bass;
        let (start, duration) = self.bar_span(index, track, chord)?;
        // roots are conventionally written without an octave, so no diagnostic for that
        let root = resolve_pitch(&chord.root)?;
        let bass = resolve_midi_number(root.requested.saturating_sub(12));
        if bass.was_clamped() {
            self.report.push(
                track,
                index,
                DiagnosticKind::PitchClamped {
                    requested: bass.requested,
                    pitch: bass.pitch.byte(),
                },
            );
        }
        Ok(VoiceNote {
            start,
            duration,
            pitches: vec![bass.pitch],
            velocity: BASS_VELOCITY,
        })
    }

    fn bar_span(
        &mut self,
        index: usize,
        track: TrackKind,
        chord: &ChordEvent,
    ) -> Result<(u32, u32), NoteError> {
        let bar = self.beats_per_bar as f64;
        if !chord.position.is_finite() || chord.position < 0. {
            return Err(NoteError::InvalidStartTime(chord.position));
        }
        if !chord.duration.is_finite() || chord.duration <= 0. {
            return Err(NoteError::InvalidDuration(chord.duration));
        }
        self.span(index, track, chord.position * bar, chord.duration * bar)
    }

    /// Converts an onset and length in beats to ticks.
    fn span(
        &mut self,
        index: usize,
        track: TrackKind,
        start: f64,
        duration: f64,
    ) -> Result<(u32, u32), NoteError> {
        let start_ticks = self
            .tpqn
            .beats_to_ticks(start)
            .ok_or(NoteError::InvalidStartTime(start))?;
        if !duration.is_finite() || duration <= 0. {
            return Err(NoteError::InvalidDuration(duration));
        }
        let mut duration_ticks = self
            .tpqn
            .beats_to_ticks(duration)
            .ok_or(NoteError::InvalidDuration(duration))?;
        if duration_ticks == 0 {
            self.report.push(
                track,
                index,
                DiagnosticKind::DurationExtended {
                    requested: duration,
                },
            );
            duration_ticks = 1;
        }
        if start_ticks as u64 + duration_ticks as u64 > MAX_VLQ as u64 {
            return Err(NoteError::InvalidDuration(duration));
        }
        Ok((start_ticks, duration_ticks))
    }

    fn check_resolved(
        &mut self,
        track: TrackKind,
        index: usize,
        name: Option<&String>,
        resolved: &ResolvedPitch,
    ) {
        if let (true, Some(name)) = (resolved.octave_defaulted, name) {
            self.report.push(
                track,
                index,
                DiagnosticKind::OctaveDefaulted { name: name.clone() },
            );
        }
        if resolved.was_clamped() {
            self.report.push(
                track,
                index,
                DiagnosticKind::PitchClamped {
                    requested: resolved.requested,
                    pitch: resolved.pitch.byte(),
                },
            );
        }
    }

    fn skip(&mut self, track: TrackKind, index: usize, error: NoteError) {
        self.report
            .push(track, index, DiagnosticKind::Skipped(error));
    }
}

fn pitch_name(pitch: &PitchInput) -> Option<&String> {
    match pitch {
        PitchInput::Name(name) => Some(name),
        PitchInput::Number(_) => None,
    }
}

#[cfg(test)]
fn normalizer(report: &mut ExportReport) -> Normalizer<'_> {
    Normalizer::new(TicksPerQuarterNote::new(480), 4, report)
}

#[test]
fn melody_sorted_stably() {
    let mut report = ExportReport::default();
    let notes = vec![
        MelodyNote::new("E4", 1., 1., 0.7),
        MelodyNote::new("C4", 0., 1., 0.8),
        MelodyNote::new("G4", 1., 0.5, 0.7),
    ];
    let voices = normalizer(&mut report).melody(&notes);
    let starts: Vec<_> = voices.iter().map(|v| (v.start, v.pitches[0].byte())).collect();
    assert_eq!(starts, vec![(0, 60), (480, 64), (480, 67)]);
    assert_eq!(voices[2].duration, 240);
    assert!(report.is_clean());
}

#[test]
fn malformed_notes_are_skipped() {
    let mut report = ExportReport::default();
    let mut missing = MelodyNote::new("C4", 0., 1., 0.8);
    missing.pitch = None;
    let notes = vec![
        missing,
        MelodyNote::new("C4", 0., f64::NAN, 0.8),
        MelodyNote::new("C4", -1., 1., 0.8),
        MelodyNote::new("C4", 0., -1., 0.8),
        MelodyNote::new("H4", 0., 1., 0.8),
        MelodyNote::new("C4", 0., 1., f64::INFINITY),
        MelodyNote::new("D4", 2., 1., 0.8),
    ];
    let voices = normalizer(&mut report).melody(&notes);
    assert_eq!(voices.len(), 1);
    assert_eq!(report.skipped(), 6);
    let errors: Vec<_> = report
        .diagnostics()
        .iter()
        .map(|d| match &d.kind {
            DiagnosticKind::Skipped(e) => e.clone(),
            other => panic!("{other:?}"),
        })
        .collect();
    assert!(matches!(errors[0], NoteError::MissingPitch));
    assert!(matches!(errors[1], NoteError::InvalidDuration(_)));
    assert!(matches!(errors[2], NoteError::InvalidStartTime(_)));
    assert!(matches!(errors[3], NoteError::InvalidDuration(_)));
    assert!(matches!(errors[4], NoteError::InvalidPitchName(_)));
    assert!(matches!(errors[5], NoteError::InvalidVelocity(_)));
}

#[test]
fn clamps_are_reported() {
    let mut report = ExportReport::default();
    let notes = vec![
        MelodyNote::new(200i64, 0., 1., 1.5),
        MelodyNote::new("A", 1., 0.0001, 0.5),
    ];
    let voices = normalizer(&mut report).melody(&notes);
    assert_eq!(voices[0].pitches[0].byte(), 127);
    assert_eq!(voices[0].velocity, Velocity::MAX);
    assert_eq!(voices[1].pitches[0].byte(), 69);
    assert_eq!(voices[1].duration, 1);
    assert_eq!(
        report
            .diagnostics()
            .iter()
            .map(|d| &d.kind)
            .collect::<Vec<_>>(),
        vec![
            &DiagnosticKind::PitchClamped {
                requested: 200,
                pitch: 127
            },
            &DiagnosticKind::VelocityClamped {
                requested: 1.5,
                velocity: 127
            },
            &DiagnosticKind::DurationExtended { requested: 0.0001 },
            &DiagnosticKind::OctaveDefaulted {
                name: "A".to_string()
            },
        ]
    );
}

#[test]
fn chords_in_bars() {
    let mut report = ExportReport::default();
    let progression = vec![
        ChordEvent::new("F", ["F3", "A3", "C4", "A3"], 1., 1.),
        ChordEvent::new("C", ["C4", "E4", "G4"], 0., 1.),
        ChordEvent::new("G", ["X4", "Q2"], 2., 1.),
        ChordEvent::new("G", ["G3", "B3", "Zz"], 2., 0.5),
    ];
    let voices = normalizer(&mut report).chords(&progression);
    assert_eq!(voices.len(), 3);
    assert_eq!(voices[0].start, 0);
    assert_eq!(voices[0].duration, 1920);
    assert_eq!(voices[1].start, 1920);
    assert_eq!(
        voices[1].pitches.iter().map(Pitch::byte).collect::<Vec<_>>(),
        vec![53, 57, 60]
    );
    assert_eq!(voices[2].start, 3840);
    assert_eq!(voices[2].duration, 960);
    assert_eq!(voices[2].pitches.len(), 2);
    assert_eq!(report.skipped(), 1);
    assert_eq!(voices[0].velocity, CHORD_VELOCITY);
}

#[test]
fn bass_is_an_octave_below_the_root() {
    let mut report = ExportReport::default();
    let progression = vec![
        ChordEvent::new("C", ["C4", "E4", "G4"], 0., 1.),
        ChordEvent::new("Bb", ["Bb3", "D4", "F4"], 1., 1.),
        ChordEvent::new("E2", ["E3"], 2., 1.),
        ChordEvent::new("?", ["E3"], 3., 1.),
    ];
    let voices = normalizer(&mut report).bass(&progression);
    assert_eq!(
        voices.iter().map(|v| v.pitches[0].byte()).collect::<Vec<_>>(),
        vec![48, 58, 28]
    );
    assert_eq!(voices[0].velocity, BASS_VELOCITY);
    assert_eq!(report.skipped(), 1);
}

#[test]
fn bass_from_an_absurd_root_clamps() {
    let mut report = ExportReport::default();
    let progression = vec![
        ChordEvent::new(format!("C{}", i64::MIN), ["C4"], 0., 1.),
        ChordEvent::new("C-768614336404564651", ["C4"], 1., 1.),
        ChordEvent::new(format!("G{}", i64::MAX), ["C4"], 2., 1.),
    ];
    let voices = normalizer(&mut report).bass(&progression);
    assert_eq!(
        voices.iter().map(|v| v.pitches[0].byte()).collect::<Vec<_>>(),
        vec![0, 0, 127]
    );
    assert_eq!(report.skipped(), 0);
    assert!(
        report
            .diagnostics()
            .iter()
            .all(|d| matches!(d.kind, DiagnosticKind::PitchClamped { .. }))
    );
}
