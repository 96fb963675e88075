use std::path::{Path, PathBuf};

use crate::{
    EncodeResult,
    file::{
        TicksPerQuarterNote, TrackBuilder, TrackKind, TrackPlan, build_track,
        builder::MidiFileBuilder,
    },
    input::{ChordData, NoteData, Normalizer, VoiceNote},
    message::{
        MetaMessage,
        channel::{Channel, Program},
    },
    options::ExportOptions,
    report::{DiagnosticKind, ExportReport},
    tempo::{Tempo, TimeSignature},
};

/// File name used when the caller gives none.
pub const DEFAULT_FILE_NAME: &str = "export.mid";

#[doc = r#"
The encoder context.

Holds what stays fixed across exports: the division and the time signature.
It owns no state between calls, so one instance can serve any number of
exports.

# Example
```rust
# use smf_export::prelude::*;
let melody = NoteData::new(vec![
    MelodyNote::new("C4", 0., 1., 0.8),
    MelodyNote::new("E4", 1., 1., 0.7),
])
.with_tempo(120.);

let file = Encoder::default()
    .encode(Some(&melody), None, "Sketch", &ExportOptions::default())
    .unwrap();

assert_eq!(&file.bytes()[..4], b"MThd");
assert!(file.report().is_clean());
```
"#]
#[derive(Debug, Clone, Copy, Default)]
pub struct Encoder {
    timing: TicksPerQuarterNote,
    time_signature: TimeSignature,
}

impl Encoder {
    /// An encoder writing files with the given division.
    pub fn new(timing: TicksPerQuarterNote) -> Self {
        Self {
            timing,
            time_signature: TimeSignature::COMMON,
        }
    }

    /// The division every tick is computed on.
    pub fn timing(&self) -> TicksPerQuarterNote {
        self.timing
    }

    #[doc = r#"
Encodes a melody and/or chord progression into a format 1 file.

Bad notes and chords are skipped or corrected and listed in the returned
report. A track with nothing playable is left out.

# Errors
- [`EncodeError::NothingToExport`](crate::EncodeError::NothingToExport) if no
  melody, chord or bass track has a playable note
- [`EncodeError::InvalidChannel`](crate::EncodeError::InvalidChannel) /
  [`EncodeError::InvalidProgram`](crate::EncodeError::InvalidProgram) for a
  misconfigured track that would have been written
- [`EncodeError::AssemblyFailure`](crate::EncodeError::AssemblyFailure) if the
  written file fails its own verification
"#]
    pub fn encode(
        &self,
        note_data: Option<&NoteData>,
        chord_data: Option<&ChordData>,
        sequence_name: &str,
        options: &ExportOptions,
    ) -> EncodeResult<EncodedFile> {
        let mut report = ExportReport::default();
        let tempo = resolve_tempo(options, note_data, chord_data, &mut report);
        if options.humanize {
            report.push(TrackKind::Control, 0, DiagnosticKind::HumanizeIgnored);
        }

        let mut normalizer = Normalizer::new(
            self.timing,
            self.time_signature.numerator(),
            &mut report,
        );
        let melody = match note_data {
            Some(data) if options.include_melody => normalizer.melody(&data.notes),
            _ => Vec::new(),
        };
        let (chords, bass) = match chord_data {
            Some(data) => (
                if options.include_chords {
                    normalizer.chords(&data.progression)
                } else {
                    Vec::new()
                },
                if options.include_bass {
                    normalizer.bass(&data.progression)
                } else {
                    Vec::new()
                },
            ),
            None => (Vec::new(), Vec::new()),
        };

        let plans = [
            (TrackKind::Melody, &melody, options.melody_channel, options.melody_instrument),
            (TrackKind::Chords, &chords, options.chord_channel, options.chord_instrument),
            (TrackKind::Bass, &bass, options.bass_channel, options.bass_instrument),
        ];

        let mut builder = MidiFileBuilder::new(self.timing);
        let mut song_end = 0;
        for (kind, notes, channel, program) in plans {
            if notes.is_empty() {
                continue;
            }
            let plan = TrackPlan {
                kind,
                channel: Channel::from_number(channel)?,
                program: Program::new(program)?,
                notes,
                expression: options.apply_expression && kind == TrackKind::Melody,
            };
            if let Some(track) = build_track(&plan)? {
                builder.push_track(track);
            }
            song_end = song_end.max(notes.iter().map(VoiceNote::end).max().unwrap_or(0));
        }

        let mut control = TrackBuilder::new(TrackKind::Control, Channel::One);
        control
            .name(ascii_name(sequence_name))?
            .push(0, MetaMessage::Tempo(tempo))?
            .push(0, MetaMessage::TimeSignature(self.time_signature))?;
        builder.push_track(control.seal_at(song_end)?);

        let bytes = builder.build()?;
        tracing::debug!(
            bytes = bytes.len(),
            skipped = report.skipped(),
            diagnostics = report.diagnostics().len(),
            "encoded {sequence_name:?}"
        );
        Ok(EncodedFile { bytes, report })
    }
}

/// `options.tempo`, else the melody's tempo, else the progression's, else 120.
fn resolve_tempo(
    options: &ExportOptions,
    note_data: Option<&NoteData>,
    chord_data: Option<&ChordData>,
    report: &mut ExportReport,
) -> Tempo {
    let requested = options
        .tempo
        .or_else(|| note_data.and_then(|d| d.tempo))
        .or_else(|| chord_data.and_then(|d| d.tempo));
    let Some(bpm) = requested else {
        return Tempo::default();
    };
    Tempo::from_bpm(bpm).unwrap_or_else(|| {
        report.push(
            TrackKind::Control,
            0,
            DiagnosticKind::TempoDefaulted { requested: bpm },
        );
        Tempo::default()
    })
}

/// The bytes of an encoded file and what had to be skipped or corrected.
#[derive(Debug, Clone, PartialEq)]
pub struct EncodedFile {
    bytes: Vec<u8>,
    report: ExportReport,
}

impl EncodedFile {
    /// The complete Standard MIDI File
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }
    /// Diagnostics raised while encoding
    pub fn report(&self) -> &ExportReport {
        &self.report
    }
    /// Takes the bytes, dropping the report
    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }
}

/// A named file ready to hand to a download or storage layer.
#[derive(Debug, Clone, PartialEq)]
pub struct MidiExport {
    file_name: String,
    file: EncodedFile,
}

impl MidiExport {
    /// The file name, always ending in `.mid`
    pub fn file_name(&self) -> &str {
        &self.file_name
    }
    /// The complete Standard MIDI File
    pub fn bytes(&self) -> &[u8] {
        self.file.bytes()
    }
    /// Diagnostics raised while encoding
    pub fn report(&self) -> &ExportReport {
        self.file.report()
    }
    /// Takes the bytes, dropping the name and report
    pub fn into_bytes(self) -> Vec<u8> {
        self.file.into_bytes()
    }

    /// Writes the file into `dir` under [`MidiExport::file_name`].
    pub fn write_to(&self, dir: impl AsRef<Path>) -> std::io::Result<PathBuf> {
        let path = dir.as_ref().join(&self.file_name);
        std::fs::write(&path, self.bytes())?;
        tracing::info!(path = %path.display(), bytes = self.bytes().len(), "wrote MIDI file");
        Ok(path)
    }
}

#[doc = r#"
Encodes with the default [`Encoder`] and names the result.

`file_name` gets a `.mid` extension if it has none, and path separators are
replaced. Its stem becomes the sequence name in the control track.

# Example
```rust
# use smf_export::prelude::*;
let chords = ChordData::new(vec![ChordEvent::new("C", ["C4", "E4", "G4"], 0., 1.)]);

let export = export_midi(None, Some(&chords), "progression", &ExportOptions::default()).unwrap();
assert_eq!(export.file_name(), "progression.mid");

let nothing = export_midi(None, None, "empty", &ExportOptions::default());
assert!(matches!(nothing, Err(EncodeError::NothingToExport)));
```
"#]
pub fn export_midi(
    note_data: Option<&NoteData>,
    chord_data: Option<&ChordData>,
    file_name: &str,
    options: &ExportOptions,
) -> EncodeResult<MidiExport> {
    let file_name = normalize_file_name(file_name);
    let stem = file_name
        .rsplit_once('.')
        .map(|(stem, _)| stem)
        .unwrap_or(&file_name);
    let file = Encoder::default().encode(note_data, chord_data, stem, options)?;
    Ok(MidiExport { file_name, file })
}

/// Track names are written as ASCII. Anything else, and control characters, become `_`.
fn ascii_name(name: &str) -> String {
    name.chars()
        .map(|c| if c.is_ascii() && !c.is_ascii_control() { c } else { '_' })
        .collect()
}

fn normalize_file_name(file_name: &str) -> String {
    let cleaned: String = file_name
        .trim()
        .chars()
        .map(|c| if matches!(c, '/' | '\\') { '_' } else { c })
        .collect();
    if cleaned.is_empty() {
        return DEFAULT_FILE_NAME.to_string();
    }
    let lower = cleaned.to_ascii_lowercase();
    if lower.ends_with(".mid") || lower.ends_with(".midi") {
        cleaned
    } else {
        format!("{cleaned}.mid")
    }
}

#[test]
fn file_names() {
    assert_eq!(normalize_file_name("song"), "song.mid");
    assert_eq!(normalize_file_name(" Song.MID "), "Song.MID");
    assert_eq!(normalize_file_name("a.midi"), "a.midi");
    assert_eq!(normalize_file_name("../up"), ".._up.mid");
    assert_eq!(normalize_file_name("   "), DEFAULT_FILE_NAME);
}

#[test]
fn sequence_names_are_ascii() {
    assert_eq!(ascii_name("Café au lait"), "Caf_ au lait");
    assert_eq!(ascii_name("tab\there"), "tab_there");
    assert_eq!(ascii_name("♪"), "_");
}

#[test]
fn tempo_precedence() {
    let mut report = ExportReport::default();
    let melody = NoteData::default().with_tempo(90.);
    let chords = ChordData::default().with_tempo(100.);
    let mut options = ExportOptions::default();

    let tempo = resolve_tempo(&options, Some(&melody), Some(&chords), &mut report);
    assert_eq!(tempo, Tempo::from_bpm(90.).unwrap());

    let tempo = resolve_tempo(&options, None, Some(&chords), &mut report);
    assert_eq!(tempo, Tempo::from_bpm(100.).unwrap());

    options.tempo = Some(140.);
    let tempo = resolve_tempo(&options, Some(&melody), Some(&chords), &mut report);
    assert_eq!(tempo, Tempo::from_bpm(140.).unwrap());
    assert!(report.is_clean());

    options.tempo = Some(-5.);
    let tempo = resolve_tempo(&options, Some(&melody), None, &mut report);
    assert_eq!(tempo, Tempo::default());
    assert_eq!(
        report.diagnostics()[0].kind,
        DiagnosticKind::TempoDefaulted { requested: -5. }
    );

    let tempo = resolve_tempo(&ExportOptions::default(), None, None, &mut report);
    assert_eq!(tempo.micros_per_quarter_note(), 500_000);
}
