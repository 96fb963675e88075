#![doc = r#"
# smf-export

Writes melodies and chord progressions as Standard MIDI Files (format 1).

A file holds a control track (sequence name, tempo, time signature) followed
by a melody, a chord and a bass track. Any of the musical tracks may be absent.
The encoder never panics on bad input: unplayable notes are skipped, pitches and
velocities are clamped, and each correction is listed in an [`ExportReport`].

## Example
```rust
use smf_export::prelude::*;

let melody = NoteData::new(vec![
    MelodyNote::new("C4", 0., 1., 0.8),
    MelodyNote::new("E4", 1., 1., 0.8),
]);
let chords = ChordData::new(vec![ChordEvent::new("C", ["C4", "E4", "G4"], 0., 1.)])
    .with_tempo(96.);

let export = export_midi(Some(&melody), Some(&chords), "sketch", &ExportOptions::default()).unwrap();

let summary = smf_export::reader::verify(export.bytes()).unwrap();
assert_eq!(summary.header.num_tracks(), 4);
```

## Features
- `serde` (default): the options and input types implement `Serialize` and
  `Deserialize`, so the JSON a generator produces can be read directly.
"#]
#![warn(missing_docs)]

mod error;
pub use error::*;

pub mod encoder;
pub mod file;
pub mod input;
pub mod message;
pub mod options;
pub mod pitch;
pub mod reader;
pub mod report;
pub mod tempo;
pub mod vlq;

pub use encoder::{EncodedFile, Encoder, MidiExport, export_midi};
pub use options::ExportOptions;
pub use report::ExportReport;

/// Commonly used types
pub mod prelude {
    pub use crate::{
        EncodeError, EncodeResult, NoteError,
        encoder::*,
        file::{FormatType, TicksPerQuarterNote, TrackKind, TrackStage},
        input::{ChordData, ChordEvent, MelodyNote, NoteData, PitchInput},
        message::channel::{Channel, Program, Velocity},
        options::ExportOptions,
        pitch::{Octave, Pitch, PitchClass, resolve_pitch},
        report::{Diagnostic, DiagnosticKind, ExportReport},
        tempo::{Tempo, TimeSignature},
    };
}
