#![doc = r#"
Writing Standard MIDI Files: the header, track chunks and the assembler that
puts them together.
"#]

/// Contains the [`MidiFileBuilder`](builder::MidiFileBuilder) and chunk framing.
pub mod builder;
pub use builder::FormatType;

mod header;
pub use header::*;

mod track;
pub use track::*;

mod timing;
pub use timing::*;
