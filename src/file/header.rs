use crate::file::{
    FormatType, TicksPerQuarterNote,
    builder::chunk::{HEADER_LENGTH, HEADER_TAG},
};

#[doc = r#"
The contents of the `MThd` chunk: format, track count and division.

Always 14 bytes once written.
"#]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MidiFileHeader {
    format: FormatType,
    num_tracks: u16,
    timing: TicksPerQuarterNote,
}

impl MidiFileHeader {
    /// Create a new header
    pub const fn new(format: FormatType, num_tracks: u16, timing: TicksPerQuarterNote) -> Self {
        Self {
            format,
            num_tracks,
            timing,
        }
    }
    /// Get the format
    pub const fn format(&self) -> FormatType {
        self.format
    }
    /// The number of track chunks that follow
    pub const fn num_tracks(&self) -> u16 {
        self.num_tracks
    }
    /// Get the timing props
    pub const fn timing(&self) -> &TicksPerQuarterNote {
        &self.timing
    }

    /// Appends the complete header chunk.
    pub fn write(&self, buf: &mut Vec<u8>) {
        buf.extend_from_slice(HEADER_TAG);
        buf.extend_from_slice(&HEADER_LENGTH.to_be_bytes());
        buf.extend_from_slice(&self.format.to_bytes());
        buf.extend_from_slice(&self.num_tracks.to_be_bytes());
        buf.extend_from_slice(&self.timing.to_bytes());
    }
}

#[test]
fn header_bytes() {
    use pretty_assertions::assert_eq;
    let mut buf = Vec::new();
    MidiFileHeader::new(FormatType::Simultaneous, 3, TicksPerQuarterNote::new(480)).write(&mut buf);
    assert_eq!(
        buf,
        vec![
            0x4D, 0x54, 0x68, 0x64, 0x00, 0x00, 0x00, 0x06, 0x00, 0x01, 0x00, 0x03, 0x01, 0xE0
        ]
    );
}
