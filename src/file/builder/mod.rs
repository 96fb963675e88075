mod format;
pub use format::*;

pub mod chunk;

use crate::{
    EncodeError, EncodeResult,
    file::{MidiFileHeader, TicksPerQuarterNote, TrackKind, TrackSpec},
    reader,
};

#[derive(Default)]
enum ControlStage {
    #[default]
    Missing,
    Present(TrackSpec),
}

#[doc = r#"
Assembles sealed tracks into a complete Standard MIDI File.

The control track is always written first, then the musical tracks in the
order of [`TrackKind`]: melody, chords, bass. The finished buffer is read back
with [`reader::verify`] before it is returned, so a buffer handed to the
caller always has a correct header, correct chunk lengths and balanced notes.
"#]
#[derive(Default)]
pub struct MidiFileBuilder {
    timing: TicksPerQuarterNote,
    control: ControlStage,
    tracks: Vec<TrackSpec>,
}

impl MidiFileBuilder {
    /// A builder for a file on the given division.
    pub fn new(timing: TicksPerQuarterNote) -> Self {
        Self {
            timing,
            ..Default::default()
        }
    }

    /// Adds a sealed track. A control track replaces any earlier control track.
    pub fn push_track(&mut self, track: TrackSpec) -> &mut Self {
        if track.kind() == TrackKind::Control {
            self.control = ControlStage::Present(track);
        } else {
            self.tracks.push(track);
        }
        self
    }

    /// The number of musical tracks added so far.
    pub fn musical_tracks(&self) -> usize {
        self.tracks.len()
    }

    /// Writes the header and every track chunk, then verifies the result.
    ///
    /// # Errors
    /// - [`EncodeError::NothingToExport`] if no musical track was added
    /// - [`EncodeError::AssemblyFailure`] if the written bytes fail verification
    pub fn build(self) -> EncodeResult<Vec<u8>> {
        if self.tracks.is_empty() {
            return Err(EncodeError::NothingToExport);
        }
        let mut tracks = Vec::with_capacity(self.tracks.len() + 1);
        if let ControlStage::Present(control) = self.control {
            tracks.push(control);
        }
        let mut musical = self.tracks;
        musical.sort_by_key(TrackSpec::kind);
        tracks.extend(musical);

        let num_tracks =
            u16::try_from(tracks.len()).map_err(|_| EncodeError::TooManyTracks(tracks.len()))?;
        let header = MidiFileHeader::new(FormatType::Simultaneous, num_tracks, self.timing);

        let mut buf = Vec::new();
        header.write(&mut buf);
        for track in &tracks {
            track.write(&mut buf)?;
        }

        let summary = reader::verify(&buf)?;
        tracing::debug!(
            bytes = buf.len(),
            tracks = summary.tracks.len(),
            note_ons = summary.tracks.iter().map(|t| t.note_ons).sum::<usize>(),
            "assembled file"
        );
        Ok(buf)
    }
}
