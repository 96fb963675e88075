#![doc = r#"
Reads back the files the encoder writes.

This is not a general MIDI parser. It understands exactly the chunks and
events [`encode`](crate::Encoder::encode) produces: no running status, no
system exclusive, ticks-per-quarter-note division only. Anything else is an
error.

[`verify`] walks a whole file and checks the framing invariants: tags,
declared lengths, track count, end-of-track placement, and that every
note-on is released on the same channel and key.
"#]

mod error;
pub use error::*;

use crate::{
    file::{FormatType, MidiFileHeader, TicksPerQuarterNote, builder::chunk::*},
    message::MetaType,
    vlq::decode_vlq,
};

/// A cursor over the bytes of a MIDI file.
pub struct Reader<'a> {
    bytes: &'a [u8],
    position: usize,
}

impl<'a> Reader<'a> {
    /// Read from a byte slice
    pub const fn from_byte_slice(bytes: &'a [u8]) -> Self {
        Self { bytes, position: 0 }
    }

    /// Offset of the next unread byte
    pub const fn buffer_position(&self) -> usize {
        self.position
    }

    fn take(&mut self, len: usize) -> ReadResult<&'a [u8]> {
        let end = self
            .position
            .checked_add(len)
            .filter(|end| *end <= self.bytes.len())
            .ok_or(ReaderError::oob(self.position))?;
        let slice = &self.bytes[self.position..end];
        self.position = end;
        Ok(slice)
    }

    fn take_array<const N: usize>(&mut self) -> ReadResult<[u8; N]> {
        let mut out = [0; N];
        out.copy_from_slice(self.take(N)?);
        Ok(out)
    }

    fn err(&self, kind: ReaderErrorKind) -> ReaderError {
        ReaderError::new(self.position, kind)
    }

    /// Reads a chunk tag and length, checking the tag.
    fn read_chunk_head(&mut self, expected: &[u8; 4]) -> ReadResult<u32> {
        let found = self.take_array::<4>()?;
        if &found != expected {
            return Err(self.err(ReaderErrorKind::Tag {
                expected: *expected,
                found,
            }));
        }
        Ok(u32::from_be_bytes(self.take_array()?))
    }

    /// Reads the `MThd` chunk. Must be called first.
    pub fn read_header(&mut self) -> ReadResult<MidiFileHeader> {
        let len = self.read_chunk_head(HEADER_TAG)?;
        if len != HEADER_LENGTH {
            return Err(self.err(ReaderErrorKind::HeaderLength(len)));
        }
        let format = u16::from_be_bytes(self.take_array()?);
        let format =
            FormatType::try_from(format).map_err(|_| self.err(ReaderErrorKind::Format(format)))?;
        let num_tracks = u16::from_be_bytes(self.take_array()?);
        let division = u16::from_be_bytes(self.take_array()?);
        if division & 0x8000 != 0 || division == 0 {
            return Err(self.err(ReaderErrorKind::Division(division)));
        }
        Ok(MidiFileHeader::new(
            format,
            num_tracks,
            TicksPerQuarterNote::new(division),
        ))
    }

    /// Reads the next `MTrk` chunk, or `None` at the end of the file.
    pub fn read_track(&mut self) -> ReadResult<Option<RawTrackChunk<'a>>> {
        if self.position == self.bytes.len() {
            return Ok(None);
        }
        let len = self.read_chunk_head(TRACK_TAG)?;
        let offset = self.position;
        let body = self.take(len as usize)?;
        Ok(Some(RawTrackChunk { offset, body }))
    }
}

/// The body of one track chunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawTrackChunk<'a> {
    offset: usize,
    body: &'a [u8],
}

impl<'a> RawTrackChunk<'a> {
    /// The declared length, which is the length of the body.
    pub fn len(&self) -> usize {
        self.body.len()
    }

    /// True for a zero length chunk
    pub fn is_empty(&self) -> bool {
        self.body.is_empty()
    }

    /// The delta-time and event pairs, undecoded.
    pub fn body(&self) -> &'a [u8] {
        self.body
    }

    /// Decodes every event. The last one must be end-of-track.
    pub fn events(&self) -> ReadResult<Vec<TrackEvent<'a>>> {
        let body: &'a [u8] = self.body;
        let mut events = Vec::new();
        let mut pos = 0;
        let mut tick: u32 = 0;
        let err = |pos: usize, kind: ReaderErrorKind| ReaderError::new(self.offset + pos, kind);
        let oob = |pos: usize| ReaderError::oob(self.offset + pos);

        while pos < body.len() {
            if events
                .last()
                .is_some_and(|e: &TrackEvent<'_>| e.is_end_of_track())
            {
                return Err(err(pos, ReaderErrorKind::EventsAfterEndOfTrack));
            }
            let (delta, read) = decode_vlq(&body[pos..]).map_err(|e| err(pos, e.into()))?;
            pos += read;
            tick = tick.saturating_add(delta);

            let status = *body.get(pos).ok_or(oob(pos))?;
            pos += 1;
            let channel = status & 0x0F;
            let data = |count: usize, pos: &mut usize| -> ReadResult<&'a [u8]> {
                let slice = body.get(*pos..*pos + count).ok_or(oob(*pos))?;
                *pos += count;
                Ok(slice)
            };

            let message = match status & 0xF0 {
                0x80 => {
                    let d = data(2, &mut pos)?;
                    EventMessage::NoteOff {
                        channel,
                        key: d[0],
                    }
                }
                0x90 => {
                    let d = data(2, &mut pos)?;
                    if d[1] == 0 {
                        EventMessage::NoteOff {
                            channel,
                            key: d[0],
                        }
                    } else {
                        EventMessage::NoteOn {
                            channel,
                            key: d[0],
                            velocity: d[1],
                        }
                    }
                }
                0xB0 => {
                    let d = data(2, &mut pos)?;
                    EventMessage::ControlChange {
                        channel,
                        controller: d[0],
                        value: d[1],
                    }
                }
                0xC0 => {
                    let d = data(1, &mut pos)?;
                    EventMessage::ProgramChange {
                        channel,
                        program: d[0],
                    }
                }
                0xF0 if status == 0xFF => {
                    let meta_type = data(1, &mut pos)?[0];
                    let (len, read) =
                        decode_vlq(&body[pos..]).map_err(|e| err(pos, e.into()))?;
                    pos += read;
                    let data = data(len as usize, &mut pos)?;
                    EventMessage::Meta { meta_type, data }
                }
                _ => return Err(err(pos - 1, ReaderErrorKind::Status(status))),
            };
            events.push(TrackEvent {
                delta,
                tick,
                message,
            });
        }

        if !events.last().is_some_and(|e| e.is_end_of_track()) {
            return Err(err(pos, ReaderErrorKind::MissingEndOfTrack));
        }
        Ok(events)
    }
}

/// A decoded event of a track chunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventMessage<'a> {
    /// `8n` or `9n` with velocity zero
    NoteOff {
        /// Zero-based channel
        channel: u8,
        /// MIDI note number
        key: u8,
    },
    /// `9n`
    NoteOn {
        /// Zero-based channel
        channel: u8,
        /// MIDI note number
        key: u8,
        /// Velocity, never zero
        velocity: u8,
    },
    /// `Bn`
    ControlChange {
        /// Zero-based channel
        channel: u8,
        /// Controller number
        controller: u8,
        /// Value
        value: u8,
    },
    /// `Cn`
    ProgramChange {
        /// Zero-based channel
        channel: u8,
        /// General MIDI program
        program: u8,
    },
    /// `FF`
    Meta {
        /// Type byte, see [`MetaType`]
        meta_type: u8,
        /// Data after the length
        data: &'a [u8],
    },
}

/// An event with its delta-time and the tick it accumulates to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrackEvent<'a> {
    /// Ticks since the previous event
    pub delta: u32,
    /// Ticks since the start of the track
    pub tick: u32,
    /// The event
    pub message: EventMessage<'a>,
}

impl TrackEvent<'_> {
    /// True for `FF 2F 00`
    pub fn is_end_of_track(&self) -> bool {
        matches!(
            self.message,
            EventMessage::Meta { meta_type, data } if meta_type == u8::from(MetaType::EndOfTrack) && data.is_empty()
        )
    }
}

/// What [`verify`] found in a file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileSummary {
    /// The header
    pub header: MidiFileHeader,
    /// One entry per track chunk, in file order
    pub tracks: Vec<TrackSummary>,
}

/// What [`verify`] found in one track chunk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackSummary {
    /// The declared body length
    pub len: usize,
    /// Number of events including end-of-track
    pub events: usize,
    /// Number of note-ons
    pub note_ons: usize,
    /// Tick of end-of-track
    pub end_tick: u32,
}

/// Walks a complete file, checking every framing invariant the encoder promises.
pub fn verify(bytes: &[u8]) -> ReadResult<FileSummary> {
    let mut reader = Reader::from_byte_slice(bytes);
    let header = reader.read_header()?;
    let mut tracks = Vec::with_capacity(header.num_tracks() as usize);

    while let Some(chunk) = reader.read_track()? {
        let events = chunk.events()?;
        let mut sounding = [0u32; 16 * 128];
        let mut note_ons = 0;
        for event in &events {
            match event.message {
                EventMessage::NoteOn { channel, key, .. } => {
                    sounding[channel as usize * 128 + (key & 0x7F) as usize] += 1;
                    note_ons += 1;
                }
                EventMessage::NoteOff { channel, key } => {
                    let count = &mut sounding[channel as usize * 128 + (key & 0x7F) as usize];
                    if *count == 0 {
                        return Err(ReaderError::new(
                            chunk.offset,
                            ReaderErrorKind::UnmatchedNoteOff { channel, key },
                        ));
                    }
                    *count -= 1;
                }
                _ => {}
            }
        }
        if let Some(i) = sounding.iter().position(|c| *c != 0) {
            return Err(ReaderError::new(
                chunk.offset,
                ReaderErrorKind::UnmatchedNoteOn {
                    channel: (i / 128) as u8,
                    key: (i % 128) as u8,
                },
            ));
        }
        tracks.push(TrackSummary {
            len: chunk.len(),
            events: events.len(),
            note_ons,
            end_tick: events.last().map(|e| e.tick).unwrap_or(0),
        });
    }

    if tracks.len() != header.num_tracks() as usize {
        return Err(ReaderError::new(
            reader.buffer_position(),
            ReaderErrorKind::TrackCount {
                declared: header.num_tracks(),
                found: tracks.len(),
            },
        ));
    }
    Ok(FileSummary { header, tracks })
}

#[cfg(test)]
fn file(tracks: &[&[u8]]) -> Vec<u8> {
    let mut bytes = Vec::new();
    MidiFileHeader::new(
        FormatType::Simultaneous,
        tracks.len() as u16,
        TicksPerQuarterNote::new(96),
    )
    .write(&mut bytes);
    for body in tracks {
        write_chunk(&mut bytes, TRACK_TAG, body).unwrap();
    }
    bytes
}

#[test]
fn reads_a_minimal_file() {
    let bytes = file(&[&[
        0x00, 0x90, 0x3C, 0x64, // on
        0x60, 0x80, 0x3C, 0x00, // off
        0x00, 0xFF, 0x2F, 0x00,
    ]]);
    let summary = verify(&bytes).unwrap();
    assert_eq!(summary.header.num_tracks(), 1);
    assert_eq!(summary.header.timing().ticks_per_quarter_note(), 96);
    assert_eq!(
        summary.tracks,
        vec![TrackSummary {
            len: 12,
            events: 3,
            note_ons: 1,
            end_tick: 96
        }]
    );
}

#[test]
fn velocity_zero_is_a_release() {
    let bytes = file(&[&[
        0x00, 0x90, 0x3C, 0x64, //
        0x60, 0x90, 0x3C, 0x00, //
        0x00, 0xFF, 0x2F, 0x00,
    ]]);
    assert!(verify(&bytes).is_ok());
}

#[test]
fn rejects_broken_framing() {
    let eot: &[u8] = &[0x00, 0xFF, 0x2F, 0x00];

    let mut bytes = file(&[eot]);
    bytes[11] = 2; // track count
    assert!(matches!(
        verify(&bytes).unwrap_err().error_kind(),
        ReaderErrorKind::TrackCount {
            declared: 2,
            found: 1
        }
    ));

    let mut bytes = file(&[eot]);
    bytes[21] = 5; // chunk length past the end
    assert!(verify(&bytes).unwrap_err().is_out_of_bounds());

    let mut bytes = file(&[eot]);
    bytes[14..18].copy_from_slice(b"MTrc");
    assert!(matches!(
        verify(&bytes).unwrap_err().error_kind(),
        ReaderErrorKind::Tag { .. }
    ));

    let bytes = file(&[&[0x00, 0x90, 0x3C, 0x64]]);
    assert_eq!(
        verify(&bytes).unwrap_err().error_kind(),
        &ReaderErrorKind::MissingEndOfTrack
    );

    let bytes = file(&[&[0x00, 0xFF, 0x2F, 0x00, 0x00, 0xFF, 0x2F, 0x00]]);
    assert_eq!(
        verify(&bytes).unwrap_err().error_kind(),
        &ReaderErrorKind::EventsAfterEndOfTrack
    );
}

#[test]
fn rejects_unbalanced_notes() {
    let bytes = file(&[&[0x00, 0x91, 0x3C, 0x64, 0x00, 0xFF, 0x2F, 0x00]]);
    assert_eq!(
        verify(&bytes).unwrap_err().error_kind(),
        &ReaderErrorKind::UnmatchedNoteOn {
            channel: 1,
            key: 0x3C
        }
    );

    let bytes = file(&[&[0x00, 0x80, 0x3C, 0x00, 0x00, 0xFF, 0x2F, 0x00]]);
    assert_eq!(
        verify(&bytes).unwrap_err().error_kind(),
        &ReaderErrorKind::UnmatchedNoteOff {
            channel: 0,
            key: 0x3C
        }
    );
}

#[test]
fn rejects_running_status() {
    let bytes = file(&[&[
        0x00, 0x90, 0x3C, 0x64, //
        0x00, 0x3E, 0x64, // running status
        0x00, 0xFF, 0x2F, 0x00,
    ]]);
    assert!(matches!(
        verify(&bytes).unwrap_err().error_kind(),
        ReaderErrorKind::Status(0x3E)
    ));
}
