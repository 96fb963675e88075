#![doc = r#"
Chunk framing for MIDI files

# Overview

MIDI files are organized into chunks, each identified by a 4-character ASCII type identifier
followed by a 32-bit big-endian length field and then the chunk data.

## Header chunk

The header chunk (identified by "MThd") must be the first chunk in a MIDI file. Its body is
always 6 bytes: format, number of tracks and division. See
[`MidiFileHeader`](crate::file::MidiFileHeader).

## Track chunks

Track chunks (identified by "MTrk") hold delta-time and event pairs. The length is only known
once every event has been serialized, so the body is built first and the length written
in front of it.

# Example Structure

```text
[Header Chunk: "MThd"]
[Track Chunk 1: "MTrk"]  control: sequence name, tempo, time signature
[Track Chunk 2: "MTrk"]  melody
...
[Track Chunk N: "MTrk"]
```
"#]

use crate::{EncodeError, EncodeResult};

/// Identifies the header chunk.
pub const HEADER_TAG: &[u8; 4] = b"MThd";
/// Identifies a track chunk.
pub const TRACK_TAG: &[u8; 4] = b"MTrk";
/// The body length of every header chunk.
pub const HEADER_LENGTH: u32 = 6;

/// Appends `tag`, the big-endian length of `body`, and `body`.
///
/// # Errors
/// if `body` is longer than a 4 byte length can describe
pub fn write_chunk(buf: &mut Vec<u8>, tag: &[u8; 4], body: &[u8]) -> EncodeResult<()> {
    let len = u32::try_from(body.len()).map_err(|_| EncodeError::TrackTooLong(body.len()))?;
    buf.reserve(8 + body.len());
    buf.extend_from_slice(tag);
    buf.extend_from_slice(&len.to_be_bytes());
    buf.extend_from_slice(body);
    Ok(())
}

#[test]
fn track_chunk_framing() {
    use pretty_assertions::assert_eq;
    let mut buf = Vec::new();
    write_chunk(&mut buf, TRACK_TAG, &[0x00, 0xFF, 0x2F, 0x00]).unwrap();
    assert_eq!(
        buf,
        vec![0x4D, 0x54, 0x72, 0x6B, 0x00, 0x00, 0x00, 0x04, 0x00, 0xFF, 0x2F, 0x00]
    );
}
