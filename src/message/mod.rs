#![doc = r#"
The events that make up a track chunk.

A [`TrackMessage`] is either a [`ChannelVoiceMessage`] or a [`MetaMessage`].
System exclusive messages are never written.
"#]

pub mod channel;
use channel::*;

use num_enum::{IntoPrimitive, TryFromPrimitive};

use crate::{
    tempo::{Tempo, TimeSignature},
    vlq::{VlqError, write_vlq},
};

/// Type bytes of the meta events the encoder writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, TryFromPrimitive, IntoPrimitive)]
#[repr(u8)]
pub enum MetaType {
    /// `FF 03`, sequence name in the first track of a format 1 file, track name elsewhere
    TrackName = 0x03,
    /// `FF 2F 00`
    EndOfTrack = 0x2F,
    /// `FF 51 03 tt tt tt`
    Tempo = 0x51,
    /// `FF 58 04 nn dd cc bb`
    TimeSignature = 0x58,
}

/// A meta event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MetaMessage {
    /// Names the track, or the whole sequence when written in the first track
    TrackName(String),
    /// Microseconds per quarter note
    Tempo(Tempo),
    /// The time signature
    TimeSignature(TimeSignature),
    /// Marks the end of a track chunk
    EndOfTrack,
}

impl MetaMessage {
    /// The type byte following `FF`.
    pub fn meta_type(&self) -> MetaType {
        match self {
            Self::TrackName(_) => MetaType::TrackName,
            Self::Tempo(_) => MetaType::Tempo,
            Self::TimeSignature(_) => MetaType::TimeSignature,
            Self::EndOfTrack => MetaType::EndOfTrack,
        }
    }

    /// Appends `FF <type> <length> <data>`. The length is a variable-length quantity.
    pub fn write(&self, buf: &mut Vec<u8>) -> Result<(), VlqError> {
        buf.push(0xFF);
        buf.push(self.meta_type().into());
        match self {
            Self::TrackName(name) => {
                let bytes = name.as_bytes();
                let len = u32::try_from(bytes.len())
                    .map_err(|_| VlqError::TooLarge(bytes.len() as u64))?;
                write_vlq(buf, len)?;
                buf.extend_from_slice(bytes);
            }
            Self::Tempo(tempo) => {
                buf.push(3);
                buf.extend_from_slice(&tempo.to_bytes());
            }
            Self::TimeSignature(signature) => {
                buf.push(4);
                buf.extend_from_slice(&signature.to_bytes());
            }
            Self::EndOfTrack => buf.push(0),
        }
        Ok(())
    }
}

/// Any message that can appear in a track chunk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TrackMessage {
    /// A channel voice message
    ChannelVoice(ChannelVoiceMessage),
    /// A meta event
    Meta(MetaMessage),
}

impl TrackMessage {
    /// Rank used to order messages that fall on the same tick.
    ///
    /// Meta events come first, then program and control changes, then note-offs
    /// ahead of note-ons so a key released on a tick is free for a note struck on it.
    pub(crate) fn rank(&self) -> u8 {
        match self {
            Self::Meta(MetaMessage::EndOfTrack) => u8::MAX,
            Self::Meta(_) => 0,
            Self::ChannelVoice(cv) => match cv.event() {
                VoiceEvent::ProgramChange { .. } => 1,
                VoiceEvent::ControlChange { .. } => 2,
                VoiceEvent::NoteOff { .. } => 3,
                VoiceEvent::NoteOn { .. } => 4,
            },
        }
    }

    /// Appends the message bytes, without a delta-time.
    pub fn write(&self, buf: &mut Vec<u8>) -> Result<(), VlqError> {
        match self {
            Self::ChannelVoice(cv) => {
                cv.write(buf);
                Ok(())
            }
            Self::Meta(meta) => meta.write(buf),
        }
    }
}

impl From<ChannelVoiceMessage> for TrackMessage {
    fn from(value: ChannelVoiceMessage) -> Self {
        Self::ChannelVoice(value)
    }
}

impl From<MetaMessage> for TrackMessage {
    fn from(value: MetaMessage) -> Self {
        Self::Meta(value)
    }
}

#[test]
fn meta_bytes() {
    use pretty_assertions::assert_eq;
    let mut buf = Vec::new();
    MetaMessage::TrackName("Bass".to_string())
        .write(&mut buf)
        .unwrap();
    MetaMessage::Tempo(Tempo::default()).write(&mut buf).unwrap();
    MetaMessage::TimeSignature(TimeSignature::COMMON)
        .write(&mut buf)
        .unwrap();
    MetaMessage::EndOfTrack.write(&mut buf).unwrap();
    assert_eq!(
        buf,
        vec![
            0xFF, 0x03, 0x04, b'B', b'a', b's', b's', // name
            0xFF, 0x51, 0x03, 0x07, 0xA1, 0x20, // tempo
            0xFF, 0x58, 0x04, 0x04, 0x02, 0x18, 0x08, // 4/4
            0xFF, 0x2F, 0x00,
        ]
    );
}

#[test]
fn long_names_use_a_multi_byte_length() {
    let mut buf = Vec::new();
    MetaMessage::TrackName("x".repeat(200))
        .write(&mut buf)
        .unwrap();
    assert_eq!(&buf[..4], &[0xFF, 0x03, 0x81, 0x48]);
    assert_eq!(buf.len(), 4 + 200);
}
