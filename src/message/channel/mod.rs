#![doc = r#"
Channel voice messages written by the encoder

```text
|----------------|------------|------------|
| status         | data 1     | data 2     |
|----------------|------------|------------|
| 8n note off    | key        | 00         |
| 9n note on     | key        | velocity   |
| Bn control     | controller | value      |
| Cn program     | program    |            |
|----------------|------------|------------|
```
"#]

use num_enum::{IntoPrimitive, TryFromPrimitive};

use crate::{EncodeError, pitch::Pitch};

/// One of the sixteen MIDI channels. `One` is written as nibble `0`.
#[allow(missing_docs)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, TryFromPrimitive, IntoPrimitive)]
#[repr(u8)]
pub enum Channel {
    One = 0,
    Two,
    Three,
    Four,
    Five,
    Six,
    Seven,
    Eight,
    Nine,
    Ten,
    Eleven,
    Twelve,
    Thirteen,
    Fourteen,
    Fifteen,
    Sixteen,
}

impl Channel {
    /// Create a channel from its zero-based wire number.
    ///
    /// # Errors
    /// if `number` is greater than 15
    pub fn from_number(number: u8) -> Result<Self, EncodeError> {
        Self::try_from(number).map_err(|_| EncodeError::InvalidChannel(number))
    }

    /// The zero-based channel number, as written in the low nibble of a status byte.
    pub fn number(self) -> u8 {
        self.into()
    }
}

/// A General MIDI program number, `0..=127`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Program(u8);

impl Program {
    /// Create a program.
    ///
    /// # Errors
    /// if `program` is greater than 127
    pub fn new(program: u8) -> Result<Self, EncodeError> {
        if program > 127 {
            return Err(EncodeError::InvalidProgram(program));
        }
        Ok(Self(program))
    }

    /// The program number
    pub const fn byte(&self) -> u8 {
        self.0
    }
}

/// The controllers the encoder writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, TryFromPrimitive, IntoPrimitive)]
#[repr(u8)]
pub enum Controller {
    /// CC7, channel volume
    Volume = 7,
    /// CC11, expression
    Expression = 11,
}

#[doc = r#"
A note-on velocity, `1..=127`.

Zero is excluded: a note-on with velocity zero is read as a note-off.
"#]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Velocity(u8);

impl Velocity {
    /// The loudest velocity.
    pub const MAX: Self = Self(127);

    /// Creates a velocity, pulling `value` into `1..=127`.
    pub const fn clamped(value: u8) -> Self {
        if value == 0 {
            Self(1)
        } else if value > 127 {
            Self(127)
        } else {
            Self(value)
        }
    }

    /// Maps a unit velocity in `[0, 1]` to `round(v * 127)`, clamped into `1..=127`.
    ///
    /// Returns `None` for non-finite input.
    pub fn from_unit(value: f64) -> Option<Self> {
        if !value.is_finite() {
            return None;
        }
        let scaled = (value.clamp(0., 1.) * 127.).round() as u8;
        Some(Self::clamped(scaled))
    }

    /// The velocity byte.
    pub const fn byte(&self) -> u8 {
        self.0
    }
}

/// The body of a channel voice message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoiceEvent {
    /// Release a key. Always written with release velocity zero.
    NoteOff {
        /// The key being released
        pitch: Pitch,
    },
    /// Strike a key
    NoteOn {
        /// The key being struck
        pitch: Pitch,
        /// How hard
        velocity: Velocity,
    },
    /// Set a controller
    ControlChange {
        /// Which controller
        controller: Controller,
        /// The new value, `0..=127`
        value: u8,
    },
    /// Select an instrument
    ProgramChange {
        /// The instrument
        program: Program,
    },
}

/// A voice event addressed to a channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChannelVoiceMessage {
    channel: Channel,
    event: VoiceEvent,
}

impl ChannelVoiceMessage {
    /// Create a new channel voice message
    pub const fn new(channel: Channel, event: VoiceEvent) -> Self {
        Self { channel, event }
    }

    /// The channel the message is addressed to
    pub const fn channel(&self) -> Channel {
        self.channel
    }

    /// The event of the message
    pub const fn event(&self) -> &VoiceEvent {
        &self.event
    }

    /// The status byte: message kind in the high nibble, channel in the low one.
    pub fn status(&self) -> u8 {
        let kind = match self.event {
            VoiceEvent::NoteOff { .. } => 0x80,
            VoiceEvent::NoteOn { .. } => 0x90,
            VoiceEvent::ControlChange { .. } => 0xB0,
            VoiceEvent::ProgramChange { .. } => 0xC0,
        };
        kind | self.channel.number()
    }

    /// Appends the status and data bytes. Running status is never used.
    pub fn write(&self, buf: &mut Vec<u8>) {
        buf.push(self.status());
        match self.event {
            VoiceEvent::NoteOff { pitch } => buf.extend_from_slice(&[pitch.byte(), 0]),
            VoiceEvent::NoteOn { pitch, velocity } => {
                buf.extend_from_slice(&[pitch.byte(), velocity.byte()])
            }
            VoiceEvent::ControlChange { controller, value } => {
                buf.extend_from_slice(&[u8::from(controller), value.min(127)])
            }
            VoiceEvent::ProgramChange { program } => buf.push(program.byte()),
        }
    }
}

#[test]
fn channel_numbers() {
    assert_eq!(Channel::from_number(0).unwrap(), Channel::One);
    assert_eq!(Channel::from_number(9).unwrap(), Channel::Ten);
    assert_eq!(Channel::Sixteen.number(), 15);
    assert!(matches!(
        Channel::from_number(16),
        Err(EncodeError::InvalidChannel(16))
    ));
}

#[test]
fn velocity_from_unit() {
    assert_eq!(Velocity::from_unit(0.8).unwrap().byte(), 102);
    assert_eq!(Velocity::from_unit(0.7).unwrap().byte(), 89);
    assert_eq!(Velocity::from_unit(1.5).unwrap(), Velocity::MAX);
    assert_eq!(Velocity::from_unit(0.).unwrap().byte(), 1);
    assert_eq!(Velocity::from_unit(-3.).unwrap().byte(), 1);
    assert_eq!(Velocity::from_unit(f64::NAN), None);
}

#[test]
fn voice_bytes() {
    use pretty_assertions::assert_eq;
    let mut buf = Vec::new();
    let pitch = Pitch::MIDDLE_C;
    ChannelVoiceMessage::new(
        Channel::Two,
        VoiceEvent::NoteOn {
            pitch,
            velocity: Velocity::clamped(100),
        },
    )
    .write(&mut buf);
    ChannelVoiceMessage::new(Channel::Two, VoiceEvent::NoteOff { pitch }).write(&mut buf);
    ChannelVoiceMessage::new(
        Channel::Three,
        VoiceEvent::ProgramChange {
            program: Program::new(32).unwrap(),
        },
    )
    .write(&mut buf);
    ChannelVoiceMessage::new(
        Channel::One,
        VoiceEvent::ControlChange {
            controller: Controller::Expression,
            value: 127,
        },
    )
    .write(&mut buf);
    assert_eq!(
        buf,
        vec![
            0x91, 0x3C, 0x64, 0x81, 0x3C, 0x00, 0xC2, 0x20, 0xB0, 0x0B, 0x7F
        ]
    );
}
