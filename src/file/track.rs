use core::fmt;

use crate::{
    EncodeError, EncodeResult,
    file::builder::chunk::{TRACK_TAG, write_chunk},
    input::VoiceNote,
    message::{
        MetaMessage, TrackMessage,
        channel::{Channel, ChannelVoiceMessage, Controller, Program, VoiceEvent},
    },
    vlq::write_vlq,
};

/// Volume written at the start of an expressive melody.
pub const EXPRESSION_VOLUME: u8 = 100;
/// Expression written at the start of an expressive melody, before the ramp.
pub const EXPRESSION_START: u8 = 127;
/// Number of points in the expression crescendo.
pub const EXPRESSION_RAMP_POINTS: u32 = 5;
/// The crescendo runs from this expression value...
pub const EXPRESSION_RAMP_FROM: u8 = 80;
/// ...to this one.
pub const EXPRESSION_RAMP_TO: u8 = 120;

/// The role of a track within the file. Tracks are written in this order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum TrackKind {
    /// Sequence name, tempo and time signature
    Control,
    /// The melody
    Melody,
    /// The chord progression
    Chords,
    /// A bass line on the chord roots
    Bass,
}

impl TrackKind {
    /// The name written in the track's name meta event.
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Control => "Control",
            Self::Melody => "Melody",
            Self::Chords => "Chords",
            Self::Bass => "Bass",
        }
    }
}

impl fmt::Display for TrackKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A message at an absolute tick.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimedMessage {
    /// Ticks since the start of the track
    pub tick: u32,
    /// The message
    pub message: TrackMessage,
}

#[doc = r#"
How far a [`TrackBuilder`] has got.

```text
Empty -> NameEmitted -> ProgramChangeEmitted -> EventsEmitted -> Sealed
              \_____________________________________/
```

The control track skips the program change. Nothing can be added once sealed.
"#]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum TrackStage {
    /// Nothing written yet
    Empty,
    /// The name meta event is written
    NameEmitted,
    /// The program change is written
    ProgramChangeEmitted,
    /// At least one event follows the preamble
    EventsEmitted,
    /// End-of-track is written
    Sealed,
}

#[doc = r#"
Collects the events of one track at absolute ticks.

Events may be pushed in any tick order. [`TrackBuilder::seal`] sorts them by
tick, keeping push order among equal ticks except that meta events come
first, then program and control changes, then note-offs, then note-ons.
"#]
#[derive(Debug)]
pub struct TrackBuilder {
    kind: TrackKind,
    channel: Channel,
    stage: TrackStage,
    events: Vec<TimedMessage>,
}

impl TrackBuilder {
    /// Starts an empty track for `channel`.
    pub fn new(kind: TrackKind, channel: Channel) -> Self {
        Self {
            kind,
            channel,
            stage: TrackStage::Empty,
            events: Vec::new(),
        }
    }

    /// The current stage.
    pub fn stage(&self) -> TrackStage {
        self.stage
    }

    fn advance(&mut self, action: &'static str, allowed: &[TrackStage], next: TrackStage) -> EncodeResult<()> {
        if !allowed.contains(&self.stage) {
            return Err(EncodeError::TrackOrder {
                track: self.kind,
                action,
                stage: self.stage,
            });
        }
        self.stage = next;
        Ok(())
    }

    /// Writes the name meta event at tick 0.
    pub fn name(&mut self, name: impl Into<String>) -> EncodeResult<&mut Self> {
        self.advance("track name", &[TrackStage::Empty], TrackStage::NameEmitted)?;
        self.events.push(TimedMessage {
            tick: 0,
            message: MetaMessage::TrackName(name.into()).into(),
        });
        Ok(self)
    }

    /// Writes the program change at tick 0.
    pub fn program(&mut self, program: Program) -> EncodeResult<&mut Self> {
        self.advance(
            "program change",
            &[TrackStage::NameEmitted],
            TrackStage::ProgramChangeEmitted,
        )?;
        self.events.push(TimedMessage {
            tick: 0,
            message: self.voice(VoiceEvent::ProgramChange { program }),
        });
        Ok(self)
    }

    /// Adds a message at `tick`.
    pub fn push(&mut self, tick: u32, message: impl Into<TrackMessage>) -> EncodeResult<&mut Self> {
        self.advance(
            "event",
            &[
                TrackStage::NameEmitted,
                TrackStage::ProgramChangeEmitted,
                TrackStage::EventsEmitted,
            ],
            TrackStage::EventsEmitted,
        )?;
        self.events.push(TimedMessage {
            tick,
            message: message.into(),
        });
        Ok(self)
    }

    /// Adds a voice event on this track's channel.
    pub fn push_voice(&mut self, tick: u32, event: VoiceEvent) -> EncodeResult<&mut Self> {
        let message = self.voice(event);
        self.push(tick, message)
    }

    /// Note-ons for every pitch at the note's start, then note-offs at its end.
    pub fn push_note(&mut self, note: &VoiceNote) -> EncodeResult<&mut Self> {
        for &pitch in &note.pitches {
            self.push_voice(
                note.start,
                VoiceEvent::NoteOn {
                    pitch,
                    velocity: note.velocity,
                },
            )?;
        }
        for &pitch in &note.pitches {
            self.push_voice(note.end(), VoiceEvent::NoteOff { pitch })?;
        }
        Ok(self)
    }

    /// The latest tick of any event so far.
    pub fn last_tick(&self) -> u32 {
        self.events.iter().map(|e| e.tick).max().unwrap_or(0)
    }

    fn voice(&self, event: VoiceEvent) -> TrackMessage {
        ChannelVoiceMessage::new(self.channel, event).into()
    }

    /// Orders the events and appends end-of-track after the last of them.
    pub fn seal(self) -> EncodeResult<TrackSpec> {
        self.seal_at(0)
    }

    /// Like [`TrackBuilder::seal`], but end-of-track falls no earlier than `end`.
    pub fn seal_at(mut self, end: u32) -> EncodeResult<TrackSpec> {
        self.advance(
            "end of track",
            &[
                TrackStage::NameEmitted,
                TrackStage::ProgramChangeEmitted,
                TrackStage::EventsEmitted,
            ],
            TrackStage::Sealed,
        )?;
        self.events
            .sort_by_key(|e| (e.tick, e.message.rank()));
        let end = self.last_tick().max(end);
        self.events.push(TimedMessage {
            tick: end,
            message: MetaMessage::EndOfTrack.into(),
        });
        Ok(TrackSpec {
            kind: self.kind,
            events: self.events,
        })
    }
}

/// A sealed track: sorted events ending in end-of-track.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackSpec {
    kind: TrackKind,
    events: Vec<TimedMessage>,
}

impl TrackSpec {
    /// The role of the track
    pub fn kind(&self) -> TrackKind {
        self.kind
    }
    /// The events, ordered by tick
    pub fn events(&self) -> &[TimedMessage] {
        &self.events
    }

    /// Serializes the events as delta-time and event pairs.
    pub fn body(&self) -> EncodeResult<Vec<u8>> {
        let mut body = Vec::with_capacity(self.events.len() * 4);
        let mut previous = 0;
        for event in &self.events {
            let delta = event.tick.checked_sub(previous).ok_or_else(|| {
                EncodeError::Vlq(crate::vlq::VlqError::Negative(
                    event.tick as i64 - previous as i64,
                ))
            })?;
            write_vlq(&mut body, delta)?;
            event.message.write(&mut body)?;
            previous = event.tick;
        }
        Ok(body)
    }

    /// Appends the complete `MTrk` chunk.
    pub fn write(&self, buf: &mut Vec<u8>) -> EncodeResult<()> {
        let body = self.body()?;
        write_chunk(buf, TRACK_TAG, &body)
    }
}

/// Everything needed to build one musical track.
#[derive(Debug, Clone)]
pub struct TrackPlan<'a> {
    /// Role of the track
    pub kind: TrackKind,
    /// Channel for every voice message
    pub channel: Channel,
    /// The instrument
    pub program: Program,
    /// Notes, sorted by start
    pub notes: &'a [VoiceNote],
    /// Write volume and an expression crescendo
    pub expression: bool,
}

/// Builds a musical track, or `None` if it has no notes.
pub fn build_track(plan: &TrackPlan<'_>) -> EncodeResult<Option<TrackSpec>> {
    if plan.notes.is_empty() {
        return Ok(None);
    }
    let mut track = TrackBuilder::new(plan.kind, plan.channel);
    track.name(plan.kind.name())?.program(plan.program)?;

    if plan.expression {
        let end = plan.notes.iter().map(VoiceNote::end).max().unwrap_or(0);
        push_expression(&mut track, end)?;
    }
    for note in plan.notes {
        track.push_note(note)?;
    }
    let track = track.seal()?;
    tracing::debug!(
        track = %plan.kind,
        notes = plan.notes.len(),
        events = track.events().len(),
        "built track"
    );
    Ok(Some(track))
}

/// CC7 and CC11 at tick 0, then a crescendo spread evenly inside `0..end`.
fn push_expression(track: &mut TrackBuilder, end: u32) -> EncodeResult<()> {
    track
        .push_voice(
            0,
            VoiceEvent::ControlChange {
                controller: Controller::Volume,
                value: EXPRESSION_VOLUME,
            },
        )?
        .push_voice(
            0,
            VoiceEvent::ControlChange {
                controller: Controller::Expression,
                value: EXPRESSION_START,
            },
        )?;

    let span = (EXPRESSION_RAMP_TO - EXPRESSION_RAMP_FROM) as u32;
    for i in 1..=EXPRESSION_RAMP_POINTS {
        let tick = (end as u64 * i as u64 / (EXPRESSION_RAMP_POINTS as u64 + 1)) as u32;
        let value = EXPRESSION_RAMP_FROM as u32 + span * (i - 1) / (EXPRESSION_RAMP_POINTS - 1);
        track.push_voice(
            tick,
            VoiceEvent::ControlChange {
                controller: Controller::Expression,
                value: value as u8,
            },
        )?;
    }
    Ok(())
}

#[cfg(test)]
fn note(start: u32, duration: u32, pitches: &[u8]) -> VoiceNote {
    VoiceNote {
        start,
        duration,
        pitches: pitches
            .iter()
            .map(|&p| crate::pitch::Pitch::from_midi(p).unwrap())
            .collect(),
        velocity: crate::message::channel::Velocity::clamped(100),
    }
}

#[cfg(test)]
fn plan(notes: &[VoiceNote], expression: bool) -> TrackPlan<'_> {
    TrackPlan {
        kind: TrackKind::Melody,
        channel: Channel::One,
        program: Program::new(0).unwrap(),
        notes,
        expression,
    }
}

#[test]
fn melody_track_bytes() {
    use pretty_assertions::assert_eq;
    let notes = [note(0, 480, &[60]), note(480, 480, &[64])];
    let track = build_track(&plan(&notes, false)).unwrap().unwrap();
    assert_eq!(
        track.body().unwrap(),
        vec![
            0x00, 0xFF, 0x03, 0x06, b'M', b'e', b'l', b'o', b'd', b'y', //
            0x00, 0xC0, 0x00, //
            0x00, 0x90, 0x3C, 0x64, //
            0x83, 0x60, 0x80, 0x3C, 0x00, // off before the next on
            0x00, 0x90, 0x40, 0x64, //
            0x83, 0x60, 0x80, 0x40, 0x00, //
            0x00, 0xFF, 0x2F, 0x00,
        ]
    );
}

#[test]
fn chord_tones_share_ticks() {
    let notes = [note(0, 1920, &[60, 64, 67])];
    let mut track_plan = plan(&notes, false);
    track_plan.kind = TrackKind::Chords;
    let track = build_track(&track_plan).unwrap().unwrap();
    let notes: Vec<_> = track
        .events()
        .iter()
        .filter_map(|e| match e.message {
            TrackMessage::ChannelVoice(cv) => match cv.event() {
                VoiceEvent::NoteOn { pitch, .. } => Some((e.tick, true, pitch.byte())),
                VoiceEvent::NoteOff { pitch } => Some((e.tick, false, pitch.byte())),
                _ => None,
            },
            _ => None,
        })
        .collect();
    assert_eq!(
        notes,
        vec![
            (0, true, 60),
            (0, true, 64),
            (0, true, 67),
            (1920, false, 60),
            (1920, false, 64),
            (1920, false, 67),
        ]
    );
}

#[test]
fn expression_ramp() {
    let notes = [note(0, 2400, &[60])];
    let track = build_track(&plan(&notes, true)).unwrap().unwrap();
    let controls: Vec<_> = track
        .events()
        .iter()
        .filter_map(|e| match e.message {
            TrackMessage::ChannelVoice(cv) => match *cv.event() {
                VoiceEvent::ControlChange { controller, value } => {
                    Some((e.tick, controller, value))
                }
                _ => None,
            },
            _ => None,
        })
        .collect();
    use Controller::*;
    assert_eq!(
        controls,
        vec![
            (0, Volume, 100),
            (0, Expression, 127),
            (400, Expression, 80),
            (800, Expression, 90),
            (1200, Expression, 100),
            (1600, Expression, 110),
            (2000, Expression, 120),
        ]
    );
    // program change stays ahead of the controllers at tick 0
    assert!(matches!(
        track.events()[1].message,
        TrackMessage::ChannelVoice(cv) if matches!(cv.event(), VoiceEvent::ProgramChange { .. })
    ));
}

#[test]
fn empty_plan_builds_nothing() {
    assert_eq!(build_track(&plan(&[], true)).unwrap(), None);
}

#[test]
fn stages_are_sequential() {
    let mut track = TrackBuilder::new(TrackKind::Bass, Channel::Three);
    assert!(matches!(
        track.program(Program::new(32).unwrap()),
        Err(EncodeError::TrackOrder { stage: TrackStage::Empty, .. })
    ));
    track.name("Bass").unwrap();
    assert!(track.name("Again").is_err());
    track.program(Program::new(32).unwrap()).unwrap();
    assert_eq!(track.stage(), TrackStage::ProgramChangeEmitted);
    track.push_note(&note(0, 10, &[40])).unwrap();
    assert_eq!(track.stage(), TrackStage::EventsEmitted);
    assert!(track.program(Program::new(1).unwrap()).is_err());

    let sealed = track.seal().unwrap();
    let last = sealed.events().last().unwrap();
    assert_eq!(last.tick, 10);
    assert_eq!(last.message, TrackMessage::Meta(MetaMessage::EndOfTrack));
}

#[test]
fn control_track_ends_with_the_song() {
    let mut track = TrackBuilder::new(TrackKind::Control, Channel::One);
    track.name("Song").unwrap();
    let sealed = track.seal_at(3840).unwrap();
    assert_eq!(sealed.events().len(), 2);
    assert_eq!(sealed.events()[1].tick, 3840);
    assert_eq!(
        sealed.body().unwrap(),
        vec![0x00, 0xFF, 0x03, 0x04, b'S', b'o', b'n', b'g', 0x9E, 0x00, 0xFF, 0x2F, 0x00]
    );
}

#[test]
fn unsealed_track_needs_a_name() {
    let track = TrackBuilder::new(TrackKind::Control, Channel::One);
    assert!(track.seal().is_err());
}
