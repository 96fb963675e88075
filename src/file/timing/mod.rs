use crate::vlq::MAX_VLQ;

/// Ticks per quarter note used unless the caller picks another division.
pub const DEFAULT_TICKS_PER_QUARTER_NOTE: u16 = 480;

/// The `tpqn` division of a MIDI file.
///
/// Every tick computed during one encode goes through the same instance, so
/// melody beats and chord bars always land on the same grid.
/// The leading bit of the division is reserved for SMPTE timing, so 1-32767.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TicksPerQuarterNote {
    inner: [u8; 2],
}

impl Default for TicksPerQuarterNote {
    fn default() -> Self {
        Self::new(DEFAULT_TICKS_PER_QUARTER_NOTE)
    }
}

impl TicksPerQuarterNote {
    /// The tickrate per quarter note defines what a "quarter note" means.
    ///
    /// The leading bit is cleared and zero becomes one.
    pub const fn new(tpqn: u16) -> Self {
        let tpqn = tpqn & 0x7FFF;
        let tpqn = if tpqn == 0 { 1 } else { tpqn };
        Self {
            inner: tpqn.to_be_bytes(),
        }
    }

    /// Returns the ticks per quarter note for the file.
    pub const fn ticks_per_quarter_note(&self) -> u16 {
        u16::from_be_bytes(self.inner)
    }

    /// The two bytes written in the header's division field.
    pub const fn to_bytes(&self) -> [u8; 2] {
        self.inner
    }

    /// `round(beats * tpqn)`.
    ///
    /// Returns `None` if `beats` is negative, not finite, or lands past the
    /// last tick a delta-time can reach.
    pub fn beats_to_ticks(&self, beats: f64) -> Option<u32> {
        if !beats.is_finite() || beats < 0. {
            return None;
        }
        let ticks = (beats * self.ticks_per_quarter_note() as f64).round();
        if ticks > MAX_VLQ as f64 {
            return None;
        }
        Some(ticks as u32)
    }
}

#[test]
fn beats_to_ticks() {
    let tpqn = TicksPerQuarterNote::default();
    assert_eq!(tpqn.ticks_per_quarter_note(), 480);
    assert_eq!(tpqn.beats_to_ticks(0.), Some(0));
    assert_eq!(tpqn.beats_to_ticks(1.), Some(480));
    assert_eq!(tpqn.beats_to_ticks(0.333), Some(160));
    assert_eq!(tpqn.beats_to_ticks(4. * 2.5), Some(4800));
    assert_eq!(tpqn.beats_to_ticks(-0.5), None);
    assert_eq!(tpqn.beats_to_ticks(f64::NAN), None);
    assert_eq!(tpqn.beats_to_ticks(1e12), None);
}

#[test]
fn division_bytes() {
    assert_eq!(TicksPerQuarterNote::new(96).to_bytes(), [0x00, 0x60]);
    assert_eq!(TicksPerQuarterNote::new(480).to_bytes(), [0x01, 0xE0]);
    assert_eq!(TicksPerQuarterNote::new(0x8000).ticks_per_quarter_note(), 1);
}
