use core::fmt;

/// Beats per minute used when none is given, or the given one is unusable.
pub const DEFAULT_BPM: f64 = 120.;

/// Largest value the 24-bit tempo meta event can carry.
const MAX_MICROS_PER_QUARTER: u32 = 0x00FF_FFFF;

#[doc = r#"
The tempo of a file, stored as microseconds per quarter note.

This is what the `FF 51 03` meta event carries.

# Example
```rust
# use smf_export::prelude::*;
let tempo = Tempo::from_bpm(120.).unwrap();
assert_eq!(tempo.micros_per_quarter_note(), 500_000);
assert_eq!(tempo.to_bytes(), [0x07, 0xA1, 0x20]);
```
"#]
#[derive(PartialEq, Eq, Debug, Clone, Copy)]
pub struct Tempo(u32);

impl Default for Tempo {
    fn default() -> Self {
        Self(500_000)
    }
}

impl Tempo {
    /// Creates a tempo from microseconds per quarter note, saturating at the 24-bit maximum.
    pub const fn new(micros_per_quarter_note: u32) -> Self {
        if micros_per_quarter_note > MAX_MICROS_PER_QUARTER {
            Self(MAX_MICROS_PER_QUARTER)
        } else if micros_per_quarter_note == 0 {
            Self(1)
        } else {
            Self(micros_per_quarter_note)
        }
    }

    /// `round(60_000_000 / bpm)`.
    ///
    /// Returns `None` if `bpm` is not a finite number greater than zero.
    pub fn from_bpm(bpm: f64) -> Option<Self> {
        if !bpm.is_finite() || bpm <= 0. {
            return None;
        }
        let micros = (60_000_000. / bpm).round();
        Some(Self::new(micros.min(MAX_MICROS_PER_QUARTER as f64) as u32))
    }

    /// Microseconds per quarter note.
    pub const fn micros_per_quarter_note(&self) -> u32 {
        self.0
    }

    /// Beats per minute, derived back from the stored microseconds.
    pub fn bpm(&self) -> f64 {
        60_000_000. / self.0 as f64
    }

    /// The three big-endian bytes of the tempo meta event.
    pub const fn to_bytes(&self) -> [u8; 3] {
        [(self.0 >> 16) as u8, (self.0 >> 8) as u8, self.0 as u8]
    }
}

impl fmt::Display for Tempo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} BPM", self.bpm())
    }
}

#[doc = r#"
A time signature as written by the `FF 58 04` meta event.

The denominator is stored as a power of two, so 4/4 is `04 02`.
"#]
#[derive(PartialEq, Eq, Debug, Clone, Copy)]
pub struct TimeSignature {
    numerator: u8,
    denominator_pow: u8,
    clocks_per_click: u8,
    thirty_seconds_per_quarter: u8,
}

impl TimeSignature {
    /// Common time.
    pub const COMMON: Self = Self {
        numerator: 4,
        denominator_pow: 2,
        clocks_per_click: 24,
        thirty_seconds_per_quarter: 8,
    };

    /// Beats per bar.
    pub const fn numerator(&self) -> u8 {
        self.numerator
    }

    /// The four data bytes of the meta event.
    pub const fn to_bytes(&self) -> [u8; 4] {
        [
            self.numerator,
            self.denominator_pow,
            self.clocks_per_click,
            self.thirty_seconds_per_quarter,
        ]
    }
}

impl Default for TimeSignature {
    fn default() -> Self {
        Self::COMMON
    }
}

#[test]
fn tempo_from_bpm() {
    assert_eq!(Tempo::from_bpm(120.).unwrap().micros_per_quarter_note(), 500_000);
    assert_eq!(Tempo::from_bpm(90.).unwrap().micros_per_quarter_note(), 666_667);
    assert_eq!(Tempo::from_bpm(140.).unwrap().micros_per_quarter_note(), 428_571);
    assert_eq!(Tempo::from_bpm(0.), None);
    assert_eq!(Tempo::from_bpm(-60.), None);
    assert_eq!(Tempo::from_bpm(f64::NAN), None);
    assert_eq!(Tempo::from_bpm(f64::INFINITY), None);
    // too slow for 24 bits
    assert_eq!(
        Tempo::from_bpm(1.).unwrap().micros_per_quarter_note(),
        0x00FF_FFFF
    );
}

#[test]
fn common_time_bytes() {
    assert_eq!(TimeSignature::COMMON.to_bytes(), [0x04, 0x02, 0x18, 0x08]);
}
