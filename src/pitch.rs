use core::fmt;
use core::ops::{Add, Sub};

use crate::NoteError;

/// Octave assumed when a note name carries none, e.g. `"F#"`.
pub const DEFAULT_OCTAVE: i8 = 4;

#[doc = r#"
A MIDI note number, always within `0..=127`.

[`Pitch`] `0` is `C-1`, [`Pitch`] `60` is `C4` and [`Pitch`] `127` is `G9`.

# Example
```rust
# use smf_export::prelude::*;
let pitch = resolve_pitch("F#4").unwrap().pitch;

assert_eq!(pitch.byte(), 66);
assert_eq!(pitch.pitch_class(), PitchClass::FSharp);
assert_eq!(pitch.octave(), Octave::new(4));
```
"#]
#[derive(Copy, Clone, PartialEq, Eq, Ord, PartialOrd, Debug, Hash)]
pub struct Pitch(u8);

impl Pitch {
    /// Middle C.
    pub const MIDDLE_C: Self = Self(60);

    /// Create a pitch from a MIDI note number.
    ///
    /// # Errors
    /// if the number is greater than 127
    pub fn from_midi(number: u8) -> Result<Self, NoteError> {
        if number > 127 {
            return Err(NoteError::OutOfRangePitch(number as i64));
        }
        Ok(Self(number))
    }

    /// Creates a pitch, pulling `number` into `0..=127`.
    pub const fn clamped(number: i64) -> Self {
        if number < 0 {
            Self(0)
        } else if number > 127 {
            Self(127)
        } else {
            Self(number as u8)
        }
    }

    /// Create a pitch from a class and octave, clamping at `G9`.
    pub const fn new(class: PitchClass, octave: Octave) -> Self {
        Self::clamped(class.semitone() as i64 + (octave.value() as i64 + 1) * 12)
    }

    /// Identifies the pitch class of the note
    #[inline]
    pub const fn pitch_class(&self) -> PitchClass {
        PitchClass::from_semitone(self.0 % 12)
    }

    /// Identifies the octave of the note
    #[inline]
    pub const fn octave(&self) -> Octave {
        Octave((self.0 / 12) as i8 - 1)
    }

    /// Returns the underlying MIDI note number
    pub const fn byte(&self) -> u8 {
        self.0
    }
}

impl fmt::Display for Pitch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.pitch_class(), self.octave())
    }
}

impl Add<u8> for Pitch {
    type Output = Pitch;
    fn add(self, rhs: u8) -> Self::Output {
        Self(self.0.saturating_add(rhs).min(127))
    }
}

impl Sub<u8> for Pitch {
    type Output = Pitch;
    fn sub(self, rhs: u8) -> Self::Output {
        Self(self.0.saturating_sub(rhs))
    }
}

#[allow(missing_docs)]
#[derive(Copy, Clone, PartialEq, Eq, Debug, Hash)]
#[doc = r#"
The twelve pitch classes, spelled with sharps.

Flat spellings are accepted by [`resolve_pitch`] and land on the matching sharp.
"#]
pub enum PitchClass {
    C,
    CSharp,
    D,
    DSharp,
    E,
    F,
    FSharp,
    G,
    GSharp,
    A,
    ASharp,
    B,
}

impl PitchClass {
    /// The natural pitch class named by a note letter, case-insensitive.
    pub const fn from_letter(letter: char) -> Option<Self> {
        use PitchClass::*;
        Some(match letter.to_ascii_uppercase() {
            'C' => C,
            'D' => D,
            'E' => E,
            'F' => F,
            'G' => G,
            'A' => A,
            'B' => B,
            _ => return None,
        })
    }

    const fn from_semitone(semitone: u8) -> Self {
        use PitchClass::*;
        match semitone % 12 {
            0 => C,
            1 => CSharp,
            2 => D,
            3 => DSharp,
            4 => E,
            5 => F,
            6 => FSharp,
            7 => G,
            8 => GSharp,
            9 => A,
            10 => ASharp,
            _ => B,
        }
    }

    /// Offset in semitones above C.
    pub const fn semitone(&self) -> u8 {
        use PitchClass::*;
        match self {
            C => 0,
            CSharp => 1,
            D => 2,
            DSharp => 3,
            E => 4,
            F => 5,
            FSharp => 6,
            G => 7,
            GSharp => 8,
            A => 9,
            ASharp => 10,
            B => 11,
        }
    }
}

impl fmt::Display for PitchClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use PitchClass::*;
        let name = match self {
            C => "C",
            CSharp => "C#",
            D => "D",
            DSharp => "D#",
            E => "E",
            F => "F",
            FSharp => "F#",
            G => "G",
            GSharp => "G#",
            A => "A",
            ASharp => "A#",
            B => "B",
        };
        f.write_str(name)
    }
}

/// An octave number in scientific pitch notation. Values range from -1 to 9.
#[derive(PartialEq, Eq, Debug, Clone, Copy)]
pub struct Octave(i8);

impl Octave {
    /// Should be a value between [-1, 9]. Clamps between these two values.
    pub const fn new(octave: i8) -> Self {
        if octave < -1 {
            Self(-1)
        } else if octave > 9 {
            Self(9)
        } else {
            Self(octave)
        }
    }

    /// The octave, from `[-1,9]`
    pub const fn value(&self) -> i8 {
        self.0
    }
}

impl fmt::Display for Octave {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// The outcome of resolving one pitch.
///
/// The pitch itself is always playable. The remaining fields tell the caller
/// what, if anything, had to be assumed or corrected to get there.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedPitch {
    /// The playable MIDI note.
    pub pitch: Pitch,
    /// The MIDI number before clamping.
    pub requested: i64,
    /// The name had no octave and [`DEFAULT_OCTAVE`] was used.
    pub octave_defaulted: bool,
}

impl ResolvedPitch {
    /// True if `requested` lay outside of `0..=127`.
    pub const fn was_clamped(&self) -> bool {
        self.requested != self.pitch.byte() as i64
    }
}

#[doc = r#"
Resolves a note name such as `"C4"`, `"F#3"` or `"Eb5"` to a MIDI note number.

The number is `semitone + (octave + 1) * 12`, so `C4` is 60 and `A4` is 69.

- The letter is case-insensitive. `#`/`♯` raise and `b`/`♭` lower it by a semitone,
  so `Cb4` is the same key as `B3`.
- A missing octave defaults to [`DEFAULT_OCTAVE`] and is flagged in the result.
- Results outside `0..=127` are clamped and flagged, never rejected.

# Errors
[`NoteError::InvalidPitchName`] if the name does not start with `A`-`G` or the
octave is not an integer. The octave takes an optional `-` and no `+`.

# Example
```rust
# use smf_export::prelude::*;
assert_eq!(resolve_pitch("C4").unwrap().pitch.byte(), 60);
assert_eq!(resolve_pitch("G#3").unwrap().pitch.byte(), 56);
assert_eq!(resolve_pitch("Eb4").unwrap().pitch.byte(), 63);
assert!(resolve_pitch("H2").is_err());
```
"#]
pub fn resolve_pitch(name: &str) -> Result<ResolvedPitch, NoteError> {
    let invalid = || NoteError::InvalidPitchName(name.to_string());
    let trimmed = name.trim();
    let mut chars = trimmed.chars();

    let class = chars
        .next()
        .and_then(PitchClass::from_letter)
        .ok_or_else(invalid)?;

    let mut rest = chars.as_str();
    let mut offset = class.semitone() as i64;
    if let Some(stripped) = rest.strip_prefix(['#', '♯']) {
        offset += 1;
        rest = stripped;
    } else if let Some(stripped) = rest.strip_prefix(['b', '♭']) {
        offset -= 1;
        rest = stripped;
    }

    let (octave, octave_defaulted) = if rest.is_empty() {
        (DEFAULT_OCTAVE as i64, true)
    } else {
        let digits = rest.strip_prefix('-').unwrap_or(rest);
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return Err(invalid());
        }
        let octave: i64 = rest.parse().map_err(|_| invalid())?;
        (octave, false)
    };

    // saturates so absurd octaves still clamp to 0 or 127
    let requested = offset.saturating_add(octave.saturating_add(1).saturating_mul(12));
    Ok(ResolvedPitch {
        pitch: Pitch::clamped(requested),
        requested,
        octave_defaulted,
    })
}

/// Resolves a raw MIDI note number, clamping it into `0..=127`.
pub const fn resolve_midi_number(number: i64) -> ResolvedPitch {
    ResolvedPitch {
        pitch: Pitch::clamped(number),
        requested: number,
        octave_defaulted: false,
    }
}

#[test]
fn reference_pitches() {
    use pretty_assertions::assert_eq;
    assert_eq!(resolve_pitch("C4").unwrap().pitch.byte(), 60);
    assert_eq!(resolve_pitch("A4").unwrap().pitch.byte(), 69);
    assert_eq!(resolve_pitch("G#3").unwrap().pitch.byte(), 56);
    assert_eq!(resolve_pitch("C#4").unwrap().pitch.byte(), 61);
    assert_eq!(resolve_pitch("C-1").unwrap().pitch.byte(), 0);
    assert_eq!(resolve_pitch("G9").unwrap().pitch.byte(), 127);
}

#[test]
fn every_sharp_spelling_matches_its_number() {
    for number in 0..128u8 {
        let pitch = Pitch::from_midi(number).unwrap();
        let resolved = resolve_pitch(&pitch.to_string()).unwrap();
        assert_eq!(resolved.pitch, pitch);
        assert!(!resolved.was_clamped());
    }
}

#[test]
fn flats_normalize_to_sharps() {
    use pretty_assertions::assert_eq;
    assert_eq!(resolve_pitch("Eb4").unwrap().pitch, resolve_pitch("D#4").unwrap().pitch);
    assert_eq!(resolve_pitch("Bb2").unwrap().pitch, resolve_pitch("A#2").unwrap().pitch);
    assert_eq!(resolve_pitch("Cb4").unwrap().pitch, resolve_pitch("B3").unwrap().pitch);
    assert_eq!(resolve_pitch("B#3").unwrap().pitch, resolve_pitch("C4").unwrap().pitch);
    assert_eq!(resolve_pitch("D♭4").unwrap().pitch.byte(), 61);
    assert_eq!(resolve_pitch("f♯4").unwrap().pitch.byte(), 66);
}

#[test]
fn missing_octave_defaults_to_four() {
    let resolved = resolve_pitch("F#").unwrap();
    assert_eq!(resolved.pitch.byte(), 66);
    assert!(resolved.octave_defaulted);
    assert!(!resolve_pitch("F#4").unwrap().octave_defaulted);
}

#[test]
fn out_of_range_clamps() {
    let high = resolve_pitch("C10").unwrap();
    assert_eq!(high.requested, 132);
    assert_eq!(high.pitch.byte(), 127);
    assert!(high.was_clamped());

    let low = resolve_pitch("Cb-1").unwrap();
    assert_eq!(low.requested, -1);
    assert_eq!(low.pitch.byte(), 0);

    let number = resolve_midi_number(200);
    assert_eq!(number.pitch.byte(), 127);
    assert!(number.was_clamped());
}

#[test]
fn extreme_octaves_clamp() {
    let high = resolve_pitch(&format!("C{}", i64::MAX)).unwrap();
    assert_eq!(high.requested, i64::MAX);
    assert_eq!(high.pitch.byte(), 127);

    let low = resolve_pitch(&format!("C{}", i64::MIN)).unwrap();
    assert_eq!(low.requested, i64::MIN);
    assert_eq!(low.pitch.byte(), 0);

    let low_flat = resolve_pitch(&format!("Cb{}", i64::MIN + 1)).unwrap();
    assert_eq!(low_flat.pitch.byte(), 0);
}

#[test]
fn rejects_unknown_names() {
    for name in ["", "H4", "4C", "C#x", "C##4", "Xb", "C+4", "C-", "C 4", "C99999999999999999999"] {
        assert_eq!(
            resolve_pitch(name),
            Err(NoteError::InvalidPitchName(name.to_string()))
        );
    }
}

#[test]
fn octave_arithmetic() {
    let c4 = Pitch::MIDDLE_C;
    assert_eq!(c4 - 12, resolve_pitch("C3").unwrap().pitch);
    assert_eq!(c4 + 100, Pitch::clamped(127));
    assert_eq!((c4 - 100).byte(), 0);
    assert_eq!(Pitch::new(PitchClass::A, Octave::new(4)).byte(), 69);
    assert_eq!(Octave::new(12).value(), 9);
}
