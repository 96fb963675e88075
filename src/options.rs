/// Options for one export.
///
/// Every field has a default, so `ExportOptions::default()` (or `{}` when
/// deserialized) exports melody, chords and a derived bass line at the
/// default instruments and the input's tempo.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(default, rename_all = "camelCase")
)]
pub struct ExportOptions {
    /// Write the melody track. Default: true.
    pub include_melody: bool,
    /// Write the chord track. Default: true.
    pub include_chords: bool,
    /// Write a bass track playing each chord root an octave down. Default: true.
    pub include_bass: bool,
    /// Zero-based channel of the melody. Default: 0.
    pub melody_channel: u8,
    /// Zero-based channel of the chords. Default: 1.
    pub chord_channel: u8,
    /// Zero-based channel of the bass. Default: 2.
    pub bass_channel: u8,
    /// General MIDI program of the melody. Default: 0, acoustic grand piano.
    pub melody_instrument: u8,
    /// General MIDI program of the chords. Default: 4, electric piano.
    pub chord_instrument: u8,
    /// General MIDI program of the bass. Default: 32, acoustic bass.
    pub bass_instrument: u8,
    /// Write volume and an expression crescendo on the melody. Default: false.
    pub apply_expression: bool,
    /// Reserved. Accepted and reported, the output is unchanged. Default: false.
    pub humanize: bool,
    /// Beats per minute. Overrides the tempo carried by the input. Default: none.
    pub tempo: Option<f64>,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            include_melody: true,
            include_chords: true,
            include_bass: true,
            melody_channel: 0,
            chord_channel: 1,
            bass_channel: 2,
            melody_instrument: 0,
            chord_instrument: 4,
            bass_instrument: 32,
            apply_expression: false,
            humanize: false,
            tempo: None,
        }
    }
}

#[cfg(feature = "serde")]
#[test]
fn empty_object_is_the_default() {
    use pretty_assertions::assert_eq;
    let options: ExportOptions = serde_json::from_str("{}").unwrap();
    assert_eq!(options, ExportOptions::default());

    let options: ExportOptions =
        serde_json::from_str(r#"{"includeBass": false, "bassInstrument": 33, "tempo": 96}"#)
            .unwrap();
    assert!(!options.include_bass);
    assert_eq!(options.bass_instrument, 33);
    assert_eq!(options.tempo, Some(96.));
    assert!(options.include_chords);
}
