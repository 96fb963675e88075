#![cfg(feature = "serde")]

use pretty_assertions::assert_eq;
use smf_export::prelude::*;

#[test]
fn generator_json_encodes() {
    let note_data: NoteData = serde_json::from_str(
        r#"{
            "tempo": 100,
            "notes": [
                { "pitch": "A4", "startTime": 0, "duration": 0.5, "velocity": 0.9 },
                { "pitch": 64, "startTime": 0.5, "duration": 0.5 },
                { "startTime": 1, "duration": 1 }
            ]
        }"#,
    )
    .unwrap();
    assert_eq!(note_data.notes[1].pitch, Some(PitchInput::Number(64)));
    assert_eq!(note_data.notes[1].velocity, 0.8);
    assert_eq!(note_data.notes[2].pitch, None);

    let chord_data: ChordData = serde_json::from_str(
        r#"{ "progression": [ { "root": "D", "notes": ["D4", "F#4", "A4"], "position": 0, "duration": 1 } ] }"#,
    )
    .unwrap();

    let options: ExportOptions = serde_json::from_str(r#"{ "includeBass": false }"#).unwrap();
    let export = export_midi(Some(&note_data), Some(&chord_data), "from json", &options).unwrap();

    let summary = smf_export::reader::verify(export.bytes()).unwrap();
    assert_eq!(summary.header.num_tracks(), 3);
    let note_ons: Vec<_> = summary.tracks.iter().map(|t| t.note_ons).collect();
    assert_eq!(note_ons, vec![0, 2, 3]);
    assert_eq!(export.report().skipped(), 1);
}

#[test]
fn empty_options_are_the_defaults() {
    let options: ExportOptions = serde_json::from_str("{}").unwrap();
    assert_eq!(options, ExportOptions::default());

    let round_trip: ExportOptions =
        serde_json::from_str(&serde_json::to_string(&options).unwrap()).unwrap();
    assert_eq!(round_trip, options);
}
