use pretty_assertions::assert_eq;
use smf_export::{
    prelude::*,
    reader::{EventMessage, Reader, verify},
};

fn two_note_melody() -> NoteData {
    NoteData::new(vec![
        MelodyNote::new("C4", 0., 1., 0.8),
        MelodyNote::new("E4", 1., 1., 0.8),
    ])
}

fn c_major() -> ChordData {
    ChordData::new(vec![ChordEvent::new("C", ["C4", "E4", "G4"], 0., 1.)])
}

/// Every track chunk's body, in file order.
fn bodies(bytes: &[u8]) -> Vec<Vec<u8>> {
    let mut reader = Reader::from_byte_slice(bytes);
    reader.read_header().unwrap();
    let mut out = Vec::new();
    while let Some(track) = reader.read_track().unwrap() {
        out.push(track.body().to_vec());
    }
    out
}

#[test]
fn melody_only_file() {
    let file = Encoder::default()
        .encode(Some(&two_note_melody()), None, "Test", &ExportOptions::default())
        .unwrap();

    #[rustfmt::skip]
    let expected = vec![
        // header: format 1, 2 tracks, 480 tpqn
        0x4D, 0x54, 0x68, 0x64, 0x00, 0x00, 0x00, 0x06, 0x00, 0x01, 0x00, 0x02, 0x01, 0xE0,
        // control track
        0x4D, 0x54, 0x72, 0x6B, 0x00, 0x00, 0x00, 0x1C,
        0x00, 0xFF, 0x03, 0x04, b'T', b'e', b's', b't',
        0x00, 0xFF, 0x51, 0x03, 0x07, 0xA1, 0x20,
        0x00, 0xFF, 0x58, 0x04, 0x04, 0x02, 0x18, 0x08,
        0x87, 0x40, 0xFF, 0x2F, 0x00,
        // melody track
        0x4D, 0x54, 0x72, 0x6B, 0x00, 0x00, 0x00, 0x23,
        0x00, 0xFF, 0x03, 0x06, b'M', b'e', b'l', b'o', b'd', b'y',
        0x00, 0xC0, 0x00,
        0x00, 0x90, 0x3C, 0x66,
        0x83, 0x60, 0x80, 0x3C, 0x00,
        0x00, 0x90, 0x40, 0x66,
        0x83, 0x60, 0x80, 0x40, 0x00,
        0x00, 0xFF, 0x2F, 0x00,
    ];
    assert_eq!(file.bytes(), expected.as_slice());
    assert!(file.report().is_clean());
}

#[test]
fn chords_and_bass() {
    let file = Encoder::default()
        .encode(None, Some(&c_major()), "Chords only", &ExportOptions::default())
        .unwrap();
    let tracks = bodies(file.bytes());
    assert_eq!(tracks.len(), 3);

    #[rustfmt::skip]
    let chords = vec![
        0x00, 0xFF, 0x03, 0x06, b'C', b'h', b'o', b'r', b'd', b's',
        0x00, 0xC1, 0x04,
        0x00, 0x91, 0x3C, 0x50,
        0x00, 0x91, 0x40, 0x50,
        0x00, 0x91, 0x43, 0x50,
        0x8F, 0x00, 0x81, 0x3C, 0x00,
        0x00, 0x81, 0x40, 0x00,
        0x00, 0x81, 0x43, 0x00,
        0x00, 0xFF, 0x2F, 0x00,
    ];
    assert_eq!(tracks[1], chords);

    #[rustfmt::skip]
    let bass = vec![
        0x00, 0xFF, 0x03, 0x04, b'B', b'a', b's', b's',
        0x00, 0xC2, 0x20,
        0x00, 0x92, 0x30, 0x5A,
        0x8F, 0x00, 0x82, 0x30, 0x00,
        0x00, 0xFF, 0x2F, 0x00,
    ];
    assert_eq!(tracks[2], bass);
}

#[test]
fn nothing_to_export() {
    let options = ExportOptions::default();
    let encoder = Encoder::default();

    assert!(matches!(
        encoder.encode(None, None, "x", &options),
        Err(EncodeError::NothingToExport)
    ));
    assert!(matches!(
        encoder.encode(Some(&NoteData::default()), Some(&ChordData::default()), "x", &options),
        Err(EncodeError::NothingToExport)
    ));

    let excluded = ExportOptions {
        include_melody: false,
        ..Default::default()
    };
    assert!(matches!(
        encoder.encode(Some(&two_note_melody()), None, "x", &excluded),
        Err(EncodeError::NothingToExport)
    ));

    let mut unplayable = NoteData::new(vec![MelodyNote::new("X9", 0., 1., 0.8)]);
    unplayable.notes.push(MelodyNote::new("C4", 0., -2., 0.8));
    assert!(matches!(
        encoder.encode(Some(&unplayable), None, "x", &options),
        Err(EncodeError::NothingToExport)
    ));
}

#[test]
fn out_of_range_values_are_clamped() {
    let melody = NoteData::new(vec![MelodyNote::new(200i64, 0., 1., 1.5)]);
    let file = Encoder::default()
        .encode(Some(&melody), None, "Loud", &ExportOptions::default())
        .unwrap();
    let tracks = bodies(file.bytes());
    assert_eq!(&tracks[1][13..17], &[0x00, 0x90, 0x7F, 0x7F]);

    let kinds: Vec<_> = file.report().diagnostics().iter().map(|d| &d.kind).collect();
    assert_eq!(
        kinds,
        vec![
            &DiagnosticKind::PitchClamped {
                requested: 200,
                pitch: 127
            },
            &DiagnosticKind::VelocityClamped {
                requested: 1.5,
                velocity: 127
            },
        ]
    );
}

#[test]
fn bad_notes_are_skipped_not_fatal() {
    let melody = NoteData::new(vec![
        MelodyNote::new("C4", 0., 1., 0.8),
        MelodyNote::new("nope", 1., 1., 0.8),
        MelodyNote::new("D4", f64::NAN, 1., 0.8),
        MelodyNote::new("E4", 2., 1., 0.8),
    ]);
    let file = Encoder::default()
        .encode(Some(&melody), None, "Skips", &ExportOptions::default())
        .unwrap();
    let summary = verify(file.bytes()).unwrap();
    assert_eq!(summary.tracks[1].note_ons, 2);

    let report = file.report();
    assert_eq!(report.skipped(), 2);
    let indices: Vec<_> = report.for_track(TrackKind::Melody).map(|d| d.index).collect();
    assert_eq!(indices, vec![1, 2]);
    assert_eq!(
        report.diagnostics()[0].to_string(),
        "Melody #1: skipped, Invalid pitch name \"nope\""
    );
}

#[test]
fn header_and_chunk_lengths_hold() {
    let melody = two_note_melody().with_tempo(93.5);
    let chords = ChordData::new(vec![
        ChordEvent::new("A", ["A3", "C4", "E4"], 0., 1.),
        ChordEvent::new("F", ["F3", "A3", "C4"], 1., 0.5),
        ChordEvent::new("G", ["G3", "B3", "D4", "F4"], 1.5, 0.5),
    ]);
    let options = ExportOptions {
        apply_expression: true,
        ..Default::default()
    };
    let export = export_midi(Some(&melody), Some(&chords), "full", &options).unwrap();
    let bytes = export.bytes();

    assert_eq!(&bytes[0..4], b"MThd");
    assert_eq!(&bytes[4..8], &[0, 0, 0, 6]);
    assert_eq!(&bytes[8..10], &[0, 1]);
    assert_eq!(&bytes[12..14], &[0x01, 0xE0]);
    let declared = u16::from_be_bytes([bytes[10], bytes[11]]) as usize;

    let mut offset = 14;
    let mut chunks = 0;
    while offset < bytes.len() {
        assert_eq!(&bytes[offset..offset + 4], b"MTrk");
        let len = u32::from_be_bytes(bytes[offset + 4..offset + 8].try_into().unwrap()) as usize;
        let body = &bytes[offset + 8..offset + 8 + len];
        assert_eq!(&body[len - 3..], &[0xFF, 0x2F, 0x00]);
        offset += 8 + len;
        chunks += 1;
    }
    assert_eq!(offset, bytes.len());
    assert_eq!(chunks, declared);
    assert_eq!(chunks, 4);

    // the control track runs to the end of the last chord, two bars in
    let summary = verify(bytes).unwrap();
    let ends: Vec<_> = summary.tracks.iter().map(|t| t.end_tick).collect();
    assert_eq!(ends, vec![3840, 960, 3840, 3840]);
}

#[test]
fn equal_ticks_release_before_attack() {
    let melody = NoteData::new(vec![
        MelodyNote::new("C4", 1., 1., 0.5),
        MelodyNote::new("C4", 0., 1., 0.5),
    ]);
    let file = Encoder::default()
        .encode(Some(&melody), None, "Repeat", &ExportOptions::default())
        .unwrap();
    let mut reader = Reader::from_byte_slice(file.bytes());
    reader.read_header().unwrap();
    reader.read_track().unwrap();
    let melody = reader.read_track().unwrap().unwrap();
    let notes: Vec<_> = melody
        .events()
        .unwrap()
        .into_iter()
        .filter_map(|e| match e.message {
            EventMessage::NoteOn { .. } => Some((e.tick, "on")),
            EventMessage::NoteOff { .. } => Some((e.tick, "off")),
            _ => None,
        })
        .collect();
    assert_eq!(
        notes,
        vec![(0, "on"), (480, "off"), (480, "on"), (960, "off")]
    );
}

#[test]
fn spellings_and_tempo() {
    let melody = NoteData::new(vec![
        MelodyNote::new("Eb4", 0., 1., 0.8),
        MelodyNote::new("c#4", 1., 1., 0.8),
        MelodyNote::new("B♭3", 2., 1., 0.8),
    ]);
    let options = ExportOptions {
        tempo: Some(90.),
        ..Default::default()
    };
    let file = Encoder::default()
        .encode(Some(&melody.with_tempo(60.)), None, "Flats", &options)
        .unwrap();
    let tracks = bodies(file.bytes());

    // 90 BPM is 666667 microseconds per quarter note
    assert_eq!(&tracks[0][9..16], &[0x00, 0xFF, 0x51, 0x03, 0x0A, 0x2C, 0x2B]);

    let mut reader = Reader::from_byte_slice(file.bytes());
    reader.read_header().unwrap();
    reader.read_track().unwrap();
    let keys: Vec<_> = reader
        .read_track()
        .unwrap()
        .unwrap()
        .events()
        .unwrap()
        .into_iter()
        .filter_map(|e| match e.message {
            EventMessage::NoteOn { key, .. } => Some(key),
            _ => None,
        })
        .collect();
    assert_eq!(keys, vec![63, 61, 58]);
}

#[test]
fn invalid_channel_and_program() {
    let melody = two_note_melody();
    let options = ExportOptions {
        melody_channel: 16,
        ..Default::default()
    };
    assert!(matches!(
        Encoder::default().encode(Some(&melody), None, "x", &options),
        Err(EncodeError::InvalidChannel(16))
    ));

    let options = ExportOptions {
        chord_instrument: 128,
        ..Default::default()
    };
    assert!(matches!(
        Encoder::default().encode(None, Some(&c_major()), "x", &options),
        Err(EncodeError::InvalidProgram(128))
    ));

    // only tracks that are written are validated
    let options = ExportOptions {
        bass_channel: 99,
        include_bass: false,
        ..Default::default()
    };
    assert!(Encoder::default().encode(None, Some(&c_major()), "x", &options).is_ok());
}

#[test]
fn export_names_the_file() {
    let export = export_midi(
        Some(&two_note_melody()),
        None,
        "My Song",
        &ExportOptions::default(),
    )
    .unwrap();
    assert_eq!(export.file_name(), "My Song.mid");
    let control = &bodies(export.bytes())[0];
    assert_eq!(&control[..11], &[0x00, 0xFF, 0x03, 0x07, b'M', b'y', b' ', b'S', b'o', b'n', b'g']);

    let export = export_midi(Some(&two_note_melody()), None, "take.MIDI", &ExportOptions::default())
        .unwrap();
    assert_eq!(export.file_name(), "take.MIDI");
}

#[test]
fn humanize_is_reported() {
    let options = ExportOptions {
        humanize: true,
        ..Default::default()
    };
    let plain = Encoder::default()
        .encode(Some(&two_note_melody()), None, "H", &ExportOptions::default())
        .unwrap();
    let humanized = Encoder::default()
        .encode(Some(&two_note_melody()), None, "H", &options)
        .unwrap();
    assert_eq!(plain.bytes(), humanized.bytes());
    assert_eq!(
        humanized.report().diagnostics()[0].kind,
        DiagnosticKind::HumanizeIgnored
    );
}

#[test]
fn writes_to_disk() {
    let dir = std::env::temp_dir().join(format!("smf-export-{}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    let export = export_midi(None, Some(&c_major()), "disk", &ExportOptions::default()).unwrap();
    let path = export.write_to(&dir).unwrap();
    assert_eq!(path.file_name().unwrap(), "disk.mid");
    assert_eq!(std::fs::read(&path).unwrap(), export.bytes());
    std::fs::remove_dir_all(&dir).unwrap();
}

#[test]
fn two_notes_at_different_velocities() {
    let melody = NoteData::new(vec![
        MelodyNote::new("C4", 0., 1., 0.8),
        MelodyNote::new("E4", 1., 1., 0.7),
    ])
    .with_tempo(120.);
    let file = Encoder::default()
        .encode(Some(&melody), None, "Test", &ExportOptions::default())
        .unwrap();
    let tracks = bodies(file.bytes());
    assert_eq!(tracks.len(), 2);

    #[rustfmt::skip]
    let expected = vec![
        0x00, 0xFF, 0x03, 0x06, b'M', b'e', b'l', b'o', b'd', b'y',
        0x00, 0xC0, 0x00,
        0x00, 0x90, 0x3C, 0x66,
        0x83, 0x60, 0x80, 0x3C, 0x00,
        0x00, 0x90, 0x40, 0x59,
        0x83, 0x60, 0x80, 0x40, 0x00,
        0x00, 0xFF, 0x2F, 0x00,
    ];
    assert_eq!(tracks[1], expected);
    assert_eq!(&tracks[0][8..15], &[0x00, 0xFF, 0x51, 0x03, 0x07, 0xA1, 0x20]);
}

#[test]
fn absurd_octaves_do_not_abort() {
    let melody = NoteData::new(vec![
        MelodyNote::new("C4", 0., 1., 0.8),
        MelodyNote::new("C9223372036854775807", 1., 1., 0.8),
        MelodyNote::new("C-9223372036854775808", 2., 1., 0.8),
    ]);
    let chords = ChordData::new(vec![ChordEvent::new("C-768614336404564651", ["C4"], 0., 1.)]);
    let file = Encoder::default()
        .encode(Some(&melody), Some(&chords), "x", &ExportOptions::default())
        .unwrap();

    let summary = verify(file.bytes()).unwrap();
    let note_ons: Vec<_> = summary.tracks.iter().map(|t| t.note_ons).collect();
    assert_eq!(note_ons, vec![0, 3, 1, 1]);
    assert_eq!(file.report().skipped(), 0);

    let mut reader = Reader::from_byte_slice(file.bytes());
    reader.read_header().unwrap();
    reader.read_track().unwrap();
    let keys: Vec<_> = reader
        .read_track()
        .unwrap()
        .unwrap()
        .events()
        .unwrap()
        .into_iter()
        .filter_map(|e| match e.message {
            EventMessage::NoteOn { key, .. } => Some(key),
            _ => None,
        })
        .collect();
    assert_eq!(keys, vec![60, 127, 0]);
}

#[test]
fn sequence_name_is_ascii() {
    let export = export_midi(Some(&two_note_melody()), None, "Café", &ExportOptions::default())
        .unwrap();
    assert_eq!(export.file_name(), "Café.mid");
    let control = &bodies(export.bytes())[0];
    assert_eq!(&control[..8], &[0x00, 0xFF, 0x03, 0x04, b'C', b'a', b'f', b'_']);
}
