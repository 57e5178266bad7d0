use midiroll::midi::vlq;
use midiroll::render::{FrameSweep, KeyboardLayout, SweepWindow};
use midiroll::{Color, ColorMode, RenderConfig, RenderError, Song, render_song};

const TPQ: u16 = 96;

struct MemorySink {
    expected: Option<u64>,
    frames: Vec<Vec<u8>>,
    finished: bool,
}

impl MemorySink {
    fn new() -> Self {
        Self {
            expected: None,
            frames: Vec::new(),
            finished: false,
        }
    }
}

impl midiroll::FrameSink for MemorySink {
    fn begin(&mut self, total_frames: u64) {
        assert!(self.frames.is_empty(), "begin called after the first frame");
        self.expected = Some(total_frames);
    }

    fn write_frame(&mut self, frame: &[u8]) -> Result<(), RenderError> {
        assert!(!self.finished, "frame written after finish");
        self.frames.push(frame.to_vec());
        Ok(())
    }

    fn finish(&mut self) -> Result<(), RenderError> {
        self.finished = true;
        Ok(())
    }
}

/// Track events as (delta, bytes) pairs; the end-of-track event is appended.
fn track_chunk(events: &[(u32, &[u8])]) -> Vec<u8> {
    let mut body = Vec::new();
    for (delta, bytes) in events {
        vlq::encode(*delta, &mut body);
        body.extend_from_slice(bytes);
    }
    body.extend_from_slice(&[0x00, 0xFF, 0x2F, 0x00]);

    let mut chunk = b"MTrk".to_vec();
    chunk.extend_from_slice(&(body.len() as u32).to_be_bytes());
    chunk.extend_from_slice(&body);
    chunk
}

fn midi_file(tracks: &[Vec<u8>]) -> Vec<u8> {
    let mut bytes = b"MThd".to_vec();
    bytes.extend_from_slice(&6u32.to_be_bytes());
    bytes.extend_from_slice(&1u16.to_be_bytes());
    bytes.extend_from_slice(&(tracks.len() as u16).to_be_bytes());
    bytes.extend_from_slice(&TPQ.to_be_bytes());
    for track in tracks {
        bytes.extend_from_slice(track);
    }
    bytes
}

/// 120 BPM, middle C held for one quarter note.
fn single_note_song() -> Vec<u8> {
    midi_file(&[track_chunk(&[
        (0, &[0xFF, 0x51, 0x03, 0x07, 0xA1, 0x20]),
        (0, &[0x90, 0x3C, 0x64]),
        (96, &[0x80, 0x3C, 0x40]),
    ])])
}

fn small_config() -> RenderConfig {
    RenderConfig {
        resolution: (150, 120),
        framerate: 10,
        keyboard_height: 30,
        start_time: 0.0,
        ..RenderConfig::default()
    }
}

fn pixel(frame: &[u8], width: usize, x: usize, y: usize) -> Color {
    let i = (y * width + x) * 4;
    Color::rgba(frame[i], frame[i + 1], frame[i + 2], frame[i + 3])
}

#[test]
fn loads_single_note_song() {
    let song = Song::parse(&single_note_song()).unwrap();

    assert_eq!(song.ticks_per_quarter, TPQ);
    assert_eq!(song.notes().len(), 1);
    let note = &song.notes()[0];
    assert_eq!(note.key, 60);
    assert_eq!(note.start_tick, 0);
    assert_eq!(note.end_tick(), 96);
    assert_eq!(song.tempo.tick_to_seconds(96), 0.5);
    assert_eq!(song.duration_seconds(), 0.5);
}

#[test]
fn sweep_lights_key_while_note_sounds() {
    let mut song = Song::parse(&single_note_song()).unwrap();
    let mut keyboard = KeyboardLayout::new(150.0, 30.0);
    let mut sweep = FrameSweep::by_key_color(song.notes()).unwrap();

    let tick = song.tempo.seconds_to_tick(0.25);
    assert_eq!(tick, 48);
    let visible = sweep
        .advance(song.notes_mut(), &mut keyboard, SweepWindow::new(tick, 144.0), ColorMode::Channel)
        .to_vec();
    assert_eq!(visible, vec![0]);
    assert!(keyboard.key(60).is_lit());

    let tick = song.tempo.seconds_to_tick(0.75);
    sweep.advance(song.notes_mut(), &mut keyboard, SweepWindow::new(tick, 144.0), ColorMode::Channel);
    assert!(song.notes()[0].is_played());
    assert!(!keyboard.key(60).is_lit());
    assert!(sweep.is_finished());
}

#[test]
fn renders_every_frame_in_order() {
    let mut song = Song::parse(&single_note_song()).unwrap();
    let config = small_config();
    let mut sink = MemorySink::new();

    let summary = render_song(&mut song, &config, &mut sink).unwrap();

    // 0.5s of song plus one second of tail, at 10 fps
    assert_eq!(summary.frames, 15);
    assert_eq!(summary.notes, 1);
    assert_eq!(sink.frames.len(), 15);
    assert_eq!(sink.expected, Some(15));
    assert!(sink.finished);
    assert!(sink.frames.iter().all(|f| f.len() == 150 * 120 * 4));

    let note_color = Color::palette(0);
    // frame 0: note spans rows 30..90 above the keyboard, key 60 at x 70..72
    assert_eq!(pixel(&sink.frames[0], 150, 71, 60), note_color);
    assert_eq!(pixel(&sink.frames[0], 150, 71, 20), Color::BLACK);
    // key 60 is lit while the note sounds, white again afterwards
    assert_eq!(pixel(&sink.frames[2], 150, 71, 112), note_color);
    assert_eq!(pixel(&sink.frames[14], 150, 71, 112), Color::WHITE);
    assert_eq!(pixel(&sink.frames[14], 150, 71, 60), Color::BLACK);
}

#[test]
fn rendering_twice_gives_identical_frames() {
    let mut song = Song::parse(&single_note_song()).unwrap();
    let config = small_config();

    let mut first = MemorySink::new();
    render_song(&mut song, &config, &mut first).unwrap();
    let mut second = MemorySink::new();
    render_song(&mut song, &config, &mut second).unwrap();

    assert_eq!(first.frames, second.frames);
}

#[test]
fn tempo_change_moves_later_notes() {
    // 120 BPM, then 60 BPM from tick 96; second note starts at tick 192
    let bytes = midi_file(&[
        track_chunk(&[
            (0, &[0xFF, 0x51, 0x03, 0x07, 0xA1, 0x20]),
            (96, &[0xFF, 0x51, 0x03, 0x0F, 0x42, 0x40]),
        ]),
        track_chunk(&[
            (0, &[0x90, 0x3C, 0x64]),
            (96, &[0x3C, 0x00]),
            (96, &[0x3E, 0x64]),
            (48, &[0x80, 0x3E, 0x40]),
        ]),
    ]);
    let song = Song::parse(&bytes).unwrap();

    let starts: Vec<u64> = song.notes().iter().map(|n| n.start_tick).collect();
    assert_eq!(starts, vec![0, 192]);
    assert_eq!(song.tempo.tick_to_seconds(192), 1.5);
    assert_eq!(song.tempo.seconds_to_tick(1.5), 192);
    assert_eq!(song.notes()[0].end_tick(), 96);
}

#[test]
fn rejects_unsupported_files() {
    let mut bytes = single_note_song();
    bytes[9] = 0; // format 0
    assert!(Song::parse(&bytes).is_err());

    let mut bytes = single_note_song();
    let len = bytes.len();
    bytes.truncate(len - 2);
    assert!(Song::parse(&bytes).is_err());
}
