use tracing::info;

use crate::error::ParseError;
use crate::midi::{MidiFile, Note, Track};
use crate::timing::{TempoMap, format_time};

/// A loaded MIDI file, ready to render.
#[derive(Debug, Clone)]
pub struct Song {
    pub ticks_per_quarter: u16,
    /// Per-track data as parsed. [`Song::notes`] holds the merged copy.
    pub tracks: Vec<Track>,
    pub tempo: TempoMap,
    /// Longest track duration.
    pub total_ticks: u64,
    notes: Vec<Note>,
}

impl Song {
    pub fn parse(bytes: &[u8]) -> Result<Self, ParseError> {
        MidiFile::parse(bytes).map(Self::from_file)
    }

    pub fn from_file(file: MidiFile) -> Self {
        Self::new(file.ticks_per_quarter, file.tracks)
    }

    pub fn new(ticks_per_quarter: u16, tracks: Vec<Track>) -> Self {
        let tempo_events = tracks
            .iter()
            .flat_map(|t| t.tempo_events.iter().cloned())
            .collect();
        let tempo = TempoMap::new(tempo_events, ticks_per_quarter);

        let mut notes: Vec<Note> = tracks
            .iter()
            .flat_map(|t| t.notes.iter().cloned())
            .collect();
        sort_notes(&mut notes);

        let total_ticks = tracks.iter().map(|t| t.duration_ticks).max().unwrap_or(0);

        let song = Self {
            ticks_per_quarter: tempo.ticks_per_quarter(),
            tracks,
            tempo,
            total_ticks,
            notes,
        };
        info!(
            "MIDI duration: {}\tTPQN: {}\tNotes: {}",
            format_time(song.duration_seconds()),
            song.ticks_per_quarter,
            song.notes.len()
        );
        song
    }

    /// All notes of the song, sorted by start tick.
    pub fn notes(&self) -> &[Note] {
        &self.notes
    }

    /// Mutable access for the render sweep, which only touches note state.
    pub fn notes_mut(&mut self) -> &mut [Note] {
        &mut self.notes
    }

    pub fn duration_seconds(&self) -> f64 {
        self.tempo.tick_to_seconds(self.total_ticks)
    }

    /// Puts every note back to `Pending` before an independent render pass.
    pub fn reset_render_state(&mut self) {
        self.notes.iter_mut().for_each(Note::reset);
    }
}

/// Sorts by start tick; simultaneous notes keep track, then channel, then key
/// order.
pub fn sort_notes(notes: &mut [Note]) {
    notes.sort_by_key(|n| (n.start_tick, n.track, n.channel, n.key));
}
