use super::keyboard::{ActiveNoteId, KeyboardLayout, is_black_key};
use crate::config::ColorMode;
use crate::error::RenderError;
use crate::midi::Note;

/// The slice of song time one frame looks at.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SweepWindow {
    /// Playhead position. Negative during the lead-in before tick 0.
    pub current_tick: i64,
    /// How far past the playhead a note may start and still be on screen.
    pub lookahead_ticks: f64,
}

impl SweepWindow {
    pub fn new(current_tick: i64, lookahead_ticks: f64) -> Self {
        Self {
            current_tick,
            lookahead_ticks: lookahead_ticks.max(0.0),
        }
    }

    fn is_beyond(&self, start_tick: u64) -> bool {
        (start_tick as i64 - self.current_tick) as f64 > self.lookahead_ticks
    }
}

/// A tick-ordered list of indices into the song's note list, plus the number
/// of leading notes known to be played.
#[derive(Debug, Clone)]
struct Partition {
    indices: Vec<usize>,
    cursor: usize,
}

/// Incremental per-frame note state tracker.
///
/// Frames must be swept in increasing playhead order. Each partition's cursor
/// only moves forward past played notes, so a full render touches each note a
/// bounded number of times instead of rescanning the whole song every frame.
#[derive(Debug, Clone)]
pub struct FrameSweep {
    partitions: Vec<Partition>,
    visible: Vec<usize>,
}

impl FrameSweep {
    /// Builds a sweep over explicit partitions of `notes`.
    ///
    /// Fails if `notes` or any partition is not ascending by start tick.
    pub fn new(notes: &[Note], partitions: Vec<Vec<usize>>) -> Result<Self, RenderError> {
        check_sorted(notes.iter().map(|n| n.start_tick))?;
        for indices in &partitions {
            check_sorted(indices.iter().map(|&i| notes[i].start_tick))?;
        }

        Ok(Self {
            partitions: partitions
                .into_iter()
                .map(|indices| Partition { indices, cursor: 0 })
                .collect(),
            visible: Vec::new(),
        })
    }

    /// One partition holding every note.
    pub fn single(notes: &[Note]) -> Result<Self, RenderError> {
        Self::new(notes, vec![(0..notes.len()).collect()])
    }

    /// White-key notes first, then black-key notes, so black-key notes draw
    /// on top.
    pub fn by_key_color(notes: &[Note]) -> Result<Self, RenderError> {
        let (black, white): (Vec<usize>, Vec<usize>) =
            (0..notes.len()).partition(|&i| is_black_key(notes[i].key));
        Self::new(notes, vec![white, black])
    }

    /// Cursor position of every partition.
    pub fn cursors(&self) -> Vec<usize> {
        self.partitions.iter().map(|p| p.cursor).collect()
    }

    /// True once every note has been played.
    pub fn is_finished(&self) -> bool {
        self.partitions.iter().all(|p| p.cursor == p.indices.len())
    }

    /// Advances note state to `window.current_tick` and lights or unlights
    /// keys accordingly.
    ///
    /// Returns the indices of notes that may be on screen, in draw order.
    pub fn advance(
        &mut self,
        notes: &mut [Note],
        keyboard: &mut KeyboardLayout,
        window: SweepWindow,
        color_mode: ColorMode,
    ) -> &[usize] {
        self.visible.clear();

        for partition in &mut self.partitions {
            for &i in &partition.indices[partition.cursor..] {
                let note = &mut notes[i];
                if window.is_beyond(note.start_tick) {
                    break;
                }

                if note.start_tick as i64 <= window.current_tick {
                    let id = ActiveNoteId {
                        start_tick: note.start_tick,
                        group: color_mode.group(note),
                    };
                    if (note.end_tick() as i64) < window.current_tick {
                        if note.is_triggered() && !note.is_played() {
                            keyboard.key_mut(note.key).remove_color(id);
                        }
                        note.finish();
                    } else if note.trigger() {
                        keyboard
                            .key_mut(note.key)
                            .add_color(id, color_mode.color(note));
                    }
                }

                self.visible.push(i);
            }

            while partition
                .indices
                .get(partition.cursor)
                .is_some_and(|&i| notes[i].is_played())
            {
                partition.cursor += 1;
            }
        }

        &self.visible
    }
}

fn check_sorted(ticks: impl Iterator<Item = u64>) -> Result<(), RenderError> {
    let mut prev = 0;
    for (index, tick) in ticks.enumerate() {
        if tick < prev {
            return Err(RenderError::UnsortedNotes { index });
        }
        prev = tick;
    }
    Ok(())
}
