use std::collections::VecDeque;

use tracing::debug;

use super::events::{EventKind, RawEvent};

/// Where a note is in its render lifecycle.
///
/// The order of the variants is the only order a note may move in.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum NoteState {
    #[default]
    Pending,
    Triggered,
    Played,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Note {
    pub channel: u8,
    pub track: u32,
    pub key: u8,
    pub velocity: u8,
    pub start_tick: u64,
    pub duration_ticks: u64,
    state: NoteState,
}

impl Note {
    pub fn new(
        channel: u8,
        track: u32,
        key: u8,
        velocity: u8,
        start_tick: u64,
        duration_ticks: u64,
    ) -> Self {
        Self {
            channel,
            track,
            key: key & 0x7F,
            velocity,
            start_tick,
            duration_ticks,
            state: NoteState::Pending,
        }
    }

    #[inline]
    pub fn end_tick(&self) -> u64 {
        self.start_tick + self.duration_ticks
    }

    #[inline]
    pub fn state(&self) -> NoteState {
        self.state
    }

    pub fn is_triggered(&self) -> bool {
        self.state >= NoteState::Triggered
    }

    pub fn is_played(&self) -> bool {
        self.state == NoteState::Played
    }

    /// Moves `Pending -> Triggered`. Returns whether the state changed.
    pub fn trigger(&mut self) -> bool {
        if self.state == NoteState::Pending {
            self.state = NoteState::Triggered;
            true
        } else {
            false
        }
    }

    /// Moves to `Played` from any earlier state. Returns whether the state
    /// changed.
    pub fn finish(&mut self) -> bool {
        if self.state != NoteState::Played {
            self.state = NoteState::Played;
            true
        } else {
            false
        }
    }

    /// Back to `Pending`, only used between independent render passes.
    pub fn reset(&mut self) {
        self.state = NoteState::Pending;
    }
}

/// Pairs NoteOn/NoteOff events per key into closed notes.
///
/// Each NoteOn, in tick order, takes the earliest unclaimed NoteOff on the same
/// key whose tick is not before its own. A NoteOn left without a NoteOff is
/// dropped. Output is grouped by key, ascending.
pub fn reconstruct_notes(track: u32, events: &[RawEvent]) -> Vec<Note> {
    let mut note_ons: Vec<VecDeque<(u64, u8, u8)>> = vec![VecDeque::new(); 128];
    let mut note_offs: Vec<VecDeque<u64>> = vec![VecDeque::new(); 128];

    for event in events {
        match event.kind {
            EventKind::NoteOn {
                channel,
                key,
                velocity,
            } => note_ons[key as usize & 0x7F].push_back((event.tick, channel, velocity)),
            EventKind::NoteOff { key, .. } => note_offs[key as usize & 0x7F].push_back(event.tick),
            _ => {}
        }
    }

    let mut notes = Vec::new();
    let mut dropped = 0usize;
    for (key, (ons, mut offs)) in note_ons.into_iter().zip(note_offs).enumerate() {
        for (start, channel, velocity) in ons {
            // Offs are tick-ordered and so are the ons, so an off earlier than
            // this on can never close a later one either.
            while offs.front().is_some_and(|&off| off < start) {
                offs.pop_front();
            }
            match offs.pop_front() {
                Some(end) => notes.push(Note::new(
                    channel,
                    track,
                    key as u8,
                    velocity,
                    start,
                    end - start,
                )),
                None => dropped += 1,
            }
        }
    }

    if dropped > 0 {
        debug!(track, dropped, "dropped note-ons without a matching note-off");
    }

    notes
}
