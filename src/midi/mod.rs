mod events;
mod file;
mod notes;
mod reader;
pub mod vlq;

pub use events::{END_OF_TRACK, EventKind, RawEvent, parse_events};
pub use file::{MidiFile, Track};
pub use notes::{Note, NoteState, reconstruct_notes};
pub use reader::ByteReader;
