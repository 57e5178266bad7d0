use rayon::prelude::*;
use tracing::{debug, info, warn};

use super::events::{END_OF_TRACK, EventKind, parse_events};
use super::notes::{Note, reconstruct_notes};
use super::reader::ByteReader;
use crate::error::ParseError;
use crate::timing::TempoEvent;

const HEADER_LENGTH: u32 = 6;
const SUPPORTED_FORMAT: u16 = 1;

/// One parsed `MTrk` chunk.
#[derive(Debug, Clone)]
pub struct Track {
    pub index: u32,
    pub notes: Vec<Note>,
    pub tempo_events: Vec<TempoEvent>,
    /// Tick of the track's end-of-track event.
    pub duration_ticks: u64,
}

impl Track {
    /// Parses a track body. `base` is the file offset of `data[0]`.
    pub fn parse(index: u32, data: &[u8], base: usize) -> Result<Self, ParseError> {
        let events = parse_events(data, base)?;

        let duration_ticks = events.last().map_or(0, |e| e.tick);
        let tempo_events = events
            .iter()
            .filter_map(|e| match e.kind {
                EventKind::TempoChange {
                    microseconds_per_quarter,
                } => Some(TempoEvent::new(e.tick, microseconds_per_quarter)),
                _ => None,
            })
            .collect();
        let notes = reconstruct_notes(index, &events);

        Ok(Self {
            index,
            notes,
            tempo_events,
            duration_ticks,
        })
    }
}

#[derive(Debug, Clone)]
pub struct MidiFile {
    pub format: u16,
    /// Track count declared by the header.
    pub declared_tracks: u16,
    pub ticks_per_quarter: u16,
    pub tracks: Vec<Track>,
}

struct TrackChunk<'a> {
    data: &'a [u8],
    offset: usize,
}

impl MidiFile {
    pub fn parse(bytes: &[u8]) -> Result<Self, ParseError> {
        info!(
            "File size: {:.2}M ({} bytes)",
            bytes.len() as f64 / 1024.0 / 1024.0,
            bytes.len()
        );

        let mut reader = ByteReader::new(bytes);
        expect_magic(&mut reader, b"MThd", "MThd")?;

        let length = reader.read_u32_be()?;
        if length != HEADER_LENGTH {
            return Err(ParseError::BadHeaderLength { length });
        }

        let format = reader.read_u16_be()?;
        if format != SUPPORTED_FORMAT {
            return Err(ParseError::UnsupportedFormat { format });
        }

        let declared_tracks = reader.read_u16_be()?;
        let division = reader.read_u16_be()?;
        if division & 0x8000 != 0 || division == 0 {
            return Err(ParseError::UnsupportedTiming { division });
        }

        let chunks = split_track_chunks(&mut reader)?;
        if chunks.len() != declared_tracks as usize {
            warn!(
                declared = declared_tracks,
                found = chunks.len(),
                "header track count does not match the track chunks"
            );
        }

        // The terminator check is a whole-file precondition, run before any
        // track is parsed.
        if let Some(track) = chunks.iter().position(|c| !c.data.ends_with(&END_OF_TRACK)) {
            return Err(ParseError::MissingEndOfTrack { track });
        }

        let tracks = chunks
            .par_iter()
            .enumerate()
            .map(|(index, chunk)| Track::parse(index as u32, chunk.data, chunk.offset))
            .collect::<Result<Vec<_>, _>>()?;

        for track in &tracks {
            debug!(
                track = track.index,
                notes = track.notes.len(),
                tempo_events = track.tempo_events.len(),
                duration_ticks = track.duration_ticks,
                "parsed track"
            );
        }

        let file = Self {
            format,
            declared_tracks,
            ticks_per_quarter: division,
            tracks,
        };
        info!(
            tracks = file.tracks.len(),
            notes = file.note_count(),
            ticks_per_quarter = file.ticks_per_quarter,
            "MIDI file loaded"
        );
        Ok(file)
    }

    pub fn note_count(&self) -> usize {
        self.tracks.iter().map(|t| t.notes.len()).sum()
    }
}

fn expect_magic(
    reader: &mut ByteReader<'_>,
    magic: &[u8; 4],
    name: &'static str,
) -> Result<(), ParseError> {
    let offset = reader.offset();
    let found = reader
        .read_bytes(4)
        .map_err(|_| ParseError::BadMagic {
            expected: name,
            offset,
        })?;
    if found != magic {
        return Err(ParseError::BadMagic {
            expected: name,
            offset,
        });
    }
    Ok(())
}

fn split_track_chunks<'a>(
    reader: &mut ByteReader<'a>,
) -> Result<Vec<TrackChunk<'a>>, ParseError> {
    let mut chunks = Vec::new();
    while !reader.is_empty() {
        let chunk_offset = reader.offset();
        expect_magic(reader, b"MTrk", "MTrk")?;
        let declared = reader.read_u32_be()? as usize;
        if declared > reader.remaining() {
            return Err(ParseError::TruncatedChunk {
                offset: chunk_offset,
                declared,
                available: reader.remaining(),
            });
        }
        let offset = reader.offset();
        let data = reader.read_bytes(declared)?;
        chunks.push(TrackChunk { data, offset });
    }
    Ok(chunks)
}
