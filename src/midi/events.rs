use super::reader::ByteReader;
use crate::error::ParseError;

/// The three bytes every track chunk has to end with.
pub const END_OF_TRACK: [u8; 3] = [0xFF, 0x2F, 0x00];

const META_TEMPO: u8 = 0x51;
const META_END_OF_TRACK: u8 = 0x2F;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    NoteOn { channel: u8, key: u8, velocity: u8 },
    NoteOff { channel: u8, key: u8, velocity: u8 },
    TempoChange { microseconds_per_quarter: u32 },
    EndOfTrack,
}

/// A semantic event stamped with its absolute tick inside the track.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawEvent {
    pub tick: u64,
    pub kind: EventKind,
}

/// Parses one track body into note, tempo and end-of-track events.
///
/// Every other channel, meta and sysex event is skipped. Parsing stops at the
/// first end-of-track meta event. `base` is the absolute file offset of
/// `data[0]` and is only used for error reporting.
pub fn parse_events(data: &[u8], base: usize) -> Result<Vec<RawEvent>, ParseError> {
    let mut reader = ByteReader::with_base(data, base);
    let mut events = Vec::new();
    let mut running_status: Option<u8> = None;
    let mut tick = 0u64;

    while !reader.is_empty() {
        tick += reader.read_vlq()? as u64;

        let status_offset = reader.offset();
        let lead = reader.read_u8()?;
        let kind = match lead {
            0xF0 | 0xF7 => {
                let len = reader.read_vlq()?;
                reader.skip(len as usize)?;
                None
            }
            0xFF => match read_meta(&mut reader)? {
                Some(EventKind::EndOfTrack) => {
                    events.push(RawEvent {
                        tick,
                        kind: EventKind::EndOfTrack,
                    });
                    return Ok(events);
                }
                other => other,
            },
            0x80..=0xEF => {
                running_status = Some(lead);
                let first = reader.read_u8()?;
                read_channel_message(&mut reader, lead, first, status_offset)?
            }
            0x00..=0x7F => {
                let status = running_status.ok_or(ParseError::MalformedEncoding {
                    offset: status_offset,
                    reason: "data byte without a running status",
                })?;
                read_channel_message(&mut reader, status, lead, status_offset)?
            }
            _ => {
                return Err(ParseError::MalformedEncoding {
                    offset: status_offset,
                    reason: "invalid status byte",
                });
            }
        };

        if let Some(kind) = kind {
            events.push(RawEvent { tick, kind });
        }
    }

    Err(ParseError::MalformedEncoding {
        offset: reader.offset(),
        reason: "track data ended without an end-of-track event",
    })
}

fn read_meta(reader: &mut ByteReader<'_>) -> Result<Option<EventKind>, ParseError> {
    let subtype_offset = reader.offset();
    let subtype = reader.read_u8()?;
    match subtype {
        META_TEMPO => {
            let len_offset = reader.offset();
            if reader.read_vlq()? != 3 {
                return Err(ParseError::MalformedEncoding {
                    offset: len_offset,
                    reason: "tempo event must carry 3 data bytes",
                });
            }
            let microseconds_per_quarter = reader.read_u24_be()?;
            if microseconds_per_quarter == 0 {
                return Err(ParseError::MalformedEncoding {
                    offset: len_offset + 1,
                    reason: "tempo of zero microseconds per quarter note",
                });
            }
            Ok(Some(EventKind::TempoChange {
                microseconds_per_quarter,
            }))
        }
        META_END_OF_TRACK => {
            let len = reader.read_vlq()?;
            reader.skip(len as usize)?;
            Ok(Some(EventKind::EndOfTrack))
        }
        // sequence number, text events, channel prefix, port, SMPTE offset,
        // time signature, key signature, sequencer specific
        0x00..=0x09 | 0x20 | 0x21 | 0x54 | 0x58 | 0x59 | 0x7F => {
            let len = reader.read_vlq()?;
            reader.skip(len as usize)?;
            Ok(None)
        }
        _ => Err(ParseError::UnknownMetaEvent {
            subtype,
            offset: subtype_offset,
        }),
    }
}

/// Decodes a channel message whose status byte and first data byte are
/// already consumed.
fn read_channel_message(
    reader: &mut ByteReader<'_>,
    status: u8,
    first: u8,
    status_offset: usize,
) -> Result<Option<EventKind>, ParseError> {
    let channel = status & 0x0F;
    match status & 0xF0 {
        0x80 | 0x90 => {
            let key = data_byte(first, status_offset)?;
            let velocity_offset = reader.offset();
            let velocity = data_byte(reader.read_u8()?, velocity_offset)?;
            if status & 0xF0 == 0x90 && velocity > 0 {
                Ok(Some(EventKind::NoteOn {
                    channel,
                    key,
                    velocity,
                }))
            } else {
                Ok(Some(EventKind::NoteOff {
                    channel,
                    key,
                    velocity,
                }))
            }
        }
        0xA0 | 0xB0 | 0xE0 => {
            reader.skip(1)?;
            Ok(None)
        }
        // program change, channel pressure
        _ => Ok(None),
    }
}

fn data_byte(byte: u8, offset: usize) -> Result<u8, ParseError> {
    if byte & 0x80 != 0 {
        return Err(ParseError::MalformedEncoding {
            offset,
            reason: "data byte has the high bit set",
        });
    }
    Ok(byte)
}
