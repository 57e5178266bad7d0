use std::io;

use thiserror::Error;

/// Fatal problems found while loading a Standard MIDI File.
///
/// Offsets are absolute byte positions in the file buffer.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("expected '{expected}' chunk at byte {offset}")]
    BadMagic {
        expected: &'static str,
        offset: usize,
    },

    #[error("header chunk length is {length}, expected 6")]
    BadHeaderLength { length: u32 },

    #[error("unsupported MIDI format {format}, only format 1 is supported")]
    UnsupportedFormat { format: u16 },

    #[error("unsupported time division {division:#06x}, only ticks per quarter note is supported")]
    UnsupportedTiming { division: u16 },

    #[error("malformed data at byte {offset}: {reason}")]
    MalformedEncoding { offset: usize, reason: &'static str },

    #[error("unknown meta event {subtype:#04x} at byte {offset}")]
    UnknownMetaEvent { subtype: u8, offset: usize },

    #[error("track {track} does not end with an end-of-track event")]
    MissingEndOfTrack { track: usize },

    #[error("chunk at byte {offset} declares {declared} bytes but only {available} remain")]
    TruncatedChunk {
        offset: usize,
        declared: usize,
        available: usize,
    },
}

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("notes must be sorted by start tick (note {index} starts before its predecessor)")]
    UnsortedNotes { index: usize },

    #[error("frame is {actual} bytes, encoder expects {expected}")]
    FrameSize { expected: usize, actual: usize },

    #[error("encoder error: {0}")]
    Encoder(#[from] io::Error),

    #[error("encoder exited with {0}")]
    EncoderFailed(std::process::ExitStatus),

    #[error("encoder input closed")]
    EncoderClosed,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid color '{0}', expected #rgb, #rrggbb, 0xrgb or 0xrrggbb")]
    InvalidColor(String),

    #[error("invalid resolution '{0}', expected WIDTHxHEIGHT (e.g. 1920x1080)")]
    InvalidResolution(String),

    #[error("invalid color mode '{0}', expected 'channel' or 'track'")]
    InvalidColorMode(String),

    #[error("{name} must be {expected}, got {value}")]
    OutOfRange {
        name: &'static str,
        expected: &'static str,
        value: f64,
    },

    #[error("failed to read config: {0}")]
    Io(#[from] io::Error),

    #[error("failed to parse config: {0}")]
    Ron(#[from] ron::error::SpannedError),

    #[error("failed to write config: {0}")]
    Serialize(#[from] ron::Error),
}
