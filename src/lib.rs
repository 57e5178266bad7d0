pub mod config;
pub mod encoder;
pub mod error;
pub mod midi;
pub mod render;
pub mod session;
pub mod song;
pub mod timing;

pub use config::{ColorMode, RenderConfig};
pub use encoder::{EncoderSettings, EncoderUpdate, FfmpegEncoder, FrameSink};
pub use error::{ConfigError, ParseError, RenderError};
pub use midi::{MidiFile, Note, NoteState};
pub use render::{Color, FrameSweep, KeyboardLayout, Renderer};
pub use session::{FramePlan, RenderSummary, render_song};
pub use song::Song;
pub use timing::{TempoMap, format_time};
