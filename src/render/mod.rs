mod color;
mod keyboard;
mod renderer;
mod surface;
mod sweep;

pub use color::Color;
pub use keyboard::{
    ActiveNoteId, KEY_COUNT, KeyGeometry, KeyboardLayout, WHITE_KEY_COUNT, is_black_key,
};
pub use renderer::Renderer;
pub use surface::{ImageSurface, Rect, Surface};
pub use sweep::{FrameSweep, SweepWindow};
