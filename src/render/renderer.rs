use super::color::Color;
use super::keyboard::{KeyGeometry, KeyboardLayout};
use super::surface::{Rect, Surface};
use crate::config::{ColorMode, RenderConfig};
use crate::midi::Note;

const OUTLINE_WIDTH_RATIO: f64 = 0.0421875;
const KEY_SHADE: Color = Color::rgba(0, 0, 0, 89);
const CONTACT_HIGHLIGHT_ALPHA: f64 = 0.4;

/// Draws piano-roll frames: falling notes above a 128-key keyboard.
///
/// Note geometry is computed bottom-up (distance above the frame's bottom
/// edge) and flipped to screen rows when drawn.
#[derive(Debug, Clone)]
pub struct Renderer {
    width: f64,
    height: f64,
    keyboard_height: f64,
    pixels_per_tick: f64,
    background: Color,
    line: Option<Color>,
    border: bool,
    color_mode: ColorMode,
}

impl Renderer {
    pub fn new(config: &RenderConfig, ticks_per_quarter: u16) -> Self {
        let height = config.height() as f64;
        Self {
            width: config.width() as f64,
            height,
            keyboard_height: config.keyboard_height as f64,
            // half a frame height per quarter note at speed 1
            pixels_per_tick: height / 2.0 / ticks_per_quarter.max(1) as f64 * config.note_speed,
            background: config.background,
            line: config.line,
            border: config.border,
            color_mode: config.color_mode,
        }
    }

    pub fn pixels_per_tick(&self) -> f64 {
        self.pixels_per_tick
    }

    /// Ticks between the playhead and the top of the frame.
    pub fn lookahead_ticks(&self) -> f64 {
        (self.height - self.keyboard_height) / self.pixels_per_tick
    }

    pub fn layout(&self) -> KeyboardLayout {
        KeyboardLayout::new(self.width, self.keyboard_height)
    }

    fn outline_width(&self, keyboard: &KeyboardLayout) -> f64 {
        keyboard.white_key_width * OUTLINE_WIDTH_RATIO
    }

    /// Draws one full frame. `visible` are indices into `notes`, in draw
    /// order, as produced by the frame sweep for `current_tick`.
    pub fn draw_frame<S: Surface>(
        &self,
        surface: &mut S,
        notes: &[Note],
        visible: &[usize],
        keyboard: &KeyboardLayout,
        current_tick: i64,
    ) {
        surface.clear(self.background);
        let playhead = current_tick as f64 * self.pixels_per_tick;
        for &i in visible {
            self.draw_note(surface, &notes[i], keyboard, playhead);
        }
        self.draw_keyboard(surface, keyboard);
    }

    fn draw_note<S: Surface>(
        &self,
        surface: &mut S,
        note: &Note,
        keyboard: &KeyboardLayout,
        playhead: f64,
    ) {
        let key = keyboard.key(note.key);
        let h = (note.duration_ticks as f64 * self.pixels_per_tick).max(1.0);
        let bottom = note.start_tick as f64 * self.pixels_per_tick + self.keyboard_height - playhead;
        if bottom > self.height || bottom + h < self.keyboard_height {
            return;
        }

        let rect = Rect::new(key.left, self.height - bottom - h, key.width, h);
        surface.fill_rect(rect, self.color_mode.color(note));
        if self.border {
            surface.stroke_rect(rect, self.outline_width(keyboard), Color::OUTLINE);
        } else if bottom < self.keyboard_height {
            // fades as more of the note has passed into the keyboard
            let remaining = 1.0 - (self.keyboard_height - bottom) / h;
            surface.fill_rect(rect, Color::WHITE.with_alpha(CONTACT_HIGHLIGHT_ALPHA * remaining));
        }
    }

    fn draw_keyboard<S: Surface>(&self, surface: &mut S, keyboard: &KeyboardLayout) {
        let top = self.height - self.keyboard_height;
        let outline = self.outline_width(keyboard);
        for key in keyboard.white_keys().chain(keyboard.black_keys()) {
            self.draw_key(surface, key, top, outline);
        }

        if let Some(line) = self.line {
            let h = self.keyboard_height / 30.0;
            surface.fill_rect(Rect::new(0.0, top - h / 2.0, self.width, h), line);
        }
    }

    fn draw_key<S: Surface>(&self, surface: &mut S, key: &KeyGeometry, top: f64, outline: f64) {
        let rect = Rect::new(key.left, top, key.width, key.height);
        surface.fill_rect(rect, key.highlight().unwrap_or_else(|| key.default_color()));

        if !key.is_black {
            // pressed keys show a thinner shade
            let shade = if key.is_lit() {
                key.height / 35.0
            } else {
                key.height / 20.0
            };
            surface.fill_rect(
                Rect::new(key.left, self.height - shade, key.width, shade),
                KEY_SHADE,
            );
        }

        surface.stroke_rect(rect, outline, Color::OUTLINE);
    }
}
