use std::collections::BTreeMap;

use super::color::Color;

pub const KEY_COUNT: usize = 128;
/// White keys among the 128 MIDI keys (10 full octaves plus C..G).
pub const WHITE_KEY_COUNT: usize = 75;

const BLACK_KEY_WIDTH_RATIO: f64 = 0.5;
const BLACK_KEY_HEIGHT_RATIO: f64 = 0.65;

/// For each pitch class: the white key index inside the octave (C=0 .. B=6),
/// or for black keys, the white key boundary they sit on and how far (in
/// half black-key widths) they are pushed off center. Negative pushes left.
///
/// | key | boundary | shift  | left edge, in white key widths |
/// |-----|----------|--------|--------------------------------|
/// | C#  | 1        | -0.375 | 1 - 0.34375 = 0.65625          |
/// | D#  | 2        | +0.375 | 2 - 0.15625 = 1.84375          |
/// | F#  | 4        | -0.375 | 4 - 0.34375 = 3.65625          |
/// | G#  | 5        | 0      | 5 - 0.25    = 4.75             |
/// | A#  | 6        | +0.375 | 6 - 0.15625 = 5.84375          |
#[derive(Clone, Copy)]
enum PitchClass {
    White { index: u8 },
    Black { boundary: u8, shift: f64 },
}

const PITCH_CLASSES: [PitchClass; 12] = [
    PitchClass::White { index: 0 },
    PitchClass::Black {
        boundary: 1,
        shift: -0.375,
    },
    PitchClass::White { index: 1 },
    PitchClass::Black {
        boundary: 2,
        shift: 0.375,
    },
    PitchClass::White { index: 2 },
    PitchClass::White { index: 3 },
    PitchClass::Black {
        boundary: 4,
        shift: -0.375,
    },
    PitchClass::White { index: 4 },
    PitchClass::Black {
        boundary: 5,
        shift: 0.0,
    },
    PitchClass::White { index: 5 },
    PitchClass::Black {
        boundary: 6,
        shift: 0.375,
    },
    PitchClass::White { index: 6 },
];

pub fn is_black_key(key: u8) -> bool {
    matches!(key % 12, 1 | 3 | 6 | 8 | 10)
}

/// Identifies one lit note on a key. Orders by start tick first, so the
/// greatest id is the most recently started note.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ActiveNoteId {
    pub start_tick: u64,
    /// Channel or track index, depending on the color mode.
    pub group: u32,
}

#[derive(Debug, Clone)]
pub struct KeyGeometry {
    pub key: u8,
    pub is_black: bool,
    pub left: f64,
    pub width: f64,
    pub height: f64,
    // (color, number of notes sharing the id)
    active_colors: BTreeMap<ActiveNoteId, (Color, u32)>,
}

impl KeyGeometry {
    pub fn default_color(&self) -> Color {
        if self.is_black {
            Color::BLACK
        } else {
            Color::WHITE
        }
    }

    pub fn add_color(&mut self, id: ActiveNoteId, color: Color) {
        let entry = self.active_colors.entry(id).or_insert((color, 0));
        entry.0 = color;
        entry.1 += 1;
    }

    pub fn remove_color(&mut self, id: ActiveNoteId) {
        if let Some(entry) = self.active_colors.get_mut(&id) {
            entry.1 -= 1;
            if entry.1 == 0 {
                self.active_colors.remove(&id);
            }
        }
    }

    /// Color of the latest-starting active note; ties on start tick go to
    /// the highest group index.
    pub fn highlight(&self) -> Option<Color> {
        self.active_colors
            .last_key_value()
            .map(|(_, (color, _))| *color)
    }

    pub fn is_lit(&self) -> bool {
        !self.active_colors.is_empty()
    }

    pub fn active_count(&self) -> usize {
        self.active_colors.len()
    }

    pub fn clear_colors(&mut self) {
        self.active_colors.clear();
    }
}

/// Geometry for all 128 keys across a fixed total width.
#[derive(Debug, Clone)]
pub struct KeyboardLayout {
    keys: Vec<KeyGeometry>,
    pub white_key_width: f64,
    pub black_key_width: f64,
    pub height: f64,
}

impl KeyboardLayout {
    pub fn new(total_width: f64, height: f64) -> Self {
        let white_key_width = total_width / WHITE_KEY_COUNT as f64;
        let black_key_width = white_key_width * BLACK_KEY_WIDTH_RATIO;
        let half_black = black_key_width / 2.0;

        let keys = (0..KEY_COUNT as u8)
            .map(|key| {
                let octave_left = (key / 12) as f64 * 7.0 * white_key_width;
                match PITCH_CLASSES[(key % 12) as usize] {
                    PitchClass::White { index } => KeyGeometry {
                        key,
                        is_black: false,
                        left: octave_left + index as f64 * white_key_width,
                        width: white_key_width,
                        height,
                        active_colors: BTreeMap::new(),
                    },
                    PitchClass::Black { boundary, shift } => KeyGeometry {
                        key,
                        is_black: true,
                        left: octave_left + boundary as f64 * white_key_width - half_black
                            + half_black * shift,
                        width: black_key_width,
                        height: height * BLACK_KEY_HEIGHT_RATIO,
                        active_colors: BTreeMap::new(),
                    },
                }
            })
            .collect();

        Self {
            keys,
            white_key_width,
            black_key_width,
            height,
        }
    }

    pub fn key(&self, key: u8) -> &KeyGeometry {
        &self.keys[key as usize & 0x7F]
    }

    pub fn key_mut(&mut self, key: u8) -> &mut KeyGeometry {
        &mut self.keys[key as usize & 0x7F]
    }

    pub fn keys(&self) -> &[KeyGeometry] {
        &self.keys
    }

    pub fn white_keys(&self) -> impl Iterator<Item = &KeyGeometry> {
        self.keys.iter().filter(|k| !k.is_black)
    }

    pub fn black_keys(&self) -> impl Iterator<Item = &KeyGeometry> {
        self.keys.iter().filter(|k| k.is_black)
    }

    /// Unlights every key, for a fresh render pass.
    pub fn reset_colors(&mut self) {
        self.keys.iter_mut().for_each(KeyGeometry::clear_colors);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-9;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < EPS
    }

    #[test]
    fn classifies_black_keys() {
        let black: Vec<u8> = (0..12).filter(|&k| is_black_key(k)).collect();
        assert_eq!(black, vec![1, 3, 6, 8, 10]);

        let layout = KeyboardLayout::new(750.0, 100.0);
        assert_eq!(layout.white_keys().count(), WHITE_KEY_COUNT);
        assert_eq!(layout.black_keys().count(), KEY_COUNT - WHITE_KEY_COUNT);
    }

    #[test]
    fn white_keys_tile_the_full_width() {
        let layout = KeyboardLayout::new(1920.0, 156.0);
        let wkw = 1920.0 / 75.0;
        for (i, key) in layout.white_keys().enumerate() {
            assert!(close(key.left, i as f64 * wkw), "key {}", key.key);
            assert!(close(key.width, wkw));
            assert!(close(key.height, 156.0));
        }
        let last = layout.key(127);
        assert!(close(last.left + last.width, 1920.0));
        assert!(close(layout.key(60).left, 35.0 * wkw));
    }

    #[test]
    fn black_key_offsets_match_table() {
        let layout = KeyboardLayout::new(750.0, 100.0);
        // white key width is 10
        let expected = [(1, 6.5625), (3, 18.4375), (6, 36.5625), (8, 47.5), (10, 58.4375)];
        for octave in [0u8, 5, 9] {
            for (class, left) in expected {
                let key = layout.key(octave * 12 + class);
                assert!(key.is_black);
                assert!(
                    close(key.left, left + octave as f64 * 70.0),
                    "key {} at {}",
                    key.key,
                    key.left
                );
                assert!(close(key.width, 5.0));
                assert!(close(key.height, 65.0));
            }
        }
    }

    #[test]
    fn highlight_prefers_latest_start_then_highest_group() {
        let mut layout = KeyboardLayout::new(750.0, 100.0);
        let key = layout.key_mut(60);
        let red = Color::rgb(255, 0, 0);
        let green = Color::rgb(0, 255, 0);
        let blue = Color::rgb(0, 0, 255);

        key.add_color(ActiveNoteId { start_tick: 10, group: 5 }, red);
        key.add_color(ActiveNoteId { start_tick: 20, group: 1 }, green);
        assert_eq!(key.highlight(), Some(green));

        key.add_color(ActiveNoteId { start_tick: 20, group: 3 }, blue);
        assert_eq!(key.highlight(), Some(blue));

        key.remove_color(ActiveNoteId { start_tick: 20, group: 3 });
        key.remove_color(ActiveNoteId { start_tick: 20, group: 1 });
        assert_eq!(key.highlight(), Some(red));

        key.remove_color(ActiveNoteId { start_tick: 10, group: 5 });
        assert_eq!(key.highlight(), None);
        assert!(!key.is_lit());
    }

    #[test]
    fn shared_ids_stay_lit_until_last_release() {
        let mut layout = KeyboardLayout::new(750.0, 100.0);
        let id = ActiveNoteId { start_tick: 0, group: 0 };
        let key = layout.key_mut(61);
        key.add_color(id, Color::WHITE);
        key.add_color(id, Color::WHITE);
        key.remove_color(id);
        assert!(key.is_lit());
        key.remove_color(id);
        assert!(!key.is_lit());
        // removing an unknown id is a no-op
        key.remove_color(id);
        assert_eq!(key.active_count(), 0);
    }

    #[test]
    fn reset_unlights_all_keys() {
        let mut layout = KeyboardLayout::new(750.0, 100.0);
        layout
            .key_mut(10)
            .add_color(ActiveNoteId { start_tick: 0, group: 0 }, Color::WHITE);
        layout.reset_colors();
        assert!(layout.keys().iter().all(|k| !k.is_lit()));
    }
}
