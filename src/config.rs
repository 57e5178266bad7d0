use std::fs;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::midi::Note;
use crate::render::Color;

pub const MIN_NOTE_SPEED: f64 = 0.05;
pub const MAX_CRF: u8 = 51;

/// What picks a note's color and key-highlight group.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ColorMode {
    #[default]
    Channel,
    Track,
}

impl ColorMode {
    pub fn group(self, note: &Note) -> u32 {
        match self {
            ColorMode::Channel => note.channel as u32,
            ColorMode::Track => note.track,
        }
    }

    pub fn color(self, note: &Note) -> Color {
        Color::palette(self.group(note))
    }
}

impl FromStr for ColorMode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "channel" => Ok(ColorMode::Channel),
            "track" => Ok(ColorMode::Track),
            _ => Err(ConfigError::InvalidColorMode(s.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    /// Frame size in pixels, (width, height).
    pub resolution: (u32, u32),
    pub framerate: u32,
    /// x264 constant rate factor.
    pub crf: u8,
    pub background: Color,
    /// Keyboard height in pixels.
    pub keyboard_height: u32,
    /// Color of the line drawn along the top of the keyboard, if any.
    pub line: Option<Color>,
    pub color_mode: ColorMode,
    /// Outline notes instead of fading them into the keyboard.
    pub border: bool,
    pub note_speed: f64,
    /// Video start, in song seconds. Negative values add a lead-in.
    pub start_time: f64,
    /// Video length in seconds. Defaults to the song length plus one second.
    pub duration: Option<f64>,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            resolution: (1920, 1080),
            framerate: 60,
            crf: 16,
            background: Color::BLACK,
            keyboard_height: 156,
            line: None,
            color_mode: ColorMode::Channel,
            border: false,
            note_speed: 1.0,
            start_time: -1.0,
            duration: None,
        }
    }
}

impl RenderConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let ron_string = fs::read_to_string(path)?;
        let config: RenderConfig = ron::from_str(&ron_string)?;
        config.validate()?;
        Ok(config)
    }

    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let ron_string = ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())?;
        fs::write(path, ron_string)?;
        Ok(())
    }

    pub fn width(&self) -> u32 {
        self.resolution.0
    }

    pub fn height(&self) -> u32 {
        self.resolution.1
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let (width, height) = self.resolution;
        if width == 0 || height == 0 {
            return Err(ConfigError::InvalidResolution(format!("{width}x{height}")));
        }
        if self.framerate == 0 {
            return Err(ConfigError::OutOfRange {
                name: "framerate",
                expected: "at least 1",
                value: 0.0,
            });
        }
        if self.crf > MAX_CRF {
            return Err(ConfigError::OutOfRange {
                name: "crf",
                expected: "between 0 and 51",
                value: self.crf as f64,
            });
        }
        if self.keyboard_height >= height {
            return Err(ConfigError::OutOfRange {
                name: "keyboard_height",
                expected: "smaller than the frame height",
                value: self.keyboard_height as f64,
            });
        }
        if !(self.note_speed >= MIN_NOTE_SPEED && self.note_speed.is_finite()) {
            return Err(ConfigError::OutOfRange {
                name: "note_speed",
                expected: "at least 0.05",
                value: self.note_speed,
            });
        }
        if !self.start_time.is_finite() {
            return Err(ConfigError::OutOfRange {
                name: "start_time",
                expected: "a finite number of seconds",
                value: self.start_time,
            });
        }
        if let Some(duration) = self.duration
            && !(duration >= 1.0 && duration.is_finite())
        {
            return Err(ConfigError::OutOfRange {
                name: "duration",
                expected: "at least 1 second",
                value: duration,
            });
        }
        Ok(())
    }
}

/// Parses `WIDTHxHEIGHT`, e.g. `1280x720`.
pub fn parse_resolution(src: &str) -> Result<(u32, u32), ConfigError> {
    let invalid = || ConfigError::InvalidResolution(src.to_string());
    let (width, height) = src
        .split_once(['x', 'X'])
        .ok_or_else(invalid)?;
    let width: u32 = width.trim().parse().map_err(|_| invalid())?;
    let height: u32 = height.trim().parse().map_err(|_| invalid())?;
    if width == 0 || height == 0 {
        return Err(invalid());
    }
    Ok((width, height))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = RenderConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.resolution, (1920, 1080));
        assert_eq!(config.background, Color::BLACK);
    }

    #[test]
    fn reads_partial_ron_with_defaults() {
        let src = r##"(
            framerate: 30,
            line: Some("#ff0000"),
            color_mode: Track,
            border: true,
        )"##;
        let config: RenderConfig = ron::from_str(src).unwrap();
        assert_eq!(config.framerate, 30);
        assert_eq!(config.line, Some(Color::rgb(255, 0, 0)));
        assert_eq!(config.color_mode, ColorMode::Track);
        assert!(config.border);
        assert_eq!(config.keyboard_height, 156);
        assert_eq!(config.start_time, -1.0);
    }

    #[test]
    fn round_trips_through_ron() {
        let config = RenderConfig {
            resolution: (1280, 720),
            duration: Some(12.5),
            background: Color::rgb(0x10, 0x20, 0x30),
            ..RenderConfig::default()
        };
        let text = ron::ser::to_string_pretty(&config, ron::ser::PrettyConfig::default()).unwrap();
        let back: RenderConfig = ron::from_str(&text).unwrap();
        assert_eq!(back, config);
    }

    #[test]
    fn save_then_load_restores_the_config() {
        let path = std::env::temp_dir().join(format!("midiroll-config-{}.ron", std::process::id()));
        let config = RenderConfig {
            framerate: 24,
            line: Some(Color::rgb(0x12, 0x34, 0x56)),
            color_mode: ColorMode::Track,
            duration: Some(3.0),
            ..RenderConfig::default()
        };

        config.save(&path).unwrap();
        let loaded = RenderConfig::load(&path);
        std::fs::remove_file(&path).unwrap();
        assert_eq!(loaded.unwrap(), config);
    }

    #[test]
    fn load_rejects_invalid_values() {
        let path = std::env::temp_dir().join(format!("midiroll-bad-{}.ron", std::process::id()));
        std::fs::write(&path, "(note_speed: 0.0)").unwrap();
        let loaded = RenderConfig::load(&path);
        std::fs::remove_file(&path).unwrap();
        assert!(matches!(
            loaded,
            Err(ConfigError::OutOfRange { name: "note_speed", .. })
        ));
    }

    #[test]
    fn rejects_bad_color_in_ron() {
        let result: Result<RenderConfig, _> = ron::from_str(r#"(background: "blue")"#);
        assert!(result.is_err());
    }

    #[test]
    fn validate_catches_out_of_range_values() {
        let cases = [
            RenderConfig {
                note_speed: 0.01,
                ..RenderConfig::default()
            },
            RenderConfig {
                crf: 52,
                ..RenderConfig::default()
            },
            RenderConfig {
                framerate: 0,
                ..RenderConfig::default()
            },
            RenderConfig {
                keyboard_height: 1080,
                ..RenderConfig::default()
            },
            RenderConfig {
                duration: Some(0.5),
                ..RenderConfig::default()
            },
            RenderConfig {
                resolution: (0, 720),
                ..RenderConfig::default()
            },
        ];
        for config in cases {
            assert!(config.validate().is_err(), "{config:?}");
        }
    }

    #[test]
    fn parses_resolution() {
        assert_eq!(parse_resolution("1280x720").unwrap(), (1280, 720));
        assert_eq!(parse_resolution("640X480").unwrap(), (640, 480));
        for src in ["1280", "x720", "0x720", "axb", "1280x-1"] {
            assert!(parse_resolution(src).is_err(), "{src}");
        }
    }

    #[test]
    fn color_mode_picks_group() {
        let note = Note::new(3, 7, 60, 100, 0, 10);
        assert_eq!(ColorMode::Channel.group(&note), 3);
        assert_eq!(ColorMode::Track.group(&note), 7);
        assert_eq!(ColorMode::Track.color(&note), Color::palette(7));
        assert_eq!("TRACK".parse::<ColorMode>().unwrap(), ColorMode::Track);
        assert!("key".parse::<ColorMode>().is_err());
    }
}
