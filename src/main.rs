use std::error::Error;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::Parser;
use midiroll::config::parse_resolution;
use midiroll::{
    Color, ColorMode, EncoderSettings, FfmpegEncoder, RenderConfig, Song, render_song,
};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about = "Renders a MIDI file as a falling-notes piano video", long_about = None)]
struct Cli {
    /// Path to input MIDI file
    input: PathBuf,

    /// Output video file [default: <input>.mp4]
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Video size as WIDTHxHEIGHT
    #[arg(short, long, value_parser = parse_resolution)]
    resolution: Option<(u32, u32)>,

    /// Frames per second
    #[arg(short, long)]
    framerate: Option<u32>,

    /// x264 constant rate factor (0-51)
    #[arg(long)]
    crf: Option<u8>,

    /// Background color, e.g. #000000
    #[arg(short, long)]
    background: Option<Color>,

    /// Keyboard height in pixels
    #[arg(short, long)]
    keyboard_height: Option<u32>,

    /// Draw a line of this color along the top of the keyboard
    #[arg(short, long)]
    line: Option<Color>,

    /// Color notes by `channel` or by `track`
    #[arg(short = 'c', long)]
    color_mode: Option<ColorMode>,

    /// Outline notes instead of highlighting them at the keyboard
    #[arg(long)]
    border: bool,

    /// Note fall speed multiplier (at least 0.05)
    #[arg(short = 's', long)]
    note_speed: Option<f64>,

    /// Start time in seconds; negative values add a lead-in
    #[arg(short = 't', long, allow_hyphen_values = true)]
    start_time: Option<f64>,

    /// Video length in seconds
    #[arg(short, long)]
    duration: Option<f64>,

    /// RON file with render settings; other flags override it
    #[arg(long)]
    config: Option<PathBuf>,

    /// ffmpeg executable
    #[arg(long, default_value = "ffmpeg")]
    ffmpeg: PathBuf,
}

impl Cli {
    fn render_config(&self) -> Result<RenderConfig, Box<dyn Error>> {
        let mut config = match &self.config {
            Some(path) => RenderConfig::load(path)?,
            None => RenderConfig::default(),
        };

        if let Some(resolution) = self.resolution {
            config.resolution = resolution;
        }
        if let Some(framerate) = self.framerate {
            config.framerate = framerate;
        }
        if let Some(crf) = self.crf {
            config.crf = crf;
        }
        if let Some(background) = self.background {
            config.background = background;
        }
        if let Some(keyboard_height) = self.keyboard_height {
            config.keyboard_height = keyboard_height;
        }
        if self.line.is_some() {
            config.line = self.line;
        }
        if let Some(color_mode) = self.color_mode {
            config.color_mode = color_mode;
        }
        if self.border {
            config.border = true;
        }
        if let Some(note_speed) = self.note_speed {
            config.note_speed = note_speed;
        }
        if let Some(start_time) = self.start_time {
            config.start_time = start_time;
        }
        if self.duration.is_some() {
            config.duration = self.duration;
        }

        config.validate()?;
        Ok(config)
    }

    fn output_path(&self) -> PathBuf {
        self.output
            .clone()
            .unwrap_or_else(|| default_output(&self.input))
    }
}

/// `song.mid` becomes `song.mp4`, next to the input.
fn default_output(input: &Path) -> PathBuf {
    input.with_extension("mp4")
}

fn run(cli: &Cli) -> Result<(), Box<dyn Error>> {
    let config = cli.render_config()?;
    let output = cli.output_path();

    info!("Loading MIDI from: {}", cli.input.display());
    let bytes = std::fs::read(&cli.input)?;
    let mut song = Song::parse(&bytes)?;

    let settings = EncoderSettings {
        program: cli.ffmpeg.clone(),
        ..EncoderSettings::new(&config, output)
    };
    let mut encoder = FfmpegEncoder::spawn(settings)?;
    render_song(&mut song, &config, &mut encoder)?;
    Ok(())
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            ExitCode::FAILURE
        }
    }
}
