use std::time::{Duration, Instant};

use tracing::info;

use crate::config::RenderConfig;
use crate::encoder::FrameSink;
use crate::error::RenderError;
use crate::render::{FrameSweep, ImageSurface, Renderer, Surface, SweepWindow};
use crate::song::Song;
use crate::timing::format_time;

/// Which song times get a frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FramePlan {
    pub start_time: f64,
    pub end_time: f64,
    pub framerate: u32,
    pub total_frames: u64,
}

impl FramePlan {
    /// Runs from `start_time` for `duration` seconds, or until one second
    /// after the song ends.
    pub fn new(config: &RenderConfig, song_seconds: f64) -> Self {
        let start_time = config.start_time;
        let end_time = match config.duration {
            Some(duration) => start_time + duration,
            None => song_seconds + 1.0,
        };
        let framerate = config.framerate.max(1);
        let total_frames = ((end_time - start_time) * framerate as f64).ceil().max(0.0) as u64;
        Self {
            start_time,
            end_time,
            framerate,
            total_frames,
        }
    }

    /// Song time of frame `n`. Computed directly so long renders don't drift.
    pub fn time_at(&self, frame: u64) -> f64 {
        self.start_time + frame as f64 / self.framerate as f64
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RenderSummary {
    pub frames: u64,
    pub notes: usize,
    pub elapsed: Duration,
}

/// Renders every frame of `song` into `sink`, then finishes the sink.
///
/// Note render state is reset first, so the same song can be rendered
/// more than once.
pub fn render_song<S: FrameSink + ?Sized>(
    song: &mut Song,
    config: &RenderConfig,
    sink: &mut S,
) -> Result<RenderSummary, RenderError> {
    let started = Instant::now();
    song.reset_render_state();

    let renderer = Renderer::new(config, song.ticks_per_quarter);
    let mut keyboard = renderer.layout();
    let mut sweep = FrameSweep::by_key_color(song.notes())?;
    let mut surface = ImageSurface::new(config.width(), config.height());
    let plan = FramePlan::new(config, song.duration_seconds());
    let lookahead = renderer.lookahead_ticks();

    info!(
        "Rendering {} frames ({} to {}) at {}x{}, {} fps",
        plan.total_frames,
        format_time(plan.start_time),
        format_time(plan.end_time),
        config.width(),
        config.height(),
        plan.framerate
    );

    sink.begin(plan.total_frames);
    let mut next_report = 1;
    for frame in 0..plan.total_frames {
        let tick = song.tempo.seconds_to_tick(plan.time_at(frame));
        let notes = song.notes_mut();
        let visible = sweep.advance(
            notes,
            &mut keyboard,
            SweepWindow::new(tick, lookahead),
            config.color_mode,
        );
        renderer.draw_frame(&mut surface, notes, visible, &keyboard, tick);
        sink.write_frame(surface.frame())?;

        let done = frame + 1;
        if done * 10 >= next_report * plan.total_frames {
            info!(
                "{}/{} frames ({}%), elapsed {}",
                done,
                plan.total_frames,
                done * 100 / plan.total_frames,
                format_time(started.elapsed().as_secs_f64())
            );
            while next_report * plan.total_frames <= done * 10 {
                next_report += 1;
            }
        }
    }

    sink.finish()?;

    let summary = RenderSummary {
        frames: plan.total_frames,
        notes: song.notes().len(),
        elapsed: started.elapsed(),
    };
    info!(
        "Rendered {} frames in {}",
        summary.frames,
        format_time(summary.elapsed.as_secs_f64())
    );
    Ok(summary)
}
