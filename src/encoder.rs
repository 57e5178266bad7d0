use std::io::{self, BufRead, BufReader, Write};
use std::path::PathBuf;
use std::process::{Child, Command, Stdio};
use std::thread::JoinHandle;

use crossbeam::channel::{Receiver, Sender};
use tracing::{debug, info};

use crate::config::RenderConfig;
use crate::error::RenderError;

/// Frames buffered between the renderer and the encoder process.
const FRAME_QUEUE: usize = 8;

/// Consumer of rendered RGBA frames, in order.
pub trait FrameSink {
    /// Called once before the first frame with the number of frames to come.
    fn begin(&mut self, _total_frames: u64) {}
    fn write_frame(&mut self, frame: &[u8]) -> Result<(), RenderError>;
    /// Flushes and closes the sink. No frames may be written afterwards.
    fn finish(&mut self) -> Result<(), RenderError>;
}

#[derive(Debug, Clone, PartialEq)]
pub struct EncoderSettings {
    pub program: PathBuf,
    pub output: PathBuf,
    pub width: u32,
    pub height: u32,
    pub framerate: u32,
    pub crf: u8,
}

impl EncoderSettings {
    pub fn new(config: &RenderConfig, output: PathBuf) -> Self {
        Self {
            program: PathBuf::from("ffmpeg"),
            output,
            width: config.width(),
            height: config.height(),
            framerate: config.framerate,
            crf: config.crf,
        }
    }

    pub fn frame_len(&self) -> usize {
        self.width as usize * self.height as usize * 4
    }

    /// Raw RGBA on stdin, H.264 out, overwriting the output file.
    pub fn args(&self) -> Vec<String> {
        let mut args: Vec<String> = [
            "-y",
            "-hide_banner",
            "-f",
            "rawvideo",
            "-pix_fmt",
            "rgba",
            "-s",
        ]
        .iter()
        .map(|s| s.to_string())
        .collect();
        args.push(format!("{}x{}", self.width, self.height));
        args.extend(["-r".to_string(), self.framerate.to_string()]);
        args.extend(["-i", "-", "-c:v", "libx264", "-pix_fmt", "yuv420p", "-crf"].map(String::from));
        args.push(self.crf.to_string());
        args.push(self.output.to_string_lossy().into_owned());
        args
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EncoderUpdate {
    /// Frames the encoder reports as done.
    Progress { frame: u64 },
}

/// Turns encoder updates into progress log lines at 10% steps.
#[derive(Debug, Default)]
struct EncodeProgress {
    total: u64,
    encoded: u64,
    // tenths already logged
    reported: u64,
}

impl EncodeProgress {
    /// Returns whether a new 10% step was logged.
    fn record(&mut self, update: EncoderUpdate) -> bool {
        let EncoderUpdate::Progress { frame } = update;
        self.encoded = self.encoded.max(frame);
        if self.total == 0 {
            return false;
        }
        let tenths = (self.encoded * 10 / self.total).min(10);
        if tenths <= self.reported {
            return false;
        }
        self.reported = tenths;
        info!(
            "Generating video: {}/{} frames ({}%)",
            self.encoded.min(self.total),
            self.total,
            tenths * 10
        );
        true
    }

    fn drain(&mut self, updates: &Receiver<EncoderUpdate>) {
        for update in updates.try_iter() {
            self.record(update);
        }
    }
}

/// Pipes frames into an `ffmpeg` child process.
///
/// Frames go through a bounded channel to a writer thread that owns the
/// child's stdin, so rendering blocks once the encoder falls behind.
pub struct FfmpegEncoder {
    settings: EncoderSettings,
    child: Child,
    frame_tx: Option<Sender<Vec<u8>>>,
    update_rx: Receiver<EncoderUpdate>,
    writer: Option<JoinHandle<io::Result<()>>>,
    stderr_reader: Option<JoinHandle<()>>,
    progress: EncodeProgress,
    finished: bool,
}

impl FfmpegEncoder {
    pub fn spawn(settings: EncoderSettings) -> Result<Self, RenderError> {
        info!(
            "Starting encoder: {} {}",
            settings.program.display(),
            settings.args().join(" ")
        );
        let mut child = Command::new(&settings.program)
            .args(settings.args())
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn()?;

        let stdin = child.stdin.take().ok_or(RenderError::EncoderClosed)?;
        let stderr = child.stderr.take().ok_or(RenderError::EncoderClosed)?;

        let (frame_tx, frame_rx) = crossbeam::channel::bounded(FRAME_QUEUE);
        let (update_tx, update_rx) = crossbeam::channel::unbounded();

        let writer = std::thread::spawn(move || writer_thread(stdin, frame_rx));
        let stderr_reader = std::thread::spawn(move || stderr_thread(stderr, update_tx));

        Ok(Self {
            settings,
            child,
            frame_tx: Some(frame_tx),
            update_rx,
            writer: Some(writer),
            stderr_reader: Some(stderr_reader),
            progress: EncodeProgress::default(),
            finished: false,
        })
    }
}

impl FrameSink for FfmpegEncoder {
    fn begin(&mut self, total_frames: u64) {
        self.progress.total = total_frames;
    }

    fn write_frame(&mut self, frame: &[u8]) -> Result<(), RenderError> {
        self.progress.drain(&self.update_rx);

        let expected = self.settings.frame_len();
        if frame.len() != expected {
            return Err(RenderError::FrameSize {
                expected,
                actual: frame.len(),
            });
        }
        let frame_tx = self.frame_tx.as_ref().ok_or(RenderError::EncoderClosed)?;
        frame_tx
            .send(frame.to_vec())
            .map_err(|_| RenderError::EncoderClosed)
    }

    fn finish(&mut self) -> Result<(), RenderError> {
        if self.finished {
            return Ok(());
        }
        self.finished = true;

        // closing the channel ends the writer, which closes ffmpeg's stdin
        self.frame_tx = None;
        let written = match self.writer.take() {
            Some(writer) => writer.join().map_err(|_| RenderError::EncoderClosed)?,
            None => Ok(()),
        };

        // the update channel closes once ffmpeg exits and its stderr ends
        for update in self.update_rx.iter() {
            self.progress.record(update);
        }
        if let Some(reader) = self.stderr_reader.take() {
            let _ = reader.join();
        }
        let status = self.child.wait()?;
        debug!("Encoder reported {} frames", self.progress.encoded);

        if !status.success() {
            return Err(RenderError::EncoderFailed(status));
        }
        written?;
        info!("Encoding finished: {}", self.settings.output.display());
        Ok(())
    }
}

impl Drop for FfmpegEncoder {
    fn drop(&mut self) {
        if !self.finished {
            self.frame_tx = None;
            let _ = self.child.kill();
            let _ = self.child.wait();
        }
    }
}

fn writer_thread(mut stdin: impl Write, frame_rx: Receiver<Vec<u8>>) -> io::Result<()> {
    for frame in frame_rx {
        stdin.write_all(&frame)?;
    }
    stdin.flush()
}

fn stderr_thread(stderr: impl io::Read, update_tx: Sender<EncoderUpdate>) {
    // ffmpeg rewrites its status line with carriage returns
    for chunk in BufReader::new(stderr).split(b'\r') {
        let Ok(chunk) = chunk else {
            break;
        };
        for line in String::from_utf8_lossy(&chunk).lines() {
            match parse_progress(line) {
                Some(frame) => {
                    let _ = update_tx.send(EncoderUpdate::Progress { frame });
                }
                None if !line.trim().is_empty() => debug!("ffmpeg: {}", line.trim()),
                None => {}
            }
        }
    }
}

/// Frame count from an ffmpeg status line such as
/// `frame=  120 fps= 60 q=-1.0 size=...`.
pub fn parse_progress(line: &str) -> Option<u64> {
    let (_, rest) = line.split_once("frame=")?;
    let digits: String = rest
        .trim_start()
        .chars()
        .take_while(char::is_ascii_digit)
        .collect();
    digits.parse().ok()
}
