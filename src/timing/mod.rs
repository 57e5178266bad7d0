mod tempo;

pub use tempo::{DEFAULT_BPM, TempoEvent, TempoMap};

/// Formats a duration as `mm:ss`, ignoring the sign.
pub fn format_time(seconds: f64) -> String {
    let total = seconds.abs().floor() as u64;
    format!("{:02}:{:02}", total / 60, total % 60)
}
