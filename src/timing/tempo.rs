/// Tempo assumed before the first tempo event of a song.
pub const DEFAULT_BPM: f64 = 120.0;

const DEFAULT_MICROSECONDS_PER_QUARTER: u32 = 500_000;

#[derive(Debug, Clone, PartialEq)]
pub struct TempoEvent {
    pub tick: u64,
    pub microseconds_per_quarter: u32,
    pub bpm: f64,
    /// Seconds from the start of the song, filled in by [`TempoMap::new`].
    pub absolute_seconds: f64,
}

impl TempoEvent {
    pub fn new(tick: u64, microseconds_per_quarter: u32) -> Self {
        Self {
            tick,
            microseconds_per_quarter,
            bpm: 60_000_000.0 / microseconds_per_quarter as f64,
            absolute_seconds: 0.0,
        }
    }
}

/// Song-wide tempo changes, sorted by tick, with precomputed start times.
#[derive(Debug, Clone)]
pub struct TempoMap {
    events: Vec<TempoEvent>,
    ticks_per_quarter: u16,
}

impl TempoMap {
    /// Sorts `events` by tick and integrates their start times.
    ///
    /// The sort is stable, so of two events on the same tick the one that came
    /// later in the input wins. The span before the first event is measured at
    /// the first event's own tempo.
    pub fn new(mut events: Vec<TempoEvent>, ticks_per_quarter: u16) -> Self {
        let ticks_per_quarter = ticks_per_quarter.max(1);
        events.sort_by_key(|e| e.tick);

        // Integer accumulator (ticks x microseconds per quarter), so the
        // start times do not drift however many segments there are.
        let mut elapsed: u128 = 0;
        let mut prev = events.first().map(|e| (0, e.microseconds_per_quarter));
        for event in &mut events {
            if let Some((prev_tick, prev_tempo)) = prev {
                elapsed += (event.tick - prev_tick) as u128 * prev_tempo as u128;
            }
            event.absolute_seconds = units_to_seconds(elapsed, ticks_per_quarter);
            prev = Some((event.tick, event.microseconds_per_quarter));
        }

        Self {
            events,
            ticks_per_quarter,
        }
    }

    pub fn events(&self) -> &[TempoEvent] {
        &self.events
    }

    pub fn ticks_per_quarter(&self) -> u16 {
        self.ticks_per_quarter
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// The tempo event in force at `tick`, if any has started yet.
    pub fn event_at_tick(&self, tick: u64) -> Option<&TempoEvent> {
        let idx = self.events.partition_point(|e| e.tick <= tick);
        idx.checked_sub(1).map(|i| &self.events[i])
    }

    /// The tempo event in force at `seconds`, if any has started yet.
    pub fn event_at_seconds(&self, seconds: f64) -> Option<&TempoEvent> {
        let idx = self.events.partition_point(|e| e.absolute_seconds <= seconds);
        idx.checked_sub(1).map(|i| &self.events[i])
    }

    pub fn bpm_at(&self, tick: u64) -> f64 {
        self.event_at_tick(tick).map_or(DEFAULT_BPM, |e| e.bpm)
    }

    pub fn tick_to_seconds(&self, tick: u64) -> f64 {
        match self.event_at_tick(tick) {
            Some(event) => {
                let units = (tick - event.tick) as u128 * event.microseconds_per_quarter as u128;
                event.absolute_seconds + units_to_seconds(units, self.ticks_per_quarter)
            }
            None => {
                let units = tick as u128 * DEFAULT_MICROSECONDS_PER_QUARTER as u128;
                units_to_seconds(units, self.ticks_per_quarter)
            }
        }
    }

    /// Nearest tick to `seconds`. Negative times give negative ticks, measured
    /// at the default tempo.
    pub fn seconds_to_tick(&self, seconds: f64) -> i64 {
        let tpq = self.ticks_per_quarter as f64;
        let ticks = match self.event_at_seconds(seconds) {
            Some(event) => {
                let beats = (seconds - event.absolute_seconds) * event.bpm / 60.0;
                event.tick as f64 + beats * tpq
            }
            None => seconds * DEFAULT_BPM / 60.0 * tpq,
        };
        ticks.round() as i64
    }
}

fn units_to_seconds(units: u128, ticks_per_quarter: u16) -> f64 {
    units as f64 / (ticks_per_quarter as f64 * 1_000_000.0)
}
