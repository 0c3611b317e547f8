//! Session-wide game state: frame phase, timers, counters, run clock

/// Countdown timers, decremented once per update while positive.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Timers {
    /// Frames during which update and draw are skipped entirely
    pub freeze: u32,
    /// Frames of camera shake
    pub shake: u32,
    /// Frames during which player effects are muted
    pub mute_sfx: u32,
}

impl Timers {
    pub fn tick(&mut self) {
        for t in [&mut self.freeze, &mut self.shake, &mut self.mute_sfx] {
            *t = t.saturating_sub(1);
        }
    }
}

/// Run time shown in the level banner.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TimeElapsed {
    /// Whole seconds counted from when the run started
    pub epoch: Option<u64>,
    pub seconds: u64,
    pub minutes: u64,
    pub hours: u64,
}

impl TimeElapsed {
    /// Recompute the fields from the console clock in whole seconds.
    pub fn update(&mut self, now: u64) {
        let epoch = *self.epoch.get_or_insert(now);
        let elapsed = now.saturating_sub(epoch);
        self.seconds = elapsed % 60;
        self.minutes = (elapsed / 60) % 60;
        self.hours = elapsed / 3600;
    }

    /// `hh:mm:ss`, zero-padded.
    pub fn label(&self) -> String {
        format!("{:02}:{:02}:{:02}", self.hours, self.minutes, self.seconds)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GameState {
    /// Frame within the current second, 0..30
    pub frame_phase: u32,
    pub background: u8,
    pub death_count: u32,
    pub timers: Timers,
    pub elapsed: TimeElapsed,
}
