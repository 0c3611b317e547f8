//! Frame Clock
//!
//! Fixed 30 Hz driver. Each tick either shows the loading status or runs
//! exactly one update and one draw, then presents. Ticks are never skipped
//! or merged: a slow frame pushes the schedule back and is reported as an
//! overrun.

use crate::audio::AudioService;
use crate::error::ConsoleError;
use crate::input::ButtonSet;
use crate::rasterizer::Framebuffer;
use crate::storage::KeyValueStore;

/// Time between ticks (ms)
pub const FRAME_PERIOD_MS: f64 = 1000.0 / 30.0;

/// External collaborators a cartridge may call during an update.
pub struct Services<'a> {
    pub audio: &'a mut dyn AudioService,
    pub store: &'a mut dyn KeyValueStore,
}

/// What the clock drives once assets are ready.
pub trait Cartridge {
    /// Advance one frame. `frame_count` is the number of frames run before this one.
    fn update(
        &mut self,
        buttons: ButtonSet,
        frame_count: u64,
        services: &mut Services<'_>,
    ) -> Result<(), ConsoleError>;

    fn draw(&mut self, fb: &mut Framebuffer) -> Result<(), ConsoleError>;
}

/// Receives finished frames.
pub trait Presenter {
    /// A finished 128x128 RGBA frame.
    fn present(&mut self, rgba: &[u8]);
    /// Placeholder while assets are loading.
    fn present_loading(&mut self, status: &str);
}

/// Monotonic wall clock in milliseconds.
pub trait TimeSource {
    fn now_ms(&self) -> f64;
}

/// State of the cartridge for one tick.
pub enum Frame<'a, C> {
    Loading(&'a str),
    Ready(&'a mut C),
}

/// Timing of one tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameReport {
    /// Frames run so far, including this one
    pub frame_count: u64,
    /// Wall time spent in the tick (ms)
    pub elapsed_ms: f64,
    /// Budget left before the next tick is due (ms); negative when late
    pub remaining_ms: f64,
    pub overrun: bool,
}

pub struct FrameClock {
    period_ms: f64,
    next_due: Option<f64>,
    frame_count: u64,
    overrun_threshold_ms: f64,
}

impl FrameClock {
    pub fn new(overrun_threshold_ms: f64) -> Self {
        Self {
            period_ms: FRAME_PERIOD_MS,
            next_due: None,
            frame_count: 0,
            overrun_threshold_ms,
        }
    }

    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    /// Whether the next tick is due. The first tick is always due.
    pub fn poll_due(&self, now_ms: f64) -> bool {
        self.next_due.map_or(true, |due| now_ms >= due)
    }

    /// Run one tick.
    ///
    /// Errors from the cartridge are returned as-is; the caller treats them
    /// as fatal. Loading ticks do not advance the frame counter.
    pub fn tick<C: Cartridge>(
        &mut self,
        frame: Frame<'_, C>,
        buttons: ButtonSet,
        fb: &mut Framebuffer,
        services: &mut Services<'_>,
        presenter: &mut dyn Presenter,
        time: &dyn TimeSource,
    ) -> Result<FrameReport, ConsoleError> {
        let start = time.now_ms();
        let scheduled = self.next_due.unwrap_or(start);

        match frame {
            Frame::Loading(status) => presenter.present_loading(status),
            Frame::Ready(cart) => {
                cart.update(buttons, self.frame_count, services)?;
                self.frame_count += 1;
                cart.draw(fb)?;
                fb.apply_display_remap()?;
                presenter.present(fb.pixels());
            }
        }

        let end = time.now_ms();
        // A late tick reschedules from its own start instead of catching up
        let next_due = (scheduled + self.period_ms).max(start);
        self.next_due = Some(next_due);

        let remaining_ms = next_due - end;
        let overrun = remaining_ms < self.overrun_threshold_ms;
        if overrun {
            tracing::warn!(
                frame = self.frame_count,
                elapsed_ms = end - start,
                remaining_ms,
                "frame overrun"
            );
        }
        Ok(FrameReport {
            frame_count: self.frame_count,
            elapsed_ms: end - start,
            remaining_ms,
            overrun,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::NullAudio;
    use crate::input::Button;
    use crate::rasterizer::{color, WIDTH, HEIGHT};
    use crate::storage::MemoryStore;
    use std::cell::Cell;

    /// Advances by `step` every time it is read.
    struct SteppingTime {
        now: Cell<f64>,
        step: f64,
    }

    impl SteppingTime {
        fn new(step: f64) -> Self {
            Self {
                now: Cell::new(0.0),
                step,
            }
        }
    }

    impl TimeSource for SteppingTime {
        fn now_ms(&self) -> f64 {
            let t = self.now.get();
            self.now.set(t + self.step);
            t
        }
    }

    #[derive(Default)]
    struct RecordingPresenter {
        frames: Vec<Vec<u8>>,
        statuses: Vec<String>,
    }

    impl Presenter for RecordingPresenter {
        fn present(&mut self, rgba: &[u8]) {
            self.frames.push(rgba.to_vec());
        }

        fn present_loading(&mut self, status: &str) {
            self.statuses.push(status.to_string());
        }
    }

    #[derive(Default)]
    struct StubCart {
        calls: Vec<String>,
        fail_update: bool,
    }

    impl Cartridge for StubCart {
        fn update(
            &mut self,
            buttons: ButtonSet,
            frame_count: u64,
            _services: &mut Services<'_>,
        ) -> Result<(), ConsoleError> {
            if self.fail_update {
                return Err(ConsoleError::UnknownColor { r: 1, g: 2, b: 3 });
            }
            self.calls.push(format!("update {} {}", frame_count, buttons.bits()));
            Ok(())
        }

        fn draw(&mut self, fb: &mut Framebuffer) -> Result<(), ConsoleError> {
            self.calls.push("draw".to_string());
            fb.clear(color::RED);
            Ok(())
        }
    }

    struct Rig {
        fb: Framebuffer,
        audio: NullAudio,
        store: MemoryStore,
        presenter: RecordingPresenter,
    }

    impl Rig {
        fn new() -> Self {
            Self {
                fb: Framebuffer::new(),
                audio: NullAudio,
                store: MemoryStore::new(),
                presenter: RecordingPresenter::default(),
            }
        }

        fn tick(
            &mut self,
            clock: &mut FrameClock,
            frame: Frame<'_, StubCart>,
            time: &dyn TimeSource,
        ) -> Result<FrameReport, ConsoleError> {
            let mut services = Services {
                audio: &mut self.audio,
                store: &mut self.store,
            };
            clock.tick(
                frame,
                ButtonSet::NONE.with(Button::Jump),
                &mut self.fb,
                &mut services,
                &mut self.presenter,
                time,
            )
        }
    }

    #[test]
    fn test_loading_tick_skips_simulation() {
        let mut rig = Rig::new();
        let mut clock = FrameClock::new(1.0);
        let time = SteppingTime::new(1.0);
        let report = rig.tick(&mut clock, Frame::Loading("Downloading assets"), &time).unwrap();

        assert_eq!(report.frame_count, 0);
        assert_eq!(rig.presenter.statuses, vec!["Downloading assets".to_string()]);
        assert!(rig.presenter.frames.is_empty());
    }

    #[test]
    fn test_ready_tick_updates_then_draws_once() {
        let mut rig = Rig::new();
        let mut clock = FrameClock::new(1.0);
        let time = SteppingTime::new(1.0);
        let mut cart = StubCart::default();
        let jump = ButtonSet::NONE.with(Button::Jump).bits();

        rig.tick(&mut clock, Frame::Ready(&mut cart), &time).unwrap();
        rig.tick(&mut clock, Frame::Ready(&mut cart), &time).unwrap();

        assert_eq!(
            cart.calls,
            vec![
                format!("update 0 {jump}"),
                "draw".to_string(),
                format!("update 1 {jump}"),
                "draw".to_string(),
            ]
        );
        assert_eq!(clock.frame_count(), 2);
        assert_eq!(rig.presenter.frames.len(), 2);
        assert_eq!(rig.presenter.frames[0].len(), WIDTH * HEIGHT * 4);
    }

    #[test]
    fn test_schedule_advances_by_period() {
        let mut rig = Rig::new();
        let mut clock = FrameClock::new(1.0);
        let time = SteppingTime::new(1.0);
        let mut cart = StubCart::default();

        assert!(clock.poll_due(0.0));
        let report = rig.tick(&mut clock, Frame::Ready(&mut cart), &time).unwrap();
        assert!(!report.overrun);
        assert!(!clock.poll_due(20.0));
        assert!(clock.poll_due(FRAME_PERIOD_MS));
    }

    #[test]
    fn test_slow_tick_reports_overrun_without_skipping() {
        let mut rig = Rig::new();
        let mut clock = FrameClock::new(1.0);
        let time = SteppingTime::new(40.0);
        let mut cart = StubCart::default();

        let first = rig.tick(&mut clock, Frame::Ready(&mut cart), &time).unwrap();
        assert!(first.overrun);
        assert_eq!(first.elapsed_ms, 40.0);

        let second = rig.tick(&mut clock, Frame::Ready(&mut cart), &time).unwrap();
        assert!(second.overrun);
        assert_eq!(second.frame_count, 2);
        // Rescheduled from its own start, not from the missed slot
        assert!(clock.poll_due(80.0));
    }

    #[test]
    fn test_cartridge_error_stops_the_tick() {
        let mut rig = Rig::new();
        let mut clock = FrameClock::new(1.0);
        let time = SteppingTime::new(1.0);
        let mut cart = StubCart {
            fail_update: true,
            ..Default::default()
        };

        let result = rig.tick(&mut clock, Frame::Ready(&mut cart), &time);
        assert!(matches!(result, Err(ConsoleError::UnknownColor { .. })));
        assert!(cart.calls.is_empty());
        assert_eq!(clock.frame_count(), 0);
        assert!(rig.presenter.frames.is_empty());
    }
}
