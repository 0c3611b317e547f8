//! Game Runtime
//!
//! `Game` is the one explicit context the frame clock drives: the entity
//! pool, session state, decoded assets, the seeded RNG and the buttons
//! sampled for this frame. Audio requests and save writes raised while the
//! pass runs are queued and handed to the services when it finishes.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::collision;
use super::entity::{Entity, EntityKind, EntityRef};
use super::math::round;
use super::pool::{EntityPool, DEFAULT_CAPACITY};
use super::state::GameState;
use crate::asset::AssetBundle;
use crate::audio::{AudioEvent, MusicCue, Sfx, Song, ALL_CHANNELS};
use crate::clock::{Cartridge, Services};
use crate::config::ConsoleConfig;
use crate::error::ConsoleError;
use crate::input::ButtonSet;
use crate::rasterizer::{color, Framebuffer};
use crate::storage::LEVEL_SLOT;

/// Updates per second
pub const FRAMES_PER_SECOND: u64 = 30;
/// Summit scene; time stops counting here
pub const LAST_LEVEL: u32 = 30;
/// Scenes in the map
pub const SCENE_COUNT: u32 = 32;
/// Screen edge in pixels
pub const SCREEN: f32 = 128.0;

/// Construction options for a session.
#[derive(Debug, Clone, PartialEq)]
pub struct GameOptions {
    pub pool_capacity: usize,
    pub start_level: u32,
    pub rng_seed: Option<u64>,
}

impl Default for GameOptions {
    fn default() -> Self {
        Self {
            pool_capacity: DEFAULT_CAPACITY,
            start_level: 0,
            rng_seed: None,
        }
    }
}

impl GameOptions {
    /// Options from config, resuming from `saved_level` when allowed.
    pub fn from_config(config: &ConsoleConfig, saved_level: Option<u32>) -> Self {
        let resumed = saved_level.filter(|_| config.resume);
        Self {
            pool_capacity: config.pool_capacity,
            start_level: resumed.unwrap_or(config.start_level).min(LAST_LEVEL),
            rng_seed: config.rng_seed,
        }
    }
}

pub struct Game {
    pub(crate) pool: EntityPool,
    pub(crate) state: GameState,
    pub(crate) assets: AssetBundle,
    pub(crate) buttons: ButtonSet,
    rng: StdRng,
    /// Console clock in whole seconds, sampled at the start of the pass
    pub(crate) clock_seconds: u64,
    audio_queue: Vec<AudioEvent>,
    pending_save: Option<u32>,
}

impl Game {
    pub fn new(assets: AssetBundle, options: &GameOptions) -> Result<Self, ConsoleError> {
        let rng = match options.rng_seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let mut game = Self {
            pool: EntityPool::new(options.pool_capacity),
            state: GameState::default(),
            assets,
            buttons: ButtonSet::NONE,
            rng,
            clock_seconds: 0,
            audio_queue: Vec::new(),
            pending_save: None,
        };

        game.create_snow()?;
        game.create_clouds()?;
        game.music(Song::Song0, 0);
        game.create_level(options.start_level)?;
        tracing::info!(
            level = options.start_level,
            capacity = options.pool_capacity,
            "session started"
        );
        Ok(game)
    }

    pub fn pool(&self) -> &EntityPool {
        &self.pool
    }

    pub fn state(&self) -> &GameState {
        &self.state
    }

    /// Index of the active scene.
    pub fn level_index(&self) -> Option<u32> {
        self.pool
            .first_of_kind(EntityKind::Level)
            .and_then(|l| self.pool.get(l))
            .and_then(Entity::level)
            .map(|(index, _)| index)
    }

    pub fn player(&self) -> Option<&Entity> {
        self.pool
            .first_of_kind(EntityKind::Player)
            .and_then(|p| self.pool.get(p))
    }

    // ========================================================================
    // Services
    // ========================================================================

    /// Uniform random value in [0, max).
    pub(crate) fn rnd(&mut self, max: f32) -> f32 {
        self.rng.gen::<f32>() * max
    }

    pub(crate) fn sfx(&mut self, sfx: Sfx) {
        self.audio_queue.push(AudioEvent::Effect(sfx));
    }

    /// Player effect, dropped while muted.
    pub(crate) fn psfx(&mut self, sfx: Sfx) {
        if self.state.timers.mute_sfx == 0 {
            self.sfx(sfx);
        }
    }

    pub(crate) fn music(&mut self, song: Song, fade_ms: u32) {
        self.audio_queue.push(AudioEvent::Music {
            cue: MusicCue::Play(song),
            fade_ms,
            channel_mask: ALL_CHANNELS,
        });
    }

    pub(crate) fn save_level(&mut self, level: u32) {
        self.pending_save = Some(level);
    }

    fn flush(&mut self, services: &mut Services<'_>) {
        for event in self.audio_queue.drain(..) {
            event.dispatch(&mut *services.audio);
        }
        if let Some(level) = self.pending_save.take() {
            match services.store.set(LEVEL_SLOT, &level.to_string()) {
                Ok(()) => tracing::debug!(level, "progress saved"),
                Err(e) => tracing::warn!(error = %e, "failed to save progress"),
            }
        }
    }

    // ========================================================================
    // Lifecycle
    // ========================================================================

    /// Destroy an entity subtree and run destroy hooks for everything removed.
    pub(crate) fn destroy(&mut self, handle: EntityRef) -> Result<(), ConsoleError> {
        for (gone, kind) in self.pool.destroy(handle) {
            tracing::trace!(slot = gone.slot(), id = gone.id(), ?kind, "destroyed");
            if kind == EntityKind::DeathParticles {
                self.rebuild_level()?;
            }
        }
        Ok(())
    }

    /// Replace the active level with a fresh copy of itself.
    fn rebuild_level(&mut self) -> Result<(), ConsoleError> {
        let Some(level) = self.pool.first_of_kind(EntityKind::Level) else {
            return Ok(());
        };
        let Some(index) = self.level_index() else {
            return Ok(());
        };
        self.create_level(index)?;
        self.destroy(level)
    }

    // ========================================================================
    // Simulation step
    // ========================================================================

    fn update_entities(&mut self) -> Result<(), ConsoleError> {
        // Anything created during this pass waits for the next one
        let watermark = self.pool.next_id();
        let order = self.pool.order().to_vec();
        for slot in order {
            let Some(handle) = self.pool.live_at(slot) else {
                continue;
            };
            if handle.id() >= watermark {
                continue;
            }
            self.update_entity(handle)?;
        }
        Ok(())
    }

    fn update_entity(&mut self, handle: EntityRef) -> Result<(), ConsoleError> {
        let Some(e) = self.pool.get(handle) else {
            return Ok(());
        };
        if e.paused {
            return Ok(());
        }
        if e.max_age > 0 && e.age == e.max_age {
            return self.destroy(handle);
        }

        self.apply_movement(handle);
        self.run_behavior(handle)?;

        if let Some(e) = self.pool.get_mut(handle) {
            e.age += 1;
        }
        Ok(())
    }

    /// Accumulate speed into the remainders and move by the rounded amount.
    fn apply_movement(&mut self, handle: EntityRef) {
        let Some(mut e) = self.pool.get(handle).cloned() else {
            return;
        };
        if e.kind == EntityKind::SnowParticle {
            e.speed_y = super::math::sin(e.age as f32 * (e.speed_x / 32.0).min(0.05));
        }

        e.rem_x += e.speed_x;
        e.rem_y += e.speed_y;
        let dx = round(e.rem_x);
        let dy = round(e.rem_y);
        e.rem_x -= dx;
        e.rem_y -= dy;

        if e.solid {
            let map = &self.assets.map;
            if !collision::step_axis(&self.pool, map, &mut e, dx, true) {
                e.speed_x = 0.0;
                e.rem_x = 0.0;
            }
            if !collision::step_axis(&self.pool, map, &mut e, dy, false) {
                e.speed_y = 0.0;
                e.rem_y = 0.0;
            }
        } else {
            e.x += dx;
            e.y += dy;
        }
        self.pool.write_back(handle, e);
    }

    // ========================================================================
    // Draw step
    // ========================================================================

    fn draw_frame(&mut self, fb: &mut Framebuffer) -> Result<(), ConsoleError> {
        fb.reset_palette();
        fb.clear(self.state.background);
        fb.camera(0.0, 0.0);
        if self.state.timers.shake > 0 {
            let (x, y) = (-2.0 + self.rnd(5.0), -2.0 + self.rnd(5.0));
            fb.camera(x, y);
        }

        self.pool.sort_by_draw_order();
        for &slot in self.pool.order() {
            if let Some(handle) = self.pool.live_at(slot) {
                self.draw_entity(fb, handle)?;
            }
        }

        // Keep the area a shaking camera uncovers black
        let black = color::BLACK;
        fb.rectfill(-2.0, -2.0, -1.0, SCREEN + 2.0, black);
        fb.rectfill(-2.0, -2.0, SCREEN + 2.0, -1.0, black);
        fb.rectfill(-2.0, SCREEN, SCREEN + 2.0, SCREEN + 2.0, black);
        fb.rectfill(SCREEN, -2.0, SCREEN + 1.0, SCREEN + 2.0, black);
        Ok(())
    }
}

impl Cartridge for Game {
    fn update(
        &mut self,
        buttons: ButtonSet,
        frame_count: u64,
        services: &mut Services<'_>,
    ) -> Result<(), ConsoleError> {
        self.buttons = buttons;
        self.clock_seconds = frame_count / FRAMES_PER_SECOND;
        self.state.timers.tick();
        self.state.frame_phase = (self.state.frame_phase + 1) % FRAMES_PER_SECOND as u32;

        let result = if self.state.timers.freeze > 0 {
            Ok(())
        } else {
            self.update_entities()
        };
        self.flush(services);
        result
    }

    fn draw(&mut self, fb: &mut Framebuffer) -> Result<(), ConsoleError> {
        if self.state.timers.freeze > 0 {
            return Ok(());
        }
        self.draw_frame(fb)
    }
}
