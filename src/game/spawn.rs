//! Entity factories
//!
//! Every factory pulls a fresh record from the pool, fills in the fields its
//! kind uses and returns the handle. Random values are drawn before the
//! record is borrowed so the RNG sequence is the same whatever the pool
//! layout.

use super::entity::{Entity, EntityKind, EntityRef, FallFloorState, Hitbox, KindData, SpawnerState};
use super::math::{cos, sin};
use super::runtime::{Game, SCREEN};
use crate::audio::Sfx;
use crate::error::ConsoleError;
use crate::world::{scene_origin, LAYER_BACKGROUND, LAYER_FOREGROUND, LAYER_MAIN, SCENE_TILES};

const SNOW_COUNT: usize = 25;
const CLOUD_COUNT: usize = 17;
const HAIR_SEGMENTS: usize = 5;
const DEATH_PARTICLES: usize = 8;

/// Map tiles that spawn an entity when a level is built.
mod tile {
    pub const PLAYER_SPAWN: u8 = 1;
    pub const PLATFORM_LEFTWARD: u8 = 11;
    pub const PLATFORM_RIGHTWARD: u8 = 12;
    pub const FALL_FLOOR: u8 = 23;
    pub const FAKE_WALL: u8 = 64;
}

impl Game {
    /// Create an entity and initialize it in place.
    pub(crate) fn spawn(
        &mut self,
        kind: EntityKind,
        parent: Option<EntityRef>,
        init: impl FnOnce(&mut Entity),
    ) -> Result<EntityRef, ConsoleError> {
        let handle = self.pool.create(kind, parent)?;
        if let Some(e) = self.pool.get_mut(handle) {
            init(e);
        }
        tracing::trace!(slot = handle.slot(), id = handle.id(), ?kind, "created");
        Ok(handle)
    }

    /// Build scene `index`: the Level, its three terrain layers, and one
    /// entity per spawning tile, scanned column by column.
    pub(crate) fn create_level(&mut self, index: u32) -> Result<EntityRef, ConsoleError> {
        let origin = scene_origin(index);
        let level = self.spawn(EntityKind::Level, None, |e| {
            e.data = KindData::Level { index, origin };
            e.draw_order = 10;
        })?;

        for (i, layer) in [LAYER_BACKGROUND, LAYER_FOREGROUND, LAYER_MAIN].into_iter().enumerate() {
            self.spawn(EntityKind::Terrain, Some(level), |e| {
                e.data = KindData::Terrain { layer };
                e.draw_order = -8 + i as i32;
            })?;
        }

        let size = SCENE_TILES as i32;
        for tx in 0..size {
            for ty in 0..size {
                let (x, y) = (tx as f32 * 8.0, ty as f32 * 8.0);
                let created = match self.assets.map.mget(origin.0 + tx, origin.1 + ty) {
                    tile::PLAYER_SPAWN => self.create_player_spawner(x, y)?,
                    tile::PLATFORM_LEFTWARD => self.create_platform(x, y, -1.0)?,
                    tile::PLATFORM_RIGHTWARD => self.create_platform(x, y, 1.0)?,
                    tile::FALL_FLOOR => self.create_fall_floor(x, y)?,
                    tile::FAKE_WALL => self.create_fake_wall(x, y)?,
                    _ => continue,
                };
                self.pool.set_parent(created, Some(level));
            }
        }
        tracing::debug!(index, live = self.pool.live_count(), "level built");
        Ok(level)
    }

    /// Five trailing hair segments owned by `owner`.
    pub(crate) fn create_hairs(&mut self, owner: EntityRef) -> Result<EntityRef, ConsoleError> {
        let (x, y) = self.pool.get(owner).map_or((0.0, 0.0), |o| (o.x, o.y));
        let hairs = self.spawn(EntityKind::Hairs, Some(owner), |e| {
            e.x = x;
            e.y = y;
        })?;
        for i in 0..HAIR_SEGMENTS {
            self.spawn(EntityKind::Hair, Some(hairs), |e| {
                e.x = x;
                e.y = y;
                e.radius = Some((3.0 - i as f32).clamp(1.0, 2.0));
                e.color = 8;
                e.draw_order = -1;
            })?;
        }
        Ok(hairs)
    }

    pub(crate) fn create_player_spawner(
        &mut self,
        x: f32,
        y: f32,
    ) -> Result<EntityRef, ConsoleError> {
        let spawner = self.spawn(EntityKind::PlayerSpawner, None, |e| {
            e.x = x;
            e.y = SCREEN;
            e.sprite = 3.0;
            e.speed_y = -4.0;
            e.data = KindData::Spawner {
                state: SpawnerState::GoingUp,
                target_x: x,
                target_y: y,
                t: 0,
            };
        })?;
        self.create_hairs(spawner)?;
        self.sfx(Sfx::PlayerSpawnerCreated);
        Ok(spawner)
    }

    pub(crate) fn create_player(&mut self, x: f32, y: f32) -> Result<EntityRef, ConsoleError> {
        let player = self.spawn(EntityKind::Player, None, |e| {
            e.x = x;
            e.y = y;
            e.solid = true;
            e.hitbox = Hitbox::new(1.0, 3.0, 6.0, 5.0);
            e.sprite = 1.0;
        })?;
        self.create_hairs(player)?;
        Ok(player)
    }

    /// Kill the player: sound, shake, and a burst of death particles.
    pub(crate) fn destroy_player(&mut self, player: EntityRef) -> Result<(), ConsoleError> {
        let Some((x, y)) = self.pool.get(player).map(|p| (p.x, p.y)) else {
            return Ok(());
        };
        self.state.timers.mute_sfx = 12;
        self.sfx(Sfx::Died);
        self.state.death_count += 1;
        self.state.timers.shake = 10;
        self.destroy(player)?;
        self.create_death_particles(x + 4.0, y + 4.0)?;
        tracing::debug!(deaths = self.state.death_count, "player died");
        Ok(())
    }

    pub(crate) fn create_smoke(&mut self, x: f32, y: f32) -> Result<EntityRef, ConsoleError> {
        let speed_x = 0.3 + self.rnd(0.2);
        let jitter_x = -1.0 + self.rnd(2.0);
        let jitter_y = -1.0 + self.rnd(2.0);
        let flip_x = self.rnd(1.0) < 0.5;
        let flip_y = self.rnd(1.0) < 0.5;
        self.spawn(EntityKind::Smoke, None, |e| {
            e.sprite = 29.0;
            e.speed_y = -0.1;
            e.speed_x = speed_x;
            e.x = x + jitter_x;
            e.y = y + jitter_y;
            e.flip_x = flip_x;
            e.flip_y = flip_y;
        })
    }

    /// Eight particles flying out on the compass directions.
    pub(crate) fn create_death_particles(
        &mut self,
        x: f32,
        y: f32,
    ) -> Result<EntityRef, ConsoleError> {
        let group = self.spawn(EntityKind::DeathParticles, None, |e| e.max_age = 10)?;
        for dir in 0..DEATH_PARTICLES {
            let angle = dir as f32 / DEATH_PARTICLES as f32;
            self.spawn(EntityKind::DeathParticle, Some(group), |e| {
                e.x = x;
                e.y = y;
                e.speed_x = sin(angle) * 3.0;
                e.speed_y = cos(angle) * 3.0;
                e.max_age = 10;
                e.centered = true;
            })?;
        }
        Ok(group)
    }

    pub(crate) fn create_snow(&mut self) -> Result<(), ConsoleError> {
        for _ in 0..SNOW_COUNT {
            let x = self.rnd(SCREEN);
            let y = self.rnd(SCREEN);
            let speed_x = 0.25 + self.rnd(5.0);
            let size = (self.rnd(5.0) / 4.0).floor();
            let color = 6 + self.rnd(2.0).floor() as u8;
            self.spawn(EntityKind::SnowParticle, None, |e| {
                e.x = x;
                e.y = y;
                e.speed_x = speed_x;
                e.rect_w = Some(size);
                e.color = color;
                e.draw_order = 9;
            })?;
        }
        Ok(())
    }

    pub(crate) fn create_clouds(&mut self) -> Result<(), ConsoleError> {
        for _ in 0..CLOUD_COUNT {
            let x = self.rnd(SCREEN);
            let y = self.rnd(SCREEN);
            let speed_x = 1.0 + self.rnd(5.0);
            let w = 32.0 + self.rnd(32.0);
            let h = 4.0 + self.rnd(6.0);
            self.spawn(EntityKind::Cloud, None, |e| {
                e.x = x;
                e.y = y;
                e.speed_x = speed_x;
                e.rect_w = Some(w);
                e.rect_h = Some(h);
                e.draw_order = -9;
            })?;
        }
        Ok(())
    }

    /// A 16-pixel platform centered on its tile, drifting in `direction`.
    pub(crate) fn create_platform(
        &mut self,
        x: f32,
        y: f32,
        direction: f32,
    ) -> Result<EntityRef, ConsoleError> {
        self.spawn(EntityKind::Platform, None, |e| {
            e.x = x - 4.0;
            e.y = y;
            e.hitbox.w = 16.0;
            e.draw_order = -7;
            e.data = KindData::Platform {
                direction,
                last: x - 4.0,
            };
        })
    }

    pub(crate) fn create_fall_floor(&mut self, x: f32, y: f32) -> Result<EntityRef, ConsoleError> {
        self.spawn(EntityKind::FallFloor, None, |e| {
            e.x = x;
            e.y = y;
            e.sprite = 23.0;
            e.data = KindData::FallFloor {
                state: FallFloorState::Idle,
                delay: 0,
            };
        })
    }

    pub(crate) fn create_fake_wall(&mut self, x: f32, y: f32) -> Result<EntityRef, ConsoleError> {
        self.spawn(EntityKind::FakeWall, None, |e| {
            e.x = x;
            e.y = y;
            e.sprite = 64.0;
            e.hitbox = Hitbox::new(0.0, 0.0, 16.0, 16.0);
        })
    }
}
