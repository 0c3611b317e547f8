//! Per-kind behaviors
//!
//! One function per entity kind, dispatched from `run_behavior` after the
//! shared movement step. Behaviors work on a copy of their own record and
//! write it back through `EntityPool::write_back`, which is a no-op when the
//! entity was destroyed along the way.

use std::f32::consts::FRAC_1_SQRT_2;

use super::collision::{self, first_collision};
use super::entity::{Entity, EntityKind, EntityRef, FallFloorState, Hitbox, KindData, SpawnerState};
use super::math::{approach, sign};
use super::runtime::{Game, LAST_LEVEL, SCENE_COUNT, SCREEN};
use crate::audio::{Sfx, Song};
use crate::error::ConsoleError;
use crate::input::Button;

// Player tuning
const MAX_RUN: f32 = 1.0;
const ACCEL_GROUND: f32 = 0.6;
const ACCEL_AIR: f32 = 0.4;
const ACCEL_ICE: f32 = 0.05;
const DECCEL: f32 = 0.15;
const MAX_FALL: f32 = 2.0;
const MAX_FALL_SLIDING: f32 = 0.4;
const GRAVITY: f32 = 0.21;
const JUMP_SPEED: f32 = -2.0;
const GRACE_FRAMES: i32 = 6;
const JUMP_BUFFER_FRAMES: i32 = 4;
const DASH_FULL: f32 = 5.0;
const DASH_HALF: f32 = DASH_FULL * FRAC_1_SQRT_2;
const DASH_FRAMES: i32 = 4;
const DASH_EFFECT_FRAMES: i32 = 10;

impl Game {
    pub(crate) fn run_behavior(&mut self, handle: EntityRef) -> Result<(), ConsoleError> {
        let Some(kind) = self.pool.get(handle).map(|e| e.kind) else {
            return Ok(());
        };
        match kind {
            EntityKind::Level => self.update_level(handle),
            EntityKind::PlayerSpawner => self.update_spawner(handle),
            EntityKind::Player => self.update_player(handle),
            EntityKind::Hairs => self.update_hairs(handle),
            EntityKind::DeathParticle => self.update_death_particle(handle),
            EntityKind::Smoke => self.update_smoke(handle),
            EntityKind::FallFloor => self.update_fall_floor(handle),
            EntityKind::SnowParticle => self.update_snow(handle),
            EntityKind::Cloud => self.update_cloud(handle),
            EntityKind::FakeWall => self.update_fake_wall(handle),
            EntityKind::Platform => self.update_platform(handle),
            EntityKind::Terrain | EntityKind::Hair | EntityKind::DeathParticles => Ok(()),
        }
    }

    fn solid_at(&self, e: &Entity, dx: f32, dy: f32) -> bool {
        collision::collides_with_solid(&self.pool, &self.assets.map, e, dx, dy)
    }

    fn ice_at(&self, e: &Entity, dx: f32, dy: f32) -> bool {
        collision::collides_with_ice(&self.pool, &self.assets.map, e, dx, dy)
    }

    /// Whether `e` shifted by (dx, dy) overlaps the player.
    fn touches_player(&self, e: &Entity, dx: f32, dy: f32) -> Option<EntityRef> {
        let player = self.pool.first_of_kind(EntityKind::Player)?;
        first_collision(&self.pool, e, dx, dy, [player])
    }

    // ========================================================================
    // Scene
    // ========================================================================

    fn update_level(&mut self, handle: EntityRef) -> Result<(), ConsoleError> {
        let index = self.pool.get(handle).and_then(Entity::level).map(|(i, _)| i);
        if index.is_some_and(|i| i < LAST_LEVEL) {
            self.state.elapsed.update(self.clock_seconds);
        }
        Ok(())
    }

    fn update_snow(&mut self, handle: EntityRef) -> Result<(), ConsoleError> {
        if self.pool.get(handle).is_some_and(|e| e.x > SCREEN + 4.0) {
            let y = self.rnd(SCREEN);
            if let Some(e) = self.pool.get_mut(handle) {
                e.x = -4.0;
                e.y = y;
            }
        }
        Ok(())
    }

    fn update_cloud(&mut self, handle: EntityRef) -> Result<(), ConsoleError> {
        let color = if self.state.background == 2 { 14 } else { 1 };
        let wraps = self.pool.get(handle).is_some_and(|e| e.x > SCREEN);
        let y = if wraps { self.rnd(SCREEN - 10.0) } else { 0.0 };
        if let Some(e) = self.pool.get_mut(handle) {
            e.color = color;
            if wraps {
                e.x = -e.rect_w.unwrap_or(0.0);
                e.y = y;
            }
        }
        Ok(())
    }

    // ========================================================================
    // Effects
    // ========================================================================

    fn update_smoke(&mut self, handle: EntityRef) -> Result<(), ConsoleError> {
        let Some(e) = self.pool.get_mut(handle) else {
            return Ok(());
        };
        e.sprite += 0.2;
        if e.sprite > 31.0 {
            return self.destroy(handle);
        }
        Ok(())
    }

    fn update_death_particle(&mut self, handle: EntityRef) -> Result<(), ConsoleError> {
        if let Some(e) = self.pool.get_mut(handle) {
            e.rect_w = Some(2.0 * ((e.max_age - e.age) as f32 / 5.0));
            e.color = 14 + (e.age % 2) as u8;
        }
        Ok(())
    }

    /// Each segment eases toward the one in front of it.
    fn update_hairs(&mut self, handle: EntityRef) -> Result<(), ConsoleError> {
        let Some(hairs) = self.pool.get(handle) else {
            return Ok(());
        };
        let Some(owner) = hairs.parent().and_then(|p| self.pool.get(p)) else {
            return Ok(());
        };
        let segments = hairs.children().to_vec();
        let facing = if owner.flip_x { -1.0 } else { 1.0 };
        let drop = if self.buttons.is_down(Button::Down) { 4.0 } else { 3.0 };
        let mut last = (owner.x + 4.0 - facing * 2.0, owner.y + drop);
        for seg in segments {
            if let Some(hair) = self.pool.get_mut(seg) {
                hair.x += (last.0 - hair.x) / 1.5;
                hair.y += (last.1 + 0.5 - hair.y) / 1.5;
                last = (hair.x, hair.y);
            }
        }
        Ok(())
    }

    // ========================================================================
    // Player
    // ========================================================================

    fn update_spawner(&mut self, handle: EntityRef) -> Result<(), ConsoleError> {
        let Some(mut e) = self.pool.get(handle).cloned() else {
            return Ok(());
        };
        let KindData::Spawner { mut state, target_x, target_y, mut t } = e.data else {
            return Ok(());
        };

        let mut replace = false;
        match state {
            SpawnerState::GoingUp => {
                if e.y < target_y + 16.0 {
                    state = SpawnerState::Falling;
                    t = 3;
                }
            }
            SpawnerState::Falling => {
                e.speed_y += 0.5;
                if e.speed_y > 0.0 {
                    if t > 0 {
                        // Hang at the top
                        e.speed_y = 0.0;
                        t -= 1;
                    }
                    if e.y > target_y {
                        e.y = target_y;
                        e.speed_x = 0.0;
                        e.speed_y = 0.0;
                        state = SpawnerState::Landing;
                        t = 5;
                        self.state.timers.shake = 5;
                        self.create_smoke(e.x, e.y + 4.0)?;
                        self.sfx(Sfx::PlayerSpawnerTouchedGround);
                    }
                }
            }
            SpawnerState::Landing => {
                t -= 1;
                e.sprite = 6.0;
                replace = t < 0;
            }
        }

        let (x, y) = (e.x, e.y);
        e.data = KindData::Spawner {
            state,
            target_x,
            target_y,
            t,
        };
        self.pool.write_back(handle, e);
        if replace {
            self.destroy(handle)?;
            self.create_player(x, y)?;
        }
        Ok(())
    }

    fn update_player(&mut self, handle: EntityRef) -> Result<(), ConsoleError> {
        let Some(mut e) = self.pool.get(handle).cloned() else {
            return Ok(());
        };
        let KindData::Player(mut p) = std::mem::replace(&mut e.data, KindData::None) else {
            return Ok(());
        };
        let buttons = self.buttons;
        let input = buttons.horizontal() as f32;
        let level = self
            .pool
            .first_of_kind(EntityKind::Level)
            .and_then(|l| self.pool.get(l))
            .and_then(Entity::level);
        let origin = level.map_or((0, 0), |(_, o)| o);

        let (left, top, _, _) = e.bounds(0.0, 0.0);
        let spiked = self
            .assets
            .map
            .spikes_at(origin, left, top, e.hitbox.w, e.hitbox.h, e.speed_x, e.speed_y);
        if spiked || e.y > SCREEN {
            return self.destroy_player(handle);
        }

        let on_ground = self.solid_at(&e, 0.0, 1.0);
        let on_ice = self.ice_at(&e, 0.0, 1.0);

        if on_ground && !p.was_on_ground {
            self.create_smoke(e.x, e.y + 4.0)?;
        }

        let jump = buttons.is_down(Button::Jump);
        let should_jump = jump && !p.pressed_jump;
        p.pressed_jump = jump;
        if should_jump {
            p.jump_buffer = JUMP_BUFFER_FRAMES;
        } else if p.jump_buffer > 0 {
            p.jump_buffer -= 1;
        }

        let dash = buttons.is_down(Button::Dash);
        let should_dash = dash && !p.pressed_dash;
        p.pressed_dash = dash;

        if on_ground {
            p.grace = GRACE_FRAMES;
            if p.dashes < p.max_dashes {
                self.psfx(Sfx::DashReset);
                p.dashes = p.max_dashes;
            }
        } else if p.grace > 0 {
            p.grace -= 1;
        }

        p.dash_effect_time -= 1;
        if p.dash_time > 0 {
            self.create_smoke(e.x, e.y)?;
            p.dash_time -= 1;
            e.speed_x = approach(e.speed_x, p.dash_target_x, p.dash_accel_x);
            e.speed_y = approach(e.speed_y, p.dash_target_y, p.dash_accel_y);
        } else {
            // Run
            let accel = if !on_ground {
                ACCEL_AIR
            } else if on_ice {
                ACCEL_ICE
            } else {
                ACCEL_GROUND
            };
            e.speed_x = if e.speed_x.abs() > MAX_RUN {
                approach(e.speed_x, sign(e.speed_x) * MAX_RUN, DECCEL)
            } else {
                approach(e.speed_x, input * MAX_RUN, accel)
            };
            if e.speed_x != 0.0 {
                e.flip_x = e.speed_x < 0.0;
            }

            // Gravity, halved around the apex
            let mut max_fall = MAX_FALL;
            let mut gravity = GRAVITY;
            if e.speed_y.abs() <= 0.15 {
                gravity *= 0.5;
            }

            // Wall slide
            if input != 0.0 && self.solid_at(&e, input, 0.0) && !self.ice_at(&e, input, 0.0) {
                max_fall = MAX_FALL_SLIDING;
                if self.rnd(10.0) < 2.0 {
                    self.create_smoke(e.x + input * 6.0, e.y)?;
                }
            }

            if !on_ground {
                e.speed_y = approach(e.speed_y, max_fall, gravity);
            }

            // Jump
            if p.jump_buffer > 0 {
                if p.grace > 0 {
                    self.psfx(Sfx::Jumped);
                    p.jump_buffer = 0;
                    p.grace = 0;
                    e.speed_y = JUMP_SPEED;
                    self.create_smoke(e.x, e.y + 4.0)?;
                } else {
                    let wall_dir = if self.solid_at(&e, -3.0, 0.0) {
                        -1.0
                    } else if self.solid_at(&e, 3.0, 0.0) {
                        1.0
                    } else {
                        0.0
                    };
                    if wall_dir != 0.0 {
                        self.psfx(Sfx::WallJumped);
                        p.jump_buffer = 0;
                        e.speed_y = JUMP_SPEED;
                        e.speed_x = -wall_dir * (MAX_RUN + 1.0);
                        if !self.ice_at(&e, wall_dir * 3.0, 0.0) {
                            self.create_smoke(e.x + wall_dir * 6.0, e.y)?;
                        }
                    }
                }
            }

            // Dash
            if p.dashes > 0 && should_dash {
                self.create_smoke(e.x, e.y)?;
                p.dashes -= 1;
                p.dash_time = DASH_FRAMES;
                p.has_dashed = true;
                p.dash_effect_time = DASH_EFFECT_FRAMES;

                let v_input = buttons.vertical() as f32;
                (e.speed_x, e.speed_y) = match (input != 0.0, v_input != 0.0) {
                    (true, true) => (input * DASH_HALF, v_input * DASH_HALF),
                    (true, false) => (input * DASH_FULL, 0.0),
                    (false, true) => (0.0, v_input * DASH_FULL),
                    (false, false) => (if e.flip_x { -1.0 } else { 1.0 }, 0.0),
                };

                self.psfx(Sfx::Dashed);
                self.state.timers.freeze = 2;
                self.state.timers.shake = 6;
                p.dash_target_x = 2.0 * sign(e.speed_x);
                p.dash_target_y = 2.0 * sign(e.speed_y);
                p.dash_accel_x = 1.5;
                p.dash_accel_y = 1.5;
                if e.speed_y < 0.0 {
                    p.dash_target_y *= 0.75;
                }
                if e.speed_y != 0.0 {
                    p.dash_accel_x *= FRAC_1_SQRT_2;
                }
                if e.speed_x != 0.0 {
                    p.dash_accel_y *= FRAC_1_SQRT_2;
                }
            } else if should_dash && p.dashes <= 0 {
                self.psfx(Sfx::DidNotDash);
                self.create_smoke(e.x, e.y)?;
            }
        }

        // Animation
        p.sprite_offset += 0.25;
        e.sprite = if !on_ground {
            if self.solid_at(&e, input, 0.0) {
                5.0
            } else {
                3.0
            }
        } else if buttons.is_down(Button::Down) {
            6.0
        } else if buttons.is_down(Button::Up) {
            7.0
        } else if e.speed_x == 0.0
            || (!buttons.is_down(Button::Left) && !buttons.is_down(Button::Right))
        {
            1.0
        } else {
            1.0 + p.sprite_offset % 4.0
        };

        // Leaving through the top
        if let Some((index, _)) = level {
            if e.y < -4.0 && index < LAST_LEVEL {
                return self.next_level(handle, index);
            }
        }

        p.was_on_ground = on_ground;

        if e.x < -1.0 || e.x > 121.0 {
            e.x = e.x.clamp(-1.0, 121.0);
            e.speed_x = 0.0;
        }

        let hair_color = match p.dashes {
            1 => 8,
            2 => 7 + ((self.state.frame_phase / 3) % 2) as u8 * 4,
            _ => 12,
        };
        let hairs = e.children().first().copied();
        e.data = KindData::Player(p);
        self.pool.write_back(handle, e);

        let segments = hairs
            .and_then(|h| self.pool.get(h))
            .map(|h| h.children().to_vec())
            .unwrap_or_default();
        for seg in segments {
            if let Some(hair) = self.pool.get_mut(seg) {
                hair.color = hair_color;
            }
        }
        Ok(())
    }

    fn next_level(&mut self, player: EntityRef, index: u32) -> Result<(), ConsoleError> {
        self.destroy(player)?;
        if let Some(level) = self.pool.first_of_kind(EntityKind::Level) {
            self.destroy(level)?;
        }
        let next = (index + 1) % SCENE_COUNT;
        match next {
            11 | 21 | 30 => self.music(Song::Song30, 500),
            12 => self.music(Song::Song20, 500),
            _ => {}
        }
        self.create_level(next)?;
        self.save_level(next);
        tracing::info!(level = next, "entering level");
        Ok(())
    }

    // ========================================================================
    // Scene objects
    // ========================================================================

    /// Drift sideways, wrap around the screen, and carry a player standing on top.
    fn update_platform(&mut self, handle: EntityRef) -> Result<(), ConsoleError> {
        let Some(mut e) = self.pool.get(handle).cloned() else {
            return Ok(());
        };
        let KindData::Platform { direction, last } = e.data else {
            return Ok(());
        };
        e.speed_x = direction * 0.65;
        if e.x < -e.hitbox.w {
            e.x = SCREEN;
        } else if e.x > SCREEN {
            e.x = -e.hitbox.w;
        }

        if self.touches_player(&e, 0.0, 0.0).is_none() {
            if let Some(player) = self.touches_player(&e, 0.0, -1.0) {
                if let Some(mut rider) = self.pool.get(player).cloned() {
                    collision::move_x(&self.pool, &self.assets.map, &mut rider, e.x - last, 1);
                    self.pool.write_back(player, rider);
                }
            }
        }

        e.data = KindData::Platform {
            direction,
            last: e.x,
        };
        self.pool.write_back(handle, e);
        Ok(())
    }

    /// Start shaking a fall floor. Only idle floors react.
    pub(crate) fn fall_floor_break(&mut self, handle: EntityRef) -> Result<(), ConsoleError> {
        let Some(e) = self.pool.get_mut(handle) else {
            return Ok(());
        };
        if !matches!(
            e.data,
            KindData::FallFloor {
                state: FallFloorState::Idle,
                ..
            }
        ) {
            return Ok(());
        }
        e.data = KindData::FallFloor {
            state: FallFloorState::Shaking,
            delay: 15,
        };
        let (x, y) = (e.x, e.y);
        self.psfx(Sfx::FallFloorShakeStarted);
        self.create_smoke(x, y)?;
        Ok(())
    }

    fn update_fall_floor(&mut self, handle: EntityRef) -> Result<(), ConsoleError> {
        let Some(mut e) = self.pool.get(handle).cloned() else {
            return Ok(());
        };
        let KindData::FallFloor { state, mut delay } = e.data else {
            return Ok(());
        };
        match state {
            FallFloorState::Idle => {
                let stepped_on = self.touches_player(&e, 0.0, -1.0).is_some()
                    || self.touches_player(&e, -1.0, 0.0).is_some()
                    || self.touches_player(&e, 1.0, 0.0).is_some();
                if stepped_on {
                    self.fall_floor_break(handle)?;
                }
                return Ok(());
            }
            FallFloorState::Shaking => {
                delay -= 1;
                if delay <= 0 {
                    e.data = KindData::FallFloor {
                        state: FallFloorState::Hidden,
                        delay: 60,
                    };
                    e.collidable = false;
                } else {
                    e.data = KindData::FallFloor { state, delay };
                }
            }
            FallFloorState::Hidden => {
                delay -= 1;
                e.data = KindData::FallFloor { state, delay };
                if delay <= 0 && self.touches_player(&e, 0.0, 0.0).is_none() {
                    self.psfx(Sfx::FallFloorReset);
                    e.data = KindData::FallFloor {
                        state: FallFloorState::Idle,
                        delay,
                    };
                    e.collidable = true;
                    self.create_smoke(e.x, e.y)?;
                }
            }
        }
        self.pool.write_back(handle, e);
        Ok(())
    }

    fn update_fake_wall(&mut self, handle: EntityRef) -> Result<(), ConsoleError> {
        let Some(mut e) = self.pool.get(handle).cloned() else {
            return Ok(());
        };
        // Enlarged so a player sliding along the wall can still dash through it
        e.hitbox = Hitbox::new(-1.0, -1.0, 18.0, 18.0);
        let dashing = self.touches_player(&e, 0.0, 0.0).filter(|&p| {
            self.pool
                .get(p)
                .and_then(Entity::player)
                .is_some_and(|d| d.dash_effect_time > 0)
        });

        let Some(player) = dashing else {
            e.hitbox = Hitbox::new(0.0, 0.0, 16.0, 16.0);
            self.pool.write_back(handle, e);
            return Ok(());
        };

        if let Some(p) = self.pool.get_mut(player) {
            p.speed_x = -sign(p.speed_x) * 1.5;
            p.speed_y = -1.5;
            if let Some(d) = p.player_mut() {
                d.dash_time = -1;
            }
        }
        self.state.timers.mute_sfx = 20;
        self.sfx(Sfx::FakeWallDestroyed);
        self.destroy(handle)?;
        for (dx, dy) in [(0.0, 0.0), (8.0, 0.0), (0.0, 8.0), (8.0, 8.0)] {
            self.create_smoke(e.x + dx, e.y + dy)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::runtime::tests::{blank_assets, floor_assets, seeded, Harness};
    use crate::game::runtime::GameOptions;
    use crate::input::ButtonSet;
    use crate::world::scene_origin;

    fn player_ref(h: &Harness) -> EntityRef {
        h.game.pool().first_of_kind(EntityKind::Player).unwrap()
    }

    #[test]
    fn test_spawner_lands_and_becomes_player() {
        let mut h = Harness::new(floor_assets());
        h.until_player();
        assert!(h.game.pool().first_of_kind(EntityKind::PlayerSpawner).is_none());
        let p = h.game.player().unwrap();
        assert_eq!((p.x, p.y), (16.0, 88.0));
        assert!(h.audio.effects().contains(&Sfx::PlayerSpawnerTouchedGround));
    }

    #[test]
    fn test_jump_from_ground() {
        let mut h = Harness::new(floor_assets());
        h.until_player();
        h.step(ButtonSet::NONE.with(Button::Jump));
        assert_eq!(h.game.player().unwrap().speed_y, JUMP_SPEED);
        assert!(h.audio.effects().contains(&Sfx::Jumped));

        // Holding the button does not jump again
        h.step(ButtonSet::NONE.with(Button::Jump));
        h.step(ButtonSet::NONE.with(Button::Jump));
        assert_eq!(h.audio.effects().iter().filter(|s| **s == Sfx::Jumped).count(), 1);
    }

    #[test]
    fn test_dash_freezes_and_spends_charge() {
        let mut h = Harness::new(floor_assets());
        h.until_player();
        h.step(ButtonSet::NONE.with(Button::Dash).with(Button::Right));

        let p = h.game.player().unwrap();
        assert_eq!(p.speed_x, DASH_FULL);
        assert_eq!(p.player().unwrap().dashes, 0);
        assert_eq!(h.game.state().timers.freeze, 2);
        assert_eq!(h.game.state().timers.shake, 6);
        let hairs = p.children()[0];
        for seg in h.game.pool().get(hairs).unwrap().children() {
            assert_eq!(h.game.pool().get(*seg).unwrap().color, 12);
        }

        // The next update is frozen
        let x = p.x;
        h.run(1);
        assert_eq!(h.game.player().unwrap().x, x);
    }

    #[test]
    fn test_falling_off_screen_kills_and_rebuilds_level() {
        let mut h = Harness::new(floor_assets());
        h.until_player();
        let old_level = h.game.pool().first_of_kind(EntityKind::Level).unwrap();
        let p = player_ref(&h);
        h.game.pool.get_mut(p).unwrap().y = 130.0;
        h.run(1);

        assert!(h.game.player().is_none());
        assert_eq!(h.game.state().death_count, 1);
        assert!(h.audio.effects().contains(&Sfx::Died));
        assert!(h.game.pool().first_of_kind(EntityKind::DeathParticles).is_some());

        h.run(12);
        assert!(h.game.pool().first_of_kind(EntityKind::DeathParticles).is_none());
        let new_level = h.game.pool().first_of_kind(EntityKind::Level).unwrap();
        assert_ne!(new_level, old_level);
        assert_eq!(h.game.level_index(), Some(0));
        assert!(h.game.pool().first_of_kind(EntityKind::PlayerSpawner).is_some());
    }

    #[test]
    fn test_fall_floor_shakes_then_hides() {
        let mut assets = floor_assets();
        let (ox, oy) = scene_origin(0);
        assets.map.mset(ox + 2, oy + 12, 23);
        let mut h = Harness::new(assets);
        h.until_player();

        // The floor under the spawn point reacts in the pass that creates the player
        let floor = h.game.pool().first_of_kind(EntityKind::FallFloor).unwrap();
        assert_eq!(
            h.game.pool().get(floor).unwrap().data,
            KindData::FallFloor {
                state: FallFloorState::Shaking,
                delay: 15
            }
        );
        assert!(h.audio.effects().contains(&Sfx::FallFloorShakeStarted));

        h.run(14);
        assert_eq!(
            h.game.pool().get(floor).unwrap().data,
            KindData::FallFloor {
                state: FallFloorState::Shaking,
                delay: 1
            }
        );

        h.run(1);
        let e = h.game.pool().get(floor).unwrap();
        assert_eq!(
            e.data,
            KindData::FallFloor {
                state: FallFloorState::Hidden,
                delay: 60
            }
        );
        assert!(!e.collidable);
    }

    #[test]
    fn test_dash_breaks_fake_wall() {
        let mut assets = floor_assets();
        let (ox, oy) = scene_origin(0);
        assets.map.mset(ox + 4, oy + 10, 64);
        let mut h = Harness::new(assets);
        h.until_player();
        assert!(h.game.pool().first_of_kind(EntityKind::FakeWall).is_some());

        h.step(ButtonSet::NONE.with(Button::Dash).with(Button::Right));
        h.run(6);
        assert!(h.game.pool().first_of_kind(EntityKind::FakeWall).is_none());
        assert!(h.audio.effects().contains(&Sfx::FakeWallDestroyed));
    }

    #[test]
    fn test_undashed_player_is_blocked_by_fake_wall() {
        let mut assets = floor_assets();
        let (ox, oy) = scene_origin(0);
        assets.map.mset(ox + 4, oy + 10, 64);
        let mut h = Harness::new(assets);
        h.until_player();
        for _ in 0..30 {
            h.step(ButtonSet::NONE.with(Button::Right));
        }
        assert!(h.game.pool().first_of_kind(EntityKind::FakeWall).is_some());
        let p = h.game.player().unwrap();
        assert_eq!(p.x + p.hitbox.x + p.hitbox.w, 32.0);
    }

    #[test]
    fn test_smoke_expires_after_animation() {
        let mut h = Harness::new(blank_assets());
        let smoke = h.game.create_smoke(50.0, 50.0).unwrap();
        h.run(5);
        assert!(h.game.pool().is_alive(smoke));
        h.run(7);
        assert!(!h.game.pool().is_alive(smoke));
    }

    #[test]
    fn test_snow_wraps_to_left_edge() {
        let mut h = Harness::new(blank_assets());
        let snow = h.game.pool().first_of_kind(EntityKind::SnowParticle).unwrap();
        h.game.pool.get_mut(snow).unwrap().x = 140.0;
        h.run(1);
        assert_eq!(h.game.pool().get(snow).unwrap().x, -4.0);
    }

    #[test]
    fn test_platform_carries_standing_player() {
        let mut assets = blank_assets();
        let (ox, oy) = scene_origin(0);
        assets.map.mset(ox + 1, oy + 8, 12);
        let mut h = Harness::new(assets);
        let player = h.game.create_player(6.0, 56.0).unwrap();
        let platform = h.game.pool().first_of_kind(EntityKind::Platform).unwrap();

        h.run(10);
        let px = h.game.pool().get(player).unwrap().x;
        let fx = h.game.pool().get(platform).unwrap().x;
        assert!(fx > 4.0);
        assert_eq!(px - 6.0, fx - 4.0);
        assert_eq!(h.game.pool().get(player).unwrap().y, 56.0);
    }

    #[test]
    fn test_hair_eases_toward_owner() {
        let mut h = Harness::new(blank_assets());
        let player = h.game.create_player(40.0, 50.0).unwrap();
        h.run(1);
        let hairs = h.game.pool().get(player).unwrap().children()[0];
        let first = h.game.pool().get(hairs).unwrap().children()[0];
        let seg = h.game.pool().get(first).unwrap();
        assert!((seg.x - (40.0 + 2.0 / 1.5)).abs() < 1e-4);
        assert!((seg.y - (50.0 + 3.5 / 1.5)).abs() < 1e-4);
    }

    #[test]
    fn test_level_counts_play_time() {
        let mut h = Harness::new(blank_assets());
        h.run(95);
        assert_eq!(h.game.state().elapsed.seconds, 3);
        assert_eq!(h.game.state().elapsed.label(), "00:00:03");
    }

    #[test]
    fn test_summit_does_not_count_time() {
        let options = GameOptions {
            start_level: LAST_LEVEL,
            ..seeded()
        };
        let mut h = Harness::new(blank_assets());
        h.game = Game::new(blank_assets(), &options).unwrap();
        h.run(95);
        assert_eq!(h.game.state().elapsed.seconds, 0);
        assert_eq!(h.game.state().elapsed.epoch, None);
    }
}
