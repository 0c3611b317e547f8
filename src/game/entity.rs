//! Entity records and handles
//!
//! Every entity lives in a fixed pool slot and is identified by an
//! `EntityRef` pairing the slot with a process-unique id. Ids come from a
//! monotonically increasing counter and are never reused, so a handle to a
//! destroyed entity never matches whatever reuses its slot.
//!
//! Shared transform, collision and render state sits on `Entity` itself;
//! state only one kind needs sits in `KindData`.
//!
//! | Field | Meaningful for |
//! |---|---|
//! | `speed_*`, `rem_*` | moving kinds (not Level, Terrain, Hairs, FakeWall, FallFloor) |
//! | `solid` | Player |
//! | `collidable`, `hitbox` | Player, Platform, FallFloor, FakeWall (collision candidates) |
//! | `sprite`, `flip_*` | Player, PlayerSpawner, Smoke, FallFloor, FakeWall |
//! | `rect_w`, `rect_h`, `centered` | SnowParticle, Cloud, DeathParticle |
//! | `radius` | Hair |
//! | `color` | SnowParticle, Cloud, DeathParticle, Hair |
//! | `max_age` | DeathParticles, DeathParticle |
//! | `KindData::Level` | Level: scene index and tile origin |
//! | `KindData::Terrain` | Terrain: layer mask |
//! | `KindData::Spawner` | PlayerSpawner: state, target, hang timer |
//! | `KindData::Player` | Player: input edges, grace, jump buffer, dash state, animation |
//! | `KindData::Platform` | Platform: direction, last x |
//! | `KindData::FallFloor` | FallFloor: state, delay |

use crate::rasterizer::ColorIndex;

/// Handle to a pooled entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EntityRef {
    /// Pool slot
    pub(crate) slot: u32,
    /// Process-unique id
    pub(crate) id: u64,
}

impl EntityRef {
    pub fn slot(&self) -> u32 {
        self.slot
    }

    pub fn id(&self) -> u64 {
        self.id
    }
}

/// Closed set of entity kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    Level,
    Terrain,
    PlayerSpawner,
    Player,
    Hairs,
    Hair,
    Smoke,
    DeathParticles,
    DeathParticle,
    SnowParticle,
    Cloud,
    Platform,
    FallFloor,
    FakeWall,
}

impl EntityKind {
    pub const ALL: [EntityKind; 14] = [
        EntityKind::Level,
        EntityKind::Terrain,
        EntityKind::PlayerSpawner,
        EntityKind::Player,
        EntityKind::Hairs,
        EntityKind::Hair,
        EntityKind::Smoke,
        EntityKind::DeathParticles,
        EntityKind::DeathParticle,
        EntityKind::SnowParticle,
        EntityKind::Cloud,
        EntityKind::Platform,
        EntityKind::FallFloor,
        EntityKind::FakeWall,
    ];
}

/// Collision rectangle relative to the entity position.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Hitbox {
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
}

impl Hitbox {
    pub const fn new(x: f32, y: f32, w: f32, h: f32) -> Self {
        Self { x, y, w, h }
    }
}

impl Default for Hitbox {
    fn default() -> Self {
        Hitbox::new(0.0, 0.0, 8.0, 8.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpawnerState {
    GoingUp,
    Falling,
    Landing,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FallFloorState {
    Idle,
    Shaking,
    /// Hidden and not collidable until the delay runs out and the player is clear
    Hidden,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PlayerData {
    pub pressed_jump: bool,
    pub pressed_dash: bool,
    /// Frames left in which a jump still counts as grounded
    pub grace: i32,
    /// Frames a jump press stays buffered
    pub jump_buffer: i32,
    pub was_on_ground: bool,
    pub dashes: i32,
    pub max_dashes: i32,
    pub dash_time: i32,
    pub dash_effect_time: i32,
    pub dash_target_x: f32,
    pub dash_target_y: f32,
    pub dash_accel_x: f32,
    pub dash_accel_y: f32,
    pub sprite_offset: f32,
    pub has_dashed: bool,
}

impl Default for PlayerData {
    fn default() -> Self {
        Self {
            pressed_jump: false,
            pressed_dash: false,
            grace: 0,
            jump_buffer: 0,
            was_on_ground: false,
            dashes: 1,
            max_dashes: 1,
            dash_time: 0,
            dash_effect_time: 0,
            dash_target_x: 0.0,
            dash_target_y: 0.0,
            dash_accel_x: 0.0,
            dash_accel_y: 0.0,
            sprite_offset: 0.0,
            has_dashed: false,
        }
    }
}

/// Kind-specific state.
#[derive(Debug, Clone, PartialEq)]
pub enum KindData {
    None,
    Level {
        index: u32,
        origin: (i32, i32),
    },
    Terrain {
        layer: u8,
    },
    Spawner {
        state: SpawnerState,
        target_x: f32,
        target_y: f32,
        t: i32,
    },
    Player(Box<PlayerData>),
    Platform {
        direction: f32,
        last: f32,
    },
    FallFloor {
        state: FallFloorState,
        delay: i32,
    },
}

impl KindData {
    pub fn default_for(kind: EntityKind) -> Self {
        match kind {
            EntityKind::Level => KindData::Level {
                index: 0,
                origin: (0, 0),
            },
            EntityKind::Terrain => KindData::Terrain { layer: 0 },
            EntityKind::PlayerSpawner => KindData::Spawner {
                state: SpawnerState::GoingUp,
                target_x: 0.0,
                target_y: 0.0,
                t: 0,
            },
            EntityKind::Player => KindData::Player(Box::default()),
            EntityKind::Platform => KindData::Platform {
                direction: 0.0,
                last: 0.0,
            },
            EntityKind::FallFloor => KindData::FallFloor {
                state: FallFloorState::Idle,
                delay: 0,
            },
            _ => KindData::None,
        }
    }
}

/// A pooled entity record.
#[derive(Debug, Clone, PartialEq)]
pub struct Entity {
    pub(crate) slot: u32,
    pub(crate) id: u64,
    pub kind: EntityKind,
    pub(crate) parent: Option<EntityRef>,
    pub(crate) children: Vec<EntityRef>,
    pub(crate) destroyed: bool,

    /// Updates survived so far
    pub age: u32,
    /// Destroyed at the start of the update where `age == max_age`; 0 = unbounded
    pub max_age: u32,
    /// Drawn but not updated
    pub paused: bool,

    // Transform
    pub x: f32,
    pub y: f32,
    pub speed_x: f32,
    pub speed_y: f32,
    pub rem_x: f32,
    pub rem_y: f32,

    // Collision
    pub solid: bool,
    pub collidable: bool,
    pub hitbox: Hitbox,

    // Rendering
    pub sprite: f32,
    pub flip_x: bool,
    pub flip_y: bool,
    pub color: ColorIndex,
    pub rect_w: Option<f32>,
    /// Falls back to `rect_w` when unset
    pub rect_h: Option<f32>,
    pub radius: Option<f32>,
    /// Treat (x, y) as the rectangle center
    pub centered: bool,
    pub draw_order: i32,

    pub data: KindData,
}

impl Entity {
    /// A never-used slot.
    pub(crate) fn vacant(slot: u32) -> Self {
        let mut e = Entity::new(slot, u64::MAX, EntityKind::Smoke);
        e.destroyed = true;
        e.data = KindData::None;
        e
    }

    /// Fresh record with every field at its default.
    pub(crate) fn new(slot: u32, id: u64, kind: EntityKind) -> Self {
        Self {
            slot,
            id,
            kind,
            parent: None,
            children: Vec::new(),
            destroyed: false,
            age: 0,
            max_age: 0,
            paused: false,
            x: 0.0,
            y: 0.0,
            speed_x: 0.0,
            speed_y: 0.0,
            rem_x: 0.0,
            rem_y: 0.0,
            solid: false,
            collidable: true,
            hitbox: Hitbox::default(),
            sprite: 0.0,
            flip_x: false,
            flip_y: false,
            color: 0,
            rect_w: None,
            rect_h: None,
            radius: None,
            centered: false,
            draw_order: 0,
            data: KindData::default_for(kind),
        }
    }

    pub fn handle(&self) -> EntityRef {
        EntityRef {
            slot: self.slot,
            id: self.id,
        }
    }

    pub fn is_destroyed(&self) -> bool {
        self.destroyed
    }

    pub fn parent(&self) -> Option<EntityRef> {
        self.parent
    }

    pub fn children(&self) -> &[EntityRef] {
        &self.children
    }

    /// Absolute hitbox as (left, top, right, bottom), translated by an offset.
    pub fn bounds(&self, dx: f32, dy: f32) -> (f32, f32, f32, f32) {
        let left = self.x + self.hitbox.x + dx;
        let top = self.y + self.hitbox.y + dy;
        (left, top, left + self.hitbox.w, top + self.hitbox.h)
    }

    pub fn player(&self) -> Option<&PlayerData> {
        match &self.data {
            KindData::Player(p) => Some(p),
            _ => None,
        }
    }

    pub fn player_mut(&mut self) -> Option<&mut PlayerData> {
        match &mut self.data {
            KindData::Player(p) => Some(p),
            _ => None,
        }
    }

    /// Scene index and tile origin of a Level entity.
    pub fn level(&self) -> Option<(u32, (i32, i32))> {
        match self.data {
            KindData::Level { index, origin } => Some((index, origin)),
            _ => None,
        }
    }
}
