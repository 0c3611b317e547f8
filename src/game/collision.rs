//! Collision queries
//!
//! Everything here is axis-aligned rectangle math between hitboxes, plus
//! tile-flag lookups in the active scene. Boxes that only share an edge do
//! not overlap.

use super::entity::{Entity, EntityKind, EntityRef};
use super::math::sign;
use super::pool::EntityPool;
use crate::world::{TileMap, FLAG_ICE, FLAG_SOLID};

/// Whether `subject`, shifted by (dx, dy), strictly overlaps `other`.
pub fn overlaps(subject: &Entity, dx: f32, dy: f32, other: &Entity) -> bool {
    let (sl, st, sr, sb) = subject.bounds(dx, dy);
    let (ol, ot, or, ob) = other.bounds(0.0, 0.0);
    or > sl && ob > st && ol < sr && ot < sb
}

/// First collidable candidate that overlaps `subject` shifted by (dx, dy).
///
/// Stale handles and the subject itself are skipped.
pub fn first_collision(
    pool: &EntityPool,
    subject: &Entity,
    dx: f32,
    dy: f32,
    candidates: impl IntoIterator<Item = EntityRef>,
) -> Option<EntityRef> {
    let me = subject.handle();
    candidates.into_iter().find(|&c| {
        c != me
            && pool
                .get(c)
                .is_some_and(|other| other.collidable && overlaps(subject, dx, dy, other))
    })
}

/// `first_collision` against every live entity of one kind.
pub fn first_collision_of_kind(
    pool: &EntityPool,
    subject: &Entity,
    dx: f32,
    dy: f32,
    kind: EntityKind,
) -> Option<EntityRef> {
    first_collision(pool, subject, dx, dy, pool.all_of_kind(kind))
}

/// Tile origin of the active scene. Without a Level the origin is (0, 0).
pub fn scene_origin(pool: &EntityPool) -> (i32, i32) {
    pool.first_of_kind(EntityKind::Level)
        .and_then(|l| pool.get(l))
        .and_then(Entity::level)
        .map_or((0, 0), |(_, origin)| origin)
}

/// Whether `subject` shifted by (dx, dy) hits anything solid.
///
/// Platforms are one-way: they only count when moving down onto one the
/// subject is not already overlapping. Otherwise solid means a solid-flag
/// tile, a FallFloor or a FakeWall.
pub fn collides_with_solid(
    pool: &EntityPool,
    map: &TileMap,
    subject: &Entity,
    dx: f32,
    dy: f32,
) -> bool {
    if dy > 0.0 {
        let platforms = pool.all_of_kind(EntityKind::Platform);
        if first_collision(pool, subject, dx, 0.0, platforms.iter().copied()).is_none()
            && first_collision(pool, subject, dx, dy, platforms).is_some()
        {
            return true;
        }
    }

    let (left, top, _, _) = subject.bounds(dx, dy);
    map.rect_has_flag(
        scene_origin(pool),
        left,
        top,
        subject.hitbox.w,
        subject.hitbox.h,
        FLAG_SOLID,
    ) || first_collision_of_kind(pool, subject, dx, dy, EntityKind::FallFloor).is_some()
        || first_collision_of_kind(pool, subject, dx, dy, EntityKind::FakeWall).is_some()
}

/// Whether `subject` shifted by (dx, dy) touches an ice tile.
pub fn collides_with_ice(
    pool: &EntityPool,
    map: &TileMap,
    subject: &Entity,
    dx: f32,
    dy: f32,
) -> bool {
    let (left, top, _, _) = subject.bounds(dx, dy);
    map.rect_has_flag(
        scene_origin(pool),
        left,
        top,
        subject.hitbox.w,
        subject.hitbox.h,
        FLAG_ICE,
    )
}

/// Push `subject` horizontally by `amount` pixels.
///
/// Solid entities step one pixel at a time for steps `start_at..=|amount|`
/// and stop, zeroing horizontal speed and remainder, at the first blocked
/// step. Others jump straight there.
pub fn move_x(pool: &EntityPool, map: &TileMap, subject: &mut Entity, amount: f32, start_at: u32) {
    if !subject.solid {
        subject.x += amount;
        return;
    }
    let step = sign(amount);
    let mut i = start_at as f32;
    while i <= amount.abs() {
        if collides_with_solid(pool, map, subject, step, 0.0) {
            subject.speed_x = 0.0;
            subject.rem_x = 0.0;
            break;
        }
        subject.x += step;
        i += 1.0;
    }
}

/// Step a solid entity `steps` whole pixels along one axis, stopping at the
/// first blocked pixel. Returns false if it was blocked.
pub fn step_axis(
    pool: &EntityPool,
    map: &TileMap,
    subject: &mut Entity,
    amount: f32,
    horizontal: bool,
) -> bool {
    let step = sign(amount);
    for _ in 0..amount.abs() as u32 {
        let (dx, dy) = if horizontal { (step, 0.0) } else { (0.0, step) };
        if collides_with_solid(pool, map, subject, dx, dy) {
            return false;
        }
        if horizontal {
            subject.x += step;
        } else {
            subject.y += step;
        }
    }
    true
}
