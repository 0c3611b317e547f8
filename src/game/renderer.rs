//! Draw Step
//!
//! Per-entity rendering. Shared attributes come first (rect, circle,
//! sprite), then whatever the kind draws on top. Everything goes through
//! the rasterizer, so the draw remap and camera apply as usual.

use super::entity::{Entity, EntityKind, EntityRef, FallFloorState, KindData};
use super::runtime::{Game, LAST_LEVEL, SCREEN};
use crate::error::ConsoleError;
use crate::rasterizer::{color, map, print, print_centered, spr, Framebuffer};
use crate::world::SCENE_TILES;

/// Scene index whose banner reads "old site"
const OLD_SITE_LEVEL: u32 = 11;
/// Hair color baked into the player sprite
const SPRITE_HAIR: u8 = 8;

impl Game {
    pub(crate) fn draw_entity(
        &self,
        fb: &mut Framebuffer,
        handle: EntityRef,
    ) -> Result<(), ConsoleError> {
        let Some(e) = self.pool.get(handle) else {
            return Ok(());
        };

        if let Some(w) = e.rect_w {
            let h = e.rect_h.unwrap_or(w);
            if e.centered {
                let (hw, hh) = ((w / 2.0).floor(), (h / 2.0).floor());
                fb.rectfill(e.x - hw, e.y - hh, e.x + hw, e.y + hh, e.color);
            } else {
                fb.rectfill(e.x, e.y, e.x + w, e.y + h, e.color);
            }
        }
        if let Some(r) = e.radius {
            fb.circfill(e.x, e.y, r, e.color);
        }
        if e.sprite > 0.0 {
            self.draw_sprite(fb, e)?;
        }

        match e.kind {
            EntityKind::Level => self.draw_level(fb, e),
            EntityKind::Terrain => self.draw_terrain(fb, e),
            EntityKind::FakeWall => {
                let sheet = &self.assets.sprites;
                spr(fb, sheet, 64.0, e.x, e.y, false, false)?;
                spr(fb, sheet, 65.0, e.x + 8.0, e.y, false, false)?;
                spr(fb, sheet, 80.0, e.x, e.y + 8.0, false, false)?;
                spr(fb, sheet, 81.0, e.x + 8.0, e.y + 8.0, false, false)
            }
            EntityKind::Platform => {
                let sheet = &self.assets.sprites;
                spr(fb, sheet, 11.0, e.x, e.y - 1.0, false, false)?;
                spr(fb, sheet, 12.0, e.x + 8.0, e.y - 1.0, false, false)
            }
            _ => Ok(()),
        }
    }

    fn draw_sprite(&self, fb: &mut Framebuffer, e: &Entity) -> Result<(), ConsoleError> {
        let sheet = &self.assets.sprites;
        match (e.kind, &e.data) {
            (EntityKind::Player, _) => {
                let hair = self.hair_color(e).unwrap_or(SPRITE_HAIR);
                fb.set_draw_remap(SPRITE_HAIR, hair);
                let drawn = spr(fb, sheet, e.sprite, e.x, e.y, e.flip_x, e.flip_y);
                fb.set_draw_remap(SPRITE_HAIR, SPRITE_HAIR);
                drawn
            }
            (_, KindData::FallFloor { state: FallFloorState::Hidden, .. }) => Ok(()),
            (_, KindData::FallFloor { state: FallFloorState::Shaking, delay }) => {
                let frame = e.sprite + (15 - delay) as f32 / 5.0;
                spr(fb, sheet, frame, e.x, e.y, false, false)
            }
            _ => spr(fb, sheet, e.sprite, e.x, e.y, e.flip_x, e.flip_y),
        }
    }

    /// Color of the first hair segment.
    fn hair_color(&self, player: &Entity) -> Option<u8> {
        let hairs = self.pool.get(*player.children().first()?)?;
        let first = self.pool.get(*hairs.children().first()?)?;
        Some(first.color)
    }

    // ========================================================================
    // Scene
    // ========================================================================

    fn draw_level(&self, fb: &mut Framebuffer, e: &Entity) -> Result<(), ConsoleError> {
        let Some((index, _)) = e.level() else {
            return Ok(());
        };
        let font = &self.assets.font;

        // Scene title while the level fades in
        if e.age > 5 && e.age < 30 {
            fb.rectfill(24.0, 58.0, 104.0, 70.0, color::BLACK);
            let title = match index {
                OLD_SITE_LEVEL => "old site".to_string(),
                LAST_LEVEL => "summit".to_string(),
                _ => format!("{} m", (1 + index) * 100),
            };
            print_centered(fb, font, &title, 64.0, 62.0, color::WHITE)?;
            self.draw_time(fb, 4.0, 4.0)?;
        }

        // Summit sidebars close in on the player
        if index == LAST_LEVEL {
            if let Some(player) = self.player() {
                let diff = (40.0 - (player.x + 4.0 - 64.0).abs()).min(24.0);
                fb.rectfill(0.0, 0.0, diff, SCREEN, color::BLACK);
                fb.rectfill(SCREEN - diff, 0.0, SCREEN, SCREEN, color::BLACK);
            }
        }
        Ok(())
    }

    fn draw_time(&self, fb: &mut Framebuffer, x: f32, y: f32) -> Result<(), ConsoleError> {
        fb.rectfill(x, y, x + 32.0, y + 6.0, color::BLACK);
        let label = self.state.elapsed.label();
        print(fb, &self.assets.font, &label, x + 1.0, y + 1.0, color::WHITE)
    }

    fn draw_terrain(&self, fb: &mut Framebuffer, e: &Entity) -> Result<(), ConsoleError> {
        let KindData::Terrain { layer } = e.data else {
            return Ok(());
        };
        let origin = e
            .parent()
            .and_then(|p| self.pool.get(p))
            .and_then(Entity::level)
            .map_or((0, 0), |(_, o)| o);
        let size = SCENE_TILES as i32;
        map(
            fb,
            &self.assets.sprites,
            &self.assets.map,
            origin.0,
            origin.1,
            0.0,
            0.0,
            size,
            size,
            Some(layer),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::runtime::tests::{blank_assets, seeded};
    use crate::game::runtime::GameOptions;
    use crate::rasterizer::PixelSheet;
    use crate::world::scene_origin;

    const BG: u8 = color::DARK_BLUE;

    /// Sprite sheet where cell `n` is filled with color `n % 16`.
    fn numbered_sheet() -> PixelSheet {
        let mut sheet = PixelSheet::filled(128, 128, 0);
        for n in 1..256usize {
            let (cx, cy) = ((n % 16) * 8, (n / 16) * 8);
            for y in 0..8 {
                for x in 0..8 {
                    sheet.set(cx + x, cy + y, (n % 16) as u8);
                }
            }
        }
        sheet
    }

    fn game() -> Game {
        let mut assets = blank_assets();
        assets.sprites = numbered_sheet();
        Game::new(assets, &seeded()).unwrap()
    }

    fn canvas() -> Framebuffer {
        let mut fb = Framebuffer::new();
        fb.clear(BG);
        fb
    }

    #[test]
    fn test_centered_rect_uses_half_extents() {
        let mut game = game();
        let r = game
            .spawn(EntityKind::DeathParticle, None, |e| {
                e.x = 10.0;
                e.y = 10.0;
                e.rect_w = Some(4.0);
                e.centered = true;
                e.color = 14;
            })
            .unwrap();
        let mut fb = canvas();
        game.draw_entity(&mut fb, r).unwrap();
        assert_eq!(fb.pixel(8, 8).unwrap(), 14);
        assert_eq!(fb.pixel(12, 12).unwrap(), 14);
        assert_eq!(fb.pixel(13, 12).unwrap(), BG);
        assert_eq!(fb.pixel(7, 8).unwrap(), BG);
    }

    #[test]
    fn test_player_sprite_takes_hair_color() {
        let mut game = game();
        let player = game.create_player(40.0, 40.0).unwrap();
        let hairs = game.pool().get(player).unwrap().children()[0];
        let first = game.pool().get(hairs).unwrap().children()[0];
        game.pool.get_mut(first).unwrap().color = 12;
        // Cell 8 of the numbered sheet is solid hair color
        game.pool.get_mut(player).unwrap().sprite = 8.0;

        let mut fb = canvas();
        game.draw_entity(&mut fb, player).unwrap();
        assert_eq!(fb.pixel(43, 43).unwrap(), 12);
        // Remap is restored after the call
        assert_eq!(fb.palette.draw(8), 8);
    }

    #[test]
    fn test_fall_floor_frames_follow_state() {
        let mut game = game();
        let floor = game.create_fall_floor(16.0, 16.0).unwrap();

        game.pool.get_mut(floor).unwrap().data = KindData::FallFloor {
            state: FallFloorState::Shaking,
            delay: 5,
        };
        let mut fb = canvas();
        game.draw_entity(&mut fb, floor).unwrap();
        assert_eq!(fb.pixel(16, 16).unwrap(), (23 + 2) % 16);

        game.pool.get_mut(floor).unwrap().data = KindData::FallFloor {
            state: FallFloorState::Hidden,
            delay: 60,
        };
        let mut fb = canvas();
        game.draw_entity(&mut fb, floor).unwrap();
        assert_eq!(fb.pixel(16, 16).unwrap(), BG);
    }

    #[test]
    fn test_level_banner_only_while_fading_in() {
        let mut game = game();
        let level = game.pool().first_of_kind(EntityKind::Level).unwrap();

        game.pool.get_mut(level).unwrap().age = 10;
        let mut fb = canvas();
        game.draw_entity(&mut fb, level).unwrap();
        assert_eq!(fb.pixel(24, 58).unwrap(), color::BLACK);
        assert_eq!(fb.pixel(4, 4).unwrap(), color::BLACK);

        game.pool.get_mut(level).unwrap().age = 40;
        let mut fb = canvas();
        game.draw_entity(&mut fb, level).unwrap();
        assert_eq!(fb.pixel(24, 58).unwrap(), BG);
    }

    #[test]
    fn test_summit_sidebars_track_player() {
        let options = GameOptions {
            start_level: LAST_LEVEL,
            ..seeded()
        };
        let mut game = Game::new(blank_assets(), &options).unwrap();
        game.create_player(60.0, 60.0).unwrap();
        let level = game.pool().first_of_kind(EntityKind::Level).unwrap();
        game.pool.get_mut(level).unwrap().age = 40;

        let mut fb = canvas();
        game.draw_entity(&mut fb, level).unwrap();
        assert_eq!(fb.pixel(24, 50).unwrap(), color::BLACK);
        assert_eq!(fb.pixel(25, 50).unwrap(), BG);
        assert_eq!(fb.pixel(104, 50).unwrap(), color::BLACK);
        assert_eq!(fb.pixel(103, 50).unwrap(), BG);
    }

    #[test]
    fn test_terrain_draws_only_its_layer() {
        let mut assets = blank_assets();
        assets.sprites = numbered_sheet();
        assets.map.set_flags(3, crate::world::LAYER_MAIN);
        assets.map.set_flags(5, crate::world::LAYER_BACKGROUND);
        let (ox, oy) = scene_origin(0);
        assets.map.mset(ox, oy, 3);
        assets.map.mset(ox + 1, oy, 5);
        let game = Game::new(assets, &seeded()).unwrap();

        let main = game
            .pool()
            .all_of_kind(EntityKind::Terrain)
            .into_iter()
            .find(|&t| {
                game.pool().get(t).unwrap().data
                    == KindData::Terrain {
                        layer: crate::world::LAYER_MAIN,
                    }
            })
            .unwrap();
        let mut fb = canvas();
        game.draw_entity(&mut fb, main).unwrap();
        assert_eq!(fb.pixel(0, 0).unwrap(), 3);
        assert_eq!(fb.pixel(8, 0).unwrap(), BG);
    }
}
