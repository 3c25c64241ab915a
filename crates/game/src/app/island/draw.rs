use engine::iso::{IsometricCoordinate, ScreenCoordinate};
use engine::worldgen::TileKind;
use engine::{sort_by_bottom, AssetError, AssetProvider, Canvas, SpriteHandle, SpriteSize};

use super::state::{Facing, FoliageKind, IslandState, ScrapKind, WorldObject};
use crate::app::config::AssetConfig;

/// Sprite handles the island scene draws with, resolved once per start.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct IslandSprites {
    pub(crate) land: SpriteHandle,
    pub(crate) water: SpriteHandle,
    pub(crate) sand: SpriteHandle,
    pub(crate) player_left: SpriteHandle,
    pub(crate) player_right: SpriteHandle,
    pub(crate) bobber: SpriteHandle,
    pub(crate) grass: SpriteHandle,
    pub(crate) tree: SpriteHandle,
}

impl IslandSprites {
    pub(crate) fn load(
        assets: &mut dyn AssetProvider,
        config: &AssetConfig,
    ) -> Result<Self, AssetError> {
        let tiles = assets.load_sheet(&config.tiles)?;
        let player = assets.load_sheet(&config.player)?;
        let foliage = assets.load_sheet(&config.foliage)?;
        Ok(Self {
            land: config.tiles.cell(&tiles, config.land_cell)?,
            water: config.tiles.cell(&tiles, config.water_cell)?,
            sand: config.tiles.cell(&tiles, config.sand_cell)?,
            player_left: config.player.cell(&player, config.player_left_cell)?,
            player_right: config.player.cell(&player, config.player_right_cell)?,
            bobber: config.player.cell(&player, config.bobber_cell)?,
            grass: config.foliage.cell(&foliage, config.grass_cell)?,
            tree: config.foliage.cell(&foliage, config.tree_cell)?,
        })
    }

    fn tile(&self, kind: TileKind) -> SpriteHandle {
        match kind {
            TileKind::Land => self.land,
            TileKind::Water => self.water,
            TileKind::Sand => self.sand,
        }
    }
}

/// Height offset of water at ground position `x` and animation phase `t`.
pub(crate) fn water_offset(x: f64, t: f64) -> f64 {
    let p = t + x;
    0.1 * ((9.0 / 11.0 * p).cos() + 0.5 * (2.0 / 7.0 * p).cos() + 0.25 * (2.0 / 11.0 * p).cos())
}

/// Draws one frame: tiles in map order, then objects back to front.
pub(crate) fn draw_island(state: &mut IslandState, sprites: &IslandSprites, canvas: &mut dyn Canvas) {
    let view = state.view;
    let tile_size = state.gameplay.tile_size;
    let phase = state.water_phase;

    for tile in state.tilemap.tiles() {
        let mut coord = tile.coord();
        if tile.kind() == TileKind::Water {
            coord.z += water_offset(coord.x + 0.5 * coord.y, phase);
        }
        let center = view.project(coord);
        canvas.draw_sprite(
            sprites.tile(tile.kind()),
            ScreenCoordinate::new(center.x - tile_size * 0.5, center.y - tile_size * 0.5),
            SpriteSize::square(tile_size),
        );
    }
    state.water_phase += state.gameplay.water_phase_step;

    let mut objects: Vec<(WorldObject, SpriteHandle)> = Vec::with_capacity(state.foliage.len() + 2);
    let player_sprite = match state.player.facing {
        Facing::Left => sprites.player_left,
        Facing::Right => sprites.player_right,
    };
    objects.push((state.player.body, player_sprite));
    if state.bobber.active {
        objects.push((state.bobber.body, sprites.bobber));
    }
    objects.extend(state.foliage.iter().map(|foliage| {
        let sprite = match foliage.kind {
            FoliageKind::Grass => sprites.grass,
            FoliageKind::Tree => sprites.tree,
        };
        (foliage.body, sprite)
    }));

    sort_by_bottom(&mut objects, |(body, _)| body.bottom(&view));
    for (body, sprite) in objects {
        canvas.draw_sprite(sprite, body.top_left(&view), body.size);
    }
}

/// Kind of the scrap under an active bobber, if it has not expired yet.
pub(crate) fn hooked_scrap(state: &IslandState) -> Option<ScrapKind> {
    if !state.bobber.active {
        return None;
    }
    let pos = state.bobber.body.pos;
    let slot = IsometricCoordinate::new(pos.x, pos.y, state.water_level);
    state.scrap.get(slot).map(|scrap| scrap.kind)
}

/// Ground cell under the player, for the debug title.
pub(crate) fn player_cell(state: &IslandState) -> IsometricCoordinate {
    state.player.body.pos.lattice()
}
