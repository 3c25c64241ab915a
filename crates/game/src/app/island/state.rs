use std::collections::HashMap;
use std::time::{Duration, Instant};

use engine::iso::{IsoProjection, IsometricCoordinate, ScreenCoordinate};
use engine::worldgen::{IslandMap, LatticeBounds, StepLog, TileKind, Tilemap};
use engine::{InputSnapshot, SpriteSize, Viewport};
use rand::Rng;
use rand_chacha::ChaCha8Rng;
use tracing::info;

use crate::app::config::GameplayConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Facing {
    Left,
    Right,
}

/// Something placed in the world and drawn as one sprite centred on its
/// projected position.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct WorldObject {
    pub(crate) pos: IsometricCoordinate,
    pub(crate) size: SpriteSize,
}

impl WorldObject {
    pub(crate) fn new(pos: IsometricCoordinate, size: SpriteSize) -> Self {
        Self { pos, size }
    }

    pub(crate) fn screen_center(&self, view: &View) -> ScreenCoordinate {
        view.project(self.pos)
    }

    pub(crate) fn top_left(&self, view: &View) -> ScreenCoordinate {
        let center = self.screen_center(view);
        ScreenCoordinate::new(
            center.x - self.size.width * 0.5,
            center.y - self.size.height * 0.5,
        )
    }

    pub(crate) fn bottom(&self, view: &View) -> f64 {
        self.top_left(view).y + self.size.height
    }
}

/// Projection plus camera: everything needed to place a world point on the
/// logical frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct View {
    pub(crate) projection: IsoProjection,
    pub(crate) camera: IsometricCoordinate,
    pub(crate) viewport: Viewport,
}

impl View {
    pub(crate) fn project(&self, pos: IsometricCoordinate) -> ScreenCoordinate {
        let relative = IsometricCoordinate::new(
            pos.x - self.camera.x,
            pos.y - self.camera.y,
            pos.z - self.camera.z,
        );
        let screen = self.projection.iso_to_screen(relative);
        let center = self.viewport.center();
        ScreenCoordinate::new(screen.x + center.x, screen.y + center.y)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Player {
    pub(crate) body: WorldObject,
    pub(crate) facing: Facing,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Bobber {
    pub(crate) body: WorldObject,
    pub(crate) bob_index: usize,
    pub(crate) active: bool,
}

impl Bobber {
    /// Advances one step through `offsets`, wrapping at the end.
    pub(crate) fn bob(&mut self, offsets: &[f64], water_level: f64) {
        if offsets.is_empty() {
            self.body.pos.z = water_level;
            return;
        }
        if self.bob_index >= offsets.len() {
            self.bob_index = 0;
        }
        self.body.pos.z = water_level + offsets[self.bob_index] / 10.0;
        self.bob_index += 1;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum FoliageKind {
    Grass,
    Tree,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Foliage {
    pub(crate) body: WorldObject,
    pub(crate) kind: FoliageKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) enum ScrapKind {
    Scrap,
    Electronics,
    Wire,
}

impl ScrapKind {
    const WEIGHTS: [(ScrapKind, f64); 3] = [
        (ScrapKind::Scrap, 0.5),
        (ScrapKind::Electronics, 0.25),
        (ScrapKind::Wire, 0.25),
    ];

    pub(crate) fn from_roll(roll: f64) -> Self {
        let mut remaining = roll;
        for (kind, weight) in Self::WEIGHTS {
            if remaining < weight {
                return kind;
            }
            remaining -= weight;
        }
        ScrapKind::Wire
    }

    pub(crate) fn random(rng: &mut impl Rng) -> Self {
        Self::from_roll(rng.gen_range(0.0..1.0))
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct Scrap {
    pub(crate) kind: ScrapKind,
    pub(crate) expires_at: Instant,
}

/// Water cells next to the island and what currently floats on them.
#[derive(Debug, Clone, Default)]
pub(crate) struct ScrapField {
    slots: Vec<IsometricCoordinate>,
    occupied: HashMap<IsometricCoordinate, Scrap>,
}

impl ScrapField {
    pub(crate) fn new(slots: Vec<IsometricCoordinate>) -> Self {
        Self {
            slots,
            occupied: HashMap::new(),
        }
    }

    pub(crate) fn slot_count(&self) -> usize {
        self.slots.len()
    }

    pub(crate) fn len(&self) -> usize {
        self.occupied.len()
    }

    pub(crate) fn get(&self, slot: IsometricCoordinate) -> Option<&Scrap> {
        self.occupied.get(&slot)
    }

    pub(crate) fn empty_slots(&self) -> Vec<IsometricCoordinate> {
        self.slots
            .iter()
            .copied()
            .filter(|slot| !self.occupied.contains_key(slot))
            .collect()
    }

    pub(crate) fn clear_expired(&mut self, now: Instant) -> usize {
        let before = self.occupied.len();
        self.occupied.retain(|_, scrap| scrap.expires_at > now);
        before - self.occupied.len()
    }

    pub(crate) fn place(&mut self, slot: IsometricCoordinate, scrap: Scrap) {
        self.occupied.insert(slot, scrap);
    }
}

/// Uniform whole-second duration in `[min, max)`; `min` when the range is
/// shorter than a second.
pub(crate) fn sample_duration(rng: &mut impl Rng, min: Duration, max: Duration) -> Duration {
    let span = max.saturating_sub(min).as_secs();
    if span == 0 {
        return min;
    }
    min + Duration::from_secs(rng.gen_range(0..span))
}

/// Everything the island scene's actions read and mutate.
#[derive(Debug)]
pub(crate) struct IslandState {
    pub(crate) gameplay: GameplayConfig,
    pub(crate) water_level: f64,
    pub(crate) view: View,
    pub(crate) tilemap: Tilemap,
    pub(crate) steps: StepLog,
    pub(crate) bounds: LatticeBounds,
    pub(crate) reveal_step: usize,
    pub(crate) player: Player,
    pub(crate) bobber: Bobber,
    pub(crate) foliage: Vec<Foliage>,
    pub(crate) scrap: ScrapField,
    pub(crate) rng: ChaCha8Rng,
    pub(crate) water_phase: f64,
    pub(crate) input: InputSnapshot,
}

impl IslandState {
    pub(crate) fn new(
        island: IslandMap,
        gameplay: GameplayConfig,
        water_level: f64,
        bounds: LatticeBounds,
        viewport: Viewport,
        mut rng: ChaCha8Rng,
    ) -> Self {
        let tile_size = gameplay.tile_size;
        let projection = IsoProjection::new(tile_size * 0.5);

        let anchor_z = island
            .tilemap
            .tile_at_cell(island.anchor)
            .map(|tile| tile.coord().z)
            .unwrap_or(water_level);
        let player = Player {
            body: WorldObject::new(
                IsometricCoordinate::new(
                    island.anchor.x,
                    island.anchor.y,
                    anchor_z + gameplay.player_lift,
                ),
                SpriteSize::square(tile_size * 0.5),
            ),
            facing: Facing::Right,
        };
        let bobber = Bobber {
            body: WorldObject::new(
                IsometricCoordinate::new(island.anchor.x, island.anchor.y, water_level),
                SpriteSize::square(tile_size * 0.25),
            ),
            bob_index: 0,
            active: false,
        };

        let foliage = scatter_foliage(&island.tilemap, &gameplay, &mut rng);
        let scrap = ScrapField::new(island.tilemap.shoreline());
        info!(
            tiles = island.tilemap.len(),
            island_size = island.steps.len(),
            foliage = foliage.len(),
            scrap_slots = scrap.slot_count(),
            "island_populated"
        );

        Self {
            water_level,
            view: View {
                projection,
                camera: island.anchor.ground(),
                viewport,
            },
            tilemap: island.tilemap,
            steps: island.steps,
            bounds,
            reveal_step: 0,
            player,
            bobber,
            foliage,
            scrap,
            rng,
            water_phase: 0.0,
            input: InputSnapshot::empty(),
            gameplay,
        }
    }
}

fn scatter_foliage(tilemap: &Tilemap, gameplay: &GameplayConfig, rng: &mut ChaCha8Rng) -> Vec<Foliage> {
    let tile_size = gameplay.tile_size;
    let probability = gameplay.foliage_probability.clamp(0.0, 1.0);
    tilemap
        .tiles()
        .iter()
        .filter(|tile| tile.kind() == TileKind::Land)
        .filter_map(|tile| {
            if !rng.gen_bool(probability) {
                return None;
            }
            let kind = if rng.gen_bool(0.5) {
                FoliageKind::Grass
            } else {
                FoliageKind::Tree
            };
            let coord = tile.coord();
            Some(Foliage {
                body: WorldObject::new(
                    IsometricCoordinate::new(coord.x, coord.y, coord.z + gameplay.foliage_lift),
                    SpriteSize::new(tile_size * 0.5, tile_size),
                ),
                kind,
            })
        })
        .collect()
}
