use std::collections::HashMap;

use crate::iso::{adjacent, IsometricCoordinate};

use super::LatticeBounds;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TileKind {
    Water,
    Sand,
    Land,
}

impl TileKind {
    pub fn is_walkable(self) -> bool {
        matches!(self, TileKind::Sand | TileKind::Land)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tile {
    kind: TileKind,
    coord: IsometricCoordinate,
    walkable: bool,
}

impl Tile {
    pub fn new(kind: TileKind, coord: IsometricCoordinate) -> Self {
        Self {
            kind,
            coord,
            walkable: kind.is_walkable(),
        }
    }

    pub fn water(x: f64, y: f64, water_level: f64) -> Self {
        Self::new(TileKind::Water, IsometricCoordinate::new(x, y, water_level))
    }

    pub fn kind(&self) -> TileKind {
        self.kind
    }

    pub fn coord(&self) -> IsometricCoordinate {
        self.coord
    }

    pub fn walkable(&self) -> bool {
        self.walkable
    }

    /// True when `point` lies within this tile's unit cell on the ground plane.
    pub fn covers(&self, point: IsometricCoordinate) -> bool {
        (point.x - self.coord.x).abs() <= 0.5 && (point.y - self.coord.y).abs() <= 0.5
    }
}

/// Densified rectangular map plus a ground-cell index for hit-testing.
#[derive(Debug, Clone, Default)]
pub struct Tilemap {
    tiles: Vec<Tile>,
    index: HashMap<IsometricCoordinate, usize>,
}

impl Tilemap {
    pub fn from_tiles(tiles: Vec<Tile>) -> Self {
        let index = tiles
            .iter()
            .enumerate()
            .map(|(position, tile)| (tile.coord.ground(), position))
            .collect();
        Self { tiles, index }
    }

    /// Overlays `accepted` onto `bounds`, filling every uncovered cell with
    /// water at `water_level`. Cells are emitted x-major, then y.
    pub fn densify(accepted: &[Tile], bounds: LatticeBounds, water_level: f64) -> Self {
        let by_cell: HashMap<IsometricCoordinate, &Tile> = accepted
            .iter()
            .map(|tile| (tile.coord.ground(), tile))
            .collect();

        let capacity = bounds.cell_count_u64().min(LatticeBounds::MAX_CELLS) as usize;
        let mut tiles = Vec::with_capacity(capacity);
        for x in bounds.min_x..bounds.max_x {
            for y in bounds.min_y..bounds.max_y {
                let (x, y) = (x as f64, y as f64);
                match by_cell.get(&IsometricCoordinate::new(x, y, 0.0)) {
                    Some(tile) => tiles.push(**tile),
                    None => tiles.push(Tile::water(x, y, water_level)),
                }
            }
        }
        Self::from_tiles(tiles)
    }

    pub fn tiles(&self) -> &[Tile] {
        &self.tiles
    }

    pub fn len(&self) -> usize {
        self.tiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty()
    }

    pub fn tile_at_cell(&self, cell: IsometricCoordinate) -> Option<&Tile> {
        self.index
            .get(&cell.ground())
            .and_then(|position| self.tiles.get(*position))
    }

    /// Tiles whose cell contains `point`. A point on a shared edge can hit two.
    pub fn tiles_at(&self, point: IsometricCoordinate) -> Vec<&Tile> {
        let (fx, fy) = (point.x.floor(), point.y.floor());
        let mut hits = Vec::new();
        for (x, y) in [(fx, fy), (fx + 1.0, fy), (fx, fy + 1.0), (fx + 1.0, fy + 1.0)] {
            if let Some(tile) = self.tile_at_cell(IsometricCoordinate::new(x, y, 0.0)) {
                if tile.covers(point) {
                    hits.push(tile);
                }
            }
        }
        hits
    }

    pub fn walkable_at(&self, point: IsometricCoordinate) -> Option<&Tile> {
        self.tiles_at(point).into_iter().find(|tile| tile.walkable())
    }

    /// Water cells that touch at least one non-water cell.
    pub fn shoreline(&self) -> Vec<IsometricCoordinate> {
        self.tiles
            .iter()
            .filter(|tile| tile.kind == TileKind::Water)
            .filter(|tile| {
                adjacent(tile.coord.ground()).iter().any(|cell| {
                    self.tile_at_cell(*cell)
                        .is_some_and(|neighbor| neighbor.kind != TileKind::Water)
                })
            })
            .map(|tile| tile.coord)
            .collect()
    }
}
