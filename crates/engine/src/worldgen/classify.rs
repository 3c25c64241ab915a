use super::tilemap::TileKind;
use super::WorldGenConfig;

/// Height thresholds for mapping an elevation onto a tile kind.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TileClassifier {
    pub water_level: f64,
    pub sand_margin: f64,
}

impl TileClassifier {
    pub fn from_config(config: &WorldGenConfig) -> Self {
        Self {
            water_level: config.water_level,
            sand_margin: config.sand_margin,
        }
    }

    pub fn classify(&self, height: f64) -> TileKind {
        if !height.is_finite() {
            return TileKind::Water;
        }
        if height < self.water_level * self.sand_margin {
            if height > self.water_level {
                TileKind::Sand
            } else {
                TileKind::Water
            }
        } else {
            TileKind::Land
        }
    }
}

impl TileClassifier {
    /// Kind of an accepted tile's stored surface. Surfaces sunk to or below
    /// the water line still count as shore, so this never yields Water.
    pub fn classify_surface(&self, height: f64) -> TileKind {
        if height < self.water_level * self.sand_margin {
            TileKind::Sand
        } else {
            TileKind::Land
        }
    }
}

impl Default for TileClassifier {
    fn default() -> Self {
        Self::from_config(&WorldGenConfig::default())
    }
}
