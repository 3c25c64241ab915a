use serde::{Deserialize, Serialize};

/// Half-open lattice rectangle `[min, max)` on both ground axes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LatticeBounds {
    pub min_x: i32,
    pub max_x: i32,
    pub min_y: i32,
    pub max_y: i32,
}

impl LatticeBounds {
    pub fn centered(half_extent: i32) -> Self {
        Self {
            min_x: -half_extent,
            max_x: half_extent,
            min_y: -half_extent,
            max_y: half_extent,
        }
    }

    /// Generation refuses bounds covering more cells than this.
    pub const MAX_CELLS: u64 = 1 << 22;

    /// Exact cell count; never overflows for any `i32` corners.
    pub fn cell_count_u64(&self) -> u64 {
        let width = (i64::from(self.max_x) - i64::from(self.min_x)).max(0) as u64;
        let height = (i64::from(self.max_y) - i64::from(self.min_y)).max(0) as u64;
        width.saturating_mul(height)
    }

    pub fn cell_count(&self) -> usize {
        usize::try_from(self.cell_count_u64()).unwrap_or(usize::MAX)
    }

    pub fn contains(&self, x: f64, y: f64) -> bool {
        x >= self.min_x as f64 && x < self.max_x as f64 && y >= self.min_y as f64 && y < self.max_y as f64
    }
}

impl Default for LatticeBounds {
    fn default() -> Self {
        Self::centered(50)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldGenConfig {
    /// Accepted islands have strictly more tiles than this.
    pub min_size: usize,
    /// Accepted islands have strictly fewer tiles than this.
    pub max_size: usize,
    pub water_level: f64,
    /// Multiplier applied to noise before it is biased by `water_level`.
    pub amplitude: f64,
    /// Domain divisor applied to lattice coordinates before sampling noise.
    pub feature_scale: f64,
    /// Heights below `water_level * sand_margin` (and above water) are sand.
    pub sand_margin: f64,
    /// Fraction of `water_level` an accepted tile's surface is lowered by.
    pub surface_sink: f64,
    pub octaves: u32,
    /// Noise-domain shift added per failed attempt.
    pub jump_step: f64,
    /// `None` retries forever.
    pub max_attempts: Option<u32>,
    pub bounds: LatticeBounds,
}

impl Default for WorldGenConfig {
    fn default() -> Self {
        Self {
            min_size: 50,
            max_size: 100,
            water_level: 1.0,
            amplitude: 3.0,
            feature_scale: 13.0,
            sand_margin: 1.1,
            surface_sink: 0.2,
            octaves: 3,
            jump_step: 1.0,
            max_attempts: Some(10_000),
            bounds: LatticeBounds::default(),
        }
    }
}
