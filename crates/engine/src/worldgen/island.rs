use std::collections::HashSet;

use thiserror::Error;
use tracing::{debug, info};

use crate::iso::{adjacent, IsometricCoordinate};

use super::classify::TileClassifier;
use super::noise_field::NoiseField;
use super::tilemap::{Tile, Tilemap};
use super::{LatticeBounds, WorldGenConfig};

#[derive(Debug, Clone, PartialEq, Error)]
pub enum GenerationError {
    #[error("invalid world generation config: {reason}")]
    InvalidConfig { reason: String },
    #[error(
        "no island with {min_size} < size < {max_size} found after {attempts} attempts"
    )]
    AttemptsExhausted {
        attempts: u32,
        min_size: usize,
        max_size: usize,
    },
}

/// Append-only record of island growth. Step `k` is the accepted sequence
/// right after its `k + 1`-th tile was accepted.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StepLog {
    accepted: Vec<Tile>,
}

impl StepLog {
    pub fn len(&self) -> usize {
        self.accepted.len()
    }

    pub fn is_empty(&self) -> bool {
        self.accepted.is_empty()
    }

    pub fn step(&self, index: usize) -> Option<&[Tile]> {
        (index < self.accepted.len()).then(|| &self.accepted[..=index])
    }

    pub fn iter(&self) -> impl Iterator<Item = &[Tile]> + '_ {
        (0..self.accepted.len()).map(|index| &self.accepted[..=index])
    }

    /// The fully grown island, in acceptance order.
    pub fn accepted(&self) -> &[Tile] {
        &self.accepted
    }

    fn record(&mut self, tile: Tile) {
        self.accepted.push(tile);
    }
}

#[derive(Debug, Clone)]
pub struct IslandMap {
    pub tilemap: Tilemap,
    /// Ground cell of the highest accepted tile; camera and spawn anchor.
    pub anchor: IsometricCoordinate,
    pub steps: StepLog,
    pub attempts: u32,
    pub jump_offset: f64,
}

impl IslandMap {
    pub fn island(&self) -> &[Tile] {
        self.steps.accepted()
    }
}

enum AttemptOutcome {
    Grown(StepLog),
    Rejected {
        size: usize,
        sampled: usize,
        overshot: bool,
    },
}

/// Frontier-driven flood fill gated by a noise-derived elevation test.
#[derive(Debug)]
pub struct IslandGenerator<'a> {
    noise: &'a NoiseField,
    classifier: TileClassifier,
    config: &'a WorldGenConfig,
}

impl<'a> IslandGenerator<'a> {
    pub fn new(noise: &'a NoiseField, config: &'a WorldGenConfig) -> Self {
        Self {
            noise,
            classifier: TileClassifier::from_config(config),
            config,
        }
    }

    /// Grows islands from a shifted noise domain until one lands strictly
    /// inside the configured size bounds, then densifies it.
    pub fn generate(&self) -> Result<IslandMap, GenerationError> {
        validate(self.config)?;

        let mut jump_offset = 0.0;
        let mut attempts = 0u32;
        loop {
            if let Some(max_attempts) = self.config.max_attempts {
                if attempts >= max_attempts {
                    return Err(GenerationError::AttemptsExhausted {
                        attempts,
                        min_size: self.config.min_size,
                        max_size: self.config.max_size,
                    });
                }
            }
            attempts = attempts.saturating_add(1);

            match self.grow(jump_offset) {
                AttemptOutcome::Grown(steps) => {
                    let anchor = highest_ground_cell(steps.accepted());
                    let tilemap = Tilemap::densify(
                        steps.accepted(),
                        self.config.bounds,
                        self.config.water_level,
                    );
                    info!(
                        seed = self.noise.seed(),
                        island_size = steps.len(),
                        attempts,
                        jump_offset,
                        "island_generated"
                    );
                    return Ok(IslandMap {
                        tilemap,
                        anchor,
                        steps,
                        attempts,
                        jump_offset,
                    });
                }
                AttemptOutcome::Rejected {
                    size,
                    sampled,
                    overshot,
                } => {
                    debug!(
                        attempt = attempts,
                        size,
                        sampled,
                        overshot,
                        jump_offset,
                        "island_rejected"
                    );
                    jump_offset += self.config.jump_step;
                }
            }
        }
    }

    /// One growth attempt over the noise domain shifted by `jump_offset`.
    fn grow(&self, jump_offset: f64) -> AttemptOutcome {
        let config = self.config;
        let mut steps = StepLog::default();
        let mut frontier: Vec<Tile> = Vec::new();
        let mut claimed: HashSet<IsometricCoordinate> = HashSet::new();

        let mut sampled_any = false;
        loop {
            if steps.len() >= config.max_size {
                return AttemptOutcome::Rejected {
                    size: steps.len(),
                    sampled: claimed.len(),
                    overshot: true,
                };
            }
            // A rejected first sample leaves nothing to grow from.
            if sampled_any && frontier.is_empty() {
                break;
            }

            let seed_cell = if frontier.is_empty() {
                IsometricCoordinate::ORIGIN
            } else {
                frontier.sort_by(|a, b| b.coord().z.total_cmp(&a.coord().z));
                frontier[0].coord().ground()
            };
            sampled_any = true;

            let Some(cell) = adjacent(seed_cell)
                .into_iter()
                .find(|cell| !claimed.contains(cell))
            else {
                if !frontier.is_empty() {
                    frontier.remove(0);
                }
                continue;
            };

            claimed.insert(cell);
            let elevation = self.sample_elevation(cell, jump_offset);
            if elevation > config.water_level {
                let coord = IsometricCoordinate::new(
                    cell.x,
                    cell.y,
                    elevation - config.water_level * config.surface_sink,
                );
                let tile = Tile::new(self.classifier.classify_surface(coord.z), coord);
                steps.record(tile);
                frontier.push(tile);
            }
        }

        let size = steps.len();
        if config.min_size < size && size < config.max_size {
            AttemptOutcome::Grown(steps)
        } else {
            AttemptOutcome::Rejected {
                size,
                sampled: claimed.len(),
                overshot: false,
            }
        }
    }

    fn sample_elevation(&self, cell: IsometricCoordinate, jump_offset: f64) -> f64 {
        let scale = self.config.feature_scale;
        let value = self
            .noise
            .noise((cell.x + jump_offset) / scale, (cell.y + jump_offset) / scale);
        value * self.config.amplitude + self.config.water_level
    }
}

fn validate(config: &WorldGenConfig) -> Result<(), GenerationError> {
    let invalid = |reason: String| Err(GenerationError::InvalidConfig { reason });
    if config.min_size.saturating_add(1) >= config.max_size {
        return invalid(format!(
            "no size fits strictly between min_size {} and max_size {}",
            config.min_size, config.max_size
        ));
    }
    if !(config.feature_scale.is_finite() && config.feature_scale > 0.0) {
        return invalid(format!(
            "feature_scale must be positive, got {}",
            config.feature_scale
        ));
    }
    for (name, value) in [
        ("water_level", config.water_level),
        ("amplitude", config.amplitude),
        ("sand_margin", config.sand_margin),
        ("surface_sink", config.surface_sink),
        ("jump_step", config.jump_step),
    ] {
        if !value.is_finite() {
            return invalid(format!("{name} must be finite, got {value}"));
        }
    }
    let cells = config.bounds.cell_count_u64();
    if cells == 0 {
        return invalid("bounds contain no cells".to_string());
    }
    if cells > LatticeBounds::MAX_CELLS {
        return invalid(format!(
            "bounds cover {cells} cells, more than the limit of {}",
            LatticeBounds::MAX_CELLS
        ));
    }
    Ok(())
}

fn highest_ground_cell(tiles: &[Tile]) -> IsometricCoordinate {
    let mut best: Option<&Tile> = None;
    for tile in tiles {
        match best {
            Some(current) if current.coord().z >= tile.coord().z => {}
            _ => best = Some(tile),
        }
    }
    best.map(|tile| tile.coord().ground())
        .unwrap_or(IsometricCoordinate::ORIGIN)
}
