mod classify;
mod config;
mod island;
mod noise_field;
mod tilemap;

pub use classify::TileClassifier;
pub use config::{LatticeBounds, WorldGenConfig};
pub use island::{GenerationError, IslandGenerator, IslandMap, StepLog};
pub use noise_field::NoiseField;
pub use tilemap::{Tile, TileKind, Tilemap};

/// Builds a seeded noise field and grows one island with `config`.
pub fn generate_island(seed: u64, config: &WorldGenConfig) -> Result<IslandMap, GenerationError> {
    let noise = NoiseField::new(seed, config.octaves);
    IslandGenerator::new(&noise, config).generate()
}
