use std::env;
use std::fs;
use std::num::ParseIntError;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use engine::worldgen::WorldGenConfig;
use engine::SheetSpec;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub(crate) const CONFIG_ENV_VAR: &str = "MAGNET_CONFIG";
pub(crate) const SEED_ENV_VAR: &str = "MAGNET_SEED";
pub(crate) const ASSETS_ENV_VAR: &str = "MAGNET_ASSETS";

#[derive(Debug, Error)]
pub(crate) enum ConfigError {
    #[error("failed to read environment variable {var}: {source}")]
    EnvVar {
        var: &'static str,
        #[source]
        source: env::VarError,
    },
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config file {path} at `{field}`: {source}")]
    Parse {
        path: PathBuf,
        field: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("MAGNET_SEED={value} is not a valid u64 seed: {source}")]
    InvalidSeed {
        value: String,
        #[source]
        source: ParseIntError,
    },
    #[error("invalid config value at `{field}`: {reason}")]
    Invalid { field: &'static str, reason: String },
}

/// Sprite sheets and the cells the scenes pick out of them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub(crate) struct AssetConfig {
    pub(crate) root: PathBuf,
    pub(crate) tiles: SheetSpec,
    pub(crate) land_cell: usize,
    pub(crate) water_cell: usize,
    pub(crate) sand_cell: usize,
    pub(crate) player: SheetSpec,
    pub(crate) player_left_cell: usize,
    pub(crate) player_right_cell: usize,
    pub(crate) bobber_cell: usize,
    pub(crate) foliage: SheetSpec,
    pub(crate) grass_cell: usize,
    pub(crate) tree_cell: usize,
}

impl Default for AssetConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("assets"),
            tiles: SheetSpec {
                path: PathBuf::from("tiles/isometric-sandbox-sheet.png"),
                cell_width: 32,
                cell_height: 32,
                columns: 6,
                rows: 9,
            },
            land_cell: 0,
            water_cell: 2,
            sand_cell: 3,
            player: SheetSpec {
                path: PathBuf::from("player/fox.png"),
                cell_width: 32,
                cell_height: 32,
                columns: 3,
                rows: 4,
            },
            player_left_cell: 0,
            player_right_cell: 1,
            bobber_cell: 1,
            foliage: SheetSpec {
                path: PathBuf::from("foliage/trees-16x32.png"),
                cell_width: 16,
                cell_height: 32,
                columns: 4,
                rows: 2,
            },
            grass_cell: 7,
            tree_cell: 1,
        }
    }
}

/// Island-scene tunables. Speeds are per scene update.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub(crate) struct GameplayConfig {
    /// Edge length of one tile sprite in logical pixels.
    pub(crate) tile_size: f64,
    pub(crate) walk_speed: f64,
    pub(crate) camera_max_distance: f64,
    pub(crate) camera_speed: f64,
    pub(crate) rotation_speed: f64,
    pub(crate) player_lift: f64,
    pub(crate) foliage_probability: f64,
    pub(crate) foliage_lift: f64,
    pub(crate) bob_interval_ms: u64,
    pub(crate) bob_offsets: Vec<f64>,
    pub(crate) scrap_spawn_min_secs: u64,
    pub(crate) scrap_spawn_max_secs: u64,
    pub(crate) scrap_life_min_secs: u64,
    pub(crate) scrap_life_max_secs: u64,
    /// Replays island growth step by step after the scene starts.
    pub(crate) reveal_generation: bool,
    pub(crate) reveal_delay_ms: u64,
    pub(crate) reveal_interval_ms: u64,
    /// Phase advance of the water animation per drawn frame.
    pub(crate) water_phase_step: f64,
}

impl Default for GameplayConfig {
    fn default() -> Self {
        let walk_speed = 5.0 / 60.0;
        Self {
            tile_size: (1920 / 7) as f64,
            walk_speed,
            camera_max_distance: 2.0,
            camera_speed: walk_speed,
            rotation_speed: 0.02,
            player_lift: 0.5,
            foliage_probability: 0.5,
            foliage_lift: 1.5,
            bob_interval_ms: 500,
            bob_offsets: vec![-1.0, 0.0, 1.0, 0.0, 0.0, 1.0, 1.0, 2.0, 1.0, 0.0, 0.0, 0.0],
            scrap_spawn_min_secs: 15,
            scrap_spawn_max_secs: 30,
            scrap_life_min_secs: 30,
            scrap_life_max_secs: 60,
            reveal_generation: false,
            reveal_delay_ms: 1500,
            reveal_interval_ms: 20,
            water_phase_step: 0.01,
        }
    }
}

impl GameplayConfig {
    pub(crate) fn bob_interval(&self) -> Duration {
        Duration::from_millis(self.bob_interval_ms)
    }

    pub(crate) fn scrap_spawn_range(&self) -> (Duration, Duration) {
        (
            Duration::from_secs(self.scrap_spawn_min_secs),
            Duration::from_secs(self.scrap_spawn_max_secs),
        )
    }

    pub(crate) fn scrap_life_range(&self) -> (Duration, Duration) {
        (
            Duration::from_secs(self.scrap_life_min_secs),
            Duration::from_secs(self.scrap_life_max_secs),
        )
    }

    pub(crate) fn reveal_delay(&self) -> Duration {
        Duration::from_millis(self.reveal_delay_ms)
    }

    pub(crate) fn reveal_interval(&self) -> Duration {
        Duration::from_millis(self.reveal_interval_ms)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub(crate) struct GameConfig {
    /// `None` derives a seed from the system clock at startup.
    pub(crate) seed: Option<u64>,
    pub(crate) window_title: String,
    pub(crate) max_render_fps: Option<u32>,
    pub(crate) worldgen: WorldGenConfig,
    pub(crate) assets: AssetConfig,
    pub(crate) gameplay: GameplayConfig,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            seed: None,
            window_title: "Magnet Fishing".to_string(),
            max_render_fps: Some(60),
            worldgen: WorldGenConfig::default(),
            assets: AssetConfig::default(),
            gameplay: GameplayConfig::default(),
        }
    }
}

/// Environment inputs, captured once so resolution stays testable.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct ConfigOverrides {
    pub(crate) config_path: Option<PathBuf>,
    pub(crate) seed: Option<String>,
    pub(crate) asset_root: Option<PathBuf>,
}

impl ConfigOverrides {
    pub(crate) fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            config_path: read_env(CONFIG_ENV_VAR)?.map(PathBuf::from),
            seed: read_env(SEED_ENV_VAR)?,
            asset_root: read_env(ASSETS_ENV_VAR)?.map(PathBuf::from),
        })
    }
}

impl GameConfig {
    pub(crate) fn load_from_path(path: &Path) -> Result<Self, ConfigError> {
        let raw = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&raw, path)
    }

    fn parse(raw: &str, path: &Path) -> Result<Self, ConfigError> {
        let mut deserializer = serde_json::Deserializer::from_str(raw);
        serde_path_to_error::deserialize::<_, GameConfig>(&mut deserializer).map_err(|error| {
            let field = error.path().to_string();
            ConfigError::Parse {
                path: path.to_path_buf(),
                field,
                source: error.into_inner(),
            }
        })
    }

    /// File (if any), then env overrides, then a clock seed if none was
    /// given anywhere. The result is validated.
    pub(crate) fn resolve(
        overrides: &ConfigOverrides,
        clock_seed: impl FnOnce() -> u64,
    ) -> Result<Self, ConfigError> {
        let mut config = match &overrides.config_path {
            Some(path) => Self::load_from_path(path)?,
            None => Self::default(),
        };
        if let Some(raw) = &overrides.seed {
            let seed = raw
                .trim()
                .parse::<u64>()
                .map_err(|source| ConfigError::InvalidSeed {
                    value: raw.clone(),
                    source,
                })?;
            config.seed = Some(seed);
        }
        if let Some(root) = &overrides.asset_root {
            config.assets.root = root.clone();
        }
        if config.seed.is_none() {
            config.seed = Some(clock_seed());
        }
        config.validate()?;
        Ok(config)
    }

    pub(crate) fn seed_or_default(&self) -> u64 {
        self.seed.unwrap_or_default()
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let gameplay = &self.gameplay;
        if gameplay.scrap_spawn_min_secs > gameplay.scrap_spawn_max_secs {
            return Err(invalid(
                "gameplay.scrap_spawn_min_secs",
                "must not exceed scrap_spawn_max_secs",
            ));
        }
        if gameplay.scrap_life_min_secs > gameplay.scrap_life_max_secs {
            return Err(invalid(
                "gameplay.scrap_life_min_secs",
                "must not exceed scrap_life_max_secs",
            ));
        }
        if gameplay.bob_interval_ms == 0 {
            return Err(invalid("gameplay.bob_interval_ms", "must be positive"));
        }
        if !(gameplay.tile_size.is_finite() && gameplay.tile_size > 0.0) {
            return Err(invalid("gameplay.tile_size", "must be a positive number"));
        }
        if !(0.0..=1.0).contains(&gameplay.foliage_probability) {
            return Err(invalid("gameplay.foliage_probability", "must lie in [0, 1]"));
        }
        Ok(())
    }
}

fn invalid(field: &'static str, reason: &str) -> ConfigError {
    ConfigError::Invalid {
        field,
        reason: reason.to_string(),
    }
}

fn read_env(var: &'static str) -> Result<Option<String>, ConfigError> {
    match env::var(var) {
        Ok(value) if value.trim().is_empty() => Ok(None),
        Ok(value) => Ok(Some(value)),
        Err(env::VarError::NotPresent) => Ok(None),
        Err(source) => Err(ConfigError::EnvVar { var, source }),
    }
}

pub(crate) fn clock_seed() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_secs())
        .unwrap_or_default()
}
