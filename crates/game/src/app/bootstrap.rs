use engine::{LoopConfig, Scene};
use tracing::info;
use tracing_subscriber::EnvFilter;

use super::config::{clock_seed, ConfigError, ConfigOverrides, GameConfig};
use super::island::IslandScene;
use super::title::TitleScene;

pub(crate) struct AppWiring {
    pub(crate) config: LoopConfig,
    pub(crate) title: Box<dyn Scene>,
    pub(crate) island: Box<dyn Scene>,
}

pub(crate) fn build_app() -> Result<AppWiring, ConfigError> {
    init_tracing();
    info!("=== Magnet Fishing Startup ===");

    let overrides = ConfigOverrides::from_env()?;
    let game = GameConfig::resolve(&overrides, clock_seed)?;
    info!(
        seed = game.seed_or_default(),
        config = ?overrides.config_path,
        asset_root = %game.assets.root.display(),
        "config_resolved"
    );
    Ok(wire(game))
}

fn wire(game: GameConfig) -> AppWiring {
    let config = LoopConfig {
        window_title: game.window_title.clone(),
        max_render_fps: game.max_render_fps,
        asset_root: game.assets.root.clone(),
        ..LoopConfig::default()
    };
    AppWiring {
        config,
        title: Box::new(TitleScene::default()),
        island: Box::new(IslandScene::new(game)),
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_names(true)
        .compact()
        .init();
}
