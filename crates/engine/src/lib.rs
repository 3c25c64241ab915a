pub mod app;
pub mod iso;
pub mod worldgen;

pub use app::{
    run_app, run_app_with_metrics, sort_by_bottom, Action, ActionContext, ActionError, ActionId,
    ActionQueue, ActionStatus, AppError, AssetError, AssetProvider, Canvas, ContinuousTimedAction,
    InputAction, InputSnapshot, LoopConfig, LoopMetricsSnapshot, MetricsHandle, Progress,
    Renderer, Scene, SceneCommand, SceneError, SceneKey, SceneStartContext, SheetSpec,
    SpriteAtlas, SpriteHandle, SpriteSize, TimerAction, Viewport,
};
pub use iso::{adjacent, IsoProjection, IsometricCoordinate, ScreenCoordinate, TransformError};
pub use worldgen::{generate_island, GenerationError, IslandMap, Tile, TileKind, Tilemap, WorldGenConfig};
