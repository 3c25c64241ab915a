mod action;
mod input;
mod loop_runner;
mod metrics;
mod rendering;
mod scene;

pub use action::{
    Action, ActionContext, ActionError, ActionId, ActionQueue, ActionStatus,
    ContinuousTimedAction, Progress, TimerAction,
};
pub use input::{InputAction, InputSnapshot};
pub use loop_runner::{run_app, run_app_with_metrics, AppError, LoopConfig};
pub use metrics::{LoopMetricsSnapshot, MetricsHandle};
pub use rendering::{
    sort_by_bottom, AssetError, AssetProvider, Canvas, Renderer, SheetSpec, SpriteAtlas,
    SpriteHandle, SpriteSize, Viewport,
};
pub use scene::{Scene, SceneCommand, SceneError, SceneKey, SceneStartContext};
