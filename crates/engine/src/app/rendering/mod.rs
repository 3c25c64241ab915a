mod canvas;
mod renderer;
mod sprites;

pub use canvas::{
    sort_by_bottom, AssetError, AssetProvider, Canvas, SheetSpec, SpriteHandle, SpriteSize,
    Viewport,
};
pub use renderer::Renderer;
pub use sprites::SpriteAtlas;
