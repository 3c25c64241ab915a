use std::path::PathBuf;
use std::sync::Arc;

use pixels::{Error, Pixels, SurfaceTexture};
use winit::window::Window;

use crate::iso::ScreenCoordinate;

use super::sprites::blit_scaled;
use super::{
    AssetError, AssetProvider, Canvas, SheetSpec, SpriteAtlas, SpriteHandle, SpriteSize, Viewport,
};

const CLEAR_COLOR: [u8; 4] = [16, 22, 34, 255];

/// Draws into a fixed logical frame that `pixels` scales onto the window
/// surface, so scenes always see the same [`Viewport`].
pub struct Renderer {
    window: Arc<Window>,
    pixels: Pixels<'static>,
    logical: Viewport,
    atlas: SpriteAtlas,
}

impl Renderer {
    pub fn new(window: Arc<Window>, logical: Viewport, asset_root: PathBuf) -> Result<Self, Error> {
        let size = window.inner_size();
        let surface = SurfaceTexture::new(size.width, size.height, Arc::clone(&window));
        let pixels = Pixels::new(logical.width, logical.height, surface)?;
        Ok(Self {
            window,
            pixels,
            logical,
            atlas: SpriteAtlas::new(asset_root),
        })
    }

    pub fn resize(&mut self, width: u32, height: u32) -> Result<(), Error> {
        if width == 0 || height == 0 {
            return Ok(());
        }
        self.pixels
            .resize_surface(width, height)
            .map_err(Error::from)
    }

    pub fn begin_frame(&mut self) {
        for pixel in self.pixels.frame_mut().chunks_exact_mut(4) {
            pixel.copy_from_slice(&CLEAR_COLOR);
        }
    }

    pub fn present(&mut self) -> Result<(), Error> {
        self.window.pre_present_notify();
        self.pixels.render()
    }

    /// Maps a physical window position onto the logical frame, clamping
    /// positions outside the scaled frame to its edge.
    pub fn window_pos_to_pixel(&self, x: f64, y: f64) -> ScreenCoordinate {
        let (px, py) = self
            .pixels
            .window_pos_to_pixel((x as f32, y as f32))
            .unwrap_or_else(|outside| self.pixels.clamp_pixel_pos(outside));
        ScreenCoordinate::new(px as f64, py as f64)
    }
}

impl Canvas for Renderer {
    fn viewport(&self) -> Viewport {
        self.logical
    }

    fn draw_sprite(&mut self, sprite: SpriteHandle, top_left: ScreenCoordinate, size: SpriteSize) {
        let Some(sprite) = self.atlas.get(sprite) else {
            return;
        };
        let Viewport { width, height } = self.logical;
        blit_scaled(self.pixels.frame_mut(), width, height, sprite, top_left, size);
    }
}

impl AssetProvider for Renderer {
    fn load_sheet(&mut self, spec: &SheetSpec) -> Result<Vec<SpriteHandle>, AssetError> {
        self.atlas.load_sheet(spec)
    }
}
