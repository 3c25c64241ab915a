use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::iso::ScreenCoordinate;

/// Logical frame size in pixels; independent of the window's physical size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

impl Viewport {
    pub fn center(&self) -> ScreenCoordinate {
        ScreenCoordinate::new(self.width as f64 * 0.5, self.height as f64 * 0.5)
    }
}

/// Opaque index of a loaded sprite.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SpriteHandle(pub usize);

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpriteSize {
    pub width: f64,
    pub height: f64,
}

impl SpriteSize {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    pub fn square(side: f64) -> Self {
        Self::new(side, side)
    }

    pub fn scaled(self, factor: f64) -> Self {
        Self::new(self.width * factor, self.height * factor)
    }
}

pub trait Canvas {
    fn viewport(&self) -> Viewport;

    /// Draws `sprite` stretched to `size` with its top-left corner at
    /// `top_left`. Anything outside the viewport is clipped.
    fn draw_sprite(&mut self, sprite: SpriteHandle, top_left: ScreenCoordinate, size: SpriteSize);
}

/// A grid-cut sprite sheet. Cells are numbered column by column: index
/// `x * rows + y`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SheetSpec {
    pub path: PathBuf,
    pub cell_width: u32,
    pub cell_height: u32,
    pub columns: u32,
    pub rows: u32,
}

impl SheetSpec {
    pub fn cell_count(&self) -> usize {
        self.columns as usize * self.rows as usize
    }

    /// Picks cell `index` out of handles returned by [`AssetProvider::load_sheet`].
    pub fn cell(&self, handles: &[SpriteHandle], index: usize) -> Result<SpriteHandle, AssetError> {
        handles
            .get(index)
            .copied()
            .ok_or_else(|| AssetError::CellOutOfRange {
                path: self.path.clone(),
                index,
                count: handles.len(),
            })
    }
}

#[derive(Debug, Error)]
pub enum AssetError {
    #[error("failed to open sprite sheet {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to decode sprite sheet {path}: {source}")]
    Decode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
    #[error("sprite sheet {path} has zero-sized cells or grid")]
    EmptyGrid { path: PathBuf },
    #[error(
        "sprite sheet {path} is {width}x{height}px, too small for {columns}x{rows} cells of {cell_width}x{cell_height}px"
    )]
    SheetTooSmall {
        path: PathBuf,
        width: u32,
        height: u32,
        columns: u32,
        rows: u32,
        cell_width: u32,
        cell_height: u32,
    },
    #[error("sprite sheet {path} has {count} cells; index {index} is out of range")]
    CellOutOfRange {
        path: PathBuf,
        index: usize,
        count: usize,
    },
}

pub trait AssetProvider {
    fn load_sheet(&mut self, spec: &SheetSpec) -> Result<Vec<SpriteHandle>, AssetError>;
}

/// Stable painter's order: items with a smaller bottom edge are drawn first,
/// ties keep their previous relative order. NaN sorts last.
pub fn sort_by_bottom<T>(items: &mut [T], bottom: impl Fn(&T) -> f64) {
    items.sort_by(|a, b| bottom(a).total_cmp(&bottom(b)));
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spec() -> SheetSpec {
        SheetSpec {
            path: PathBuf::from("sheet.png"),
            cell_width: 8,
            cell_height: 8,
            columns: 2,
            rows: 3,
        }
    }

    #[test]
    fn painter_sort_orders_by_bottom_and_keeps_ties_stable() {
        let mut items = vec![("a", 5.0), ("b", 1.0), ("c", 5.0), ("d", -2.0), ("e", 1.0)];
        sort_by_bottom(&mut items, |item| item.1);
        let order: Vec<&str> = items.iter().map(|item| item.0).collect();
        assert_eq!(order, vec!["d", "b", "e", "a", "c"]);
    }

    #[test]
    fn painter_sort_tolerates_nan_without_panicking() {
        let mut items = vec![2.0, f64::NAN, 1.0];
        sort_by_bottom(&mut items, |value| *value);
        assert_eq!(items.len(), 3);
    }

    #[test]
    fn sheet_cell_lookup_reports_out_of_range() {
        let handles = vec![SpriteHandle(4), SpriteHandle(5)];
        assert_eq!(spec().cell(&handles, 1).expect("cell"), SpriteHandle(5));
        let error = spec().cell(&handles, 6).expect_err("out of range");
        assert!(matches!(
            error,
            AssetError::CellOutOfRange {
                index: 6,
                count: 2,
                ..
            }
        ));
    }

    #[test]
    fn viewport_center_is_half_extent() {
        let viewport = Viewport {
            width: 1920,
            height: 1080,
        };
        assert_eq!(viewport.center(), ScreenCoordinate::new(960.0, 540.0));
        assert_eq!(spec().cell_count(), 6);
    }
}
