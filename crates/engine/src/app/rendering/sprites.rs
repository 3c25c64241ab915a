use std::path::{Path, PathBuf};

use image::{ImageReader, RgbaImage};
use tracing::info;

use crate::iso::ScreenCoordinate;

use super::{AssetError, AssetProvider, SheetSpec, SpriteHandle, SpriteSize};

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Sprite {
    width: u32,
    height: u32,
    rgba: Vec<u8>,
}

impl Sprite {
    fn from_image(image: &RgbaImage, left: u32, top: u32, width: u32, height: u32) -> Self {
        let mut rgba = Vec::with_capacity(width as usize * height as usize * 4);
        for y in top..top + height {
            for x in left..left + width {
                rgba.extend_from_slice(&image.get_pixel(x, y).0);
            }
        }
        Self {
            width,
            height,
            rgba,
        }
    }
}

/// Sprites cut from sheets under one asset root, addressed by [`SpriteHandle`].
#[derive(Debug, Default)]
pub struct SpriteAtlas {
    asset_root: PathBuf,
    sprites: Vec<Sprite>,
}

impl SpriteAtlas {
    pub fn new(asset_root: impl Into<PathBuf>) -> Self {
        Self {
            asset_root: asset_root.into(),
            sprites: Vec::new(),
        }
    }

    pub fn asset_root(&self) -> &Path {
        &self.asset_root
    }

    pub fn len(&self) -> usize {
        self.sprites.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sprites.is_empty()
    }

    pub(crate) fn get(&self, handle: SpriteHandle) -> Option<&Sprite> {
        self.sprites.get(handle.0)
    }

    /// Cuts `image` per `spec` and stores the cells, returning their handles
    /// in sheet order.
    pub fn insert_sheet(
        &mut self,
        image: &RgbaImage,
        spec: &SheetSpec,
    ) -> Result<Vec<SpriteHandle>, AssetError> {
        let cells = cut_sheet(image, spec)?;
        let first = self.sprites.len();
        self.sprites.extend(cells);
        Ok((first..self.sprites.len()).map(SpriteHandle).collect())
    }
}

impl AssetProvider for SpriteAtlas {
    fn load_sheet(&mut self, spec: &SheetSpec) -> Result<Vec<SpriteHandle>, AssetError> {
        let path = self.asset_root.join(&spec.path);
        let image = load_rgba(&path)?;
        let handles = self.insert_sheet(&image, spec)?;
        info!(
            path = %path.display(),
            cells = handles.len(),
            "sprite_sheet_loaded"
        );
        Ok(handles)
    }
}

fn load_rgba(path: &Path) -> Result<RgbaImage, AssetError> {
    let reader = ImageReader::open(path).map_err(|source| AssetError::Open {
        path: path.to_path_buf(),
        source,
    })?;
    let decoded = reader.decode().map_err(|source| AssetError::Decode {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(decoded.to_rgba8())
}

/// Column-major cut: x outer, y inner.
pub(crate) fn cut_sheet(image: &RgbaImage, spec: &SheetSpec) -> Result<Vec<Sprite>, AssetError> {
    if spec.cell_width == 0 || spec.cell_height == 0 || spec.columns == 0 || spec.rows == 0 {
        return Err(AssetError::EmptyGrid {
            path: spec.path.clone(),
        });
    }
    let needed_width = u64::from(spec.cell_width) * u64::from(spec.columns);
    let needed_height = u64::from(spec.cell_height) * u64::from(spec.rows);
    if u64::from(image.width()) < needed_width || u64::from(image.height()) < needed_height {
        return Err(AssetError::SheetTooSmall {
            path: spec.path.clone(),
            width: image.width(),
            height: image.height(),
            columns: spec.columns,
            rows: spec.rows,
            cell_width: spec.cell_width,
            cell_height: spec.cell_height,
        });
    }

    let mut cells = Vec::with_capacity(spec.cell_count());
    for x in 0..spec.columns {
        for y in 0..spec.rows {
            cells.push(Sprite::from_image(
                image,
                x * spec.cell_width,
                y * spec.cell_height,
                spec.cell_width,
                spec.cell_height,
            ));
        }
    }
    Ok(cells)
}

/// Nearest-neighbour scaled blit into an RGBA frame. Fully transparent
/// source texels are skipped; everything else overwrites the destination.
pub(crate) fn blit_scaled(
    frame: &mut [u8],
    frame_width: u32,
    frame_height: u32,
    sprite: &Sprite,
    top_left: ScreenCoordinate,
    size: SpriteSize,
) {
    if sprite.width == 0 || sprite.height == 0 || frame_width == 0 || frame_height == 0 {
        return;
    }
    if !(size.width.is_finite() && size.height.is_finite() && size.width > 0.0 && size.height > 0.0)
    {
        return;
    }
    if !(top_left.x.is_finite() && top_left.y.is_finite()) {
        return;
    }
    let expected_len = sprite.width as usize * sprite.height as usize * 4;
    if sprite.rgba.len() < expected_len || frame.len() < frame_width as usize * frame_height as usize * 4
    {
        return;
    }

    let left = top_left.x.round() as i64;
    let top = top_left.y.round() as i64;
    let dest_width = size.width.round().max(1.0) as i64;
    let dest_height = size.height.round().max(1.0) as i64;
    let scale_x = sprite.width as f64 / dest_width as f64;
    let scale_y = sprite.height as f64 / dest_height as f64;

    let draw_left = left.max(0);
    let draw_top = top.max(0);
    let draw_right = (left + dest_width).min(i64::from(frame_width));
    let draw_bottom = (top + dest_height).min(i64::from(frame_height));
    if draw_left >= draw_right || draw_top >= draw_bottom {
        return;
    }

    let frame_stride = frame_width as usize * 4;
    let sprite_stride = sprite.width as usize * 4;
    for out_y in draw_top..draw_bottom {
        let src_y = (((out_y - top) as f64) * scale_y).floor() as usize;
        let src_y = src_y.min(sprite.height as usize - 1);
        let src_row = src_y * sprite_stride;
        let dst_row = out_y as usize * frame_stride;
        for out_x in draw_left..draw_right {
            let src_x = (((out_x - left) as f64) * scale_x).floor() as usize;
            let src_x = src_x.min(sprite.width as usize - 1);
            let src = src_row + src_x * 4;
            if sprite.rgba[src + 3] == 0 {
                continue;
            }
            let dst = dst_row + out_x as usize * 4;
            frame[dst..dst + 4].copy_from_slice(&sprite.rgba[src..src + 4]);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;
    use tempfile::TempDir;

    const RED: [u8; 4] = [255, 0, 0, 255];
    const CLEAR: [u8; 4] = [0, 0, 0, 0];

    /// 2 columns x 3 rows of 2x2 cells, each filled with a colour encoding its
    /// grid position.
    fn grid_image() -> RgbaImage {
        RgbaImage::from_fn(4, 6, |x, y| Rgba([(x / 2) as u8, (y / 2) as u8, 7, 255]))
    }

    fn grid_spec() -> SheetSpec {
        SheetSpec {
            path: PathBuf::from("grid.png"),
            cell_width: 2,
            cell_height: 2,
            columns: 2,
            rows: 3,
        }
    }

    fn pixel(frame: &[u8], width: u32, x: u32, y: u32) -> [u8; 4] {
        let offset = ((y * width + x) * 4) as usize;
        [
            frame[offset],
            frame[offset + 1],
            frame[offset + 2],
            frame[offset + 3],
        ]
    }

    fn solid(width: u32, height: u32, color: [u8; 4]) -> Sprite {
        Sprite {
            width,
            height,
            rgba: color.repeat((width * height) as usize),
        }
    }

    #[test]
    fn sheet_cells_are_cut_column_major() {
        let cells = cut_sheet(&grid_image(), &grid_spec()).expect("cut");
        let origins: Vec<(u8, u8)> = cells.iter().map(|cell| (cell.rgba[0], cell.rgba[1])).collect();
        assert_eq!(
            origins,
            vec![(0, 0), (0, 1), (0, 2), (1, 0), (1, 1), (1, 2)]
        );
        assert!(cells.iter().all(|cell| cell.width == 2 && cell.height == 2));
    }

    #[test]
    fn undersized_sheet_is_rejected() {
        let mut spec = grid_spec();
        spec.rows = 4;
        let error = cut_sheet(&grid_image(), &spec).expect_err("too small");
        assert!(matches!(error, AssetError::SheetTooSmall { rows: 4, .. }));

        spec.rows = 0;
        assert!(matches!(
            cut_sheet(&grid_image(), &spec),
            Err(AssetError::EmptyGrid { .. })
        ));
    }

    #[test]
    fn atlas_handles_continue_across_sheets() {
        let mut atlas = SpriteAtlas::default();
        let first = atlas.insert_sheet(&grid_image(), &grid_spec()).expect("first");
        let second = atlas.insert_sheet(&grid_image(), &grid_spec()).expect("second");
        assert_eq!(first.first(), Some(&SpriteHandle(0)));
        assert_eq!(second.first(), Some(&SpriteHandle(6)));
        assert_eq!(atlas.len(), 12);
        assert!(atlas.get(SpriteHandle(11)).is_some());
        assert!(atlas.get(SpriteHandle(12)).is_none());
    }

    #[test]
    fn atlas_loads_png_from_asset_root() {
        let dir = TempDir::new().expect("tempdir");
        grid_image()
            .save(dir.path().join("grid.png"))
            .expect("write png");
        let mut atlas = SpriteAtlas::new(dir.path());

        let handles = atlas.load_sheet(&grid_spec()).expect("load");
        assert_eq!(handles.len(), 6);
        let cell = atlas.get(handles[3]).expect("cell");
        assert_eq!(&cell.rgba[..2], &[1, 0]);
    }

    #[test]
    fn missing_sheet_reports_open_error() {
        let dir = TempDir::new().expect("tempdir");
        let mut atlas = SpriteAtlas::new(dir.path());
        let error = atlas.load_sheet(&grid_spec()).expect_err("missing");
        assert!(matches!(error, AssetError::Open { .. }));
    }

    #[test]
    fn blit_scales_with_nearest_neighbour() {
        let sprite = Sprite {
            width: 2,
            height: 1,
            rgba: [RED, [0, 255, 0, 255]].concat(),
        };
        let mut frame = vec![0u8; 8 * 4 * 4];
        blit_scaled(
            &mut frame,
            8,
            4,
            &sprite,
            ScreenCoordinate::new(1.0, 1.0),
            SpriteSize::new(4.0, 2.0),
        );
        assert_eq!(pixel(&frame, 8, 1, 1), RED);
        assert_eq!(pixel(&frame, 8, 2, 2), RED);
        assert_eq!(pixel(&frame, 8, 3, 1), [0, 255, 0, 255]);
        assert_eq!(pixel(&frame, 8, 5, 1), CLEAR);
        assert_eq!(pixel(&frame, 8, 1, 3), CLEAR);
    }

    #[test]
    fn blit_clips_to_frame_and_skips_transparent_texels() {
        let mut frame = vec![9u8; 4 * 4 * 4];
        blit_scaled(
            &mut frame,
            4,
            4,
            &solid(2, 2, RED),
            ScreenCoordinate::new(-1.0, 3.0),
            SpriteSize::square(2.0),
        );
        assert_eq!(pixel(&frame, 4, 0, 3), RED);
        assert_eq!(pixel(&frame, 4, 1, 3), [9, 9, 9, 9]);

        blit_scaled(
            &mut frame,
            4,
            4,
            &solid(1, 1, CLEAR),
            ScreenCoordinate::new(0.0, 0.0),
            SpriteSize::square(4.0),
        );
        assert_eq!(pixel(&frame, 4, 2, 2), [9, 9, 9, 9]);
    }

    #[test]
    fn blit_ignores_offscreen_and_degenerate_requests() {
        let mut frame = vec![0u8; 4 * 4 * 4];
        let sprite = solid(1, 1, RED);
        blit_scaled(&mut frame, 4, 4, &sprite, ScreenCoordinate::new(10.0, 0.0), SpriteSize::square(2.0));
        blit_scaled(&mut frame, 4, 4, &sprite, ScreenCoordinate::new(0.0, 0.0), SpriteSize::square(f64::NAN));
        blit_scaled(&mut frame, 0, 0, &sprite, ScreenCoordinate::new(0.0, 0.0), SpriteSize::square(2.0));
        assert!(frame.iter().all(|byte| *byte == 0));
    }
}
