use std::hash::{Hash, Hasher};

use thiserror::Error;

/// Screen-space image of the world x axis before rotation.
pub const BASE_I: ScreenCoordinate = ScreenCoordinate { x: 1.0, y: 0.5 };
/// Screen-space image of the world y axis before rotation.
pub const BASE_J: ScreenCoordinate = ScreenCoordinate { x: -1.0, y: 0.5 };

const DETERMINANT_EPSILON: f64 = 1e-9;

/// World-space position. `x`/`y` are the ground lattice axes, `z` is elevation.
///
/// Equality and hashing are exact on the bit pattern of each component
/// (with `-0.0` folded into `0.0`), so the type can key hash maps.
#[derive(Debug, Clone, Copy, Default)]
pub struct IsometricCoordinate {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl IsometricCoordinate {
    pub const ORIGIN: Self = Self {
        x: 0.0,
        y: 0.0,
        z: 0.0,
    };

    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// Same ground position with `z` dropped to zero.
    pub fn ground(self) -> Self {
        Self { z: 0.0, ..self }
    }

    /// Nearest lattice cell on the ground plane.
    pub fn lattice(self) -> Self {
        Self {
            x: self.x.round(),
            y: self.y.round(),
            z: 0.0,
        }
    }

    pub fn offset(self, delta: IsometricCoordinate) -> Self {
        Self {
            x: self.x + delta.x,
            y: self.y + delta.y,
            z: self.z + delta.z,
        }
    }

    pub fn ground_length(self) -> f64 {
        self.x.hypot(self.y)
    }

    fn key_bits(self) -> [u64; 3] {
        // Adding +0.0 folds -0.0 into +0.0 and leaves every other value alone.
        [
            (self.x + 0.0).to_bits(),
            (self.y + 0.0).to_bits(),
            (self.z + 0.0).to_bits(),
        ]
    }
}

impl PartialEq for IsometricCoordinate {
    fn eq(&self, other: &Self) -> bool {
        self.key_bits() == other.key_bits()
    }
}

impl Eq for IsometricCoordinate {}

impl Hash for IsometricCoordinate {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.key_bits().hash(state);
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ScreenCoordinate {
    pub x: f64,
    pub y: f64,
}

impl ScreenCoordinate {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    fn rotated(self, radians: f64) -> Self {
        let (sin, cos) = radians.sin_cos();
        Self {
            x: self.x * cos - self.y * sin,
            y: self.x * sin + self.y * cos,
        }
    }
}

/// The 4 lattice neighbors of `p` in the order +x, -x, +y, -y. `z` is kept.
pub fn adjacent(p: IsometricCoordinate) -> [IsometricCoordinate; 4] {
    [
        IsometricCoordinate::new(p.x + 1.0, p.y, p.z),
        IsometricCoordinate::new(p.x - 1.0, p.y, p.z),
        IsometricCoordinate::new(p.x, p.y + 1.0, p.z),
        IsometricCoordinate::new(p.x, p.y - 1.0, p.z),
    ]
}

#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum TransformError {
    #[error("isometric basis is degenerate (determinant {determinant})")]
    DegenerateBasis { determinant: f64 },
}

/// Closed-form inverse of `[[a, b], [c, d]]`, or `None` when singular.
pub fn invert_2x2(a: f64, b: f64, c: f64, d: f64) -> Option<[f64; 4]> {
    let determinant = a * d - b * c;
    if !determinant.is_finite() || determinant.abs() < DETERMINANT_EPSILON {
        return None;
    }
    let inv = determinant.recip();
    Some([inv * d, -inv * b, -inv * c, inv * a])
}

/// Isometric projection: a pair of basis vectors, an optional rotation and
/// the half-tile scale `s`. Screen coordinates are relative to the projected
/// origin; callers add their own screen-centre offset.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IsoProjection {
    base_i: ScreenCoordinate,
    base_j: ScreenCoordinate,
    i: ScreenCoordinate,
    j: ScreenCoordinate,
    rotation_radians: f64,
    half_tile: f64,
}

impl IsoProjection {
    pub fn new(half_tile: f64) -> Self {
        Self::with_basis(BASE_I, BASE_J, half_tile)
    }

    pub fn with_basis(i: ScreenCoordinate, j: ScreenCoordinate, half_tile: f64) -> Self {
        Self {
            base_i: i,
            base_j: j,
            i,
            j,
            rotation_radians: 0.0,
            half_tile,
        }
    }

    pub fn rotated(mut self, radians: f64) -> Self {
        self.set_rotation(radians);
        self
    }

    /// Rotates both basis vectors by `radians`, starting from the unrotated basis.
    pub fn set_rotation(&mut self, radians: f64) {
        self.rotation_radians = radians;
        self.i = self.base_i.rotated(radians);
        self.j = self.base_j.rotated(radians);
    }

    pub fn rotation(&self) -> f64 {
        self.rotation_radians
    }

    pub fn basis(&self) -> (ScreenCoordinate, ScreenCoordinate) {
        (self.i, self.j)
    }

    pub fn half_tile(&self) -> f64 {
        self.half_tile
    }

    pub fn iso_to_screen(&self, p: IsometricCoordinate) -> ScreenCoordinate {
        let s = self.half_tile;
        ScreenCoordinate {
            x: p.x * self.i.x * s + p.y * self.j.x * s,
            y: p.x * self.i.y * s + p.y * self.j.y * s - p.z * s,
        }
    }

    /// Maps a screen point back onto the ground plane. `z` is not recoverable
    /// from a 2D point and is always zero.
    pub fn screen_to_iso(&self, p: ScreenCoordinate) -> Result<IsometricCoordinate, TransformError> {
        let s = self.half_tile;
        let (a, b, c, d) = (self.i.x * s, self.j.x * s, self.i.y * s, self.j.y * s);
        let [inv_a, inv_b, inv_c, inv_d] =
            invert_2x2(a, b, c, d).ok_or(TransformError::DegenerateBasis {
                determinant: a * d - b * c,
            })?;
        Ok(IsometricCoordinate {
            x: p.x * inv_a + p.y * inv_b,
            y: p.x * inv_c + p.y * inv_d,
            z: 0.0,
        })
    }
}
