use thiserror::Error;

use crate::frame::Pixmap;

#[derive(Debug, Error)]
pub enum DistortError {
    /// No distortion capability on this host. The pipeline falls back to the
    /// direct draw — a capability check, not a failure.
    #[error("distortion unavailable")]
    Unavailable,
}

/// Lens curvature coefficients of the barrel polynomial
/// `r' = r · (1 + K1·r² + K2·r⁴)`, tuned for the circular 400×400 viewport.
/// Negative terms compress the rim, magnifying the center.
const LENS_K1: f64 = -0.18;
const LENS_K2: f64 = -0.05;
/// Shrinks the sampled field slightly so the compressed rim never reads
/// outside the source.
const TEXTURE_SCALE: f64 = 0.96;

/// Barrel-distortion post-process stage.
///
/// The remap table — source coordinates for every destination pixel — is the
/// stage's persistent state, built once on `acquire` and reused for every
/// frame of the session. Parameters are fixed; the only runtime choice is
/// whether the stage runs at all.
pub struct FisheyeDistorter {
    size: u32,
    remap: Vec<[f32; 2]>,
}

impl FisheyeDistorter {
    /// Build the remap table for a square viewport of `size` pixels.
    ///
    /// `supported` is the host's capability probe; when it is false the
    /// stage is unavailable and callers draw directly instead.
    pub fn acquire(size: u32, supported: bool) -> Result<Self, DistortError> {
        if !supported || size == 0 {
            return Err(DistortError::Unavailable);
        }

        let mut remap = Vec::with_capacity((size as usize) * (size as usize));
        let extent = f64::from(size);
        for y in 0..size {
            for x in 0..size {
                // Destination pixel center in normalized device coordinates.
                let dx = (f64::from(x) + 0.5) / extent * 2.0 - 1.0;
                let dy = (f64::from(y) + 0.5) / extent * 2.0 - 1.0;
                let r2 = dx * dx + dy * dy;
                let warp = (1.0 + LENS_K1 * r2 + LENS_K2 * r2 * r2) * TEXTURE_SCALE;
                let sx = (dx * warp + 1.0) / 2.0 * extent;
                let sy = (dy * warp + 1.0) / 2.0 * extent;
                remap.push([sx as f32, sy as f32]);
            }
        }
        Ok(Self { size, remap })
    }

    pub fn size(&self) -> u32 {
        self.size
    }

    /// Re-render `src` through the lens into `dst`. Synchronous; both
    /// pixmaps must match the acquired size.
    pub fn distort(&self, src: &Pixmap, dst: &mut Pixmap) {
        debug_assert_eq!(src.width(), self.size);
        debug_assert_eq!(dst.width(), self.size);
        for y in 0..self.size {
            for x in 0..self.size {
                let [sx, sy] = self.remap[(y * self.size + x) as usize];
                dst.put(x, y, src.sample_bilinear(f64::from(sx), f64::from(sy)));
            }
        }
    }
}
