use std::sync::Arc;

use loupe_protocol::Color;

/// A raw frame as delivered by the platform grab, borders and all.
///
/// Tightly packed RGBA8, row-major. Ownership moves into the capture session,
/// which crops it into a [`Bitmap`] and drops it.
#[derive(Debug)]
pub struct RawFrame {
    pub width: u32,
    pub height: u32,
    pub data: Vec<u8>,
}

impl RawFrame {
    pub fn new(width: u32, height: u32, data: Vec<u8>) -> Self {
        debug_assert_eq!(data.len(), (width as usize) * (height as usize) * 4);
        Self {
            width,
            height,
            data,
        }
    }

    /// Aspect ratio width/height, or 0 for a degenerate frame.
    pub fn aspect(&self) -> f64 {
        if self.height == 0 {
            0.0
        } else {
            f64::from(self.width) / f64::from(self.height)
        }
    }
}

/// An immutable decoded capture of the visible tab region.
///
/// Pixels live behind an `Arc` so the swap on recapture is a pointer move:
/// a render that started against the previous bitmap keeps its reference
/// while the session installs the new one. Never mutated in place.
#[derive(Debug, Clone)]
pub struct Bitmap {
    width: u32,
    height: u32,
    data: Arc<[u8]>,
}

impl Bitmap {
    pub fn new(width: u32, height: u32, data: Vec<u8>) -> Self {
        debug_assert_eq!(data.len(), (width as usize) * (height as usize) * 4);
        Self {
            width,
            height,
            data: data.into(),
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Pixel at integer coordinates, clamped to the bitmap edge.
    pub fn pixel_clamped(&self, x: i64, y: i64) -> Color {
        let x = x.clamp(0, i64::from(self.width) - 1) as usize;
        let y = y.clamp(0, i64::from(self.height) - 1) as usize;
        let i = (y * self.width as usize + x) * 4;
        Color::rgb(self.data[i], self.data[i + 1], self.data[i + 2])
    }

    /// Bilinear sample at fractional pixel coordinates, edge-clamped.
    pub fn sample_bilinear(&self, x: f64, y: f64) -> Color {
        let fx = x - 0.5;
        let fy = y - 0.5;
        let x0 = fx.floor();
        let y0 = fy.floor();
        let tx = fx - x0;
        let ty = fy - y0;

        let c00 = self.pixel_clamped(x0 as i64, y0 as i64);
        let c10 = self.pixel_clamped(x0 as i64 + 1, y0 as i64);
        let c01 = self.pixel_clamped(x0 as i64, y0 as i64 + 1);
        let c11 = self.pixel_clamped(x0 as i64 + 1, y0 as i64 + 1);

        let lerp2 = |a: u8, b: u8, c: u8, d: u8| -> u8 {
            let top = f64::from(a) * (1.0 - tx) + f64::from(b) * tx;
            let bottom = f64::from(c) * (1.0 - tx) + f64::from(d) * tx;
            (top * (1.0 - ty) + bottom * ty).round().clamp(0.0, 255.0) as u8
        };

        Color::rgb(
            lerp2(c00.r, c10.r, c01.r, c11.r),
            lerp2(c00.g, c10.g, c01.g, c11.g),
            lerp2(c00.b, c10.b, c01.b, c11.b),
        )
    }
}

/// A mutable RGBA8 render target (the loupe's destination raster and the
/// intermediate canvas handed to the distorter).
#[derive(Debug, Clone)]
pub struct Pixmap {
    width: u32,
    height: u32,
    data: Vec<u8>,
}

impl Pixmap {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            data: vec![0; (width as usize) * (height as usize) * 4],
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn clear(&mut self) {
        self.data.fill(0);
    }

    pub fn put(&mut self, x: u32, y: u32, color: Color) {
        if x >= self.width || y >= self.height {
            return;
        }
        let i = (y as usize * self.width as usize + x as usize) * 4;
        self.data[i] = color.r;
        self.data[i + 1] = color.g;
        self.data[i + 2] = color.b;
        self.data[i + 3] = 255;
    }

    pub fn get(&self, x: u32, y: u32) -> Option<Color> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let i = (y as usize * self.width as usize + x as usize) * 4;
        if self.data[i + 3] == 0 {
            return None;
        }
        Some(Color::rgb(self.data[i], self.data[i + 1], self.data[i + 2]))
    }

    /// Bilinear sample treating the pixmap as a source texture. Transparent
    /// (never-written) texels sample as black.
    pub fn sample_bilinear(&self, x: f64, y: f64) -> Color {
        let fx = x - 0.5;
        let fy = y - 0.5;
        let x0 = fx.floor();
        let y0 = fy.floor();
        let tx = fx - x0;
        let ty = fy - y0;

        let texel = |px: i64, py: i64| -> Color {
            let px = px.clamp(0, i64::from(self.width) - 1) as u32;
            let py = py.clamp(0, i64::from(self.height) - 1) as u32;
            self.get(px, py).unwrap_or(Color::BLACK)
        };

        let c00 = texel(x0 as i64, y0 as i64);
        let c10 = texel(x0 as i64 + 1, y0 as i64);
        let c01 = texel(x0 as i64, y0 as i64 + 1);
        let c11 = texel(x0 as i64 + 1, y0 as i64 + 1);

        let lerp2 = |a: u8, b: u8, c: u8, d: u8| -> u8 {
            let top = f64::from(a) * (1.0 - tx) + f64::from(b) * tx;
            let bottom = f64::from(c) * (1.0 - tx) + f64::from(d) * tx;
            (top * (1.0 - ty) + bottom * ty).round().clamp(0.0, 255.0) as u8
        };

        Color::rgb(
            lerp2(c00.r, c10.r, c01.r, c11.r),
            lerp2(c00.g, c10.g, c01.g, c11.g),
            lerp2(c00.b, c10.b, c01.b, c11.b),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn solid(width: u32, height: u32, color: Color) -> Vec<u8> {
        let mut data = Vec::with_capacity((width * height * 4) as usize);
        for _ in 0..width * height {
            data.extend_from_slice(&[color.r, color.g, color.b, 255]);
        }
        data
    }

    #[test]
    fn bilinear_sample_is_exact_on_solid_color() {
        let bmp = Bitmap::new(8, 8, solid(8, 8, Color::rgb(10, 200, 30)));
        assert_eq!(bmp.sample_bilinear(3.7, 5.2), Color::rgb(10, 200, 30));
    }

    #[test]
    fn bilinear_blends_between_neighbors() {
        // Left half black, right half white, one row.
        let mut data = solid(2, 1, Color::BLACK);
        data[4] = 255;
        data[5] = 255;
        data[6] = 255;
        let bmp = Bitmap::new(2, 1, data);
        // Exactly between the two pixel centers.
        let mid = bmp.sample_bilinear(1.0, 0.5);
        assert_eq!(mid, Color::rgb(128, 128, 128));
    }

    #[test]
    fn pixmap_get_distinguishes_unwritten_texels() {
        let mut pm = Pixmap::new(4, 4);
        assert_eq!(pm.get(1, 1), None);
        pm.put(1, 1, Color::WHITE);
        assert_eq!(pm.get(1, 1), Some(Color::WHITE));
        pm.clear();
        assert_eq!(pm.get(1, 1), None);
    }
}
