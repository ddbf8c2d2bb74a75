pub mod fisheye;
pub mod overlay;

use log::warn;
use loupe_protocol::{Color, Point, ViewportState};

use crate::frame::{Bitmap, Pixmap};
use crate::geometry::{CropRect, compute_crop_rect};
use fisheye::FisheyeDistorter;

/// Paints the current capture into the fixed-size loupe raster and samples
/// the center pixel.
///
/// Owns the destination pixmap, the intermediate canvas for the fisheye
/// path, and the lazily acquired distorter. Redraws are synchronous and
/// always use whatever bitmap the caller hands in — pipeline state never
/// forces a recapture.
pub struct RenderPipeline {
    viewport_size: u32,
    distortion_supported: bool,
    output: Pixmap,
    scratch: Pixmap,
    distorter: Option<FisheyeDistorter>,
    distorter_probed: bool,
}

impl RenderPipeline {
    pub fn new(viewport_size: u32, distortion_supported: bool) -> Self {
        Self {
            viewport_size,
            distortion_supported,
            output: Pixmap::new(viewport_size, viewport_size),
            scratch: Pixmap::new(viewport_size, viewport_size),
            distorter: None,
            distorter_probed: false,
        }
    }

    pub fn viewport_size(&self) -> u32 {
        self.viewport_size
    }

    /// The loupe raster as of the last render.
    pub fn output(&self) -> &Pixmap {
        &self.output
    }

    /// Redraw the loupe and return the color under its exact center.
    ///
    /// `None` means no capture exists yet — the normal pre-capture state,
    /// not an error; the destination is left untouched.
    pub fn render(
        &mut self,
        bitmap: Option<&Bitmap>,
        state: &ViewportState,
        center: Point,
        window_width: f64,
    ) -> Option<Color> {
        let bitmap = bitmap?;
        let crop = compute_crop_rect(
            center,
            f64::from(bitmap.width()),
            window_width,
            f64::from(self.viewport_size),
            state.zoom(),
        );

        self.output.clear();
        if state.fisheye_on && self.acquire_distorter() {
            self.scratch.clear();
            draw_crop(bitmap, crop, &mut self.scratch);
            if let Some(d) = &self.distorter {
                d.distort(&self.scratch, &mut self.output);
            }
        } else {
            draw_crop(bitmap, crop, &mut self.output);
        }

        self.output.get(self.viewport_size / 2, self.viewport_size / 2)
    }

    /// Lazily acquire the distorter on first use; remember a failed probe so
    /// the fallback stays silent afterwards.
    fn acquire_distorter(&mut self) -> bool {
        if !self.distorter_probed {
            self.distorter_probed = true;
            match FisheyeDistorter::acquire(self.viewport_size, self.distortion_supported) {
                Ok(d) => self.distorter = Some(d),
                Err(e) => warn!("fisheye disabled, drawing direct: {e}"),
            }
        }
        self.distorter.is_some()
    }
}

/// Resample the crop rectangle of `bitmap` into the full target pixmap.
fn draw_crop(bitmap: &Bitmap, crop: CropRect, target: &mut Pixmap) {
    let extent = f64::from(target.width());
    for y in 0..target.height() {
        let sy = crop.y + (f64::from(y) + 0.5) / extent * crop.h;
        for x in 0..target.width() {
            let sx = crop.x + (f64::from(x) + 0.5) / extent * crop.w;
            target.put(x, y, bitmap.sample_bilinear(sx, sy));
        }
    }
}
