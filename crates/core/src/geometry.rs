use loupe_protocol::Point;

/// The source sub-region of the capture bitmap selected for magnified
/// display, in bitmap pixel space. Recomputed per render, never stored.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CropRect {
    pub x: f64,
    pub y: f64,
    pub w: f64,
    pub h: f64,
}

/// Map the viewport center, zoom, and bitmap-to-window scale to the source
/// crop rectangle.
///
/// `scale = bitmap_width / window_width` — uniform on both axes once the
/// capture borders are cropped away. At zoom 1 the crop is one full
/// pixel-for-pixel tile of `viewport_size * scale` centered on the pointer;
/// doubling the zoom halves the crop, i.e. 2× magnification.
pub fn compute_crop_rect(
    center: Point,
    bitmap_width: f64,
    window_width: f64,
    viewport_size: f64,
    zoom: f64,
) -> CropRect {
    let scale = bitmap_width / window_width;
    let visible = viewport_size / zoom;
    let capture = visible * scale;
    CropRect {
        x: center.x * scale - capture / 2.0,
        y: center.y * scale - capture / 2.0,
        w: capture,
        h: capture,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crop_size_is_viewport_over_zoom_times_scale() {
        let scale = 1920.0 / 1280.0;
        for zoom in [1.0, 1.5, 2.0, 4.0, 8.0, 16.0] {
            let crop = compute_crop_rect(Point::new(640.0, 360.0), 1920.0, 1280.0, 400.0, zoom);
            let expected = 400.0 / zoom * scale;
            assert!((crop.w - expected).abs() < 1e-9);
            assert!((crop.h - expected).abs() < 1e-9);
        }
    }

    #[test]
    fn crop_size_decreases_monotonically_with_zoom() {
        let mut last = f64::INFINITY;
        let mut zoom = 1.0;
        while zoom <= 16.0 {
            let crop = compute_crop_rect(Point::new(100.0, 100.0), 2560.0, 1280.0, 400.0, zoom);
            assert!(crop.w < last);
            last = crop.w;
            zoom += 0.5;
        }
    }

    #[test]
    fn zoom_one_is_pixel_for_pixel_tile_centered_on_pointer() {
        let crop = compute_crop_rect(Point::new(500.0, 300.0), 1280.0, 1280.0, 400.0, 1.0);
        assert_eq!(crop.w, 400.0);
        assert_eq!(crop.x, 500.0 - 200.0);
        assert_eq!(crop.y, 300.0 - 200.0);
    }

    #[test]
    fn horizontal_drag_shifts_origin_by_delta_times_scale() {
        let scale = 1920.0 / 1280.0;
        let a = compute_crop_rect(Point::new(100.0, 100.0), 1920.0, 1280.0, 400.0, 2.0);
        let b = compute_crop_rect(Point::new(300.0, 100.0), 1920.0, 1280.0, 400.0, 2.0);
        assert!((b.x - a.x - 200.0 * scale).abs() < 1e-9);
        assert_eq!(a.y, b.y);
    }
}
