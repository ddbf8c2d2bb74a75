use crate::frame::{Bitmap, RawFrame};

/// Which axis of a raw frame carries capture borders.
///
/// The platform capture API pads exactly one axis when the stream's aspect
/// ratio doesn't match the tab window's — never both. That precondition is
/// what makes the symmetric-border crop below valid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BorderAxis {
    /// Aspect ratios match; no borders.
    None,
    /// Bars above and below the content (the frame is taller than the
    /// window's shape, i.e. width-scale < height-scale).
    Vertical,
    /// Bars left and right of the content.
    Horizontal,
}

const ASPECT_EPSILON: f64 = 1e-3;

/// Classify the frame's borders by comparing aspect ratios.
pub fn classify(frame_aspect: f64, window_aspect: f64) -> BorderAxis {
    if (frame_aspect - window_aspect).abs() < ASPECT_EPSILON {
        BorderAxis::None
    } else if frame_aspect < window_aspect {
        BorderAxis::Vertical
    } else {
        BorderAxis::Horizontal
    }
}

/// Crop the platform's letterbox/pillarbox borders off a raw frame,
/// producing the session's capture bitmap.
///
/// The content region is recovered from the window aspect ratio: on the
/// padded axis the content spans `width / window_aspect` (or
/// `height * window_aspect`), the remainder split evenly between the two
/// borders.
pub fn crop_borders(frame: &RawFrame, window_aspect: f64) -> Bitmap {
    if frame.width == 0 || frame.height == 0 {
        return Bitmap::new(frame.width, frame.height, frame.data.clone());
    }
    let (x, y, w, h) = match classify(frame.aspect(), window_aspect) {
        BorderAxis::None => (0, 0, frame.width, frame.height),
        BorderAxis::Vertical => {
            let content_h = f64::from(frame.width) / window_aspect;
            let border = ((f64::from(frame.height) - content_h) / 2.0)
                .round()
                .max(0.0) as u32;
            let h = frame.height.saturating_sub(border * 2).max(1);
            (0, border.min(frame.height - 1), frame.width, h)
        }
        BorderAxis::Horizontal => {
            let content_w = f64::from(frame.height) * window_aspect;
            let border = ((f64::from(frame.width) - content_w) / 2.0)
                .round()
                .max(0.0) as u32;
            let w = frame.width.saturating_sub(border * 2).max(1);
            (border.min(frame.width - 1), 0, w, frame.height)
        }
    };

    let mut data = Vec::with_capacity((w as usize) * (h as usize) * 4);
    let stride = frame.width as usize * 4;
    for row in y..y + h {
        let start = row as usize * stride + x as usize * 4;
        data.extend_from_slice(&frame.data[start..start + w as usize * 4]);
    }
    Bitmap::new(w, h, data)
}
