use serde::{Deserialize, Serialize};

use crate::types::{Color, Point};

/// A single, stateless overlay instruction.
///
/// The core emits a `Vec<OverlayCommand>` per redraw for the vector layer
/// drawn above the magnified raster: the circular lens clip, the pixel grid,
/// the center crosshair, and the lens ring. Hosts consume the list
/// sequentially — each command carries all the data it needs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum OverlayCommand {
    /// Restrict subsequent drawing to a circle (the lens aperture).
    SetClipCircle { center: Point, radius: f64 },

    /// Remove the active clip region.
    ClearClip,

    /// Draw a line segment.
    DrawLine {
        from: Point,
        to: Point,
        color: Color,
        width: f64,
    },

    /// Stroke an unfilled circle.
    StrokeCircle {
        center: Point,
        radius: f64,
        color: Color,
        width: f64,
    },

    /// Stroke an unfilled axis-aligned square centered on a point.
    StrokeSquare {
        center: Point,
        size: f64,
        color: Color,
        width: f64,
    },
}
