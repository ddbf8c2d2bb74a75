use loupe_protocol::{Color, OverlayCommand, Point, ViewportState};

const GRID_COLOR: Color = Color::rgb(128, 128, 128);
const CROSSHAIR_COLOR: Color = Color::rgb(255, 64, 64);
const RING_COLOR: Color = Color::rgb(32, 32, 32);
const GRID_LINE_WIDTH: f64 = 0.5;
/// Below this zoom one source pixel spans too few device pixels for the
/// grid to read as anything but noise.
const GRID_MIN_ZOOM: f64 = 4.0;

/// Emit the vector overlay for one redraw: circular clip, optional pixel
/// grid, center crosshair, and the lens ring. The host draws these above
/// the magnified raster.
pub fn overlay_commands(state: &ViewportState, viewport_size: f64) -> Vec<OverlayCommand> {
    let center = Point::new(viewport_size / 2.0, viewport_size / 2.0);
    let radius = viewport_size / 2.0;
    let zoom = state.zoom();

    let mut commands = Vec::with_capacity(8 + 2 * (viewport_size / zoom) as usize);
    commands.push(OverlayCommand::SetClipCircle { center, radius });

    // One grid cell per source pixel: cells are `zoom` device pixels wide.
    if state.grid_on && zoom >= GRID_MIN_ZOOM {
        let mut offset = 0.0;
        while offset <= viewport_size {
            commands.push(OverlayCommand::DrawLine {
                from: Point::new(offset, 0.0),
                to: Point::new(offset, viewport_size),
                color: GRID_COLOR,
                width: GRID_LINE_WIDTH,
            });
            commands.push(OverlayCommand::DrawLine {
                from: Point::new(0.0, offset),
                to: Point::new(viewport_size, offset),
                color: GRID_COLOR,
                width: GRID_LINE_WIDTH,
            });
            offset += zoom;
        }
    }

    // The sampled pixel, outlined.
    commands.push(OverlayCommand::StrokeSquare {
        center,
        size: zoom.max(2.0),
        color: CROSSHAIR_COLOR,
        width: 1.0,
    });

    commands.push(OverlayCommand::ClearClip);
    commands.push(OverlayCommand::StrokeCircle {
        center,
        radius: radius - 1.0,
        color: RING_COLOR,
        width: 2.0,
    });

    commands
}
