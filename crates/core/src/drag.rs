use loupe_protocol::Point;

#[derive(Debug, Clone, Copy, PartialEq)]
enum DragState {
    Idle,
    Dragging { last: Point },
}

/// Translates pointer drags on the handle into viewport positions.
///
/// While dragging, every move applies the raw client-coordinate delta to the
/// handle and reports the true geometric center of the lens circle — the
/// handle anchor plus the measured center offset — for an immediate redraw.
/// Dragging never captures; only `pointer_up` hands the final position back
/// for persistence.
#[derive(Debug)]
pub struct DragController {
    state: DragState,
    handle: Point,
    /// Offset from the handle anchor to the lens center, as measured by the
    /// host from the mounted element's bounding rect.
    center_offset: Point,
}

impl DragController {
    pub fn new(handle: Point, center_offset: Point) -> Self {
        Self {
            state: DragState::Idle,
            handle,
            center_offset,
        }
    }

    pub fn handle_position(&self) -> Point {
        self.handle
    }

    /// The lens center the render pipeline should track right now.
    pub fn viewport_center(&self) -> Point {
        Point::new(
            self.handle.x + self.center_offset.x,
            self.handle.y + self.center_offset.y,
        )
    }

    pub fn is_dragging(&self) -> bool {
        matches!(self.state, DragState::Dragging { .. })
    }

    /// Re-measure the handle-to-center offset (layout changed).
    pub fn set_center_offset(&mut self, offset: Point) {
        self.center_offset = offset;
    }

    /// Begin a drag. `on_handle` is the host's hit test; presses elsewhere
    /// are ignored. Returns whether a drag started.
    pub fn pointer_down(&mut self, at: Point, on_handle: bool) -> bool {
        if !on_handle || self.is_dragging() {
            return false;
        }
        self.state = DragState::Dragging { last: at };
        true
    }

    /// Apply a move. Returns the new lens center when dragging, `None` when
    /// idle (hover moves don't reposition the loupe).
    pub fn pointer_move(&mut self, at: Point) -> Option<Point> {
        let DragState::Dragging { last } = self.state else {
            return None;
        };
        self.handle.x += at.x - last.x;
        self.handle.y += at.y - last.y;
        self.state = DragState::Dragging { last: at };
        Some(self.viewport_center())
    }

    /// End the drag. Returns the final handle position for persistence.
    pub fn pointer_up(&mut self) -> Option<Point> {
        if !self.is_dragging() {
            return None;
        }
        self.state = DragState::Idle;
        Some(self.handle)
    }
}
