use serde::{Deserialize, Serialize};

use loupe_protocol::{OverlayCommand, Point, StoreUpdate, ViewportState};

use crate::capture::{CaptureError, CaptureSession, FrameSource};
use crate::drag::DragController;
use crate::frame::Pixmap;
use crate::inactivity::{AlarmScheduler, InactivityTimer};
use crate::palette;
use crate::render::{RenderPipeline, overlay};
use crate::trigger::coordinator::{RecaptureCoordinator, RecaptureReason};
use crate::trigger::{ChangeScoreAccumulator, MutationKind, SourceConfig};

/// Write half of the external reactive store. The engine only ever emits
/// ordered updates; subscriptions and replication live outside.
pub trait StoreSink: Send {
    fn push(&mut self, update: StoreUpdate);
}

/// Everything the host measures or decides before mounting a loupe.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    pub session_id: String,
    /// Edge length of the square (circularly clipped) viewport raster.
    pub viewport_size: u32,
    pub window_width: f64,
    pub window_height: f64,
    /// Handle position restored from the store, if any.
    pub handle_position: Point,
    /// Offset from the handle anchor to the lens center, from the host's
    /// bounding-rect measurement.
    pub handle_center_offset: Point,
    pub zoom: f64,
    /// Host capability probe for the distortion stage.
    pub distortion_supported: bool,
    pub inactivity_timeout_minutes: f64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            session_id: "loupe".to_string(),
            viewport_size: 400,
            window_width: 1280.0,
            window_height: 720.0,
            handle_position: Point::new(40.0, 40.0),
            handle_center_offset: Point::new(200.0, 200.0),
            zoom: 2.0,
            distortion_supported: true,
            inactivity_timeout_minutes: 5.0,
        }
    }
}

/// Things `tick` surfaces to the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEvent {
    /// A new capture bitmap was installed (and the loupe redrawn).
    Recaptured,
    /// The inactivity deadline passed; the host should tear the loupe down.
    InactivityExpired,
}

/// One active loupe: the session-scoped context that owns every moving part.
///
/// All state lives here — accumulators, cooldown, stream, distorter — so a
/// second loupe in another tab is simply a second session. The host drives
/// it with pointer events, event-source feeds, animation-frame ticks, and a
/// periodic `tick(now)`.
pub struct LoupeSession {
    viewport: ViewportState,
    drag: DragController,
    scroll: ChangeScoreAccumulator,
    resize: ChangeScoreAccumulator,
    mutation: ChangeScoreAccumulator,
    coordinator: RecaptureCoordinator,
    capture: CaptureSession,
    pipeline: RenderPipeline,
    timer: InactivityTimer,
    sink: Box<dyn StoreSink>,
    scheduler: Box<dyn AlarmScheduler>,
    window: (f64, f64),
    last_sample_rgb: Option<String>,
}

impl LoupeSession {
    pub fn new(
        config: &SessionConfig,
        source: Box<dyn FrameSource>,
        sink: Box<dyn StoreSink>,
        scheduler: Box<dyn AlarmScheduler>,
    ) -> Result<Self, CaptureError> {
        let capture = CaptureSession::open(source)?;
        let drag = DragController::new(config.handle_position, config.handle_center_offset);
        Ok(Self {
            viewport: ViewportState::new(drag.viewport_center(), config.zoom),
            drag,
            scroll: ChangeScoreAccumulator::new(SourceConfig::scroll()),
            resize: ChangeScoreAccumulator::new(SourceConfig::resize()),
            mutation: ChangeScoreAccumulator::new(SourceConfig::mutation()),
            coordinator: RecaptureCoordinator::default(),
            capture,
            pipeline: RenderPipeline::new(config.viewport_size, config.distortion_supported),
            timer: InactivityTimer::new(&config.session_id, config.inactivity_timeout_minutes),
            sink,
            scheduler,
            window: (config.window_width, config.window_height),
            last_sample_rgb: None,
        })
    }

    /// Arm the first capture and the inactivity alarm. Called once, right
    /// after the host mounts the loupe.
    pub fn activate(&mut self, now: f64) {
        self.timer.touch(now, self.scheduler.as_mut());
        // First frame bypasses the coordinator: there is no cooldown yet.
        let _ = self.capture.request_frame(now);
    }

    pub fn viewport(&self) -> &ViewportState {
        &self.viewport
    }

    /// The loupe raster as of the last redraw.
    pub fn output(&self) -> &Pixmap {
        self.pipeline.output()
    }

    /// The vector overlay matching the current state.
    pub fn overlay(&self) -> Vec<OverlayCommand> {
        overlay::overlay_commands(&self.viewport, f64::from(self.pipeline.viewport_size()))
    }

    // --- pointer input -----------------------------------------------------

    pub fn pointer_down(&mut self, at: Point, on_handle: bool, now: f64) {
        if self.drag.pointer_down(at, on_handle) {
            self.timer.touch(now, self.scheduler.as_mut());
        }
    }

    /// Drag moves reposition and redraw against the existing bitmap — they
    /// never capture.
    pub fn pointer_move(&mut self, at: Point) {
        if let Some(center) = self.drag.pointer_move(at) {
            self.viewport.position = center;
            self.redraw();
        }
    }

    pub fn pointer_up(&mut self, now: f64) {
        if let Some(final_pos) = self.drag.pointer_up() {
            self.sink.push(StoreUpdate::LensePosition(final_pos));
            self.request_recapture(RecaptureReason::DragEnd, now);
        }
    }

    // --- user toggles ------------------------------------------------------

    pub fn set_zoom(&mut self, zoom: f64, now: f64) {
        self.viewport.set_zoom(zoom);
        self.sink.push(StoreUpdate::Zoom(self.viewport.zoom()));
        self.redraw();
        self.request_recapture(RecaptureReason::ZoomChanged, now);
    }

    pub fn set_grid(&mut self, on: bool) {
        self.viewport.grid_on = on;
    }

    /// Toggling the lens re-renders from the existing capture; no grab.
    pub fn set_fisheye(&mut self, on: bool) {
        self.viewport.fisheye_on = on;
        self.redraw();
    }

    pub fn refresh(&mut self, now: f64) {
        self.request_recapture(RecaptureReason::ManualRefresh, now);
    }

    // --- change-detection feeds -------------------------------------------

    pub fn record_scroll(&mut self, delta_px: f64, now: f64) {
        self.scroll.record(delta_px.abs(), now);
    }

    pub fn record_resize(&mut self, width: f64, height: f64, now: f64) {
        let delta = (width - self.window.0).abs() + (height - self.window.1).abs();
        self.window = (width, height);
        self.resize.record(delta, now);
    }

    pub fn record_mutation(&mut self, kind: MutationKind, now: f64) {
        self.mutation.record(kind.weight(), now);
    }

    // --- host clock --------------------------------------------------------

    /// One animation-frame tick of the capture settle window.
    pub fn on_animation_frame(&mut self) {
        self.capture.on_animation_frame();
    }

    /// Advance every state machine. Call at animation-frame cadence or a
    /// coarse timer; all scheduling is relative to `now`.
    pub fn tick(&mut self, now: f64) -> Vec<SessionEvent> {
        let mut events = Vec::new();

        if self.scroll.poll(now) {
            self.request_recapture(RecaptureReason::ScrollSettled, now);
        }
        if self.resize.poll(now) {
            self.request_recapture(RecaptureReason::ResizeSettled, now);
        }
        if self.mutation.poll(now) {
            // Wired but policy-disabled inside the coordinator.
            self.request_recapture(RecaptureReason::MutationSettled, now);
        }

        if let Some(Ok(())) = self.capture.tick(now, self.window) {
            self.redraw();
            events.push(SessionEvent::Recaptured);
        }

        if self.timer.poll(now) {
            events.push(SessionEvent::InactivityExpired);
        }
        events
    }

    /// Stop the stream and clear the platform alarm. Idempotent.
    pub fn close(&mut self) {
        self.capture.close();
        self.timer.deactivate(self.scheduler.as_mut());
    }

    // --- internals ---------------------------------------------------------

    fn request_recapture(&mut self, reason: RecaptureReason, now: f64) {
        self.coordinator.request_recapture(
            reason,
            now,
            &mut self.capture,
            &mut self.timer,
            self.scheduler.as_mut(),
        );
    }

    /// Redraw from the last good bitmap and replicate the sample if the
    /// center pixel changed. Unchanged pixels push nothing (idempotence).
    fn redraw(&mut self) {
        let sampled = self.pipeline.render(
            self.capture.bitmap(),
            &self.viewport,
            self.drag.viewport_center(),
            self.window.0,
        );
        let Some(color) = sampled else {
            return;
        };
        let css = color.to_css();
        if self.last_sample_rgb.as_deref() == Some(css.as_str()) {
            return;
        }
        let sample = palette::derive(color);
        self.sink.push(StoreUpdate::HoveredColor(sample.rgb));
        self.sink.push(StoreUpdate::ColorPalette(sample.harmony));
        self.sink.push(StoreUpdate::MaterialPalette(sample.material));
        self.last_sample_rgb = Some(css);
    }
}
