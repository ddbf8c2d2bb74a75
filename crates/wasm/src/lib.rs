//! WASM bridge: one loupe session behind a static slot, driven by the host
//! page. Frames come in as raw RGBA pushes, store updates and alarm calls
//! go out as drained JSON queues — the bridge itself holds no policy.

use std::sync::{Arc, Mutex};

use serde::Serialize;
use wasm_bindgen::prelude::*;

use loupe_core::capture::{CaptureError, FrameSource};
use loupe_core::frame::RawFrame;
use loupe_core::inactivity::AlarmScheduler;
use loupe_core::session::{LoupeSession, SessionConfig, SessionEvent, StoreSink};
use loupe_core::trigger::MutationKind;
use loupe_protocol::{Point, StoreUpdate};

static SESSION: Mutex<Option<Bridge>> = Mutex::new(None);

type SharedFrame = Arc<Mutex<Option<RawFrame>>>;
type SharedUpdates = Arc<Mutex<Vec<StoreUpdate>>>;
type SharedAlarmOps = Arc<Mutex<Vec<AlarmOp>>>;

struct Bridge {
    session: LoupeSession,
    frame: SharedFrame,
    updates: SharedUpdates,
    alarm_ops: SharedAlarmOps,
}

/// Frame source backed by host pushes: the page grabs a frame from the
/// platform stream and hands the decoded RGBA in before ticking.
struct PushedFrameSource {
    frame: SharedFrame,
}

impl FrameSource for PushedFrameSource {
    fn open(&mut self) -> Result<(), CaptureError> {
        Ok(())
    }

    fn grab(&mut self) -> Result<RawFrame, CaptureError> {
        self.frame
            .lock()
            .map_err(|_| CaptureError::GrabFailed("frame slot poisoned".into()))?
            .take()
            .ok_or_else(|| CaptureError::GrabFailed("no frame delivered".into()))
    }

    fn close(&mut self) {}
}

struct QueueSink {
    updates: SharedUpdates,
}

impl StoreSink for QueueSink {
    fn push(&mut self, update: StoreUpdate) {
        if let Ok(mut q) = self.updates.lock() {
            q.push(update);
        }
    }
}

/// One platform alarm call for the host to forward to `chrome.alarms`.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "op", rename_all = "camelCase")]
enum AlarmOp {
    Schedule { name: String, delay_minutes: f64 },
    Clear { name: String },
}

struct QueueScheduler {
    ops: SharedAlarmOps,
}

impl AlarmScheduler for QueueScheduler {
    fn schedule(&mut self, name: &str, delay_minutes: f64) {
        if let Ok(mut q) = self.ops.lock() {
            q.push(AlarmOp::Schedule {
                name: name.to_string(),
                delay_minutes,
            });
        }
    }

    fn clear(&mut self, name: &str) {
        if let Ok(mut q) = self.ops.lock() {
            q.push(AlarmOp::Clear {
                name: name.to_string(),
            });
        }
    }
}

fn with_session<T>(f: impl FnOnce(&mut Bridge) -> Result<T, JsError>) -> Result<T, JsError> {
    let mut slot = SESSION
        .lock()
        .map_err(|_| JsError::new("session slot poisoned"))?;
    let bridge = slot
        .as_mut()
        .ok_or_else(|| JsError::new("no active session"))?;
    f(bridge)
}

/// Create the session from a JSON [`SessionConfig`]. Replaces any previous
/// session after closing it.
#[wasm_bindgen]
pub fn create_session(config_json: &str) -> Result<(), JsError> {
    let config: SessionConfig =
        serde_json::from_str(config_json).map_err(|e| JsError::new(&e.to_string()))?;

    let frame: SharedFrame = Arc::new(Mutex::new(None));
    let updates: SharedUpdates = Arc::new(Mutex::new(Vec::new()));
    let alarm_ops: SharedAlarmOps = Arc::new(Mutex::new(Vec::new()));

    let session = LoupeSession::new(
        &config,
        Box::new(PushedFrameSource {
            frame: frame.clone(),
        }),
        Box::new(QueueSink {
            updates: updates.clone(),
        }),
        Box::new(QueueScheduler {
            ops: alarm_ops.clone(),
        }),
    )
    .map_err(|e| JsError::new(&e.to_string()))?;

    let mut slot = SESSION
        .lock()
        .map_err(|_| JsError::new("session slot poisoned"))?;
    if let Some(mut old) = slot.take() {
        old.session.close();
    }
    *slot = Some(Bridge {
        session,
        frame,
        updates,
        alarm_ops,
    });
    Ok(())
}

/// Close and drop the active session.
#[wasm_bindgen]
pub fn destroy_session() -> Result<(), JsError> {
    let mut slot = SESSION
        .lock()
        .map_err(|_| JsError::new("session slot poisoned"))?;
    if let Some(mut bridge) = slot.take() {
        bridge.session.close();
    }
    Ok(())
}

#[wasm_bindgen]
pub fn activate(now: f64) -> Result<(), JsError> {
    with_session(|b| {
        b.session.activate(now);
        Ok(())
    })
}

/// Deliver one decoded RGBA frame from the platform grab.
#[wasm_bindgen]
pub fn push_frame(width: u32, height: u32, data: &[u8]) -> Result<(), JsError> {
    if width == 0 || height == 0 {
        return Err(JsError::new("frame dimensions must be non-zero"));
    }
    if data.len() != (width as usize) * (height as usize) * 4 {
        return Err(JsError::new("frame byte length does not match dimensions"));
    }
    with_session(|b| {
        if let Ok(mut slot) = b.frame.lock() {
            *slot = Some(RawFrame::new(width, height, data.to_vec()));
        }
        Ok(())
    })
}

#[wasm_bindgen]
pub fn pointer_down(x: f64, y: f64, on_handle: bool, now: f64) -> Result<(), JsError> {
    with_session(|b| {
        b.session.pointer_down(Point::new(x, y), on_handle, now);
        Ok(())
    })
}

#[wasm_bindgen]
pub fn pointer_move(x: f64, y: f64) -> Result<(), JsError> {
    with_session(|b| {
        b.session.pointer_move(Point::new(x, y));
        Ok(())
    })
}

#[wasm_bindgen]
pub fn pointer_up(now: f64) -> Result<(), JsError> {
    with_session(|b| {
        b.session.pointer_up(now);
        Ok(())
    })
}

#[wasm_bindgen]
pub fn set_zoom(zoom: f64, now: f64) -> Result<(), JsError> {
    with_session(|b| {
        b.session.set_zoom(zoom, now);
        Ok(())
    })
}

#[wasm_bindgen]
pub fn set_grid(on: bool) -> Result<(), JsError> {
    with_session(|b| {
        b.session.set_grid(on);
        Ok(())
    })
}

#[wasm_bindgen]
pub fn set_fisheye(on: bool) -> Result<(), JsError> {
    with_session(|b| {
        b.session.set_fisheye(on);
        Ok(())
    })
}

#[wasm_bindgen]
pub fn refresh(now: f64) -> Result<(), JsError> {
    with_session(|b| {
        b.session.refresh(now);
        Ok(())
    })
}

#[wasm_bindgen]
pub fn record_scroll(delta_px: f64, now: f64) -> Result<(), JsError> {
    with_session(|b| {
        b.session.record_scroll(delta_px, now);
        Ok(())
    })
}

#[wasm_bindgen]
pub fn record_resize(width: f64, height: f64, now: f64) -> Result<(), JsError> {
    with_session(|b| {
        b.session.record_resize(width, height, now);
        Ok(())
    })
}

#[wasm_bindgen]
pub fn record_mutation(kind: &str, now: f64) -> Result<(), JsError> {
    let kind = match kind {
        "nodeAdded" => MutationKind::NodeAdded,
        "nodeRemoved" => MutationKind::NodeRemoved,
        "attributeChanged" => MutationKind::AttributeChanged,
        other => return Err(JsError::new(&format!("unknown mutation kind: {other}"))),
    };
    with_session(|b| {
        b.session.record_mutation(kind, now);
        Ok(())
    })
}

#[wasm_bindgen]
pub fn on_animation_frame() -> Result<(), JsError> {
    with_session(|b| {
        b.session.on_animation_frame();
        Ok(())
    })
}

/// Advance all state machines. Returns the surfaced events as a JSON array
/// of strings (`"recaptured"`, `"inactivityExpired"`).
#[wasm_bindgen]
pub fn tick(now: f64) -> Result<String, JsError> {
    with_session(|b| {
        let events: Vec<&str> = b
            .session
            .tick(now)
            .into_iter()
            .map(|e| match e {
                SessionEvent::Recaptured => "recaptured",
                SessionEvent::InactivityExpired => "inactivityExpired",
            })
            .collect();
        serde_json::to_string(&events).map_err(|e| JsError::new(&e.to_string()))
    })
}

/// The loupe raster as tightly packed RGBA, one byte quadruple per pixel,
/// `viewport_size` square.
#[wasm_bindgen]
pub fn render_output() -> Result<Vec<u8>, JsError> {
    with_session(|b| Ok(b.session.output().data().to_vec()))
}

/// The vector overlay for the current state, as JSON render commands.
#[wasm_bindgen]
pub fn overlay_commands() -> Result<String, JsError> {
    with_session(|b| {
        serde_json::to_string(&b.session.overlay()).map_err(|e| JsError::new(&e.to_string()))
    })
}

/// Drain pending store writes (position, zoom, palettes) as JSON.
#[wasm_bindgen]
pub fn drain_store_updates() -> Result<String, JsError> {
    with_session(|b| {
        let drained: Vec<StoreUpdate> = match b.updates.lock() {
            Ok(mut q) => q.drain(..).collect(),
            Err(_) => Vec::new(),
        };
        serde_json::to_string(&drained).map_err(|e| JsError::new(&e.to_string()))
    })
}

/// Drain pending platform alarm calls as JSON.
#[wasm_bindgen]
pub fn drain_alarm_ops() -> Result<String, JsError> {
    with_session(|b| {
        let drained: Vec<AlarmOp> = match b.alarm_ops.lock() {
            Ok(mut q) => q.drain(..).collect(),
            Err(_) => Vec::new(),
        };
        serde_json::to_string(&drained).map_err(|e| JsError::new(&e.to_string()))
    })
}
