pub mod border;

use log::warn;
use thiserror::Error;

use crate::frame::{Bitmap, RawFrame};

#[derive(Debug, Error)]
pub enum CaptureError {
    /// The stream handle is invalid or permission was denied. Fatal to the
    /// session; surfaced to the host as "capture unavailable".
    #[error("capture stream unavailable")]
    StreamUnavailable,
    /// A capture is already in flight. Dropped silently by callers.
    #[error("capture already in flight")]
    Busy,
    /// The platform grab failed. Transient — the previous bitmap stays live.
    #[error("frame grab failed: {0}")]
    GrabFailed(String),
}

/// The platform capture primitive (external collaborator).
///
/// The host opens the tab's media stream from an opaque stream-id and backs
/// this trait with its frame-grab call; tests inject synthetic sources.
/// The capture session is the sole owner of the source for its lifetime.
pub trait FrameSource: Send {
    /// Bind the underlying stream and obtain its single video track.
    fn open(&mut self) -> Result<(), CaptureError>;

    /// Grab one raw frame. Synchronous from the engine's point of view: the
    /// host performs the platform call before ticking the session.
    fn grab(&mut self) -> Result<RawFrame, CaptureError>;

    /// Stop all tracks and release the handle. Idempotent.
    fn close(&mut self);
}

/// Two animation-frame ticks plus a fixed settle delay let the just-hidden
/// overlay leave the frame before it is grabbed.
const SETTLE_FRAMES: u8 = 2;
const SETTLE_DELAY_MS: f64 = 50.0;

#[derive(Debug, Clone, Copy, PartialEq)]
enum CaptureState {
    Idle,
    Settling { frames_left: u8, ready_at: f64 },
}

/// Owner of the platform stream and the session's capture bitmap.
///
/// Single-flight: a second `request_frame` while one is settling returns
/// [`CaptureError::Busy`]. The bitmap swap on success is atomic — the old
/// `Arc` is replaced only once the new frame is fully cropped — so renders
/// never observe a half-replaced capture.
pub struct CaptureSession {
    source: Box<dyn FrameSource>,
    bitmap: Option<Bitmap>,
    state: CaptureState,
    last_capture_at: Option<f64>,
    closed: bool,
}

impl CaptureSession {
    /// Bind to a platform source. Fails with `StreamUnavailable` when the
    /// handle is invalid or permission was denied.
    pub fn open(mut source: Box<dyn FrameSource>) -> Result<Self, CaptureError> {
        source.open()?;
        Ok(Self {
            source,
            bitmap: None,
            state: CaptureState::Idle,
            last_capture_at: None,
            closed: false,
        })
    }

    /// Whether a capture is currently in flight.
    pub fn busy(&self) -> bool {
        self.state != CaptureState::Idle
    }

    /// Timestamp of the last successful capture, if any.
    pub fn last_capture_at(&self) -> Option<f64> {
        self.last_capture_at
    }

    /// The last good capture. `None` only before the first successful grab.
    pub fn bitmap(&self) -> Option<&Bitmap> {
        self.bitmap.as_ref()
    }

    /// Arm a capture: the grab runs once two animation frames and the settle
    /// delay have elapsed. Returns `Busy` while a capture is in flight.
    pub fn request_frame(&mut self, now: f64) -> Result<(), CaptureError> {
        if self.busy() {
            return Err(CaptureError::Busy);
        }
        self.state = CaptureState::Settling {
            frames_left: SETTLE_FRAMES,
            ready_at: now + SETTLE_DELAY_MS,
        };
        Ok(())
    }

    /// Count down one animation-frame tick of the settle window.
    pub fn on_animation_frame(&mut self) {
        if let CaptureState::Settling { frames_left, .. } = &mut self.state
            && *frames_left > 0
        {
            *frames_left -= 1;
        }
    }

    /// Perform the grab if the settle window has elapsed.
    ///
    /// `window` is the tab's inner size, used to strip the capture API's
    /// letterbox/pillarbox borders. Returns `None` while idle or still
    /// settling. On `GrabFailed` the previous bitmap is left untouched.
    pub fn tick(&mut self, now: f64, window: (f64, f64)) -> Option<Result<(), CaptureError>> {
        let CaptureState::Settling {
            frames_left,
            ready_at,
        } = self.state
        else {
            return None;
        };
        if frames_left > 0 || now < ready_at {
            return None;
        }
        self.state = CaptureState::Idle;

        let raw = match self.source.grab() {
            Ok(raw) => raw,
            Err(e) => {
                warn!("frame grab failed, keeping previous bitmap: {e}");
                return Some(Err(CaptureError::GrabFailed(e.to_string())));
            }
        };

        let window_aspect = if window.1 > 0.0 {
            window.0 / window.1
        } else {
            raw.aspect()
        };
        self.bitmap = Some(border::crop_borders(&raw, window_aspect));
        self.last_capture_at = Some(now);
        Some(Ok(()))
    }

    /// Stop tracks and release the source. Idempotent; never interrupts a
    /// grab (grabs are synchronous once started).
    pub fn close(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;
        self.source.close();
    }
}

impl Drop for CaptureSession {
    fn drop(&mut self) {
        self.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct TestSource {
        frames: Vec<Result<RawFrame, CaptureError>>,
        open_ok: bool,
    }

    impl TestSource {
        fn solid(width: u32, height: u32) -> Self {
            Self {
                frames: vec![],
                open_ok: true,
            }
            .with_frame(width, height)
        }

        fn with_frame(mut self, width: u32, height: u32) -> Self {
            self.frames.push(Ok(RawFrame::new(
                width,
                height,
                vec![127; (width * height * 4) as usize],
            )));
            self
        }
    }

    impl FrameSource for TestSource {
        fn open(&mut self) -> Result<(), CaptureError> {
            if self.open_ok {
                Ok(())
            } else {
                Err(CaptureError::StreamUnavailable)
            }
        }

        fn grab(&mut self) -> Result<RawFrame, CaptureError> {
            if self.frames.is_empty() {
                Err(CaptureError::GrabFailed("no frame".into()))
            } else {
                self.frames.remove(0)
            }
        }

        fn close(&mut self) {}
    }

    fn settle(session: &mut CaptureSession, now: f64) -> Option<Result<(), CaptureError>> {
        session.on_animation_frame();
        session.on_animation_frame();
        session.tick(now + 60.0, (1280.0, 720.0))
    }

    #[test]
    fn open_propagates_stream_unavailable() {
        let source = TestSource {
            frames: vec![],
            open_ok: false,
        };
        assert!(matches!(
            CaptureSession::open(Box::new(source)),
            Err(CaptureError::StreamUnavailable)
        ));
    }

    #[test]
    fn second_request_while_settling_is_busy() {
        let mut s = CaptureSession::open(Box::new(TestSource::solid(1280, 720))).unwrap();
        s.request_frame(0.0).unwrap();
        assert!(matches!(s.request_frame(1.0), Err(CaptureError::Busy)));
    }

    #[test]
    fn grab_waits_for_frames_and_settle_delay() {
        let mut s = CaptureSession::open(Box::new(TestSource::solid(1280, 720))).unwrap();
        s.request_frame(0.0).unwrap();
        // Delay elapsed but no animation frames yet.
        assert!(s.tick(100.0, (1280.0, 720.0)).is_none());
        s.on_animation_frame();
        assert!(s.tick(100.0, (1280.0, 720.0)).is_none());
        s.on_animation_frame();
        // Frames done but delay not yet elapsed.
        assert!(s.tick(10.0, (1280.0, 720.0)).is_none());
        assert!(matches!(s.tick(100.0, (1280.0, 720.0)), Some(Ok(()))));
        assert!(s.bitmap().is_some());
        assert_eq!(s.last_capture_at(), Some(100.0));
    }

    #[test]
    fn failed_grab_keeps_previous_bitmap_and_cooldown() {
        let mut s = CaptureSession::open(Box::new(TestSource::solid(1280, 720))).unwrap();
        s.request_frame(0.0).unwrap();
        assert!(matches!(settle(&mut s, 0.0), Some(Ok(()))));
        let first = s.bitmap().map(Bitmap::width);

        // Source has no second frame: the grab fails.
        s.request_frame(1000.0).unwrap();
        s.on_animation_frame();
        s.on_animation_frame();
        let r = s.tick(1100.0, (1280.0, 720.0));
        assert!(matches!(r, Some(Err(CaptureError::GrabFailed(_)))));
        assert_eq!(s.bitmap().map(Bitmap::width), first);
        assert_eq!(s.last_capture_at(), Some(60.0));
        // Session is usable again.
        assert!(s.request_frame(1200.0).is_ok());
    }
}
