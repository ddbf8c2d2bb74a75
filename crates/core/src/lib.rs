//! Capture–transform–render engine for the loupe magnifier.
//!
//! The engine is sans-IO and host-driven: timestamps are `f64` milliseconds
//! supplied by the caller, platform seams (`FrameSource`, `AlarmScheduler`,
//! `StoreSink`) are traits, and every state machine advances through
//! explicit `tick` / event calls. [`session::LoupeSession`] wires the parts
//! together; each part is usable and testable on its own.

pub mod capture;
pub mod drag;
pub mod frame;
pub mod geometry;
pub mod inactivity;
pub mod palette;
pub mod render;
pub mod session;
pub mod trigger;

pub use capture::{CaptureError, CaptureSession, FrameSource};
pub use frame::{Bitmap, Pixmap, RawFrame};
pub use geometry::{CropRect, compute_crop_rect};
pub use session::{LoupeSession, SessionConfig, SessionEvent, StoreSink};
