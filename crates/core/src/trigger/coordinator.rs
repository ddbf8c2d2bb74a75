use log::debug;

use crate::capture::CaptureSession;
use crate::inactivity::{AlarmScheduler, InactivityTimer};

/// Minimum interval between two platform captures. Requests inside the
/// window are dropped, never queued — the next qualifying trigger retries.
pub const COOLDOWN_MS: f64 = 600.0;

/// Why a recapture was requested. Drag start/move is deliberately absent:
/// repositioning only redraws against the existing bitmap.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecaptureReason {
    ScrollSettled,
    ResizeSettled,
    MutationSettled,
    ManualRefresh,
    ZoomChanged,
    DragEnd,
}

/// Applies one rule to every trigger source: a recapture is allowed iff no
/// capture is in flight and the global cooldown has elapsed. Successful
/// requests also count as activity for the inactivity timer.
pub struct RecaptureCoordinator {
    /// The mutation accumulator is fully wired but recaptures from it are
    /// switched off. Policy, not dead code — flip to reactivate.
    pub mutation_recapture_enabled: bool,
}

impl Default for RecaptureCoordinator {
    fn default() -> Self {
        Self {
            mutation_recapture_enabled: false,
        }
    }
}

impl RecaptureCoordinator {
    /// Request a recapture. Returns whether a capture was actually armed;
    /// dropped requests are silent (no retry is scheduled).
    pub fn request_recapture(
        &self,
        reason: RecaptureReason,
        now: f64,
        session: &mut CaptureSession,
        timer: &mut InactivityTimer,
        scheduler: &mut dyn AlarmScheduler,
    ) -> bool {
        if reason == RecaptureReason::MutationSettled && !self.mutation_recapture_enabled {
            debug!("recapture({reason:?}) dropped by policy");
            return false;
        }
        if session.busy() {
            debug!("recapture({reason:?}) dropped: capture in flight");
            return false;
        }
        if let Some(last) = session.last_capture_at()
            && now - last < COOLDOWN_MS
        {
            debug!("recapture({reason:?}) dropped: cooldown");
            return false;
        }
        if session.request_frame(now).is_err() {
            return false;
        }
        timer.touch(now, scheduler);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::{CaptureError, FrameSource};
    use crate::frame::RawFrame;

    struct EndlessSource;

    impl FrameSource for EndlessSource {
        fn open(&mut self) -> Result<(), CaptureError> {
            Ok(())
        }

        fn grab(&mut self) -> Result<RawFrame, CaptureError> {
            Ok(RawFrame::new(128, 72, vec![0; 128 * 72 * 4]))
        }

        fn close(&mut self) {}
    }

    struct NoopScheduler;

    impl AlarmScheduler for NoopScheduler {
        fn schedule(&mut self, _name: &str, _delay_minutes: f64) {}
        fn clear(&mut self, _name: &str) {}
    }

    fn fixture() -> (CaptureSession, InactivityTimer, NoopScheduler) {
        let session = CaptureSession::open(Box::new(EndlessSource)).unwrap();
        (session, InactivityTimer::new("t", 5.0), NoopScheduler)
    }

    fn complete_capture(session: &mut CaptureSession, now: f64) {
        session.on_animation_frame();
        session.on_animation_frame();
        assert!(matches!(
            session.tick(now + 60.0, (1280.0, 720.0)),
            Some(Ok(()))
        ));
    }

    #[test]
    fn requests_inside_the_cooldown_are_dropped() {
        let (mut session, mut timer, mut sched) = fixture();
        let coord = RecaptureCoordinator::default();

        assert!(coord.request_recapture(
            RecaptureReason::ManualRefresh,
            0.0,
            &mut session,
            &mut timer,
            &mut sched
        ));
        complete_capture(&mut session, 0.0);

        // 100 ms later: inside the 600 ms cooldown.
        assert!(!coord.request_recapture(
            RecaptureReason::ManualRefresh,
            160.0,
            &mut session,
            &mut timer,
            &mut sched
        ));

        assert!(coord.request_recapture(
            RecaptureReason::ScrollSettled,
            700.0,
            &mut session,
            &mut timer,
            &mut sched
        ));
    }

    #[test]
    fn busy_session_drops_the_request() {
        let (mut session, mut timer, mut sched) = fixture();
        let coord = RecaptureCoordinator::default();
        assert!(coord.request_recapture(
            RecaptureReason::ManualRefresh,
            0.0,
            &mut session,
            &mut timer,
            &mut sched
        ));
        // Still settling.
        assert!(!coord.request_recapture(
            RecaptureReason::DragEnd,
            10.0,
            &mut session,
            &mut timer,
            &mut sched
        ));
    }

    #[test]
    fn mutation_recapture_is_policy_gated() {
        let (mut session, mut timer, mut sched) = fixture();
        let coord = RecaptureCoordinator::default();
        assert!(!coord.request_recapture(
            RecaptureReason::MutationSettled,
            0.0,
            &mut session,
            &mut timer,
            &mut sched
        ));

        let coord = RecaptureCoordinator {
            mutation_recapture_enabled: true,
        };
        assert!(coord.request_recapture(
            RecaptureReason::MutationSettled,
            0.0,
            &mut session,
            &mut timer,
            &mut sched
        ));
    }
}
