/// The platform alarm API (external collaborator): named delayed callbacks
/// that survive suspension of the hosting background process.
pub trait AlarmScheduler: Send {
    /// Create (or replace) the named alarm.
    fn schedule(&mut self, name: &str, delay_minutes: f64);
    /// Clear the named alarm, if it exists.
    fn clear(&mut self, name: &str);
}

/// How often alarm resets are allowed to reach the platform. Concurrent
/// activity from multiple trigger sources collapses into one reset per
/// window.
const RESET_THROTTLE_MS: f64 = 5_000.0;

/// Activity-reset shutdown timer.
///
/// Tracks an in-engine deadline for deterministic polling and mirrors it to
/// a persistent platform alarm named `inactivity-<session_id>` so the
/// timeout survives process suspension.
pub struct InactivityTimer {
    alarm_name: String,
    timeout_minutes: f64,
    deadline: Option<f64>,
    last_reset_at: Option<f64>,
    expired: bool,
}

impl InactivityTimer {
    pub fn new(session_id: &str, timeout_minutes: f64) -> Self {
        Self {
            alarm_name: format!("inactivity-{session_id}"),
            timeout_minutes,
            deadline: None,
            last_reset_at: None,
            expired: false,
        }
    }

    pub fn alarm_name(&self) -> &str {
        &self.alarm_name
    }

    /// Record activity: push the deadline out and reschedule the platform
    /// alarm, throttled so bursts collapse into one platform call.
    pub fn touch(&mut self, now: f64, scheduler: &mut dyn AlarmScheduler) {
        self.expired = false;
        self.deadline = Some(now + self.timeout_minutes * 60_000.0);
        let throttled = self
            .last_reset_at
            .is_some_and(|t| now - t < RESET_THROTTLE_MS);
        if throttled {
            return;
        }
        self.last_reset_at = Some(now);
        scheduler.schedule(&self.alarm_name, self.timeout_minutes);
    }

    /// Whether the in-engine deadline has passed. Returns `true` once per
    /// expiry; the host reacts by shutting the session down.
    pub fn poll(&mut self, now: f64) -> bool {
        if self.expired {
            return false;
        }
        if self.deadline.is_some_and(|d| now >= d) {
            self.expired = true;
            return true;
        }
        false
    }

    /// Clear the platform alarm on deactivation. Also forgets the throttle
    /// stamp: the next `touch` must reach the platform unconditionally, or
    /// the deadline would be armed with no alarm behind it.
    pub fn deactivate(&mut self, scheduler: &mut dyn AlarmScheduler) {
        self.deadline = None;
        self.last_reset_at = None;
        scheduler.clear(&self.alarm_name);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct RecordingScheduler {
        scheduled: Vec<(String, f64)>,
        cleared: Vec<String>,
    }

    impl AlarmScheduler for RecordingScheduler {
        fn schedule(&mut self, name: &str, delay_minutes: f64) {
            self.scheduled.push((name.to_string(), delay_minutes));
        }

        fn clear(&mut self, name: &str) {
            self.cleared.push(name.to_string());
        }
    }

    #[test]
    fn alarm_name_carries_the_session_id() {
        let timer = InactivityTimer::new("ab12", 5.0);
        assert_eq!(timer.alarm_name(), "inactivity-ab12");
    }

    #[test]
    fn burst_of_touches_schedules_once_per_throttle_window() {
        let mut sched = RecordingScheduler::default();
        let mut timer = InactivityTimer::new("s", 5.0);
        for i in 0..10 {
            timer.touch(f64::from(i) * 100.0, &mut sched);
        }
        assert_eq!(sched.scheduled.len(), 1);
        // Past the throttle window a new reset goes through.
        timer.touch(6_000.0, &mut sched);
        assert_eq!(sched.scheduled.len(), 2);
        assert_eq!(sched.scheduled[0].0, "inactivity-s");
    }

    #[test]
    fn expires_once_after_the_timeout() {
        let mut sched = RecordingScheduler::default();
        let mut timer = InactivityTimer::new("s", 1.0);
        timer.touch(0.0, &mut sched);
        assert!(!timer.poll(59_999.0));
        assert!(timer.poll(60_000.0));
        assert!(!timer.poll(60_001.0));
        // New activity re-arms it.
        timer.touch(70_000.0, &mut sched);
        assert!(timer.poll(140_000.0));
    }

    #[test]
    fn deactivate_clears_the_platform_alarm() {
        let mut sched = RecordingScheduler::default();
        let mut timer = InactivityTimer::new("s", 5.0);
        timer.touch(0.0, &mut sched);
        timer.deactivate(&mut sched);
        assert_eq!(sched.cleared, vec!["inactivity-s".to_string()]);
        assert!(!timer.poll(1e9));
    }

    #[test]
    fn touch_right_after_deactivate_reschedules_unthrottled() {
        let mut sched = RecordingScheduler::default();
        let mut timer = InactivityTimer::new("s", 5.0);
        timer.touch(0.0, &mut sched);
        timer.deactivate(&mut sched);
        // Inside the old throttle window, but the alarm was cleared: the
        // reset must still reach the platform.
        timer.touch(1_000.0, &mut sched);
        assert_eq!(sched.scheduled.len(), 2);
    }
}
