pub mod coordinator;

/// Event weights for DOM mutation records. Scroll and resize events weigh
/// their own pixel delta instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationKind {
    NodeAdded,
    NodeRemoved,
    AttributeChanged,
}

impl MutationKind {
    pub fn weight(self) -> f64 {
        match self {
            MutationKind::NodeAdded => 2.0,
            MutationKind::NodeRemoved => 1.0,
            MutationKind::AttributeChanged => 2.0,
        }
    }
}

/// Per-source tuning. The three sources differ drastically in event rate and
/// meaning — one mutation may be an unrelated background animation, while a
/// scroll event is always user intent — so each gets its own window and
/// threshold.
#[derive(Debug, Clone, Copy)]
pub struct SourceConfig {
    /// The observed score only updates after this long with no new events.
    pub debounce_ms: f64,
    /// Debounced score that must be exceeded (strictly) to fire.
    pub threshold: f64,
    /// Delay between firing and the score reset, during which the
    /// accumulator cannot fire again.
    pub guard_ms: f64,
}

impl SourceConfig {
    pub fn scroll() -> Self {
        Self {
            debounce_ms: 250.0,
            threshold: 80.0,
            guard_ms: 50.0,
        }
    }

    pub fn resize() -> Self {
        Self {
            debounce_ms: 300.0,
            threshold: 48.0,
            guard_ms: 50.0,
        }
    }

    pub fn mutation() -> Self {
        Self {
            debounce_ms: 500.0,
            threshold: 10.0,
            guard_ms: 50.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum AccumState {
    Idle,
    Accumulating { last_event_at: f64 },
    Firing { reset_at: f64 },
}

/// A debounced, weighted change-score accumulator.
///
/// `record` adds weighted increments; `poll` observes the score through the
/// debounce window and reports a threshold crossing exactly once per
/// accumulation cycle. After firing, the score resets to zero only once the
/// guard delay has elapsed — re-entrant firing while the reset is in flight
/// is impossible by construction.
#[derive(Debug)]
pub struct ChangeScoreAccumulator {
    config: SourceConfig,
    value: f64,
    state: AccumState,
    last_trigger: Option<f64>,
}

impl ChangeScoreAccumulator {
    pub fn new(config: SourceConfig) -> Self {
        Self {
            config,
            value: 0.0,
            state: AccumState::Idle,
            last_trigger: None,
        }
    }

    /// Add a qualifying event's weight. Negative weights are ignored.
    pub fn record(&mut self, weight: f64, now: f64) {
        if weight < 0.0 {
            return;
        }
        self.value += weight;
        match self.state {
            AccumState::Idle | AccumState::Accumulating { .. } => {
                self.state = AccumState::Accumulating { last_event_at: now };
            }
            // The pending reset will wipe this event's contribution; the
            // guard exists exactly to coalesce such trailing events.
            AccumState::Firing { .. } => {}
        }
    }

    /// The externally observable score: the accumulated value once the
    /// debounce window has elapsed with no further events, zero before.
    pub fn debounced_score(&self, now: f64) -> f64 {
        match self.state {
            AccumState::Accumulating { last_event_at }
                if now - last_event_at >= self.config.debounce_ms =>
            {
                self.value
            }
            _ => 0.0,
        }
    }

    /// Timestamp of the most recent threshold crossing.
    pub fn last_trigger(&self) -> Option<f64> {
        self.last_trigger
    }

    /// Advance the state machine. Returns `true` exactly once per threshold
    /// crossing.
    pub fn poll(&mut self, now: f64) -> bool {
        match self.state {
            AccumState::Idle => false,
            AccumState::Accumulating { .. } => {
                if self.debounced_score(now) > self.config.threshold {
                    self.last_trigger = Some(now);
                    self.state = AccumState::Firing {
                        reset_at: now + self.config.guard_ms,
                    };
                    true
                } else {
                    false
                }
            }
            AccumState::Firing { reset_at } => {
                if now >= reset_at {
                    self.value = 0.0;
                    self.state = AccumState::Idle;
                }
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn accum(threshold: f64) -> ChangeScoreAccumulator {
        ChangeScoreAccumulator::new(SourceConfig {
            debounce_ms: 100.0,
            threshold,
            guard_ms: 50.0,
        })
    }

    /// Drive `poll` across a time range, counting fires.
    fn drive(a: &mut ChangeScoreAccumulator, from: f64, to: f64) -> usize {
        let mut fires = 0;
        let mut t = from;
        while t <= to {
            if a.poll(t) {
                fires += 1;
            }
            t += 10.0;
        }
        fires
    }

    #[test]
    fn below_threshold_never_fires() {
        let mut a = accum(10.0);
        for i in 0..9 {
            a.record(1.0, f64::from(i));
        }
        assert_eq!(drive(&mut a, 10.0, 1000.0), 0);
    }

    #[test]
    fn crossing_fires_exactly_once_then_resets() {
        let mut a = accum(10.0);
        for i in 0..9 {
            a.record(1.0, f64::from(i));
        }
        a.record(2.0, 9.0); // 11 > 10
        assert_eq!(drive(&mut a, 10.0, 1000.0), 1);
        assert_eq!(a.debounced_score(1000.0), 0.0);
        assert!(a.last_trigger().is_some());
    }

    #[test]
    fn score_is_hidden_inside_the_debounce_window() {
        let mut a = accum(10.0);
        a.record(50.0, 0.0);
        assert_eq!(a.debounced_score(50.0), 0.0);
        assert_eq!(a.debounced_score(100.0), 50.0);
        // A fresh event reopens the window.
        a.record(1.0, 120.0);
        assert_eq!(a.debounced_score(150.0), 0.0);
        assert_eq!(a.debounced_score(220.0), 51.0);
    }

    #[test]
    fn bursts_coalesce_into_one_observation() {
        let mut a = accum(5.0);
        for i in 0..20 {
            a.record(1.0, f64::from(i) * 10.0);
            // Polling mid-burst never fires: the window hasn't elapsed.
            assert!(!a.poll(f64::from(i) * 10.0 + 5.0));
        }
        assert!(a.poll(300.0));
    }

    #[test]
    fn no_refire_while_reset_is_in_flight() {
        let mut a = accum(5.0);
        a.record(10.0, 0.0);
        assert!(a.poll(100.0));
        // Still within the guard: events land but cannot fire.
        a.record(100.0, 110.0);
        assert!(!a.poll(120.0));
        // Guard elapses, score resets, trailing events are wiped.
        assert!(!a.poll(160.0));
        assert_eq!(a.debounced_score(1000.0), 0.0);
    }

    #[test]
    fn mutation_weights_match_the_record_kinds() {
        assert_eq!(MutationKind::NodeAdded.weight(), 2.0);
        assert_eq!(MutationKind::NodeRemoved.weight(), 1.0);
        assert_eq!(MutationKind::AttributeChanged.weight(), 2.0);
    }
}
