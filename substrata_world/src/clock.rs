use std::time::{Duration, Instant};

/// Default latency estimate used before any RTT sample has arrived.
const DEFAULT_ONE_WAY_LATENCY: Duration = Duration::from_millis(200);

/// Estimates the server's global wall-clock time from periodic
/// `TimeSyncMessage` samples, compensating for one-way network latency.
///
/// `getCurrentGlobalTime()` is monotonically non-decreasing in local time
/// between two successive `updateWithGlobalTimeReceived` calls (P5); a step
/// change is only permitted when a new sample implies a more accurate (i.e.
/// later) global time than the current estimate already predicts for "now".
#[derive(Debug, Clone)]
pub struct ClockState {
    last_global_time_received: f64,
    local_time_global_time_received: Instant,
    min_rtt: Option<Duration>,
    has_sample: bool,
}

impl ClockState {
    pub fn new(now: Instant) -> Self {
        Self {
            last_global_time_received: 0.0,
            local_time_global_time_received: now,
            min_rtt: None,
            has_sample: false,
        }
    }

    fn estimated_one_way_latency(&self) -> Duration {
        match self.min_rtt {
            Some(rtt) => rtt / 2,
            None => DEFAULT_ONE_WAY_LATENCY,
        }
    }

    /// Records a new `(server_t, local_recv_time)` sample. Ported from
    /// `WorldState::updateWithGlobalTimeReceived`: the first sample is
    /// always accepted; afterwards a sample is accepted only if it implies
    /// a later global time than what the current estimate already predicts
    /// for `local_recv_time`, i.e. it came in with less latency.
    pub fn update_with_global_time_received(&mut self, server_t: f64, local_recv_time: Instant) {
        if !self.has_sample {
            self.last_global_time_received = server_t;
            self.local_time_global_time_received = local_recv_time;
            self.has_sample = true;
            return;
        }

        let local_time_since_last_rcv =
            local_recv_time.saturating_duration_since(self.local_time_global_time_received).as_secs_f64();
        let cur_estimated_global_time = self.last_global_time_received + local_time_since_last_rcv;

        if server_t > cur_estimated_global_time {
            self.last_global_time_received = server_t;
            self.local_time_global_time_received = local_recv_time;
        }
    }

    pub fn new_round_trip_time_computed(&mut self, rtt: Duration) {
        self.min_rtt = Some(match self.min_rtt {
            Some(existing) => existing.min(rtt),
            None => rtt,
        });
    }

    pub fn current_global_time(&self, now: Instant) -> f64 {
        let elapsed = now
            .saturating_duration_since(self.local_time_global_time_received)
            .as_secs_f64();
        self.last_global_time_received + elapsed + self.estimated_one_way_latency().as_secs_f64()
    }

    pub fn min_rtt(&self) -> Option<Duration> {
        self.min_rtt
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // P5: getCurrentGlobalTime() is non-decreasing over successive calls
    // with no intervening update.
    #[test]
    fn monotone_between_samples_p5() {
        let t0 = Instant::now();
        let mut clock = ClockState::new(t0);
        clock.update_with_global_time_received(1000.0, t0);

        let a = clock.current_global_time(t0 + Duration::from_millis(10));
        let b = clock.current_global_time(t0 + Duration::from_millis(20));
        let c = clock.current_global_time(t0 + Duration::from_millis(20));
        assert!(b >= a);
        assert!(c >= b);
    }

    #[test]
    fn later_sample_advances_estimate() {
        let t0 = Instant::now();
        let mut clock = ClockState::new(t0);
        clock.update_with_global_time_received(1000.0, t0);

        // t=1000.2 at local+5ms implies a global time ahead of what the
        // t=1000.0 sample predicts for local+5ms (1000.005), so it's a
        // more accurate, lower-latency sample and should be accepted.
        clock.update_with_global_time_received(1000.2, t0 + Duration::from_millis(5));
        assert_eq!(clock.last_global_time_received, 1000.2);
    }

    // Regression test for a scheme that went stuck after the first sample:
    // under realistic periodic TimeSync traffic, successive samples land
    // only slightly ahead of the current estimate, and must still be
    // accepted every time (this is the *common* case, not an edge case).
    #[test]
    fn realistic_periodic_samples_keep_advancing() {
        let t0 = Instant::now();
        let mut clock = ClockState::new(t0);
        clock.update_with_global_time_received(1000.0, t0);

        let mut t = t0;
        let mut server_t = 1000.0;
        for _ in 0..10 {
            t += Duration::from_millis(500);
            server_t += 0.5;
            clock.update_with_global_time_received(server_t, t);
            assert_eq!(clock.last_global_time_received, server_t);
        }
    }

    // A sample implying a global time behind the current estimate (e.g. it
    // took an unusually long time in flight) must be rejected, matching the
    // original's plain `t > cur_estimated_global_time` ratchet.
    #[test]
    fn stale_sample_is_rejected() {
        let t0 = Instant::now();
        let mut clock = ClockState::new(t0);
        clock.update_with_global_time_received(1000.0, t0);
        clock.update_with_global_time_received(1000.1, t0 + Duration::from_millis(500));
        assert_eq!(clock.last_global_time_received, 1000.1);

        // Implies cur_estimated_global_time ~= 1000.1 + 0.5 = 1000.6; this
        // sample (1000.3) is behind that and must not replace it.
        clock.update_with_global_time_received(1000.3, t0 + Duration::from_millis(1000));
        assert_eq!(clock.last_global_time_received, 1000.1);
    }

    #[test]
    fn rtt_tracks_minimum() {
        let t0 = Instant::now();
        let mut clock = ClockState::new(t0);
        clock.new_round_trip_time_computed(Duration::from_millis(100));
        clock.new_round_trip_time_computed(Duration::from_millis(40));
        clock.new_round_trip_time_computed(Duration::from_millis(60));
        assert_eq!(clock.min_rtt(), Some(Duration::from_millis(40)));
    }
}
