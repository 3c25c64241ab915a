use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};

/// Loop counters averaged over one metrics interval.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct LoopMetricsSnapshot {
    pub fps: f32,
    /// Scene updates per second; one per rendered frame.
    pub ups: f32,
    pub frame_time_ms: f32,
    pub max_frame_time_ms: f32,
    /// Actions queued in the active scene after its latest update.
    pub queued_actions: usize,
}

impl fmt::Display for LoopMetricsSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:.0} fps | {:.1} ms (max {:.1}) | {} actions",
            self.fps, self.frame_time_ms, self.max_frame_time_ms, self.queued_actions
        )
    }
}

/// Shared view of the latest published snapshot. A panic while publishing
/// leaves the previous value readable.
#[derive(Clone, Debug, Default)]
pub struct MetricsHandle {
    latest: Arc<Mutex<LoopMetricsSnapshot>>,
}

impl MetricsHandle {
    pub fn snapshot(&self) -> LoopMetricsSnapshot {
        *self.latest.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub(crate) fn publish(&self, snapshot: LoopMetricsSnapshot) {
        *self.latest.lock().unwrap_or_else(PoisonError::into_inner) = snapshot;
    }
}

#[derive(Debug, Default)]
struct Window {
    frames: u32,
    updates: u32,
    frame_time_total: Duration,
    frame_time_peak: Duration,
}

#[derive(Debug)]
pub(crate) struct MetricsAccumulator {
    started: Instant,
    interval: Duration,
    window: Window,
    queued_actions: usize,
}

impl MetricsAccumulator {
    pub(crate) fn new(interval: Duration) -> Self {
        Self {
            started: Instant::now(),
            interval,
            window: Window::default(),
            queued_actions: 0,
        }
    }

    pub(crate) fn record_frame(&mut self, frame_dt: Duration) {
        let window = &mut self.window;
        window.frames = window.frames.saturating_add(1);
        window.frame_time_total = window.frame_time_total.saturating_add(frame_dt);
        window.frame_time_peak = window.frame_time_peak.max(frame_dt);
    }

    pub(crate) fn record_update(&mut self, queued_actions: usize) {
        self.window.updates = self.window.updates.saturating_add(1);
        self.queued_actions = queued_actions;
    }

    /// Closes the current window once `interval` has passed.
    pub(crate) fn maybe_snapshot(&mut self, now: Instant) -> Option<LoopMetricsSnapshot> {
        let elapsed = now.saturating_duration_since(self.started);
        if elapsed < self.interval {
            return None;
        }
        let window = std::mem::take(&mut self.window);
        self.started = now;

        let seconds = elapsed.as_secs_f32().max(f32::EPSILON);
        let frame_time_ms = match window.frames {
            0 => 0.0,
            frames => window.frame_time_total.as_secs_f32() * 1000.0 / frames as f32,
        };
        Some(LoopMetricsSnapshot {
            fps: window.frames as f32 / seconds,
            ups: window.updates as f32 / seconds,
            frame_time_ms,
            max_frame_time_ms: window.frame_time_peak.as_secs_f32() * 1000.0,
            queued_actions: self.queued_actions,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::thread;

    use super::*;

    #[test]
    fn averages_frames_over_the_window() {
        let mut accumulator = MetricsAccumulator::new(Duration::from_secs(1));
        let base = accumulator.started;
        for dt in [10, 14, 30] {
            accumulator.record_frame(Duration::from_millis(dt));
            accumulator.record_update(dt as usize);
        }

        assert!(accumulator
            .maybe_snapshot(base + Duration::from_millis(999))
            .is_none());
        let snapshot = accumulator
            .maybe_snapshot(base + Duration::from_secs(1))
            .expect("window closed");
        assert!((snapshot.fps - 3.0).abs() < 1e-3);
        assert!((snapshot.ups - 3.0).abs() < 1e-3);
        assert!((snapshot.frame_time_ms - 18.0).abs() < 1e-3);
        assert!((snapshot.max_frame_time_ms - 30.0).abs() < 1e-3);
        assert_eq!(snapshot.queued_actions, 30);
    }

    #[test]
    fn next_window_starts_empty_but_keeps_queue_depth() {
        let mut accumulator = MetricsAccumulator::new(Duration::from_secs(1));
        let base = accumulator.started;
        accumulator.record_frame(Duration::from_millis(16));
        accumulator.record_update(5);
        let first = base + Duration::from_secs(1);
        accumulator.maybe_snapshot(first).expect("first window");

        let second = accumulator
            .maybe_snapshot(first + Duration::from_secs(2))
            .expect("second window");
        assert_eq!(second.fps, 0.0);
        assert_eq!(second.frame_time_ms, 0.0);
        assert_eq!(second.queued_actions, 5);
    }

    #[test]
    fn handle_survives_a_panicking_writer() {
        let handle = MetricsHandle::default();
        let shared = handle.clone();
        let _ = thread::spawn(move || {
            let _guard = shared.latest.lock().expect("lock");
            panic!("writer died");
        })
        .join();

        let published = LoopMetricsSnapshot {
            fps: 60.0,
            queued_actions: 3,
            ..LoopMetricsSnapshot::default()
        };
        handle.publish(published);
        assert_eq!(handle.snapshot(), published);
    }

    #[test]
    fn display_is_compact() {
        let snapshot = LoopMetricsSnapshot {
            fps: 59.6,
            ups: 59.6,
            frame_time_ms: 16.74,
            max_frame_time_ms: 21.0,
            queued_actions: 4,
        };
        assert_eq!(snapshot.to_string(), "60 fps | 16.7 ms (max 21.0) | 4 actions");
    }
}
