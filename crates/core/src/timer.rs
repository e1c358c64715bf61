//! Frame timing for the present loop.

use std::time::{Duration, Instant};

/// Measures elapsed time and frame rate across present cycles.
///
/// [`frame`](Self::frame) is called once per presented frame; every time a
/// full reporting interval has elapsed it hands back the average frame rate
/// over that interval.
#[derive(Debug)]
pub struct FrameTimer {
    start: Instant,
    window_start: Instant,
    window_frames: u32,
    report_interval: Duration,
}

impl FrameTimer {
    /// Create a timer that reports once per second.
    pub fn new() -> Self {
        Self::with_interval(Duration::from_secs(1))
    }

    /// Create a timer with a custom reporting interval.
    pub fn with_interval(report_interval: Duration) -> Self {
        let now = Instant::now();
        Self {
            start: now,
            window_start: now,
            window_frames: 0,
            report_interval,
        }
    }

    /// Total time since the timer was created.
    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }

    /// Total time since creation in seconds.
    pub fn elapsed_secs(&self) -> f32 {
        self.elapsed().as_secs_f32()
    }

    /// Counts one frame; returns frames per second once per interval.
    pub fn frame(&mut self) -> Option<f64> {
        self.frame_at(Instant::now())
    }

    fn frame_at(&mut self, now: Instant) -> Option<f64> {
        self.window_frames += 1;
        let window = now.saturating_duration_since(self.window_start);
        if window < self.report_interval {
            return None;
        }

        let fps = f64::from(self.window_frames) / window.as_secs_f64();
        self.window_start = now;
        self.window_frames = 0;
        Some(fps)
    }
}

impl Default for FrameTimer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_report_before_interval() {
        let mut timer = FrameTimer::with_interval(Duration::from_secs(3600));
        for _ in 0..100 {
            assert!(timer.frame().is_none());
        }
    }

    #[test]
    fn test_reports_average_over_interval() {
        let mut timer = FrameTimer::with_interval(Duration::from_secs(1));
        let start = timer.window_start;

        for i in 1..60 {
            assert!(timer.frame_at(start + Duration::from_millis(i * 16)).is_none());
        }
        let fps = timer
            .frame_at(start + Duration::from_secs(2))
            .expect("interval elapsed");
        assert!((fps - 30.0).abs() < f64::EPSILON);

        // The window restarts after a report.
        assert_eq!(timer.window_frames, 0);
        assert!(timer.frame_at(start + Duration::from_millis(2100)).is_none());
    }
}
