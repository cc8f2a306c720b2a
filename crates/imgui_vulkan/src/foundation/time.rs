//! Frame timing utilities

use std::time::Instant;

/// High-precision frame timer
///
/// Tracks the elapsed wall-clock time between successive `tick` calls.
/// The first tick reports a delta of zero so callers never see the
/// arbitrary gap between construction and the first frame.
pub struct FrameTimer {
    last_frame: Option<Instant>,
    delta_time: f32,
}

impl Default for FrameTimer {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameTimer {
    /// Create a new timer with no frames recorded
    pub fn new() -> Self {
        Self {
            last_frame: None,
            delta_time: 0.0,
        }
    }

    /// Advance the timer (call once per frame)
    pub fn tick(&mut self) {
        let now = Instant::now();
        self.delta_time = match self.last_frame {
            Some(last) => now.duration_since(last).as_secs_f32(),
            None => 0.0,
        };
        self.last_frame = Some(now);
    }

    /// Time since the previous tick in seconds
    pub fn delta_time(&self) -> f32 {
        self.delta_time
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_tick_has_zero_delta() {
        let mut timer = FrameTimer::new();
        std::thread::sleep(std::time::Duration::from_millis(5));
        timer.tick();
        assert_eq!(timer.delta_time(), 0.0);
    }

    #[test]
    fn subsequent_ticks_measure_elapsed_time() {
        let mut timer = FrameTimer::new();
        timer.tick();
        std::thread::sleep(std::time::Duration::from_millis(5));
        timer.tick();
        assert!(timer.delta_time() > 0.0);
    }

    #[test]
    fn untouched_timer_reports_zero() {
        let timer = FrameTimer::new();
        assert_eq!(timer.delta_time(), 0.0);
    }
}
