//! Frame timing utilities

use std::time::{Duration, Instant};

/// High-precision frame timer
///
/// Call [`Timer::tick`] once per frame; the returned delta already has the
/// game-speed multiplier applied, so a paused game can pass `0.0`.
pub struct Timer {
    last_frame: Instant,
    delta_time: f32,
    total_time: f32,
    frame_count: u64,
}

impl Default for Timer {
    fn default() -> Self {
        Self::new()
    }
}

impl Timer {
    /// Create a new timer
    pub fn new() -> Self {
        Self {
            last_frame: Instant::now(),
            delta_time: 0.0,
            total_time: 0.0,
            frame_count: 0,
        }
    }

    /// Advance the timer by one frame and return the scaled delta in seconds
    pub fn tick(&mut self, game_speed: f32) -> f32 {
        let now = Instant::now();
        let elapsed = now.duration_since(self.last_frame);
        self.delta_time = elapsed.as_secs_f32() * game_speed;
        self.total_time += self.delta_time;
        self.last_frame = now;
        self.frame_count += 1;
        self.delta_time
    }

    /// Time since the last frame in seconds (already speed-scaled)
    pub fn delta_time(&self) -> f32 {
        self.delta_time
    }

    /// Total elapsed time since timer creation
    pub fn total_time(&self) -> f32 {
        self.total_time
    }

    /// Number of frames ticked so far
    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    /// Average FPS since timer creation
    pub fn average_fps(&self) -> f32 {
        if self.total_time > 0.0 {
            self.frame_count as f32 / self.total_time
        } else {
            0.0
        }
    }

    /// FPS based on the last frame time
    pub fn current_fps(&self) -> f32 {
        if self.delta_time > 0.0 {
            1.0 / self.delta_time
        } else {
            0.0
        }
    }
}

/// Simple stopwatch for measuring elapsed wall time
pub struct Stopwatch {
    start_time: Option<Instant>,
    elapsed: Duration,
}

impl Default for Stopwatch {
    fn default() -> Self {
        Self::new()
    }
}

impl Stopwatch {
    /// Create a new stopped stopwatch
    pub fn new() -> Self {
        Self {
            start_time: None,
            elapsed: Duration::ZERO,
        }
    }

    /// Create a stopwatch and start it immediately
    pub fn start_new() -> Self {
        let mut sw = Self::new();
        sw.start();
        sw
    }

    /// Start measuring
    pub fn start(&mut self) {
        self.start_time = Some(Instant::now());
    }

    /// Stop measuring and accumulate the elapsed time
    pub fn stop(&mut self) {
        if let Some(start) = self.start_time.take() {
            self.elapsed += start.elapsed();
        }
    }

    /// Reset to zero
    pub fn reset(&mut self) {
        self.start_time = None;
        self.elapsed = Duration::ZERO;
    }

    /// Accumulated elapsed time
    pub fn elapsed(&self) -> Duration {
        let running = self.start_time.map_or(Duration::ZERO, |s| s.elapsed());
        self.elapsed + running
    }

    /// Elapsed time in seconds
    pub fn elapsed_secs(&self) -> f32 {
        self.elapsed().as_secs_f32()
    }

    /// Whether the stopwatch is currently running
    pub fn is_running(&self) -> bool {
        self.start_time.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tick_scales_delta_by_game_speed() {
        let mut timer = Timer::new();
        std::thread::sleep(Duration::from_millis(5));
        let paused = timer.tick(0.0);
        assert_eq!(paused, 0.0);
        std::thread::sleep(Duration::from_millis(5));
        let normal = timer.tick(1.0);
        assert!(normal > 0.0);
        assert_eq!(timer.frame_count(), 2);
    }

    #[test]
    fn stopwatch_accumulates_across_stops() {
        let mut sw = Stopwatch::start_new();
        std::thread::sleep(Duration::from_millis(2));
        sw.stop();
        let first = sw.elapsed();
        assert!(first > Duration::ZERO);
        assert!(!sw.is_running());
        sw.start();
        std::thread::sleep(Duration::from_millis(2));
        assert!(sw.elapsed() > first);
    }
}
