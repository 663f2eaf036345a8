//! Time management utilities

use std::time::Instant;

/// Timing information for a single frame, handed to every component hook
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct FrameTime {
    /// Total elapsed time since the frame driver started, in seconds
    pub total: f32,

    /// Time since the previous frame, in seconds
    pub delta: f32,

    /// Index of the current frame (0 for the first frame)
    pub frame: u64,
}

impl FrameTime {
    /// Create frame timing information
    pub fn new(total: f32, delta: f32, frame: u64) -> Self {
        Self { total, delta, frame }
    }

    /// Advance by `delta` seconds, producing the timing of the following frame
    pub fn advanced(&self, delta: f32) -> Self {
        Self {
            total: self.total + delta,
            delta,
            frame: self.frame + 1,
        }
    }
}

/// High-precision timer for frame timing
///
/// In fixed-step mode every tick advances by the same amount regardless of wall-clock
/// time, which keeps headless runs and tests reproducible.
pub struct Timer {
    last_frame: Instant,
    delta_time: f32,
    total_time: f32,
    frame_count: u64,
    fixed_step: Option<f32>,
}

impl Default for Timer {
    fn default() -> Self {
        Self::new()
    }
}

impl Timer {
    /// Create a new wall-clock timer
    pub fn new() -> Self {
        Self {
            last_frame: Instant::now(),
            delta_time: 0.0,
            total_time: 0.0,
            frame_count: 0,
            fixed_step: None,
        }
    }

    /// Create a timer that advances by exactly `step` seconds per tick
    pub fn fixed(step: f32) -> Self {
        Self {
            fixed_step: Some(step),
            ..Self::new()
        }
    }

    /// Update the timer (should be called once per frame)
    pub fn update(&mut self) {
        let now = Instant::now();
        self.delta_time = match self.fixed_step {
            Some(step) => step,
            None => now.duration_since(self.last_frame).as_secs_f32(),
        };
        self.total_time += self.delta_time;
        self.last_frame = now;
        self.frame_count += 1;
    }

    /// Get the time since the last frame in seconds
    pub fn delta_time(&self) -> f32 {
        self.delta_time
    }

    /// Get the total elapsed time since timer creation
    pub fn total_time(&self) -> f32 {
        self.total_time
    }

    /// Get the current frame count
    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    /// Snapshot of the current frame for component hooks
    pub fn frame_time(&self) -> FrameTime {
        FrameTime {
            total: self.total_time,
            delta: self.delta_time,
            frame: self.frame_count.saturating_sub(1),
        }
    }

    /// Get the average FPS since timer creation
    pub fn average_fps(&self) -> f32 {
        if self.total_time > 0.0 {
            self.frame_count as f32 / self.total_time
        } else {
            0.0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_timer_is_deterministic() {
        let mut timer = Timer::fixed(0.5);
        timer.update();
        timer.update();
        timer.update();

        assert_eq!(timer.frame_count(), 3);
        assert_eq!(timer.delta_time(), 0.5);
        assert_eq!(timer.total_time(), 1.5);
        assert_eq!(timer.frame_time(), FrameTime::new(1.5, 0.5, 2));
    }

    #[test]
    fn test_frame_time_advanced() {
        let next = FrameTime::default().advanced(0.25);
        assert_eq!(next, FrameTime::new(0.25, 0.25, 1));
    }
}
