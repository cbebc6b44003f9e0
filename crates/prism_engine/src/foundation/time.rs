//! Frame timing and FPS bookkeeping

use std::time::Instant;

/// Per-frame clock driven by the application loop.
///
/// Internally double precision, sampled from a monotonic epoch. The FPS
/// counter buckets frames into whole-second windows: each time at least one
/// full second has elapsed since the last bucket close, the frame tally for
/// that window is published and the tally restarts from the current sample.
pub struct FrameClock {
    epoch: Instant,
    last_sample: f64,
    current_sample: f64,
    delta: f64,
    window_start: f64,
    frames_in_window: u32,
    fps: u32,
}

impl Default for FrameClock {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameClock {
    /// Create a new clock with its epoch at the current instant
    pub fn new() -> Self {
        Self {
            epoch: Instant::now(),
            last_sample: 0.0,
            current_sample: 0.0,
            delta: 0.0,
            window_start: 0.0,
            frames_in_window: 0,
            fps: 0,
        }
    }

    /// Re-initialize the clock at the current instant
    ///
    /// Zeroes the delta and restarts the FPS window without touching the
    /// last published reading.
    pub fn restart(&mut self) {
        let now = self.now();
        self.last_sample = now;
        self.current_sample = now;
        self.delta = 0.0;
        self.window_start = now;
        self.frames_in_window = 0;
    }

    fn now(&self) -> f64 {
        self.epoch.elapsed().as_secs_f64()
    }

    /// Sample the clock once per loop iteration
    pub fn tick(&mut self) {
        let now = self.now();
        self.tick_at(now);
    }

    pub(crate) fn tick_at(&mut self, now: f64) {
        self.current_sample = now;
        self.delta = self.current_sample - self.last_sample;
        self.last_sample = self.current_sample;

        self.frames_in_window += 1;
        if self.current_sample - self.window_start >= 1.0 {
            self.fps = self.frames_in_window;
            self.frames_in_window = 0;
            self.window_start = self.current_sample;
        }
    }

    /// Time since the previous sample, in seconds
    pub fn delta_seconds(&self) -> f32 {
        self.delta as f32
    }

    /// Frames counted in the last completed one-second window
    pub fn fps(&self) -> u32 {
        self.fps
    }

    #[cfg(test)]
    fn frames_in_window(&self) -> u32 {
        self.frames_in_window
    }
}
