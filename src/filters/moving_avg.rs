use heapless::Vec;

use crate::config::{MAX_WINDOW, sanitize_window};

const CAPACITY: usize = MAX_WINDOW as usize;

/// Simple moving average filter state
///
/// Maintains a circular buffer of past samples. RAM cost: MAX_WINDOW * 4 bytes.
#[derive(Debug, Clone)]
pub struct MovingAvgFilter {
    buffer: Vec<u32, CAPACITY>,
    window_size: usize,
    index: usize,
    count: usize,
}

impl MovingAvgFilter {
    /// Create new moving average filter
    ///
    /// A window_size outside 1..=MAX_WINDOW falls back to DEFAULT_WINDOW_SIZE,
    /// the same rule `Config::sanitized` applies.
    pub fn new(window_size: u8) -> Self {
        let mut buffer = Vec::new();
        // Pre-fill so every slot up to capacity is addressable
        for _ in 0..CAPACITY {
            let _ = buffer.push(0);
        }

        Self {
            buffer,
            window_size: usize::from(sanitize_window(window_size)),
            index: 0,
            count: 0,
        }
    }

    /// Apply moving average filter
    ///
    /// Averages the last window_size samples. Until buffer is full,
    /// averages all samples received so far. Result is truncated.
    pub fn apply(&mut self, input: u32) -> u32 {
        self.buffer[self.index] = input;
        self.index = (self.index + 1) % self.window_size;

        if self.count < self.window_size {
            self.count += 1;
        }

        let sum: u64 = self.buffer.iter().take(self.count).map(|&v| u64::from(v)).sum();
        // Mean of u32 values fits in u32
        (sum / self.count as u64) as u32
    }

    /// Number of valid samples, never more than the window size.
    pub fn len(&self) -> usize {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    pub fn window_size(&self) -> usize {
        self.window_size
    }

    /// Change depth and drop the history collected under the old depth.
    pub fn set_window_size(&mut self, window_size: u8) {
        self.window_size = usize::from(sanitize_window(window_size));
        self.reset();
    }

    /// Reset filter state. Stale slots stay in memory but are never read.
    pub fn reset(&mut self) {
        self.index = 0;
        self.count = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_call_returns_input() {
        let mut filter = MovingAvgFilter::new(4);
        assert_eq!(filter.apply(50), 50);
    }

    #[test]
    fn averages_samples() {
        let mut filter = MovingAvgFilter::new(3);

        filter.apply(10);
        filter.apply(20);
        assert_eq!(filter.apply(30), 20);
    }

    #[test]
    fn circular_buffer_wraps() {
        let mut filter = MovingAvgFilter::new(3);

        filter.apply(10);
        filter.apply(20);
        filter.apply(30);
        // Buffer now contains [40, 20, 30]
        assert_eq!(filter.apply(40), 30);
        assert_eq!(filter.len(), 3);
    }

    #[test]
    fn average_truncates() {
        let mut filter = MovingAvgFilter::new(2);
        filter.apply(1);
        assert_eq!(filter.apply(2), 1);
    }

    #[test]
    fn reset_ignores_stale_slots() {
        let mut filter = MovingAvgFilter::new(3);

        filter.apply(500);
        filter.apply(500);
        filter.apply(500);

        filter.reset();
        assert!(filter.is_empty());

        // After reset, first sample should return itself
        assert_eq!(filter.apply(10), 10);
    }

    #[test]
    fn window_change_clears_history() {
        let mut filter = MovingAvgFilter::new(5);
        filter.apply(100);
        filter.apply(100);

        filter.set_window_size(2);
        assert_eq!(filter.window_size(), 2);
        assert_eq!(filter.len(), 0);
        assert_eq!(filter.apply(8), 8);
    }

    #[test]
    fn invalid_window_falls_back_to_default() {
        let default = usize::from(crate::config::DEFAULT_WINDOW_SIZE);
        assert_eq!(MovingAvgFilter::new(0).window_size(), default);
        assert_eq!(MovingAvgFilter::new(200).window_size(), default);

        let mut filter = MovingAvgFilter::new(3);
        filter.set_window_size(MAX_WINDOW + 1);
        assert_eq!(filter.window_size(), default);
    }

    #[test]
    fn sum_does_not_overflow() {
        let mut filter = MovingAvgFilter::new(MAX_WINDOW);
        let mut out = 0;
        for _ in 0..MAX_WINDOW {
            out = filter.apply(u32::MAX);
        }
        assert_eq!(out, u32::MAX);
    }
}
