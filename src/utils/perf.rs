//! Playback timing metrics

use std::collections::VecDeque;
use std::time::Duration;

/// Tracks durations over a sliding window
#[derive(Debug, Clone)]
pub struct TimingTracker {
    samples: VecDeque<Duration>,
    max_samples: usize,
}

impl TimingTracker {
    /// Create a new timing tracker with the specified window size
    pub fn new(max_samples: usize) -> Self {
        Self {
            samples: VecDeque::with_capacity(max_samples),
            max_samples: max_samples.max(1),
        }
    }

    /// Record a new timing sample, evicting the oldest when full
    pub fn record(&mut self, duration: Duration) {
        if self.samples.len() >= self.max_samples {
            self.samples.pop_front();
        }
        self.samples.push_back(duration);
    }

    pub fn average(&self) -> Duration {
        if self.samples.is_empty() {
            return Duration::ZERO;
        }
        let total: Duration = self.samples.iter().sum();
        total / self.samples.len() as u32
    }

    pub fn max(&self) -> Duration {
        self.samples.iter().max().copied().unwrap_or(Duration::ZERO)
    }

    pub fn last(&self) -> Option<Duration> {
        self.samples.back().copied()
    }

    pub fn count(&self) -> usize {
        self.samples.len()
    }
}

impl Default for TimingTracker {
    fn default() -> Self {
        Self::new(100)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timing_tracker() {
        let mut tracker = TimingTracker::new(3);
        assert_eq!(tracker.average(), Duration::ZERO);
        assert!(tracker.last().is_none());

        tracker.record(Duration::from_millis(10));
        tracker.record(Duration::from_millis(20));
        tracker.record(Duration::from_millis(30));
        assert_eq!(tracker.average(), Duration::from_millis(20));

        // Window slides
        tracker.record(Duration::from_millis(70));
        assert_eq!(tracker.count(), 3);
        assert_eq!(tracker.average(), Duration::from_millis(40));
        assert_eq!(tracker.max(), Duration::from_millis(70));
        assert_eq!(tracker.last(), Some(Duration::from_millis(70)));
    }
}
