//! Progress logging for record streams.
//!
//! The classification pass is single-threaded and exclusively owns its
//! accumulators, so the tracker is a plain counter updated through `&mut`.

use log::info;

/// Logs progress each time the running count crosses an interval boundary.
///
/// # Example
/// ```
/// use duplexqc_lib::progress::ProgressTracker;
///
/// let mut tracker = ProgressTracker::new("Processed records").with_interval(100);
/// for _ in 0..250 {
///     tracker.record(1); // logs at 100 and 200
/// }
/// tracker.log_final(); // logs "Processed records 250 (complete)"
/// ```
pub struct ProgressTracker {
    /// Progress is logged when the count crosses multiples of this interval.
    interval: u64,
    /// Message prefix for log output.
    message: String,
    /// Records seen so far.
    count: u64,
}

impl ProgressTracker {
    /// Creates a tracker with the given message and a default interval of 10,000.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self { interval: 10_000, message: message.into(), count: 0 }
    }

    /// Sets the logging interval.
    #[must_use]
    pub fn with_interval(mut self, interval: u64) -> Self {
        self.interval = interval;
        self
    }

    /// Adds to the count, logging once per interval boundary crossed.
    pub fn record(&mut self, additional: u64) {
        let prev = self.count;
        self.count += additional;
        for milestone in (prev / self.interval + 1)..=(self.count / self.interval) {
            info!("{} {}", self.message, milestone * self.interval);
        }
    }

    /// Logs the final count unless the last `record` call already landed
    /// exactly on an interval boundary.
    pub fn log_final(&self) {
        if self.count > 0 && self.count % self.interval != 0 {
            info!("{} {} (complete)", self.message, self.count);
        }
    }

    /// The current count.
    #[must_use]
    pub fn count(&self) -> u64 {
        self.count
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_defaults() {
        let tracker = ProgressTracker::new("Processing");
        assert_eq!(tracker.interval, 10_000);
        assert_eq!(tracker.count(), 0);
    }

    #[test]
    fn test_with_interval() {
        let tracker = ProgressTracker::new("Processing").with_interval(100);
        assert_eq!(tracker.interval, 100);
    }

    #[test]
    fn test_record_accumulates() {
        let mut tracker = ProgressTracker::new("Items").with_interval(100);
        tracker.record(50);
        assert_eq!(tracker.count(), 50);
        tracker.record(75);
        assert_eq!(tracker.count(), 125);
    }

    #[test]
    fn test_crossing_multiple_intervals() {
        // Crossing several boundaries in one call must not panic or miscount
        let mut tracker = ProgressTracker::new("Items").with_interval(10);
        tracker.record(35);
        assert_eq!(tracker.count(), 35);
        tracker.record(5);
        assert_eq!(tracker.count(), 40);
        tracker.log_final();
    }
}
