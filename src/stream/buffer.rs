//! Bounded sample storage for live plotting

use std::collections::VecDeque;

/// Returned by the summary statistics when no samples are buffered
pub const EMPTY_SENTINEL: f64 = -1.0;

/// Parallel (timestamp, value) ring buffers.
///
/// Once `capacity` samples are held, each push evicts the oldest one from
/// both sequences so they always stay the same length.
#[derive(Debug, Clone)]
pub struct SampleBuffer {
    times: VecDeque<f64>,
    values: VecDeque<f64>,
    capacity: usize,
}

/// Min / mean / max snapshot of a buffer
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Summary {
    pub mean: f64,
    pub max: f64,
    pub min: f64,
    pub count: usize,
}

impl SampleBuffer {
    /// # Panics
    ///
    /// If `capacity` is zero.
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "sample buffer capacity must be positive");
        Self {
            times: VecDeque::with_capacity(capacity),
            values: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub fn push(&mut self, time: f64, value: f64) {
        if self.times.len() == self.capacity {
            self.times.pop_front();
            self.values.pop_front();
        }
        self.times.push_back(time);
        self.values.push_back(value);
    }

    pub fn len(&self) -> usize {
        self.times.len()
    }

    pub fn is_empty(&self) -> bool {
        self.times.is_empty()
    }

    /// Samples as (timestamp, value) pairs, oldest first
    pub fn points(&self) -> impl Iterator<Item = (f64, f64)> + '_ {
        self.times.iter().copied().zip(self.values.iter().copied())
    }

    /// Oldest and newest timestamps
    pub fn time_span(&self) -> Option<(f64, f64)> {
        Some((*self.times.front()?, *self.times.back()?))
    }

    pub fn mean(&self) -> f64 {
        if self.values.is_empty() {
            return EMPTY_SENTINEL;
        }
        self.values.iter().sum::<f64>() / self.values.len() as f64
    }

    pub fn max(&self) -> f64 {
        self.values
            .iter()
            .copied()
            .reduce(f64::max)
            .unwrap_or(EMPTY_SENTINEL)
    }

    pub fn min(&self) -> f64 {
        self.values
            .iter()
            .copied()
            .reduce(f64::min)
            .unwrap_or(EMPTY_SENTINEL)
    }

    pub fn summary(&self) -> Summary {
        Summary {
            mean: self.mean(),
            max: self.max(),
            min: self.min(),
            count: self.len(),
        }
    }

    pub fn status(&self) -> String {
        format!("ndata = {}", self.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keeps_last_n() {
        let mut buffer = SampleBuffer::new(3);
        for i in 0..5 {
            buffer.push(i as f64, (i * 10) as f64);
        }

        assert_eq!(buffer.len(), 3);
        assert_eq!(
            buffer.points().collect::<Vec<_>>(),
            vec![(2.0, 20.0), (3.0, 30.0), (4.0, 40.0)]
        );
        assert_eq!(buffer.time_span(), Some((2.0, 4.0)));
    }

    #[test]
    fn test_below_capacity_keeps_everything() {
        let mut buffer = SampleBuffer::new(2000);
        buffer.push(0.1, 500.0);
        buffer.push(0.2, 510.0);
        assert_eq!(buffer.points().collect::<Vec<_>>(), vec![(0.1, 500.0), (0.2, 510.0)]);
        assert_eq!(buffer.len(), 2);
    }

    #[test]
    fn test_empty_sentinels() {
        let buffer = SampleBuffer::new(10);
        assert_eq!(buffer.mean(), -1.0);
        assert_eq!(buffer.max(), -1.0);
        assert_eq!(buffer.min(), -1.0);
        assert_eq!(buffer.time_span(), None);
        assert_eq!(buffer.status(), "ndata = 0");
    }

    #[test]
    fn test_summary() {
        let mut buffer = SampleBuffer::new(10);
        buffer.push(0.0, 450.0);
        buffer.push(1.0, 550.0);
        buffer.push(2.0, 500.0);

        let summary = buffer.summary();
        assert_eq!(summary.mean, 500.0);
        assert_eq!(summary.max, 550.0);
        assert_eq!(summary.min, 450.0);
        assert_eq!(summary.count, 3);
        assert_eq!(buffer.status(), "ndata = 3");
    }

    #[test]
    fn test_summary_tracks_eviction() {
        let mut buffer = SampleBuffer::new(2);
        buffer.push(0.0, 1000.0);
        buffer.push(1.0, 10.0);
        buffer.push(2.0, 20.0);
        assert_eq!(buffer.max(), 20.0);
        assert_eq!(buffer.mean(), 15.0);
    }

    #[test]
    #[should_panic]
    fn test_zero_capacity_panics() {
        SampleBuffer::new(0);
    }
}
