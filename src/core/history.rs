use std::collections::VecDeque;

/// Default number of per-second frame-rate samples kept for averaging.
pub const DEFAULT_HISTORY_LEN: usize = 10;

/// Upper bound on the history length: one hour of one-second windows.
pub const MAX_HISTORY_LEN: usize = 3600;

/// Bounded ring buffer of completed per-window frame rates.
///
/// Pushing into a full history evicts the oldest entry, so the buffer never
/// holds more than `capacity` samples and the mean always reflects exactly the
/// entries currently held.
#[derive(Debug, Clone)]
pub struct FrameHistory {
    samples: VecDeque<u32>,
    capacity: usize,
    sum: u64,
}

impl FrameHistory {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.clamp(1, MAX_HISTORY_LEN);
        Self {
            samples: VecDeque::with_capacity(capacity.min(DEFAULT_HISTORY_LEN)),
            capacity,
            sum: 0,
        }
    }

    /// Push a new sample, returning the evicted one when the buffer was full.
    pub fn push(&mut self, frame_rate: u32) -> Option<u32> {
        let evicted = if self.samples.len() == self.capacity {
            self.samples.pop_front()
        } else {
            None
        };
        if let Some(old) = evicted {
            self.sum -= u64::from(old);
        }
        self.samples.push_back(frame_rate);
        self.sum += u64::from(frame_rate);
        evicted
    }

    /// Arithmetic mean of the held samples (0.0 when empty).
    pub fn mean(&self) -> f64 {
        if self.samples.is_empty() {
            return 0.0;
        }
        self.sum as f64 / self.samples.len() as f64
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Oldest first.
    pub fn iter(&self) -> impl Iterator<Item = u32> + '_ {
        self.samples.iter().copied()
    }

    pub fn to_vec(&self) -> Vec<u32> {
        self.samples.iter().copied().collect()
    }

    pub fn clear(&mut self) {
        self.samples.clear();
        self.sum = 0;
    }
}

impl Default for FrameHistory {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_LEN)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mean_tracks_partial_window() {
        let mut h = FrameHistory::default();
        for f in [60, 30, 45] {
            h.push(f);
        }
        assert_eq!(h.len(), 3);
        assert!((h.mean() - 45.0).abs() < 1e-9);
    }

    #[test]
    fn full_window_evicts_oldest() {
        let mut h = FrameHistory::default();
        for f in 1..=10 {
            assert_eq!(h.push(f), None);
        }
        assert_eq!(h.push(11), Some(1));
        assert_eq!(h.len(), 10);
        assert_eq!(h.iter().next(), Some(2));
        // mean of 2..=11
        assert!((h.mean() - 6.5).abs() < 1e-9);
    }

    #[test]
    fn never_exceeds_capacity() {
        let mut h = FrameHistory::new(4);
        for f in 0..100 {
            h.push(f);
            assert!(h.len() <= 4);
        }
        assert_eq!(h.to_vec(), vec![96, 97, 98, 99]);
    }

    #[test]
    fn zero_capacity_is_clamped() {
        let mut h = FrameHistory::new(0);
        assert_eq!(h.capacity(), 1);
        h.push(5);
        h.push(7);
        assert_eq!(h.to_vec(), vec![7]);
    }

    #[test]
    fn empty_mean_is_zero() {
        let h = FrameHistory::default();
        assert!(h.is_empty());
        assert_eq!(h.mean(), 0.0);
    }

    #[test]
    fn huge_capacity_is_clamped_without_preallocating() {
        let mut h = FrameHistory::new(usize::MAX);
        assert_eq!(h.capacity(), MAX_HISTORY_LEN);
        h.push(60);
        assert_eq!(h.len(), 1);
    }
}
