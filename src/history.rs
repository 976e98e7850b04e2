//! Rolling window of recent rate samples for charting.

use std::collections::VecDeque;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::rates::RateResult;
use crate::snapshot::Snapshot;

/// The headline figures of one pass.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct RateSample {
    pub timestamp: DateTime<Utc>,
    pub cpu_percent: f64,
    pub memory_used_percent: f64,
    pub disk_read_bytes_per_sec: f64,
    pub disk_write_bytes_per_sec: f64,
    pub disk_active_percent: f64,
    pub net_rx_bits_per_sec: f64,
    pub net_tx_bits_per_sec: f64,
}

impl RateSample {
    pub fn from_pass(current: &Snapshot, rates: &RateResult) -> Self {
        Self {
            timestamp: current.timestamp,
            cpu_percent: rates.cpu_percent,
            memory_used_percent: current.memory.used_percent(),
            disk_read_bytes_per_sec: rates.disk.read_bytes_per_sec,
            disk_write_bytes_per_sec: rates.disk.write_bytes_per_sec,
            disk_active_percent: rates.disk.active_percent,
            net_rx_bits_per_sec: rates.net.rx_bits_per_sec,
            net_tx_bits_per_sec: rates.net.tx_bits_per_sec,
        }
    }
}

/// Bounded FIFO of [`RateSample`]s; the oldest is evicted at capacity.
#[derive(Clone, Debug)]
pub struct RateHistory {
    samples: VecDeque<RateSample>,
    capacity: usize,
}

impl RateHistory {
    /// A capacity of 0 is raised to 1.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            samples: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub fn push(&mut self, sample: RateSample) {
        if self.samples.len() >= self.capacity {
            self.samples.pop_front();
        }
        self.samples.push_back(sample);
    }

    pub fn latest(&self) -> Option<&RateSample> {
        self.samples.back()
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Oldest first.
    pub fn iter(&self) -> impl Iterator<Item = &RateSample> {
        self.samples.iter()
    }

    /// `(index, value)` points for a chart, oldest at x = 0.
    pub fn series<F>(&self, value_fn: F) -> Vec<(f64, f64)>
    where
        F: Fn(&RateSample) -> f64,
    {
        self.samples
            .iter()
            .enumerate()
            .map(|(i, s)| (i as f64, value_fn(s)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(cpu: f64) -> RateSample {
        RateSample {
            timestamp: Utc::now(),
            cpu_percent: cpu,
            memory_used_percent: 0.0,
            disk_read_bytes_per_sec: 0.0,
            disk_write_bytes_per_sec: 0.0,
            disk_active_percent: 0.0,
            net_rx_bits_per_sec: 0.0,
            net_tx_bits_per_sec: 0.0,
        }
    }

    #[test]
    fn evicts_oldest_at_capacity() {
        let mut history = RateHistory::new(3);
        for cpu in [1.0, 2.0, 3.0, 4.0, 5.0] {
            history.push(sample(cpu));
        }
        assert_eq!(history.len(), 3);
        let values: Vec<f64> = history.iter().map(|s| s.cpu_percent).collect();
        assert_eq!(values, vec![3.0, 4.0, 5.0]);
        assert_eq!(history.latest().map(|s| s.cpu_percent), Some(5.0));
    }

    #[test]
    fn zero_capacity_keeps_one() {
        let mut history = RateHistory::new(0);
        assert_eq!(history.capacity(), 1);
        history.push(sample(1.0));
        history.push(sample(2.0));
        assert_eq!(history.len(), 1);
        assert_eq!(history.series(|s| s.cpu_percent), vec![(0.0, 2.0)]);
    }
}
