//! Telemetry sink abstraction.
//!
//! The sink is an external collaborator: upload formatting and delivery are
//! not part of this workspace. A sink only ever sees validated readings, so
//! "no sample" and "a zero-valued sample" stay distinguishable.

use crate::bus::BusId;

/// One validated measurement ready for delivery.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Sample {
    /// Bus the reading came from
    pub bus: BusId,
    /// Milliseconds since system start
    pub timestamp_ms: u64,
    /// Temperature in degrees Celsius
    pub temperature_c: f32,
    /// Relative humidity in percent
    pub humidity_pct: f32,
}

/// Receiver for successful readings.
pub trait TelemetrySink {
    /// Deliver one sample. Never called for failed reads.
    fn publish(&mut self, sample: &Sample);
}

/// Sink that keeps the most recent samples in a fixed-capacity buffer.
///
/// Useful in tests and as a staging buffer before an uplink task drains it.
/// When full, the oldest sample is dropped.
#[derive(Debug)]
pub struct RecordingSink<const N: usize> {
    samples: heapless::Deque<Sample, N>,
    dropped: u32,
}

impl<const N: usize> RecordingSink<N> {
    pub fn new() -> Self {
        Self {
            samples: heapless::Deque::new(),
            dropped: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Samples evicted because the buffer was full.
    pub fn dropped(&self) -> u32 {
        self.dropped
    }

    pub fn iter(&self) -> impl Iterator<Item = &Sample> {
        self.samples.iter()
    }

    /// Remove and return the oldest sample.
    pub fn pop(&mut self) -> Option<Sample> {
        self.samples.pop_front()
    }
}

impl<const N: usize> Default for RecordingSink<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> TelemetrySink for RecordingSink<N> {
    fn publish(&mut self, sample: &Sample) {
        if self.samples.is_full() {
            self.samples.pop_front();
            self.dropped = self.dropped.saturating_add(1);
        }
        // Cannot fail: a slot was freed above when full.
        let _ = self.samples.push_back(*sample);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(ts: u64) -> Sample {
        Sample {
            bus: BusId(1),
            timestamp_ms: ts,
            temperature_c: 21.5,
            humidity_pct: 40.0,
        }
    }

    #[test]
    fn records_in_order() {
        let mut sink = RecordingSink::<4>::new();
        sink.publish(&sample(1));
        sink.publish(&sample(2));

        assert_eq!(sink.len(), 2);
        assert_eq!(sink.pop().map(|s| s.timestamp_ms), Some(1));
        assert_eq!(sink.pop().map(|s| s.timestamp_ms), Some(2));
        assert!(sink.is_empty());
    }

    #[test]
    fn evicts_oldest_when_full() {
        let mut sink = RecordingSink::<2>::new();
        for ts in 0..5 {
            sink.publish(&sample(ts));
        }

        assert_eq!(sink.len(), 2);
        assert_eq!(sink.dropped(), 3);
        let stamps: heapless::Vec<u64, 2> = sink.iter().map(|s| s.timestamp_ms).collect();
        assert_eq!(stamps.as_slice(), &[3, 4]);
    }
}
